//! I2C bus speed and transfer helper types.

use crate::Error;
use crate::commands::McpCommand;
use crate::constants::MCP_CLOCK_HZ;

/// Response to an attempt to cancel an I2C transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelI2cTransferResponse {
    /// The MCP2221 marked the transfer for cancellation.
    MarkedForCancellation,
    /// The I2C engine was already idle so nothing was cancelled.
    NoTransfer,
    /// The transfer was cancelled.
    Done,
}

/// I2C bus speed.
///
/// The MCP2221 derives the bus clock from its 12 MHz internal clock with an
/// 8-bit divider, which limits the range to roughly 47 kbit/s to 400 kbit/s.
/// Not every speed in that range can be produced exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cSpeed(u32);

impl I2cSpeed {
    /// Slowest speed the divider can produce.
    pub const MIN_BPS: u32 = 47_000;
    /// Fastest speed the MCP2221 supports.
    pub const MAX_BPS: u32 = 400_000;

    /// Standard-mode, 100 kbit/s.
    pub const STANDARD: I2cSpeed = I2cSpeed(100_000);
    /// Fast-mode, 400 kbit/s.
    pub const FAST: I2cSpeed = I2cSpeed(400_000);

    /// Bus speed in bits per second.
    ///
    /// # Errors
    ///
    /// [`Error::I2cSpeedOutOfRange`] if the speed is outside `47k..=400k`.
    pub fn new(bits_per_second: u32) -> Result<Self, Error> {
        if (Self::MIN_BPS..=Self::MAX_BPS).contains(&bits_per_second) {
            Ok(Self(bits_per_second))
        } else {
            Err(Error::I2cSpeedOutOfRange(bits_per_second))
        }
    }

    /// Requested speed in bits per second.
    pub fn bits_per_second(self) -> u32 {
        self.0
    }

    /// Convert the speed into a clock divider for the Status/Set Parameters command.
    ///
    /// The `- 2` is from note 1 of table 3-1 in the datasheet.
    pub(crate) fn to_clock_divider(self) -> u8 {
        // Range is checked on construction: 12M / 47k - 2 = 253.
        (MCP_CLOCK_HZ / self.0 - 2) as u8
    }
}

impl Default for I2cSpeed {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl std::fmt::Display for I2cSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} kbit/s", self.0 / 1000)
    }
}

/// Conversion of 7-bit I2C addresses into the 8-bit form the MCP2221 expects.
pub(crate) trait I2cAddressing {
    fn into_read_address(self) -> u8;
    fn into_write_address(self) -> u8;
}

impl I2cAddressing for u8 {
    fn into_read_address(self) -> u8 {
        (self << 1) | 1
    }

    fn into_write_address(self) -> u8 {
        self << 1
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum ReadType {
    Normal,
    RepeatedStart,
}

impl From<ReadType> for McpCommand {
    fn from(value: ReadType) -> Self {
        match value {
            ReadType::Normal => McpCommand::I2cReadData,
            ReadType::RepeatedStart => McpCommand::I2cReadDataRepeatedStart,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum WriteType {
    Normal,
    NoStop,
}

impl From<WriteType> for McpCommand {
    fn from(value: WriteType) -> Self {
        match value {
            WriteType::Normal => McpCommand::I2cWriteData,
            WriteType::NoStop => McpCommand::I2cWriteDataNoStop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divider_for_standard_speeds() {
        assert_eq!(I2cSpeed::STANDARD.to_clock_divider(), 118);
        assert_eq!(I2cSpeed::FAST.to_clock_divider(), 28);
        assert_eq!(I2cSpeed::new(47_000).unwrap().to_clock_divider(), 253);
    }

    #[test]
    fn speed_range_is_checked() {
        assert!(matches!(
            I2cSpeed::new(1_000_000),
            Err(Error::I2cSpeedOutOfRange(1_000_000))
        ));
        assert!(I2cSpeed::new(46_999).is_err());
        assert_eq!(I2cSpeed::new(400_000).unwrap(), I2cSpeed::FAST);
        assert_eq!(I2cSpeed::default().to_string(), "100 kbit/s");
    }

    #[test]
    fn seven_bit_address_conversion() {
        assert_eq!(0x40u8.into_read_address(), 0x81);
        assert_eq!(0x40u8.into_write_address(), 0x80);
    }
}
