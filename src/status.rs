//! Status read from the MCP2221.

use bit_field::BitField;

/// Current status of the MCP2221.
///
/// Bytes are numbered from 0 through 63 and correspond to table 3-2 in section
/// 3.1.1 (Status/Set Parameters) of the datasheet. Only the fields this driver
/// acts on are decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// I2C engine status.
    pub i2c: I2cStatus,
    /// MCP2221 hardware revision.
    pub hardware_revision: Revision,
    /// MCP2221 firmware revision.
    pub firmware_revision: Revision,
}

/// I2C engine portion of the status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cStatus {
    /// Raw state of the I2C state machine (byte 8). Zero when idle.
    pub communication_state: u8,
    /// Requested transfer length (bytes 9 and 10).
    pub transfer_requested_length: u16,
    /// Transfer length completed so far (bytes 11 and 12).
    pub transfer_completed_length: u16,
    /// True if the target acknowledged its address.
    ///
    /// The device reports a set bit 6 of byte 20 when no ACK was received.
    pub ack_received: bool,
    /// SCL line reads high (byte 22).
    pub scl_line_high: bool,
    /// SDA line reads high (byte 23).
    pub sda_line_high: bool,
}

impl I2cStatus {
    /// Returns true if the I2C engine is not in the middle of a transfer.
    pub fn is_idle(&self) -> bool {
        self.communication_state == 0x00
    }
}

impl Status {
    pub(crate) fn from_buffer(buf: &[u8; 64]) -> Self {
        Self {
            i2c: I2cStatus {
                communication_state: buf[8],
                transfer_requested_length: u16::from_le_bytes([buf[9], buf[10]]),
                transfer_completed_length: u16::from_le_bytes([buf[11], buf[12]]),
                ack_received: !buf[20].get_bit(6),
                scl_line_high: buf[22] == 0x01,
                sda_line_high: buf[23] == 0x01,
            },
            hardware_revision: Revision::new(buf[46] as char, buf[47] as char),
            firmware_revision: Revision::new(buf[48] as char, buf[49] as char),
        }
    }
}

/// Two-part revision number, as ASCII characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    /// Major component of the revision number. (x.0)
    pub major: char,
    /// Minor component of the revision number. (0.x)
    pub minor: char,
}

impl Revision {
    fn new(major: char, minor: char) -> Self {
        Self { major, minor }
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_status_report() {
        let mut buf = [0u8; 64];
        buf[0] = 0x10;
        buf[8] = 0x00;
        buf[9..13].copy_from_slice(&[0x02, 0x00, 0x01, 0x00]);
        buf[22] = 0x01;
        buf[23] = 0x01;
        buf[46..50].copy_from_slice(b"A612");

        let status = Status::from_buffer(&buf);
        assert!(status.i2c.is_idle());
        assert!(status.i2c.ack_received);
        assert_eq!(status.i2c.transfer_requested_length, 2);
        assert_eq!(status.i2c.transfer_completed_length, 1);
        assert!(status.i2c.scl_line_high && status.i2c.sda_line_high);
        assert_eq!(status.hardware_revision.to_string(), "A.6");
        assert_eq!(status.firmware_revision.to_string(), "1.2");
    }

    #[test]
    fn nack_bit_is_inverted() {
        let mut buf = [0u8; 64];
        buf[8] = 0x25;
        buf[20] = 0b0100_0000;
        let status = Status::from_buffer(&buf);
        assert!(!status.i2c.ack_received);
        assert!(!status.i2c.is_idle());
    }
}
