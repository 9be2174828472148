/// Microchip's USB vendor ID, 1240.
pub(crate) const MICROCHIP_VID: u16 = 0x04D8;
/// Default product ID of both the MCP2221 and MCP2221A, 221.
pub(crate) const MCP2221_PID: u16 = 0x00DD;

/// Status byte returned in a response report when a command succeeded.
pub(crate) const COMMAND_SUCCESS: u8 = 0x00;

/// Largest I2C transfer the MCP2221 accepts, plus one (for range patterns).
pub(crate) const MAX_I2C_TRANSFER_PLUS_1: usize = u16::MAX as usize + 1;

/// Internal clock the I2C bus speed divider is derived from.
pub(crate) const MCP_CLOCK_HZ: u32 = 12_000_000;
