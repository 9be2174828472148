use std::time::Duration;

/// Problems when communicating with the MCP2221.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No USB device with the given vendor and product ID could be opened.
    ///
    /// This is also returned if the device is present but already claimed by
    /// another process, as hidapi does not distinguish the two cases.
    #[error("no MCP2221 found with VID {vendor_id:#06X} and PID {product_id:#06X}")]
    DeviceNotFound {
        /// USB vendor ID that was searched for.
        vendor_id: u16,
        /// USB product ID that was searched for.
        product_id: u16,
    },
    /// The underlying USB HID layer failed.
    #[error("USB HID error: {0}")]
    HidApi(#[from] hidapi::HidError),
    /// The driver has been closed and no longer holds a USB handle.
    #[error("the MCP2221 handle has been closed")]
    DeviceClosed,
    /// A command issued to the MCP2221 did not complete successfully.
    ///
    /// The enclosed `u8` is the value returned by the MCP2221 in place of the success
    /// code (0).
    #[error("command failed with status code {0:#04X}")]
    CommandFailed(u8),
    /// The MCP2221 did not support the flash read or write that was issued.
    ///
    /// This indicates a bug in this crate.
    #[error("flash data command not supported by the device")]
    CommandNotSupported,
    /// The MCP2221 refused a flash write.
    ///
    /// The device is probably locked after repeated failed password entries. See
    /// section 3.1.4.1 of the datasheet.
    #[error("flash data write not allowed by the device")]
    CommandNotAllowed,
    /// The command code echoed by the MCP2221 was not the command code written to it.
    #[error("sent command {sent:#04X} but the device echoed {received:#04X}")]
    MismatchedCommandCodeEcho {
        /// Command code that was sent to the MCP2221.
        sent: u8,
        /// Command code echoed from the MCP2221.
        received: u8,
    },
    /// A pin designation read from the device is not valid for that pin.
    #[error("invalid designation {mode:#05b} read for pin {pin}")]
    InvalidPinModeFromDevice {
        /// GP pin number, `0..=3`.
        pin: u8,
        /// The three designation bits read from the device.
        mode: u8,
    },
    /// The requested I2C bus speed cannot be produced by the MCP2221's clock divider.
    #[error("I2C bus speed of {0} bit/s is outside the supported 47k..=400k range")]
    I2cSpeedOutOfRange(u32),
    /// The I2C bus speed could not be changed because a transfer was in progress.
    #[error("an I2C transfer in progress prevented the bus speed change")]
    I2cTransferPreventedSpeedChange,
    /// The MCP2221 did not answer a command report in time.
    #[error("no response from the device within {0:?}")]
    ResponseTimeout(Duration),
    /// The MCP2221 did not re-enumerate within the timeout after a reset.
    #[error("device did not re-enumerate within {0:?} of reset")]
    ResetTimeout(Duration),
    /// The I2C target did not acknowledge its address.
    #[error("I2C target did not acknowledge its address")]
    I2cAddressNack,
    /// The I2C engine was busy and the command could not be issued.
    #[error("I2C engine busy")]
    I2cEngineBusy,
    /// The I2C engine failed to hand back data read from the target.
    #[error("error reading data back from the I2C engine")]
    I2cEngineReadError,
    /// Zero-length I2C transfers are refused as they can lock up the bus.
    #[error("zero-length I2C transfers are not supported")]
    I2cTransferEmpty,
    /// The MCP2221 can transfer at most 65,535 bytes at a time.
    #[error("I2C transfer longer than 65,535 bytes")]
    I2cTransferTooLong,
    /// An embedded-hal transaction with a read followed by a write was requested.
    ///
    /// The MCP2221 has no command to read without a final STOP condition.
    #[error("I2C transactions with a read before a write are not supported")]
    I2cUnsupportedEmbeddedHalTransaction,
    /// An I2C operation could not be completed within the retry limit.
    #[error("I2C operation failed after repeated retries")]
    I2cOperationFailed,
}
