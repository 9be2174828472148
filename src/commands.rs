use crate::Error;

/// USB HID commands issued by this driver.
///
/// Only the commands needed for GP pin flash configuration, chip reset and I2C
/// transfers are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum McpCommand {
    /// Poll for the status of the device, cancel an I2C transfer,
    /// or set the I2C bus speed.
    ///
    /// See section 3.1.1.
    StatusSetParameters,
    /// Read the GP pin power-up settings from flash.
    ///
    /// See section 3.1.2 and table 3-6.
    ReadFlashGpSettings,
    /// Write the GP pin power-up settings to flash.
    ///
    /// See section 3.1.3 and table 3-13.
    WriteFlashGpSettings,
    /// Force a reset of the device.
    ///
    /// See section 3.1.15.
    ResetChip,
    /// Request a read from an I2C target. The data comes back via `I2cGetData`.
    I2cReadData,
    /// Request a read with a repeated START. The data comes back via `I2cGetData`.
    I2cReadDataRepeatedStart,
    /// Read requested I2C data back from the MCP2221.
    ///
    /// See section 3.1.10.
    I2cGetData,
    /// Write data to an I2C target.
    ///
    /// See section 3.1.5.
    I2cWriteData,
    /// Write data to an I2C target without a STOP condition.
    ///
    /// See section 3.1.7.
    I2cWriteDataNoStop,
}

impl McpCommand {
    /// Bytes placed at the start of the outgoing report.
    ///
    /// Most commands are a single code byte. Flash commands carry a subcommand
    /// and Reset Chip carries a three-byte key.
    fn buffer_prefix(self) -> &'static [u8] {
        match self {
            McpCommand::StatusSetParameters => &[0x10],
            McpCommand::ReadFlashGpSettings => &[0xB0, 0x01],
            McpCommand::WriteFlashGpSettings => &[0xB1, 0x01],
            McpCommand::ResetChip => &[0x70, 0xAB, 0xCD, 0xEF],
            McpCommand::I2cReadData => &[0x91],
            McpCommand::I2cReadDataRepeatedStart => &[0x93],
            McpCommand::I2cGetData => &[0x40],
            McpCommand::I2cWriteData => &[0x90],
            McpCommand::I2cWriteDataNoStop => &[0x94],
        }
    }

    /// Reset Chip is the only command the MCP2221 does not answer.
    fn has_no_response(self) -> bool {
        matches!(self, Self::ResetChip)
    }

    /// Map a failure status code to a command-specific error, if there is one.
    ///
    /// The I2C engine busy and read error codes matter most, as they signal that
    /// the command should be attempted again.
    fn check_error_code(self, code: u8) -> Result<(), Error> {
        match (code, self) {
            (0x01, Self::ReadFlashGpSettings) => Err(Error::CommandNotSupported),
            (0x02, Self::WriteFlashGpSettings) => Err(Error::CommandNotSupported),
            (0x03, Self::WriteFlashGpSettings) => Err(Error::CommandNotAllowed),
            (0x01, Self::I2cWriteData | Self::I2cWriteDataNoStop) => Err(Error::I2cEngineBusy),
            (0x01, Self::I2cReadData | Self::I2cReadDataRepeatedStart) => {
                Err(Error::I2cEngineBusy)
            }
            (0x41, Self::I2cGetData) => Err(Error::I2cEngineReadError),
            (_, _) => Ok(()),
        }
    }
}

/// Outgoing 64-byte command report.
#[derive(Debug, Clone)]
pub(crate) struct UsbReport {
    command: McpCommand,
    /// Report body as laid out in the datasheet, command code at index 0.
    pub(crate) write_buffer: [u8; 64],
}

impl UsbReport {
    pub(crate) fn new(command: McpCommand) -> Self {
        let mut write_buffer = [0u8; 64];
        let prefix = command.buffer_prefix();
        write_buffer[..prefix.len()].copy_from_slice(prefix);
        Self {
            command,
            write_buffer,
        }
    }

    /// The 65 bytes handed to hidapi: report number 0 followed by the body.
    pub(crate) fn report_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[1..].copy_from_slice(&self.write_buffer);
        out
    }

    pub(crate) fn command_code(&self) -> u8 {
        self.write_buffer[0]
    }

    pub(crate) fn has_no_response(&self) -> bool {
        self.command.has_no_response()
    }

    pub(crate) fn check_error_code(&self, code: u8) -> Result<(), Error> {
        self.command.check_error_code(code)
    }

    /// Write a single data byte in the outgoing report.
    ///
    /// The command code at index 0 cannot be overwritten.
    pub(crate) fn set_data_byte(&mut self, byte_index: usize, value: u8) {
        assert!(byte_index < 64, "Byte index {byte_index} too large.");
        assert!(byte_index != 0, "Cannot write to command byte index.");
        self.write_buffer[byte_index] = value;
    }
}

/// Validate a 64-byte response against the report that produced it.
///
/// Checks the command-code echo and the status byte, returning the most specific
/// error for a failure code.
pub(crate) fn check_response(report: &UsbReport, response: &[u8; 64]) -> Result<(), Error> {
    let sent = report.command_code();
    let received = response[0];
    if received != sent {
        return Err(Error::MismatchedCommandCodeEcho { sent, received });
    }
    match response[1] {
        crate::constants::COMMAND_SUCCESS => Ok(()),
        code => report
            .check_error_code(code)
            .and(Err(Error::CommandFailed(code))),
    }
}

/// Check byte 3 of a Status/Set Parameters response that requested a new I2C
/// bus speed.
///
/// 0x21 means a transfer in progress prevented the change. 0x20 confirms the new
/// divider and 0x00 means no change was requested.
pub(crate) fn check_bus_speed_response(response: &[u8; 64]) -> Result<(), Error> {
    match response[3] {
        0x21 => Err(Error::I2cTransferPreventedSpeedChange),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_report_carries_key() {
        let report = UsbReport::new(McpCommand::ResetChip);
        assert_eq!(report.write_buffer[..4], [0x70, 0xAB, 0xCD, 0xEF]);
        assert!(report.write_buffer[4..].iter().all(|&b| b == 0));
        assert!(report.has_no_response());
    }

    #[test]
    fn report_bytes_prepend_report_number() {
        let mut report = UsbReport::new(McpCommand::WriteFlashGpSettings);
        report.set_data_byte(2, 0x10);
        let bytes = report.report_bytes();
        assert_eq!(bytes[..4], [0x00, 0xB1, 0x01, 0x10]);
        assert_eq!(bytes.len(), 65);
    }

    #[test]
    #[should_panic(expected = "Cannot write to command byte index.")]
    fn command_byte_is_protected() {
        UsbReport::new(McpCommand::StatusSetParameters).set_data_byte(0, 0xFF);
    }

    #[test]
    fn mismatched_echo_is_reported() {
        let report = UsbReport::new(McpCommand::StatusSetParameters);
        let mut response = [0u8; 64];
        response[0] = 0x61;
        assert!(matches!(
            check_response(&report, &response),
            Err(Error::MismatchedCommandCodeEcho {
                sent: 0x10,
                received: 0x61
            })
        ));
    }

    #[test]
    fn command_specific_failures() {
        let mut response = [0u8; 64];

        let write = UsbReport::new(McpCommand::WriteFlashGpSettings);
        response[0] = 0xB1;
        response[1] = 0x03;
        assert!(matches!(
            check_response(&write, &response),
            Err(Error::CommandNotAllowed)
        ));

        let get = UsbReport::new(McpCommand::I2cGetData);
        response[0] = 0x40;
        response[1] = 0x41;
        assert!(matches!(
            check_response(&get, &response),
            Err(Error::I2cEngineReadError)
        ));

        let read = UsbReport::new(McpCommand::I2cReadDataRepeatedStart);
        response[0] = 0x93;
        response[1] = 0x01;
        assert!(matches!(
            check_response(&read, &response),
            Err(Error::I2cEngineBusy)
        ));
    }

    #[test]
    fn unknown_failure_code_is_general() {
        let report = UsbReport::new(McpCommand::StatusSetParameters);
        let mut response = [0u8; 64];
        response[0] = 0x10;
        response[1] = 0x07;
        assert!(matches!(
            check_response(&report, &response),
            Err(Error::CommandFailed(0x07))
        ));
    }

    #[test]
    fn bus_speed_change_outcome() {
        let mut response = [0u8; 64];
        response[0] = 0x10;
        assert!(check_bus_speed_response(&response).is_ok());
        response[3] = 0x20;
        assert!(check_bus_speed_response(&response).is_ok());
        response[3] = 0x21;
        assert!(matches!(
            check_bus_speed_response(&response),
            Err(Error::I2cTransferPreventedSpeedChange)
        ));
    }
}
