use super::MCP2221;
use crate::Error;
use crate::commands::{McpCommand, UsbReport};
use crate::gpio::{GpPin, GpioDirection, LogicLevel};
use crate::settings::{AltFunction, GpSettings};

/// # Flash memory (power-up settings)
impl MCP2221 {
    /// Read GP pin settings from flash memory.
    ///
    /// These are the initial settings for the GP pins when the device is powered-up.
    ///
    /// # Datasheet
    ///
    /// See section 1.4 for information on the configuration process. See section
    /// 3.1.2 for the underlying Read Flash Data HID command and table 3-6 for the
    /// relevant subcommand.
    pub fn flash_read_gp_settings(&self) -> Result<GpSettings, Error> {
        let buf = self.transfer(&UsbReport::new(McpCommand::ReadFlashGpSettings))?;
        GpSettings::try_from_flash_buffer(&buf)
    }

    /// Write GP pin settings to flash memory.
    ///
    /// Settings stored in the flash memory of the MCP2221 take effect when the device
    /// is powered-up, so follow this with [`MCP2221::reset`].
    ///
    /// # Datasheet
    ///
    /// See section 3.1.3 for the underlying Write Flash Data HID command and table
    /// 3-13 for the relevant subcommand.
    pub fn flash_write_gp_settings(&self, gp: &GpSettings) -> Result<(), Error> {
        let mut command = UsbReport::new(McpCommand::WriteFlashGpSettings);
        gp.apply_to_flash_buffer(&mut command.write_buffer);
        self.transfer(&command)?;
        Ok(())
    }

    /// Store a GPIO power-up configuration for a single pin.
    ///
    /// The other pins' settings are read back from flash and written unchanged.
    pub fn configure_gpio_pin(
        &self,
        pin: GpPin,
        direction: GpioDirection,
        value: LogicLevel,
    ) -> Result<(), Error> {
        let mut gp = self.flash_read_gp_settings()?;
        gp.set_gpio(pin, direction, value);
        self.flash_write_gp_settings(&gp)?;
        log::info!("{pin} stored in flash as GPIO {direction:?}, default {value:?}");
        Ok(())
    }

    /// Store a dedicated-function power-up designation for the function's pin.
    ///
    /// The other pins' settings are read back from flash and written unchanged.
    pub fn configure_alt_function(&self, function: AltFunction) -> Result<(), Error> {
        let mut gp = self.flash_read_gp_settings()?;
        gp.set_alt_function(function);
        self.flash_write_gp_settings(&gp)?;
        log::info!("{} stored in flash as {function}", function.pin());
        Ok(())
    }
}
