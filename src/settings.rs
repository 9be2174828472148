//! GP pin power-up settings stored in flash memory.

use bit_field::BitField;

use crate::Error;
use crate::gpio::{GpPin, GpioDirection, LogicLevel};

/// Dedicated (non-GPIO, non-analog) function a GP pin can be designated for.
///
/// Each function is only available on one pin. The short names used in the
/// datasheet are given in parentheses.
///
/// # Datasheet
///
/// See table 1-5 for the pin designations and section 1.7 for each function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AltFunction {
    /// USB Suspend state output on GP0 (SSPND).
    UsbSuspendState,
    /// UART receive traffic indicator on GP0 (LED_URX).
    UartReceiveIndicator,
    /// Digital clock output on GP1 (CLK_OUT).
    ClockOutput,
    /// UART transmit traffic indicator on GP1 (LED_UTX).
    UartTransmitIndicator,
    /// Interrupt-on-change input on GP1 (IOC).
    InterruptDetection,
    /// USB device-configured status output on GP2 (USBCFG).
    UsbDeviceConfiguredStatus,
    /// I2C traffic indicator on GP3 (LED_I2C).
    ///
    /// The pin pulses low for a few milliseconds on I2C activity.
    I2cActivityIndicator,
}

impl AltFunction {
    /// The only pin that can carry this function.
    pub fn pin(self) -> GpPin {
        match self {
            AltFunction::UsbSuspendState | AltFunction::UartReceiveIndicator => GpPin::Gp0,
            AltFunction::ClockOutput
            | AltFunction::UartTransmitIndicator
            | AltFunction::InterruptDetection => GpPin::Gp1,
            AltFunction::UsbDeviceConfiguredStatus => GpPin::Gp2,
            AltFunction::I2cActivityIndicator => GpPin::Gp3,
        }
    }

    /// Datasheet short name of the function.
    pub fn name(self) -> &'static str {
        match self {
            AltFunction::UsbSuspendState => "SSPND",
            AltFunction::UartReceiveIndicator => "LED_URX",
            AltFunction::ClockOutput => "CLK_OUT",
            AltFunction::UartTransmitIndicator => "LED_UTX",
            AltFunction::InterruptDetection => "IOC",
            AltFunction::UsbDeviceConfiguredStatus => "USBCFG",
            AltFunction::I2cActivityIndicator => "LED_I2C",
        }
    }

    /// Designation bits written into the pin's settings byte.
    fn designation(self) -> u8 {
        match self {
            AltFunction::UsbSuspendState => 0b001,
            AltFunction::UartReceiveIndicator => 0b010,
            AltFunction::ClockOutput => 0b001,
            AltFunction::UartTransmitIndicator => 0b011,
            AltFunction::InterruptDetection => 0b100,
            AltFunction::UsbDeviceConfiguredStatus => 0b001,
            AltFunction::I2cActivityIndicator => 0b001,
        }
    }
}

impl std::fmt::Display for AltFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Function a GP pin is designated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// Digital input or output.
    Gpio,
    /// A dedicated function.
    Alternate(AltFunction),
    /// ADC input (GP1 to GP3).
    AnalogInput,
    /// DAC output (GP2 and GP3).
    AnalogOutput,
}

impl PinMode {
    /// Decode the three designation bits for the given pin.
    ///
    /// # Datasheet
    ///
    /// See table 3-6 (the codes are the same for writing, table 3-13).
    fn from_bits(pin: GpPin, bits: u8) -> Result<Self, Error> {
        use AltFunction::*;
        Ok(match (pin, bits) {
            (_, 0b000) => PinMode::Gpio,
            (GpPin::Gp0, 0b001) => PinMode::Alternate(UsbSuspendState),
            (GpPin::Gp0, 0b010) => PinMode::Alternate(UartReceiveIndicator),
            (GpPin::Gp1, 0b001) => PinMode::Alternate(ClockOutput),
            (GpPin::Gp1, 0b010) => PinMode::AnalogInput,
            (GpPin::Gp1, 0b011) => PinMode::Alternate(UartTransmitIndicator),
            (GpPin::Gp1, 0b100) => PinMode::Alternate(InterruptDetection),
            (GpPin::Gp2, 0b001) => PinMode::Alternate(UsbDeviceConfiguredStatus),
            (GpPin::Gp3, 0b001) => PinMode::Alternate(I2cActivityIndicator),
            (GpPin::Gp2 | GpPin::Gp3, 0b010) => PinMode::AnalogInput,
            (GpPin::Gp2 | GpPin::Gp3, 0b011) => PinMode::AnalogOutput,
            (pin, mode) => {
                return Err(Error::InvalidPinModeFromDevice {
                    pin: pin.index() as u8,
                    mode,
                });
            }
        })
    }

    fn into_bits(self) -> u8 {
        match self {
            PinMode::Gpio => 0b000,
            PinMode::Alternate(function) => function.designation(),
            PinMode::AnalogInput => 0b010,
            PinMode::AnalogOutput => 0b011,
        }
    }
}

/// Power-up settings of a single GP pin.
///
/// Direction and value are always stored, but only take effect in GPIO mode
/// (and value only for outputs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinSettings {
    /// Pin designation.
    pub mode: PinMode,
    /// GPIO direction.
    pub direction: GpioDirection,
    /// GPIO output level.
    pub value: LogicLevel,
}

impl PinSettings {
    fn from_byte(pin: GpPin, byte: u8) -> Result<Self, Error> {
        Ok(Self {
            value: byte.get_bit(4).into(),
            direction: byte.get_bit(3).into(),
            mode: PinMode::from_bits(pin, byte.get_bits(0..=2))?,
        })
    }

    fn to_byte(self) -> u8 {
        let mut byte = 0u8;
        byte.set_bit(4, self.value.into());
        byte.set_bit(3, self.direction.into());
        byte.set_bits(0..=2, self.mode.into_bits());
        byte
    }
}

/// GP pin settings for all four pins, as stored in flash.
///
/// Settings in flash take effect when the MCP2221 powers up or is reset.
///
/// # Datasheet
///
/// See table 3-6 for the Read Flash Data layout and table 3-13 for the Write
/// Flash Data layout. Both use one byte per pin, in pin order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpSettings {
    pins: [PinSettings; 4],
}

/// GP0 settings byte in the Read Flash Data - GP Settings response.
const FLASH_READ_START_BYTE: usize = 4;
/// GP0 settings byte in the Write Flash Data - GP Settings command.
const FLASH_WRITE_START_BYTE: usize = 2;

const PINS: [GpPin; 4] = [GpPin::Gp0, GpPin::Gp1, GpPin::Gp2, GpPin::Gp3];

impl GpSettings {
    /// Parse GP pin settings read from flash memory.
    pub(crate) fn try_from_flash_buffer(buf: &[u8; 64]) -> Result<Self, Error> {
        let mut pins = [PinSettings {
            mode: PinMode::Gpio,
            direction: GpioDirection::Input,
            value: LogicLevel::Low,
        }; 4];
        for (settings, pin) in pins.iter_mut().zip(PINS) {
            *settings = PinSettings::from_byte(pin, buf[FLASH_READ_START_BYTE + pin.index()])?;
        }
        Ok(Self { pins })
    }

    /// Apply the settings to a Write Flash Data - GP Settings command buffer.
    pub(crate) fn apply_to_flash_buffer(&self, buf: &mut [u8; 64]) {
        for pin in PINS {
            buf[FLASH_WRITE_START_BYTE + pin.index()] = self.pin(pin).to_byte();
        }
    }

    /// Settings of the given pin.
    pub fn pin(&self, pin: GpPin) -> PinSettings {
        self.pins[pin.index()]
    }

    /// Designate `pin` for GPIO with the given direction and output level.
    pub fn set_gpio(&mut self, pin: GpPin, direction: GpioDirection, value: LogicLevel) {
        self.pins[pin.index()] = PinSettings {
            mode: PinMode::Gpio,
            direction,
            value,
        };
    }

    /// Designate the function's pin for that function.
    ///
    /// The pin's GPIO direction and value are left as they were.
    pub fn set_alt_function(&mut self, function: AltFunction) {
        self.pins[function.pin().index()].mode = PinMode::Alternate(function);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flash_response(gp: [u8; 4]) -> [u8; 64] {
        let mut buf = [0u8; 64];
        buf[0] = 0xB0;
        buf[2] = 0x04;
        buf[4..8].copy_from_slice(&gp);
        buf
    }

    #[test]
    fn parse_flash_gp_settings() {
        // GP0 output high GPIO, GP1 IOC, GP2 DAC, GP3 LED_I2C input.
        let settings =
            GpSettings::try_from_flash_buffer(&flash_response([0x10, 0x04, 0x03, 0x09])).unwrap();
        assert_eq!(
            settings.pin(GpPin::Gp0),
            PinSettings {
                mode: PinMode::Gpio,
                direction: GpioDirection::Output,
                value: LogicLevel::High,
            }
        );
        assert_eq!(
            settings.pin(GpPin::Gp1).mode,
            PinMode::Alternate(AltFunction::InterruptDetection)
        );
        assert_eq!(settings.pin(GpPin::Gp2).mode, PinMode::AnalogOutput);
        let gp3 = settings.pin(GpPin::Gp3);
        assert_eq!(gp3.mode, PinMode::Alternate(AltFunction::I2cActivityIndicator));
        assert_eq!(gp3.direction, GpioDirection::Input);
    }

    #[test]
    fn reject_unknown_designation() {
        // GP0 has no analog functions.
        let err = GpSettings::try_from_flash_buffer(&flash_response([0x03, 0, 0, 0])).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPinModeFromDevice { pin: 0, mode: 0b011 }
        ));
        let err = GpSettings::try_from_flash_buffer(&flash_response([0, 0, 0, 0x07])).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPinModeFromDevice { pin: 3, mode: 0b111 }
        ));
    }

    #[test]
    fn write_layout_starts_at_byte_two() {
        let mut settings =
            GpSettings::try_from_flash_buffer(&flash_response([0x02, 0x02, 0x01, 0x00])).unwrap();
        settings.set_gpio(GpPin::Gp0, GpioDirection::Output, LogicLevel::Low);
        settings.set_alt_function(AltFunction::I2cActivityIndicator);

        let mut buf = [0u8; 64];
        settings.apply_to_flash_buffer(&mut buf);
        assert_eq!(buf[2..6], [0x00, 0x02, 0x01, 0x01]);
        assert!(buf[6..].iter().all(|&b| b == 0));
    }

    #[test]
    fn alt_function_keeps_gpio_fields() {
        let mut settings =
            GpSettings::try_from_flash_buffer(&flash_response([0, 0, 0, 0x18])).unwrap();
        settings.set_alt_function(AltFunction::I2cActivityIndicator);
        let gp3 = settings.pin(GpPin::Gp3);
        assert_eq!(gp3.value, LogicLevel::High);
        assert_eq!(gp3.direction, GpioDirection::Input);
        assert_eq!(gp3.to_byte(), 0x19);
    }

    #[test]
    fn functions_live_on_one_pin() {
        assert_eq!(AltFunction::I2cActivityIndicator.pin(), GpPin::Gp3);
        assert_eq!(AltFunction::ClockOutput.pin(), GpPin::Gp1);
        assert_eq!(AltFunction::I2cActivityIndicator.to_string(), "LED_I2C");
    }
}
