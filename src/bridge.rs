//! The operations the probe needs from a USB to I2C bridge.

use std::time::Duration;

use embedded_hal::i2c::I2c;

use crate::MCP2221;
use crate::gpio::{GpPin, GpioDirection, LogicLevel};
use crate::i2c::I2cSpeed;
use crate::settings::AltFunction;

/// A bridge chip whose pins and I2C bus the probe sequences.
///
/// Opening the bridge is left to the implementing type. Register reads go through
/// the bridge's [`embedded_hal`] I2C bus, which shares the bridge's error type.
pub trait Bridge {
    /// Error returned by every bridge operation.
    type Error: embedded_hal::i2c::Error + std::fmt::Display;
    /// The I2C bus the bridge masters.
    type Bus: I2c<Error = Self::Error>;

    /// Store a GPIO power-up configuration for `pin`.
    fn configure_gpio_pin(
        &mut self,
        pin: GpPin,
        direction: GpioDirection,
        value: LogicLevel,
    ) -> Result<(), Self::Error>;

    /// Store a dedicated-function power-up designation.
    fn configure_alt_function(&mut self, function: AltFunction) -> Result<(), Self::Error>;

    /// Reset the chip and block until it is usable again, or `timeout` elapses.
    fn reset(&mut self, timeout: Duration) -> Result<(), Self::Error>;

    /// Set the I2C bus speed.
    fn set_i2c_bus_speed(&mut self, speed: I2cSpeed) -> Result<(), Self::Error>;

    /// The bridge's I2C bus.
    fn i2c(&mut self) -> &mut Self::Bus;

    /// Release the bridge. Calling this more than once has no further effect.
    fn close(&mut self);

    /// Fill `buf` from consecutive bytes of a target's register.
    fn read_register(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c().write_read(address, &[register], buf)
    }
}

impl Bridge for MCP2221 {
    type Error = crate::Error;
    type Bus = Self;

    fn configure_gpio_pin(
        &mut self,
        pin: GpPin,
        direction: GpioDirection,
        value: LogicLevel,
    ) -> Result<(), Self::Error> {
        MCP2221::configure_gpio_pin(self, pin, direction, value)
    }

    fn configure_alt_function(&mut self, function: AltFunction) -> Result<(), Self::Error> {
        MCP2221::configure_alt_function(self, function)
    }

    fn reset(&mut self, timeout: Duration) -> Result<(), Self::Error> {
        MCP2221::reset(self, timeout)
    }

    fn set_i2c_bus_speed(&mut self, speed: I2cSpeed) -> Result<(), Self::Error> {
        self.i2c_set_bus_speed(speed)
    }

    fn i2c(&mut self) -> &mut Self::Bus {
        self
    }

    fn close(&mut self) {
        MCP2221::close(self)
    }

    fn read_register(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c_read_register(address, register, buf)
    }
}
