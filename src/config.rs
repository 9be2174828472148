//! Fixed settings of the probe run.

use std::time::Duration;

use crate::constants::{MCP2221_PID, MICROCHIP_VID};
use crate::gpio::GpPin;
use crate::i2c::I2cSpeed;
use crate::ina260;
use crate::settings::AltFunction;

/// Everything the probe sequence is parameterised by.
///
/// The binary takes no arguments and always runs with [`ProbeConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// USB vendor ID of the bridge.
    pub vendor_id: u16,
    /// USB product ID of the bridge.
    pub product_id: u16,
    /// GP pin driving the sensor's MOSFET gate, stored as a GPIO output, low.
    pub gate_pin: GpPin,
    /// Dedicated function stored for the activity LED pin.
    pub activity_led: AltFunction,
    /// How long to wait for the bridge to come back after reset.
    pub reset_timeout: Duration,
    /// I2C bus speed.
    pub bus_speed: I2cSpeed,
    /// 7-bit address of the INA260.
    pub sensor_address: u8,
    /// Register read each iteration.
    pub register: u8,
    /// Number of register reads.
    pub iterations: u32,
    /// Pause after each read.
    pub poll_interval: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            vendor_id: MICROCHIP_VID,
            product_id: MCP2221_PID,
            gate_pin: GpPin::Gp0,
            activity_led: AltFunction::I2cActivityIndicator,
            reset_timeout: Duration::from_secs(5),
            bus_speed: I2cSpeed::STANDARD,
            sensor_address: ina260::DEFAULT_ADDRESS,
            register: ina260::DIE_ID_REGISTER,
            iterations: 100,
            poll_interval: Duration::from_millis(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_ina260_die_id() {
        let config = ProbeConfig::default();
        assert_eq!((config.vendor_id, config.product_id), (1240, 221));
        assert_eq!(config.sensor_address, 0x40);
        assert_eq!(config.register, 0xFF);
        assert_eq!(config.iterations, 100);
        assert_eq!(config.activity_led.pin(), GpPin::Gp3);
    }
}
