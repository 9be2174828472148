//! The probe sequence: configure the bridge, then poll the sensor's die ID.

use embedded_hal::delay::DelayNs;

use crate::bridge::Bridge;
use crate::config::ProbeConfig;
use crate::gpio::{GpPin, GpioDirection, LogicLevel};
use crate::i2c::I2cSpeed;
use crate::ina260::{self, DieId};
use crate::settings::AltFunction;
use crate::{Error, MCP2221};

/// Failure of one step of the probe sequence.
///
/// Every step is fatal. `E` is the error type of the bridge.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError<E> {
    /// The bridge could not be opened.
    #[error("opening the bridge failed: {0}")]
    Open(E),
    /// Storing the GPIO pin configuration failed.
    #[error("storing the {pin} GPIO configuration failed: {error}")]
    ConfigurePin {
        /// Pin being configured.
        pin: GpPin,
        /// Bridge error.
        error: E,
    },
    /// Storing the alternate function designation failed.
    #[error("storing the {function} designation failed: {error}")]
    ConfigureAltFunction {
        /// Function being designated.
        function: AltFunction,
        /// Bridge error.
        error: E,
    },
    /// The bridge did not come back after reset.
    #[error("reset failed: {0}")]
    Reset(E),
    /// The I2C bus speed was rejected.
    #[error("setting the I2C bus speed to {speed} failed: {error}")]
    SetBusSpeed {
        /// Requested speed.
        speed: I2cSpeed,
        /// Bridge error.
        error: E,
    },
    /// A register read failed.
    #[error("register read {iteration} failed: {error}")]
    ReadRegister {
        /// 1-based number of the failed read.
        iteration: u32,
        /// Bridge error.
        error: E,
    },
}

/// Broad origin of a [`ProbeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The device was missing or the USB transport failed while opening.
    DeviceOpen,
    /// Pin or bus configuration was rejected.
    Config,
    /// The device did not come back after reset.
    Timeout,
    /// An I2C register read failed.
    I2c,
}

impl<E> ProbeError<E> {
    /// Which kind of step failed.
    pub fn kind(&self) -> FailureKind {
        match self {
            ProbeError::Open(_) => FailureKind::DeviceOpen,
            ProbeError::ConfigurePin { .. }
            | ProbeError::ConfigureAltFunction { .. }
            | ProbeError::SetBusSpeed { .. } => FailureKind::Config,
            ProbeError::Reset(_) => FailureKind::Timeout,
            ProbeError::ReadRegister { .. } => FailureKind::I2c,
        }
    }
}

/// Exclusive use of a bridge for the length of a probe run.
///
/// The bridge is closed when the session is dropped, whichever way the run ends.
pub struct Session<B: Bridge> {
    bridge: B,
}

impl Session<MCP2221> {
    /// Open the MCP2221 with the configured VID and PID.
    pub fn open(config: &ProbeConfig) -> Result<Self, ProbeError<Error>> {
        Self::open_with(|| MCP2221::open_with_vid_and_pid(config.vendor_id, config.product_id))
    }
}

impl<B: Bridge> Session<B> {
    /// Take ownership of an already-open bridge.
    pub fn new(bridge: B) -> Self {
        Self { bridge }
    }

    /// Open a bridge with `open` and take ownership of it.
    pub fn open_with(
        open: impl FnOnce() -> Result<B, B::Error>,
    ) -> Result<Self, ProbeError<B::Error>> {
        open().map(Self::new).map_err(ProbeError::Open)
    }

    /// Store the pin configuration, reset, and set the bus speed.
    pub fn configure(&mut self, config: &ProbeConfig) -> Result<(), ProbeError<B::Error>> {
        let pin = config.gate_pin;
        self.bridge
            .configure_gpio_pin(pin, GpioDirection::Output, LogicLevel::Low)
            .map_err(|error| ProbeError::ConfigurePin { pin, error })?;

        let function = config.activity_led;
        self.bridge
            .configure_alt_function(function)
            .map_err(|error| ProbeError::ConfigureAltFunction { function, error })?;

        self.bridge
            .reset(config.reset_timeout)
            .map_err(ProbeError::Reset)?;

        let speed = config.bus_speed;
        self.bridge
            .set_i2c_bus_speed(speed)
            .map_err(|error| ProbeError::SetBusSpeed { speed, error })?;
        log::debug!("bridge configured");
        Ok(())
    }

    /// Read the die ID register `config.iterations` times.
    ///
    /// `on_reading` receives the 1-based iteration and the decoded register after
    /// each read. The first failed read ends polling.
    pub fn poll<D: DelayNs>(
        &mut self,
        config: &ProbeConfig,
        delay: &mut D,
        mut on_reading: impl FnMut(u32, DieId),
    ) -> Result<u32, ProbeError<B::Error>> {
        let interval_ms = u32::try_from(config.poll_interval.as_millis()).unwrap_or(u32::MAX);
        for iteration in 1..=config.iterations {
            let mut buf = [0u8; ina260::REGISTER_LENGTH];
            self.bridge
                .read_register(config.sensor_address, config.register, &mut buf)
                .map_err(|error| ProbeError::ReadRegister { iteration, error })?;
            on_reading(iteration, DieId::from_be_bytes(buf));
            delay.delay_ms(interval_ms);
        }
        Ok(config.iterations)
    }

    /// Configure the bridge and poll, then close it.
    ///
    /// Returns the number of completed reads.
    pub fn run<D: DelayNs>(
        mut self,
        config: &ProbeConfig,
        delay: &mut D,
        on_reading: impl FnMut(u32, DieId),
    ) -> Result<u32, ProbeError<B::Error>> {
        self.configure(config)?;
        self.poll(config, delay, on_reading)
    }
}

impl<B: Bridge> Drop for Session<B> {
    fn drop(&mut self) {
        self.bridge.close();
    }
}

/// Log both fields of a reading at info level.
pub fn log_reading(_iteration: u32, die: DieId) {
    log::info!("{}", ina260::field_line("Revision", die.revision().into()));
    log::info!("{}", ina260::field_line("Device ID", die.device_id()));
}
