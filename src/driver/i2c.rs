//! I2C-related driver public methods and helpers.
use std::time::Duration;

use super::MCP2221;
use crate::Error;
use crate::commands::{McpCommand, UsbReport, check_bus_speed_response};
use crate::constants::MAX_I2C_TRANSFER_PLUS_1;
use crate::i2c::{CancelI2cTransferResponse, I2cAddressing, I2cSpeed, ReadType, WriteType};

/// The host can issue commands faster than the I2C engine gets through them, so
/// busy and read-error responses are retried this many times.
const MAX_RETRIES: u8 = 20;
/// With 2ms the MCP2221 has usually caught up by the next attempt.
const RETRY_DELAY: Duration = Duration::from_millis(2);

/// Largest data payload carried by a single I2C write or Get Data report.
const REPORT_PAYLOAD: usize = 60;

/// Run `op` until it succeeds, fails with an error `retryable` rejects, or the
/// retries run out.
fn with_retries<T>(
    retryable: fn(&Error) -> bool,
    mut op: impl FnMut() -> Result<T, Error>,
) -> Result<T, Error> {
    let mut retries = MAX_RETRIES;
    loop {
        match op() {
            Err(e) if retryable(&e) && retries > 0 => {
                retries -= 1;
                log::trace!("retrying I2C command after: {e}");
                std::thread::sleep(RETRY_DELAY);
            }
            result => return result,
        }
    }
}

fn engine_busy(e: &Error) -> bool {
    matches!(e, Error::I2cEngineBusy)
}

fn engine_read_error(e: &Error) -> bool {
    matches!(e, Error::I2cEngineReadError)
}

/// Transfer length as the little-endian pair the I2C commands expect.
fn transfer_length(len: usize) -> Result<[u8; 2], Error> {
    match len {
        0 => Err(Error::I2cTransferEmpty),
        MAX_I2C_TRANSFER_PLUS_1.. => Err(Error::I2cTransferTooLong),
        len => Ok((len as u16).to_le_bytes()),
    }
}

/// I2C-related commands.
impl MCP2221 {
    /// Set the speed of the I2C bus.
    ///
    /// # Errors
    ///
    /// [`Error::I2cTransferPreventedSpeedChange`] if an ongoing I2C transfer
    /// prevented the device from setting the bus speed.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.1 of the datasheet for the underlying Status/Set Parameters
    /// HID command.
    pub fn i2c_set_bus_speed(&self, speed: I2cSpeed) -> Result<(), Error> {
        let mut command = UsbReport::new(McpCommand::StatusSetParameters);
        // 0x20 tells the device the next byte is the system clock divider for the
        // I2C clock.
        command.set_data_byte(3, 0x20);
        command.set_data_byte(4, speed.to_clock_divider());
        let response = self.transfer(&command)?;
        check_bus_speed_response(&response)?;
        log::info!("I2C bus speed set to {speed}");
        Ok(())
    }

    /// Cancel the current I2C transfer.
    ///
    /// The cancellation is only issued if the I2C engine is busy, as cancelling
    /// when idle appears to leave the engine in a persistent busy state.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.1 of the datasheet for the underlying Status/Set Parameters
    /// HID command.
    pub fn i2c_cancel_transfer(&self) -> Result<CancelI2cTransferResponse, Error> {
        if self.status()?.i2c.is_idle() {
            return Ok(CancelI2cTransferResponse::NoTransfer);
        }

        let mut command = UsbReport::new(McpCommand::StatusSetParameters);
        command.set_data_byte(2, 0x10);
        let response = self.transfer(&command)?;
        let outcome = match response[2] {
            0x10 => CancelI2cTransferResponse::MarkedForCancellation,
            0x11 => CancelI2cTransferResponse::NoTransfer,
            _ => CancelI2cTransferResponse::Done,
        };
        log::debug!("I2C transfer cancel: {outcome:?}");
        Ok(outcome)
    }

    /// Cancel the transfer and fail if the target did not acknowledge its address.
    fn i2c_bail_for_nack(&self) -> Result<(), Error> {
        if self.status()?.i2c.ack_received {
            Ok(())
        } else {
            self.i2c_cancel_transfer()?;
            Err(Error::I2cAddressNack)
        }
    }

    /// Read data from an I2C target.
    ///
    /// The address must be the 7-bit address. Zero-length reads are refused, as the
    /// target can lock up the bus if it holds SDA low for the first bit.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.8 for the underlying I2C Read Data HID command.
    pub fn i2c_read(&self, seven_bit_address: u8, read_buffer: &mut [u8]) -> Result<(), Error> {
        self.read_with(seven_bit_address, read_buffer, ReadType::Normal)
    }

    /// Read data from an I2C target with a repeated START condition.
    ///
    /// Used after [`MCP2221::i2c_write_no_stop`] to complete a write-read.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.9 for the underlying I2C Read Data Repeated-START HID command.
    pub fn i2c_read_repeated_start(
        &self,
        seven_bit_address: u8,
        read_buffer: &mut [u8],
    ) -> Result<(), Error> {
        self.read_with(seven_bit_address, read_buffer, ReadType::RepeatedStart)
    }

    fn read_with(
        &self,
        seven_bit_address: u8,
        read_buffer: &mut [u8],
        read_type: ReadType,
    ) -> Result<(), Error> {
        let [len_low, len_high] = transfer_length(read_buffer.len())?;
        let mut command = UsbReport::new(read_type.into());
        command.set_data_byte(1, len_low);
        command.set_data_byte(2, len_high);
        command.set_data_byte(3, seven_bit_address.into_read_address());

        with_retries(engine_busy, || self.transfer(&command))?;
        self.i2c_bail_for_nack()?;
        self.i2c_get_data(read_buffer)
    }

    /// Fetch the data of a requested read back from the MCP2221.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.10 for the underlying I2C Read Data - Get I2C Data command.
    fn i2c_get_data(&self, read_buffer: &mut [u8]) -> Result<(), Error> {
        let get_command = UsbReport::new(McpCommand::I2cGetData);
        let mut read_so_far = 0;

        while read_so_far < read_buffer.len() {
            let response = with_retries(engine_read_error, || {
                let response = self.transfer(&get_command)?;
                // 127 in the length byte flags a failed engine read.
                if response[3] == 127 {
                    return Err(Error::I2cEngineReadError);
                }
                Ok(response)
            })?;
            let remaining = read_buffer.len() - read_so_far;
            let chunk = (response[3] as usize).min(REPORT_PAYLOAD).min(remaining);
            if chunk == 0 {
                return Err(Error::I2cOperationFailed);
            }
            read_buffer[read_so_far..read_so_far + chunk].copy_from_slice(&response[4..4 + chunk]);
            read_so_far += chunk;
        }
        Ok(())
    }

    /// Write data to an I2C target.
    ///
    /// The address must be the 7-bit address. The data can be at most 65,535 bytes
    /// long and must not be empty.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.5 for the underlying I2C Write Data HID command.
    pub fn i2c_write(&self, seven_bit_address: u8, write_buffer: &[u8]) -> Result<(), Error> {
        self.write_with(seven_bit_address, write_buffer, WriteType::Normal)
    }

    /// Write data to an I2C target without a final STOP condition.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.7 for the underlying I2C Write Data NO STOP HID command.
    pub fn i2c_write_no_stop(
        &self,
        seven_bit_address: u8,
        write_buffer: &[u8],
    ) -> Result<(), Error> {
        self.write_with(seven_bit_address, write_buffer, WriteType::NoStop)
    }

    fn write_with(
        &self,
        seven_bit_address: u8,
        write_buffer: &[u8],
        write_type: WriteType,
    ) -> Result<(), Error> {
        let [len_low, len_high] = transfer_length(write_buffer.len())?;
        let mut command = UsbReport::new(write_type.into());
        command.set_data_byte(1, len_low);
        command.set_data_byte(2, len_high);
        command.set_data_byte(3, seven_bit_address.into_write_address());

        for (idx, chunk) in write_buffer.chunks(REPORT_PAYLOAD).enumerate() {
            command.write_buffer[4..4 + chunk.len()].copy_from_slice(chunk);
            with_retries(engine_busy, || self.transfer(&command))?;
            // The MCP2221 takes writes for a missing target, so the ACK is checked
            // once the address has gone out with the first chunk.
            if idx == 0 {
                self.i2c_bail_for_nack()?;
            }
        }
        Ok(())
    }

    /// Perform an I2C write-read to the given target address.
    ///
    /// The contents of `write_buffer` are written without a final STOP, then a
    /// repeated START is issued and `read_buffer` is filled from the target.
    pub fn i2c_write_read(
        &self,
        seven_bit_address: u8,
        write_buffer: &[u8],
        read_buffer: &mut [u8],
    ) -> Result<(), Error> {
        self.i2c_write_no_stop(seven_bit_address, write_buffer)?;
        self.i2c_read_repeated_start(seven_bit_address, read_buffer)
    }

    /// Read `read_buffer.len()` bytes starting at a target's register.
    ///
    /// This is a write-read of the single register address byte.
    pub fn i2c_read_register(
        &self,
        seven_bit_address: u8,
        register: u8,
        read_buffer: &mut [u8],
    ) -> Result<(), Error> {
        self.i2c_write_read(seven_bit_address, &[register], read_buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_length_limits() {
        assert!(matches!(transfer_length(0), Err(Error::I2cTransferEmpty)));
        assert!(matches!(
            transfer_length(65_536),
            Err(Error::I2cTransferTooLong)
        ));
        assert_eq!(transfer_length(2).unwrap(), [0x02, 0x00]);
        assert_eq!(transfer_length(65_535).unwrap(), [0xFF, 0xFF]);
    }

    #[test]
    fn retries_stop_on_other_errors() {
        let mut calls = 0;
        let result: Result<(), Error> = with_retries(engine_busy, || {
            calls += 1;
            Err(Error::I2cAddressNack)
        });
        assert!(matches!(result, Err(Error::I2cAddressNack)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn retries_are_bounded() {
        let mut calls = 0;
        let result: Result<(), Error> = with_retries(engine_busy, || {
            calls += 1;
            Err(Error::I2cEngineBusy)
        });
        assert!(matches!(result, Err(Error::I2cEngineBusy)));
        assert_eq!(calls, MAX_RETRIES as usize + 1);
    }

    #[test]
    fn retry_succeeds_after_busy() {
        let mut calls = 0;
        let result = with_retries(engine_busy, || {
            calls += 1;
            if calls < 3 { Err(Error::I2cEngineBusy) } else { Ok(calls) }
        });
        assert_eq!(result.unwrap(), 3);
    }
}
