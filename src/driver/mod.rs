use std::time::{Duration, Instant};

use hidapi::{HidApi, HidDevice};

use crate::Error;
use crate::commands::{McpCommand, UsbReport, check_response};
use crate::constants::{MCP2221_PID, MICROCHIP_VID};
use crate::status::Status;

mod flash;
mod i2c;
mod i2c_eh;

/// How long to wait for each response report before giving up.
const RESPONSE_TIMEOUT_MS: i32 = 1_000;
/// Interval between device list checks while the MCP2221 re-enumerates after a
/// reset.
const REENUMERATION_POLL: Duration = Duration::from_millis(20);

/// Driver for the MCP2221.
///
/// Open the device with [`MCP2221::open`], or [`MCP2221::open_with_vid_and_pid`] if
/// you have changed its USB vendor or product ID.
///
/// For I2C communication the driver implements the blocking I2C trait from
/// [`embedded_hal`], and offers the inherent [`MCP2221::i2c_read_register`] for the
/// common write-register-then-read pattern.
///
/// The USB handle is released when the driver is dropped or [`MCP2221::close`] is
/// called. After closing, every command fails with [`Error::DeviceClosed`].
pub struct MCP2221 {
    /// Kept for re-opening the device after it re-enumerates on reset.
    api: HidApi,
    /// Underlying [`hidapi`] device.
    ///
    /// The C hidapi library is not thread safe and the `hidapi` types are
    /// appropriately `!Sync`.
    inner: Option<HidDevice>,
    vendor_id: u16,
    product_id: u16,
}

impl std::fmt::Debug for MCP2221 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MCP2221")
            .field("vendor_id", &self.vendor_id)
            .field("product_id", &self.product_id)
            .field("open", &self.inner.is_some())
            .finish()
    }
}

/// Returns true if the device list from the last refresh includes the IDs.
fn is_listed(api: &HidApi, vendor_id: u16, product_id: u16) -> bool {
    api.device_list()
        .any(|d| d.vendor_id() == vendor_id && d.product_id() == product_id)
}

/// Open the first HID device with the given IDs, distinguishing a missing device
/// from other USB failures.
fn open_device(api: &mut HidApi, vendor_id: u16, product_id: u16) -> Result<HidDevice, Error> {
    api.refresh_devices()?;
    if !is_listed(api, vendor_id, product_id) {
        return Err(Error::DeviceNotFound {
            vendor_id,
            product_id,
        });
    }
    Ok(api.open(vendor_id, product_id)?)
}

/// Wait for a reset device to drop off the bus, then re-open it.
///
/// `listed` and `open` are polled every `interval` against `host`. Both phases
/// share one deadline, after which [`Error::ResetTimeout`] is returned. Opening
/// is not attempted while the device is still listed, as that would find the
/// departing device.
fn await_reenumeration<H, T>(
    host: &mut H,
    timeout: Duration,
    interval: Duration,
    mut listed: impl FnMut(&mut H) -> bool,
    mut open: impl FnMut(&mut H) -> Result<T, Error>,
) -> Result<T, Error> {
    let deadline = Instant::now() + timeout;
    while listed(host) {
        if Instant::now() >= deadline {
            return Err(Error::ResetTimeout(timeout));
        }
        std::thread::sleep(interval);
    }
    log::trace!("device left enumeration");

    loop {
        std::thread::sleep(interval);
        match open(host) {
            Ok(device) => return Ok(device),
            Err(e) if Instant::now() < deadline => {
                log::trace!("device not back yet: {e}");
            }
            Err(_) => return Err(Error::ResetTimeout(timeout)),
        }
    }
}

impl MCP2221 {
    ////////////////////////////////////////////////////////////////////////////////
    // Constructors - USB methods
    ////////////////////////////////////////////////////////////////////////////////

    /// Open the first USB device found with the default vendor and product ID.
    ///
    /// The default VID is 1240 (0x4D8) and PID 221 (0xDD) for both the original
    /// MCP2221 and the (more common) MCP2221A.
    ///
    /// # Errors
    ///
    /// [`Error::DeviceNotFound`] if no such device is attached, otherwise
    /// [`Error::HidApi`] if the device cannot be opened.
    pub fn open() -> Result<Self, Error> {
        MCP2221::open_with_vid_and_pid(MICROCHIP_VID, MCP2221_PID)
    }

    /// Open the first USB device found with the given vendor and product ID.
    ///
    /// # Errors
    ///
    /// As for [`MCP2221::open`].
    pub fn open_with_vid_and_pid(vendor_id: u16, product_id: u16) -> Result<Self, Error> {
        let mut api = HidApi::new()?;
        let device = open_device(&mut api, vendor_id, product_id)?;
        log::debug!("opened MCP2221 {vendor_id:04X}:{product_id:04X}");
        Ok(Self {
            api,
            inner: Some(device),
            vendor_id,
            product_id,
        })
    }

    /// Release the USB handle.
    ///
    /// Calling this more than once has no further effect.
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            log::debug!(
                "closed MCP2221 {:04X}:{:04X}",
                self.vendor_id,
                self.product_id
            );
        }
    }

    /// Returns true until [`MCP2221::close`] is called.
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    fn device(&self) -> Result<&HidDevice, Error> {
        self.inner.as_ref().ok_or(Error::DeviceClosed)
    }

    ////////////////////////////////////////////////////////////////////////////////
    // USB report exchange with the MCP2221
    ////////////////////////////////////////////////////////////////////////////////

    /// Write a report that the MCP2221 does not answer.
    fn send(&self, report: &UsbReport) -> Result<(), Error> {
        log::trace!("hid out {:02X?}", &report.write_buffer[..8]);
        let written = self.device()?.write(&report.report_bytes())?;
        assert_eq!(written, 65, "Didn't write full report.");
        Ok(())
    }

    /// Write the given command to the MCP and read the 64-byte response.
    fn transfer(&self, report: &UsbReport) -> Result<[u8; 64], Error> {
        debug_assert!(!report.has_no_response());
        self.send(report)?;

        let mut response = [0u8; 64];
        let read = self
            .device()?
            .read_timeout(&mut response, RESPONSE_TIMEOUT_MS)?;
        if read == 0 {
            return Err(Error::ResponseTimeout(Duration::from_millis(
                RESPONSE_TIMEOUT_MS as u64,
            )));
        }
        assert_eq!(read, 64, "Didn't read full report.");
        log::trace!("hid in  {:02X?}", &response[..8]);

        check_response(report, &response)?;
        Ok(response)
    }

    ////////////////////////////////////////////////////////////////////////////////
    // MCP2221 general commands
    ////////////////////////////////////////////////////////////////////////////////

    /// Read the status of the MCP2221.
    ///
    /// The returned structure includes the current status of the I2C engine, and the
    /// hardware and firmware revision numbers.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.1 for the underlying Status/Set Parameters HID command.
    pub fn status(&self) -> Result<Status, Error> {
        let buf = self.transfer(&UsbReport::new(McpCommand::StatusSetParameters))?;
        Ok(Status::from_buffer(&buf))
    }

    /// Reset the MCP2221 and wait for it to come back.
    ///
    /// Settings written to flash only take effect on power-up, so this is needed
    /// after the `configure_*` methods. The chip re-enumerates with the USB host, so
    /// the current handle is released and the device re-opened by the same VID and
    /// PID until it succeeds or `timeout` has elapsed.
    ///
    /// # Errors
    ///
    /// [`Error::ResetTimeout`] if the device could not be re-opened in time. The
    /// driver is left closed in that case.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.15 for the underlying Reset Chip HID command, and section
    /// 4.2.3 for reset timings.
    pub fn reset(&mut self, timeout: Duration) -> Result<(), Error> {
        self.send(&UsbReport::new(McpCommand::ResetChip))?;
        self.inner = None;
        log::debug!("reset issued, waiting up to {timeout:?} for re-enumeration");

        let (vendor_id, product_id) = (self.vendor_id, self.product_id);
        let device = await_reenumeration(
            &mut self.api,
            timeout,
            REENUMERATION_POLL,
            |api| match api.refresh_devices() {
                Ok(()) => is_listed(api, vendor_id, product_id),
                Err(e) => {
                    log::trace!("device list refresh failed: {e}");
                    true
                }
            },
            |api| open_device(api, vendor_id, product_id),
        )?;
        self.inner = Some(device);
        log::debug!("MCP2221 re-opened after reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLL: Duration = Duration::from_millis(1);

    /// Stand-in for the host's device list during a reset.
    #[derive(Default)]
    struct Host {
        listed_checks: u32,
        open_attempts: u32,
    }

    #[test]
    fn reopens_once_device_has_left_and_returned() {
        let mut host = Host::default();
        let result = await_reenumeration(
            &mut host,
            Duration::from_secs(5),
            POLL,
            |h| {
                h.listed_checks += 1;
                h.listed_checks < 3
            },
            |h| {
                h.open_attempts += 1;
                if h.open_attempts < 4 {
                    Err(Error::DeviceNotFound {
                        vendor_id: MICROCHIP_VID,
                        product_id: MCP2221_PID,
                    })
                } else {
                    Ok(h.open_attempts)
                }
            },
        );
        assert_eq!(result.unwrap(), 4);
        assert_eq!(host.listed_checks, 3);
    }

    #[test]
    fn device_that_never_leaves_times_out_without_opening() {
        let mut host = Host::default();
        let timeout = Duration::from_millis(20);
        let result = await_reenumeration(
            &mut host,
            timeout,
            POLL,
            |_| true,
            |h| {
                h.open_attempts += 1;
                Ok(())
            },
        );
        assert!(matches!(result, Err(Error::ResetTimeout(t)) if t == timeout));
        assert_eq!(host.open_attempts, 0);
    }

    #[test]
    fn device_that_never_returns_times_out() {
        let mut host = Host::default();
        let timeout = Duration::from_millis(20);
        let result: Result<(), Error> = await_reenumeration(
            &mut host,
            timeout,
            POLL,
            |_| false,
            |h| {
                h.open_attempts += 1;
                Err(Error::DeviceNotFound {
                    vendor_id: MICROCHIP_VID,
                    product_id: MCP2221_PID,
                })
            },
        );
        assert!(matches!(result, Err(Error::ResetTimeout(t)) if t == timeout));
        assert!(host.open_attempts >= 1);
    }
}
