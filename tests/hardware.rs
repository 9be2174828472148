//! Tests against an MCP2221A with an INA260 at address 0x40.
//!
//! These need the hardware attached and are ignored by default. Run them serially,
//! because two threads cannot hold the USB device at once:
//!
//! ```text
//! cargo test --test hardware -- --ignored --test-threads=1
//! ```
use std::time::Duration;

use embedded_hal::i2c::I2c;
use ina260_probe::delay::Delay;
use ina260_probe::{Bridge, DieId, Error, MCP2221, ProbeConfig, Session};

/// Device ID the INA260 reports in the upper 12 bits of its die ID register.
const INA260_DEVICE_ID: u16 = 0x227;

#[test]
#[ignore = "needs an MCP2221A and INA260"]
fn die_id_register_reads_ina260() -> Result<(), Error> {
    let mut device = MCP2221::open()?;
    let mut buf = [0u8; 2];
    device.write_read(0x40, &[0xFF], &mut buf)?;
    assert_eq!(DieId::from_be_bytes(buf).device_id(), INA260_DEVICE_ID);
    Ok(())
}

#[test]
#[ignore = "needs an MCP2221A and INA260"]
fn bridge_register_read_matches_write_read() -> Result<(), Error> {
    let mut device = MCP2221::open()?;
    let mut via_bridge = [0u8; 2];
    Bridge::read_register(&mut device, 0x40, 0xFF, &mut via_bridge)?;
    let mut via_inherent = [0u8; 2];
    device.i2c_read_register(0x40, 0xFF, &mut via_inherent)?;
    assert_eq!(via_bridge, via_inherent);
    assert_eq!(DieId::from_be_bytes(via_bridge).device_id(), INA260_DEVICE_ID);
    Ok(())
}

#[test]
#[ignore = "needs an MCP2221A and INA260"]
fn short_probe_run_completes() {
    let config = ProbeConfig {
        iterations: 5,
        poll_interval: Duration::from_millis(1),
        ..ProbeConfig::default()
    };
    let session = Session::open(&config).expect("open bridge");
    let mut ids = Vec::new();
    let reads = session
        .run(&config, &mut Delay, |_, die| ids.push(die.device_id()))
        .expect("probe run");
    assert_eq!(reads, 5);
    assert!(ids.iter().all(|&id| id == INA260_DEVICE_ID));
}

#[test]
#[ignore = "needs an MCP2221A"]
fn commands_fail_after_close() -> Result<(), Error> {
    let mut device = MCP2221::open()?;
    device.close();
    device.close();
    assert!(!device.is_open());
    assert!(matches!(device.status(), Err(Error::DeviceClosed)));
    Ok(())
}

#[test]
#[ignore = "needs an MCP2221A"]
fn missing_device_is_reported() {
    let err = MCP2221::open_with_vid_and_pid(0x04D8, 0xFFFF).unwrap_err();
    assert!(matches!(err, Error::DeviceNotFound { .. }));
}
