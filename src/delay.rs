//! Host delay for code written against [`embedded_hal::delay::DelayNs`].
use std::time::Duration;

use embedded_hal::delay::DelayNs;

/// Blocks the current thread with [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Delay;

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(u64::from(us)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
