#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod bridge;
mod commands;
pub mod config;
mod constants;
pub mod delay;
mod driver;
mod error;
pub mod gpio;
pub mod i2c;
pub mod ina260;
pub mod session;
pub mod settings;
pub mod status;

pub use bridge::Bridge;
pub use config::ProbeConfig;
pub use driver::MCP2221;
pub use error::Error;
pub use ina260::DieId;
pub use session::{FailureKind, ProbeError, Session};
