use std::process::ExitCode;

use env_logger::Env;
use ina260_probe::delay::Delay;
use ina260_probe::session::{self, Session};
use ina260_probe::{Error, ProbeConfig, ProbeError};

fn run(config: &ProbeConfig) -> Result<u32, ProbeError<Error>> {
    let session = Session::open(config)?;
    session.run(config, &mut Delay, session::log_reading)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = ProbeConfig::default();
    match run(&config) {
        Ok(reads) => {
            log::debug!("{reads} reads completed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
