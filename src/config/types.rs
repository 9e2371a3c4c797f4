use std::time::Duration;
use clap::Parser;

use crate::device::constants::{DEFAULT_NAME_PREFIX, DEFAULT_SCAN_SECONDS};
use crate::error::ConfigError;

/// Listen for text notifications from an ESP32 over the Nordic UART Service.
#[derive(Parser, Debug, Clone)]
#[command(name = "ble-listener", version, about)]
pub struct Args {
    /// Prefix of the advertised device name
    #[arg(long, default_value = DEFAULT_NAME_PREFIX)]
    pub name: String,

    /// Device address (MAC on Linux/Android, peripheral id on Windows/macOS); skips scanning
    #[arg(long)]
    pub addr: Option<String>,

    /// Scan duration in seconds
    #[arg(long, default_value_t = DEFAULT_SCAN_SECONDS)]
    pub scan: f64,

    /// Log debug messages
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub name_prefix: Option<String>,
    pub address: Option<String>,
    pub scan_duration: Duration,
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let scan_duration = Duration::try_from_secs_f64(args.scan)
            .map_err(|_| ConfigError::InvalidScanDuration { value: args.scan })?;

        Ok(Config {
            name_prefix: non_empty(args.name),
            address: args.addr.and_then(non_empty),
            scan_duration,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            name_prefix: Some(DEFAULT_NAME_PREFIX.to_string()),
            address: None,
            scan_duration: Duration::from_secs_f64(DEFAULT_SCAN_SECONDS),
        }
    }
}
