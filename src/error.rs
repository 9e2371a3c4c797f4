use thiserror::Error;
use btleplug;

use crate::device::constants::CONNECT_TIMEOUT;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid scan duration {value}: must be a finite, non-negative number of seconds")]
    InvalidScanDuration { value: f64 },
}

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to start listener (config): {source}")]
    ConfigError { #[from] source: ConfigError },

    #[error("Failed to start listener (device): {source}")]
    DeviceError { #[from] source: DeviceError },
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Error communicating with device (btleplug): {source}")]
    Btle { #[from] source: btleplug::Error },

    #[error("No bluetooth adapter is available")]
    NoAdapter,

    #[error("A required bluetooth characteristic is not available")]
    MissingCharacteristic,

    #[error("Connecting to device timed out after {seconds}s")]
    ConnectTimeout { seconds: u64 },

    #[error("Device reported not connected after connecting")]
    NotConnected,

    #[error("Device disconnected")]
    Disconnected,
}

impl DeviceError {
    pub fn connect_timeout() -> Self {
        DeviceError::ConnectTimeout { seconds: CONNECT_TIMEOUT / 1000 }
    }
}
