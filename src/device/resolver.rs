use log::{info, warn};

use crate::config::types::Config;
use crate::device::transport::BleTransport;
use crate::device::types::DiscoveredDevice;
use crate::error::DeviceError;

pub const NOT_FOUND_HINTS: [&str; 3] = [
    "Long-press the BLE button on the ESP32 to start advertising (the blue LED is 'breathing').",
    "Make sure bluetooth LE is enabled and supported on this computer.",
    "Try a longer scan, for example --scan 10",
];

/// Pick the first device, in scan order, whose advertised name starts with `name_prefix`.
pub fn select_device<'a>(devices: &'a [DiscoveredDevice], name_prefix: &str) -> Option<&'a DiscoveredDevice> {
    devices.iter().find(|device| match &device.name {
        Some(name) => !name.is_empty() && name.starts_with(name_prefix),
        None => false,
    })
}

/// Determine the address to listen to.
///
/// A fixed address from the config is returned as is. Otherwise a single scan of
/// `config.scan_duration` is performed and the first device matching the name prefix wins.
/// `Ok(None)` means nothing matched.
pub async fn resolve<T: BleTransport>(transport: &T, config: &Config) -> Result<Option<String>, DeviceError> {
    if let Some(address) = &config.address {
        info!("Using fixed address {}", address);
        return Ok(Some(address.clone()));
    }

    let name_prefix = match config.name_prefix.as_deref() {
        Some(prefix) if !prefix.is_empty() => prefix,
        _ => {
            warn!("Neither a device address nor a name prefix is configured");
            return Ok(None);
        },
    };

    info!("Scanning for BLE devices for {:.1}s...", config.scan_duration.as_secs_f64());
    let devices = transport.discover(config.scan_duration).await?;

    match select_device(&devices, name_prefix) {
        Some(device) => {
            info!("Found: {} @ {}", device.name.as_deref().unwrap_or_default(), device.address);
            Ok(Some(device.address.clone()))
        },
        None => {
            warn!("No compatible device found ({} devices seen)", devices.len());
            Ok(None)
        },
    }
}
