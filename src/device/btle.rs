use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use btleplug::api::{BDAddr, Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::{future, StreamExt};
use log::{debug, info, warn};
use tokio::time::sleep;
use uuid::Uuid;

use crate::device::constants::ADDRESS_POLL_DELAY;
use crate::device::transport::{BleLink, BleTransport};
use crate::device::types::{DiscoveredDevice, NotificationStream};
use crate::error::DeviceError;

/// [`BleTransport`] backed by the platform bluetooth stack through btleplug.
pub struct BtleTransport {
    // keeps the platform session alive for as long as the adapters are used
    _manager: Manager,
    adapters: Vec<Adapter>,
    scanning: AtomicBool,
}

pub struct BtleLink {
    peripheral: Peripheral,
}

// Some platforms (macOS) never expose the MAC, so fall back to the OS level peripheral id
fn format_address(address: BDAddr, id: &impl Display) -> String {
    if address.into_inner() == [0u8; 6] {
        id.to_string()
    } else {
        address.to_string()
    }
}

fn peripheral_address(peripheral: &Peripheral) -> String {
    format_address(peripheral.address(), &peripheral.id())
}

impl BtleTransport {
    pub async fn new() -> Result<Self, DeviceError> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;

        if adapters.is_empty() {
            return Err(DeviceError::NoAdapter);
        }

        Ok(BtleTransport { _manager: manager, adapters, scanning: AtomicBool::new(false) })
    }

    async fn start_scanning(&self) -> Result<(), DeviceError> {
        self.scanning.store(true, Ordering::SeqCst);

        for adapter in &self.adapters {
            info!("Scanning using adapter {}...", adapter.adapter_info().await.unwrap_or("UNKNOWN".to_string()));
            adapter.start_scan(ScanFilter::default()).await?;
        }

        Ok(())
    }

    async fn known_peripherals(&self) -> Vec<Peripheral> {
        let mut result = Vec::new();

        for adapter in &self.adapters {
            match adapter.peripherals().await {
                Ok(peripherals) => result.extend(peripherals),
                Err(err) => warn!("Failed to query BLE adapter for peripherals: {}", err),
            }
        }

        result
    }
}

impl BleTransport for BtleTransport {
    type Link = BtleLink;

    async fn discover(&self, duration: Duration) -> Result<Vec<DiscoveredDevice>, DeviceError> {
        if let Err(err) = self.start_scanning().await {
            self.stop_scanning().await;
            return Err(err);
        }
        sleep(duration).await;

        let mut devices = Vec::new();

        for peripheral in self.known_peripherals().await {
            match peripheral.properties().await {
                Err(err) => {
                    warn!("Could not query peripheral for properties: {:?}", err);
                },
                Ok(None) => {
                    debug!("Peripheral {} has no properties", peripheral_address(&peripheral));
                },
                Ok(Some(properties)) => {
                    debug!(
                        "Seen peripheral {} {:?} {:?}",
                        properties.address,
                        properties.local_name,
                        properties.services,
                    );
                    devices.push(DiscoveredDevice {
                        name: properties.local_name,
                        address: peripheral_address(&peripheral),
                    });
                },
            }
        }

        self.stop_scanning().await;
        Ok(devices)
    }

    async fn find(&self, address: &str) -> Result<BtleLink, DeviceError> {
        loop {
            let found = self.known_peripherals().await
                .into_iter()
                .find(|peripheral| peripheral_address(peripheral).eq_ignore_ascii_case(address));

            if let Some(peripheral) = found {
                return Ok(BtleLink { peripheral });
            }

            if !self.scanning.load(Ordering::SeqCst) {
                debug!("{} is not a known peripheral yet; scanning for it", address);
                if let Err(err) = self.start_scanning().await {
                    warn!("Scanning failed {}", err);
                }
            }

            sleep(Duration::from_millis(ADDRESS_POLL_DELAY)).await;
        }
    }

    async fn stop_scanning(&self) {
        if !self.scanning.swap(false, Ordering::SeqCst) {
            return;
        }

        for adapter in &self.adapters {
            if let Err(err) = adapter.stop_scan().await {
                warn!("Failed to stop scanning: {}", err);
            }
        }
    }
}

impl BleLink for BtleLink {
    async fn connect(&self) -> Result<(), DeviceError> {
        debug!("Connecting to peripheral...");
        self.peripheral.connect().await?;

        debug!("Connected; Discovering services...");
        self.peripheral.discover_services().await?;

        Ok(())
    }

    async fn is_connected(&self) -> Result<bool, DeviceError> {
        Ok(self.peripheral.is_connected().await?)
    }

    async fn subscribe(&self, characteristic: Uuid) -> Result<NotificationStream, DeviceError> {
        let data_char = self.peripheral.characteristics()
            .into_iter()
            .find(|c| c.uuid == characteristic)
            .ok_or(DeviceError::MissingCharacteristic)?;

        // open the stream before enabling notifications so the first payloads are not missed
        let notifications = self.peripheral.notifications().await?;

        debug!("Subscribing to characteristic {:?}", characteristic);
        self.peripheral.subscribe(&data_char).await?;

        let payloads = notifications.filter_map(move |notification| {
            future::ready((notification.uuid == characteristic).then_some(notification.value))
        });

        Ok(Box::pin(payloads))
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        Ok(self.peripheral.disconnect().await?)
    }
}
