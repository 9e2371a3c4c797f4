use std::time::Duration;
use uuid::Uuid;

use crate::device::types::{DiscoveredDevice, NotificationStream};
use crate::error::DeviceError;

/// Access to the bluetooth stack: scanning and locating peripherals.
#[allow(async_fn_in_trait)]
pub trait BleTransport {
    type Link: BleLink;

    /// Scan for `duration` and return every peripheral seen, in the order the stack reports them.
    async fn discover(&self, duration: Duration) -> Result<Vec<DiscoveredDevice>, DeviceError>;

    /// Locate the peripheral at `address`, scanning for it if the stack does not know it yet.
    /// The returned link is not connected.
    async fn find(&self, address: &str) -> Result<Self::Link, DeviceError>;

    /// Stop a scan left running by `find`. Does nothing when no scan is running.
    async fn stop_scanning(&self);
}

/// A link to one peripheral.
#[allow(async_fn_in_trait)]
pub trait BleLink {
    /// Open the link and discover its services.
    async fn connect(&self) -> Result<(), DeviceError>;

    async fn is_connected(&self) -> Result<bool, DeviceError>;

    /// Subscribe to `characteristic` and return a stream of its notification payloads.
    async fn subscribe(&self, characteristic: Uuid) -> Result<NotificationStream, DeviceError>;

    async fn disconnect(&self) -> Result<(), DeviceError>;
}
