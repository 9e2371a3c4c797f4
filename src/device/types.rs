use std::pin::Pin;
use futures::Stream;

/// A peripheral seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub name: Option<String>,
    // MAC where the platform exposes one, otherwise the OS peripheral id
    pub address: String,
}

/// Raw notification payloads of a single subscribed characteristic.
pub type NotificationStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;
