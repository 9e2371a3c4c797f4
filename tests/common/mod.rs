//! Scripted in-memory transport for exercising the resolver and the session loop.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ble_listener::device::connection::MessageHandler;
use ble_listener::device::transport::{BleLink, BleTransport};
use ble_listener::device::types::{DiscoveredDevice, NotificationStream};
use ble_listener::error::DeviceError;
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;
use uuid::Uuid;

/// What the next call to `find` does.
pub enum ConnectOutcome {
    Fail,
    Hang,
    Link(MockLink),
}

#[derive(Default)]
pub struct MockTransport {
    pub devices: Vec<DiscoveredDevice>,
    pub fail_discovery: bool,
    pub discover_calls: Mutex<Vec<Duration>>,
    pub connect_attempts: Mutex<Vec<(String, Instant)>>,
    pub scan_stops: AtomicUsize,
    // once empty every attempt fails
    pub script: Mutex<VecDeque<ConnectOutcome>>,
}

impl MockTransport {
    pub fn with_devices(devices: Vec<DiscoveredDevice>) -> Self {
        MockTransport { devices, ..Default::default() }
    }

    pub fn scripted(outcomes: Vec<ConnectOutcome>) -> Self {
        MockTransport { script: Mutex::new(outcomes.into()), ..Default::default() }
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.connect_attempts.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

impl BleTransport for MockTransport {
    type Link = MockLink;

    async fn discover(&self, duration: Duration) -> Result<Vec<DiscoveredDevice>, DeviceError> {
        self.discover_calls.lock().unwrap().push(duration);

        if self.fail_discovery {
            return Err(DeviceError::NoAdapter);
        }
        Ok(self.devices.clone())
    }

    async fn find(&self, address: &str) -> Result<MockLink, DeviceError> {
        self.connect_attempts.lock().unwrap().push((address.to_string(), Instant::now()));

        let outcome = self.script.lock().unwrap().pop_front();
        match outcome {
            None | Some(ConnectOutcome::Fail) => Err(DeviceError::Disconnected),
            Some(ConnectOutcome::Hang) => std::future::pending().await,
            Some(ConnectOutcome::Link(link)) => Ok(link),
        }
    }

    async fn stop_scanning(&self) {
        self.scan_stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// What `MockLink::connect` does.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Open,
    Fail,
    Hang,
}

/// Handles the test keeps to drive and inspect a [`MockLink`] after handing it to the transport.
#[derive(Clone)]
pub struct LinkHandle {
    pub connected: Arc<AtomicBool>,
    pub subscribe_calls: Arc<AtomicUsize>,
    pub disconnects: Arc<AtomicUsize>,
    pub notify: UnboundedSender<Vec<u8>>,
}

pub struct MockLink {
    connected: Arc<AtomicBool>,
    has_characteristic: bool,
    open: OpenOutcome,
    // is_connected fails from this poll on (0 based)
    liveness_error_at: Option<usize>,
    polls: AtomicUsize,
    subscribe_calls: Arc<AtomicUsize>,
    disconnects: Arc<AtomicUsize>,
    notifications: Mutex<Option<UnboundedReceiver<Vec<u8>>>>,
}

impl MockLink {
    pub fn new(connected: bool, has_characteristic: bool) -> (Self, LinkHandle) {
        let (notify, receiver) = unbounded();
        let handle = LinkHandle {
            connected: Arc::new(AtomicBool::new(connected)),
            subscribe_calls: Arc::new(AtomicUsize::new(0)),
            disconnects: Arc::new(AtomicUsize::new(0)),
            notify,
        };

        let link = MockLink {
            connected: handle.connected.clone(),
            has_characteristic,
            open: OpenOutcome::Open,
            liveness_error_at: None,
            polls: AtomicUsize::new(0),
            subscribe_calls: handle.subscribe_calls.clone(),
            disconnects: handle.disconnects.clone(),
            notifications: Mutex::new(Some(receiver)),
        };

        (link, handle)
    }

    pub fn opening(mut self, open: OpenOutcome) -> Self {
        self.open = open;
        self
    }

    pub fn liveness_error_at(mut self, poll: usize) -> Self {
        self.liveness_error_at = Some(poll);
        self
    }
}

impl BleLink for MockLink {
    async fn connect(&self) -> Result<(), DeviceError> {
        match self.open {
            OpenOutcome::Open => Ok(()),
            OpenOutcome::Fail => Err(DeviceError::NotConnected),
            OpenOutcome::Hang => std::future::pending().await,
        }
    }

    async fn is_connected(&self) -> Result<bool, DeviceError> {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst);

        if self.liveness_error_at.is_some_and(|at| poll >= at) {
            return Err(DeviceError::Disconnected);
        }
        Ok(self.connected.load(Ordering::SeqCst))
    }

    async fn subscribe(&self, _characteristic: Uuid) -> Result<NotificationStream, DeviceError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);

        if !self.has_characteristic {
            return Err(DeviceError::MissingCharacteristic);
        }

        let receiver = self.notifications.lock().unwrap().take().expect("subscribed twice");
        Ok(Box::pin(receiver))
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// A [`MessageHandler`] that records every message.
pub fn recording_handler() -> (MessageHandler, Arc<Mutex<Vec<String>>>) {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = messages.clone();
    let handler: MessageHandler = Arc::new(move |message: &str| {
        sink.lock().unwrap().push(message.to_string());
    });

    (handler, messages)
}
