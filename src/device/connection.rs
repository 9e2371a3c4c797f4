use std::sync::Arc;
use futures::StreamExt;
use log::{debug, info, warn};
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, timeout_at, Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::device::constants::{CONNECT_TIMEOUT, DISCONNECT_DEADLINE, NUS_TX_UUID, POLL_DELAY, RETRY_DELAY};
use crate::device::notification::decode_notification;
use crate::device::transport::{BleLink, BleTransport};
use crate::device::types::NotificationStream;
use crate::error::DeviceError;

/// Called with every decoded, trimmed notification.
pub type MessageHandler = Arc<dyn Fn(&str) + Send + Sync>;

struct NotificationReader {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

enum SessionState<L> {
    Connecting,
    Subscribing {
        link: L,
    },
    Connected {
        link: L,
        reader: NotificationReader,
    },
    Retrying {
        error: DeviceError,
    },
    Terminated,
}

impl NotificationReader {
    fn spawn(cancel: CancellationToken, mut notifications: NotificationStream, on_message: MessageHandler) -> Self {
        let task_cancel = cancel.clone();

        let handle = spawn(async move {
            'mainloop: loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => {
                        break 'mainloop;
                    },
                    payload = notifications.next() => match payload {
                        Some(payload) => on_message(&decode_notification(&payload)),
                        None => {
                            debug!("Notification stream ended");
                            break 'mainloop;
                        },
                    },
                }
            }
        });

        NotificationReader { cancel, handle }
    }

    async fn stop(self) {
        self.cancel.cancel();

        if let Err(err) = self.handle.await {
            warn!("Failed to join read notifications task: {}", err);
        }
    }
}

async fn close_link<L: BleLink>(link: &L) {
    match timeout(Duration::from_millis(DISCONNECT_DEADLINE), link.disconnect()).await {
        Err(_) => warn!("Disconnecting took too long"),
        Ok(Err(err)) => debug!("Failed to disconnect: {}", err),
        Ok(Ok(())) => {},
    }
}

async fn subscribe<L: BleLink>(link: &L) -> Result<NotificationStream, DeviceError> {
    let connected = link.is_connected().await?;
    info!("Connected: {}", connected);

    if !connected {
        return Err(DeviceError::NotConnected);
    }

    link.subscribe(NUS_TX_UUID).await
}

async fn advance_state<T: BleTransport>(
    state: SessionState<T::Link>,
    transport: &T,
    address: &str,
    cancel: &CancellationToken,
    on_message: &MessageHandler,
) -> SessionState<T::Link> {
    match state {
        SessionState::Connecting => {
            info!("Connecting to {} ...", address);
            let deadline = Instant::now() + Duration::from_millis(CONNECT_TIMEOUT);

            let found = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = timeout_at(deadline, transport.find(address)) => Some(result),
            };

            // stop any scan find left running, whatever the outcome
            transport.stop_scanning().await;

            let link = match found {
                None => return SessionState::Terminated,
                Some(Err(_)) => return SessionState::Retrying { error: DeviceError::connect_timeout() },
                Some(Ok(Err(error))) => return SessionState::Retrying { error },
                Some(Ok(Ok(link))) => link,
            };

            let opened = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = timeout_at(deadline, link.connect()) => Some(result),
            };

            let error = match opened {
                Some(Ok(Ok(()))) => return SessionState::Subscribing { link },
                Some(Ok(Err(error))) => Some(error),
                Some(Err(_)) => Some(DeviceError::connect_timeout()),
                None => None,
            };

            close_link(&link).await;

            match error {
                Some(error) => SessionState::Retrying { error },
                None => SessionState::Terminated,
            }
        },
        SessionState::Subscribing { link } => {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = subscribe(&link) => Some(result),
            };

            match result {
                None => {
                    close_link(&link).await;
                    SessionState::Terminated
                },
                Some(Err(error)) => {
                    close_link(&link).await;
                    SessionState::Retrying { error }
                },
                Some(Ok(notifications)) => {
                    info!("Listening for notifications on NUS TX (Ctrl+C to exit)");
                    let reader = NotificationReader::spawn(cancel.child_token(), notifications, on_message.clone());
                    SessionState::Connected { link, reader }
                },
            }
        },
        SessionState::Connected { link, reader } => {
            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = link.is_connected() => Some(result),
            };

            let error = match status {
                Some(Ok(true)) => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        _ = sleep(Duration::from_millis(POLL_DELAY)) => {
                            return SessionState::Connected { link, reader };
                        },
                    }
                },
                Some(Ok(false)) => {
                    info!("Disconnected from device");
                    Some(DeviceError::Disconnected)
                },
                Some(Err(error)) => Some(error),
                None => None,
            };

            reader.stop().await;
            close_link(&link).await;

            match error {
                Some(error) => SessionState::Retrying { error },
                None => SessionState::Terminated,
            }
        },
        SessionState::Retrying { error } => {
            warn!("Error: {}", error);
            info!("Retrying in {} seconds...", RETRY_DELAY / 1000);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => SessionState::Terminated,
                _ = sleep(Duration::from_millis(RETRY_DELAY)) => SessionState::Connecting,
            }
        },
        SessionState::Terminated => SessionState::Terminated,
    }
}

/// Listen to the device at `address` until `cancel` is cancelled.
///
/// Every failure (connecting, subscribing, losing the link) is logged and followed by a new
/// attempt after a fixed delay; there is no limit on the number of attempts. At most one link is
/// open at any time, and it is closed before the next attempt starts.
pub async fn run_session<T: BleTransport>(
    transport: &T,
    address: &str,
    cancel: CancellationToken,
    on_message: MessageHandler,
) {
    let mut state = SessionState::Connecting;

    loop {
        state = advance_state(state, transport, address, &cancel, &on_message).await;

        if let SessionState::Terminated = state {
            break;
        }
    }

    info!("Interrupted by user, goodbye");
}
