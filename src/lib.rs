use std::env;
use std::sync::Arc;
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::types::Config;
use crate::device::btle::BtleTransport;
use crate::device::connection::run_session;
use crate::device::notification::print_received;
use crate::device::resolver::{resolve, NOT_FOUND_HINTS};
use crate::error::AppRunError;

pub mod device;
pub mod error;
pub mod config;

pub fn init_logging(verbose: bool) {
    let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("btleplug", log::LevelFilter::Warn)
        .level_for("bluez_async", log::LevelFilter::Warn)
        .chain(std::io::stderr());

    if let Ok(log_file) = env::var("LOG_FILE") {
        dispatch = dispatch.chain(
            fern::log_file(log_file).expect("Failed to open LOG_FILE")
        );
    }

    dispatch.apply().expect("Failed to initialize logger");
}

async fn interrupt_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => { signal.recv().await; },
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => debug!("Received Ctrl+C"),
        _ = terminate => debug!("Received SIGTERM"),
    }
}

fn cancel_on_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        interrupt_signal().await;
        cancel.cancel();
    });
}

pub async fn run(config: Config) -> Result<(), AppRunError> {
    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let transport = BtleTransport::new().await?;

    let address = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            info!("Interrupted by user, goodbye");
            return Ok(());
        },
        result = resolve(&transport, &config) => result?,
    };

    let Some(address) = address else {
        warn!("Suggestions:");
        for hint in NOT_FOUND_HINTS {
            warn!("- {}", hint);
        }
        return Ok(());
    };

    run_session(&transport, &address, cancel, Arc::new(print_received)).await;
    Ok(())
}
