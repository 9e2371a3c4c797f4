use clap::Parser;
use log::{error, info};
use ble_listener::{init_logging, run};
use ble_listener::config::types::{Args, Config};
use ble_listener::error::AppRunError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppRunError> {
    let args = Args::parse();
    init_logging(args.verbose);
    info!(concat!("BLE Listener ", env!("CARGO_PKG_VERSION")));

    let result = match Config::try_from(args) {
        Ok(config) => run(config).await,
        Err(err) => Err(err.into()),
    };

    if let Err(err) = &result {
        error!("{}", err);
    }

    result
}
