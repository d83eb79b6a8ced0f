use anyhow::Result;
use chargeguard::chargepoint::ChargePointClient;
use chargeguard::config::Config;
use chargeguard::driver::Driver;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;

    chargeguard::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Chargeguard {} starting up", env!("APP_VERSION"));

    let client = ChargePointClient::new(&config.chargepoint)
        .map_err(|e| anyhow::anyhow!("Failed to create ChargePoint client: {}", e))?;

    // Shutdown channel; Ctrl-C wakes the driver out of its poll sleep
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    let mut driver = Driver::new(Box::new(client), config.monitor, shutdown_rx);

    match driver.run().await {
        Ok(()) => {
            info!("Monitor shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Monitor failed in state {}: {}", driver.state(), e);
            Err(anyhow::anyhow!("Monitor error: {}", e))
        }
    }
}
