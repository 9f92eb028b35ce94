use metrics_telemetry::init_tracing;
use tracing::error;

use crate::config::load_transfer_config;
use crate::core::start_transfer;

mod config;
mod core;

fn main() -> anyhow::Result<()> {
    // Load the configuration first so a misconfigured process fails with a
    // usage-style error before any runtime is built.
    let transfer_config = load_transfer_config()?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"))?;

    // We start the runtime.
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(transfer_config))?;

    Ok(())
}

async fn async_main(transfer_config: metrics_config::TransferConfig) -> anyhow::Result<()> {
    if let Err(err) = start_transfer(transfer_config).await {
        error!("an error occurred in the transfer service: {err}");

        return Err(err);
    }

    Ok(())
}
