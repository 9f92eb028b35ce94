use metrics_config::TransferConfig;
use metrics_etl::pipeline::TransferPipeline;
use metrics_etl::scheduler::DailyScheduler;
use metrics_etl::shutdown::create_shutdown_channel;
use tracing::{info, warn};

/// Wires the configuration into the scheduler and runs it until shutdown or
/// a fatal connection failure.
pub async fn start_transfer(config: TransferConfig) -> anyhow::Result<()> {
    info!("starting metrics transfer service");
    log_config(&config);

    // Both DSNs were validated at startup; parse them into connect options
    // once and hand them to the pipeline, which opens a fresh connection
    // pair per run.
    let source_options = config.source.connect_options()?;
    let destination_options = config.destination.connect_options()?;
    let pipeline = TransferPipeline::new(source_options, destination_options);

    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();

    // Spawn a task to listen for shutdown signals and forward them to the
    // scheduler's wait.
    let shutdown_handle = tokio::spawn(async move {
        use tokio::signal::unix::{SignalKind, signal};

        // Listen for SIGTERM as well, sent by supervisors before SIGKILL.
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("SIGINT (Ctrl+C) received, shutting down the scheduler");
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down the scheduler");
            }
        }

        if let Err(e) = shutdown_tx.shutdown() {
            warn!("failed to send shutdown signal: {:?}", e);
        }
    });

    let scheduler = DailyScheduler::new(config.execution_time, shutdown_rx);
    let result = scheduler.run(&pipeline).await;

    // The scheduler only returns once it no longer needs the signal task.
    shutdown_handle.abort();
    let _ = shutdown_handle.await;

    result?;

    info!("metrics transfer service stopped");
    Ok(())
}

fn log_config(config: &TransferConfig) {
    info!(
        execution_time = %config.execution_time,
        "transfer config"
    );
}
