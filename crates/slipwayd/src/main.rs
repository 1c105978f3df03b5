use anyhow::Result;
use tracing::Level;

use slipway_core::{init_tracing, Pipeline, PipelineConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(false, Level::INFO);

    let config = PipelineConfig::from_env();
    tracing::info!(
        sink = %config.sink_endpoint(),
        work_dir = %config.work_dir.display(),
        "slipwayd starting"
    );

    // The HTTP transport attaches to this pipeline; until it is wired
    // in, the daemon just holds the coordinator and waits for SIGINT.
    let pipeline = Pipeline::with_http_sink(config);
    tracing::info!(running = pipeline.running_names().len(), "pipeline ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("slipwayd shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use slipway_core::PipelineConfig;

    #[test]
    fn test_config_resolves_from_env() {
        let config = PipelineConfig::from_env();
        assert!(!config.sink_url.is_empty());
    }
}
