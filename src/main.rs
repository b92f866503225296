use anyhow::Context;
use bond_ledger::{config::Config, DataSource, MemoryDataSource};
use chrono::Utc;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = Config::from_env().context("Configuration error")?;

    let datasource: Arc<dyn DataSource> = Arc::new(
        MemoryDataSource::from_files(&config.operations_path, &config.reference_path)
            .with_context(|| {
                format!(
                    "Failed to load {} and {}",
                    config.operations_path, config.reference_path
                )
            })?
            .with_lookback_days(config.snapshot_lookback_days),
    );

    let now = config.valuation_date.unwrap_or_else(Utc::now);
    tracing::info!(account = %config.account_id, %now, "Building {:?} report", config.report_mode);

    let report = match bond_ledger::run(&config, datasource, now).await {
        Ok(report) => report,
        Err(e) => {
            if e.is_missing_data() {
                tracing::warn!("Reference data incomplete; check REFERENCE_PATH and SNAPSHOT_LOOKBACK_DAYS");
            }
            return Err(e.into());
        }
    };
    println!("{}", report);
    Ok(())
}
