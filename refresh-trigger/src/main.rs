use anyhow::Result;

mod config;
mod handlers;
mod logging;
mod router;
mod runner;
mod state;

use runner::Runner;

/// Parses configuration, initialises logging, and serves refresh requests.
#[tokio::main]
async fn main() -> Result<()> {
    let cfg = config::Config::from_env()?;
    logging::setup_logging(&cfg);
    cfg.info();

    let runner = Runner::builder(cfg)
        .bind()
        .await?
        .connect_registry()
        .await?
        .build()?;

    runner.run().await
}
