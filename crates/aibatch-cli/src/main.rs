use std::sync::Arc;

use aibatch_core::prelude::{AiBatch, PlanEngine};
use aibatch_observe::init_logger;
use tracing::{debug, info};

mod config;
use config::Config;

fn main() -> anyhow::Result<()> {
    // 1) config + logger, before the runtime spawns threads (local tz detection)
    let config = Config::from_env()?;
    init_logger(&config.logger)?;
    config.log();

    // 2) runtime
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(config))
}

async fn run(config: Config) -> anyhow::Result<()> {
    let engine = Arc::new(PlanEngine::new());
    let aibatch = AiBatch::new(engine.clone());

    let result = aibatch.deploy(&config.component_name, config.job).await?;

    let plan = engine.plan();
    let order = plan.execution_order();
    debug!(?order, "execution order");
    info!(
        resources = plan.len(),
        job = %result.job_name,
        "deployment planned"
    );

    println!("{}", serde_json::to_string_pretty(&result.exports())?);
    Ok(())
}
