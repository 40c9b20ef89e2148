//! Combined run of all pipelines
//!
//! Each pipeline runs on its own: a failure in one is logged and does not
//! stop the others. The command fails afterwards if any pipeline failed.

use std::path::Path;

use anyhow::Result;
use fincast_core::FincastConfig;
use tracing::{error, info};

use super::{cmd_advise, cmd_health, cmd_inflation};
use crate::cli::RateArgs;

/// Outcome of one pipeline in a combined run
pub struct PipelineOutcome {
    pub name: &'static str,
    pub result: Result<()>,
}

impl PipelineOutcome {
    fn new<T>(name: &'static str, result: Result<T>) -> Self {
        if let Err(e) = &result {
            error!("{} pipeline failed: {:#}", name, e);
        }
        Self {
            name,
            result: result.map(|_| ()),
        }
    }
}

pub async fn run_pipelines(
    config: &FincastConfig,
    transactions: &Path,
    account: &str,
    inflation: &Path,
    rates: &RateArgs,
    json: bool,
) -> Vec<PipelineOutcome> {
    let health = cmd_health(config, transactions, account, None, None, None, json);
    let health = PipelineOutcome::new("health", health);

    let advisories = cmd_advise(config, rates, None, None, None, false, json).await;
    let advisories = PipelineOutcome::new("forecast", advisories);

    let projections = cmd_inflation(config, inflation, None, None, json);
    let projections = PipelineOutcome::new("inflation", projections);

    vec![health, advisories, projections]
}

pub async fn cmd_run(
    config: &FincastConfig,
    transactions: &Path,
    account: &str,
    inflation: &Path,
    rates: &RateArgs,
    json: bool,
) -> Result<()> {
    let outcomes = run_pipelines(config, transactions, account, inflation, rates, json).await;

    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| o.result.is_err())
        .map(|o| o.name)
        .collect();

    if failed.is_empty() {
        info!("All {} pipelines completed", outcomes.len());
        Ok(())
    } else {
        anyhow::bail!(
            "{} of {} pipelines failed: {}",
            failed.len(),
            outcomes.len(),
            failed.join(", ")
        )
    }
}
