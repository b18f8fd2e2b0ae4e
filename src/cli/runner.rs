//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::{load_config, HarvestConfig};
use crate::engine::Harvester;
use crate::error::Result;
use crate::output::{write_dataset, OutputFormat};
use crate::pagination::{AcceptedStrategy, Completeness};
use chrono::Utc;
use serde_json::{json, Value};
use std::path::PathBuf;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Harvest { output, format } => self.harvest(output.clone(), *format).await,
            Commands::Probe => self.probe().await,
            Commands::Validate => self.validate(),
            Commands::Token => self.token(),
        }
    }

    /// Load the job file
    fn load_config(&self) -> Result<HarvestConfig> {
        load_config(&self.cli.config)
    }

    fn harvester(&self, config: HarvestConfig) -> Result<Harvester> {
        Harvester::from_config(config, self.cli.token.as_deref())
    }

    /// Run the full pipeline and write the dataset
    async fn harvest(&self, output: Option<PathBuf>, format: Option<OutputFormat>) -> Result<()> {
        let mut config = self.load_config()?;
        if output.is_some() {
            config.output.path = output;
        }
        if format.is_some() {
            config.output.format = format;
        }
        let path = config.output.require_path()?.clone();
        let format = config.output.resolved_format();
        let parquet = config.output.parquet.clone();

        let harvester = self.harvester(config)?;
        let report = harvester.run().await?;
        let rows = write_dataset(&report.dataset, &path, format, &parquet)?;

        output_message(&json!({
            "type": "HARVEST",
            "harvest": {
                "output": path.display().to_string(),
                "format": format.to_string(),
                "rows": rows,
                "columns": report.stats.columns,
                "ids": report.stats.ids_discovered,
                "search_requests": report.stats.search_requests,
                "batches": report.stats.batches,
                "strategy": strategy_name(&report.strategy),
                "complete": report.is_complete(),
                "incomplete_reason": incomplete_reason(report.completeness),
                "duration_ms": report.stats.duration_ms,
            }
        }));
        Ok(())
    }

    /// Print discovered identifiers
    async fn probe(&self) -> Result<()> {
        let harvester = self.harvester(self.load_config()?)?;
        let outcome = harvester.probe().await?;

        for id in &outcome.ids {
            println!("{id}");
        }
        tracing::info!(
            ids = outcome.ids.len(),
            requests = outcome.requests,
            strategy = %strategy_name(&outcome.strategy),
            complete = outcome.completeness.is_complete(),
            "Probe finished"
        );
        Ok(())
    }

    /// Validate the job file
    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;

        output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Job '{}' is valid: search {}, batch {} (capacity {})",
                    config.name,
                    config.search.url,
                    config.batch.url,
                    config.batch.capacity
                )
            }
        }));
        Ok(())
    }

    /// Show the credential's expiry without making any request
    fn token(&self) -> Result<()> {
        let config = self.load_config()?;
        let token = config.auth.resolve_token(self.cli.token.as_deref())?;

        let info = match token {
            Some(token) => {
                let expires_at = token.expires_at();
                json!({
                    "present": true,
                    "expires_at": expires_at.map(|t| t.to_rfc3339()),
                    "expired": token.is_expired_at(Utc::now()),
                })
            }
            None => json!({"present": false}),
        };

        output_message(&json!({"type": "TOKEN", "token": info}));
        Ok(())
    }
}

fn output_message(msg: &Value) {
    println!("{}", serde_json::to_string(msg).unwrap_or_default());
}

fn strategy_name(strategy: &AcceptedStrategy) -> String {
    match strategy {
        AcceptedStrategy::SingleRequest => "single request".to_string(),
        AcceptedStrategy::Convention(convention) => convention.to_string(),
        AcceptedStrategy::LastResort { limit } => format!("single request of {limit}"),
        AcceptedStrategy::ProbeOnly => "probe only".to_string(),
    }
}

fn incomplete_reason(completeness: Completeness) -> Option<String> {
    match completeness {
        Completeness::Complete => None,
        Completeness::Partial(reason) => Some(reason.to_string()),
    }
}
