//! Execution engine module
//!
//! Runs one harvest end to end.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Harvester` - probes the search endpoint, resolves records in batches
//!   and flattens them
//! - `HarvestReport` - the flat dataset plus its completeness flag
//! - `HarvestStats` - request and record counters for the run

mod types;

pub use types::{HarvestReport, HarvestStats};

use crate::config::HarvestConfig;
use crate::error::Result;
use crate::flatten::Flattener;
use crate::http::HttpClient;
use crate::pagination::{Completeness, ProbeOutcome, Prober};
use crate::resolve::BatchResolver;
use crate::search::SearchEndpoint;
use crate::types::{CanonicalId, RawRecord};
use chrono::Utc;
use std::time::Instant;
use tracing::{info, warn};

/// Orchestrates discovery, resolution and flattening
#[derive(Debug)]
pub struct Harvester {
    /// HTTP client shared by both endpoints
    client: HttpClient,
    /// Job configuration
    config: HarvestConfig,
}

impl Harvester {
    /// Create a harvester from a ready client
    pub fn new(client: HttpClient, config: HarvestConfig) -> Self {
        Self { client, config }
    }

    /// Build the client from the job's HTTP and credential settings.
    ///
    /// `token_override` takes precedence over the job file and environment.
    /// An expired JWT is rejected here, before any request is made.
    pub fn from_config(config: HarvestConfig, token_override: Option<&str>) -> Result<Self> {
        let token = config.auth.resolve_token(token_override)?;
        let mut client = HttpClient::with_config(config.http.client_config())?;

        match token {
            Some(token) => {
                if config.auth.check_expiry {
                    token.ensure_fresh(Utc::now())?;
                }
                client.set_token(token);
            }
            None => warn!("No credential configured, requests are unauthenticated"),
        }

        Ok(Self::new(client, config))
    }

    /// Get the job configuration
    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Get the HTTP client
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    fn search_endpoint(&self) -> SearchEndpoint<'_> {
        let search = &self.config.search;
        SearchEndpoint::new(&self.client, search.url.clone(), search.criteria.clone())
            .with_id_fields(search.extractor_fields())
            .with_param_location(search.param_location)
    }

    /// Discover the identifier set
    pub async fn probe(&self) -> Result<ProbeOutcome> {
        let endpoint = self.search_endpoint();
        Prober::new(&endpoint, &self.config.search.pagination)
            .run()
            .await
    }

    /// Resolve identifiers to records
    pub async fn resolve(&self, ids: &[CanonicalId]) -> Result<Vec<RawRecord>> {
        BatchResolver::new(&self.client, &self.config.batch)
            .resolve(ids)
            .await
    }

    /// Run the whole pipeline
    pub async fn run(&self) -> Result<HarvestReport> {
        let start = Instant::now();
        let mut stats = HarvestStats::new();

        info!(
            job = %self.config.name,
            authenticated = self.client.token().is_some(),
            "Starting harvest"
        );

        let outcome = self.probe().await?;
        stats.search_requests = outcome.requests;
        stats.ids_discovered = outcome.ids.len();

        if let Completeness::Partial(reason) = outcome.completeness {
            warn!(
                job = %self.config.name,
                ids = outcome.ids.len(),
                "Harvest may be incomplete: {reason}"
            );
        }

        let records = self.resolve(&outcome.ids).await?;
        stats.batches = outcome.ids.len().div_ceil(self.config.batch.capacity.max(1));
        stats.records_resolved = records.len();
        if stats.unresolved() > 0 {
            warn!(
                missing = stats.unresolved(),
                "Batch endpoint returned fewer records than identifiers"
            );
        }

        let dataset = Flattener::new(self.config.flatten.clone()).flatten(&records);
        stats.columns = dataset.schema().len();
        stats.set_duration(start.elapsed().as_millis() as u64);

        info!(
            job = %self.config.name,
            rows = dataset.len(),
            columns = stats.columns,
            duration_ms = stats.duration_ms,
            "Harvest complete"
        );

        Ok(HarvestReport {
            dataset,
            completeness: outcome.completeness,
            strategy: outcome.strategy,
            stats,
        })
    }
}
