//! Pagination prober
//!
//! Finds every identifier behind a search endpoint whose pagination contract
//! is unknown. The search is bounded and deterministic:
//!
//! 1. one probe request of `probe_limit`; a short answer is complete
//! 2. each candidate convention in order, first one to add ids wins
//! 3. one larger request as a last resort
//! 4. otherwise the probe's ids, flagged partial
//!
//! Only the first probe and auth rejections are fatal. Any other failure
//! while following a convention just rules that convention out.

use super::conventions::PaginationConvention;
use super::types::{AcceptedStrategy, Completeness, IncompleteReason, ProbeConfig, ProbeOutcome};
use crate::dedupe::dedupe_preserve_order;
use crate::error::Result;
use crate::search::SearchEndpoint;
use crate::types::CanonicalId;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// What following one convention produced
struct FollowResult {
    ids: Vec<CanonicalId>,
    added: usize,
    cap_hit: bool,
    interrupted: bool,
}

/// Drives a [`SearchEndpoint`] through the probing sequence
#[derive(Debug)]
pub struct Prober<'a> {
    endpoint: &'a SearchEndpoint<'a>,
    config: &'a ProbeConfig,
}

impl<'a> Prober<'a> {
    /// Create a prober
    pub fn new(endpoint: &'a SearchEndpoint<'a>, config: &'a ProbeConfig) -> Self {
        Self { endpoint, config }
    }

    /// Run the probing sequence
    pub async fn run(&self) -> Result<ProbeOutcome> {
        let config = self.config;
        let mut requests = 0;

        info!(limit = config.probe_limit, "probing search endpoint");
        let probe = self
            .endpoint
            .fetch(&[(config.limit_param.clone(), config.probe_limit as u64)])
            .await?;
        requests += 1;
        let probe_count = probe.len();
        let base = dedupe_preserve_order(probe);

        if probe_count < config.probe_limit {
            info!(count = base.len(), "probe returned fewer ids than its limit, result is complete");
            return Ok(ProbeOutcome {
                ids: base,
                strategy: AcceptedStrategy::SingleRequest,
                completeness: Completeness::Complete,
                requests,
            });
        }

        if base.len() >= config.safety_cap {
            warn!(cap = config.safety_cap, "probe alone reached the safety cap");
            return Ok(ProbeOutcome {
                ids: truncate(base, config.safety_cap),
                strategy: AcceptedStrategy::ProbeOnly,
                completeness: Completeness::Partial(IncompleteReason::SafetyCapReached),
                requests,
            });
        }

        info!(
            count = probe_count,
            "probe filled its limit, trying pagination conventions"
        );

        for convention in &config.conventions {
            let result = self
                .follow(convention, &base, probe_count, &mut requests)
                .await?;

            if result.added == 0 {
                debug!(%convention, "convention found no extra ids");
                continue;
            }

            let completeness = if result.cap_hit {
                Completeness::Partial(IncompleteReason::SafetyCapReached)
            } else if result.interrupted {
                Completeness::Partial(IncompleteReason::PaginationInterrupted)
            } else {
                Completeness::Complete
            };
            info!(%convention, total = result.ids.len(), "pagination convention accepted");
            return Ok(ProbeOutcome {
                ids: result.ids,
                strategy: AcceptedStrategy::Convention(convention.clone()),
                completeness,
                requests,
            });
        }

        let last_resort = config.last_resort_limit.min(config.safety_cap);
        if last_resort > config.probe_limit {
            info!(limit = last_resort, "trying a larger single request");
            requests += 1;
            match self
                .endpoint
                .fetch(&[(config.limit_param.clone(), last_resort as u64)])
                .await
            {
                Ok(ids) => {
                    let returned = ids.len();
                    let ids = dedupe_preserve_order(ids);
                    if ids.len() > base.len() {
                        // servers that ignore the limit can still overshoot
                        let overshoot = ids.len() > config.safety_cap;
                        let completeness = if overshoot {
                            warn!(
                                cap = config.safety_cap,
                                returned, "larger request overshot the safety cap"
                            );
                            Completeness::Partial(IncompleteReason::SafetyCapReached)
                        } else if returned < last_resort {
                            Completeness::Complete
                        } else if last_resort == config.safety_cap {
                            Completeness::Partial(IncompleteReason::SafetyCapReached)
                        } else {
                            Completeness::Partial(IncompleteReason::ConventionsExhausted)
                        };
                        info!(total = ids.len(), "larger request extended the probe");
                        return Ok(ProbeOutcome {
                            ids: truncate(ids, config.safety_cap),
                            strategy: AcceptedStrategy::LastResort { limit: last_resort },
                            completeness,
                            requests,
                        });
                    }
                }
                Err(e) if e.is_auth() => return Err(e),
                Err(e) => warn!("larger request failed: {e}"),
            }
        }

        warn!(
            count = base.len(),
            "pagination strategies exhausted, returning probed ids (may be partial)"
        );
        Ok(ProbeOutcome {
            ids: base,
            strategy: AcceptedStrategy::ProbeOnly,
            completeness: Completeness::Partial(IncompleteReason::ConventionsExhausted),
            requests,
        })
    }

    /// Page through one convention until it runs dry, stalls, fails or hits the cap
    async fn follow(
        &self,
        convention: &PaginationConvention,
        base: &[CanonicalId],
        probe_count: usize,
        requests: &mut usize,
    ) -> Result<FollowResult> {
        let config = self.config;
        let mut seen: HashSet<CanonicalId> = base.iter().cloned().collect();
        let mut ids = base.to_vec();
        let mut added = 0;
        let mut cap_hit = false;
        let mut interrupted = false;
        let mut position = convention.first_position(probe_count, config.page_size);

        debug!(%convention, page_size = config.page_size, "trying convention");

        loop {
            if ids.len() >= config.safety_cap {
                warn!(cap = config.safety_cap, %convention, "safety cap reached");
                cap_hit = true;
                break;
            }

            let params = convention.page_params(position, config.page_size, &config.limit_param);
            *requests += 1;
            let page = match self.endpoint.fetch(&params).await {
                Ok(page) => page,
                Err(e) if e.is_auth() => return Err(e),
                Err(e) => {
                    debug!(%convention, "page request failed: {e}");
                    interrupted = added > 0;
                    break;
                }
            };

            let page_len = page.len();
            let fresh: Vec<CanonicalId> = page
                .into_iter()
                .filter(|id| seen.insert(id.clone()))
                .collect();
            if fresh.is_empty() {
                break;
            }

            added += fresh.len();
            ids.extend(fresh);
            debug!(%convention, page = page_len, total = ids.len(), "page collected");

            if page_len < config.page_size {
                break;
            }
            position = convention.advance(position, page_len);
        }

        if ids.len() > config.safety_cap {
            cap_hit = true;
            ids = truncate(ids, config.safety_cap);
        }

        Ok(FollowResult {
            ids,
            added,
            cap_hit,
            interrupted,
        })
    }
}

fn truncate(mut ids: Vec<CanonicalId>, cap: usize) -> Vec<CanonicalId> {
    ids.truncate(cap);
    ids
}
