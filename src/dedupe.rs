//! Order-preserving deduplication of canonical identifiers

use crate::types::CanonicalId;
use std::collections::HashSet;

/// Drop repeated identifiers, keeping each one at its first position.
pub fn dedupe_preserve_order<I>(ids: I) -> Vec<CanonicalId>
where
    I: IntoIterator<Item = CanonicalId>,
{
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
