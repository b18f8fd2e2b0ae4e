//! Batch resolution module
//!
//! Turns identifiers into full records by posting them, a batch at a time,
//! to the batch-fetch endpoint. Batches keep the identifier order and the
//! resolved records come back concatenated in batch order.

mod resolver;
mod types;

pub use resolver::{order_by_request, records_from_response, BatchResolver};
pub use types::{BatchConfig, IdentifierBatch};

#[cfg(test)]
mod tests;
