//! Search endpoint module
//!
//! Everything needed to talk to the search side of a harvest:
//!
//! - `SearchCriteria` - the filter sent with every search request
//! - `SearchEndpoint` - issues one search request and returns the ids it found
//! - `extract_ids` - shape-tolerant identifier extraction from a response body

mod criteria;
mod endpoint;
mod extract;

pub use criteria::{DateRange, FieldPredicate, MatchMode, SearchCriteria, SortDirection, SortOrder};
pub use endpoint::{PageParams, SearchEndpoint};
pub use extract::{extract_ids, IdFields, ResponseShape};
