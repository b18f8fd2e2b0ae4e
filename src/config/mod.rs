//! Job configuration module
//!
//! A harvest run is described by a YAML job file:
//!
//! ```yaml
//! name: tickets
//! search:
//!   url: https://api.example.com/search
//!   criteria:
//!     query: "*"
//!     where:
//!       - field: type.keyword
//!         match: [kickbox]
//!   pagination:
//!     probe_limit: 2000
//! batch:
//!   url: https://api.example.com/batch
//!   capacity: 100
//! output:
//!   path: tickets.csv
//! ```

mod parser;
mod types;

pub use parser::{load_config, load_config_from_str, validate_config};
pub use types::{
    AuthSettings, HarvestConfig, HttpSettings, OutputSettings, SearchConfig, DEFAULT_TOKEN_ENV,
};
