//! Candidate pagination conventions
//!
//! The search endpoint's pagination parameter names are unknown, so the
//! prober walks a fixed list of plausible conventions. Each variant knows how
//! to render the parameters for a page and how to move to the next one.

use crate::search::PageParams;
use serde::{Deserialize, Serialize};

/// One scheme for requesting subsequent pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationConvention {
    /// `limit=<page size>&<offset_param>=<items already seen>`
    Offset {
        /// Name of the offset parameter (e.g. `offset`, `start`, `from`)
        offset_param: String,
    },
    /// `<size_param>=<page size>&<page_param>=<page index>`
    PageNumber {
        /// Name of the page index parameter
        page_param: String,
        /// Name of the page size parameter
        size_param: String,
        /// Index of the first page (0 or 1)
        start_page: u64,
    },
}

impl PaginationConvention {
    /// Offset-style convention
    pub fn offset(offset_param: impl Into<String>) -> Self {
        Self::Offset {
            offset_param: offset_param.into(),
        }
    }

    /// Page-and-size convention
    pub fn page_number(
        page_param: impl Into<String>,
        size_param: impl Into<String>,
        start_page: u64,
    ) -> Self {
        Self::PageNumber {
            page_param: page_param.into(),
            size_param: size_param.into(),
            start_page,
        }
    }

    /// The default search order: offset names first, then page/size pairs
    /// with both start indices
    pub fn defaults() -> Vec<Self> {
        let mut conventions: Vec<Self> = ["offset", "start", "from"]
            .into_iter()
            .map(Self::offset)
            .collect();
        for size_param in ["size", "limit"] {
            for start_page in [0, 1] {
                conventions.push(Self::page_number("page", size_param, start_page));
            }
        }
        conventions
    }

    /// Position of the first follow-up page, resuming after the probe
    pub fn first_position(&self, probe_count: usize, page_size: usize) -> u64 {
        match self {
            Self::Offset { .. } => probe_count as u64,
            Self::PageNumber { start_page, .. } => {
                start_page + (probe_count / page_size.max(1)) as u64
            }
        }
    }

    /// Position following a page that returned `page_len` identifiers
    pub fn advance(&self, position: u64, page_len: usize) -> u64 {
        match self {
            Self::Offset { .. } => position + page_len as u64,
            Self::PageNumber { .. } => position + 1,
        }
    }

    /// Request parameters for the page at `position`
    pub fn page_params(&self, position: u64, page_size: usize, limit_param: &str) -> PageParams {
        match self {
            Self::Offset { offset_param } => vec![
                (limit_param.to_string(), page_size as u64),
                (offset_param.clone(), position),
            ],
            Self::PageNumber {
                page_param,
                size_param,
                ..
            } => vec![
                (size_param.clone(), page_size as u64),
                (page_param.clone(), position),
            ],
        }
    }
}

impl std::fmt::Display for PaginationConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offset { offset_param } => write!(f, "offset '{offset_param}'"),
            Self::PageNumber {
                page_param,
                size_param,
                start_page,
            } => write!(
                f,
                "page '{page_param}' + size '{size_param}' from {start_page}"
            ),
        }
    }
}
