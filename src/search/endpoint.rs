//! Search endpoint client
//!
//! Issues single search requests: the criteria body plus whatever size and
//! pagination parameters the caller asks for.

use super::criteria::SearchCriteria;
use super::extract::{extract_ids, IdFields};
use crate::error::Result;
use crate::http::{HttpClient, RequestOptions};
use crate::types::{CanonicalId, JsonValue, ParamLocation};
use tracing::debug;

/// Size and pagination parameters for one search request, in order
pub type PageParams = Vec<(String, u64)>;

/// One search endpoint bound to the criteria of a run
#[derive(Debug)]
pub struct SearchEndpoint<'a> {
    client: &'a HttpClient,
    url: String,
    criteria: SearchCriteria,
    id_fields: IdFields,
    location: ParamLocation,
}

impl<'a> SearchEndpoint<'a> {
    /// Create a search endpoint
    pub fn new(client: &'a HttpClient, url: impl Into<String>, criteria: SearchCriteria) -> Self {
        Self {
            client,
            url: url.into(),
            criteria,
            id_fields: IdFields::default(),
            location: ParamLocation::Body,
        }
    }

    /// Override the identifier field names
    #[must_use]
    pub fn with_id_fields(mut self, id_fields: IdFields) -> Self {
        self.id_fields = id_fields;
        self
    }

    /// Choose where pagination parameters are sent
    #[must_use]
    pub fn with_param_location(mut self, location: ParamLocation) -> Self {
        self.location = location;
        self
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Criteria sent with every request
    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    /// Build the request for one page
    pub fn request_for(&self, params: &[(String, u64)]) -> RequestOptions {
        let mut body = self.criteria.to_request_body();
        let mut request = RequestOptions::new();

        for (name, value) in params {
            match self.location {
                ParamLocation::Body => {
                    body.insert(name.clone(), JsonValue::from(*value));
                }
                ParamLocation::Query => {
                    request = request.query(name.clone(), value.to_string());
                }
            }
        }

        request.json(JsonValue::Object(body))
    }

    /// Issue one search request and extract the identifiers it returned.
    ///
    /// Transport, status and JSON parse failures are returned as errors; a
    /// well-formed body of an unknown shape yields no identifiers.
    pub async fn fetch(&self, params: &[(String, u64)]) -> Result<Vec<CanonicalId>> {
        let body = self
            .client
            .post_json(&self.url, self.request_for(params))
            .await?;
        let ids = extract_ids(&body, &self.id_fields);
        debug!(?params, count = ids.len(), "search page");
        Ok(ids)
    }
}
