//! Bearer credential
//!
//! Holds the token string, keeps it out of `Debug` output, and reads the
//! expiry of JWT-shaped tokens without verifying their signature.

use crate::error::{Error, Result};
use crate::types::JsonObject;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Bearer token sent as `Authorization: Bearer <token>`
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    /// Create a bearer token, rejecting blank values
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(Error::config("Bearer token is empty"));
        }
        Ok(Self { token })
    }

    /// The raw token value
    pub fn secret(&self) -> &str {
        &self.token
    }

    /// Decode the claims segment of a JWT-shaped token.
    ///
    /// Returns `None` for opaque tokens. The signature is not checked.
    pub fn claims(&self) -> Option<JsonObject> {
        let mut segments = self.token.split('.');
        let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
        if segments.next().is_some() {
            return None;
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        match serde_json::from_slice::<Value>(&bytes).ok()? {
            Value::Object(claims) => Some(claims),
            _ => None,
        }
    }

    /// Expiry time from the `exp` claim, if present
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let exp = self.claims()?.get("exp")?.clone();
        let seconds = match exp {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
            _ => return None,
        };
        DateTime::<Utc>::from_timestamp(seconds, 0)
    }

    /// Check whether the token has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }

    /// Fail with [`Error::CredentialExpired`] if the token is already expired
    pub fn ensure_fresh(&self, now: DateTime<Utc>) -> Result<()> {
        match self.expires_at() {
            Some(exp) if exp <= now => Err(Error::CredentialExpired {
                expired_at: exp.to_rfc3339(),
            }),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let visible: String = self.token.chars().take(4).collect();
        f.debug_tuple("BearerToken")
            .field(&format!("{visible}…(redacted)"))
            .finish()
    }
}
