//! Bearer tokens for authenticating against the hub.

use jsonwebtoken::{EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::{Error, Result};

/// Issues the bearer token appended to every hub URL.
pub trait TokenIssuer: Send + Sync {
    fn issue_token(&self) -> Result<String>;
}

impl<F> TokenIssuer for F
where
    F: Fn() -> Result<String> + Send + Sync,
{
    fn issue_token(&self) -> Result<String> {
        self()
    }
}

/// Claims carried by a hub token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubClaims {
    /// Issuing system.
    pub iss: String,
    /// Issued at (unix seconds).
    pub iat: u64,
    /// Expiration (unix seconds).
    pub exp: u64,
    /// Random token id.
    pub jti: String,
}

/// Signs short-lived HS256 tokens with a shared secret.
#[derive(Clone)]
pub struct JwtTokenIssuer {
    encoding_key: EncodingKey,
    issuer: String,
    ttl: Duration,
}

impl JwtTokenIssuer {
    pub fn new(secret: &str, issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl,
        }
    }

    fn claims(&self) -> Result<HubClaims> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let jti: u128 = rand::random();

        let exp = now.checked_add(self.ttl.as_secs()).ok_or_else(|| {
            Error::Config(format!("token ttl of {}s is out of range", self.ttl.as_secs()))
        })?;

        Ok(HubClaims {
            iss: self.issuer.clone(),
            iat: now,
            exp,
            jti: format!("{jti:032x}"),
        })
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue_token(&self) -> Result<String> {
        Ok(encode(&Header::default(), &self.claims()?, &self.encoding_key)?)
    }
}

impl fmt::Debug for JwtTokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtTokenIssuer")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
