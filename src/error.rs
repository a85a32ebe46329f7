//! Error types for the message hub bridge.

use thiserror::Error;

/// Every way a bridge call can fail.
///
/// The dispatcher never hands these to its callers: each public operation
/// logs the error and returns the internal-bridge-error response instead.
/// [`Error::EmptyValue`] is the exception, it comes straight out of
/// [`MailEnvelope::validate_self`](crate::MailEnvelope::validate_self).
#[derive(Error, Debug)]
pub enum Error {
    /// A required envelope field was blank.
    #[error("{field} is empty")]
    EmptyValue {
        /// Wire name of the first empty field.
        field: &'static str,
    },

    /// A cross-field business rule was violated.
    #[error("{0}")]
    Logic(String),

    /// The hub reply was not valid JSON.
    #[error("malformed JSON in hub response: {0}")]
    MalformedJson(#[source] serde_json::Error),

    /// The hub reply parsed but had the wrong shape or lacked a field.
    #[error("malformed hub response: {0}")]
    MalformedResponse(String),

    /// Network failure or non-2xx status from the hub.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The bearer token could not be issued.
    #[error("token encode error: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),

    /// Invalid bridge configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error while reading configuration or opening the log file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable short code for the failure kind, used as the `code` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::EmptyValue { .. } => "empty_value",
            Error::Logic(_) => "logic",
            Error::MalformedJson(_) => "malformed_json",
            Error::MalformedResponse(_) => "malformed_response",
            Error::Transport(_) => "transport",
            Error::Encode(_) => "encode",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }

    /// The error message followed by each of its sources, outermost first.
    pub fn chain(&self) -> Vec<String> {
        let mut chain = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            chain.push(err.to_string());
            source = err.source();
        }
        chain
    }
}
