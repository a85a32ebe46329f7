//! # Message Hub Bridge
//! Asynchronous client for a message hub service: queue or direct-send mails, post Discord messages, and query mail status through [`MessageHubBridge`].
//!
//! ## How a call works
//! Every operation takes a request descriptor ([`InsertMailRequest`], [`DirectSendMailRequest`], [`InsertDiscordMessageRequest`], [`GetMailStatusRequest`]), validates it, signs a short-lived bearer token with [`TokenIssuer`], appends it to the endpoint URL as `?token=`, performs exactly one HTTP call through [`Transport`], and decodes the JSON reply into a typed response. There are no retries, batching, or rate limits.
//!
//! ## Runtime requirements
//! Async-only; run inside a Tokio (v1) runtime. The default transport uses `reqwest`.
//!
//! ## Errors
//! Bridge operations never return an error. Any failure (validation, token, transport, or a malformed reply) is logged through `tracing` at `ERROR` level and the operation returns an internal-bridge-error response, see [`BaseResponse::is_internal_bridge_error`]. [`MailEnvelope::validate_self`] is the one call that returns [`Error::EmptyValue`] to the caller.
//!
//! ## Example
//! ```no_run
//! use message_hub_bridge::{EmailType, DirectSendMailRequest, MailEnvelope, MessageHubBridge};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), message_hub_bridge::Error> {
//!     let bridge = MessageHubBridge::builder()
//!         .base_url("https://hub.example.com")
//!         .token_secret("s3cret")
//!         .build()?;
//!
//!     let mail = MailEnvelope::new("noreply@example.com", EmailType::Notification, "Disk almost full", "92% used on /var", "PMS")
//!         .to("ops@example.com");
//!     mail.validate_self()?;
//!
//!     let response = bridge.direct_send_mail(&DirectSendMailRequest::new(mail)).await;
//!     if response.is_error() {
//!         eprintln!("hub call failed: {}", response.base.error_message);
//!     } else {
//!         println!("sent as mail {}", response.id);
//!     }
//!     Ok(())
//! }
//! ```

mod bridge;
pub mod config;
mod error;
pub mod logging;
mod models;
pub mod request;
pub mod response;
pub mod token;
pub mod transport;

pub use bridge::{BridgeBuilder, MessageHubBridge};
pub use config::BridgeConfig;
pub use error::Error;
pub use models::{Attachment, DiscordMessage, EmailType, MAX_TO_EMAILS, MailEnvelope};
pub use request::{
    DirectSendMailRequest, GetMailStatusRequest, HubRequest, InsertDiscordMessageRequest,
    InsertMailRequest, Operation,
};
pub use response::{
    BaseResponse, DirectSendMailResponse, GetMailStatusResponse, InsertDiscordMessageResponse,
    InsertMailResponse, InsertionResponse,
};
pub use token::{JwtTokenIssuer, TokenIssuer};
pub use transport::{HttpTransport, Transport};

/// Result type alias for bridge operations.
///
/// This is equivalent to `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
