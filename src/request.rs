//! Request descriptors: one per hub operation.

use serde::Serialize;

use crate::response::{self, BaseResponse, InsertionResponse};
use crate::{DiscordMessage, MailEnvelope, Result};

/// HTTP method used for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// The closed set of operations the hub exposes to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    InsertDiscordMessage,
    InsertMail,
    DirectSendMail,
    GetMailStatus,
}

impl Operation {
    /// Endpoint path relative to the hub base URL.
    pub const fn request_uri(self) -> &'static str {
        match self {
            Operation::InsertDiscordMessage => "api/external/discord/insert-message",
            Operation::InsertMail => "api/external/mailing/insert",
            Operation::DirectSendMail => "api/external/mailing/direct-send",
            Operation::GetMailStatus => "api/external/mailing/get-status",
        }
    }

    /// HTTP method the endpoint expects.
    pub const fn method(self) -> Method {
        match self {
            Operation::GetMailStatus => Method::Get,
            _ => Method::Post,
        }
    }

    /// Name used in log records.
    pub const fn name(self) -> &'static str {
        match self {
            Operation::InsertDiscordMessage => "insert_discord_message",
            Operation::InsertMail => "insert_mail",
            Operation::DirectSendMail => "direct_send_mail",
            Operation::GetMailStatus => "get_mail_status",
        }
    }
}

/// JSON body of a POST operation.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum WireBody<'a> {
    Mail(&'a MailEnvelope),
    Discord(&'a DiscordMessage),
}

/// A descriptor the bridge knows how to dispatch.
///
/// Each descriptor is paired with exactly one response type and knows how to
/// decode the hub's reply into it.
pub trait HubRequest {
    /// Typed reply for this operation.
    type Response: Serialize;

    const OPERATION: Operation;

    /// Body to POST, `None` for GET operations.
    fn to_wire_format(&self) -> Option<WireBody<'_>>;

    /// Embedded mail, for operations that carry one.
    fn mail(&self) -> Option<&MailEnvelope> {
        None
    }

    /// Decode a raw hub reply.
    fn decode(raw: &str) -> Result<Self::Response>;

    /// The internal-bridge-error response for this operation.
    fn internal_bridge_error() -> Self::Response;

    fn request_uri(&self) -> &'static str {
        Self::OPERATION.request_uri()
    }
}

/// Post a chat message through a hub webhook.
#[derive(Debug, Clone)]
pub struct InsertDiscordMessageRequest {
    pub message: DiscordMessage,
}

impl InsertDiscordMessageRequest {
    pub fn new(message: DiscordMessage) -> Self {
        Self { message }
    }
}

impl HubRequest for InsertDiscordMessageRequest {
    type Response = InsertionResponse;
    const OPERATION: Operation = Operation::InsertDiscordMessage;

    fn to_wire_format(&self) -> Option<WireBody<'_>> {
        Some(WireBody::Discord(&self.message))
    }

    fn decode(raw: &str) -> Result<InsertionResponse> {
        response::decode_insertion(raw, "Discord message")
    }

    fn internal_bridge_error() -> InsertionResponse {
        InsertionResponse::internal_bridge_error()
    }
}

/// Queue a mail on the hub for later sending.
#[derive(Debug, Clone)]
pub struct InsertMailRequest {
    pub mail: MailEnvelope,
}

impl InsertMailRequest {
    pub fn new(mail: MailEnvelope) -> Self {
        Self { mail }
    }
}

impl HubRequest for InsertMailRequest {
    type Response = InsertionResponse;
    const OPERATION: Operation = Operation::InsertMail;

    fn to_wire_format(&self) -> Option<WireBody<'_>> {
        Some(WireBody::Mail(&self.mail))
    }

    fn mail(&self) -> Option<&MailEnvelope> {
        Some(&self.mail)
    }

    fn decode(raw: &str) -> Result<InsertionResponse> {
        response::decode_insertion(raw, "E-Mail")
    }

    fn internal_bridge_error() -> InsertionResponse {
        InsertionResponse::internal_bridge_error()
    }
}

/// Store a mail on the hub and send it right away.
#[derive(Debug, Clone)]
pub struct DirectSendMailRequest {
    pub mail: MailEnvelope,
}

impl DirectSendMailRequest {
    pub fn new(mail: MailEnvelope) -> Self {
        Self { mail }
    }
}

impl HubRequest for DirectSendMailRequest {
    type Response = InsertionResponse;
    const OPERATION: Operation = Operation::DirectSendMail;

    fn to_wire_format(&self) -> Option<WireBody<'_>> {
        Some(WireBody::Mail(&self.mail))
    }

    fn mail(&self) -> Option<&MailEnvelope> {
        Some(&self.mail)
    }

    fn decode(raw: &str) -> Result<InsertionResponse> {
        response::decode_insertion(raw, "E-Mail")
    }

    fn internal_bridge_error() -> InsertionResponse {
        InsertionResponse::internal_bridge_error()
    }
}

/// Ask the hub for the state of its mail queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetMailStatusRequest;

impl GetMailStatusRequest {
    pub fn new() -> Self {
        Self
    }
}

impl HubRequest for GetMailStatusRequest {
    type Response = BaseResponse;
    const OPERATION: Operation = Operation::GetMailStatus;

    fn to_wire_format(&self) -> Option<WireBody<'_>> {
        None
    }

    fn decode(raw: &str) -> Result<BaseResponse> {
        response::decode_base(raw)
    }

    fn internal_bridge_error() -> BaseResponse {
        BaseResponse::internal_bridge_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EmailType;

    fn mail() -> MailEnvelope {
        MailEnvelope::new("a@example.com", EmailType::Plain, "s", "b", "PMS").to("c@example.com")
    }

    #[test]
    fn test_request_uris_are_fixed() {
        assert_eq!(
            DirectSendMailRequest::new(mail()).request_uri(),
            "api/external/mailing/direct-send"
        );
        assert_eq!(InsertMailRequest::new(mail()).request_uri(), "api/external/mailing/insert");
        assert_eq!(
            GetMailStatusRequest::new().request_uri(),
            "api/external/mailing/get-status"
        );
        let discord = DiscordMessage::new("allNotifications", "hi", "PMS");
        assert_eq!(
            InsertDiscordMessageRequest::new(discord).request_uri(),
            "api/external/discord/insert-message"
        );
    }

    #[test]
    fn test_only_status_query_uses_get() {
        assert_eq!(Operation::GetMailStatus.method(), Method::Get);
        assert_eq!(Operation::InsertMail.method(), Method::Post);
        assert_eq!(Operation::DirectSendMail.method(), Method::Post);
        assert_eq!(Operation::InsertDiscordMessage.method(), Method::Post);
    }

    #[test]
    fn test_mail_wire_format_is_envelope_record() {
        let request = InsertMailRequest::new(mail());
        let body = serde_json::to_value(request.to_wire_format().unwrap()).unwrap();
        let envelope = serde_json::to_value(&request.mail).unwrap();
        assert_eq!(body, envelope);
        assert!(request.mail().is_some());
    }

    #[test]
    fn test_status_query_has_no_body() {
        let request = GetMailStatusRequest::new();
        assert!(request.to_wire_format().is_none());
        assert!(request.mail().is_none());
    }
}
