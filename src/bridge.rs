//! Message hub bridge dispatcher.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{Instrument, error, info, info_span};

use crate::config::BridgeConfig;
use crate::request::{
    DirectSendMailRequest, GetMailStatusRequest, HubRequest, InsertDiscordMessageRequest,
    InsertMailRequest, Method,
};
use crate::response::{
    DirectSendMailResponse, GetMailStatusResponse, InsertDiscordMessageResponse,
    InsertMailResponse,
};
use crate::token::{JwtTokenIssuer, TokenIssuer};
use crate::transport::{HttpTransport, Transport};
use crate::{EmailType, Error, MAX_TO_EMAILS, MailEnvelope, Result};

const TOKEN_QUERY_NAME: &str = "token";

/// Async client that sends validated operations to the message hub.
///
/// Each public operation validates its request, issues a bearer token, makes
/// exactly one HTTP call and decodes the reply. None of them fail: any error
/// is logged and the operation returns its internal-bridge-error response
/// (see [`BaseResponse::is_internal_bridge_error`](crate::BaseResponse::is_internal_bridge_error)).
///
/// Use [`MessageHubBridge::builder`] or [`MessageHubBridge::from_config`] for
/// the default `reqwest` and JWT collaborators, or [`MessageHubBridge::new`]
/// to plug in your own.
#[derive(Debug)]
pub struct MessageHubBridge<T = HttpTransport, K = JwtTokenIssuer> {
    transport: T,
    token_issuer: K,
    base_url: String,
    logger_name: String,
}

impl MessageHubBridge {
    /// Create a builder for the default `reqwest` + JWT bridge.
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::new()
    }

    /// Build the default bridge from a validated configuration.
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = BridgeBuilder::new()
            .base_url(&config.base_url)
            .logger_name(&config.logger_name)
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(config.danger_accept_invalid_certs)
            .token_secret(&config.token.secret)
            .token_issuer_name(&config.token.issuer)
            .token_ttl(config.token.ttl());

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(proxy);
        }

        builder.build()
    }
}

impl<T: Transport, K: TokenIssuer> MessageHubBridge<T, K> {
    /// Create a bridge over the given collaborators.
    pub fn new(base_url: impl Into<String>, transport: T, token_issuer: K) -> Self {
        Self {
            transport,
            token_issuer,
            base_url: base_url.into(),
            logger_name: DEFAULT_LOGGER_NAME.to_string(),
        }
    }

    /// Override the name carried on the bridge's log records.
    pub fn with_logger_name(mut self, logger_name: impl Into<String>) -> Self {
        self.logger_name = logger_name.into();
        self
    }

    /// Configured hub base URL, as given.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Post a chat message through a hub webhook.
    pub async fn insert_discord_message(
        &self,
        request: &InsertDiscordMessageRequest,
    ) -> InsertDiscordMessageResponse {
        self.dispatch(request).await
    }

    /// Queue a mail on the hub.
    ///
    /// # Examples
    /// ```no_run
    /// # use message_hub_bridge::{EmailType, InsertMailRequest, MailEnvelope, MessageHubBridge};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), message_hub_bridge::Error> {
    /// let bridge = MessageHubBridge::builder()
    ///     .base_url("https://hub.example.com")
    ///     .token_secret("s3cret")
    ///     .build()?;
    ///
    /// let mail = MailEnvelope::new("noreply@example.com", EmailType::Plain, "Hi", "Hello", "PMS")
    ///     .to("someone@example.com");
    /// let response = bridge.insert_mail(&InsertMailRequest::new(mail)).await;
    /// if !response.is_error() {
    ///     println!("queued as {}", response.id);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn insert_mail(&self, request: &InsertMailRequest) -> InsertMailResponse {
        self.dispatch(request).await
    }

    /// Store a mail on the hub and send it immediately.
    pub async fn direct_send_mail(&self, request: &DirectSendMailRequest) -> DirectSendMailResponse {
        self.dispatch(request).await
    }

    /// Query the hub's mail status.
    pub async fn get_mail_status(&self, request: &GetMailStatusRequest) -> GetMailStatusResponse {
        self.dispatch(request).await
    }

    /// Absolute, token-authenticated URL for `request_uri`.
    ///
    /// # Errors
    /// Returns [`Error::Encode`] when no token could be issued.
    pub fn build_absolute_url(&self, request_uri: &str) -> Result<String> {
        let token = self.token_issuer.issue_token()?;
        Ok(absolute_url(&self.base_url, request_uri, &token))
    }

    async fn dispatch<R: HubRequest>(&self, request: &R) -> R::Response {
        let operation = R::OPERATION;
        let span = info_span!(
            "message_hub_bridge",
            logger = %self.logger_name,
            operation = operation.name()
        );

        async {
            match self.try_dispatch(request).await {
                Ok(response) => response,
                Err(err) => {
                    error!(
                        error_message = %err,
                        code = err.kind(),
                        chain = ?err.chain(),
                        "exception was thrown"
                    );
                    R::internal_bridge_error()
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn try_dispatch<R: HubRequest>(&self, request: &R) -> Result<R::Response> {
        let operation = R::OPERATION;

        if let Some(mail) = request.mail() {
            check_mail(mail)?;
        }

        info!(
            called_method = operation.name(),
            base_url = %self.base_url,
            request_uri = operation.request_uri(),
            data_bag = "not logged, too big",
            "now calling api"
        );

        let url = self.build_absolute_url(operation.request_uri())?;
        let raw = match operation.method() {
            Method::Get => self.transport.send_get(&url).await?,
            Method::Post => {
                let body = request.to_wire_format().ok_or_else(|| {
                    Error::Logic(format!("{} has no request body", operation.name()))
                })?;
                self.transport.send_post(&url, &body).await?
            }
        };

        let response = R::decode(&raw)?;
        info!(
            response = %serde_json::to_string(&response).unwrap_or_default(),
            "got response from called endpoint"
        );

        Ok(response)
    }
}

/// Rules a mail must satisfy before it is sent to the hub.
fn check_mail(mail: &MailEnvelope) -> Result<()> {
    let mut names = HashSet::with_capacity(mail.attachments.len());
    for attachment in &mail.attachments {
        if !names.insert(attachment.file_name.as_str()) {
            return Err(Error::Logic(format!(
                "Attachment names must be unique. This one is not unique: {}",
                attachment.file_name
            )));
        }
    }

    if !mail.assert_max_recipients() {
        return Err(Error::Logic(format!(
            "{MAX_TO_EMAILS} `to` E-mail/s allowed, got: {} E-mail/s.",
            mail.count_recipients()
        )));
    }

    if !mail.email_type.is_allowed() {
        return Err(Error::Logic(format!(
            "Provided E-Mail type is not supported: {}. Allowed are: {:?}",
            mail.email_type,
            EmailType::ALLOWED
        )));
    }

    Ok(())
}

fn absolute_url(base_url: &str, request_uri: &str, token: &str) -> String {
    format!(
        "{}/{}?{}={}",
        base_url.trim_end_matches('/'),
        request_uri,
        TOKEN_QUERY_NAME,
        token
    )
}

const DEFAULT_LOGGER_NAME: &str = "message-hub-bridge";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(300);
const USER_AGENT_VALUE: &str = concat!("message-hub-bridge/", env!("CARGO_PKG_VERSION"));

/// Builder for the default `reqwest` + JWT bridge.
///
/// Start with [`MessageHubBridge::builder`]. `base_url` and `token_secret`
/// are required.
#[derive(Debug, Clone)]
pub struct BridgeBuilder {
    base_url: Option<String>,
    proxy: Option<String>,
    danger_accept_invalid_certs: bool,
    user_agent: String,
    timeout: Duration,
    token_secret: Option<String>,
    token_issuer_name: String,
    token_ttl: Duration,
    logger_name: String,
}

impl BridgeBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - No proxy
    /// - `danger_accept_invalid_certs = false`
    /// - 30 second request timeout
    /// - Tokens valid for 5 minutes
    pub fn new() -> Self {
        Self {
            base_url: None,
            proxy: None,
            danger_accept_invalid_certs: false,
            user_agent: USER_AGENT_VALUE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            token_secret: None,
            token_issuer_name: DEFAULT_LOGGER_NAME.to_string(),
            token_ttl: DEFAULT_TOKEN_TTL,
            logger_name: DEFAULT_LOGGER_NAME.to_string(),
        }
    }

    /// Hub base URL, with or without a trailing `/`.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set a proxy URL (e.g., "http://127.0.0.1:8080").
    ///
    /// This uses reqwest's proxy support for all requests.
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Control whether to accept invalid TLS certificates (default: false).
    pub fn danger_accept_invalid_certs(mut self, value: bool) -> Self {
        self.danger_accept_invalid_certs = value;
        self
    }

    /// Override the default user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Total timeout of each hub call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shared secret used to sign bearer tokens.
    pub fn token_secret(mut self, secret: impl Into<String>) -> Self {
        self.token_secret = Some(secret.into());
        self
    }

    /// `iss` claim of issued tokens.
    pub fn token_issuer_name(mut self, issuer: impl Into<String>) -> Self {
        self.token_issuer_name = issuer.into();
        self
    }

    /// Lifetime of issued tokens.
    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Name carried on the bridge's log records.
    pub fn logger_name(mut self, logger_name: impl Into<String>) -> Self {
        self.logger_name = logger_name.into();
        self
    }

    /// Build the bridge. No network traffic happens here.
    pub fn build(self) -> Result<MessageHubBridge> {
        let base_url = self
            .base_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;
        let secret = self
            .token_secret
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| Error::Config("token_secret is required".to_string()))?;

        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(self.danger_accept_invalid_certs)
            .user_agent(self.user_agent)
            .timeout(self.timeout);

        if let Some(proxy_url) = &self.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| Error::Config(format!("invalid proxy {proxy_url:?}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let transport = HttpTransport::new(builder.build()?);
        let token_issuer = JwtTokenIssuer::new(&secret, self.token_issuer_name, self.token_ttl);

        Ok(MessageHubBridge::new(base_url, transport, token_issuer).with_logger_name(self.logger_name))
    }
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail() -> MailEnvelope {
        MailEnvelope::new("a@example.com", EmailType::Notification, "s", "b", "PMS")
            .to("c@example.com")
    }

    #[test]
    fn test_absolute_url_adds_separator() {
        assert_eq!(
            absolute_url("https://hub.example.com", "api/x", "T"),
            "https://hub.example.com/api/x?token=T"
        );
    }

    #[test]
    fn test_absolute_url_keeps_single_separator() {
        assert_eq!(
            absolute_url("https://hub.example.com/", "api/x", "T"),
            "https://hub.example.com/api/x?token=T"
        );
        assert_eq!(
            absolute_url("https://hub.example.com//", "api/x", "T"),
            "https://hub.example.com/api/x?token=T"
        );
    }

    #[test]
    fn test_check_mail_accepts_valid_mail() {
        let mail = mail().attachment("a.txt", "1").attachment("b.txt", "2");
        assert!(check_mail(&mail).is_ok());
    }

    #[test]
    fn test_check_mail_rejects_duplicate_attachment() {
        let mail = mail().attachment("a.txt", "1").attachment("a.txt", "2");
        match check_mail(&mail) {
            Err(Error::Logic(msg)) => assert!(msg.ends_with("This one is not unique: a.txt")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_check_mail_rejects_too_many_recipients() {
        let mail = mail().to("d@example.com");
        match check_mail(&mail) {
            Err(Error::Logic(msg)) => assert_eq!(msg, "1 `to` E-mail/s allowed, got: 2 E-mail/s."),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_check_mail_rejects_unknown_type() {
        let mut mail = mail();
        mail.email_type = EmailType::from("HTML");
        match check_mail(&mail) {
            Err(Error::Logic(msg)) => {
                assert!(msg.contains("HTML"));
                assert!(msg.contains(r#"["NOTIFICATION", "PLAIN"]"#));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_check_mail_checks_attachments_first() {
        let mut mail = mail()
            .to("d@example.com")
            .attachment("a.txt", "1")
            .attachment("a.txt", "1");
        mail.email_type = EmailType::from("HTML");
        match check_mail(&mail) {
            Err(Error::Logic(msg)) => assert!(msg.starts_with("Attachment names must be unique")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_builder_requires_base_url_and_secret() {
        let err = MessageHubBridge::builder().token_secret("s").build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = MessageHubBridge::builder()
            .base_url("https://hub.example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_builder_builds_default_bridge() {
        let bridge = MessageHubBridge::builder()
            .base_url("https://hub.example.com")
            .token_secret("s3cret")
            .logger_name("pms-bridge")
            .build()
            .unwrap();
        assert_eq!(bridge.base_url(), "https://hub.example.com");
        assert_eq!(bridge.logger_name(), "pms-bridge");

        let url = bridge.build_absolute_url("api/x").unwrap();
        assert!(url.starts_with("https://hub.example.com/api/x?token=ey"));
    }

    #[test]
    fn test_builder_rejects_malformed_proxy_as_config_error() {
        let err = MessageHubBridge::builder()
            .base_url("https://hub.example.com")
            .token_secret("s3cret")
            .proxy("http://not a proxy")
            .build()
            .unwrap_err();
        match err {
            Error::Config(msg) => assert!(msg.starts_with("invalid proxy")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_config_validates() {
        let config = BridgeConfig::parse(
            r#"
base_url = "not a url"

[token]
secret = "s3cret"
"#,
        )
        .unwrap();
        assert!(matches!(
            MessageHubBridge::from_config(&config),
            Err(Error::Config(_))
        ));
    }
}
