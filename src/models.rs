//! Outbound payload types sent to the hub.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Maximum number of `to` recipients a single mail may carry.
///
/// The hub can fan out to many recipients, but its per-recipient state links
/// are not handled yet, so the bridge only lets one through.
pub const MAX_TO_EMAILS: usize = 1;

/// How the hub renders a mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EmailType {
    /// Styled notification (warning, error and so on).
    Notification,
    /// Plain mail, nothing extra rendered or wrapped around the body.
    Plain,
    /// Any other value. Representable so that it can be rejected before sending.
    Other(String),
}

impl EmailType {
    /// Wire names the hub accepts.
    pub const ALLOWED: [&'static str; 2] = ["NOTIFICATION", "PLAIN"];

    /// Wire name of this type.
    pub fn as_str(&self) -> &str {
        match self {
            EmailType::Notification => "NOTIFICATION",
            EmailType::Plain => "PLAIN",
            EmailType::Other(other) => other,
        }
    }

    /// Whether the hub supports this type.
    pub fn is_allowed(&self) -> bool {
        Self::ALLOWED.contains(&self.as_str())
    }
}

impl From<String> for EmailType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "NOTIFICATION" => EmailType::Notification,
            "PLAIN" => EmailType::Plain,
            _ => EmailType::Other(value),
        }
    }
}

impl From<&str> for EmailType {
    fn from(value: &str) -> Self {
        EmailType::from(value.to_string())
    }
}

impl From<EmailType> for String {
    fn from(value: EmailType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EmailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file attached to a mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name, unique within one mail.
    pub file_name: String,
    /// Raw file content.
    pub content: String,
}

/// Mail payload for the insert and direct-send endpoints.
///
/// Field order is the wire order: `fromEmail, subject, body, source,
/// toEmails, attachments, emailType, trackOpenState`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailEnvelope {
    /// Sender address.
    pub from_email: String,
    /// Mail subject.
    pub subject: String,
    /// Mail body.
    pub body: String,
    /// Name of the system the mail originates from.
    pub source: String,
    /// Recipient addresses.
    #[serde(rename = "toEmails")]
    pub to_recipients: Vec<String>,
    /// Attachments, sent as an object keyed by file name.
    #[serde(with = "attachment_map")]
    pub attachments: Vec<Attachment>,
    /// Rendering type.
    pub email_type: EmailType,
    /// Whether the hub should track when the mail is opened.
    pub track_open_state: bool,
}

impl MailEnvelope {
    /// Create an envelope with no recipients, no attachments and open
    /// tracking disabled.
    pub fn new(
        from_email: impl Into<String>,
        email_type: impl Into<EmailType>,
        subject: impl Into<String>,
        body: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            from_email: from_email.into(),
            subject: subject.into(),
            body: body.into(),
            source: source.into(),
            to_recipients: Vec::new(),
            attachments: Vec::new(),
            email_type: email_type.into(),
            track_open_state: false,
        }
    }

    /// Add a `to` recipient.
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to_recipients.push(recipient.into());
        self
    }

    /// Add an attachment.
    pub fn attachment(mut self, file_name: impl Into<String>, content: impl Into<String>) -> Self {
        self.attachments.push(Attachment {
            file_name: file_name.into(),
            content: content.into(),
        });
        self
    }

    /// Enable or disable open tracking.
    pub fn track_open_state(mut self, track: bool) -> Self {
        self.track_open_state = track;
        self
    }

    /// Number of `to` recipients.
    pub fn count_recipients(&self) -> usize {
        self.to_recipients.len()
    }

    /// Returns `true` when the recipient count is within [`MAX_TO_EMAILS`].
    pub fn assert_max_recipients(&self) -> bool {
        self.count_recipients() <= MAX_TO_EMAILS
    }

    /// Check that every required field is filled in.
    ///
    /// Fields are checked in the order subject, source, body, fromEmail,
    /// toEmails and the first empty one is reported.
    pub fn validate_self(&self) -> Result<()> {
        let required = [
            ("subject", self.subject.is_empty()),
            ("source", self.source.is_empty()),
            ("body", self.body.is_empty()),
            ("fromEmail", self.from_email.is_empty()),
            ("toEmails", self.to_recipients.is_empty()),
        ];

        match required.into_iter().find(|(_, empty)| *empty) {
            Some((field, _)) => Err(Error::EmptyValue { field }),
            None => Ok(()),
        }
    }

    /// Render the wire record as a JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Rebuild an envelope from its wire record.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Chat message payload for the Discord insert endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordMessage {
    /// Name of the hub-side webhook to post through.
    pub webhook_name: String,
    /// Message content.
    pub message: String,
    /// Name of the system the message originates from.
    pub source: String,
}

impl DiscordMessage {
    /// Webhook that fans out to every notification channel.
    pub const WEBHOOK_NAME_ALL_NOTIFICATIONS: &'static str = "allNotifications";
    /// Source name used by the PMS.
    pub const SOURCE_PMS: &'static str = "PMS";
    /// Source name used by the CIR.
    pub const SOURCE_CIR: &'static str = "CIR";

    /// Create a message for `webhook_name`.
    pub fn new(
        webhook_name: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            webhook_name: webhook_name.into(),
            message: message.into(),
            source: source.into(),
        }
    }
}

/// Serializes attachments as a `{file_name: content}` object, keeping the
/// caller's order and any duplicate names so the dispatcher can reject them.
mod attachment_map {
    use super::Attachment;
    use serde::de::{MapAccess, SeqAccess, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(
        attachments: &[Attachment],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            attachments
                .iter()
                .map(|a| (a.file_name.as_str(), a.content.as_str())),
        )
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Attachment>, D::Error> {
        deserializer.deserialize_any(AttachmentVisitor)
    }

    struct AttachmentVisitor;

    impl<'de> Visitor<'de> for AttachmentVisitor {
        type Value = Vec<Attachment>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object mapping file names to file contents")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut attachments = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((file_name, content)) = map.next_entry::<String, String>()? {
                attachments.push(Attachment { file_name, content });
            }
            Ok(attachments)
        }

        // An empty attachment set is sometimes encoded as `[]`.
        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            match seq.next_element::<serde::de::IgnoredAny>()? {
                None => Ok(Vec::new()),
                Some(_) => Err(serde::de::Error::custom(
                    "attachments must be an object keyed by file name",
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MailEnvelope {
        MailEnvelope::new(
            "noreply@example.com",
            EmailType::Plain,
            "Monthly report",
            "See attached.",
            "PMS",
        )
        .to("ops@example.com")
    }

    #[test]
    fn test_validate_self_accepts_complete_envelope() {
        assert!(sample().validate_self().is_ok());
    }

    #[test]
    fn test_validate_self_reports_first_empty_field_in_order() {
        let mut mail = MailEnvelope::new("", EmailType::Plain, "", "", "");
        let expected = ["subject", "source", "body", "fromEmail", "toEmails"];

        for field in expected {
            match mail.validate_self() {
                Err(Error::EmptyValue { field: got }) => assert_eq!(got, field),
                other => panic!("expected EmptyValue for {field}, got {other:?}"),
            }
            match field {
                "subject" => mail.subject = "s".into(),
                "source" => mail.source = "PMS".into(),
                "body" => mail.body = "b".into(),
                "fromEmail" => mail.from_email = "a@example.com".into(),
                _ => mail.to_recipients.push("b@example.com".into()),
            }
        }

        assert!(mail.validate_self().is_ok());
    }

    #[test]
    fn test_validate_self_only_missing_recipients() {
        let mut mail = sample();
        mail.to_recipients.clear();
        assert!(matches!(
            mail.validate_self(),
            Err(Error::EmptyValue { field: "toEmails" })
        ));
    }

    #[test]
    fn test_assert_max_recipients() {
        let mut mail = sample();
        mail.to_recipients.clear();
        assert_eq!(mail.count_recipients(), 0);
        assert!(mail.assert_max_recipients());

        let mail = mail.to("a@example.com");
        assert_eq!(mail.count_recipients(), 1);
        assert!(mail.assert_max_recipients());

        let mail = mail.to("b@example.com");
        assert_eq!(mail.count_recipients(), 2);
        assert!(!mail.assert_max_recipients());
    }

    #[test]
    fn test_wire_record_has_fixed_keys_in_order() {
        let mail = sample()
            .attachment("report.csv", "a,b\n1,2\n")
            .track_open_state(true);
        let json = mail.to_json().unwrap();

        assert_eq!(
            json,
            concat!(
                r#"{"fromEmail":"noreply@example.com","subject":"Monthly report","#,
                r#""body":"See attached.","source":"PMS","toEmails":["ops@example.com"],"#,
                r#""attachments":{"report.csv":"a,b\n1,2\n"},"emailType":"PLAIN","#,
                r#""trackOpenState":true}"#
            )
        );
    }

    #[test]
    fn test_from_json_rebuilds_envelope() {
        let mail = sample()
            .attachment("a.txt", "one")
            .attachment("b.txt", "two")
            .track_open_state(true);
        let rebuilt = MailEnvelope::from_json(&mail.to_json().unwrap()).unwrap();
        assert_eq!(rebuilt, mail);
    }

    #[test]
    fn test_from_json_accepts_empty_attachment_list() {
        let json = r#"{"fromEmail":"a@example.com","subject":"s","body":"b","source":"CIR",
            "toEmails":["c@example.com"],"attachments":[],"emailType":"NOTIFICATION",
            "trackOpenState":false}"#;
        let mail = MailEnvelope::from_json(json).unwrap();
        assert!(mail.attachments.is_empty());
        assert_eq!(mail.email_type, EmailType::Notification);
    }

    #[test]
    fn test_email_type_parsing() {
        assert_eq!(EmailType::from("PLAIN"), EmailType::Plain);
        assert_eq!(EmailType::from("NOTIFICATION"), EmailType::Notification);
        let other = EmailType::from("HTML");
        assert_eq!(other, EmailType::Other("HTML".to_string()));
        assert!(!other.is_allowed());
        assert!(EmailType::Plain.is_allowed());
        assert_eq!(other.to_string(), "HTML");
    }

    #[test]
    fn test_discord_message_wire_keys() {
        let msg = DiscordMessage::new(
            DiscordMessage::WEBHOOK_NAME_ALL_NOTIFICATIONS,
            "deploy finished",
            DiscordMessage::SOURCE_CIR,
        );
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"{"webhookName":"allNotifications","message":"deploy finished","source":"CIR"}"#
        );
    }
}
