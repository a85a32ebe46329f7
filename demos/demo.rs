use message_hub_bridge::{
    BridgeConfig, DiscordMessage, EmailType, GetMailStatusRequest, InsertDiscordMessageRequest,
    InsertMailRequest, MailEnvelope, MessageHubBridge, logging,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "bridge.example.toml".to_string());
    let config = BridgeConfig::load_with_env(&path)?;
    let _log_guard = logging::init(&config.logging)?;

    let bridge = MessageHubBridge::from_config(&config)?;

    let mail = MailEnvelope::new(
        "noreply@example.com",
        EmailType::Notification,
        "Bridge demo",
        "Hello from the message hub bridge.",
        DiscordMessage::SOURCE_PMS,
    )
    .to("someone@example.com")
    .track_open_state(true);
    mail.validate_self()?;

    let inserted = bridge.insert_mail(&InsertMailRequest::new(mail)).await;
    if inserted.is_error() {
        eprintln!("insert failed: {}", inserted.base.error_message);
    } else {
        println!("queued mail {}", inserted.id);
    }

    let message = DiscordMessage::new(
        DiscordMessage::WEBHOOK_NAME_ALL_NOTIFICATIONS,
        "Bridge demo finished",
        DiscordMessage::SOURCE_PMS,
    );
    let posted = bridge
        .insert_discord_message(&InsertDiscordMessageRequest::new(message))
        .await;
    println!("discord message id: {}", posted.id);

    let status = bridge.get_mail_status(&GetMailStatusRequest::new()).await;
    println!("mail status: {}", status.data);

    Ok(())
}
