use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::app::{MemeflowError, Result};
use crate::report::ReportSender;

/// Telegram delivery settings, bound from configuration. Both fields must
/// be set for real delivery; otherwise the app falls back to
/// [`NullReportSender`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// User id or `-100...` group id.
    pub chat_id: String,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        !self.bot_token.trim().is_empty() && !self.chat_id.trim().is_empty()
    }
}

/// Sends report documents through the Telegram Bot API `sendDocument`
/// endpoint as multipart/form-data.
pub struct TelegramSender {
    client: Client,
    config: TelegramConfig,
}

impl TelegramSender {
    pub fn new(config: TelegramConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("memeflow/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self { client, config }
    }
}

#[async_trait]
impl ReportSender for TelegramSender {
    async fn send_document(&self, document: Vec<u8>, filename: &str, caption: &str) -> Result<()> {
        let url = format!(
            "https://api.telegram.org/bot{}/sendDocument",
            self.config.bot_token
        );

        let part = Part::bytes(document).file_name(filename.to_string());
        let form = Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .text("caption", caption.to_string())
            .part("document", part);

        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemeflowError::Delivery(format!(
                "telegram sendDocument failed: status {status}, body {body}"
            )));
        }

        Ok(())
    }
}

/// No-op sender used when Telegram credentials are absent. Logs a warning
/// and reports success, so the report schedulers keep running without a
/// delivery channel.
#[derive(Debug, Default)]
pub struct NullReportSender;

impl NullReportSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReportSender for NullReportSender {
    async fn send_document(&self, _document: Vec<u8>, filename: &str, _caption: &str) -> Result<()> {
        tracing::warn!(
            filename,
            "telegram disabled: bot_token/chat_id not configured, dropping report"
        );
        Ok(())
    }
}
