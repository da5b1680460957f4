use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use configs::MailConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMail {
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    /// Plain text body.
    pub text: String,
    /// `text` with newlines turned into `<br>`.
    pub html: String,
}

impl OutgoingMail {
    pub fn new(from: &str, to: &[String], cc: &[String], subject: &str, body: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_vec(),
            cc: cc.to_vec(),
            subject: subject.to_string(),
            text: body.to_string(),
            html: body.replace('\n', "<br>"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("mail relay request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("mail relay rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("mail relay reply carried no message id")]
    MissingMessageId,
}

/// Delivers one message and returns the provider's message id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<String, TransportError>;
}

/// Posts messages as JSON to an HTTP mail relay.
pub struct HttpRelayTransport {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayReply {
    message_id: Option<String>,
    id: Option<String>,
}

impl HttpRelayTransport {
    pub fn new(url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url: url.into(), api_key })
    }

    /// `None` when no relay is configured.
    pub fn from_config(cfg: &MailConfig) -> Result<Option<Self>, TransportError> {
        match &cfg.relay_url {
            Some(url) => Ok(Some(Self::new(url, cfg.api_key.clone(), Duration::from_secs(cfg.timeout_secs))?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl MailTransport for HttpRelayTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<String, TransportError> {
        let mut req = self.client.post(&self.url).json(mail);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Rejected { status: status.as_u16(), body });
        }
        let reply: RelayReply = resp.json().await?;
        reply.message_id.or(reply.id).ok_or(TransportError::MissingMessageId)
    }
}
