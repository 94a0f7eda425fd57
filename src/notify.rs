use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info};

use crate::config::NotificationConfig;

/// One notification transport. Implementations do the delivery; retry and
/// failure policy live in [`NotifierSet`].
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;
    async fn notify(&self, subject: &str, body: &str) -> Result<()>;
}

/// Posts Slack-compatible JSON to a configured webhook URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        WebhookNotifier {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "text": format!("{subject}\n{body}") }))
            .send()
            .await
            .context("sending webhook notification")?;
        response
            .error_for_status()
            .context("webhook endpoint rejected notification")?;
        Ok(())
    }
}

/// Posts to an HTTP mail gateway; delivery to the mailbox is the gateway's
/// concern.
pub struct MailNotifier {
    client: reqwest::Client,
    url: String,
    to: String,
}

impl MailNotifier {
    pub fn new(url: String, to: String) -> Self {
        MailNotifier {
            client: reqwest::Client::new(),
            url,
            to,
        }
    }
}

#[async_trait]
impl Notifier for MailNotifier {
    fn name(&self) -> &'static str {
        "mail"
    }

    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "to": self.to, "subject": subject, "body": body }))
            .send()
            .await
            .context("sending mail notification")?;
        response
            .error_for_status()
            .context("mail gateway rejected notification")?;
        Ok(())
    }
}

/// Fan-out over every configured transport. Transports are attempted
/// independently; a failure is logged and dropped, never retried, so one
/// broken transport cannot block another or stall the calling loop.
pub struct NotifierSet {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierSet {
    pub fn from_config(config: &NotificationConfig) -> Self {
        let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();
        if let Some(mail) = &config.mail {
            notifiers.push(Box::new(MailNotifier::new(mail.url.clone(), mail.to.clone())));
        }
        if let Some(url) = &config.webhook_url {
            notifiers.push(Box::new(WebhookNotifier::new(url.clone())));
        }
        NotifierSet { notifiers }
    }

    #[cfg(test)]
    pub fn with_notifiers(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        NotifierSet { notifiers }
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    pub async fn notify_all(&self, subject: &str, body: &str) {
        for notifier in &self.notifiers {
            match notifier.notify(subject, body).await {
                Ok(()) => {
                    info!(
                        notifier = notifier.name(),
                        subject, "notification delivered"
                    );
                }
                Err(e) => {
                    error!(
                        notifier = notifier.name(),
                        subject, "failed to deliver notification: {:?}", e
                    );
                }
            }
        }
    }
}
