//! forwards single alerts as pushbullet pushes
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::{alert::Alert, metrics, settings::Settings};

/// error delivering a single push notification
///
/// Delivery failures are scoped to the alert that triggered them, the caller
/// decides whether to abort or keep going.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// request could not be sent or the response body not read
    #[error("pushbullet request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// pushbullet answered with a non-2xx status
    #[error("pushbullet rejected push with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

/// payload of a pushbullet `/v2/pushes` call
#[derive(Debug, Serialize, PartialEq, Eq)]
struct Push {
    body: String,
    title: String,
    #[serde(rename = "type")]
    kind: &'static str,
    channel_tag: String,
}

impl Push {
    fn from_alert(alert: &Alert, channel_tag: &str) -> Self {
        let severity = alert.severity();

        Self {
            body: format!(
                "Started at {}\nStatus: {}\nSeverity: {}\nLabels {:?}",
                alert.starts_at.to_rfc3339(),
                alert.status,
                severity,
                alert.labels
            ),
            title: format!("[{}] {}", severity, alert.summary()),
            kind: "note",
            channel_tag: channel_tag.to_string(),
        }
    }
}

/// pushbullet client, shared by all webhook requests
#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,
    api_addr: String,
    api_token: String,
    channel_tag: String,
}

impl Notifier {
    pub fn new(client: reqwest::Client, settings: &Settings) -> Self {
        Self {
            client,
            api_addr: settings.api_addr.clone(),
            api_token: settings.api_token.clone(),
            channel_tag: settings.channel_tag.clone(),
        }
    }

    /// sends one alert as a push notification and logs the api response
    pub async fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        tracing::info!("sending message to pushbullet");

        let push = Push::from_alert(alert, &self.channel_tag);

        let result = self.send(&push).await;

        let outcome = if result.is_ok() { "sent" } else { "failed" };
        metrics::NOTIFICATIONS.with_label_values(&[outcome]).inc();

        result
    }

    async fn send(&self, push: &Push) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.api_addr)
            .header("Access-Token", &self.api_token)
            .json(push)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(NotifyError::Rejected { status, body });
        }

        tracing::info!("response: {}", body);

        Ok(())
    }
}
