use crate::notify::USER_AGENT;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TriggerRequest {
    pub force: bool,
    pub daily: bool,
    pub platforms: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TriggerResponse {
    pub status: u16,
    pub body: String,
}

impl TriggerResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Asks a remote endpoint to run the reconciliation pass
pub struct RemoteTrigger {
    client: Client,
    url: String,
}

impl RemoteTrigger {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, url: url.into() })
    }

    fn request(&self, body: &TriggerRequest) -> RequestBuilder {
        self.client.post(&self.url).json(body)
    }

    /// Post the run flags; any HTTP status is returned, transport failures are errors
    pub async fn trigger(&self, force: bool, daily: bool, platforms: bool) -> anyhow::Result<TriggerResponse> {
        let body = TriggerRequest {
            force,
            daily,
            platforms,
            timestamp: Utc::now(),
        };
        let response = self.request(&body).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        info!(operation = "remote_trigger", status, "Remote update triggered");
        Ok(TriggerResponse { status, body })
    }
}
