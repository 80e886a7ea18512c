use crate::sync::ReconcileOutcome;
use crate::trigger::TriggerResponse;
use chrono::{DateTime, Utc};
use mediaboard_models::ChangeRecord;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

pub(crate) const USER_AGENT: &str = "MediaBoard-Update-Bot/1.0";
const NOTIFICATION_TYPE: &str = "mediaboard_update";

/// Flags a pass was requested with
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct UpdateFlags {
    pub force: bool,
    pub daily: bool,
    pub platforms: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ApiResult {
    pub status_code: u16,
    pub success: bool,
}

/// What a `sync` invocation did, as sent to the webhook
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub options: UpdateFlags,
    pub executed: bool,
    pub items_processed: usize,
    pub items_failed: usize,
    pub changes: Vec<ChangeRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_result: Option<ApiResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateSummary {
    fn empty(start_time: DateTime<Utc>, end_time: DateTime<Utc>, options: UpdateFlags) -> Self {
        let duration_ms = end_time
            .signed_duration_since(start_time)
            .num_milliseconds()
            .max(0) as u64;
        Self {
            start_time,
            end_time,
            duration_ms,
            options,
            executed: false,
            items_processed: 0,
            items_failed: 0,
            changes: Vec::new(),
            api_result: None,
            error: None,
        }
    }

    pub fn from_outcome(start_time: DateTime<Utc>, options: UpdateFlags, outcome: &ReconcileOutcome) -> Self {
        let end_time = start_time
            + chrono::Duration::from_std(outcome.duration).unwrap_or_else(|_| chrono::Duration::zero());
        Self {
            executed: outcome.executed,
            items_processed: outcome.items_processed,
            items_failed: outcome.items_failed,
            changes: outcome.changes.clone(),
            ..Self::empty(start_time, end_time, options)
        }
    }

    pub fn from_trigger(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        options: UpdateFlags,
        response: &TriggerResponse,
    ) -> Self {
        Self {
            executed: response.is_success(),
            api_result: Some(ApiResult {
                status_code: response.status,
                success: response.is_success(),
            }),
            ..Self::empty(start_time, end_time, options)
        }
    }

    pub fn failed(start_time: DateTime<Utc>, end_time: DateTime<Utc>, options: UpdateFlags, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::empty(start_time, end_time, options)
        }
    }
}

/// Posts update summaries to a webhook
///
/// Delivery is best effort: failures are logged and reported as `false`.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, url: url.into() })
    }

    pub fn payload(summary: &UpdateSummary, timestamp: DateTime<Utc>) -> Value {
        json!({
            "timestamp": timestamp.to_rfc3339(),
            "type": NOTIFICATION_TYPE,
            "data": summary,
        })
    }

    fn request(&self, summary: &UpdateSummary, timestamp: DateTime<Utc>) -> RequestBuilder {
        self.client.post(&self.url).json(&Self::payload(summary, timestamp))
    }

    pub async fn notify(&self, summary: &UpdateSummary) -> bool {
        match self.request(summary, Utc::now()).send().await {
            Ok(response) if response.status().is_success() => {
                info!(operation = "webhook", status = response.status().as_u16(), "Webhook notification sent");
                true
            }
            Ok(response) => {
                warn!(operation = "webhook", status = response.status().as_u16(), "Webhook rejected notification");
                false
            }
            Err(e) => {
                warn!(operation = "webhook", error = %e, "Failed to send webhook notification");
                false
            }
        }
    }
}
