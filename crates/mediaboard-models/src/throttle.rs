use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted marker of the last reconciliation pass that actually executed
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThrottleState {
    pub last_run: Option<DateTime<Utc>>,
}

impl ThrottleState {
    pub fn new(last_run: Option<DateTime<Utc>>) -> Self {
        Self { last_run }
    }

    pub fn ran_at(at: DateTime<Utc>) -> Self {
        Self { last_run: Some(at) }
    }
}
