use serde::{Deserialize, Serialize};
use crate::media::MediaKind;
use crate::platform::Platform;
use crate::provider::SeasonDescriptor;

/// One detected difference between stored and fetched state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    StatusChange {
        old: Option<String>,
        new: String,
    },
    SeasonsAdded {
        seasons: Vec<SeasonDescriptor>,
    },
    PlatformChange {
        old: String,
        new: Platform,
    },
}

impl Change {
    pub fn is_platform_change(&self) -> bool {
        matches!(self, Change::PlatformChange { .. })
    }

    /// Short human readable description, used by CLI output and webhook summaries
    pub fn describe(&self) -> String {
        match self {
            Change::StatusChange { old, new } => {
                format!("status {} -> {}", old.as_deref().unwrap_or("unknown"), new)
            }
            Change::SeasonsAdded { seasons } => {
                let numbers: Vec<String> = seasons.iter().map(|s| s.season_number.to_string()).collect();
                format!("new seasons {}", numbers.join(", "))
            }
            Change::PlatformChange { old, new } => format!("platform {} -> {}", old, new),
        }
    }
}

/// A change tagged with the tracked item it belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeRecord {
    pub item_id: i64,
    pub title: String,
    pub kind: MediaKind,
    pub change: Change,
}

impl ChangeRecord {
    pub fn new(item_id: i64, title: impl Into<String>, kind: MediaKind, change: Change) -> Self {
        Self {
            item_id,
            title: title.into(),
            kind,
            change,
        }
    }
}
