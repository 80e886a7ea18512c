use serde::{Deserialize, Serialize};
use std::fmt;

/// Which watchlist table a tracked item lives in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Show,
    Movie,
}

impl MediaKind {
    /// Path segment used by the metadata provider (`tv` / `movie`)
    pub fn provider_path(&self) -> &'static str {
        match self {
            MediaKind::Show => "tv",
            MediaKind::Movie => "movie",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Show => write!(f, "show"),
            MediaKind::Movie => write!(f, "movie"),
        }
    }
}
