use serde::{Deserialize, Serialize};
use crate::platform::Platform;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedMovie {
    pub id: i64,
    pub tmdb_id: u32,
    pub title: String,
    pub platform: String, // Stored label, normally one of Platform's labels
}

/// Movie row to insert when a title is first added to the watchlist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMovie {
    pub tmdb_id: u32,
    pub title: String,
    pub platform: Platform,
    pub release_year: Option<i32>,
}
