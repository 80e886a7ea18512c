use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use crate::platform::Platform;
use crate::provider::{EpisodeDescriptor, SeasonDescriptor};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedShow {
    pub id: i64,
    pub tmdb_id: u32,
    pub title: String,
    pub status: Option<String>, // Provider lifecycle label, free text
    pub platform: String,       // Stored label, normally one of Platform's labels
    #[serde(default)]
    pub seasons: Vec<Season>,
}

impl TrackedShow {
    pub fn season_numbers(&self) -> BTreeSet<u32> {
        self.seasons.iter().map(|s| s.season_number).collect()
    }

    pub fn season(&self, season_number: u32) -> Option<&Season> {
        self.seasons.iter().find(|s| s.season_number == season_number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Season {
    pub id: i64,
    pub show_id: i64,
    pub season_number: u32,
    pub release_year: Option<i32>,
    /// Provider air date; drives the upcoming-release countdown
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    pub watched: bool,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    pub id: i64,
    pub season_id: i64,
    pub episode_number: u32,
    pub title: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub watched: bool,
}

/// Season row to upsert on `(show_id, season_number)`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSeason {
    pub show_id: i64,
    pub season_number: u32,
    pub release_year: Option<i32>,
    pub release_date: Option<NaiveDate>,
    pub watched: bool,
}

impl NewSeason {
    /// Sync-created seasons always start unwatched
    pub fn from_descriptor(show_id: i64, descriptor: &SeasonDescriptor) -> Self {
        Self {
            show_id,
            season_number: descriptor.season_number,
            release_year: descriptor.release_year(),
            release_date: descriptor.air_date,
            watched: false,
        }
    }
}

/// Episode row to upsert on `(season_id, episode_number)`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewEpisode {
    pub season_id: i64,
    pub episode_number: u32,
    pub title: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub watched: bool,
}

impl NewEpisode {
    pub fn from_descriptor(season_id: i64, descriptor: &EpisodeDescriptor) -> Self {
        Self {
            season_id,
            episode_number: descriptor.episode_number,
            title: descriptor.name.clone(),
            release_date: descriptor.air_date,
            watched: false,
        }
    }
}

/// Show row to insert when a title is first added to the watchlist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewShow {
    pub tmdb_id: u32,
    pub title: String,
    pub status: Option<String>,
    pub platform: Platform,
    pub release_date: Option<NaiveDate>,
}
