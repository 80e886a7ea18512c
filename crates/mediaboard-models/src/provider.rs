use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::media::MediaKind;

/// One provider entry inside a region's availability lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderEntry {
    pub provider_name: String,
}

impl ProviderEntry {
    pub fn new(provider_name: impl Into<String>) -> Self {
        Self { provider_name: provider_name.into() }
    }
}

/// Availability offers for a single region
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegionAvailability {
    #[serde(default)]
    pub free: Vec<ProviderEntry>,
    #[serde(default)]
    pub flatrate: Vec<ProviderEntry>,
    #[serde(default)]
    pub ads: Vec<ProviderEntry>,
}

/// Watch-provider availability keyed by region code (e.g. "GB")
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchProviders {
    #[serde(default)]
    pub results: HashMap<String, RegionAvailability>,
}

impl WatchProviders {
    pub fn region(&self, region: &str) -> Option<&RegionAvailability> {
        self.results.get(region)
    }

    pub fn with_region(mut self, region: impl Into<String>, availability: RegionAvailability) -> Self {
        self.results.insert(region.into(), availability);
        self
    }
}

/// Season summary as listed on a show's detail payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeasonDescriptor {
    pub season_number: u32,
    pub air_date: Option<NaiveDate>,
    pub episode_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SeasonDescriptor {
    pub fn new(season_number: u32) -> Self {
        Self {
            season_number,
            air_date: None,
            episode_count: None,
            name: None,
        }
    }

    pub fn release_year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.air_date.map(|d| d.year())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderShow {
    pub tmdb_id: u32,
    pub name: String,
    pub status: Option<String>, // "Returning Series", "Ended", "Canceled", ...
    pub first_air_date: Option<NaiveDate>,
    pub seasons: Vec<SeasonDescriptor>,
    pub watch_providers: WatchProviders,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderMovie {
    pub tmdb_id: u32,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub watch_providers: WatchProviders,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpisodeDescriptor {
    pub episode_number: u32,
    pub name: Option<String>,
    pub air_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderSeason {
    pub season_number: u32,
    pub episodes: Vec<EpisodeDescriptor>,
}

/// A single hit from a title search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub tmdb_id: u32,
    pub kind: MediaKind,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub overview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
}
