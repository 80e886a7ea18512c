use chrono::NaiveDate;
use mediaboard_models::{
    EpisodeDescriptor, MediaKind, ProviderEntry, ProviderMovie, ProviderSeason, ProviderShow, RegionAvailability,
    SearchResult, SeasonDescriptor, WatchProviders,
};
use serde::Deserialize;
use serde_json::Value;

/// Appended to detail requests so availability arrives with the detail payload
pub const APPEND_WATCH_PROVIDERS: &str = "watch/providers";

/// Search results are capped to the first page's top hits
pub const SEARCH_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub(crate) struct TmdbShowDetail {
    id: Option<u32>,
    name: Option<String>,
    status: Option<String>,
    first_air_date: Option<String>,
    #[serde(default)]
    seasons: Option<Vec<TmdbSeasonSummary>>,
    #[serde(rename = "watch/providers")]
    watch_providers: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct TmdbSeasonSummary {
    season_number: Option<u32>,
    air_date: Option<String>,
    episode_count: Option<u32>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TmdbMovieDetail {
    id: Option<u32>,
    title: Option<String>,
    release_date: Option<String>,
    #[serde(rename = "watch/providers")]
    watch_providers: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TmdbSeasonDetail {
    season_number: Option<u32>,
    #[serde(default)]
    episodes: Vec<TmdbEpisode>,
}

#[derive(Debug, Deserialize)]
struct TmdbEpisode {
    episode_number: Option<u32>,
    name: Option<String>,
    air_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<TmdbSearchHit>,
}

#[derive(Debug, Deserialize)]
struct TmdbSearchHit {
    id: u32,
    // Movies carry title/release_date, shows carry name/first_air_date
    title: Option<String>,
    name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
}

/// Empty or malformed dates are treated as unknown
pub(crate) fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
}

/// Parse the `watch/providers` block leniently
///
/// Regions or lists that do not have the expected shape are dropped rather than
/// failing the whole detail payload; an item with unreadable availability simply
/// resolves to the fallback platform.
pub(crate) fn parse_watch_providers(value: Option<&Value>) -> WatchProviders {
    let mut providers = WatchProviders::default();
    let Some(results) = value.and_then(|v| v.get("results")).and_then(Value::as_object) else {
        return providers;
    };

    for (region, offers) in results {
        if !offers.is_object() {
            continue;
        }
        let availability = RegionAvailability {
            free: provider_list(offers.get("free")),
            flatrate: provider_list(offers.get("flatrate")),
            ads: provider_list(offers.get("ads")),
        };
        providers.results.insert(region.clone(), availability);
    }

    providers
}

fn provider_list(value: Option<&Value>) -> Vec<ProviderEntry> {
    value
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("provider_name").and_then(Value::as_str))
                .map(ProviderEntry::new)
                .collect()
        })
        .unwrap_or_default()
}

impl TmdbShowDetail {
    pub(crate) fn into_show(self) -> Result<ProviderShow, String> {
        let tmdb_id = self.id.ok_or("show detail has no id")?;
        let seasons = self
            .seasons
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| {
                Some(SeasonDescriptor {
                    season_number: s.season_number?,
                    air_date: parse_date(s.air_date.as_deref()),
                    episode_count: s.episode_count,
                    name: s.name,
                })
            })
            .collect();

        Ok(ProviderShow {
            tmdb_id,
            name: self.name.unwrap_or_default(),
            status: self.status.filter(|s| !s.trim().is_empty()),
            first_air_date: parse_date(self.first_air_date.as_deref()),
            seasons,
            watch_providers: parse_watch_providers(self.watch_providers.as_ref()),
        })
    }
}

impl TmdbMovieDetail {
    pub(crate) fn into_movie(self) -> Result<ProviderMovie, String> {
        let tmdb_id = self.id.ok_or("movie detail has no id")?;
        Ok(ProviderMovie {
            tmdb_id,
            title: self.title.unwrap_or_default(),
            release_date: parse_date(self.release_date.as_deref()),
            watch_providers: parse_watch_providers(self.watch_providers.as_ref()),
        })
    }
}

impl TmdbSeasonDetail {
    pub(crate) fn into_season(self, requested_season: u32) -> ProviderSeason {
        let episodes = self
            .episodes
            .into_iter()
            .filter_map(|e| {
                Some(EpisodeDescriptor {
                    episode_number: e.episode_number?,
                    name: e.name.filter(|n| !n.trim().is_empty()),
                    air_date: parse_date(e.air_date.as_deref()),
                })
            })
            .collect();

        ProviderSeason {
            season_number: self.season_number.unwrap_or(requested_season),
            episodes,
        }
    }
}

impl TmdbSearchResponse {
    pub(crate) fn into_results(self, kind: MediaKind, image_base_url: &str) -> Vec<SearchResult> {
        self.results
            .into_iter()
            .take(SEARCH_LIMIT)
            .map(|hit| {
                let (title, date) = match kind {
                    MediaKind::Movie => (hit.title.or(hit.name), hit.release_date),
                    MediaKind::Show => (hit.name.or(hit.title), hit.first_air_date),
                };
                SearchResult {
                    tmdb_id: hit.id,
                    kind,
                    title: title.unwrap_or_default(),
                    release_date: parse_date(date.as_deref()),
                    overview: hit.overview.unwrap_or_default(),
                    poster_url: hit
                        .poster_path
                        .filter(|p| !p.is_empty())
                        .map(|p| format!("{}{}", image_base_url.trim_end_matches('/'), p)),
                }
            })
            .collect()
    }
}

/// Query parameter carrying the release-year filter for a search
pub(crate) fn year_param(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "primary_release_year",
        MediaKind::Show => "first_air_date_year",
    }
}
