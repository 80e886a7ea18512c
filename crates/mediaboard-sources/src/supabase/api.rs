use crate::tmdb::api::parse_date;
use mediaboard_models::{
    Episode, NewEpisode, NewMovie, NewSeason, NewShow, Platform, Season, TrackedMovie, TrackedShow,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const SHOWS_TABLE: &str = "tv_shows";
pub const MOVIES_TABLE: &str = "movies";
pub const SEASONS_TABLE: &str = "tv_show_seasons";
pub const EPISODES_TABLE: &str = "tv_show_episodes";

pub const SEASON_CONFLICT_KEY: &str = "tv_show_id,season_number";
pub const EPISODE_CONFLICT_KEY: &str = "season_id,episode_number";

pub const EPISODE_COLUMNS: &str = "id,season_id,episode_number,title,release_date,watched";
pub const SEASON_COLUMNS: &str = "id,tv_show_id,season_number,release_year,release_date,watched";
pub const MOVIE_COLUMNS: &str = "id,tmdb_id,title,platform";

/// Shows with their seasons and episodes embedded in one request
pub fn show_select() -> String {
    format!(
        "id,tmdb_id,title,status,platform,{}({},{}({}))",
        SEASONS_TABLE, SEASON_COLUMNS, EPISODES_TABLE, EPISODE_COLUMNS
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShowRow {
    id: i64,
    tmdb_id: Option<i64>,
    title: Option<String>,
    status: Option<String>,
    platform: Option<String>,
    #[serde(default)]
    tv_show_seasons: Vec<SeasonRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SeasonRow {
    id: i64,
    tv_show_id: i64,
    season_number: i64,
    release_year: Option<i32>,
    #[serde(default)]
    release_date: Option<String>,
    watched: Option<bool>,
    #[serde(default)]
    tv_show_episodes: Vec<EpisodeRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EpisodeRow {
    id: i64,
    season_id: i64,
    episode_number: i64,
    title: Option<String>,
    release_date: Option<String>,
    watched: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MovieRow {
    id: i64,
    tmdb_id: Option<i64>,
    title: Option<String>,
    platform: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SeasonInsert {
    tv_show_id: i64,
    season_number: u32,
    release_year: Option<i32>,
    release_date: Option<String>,
    watched: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct EpisodeInsert<'a> {
    season_id: i64,
    episode_number: u32,
    title: Option<&'a str>,
    release_date: Option<String>,
    watched: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ShowInsert<'a> {
    tmdb_id: u32,
    title: &'a str,
    status: Option<&'a str>,
    platform: &'static str,
    release_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MovieInsert<'a> {
    tmdb_id: u32,
    title: &'a str,
    platform: &'static str,
    release_year: Option<i32>,
}

/// Partial show update; absent fields are not sent
#[derive(Debug, Serialize)]
pub(crate) struct ShowPatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PlatformPatch {
    pub platform: &'static str,
}

fn to_tmdb_id(raw: Option<i64>) -> Option<u32> {
    raw.and_then(|id| u32::try_from(id).ok()).filter(|id| *id > 0)
}

fn to_number(raw: i64) -> u32 {
    u32::try_from(raw).unwrap_or(0)
}

fn stored_platform(raw: Option<String>) -> String {
    raw.filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| Platform::Online.label().to_string())
}

impl ShowRow {
    /// Rows without a provider id cannot be reconciled and are skipped
    pub(crate) fn into_tracked(self) -> Option<TrackedShow> {
        let title = self.title.unwrap_or_default();
        let Some(tmdb_id) = to_tmdb_id(self.tmdb_id) else {
            warn!(show_id = self.id, title = %title, "Skipping show without a TMDB id");
            return None;
        };

        let mut seasons: Vec<Season> = self.tv_show_seasons.into_iter().map(SeasonRow::into_season).collect();
        seasons.sort_by_key(|s| s.season_number);

        Some(TrackedShow {
            id: self.id,
            tmdb_id,
            title,
            status: self.status,
            platform: stored_platform(self.platform),
            seasons,
        })
    }
}

impl SeasonRow {
    pub(crate) fn into_season(self) -> Season {
        let mut episodes: Vec<Episode> = self.tv_show_episodes.into_iter().map(EpisodeRow::into_episode).collect();
        episodes.sort_by_key(|e| e.episode_number);

        Season {
            id: self.id,
            show_id: self.tv_show_id,
            season_number: to_number(self.season_number),
            release_year: self.release_year,
            release_date: parse_date(self.release_date.as_deref()),
            watched: self.watched.unwrap_or(false),
            episodes,
        }
    }
}

impl EpisodeRow {
    pub(crate) fn into_episode(self) -> Episode {
        Episode {
            id: self.id,
            season_id: self.season_id,
            episode_number: to_number(self.episode_number),
            title: self.title,
            release_date: parse_date(self.release_date.as_deref()),
            watched: self.watched.unwrap_or(false),
        }
    }
}

impl MovieRow {
    pub(crate) fn into_tracked(self) -> Option<TrackedMovie> {
        let title = self.title.unwrap_or_default();
        let Some(tmdb_id) = to_tmdb_id(self.tmdb_id) else {
            warn!(movie_id = self.id, title = %title, "Skipping movie without a TMDB id");
            return None;
        };

        Some(TrackedMovie {
            id: self.id,
            tmdb_id,
            title,
            platform: stored_platform(self.platform),
        })
    }
}

impl From<&NewSeason> for SeasonInsert {
    fn from(season: &NewSeason) -> Self {
        Self {
            tv_show_id: season.show_id,
            season_number: season.season_number,
            release_year: season.release_year,
            release_date: season.release_date.map(|d| d.to_string()),
            watched: season.watched,
        }
    }
}

impl<'a> From<&'a NewEpisode> for EpisodeInsert<'a> {
    fn from(episode: &'a NewEpisode) -> Self {
        Self {
            season_id: episode.season_id,
            episode_number: episode.episode_number,
            title: episode.title.as_deref(),
            release_date: episode.release_date.map(|d| d.to_string()),
            watched: episode.watched,
        }
    }
}

impl<'a> From<&'a NewShow> for ShowInsert<'a> {
    fn from(show: &'a NewShow) -> Self {
        Self {
            tmdb_id: show.tmdb_id,
            title: &show.title,
            status: show.status.as_deref(),
            platform: show.platform.label(),
            release_date: show.release_date.map(|d| d.to_string()),
        }
    }
}

impl<'a> From<&'a NewMovie> for MovieInsert<'a> {
    fn from(movie: &'a NewMovie) -> Self {
        Self {
            tmdb_id: movie.tmdb_id,
            title: &movie.title,
            platform: movie.platform.label(),
            release_year: movie.release_year,
        }
    }
}
