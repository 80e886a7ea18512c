use async_trait::async_trait;
use mediaboard_models::{
    Episode, MediaKind, NewEpisode, NewMovie, NewSeason, NewShow, Platform, ProviderMovie, ProviderSeason,
    ProviderShow, SearchResult, Season, TrackedMovie, TrackedShow,
};
use crate::error::SourceError;

/// External metadata provider (show/movie/season detail and title search)
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    /// Show detail with watch-provider availability embedded
    async fn fetch_show_detail(&self, tmdb_id: u32) -> Result<ProviderShow, SourceError>;

    /// Movie detail with watch-provider availability embedded
    async fn fetch_movie_detail(&self, tmdb_id: u32) -> Result<ProviderMovie, SourceError>;

    /// Episode listing for one season of a show
    async fn fetch_season_detail(&self, tmdb_id: u32, season_number: u32) -> Result<ProviderSeason, SourceError>;

    async fn search(&self, kind: MediaKind, query: &str, year: Option<i32>) -> Result<Vec<SearchResult>, SourceError>;
}

/// Partial update of a show row; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShowUpdate {
    pub status: Option<String>,
    pub platform: Option<Platform>,
}

impl ShowUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.platform.is_none()
    }
}

/// Row-based storage for the watchlist tables (shows, movies, seasons, episodes)
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Stable identifier for this catalog, used to key persisted throttle state
    fn catalog_key(&self) -> &str;

    /// All tracked shows with their seasons and episodes, in stable id order
    async fn load_shows(&self) -> Result<Vec<TrackedShow>, SourceError>;

    /// All tracked movies, in stable id order
    async fn load_movies(&self) -> Result<Vec<TrackedMovie>, SourceError>;

    async fn update_show(&self, show_id: i64, update: &ShowUpdate) -> Result<(), SourceError>;

    async fn update_movie_platform(&self, movie_id: i64, platform: Platform) -> Result<(), SourceError>;

    /// Insert a season keyed by `(show_id, season_number)`. An existing row is returned
    /// unchanged, so its `watched` flag survives retries.
    async fn upsert_season(&self, season: &NewSeason) -> Result<Season, SourceError>;

    /// Insert episodes keyed by `(season_id, episode_number)`, skipping ones that exist.
    /// Returns only the rows that were created.
    async fn upsert_episodes(&self, episodes: &[NewEpisode]) -> Result<Vec<Episode>, SourceError>;

    async fn insert_show(&self, show: &NewShow) -> Result<TrackedShow, SourceError>;

    async fn insert_movie(&self, movie: &NewMovie) -> Result<TrackedMovie, SourceError>;
}
