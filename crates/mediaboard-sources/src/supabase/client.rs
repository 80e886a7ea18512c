use crate::error::SourceError;
use crate::supabase::api::{
    self, EpisodeInsert, EpisodeRow, MovieInsert, MovieRow, PlatformPatch, SeasonInsert, SeasonRow, ShowInsert,
    ShowPatch, ShowRow,
};
use crate::traits::{CatalogStore, ShowUpdate};
use async_trait::async_trait;
use mediaboard_config::CatalogConfig;
use mediaboard_models::{
    Episode, NewEpisode, NewMovie, NewSeason, NewShow, Platform, Season, TrackedMovie, TrackedShow,
};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const PREFER_IGNORE_DUPLICATES: &str = "resolution=ignore-duplicates,return=representation";
const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_MINIMAL: &str = "return=minimal";

/// Which side of the catalog a failed request was on
#[derive(Debug, Clone, Copy)]
enum Access {
    Read,
    Write,
}

/// Watchlist catalog backed by Supabase's PostgREST interface
#[derive(Debug, Clone)]
pub struct SupabaseCatalog {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self, SourceError> {
        let base_url = config.supabase_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(SourceError::Config("catalog.supabase_url is not set".to_string()));
        }
        let service_key = config
            .usable_service_key()
            .ok_or_else(|| SourceError::Config("catalog.service_key is not set".to_string()))?
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            service_key,
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn send(&self, table: &str, access: Access, request: RequestBuilder) -> Result<Response, SourceError> {
        let to_error = |message: String| match access {
            Access::Read => SourceError::load(table, message),
            Access::Write => SourceError::persist(table, message),
        };

        let response = request.send().await.map_err(|e| to_error(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(to_error(format!("HTTP {}: {}", status.as_u16(), body)));
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        table: &str,
        access: Access,
        request: RequestBuilder,
    ) -> Result<T, SourceError> {
        let response = self.send(table, access, request).await?;
        response.json().await.map_err(|e| match access {
            Access::Read => SourceError::load(table, format!("invalid response body: {}", e)),
            Access::Write => SourceError::persist(table, format!("invalid response body: {}", e)),
        })
    }

    async fn find_season(&self, show_id: i64, season_number: u32) -> Result<Option<Season>, SourceError> {
        let request = self.request(Method::GET, api::SEASONS_TABLE).query(&[
            ("select", api::SEASON_COLUMNS.to_string()),
            ("tv_show_id", format!("eq.{}", show_id)),
            ("season_number", format!("eq.{}", season_number)),
        ]);
        let rows: Vec<SeasonRow> = self.send_json(api::SEASONS_TABLE, Access::Write, request).await?;
        Ok(rows.into_iter().next().map(SeasonRow::into_season))
    }
}

#[async_trait]
impl CatalogStore for SupabaseCatalog {
    fn catalog_key(&self) -> &str {
        &self.base_url
    }

    async fn load_shows(&self) -> Result<Vec<TrackedShow>, SourceError> {
        let request = self
            .request(Method::GET, api::SHOWS_TABLE)
            .query(&[("select", api::show_select()), ("order", "id.asc".to_string())]);
        let rows: Vec<ShowRow> = self.send_json(api::SHOWS_TABLE, Access::Read, request).await?;

        let shows: Vec<TrackedShow> = rows.into_iter().filter_map(ShowRow::into_tracked).collect();
        debug!(count = shows.len(), "Loaded tracked shows");
        Ok(shows)
    }

    async fn load_movies(&self) -> Result<Vec<TrackedMovie>, SourceError> {
        let request = self
            .request(Method::GET, api::MOVIES_TABLE)
            .query(&[("select", api::MOVIE_COLUMNS), ("order", "id.asc")]);
        let rows: Vec<MovieRow> = self.send_json(api::MOVIES_TABLE, Access::Read, request).await?;

        let movies: Vec<TrackedMovie> = rows.into_iter().filter_map(MovieRow::into_tracked).collect();
        debug!(count = movies.len(), "Loaded tracked movies");
        Ok(movies)
    }

    async fn update_show(&self, show_id: i64, update: &ShowUpdate) -> Result<(), SourceError> {
        if update.is_empty() {
            return Ok(());
        }
        let patch = ShowPatch {
            status: update.status.as_deref(),
            platform: update.platform.map(|p| p.label()),
        };
        let request = self
            .request(Method::PATCH, api::SHOWS_TABLE)
            .query(&[("id", format!("eq.{}", show_id))])
            .header("Prefer", PREFER_MINIMAL)
            .json(&patch);
        self.send(api::SHOWS_TABLE, Access::Write, request).await?;
        Ok(())
    }

    async fn update_movie_platform(&self, movie_id: i64, platform: Platform) -> Result<(), SourceError> {
        let request = self
            .request(Method::PATCH, api::MOVIES_TABLE)
            .query(&[("id", format!("eq.{}", movie_id))])
            .header("Prefer", PREFER_MINIMAL)
            .json(&PlatformPatch {
                platform: platform.label(),
            });
        self.send(api::MOVIES_TABLE, Access::Write, request).await?;
        Ok(())
    }

    async fn upsert_season(&self, season: &NewSeason) -> Result<Season, SourceError> {
        let request = self
            .request(Method::POST, api::SEASONS_TABLE)
            .query(&[("on_conflict", api::SEASON_CONFLICT_KEY), ("select", api::SEASON_COLUMNS)])
            .header("Prefer", PREFER_IGNORE_DUPLICATES)
            .json(&[SeasonInsert::from(season)]);
        let rows: Vec<SeasonRow> = self.send_json(api::SEASONS_TABLE, Access::Write, request).await?;

        if let Some(row) = rows.into_iter().next() {
            return Ok(row.into_season());
        }

        // Duplicate rows are not returned, so read back the existing season
        self.find_season(season.show_id, season.season_number)
            .await?
            .ok_or_else(|| {
                SourceError::persist(
                    api::SEASONS_TABLE,
                    format!(
                        "season {} of show {} was neither created nor found",
                        season.season_number, season.show_id
                    ),
                )
            })
    }

    async fn upsert_episodes(&self, episodes: &[NewEpisode]) -> Result<Vec<Episode>, SourceError> {
        if episodes.is_empty() {
            return Ok(Vec::new());
        }
        let body: Vec<EpisodeInsert<'_>> = episodes.iter().map(EpisodeInsert::from).collect();
        let request = self
            .request(Method::POST, api::EPISODES_TABLE)
            .query(&[("on_conflict", api::EPISODE_CONFLICT_KEY), ("select", api::EPISODE_COLUMNS)])
            .header("Prefer", PREFER_IGNORE_DUPLICATES)
            .json(&body);
        let rows: Vec<EpisodeRow> = self.send_json(api::EPISODES_TABLE, Access::Write, request).await?;
        Ok(rows.into_iter().map(EpisodeRow::into_episode).collect())
    }

    async fn insert_show(&self, show: &NewShow) -> Result<TrackedShow, SourceError> {
        let request = self
            .request(Method::POST, api::SHOWS_TABLE)
            .query(&[("select", "id,tmdb_id,title,status,platform")])
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&[ShowInsert::from(show)]);
        let rows: Vec<ShowRow> = self.send_json(api::SHOWS_TABLE, Access::Write, request).await?;

        rows.into_iter()
            .next()
            .and_then(ShowRow::into_tracked)
            .ok_or_else(|| SourceError::persist(api::SHOWS_TABLE, "insert returned no row"))
    }

    async fn insert_movie(&self, movie: &NewMovie) -> Result<TrackedMovie, SourceError> {
        let request = self
            .request(Method::POST, api::MOVIES_TABLE)
            .query(&[("select", api::MOVIE_COLUMNS)])
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&[MovieInsert::from(movie)]);
        let rows: Vec<MovieRow> = self.send_json(api::MOVIES_TABLE, Access::Write, request).await?;

        rows.into_iter()
            .next()
            .and_then(MovieRow::into_tracked)
            .ok_or_else(|| SourceError::persist(api::MOVIES_TABLE, "insert returned no row"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CatalogConfig {
        CatalogConfig {
            supabase_url: "https://abc.supabase.co/".to_string(),
            service_key: Some("service".to_string()),
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_requires_url_and_key() {
        let mut missing_key = config();
        missing_key.service_key = None;
        assert!(matches!(SupabaseCatalog::new(&missing_key), Err(SourceError::Config(_))));

        let mut missing_url = config();
        missing_url.supabase_url = "  ".to_string();
        assert!(matches!(SupabaseCatalog::new(&missing_url), Err(SourceError::Config(_))));
    }

    #[test]
    fn test_catalog_key_is_normalized_url() {
        let catalog = SupabaseCatalog::new(&config()).unwrap();
        assert_eq!(catalog.catalog_key(), "https://abc.supabase.co");
    }

    #[test]
    fn test_requests_carry_service_key_headers() {
        let catalog = SupabaseCatalog::new(&config()).unwrap();
        let request = catalog
            .request(Method::GET, api::SHOWS_TABLE)
            .query(&[("order", "id.asc")])
            .build()
            .unwrap();

        assert_eq!(request.url().as_str(), "https://abc.supabase.co/rest/v1/tv_shows?order=id.asc");
        assert_eq!(request.headers().get("apikey").unwrap(), "service");
        assert_eq!(request.headers().get("authorization").unwrap(), "Bearer service");
    }
}
