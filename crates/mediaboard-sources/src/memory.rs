use crate::error::SourceError;
use crate::traits::{CatalogStore, ShowUpdate};
use async_trait::async_trait;
use mediaboard_models::{
    Episode, NewEpisode, NewMovie, NewSeason, NewShow, Platform, Season, TrackedMovie, TrackedShow,
};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    shows: Vec<TrackedShow>,
    movies: Vec<TrackedMovie>,
    next_id: i64,
    writes: usize,
    fail_loads: bool,
    failing_shows: HashSet<i64>,
    failing_movies: HashSet<i64>,
    failing_episode_seasons: HashSet<i64>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn bump_next_id(&mut self) {
        let show_ids = self.shows.iter().flat_map(|show| {
            std::iter::once(show.id).chain(
                show.seasons
                    .iter()
                    .flat_map(|season| std::iter::once(season.id).chain(season.episodes.iter().map(|e| e.id))),
            )
        });
        let max = show_ids
            .chain(self.movies.iter().map(|m| m.id))
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(max);
    }

    fn season_mut(&mut self, season_id: i64) -> Option<&mut Season> {
        self.shows
            .iter_mut()
            .flat_map(|show| show.seasons.iter_mut())
            .find(|season| season.id == season_id)
    }
}

/// In-process catalog with the same keying rules as the hosted one
///
/// Season and episode writes are idempotent on their natural keys and never touch
/// an existing row's `watched` flag. Failure switches let callers exercise the
/// error paths of a reconciliation pass.
#[derive(Debug)]
pub struct MemoryCatalog {
    key: String,
    state: Mutex<MemoryState>,
}

impl MemoryCatalog {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    pub fn with_shows(self, shows: Vec<TrackedShow>) -> Self {
        {
            let mut state = self.state();
            state.shows.extend(shows);
            state.bump_next_id();
        }
        self
    }

    pub fn with_movies(self, movies: Vec<TrackedMovie>) -> Self {
        {
            let mut state = self.state();
            state.movies.extend(movies);
            state.bump_next_id();
        }
        self
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn shows(&self) -> Vec<TrackedShow> {
        self.state().shows.clone()
    }

    pub fn movies(&self) -> Vec<TrackedMovie> {
        self.state().movies.clone()
    }

    pub fn show(&self, show_id: i64) -> Option<TrackedShow> {
        self.state().shows.iter().find(|s| s.id == show_id).cloned()
    }

    /// Number of successful write operations so far
    pub fn write_count(&self) -> usize {
        self.state().writes
    }

    pub fn fail_loads(&self, fail: bool) {
        self.state().fail_loads = fail;
    }

    /// Make every write touching this show (row update or season upsert) fail
    pub fn fail_writes_for_show(&self, show_id: i64) {
        self.state().failing_shows.insert(show_id);
    }

    pub fn fail_writes_for_movie(&self, movie_id: i64) {
        self.state().failing_movies.insert(movie_id);
    }

    pub fn fail_episode_writes_for_season(&self, season_id: i64) {
        self.state().failing_episode_seasons.insert(season_id);
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    fn catalog_key(&self) -> &str {
        &self.key
    }

    async fn load_shows(&self) -> Result<Vec<TrackedShow>, SourceError> {
        let state = self.state();
        if state.fail_loads {
            return Err(SourceError::load("tv_shows", "catalog unavailable"));
        }
        let mut shows = state.shows.clone();
        shows.sort_by_key(|s| s.id);
        Ok(shows)
    }

    async fn load_movies(&self) -> Result<Vec<TrackedMovie>, SourceError> {
        let state = self.state();
        if state.fail_loads {
            return Err(SourceError::load("movies", "catalog unavailable"));
        }
        let mut movies = state.movies.clone();
        movies.sort_by_key(|m| m.id);
        Ok(movies)
    }

    async fn update_show(&self, show_id: i64, update: &ShowUpdate) -> Result<(), SourceError> {
        let mut state = self.state();
        if state.failing_shows.contains(&show_id) {
            return Err(SourceError::persist("tv_shows", format!("write rejected for show {}", show_id)));
        }
        let show = state
            .shows
            .iter_mut()
            .find(|s| s.id == show_id)
            .ok_or_else(|| SourceError::persist("tv_shows", format!("no show with id {}", show_id)))?;

        if let Some(status) = &update.status {
            show.status = Some(status.clone());
        }
        if let Some(platform) = update.platform {
            show.platform = platform.label().to_string();
        }
        state.writes += 1;
        Ok(())
    }

    async fn update_movie_platform(&self, movie_id: i64, platform: Platform) -> Result<(), SourceError> {
        let mut state = self.state();
        if state.failing_movies.contains(&movie_id) {
            return Err(SourceError::persist("movies", format!("write rejected for movie {}", movie_id)));
        }
        let movie = state
            .movies
            .iter_mut()
            .find(|m| m.id == movie_id)
            .ok_or_else(|| SourceError::persist("movies", format!("no movie with id {}", movie_id)))?;

        movie.platform = platform.label().to_string();
        state.writes += 1;
        Ok(())
    }

    async fn upsert_season(&self, season: &NewSeason) -> Result<Season, SourceError> {
        let mut state = self.state();
        if state.failing_shows.contains(&season.show_id) {
            return Err(SourceError::persist(
                "tv_show_seasons",
                format!("write rejected for show {}", season.show_id),
            ));
        }
        let id = state.next_id + 1;
        let show = state
            .shows
            .iter_mut()
            .find(|s| s.id == season.show_id)
            .ok_or_else(|| SourceError::persist("tv_show_seasons", format!("no show with id {}", season.show_id)))?;

        if let Some(existing) = show.season(season.season_number) {
            return Ok(existing.clone());
        }

        let created = Season {
            id,
            show_id: season.show_id,
            season_number: season.season_number,
            release_year: season.release_year,
            release_date: season.release_date,
            watched: season.watched,
            episodes: Vec::new(),
        };
        show.seasons.push(created.clone());
        show.seasons.sort_by_key(|s| s.season_number);
        state.next_id = id;
        state.writes += 1;
        Ok(created)
    }

    async fn upsert_episodes(&self, episodes: &[NewEpisode]) -> Result<Vec<Episode>, SourceError> {
        let mut state = self.state();
        let mut created = Vec::new();

        for episode in episodes {
            if state.failing_episode_seasons.contains(&episode.season_id) {
                return Err(SourceError::persist(
                    "tv_show_episodes",
                    format!("write rejected for season {}", episode.season_id),
                ));
            }
            let id = state.allocate_id();
            let season = state.season_mut(episode.season_id).ok_or_else(|| {
                SourceError::persist("tv_show_episodes", format!("no season with id {}", episode.season_id))
            })?;

            if season.episodes.iter().any(|e| e.episode_number == episode.episode_number) {
                continue;
            }

            let row = Episode {
                id,
                season_id: episode.season_id,
                episode_number: episode.episode_number,
                title: episode.title.clone(),
                release_date: episode.release_date,
                watched: episode.watched,
            };
            season.episodes.push(row.clone());
            season.episodes.sort_by_key(|e| e.episode_number);
            created.push(row);
        }

        if !created.is_empty() {
            state.writes += 1;
        }
        Ok(created)
    }

    async fn insert_show(&self, show: &NewShow) -> Result<TrackedShow, SourceError> {
        let mut state = self.state();
        let tracked = TrackedShow {
            id: state.allocate_id(),
            tmdb_id: show.tmdb_id,
            title: show.title.clone(),
            status: show.status.clone(),
            platform: show.platform.label().to_string(),
            seasons: Vec::new(),
        };
        state.shows.push(tracked.clone());
        state.writes += 1;
        Ok(tracked)
    }

    async fn insert_movie(&self, movie: &NewMovie) -> Result<TrackedMovie, SourceError> {
        let mut state = self.state();
        let tracked = TrackedMovie {
            id: state.allocate_id(),
            tmdb_id: movie.tmdb_id,
            title: movie.title.clone(),
            platform: movie.platform.label().to_string(),
        };
        state.movies.push(tracked.clone());
        state.writes += 1;
        Ok(tracked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(id: i64) -> TrackedShow {
        TrackedShow {
            id,
            tmdb_id: 100 + id as u32,
            title: format!("Show {}", id),
            status: None,
            platform: "Online".to_string(),
            seasons: vec![Season {
                id: 50,
                show_id: id,
                season_number: 1,
                release_year: Some(2020),
                release_date: None,
                watched: true,
                episodes: Vec::new(),
            }],
        }
    }

    #[tokio::test]
    async fn test_upsert_season_is_idempotent_and_keeps_watched() {
        let catalog = MemoryCatalog::new("memory").with_shows(vec![show(1)]);

        let existing = catalog
            .upsert_season(&NewSeason {
                show_id: 1,
                season_number: 1,
                release_year: Some(2020),
                release_date: None,
                watched: false,
            })
            .await
            .unwrap();
        assert_eq!(existing.id, 50);
        assert!(existing.watched);
        assert_eq!(catalog.write_count(), 0);

        let created = catalog
            .upsert_season(&NewSeason {
                show_id: 1,
                season_number: 2,
                release_year: None,
                release_date: None,
                watched: false,
            })
            .await
            .unwrap();
        assert!(created.id > 50);
        assert_eq!(catalog.show(1).unwrap().seasons.len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_episodes_returns_only_created_rows() {
        let catalog = MemoryCatalog::new("memory").with_shows(vec![show(1)]);
        let episode = |n| NewEpisode {
            season_id: 50,
            episode_number: n,
            title: None,
            release_date: None,
            watched: false,
        };

        let first = catalog.upsert_episodes(&[episode(1), episode(2)]).await.unwrap();
        assert_eq!(first.len(), 2);

        let second = catalog.upsert_episodes(&[episode(2), episode(3)]).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].episode_number, 3);
        assert_eq!(catalog.show(1).unwrap().seasons[0].episodes.len(), 3);
    }

    #[tokio::test]
    async fn test_failure_switches() {
        let catalog = MemoryCatalog::new("memory").with_shows(vec![show(1)]);
        catalog.fail_writes_for_show(1);
        let err = catalog
            .update_show(
                1,
                &ShowUpdate {
                    status: Some("Ended".to_string()),
                    platform: None,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_persist());

        catalog.fail_loads(true);
        assert!(catalog.load_shows().await.is_err());
    }

    #[tokio::test]
    async fn test_inserted_ids_do_not_collide_with_seeded_rows() {
        let catalog = MemoryCatalog::new("memory").with_shows(vec![show(1)]);
        let movie = catalog
            .insert_movie(&NewMovie {
                tmdb_id: 603,
                title: "The Matrix".to_string(),
                platform: Platform::Netflix,
                release_year: Some(1999),
            })
            .await
            .unwrap();
        assert!(movie.id > 50);
        assert_eq!(movie.platform, "Netflix");
    }
}
