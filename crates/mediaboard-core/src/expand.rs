use mediaboard_models::{Episode, NewEpisode, NewSeason, Season, SeasonDescriptor};
use mediaboard_sources::{CatalogStore, MetadataProvider, SourceError};
use tracing::{debug, warn};

/// Creates season rows and their episodes for newly discovered seasons, and
/// fills in episodes for seasons stored without them
pub struct SeasonExpander<'a> {
    provider: &'a dyn MetadataProvider,
    catalog: &'a dyn CatalogStore,
}

impl<'a> SeasonExpander<'a> {
    pub fn new(provider: &'a dyn MetadataProvider, catalog: &'a dyn CatalogStore) -> Self {
        Self { provider, catalog }
    }

    /// Persist each season, then fetch and persist its episodes
    ///
    /// Everything created here starts unwatched. A season row is written before its
    /// episodes are fetched; if the episode fetch or write fails the season is kept
    /// without episodes and the next season is processed. A failed season write
    /// aborts the expansion with that error.
    pub async fn materialize(
        &self,
        show_id: i64,
        tmdb_id: u32,
        descriptors: &[SeasonDescriptor],
    ) -> Result<Vec<Season>, SourceError> {
        let mut seasons = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let mut season = self
                .catalog
                .upsert_season(&NewSeason::from_descriptor(show_id, descriptor))
                .await?;

            match self.fetch_episodes(tmdb_id, &season).await {
                Ok(created) => {
                    debug!(
                        show_id,
                        season_number = season.season_number,
                        episodes = created.len(),
                        "Materialized season"
                    );
                    season.episodes.extend(created);
                }
                Err(e) => warn!(
                    show_id,
                    tmdb_id,
                    season_number = descriptor.season_number,
                    error = %e,
                    "Failed to store episodes, keeping season without them"
                ),
            }

            seasons.push(season);
        }

        Ok(seasons)
    }

    /// Fetch the episode list of an already stored season and write the missing rows
    ///
    /// Returns only the episodes created here. Errors are returned to the caller,
    /// nothing is written when the fetch fails.
    pub async fn backfill(&self, tmdb_id: u32, season: &Season) -> Result<Vec<Episode>, SourceError> {
        let created = self.fetch_episodes(tmdb_id, season).await?;
        if !created.is_empty() {
            debug!(
                show_id = season.show_id,
                season_number = season.season_number,
                episodes = created.len(),
                "Backfilled episodes"
            );
        }
        Ok(created)
    }

    async fn fetch_episodes(&self, tmdb_id: u32, season: &Season) -> Result<Vec<Episode>, SourceError> {
        let detail = self.provider.fetch_season_detail(tmdb_id, season.season_number).await?;
        let episodes: Vec<NewEpisode> = detail
            .episodes
            .iter()
            .map(|e| NewEpisode::from_descriptor(season.id, e))
            .collect();
        self.catalog.upsert_episodes(&episodes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::tests::{show_row, ScriptedProvider};
    use chrono::NaiveDate;
    use mediaboard_sources::MemoryCatalog;

    #[tokio::test]
    async fn test_materialize_season_with_episodes() {
        let catalog = MemoryCatalog::new("memory").with_shows(vec![show_row(5, 700, &[1, 2])]);
        let provider = ScriptedProvider::default().with_season(700, 3, 8);

        let descriptor = SeasonDescriptor {
            season_number: 3,
            air_date: NaiveDate::from_ymd_opt(2023, 5, 1),
            episode_count: Some(8),
            name: None,
        };
        let seasons = SeasonExpander::new(&provider, &catalog)
            .materialize(5, 700, &[descriptor])
            .await
            .unwrap();

        assert_eq!(seasons.len(), 1);
        assert_eq!(seasons[0].season_number, 3);
        assert_eq!(seasons[0].release_year, Some(2023));
        assert_eq!(seasons[0].release_date, NaiveDate::from_ymd_opt(2023, 5, 1));
        assert!(!seasons[0].watched);
        assert_eq!(seasons[0].episodes.len(), 8);
        assert!(seasons[0].episodes.iter().all(|e| !e.watched));

        let stored = catalog.show(5).unwrap();
        let season = stored.season(3).unwrap();
        assert_eq!(season.episodes.len(), 8);
        assert!(!season.watched);
        assert!(season.episodes.iter().all(|e| !e.watched));
    }

    #[tokio::test]
    async fn test_episode_fetch_failure_keeps_season_and_continues() {
        let catalog = MemoryCatalog::new("memory").with_shows(vec![show_row(5, 700, &[1])]);
        let provider = ScriptedProvider::default()
            .with_season(700, 3, 4)
            .failing_season(700, 2);

        let seasons = SeasonExpander::new(&provider, &catalog)
            .materialize(5, 700, &[SeasonDescriptor::new(2), SeasonDescriptor::new(3)])
            .await
            .unwrap();

        assert_eq!(seasons.len(), 2);
        assert!(seasons[0].episodes.is_empty());
        assert_eq!(seasons[1].episodes.len(), 4);

        let stored = catalog.show(5).unwrap();
        assert!(stored.season(2).unwrap().episodes.is_empty());
        assert_eq!(stored.season(3).unwrap().episodes.len(), 4);
    }

    #[tokio::test]
    async fn test_episode_write_failure_keeps_season_and_continues() {
        let catalog = MemoryCatalog::new("memory").with_shows(vec![show_row(5, 700, &[1])]);
        // Season 1 is already stored as row 501
        catalog.fail_episode_writes_for_season(501);
        let provider = ScriptedProvider::default()
            .with_season(700, 1, 5)
            .with_season(700, 2, 3);

        let seasons = SeasonExpander::new(&provider, &catalog)
            .materialize(5, 700, &[SeasonDescriptor::new(1), SeasonDescriptor::new(2)])
            .await
            .unwrap();

        assert_eq!(seasons.len(), 2);
        assert_eq!(seasons[0].id, 501);
        assert!(seasons[0].episodes.is_empty());
        assert_eq!(seasons[1].episodes.len(), 3);
        assert_eq!(provider.season_fetches(), 2);

        let stored = catalog.show(5).unwrap();
        assert!(stored.season(1).unwrap().episodes.is_empty());
        assert_eq!(stored.season(2).unwrap().episodes.len(), 3);
    }

    #[tokio::test]
    async fn test_backfill_fills_stored_season() {
        let catalog = MemoryCatalog::new("memory").with_shows(vec![show_row(5, 700, &[1])]);
        let provider = ScriptedProvider::default().with_season(700, 1, 4);
        let expander = SeasonExpander::new(&provider, &catalog);
        let season = catalog.show(5).unwrap().season(1).unwrap().clone();

        let created = expander.backfill(700, &season).await.unwrap();
        assert_eq!(created.len(), 4);
        assert!(created.iter().all(|e| e.season_id == 501));

        let again = expander.backfill(700, &season).await.unwrap();
        assert!(again.is_empty());
        assert_eq!(catalog.show(5).unwrap().season(1).unwrap().episodes.len(), 4);
    }

    #[tokio::test]
    async fn test_season_write_failure_aborts() {
        let catalog = MemoryCatalog::new("memory").with_shows(vec![show_row(5, 700, &[1])]);
        catalog.fail_writes_for_show(5);
        let provider = ScriptedProvider::default().with_season(700, 2, 3);

        let err = SeasonExpander::new(&provider, &catalog)
            .materialize(5, 700, &[SeasonDescriptor::new(2)])
            .await
            .unwrap_err();
        assert!(err.is_persist());
        assert_eq!(provider.season_fetches(), 0);
    }

    #[tokio::test]
    async fn test_rerun_does_not_duplicate_rows() {
        let catalog = MemoryCatalog::new("memory").with_shows(vec![show_row(5, 700, &[1])]);
        let provider = ScriptedProvider::default().with_season(700, 2, 3);
        let expander = SeasonExpander::new(&provider, &catalog);

        expander.materialize(5, 700, &[SeasonDescriptor::new(2)]).await.unwrap();
        expander.materialize(5, 700, &[SeasonDescriptor::new(2)]).await.unwrap();

        let stored = catalog.show(5).unwrap();
        assert_eq!(stored.seasons.len(), 2);
        assert_eq!(stored.season(2).unwrap().episodes.len(), 3);
    }
}
