use crate::platform::resolve_platform;
use mediaboard_models::{Change, ProviderMovie, ProviderShow, SeasonDescriptor, TrackedMovie, TrackedShow};
use std::collections::BTreeSet;

/// Compares stored watchlist rows against freshly fetched provider detail
///
/// Each rule is evaluated on its own; results come back in a fixed order
/// (status, seasons, platform) so callers and tests can rely on it.
#[derive(Debug, Clone)]
pub struct DeltaDetector {
    region: String,
    skip_specials: bool,
}

impl DeltaDetector {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            skip_specials: false,
        }
    }

    /// Ignore season 0 when looking for new seasons
    pub fn with_skip_specials(mut self, skip_specials: bool) -> Self {
        self.skip_specials = skip_specials;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn show_changes(&self, stored: &TrackedShow, fetched: &ProviderShow) -> Vec<Change> {
        let mut changes = Vec::new();

        if let Some(status) = &fetched.status {
            if stored.status.as_deref() != Some(status.as_str()) {
                changes.push(Change::StatusChange {
                    old: stored.status.clone(),
                    new: status.clone(),
                });
            }
        }

        let known = stored.season_numbers();
        let added = self.new_seasons(&fetched.seasons, &known);
        if !added.is_empty() {
            changes.push(Change::SeasonsAdded { seasons: added });
        }

        let resolved = resolve_platform(&fetched.watch_providers, &self.region);
        if resolved.label() != stored.platform {
            changes.push(Change::PlatformChange {
                old: stored.platform.clone(),
                new: resolved,
            });
        }

        changes
    }

    pub fn movie_changes(&self, stored: &TrackedMovie, fetched: &ProviderMovie) -> Vec<Change> {
        let resolved = resolve_platform(&fetched.watch_providers, &self.region);
        if resolved.label() == stored.platform {
            return Vec::new();
        }
        vec![Change::PlatformChange {
            old: stored.platform.clone(),
            new: resolved,
        }]
    }

    /// Descriptors for season numbers not in `known`, each number at most once,
    /// in the provider's order
    pub fn new_seasons(&self, fetched: &[SeasonDescriptor], known: &BTreeSet<u32>) -> Vec<SeasonDescriptor> {
        let mut seen = known.clone();
        fetched
            .iter()
            .filter(|s| !(self.skip_specials && s.season_number == 0))
            .filter(|s| seen.insert(s.season_number))
            .cloned()
            .collect()
    }

    /// Stored season numbers whose episode rows are missing or fewer than the
    /// provider lists
    ///
    /// A season with no stored episodes qualifies unless the provider reports it
    /// has none. Seasons the provider no longer lists are left alone.
    pub fn incomplete_seasons(&self, stored: &TrackedShow, fetched: &ProviderShow) -> Vec<u32> {
        let mut seen = BTreeSet::new();
        fetched
            .seasons
            .iter()
            .filter(|d| !(self.skip_specials && d.season_number == 0))
            .filter(|d| seen.insert(d.season_number))
            .filter(|d| match stored.season(d.season_number) {
                Some(season) if season.episodes.is_empty() => d.episode_count != Some(0),
                Some(season) => d.episode_count.is_some_and(|count| count as usize > season.episodes.len()),
                None => false,
            })
            .map(|d| d.season_number)
            .collect()
    }
}

pub fn detect_show_changes(stored: &TrackedShow, fetched: &ProviderShow, region: &str) -> Vec<Change> {
    DeltaDetector::new(region).show_changes(stored, fetched)
}

pub fn detect_movie_changes(stored: &TrackedMovie, fetched: &ProviderMovie, region: &str) -> Vec<Change> {
    DeltaDetector::new(region).movie_changes(stored, fetched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mediaboard_models::{Episode, Platform, ProviderEntry, RegionAvailability, Season, WatchProviders};

    fn season(id: i64, number: u32) -> Season {
        Season {
            id,
            show_id: 1,
            season_number: number,
            release_year: None,
            release_date: None,
            watched: false,
            episodes: Vec::new(),
        }
    }

    fn stored_show(status: &str, seasons: &[u32], platform: &str) -> TrackedShow {
        TrackedShow {
            id: 1,
            tmdb_id: 1399,
            title: "Tracked".to_string(),
            status: Some(status.to_string()),
            platform: platform.to_string(),
            seasons: seasons.iter().map(|n| season(*n as i64 + 10, *n)).collect(),
        }
    }

    fn availability(free: &[&str], flatrate: &[&str]) -> WatchProviders {
        WatchProviders::default().with_region(
            "GB",
            RegionAvailability {
                free: free.iter().map(|n| ProviderEntry::new(*n)).collect(),
                flatrate: flatrate.iter().map(|n| ProviderEntry::new(*n)).collect(),
                ads: Vec::new(),
            },
        )
    }

    fn fetched_show(status: Option<&str>, seasons: &[u32], providers: WatchProviders) -> ProviderShow {
        ProviderShow {
            tmdb_id: 1399,
            name: "Tracked".to_string(),
            status: status.map(str::to_string),
            first_air_date: None,
            seasons: seasons.iter().map(|n| SeasonDescriptor::new(*n)).collect(),
            watch_providers: providers,
        }
    }

    #[test]
    fn test_status_and_new_season_without_platform_change() {
        let stored = stored_show("Returning Series", &[1, 2], "Netflix");
        let mut fetched = fetched_show(Some("Ended"), &[1, 2, 3], availability(&[], &["Netflix"]));
        fetched.seasons[2].air_date = NaiveDate::from_ymd_opt(2024, 1, 5);

        let changes = detect_show_changes(&stored, &fetched, "GB");
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes[0],
            Change::StatusChange {
                old: Some("Returning Series".to_string()),
                new: "Ended".to_string()
            }
        );
        match &changes[1] {
            Change::SeasonsAdded { seasons } => {
                assert_eq!(seasons.len(), 1);
                assert_eq!(seasons[0].season_number, 3);
                assert_eq!(seasons[0].release_year(), Some(2024));
            }
            other => panic!("unexpected change {:?}", other),
        }
    }

    #[test]
    fn test_identical_show_emits_nothing() {
        let stored = stored_show("Ended", &[1, 2], "BBC iPlayer");
        let fetched = fetched_show(Some("Ended"), &[1, 2], availability(&["BBC iPlayer"], &[]));
        assert!(detect_show_changes(&stored, &fetched, "GB").is_empty());
    }

    #[test]
    fn test_missing_fetched_status_is_not_a_change() {
        let stored = stored_show("Ended", &[1], "Online");
        let fetched = fetched_show(None, &[1], WatchProviders::default());
        assert!(detect_show_changes(&stored, &fetched, "GB").is_empty());
    }

    #[test]
    fn test_seasons_added_carries_each_new_number_once() {
        let stored = stored_show("Ended", &[1, 2], "Online");
        let fetched = fetched_show(Some("Ended"), &[1, 4, 2, 3, 4], WatchProviders::default());

        let changes = detect_show_changes(&stored, &fetched, "GB");
        assert_eq!(changes.len(), 1);
        let Change::SeasonsAdded { seasons } = &changes[0] else {
            panic!("expected SeasonsAdded");
        };
        let numbers: Vec<u32> = seasons.iter().map(|s| s.season_number).collect();
        assert_eq!(numbers, vec![4, 3]);
    }

    #[test]
    fn test_skip_specials() {
        let stored = stored_show("Ended", &[1], "Online");
        let fetched = fetched_show(Some("Ended"), &[0, 1, 2], WatchProviders::default());

        let detector = DeltaDetector::new("GB").with_skip_specials(true);
        let changes = detector.show_changes(&stored, &fetched);
        let Change::SeasonsAdded { seasons } = &changes[0] else {
            panic!("expected SeasonsAdded");
        };
        assert_eq!(seasons.len(), 1);
        assert_eq!(seasons[0].season_number, 2);

        let with_specials = detect_show_changes(&stored, &fetched, "GB");
        let Change::SeasonsAdded { seasons } = &with_specials[0] else {
            panic!("expected SeasonsAdded");
        };
        assert_eq!(seasons.len(), 2);
    }

    #[test]
    fn test_platform_change_comes_last() {
        let stored = stored_show("Returning Series", &[1], "Online");
        let fetched = fetched_show(Some("Ended"), &[1, 2], availability(&[], &["Disney+"]));

        let changes = detect_show_changes(&stored, &fetched, "GB");
        assert_eq!(changes.len(), 3);
        assert_eq!(
            changes[2],
            Change::PlatformChange {
                old: "Online".to_string(),
                new: Platform::DisneyPlus
            }
        );
    }

    #[test]
    fn test_incomplete_seasons_need_episodes() {
        let mut stored = stored_show("Ended", &[1, 2, 3], "Online");
        stored.seasons[1].episodes = (1..=4)
            .map(|n| Episode {
                id: 100 + n as i64,
                season_id: 12,
                episode_number: n,
                title: None,
                release_date: None,
                watched: true,
            })
            .collect();
        stored.seasons[2].episodes = stored.seasons[1].episodes.clone();

        let mut fetched = fetched_show(Some("Ended"), &[0, 1, 2, 3, 4], WatchProviders::default());
        fetched.seasons[1].episode_count = Some(0);
        fetched.seasons[2].episode_count = Some(6);
        fetched.seasons[3].episode_count = Some(4);

        // Season 1 has nothing to fetch, season 3 is complete, 0 and 4 are not stored
        let detector = DeltaDetector::new("GB");
        assert_eq!(detector.incomplete_seasons(&stored, &fetched), vec![2]);

        fetched.seasons[1].episode_count = None;
        assert_eq!(detector.incomplete_seasons(&stored, &fetched), vec![1, 2]);
    }

    #[test]
    fn test_movie_moves_to_free_provider() {
        let stored = TrackedMovie {
            id: 9,
            tmdb_id: 550,
            title: "Movie".to_string(),
            platform: "Online".to_string(),
        };
        let fetched = ProviderMovie {
            tmdb_id: 550,
            title: "Movie".to_string(),
            release_date: None,
            watch_providers: availability(&["BBC iPlayer"], &[]),
        };

        let changes = detect_movie_changes(&stored, &fetched, "GB");
        assert_eq!(
            changes,
            vec![Change::PlatformChange {
                old: "Online".to_string(),
                new: Platform::BbcIplayer
            }]
        );
    }

    #[test]
    fn test_movie_on_same_platform_emits_nothing() {
        let stored = TrackedMovie {
            id: 9,
            tmdb_id: 550,
            title: "Movie".to_string(),
            platform: "Online".to_string(),
        };
        let fetched = ProviderMovie {
            tmdb_id: 550,
            title: "Movie".to_string(),
            release_date: None,
            watch_providers: WatchProviders::default(),
        };
        assert!(detect_movie_changes(&stored, &fetched, "GB").is_empty());
    }
}
