use crate::diff::DeltaDetector;
use crate::expand::SeasonExpander;
use crate::platform::resolve_platform;
use crate::progress::{ProgressObserver, ProgressTracker};
use crate::throttle::should_run;
use chrono::{DateTime, Utc};
use mediaboard_models::{
    Change, ChangeRecord, MediaKind, NewMovie, NewShow, ProviderShow, ThrottleState, TrackedMovie, TrackedShow,
};
use mediaboard_sources::{CatalogStore, MetadataProvider, ShowUpdate, SourceError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const PROGRESS_LOG_INTERVAL: usize = 25;

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The tracked-item lists could not be read; nothing was processed
    #[error("could not load the watchlist: {0}")]
    Load(SourceError),

    #[error("a reconciliation pass is already running for this catalog")]
    AlreadyRunning,

    #[error("{kind} {tmdb_id} is already on the watchlist as \"{title}\"")]
    AlreadyTracked {
        kind: MediaKind,
        tmdb_id: u32,
        title: String,
    },

    #[error(transparent)]
    Source(#[from] SourceError),
}

#[derive(Clone)]
pub struct ReconcileOptions {
    /// Bypass the throttle gate
    pub force: bool,
    /// Emit and persist platform changes
    pub check_platforms: bool,
    pub min_interval: chrono::Duration,
    pub observer: Option<Arc<dyn ProgressObserver>>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            force: false,
            check_platforms: true,
            min_interval: chrono::Duration::hours(1),
            observer: None,
        }
    }
}

impl std::fmt::Debug for ReconcileOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconcileOptions")
            .field("force", &self.force)
            .field("check_platforms", &self.check_platforms)
            .field("min_interval", &self.min_interval)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// False when the throttle gate skipped the pass
    pub executed: bool,
    pub changes: Vec<ChangeRecord>,
    /// State to persist; only an executed pass moves `last_run`
    pub throttle: ThrottleState,
    pub items_processed: usize,
    pub items_failed: usize,
    pub duration: Duration,
}

impl ReconcileOutcome {
    fn skipped(throttle: ThrottleState) -> Self {
        Self {
            executed: false,
            changes: Vec::new(),
            throttle,
            items_processed: 0,
            items_failed: 0,
            duration: Duration::ZERO,
        }
    }
}

/// Runs reconciliation passes over one catalog
///
/// Items are processed one at a time. A single reconciler never runs two passes
/// at once; a second caller gets `ReconcileError::AlreadyRunning` immediately.
pub struct Reconciler {
    provider: Arc<dyn MetadataProvider>,
    catalog: Arc<dyn CatalogStore>,
    detector: DeltaDetector,
    skip_specials: bool,
    running: Mutex<()>,
}

impl Reconciler {
    pub fn new(provider: Arc<dyn MetadataProvider>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self {
            provider,
            catalog,
            detector: DeltaDetector::new("GB"),
            skip_specials: false,
            running: Mutex::new(()),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.detector = DeltaDetector::new(region).with_skip_specials(self.skip_specials);
        self
    }

    pub fn with_skip_specials(mut self, skip_specials: bool) -> Self {
        self.skip_specials = skip_specials;
        self.detector = self.detector.with_skip_specials(skip_specials);
        self
    }

    pub fn catalog_key(&self) -> &str {
        self.catalog.catalog_key()
    }

    pub fn region(&self) -> &str {
        self.detector.region()
    }

    fn expander(&self) -> SeasonExpander<'_> {
        SeasonExpander::new(self.provider.as_ref(), self.catalog.as_ref())
    }

    #[instrument(skip(self, throttle, options), fields(catalog = %self.catalog_key()))]
    pub async fn run(
        &self,
        throttle: &ThrottleState,
        now: DateTime<Utc>,
        options: ReconcileOptions,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let _running = self.running.try_lock().map_err(|_| ReconcileError::AlreadyRunning)?;

        if !should_run(throttle.last_run, now, options.min_interval, options.force) {
            info!(
                operation = "reconcile_skipped",
                last_run = ?throttle.last_run,
                "Skipping reconciliation, last pass is too recent"
            );
            return Ok(ReconcileOutcome::skipped(*throttle));
        }

        let start = Instant::now();
        info!(
            operation = "reconcile_start",
            force = options.force,
            check_platforms = options.check_platforms,
            region = %self.region(),
            "Starting reconciliation pass"
        );

        let shows = self.catalog.load_shows().await.map_err(ReconcileError::Load)?;
        let movies = self.catalog.load_movies().await.map_err(ReconcileError::Load)?;

        let total = shows.len() + movies.len();
        let mut tracker = ProgressTracker::new(total, PROGRESS_LOG_INTERVAL);
        let mut changes = Vec::new();

        for show in &shows {
            match self.reconcile_show(show, options.check_platforms).await {
                Ok(found) if found.is_empty() => tracker.record_unchanged(),
                Ok(found) => {
                    tracker.record_changed();
                    changes.extend(
                        found
                            .into_iter()
                            .map(|c| ChangeRecord::new(show.id, &show.title, MediaKind::Show, c)),
                    );
                }
                Err(e) => {
                    warn!(
                        item_id = show.id,
                        tmdb_id = show.tmdb_id,
                        title = %show.title,
                        error = %e,
                        "Failed to reconcile show"
                    );
                    tracker.record_failed(error_category(&e));
                }
            }
            self.report(&options, &mut tracker);
        }

        for movie in &movies {
            match self.reconcile_movie(movie, options.check_platforms).await {
                Ok(found) if found.is_empty() => tracker.record_unchanged(),
                Ok(found) => {
                    tracker.record_changed();
                    changes.extend(
                        found
                            .into_iter()
                            .map(|c| ChangeRecord::new(movie.id, &movie.title, MediaKind::Movie, c)),
                    );
                }
                Err(e) => {
                    warn!(
                        item_id = movie.id,
                        tmdb_id = movie.tmdb_id,
                        title = %movie.title,
                        error = %e,
                        "Failed to reconcile movie"
                    );
                    tracker.record_failed(error_category(&e));
                }
            }
            self.report(&options, &mut tracker);
        }

        tracker.log_summary("Reconciliation");
        info!(
            operation = "reconcile_complete",
            items = total,
            changes = changes.len(),
            failed = tracker.failed(),
            "Reconciliation pass finished"
        );

        Ok(ReconcileOutcome {
            executed: true,
            changes,
            throttle: ThrottleState::ran_at(now),
            items_processed: tracker.processed(),
            items_failed: tracker.failed(),
            duration: start.elapsed(),
        })
    }

    fn report(&self, options: &ReconcileOptions, tracker: &mut ProgressTracker) {
        tracker.log_progress();
        if let Some(observer) = &options.observer {
            observer.on_progress(tracker.processed(), tracker.total());
        }
    }

    async fn reconcile_show(&self, show: &TrackedShow, check_platforms: bool) -> Result<Vec<Change>, SourceError> {
        let fetched = self.provider.fetch_show_detail(show.tmdb_id).await?;
        let mut changes = self.detector.show_changes(show, &fetched);
        if !check_platforms {
            changes.retain(|c| !c.is_platform_change());
        }

        // Seasons are written before the show row; a failed season write must
        // leave the status unsaved
        for change in &changes {
            if let Change::SeasonsAdded { seasons } = change {
                let created = self.expander().materialize(show.id, show.tmdb_id, seasons).await?;
                debug!(show_id = show.id, seasons = created.len(), "Added new seasons");
            }
        }

        self.backfill_episodes(show, &fetched).await;

        let mut update = ShowUpdate::default();
        for change in &changes {
            match change {
                Change::StatusChange { new, .. } => update.status = Some(new.clone()),
                Change::PlatformChange { new, .. } => update.platform = Some(*new),
                Change::SeasonsAdded { .. } => {}
            }
        }
        if !update.is_empty() {
            self.catalog.update_show(show.id, &update).await?;
        }

        Ok(changes)
    }

    /// Fill in episodes for stored seasons that have fewer than the provider lists
    ///
    /// This is repair work, not a change: nothing is reported and failures only log.
    async fn backfill_episodes(&self, show: &TrackedShow, fetched: &ProviderShow) {
        for season_number in self.detector.incomplete_seasons(show, fetched) {
            let Some(season) = show.season(season_number) else {
                continue;
            };
            if let Err(e) = self.expander().backfill(show.tmdb_id, season).await {
                warn!(
                    show_id = show.id,
                    tmdb_id = show.tmdb_id,
                    season_number,
                    error = %e,
                    "Failed to backfill episodes"
                );
            }
        }
    }

    async fn reconcile_movie(&self, movie: &TrackedMovie, check_platforms: bool) -> Result<Vec<Change>, SourceError> {
        // Platform is the only tracked dimension for movies
        if !check_platforms {
            return Ok(Vec::new());
        }

        let fetched = self.provider.fetch_movie_detail(movie.tmdb_id).await?;
        let changes = self.detector.movie_changes(movie, &fetched);
        for change in &changes {
            if let Change::PlatformChange { new, .. } = change {
                self.catalog.update_movie_platform(movie.id, *new).await?;
            }
        }
        Ok(changes)
    }

    /// Add a show to the watchlist with every season and episode the provider lists
    #[instrument(skip(self))]
    pub async fn track_show(&self, tmdb_id: u32) -> Result<TrackedShow, ReconcileError> {
        let _running = self.running.try_lock().map_err(|_| ReconcileError::AlreadyRunning)?;

        let existing = self.catalog.load_shows().await.map_err(ReconcileError::Load)?;
        if let Some(show) = existing.into_iter().find(|s| s.tmdb_id == tmdb_id) {
            return Err(ReconcileError::AlreadyTracked {
                kind: MediaKind::Show,
                tmdb_id,
                title: show.title,
            });
        }

        let fetched = self.provider.fetch_show_detail(tmdb_id).await?;
        let platform = resolve_platform(&fetched.watch_providers, self.region());
        let mut show = self
            .catalog
            .insert_show(&NewShow {
                tmdb_id,
                title: fetched.name.clone(),
                status: fetched.status.clone(),
                platform,
                release_date: fetched.first_air_date,
            })
            .await?;

        let descriptors = self.detector.new_seasons(&fetched.seasons, &Default::default());
        show.seasons = self.expander().materialize(show.id, tmdb_id, &descriptors).await?;

        info!(
            operation = "track_show",
            show_id = show.id,
            title = %show.title,
            platform = %platform,
            seasons = show.seasons.len(),
            "Added show to watchlist"
        );
        Ok(show)
    }

    /// Add a movie to the watchlist on its resolved platform
    #[instrument(skip(self))]
    pub async fn track_movie(&self, tmdb_id: u32) -> Result<TrackedMovie, ReconcileError> {
        let _running = self.running.try_lock().map_err(|_| ReconcileError::AlreadyRunning)?;

        let existing = self.catalog.load_movies().await.map_err(ReconcileError::Load)?;
        if let Some(movie) = existing.into_iter().find(|m| m.tmdb_id == tmdb_id) {
            return Err(ReconcileError::AlreadyTracked {
                kind: MediaKind::Movie,
                tmdb_id,
                title: movie.title,
            });
        }

        let fetched = self.provider.fetch_movie_detail(tmdb_id).await?;
        let platform = resolve_platform(&fetched.watch_providers, self.region());
        let movie = self
            .catalog
            .insert_movie(&NewMovie {
                tmdb_id,
                title: fetched.title.clone(),
                platform,
                release_year: fetched.release_date.map(|d| chrono::Datelike::year(&d)),
            })
            .await?;

        info!(
            operation = "track_movie",
            movie_id = movie.id,
            title = %movie.title,
            platform = %platform,
            "Added movie to watchlist"
        );
        Ok(movie)
    }
}

fn error_category(err: &SourceError) -> &'static str {
    match err {
        SourceError::Fetch { .. } => "fetch",
        SourceError::Persist { .. } => "persist",
        SourceError::Load { .. } => "load",
        SourceError::Config(_) => "config",
    }
}
