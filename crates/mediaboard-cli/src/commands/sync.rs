use crate::commands::config::{load_config, load_valid_config};
use crate::commands::sync_ui::PassProgress;
use crate::output::Output;
use chrono::Utc;
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use mediaboard_config::{Config, PathManager, StateStore};
use mediaboard_core::{
    next_eligible_run, ProgressObserver, ReconcileOptions, ReconcileOutcome, Reconciler, RemoteTrigger,
    UpdateFlags, UpdateSummary, WebhookNotifier,
};
use mediaboard_sources::{SupabaseCatalog, TmdbClient};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Command-line switches shared by `sync` and the daemon
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncFlags {
    pub force: bool,
    pub daily: bool,
    pub platforms: bool,
    pub webhook: bool,
}

impl SyncFlags {
    pub fn update_flags(&self) -> UpdateFlags {
        UpdateFlags {
            force: self.force,
            daily: self.daily,
            platforms: self.platforms,
        }
    }

    pub fn options(&self, config: &Config, observer: Option<Arc<dyn ProgressObserver>>) -> ReconcileOptions {
        let min_interval = if self.daily {
            config.sync.daily_interval()
        } else {
            config.sync.min_interval()
        };
        ReconcileOptions {
            force: self.force,
            check_platforms: self.platforms || config.sync.check_platforms,
            min_interval,
            observer,
        }
    }
}

pub fn build_reconciler(config: &Config) -> Result<Reconciler> {
    let provider = TmdbClient::new(&config.tmdb).wrap_err("Failed to create TMDB client")?;
    let catalog = SupabaseCatalog::new(&config.catalog).wrap_err("Failed to create catalog client")?;

    Ok(Reconciler::new(Arc::new(provider), Arc::new(catalog))
        .with_region(config.sync.region.clone())
        .with_skip_specials(config.sync.skip_specials))
}

/// Run one pass against the persisted throttle state, saving it back if the pass executed
pub async fn execute_pass(
    reconciler: &Reconciler,
    state_file: &Path,
    options: ReconcileOptions,
) -> Result<ReconcileOutcome> {
    let mut store = StateStore::new(state_file.to_path_buf());
    store
        .load()
        .map_err(|e| eyre!("{:#}", e))
        .wrap_err_with(|| format!("Failed to read state from {}", state_file.display()))?;

    let catalog = reconciler.catalog_key().to_string();
    let throttle = store.throttle_state(&catalog);
    let outcome = reconciler.run(&throttle, Utc::now(), options).await?;

    if outcome.executed {
        store.set_throttle_state(&catalog, &outcome.throttle);
        store
            .save()
            .map_err(|e| eyre!("{:#}", e))
            .wrap_err_with(|| format!("Failed to save state to {}", state_file.display()))?;
    }

    Ok(outcome)
}

/// Deliver a summary to the configured webhook; a missing URL or failed delivery only warns
pub async fn send_webhook(config: &Config, summary: &UpdateSummary) -> bool {
    let Some(url) = config.notify.webhook_url.as_deref().filter(|u| !u.trim().is_empty()) else {
        warn!(operation = "webhook", "Webhook requested but notify.webhook_url is not set");
        return false;
    };
    match WebhookNotifier::new(url) {
        Ok(notifier) => notifier.notify(summary).await,
        Err(e) => {
            warn!(operation = "webhook", error = %e, "Failed to create webhook client");
            false
        }
    }
}

pub async fn run_sync(flags: SyncFlags, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config = load_valid_config(&path_manager)?;
    let reconciler = build_reconciler(&config)?;

    let progress = PassProgress::new(output.is_json());
    let options = flags.options(&config, Some(progress.observer()));
    let min_interval = options.min_interval;
    let started = Utc::now();

    let result = execute_pass(&reconciler, &path_manager.state_file(), options).await;
    progress.finish();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            if flags.webhook {
                let summary = UpdateSummary::failed(started, Utc::now(), flags.update_flags(), format!("{:#}", e));
                send_webhook(&config, &summary).await;
            }
            return Err(e.wrap_err("Reconciliation failed"));
        }
    };

    report_outcome(&outcome, min_interval, output);

    if flags.webhook && outcome.executed {
        let summary = UpdateSummary::from_outcome(started, flags.update_flags(), &outcome);
        if !send_webhook(&config, &summary).await {
            output.warn("Webhook notification was not delivered");
        }
    }

    Ok(())
}

/// Ask the remote endpoint to run the pass and relay its answer
pub async fn run_remote(flags: SyncFlags, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config = load_config(&path_manager)?;
    let url = config
        .trigger
        .api_url
        .clone()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| eyre!("No remote endpoint configured. Set trigger.api_url or MEDIABOARD_API_URL."))?;

    let trigger = RemoteTrigger::new(url).map_err(|e| eyre!("{:#}", e))?;
    let started = Utc::now();
    let result = trigger.trigger(flags.force, flags.daily, flags.platforms).await;
    let ended = Utc::now();

    let summary = match &result {
        Ok(response) => UpdateSummary::from_trigger(started, ended, flags.update_flags(), response),
        Err(e) => UpdateSummary::failed(started, ended, flags.update_flags(), format!("{:#}", e)),
    };

    if flags.webhook {
        send_webhook(&config, &summary).await;
    }

    let response = result.map_err(|e| eyre!("{:#}", e)).wrap_err("Remote trigger failed")?;
    if output.is_json() {
        output.json(&json!({
            "success": response.is_success(),
            "status_code": response.status,
            "body": response.body,
        }));
    } else if response.is_success() {
        output.success(format!("Remote update accepted (HTTP {})", response.status));
    } else {
        output.error(format!("Remote update rejected (HTTP {}): {}", response.status, response.body));
    }

    if !response.is_success() {
        return Err(eyre!("Remote endpoint returned HTTP {}", response.status));
    }
    Ok(())
}

fn report_outcome(outcome: &ReconcileOutcome, min_interval: chrono::Duration, output: &Output) {
    if output.is_json() {
        output.json(&json!({
            "success": outcome.items_failed == 0,
            "executed": outcome.executed,
            "last_run": outcome.throttle.last_run.map(|t| t.to_rfc3339()),
            "items_processed": outcome.items_processed,
            "items_failed": outcome.items_failed,
            "duration_seconds": outcome.duration.as_secs_f64(),
            "changes": outcome.changes,
        }));
        return;
    }

    if !outcome.executed {
        let next = next_eligible_run(outcome.throttle.last_run, min_interval);
        match next {
            Some(next) => output.info(format!(
                "Skipped: the last pass was too recent. Next pass allowed after {} (use --force to run now).",
                next.format("%Y-%m-%d %H:%M:%S UTC")
            )),
            None => output.info("Skipped: the last pass was too recent (use --force to run now)."),
        }
        return;
    }

    info!(
        operation = "sync_complete",
        items_processed = outcome.items_processed,
        items_failed = outcome.items_failed,
        changes = outcome.changes.len(),
        "Reconciliation finished"
    );

    output.success(format!(
        "Checked {} item(s) in {:.1}s, {} change(s)",
        outcome.items_processed,
        outcome.duration.as_secs_f64(),
        outcome.changes.len()
    ));
    output.changes(&outcome.changes);
    if outcome.items_failed > 0 {
        output.warn(format!(
            "{} item(s) could not be checked; see the log for details",
            outcome.items_failed
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mediaboard_models::{MediaKind, ProviderMovie, ProviderSeason, ProviderShow, SearchResult, TrackedMovie};
    use mediaboard_sources::{MemoryCatalog, MetadataProvider, SourceError};

    struct StaticProvider;

    #[async_trait]
    impl MetadataProvider for StaticProvider {
        fn provider_name(&self) -> &str {
            "static"
        }

        async fn fetch_show_detail(&self, tmdb_id: u32) -> Result<ProviderShow, SourceError> {
            Err(SourceError::fetch(format!("tv/{}", tmdb_id), Some(404), "not found"))
        }

        async fn fetch_movie_detail(&self, tmdb_id: u32) -> Result<ProviderMovie, SourceError> {
            Ok(ProviderMovie {
                tmdb_id,
                title: "Movie".to_string(),
                release_date: None,
                watch_providers: Default::default(),
            })
        }

        async fn fetch_season_detail(&self, tmdb_id: u32, season: u32) -> Result<ProviderSeason, SourceError> {
            Err(SourceError::fetch(format!("tv/{}/season/{}", tmdb_id, season), Some(404), "not found"))
        }

        async fn search(&self, _kind: MediaKind, _query: &str, _year: Option<i32>) -> Result<Vec<SearchResult>, SourceError> {
            Ok(Vec::new())
        }
    }

    fn reconciler() -> Reconciler {
        let catalog = MemoryCatalog::new("memory").with_movies(vec![TrackedMovie {
            id: 1,
            tmdb_id: 550,
            title: "Movie".to_string(),
            platform: "Netflix".to_string(),
        }]);
        Reconciler::new(Arc::new(StaticProvider), Arc::new(catalog))
    }

    #[test]
    fn test_daily_flag_selects_daily_interval() {
        let config = Config::template();
        let flags = SyncFlags {
            daily: true,
            ..SyncFlags::default()
        };
        assert_eq!(flags.options(&config, None).min_interval, config.sync.daily_interval());
        assert_eq!(
            SyncFlags::default().options(&config, None).min_interval,
            config.sync.min_interval()
        );
    }

    #[test]
    fn test_platforms_flag_overrides_config() {
        let mut config = Config::template();
        config.sync.check_platforms = false;
        assert!(!SyncFlags::default().options(&config, None).check_platforms);

        let flags = SyncFlags {
            platforms: true,
            ..SyncFlags::default()
        };
        assert!(flags.options(&config, None).check_platforms);
    }

    #[tokio::test]
    async fn test_execute_pass_persists_last_run_and_throttles_next() {
        let dir = tempfile::TempDir::new().unwrap();
        let state_file = dir.path().join("state.toml");
        let reconciler = reconciler();

        let first = execute_pass(&reconciler, &state_file, ReconcileOptions::default())
            .await
            .unwrap();
        assert!(first.executed);
        assert_eq!(first.changes.len(), 1);

        let mut store = StateStore::new(state_file.clone());
        store.load().unwrap();
        assert!(store.last_run("memory").is_some());

        let second = execute_pass(&reconciler, &state_file, ReconcileOptions::default())
            .await
            .unwrap();
        assert!(!second.executed);
        assert_eq!(second.throttle.last_run, first.throttle.last_run);
    }

    #[tokio::test]
    async fn test_skipped_pass_leaves_state_untouched() {
        let dir = tempfile::TempDir::new().unwrap();
        let state_file = dir.path().join("state.toml");
        let reconciler = reconciler();

        let mut store = StateStore::new(state_file.clone());
        let recent = Utc::now() - chrono::Duration::minutes(5);
        store.set_last_run("memory", recent);
        store.save().unwrap();

        let outcome = execute_pass(&reconciler, &state_file, ReconcileOptions::default())
            .await
            .unwrap();
        assert!(!outcome.executed);

        let mut reloaded = StateStore::new(state_file);
        reloaded.load().unwrap();
        assert_eq!(
            reloaded.last_run("memory").map(|t| t.timestamp()),
            Some(recent.timestamp())
        );
    }
}
