use crate::commands::config::load_valid_config;
use crate::commands::sync::{build_reconciler, execute_pass, send_webhook, SyncFlags};
use crate::output::Output;
use chrono::Utc;
use color_eyre::eyre::Context;
use color_eyre::Result;
use mediaboard_config::{default_scheduler_config, Config, PathManager, SchedulerConfig};
use mediaboard_core::{ReconcileError, Reconciler, UpdateSummary};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

/// Runs passes for the scheduler; shared between cron ticks
struct PassRunner {
    reconciler: Reconciler,
    config: Config,
    state_file: PathBuf,
    flags: SyncFlags,
}

impl PassRunner {
    /// One pass, fully handled here: errors are logged so the scheduler keeps ticking
    async fn run_once(&self, trigger: &str) {
        info!(operation = "scheduled_sync_start", trigger, "Starting scheduled reconciliation");
        let started = Utc::now();
        let options = self.flags.options(&self.config, None);

        match execute_pass(&self.reconciler, &self.state_file, options).await {
            Ok(outcome) if outcome.executed => {
                info!(
                    operation = "scheduled_sync_complete",
                    trigger,
                    items_processed = outcome.items_processed,
                    items_failed = outcome.items_failed,
                    changes = outcome.changes.len(),
                    duration_ms = outcome.duration.as_millis() as u64,
                    "Scheduled reconciliation completed"
                );
                if self.flags.webhook {
                    let summary = UpdateSummary::from_outcome(started, self.flags.update_flags(), &outcome);
                    send_webhook(&self.config, &summary).await;
                }
            }
            Ok(_) => {
                info!(operation = "scheduled_sync_skipped", trigger, "Last pass is too recent, nothing to do");
            }
            Err(e) if matches!(e.downcast_ref::<ReconcileError>(), Some(ReconcileError::AlreadyRunning)) => {
                warn!(operation = "scheduled_sync_overlap", trigger, "Previous pass still running, skipping tick");
            }
            Err(e) => {
                error!(operation = "scheduled_sync_error", trigger, error = ?e, "Scheduled reconciliation failed");
                if self.flags.webhook {
                    let summary =
                        UpdateSummary::failed(started, Utc::now(), self.flags.update_flags(), format!("{:#}", e));
                    send_webhook(&self.config, &summary).await;
                }
            }
        }
    }
}

struct Scheduler {
    scheduler: JobScheduler,
    runner: Arc<PassRunner>,
    config: SchedulerConfig,
}

impl Scheduler {
    async fn new(runner: PassRunner, config: SchedulerConfig) -> Result<Self> {
        let scheduler = JobScheduler::new().await.wrap_err("Failed to create scheduler")?;
        Ok(Self {
            scheduler,
            runner: Arc::new(runner),
            config,
        })
    }

    /// Register the cron job, run the startup pass if configured, then block until Ctrl-C
    async fn run(&mut self) -> Result<()> {
        let schedule = normalize_schedule(&self.config.schedule);
        let runner = Arc::clone(&self.runner);
        let job = Job::new_async(schedule.as_str(), move |_uuid, _l| {
            let runner = Arc::clone(&runner);
            Box::pin(async move {
                runner.run_once("schedule").await;
            })
        })
        .wrap_err_with(|| format!("Invalid cron schedule '{}'", schedule))?;
        self.scheduler.add(job).await.wrap_err("Failed to add scheduled job")?;

        if self.config.run_on_startup {
            info!(operation = "scheduler_startup", "Running initial reconciliation on startup");
            self.runner.run_once("startup").await;
        }

        self.scheduler.start().await.wrap_err("Failed to start scheduler")?;
        info!(
            operation = "scheduler_started",
            schedule = %schedule,
            "Scheduler started"
        );

        tokio::signal::ctrl_c().await.wrap_err("Failed to listen for shutdown signal")?;
        info!(operation = "scheduler_stopping", "Shutdown signal received");
        self.scheduler.shutdown().await.wrap_err("Failed to stop scheduler")?;
        Ok(())
    }
}

/// Accept classic five-field cron by prepending a seconds field
fn normalize_schedule(schedule: &str) -> String {
    let schedule = schedule.trim();
    if schedule.split_whitespace().count() == 5 {
        format!("0 {}", schedule)
    } else {
        schedule.to_string()
    }
}

pub async fn run_daemon(
    schedule_override: Option<String>,
    no_startup_sync: bool,
    platforms: bool,
    webhook: bool,
    output: &Output,
) -> Result<()> {
    let path_manager = PathManager::default();
    let config = load_valid_config(&path_manager)?;
    let reconciler = build_reconciler(&config)?;

    let mut scheduler_config = config.scheduler.clone().unwrap_or_else(default_scheduler_config);
    if let Some(schedule) = schedule_override {
        scheduler_config.schedule = schedule;
    }
    if no_startup_sync {
        scheduler_config.run_on_startup = false;
    }

    output.info(format!(
        "Starting scheduler ({}). Logs: {}",
        normalize_schedule(&scheduler_config.schedule),
        path_manager.daemon_log_file().display()
    ));

    let runner = PassRunner {
        reconciler,
        config,
        state_file: path_manager.state_file(),
        flags: SyncFlags {
            force: false,
            daily: false,
            platforms,
            webhook,
        },
    };

    let mut scheduler = Scheduler::new(runner, scheduler_config).await?;
    scheduler.run().await?;

    output.success("Scheduler stopped");
    Ok(())
}
