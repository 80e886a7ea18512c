pub mod config;
pub mod paths;
pub mod state;

pub use config::{CatalogConfig, Config, NotifyConfig, SchedulerConfig, SyncConfig, TmdbConfig, TriggerConfig, default_scheduler_config};
pub use paths::{PathManager, container_base_path};
pub use state::StateStore;
