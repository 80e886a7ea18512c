use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub scheduler: Option<SchedulerConfig>,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
}

/// Metadata provider access: either a direct API key or a key-hiding proxy
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TmdbConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
    #[serde(default = "default_tmdb_image_base_url")]
    pub image_base_url: String,
    /// Proxy that accepts `?endpoint=<path>&...` and injects the key server-side
    #[serde(default)]
    pub proxy_endpoint: Option<String>,
    #[serde(default)]
    pub proxy_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Hosted catalog (Supabase REST) connection
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub supabase_url: String,
    #[serde(default)]
    pub service_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncConfig {
    /// Region whose watch-provider availability decides the platform label
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_true")]
    pub check_platforms: bool,
    /// Ignore season 0 ("Specials") when looking for new seasons
    #[serde(default)]
    pub skip_specials: bool,
    #[serde(default = "default_min_interval_minutes")]
    pub min_interval_minutes: u64,
    #[serde(default = "default_daily_interval_hours")]
    pub daily_interval_hours: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Cron expression with a seconds field (sec min hour day month weekday)
    #[serde(default = "default_schedule")]
    pub schedule: String,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct NotifyConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Remote endpoint that runs the reconciliation pass on our behalf
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TriggerConfig {
    #[serde(default)]
    pub api_url: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_region() -> String {
    "GB".to_string()
}

/// Throttle intervals are capped at a year
const MAX_INTERVAL_MINUTES: u64 = 366 * 24 * 60;
const MAX_INTERVAL_HOURS: u64 = 366 * 24;

fn default_min_interval_minutes() -> u64 {
    60
}

fn default_daily_interval_hours() -> u64 {
    24
}

fn default_schedule() -> String {
    "0 0 6 * * *".to_string() // Every day at 06:00 UTC
}

pub fn default_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        schedule: default_schedule(),
        run_on_startup: default_true(),
    }
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_tmdb_base_url(),
            image_base_url: default_tmdb_image_base_url(),
            proxy_endpoint: None,
            proxy_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            check_platforms: default_true(),
            skip_specials: false,
            min_interval_minutes: default_min_interval_minutes(),
            daily_interval_hours: default_daily_interval_hours(),
        }
    }
}

impl TmdbConfig {
    /// API key, ignoring blanks and the template placeholder
    pub fn usable_api_key(&self) -> Option<&str> {
        usable(self.api_key.as_deref(), "YOUR_TMDB_API_KEY")
    }

    pub fn usable_proxy_endpoint(&self) -> Option<&str> {
        usable(self.proxy_endpoint.as_deref(), "")
    }
}

impl CatalogConfig {
    pub fn usable_service_key(&self) -> Option<&str> {
        usable(self.service_key.as_deref(), "YOUR_SERVICE_ROLE_KEY")
    }
}

impl SyncConfig {
    /// Values past the cap saturate; `Config::validate` rejects them
    pub fn min_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.min_interval_minutes.min(MAX_INTERVAL_MINUTES) as i64)
    }

    pub fn daily_interval(&self) -> chrono::Duration {
        chrono::Duration::hours(self.daily_interval_hours.min(MAX_INTERVAL_HOURS) as i64)
    }
}

fn usable<'a>(value: Option<&'a str>, placeholder: &str) -> Option<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != placeholder)
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Starter configuration written by `mediaboard config init`
    pub fn template() -> Self {
        Self {
            tmdb: TmdbConfig {
                api_key: Some("YOUR_TMDB_API_KEY".to_string()),
                ..TmdbConfig::default()
            },
            catalog: CatalogConfig {
                supabase_url: "https://YOUR_PROJECT.supabase.co".to_string(),
                service_key: Some("YOUR_SERVICE_ROLE_KEY".to_string()),
                timeout_secs: default_timeout_secs(),
            },
            sync: SyncConfig::default(),
            scheduler: Some(default_scheduler_config()),
            notify: NotifyConfig::default(),
            trigger: TriggerConfig::default(),
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (environment variables in production)
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup("TMDB_API_KEY") {
            self.tmdb.api_key = Some(key);
        }
        if let Some(url) = lookup("SUPABASE_URL") {
            self.catalog.supabase_url = url;
        }
        if let Some(key) = lookup("SUPABASE_SERVICE_ROLE_KEY") {
            self.catalog.service_key = Some(key);
        }
        if let Some(url) = lookup("UPDATE_WEBHOOK_URL") {
            self.notify.webhook_url = Some(url);
        }
        if let Some(url) = lookup("MEDIABOARD_API_URL") {
            self.trigger.api_url = Some(url);
        }
    }

    pub fn is_tmdb_configured(&self) -> bool {
        self.tmdb.usable_api_key().is_some() || self.tmdb.usable_proxy_endpoint().is_some()
    }

    pub fn is_catalog_configured(&self) -> bool {
        let url = self.catalog.supabase_url.trim();
        !url.is_empty() && !url.contains("YOUR_PROJECT") && self.catalog.usable_service_key().is_some()
    }

    /// Check everything a local reconciliation pass needs before it touches any item
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.is_tmdb_configured() {
            return Err(anyhow::anyhow!(
                "TMDB is not configured: set tmdb.api_key (or TMDB_API_KEY) or tmdb.proxy_endpoint"
            ));
        }

        if !self.is_catalog_configured() {
            return Err(anyhow::anyhow!(
                "Catalog is not configured: set catalog.supabase_url and catalog.service_key (or SUPABASE_URL / SUPABASE_SERVICE_ROLE_KEY)"
            ));
        }

        let region = &self.sync.region;
        if region.len() != 2 || !region.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(anyhow::anyhow!(
                "sync.region must be a two-letter uppercase region code, got '{}'",
                region
            ));
        }

        if self.tmdb.timeout_secs == 0 || self.catalog.timeout_secs == 0 {
            return Err(anyhow::anyhow!("timeout_secs must be greater than zero"));
        }

        if self.sync.min_interval_minutes > MAX_INTERVAL_MINUTES {
            return Err(anyhow::anyhow!(
                "sync.min_interval_minutes must be at most {}, got {}",
                MAX_INTERVAL_MINUTES,
                self.sync.min_interval_minutes
            ));
        }

        if self.sync.daily_interval_hours > MAX_INTERVAL_HOURS {
            return Err(anyhow::anyhow!(
                "sync.daily_interval_hours must be at most {}, got {}",
                MAX_INTERVAL_HOURS,
                self.sync.daily_interval_hours
            ));
        }

        if let Some(scheduler) = &self.scheduler {
            if scheduler.schedule.trim().is_empty() {
                return Err(anyhow::anyhow!("scheduler.schedule cannot be empty"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    fn configured() -> Config {
        let mut config = Config::template();
        config.tmdb.api_key = Some("real_key".to_string());
        config.catalog.supabase_url = "https://abc.supabase.co".to_string();
        config.catalog.service_key = Some("service".to_string());
        config
    }

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        configured().save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.tmdb.api_key.as_deref(), Some("real_key"));
        assert_eq!(loaded.catalog.supabase_url, "https://abc.supabase.co");
        assert_eq!(loaded.sync.region, "GB");
        assert_eq!(loaded.scheduler.unwrap().schedule, "0 0 6 * * *");
    }

    #[test]
    fn test_minimal_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [tmdb]
            api_key = "k"

            [catalog]
            supabase_url = "https://abc.supabase.co"
            service_key = "s"
            "#,
        )
        .unwrap();

        assert_eq!(config.tmdb.base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.tmdb.timeout_secs, 30);
        assert!(config.sync.check_platforms);
        assert!(!config.sync.skip_specials);
        assert_eq!(config.sync.min_interval(), chrono::Duration::hours(1));
        assert_eq!(config.sync.daily_interval(), chrono::Duration::hours(24));
        assert!(config.scheduler.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_template_does_not_validate() {
        let config = Config::template();
        assert!(!config.is_tmdb_configured());
        assert!(!config.is_catalog_configured());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_proxy_counts_as_tmdb_configured() {
        let mut config = configured();
        config.tmdb.api_key = None;
        assert!(config.validate().is_err());

        config.tmdb.proxy_endpoint = Some("https://abc.supabase.co/functions/v1/tmdb-proxy".to_string());
        assert!(config.is_tmdb_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_region() {
        let mut config = configured();
        config.sync.region = "gbr".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_intervals() {
        let mut config = configured();
        config.sync.min_interval_minutes = u64::MAX;
        assert!(config.validate().is_err());
        assert_eq!(config.sync.min_interval(), chrono::Duration::days(366));

        let mut config = configured();
        config.sync.daily_interval_hours = u64::MAX;
        assert!(config.validate().is_err());
        assert_eq!(config.sync.daily_interval(), chrono::Duration::days(366));

        let mut config = configured();
        config.sync.min_interval_minutes = MAX_INTERVAL_MINUTES;
        config.sync.daily_interval_hours = MAX_INTERVAL_HOURS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TMDB_API_KEY", "from_env"),
            ("SUPABASE_URL", "https://env.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "env_service"),
            ("UPDATE_WEBHOOK_URL", "https://hooks.example.com/x"),
            ("MEDIABOARD_API_URL", "   "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::template();
        config.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.tmdb.usable_api_key(), Some("from_env"));
        assert_eq!(config.catalog.supabase_url, "https://env.supabase.co");
        assert_eq!(config.notify.webhook_url.as_deref(), Some("https://hooks.example.com/x"));
        // Blank values do not override
        assert!(config.trigger.api_url.is_none());
        assert!(config.validate().is_ok());
    }
}
