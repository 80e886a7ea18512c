use crate::output::Output;
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use comfy_table::{Cell, Table};
use mediaboard_config::{default_scheduler_config, Config, PathManager};
use owo_colors::OwoColorize;
use serde_json::json;

/// Load the configuration file and layer environment variables over it
pub fn load_config(path_manager: &PathManager) -> Result<Config> {
    let config_path = path_manager.config_file();
    if !config_path.exists() {
        return Err(eyre!(
            "Configuration file not found at {}. Please run 'mediaboard config init' to create one.",
            config_path.display()
        ));
    }

    let mut config = Config::load_from_file(&config_path)
        .map_err(|e| eyre!("{:#}", e))
        .wrap_err_with(|| format!("Failed to load configuration from {}", config_path.display()))?;
    config.apply_env_overrides();
    Ok(config)
}

/// `load_config` followed by validation, for commands that talk to remote services
pub fn load_valid_config(path_manager: &PathManager) -> Result<Config> {
    let config = load_config(path_manager)?;
    config
        .validate()
        .map_err(|e| eyre!("{:#}", e))
        .wrap_err("Invalid configuration")?;
    Ok(config)
}

pub fn init_config(force: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_path = path_manager.config_file();

    if config_path.exists() && !force {
        output.warn(format!(
            "Configuration already exists at {}. Use --force to overwrite it.",
            config_path.display()
        ));
        return Ok(());
    }

    path_manager
        .ensure_directories()
        .map_err(|e| eyre!("{:#}", e))
        .wrap_err("Failed to create configuration directories")?;
    Config::template()
        .save_to_file(&config_path)
        .map_err(|e| eyre!("{:#}", e))
        .wrap_err_with(|| format!("Failed to write {}", config_path.display()))?;

    output.success(format!("Wrote configuration template to {}", config_path.display()));
    output.info("Fill in the TMDB API key and Supabase service key, or set TMDB_API_KEY and SUPABASE_SERVICE_ROLE_KEY.");
    Ok(())
}

pub fn show_config(full: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config = load_config(&path_manager)?;
    let secret = |value: Option<&str>| {
        let value = value.unwrap_or_default();
        if full {
            value.to_string()
        } else {
            mask_string(value)
        }
    };
    let scheduler = config.scheduler.clone().unwrap_or_else(default_scheduler_config);

    if output.is_json() {
        output.json(&json!({
            "config_file": path_manager.config_file().display().to_string(),
            "state_file": path_manager.state_file().display().to_string(),
            "tmdb": {
                "api_key": secret(config.tmdb.api_key.as_deref()),
                "base_url": config.tmdb.base_url,
                "proxy_endpoint": config.tmdb.proxy_endpoint,
                "proxy_token": secret(config.tmdb.proxy_token.as_deref()),
                "timeout_secs": config.tmdb.timeout_secs,
            },
            "catalog": {
                "supabase_url": config.catalog.supabase_url,
                "service_key": secret(config.catalog.service_key.as_deref()),
                "timeout_secs": config.catalog.timeout_secs,
            },
            "sync": {
                "region": config.sync.region,
                "check_platforms": config.sync.check_platforms,
                "skip_specials": config.sync.skip_specials,
                "min_interval_minutes": config.sync.min_interval_minutes,
                "daily_interval_hours": config.sync.daily_interval_hours,
            },
            "scheduler": {
                "schedule": scheduler.schedule,
                "run_on_startup": scheduler.run_on_startup,
            },
            "notify": { "webhook_url": config.notify.webhook_url },
            "trigger": { "api_url": config.trigger.api_url },
        }));
        return Ok(());
    }

    println!("{}", "MediaBoard Configuration".bold());
    println!("{}", path_manager.config_file().display().dimmed());
    println!();

    print_section(
        "TMDB",
        vec![
            ("API Key", secret(config.tmdb.api_key.as_deref())),
            ("Base URL", config.tmdb.base_url.clone()),
            ("Proxy", config.tmdb.proxy_endpoint.clone().unwrap_or_else(|| "<not set>".to_string())),
            ("Proxy Token", secret(config.tmdb.proxy_token.as_deref())),
            ("Timeout", format!("{} seconds", config.tmdb.timeout_secs)),
        ],
    );

    print_section(
        "Catalog",
        vec![
            ("Supabase URL", config.catalog.supabase_url.clone()),
            ("Service Key", secret(config.catalog.service_key.as_deref())),
            ("Timeout", format!("{} seconds", config.catalog.timeout_secs)),
        ],
    );

    print_section(
        "Reconciliation",
        vec![
            ("Region", config.sync.region.clone()),
            ("Check Platforms", check_mark(config.sync.check_platforms)),
            ("Skip Specials", check_mark(config.sync.skip_specials)),
            ("Minimum Interval", format!("{} minutes", config.sync.min_interval_minutes)),
            ("Daily Interval", format!("{} hours", config.sync.daily_interval_hours)),
        ],
    );

    print_section(
        "Scheduler",
        vec![
            ("Schedule", scheduler.schedule.clone()),
            ("Run On Startup", check_mark(scheduler.run_on_startup)),
            (
                "Webhook",
                config.notify.webhook_url.clone().unwrap_or_else(|| "<not set>".to_string()),
            ),
            (
                "Remote Trigger",
                config.trigger.api_url.clone().unwrap_or_else(|| "<not set>".to_string()),
            ),
        ],
    );

    Ok(())
}

fn print_section(title: &str, rows: Vec<(&str, String)>) {
    let mut table = Table::new();
    table.set_header(vec![Cell::new(title)
        .fg(comfy_table::Color::Cyan)
        .add_attribute(comfy_table::Attribute::Bold)]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", table);
    println!();
}

fn check_mark(enabled: bool) -> String {
    if enabled {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

fn mask_string(s: &str) -> String {
    if s.is_empty() || s.starts_with("YOUR_") {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_string() {
        assert_eq!(mask_string(""), "<not set>");
        assert_eq!(mask_string("YOUR_TMDB_API_KEY"), "<not set>");
        assert_eq!(mask_string("abcd"), "****");
        assert_eq!(mask_string("abcdef123"), "ab***23");
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = PathManager::with_base(dir.path().to_path_buf());
        let err = load_config(&paths).unwrap_err();
        assert!(err.to_string().contains("mediaboard config init"));
    }

    #[test]
    fn test_load_config_reads_template() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = PathManager::with_base(dir.path().to_path_buf());
        Config::template().save_to_file(&paths.config_file()).unwrap();

        let config = load_config(&paths).unwrap();
        assert_eq!(config.sync.region, "GB");
    }
}
