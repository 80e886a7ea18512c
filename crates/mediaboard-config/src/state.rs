use anyhow::Result;
use chrono::{DateTime, Utc};
use mediaboard_models::ThrottleState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

const LAST_RUN_PREFIX: &str = "last_run.";

#[derive(Debug, Serialize, Deserialize, Default)]
struct StateData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Small key/value store for state that survives between runs
///
/// Timestamps are stored as RFC 3339 strings. Reconciliation last-run markers are
/// keyed per catalog so switching catalogs never inherits another one's throttle.
pub struct StateStore {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            values: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let state: StateData = toml::from_str(&content)?;
            self.values = state.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let state = StateData {
            data: self.values.clone(),
        };
        let content = toml::to_string_pretty(&state)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.values.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }

    pub fn get_all_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn last_run(&self, catalog: &str) -> Option<DateTime<Utc>> {
        self.get(&last_run_key(catalog))
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn set_last_run(&mut self, catalog: &str, at: DateTime<Utc>) {
        self.set(last_run_key(catalog), at.to_rfc3339());
    }

    pub fn throttle_state(&self, catalog: &str) -> ThrottleState {
        ThrottleState::new(self.last_run(catalog))
    }

    pub fn set_throttle_state(&mut self, catalog: &str, state: &ThrottleState) {
        match state.last_run {
            Some(at) => self.set_last_run(catalog, at),
            None => self.remove(&last_run_key(catalog)),
        }
    }

    /// Drop every last-run marker, returning how many were removed
    pub fn clear_last_runs(&mut self) -> usize {
        let before = self.values.len();
        self.values.retain(|key, _| !key.starts_with(LAST_RUN_PREFIX));
        before - self.values.len()
    }
}

fn last_run_key(catalog: &str) -> String {
    format!("{}{}", LAST_RUN_PREFIX, catalog)
}
