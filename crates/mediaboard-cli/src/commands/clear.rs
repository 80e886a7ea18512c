use crate::output::Output;
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use mediaboard_config::{PathManager, StateStore};
use std::path::Path;

pub fn run_clear(timestamps: bool, output: &Output) -> Result<()> {
    if !timestamps {
        output.warn("No clear option specified. Use --timestamps");
        output.info("\nExample: mediaboard clear --timestamps");
        return Ok(());
    }

    let path_manager = PathManager::default();
    match clear_timestamps(&path_manager.state_file())? {
        Some(0) => output.info("No reconciliation timestamps found to clear"),
        Some(count) => output.success(format!("Cleared {} reconciliation timestamp(s)", count)),
        None => output.info("No state file found, nothing to clear"),
    }
    Ok(())
}

/// Remove every last-run timestamp; `None` when there is no state file
fn clear_timestamps(state_file: &Path) -> Result<Option<usize>> {
    if !state_file.exists() {
        return Ok(None);
    }

    let mut store = StateStore::new(state_file.to_path_buf());
    store
        .load()
        .map_err(|e| eyre!("{:#}", e))
        .wrap_err_with(|| format!("Failed to read state from {}", state_file.display()))?;

    let cleared = store.clear_last_runs();
    if cleared > 0 {
        store
            .save()
            .map_err(|e| eyre!("{:#}", e))
            .wrap_err_with(|| format!("Failed to save state to {}", state_file.display()))?;
    }
    Ok(Some(cleared))
}
