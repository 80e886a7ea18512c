use crate::commands::config::load_valid_config;
use crate::commands::sync::build_reconciler;
use crate::output::Output;
use color_eyre::eyre::Context;
use color_eyre::Result;
use mediaboard_config::PathManager;
use mediaboard_models::{MediaKind, TrackedShow};
use serde_json::json;

pub async fn run_add(kind: MediaKind, tmdb_id: u32, output: &Output) -> Result<()> {
    let config = load_valid_config(&PathManager::default())?;
    let reconciler = build_reconciler(&config)?;

    match kind {
        MediaKind::Show => {
            let show = reconciler
                .track_show(tmdb_id)
                .await
                .wrap_err_with(|| format!("Failed to add show {}", tmdb_id))?;
            if output.is_json() {
                output.json(&json!({ "success": true, "kind": kind, "show": show }));
            } else {
                output.success(format!(
                    "Added '{}' on {} ({})",
                    show.title,
                    show.platform,
                    season_summary(&show)
                ));
            }
        }
        MediaKind::Movie => {
            let movie = reconciler
                .track_movie(tmdb_id)
                .await
                .wrap_err_with(|| format!("Failed to add movie {}", tmdb_id))?;
            if output.is_json() {
                output.json(&json!({ "success": true, "kind": kind, "movie": movie }));
            } else {
                output.success(format!("Added '{}' on {}", movie.title, movie.platform));
            }
        }
    }

    Ok(())
}

fn season_summary(show: &TrackedShow) -> String {
    let episodes: usize = show.seasons.iter().map(|s| s.episodes.len()).sum();
    format!("{} season(s), {} episode(s)", show.seasons.len(), episodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaboard_models::{Episode, Season};

    #[test]
    fn test_season_summary_counts_episodes() {
        let episode = |id: i64, n: u32| Episode {
            id,
            season_id: 1,
            episode_number: n,
            title: None,
            release_date: None,
            watched: false,
        };
        let show = TrackedShow {
            id: 1,
            tmdb_id: 1399,
            title: "Show".to_string(),
            status: None,
            platform: "Online".to_string(),
            seasons: vec![Season {
                id: 1,
                show_id: 1,
                season_number: 1,
                release_year: None,
                release_date: None,
                watched: false,
                episodes: vec![episode(1, 1), episode(2, 2)],
            }],
        };
        assert_eq!(season_summary(&show), "1 season(s), 2 episode(s)");
    }
}
