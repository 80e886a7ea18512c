use crate::commands::config::load_config;
use crate::output::Output;
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use comfy_table::{Cell, ContentArrangement, Table};
use mediaboard_config::PathManager;
use mediaboard_models::{MediaKind, SearchResult};
use mediaboard_sources::{MetadataProvider, TmdbClient};
use serde_json::json;

const OVERVIEW_WIDTH: usize = 80;

pub async fn run_search(kind: MediaKind, query: &str, year: Option<i32>, output: &Output) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        return Err(eyre!("Search query must not be empty"));
    }

    let config = load_config(&PathManager::default())?;
    let client = TmdbClient::new(&config.tmdb).wrap_err("Failed to create TMDB client")?;
    let results = client
        .search(kind, query, year)
        .await
        .wrap_err_with(|| format!("Search for '{}' failed", query))?;

    if output.is_json() {
        output.json(&json!({
            "query": query,
            "kind": kind,
            "year": year,
            "results": results,
        }));
        return Ok(());
    }

    if results.is_empty() {
        output.info(format!("No {} found for '{}'", plural(kind), query));
        return Ok(());
    }

    println!("{}", results_table(&results));
    output.info(format!("Add one with: mediaboard add --kind {} <TMDB_ID>", kind));
    Ok(())
}

fn results_table(results: &[SearchResult]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("TMDB ID").fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Title").fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Year").fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Overview").fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
    ]);
    for result in results {
        table.add_row(vec![
            Cell::new(result.tmdb_id),
            Cell::new(&result.title),
            Cell::new(
                result
                    .release_date
                    .map(|d| d.format("%Y").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(truncate(&result.overview, OVERVIEW_WIDTH)),
        ]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn plural(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Show => "shows",
        MediaKind::Movie => "movies",
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let cut: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}
