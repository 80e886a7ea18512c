use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use commands::{add, clear, config, daemon, search, sync};
use mediaboard_config::PathManager;
use mediaboard_models::MediaKind;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "mediaboard")]
#[command(about = "MediaBoard - keep a watchlist in step with TMDB")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass over the watchlist
    #[command(long_about = "Compare every tracked show and movie against TMDB and write back status changes, new seasons (with their episodes) and streaming platform moves. A pass is skipped when the previous one finished less than the configured interval ago, unless --force is given.")]
    Sync {
        /// Ignore the minimum interval since the last pass
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,

        /// Use the daily interval instead of the short one
        #[arg(long, action = ArgAction::SetTrue)]
        daily: bool,

        /// Check platform availability even if disabled in configuration
        #[arg(long, action = ArgAction::SetTrue)]
        platforms: bool,

        /// Post a summary to the configured webhook when the pass ends
        #[arg(long, action = ArgAction::SetTrue)]
        webhook: bool,

        /// Ask the configured remote endpoint to run the pass instead of running it here
        #[arg(long, action = ArgAction::SetTrue)]
        remote: bool,
    },
    /// Run as a long-lived process with an internal scheduler
    #[command(long_about = "Run MediaBoard in the foreground and start a reconciliation pass on every tick of the configured cron schedule. Each tick goes through the same interval gate as 'sync'. A pass also runs at startup unless --no-startup-sync is given.")]
    Daemon {
        /// Cron schedule with a seconds field (e.g. '0 0 */6 * * *' for every 6 hours)
        #[arg(long, value_name = "SCHEDULE")]
        schedule: Option<String>,

        /// Skip the pass at startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_sync: bool,

        /// Check platform availability even if disabled in configuration
        #[arg(long, action = ArgAction::SetTrue)]
        platforms: bool,

        /// Post a summary to the configured webhook after each executed pass
        #[arg(long, action = ArgAction::SetTrue)]
        webhook: bool,
    },
    /// Search TMDB for shows or movies
    Search {
        /// What to search for
        #[arg(long, value_enum, default_value = "show")]
        kind: KindArg,

        /// Free-text title query
        query: String,

        /// Restrict results to a release year
        #[arg(long)]
        year: Option<i32>,
    },
    /// Start tracking a show or movie by TMDB id
    #[command(long_about = "Add a title to the watchlist. Shows are created with all their seasons and episodes, all unwatched. Adding a title that is already tracked is rejected.")]
    Add {
        #[arg(long, value_enum, default_value = "show")]
        kind: KindArg,

        tmdb_id: u32,
    },
    /// View or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
    /// Clear saved state
    Clear {
        /// Clear last-run timestamps so the next pass is not throttled
        #[arg(long, action = ArgAction::SetTrue)]
        timestamps: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks secrets)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a configuration template
    Init {
        /// Overwrite an existing configuration file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    #[value(alias = "tv")]
    Show,
    Movie,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Show => MediaKind::Show,
            KindArg::Movie => MediaKind::Movie,
        }
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // The daemon keeps its logs in a daily rolling file
    let log_file = match cli.command {
        Commands::Daemon { .. } => Some(PathManager::default().daemon_log_file()),
        _ => None,
    };
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file).map_err(|e| color_eyre::eyre::eyre!("{:#}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Sync {
            force,
            daily,
            platforms,
            webhook,
            remote,
        } => {
            let flags = sync::SyncFlags {
                force,
                daily,
                platforms,
                webhook,
            };
            if remote {
                sync::run_remote(flags, &output).await?;
            } else {
                sync::run_sync(flags, &output).await?;
            }
        }
        Commands::Daemon {
            schedule,
            no_startup_sync,
            platforms,
            webhook,
        } => {
            daemon::run_daemon(schedule, no_startup_sync, platforms, webhook, &output).await?;
        }
        Commands::Search { kind, query, year } => {
            search::run_search(kind.into(), &query, year, &output).await?;
        }
        Commands::Add { kind, tmdb_id } => {
            add::run_add(kind.into(), tmdb_id, &output).await?;
        }
        Commands::Config { cmd } => match cmd {
            Some(ConfigCommands::Show { full }) => {
                config::show_config(full, &output)?;
            }
            None => {
                config::show_config(false, &output)?;
            }
            Some(ConfigCommands::Init { force }) => {
                config::init_config(force, &output)?;
            }
        },
        Commands::Clear { timestamps } => {
            clear::run_clear(timestamps, &output)?;
        }
    }

    Ok(())
}
