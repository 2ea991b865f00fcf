//! # Lift Progression CLI (`liftprog`)
//!
//! Loads a CSV of meet results and answers questions about lifters:
//! who is in the data, which names match a query, and how a lifter's
//! squat/bench/deadlift/total moved over time.
//!
//! ## Usage
//!
//! ```bash
//! liftprog --config ./config/liftprog.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `liftprog names` | List distinct lifter names |
//! | `liftprog search "<query>"` | Fuzzy name search with scores |
//! | `liftprog progression "<name>"` | Per-lift series for one lifter |
//! | `liftprog stats` | Row counts, date range, breakdowns |
//! | `liftprog serve` | Start the JSON HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Use a local file without any config
//! liftprog --csv ./data/openpowerlifting.csv names --limit 20
//!
//! # Tolerates typos
//! liftprog search "jhon doe"
//!
//! # Top fuzzy match, raw only, in pounds, as JSON
//! liftprog progression "jhon doe" --fuzzy --equipment raw --unit lb --json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use lift_progression::config;
use lift_progression::logging;
use lift_progression::names;
use lift_progression::progress::ProgressMode;
use lift_progression::progression::{self, ProgressionArgs};
use lift_progression::search;
use lift_progression::server;
use lift_progression::source;
use lift_progression::stats;
use lift_progression_core::models::{Lift, Unit};
use lift_progression_core::query::EquipmentFilter;

const DEFAULT_CONFIG: &str = "./config/liftprog.toml";

/// Lift Progression CLI — search lifters and chart their progression from
/// meet-result CSVs.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/liftprog.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "liftprog",
    about = "Lift Progression — search lifters and chart their progression from meet-result CSVs",
    version,
    long_about = "Lift Progression ingests meet results from a local or remote CSV, normalizes \
    the many column layouts found in the wild, and answers fuzzy name searches and per-lift \
    progression queries via a CLI and a JSON HTTP API."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/liftprog.toml`. When the default file does not
    /// exist, built-in defaults are used.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Read this CSV file instead of the configured source.
    #[arg(long, global = true, conflicts_with = "url")]
    csv: Option<PathBuf>,

    /// Download and read this CSV URL instead of the configured source.
    #[arg(long, global = true)]
    url: Option<String>,

    /// Load progress on stderr. Defaults to `human` on a TTY, else `off`.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// List every distinct lifter name, sorted.
    Names {
        /// Print at most this many names.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Fuzzy-search lifter names.
    ///
    /// Tolerates typos, transpositions, reordered and partial names.
    /// Prints ranked matches with similarity scores in [0, 1].
    Search {
        /// The name to look for.
        query: String,

        /// Maximum number of matches (defaults to `[search].limit`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one lifter's results over time.
    ///
    /// Results are sorted by meet date; meets without a parseable date are
    /// listed first.
    Progression {
        /// Exact lifter name, or a search query with `--fuzzy`.
        name: String,

        /// Use the top fuzzy match for `name`.
        #[arg(long)]
        fuzzy: bool,

        /// Lifts to include (repeatable): squat, bench, deadlift, total.
        /// Defaults to `[query].default_lifts`.
        #[arg(long = "lift", value_parser = parse_lift)]
        lifts: Vec<Lift>,

        /// Unit: kg or lb.
        #[arg(long, value_parser = parse_unit)]
        unit: Option<Unit>,

        /// Equipment filter: all, raw, or equipped.
        #[arg(long, value_parser = parse_equipment)]
        equipment: Option<EquipmentFilter>,

        /// Print the chart payload as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Summarize the loaded dataset.
    Stats,

    /// Start the JSON HTTP server.
    ///
    /// Binds to the address configured in `[server].bind`.
    Serve,
}

fn parse_lift(s: &str) -> Result<Lift, String> {
    s.parse::<Lift>().map_err(|e| e.to_string())
}

fn parse_unit(s: &str) -> Result<Unit, String> {
    s.parse::<Unit>().map_err(|e| e.to_string())
}

fn parse_equipment(s: &str) -> Result<EquipmentFilter, String> {
    s.parse::<EquipmentFilter>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // One-shot commands only log warnings.
    logging::init(if matches!(cli.command, Commands::Serve) {
        "info"
    } else {
        "warn"
    });

    let is_default = cli.config == PathBuf::from(DEFAULT_CONFIG);
    let mut cfg = config::load_or_minimal(&cli.config, is_default)?;

    // CLI overrides
    if let Some(path) = cli.csv {
        cfg.data.csv_path = path;
        cfg.data.csv_url = None;
    }
    if let Some(url) = cli.url {
        cfg.data.csv_url = Some(url);
    }
    config::validate(&cfg)?;

    let mode = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);
    let loaded = source::load(&cfg, mode).await?;

    match cli.command {
        Commands::Names { limit } => {
            names::run_names(&loaded.dataset, limit)?;
        }
        Commands::Search { query, limit } => {
            search::run_search(&cfg, &loaded.dataset, &query, limit)?;
        }
        Commands::Progression {
            name,
            fuzzy,
            lifts,
            unit,
            equipment,
            json,
        } => {
            let args = ProgressionArgs {
                name,
                fuzzy,
                lifts,
                unit,
                equipment,
                json,
            };
            progression::run_progression(&cfg, &loaded.dataset, &args)?;
        }
        Commands::Stats => {
            stats::run_stats(&loaded)?;
        }
        Commands::Serve => {
            server::run_server(&cfg, loaded).await?;
        }
    }

    Ok(())
}
