use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use services::{AppServices, Clock, MaterialServiceError, ProgressOutcome};
use studypace_core::TokenPolicy;
use studypace_core::model::{DATE_FORMAT, MaterialDraft, MaterialId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod render;

use config::Config;

/// Exit status when progress input was rejected and nothing changed.
const EXIT_WARNING: u8 = 1;
/// Exit status for hard failures (validation on add, missing ids, storage).
const EXIT_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "studypace")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL or path (defaults to the platform data dir)
    #[arg(long, global = true, env = "STUDYPACE_DB_URL")]
    db: Option<String>,

    /// Path to config.json
    #[arg(long, global = true, env = "STUDYPACE_CONFIG")]
    config: Option<PathBuf>,

    /// Pretend today is this date (YYYY-MM-DD)
    #[arg(long, global = true, value_parser = parse_date)]
    today: Option<NaiveDate>,

    /// Reject unit lists containing any malformed token
    #[arg(long, global = true)]
    strict_units: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List study materials with pacing advice
    List {
        /// Category to show, or "all"
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Register a new study material
    Add {
        name: String,
        /// Number of units the material is divided into
        #[arg(short, long)]
        units: String,
        #[arg(short, long)]
        category: Option<String>,
        /// Target completion date (YYYY-MM-DD)
        #[arg(short, long)]
        target: Option<String>,
    },
    /// Show one material
    Show {
        id: MaterialId,
        #[arg(long)]
        json: bool,
    },
    /// Set how many units are completed
    Progress {
        id: MaterialId,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Set progress from the list of completed unit numbers
    Units {
        id: MaterialId,
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        units: Vec<String>,
    },
    /// Delete a material
    Delete { id: MaterialId },
    /// List categories in use
    Categories,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| format!("{raw}: {e}"))
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "error",
        1 => "studypace=info,services=info,storage=info",
        _ => "studypace=debug,services=debug,storage=debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

/// True for URLs that never touch the filesystem, such as `sqlite::memory:`
/// or `sqlite:file:name?mode=memory&cache=shared`.
fn is_in_memory_url(url: &str) -> bool {
    url == "sqlite::memory:"
        || url
            .split_once('?')
            .is_some_and(|(_, query)| query.split('&').any(|pair| pair == "mode=memory"))
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_in_memory_url(trimmed) || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Make sure the database file and its directory exist before connecting.
fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    if is_in_memory_url(db_url) {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .with_context(|| format!("invalid database URL: {db_url}"))?;
    let path = path.split('?').next().unwrap_or(path);
    anyhow::ensure!(!path.is_empty(), "invalid database URL: {db_url}");

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

fn print_outcome(outcome: &ProgressOutcome) -> ExitCode {
    match outcome {
        ProgressOutcome::Updated(view) => {
            println!("{}", render::material_line(view));
            ExitCode::SUCCESS
        }
        ProgressOutcome::Rejected(reason) => {
            eprintln!("warning: {reason}; progress left unchanged");
            ExitCode::from(EXIT_WARNING)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;

    let db_url = match cli.db.as_deref().or(config.db_url.as_deref()) {
        Some(raw) => normalize_sqlite_url(raw),
        None => Config::default_db_url()?,
    };
    let token_policy = if cli.strict_units {
        TokenPolicy::Strict
    } else {
        config.token_policy
    };
    let clock = cli.today.map_or_else(Clock::default_clock, Clock::fixed);

    prepare_sqlite_file(&db_url)?;
    tracing::debug!(%db_url, %token_policy, "opening store");
    let services = AppServices::new_sqlite(&db_url, clock, token_policy)
        .await
        .with_context(|| format!("Failed to open {db_url}"))?;
    let materials = services.materials();

    let command = cli.command.unwrap_or(Commands::List {
        category: None,
        json: false,
    });

    match command {
        Commands::List { category, json } => {
            let listing = materials.list_materials(category.as_deref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print!("{}", render::listing(&listing));
            }
        }
        Commands::Add {
            name,
            units,
            category,
            target,
        } => {
            let draft = MaterialDraft {
                name,
                total_units: units,
                category,
                target_date: target,
            };
            let id = materials.add_material(draft).await?;
            println!("added {id}");
        }
        Commands::Show { id, json } => {
            let view = materials.get_material(id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("{}", render::material_line(&view));
            }
        }
        Commands::Progress { id, value } => {
            let outcome = materials.update_progress(id, &value).await?;
            return Ok(print_outcome(&outcome));
        }
        Commands::Units { id, units } => {
            let outcome = materials.record_units(id, &units.join(" ")).await?;
            return Ok(print_outcome(&outcome));
        }
        Commands::Delete { id } => {
            materials.delete_material(id).await?;
            println!("deleted {id}");
        }
        Commands::Categories => {
            for category in materials.categories().await? {
                println!("{category}");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            match err.downcast_ref::<MaterialServiceError>() {
                Some(e) if e.is_not_found() || e.is_validation() => eprintln!("error: {e}"),
                _ => eprintln!("error: {err:#}"),
            }
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn memory_and_url_forms_pass_through() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/study.db"),
            "sqlite:///tmp/study.db"
        );
    }

    #[test]
    fn shared_memory_urls_pass_through_without_files() {
        let url = "sqlite:file:studypace_cli?mode=memory&cache=shared";
        assert_eq!(normalize_sqlite_url(url), url);
        assert!(is_in_memory_url("sqlite::memory:"));
        assert!(!is_in_memory_url("sqlite:///tmp/study.db?mode=rwc"));

        let cwd = std::env::current_dir().unwrap();
        prepare_sqlite_file(url).unwrap();
        assert!(!cwd.join("file:studypace_cli").exists());
    }

    #[test]
    fn bare_paths_become_absolute_urls() {
        assert_eq!(
            normalize_sqlite_url("/var/data/study.db"),
            "sqlite:///var/data/study.db"
        );
        assert!(normalize_sqlite_url("study.db").starts_with("sqlite:///"));
    }

    #[test]
    fn parses_negative_progress_as_value() {
        let cli = Cli::try_parse_from(["studypace", "progress", "3", "-1"]).unwrap();
        let Some(Commands::Progress { id, value }) = cli.command else {
            panic!("expected progress command");
        };
        assert_eq!(id, MaterialId::new(3));
        assert_eq!(value, "-1");
    }

    #[test]
    fn rejects_bad_today_flag() {
        assert!(Cli::try_parse_from(["studypace", "--today", "2023-02-30", "list"]).is_err());
    }
}
