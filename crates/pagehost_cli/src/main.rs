//! Operator CLI for a host's persisted preference state.
//!
//! # Responsibility
//! - Inspect and edit persisted overrides in a SQLite preference database.
//! - Offer the confirmed full reset.

use clap::{Args, Parser, Subcommand};
use pagehost_core::{
    confirm_and_reset, core_version, init_logging, HostConfig, PersistedKey, PreferenceStore,
    ResetOutcome, SqliteBackend,
};
use serde_json::Value;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "pagehost", about = "Extension host preference tooling")]
struct Cli {
    /// JSON host config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Absolute directory for rolling log files; logging is off when omitted.
    #[arg(long, global = true)]
    log_dir: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the core version.
    Version,
    /// Inspect or edit persisted preference overrides.
    Prefs {
        #[arg(long)]
        db: PathBuf,
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Erase every persisted preference after typed confirmation.
    Reset {
        #[arg(long)]
        db: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum PrefsAction {
    /// List every persisted override.
    List,
    Get(KeyArgs),
    /// Write a JSON value.
    Set {
        #[command(flatten)]
        key: KeyArgs,
        value: String,
    },
    Remove(KeyArgs),
}

#[derive(Debug, Args)]
struct KeyArgs {
    key: String,
    /// Scope the key to one unit's namespace.
    #[arg(long)]
    unit: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => HostConfig::from_path(path)?,
        None => HostConfig::default(),
    };
    if let Some(log_dir) = &cli.log_dir {
        init_logging(config.effective_log_level(), log_dir)?;
    }

    match cli.command {
        Command::Version => {
            println!("pagehost_core version={}", core_version());
            Ok(())
        }
        Command::Prefs { db, action } => run_prefs(open_store(&db)?, action),
        Command::Reset { db } => {
            let mut store = open_store(&db)?;
            let stdin = std::io::stdin();
            let outcome = confirm_and_reset(
                &mut stdin.lock(),
                &mut std::io::stdout(),
                &config.reset_phrase,
                &mut store,
            )?;
            if outcome == ResetOutcome::Aborted {
                log::info!("event=cli_reset module=cli status=aborted");
            }
            Ok(())
        }
    }
}

fn open_store(db: &Path) -> Result<PreferenceStore, Box<dyn Error>> {
    let mut store = PreferenceStore::new(SqliteBackend::open(db)?);
    store.load()?;
    Ok(store)
}

fn run_prefs(mut store: PreferenceStore, action: PrefsAction) -> Result<(), Box<dyn Error>> {
    match action {
        PrefsAction::List => {
            let entries: Vec<(PersistedKey, &Value)> = store.overrides().entries().collect();
            if entries.is_empty() {
                println!("(no overrides)");
            }
            for (key, value) in entries {
                println!("{key} = {value}");
            }
        }
        PrefsAction::Get(args) => match store.get(&args.key, args.unit.as_deref()) {
            Some(value) => println!("{value}"),
            None => return Err(format!("no value for `{}`", args.key).into()),
        },
        PrefsAction::Set { key, value } => {
            let value: Value = serde_json::from_str(&value)?;
            store.set(&key.key, value, key.unit.as_deref())?;
        }
        PrefsAction::Remove(args) => {
            if !store.remove(&args.key, args.unit.as_deref())? {
                println!("no override for `{}`", args.key);
            }
        }
    }
    Ok(())
}
