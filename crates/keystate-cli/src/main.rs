//! Keystate CLI - inspect and edit the persistent local store.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use keystate::{Cast, StateError, open_local};
use keystate_config::StateConfig;
use keystate_telemetry::{LogConfig, LogFormat};

mod commands;

/// Keystate - key-value state from the shell
#[derive(Parser)]
#[command(name = "keystate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a configuration file (replaces ~/.keystate/config.toml)
    #[arg(short, long, global = true, env = "KEYSTATE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Local store file (overrides [local].path)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Key namespace (overrides [local].namespace)
    #[arg(long, global = true)]
    namespace: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value stored under a key
    Get {
        /// Key to read
        key: String,

        /// Read the value as: string, number, boolean, bigint or object
        #[arg(long)]
        cast: Option<Cast>,

        /// Fail if the key is missing or the value does not cast
        #[arg(long)]
        strict: bool,

        /// Value to print when the key is missing, empty or does not cast
        #[arg(long)]
        fallback: Option<String>,
    },

    /// Store a value under a key
    Set {
        /// Key to write
        key: String,

        /// Value to store
        value: String,

        /// Parse the value as JSON before storing it
        #[arg(long)]
        json: bool,
    },

    /// Delete a key
    Remove {
        /// Key to delete
        key: String,
    },

    /// Print whether a key exists
    Has {
        /// Key to check
        key: String,
    },

    /// Delete every key
    Clear,

    /// List every key
    Keys,
}

fn load_config(cli: &Cli) -> Result<StateConfig> {
    let mut config = StateConfig::load(cli.config.as_deref())?;
    if let Some(store) = &cli.store {
        config.local.path = store.display().to_string();
    }
    if let Some(namespace) = &cli.namespace {
        namespace.clone_into(&mut config.local.namespace);
    }
    keystate_config::validate::validate(&config)?;
    Ok(config)
}

fn setup_logging(config: Option<&StateConfig>, verbose: bool) {
    let mut log_config = config
        .and_then(|c| LogConfig::from_section(&c.logging).ok())
        .unwrap_or_else(|| LogConfig::new("info").with_format(LogFormat::Compact));
    if verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = keystate_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli);
    setup_logging(config.as_ref().ok(), cli.verbose);
    let config = config?;

    let state = open_local(&config)?;
    tracing::debug!(provider = %state.provider(), "local store opened");
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Get {
            key,
            cast,
            strict,
            fallback,
        } => commands::get(&state, &mut out, &key, cast, strict, fallback.as_deref()),
        Commands::Set { key, value, json } => commands::set(&state, &key, &value, json),
        Commands::Remove { key } => commands::remove(&state, &key),
        Commands::Has { key } => commands::has(&state, &mut out, &key),
        Commands::Clear => commands::clear(&state),
        Commands::Keys => commands::keys(&state, &mut out),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<StateError>() {
                Some(err @ (StateError::NotFound { .. } | StateError::InvalidCast { .. })) => {
                    eprintln!("{err}");
                },
                _ => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_get_with_options() {
        let cli = Cli::try_parse_from([
            "keystate",
            "--store",
            "/tmp/s.json",
            "get",
            "age",
            "--cast",
            "number",
            "--strict",
            "--fallback",
            "0",
        ])
        .unwrap();
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/s.json")));
        match cli.command {
            Commands::Get {
                key,
                cast,
                strict,
                fallback,
            } => {
                assert_eq!(key, "age");
                assert_eq!(cast, Some(Cast::Number));
                assert!(strict);
                assert_eq!(fallback.as_deref(), Some("0"));
            },
            _ => panic!("expected get"),
        }
    }

    #[test]
    fn test_unknown_cast_rejected() {
        assert!(Cli::try_parse_from(["keystate", "get", "k", "--cast", "date"]).is_err());
    }

    #[test]
    fn test_store_and_namespace_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "[local]\nnamespace = \"file\"\n").unwrap();
        let store = dir.path().join("s.json");

        let cli = Cli::try_parse_from([
            "keystate",
            "--config",
            config_path.to_str().unwrap(),
            "--store",
            store.to_str().unwrap(),
            "--namespace",
            "cli",
            "keys",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.local.path, store.display().to_string());
        assert_eq!(config.local.namespace, "cli");
    }

    #[test]
    fn test_invalid_namespace_override_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "").unwrap();
        let cli = Cli::try_parse_from([
            "keystate",
            "--config",
            config_path.to_str().unwrap(),
            "--namespace",
            "a:b",
            "keys",
        ])
        .unwrap();
        assert!(load_config(&cli).is_err());
    }
}
