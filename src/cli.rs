use std::path::{Path, PathBuf};

mod check;
mod format;
mod query;
mod terminal;

use anyhow::Context;
use check::Check;
use clap::ArgAction;
use format::Fmt;
use lotus::{Config, IdentifierIndex, storage};
use query::Query;

/// Name of the configuration file looked up next to the checked files.
const CONFIG_FILE_NAME: &str = "lotus.toml";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to `lotus.toml` next to the AF file)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);
        self.command.run(self.config.as_deref())
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Check AF files against a netlist
    ///
    /// Reports lines that fail to parse, patterns that do not compile,
    /// entries that match nothing and identifiers that several entries
    /// disagree about. Exits with code 2 if any error is found.
    Check(Check),

    /// Rewrite an AF file in canonical form
    Fmt(Fmt),

    /// List the identifiers a `{template:net}` selector matches
    Match(Query),
}

impl Command {
    fn run(self, config: Option<&Path>) -> anyhow::Result<()> {
        match self {
            Self::Check(command) => command.run(config)?,
            Self::Fmt(command) => command.run(config)?,
            Self::Match(command) => command.run(config)?,
        }
        Ok(())
    }
}

/// Loads the configuration for work on `target`.
///
/// An explicit path must exist. Otherwise `lotus.toml` is looked up in the
/// target's directory, falling back to defaults.
fn load_config(explicit: Option<&Path>, target: &Path) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()));
    }

    let directory = if target.is_dir() {
        Some(target)
    } else {
        target.parent()
    };
    let candidate = directory.map_or_else(
        || PathBuf::from(CONFIG_FILE_NAME),
        |directory| directory.join(CONFIG_FILE_NAME),
    );

    if candidate.is_file() {
        tracing::debug!("Using configuration {}", candidate.display());
        Config::load(&candidate)
            .with_context(|| format!("failed to load configuration from {}", candidate.display()))
    } else {
        tracing::debug!("No {CONFIG_FILE_NAME} found, using default configuration");
        Ok(Config::default())
    }
}

/// Reads a netlist and indexes the identifiers it declares.
fn load_index(netlist: &Path, top: Option<&str>) -> anyhow::Result<IdentifierIndex> {
    let text = storage::read_netlist(netlist)?;
    let index = IdentifierIndex::build(storage::extract_identifiers(&text, top));
    if index.is_empty() {
        tracing::warn!("No identifiers found in {}", netlist.display());
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn config_is_found_next_to_the_target() {
        let tmp = tempfile::tempdir().unwrap();
        let af = tmp.path().join("design.af.dcfg");
        fs::write(&af, "").unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            "_version = \"1\"\nhistory_limit = 5\n",
        )
        .unwrap();

        assert_eq!(load_config(None, &af).unwrap().history_limit(), Some(5));
        assert_eq!(load_config(None, tmp.path()).unwrap().history_limit(), Some(5));
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let af = tmp.path().join("design.af.dcfg");
        assert_eq!(load_config(None, &af).unwrap(), Config::default());
    }

    #[test]
    fn explicit_config_must_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(load_config(Some(&missing), tmp.path()).is_err());
    }
}
