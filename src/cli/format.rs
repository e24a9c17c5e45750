use std::path::{Path, PathBuf};

use clap::Parser;
use lotus::storage;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Rewrite an AF file in canonical form")]
pub struct Fmt {
    /// The AF file to format
    file: PathBuf,

    /// Write the result back instead of printing it
    #[arg(long, short)]
    write: bool,
}

impl Fmt {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, config: Option<&Path>) -> anyhow::Result<()> {
        let config = super::load_config(config, &self.file)?;
        let mut document = storage::read_document(&self.file, &config)?;

        let invalid = document.lines().filter(|line| line.error().is_some()).count();
        if invalid > 0 {
            tracing::warn!("{invalid} invalid lines are kept verbatim");
        }

        if !self.write {
            print!("{}", document.text());
            return Ok(());
        }

        let original = std::fs::read_to_string(&self.file)?;
        if original == document.text() {
            println!("{}", format!("{} already formatted", self.file.display()).dim());
            return Ok(());
        }

        storage::write_document(&self.file, &mut document)?;
        println!("{} Formatted {}", "✓".success(), self.file.display());
        Ok(())
    }
}
