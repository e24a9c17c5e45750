use std::path::{Path, PathBuf};

use clap::Parser;
use lotus::{Conflict, Diagnostic, PatternMatcher, Severity, diagnose, find_conflicts, storage};
use tracing::instrument;
use walkdir::WalkDir;

use super::terminal::Colorize;

/// Extension of AF configuration files.
const AF_EXTENSION: &str = ".af.dcfg";

#[derive(Debug, Parser)]
#[command(about = "Check AF files against a netlist")]
pub struct Check {
    /// An AF file, or a directory searched for `*.af.dcfg` files
    path: PathBuf,

    /// The SPICE netlist declaring the templates and nets
    #[arg(long, short)]
    netlist: PathBuf,

    /// Template name for devices outside any subcircuit
    #[arg(long)]
    top: Option<String>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug)]
struct FileReport {
    path: PathBuf,
    diagnostics: Vec<Diagnostic>,
    conflicts: Vec<Conflict>,
}

impl FileReport {
    fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

impl Check {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, config: Option<&Path>) -> anyhow::Result<()> {
        let config = super::load_config(config, &self.path)?;
        let index = super::load_index(&self.netlist, self.top.as_deref())?;
        let mut matcher = PatternMatcher::with_config(&config);

        let paths = collect_af_paths(&self.path);
        if paths.is_empty() {
            anyhow::bail!("no {AF_EXTENSION} files found in {}", self.path.display());
        }

        let mut reports = Vec::with_capacity(paths.len());
        for path in paths {
            let document = storage::read_document(&path, &config)?;
            reports.push(FileReport {
                diagnostics: diagnose(&document, &mut matcher, &index),
                conflicts: find_conflicts(&document, &mut matcher, &index),
                path,
            });
        }
        tracing::debug!("Matcher work: {:?}", matcher.stats());

        match self.output {
            OutputFormat::Table => Self::output_table(&reports),
            OutputFormat::Json => Self::output_json(&reports)?,
        }

        // Exit with code 2 to indicate errors (for CI)
        if reports.iter().any(FileReport::has_errors) {
            std::process::exit(2);
        }

        Ok(())
    }

    fn output_table(reports: &[FileReport]) {
        for report in reports {
            let path = report.path.display().to_string();
            if report.diagnostics.is_empty() && report.conflicts.is_empty() {
                println!("{} {}", "✓".success(), path);
                continue;
            }

            println!("{}", path.info());
            for diagnostic in &report.diagnostics {
                let line = format!("  {diagnostic}");
                match diagnostic.severity {
                    Severity::Error => println!("{}", line.warning()),
                    Severity::Warning => println!("{line}"),
                }
            }
            for conflict in &report.conflicts {
                let lines: Vec<String> = conflict.line_numbers().map(|n| n.to_string()).collect();
                println!(
                    "  conflict: {} is assigned differently on lines {}",
                    conflict.identifier,
                    lines.join(", ")
                );
            }
        }

        let errors: usize = reports
            .iter()
            .flat_map(|r| &r.diagnostics)
            .filter(|d| d.severity == Severity::Error)
            .count();
        let warnings: usize = reports
            .iter()
            .flat_map(|r| &r.diagnostics)
            .filter(|d| d.severity == Severity::Warning)
            .count();
        let conflicts: usize = reports.iter().map(|r| r.conflicts.len()).sum();

        println!();
        println!(
            "{}",
            format!(
                "{} files checked: {errors} errors, {warnings} warnings, {conflicts} conflicts",
                reports.len()
            )
            .dim()
        );
    }

    fn output_json(reports: &[FileReport]) -> anyhow::Result<()> {
        use serde_json::json;

        let files: Vec<_> = reports
            .iter()
            .map(|report| {
                json!({
                    "path": report.path.display().to_string(),
                    "diagnostics": report.diagnostics,
                    "conflicts": report.conflicts,
                })
            })
            .collect();

        let output = json!({
            "files": files,
            "has_errors": reports.iter().any(FileReport::has_errors),
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

/// The AF files to check: `path` itself, or every AF file below it.
fn collect_af_paths(path: &Path) -> Vec<PathBuf> {
    if !path.is_dir() {
        return vec![path.to_path_buf()];
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(AF_EXTENSION))
        })
        .map(walkdir::DirEntry::into_path)
        .collect();
    paths.sort();
    paths
}
