use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use lotus::{ConfigLine, PatternMatcher};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "List the identifiers a selector matches")]
pub struct Query {
    /// The selector, e.g. `{inv:VDD}` or `{:CLK.*}`
    spec: String,

    /// The SPICE netlist declaring the templates and nets
    #[arg(long, short)]
    netlist: PathBuf,

    /// Template name for devices outside any subcircuit
    #[arg(long)]
    top: Option<String>,

    /// Treat the template part as a regular expression
    #[arg(long)]
    template_regex: bool,

    /// Treat the net part as a regular expression
    #[arg(long)]
    net_regex: bool,
}

impl Query {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, config: Option<&Path>) -> anyhow::Result<()> {
        let config = super::load_config(config, &self.netlist)?;
        let index = super::load_index(&self.netlist, self.top.as_deref())?;
        let mut matcher = PatternMatcher::with_config(&config);

        let line = ConfigLine::parse(&self.entry_text(), 1);
        if let Some(error) = line.error() {
            anyhow::bail!("invalid selector '{}': {error}", self.spec);
        }
        let entry = line
            .entry()
            .with_context(|| format!("'{}' is not a selector", self.spec))?;

        let result = matcher.find_matches(entry.spec(), &index)?;
        if result.is_empty() {
            println!("{}", format!("{} matches nothing", entry.spec()).warning());
            return Ok(());
        }

        for name in result.qualified_names() {
            println!("{name}");
        }
        println!(
            "{}",
            format!(
                "{} matches across {} templates",
                result.len(),
                result.templates().len()
            )
            .dim()
        );
        Ok(())
    }

    /// The selector as a full AF line, so it goes through the line grammar.
    fn entry_text(&self) -> String {
        let mut text = format!("{} 1.0", self.spec.trim());
        if self.template_regex {
            text.push_str(" template-regexp");
        }
        if self.net_regex {
            text.push_str(" net-regexp");
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(spec: &str, template_regex: bool, net_regex: bool) -> Query {
        Query {
            spec: spec.to_string(),
            netlist: PathBuf::from("design.sp"),
            top: None,
            template_regex,
            net_regex,
        }
    }

    #[test]
    fn selector_becomes_an_entry_line() {
        assert_eq!(query(" {inv:VDD} ", false, false).entry_text(), "{inv:VDD} 1.0");
        assert_eq!(
            query("{i.*:V.*}", true, true).entry_text(),
            "{i.*:V.*} 1.0 template-regexp net-regexp"
        );
    }

    #[test]
    fn selector_kinds_follow_the_flags() {
        let line = ConfigLine::parse(&query("{:CLK.*}", false, true).entry_text(), 1);
        let entry = line.entry().unwrap();
        assert!(entry.spec().net().is_regex());
        assert!(entry.spec().template().is_none());
    }
}
