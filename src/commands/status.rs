use std::fs;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::Database;
use crate::util::{to_json_pretty_bytes, write_json_pretty};

#[derive(Debug, Default, PartialEq, Eq)]
struct DatabaseSummary {
    scenario_count: usize,
    section_count: usize,
    link_count: usize,
    empty_text_count: usize,
    dangling_links: Vec<String>,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let raw = fs::read(&args.database)
        .with_context(|| format!("failed to read {}", args.database.display()))?;
    let database: Database = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", args.database.display()))?;

    let summary = summarize(&database);
    info!(
        path = %args.database.display(),
        scenarios = summary.scenario_count,
        sections = summary.section_count,
        links = summary.link_count,
        empty_entries = summary.empty_text_count,
        dangling_links = summary.dangling_links.len(),
        "loaded database"
    );
    if !summary.dangling_links.is_empty() {
        warn!(targets = ?summary.dangling_links, "links point at ids missing from both mappings");
    }

    let canonical = to_json_pretty_bytes(&database)?;
    if canonical == raw {
        info!("database is in canonical form");
    } else if args.rewrite {
        write_json_pretty(&args.database, &database)?;
        info!(path = %args.database.display(), "rewrote database in canonical form");
    } else {
        warn!("database differs from its canonical serialization; rerun with --rewrite");
    }

    Ok(())
}

fn summarize(database: &Database) -> DatabaseSummary {
    let mut dangling_links = Vec::new();
    for (_, entry) in database.entries() {
        for link in &entry.links {
            let known =
                database.sections.contains_key(link) || database.scenarios.contains_key(link);
            if !known && !dangling_links.contains(link) {
                dangling_links.push(link.clone());
            }
        }
    }

    DatabaseSummary {
        scenario_count: database.scenarios.len(),
        section_count: database.sections.len(),
        link_count: database.link_count(),
        empty_text_count: database
            .entries()
            .filter(|(_, entry)| entry.text.is_empty())
            .count(),
        dangling_links,
    }
}
