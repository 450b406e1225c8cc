//! Layout-driven entry reconstruction.
//!
//! A page is a bag of positioned fragments. Headers are found by pattern, grouped into
//! horizontal rows, and every remaining fragment is attached to the header whose row sits
//! nearest above it and whose column lines up best with it.

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::model::{BookMode, Entry, EntryMap, Page};

mod assemble;
mod assign;
mod headers;
mod links;
mod normalize;
mod rows;

pub use assemble::{DatabaseBuilder, is_section_id, merge_entry_maps};
pub use assign::assign_fragment;
pub use headers::HeaderCandidate;
pub use links::{extract_references, merge_links};
pub use normalize::normalize_text;
pub use rows::{Row, cluster_rows};

pub const DEFAULT_ROW_TOLERANCE: f64 = 30.0;
pub const DEFAULT_ROW_SLACK: f64 = 10.0;

/// Fragments with this many whitespace tokens or fewer are dropped unless they carry a
/// reference.
const MIN_TOKENS_EXCLUSIVE: usize = 3;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnAlignment {
    #[default]
    LeftEdge,
    Center,
}

impl ColumnAlignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LeftEdge => "left-edge",
            Self::Center => "center",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseConfig {
    /// Vertical distance under which two headers share a row.
    pub row_tolerance: f64,
    /// Vertical slack for the "row is above the fragment" test.
    pub row_slack: f64,
    /// Preferred maximum horizontal distance between a fragment and its header. Unset keeps
    /// every fragment on the nearest row above it.
    pub column_threshold: Option<f64>,
    pub alignment: ColumnAlignment,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            row_tolerance: DEFAULT_ROW_TOLERANCE,
            row_slack: DEFAULT_ROW_SLACK,
            column_threshold: None,
            alignment: ColumnAlignment::LeftEdge,
        }
    }
}

impl ParseConfig {
    pub fn validate(&self) -> Result<()> {
        let distances = [
            ("row_tolerance", self.row_tolerance),
            ("row_slack", self.row_slack),
        ]
        .into_iter()
        .chain(self.column_threshold.map(|value| ("column_threshold", value)));

        for (name, value) in distances {
            if !value.is_finite() || value < 0.0 {
                bail!("{name} must be a finite non-negative number, got {value}");
            }
        }
        Ok(())
    }
}

/// Holds the compiled patterns and the geometry settings shared by every page.
#[derive(Debug)]
pub struct PageParser {
    config: ParseConfig,
    scenario_header: Regex,
    section_header: Regex,
    standalone_number: Regex,
    reference: Regex,
}

impl PageParser {
    pub fn new(config: ParseConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            scenario_header: Regex::new(r"^(\d+)\s*\x{2022}")
                .context("failed to compile scenario header regex")?,
            section_header: Regex::new(r"^\s*(\d+\.\d+)\s*[\x{2022}\x{FFFD}\-\.]?")
                .context("failed to compile section header regex")?,
            standalone_number: Regex::new(r"(?m)^\s*(\d+(?:\.\d+)?)\s*$")
                .context("failed to compile standalone number regex")?,
            reference: Regex::new(r"(?i)\bread\s+(\d+(?:\.\d+)?)")
                .context("failed to compile reference regex")?,
        })
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Parses one page into the entries it touches. Entries for detected headers are
    /// present even when nothing was assigned to them.
    pub fn parse_page(&self, mode: BookMode, page: &Page) -> EntryMap {
        match mode {
            BookMode::Scenario => self.parse_scenario_page(page),
            BookMode::Section => self.parse_section_page(page),
        }
    }

    /// Folds every page in order into one map; continuation text lands after earlier pages.
    pub fn parse_document(&self, mode: BookMode, pages: &[Page]) -> EntryMap {
        pages.iter().fold(EntryMap::new(), |mut entries, page| {
            let page_entries = self.parse_page(mode, page);
            debug!(
                page = page.number,
                mode = mode.as_str(),
                entries = page_entries.len(),
                "parsed page"
            );
            merge_entry_maps(&mut entries, page_entries);
            entries
        })
    }

    fn parse_scenario_page(&self, page: &Page) -> EntryMap {
        let mut entries = EntryMap::new();
        let Some(id) = self.scenario_page_id(&page.fragments) else {
            return entries;
        };

        let entry = entries.entry(id).or_default();
        for fragment in &page.fragments {
            if self.is_eligible(BookMode::Scenario, &fragment.text) {
                self.append_fragment(entry, &fragment.text);
            }
        }

        entries
    }

    fn parse_section_page(&self, page: &Page) -> EntryMap {
        let candidates = self.section_headers(page);
        let mut entries: EntryMap = candidates
            .iter()
            .map(|candidate| (candidate.id.clone(), Entry::default()))
            .collect();

        let rows = cluster_rows(candidates, self.config.row_tolerance);
        for fragment in &page.fragments {
            if !self.is_eligible(BookMode::Section, &fragment.text) {
                continue;
            }
            let Some(header) = assign_fragment(fragment, &rows, &self.config) else {
                continue;
            };
            let entry = entries.entry(header.id.clone()).or_default();
            self.append_fragment(entry, &fragment.text);
        }

        entries
    }

    /// Whether a fragment carries enough content to be kept.
    pub fn is_eligible(&self, mode: BookMode, raw_text: &str) -> bool {
        let text = raw_text.trim();
        if text.split_whitespace().count() > MIN_TOKENS_EXCLUSIVE || self.reference.is_match(text)
        {
            return true;
        }
        mode == BookMode::Scenario && self.scenario_header.is_match(text)
    }

    fn append_fragment(&self, entry: &mut Entry, raw_text: &str) {
        let text = normalize_text(raw_text);
        merge_links(&mut entry.links, extract_references(&self.reference, &text));
        entry.text.push(' ');
        entry.text.push_str(&text);
    }
}
