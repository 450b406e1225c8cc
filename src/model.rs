use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::layout::ParseConfig;

/// A run of extracted text with its bounding box. `y0` grows downward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Fragment {
    pub fn new(text: impl Into<String>, x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            text: text.into(),
            x0,
            y0,
            x1,
            y1,
        }
    }

    pub fn x_center(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }
}

/// One decoded page: fragments in reading order plus the decoder's plain text, if any.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub number: usize,
    pub fragments: Vec<Fragment>,
    pub plain_text: Option<String>,
}

impl Page {
    pub fn new(number: usize, fragments: Vec<Fragment>) -> Self {
        Self {
            number,
            fragments,
            plain_text: None,
        }
    }

    pub fn with_plain_text(mut self, plain_text: impl Into<String>) -> Self {
        self.plain_text = Some(plain_text.into());
        self
    }

    /// Falls back to the fragment texts, one per line, when the decoder gave no plain text.
    pub fn plain_text(&self) -> Cow<'_, str> {
        match &self.plain_text {
            Some(text) => Cow::Borrowed(text.as_str()),
            None => Cow::Owned(
                self.fragments
                    .iter()
                    .map(|fragment| fragment.text.as_str())
                    .collect::<Vec<&str>>()
                    .join("\n"),
            ),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookMode {
    Scenario,
    Section,
}

impl BookMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scenario => "scenario",
            Self::Section => "section",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub text: String,
    pub links: Vec<String>,
}

pub type EntryMap = BTreeMap<String, Entry>;

/// The output artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub scenarios: EntryMap,
    pub sections: EntryMap,
}

impl Database {
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.scenarios.iter().chain(self.sections.iter())
    }

    pub fn link_count(&self) -> usize {
        self.entries().map(|(_, entry)| entry.links.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookFileEntry {
    pub filename: String,
    pub mode: BookMode,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub scenario_pattern: String,
    pub section_pattern: String,
    pub book_count: usize,
    pub books: Vec<BookFileEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolVersions {
    pub pdftotext: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    pub filename: String,
    pub mode: BookMode,
    pub status: String,
    pub sha256: Option<String>,
    pub page_count: usize,
    pub entries_touched: usize,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestCounts {
    pub document_count: usize,
    pub processed_document_count: usize,
    pub skipped_document_count: usize,
    pub page_count: usize,
    pub scenario_count: usize,
    pub section_count: usize,
    pub sections_filtered_out: usize,
    pub link_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub output_path: String,
    pub config: ParseConfig,
    pub tool_versions: ToolVersions,
    pub counts: IngestCounts,
    pub documents: Vec<DocumentRecord>,
    pub rejected_section_ids: Vec<String>,
    pub warnings: Vec<String>,
}
