use tracing::debug;

use super::PageParser;
use crate::model::{Fragment, Page};

/// A fragment recognised as a section header, reduced to what assignment needs.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCandidate {
    pub id: String,
    pub x_left: f64,
    pub x_right: f64,
    pub y: f64,
}

impl HeaderCandidate {
    pub fn from_fragment(id: impl Into<String>, fragment: &Fragment) -> Self {
        Self {
            id: id.into(),
            x_left: fragment.x0,
            x_right: fragment.x1,
            y: fragment.y0,
        }
    }

    /// Pinned to the page origin so it wins every proximity comparison.
    pub fn sentinel(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x_left: 0.0,
            x_right: 0.0,
            y: 0.0,
        }
    }

    pub fn x_center(&self) -> f64 {
        (self.x_left + self.x_right) / 2.0
    }
}

impl PageParser {
    pub fn scenario_header_id(&self, raw_text: &str) -> Option<String> {
        self.scenario_header
            .captures(raw_text.trim())
            .and_then(|captures| captures.get(1))
            .map(|value| value.as_str().to_string())
    }

    pub fn section_header_id(&self, raw_text: &str) -> Option<String> {
        self.section_header
            .captures(raw_text.trim())
            .and_then(|captures| captures.get(1))
            .map(|value| value.as_str().to_string())
    }

    /// First header in encounter order; scenario pages carry at most one.
    pub(super) fn scenario_page_id(&self, fragments: &[Fragment]) -> Option<String> {
        fragments
            .iter()
            .find_map(|fragment| self.scenario_header_id(&fragment.text))
    }

    pub fn section_headers(&self, page: &Page) -> Vec<HeaderCandidate> {
        let candidates = page
            .fragments
            .iter()
            .filter_map(|fragment| {
                self.section_header_id(&fragment.text)
                    .map(|id| HeaderCandidate::from_fragment(id, fragment))
            })
            .collect::<Vec<HeaderCandidate>>();
        if !candidates.is_empty() {
            return candidates;
        }

        // Can also match a bare page number; there is no way to tell the two apart here.
        let plain_text = page.plain_text();
        let fallback = self
            .standalone_number
            .captures(&plain_text)
            .and_then(|captures| captures.get(1))
            .map(|value| HeaderCandidate::sentinel(value.as_str()));

        if let Some(candidate) = &fallback {
            debug!(page = page.number, id = %candidate.id, "using standalone number header");
        }

        fallback.into_iter().collect()
    }
}
