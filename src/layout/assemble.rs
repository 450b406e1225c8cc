use super::{merge_links, normalize_text};
use crate::model::{BookMode, Database, Entry, EntryMap};

/// Merges `incoming` into `target`; text for an existing id is appended after what is
/// already there.
pub fn merge_entry_maps(target: &mut EntryMap, incoming: EntryMap) {
    for (id, entry) in incoming {
        match target.get_mut(&id) {
            Some(existing) => absorb_entry(existing, entry),
            None => {
                target.insert(id, entry);
            }
        }
    }
}

fn absorb_entry(existing: &mut Entry, incoming: Entry) {
    if !incoming.text.is_empty() {
        existing.text.push(' ');
        existing.text.push_str(&incoming.text);
    }
    merge_links(&mut existing.links, incoming.links);
}

/// Section ids survive only in decimal (`140.2`) or purely numeric (`9`) form.
pub fn is_section_id(id: &str) -> bool {
    id.contains('.') || (!id.is_empty() && id.chars().all(|character| character.is_ascii_digit()))
}

/// Accumulates per-document results in the order documents are folded in.
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    scenarios: EntryMap,
    sections: EntryMap,
}

#[derive(Debug)]
pub struct AssembledDatabase {
    pub database: Database,
    pub rejected_section_ids: Vec<String>,
}

impl DatabaseBuilder {
    pub fn fold_document(mut self, mode: BookMode, entries: EntryMap) -> Self {
        let target = match mode {
            BookMode::Scenario => &mut self.scenarios,
            BookMode::Section => &mut self.sections,
        };
        merge_entry_maps(target, entries);
        self
    }

    /// Normalizes accumulated text and drops section ids that are not numeric.
    pub fn finish(self) -> AssembledDatabase {
        let mut rejected_section_ids = Vec::new();
        let mut sections = EntryMap::new();
        for (id, entry) in self.sections {
            if is_section_id(&id) {
                sections.insert(id, finalize_entry(entry));
            } else {
                rejected_section_ids.push(id);
            }
        }

        let scenarios = self
            .scenarios
            .into_iter()
            .map(|(id, entry)| (id, finalize_entry(entry)))
            .collect();

        AssembledDatabase {
            database: Database {
                scenarios,
                sections,
            },
            rejected_section_ids,
        }
    }
}

fn finalize_entry(entry: Entry) -> Entry {
    Entry {
        text: normalize_text(&entry.text),
        links: entry.links,
    }
}
