use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::{BlocksArgs, FindArgs};
use crate::commands::ingest::extract_pages;
use crate::layout::{PageParser, ParseConfig};

const BLOCK_PREVIEW_CHARS: usize = 100;
const PAGE_PREVIEW_CHARS: usize = 500;

pub fn run_blocks(args: BlocksArgs) -> Result<()> {
    if args.page == 0 {
        bail!("page numbers start at 1");
    }

    let pages = extract_pages(&args.pdf, Some(args.page))?;
    let Some(page) = pages.get(args.page - 1) else {
        bail!("{} has only {} pages", args.pdf.display(), pages.len());
    };

    let parser = PageParser::new(ParseConfig::default())?;
    for (index, fragment) in page.fragments.iter().enumerate() {
        let scenario_header = parser.scenario_header_id(&fragment.text);
        let section_header = parser.section_header_id(&fragment.text);
        info!(
            block = index,
            x0 = fragment.x0,
            y0 = fragment.y0,
            x1 = fragment.x1,
            y1 = fragment.y1,
            scenario_header = scenario_header.as_deref().unwrap_or(""),
            section_header = section_header.as_deref().unwrap_or(""),
            text = %preview(&fragment.text.replace('\n', " "), BLOCK_PREVIEW_CHARS),
            "block"
        );
    }

    info!(page = page.number, blocks = page.fragments.len(), "listed page blocks");
    Ok(())
}

pub fn run_find(args: FindArgs) -> Result<()> {
    let pages = extract_pages(&args.pdf, None)?;

    let mut hits = 0usize;
    for page in &pages {
        let text = page.plain_text();
        if text.contains(&args.term) {
            hits += 1;
            info!(
                page = page.number,
                preview = %preview(&text, PAGE_PREVIEW_CHARS),
                "found term"
            );
        }
    }

    if hits == 0 {
        warn!(term = %args.term, pdf = %args.pdf.display(), "term not found");
    } else {
        info!(term = %args.term, pages = hits, "search completed");
    }
    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
