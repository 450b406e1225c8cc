use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use super::bbox_layout::{extract_pages, pdftotext_version};
use crate::cli::IngestArgs;
use crate::commands::inventory::{DiscoveredBook, discover_books};
use crate::layout::{ColumnAlignment, DatabaseBuilder, PageParser};
use crate::model::{
    DocumentRecord, EntryMap, IngestCounts, IngestRunManifest, Page, ToolVersions,
};
use crate::util::{now_utc_string, sha256_file, utc_compact_string, write_json_pretty};

pub fn run(args: IngestArgs) -> Result<()> {
    run_with_decoder(&args, extract_pages)
}

/// Same as [`run`] with the document decoder swapped out; tests use this to avoid poppler.
pub(super) fn run_with_decoder<D>(args: &IngestArgs, decode: D) -> Result<()>
where
    D: Fn(&Path, Option<usize>) -> Result<Vec<Page>>,
{
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let parser = PageParser::new(args.parse_config())?;
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        args.output
            .with_file_name(format!("ingest_run_{}.json", utc_compact_string(started_ts)))
    });

    info!(
        source_dir = %args.source_dir.display(),
        run_id = %run_id,
        alignment = parser.config().alignment.as_str(),
        "starting ingest"
    );

    let books = discover_books(&args.source_dir, &args.scenario_pattern, &args.section_pattern)?;

    let mut builder = DatabaseBuilder::default();
    let mut documents = Vec::with_capacity(books.len());
    let mut warnings = Vec::new();
    let mut page_count = 0usize;

    for book in &books {
        match ingest_book(&parser, book, args.max_pages_per_doc, &decode) {
            Ok(parsed) => {
                info!(
                    filename = %book.filename,
                    mode = book.mode.as_str(),
                    pages = parsed.page_count,
                    entries = parsed.entries.len(),
                    "parsed book"
                );
                page_count += parsed.page_count;
                documents.push(DocumentRecord {
                    filename: book.filename.clone(),
                    mode: book.mode,
                    status: "processed".to_string(),
                    sha256: Some(parsed.sha256),
                    page_count: parsed.page_count,
                    entries_touched: parsed.entries.len(),
                    failure_reason: None,
                });
                builder = builder.fold_document(book.mode, parsed.entries);
            }
            Err(error) => {
                let reason = format!("{error:#}");
                warn!(path = %book.path.display(), error = %reason, "skipping unreadable book");
                warnings.push(format!("skipped {}: {}", book.path.display(), reason));
                documents.push(DocumentRecord {
                    filename: book.filename.clone(),
                    mode: book.mode,
                    status: "skipped".to_string(),
                    sha256: None,
                    page_count: 0,
                    entries_touched: 0,
                    failure_reason: Some(reason),
                });
            }
        }
    }

    let assembled = builder.finish();
    if !assembled.rejected_section_ids.is_empty() {
        warn!(
            count = assembled.rejected_section_ids.len(),
            ids = ?assembled.rejected_section_ids,
            "dropped non-numeric section ids"
        );
    }

    write_json_pretty(&args.output, &assembled.database)
        .with_context(|| format!("failed to write database {}", args.output.display()))?;
    info!(path = %args.output.display(), "wrote database");

    let processed_document_count = documents
        .iter()
        .filter(|document| document.status == "processed")
        .count();
    let counts = IngestCounts {
        document_count: documents.len(),
        processed_document_count,
        skipped_document_count: documents.len() - processed_document_count,
        page_count,
        scenario_count: assembled.database.scenarios.len(),
        section_count: assembled.database.sections.len(),
        sections_filtered_out: assembled.rejected_section_ids.len(),
        link_count: assembled.database.link_count(),
    };

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_ingest_command(args),
        output_path: args.output.display().to_string(),
        config: parser.config().clone(),
        tool_versions: ToolVersions {
            pdftotext: pdftotext_version(),
        },
        counts,
        documents,
        rejected_section_ids: assembled.rejected_section_ids,
        warnings,
    };

    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote ingest run manifest");
    info!(
        scenarios = manifest.counts.scenario_count,
        sections = manifest.counts.section_count,
        skipped = manifest.counts.skipped_document_count,
        "ingest completed"
    );

    Ok(())
}

#[derive(Debug)]
struct ParsedBook {
    sha256: String,
    page_count: usize,
    entries: EntryMap,
}

fn ingest_book<D>(
    parser: &PageParser,
    book: &DiscoveredBook,
    max_pages_per_doc: Option<usize>,
    decode: &D,
) -> Result<ParsedBook>
where
    D: Fn(&Path, Option<usize>) -> Result<Vec<Page>>,
{
    let sha256 = sha256_file(&book.path)?;
    let pages = decode(&book.path, max_pages_per_doc)?;
    let entries = parser.parse_document(book.mode, &pages);

    Ok(ParsedBook {
        sha256,
        page_count: pages.len(),
        entries,
    })
}

pub(super) fn render_ingest_command(args: &IngestArgs) -> String {
    let mut command = vec![
        "fhbooks".to_string(),
        "ingest".to_string(),
        "--source-dir".to_string(),
        args.source_dir.display().to_string(),
        "--scenario-pattern".to_string(),
        args.scenario_pattern.clone(),
        "--section-pattern".to_string(),
        args.section_pattern.clone(),
        "--output".to_string(),
        args.output.display().to_string(),
    ];

    if let Some(path) = &args.manifest_path {
        command.push("--manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(max_pages) = args.max_pages_per_doc {
        command.push("--max-pages-per-doc".to_string());
        command.push(max_pages.to_string());
    }
    command.push("--row-tolerance".to_string());
    command.push(args.row_tolerance.to_string());
    command.push("--row-slack".to_string());
    command.push(args.row_slack.to_string());
    if let Some(threshold) = args.column_threshold {
        command.push("--column-threshold".to_string());
        command.push(threshold.to_string());
    }
    if args.alignment != ColumnAlignment::LeftEdge {
        command.push("--alignment".to_string());
        command.push(args.alignment.as_str().to_string());
    }

    command.join(" ")
}
