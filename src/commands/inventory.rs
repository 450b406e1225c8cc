use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::InventoryArgs;
use crate::model::{BookFileEntry, BookInventoryManifest, BookMode};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredBook {
    pub path: PathBuf,
    pub filename: String,
    pub mode: BookMode,
}

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.source_dir, &args.scenario_pattern, &args.section_pattern)?;

    if args.dry_run {
        for book in &manifest.books {
            info!(
                filename = %book.filename,
                mode = book.mode.as_str(),
                sha256 = %book.sha256,
                "book"
            );
        }
        info!(
            book_count = manifest.book_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.source_dir.join("book_inventory.json"));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(book_count = manifest.book_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(
    source_dir: &Path,
    scenario_pattern: &str,
    section_pattern: &str,
) -> Result<BookInventoryManifest> {
    let books = discover_books(source_dir, scenario_pattern, section_pattern)?
        .into_iter()
        .map(|book| {
            Ok(BookFileEntry {
                sha256: sha256_file(&book.path)?,
                filename: book.filename,
                mode: book.mode,
            })
        })
        .collect::<Result<Vec<BookFileEntry>>>()?;

    Ok(BookInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: source_dir.display().to_string(),
        scenario_pattern: scenario_pattern.to_string(),
        section_pattern: section_pattern.to_string(),
        book_count: books.len(),
        books,
    })
}

/// Scenario books first, then section books, each set in lexicographic path order.
pub fn discover_books(
    source_dir: &Path,
    scenario_pattern: &str,
    section_pattern: &str,
) -> Result<Vec<DiscoveredBook>> {
    let mut books = Vec::new();
    for (mode, pattern) in [
        (BookMode::Scenario, scenario_pattern),
        (BookMode::Section, section_pattern),
    ] {
        let mut paths = glob_files(source_dir, pattern)?;
        paths.sort();

        for path in paths {
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .with_context(|| format!("path has no filename: {}", path.display()))?;
            books.push(DiscoveredBook {
                path,
                filename,
                mode,
            });
        }
    }

    if books.is_empty() {
        bail!(
            "no books matching '{}' or '{}' found in {}",
            scenario_pattern,
            section_pattern,
            source_dir.display()
        );
    }

    Ok(books)
}

fn glob_files(source_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full_pattern = source_dir.join(pattern);
    let full_pattern = full_pattern
        .to_str()
        .with_context(|| format!("invalid UTF-8 pattern: {}", full_pattern.display()))?;

    let mut paths = Vec::new();
    for entry in glob::glob(full_pattern)
        .with_context(|| format!("invalid glob pattern: {full_pattern}"))?
    {
        let path = entry.context("failed to read glob entry")?;
        if path.is_file() {
            paths.push(path);
        }
    }

    Ok(paths)
}
