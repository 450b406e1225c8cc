use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use super::bbox_layout::parse_bbox_layout;
use super::run::{render_ingest_command, run_with_decoder};
use crate::cli::IngestArgs;
use crate::layout::ColumnAlignment;
use crate::model::{Database, Fragment, Page};

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> T {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

const SAMPLE_BBOX_LAYOUT: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<title></title>
<meta name="Producer" content="Adobe PDF Library"/>
<meta http-equiv="Content-Type" content="text/html; charset=UTF-8"/>
</head>
<body>
<doc>
  <page width="612.000000" height="792.000000">
    <flow>
      <block xMin="50.000000" yMin="28.500000" xMax="250.000000" yMax="44.000000">
        <line xMin="50.000000" yMin="28.500000" xMax="250.000000" yMax="44.000000">
          <word xMin="50.000000" yMin="28.500000" xMax="80.000000" yMax="44.000000">140.1</word>
          <word xMin="82.000000" yMin="28.500000" xMax="90.000000" yMax="44.000000">&#8226;</word>
          <word xMin="92.000000" yMin="28.500000" xMax="250.000000" yMax="44.000000">Lustrous</word>
        </line>
      </block>
      <block xMin="52.000000" yMin="60.000000" xMax="260.000000" yMax="100.000000">
        <line xMin="52.000000" yMin="60.000000" xMax="260.000000" yMax="75.000000">
          <word xMin="52.000000" yMin="60.000000" xMax="70.000000" yMax="75.000000">Rocks</word>
          <word xMin="72.000000" yMin="60.000000" xMax="90.000000" yMax="75.000000">&amp;</word>
          <word xMin="92.000000" yMin="60.000000" xMax="120.000000" yMax="75.000000">bones</word>
        </line>
        <line xMin="52.000000" yMin="80.000000" xMax="260.000000" yMax="100.000000">
          <word xMin="52.000000" yMin="80.000000" xMax="70.000000" yMax="100.000000">read</word>
          <word xMin="72.000000" yMin="80.000000" xMax="90.000000" yMax="100.000000">12</word>
        </line>
      </block>
    </flow>
  </page>
  <page width="612.000000" height="792.000000">
  </page>
</doc>
</body>
</html>
"#;

#[test]
fn bbox_layout_blocks_become_fragments() {
    let pages = parse_bbox_layout(SAMPLE_BBOX_LAYOUT).unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].number, 1);
    assert_eq!(
        pages[0].fragments,
        vec![
            Fragment::new("140.1 \u{2022} Lustrous", 50.0, 28.5, 250.0, 44.0),
            Fragment::new("Rocks & bones\nread 12", 52.0, 60.0, 260.0, 100.0),
        ]
    );
    assert_eq!(
        pages[0].plain_text.as_deref(),
        Some("140.1 \u{2022} Lustrous\nRocks & bones\nread 12")
    );

    assert_eq!(pages[1].number, 2);
    assert!(pages[1].fragments.is_empty());
    assert_eq!(pages[1].plain_text.as_deref(), Some(""));
}

#[test]
fn bbox_layout_rejects_blocks_without_geometry() {
    let xml = r#"<doc><page><flow><block xMin="1" yMin="2"><line><word>x</word></line></block></flow></page></doc>"#;
    assert!(parse_bbox_layout(xml).is_err());
}

#[test]
fn bbox_layout_rejects_truncated_documents() {
    let xml = r#"<doc><page><flow><block xMin="1" yMin="2" xMax="3" yMax="4"><line><word>x</word>"#;
    assert!(parse_bbox_layout(xml).is_err());
}

fn ingest_args(source_dir: &Path, output: PathBuf) -> IngestArgs {
    IngestArgs {
        source_dir: source_dir.to_path_buf(),
        scenario_pattern: "fh-scenario-book-*.pdf".to_string(),
        section_pattern: "fh-section-book-*.pdf".to_string(),
        manifest_path: Some(source_dir.join("manifest.json")),
        output,
        max_pages_per_doc: None,
        row_tolerance: 30.0,
        row_slack: 10.0,
        column_threshold: None,
        alignment: ColumnAlignment::LeftEdge,
    }
}

fn fake_decoder(path: &Path, _max_pages: Option<usize>) -> Result<Vec<Page>> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let block = |text: &str, x0: f64, y0: f64| Fragment::new(text, x0, y0, x0 + 200.0, y0 + 20.0);

    match name.as_str() {
        "fh-scenario-book-1.pdf" => Ok(vec![Page::new(
            1,
            vec![
                block("1 \u{2022} Black Ice and a cold wind", 40.0, 30.0),
                block("The road north is treacherous. Read 140.1", 40.0, 80.0),
            ],
        )]),
        "fh-section-book-1.pdf" => Ok(vec![
            Page::new(
                1,
                vec![
                    block("140.1 \u{2022} Lustrous Pit", 50.0, 28.0),
                    block("The walls glitter with frost and old bones.", 52.0, 70.0),
                ],
            ),
            Page::new(
                2,
                vec![
                    block("140.1", 50.0, 28.0),
                    block("You climb out of the pit at last, read 1", 52.0, 70.0),
                ],
            ),
        ]),
        _ => bail!("corrupt document"),
    }
}

#[test]
fn ingest_folds_books_and_skips_unreadable_ones() {
    let dir = tempfile::tempdir().unwrap();
    for name in [
        "fh-scenario-book-1.pdf",
        "fh-section-book-1.pdf",
        "fh-section-book-2.pdf",
    ] {
        fs::write(dir.path().join(name), b"%PDF-1.7").unwrap();
    }
    let output = dir.path().join("out").join("frosthaven_data.json");
    let args = ingest_args(dir.path(), output.clone());

    run_with_decoder(&args, fake_decoder).unwrap();

    let database: Database = read_json(&output);
    assert_eq!(
        database.scenarios["1"].text,
        "1 \u{2022} Black Ice and a cold wind The road north is treacherous. Read 140.1"
    );
    assert_eq!(database.scenarios["1"].links, vec!["140.1"]);
    assert_eq!(
        database.sections["140.1"].text,
        "140.1 \u{2022} Lustrous Pit The walls glitter with frost and old bones. \
         You climb out of the pit at last, read 1"
    );
    assert_eq!(database.sections["140.1"].links, vec!["1"]);

    let manifest: serde_json::Value = read_json(&dir.path().join("manifest.json"));
    assert_eq!(manifest["counts"]["document_count"], 3);
    assert_eq!(manifest["counts"]["skipped_document_count"], 1);
    assert_eq!(manifest["documents"][2]["status"], "skipped");
    assert_eq!(manifest["config"]["alignment"], "left-edge");
    assert!(manifest["config"]["column_threshold"].is_null());
    assert_eq!(manifest["warnings"].as_array().map(Vec::len), Some(1));
}

#[test]
fn ingest_output_is_stable_under_reserialization() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("fh-section-book-1.pdf"), b"%PDF-1.7").unwrap();
    let output = dir.path().join("frosthaven_data.json");

    run_with_decoder(&ingest_args(dir.path(), output.clone()), fake_decoder).unwrap();

    let written = fs::read(&output).unwrap();
    let database: Database = read_json(&output);
    assert_eq!(crate::util::to_json_pretty_bytes(&database).unwrap(), written);
}

#[test]
fn failed_database_write_aborts_before_the_manifest() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("fh-section-book-1.pdf"), b"%PDF-1.7").unwrap();
    let blocker = dir.path().join("not-a-directory");
    fs::write(&blocker, b"plain file").unwrap();
    let args = ingest_args(dir.path(), blocker.join("frosthaven_data.json"));

    let error = run_with_decoder(&args, fake_decoder).unwrap_err();

    assert!(format!("{error:#}").contains("failed to write database"));
    assert!(!dir.path().join("manifest.json").exists());
}

#[test]
fn render_ingest_command_includes_optional_settings_only_when_set() {
    let mut args = ingest_args(Path::new("books"), PathBuf::from("frosthaven_data.json"));
    args.manifest_path = None;

    let rendered = render_ingest_command(&args);
    assert_eq!(
        rendered,
        "fhbooks ingest --source-dir books --scenario-pattern fh-scenario-book-*.pdf \
         --section-pattern fh-section-book-*.pdf --output frosthaven_data.json \
         --row-tolerance 30 --row-slack 10"
    );

    args.alignment = ColumnAlignment::Center;
    args.max_pages_per_doc = Some(4);
    args.column_threshold = Some(150.0);
    let rendered = render_ingest_command(&args);
    assert!(rendered.contains("--max-pages-per-doc 4"));
    assert!(rendered.contains("--column-threshold 150 --alignment center"));
    assert!(rendered.ends_with("--alignment center"));
}
