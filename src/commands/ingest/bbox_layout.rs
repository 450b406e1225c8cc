use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::model::{Fragment, Page};

/// Decodes a PDF into positioned blocks via poppler's `pdftotext -bbox-layout`.
pub fn extract_pages(pdf_path: &Path, max_pages_per_doc: Option<usize>) -> Result<Vec<Page>> {
    let mut command = Command::new("pdftotext");
    command
        .arg("-bbox-layout")
        .arg("-enc")
        .arg("UTF-8")
        .arg("-f")
        .arg("1");
    if let Some(max_pages) = max_pages_per_doc {
        command.arg("-l").arg(max_pages.to_string());
    }
    command.arg(pdf_path).arg("-");

    let output = command
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    let raw = String::from_utf8_lossy(&output.stdout).replace('\u{0000}', "");
    parse_bbox_layout(&raw)
        .with_context(|| format!("failed to parse bbox layout for {}", pdf_path.display()))
}

pub fn pdftotext_version() -> Option<String> {
    let output = Command::new("pdftotext").arg("-v").output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}

#[derive(Debug)]
struct BlockDraft {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    lines: Vec<String>,
}

#[derive(Debug, Default)]
struct PageDraft {
    fragments: Vec<Fragment>,
    lines: Vec<String>,
}

impl PageDraft {
    fn finish(self, number: usize) -> Page {
        let plain_text = self.lines.join("\n");
        Page::new(number, self.fragments).with_plain_text(plain_text)
    }
}

/// Block text is its lines joined by newlines, each line its words joined by spaces.
pub fn parse_bbox_layout(xml: &str) -> Result<Vec<Page>> {
    let mut reader = Reader::from_str(xml);
    let mut pages = Vec::new();
    let mut page: Option<PageDraft> = None;
    let mut block: Option<BlockDraft> = None;
    let mut line: Option<Vec<String>> = None;
    let mut word: Option<String> = None;

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("malformed xml near byte {}", reader.buffer_position()))?;

        match event {
            Event::Start(element) => match element.name().as_ref() {
                b"page" => page = Some(PageDraft::default()),
                b"block" if page.is_some() => block = Some(block_from_element(&element)?),
                b"line" if block.is_some() => line = Some(Vec::new()),
                b"word" if line.is_some() => word = Some(String::new()),
                _ => {}
            },
            Event::Empty(element) if element.name().as_ref() == b"page" => {
                pages.push(PageDraft::default().finish(pages.len() + 1));
            }
            Event::Text(text) => {
                if let Some(current) = word.as_mut() {
                    current.push_str(&text.unescape().context("invalid escaped text in word")?);
                }
            }
            Event::End(element) => match element.name().as_ref() {
                b"word" => {
                    if let (Some(current), Some(words)) = (word.take(), line.as_mut()) {
                        let trimmed = current.trim();
                        if !trimmed.is_empty() {
                            words.push(trimmed.to_string());
                        }
                    }
                }
                b"line" => {
                    if let (Some(words), Some(current)) = (line.take(), block.as_mut()) {
                        if !words.is_empty() {
                            current.lines.push(words.join(" "));
                        }
                    }
                }
                b"block" => {
                    if let (Some(finished), Some(current)) = (block.take(), page.as_mut()) {
                        if !finished.lines.is_empty() {
                            current.lines.extend(finished.lines.iter().cloned());
                            current.fragments.push(Fragment::new(
                                finished.lines.join("\n"),
                                finished.x0,
                                finished.y0,
                                finished.x1,
                                finished.y1,
                            ));
                        }
                    }
                }
                b"page" => {
                    if let Some(finished) = page.take() {
                        pages.push(finished.finish(pages.len() + 1));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if page.is_some() {
        bail!("bbox layout ended inside an unterminated page");
    }

    Ok(pages)
}

fn block_from_element(element: &BytesStart<'_>) -> Result<BlockDraft> {
    let mut x0 = None;
    let mut y0 = None;
    let mut x1 = None;
    let mut y1 = None;

    for attribute in element.attributes() {
        let attribute = attribute.context("invalid block attribute")?;
        let slot = match attribute.key.as_ref() {
            b"xMin" => &mut x0,
            b"yMin" => &mut y0,
            b"xMax" => &mut x1,
            b"yMax" => &mut y1,
            _ => continue,
        };
        let value = attribute
            .unescape_value()
            .context("invalid block attribute value")?;
        let parsed = value
            .trim()
            .parse::<f64>()
            .with_context(|| format!("invalid block coordinate: {value}"))?;
        *slot = Some(parsed);
    }

    match (x0, y0, x1, y1) {
        (Some(x0), Some(y0), Some(x1), Some(y1)) => Ok(BlockDraft {
            x0,
            y0,
            x1,
            y1,
            lines: Vec::new(),
        }),
        _ => bail!("block element is missing xMin/yMin/xMax/yMax"),
    }
}
