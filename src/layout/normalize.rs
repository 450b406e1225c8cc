/// Repairs the apostrophe that text extraction renders as U+FFFD and collapses whitespace.
pub fn normalize_text(input: &str) -> String {
    input
        .replace('\u{FFFD}', "'")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}
