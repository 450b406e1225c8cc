use regex::Regex;

/// Target ids of every "read N" reference in `text`, in order of appearance.
pub fn extract_references(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|value| value.as_str().to_string())
        .collect()
}

/// Appends links not already present, keeping first-seen order.
pub fn merge_links<I>(target: &mut Vec<String>, links: I)
where
    I: IntoIterator<Item = String>,
{
    for link in links {
        if !target.contains(&link) {
            target.push(link);
        }
    }
}
