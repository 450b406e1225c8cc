use super::{ColumnAlignment, HeaderCandidate, ParseConfig, Row};
use crate::model::Fragment;

/// Picks the header a fragment belongs to.
///
/// Rows arrive bottom-first. The first row at or above the fragment (within `row_slack`)
/// owns it. With a `column_threshold` set, a distant closest header lets higher rows offer
/// one that lines up; if none does, the first row still wins. A fragment above every row
/// falls back to the topmost row. Ties go to the first header in the row.
///
/// Returns `None` only when there are no rows.
pub fn assign_fragment<'a>(
    fragment: &Fragment,
    rows: &'a [Row],
    config: &ParseConfig,
) -> Option<&'a HeaderCandidate> {
    let qualifying = rows
        .iter()
        .filter(|row| row.y <= fragment.y0 + config.row_slack)
        .collect::<Vec<&Row>>();

    if let Some(threshold) = config.column_threshold {
        for &row in &qualifying {
            if let Some((header, distance)) = nearest_header(row, fragment, config.alignment) {
                if distance <= threshold {
                    return Some(header);
                }
            }
        }
    }

    let row = qualifying.first().copied().or_else(|| rows.last())?;
    nearest_header(row, fragment, config.alignment).map(|(header, _)| header)
}

fn nearest_header<'a>(
    row: &'a Row,
    fragment: &Fragment,
    alignment: ColumnAlignment,
) -> Option<(&'a HeaderCandidate, f64)> {
    row.headers
        .iter()
        .map(|header| (header, horizontal_distance(header, fragment, alignment)))
        .min_by(|(_, left), (_, right)| left.total_cmp(right))
}

fn horizontal_distance(
    header: &HeaderCandidate,
    fragment: &Fragment,
    alignment: ColumnAlignment,
) -> f64 {
    match alignment {
        ColumnAlignment::LeftEdge => (header.x_left - fragment.x0).abs(),
        ColumnAlignment::Center => (header.x_center() - fragment.x_center()).abs(),
    }
}
