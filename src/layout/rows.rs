use super::HeaderCandidate;

/// Headers sharing one horizontal band. `y` is the band's first (topmost) member.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub y: f64,
    pub headers: Vec<HeaderCandidate>,
}

/// Groups candidates into rows and returns them bottom-of-page first, which is the order
/// the assigner walks them in.
pub fn cluster_rows(mut candidates: Vec<HeaderCandidate>, tolerance: f64) -> Vec<Row> {
    candidates.sort_by(|a, b| a.y.total_cmp(&b.y));

    let mut rows: Vec<Row> = Vec::new();
    for candidate in candidates {
        match rows
            .iter_mut()
            .find(|row| (row.y - candidate.y).abs() < tolerance)
        {
            Some(row) => row.headers.push(candidate),
            None => rows.push(Row {
                y: candidate.y,
                headers: vec![candidate],
            }),
        }
    }

    rows.sort_by(|a, b| b.y.total_cmp(&a.y));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(id: &str, x_left: f64, y: f64) -> HeaderCandidate {
        HeaderCandidate {
            id: id.to_string(),
            x_left,
            x_right: x_left + 100.0,
            y,
        }
    }

    #[test]
    fn groups_by_first_member_and_orders_bottom_first() {
        let rows = cluster_rows(
            vec![
                header("140.3", 50.0, 460.0),
                header("140.2", 300.0, 40.0),
                header("140.1", 50.0, 28.0),
            ],
            30.0,
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].y, 460.0);
        assert_eq!(rows[1].y, 28.0);
        let top_ids = rows[1]
            .headers
            .iter()
            .map(|header| header.id.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(top_ids, vec!["140.1", "140.2"]);
    }

    #[test]
    fn tolerance_is_measured_from_the_row_anchor() {
        // 28 -> 50 is inside the band, 28 -> 70 is not even though 50 -> 70 would be.
        let rows = cluster_rows(
            vec![
                header("1.1", 0.0, 28.0),
                header("1.2", 0.0, 50.0),
                header("1.3", 0.0, 70.0),
            ],
            30.0,
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].headers[0].id, "1.3");
        assert_eq!(rows[1].headers.len(), 2);
    }

    #[test]
    fn every_candidate_lands_in_exactly_one_row() {
        let candidates = (0..20)
            .map(|index| {
                let x_left = (index % 3) as f64 * 200.0;
                header(&format!("9.{index}"), x_left, index as f64 * 17.0)
            })
            .collect::<Vec<HeaderCandidate>>();

        let rows = cluster_rows(candidates.clone(), 30.0);
        let mut seen = rows
            .iter()
            .flat_map(|row| row.headers.iter().map(|header| header.id.clone()))
            .collect::<Vec<String>>();
        seen.sort();
        let mut expected = candidates
            .into_iter()
            .map(|candidate| candidate.id)
            .collect::<Vec<String>>();
        expected.sort();

        assert_eq!(seen, expected);
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert!(cluster_rows(Vec::new(), 30.0).is_empty());
    }
}
