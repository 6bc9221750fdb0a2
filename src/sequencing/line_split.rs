//! Splitting of equal-length multi-line hunks into the individually updated lines.

use crate::core::model::DiffHunk;
use crate::oracle::StructuralDiff;

/// One single-line hunk per `update-node` action, in action order.
///
/// Update offsets are character offsets into the condition lines joined with
/// `\n`. Each action yields the enclosing condition line paired with the
/// consequent line at the same index, so a line touched by two actions is
/// emitted twice. Offsets outside the condition are ignored.
pub fn split_into_update_lines(hunk: &DiffHunk, structure: &StructuralDiff) -> Vec<DiffHunk> {
    let line_starts = line_starts(&hunk.condition);
    let mut pieces = Vec::new();

    for offset in structure.update_offsets() {
        let Some(index) = line_starts.iter().rposition(|&start| start <= offset) else {
            continue;
        };
        let line_end = line_starts[index] + hunk.condition[index].chars().count();
        if offset > line_end {
            continue;
        }
        let Some(after) = hunk.consequent.get(index) else {
            continue;
        };
        pieces.push(DiffHunk {
            condition: vec![hunk.condition[index].clone()],
            consequent: vec![after.clone()],
        });
    }

    pieces
}

/// Character offset at which each line starts in the `\n`-joined text.
fn line_starts(lines: &[String]) -> Vec<usize> {
    lines
        .iter()
        .scan(0usize, |next, line| {
            let start = *next;
            *next += line.chars().count() + 1;
            Some(start)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn updates(offsets: &[usize]) -> StructuralDiff {
        let actions: Vec<String> = offsets
            .iter()
            .map(|start| {
                format!(
                    r#"{{"action": "update-node", "tree": "identifier: x [{},{}]", "label": "y"}}"#,
                    start,
                    start + 1
                )
            })
            .collect();
        StructuralDiff::from_json(&format!(r#"{{"actions": [{}]}}"#, actions.join(","))).unwrap()
    }

    fn assert_hunk() -> DiffHunk {
        DiffHunk::new(
            [
                "ASSERT_EQ(expected, actual);",
                "ASSERT_EQ(expected2, actual2);",
                "ASSERT_EQ(expected3, actual3);",
            ],
            [
                "EXPECT_EQ(expected, actual);",
                "EXPECT_EQ(expected2, actual2);",
                "EXPECT_EQ(expected3, actual3);",
            ],
        )
    }

    #[test]
    fn locates_enclosing_lines_by_offset() {
        // Line starts: 0, 29, 60.
        let pieces = split_into_update_lines(&assert_hunk(), &updates(&[0, 61]));
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].condition, vec!["ASSERT_EQ(expected, actual);"]);
        assert_eq!(pieces[0].consequent, vec!["EXPECT_EQ(expected, actual);"]);
        assert_eq!(pieces[1].condition, vec!["ASSERT_EQ(expected3, actual3);"]);
    }

    #[test]
    fn every_update_action_emits_its_line_in_action_order() {
        let pieces = split_into_update_lines(&assert_hunk(), &updates(&[35, 2, 30, 0]));
        let firsts: Vec<_> = pieces.iter().map(|p| p.condition[0].as_str()).collect();
        assert_eq!(
            firsts,
            vec![
                "ASSERT_EQ(expected2, actual2);",
                "ASSERT_EQ(expected, actual);",
                "ASSERT_EQ(expected2, actual2);",
                "ASSERT_EQ(expected, actual);"
            ]
        );
    }

    #[test]
    fn two_updates_on_one_line_emit_two_pieces() {
        let hunk = DiffHunk::new(["foo(a)", "x = 1"], ["bar(b)", "x = 1"]);
        let pieces = split_into_update_lines(&hunk, &updates(&[0, 4]));
        assert_eq!(pieces.len(), 2);
        assert!(pieces
            .iter()
            .all(|p| p.condition == vec!["foo(a)"] && p.consequent == vec!["bar(b)"]));
    }

    #[test]
    fn offsets_past_the_condition_are_ignored() {
        assert!(split_into_update_lines(&assert_hunk(), &updates(&[500])).is_empty());
    }

    #[test]
    fn non_update_actions_do_not_split() {
        let structure = StructuralDiff::from_json(
            r#"{"actions": [{"action": "insert-node", "tree": "identifier: x [0,1]"}]}"#,
        )
        .unwrap();
        assert!(split_into_update_lines(&assert_hunk(), &structure).is_empty());
    }
}
