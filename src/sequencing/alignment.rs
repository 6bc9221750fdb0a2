//! Longest-matching-block alignment producing equal/replace/delete/insert opcodes.
//!
//! The matcher finds the longest contiguous matching block, then recurses on
//! the pieces to its left and right. Among equally long blocks the one starting
//! earliest in `a` (then earliest in `b`) wins, which keeps the edit script
//! deterministic. For long right-hand sequences (200+ elements) elements that
//! make up more than 1% of it are not used to seed matches, only to extend them.

use std::hash::Hash;

use ahash::{AHashMap, AHashSet};

const AUTOJUNK_MIN_LEN: usize = 200;

/// Kind of an edit-script span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpTag {
    /// `a[a_start..a_end] == b[b_start..b_end]`
    Equal,
    /// `a[a_start..a_end]` is replaced by `b[b_start..b_end]`
    Replace,
    /// `a[a_start..a_end]` is removed
    Delete,
    /// `b[b_start..b_end]` is inserted
    Insert,
}

/// One span of the edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode {
    /// Span kind
    pub tag: OpTag,
    /// Start in the left sequence
    pub a_start: usize,
    /// End in the left sequence
    pub a_end: usize,
    /// Start in the right sequence
    pub b_start: usize,
    /// End in the right sequence
    pub b_end: usize,
}

/// A run `a[a..a + size] == b[b..b + size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Block {
    a: usize,
    b: usize,
    size: usize,
}

/// Aligns two sequences.
pub struct SequenceMatcher<'s, T> {
    a: &'s [T],
    b: &'s [T],
    b_index: AHashMap<&'s T, Vec<usize>>,
}

impl<'s, T: Eq + Hash> SequenceMatcher<'s, T> {
    /// Index `b` for matching against `a`.
    pub fn new(a: &'s [T], b: &'s [T]) -> Self {
        let mut b_index: AHashMap<&T, Vec<usize>> = AHashMap::new();
        for (position, element) in b.iter().enumerate() {
            b_index.entry(element).or_default().push(position);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            let popular: AHashSet<&T> = b_index
                .iter()
                .filter(|(_, positions)| positions.len() > limit)
                .map(|(element, _)| *element)
                .collect();
            b_index.retain(|element, _| !popular.contains(element));
        }

        Self { a, b, b_index }
    }

    fn longest_match(&self, a_lo: usize, a_hi: usize, b_lo: usize, b_hi: usize) -> Block {
        let mut best = Block {
            a: a_lo,
            b: b_lo,
            size: 0,
        };
        let mut run_ending_at: AHashMap<usize, usize> = AHashMap::new();

        for i in a_lo..a_hi {
            let mut next_runs = AHashMap::new();
            if let Some(positions) = self.b_index.get(&self.a[i]) {
                for &j in positions {
                    if j < b_lo {
                        continue;
                    }
                    if j >= b_hi {
                        break;
                    }
                    let previous = j
                        .checked_sub(1)
                        .and_then(|p| run_ending_at.get(&p))
                        .copied()
                        .unwrap_or(0);
                    let size = previous + 1;
                    next_runs.insert(j, size);
                    if size > best.size {
                        best = Block {
                            a: i + 1 - size,
                            b: j + 1 - size,
                            size,
                        };
                    }
                }
            }
            run_ending_at = next_runs;
        }

        while best.a > a_lo && best.b > b_lo && self.a[best.a - 1] == self.b[best.b - 1] {
            best.a -= 1;
            best.b -= 1;
            best.size += 1;
        }
        while best.a + best.size < a_hi
            && best.b + best.size < b_hi
            && self.a[best.a + best.size] == self.b[best.b + best.size]
        {
            best.size += 1;
        }

        best
    }

    fn matching_blocks(&self) -> Vec<Block> {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();
        while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
            let block = self.longest_match(a_lo, a_hi, b_lo, b_hi);
            if block.size == 0 {
                continue;
            }
            if a_lo < block.a && b_lo < block.b {
                pending.push((a_lo, block.a, b_lo, block.b));
            }
            if block.a + block.size < a_hi && block.b + block.size < b_hi {
                pending.push((block.a + block.size, a_hi, block.b + block.size, b_hi));
            }
            blocks.push(block);
        }
        blocks.sort();

        let mut collapsed: Vec<Block> = Vec::with_capacity(blocks.len() + 1);
        for block in blocks {
            match collapsed.last_mut() {
                Some(last) if last.a + last.size == block.a && last.b + last.size == block.b => {
                    last.size += block.size;
                }
                _ => collapsed.push(block),
            }
        }
        collapsed.push(Block {
            a: self.a.len(),
            b: self.b.len(),
            size: 0,
        });
        collapsed
    }

    /// Edit script turning `a` into `b`.
    pub fn opcodes(&self) -> Vec<Opcode> {
        let mut opcodes = Vec::new();
        let (mut i, mut j) = (0, 0);
        for block in self.matching_blocks() {
            let tag = match (i < block.a, j < block.b) {
                (true, true) => Some(OpTag::Replace),
                (true, false) => Some(OpTag::Delete),
                (false, true) => Some(OpTag::Insert),
                (false, false) => None,
            };
            if let Some(tag) = tag {
                opcodes.push(Opcode {
                    tag,
                    a_start: i,
                    a_end: block.a,
                    b_start: j,
                    b_end: block.b,
                });
            }
            i = block.a + block.size;
            j = block.b + block.size;
            if block.size > 0 {
                opcodes.push(Opcode {
                    tag: OpTag::Equal,
                    a_start: block.a,
                    a_end: i,
                    b_start: block.b,
                    b_end: j,
                });
            }
        }
        opcodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(a: &[&str], b: &[&str]) -> Vec<(OpTag, usize, usize, usize, usize)> {
        SequenceMatcher::new(a, b)
            .opcodes()
            .into_iter()
            .map(|op| (op.tag, op.a_start, op.a_end, op.b_start, op.b_end))
            .collect()
    }

    #[test]
    fn subscript_to_get_call() {
        let a = ["i", "=", "dic", "[", "STRING", "]"];
        let b = ["i", "=", "dic", ".", "get", "(", "STRING", ")"];
        assert_eq!(
            tags(&a, &b),
            vec![
                (OpTag::Equal, 0, 3, 0, 3),
                (OpTag::Replace, 3, 4, 3, 6),
                (OpTag::Equal, 4, 5, 6, 7),
                (OpTag::Replace, 5, 6, 7, 8),
            ]
        );
    }

    #[test]
    fn pure_insert_and_delete() {
        assert_eq!(
            tags(&["a", "c"], &["a", "b", "c"]),
            vec![
                (OpTag::Equal, 0, 1, 0, 1),
                (OpTag::Insert, 1, 1, 1, 2),
                (OpTag::Equal, 1, 2, 2, 3),
            ]
        );
        assert_eq!(
            tags(&["a", "b"], &["a"]),
            vec![(OpTag::Equal, 0, 1, 0, 1), (OpTag::Delete, 1, 2, 1, 1)]
        );
    }

    #[test]
    fn identical_and_empty_inputs() {
        assert_eq!(tags(&["x", "y"], &["x", "y"]), vec![(OpTag::Equal, 0, 2, 0, 2)]);
        assert!(tags(&[], &[]).is_empty());
        assert_eq!(tags(&[], &["x"]), vec![(OpTag::Insert, 0, 0, 0, 1)]);
    }

    #[test]
    fn earliest_longest_block_wins() {
        // "ab" occurs twice in b; the earliest occurrence anchors the match.
        assert_eq!(
            tags(&["a", "b"], &["a", "b", "x", "a", "b"]),
            vec![(OpTag::Equal, 0, 2, 0, 2), (OpTag::Insert, 2, 2, 2, 5)]
        );
    }

    #[test]
    fn opcodes_cover_both_sequences() {
        let a: Vec<u32> = (0..300).map(|n| n % 7).collect();
        let b: Vec<u32> = (0..280).map(|n| (n * 3) % 7).collect();
        let ops = SequenceMatcher::new(&a, &b).opcodes();
        let mut expected_a = 0;
        let mut expected_b = 0;
        for op in &ops {
            assert_eq!(op.a_start, expected_a);
            assert_eq!(op.b_start, expected_b);
            if op.tag == OpTag::Equal {
                assert_eq!(a[op.a_start..op.a_end], b[op.b_start..op.b_end]);
            }
            expected_a = op.a_end;
            expected_b = op.b_end;
        }
        assert_eq!((expected_a, expected_b), (a.len(), b.len()));
    }
}
