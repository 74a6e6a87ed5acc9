//! Three-way text merge.
//!
//! Uses the `diffy` crate to merge the changes made on the left and right
//! sides relative to their common ancestor. Hosts use it to pull
//! non-conflicting changes from one side into the other before the user edits
//! what is left.

use tracing::{debug, info};

/// The result of a three-way merge.
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// The merged text. Contains conflict markers if `has_conflicts` is true.
    pub content: String,
    pub has_conflicts: bool,
    pub conflicts: Vec<ConflictRegion>,
}

impl MergeResult {
    fn clean(content: &str) -> Self {
        Self {
            content: content.to_string(),
            has_conflicts: false,
            conflicts: Vec::new(),
        }
    }
}

/// Lines (1-indexed, inclusive) spanned by one conflict marker block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictRegion {
    pub start_line: usize,
    pub end_line: usize,
}

/// Stateless three-way merge engine.
pub struct TextMerger;

impl TextMerger {
    /// Merge `left` and `right` against `ancestor`.
    ///
    /// Always produces content. Overlapping changes are written as
    /// `<<<<<<<` / `|||||||` / `=======` / `>>>>>>>` blocks, left first.
    pub fn merge(ancestor: &str, left: &str, right: &str) -> MergeResult {
        if left == ancestor || left == right {
            debug!("left unchanged or identical to right, right wins");
            return MergeResult::clean(right);
        }
        if right == ancestor {
            debug!("right unchanged, left wins");
            return MergeResult::clean(left);
        }

        match diffy::merge(ancestor, left, right) {
            Ok(merged) => {
                info!("three-way merge clean");
                MergeResult::clean(&merged)
            }
            Err(conflicted) => {
                let conflicts = conflict_regions(&conflicted);
                info!(conflicts = conflicts.len(), "three-way merge has conflicts");
                MergeResult {
                    content: conflicted,
                    has_conflicts: true,
                    conflicts,
                }
            }
        }
    }

    /// Merge raw side bytes. Returns `None` if any side is not UTF-8.
    pub fn merge_bytes(ancestor: &[u8], left: &[u8], right: &[u8]) -> Option<MergeResult> {
        let ancestor = std::str::from_utf8(ancestor).ok()?;
        let left = std::str::from_utf8(left).ok()?;
        let right = std::str::from_utf8(right).ok()?;
        Some(Self::merge(ancestor, left, right))
    }
}

fn conflict_regions(text: &str) -> Vec<ConflictRegion> {
    let mut regions = Vec::new();
    let mut start = None;
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.starts_with("<<<<<<<") {
            start = Some(line_no);
        } else if line.starts_with(">>>>>>>") {
            if let Some(start_line) = start.take() {
                regions.push(ConflictRegion {
                    start_line,
                    end_line: line_no,
                });
            }
        }
    }
    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_sides() {
        let base = "line1\nline2\nline3\n";
        let result = TextMerger::merge(base, base, base);
        assert!(!result.has_conflicts);
        assert_eq!(result.content, base);
    }

    #[test]
    fn test_only_left_changed() {
        let base = "line1\nline2\nline3\n";
        let left = "line1\nmodified\nline3\n";
        let result = TextMerger::merge(base, left, base);
        assert!(!result.has_conflicts);
        assert_eq!(result.content, left);
    }

    #[test]
    fn test_only_right_changed() {
        let base = "line1\nline2\nline3\n";
        let right = "line1\nline2\nmodified\n";
        let result = TextMerger::merge(base, base, right);
        assert!(!result.has_conflicts);
        assert_eq!(result.content, right);
    }

    #[test]
    fn test_non_overlapping_changes() {
        let base = "line1\nline2\nline3\nline4\nline5\nline6\nline7\nline8\n";
        let left = "LINE1\nline2\nline3\nline4\nline5\nline6\nline7\nline8\n";
        let right = "line1\nline2\nline3\nline4\nline5\nline6\nline7\nLINE8\n";
        let result = TextMerger::merge(base, left, right);
        assert!(!result.has_conflicts);
        assert!(result.content.contains("LINE1"));
        assert!(result.content.contains("LINE8"));
    }

    #[test]
    fn test_conflicting_changes() {
        let base = "line1\noriginal\nline3\n";
        let left = "line1\nleft_version\nline3\n";
        let right = "line1\nright_version\nline3\n";
        let result = TextMerger::merge(base, left, right);
        assert!(result.has_conflicts);
        assert!(result.content.contains("<<<<<<<"));
        assert!(result.content.contains("left_version"));
        assert!(result.content.contains("right_version"));
        assert_eq!(result.conflicts.len(), 1);
        assert!(result.conflicts[0].start_line < result.conflicts[0].end_line);
    }

    #[test]
    fn test_merge_bytes_rejects_binary() {
        assert!(TextMerger::merge_bytes(b"a", &[0xff, 0xfe], b"a").is_none());
        let result = TextMerger::merge_bytes(b"a\n", b"a\n", b"b\n").unwrap();
        assert_eq!(result.content, "b\n");
    }

    #[test]
    fn test_conflict_regions() {
        let text = "a\n<<<<<<< ours\nx\n=======\ny\n>>>>>>> theirs\nb\n";
        assert_eq!(
            conflict_regions(text),
            vec![ConflictRegion {
                start_line: 2,
                end_line: 6
            }]
        );
    }
}
