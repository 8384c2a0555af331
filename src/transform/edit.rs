//! Text edits and conflict resolution
//!
//! Transformers emit edits in traversal order. Before they can be applied,
//! [`resolve`] orders them by end offset (descending) and merges every edit
//! that touches another one, so that the applier sees a list of disjoint
//! spans.

/// Ties between edits at the same offset are broken by ascending priority
pub mod priority {
    pub const USE_STRICT: i32 = -3;
    pub const HELPERS: i32 = -2;
    pub const SUPER_CALL: i32 = -1;
    pub const DEFAULT: i32 = 0;
    pub const ES_MODULE_MARKER: i32 = 0;
    pub const MEMBER_DECORATORS: i32 = 0;
    pub const EXPORT_HOIST: i32 = 1;
    pub const CLASS_DECORATORS: i32 = 1;
    pub const CLASS_WRAPPER_END: i32 = 2;
    pub const CLASS_EXPORT: i32 = 3;
}

/// Key shared by the edits of one import or alias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(pub u32);

/// What happens to the original text an edit replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Removal {
    /// Rewritten in every mode, e.g. an identifier that gains a qualifier
    Rewrite,
    /// Deleted in strip mode, kept as a comment in preserve mode
    Strip,
    /// Kept as a comment in every mode
    Comment,
}

/// A replacement of `[start, end)` by `text`; an insertion when the span
/// is empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub priority: i32,
    pub group: Option<GroupKey>,
    pub removal: Removal,
}

impl Edit {
    /// Insert text at an offset
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            text: text.into(),
            priority: priority::DEFAULT,
            group: None,
            removal: Removal::Rewrite,
        }
    }

    /// Remove a span with no runtime meaning
    pub fn remove(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            text: String::new(),
            priority: priority::DEFAULT,
            group: None,
            removal: Removal::Strip,
        }
    }

    /// Replace a span whose original text is dropped in preserve mode too
    pub fn rewrite(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            priority: priority::DEFAULT,
            group: None,
            removal: Removal::Rewrite,
        }
    }

    /// Replace a span, keeping the original as a comment in preserve mode
    pub fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            priority: priority::DEFAULT,
            group: None,
            removal: Removal::Strip,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_group(mut self, group: GroupKey) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_removal(mut self, removal: Removal) -> Self {
        self.removal = removal;
        self
    }

    pub fn is_insertion(&self) -> bool {
        self.start == self.end
    }
}

/// Two edits that partially overlap; the second was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOverlap {
    pub kept: (usize, usize),
    pub dropped: (usize, usize),
    pub dropped_text: String,
}

/// Disjoint edits ordered by descending end offset
#[derive(Debug, Clone, Default)]
pub struct ResolvedEdits {
    pub edits: Vec<Edit>,
    pub overlaps: Vec<EditOverlap>,
}

/// Join two fragments, collapsing the `;;` that would appear at the seam
pub fn join_fragments(left: &str, right: &str) -> String {
    let right = if left.trim_end().ends_with(';') {
        right.strip_prefix(';').unwrap_or(right)
    } else {
        right
    };
    let mut joined = String::with_capacity(left.len() + right.len());
    joined.push_str(left);
    joined.push_str(right);
    joined
}

/// A retained edit and the length of the text prepended to it so far
struct Retained {
    edit: Edit,
    prefix_len: usize,
}

impl Retained {
    fn prepend(&mut self, text: &str) {
        let (prefix, rest) = self.edit.text.split_at(self.prefix_len);
        let prefix = join_fragments(prefix, text);
        self.prefix_len = prefix.len();
        self.edit.text = join_fragments(&prefix, rest);
    }

    fn append(&mut self, text: &str) {
        self.edit.text = join_fragments(&self.edit.text, text);
    }
}

/// Sort and merge edits into a containment-free, disjoint list
pub fn resolve(mut edits: Vec<Edit>) -> ResolvedEdits {
    edits.sort_by(|a, b| b.end.cmp(&a.end).then(a.priority.cmp(&b.priority)));

    let mut retained: Vec<Retained> = Vec::with_capacity(edits.len());
    let mut overlaps = Vec::new();

    for edit in edits {
        let Some(prev) = retained.last_mut() else {
            retained.push(Retained {
                edit,
                prefix_len: 0,
            });
            continue;
        };
        let (p_start, p_end) = (prev.edit.start, prev.edit.end);

        if edit.start == p_start && edit.end == p_end {
            prev.append(&edit.text);
            prev.edit.removal = prev.edit.removal.max(edit.removal);
        } else if p_start <= edit.start && edit.end <= p_end {
            // Inside the previous edit
            if edit.is_insertion() && edit.start == p_start {
                prev.prepend(&edit.text);
            } else {
                prev.append(&edit.text);
            }
        } else if edit.start < p_start && edit.end == p_end {
            // Covers the previous edit, which ends at the same offset
            let inner = std::mem::replace(
                prev,
                Retained {
                    edit,
                    prefix_len: 0,
                },
            );
            prev.append(&inner.edit.text);
            prev.edit.removal = prev.edit.removal.max(inner.edit.removal);
        } else if edit.end == p_start && !edit.is_insertion() && p_start != p_end {
            let text = join_fragments(&edit.text, &prev.edit.text);
            prev.prefix_len = 0;
            prev.edit.start = edit.start;
            prev.edit.text = text;
            prev.edit.removal = prev.edit.removal.max(edit.removal);
        } else if edit.end <= p_start {
            retained.push(Retained {
                edit,
                prefix_len: 0,
            });
        } else {
            tracing::warn!(
                kept_start = p_start,
                kept_end = p_end,
                dropped_start = edit.start,
                dropped_end = edit.end,
                "dropping partially overlapping edit"
            );
            overlaps.push(EditOverlap {
                kept: (p_start, p_end),
                dropped: (edit.start, edit.end),
                dropped_text: edit.text,
            });
        }
    }

    ResolvedEdits {
        edits: retained.into_iter().map(|r| r.edit).collect(),
        overlaps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(resolved: &ResolvedEdits) -> Vec<(usize, usize, &str)> {
        resolved
            .edits
            .iter()
            .map(|e| (e.start, e.end, e.text.as_str()))
            .collect()
    }

    #[test]
    fn test_insertions_at_one_offset_follow_priority() {
        let resolved = resolve(vec![
            Edit::insert(0, "B").with_priority(1),
            Edit::insert(0, "A").with_priority(0),
        ]);
        assert_eq!(spans(&resolved), vec![(0, 0, "AB")]);
    }

    #[test]
    fn test_disjoint_edits_sorted_by_end_descending() {
        let resolved = resolve(vec![
            Edit::remove(0, 2),
            Edit::remove(5, 8),
            Edit::insert(3, "x"),
        ]);
        assert_eq!(spans(&resolved), vec![(5, 8, ""), (3, 3, "x"), (0, 2, "")]);
        assert!(resolved.overlaps.is_empty());
    }

    #[test]
    fn test_contained_edit_collapses_into_outer() {
        let resolved = resolve(vec![Edit::replace(0, 10, "outer"), Edit::rewrite(3, 4, "in")]);
        assert_eq!(spans(&resolved), vec![(0, 10, "outerin")]);
    }

    #[test]
    fn test_insertions_at_outer_start_keep_priority_order() {
        let resolved = resolve(vec![
            Edit::replace(4, 9, "X"),
            Edit::insert(4, "A").with_priority(0),
            Edit::insert(4, "B").with_priority(1),
            Edit::insert(9, "Z"),
        ]);
        assert_eq!(spans(&resolved), vec![(4, 9, "ABXZ")]);
    }

    #[test]
    fn test_outer_edit_absorbs_earlier_inner_with_same_end() {
        let resolved = resolve(vec![
            Edit::insert(10, "tail").with_priority(-1),
            Edit::replace(2, 10, "body"),
        ]);
        assert_eq!(spans(&resolved), vec![(2, 10, "bodytail")]);
    }

    #[test]
    fn test_adjacent_spans_concatenate_in_position_order() {
        let resolved = resolve(vec![Edit::replace(0, 3, "a"), Edit::replace(3, 6, "b")]);
        assert_eq!(spans(&resolved), vec![(0, 6, "ab")]);
    }

    #[test]
    fn test_partial_overlap_is_reported_and_dropped() {
        let resolved = resolve(vec![Edit::replace(0, 5, "a"), Edit::replace(3, 8, "b")]);
        assert_eq!(spans(&resolved), vec![(3, 8, "b")]);
        assert_eq!(
            resolved.overlaps,
            vec![EditOverlap {
                kept: (3, 8),
                dropped: (0, 5),
                dropped_text: "a".into(),
            }]
        );
    }

    #[test]
    fn test_no_partial_overlap_survives() {
        let edits = vec![
            Edit::replace(0, 20, ""),
            Edit::replace(2, 4, "x"),
            Edit::insert(20, ";a;"),
            Edit::replace(18, 25, "y"),
            Edit::insert(30, ";b;"),
            Edit::replace(28, 30, ""),
        ];
        let resolved = resolve(edits);
        for (i, a) in resolved.edits.iter().enumerate() {
            for b in &resolved.edits[i + 1..] {
                let disjoint = a.end <= b.start || b.end <= a.start;
                let nested = (a.start <= b.start && b.end <= a.end)
                    || (b.start <= a.start && a.end <= b.end);
                assert!(disjoint || nested, "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_join_collapses_seam_semicolons() {
        assert_eq!(join_fragments("a;", ";b;"), "a;b;");
        assert_eq!(join_fragments("a", ";b;"), "a;b;");
        assert_eq!(join_fragments("", ";b"), ";b");
    }
}
