//! Applying resolved edits to the source text

use super::edit::{Edit, Removal};
use crate::options::RemovalMode;

enum Piece<'a> {
    Original(&'a str),
    Edited { original: &'a str, edit: &'a Edit },
}

/// Apply disjoint edits, ordered by descending end offset, to `source`
pub fn apply(source: &str, edits: &[Edit], mode: RemovalMode) -> String {
    let mut pieces = Vec::with_capacity(edits.len() * 2 + 1);
    let mut cursor = source.len();
    for edit in edits {
        let end = edit.end.min(cursor);
        let start = edit.start.min(end);
        if end < cursor {
            pieces.push(Piece::Original(&source[end..cursor]));
        }
        pieces.push(Piece::Edited {
            original: &source[start..end],
            edit,
        });
        cursor = start;
    }
    if cursor > 0 {
        pieces.push(Piece::Original(&source[..cursor]));
    }
    pieces.reverse();

    let extra: usize = edits.iter().map(|e| e.text.len() + 4).sum();
    let mut out = String::with_capacity(source.len() + extra);
    for piece in pieces {
        match piece {
            Piece::Original(text) => out.push_str(text),
            Piece::Edited { original, edit } => emit_edit(&mut out, original, edit, mode),
        }
    }
    out
}

fn emit_edit(out: &mut String, original: &str, edit: &Edit, mode: RemovalMode) {
    let terminated = {
        let before = out.trim_end();
        before.is_empty() || before.ends_with(';') || before.ends_with('{')
    };

    let comment = !original.is_empty()
        && match edit.removal {
            Removal::Comment => true,
            Removal::Strip => mode == RemovalMode::Preserve,
            Removal::Rewrite => false,
        };
    if comment {
        out.push_str("/*");
        out.push_str(&original.replace("*/", "*\\/"));
        out.push_str("*/");
    }

    let text = if terminated {
        edit.text.strip_prefix(';').unwrap_or(&edit.text)
    } else {
        &edit.text
    };
    out.push_str(text);

    if !comment {
        // Keep the line count of removed text
        let removed = original.matches('\n').count();
        let added = text.matches('\n').count();
        for _ in added..removed {
            out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::edit::resolve;
    use pretty_assertions::assert_eq;

    fn run(source: &str, edits: Vec<Edit>, mode: RemovalMode) -> String {
        let resolved = resolve(edits);
        apply(source, &resolved.edits, mode)
    }

    #[test]
    fn test_strip_removes_and_inserts() {
        let out = run(
            "let a: number = 1;",
            vec![Edit::remove(5, 13), Edit::insert(0, "/*x*/")],
            RemovalMode::Strip,
        );
        assert_eq!(out, "/*x*/let a = 1;");
    }

    #[test]
    fn test_strip_keeps_line_breaks() {
        let source = "interface A {\n  x: number;\n}\nlet a = 1;";
        let out = run(source, vec![Edit::remove(0, 28)], RemovalMode::Strip);
        assert_eq!(out, "\n\n\nlet a = 1;");
    }

    #[test]
    fn test_preserve_comments_out_and_defuses() {
        let source = "let a /* t */: T = 1;";
        let out = run(source, vec![Edit::remove(13, 16)], RemovalMode::Preserve);
        assert_eq!(out, "let a /* t *//*: T*/ = 1;");
        let nested = run("x /* c */ y", vec![Edit::remove(2, 9)], RemovalMode::Preserve);
        assert_eq!(nested, "x /*/* c *\\/*/ y");
    }

    #[test]
    fn test_rewrite_is_never_commented() {
        let out = run("f(a);", vec![Edit::rewrite(2, 3, "m_1.a")], RemovalMode::Preserve);
        assert_eq!(out, "f(m_1.a);");
    }

    #[test]
    fn test_comment_removal_in_strip_mode() {
        let out = run(
            "declare const x: number;\nx;",
            vec![Edit::remove(0, 24).with_removal(Removal::Comment)],
            RemovalMode::Strip,
        );
        assert_eq!(out, "/*declare const x: number;*/\nx;");
    }

    #[test]
    fn test_leading_terminator_dropped_after_semicolon() {
        let source = "function f() {}\nlet a = 1;";
        let out = run(
            source,
            vec![Edit::insert(15, ";exports.f = f;"), Edit::insert(26, ";exports.a = a;")],
            RemovalMode::Strip,
        );
        assert_eq!(out, "function f() {};exports.f = f;\nlet a = 1;exports.a = a;");
    }

    #[test]
    fn test_leading_terminator_dropped_at_file_start() {
        let out = run("a;", vec![Edit::insert(0, ";b;")], RemovalMode::Strip);
        assert_eq!(out, "b;a;");
    }

    #[test]
    fn test_original_terminators_untouched() {
        let source = "for (;;) {}";
        let out = run(source, vec![Edit::insert(11, ";x;")], RemovalMode::Strip);
        assert_eq!(out, "for (;;) {};x;");
    }
}
