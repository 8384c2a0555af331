//! Edit resolution and application through the public transform API

use detype::transform::edit::priority;
use detype::transform::{apply, resolve, Edit};
use detype::RemovalMode;
use pretty_assertions::assert_eq;

fn run(source: &str, edits: Vec<Edit>) -> String {
    let resolved = resolve(edits);
    assert!(resolved.overlaps.is_empty(), "{:?}", resolved.overlaps);
    apply(source, &resolved.edits, RemovalMode::Strip)
}

mod insertion_order {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_two_insertions_at_one_offset() {
        let source = "x;";
        let forward = run(
            source,
            vec![Edit::insert(0, "A;"), Edit::insert(0, "B;").with_priority(1)],
        );
        let backward = run(
            source,
            vec![Edit::insert(0, "B;").with_priority(1), Edit::insert(0, "A;")],
        );
        assert_eq!(forward, "A;B;x;");
        assert_eq!(backward, forward);
    }

    #[test]
    fn test_preamble_priorities() {
        let source = "let a = 1;";
        let out = run(
            source,
            vec![
                Edit::insert(0, "exports.a = void 0;\n").with_priority(priority::EXPORT_HOIST),
                Edit::insert(0, "marker;\n").with_priority(priority::ES_MODULE_MARKER),
                Edit::insert(0, "\"use strict\";\n").with_priority(priority::USE_STRICT),
                Edit::insert(0, "helpers;\n").with_priority(priority::HELPERS),
            ],
        );
        assert_eq!(
            out,
            "\"use strict\";\nhelpers;\nmarker;\nexports.a = void 0;\nlet a = 1;"
        );
    }

    #[test]
    fn test_class_epilogue_order() {
        let source = "class C {}";
        let out = run(
            source,
            vec![
                Edit::insert(10, " exports.C = C;").with_priority(priority::CLASS_EXPORT),
                Edit::insert(10, " return C;").with_priority(priority::CLASS_WRAPPER_END),
                Edit::insert(10, " C = d(C);").with_priority(priority::CLASS_DECORATORS),
                Edit::insert(10, " m(C);").with_priority(priority::MEMBER_DECORATORS),
            ],
        );
        assert_eq!(out, "class C {} m(C); C = d(C); return C; exports.C = C;");
    }
}

mod removals {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_removal_inside_replacement_is_absorbed() {
        let source = "enum E { A }";
        let out = run(
            source,
            vec![Edit::replace(0, 12, "var E;"), Edit::remove(9, 10)],
        );
        assert_eq!(out, "var E;");
    }

    #[test]
    fn test_partial_overlap_is_reported() {
        let resolved = resolve(vec![Edit::replace(0, 6, "a"), Edit::replace(4, 9, "b")]);
        assert_eq!(resolved.edits.len(), 1);
        assert_eq!(resolved.overlaps.len(), 1);
        assert_eq!(resolved.overlaps[0].dropped, (0, 6));
    }

    #[test]
    fn test_preserve_mode_keeps_removed_text() {
        let resolved = resolve(vec![Edit::remove(5, 13)]);
        let out = apply("let a: number = 1;", &resolved.edits, RemovalMode::Preserve);
        assert_eq!(out, "let a/*: number*/ = 1;");
    }
}
