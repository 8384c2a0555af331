//! End-to-end transpilation tests
//!
//! Each test feeds TypeScript through the public API and checks the
//! JavaScript that comes out.

mod common;

use common::*;
use detype::{JsTarget, ModuleKind, TranspileOptions};
use pretty_assertions::assert_eq;

// ============================================================
// Type syntax removal
// ============================================================

mod type_syntax_removal {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_javascript_is_unchanged() {
        let source = "// keep me\nfunction add(a, b) {\n    return a + b; /* sum */\n}\nconst o = { x: 1, y: [2, 3] };\n";
        assert_eq!(transpile(source), source);
    }

    #[test]
    fn test_annotations_and_declarations_removed() {
        let source = "interface Point { x: number; y: number }\ntype Pair<T> = [T, T];\nfunction norm<T extends Point>(p: T, scale?: number): number {\n    return (p.x as number) * scale!;\n}\nlet v = <number>norm({ x: 1, y: 2 } satisfies Point);";
        let out = transpile_clean(source, &TranspileOptions::default());
        assert!(out.contains("function norm(p, scale) {"));
        assert!(out.contains("return (p.x) * scale;"));
        assert!(out.contains("let v = norm({ x: 1, y: 2 });"));
        assert!(!out.contains("interface"));
    }

    #[test]
    fn test_output_keeps_line_count() {
        let source = "interface A {\n    a: string;\n}\nlet x = 1;\ntype B = A;\nlet y = 2;";
        let out = transpile(source);
        assert_eq!(out.lines().count(), source.lines().count());
        assert!(out.ends_with("let y = 2;"));
    }

    #[test]
    fn test_preserve_mode_comments_out_types() {
        let out = transpile_preserve("let x: number = 1;");
        assert!(out.contains("/*"));
        assert!(out.contains("let x"));
        assert!(detype::parser::parse(&out).is_ok());
    }

    #[test]
    fn test_generic_calls_and_overloads() {
        let source = "function id(x: string): string;\nfunction id(x: any) { return x; }\nconst s = id<string>(\"a\");\nconst m = new Map<string, number>();";
        let out = transpile_clean(source, &TranspileOptions::default());
        assert!(out.contains("function id(x) { return x; }"));
        assert!(out.contains("const s = id(\"a\");"));
        assert!(out.contains("const m = new Map();"));
    }
}

// ============================================================
// Enums
// ============================================================

mod enums {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_exported_enum_in_commonjs() {
        assert_eq!(
            transpile("export enum Color { Red, Green, Blue }"),
            format!(
                "{}exports.Color = void 0;\nvar Color;\n(function (Color) {{ Color[Color[\"Red\"] = 0] = \"Red\"; Color[Color[\"Green\"] = 1] = \"Green\"; Color[Color[\"Blue\"] = 2] = \"Blue\"; }})(Color = exports.Color || (exports.Color = {{}}));",
                MARKER
            )
        );
    }

    #[test]
    fn test_implicit_members_count_from_zero() {
        let out = transpile("enum E { A, B, C, D }");
        for (i, name) in ["A", "B", "C", "D"].iter().enumerate() {
            assert!(
                out.contains(&format!("E[E[\"{}\"] = {}] = \"{}\";", name, i, name)),
                "missing member {} in {}",
                name,
                out
            );
        }
    }

    #[test]
    fn test_string_members_map_one_way() {
        let out = transpile("enum Dir { Up = \"UP\", Down = \"DOWN\" }");
        assert!(out.contains("Dir[\"Up\"] = \"UP\";"));
        assert!(out.contains("Dir[\"Down\"] = \"DOWN\";"));
        assert!(!out.contains("Dir[Dir["));
    }

    #[test]
    fn test_const_enum_is_inlined() {
        let out = transpile("const enum Size { Small = 1, Large = Small * 10 }\nlet s = Size.Large;");
        assert_eq!(out.trim_start(), "let s = 10 /* Size.Large */;");
    }

    #[test]
    fn test_enum_output_parses() {
        transpile_clean(
            "enum Flags { None = 0, A = 1 << 0, B = 1 << 1, AB = A | B }\nlet f = Flags.AB;",
            &TranspileOptions::default(),
        );
    }
}

// ============================================================
// Namespaces
// ============================================================

mod namespaces {
    use super::*;

    #[test]
    fn test_namespace_becomes_closure() {
        let out = transpile_clean(
            "namespace Geometry {\n    export const origin = 0;\n    export function dist(a: number) { return a - origin; }\n}",
            &TranspileOptions::default(),
        );
        assert!(out.starts_with("var Geometry;\n(function (Geometry) {"));
        assert!(out.contains("Geometry.origin = 0;"));
        assert!(out.contains("Geometry.dist = dist;"));
        assert!(out.contains("return a - Geometry.origin;"));
        assert!(out.ends_with("})(Geometry || (Geometry = {}));"));
    }

    #[test]
    fn test_type_only_namespace_removed() {
        let out = transpile("namespace Types {\n    export interface A {}\n}\nlet y = 1;");
        assert!(!out.contains("Types"));
        assert!(out.ends_with("let y = 1;"));
    }
}

// ============================================================
// Classes
// ============================================================

mod classes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parameter_property_after_super() {
        let source = "class B extends A {\n    constructor(private readonly x: number, y: string) {\n        super(y);\n    }\n}";
        assert_eq!(
            transpile(source),
            "class B extends A {\n    constructor(x, y) {\n        super(y); this.x = x;\n    }\n}"
        );
    }

    #[test]
    fn test_class_members_lose_types() {
        let source = "abstract class Shape<T> implements Drawable {\n    private name: string = \"s\";\n    abstract area(): number;\n    describe(): string { return this.name; }\n}";
        let out = transpile_clean(source, &TranspileOptions::default());
        assert!(out.starts_with("class Shape {"));
        assert!(out.contains("name = \"s\";"));
        assert!(out.contains("describe() { return this.name; }"));
        assert!(!out.contains("area"));
    }

    #[test]
    fn test_decorators_become_decorate_calls() {
        let out = transpile_clean(
            "@sealed\nclass Greeter {\n    @log greet() {}\n}",
            &TranspileOptions::default(),
        );
        assert!(out.contains("__decorate([log], Greeter.prototype, \"greet\", null);"));
        assert!(out.contains("Greeter = __decorate([sealed], Greeter);"));
    }

    #[test]
    fn test_es5_wrapper_for_decorated_class() {
        let options = TranspileOptions {
            target: JsTarget::ES5,
            ..Default::default()
        };
        let out = transpile_output("@dec\nclass C {}", &options).code;
        assert!(out.contains("(function () {"));
        assert!(out.contains("}());"));
    }
}

// ============================================================
// Modules
// ============================================================

mod modules {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unused_named_import_is_removed() {
        assert_eq!(
            transpile("import { a } from \"./mod\";\nlet x: a = 1;"),
            format!("{}\nlet x = 1;", MARKER)
        );
    }

    #[test]
    fn test_used_import_becomes_require() {
        let out = transpile_clean(
            "import { readFile } from \"fs\";\nreadFile(\"a\");",
            &TranspileOptions::default(),
        );
        assert!(out.contains("const fs_1 = require(\"fs\");"));
        assert!(out.contains("fs_1.readFile(\"a\");"));
    }

    #[test]
    fn test_type_only_imports_and_exports_vanish() {
        let out = transpile("import type { T } from \"./t\";\nexport type { T };\nlet z = 1;");
        assert!(!out.contains("require"));
        assert!(out.ends_with("let z = 1;"));
    }

    #[test]
    fn test_es_module_output_keeps_syntax() {
        let out = transpile_esm("import { a, B } from \"./m\";\nexport const c: number = a;\nlet b: B;");
        assert!(out.contains("import { a } from \"./m\";"));
        assert!(out.contains("export const c = a;"));
        assert!(!out.contains("exports."));
    }

    #[test]
    fn test_use_strict_when_requested() {
        let options = TranspileOptions {
            emit_use_strict: true,
            module: ModuleKind::CommonJs,
            ..Default::default()
        };
        let out = transpile_output("export const a = 1;", &options).code;
        assert!(out.starts_with("\"use strict\";"));
    }
}

// ============================================================
// Whole files
// ============================================================

mod whole_files {
    use super::*;

    const SERVICE: &str = r#"import { Logger } from "./logger";
import type { Config } from "./config";

export enum Level { Debug, Info, Warn }

export interface Options {
    level?: Level;
}

export namespace Defaults {
    export const level = Level.Info;
}

export class Service {
    private started = false;

    constructor(private readonly logger: Logger, public config: Config) {}

    start(options: Options = {}): boolean {
        const level = options.level ?? Defaults.level;
        this.logger.log(level as number, "starting");
        this.started = true;
        return this.started!;
    }
}

export default function create(logger: Logger): Service {
    return new Service(logger, {} as Config);
}
"#;

    #[test]
    fn test_service_module_transpiles_cleanly() {
        let out = transpile_clean(SERVICE, &TranspileOptions::default());
        assert!(out.starts_with(MARKER));
        assert!(out.contains("exports.Service = Service;"));
        assert!(out.contains("exports.default = create;"));
        assert!(out.contains("this.logger = logger;"));
        assert!(out.contains("this.config = config;"));
        assert!(!out.contains("./config"));
    }

    #[test]
    fn test_service_module_as_es_module() {
        let options = TranspileOptions {
            module: ModuleKind::EsModule,
            ..Default::default()
        };
        let out = transpile_clean(SERVICE, &options);
        assert!(out.contains("export class Service"));
        assert!(out.contains("export default function create(logger)"));
        assert!(!out.contains("require("));
    }

    #[test]
    fn test_no_overlaps_across_samples() {
        let samples = [
            "export const enum E { A }\nexport let x = E.A as number;",
            "namespace A.B { export class C<T> { m(x?: T) {} } }",
            "export default class { constructor(public p: string) {} }",
            "import x = require(\"x\");\nexport = x;",
            "let f = <T,>(a: T): T => a;",
        ];
        for sample in samples {
            let output = transpile_output(sample, &TranspileOptions::default());
            assert!(output.overlaps.is_empty(), "{}: {:?}", sample, output.overlaps);
        }
    }
}
