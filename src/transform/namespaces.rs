//! Namespace declarations
//!
//! An instantiated namespace becomes a closure over an object that carries
//! its exported members. `namespace A.B { }` nests one closure per name:
//!
//! ```text
//! var A;
//! (function (A) {
//!     let B;
//!     (function (B) { ... })(B = A.B || (A.B = {}));
//! })(A || (A = {}));
//! ```
//!
//! Exported members are written as `B.x` through the reference tracker; the
//! records are registered ahead of the traversal so that uses in merged
//! declarations elsewhere in the file are requalified too.

use super::edit::Edit;
use super::enums::closure_argument;
use super::references::ReferenceRecord;
use super::{ExportKind, Host, TransformSession};
use crate::ast::*;

impl<'a> TransformSession<'a> {
    /// Register the exported members of one namespace body
    pub(crate) fn register_namespace(&mut self, module: NodeId) {
        let ast = self.ast;
        if !self.declaration_emits(module) {
            return;
        }
        let NodeKind::ModuleDeclaration {
            names,
            body: Some(body),
            ..
        } = ast.kind(module)
        else {
            return;
        };
        let Some(&last) = names.last() else {
            return;
        };
        let host = ast.text(last).to_string();
        let body_span = ast.span(*body);
        let module_span = ast.span(module);

        // Inner names of `A.B.C` are members of the enclosing level
        for pair in names.windows(2) {
            let parent = ast.text(pair[0]);
            self.references.register(
                ReferenceRecord::prefix(ast.span(pair[1]).start, format!("{}.", parent))
                    .outside_of(module_span),
            );
        }

        for &stmt in ast.statements(*body) {
            let exported_name = match ast.kind(stmt) {
                NodeKind::VariableStatement { modifiers, list }
                    if modifiers.has(ModifierFlags::EXPORT)
                        && !modifiers.has(ModifierFlags::DECLARE) =>
                {
                    self.register_exported_variables(*list, &host);
                    None
                }
                NodeKind::ImportEquals { .. } => {
                    self.register_import_equals(stmt, Some(&host));
                    None
                }
                NodeKind::FunctionDeclaration(f) if f.modifiers.has(ModifierFlags::EXPORT) => {
                    f.name
                }
                NodeKind::ClassDeclaration(c) if c.modifiers.has(ModifierFlags::EXPORT) => c.name,
                NodeKind::EnumDeclaration {
                    modifiers, name, ..
                } if modifiers.has(ModifierFlags::EXPORT) => Some(*name),
                NodeKind::ModuleDeclaration {
                    modifiers, names, ..
                } if modifiers.has(ModifierFlags::EXPORT) => names.first().copied(),
                _ => None,
            };
            if let Some(name) = exported_name {
                if self.declaration_emits(stmt) {
                    self.references.register(
                        ReferenceRecord::prefix(ast.span(name).start, format!("{}.", host))
                            .outside_of(body_span),
                    );
                }
            }
        }
    }

    pub(crate) fn visit_namespace(&mut self, stmt: NodeId) {
        let ast = self.ast;
        let NodeKind::ModuleDeclaration {
            modifiers,
            names,
            body,
            global,
        } = ast.kind(stmt)
        else {
            return;
        };
        let span = ast.span(stmt);
        let identified = names
            .first()
            .is_some_and(|&n| matches!(ast.kind(n), NodeKind::Identifier));
        if modifiers.has(ModifierFlags::DECLARE) || *global || !identified {
            self.remove_ambient(span);
            return;
        }
        let Some(body) = *body else {
            self.remove(span);
            return;
        };
        if !self.is_instantiated(stmt) {
            self.remove(span);
            return;
        }

        let kind = self.export_kind(stmt, modifiers);
        let braced = self.needs_braces(stmt);
        let indent = self.indent_at(span.start);
        let body_span = ast.span(body);
        let texts: Vec<&str> = names.iter().map(|&n| ast.text(n)).collect();

        let mut header = String::new();
        if braced {
            header.push_str("{ ");
        }
        if let Some(keyword) = self.declaration_keyword(stmt, names[0]) {
            if kind == ExportKind::EsModule {
                header.push_str("export ");
            }
            header.push_str(&format!("{} {};\n{}", keyword, texts[0], indent));
        }
        header.push_str(&format!("(function ({}) {{", texts[0]));
        for (level, name) in texts.iter().enumerate().skip(1) {
            let inner = format!("{}{}", indent, "    ".repeat(level));
            header.push_str(&format!(
                "\n{0}{1} {2};\n{0}(function ({2}) {{",
                inner,
                self.options.let_keyword(),
                name
            ));
        }
        self.push(Edit::rewrite(span.start, body_span.start + 1, header));

        self.hosts.push(Host {
            name: texts[texts.len() - 1].to_string(),
            body: body_span,
        });
        for &statement in ast.statements(body) {
            self.visit(statement);
        }
        self.hosts.pop();

        let mut closer = String::new();
        for level in (1..texts.len()).rev() {
            if level + 1 < texts.len() {
                closer.push_str(&format!("\n{}{}", indent, "    ".repeat(level)));
            }
            closer.push_str(&format!(
                "}})({0} = {1}.{0} || ({1}.{0} = {{}}));",
                texts[level],
                texts[level - 1]
            ));
        }
        if texts.len() > 1 {
            closer.push_str(&format!("\n{}", indent));
        }
        closer.push_str(&format!("}})({});", closure_argument(texts[0], &kind)));
        if braced {
            closer.push_str(" }");
        }
        self.push(Edit::rewrite(body_span.end - 1, body_span.end, closer));
        if kind == ExportKind::CommonJs {
            self.hoist(texts[0]);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::binder::Binder;
    use crate::options::TranspileOptions;
    use crate::parser::parse;
    use crate::transform::transpile_ast;
    use pretty_assertions::assert_eq;

    const MARKER: &str = "Object.defineProperty(exports, \"__esModule\", { value: true });\n";

    fn run(source: &str) -> String {
        let ast = parse(source).unwrap();
        let binder = Binder::bind(&ast);
        transpile_ast(&ast, &binder, &TranspileOptions::default(), None).code
    }

    #[test]
    fn test_namespace_with_exported_members() {
        let source = "namespace N {\n    export const x = 1;\n    export function f() { return x; }\n    const hidden = 2;\n}\nN.f();";
        assert_eq!(
            run(source),
            "var N;\n(function (N) {\n    N.x = 1;\n    function f() { return N.x; } N.f = f;\n    const hidden = 2;\n})(N || (N = {}));\nN.f();"
        );
    }

    #[test]
    fn test_dotted_namespace_nests_closures() {
        let source = "namespace A.B {\n    export const x = 1;\n}";
        assert_eq!(
            run(source),
            "var A;\n(function (A) {\n    let B;\n    (function (B) {\n    B.x = 1;\n})(B = A.B || (A.B = {}));\n})(A || (A = {}));"
        );
    }

    #[test]
    fn test_three_level_namespace() {
        let source = "namespace A.B.C { export let v = 0; }";
        assert_eq!(
            run(source),
            "var A;\n(function (A) {\n    let B;\n    (function (B) {\n        let C;\n        (function (C) { C.v = 0; })(C = B.C || (B.C = {}));\n    })(B = A.B || (A.B = {}));\n})(A || (A = {}));"
        );
    }

    #[test]
    fn test_uninstantiated_and_ambient_namespaces_removed() {
        let source = "namespace T { export interface I {} }\ndeclare namespace D { let x: number; }\nlet y = 1;";
        assert_eq!(run(source), "\n\nlet y = 1;");
    }

    #[test]
    fn test_merged_namespaces_reach_other_bodies() {
        let source = "namespace N { export function f() {} }\nnamespace N { f(); }";
        assert_eq!(
            run(source),
            "var N;\n(function (N) { function f() {} N.f = f; })(N || (N = {}));\n(function (N) { N.f(); })(N || (N = {}));"
        );
    }

    #[test]
    fn test_exported_namespace_in_commonjs() {
        let source = "export namespace N {\n    export enum E { A }\n}";
        assert_eq!(
            run(source),
            format!(
                "{}exports.N = void 0;\nvar N;\n(function (N) {{\n    let E;\n    (function (E) {{ E[E[\"A\"] = 0] = \"A\"; }})(E = N.E || (N.E = {{}}));\n}})(N = exports.N || (exports.N = {{}}));",
                MARKER
            )
        );
    }
}
