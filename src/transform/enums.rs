//! Enum declarations
//!
//! `enum E { A, B = "b" }` becomes an immediately invoked function that
//! fills the enum object, with reverse mappings for numeric members:
//!
//! ```text
//! var E;
//! (function (E) { E[E["A"] = 0] = "A"; E["B"] = "b"; })(E || (E = {}));
//! ```
//!
//! The header and the closing brace are rewritten and every member is
//! replaced in place, so the text between members keeps its layout.

use super::edit::Edit;
use super::helpers::quote;
use super::{ExportKind, TransformSession};
use crate::ast::*;
use crate::binder::ConstValue;

impl<'a> TransformSession<'a> {
    pub(crate) fn visit_enum(&mut self, stmt: NodeId) {
        let ast = self.ast;
        let NodeKind::EnumDeclaration {
            modifiers,
            name,
            members,
            body,
        } = ast.kind(stmt)
        else {
            return;
        };
        let span = ast.span(stmt);
        if modifiers.has(ModifierFlags::DECLARE) {
            self.remove_ambient(span);
            return;
        }
        if modifiers.has(ModifierFlags::CONST) && !self.options.preserve_const_enums {
            self.remove(span);
            return;
        }

        let enum_name = ast.text(*name);
        let kind = self.export_kind(stmt, modifiers);
        let braced = self.needs_braces(stmt);
        let indent = self.indent_at(span.start);

        let mut header = String::new();
        if braced {
            header.push_str("{ ");
        }
        if let Some(keyword) = self.declaration_keyword(stmt, *name) {
            if kind == ExportKind::EsModule {
                header.push_str("export ");
            }
            header.push_str(&format!("{} {};\n{}", keyword, enum_name, indent));
        }
        header.push_str(&format!("(function ({}) {{", enum_name));
        self.push(Edit::rewrite(span.start, body.start + 1, header));

        for &member in members {
            self.visit_enum_member(enum_name, member);
        }

        let closer = format!("}})({});{}", closure_argument(enum_name, &kind), if braced { " }" } else { "" });
        self.push(Edit::rewrite(body.end - 1, body.end, closer));
        if kind == ExportKind::CommonJs {
            self.hoist(enum_name);
        }
    }

    fn visit_enum_member(&mut self, enum_name: &str, member: NodeId) {
        let ast = self.ast;
        let NodeKind::EnumMember { name, init, comma } = ast.kind(member) else {
            return;
        };
        let span = ast.span(member);
        let key = quote(&ast.property_name(*name));
        let text = match self.binder.constant_value(member) {
            Some(ConstValue::String(value)) => {
                format!("{}[{}] = {};", enum_name, key, quote(&value))
            }
            Some(value) => reverse_mapped(enum_name, &key, &value.to_js()),
            None => {
                let value = match init {
                    Some(init) => self.rewrite_node(*init),
                    None => "void 0".to_string(),
                };
                reverse_mapped(enum_name, &key, &value)
            }
        };
        let end = comma.map(|c| c + 1).unwrap_or(span.end);
        self.push(Edit::rewrite(span.start, end, text));
    }
}

/// `E[E["A"] = value] = "A";`
fn reverse_mapped(enum_name: &str, key: &str, value: &str) -> String {
    format!("{0}[{0}[{1}] = {2}] = {1};", enum_name, key, value)
}

/// Argument of the enum or namespace closure: the existing object, or a new
/// one stored on the export host
pub(crate) fn closure_argument(name: &str, kind: &ExportKind) -> String {
    match kind.host() {
        Some(host) => format!("{0} = {1}.{0} || ({1}.{0} = {{}})", name, host),
        None => format!("{0} || ({0} = {{}})", name),
    }
}

#[cfg(test)]
mod tests {
    use crate::binder::Binder;
    use crate::options::{ModuleKind, TranspileOptions};
    use crate::parser::parse;
    use crate::transform::transpile_ast;
    use pretty_assertions::assert_eq;

    fn run_with(source: &str, options: &TranspileOptions) -> String {
        let ast = parse(source).unwrap();
        let binder = Binder::bind(&ast);
        transpile_ast(&ast, &binder, options, None).code
    }

    fn run(source: &str) -> String {
        run_with(source, &TranspileOptions::default())
    }

    #[test]
    fn test_numeric_enum_with_reverse_mapping() {
        assert_eq!(
            run("enum Color { Red, Green = 4, Blue }"),
            "var Color;\n(function (Color) { Color[Color[\"Red\"] = 0] = \"Red\"; Color[Color[\"Green\"] = 4] = \"Green\"; Color[Color[\"Blue\"] = 5] = \"Blue\"; })(Color || (Color = {}));"
        );
    }

    #[test]
    fn test_exported_enum_in_commonjs() {
        assert_eq!(
            run("export enum Color { Red, Green, Blue }"),
            "Object.defineProperty(exports, \"__esModule\", { value: true });\nexports.Color = void 0;\nvar Color;\n(function (Color) { Color[Color[\"Red\"] = 0] = \"Red\"; Color[Color[\"Green\"] = 1] = \"Green\"; Color[Color[\"Blue\"] = 2] = \"Blue\"; })(Color = exports.Color || (exports.Color = {}));"
        );
    }

    #[test]
    fn test_string_and_computed_members() {
        let source = "enum E {\n    A = \"a\",\n    B = f(),\n    C = B,\n}";
        assert_eq!(
            run(source),
            "var E;\n(function (E) {\n    E[\"A\"] = \"a\";\n    E[E[\"B\"] = f()] = \"B\";\n    E[E[\"C\"] = E.B] = \"C\";\n})(E || (E = {}));"
        );
    }

    #[test]
    fn test_merged_enum_reuses_binding() {
        let source = "enum E { A }\nenum E { B = 2 }";
        assert_eq!(
            run(source),
            "var E;\n(function (E) { E[E[\"A\"] = 0] = \"A\"; })(E || (E = {}));\n(function (E) { E[E[\"B\"] = 2] = \"B\"; })(E || (E = {}));"
        );
    }

    #[test]
    fn test_enum_in_block_uses_let() {
        assert_eq!(
            run("{\n    enum E { A }\n}"),
            "{\n    let E;\n    (function (E) { E[E[\"A\"] = 0] = \"A\"; })(E || (E = {}));\n}"
        );
    }

    #[test]
    fn test_preserved_const_enum_and_es_module_export() {
        let options = TranspileOptions {
            preserve_const_enums: true,
            module: ModuleKind::EsModule,
            ..Default::default()
        };
        assert_eq!(
            run_with("export const enum E { A = 1 }", &options),
            "export var E;\n(function (E) { E[E[\"A\"] = 1] = \"A\"; })(E || (E = {}));"
        );
    }

    #[test]
    fn test_declare_enum_is_removed() {
        assert_eq!(run("declare enum E { A }\nlet x = 1;"), "\nlet x = 1;");
    }
}
