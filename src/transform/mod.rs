//! The transform engine
//!
//! A [`TransformSession`] walks one bound file and plans span edits: type
//! syntax is removed, TypeScript-only declarations are rewritten into their
//! JavaScript idioms, and references to declarations that moved are
//! requalified. The edits are then resolved into a disjoint list and applied
//! to the original text, so everything the transform does not touch keeps
//! its formatting and comments.

mod apply;
mod classes;
pub mod edit;
mod enums;
mod helpers;
mod modules;
mod namespaces;
mod planner;
mod references;

pub use apply::apply;
pub use edit::{resolve, Edit, EditOverlap, GroupKey, Removal, ResolvedEdits};
pub use references::{RecordScope, ReferenceRecord, ReferenceTracker, Rewrite, RewriteMode};

use crate::ast::*;
use crate::binder::{Binder, ConstValue};
use crate::error::Diagnostic;
use crate::options::{RemovalMode, TranspileOptions};
use helpers::Helpers;
use rustc_hash::FxHashMap;

/// Result of transpiling one file
#[derive(Debug, Clone)]
pub struct TranspileOutput {
    pub code: String,
    /// Edits dropped because they partially overlapped a kept edit
    pub overlaps: Vec<EditOverlap>,
    /// Constructs that were passed through unchanged
    pub diagnostics: Vec<Diagnostic>,
}

/// A const enum access whose enum lives in another file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumReference<'a> {
    /// `import { E } from "./m"` followed by `E.A`
    Imported {
        module: &'a str,
        name: &'a str,
        member: &'a str,
    },
    /// A global declared by a script file
    Global { name: &'a str, member: &'a str },
}

/// Const enum values visible from other files of a program
pub trait EnumLookup: Sync {
    fn const_enum_member(&self, reference: EnumReference<'_>) -> Option<ConstValue>;
}

/// Plan, resolve and apply the edits for one bound file
pub fn transpile_ast(
    ast: &Ast,
    binder: &Binder,
    options: &TranspileOptions,
    enums: Option<&dyn EnumLookup>,
) -> TranspileOutput {
    let session = TransformSession::new(ast, binder, options, enums);
    let (edits, diagnostics) = session.run();
    let planned = edits.len();
    let resolved = resolve(edits);
    tracing::debug!(
        planned,
        resolved = resolved.edits.len(),
        overlaps = resolved.overlaps.len(),
        "resolved edits"
    );
    let code = apply(ast.source(), &resolved.edits, options.removal_mode);
    TranspileOutput {
        code,
        overlaps: resolved.overlaps,
        diagnostics,
    }
}

/// How a declaration statement is exported
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExportKind {
    None,
    /// Top level of a CommonJS module
    CommonJs,
    /// Member of a namespace body
    Namespace { host: String, body: Span },
    /// Top level of an ES module; the `export` keyword stays
    EsModule,
}

impl ExportKind {
    /// Object the export is assigned to
    pub fn host(&self) -> Option<&str> {
        match self {
            ExportKind::CommonJs => Some("exports"),
            ExportKind::Namespace { host, .. } => Some(host),
            ExportKind::None | ExportKind::EsModule => None,
        }
    }
}

/// The namespace whose body is being visited
#[derive(Debug, Clone)]
pub(crate) struct Host {
    pub name: String,
    pub body: Span,
}

/// An import statement kept in ES module output
#[derive(Debug, Clone)]
pub(crate) struct EsmImport {
    pub statement: NodeId,
    /// Binding node and the group that marks it used
    pub bindings: Vec<(NodeId, GroupKey)>,
}

/// Per-file transform state
pub(crate) struct TransformSession<'a> {
    pub ast: &'a Ast,
    pub binder: &'a Binder,
    pub options: &'a TranspileOptions,
    pub enums: Option<&'a dyn EnumLookup>,
    pub edits: Vec<Edit>,
    pub references: ReferenceTracker,
    /// Export names pre-declared as `void 0`, in registration order
    pub hoisted: Vec<String>,
    pub helpers: Helpers,
    /// Imports and exports become `require` and `exports`
    pub commonjs_module: bool,
    pub export_equals: bool,
    pub hosts: Vec<Host>,
    pub esm_imports: Vec<EsmImport>,
    /// Group of each import statement whose `require` may be elided
    pub groups: FxHashMap<NodeId, GroupKey>,
    pub diagnostics: Vec<Diagnostic>,
    default_names: FxHashMap<NodeId, String>,
    module_names: FxHashMap<String, u32>,
    module_vars: FxHashMap<NodeId, String>,
}

impl<'a> TransformSession<'a> {
    pub fn new(
        ast: &'a Ast,
        binder: &'a Binder,
        options: &'a TranspileOptions,
        enums: Option<&'a dyn EnumLookup>,
    ) -> Self {
        Self {
            ast,
            binder,
            options,
            enums,
            edits: Vec::new(),
            references: ReferenceTracker::new(),
            hoisted: Vec::new(),
            helpers: Helpers::empty(),
            commonjs_module: options.commonjs() && binder.is_external_module(),
            export_equals: false,
            hosts: Vec::new(),
            esm_imports: Vec::new(),
            groups: FxHashMap::default(),
            diagnostics: Vec::new(),
            default_names: FxHashMap::default(),
            module_names: FxHashMap::default(),
            module_vars: FxHashMap::default(),
        }
    }

    /// Plan every edit of the file
    pub fn run(mut self) -> (Vec<Edit>, Vec<Diagnostic>) {
        self.register_declarations();
        tracing::debug!("registered moved declarations");
        self.visit(self.ast.root());
        self.finish_imports();
        self.emit_prologue();

        let references = &self.references;
        let edits: Vec<Edit> = self
            .edits
            .into_iter()
            .filter(|e| e.group.map_or(true, |g| references.is_group_used(g)))
            .collect();
        tracing::debug!(edits = edits.len(), hoisted = self.hoisted.len(), "planned edits");
        (edits, self.diagnostics)
    }

    // ========== Edit helpers ==========

    pub fn push(&mut self, edit: Edit) {
        tracing::trace!(start = edit.start, end = edit.end, text = %edit.text, "edit");
        self.edits.push(edit);
    }

    pub fn remove(&mut self, span: Span) {
        self.push(Edit::remove(span.start, span.end));
    }

    /// Remove an ambient declaration, keeping it as a comment unless
    /// ambient declarations are suppressed
    pub fn remove_ambient(&mut self, span: Span) {
        let removal = if self.options.suppress_ambient {
            Removal::Strip
        } else {
            Removal::Comment
        };
        self.push(Edit::remove(span.start, span.end).with_removal(removal));
    }

    pub fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.push(Edit::insert(at, text));
    }

    /// Declare `exports.name = void 0` ahead of the first statement
    pub fn hoist(&mut self, name: &str) {
        if name != "default" && !self.hoisted.iter().any(|n| n == name) {
            self.hoisted.push(name.to_string());
        }
    }

    pub fn source(&self) -> &'a str {
        self.ast.source()
    }

    pub fn indent_at(&self, offset: usize) -> &'a str {
        helpers::line_indent(self.ast.source(), offset)
    }

    /// `default_1`, `default_2`, ... for anonymous default exports
    pub fn default_name(&mut self, node: NodeId) -> String {
        let next = self.default_names.len() + 1;
        self.default_names
            .entry(node)
            .or_insert_with(|| format!("default_{}", next))
            .clone()
    }

    /// Module variable of an import or re-export statement, e.g. `mod_1`
    pub fn module_var(&mut self, statement: NodeId, specifier: &str) -> String {
        if let Some(name) = self.module_vars.get(&statement) {
            return name.clone();
        }
        let base = helpers::module_base_name(specifier);
        let count = self.module_names.entry(base.clone()).or_insert(0);
        *count += 1;
        let name = format!("{}_{}", base, count);
        self.module_vars.insert(statement, name.clone());
        name
    }

    /// Text of a node with the edits planned inside it applied
    pub fn rewrite_node(&mut self, node: NodeId) -> String {
        let span = self.ast.span(node);
        let outer = std::mem::take(&mut self.edits);
        self.visit(node);
        let planned = std::mem::replace(&mut self.edits, outer);

        let mut inner = Vec::new();
        for mut edit in planned {
            if span.contains(Span::new(edit.start, edit.end)) {
                edit.start -= span.start;
                edit.end -= span.start;
                inner.push(edit);
            } else {
                self.edits.push(edit);
            }
        }
        let resolved = resolve(inner);
        apply(self.ast.slice(span), &resolved.edits, RemovalMode::Strip)
    }

    pub fn note(&mut self, message: &str, offset: usize) {
        let location = crate::error::SourceLocation::from_offset(self.ast.source(), offset);
        tracing::debug!(%location, message, "passed through");
        self.diagnostics.push(Diagnostic::new(message, location));
    }

    // ========== Declarations ==========

    /// How a declaration statement with these modifiers is exported
    pub fn export_kind(&self, statement: NodeId, modifiers: &Modifiers) -> ExportKind {
        if !modifiers.has(ModifierFlags::EXPORT) {
            return ExportKind::None;
        }
        let Some(parent) = self.ast.parent(statement) else {
            return ExportKind::None;
        };
        match self.ast.kind(parent) {
            NodeKind::SourceFile { .. } if self.commonjs_module => ExportKind::CommonJs,
            NodeKind::SourceFile { .. } => ExportKind::EsModule,
            NodeKind::ModuleBlock { .. } => match self.hosts.last() {
                Some(host) => ExportKind::Namespace {
                    host: host.name.clone(),
                    body: host.body,
                },
                None => ExportKind::None,
            },
            _ => ExportKind::None,
        }
    }

    /// Whether a declaration produces a runtime binding
    pub fn declaration_emits(&self, node: NodeId) -> bool {
        self.emits(node, 0)
    }

    fn emits(&self, node: NodeId, depth: usize) -> bool {
        match self.ast.kind(node) {
            NodeKind::EnumDeclaration { modifiers, .. } => {
                !modifiers.has(ModifierFlags::DECLARE)
                    && (!modifiers.has(ModifierFlags::CONST) || self.options.preserve_const_enums)
            }
            NodeKind::ModuleDeclaration {
                modifiers,
                names,
                global,
                ..
            } => {
                !modifiers.has(ModifierFlags::DECLARE)
                    && !*global
                    && names
                        .first()
                        .is_some_and(|&n| matches!(self.ast.kind(n), NodeKind::Identifier))
                    && self.instantiated(node, depth)
            }
            NodeKind::FunctionDeclaration(f) => {
                f.body.is_some() && !f.modifiers.has(ModifierFlags::DECLARE)
            }
            NodeKind::ClassDeclaration(c) => !c.modifiers.has(ModifierFlags::DECLARE),
            NodeKind::InterfaceDeclaration { .. } | NodeKind::TypeAliasDeclaration { .. } => false,
            _ => true,
        }
    }

    /// Whether a namespace body contains anything with a runtime value
    pub fn is_instantiated(&self, module: NodeId) -> bool {
        self.instantiated(module, 0)
    }

    fn instantiated(&self, module: NodeId, depth: usize) -> bool {
        if depth > 16 {
            return true;
        }
        let NodeKind::ModuleDeclaration {
            body: Some(body), ..
        } = self.ast.kind(module)
        else {
            return false;
        };
        self.ast
            .statements(*body)
            .iter()
            .any(|&stmt| self.statement_instantiates(stmt, depth + 1))
    }

    fn statement_instantiates(&self, stmt: NodeId, depth: usize) -> bool {
        if crate::binder::statement_modifiers(self.ast, stmt)
            .is_some_and(|m| m.has(ModifierFlags::DECLARE))
        {
            return false;
        }
        match self.ast.kind(stmt) {
            NodeKind::Empty => false,
            NodeKind::InterfaceDeclaration { .. } | NodeKind::TypeAliasDeclaration { .. } => false,
            NodeKind::EnumDeclaration { .. }
            | NodeKind::ModuleDeclaration { .. }
            | NodeKind::FunctionDeclaration(_) => self.emits(stmt, depth),
            NodeKind::ImportEquals {
                type_only,
                reference,
                ..
            } => {
                !type_only
                    && match reference {
                        ModuleReference::External(_) => true,
                        ModuleReference::Entity(entity) => self.entity_has_value(*entity, depth),
                    }
            }
            NodeKind::ExportDeclaration { type_only, .. } => !type_only,
            _ => true,
        }
    }

    /// Whether an entity name such as `A.B` refers to a runtime value
    pub fn entity_has_value(&self, entity: NodeId, depth: usize) -> bool {
        let Some(symbol) = self.binder.entity_symbol(self.ast, entity) else {
            return true;
        };
        let symbol = self.binder.symbol(symbol);
        if symbol.is_type_only() {
            return false;
        }
        symbol
            .declarations
            .iter()
            .any(|d| self.emits(d.node, depth + 1))
    }

    /// `var`, `let` or nothing for the binding an enum or namespace
    /// declaration introduces
    pub fn declaration_keyword(&self, statement: NodeId, name: NodeId) -> Option<&'static str> {
        let parent = self.ast.parent(statement);
        if let Some(symbol) = self.binder.declared_symbol(name) {
            let merged = self
                .binder
                .symbol(symbol)
                .declarations
                .iter()
                .take_while(|d| d.name != name)
                .any(|d| self.ast.parent(d.node) == parent && self.declaration_emits(d.node));
            if merged {
                return None;
            }
        }
        match parent.map(|p| self.ast.kind(p)) {
            Some(NodeKind::SourceFile { .. }) => Some("var"),
            _ => Some(self.options.let_keyword()),
        }
    }

    /// Whether a statement sits directly in the body of a compound
    /// statement and needs braces around a multi-statement replacement
    pub fn needs_braces(&self, statement: NodeId) -> bool {
        self.ast.parent(statement).is_some_and(|p| {
            matches!(
                self.ast.kind(p),
                NodeKind::If { .. }
                    | NodeKind::For { .. }
                    | NodeKind::ForIn { .. }
                    | NodeKind::ForOf { .. }
                    | NodeKind::While { .. }
                    | NodeKind::DoWhile { .. }
                    | NodeKind::Labeled { .. }
                    | NodeKind::With { .. }
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> String {
        let ast = parse(source).unwrap();
        let binder = Binder::bind(&ast);
        transpile_ast(&ast, &binder, &TranspileOptions::default(), None).code
    }

    #[test]
    fn test_plain_javascript_is_untouched() {
        let source = "const a = [1, 2];\nfor (;;) { break; }\nfunction f(x) { return x * 2; }\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn test_type_annotations_removed() {
        assert_eq!(
            run("let a: number = 1;\nfunction f<T>(x: T, y?: string): T { return x as T; }"),
            "let a = 1;\nfunction f(x, y) { return x; }"
        );
    }

    #[test]
    fn test_declaration_keyword_merges() {
        let source = "enum E { A }\nenum E { B = 2 }\nnamespace N { export const x = 1; }\nnamespace N { }";
        let ast = parse(source).unwrap();
        let binder = Binder::bind(&ast);
        let options = TranspileOptions::default();
        let session = TransformSession::new(&ast, &binder, &options, None);
        let stmts = ast.statements(ast.root());
        let name = |stmt: NodeId| match ast.kind(stmt) {
            NodeKind::EnumDeclaration { name, .. } => *name,
            NodeKind::ModuleDeclaration { names, .. } => names[0],
            _ => unreachable!(),
        };
        assert_eq!(session.declaration_keyword(stmts[0], name(stmts[0])), Some("var"));
        assert_eq!(session.declaration_keyword(stmts[1], name(stmts[1])), None);
        assert_eq!(session.declaration_keyword(stmts[2], name(stmts[2])), Some("var"));
        assert!(session.is_instantiated(stmts[2]));
        assert!(!session.is_instantiated(stmts[3]));
    }

    #[test]
    fn test_rewrite_node_applies_inner_edits() {
        let source = "let x = (a as any).b!;";
        let ast = parse(source).unwrap();
        let binder = Binder::bind(&ast);
        let options = TranspileOptions::default();
        let mut session = TransformSession::new(&ast, &binder, &options, None);
        let mut init = None;
        ast.walk(ast.root(), &mut |id| {
            if let NodeKind::VariableDeclarator { init: Some(i), .. } = ast.kind(id) {
                init = Some(*i);
            }
            true
        });
        assert_eq!(session.rewrite_node(init.unwrap()), "(a).b");
        assert!(session.edits.is_empty());
    }
}
