//! Imports and exports
//!
//! In CommonJS output an import statement is removed and replaced by one
//! `require` whose insertion belongs to the statement's group, so it
//! disappears when none of the bindings is read. Every binding registers a
//! record that qualifies its uses with the module variable. Exports become
//! assignments to `exports`, pre-declared by the hoist line of the prologue.
//!
//! In ES module output the statements stay; only type-only and unused
//! specifiers are dropped.

use super::edit::{priority, Edit};
use super::helpers::{self, property_access, quote};
use super::references::ReferenceRecord;
use super::{EsmImport, ExportKind, TransformSession};
use crate::ast::*;

impl<'a> TransformSession<'a> {
    // ========== Registration ==========

    /// Register every declaration whose uses are rewritten, ahead of the
    /// traversal
    pub(crate) fn register_declarations(&mut self) {
        let ast = self.ast;
        for &stmt in ast.statements(ast.root()) {
            match ast.kind(stmt) {
                NodeKind::ImportDeclaration { .. } => self.register_import(stmt),
                NodeKind::ImportEquals { .. } => {
                    let host = self.commonjs_module.then_some("exports");
                    self.register_import_equals(stmt, host);
                }
                NodeKind::VariableStatement { modifiers, list }
                    if self.commonjs_module
                        && modifiers.has(ModifierFlags::EXPORT)
                        && !modifiers.has(ModifierFlags::DECLARE) =>
                {
                    self.register_exported_variables(*list, "exports");
                }
                _ => {}
            }
        }

        let mut namespaces = Vec::new();
        ast.walk(ast.root(), &mut |id| {
            if matches!(ast.kind(id), NodeKind::ModuleDeclaration { .. }) {
                namespaces.push(id);
            }
            true
        });
        for namespace in namespaces {
            self.register_namespace(namespace);
        }
    }

    fn register_import(&mut self, stmt: NodeId) {
        let ast = self.ast;
        let NodeKind::ImportDeclaration {
            type_only,
            default,
            namespace,
            named,
            module,
        } = ast.kind(stmt)
        else {
            return;
        };
        if *type_only {
            return;
        }
        let specifiers = named.iter().flatten().copied().filter(|&s| {
            !matches!(ast.kind(s), NodeKind::ImportSpecifier { type_only: true, .. })
        });

        if !self.commonjs_module {
            let mut bindings = Vec::new();
            for binding in default.iter().chain(namespace.iter()).copied() {
                bindings.push((binding, self.register_alias(binding)));
            }
            for specifier in specifiers {
                if let NodeKind::ImportSpecifier { local, .. } = ast.kind(specifier) {
                    bindings.push((specifier, self.register_alias(*local)));
                }
            }
            self.esm_imports.push(EsmImport {
                statement: stmt,
                bindings,
            });
            return;
        }

        if default.is_none() && namespace.is_none() && named.is_none() {
            return;
        }
        let group = self.references.new_group();
        self.groups.insert(stmt, group);
        let variable = match namespace {
            Some(namespace) => {
                self.references.register(
                    ReferenceRecord::alias(ast.span(*namespace).start).in_group(group),
                );
                ast.text(*namespace).to_string()
            }
            None => {
                let specifier = module_specifier(ast, *module);
                self.module_var(stmt, &specifier)
            }
        };
        if let Some(default) = default {
            self.references.register(
                ReferenceRecord::replace(ast.span(*default).start, format!("{}.default", variable))
                    .in_group(group),
            );
        }
        for specifier in specifiers {
            let NodeKind::ImportSpecifier {
                imported, local, ..
            } = ast.kind(specifier)
            else {
                continue;
            };
            let pos = ast.span(*local).start;
            let record = match imported {
                Some(imported) if ast.property_name(*imported) != ast.text(*local) => {
                    let name = ast.property_name(*imported);
                    ReferenceRecord::replace(pos, property_access(&variable, &name))
                }
                _ => ReferenceRecord::prefix(pos, format!("{}.", variable)),
            };
            self.references.register(record.in_group(group).live_binding());
        }
    }

    fn register_alias(&mut self, name: NodeId) -> super::GroupKey {
        let group = self.references.new_group();
        self.references
            .register(ReferenceRecord::alias(self.ast.span(name).start).in_group(group));
        group
    }

    /// `import x = ...`; exported aliases live on `host`
    pub(crate) fn register_import_equals(&mut self, stmt: NodeId, host: Option<&str>) {
        let NodeKind::ImportEquals {
            modifiers,
            type_only,
            name,
            ..
        } = self.ast.kind(stmt)
        else {
            return;
        };
        if *type_only {
            return;
        }
        let pos = self.ast.span(*name).start;
        if modifiers.has(ModifierFlags::EXPORT) {
            if let Some(host) = host {
                self.references
                    .register(ReferenceRecord::prefix(pos, format!("{}.", host)));
            }
            return;
        }
        let group = self.register_alias(*name);
        self.groups.insert(stmt, group);
    }

    /// Exported simple declarators are read and written through `host`
    pub(crate) fn register_exported_variables(&mut self, list: NodeId, host: &str) {
        let ast = self.ast;
        let NodeKind::VariableDeclarationList { declarations, .. } = ast.kind(list) else {
            return;
        };
        if has_binding_pattern(ast, declarations) {
            return;
        }
        for &declarator in declarations {
            if let NodeKind::VariableDeclarator { name, .. } = ast.kind(declarator) {
                self.references
                    .register(ReferenceRecord::prefix(ast.span(*name).start, format!("{}.", host)));
            }
        }
    }

    // ========== Imports ==========

    pub(crate) fn visit_import(&mut self, stmt: NodeId) {
        let ast = self.ast;
        let span = ast.span(stmt);
        let NodeKind::ImportDeclaration {
            type_only, module, ..
        } = ast.kind(stmt)
        else {
            return;
        };
        if *type_only {
            self.remove(span);
            return;
        }
        if !self.commonjs_module {
            return;
        }
        let module = ast.text(*module);
        let Some(&group) = self.groups.get(&stmt) else {
            self.push(Edit::replace(
                span.start,
                span.end,
                format!("require({});", module),
            ));
            return;
        };
        let variable = self.import_variable(stmt);
        self.remove(span);
        self.push(
            Edit::insert(
                span.start,
                format!(
                    "{} {} = require({});",
                    self.options.const_keyword(),
                    variable,
                    module
                ),
            )
            .with_priority(priority::EXPORT_HOIST + 1)
            .with_group(group),
        );
    }

    /// Name of the variable holding a CommonJS import
    fn import_variable(&mut self, stmt: NodeId) -> String {
        let ast = self.ast;
        let NodeKind::ImportDeclaration {
            namespace, module, ..
        } = ast.kind(stmt)
        else {
            return String::new();
        };
        match namespace {
            Some(namespace) => ast.text(*namespace).to_string(),
            None => {
                let specifier = module_specifier(ast, *module);
                self.module_var(stmt, &specifier)
            }
        }
    }

    pub(crate) fn visit_import_equals(&mut self, stmt: NodeId) {
        let ast = self.ast;
        let span = ast.span(stmt);
        let NodeKind::ImportEquals {
            modifiers,
            type_only,
            name,
            reference,
        } = ast.kind(stmt)
        else {
            return;
        };
        if *type_only {
            self.remove(span);
            return;
        }
        let (value, keyword) = match reference {
            ModuleReference::External(module) => (
                format!("require({})", ast.text(*module)),
                self.options.const_keyword(),
            ),
            ModuleReference::Entity(entity) => {
                if !self.entity_has_value(*entity, 0) {
                    self.remove(span);
                    return;
                }
                (self.rewrite_node(*entity), "var")
            }
        };
        let name = ast.text(*name);
        let kind = self.export_kind(stmt, modifiers);
        match kind.host() {
            Some(host) => {
                if kind == ExportKind::CommonJs {
                    self.hoist(name);
                }
                self.push(Edit::replace(
                    span.start,
                    span.end,
                    format!("{} = {};", property_access(host, name), value),
                ));
            }
            None if kind == ExportKind::EsModule => {
                self.push(Edit::replace(
                    span.start,
                    span.end,
                    format!("export {} {} = {};", keyword, name, value),
                ));
            }
            None => {
                self.remove(span);
                let mut edit =
                    Edit::insert(span.start, format!("{} {} = {};", keyword, name, value))
                        .with_priority(priority::EXPORT_HOIST + 1);
                if let Some(&group) = self.groups.get(&stmt) {
                    edit = edit.with_group(group);
                }
                self.push(edit);
            }
        }
    }

    /// Drop unused and type-only specifiers from kept ES imports
    pub(crate) fn finish_imports(&mut self) {
        let ast = self.ast;
        let imports = std::mem::take(&mut self.esm_imports);
        for import in imports {
            let NodeKind::ImportDeclaration {
                default,
                namespace,
                named,
                module,
                ..
            } = ast.kind(import.statement)
            else {
                continue;
            };
            let declared = usize::from(default.is_some())
                + usize::from(namespace.is_some())
                + named.as_ref().map_or(0, Vec::len);
            let used: Vec<NodeId> = import
                .bindings
                .iter()
                .filter(|(_, group)| self.references.is_group_used(*group))
                .map(|(node, _)| *node)
                .collect();
            if used.len() == declared {
                continue;
            }
            let span = ast.span(import.statement);
            if used.is_empty() {
                tracing::debug!(module = ast.text(*module), "elided unused import");
                self.remove(span);
                continue;
            }

            let mut clauses = Vec::new();
            if let Some(default) = default.filter(|d| used.contains(d)) {
                clauses.push(ast.text(default).to_string());
            }
            if let Some(namespace) = namespace.filter(|n| used.contains(n)) {
                clauses.push(format!("* as {}", ast.text(namespace)));
            }
            let specifiers: Vec<&str> = named
                .iter()
                .flatten()
                .filter(|s| used.contains(s))
                .map(|&s| ast.text(s))
                .collect();
            if !specifiers.is_empty() {
                clauses.push(format!("{{ {} }}", specifiers.join(", ")));
            }
            self.push(Edit::replace(
                span.start,
                span.end,
                format!("import {} from {};", clauses.join(", "), ast.text(*module)),
            ));
        }
    }

    // ========== Exports ==========

    /// Append the export of a function or class declaration
    pub(crate) fn export_function(&mut self, id: NodeId, f: &'a Function) {
        let kind = self.export_kind(id, &f.modifiers);
        if matches!(kind, ExportKind::None | ExportKind::EsModule) {
            return;
        }
        self.remove_modifiers(&f.modifiers, ModifierFlags::EXPORT | ModifierFlags::DEFAULT);
        let local = match f.name {
            Some(name) => self.ast.text(name).to_string(),
            None => {
                let name = self.default_name(id);
                self.insert(f.name_insert_at, format!(" {}", name));
                name
            }
        };
        let exported = if f.modifiers.has(ModifierFlags::DEFAULT) {
            "default".to_string()
        } else {
            local.clone()
        };
        let end = self.ast.span(id).end;
        self.append_export(end, &kind, &exported, &local, priority::CLASS_EXPORT);
    }

    /// ` host.name = local;` after a declaration
    pub(crate) fn append_export(
        &mut self,
        at: usize,
        kind: &ExportKind,
        exported: &str,
        local: &str,
        priority: i32,
    ) {
        let Some(host) = kind.host() else {
            return;
        };
        if *kind == ExportKind::CommonJs {
            self.hoist(exported);
        }
        let separator = helpers::statement_separator(self.source(), at);
        let text = format!("{}{} = {};", separator, property_access(host, exported), local);
        self.push(Edit::insert(at, text).with_priority(priority));
    }

    /// `export const a = 1, b;` as assignments to the export host
    pub(crate) fn visit_exported_variables(
        &mut self,
        stmt: NodeId,
        modifiers: &Modifiers,
        list: NodeId,
    ) {
        let ast = self.ast;
        let kind = self.export_kind(stmt, modifiers);
        let Some(host) = kind.host().map(str::to_string) else {
            return;
        };
        let NodeKind::VariableDeclarationList {
            declarations,
            commas,
            ..
        } = ast.kind(list)
        else {
            return;
        };
        let span = ast.span(stmt);
        let mut names = Vec::new();
        for &declarator in declarations {
            if let NodeKind::VariableDeclarator { name, .. } = ast.kind(declarator) {
                bound_names(ast, *name, &mut names);
            }
        }
        if kind == ExportKind::CommonJs {
            for &name in &names {
                self.hoist(ast.text(name));
            }
        }

        if has_binding_pattern(ast, declarations) {
            self.remove_modifiers(modifiers, ModifierFlags::EXPORT);
            self.visit(list);
            let assignments: Vec<String> = names
                .iter()
                .map(|&n| {
                    let name = ast.text(n);
                    format!("{} = {};", property_access(&host, name), name)
                })
                .collect();
            let separator = helpers::statement_separator(self.source(), span.end);
            self.insert(span.end, format!("{}{}", separator, assignments.join(" ")));
            return;
        }

        let kept: Vec<usize> = declarations
            .iter()
            .enumerate()
            .filter(|(_, &d)| {
                matches!(ast.kind(d), NodeKind::VariableDeclarator { init: Some(_), .. })
            })
            .map(|(i, _)| i)
            .collect();
        let (Some(&first), Some(&last)) = (kept.first(), kept.last()) else {
            self.remove(span);
            return;
        };

        self.remove(Span::new(span.start, ast.span(declarations[first]).start));
        for (k, &index) in kept.iter().enumerate() {
            let declarator = declarations[index];
            if let NodeKind::VariableDeclarator { name, .. } = ast.kind(declarator) {
                self.insert(ast.span(*name).start, format!("{}.", host));
            }
            self.visit(declarator);
            let Some(&next) = kept.get(k + 1) else {
                continue;
            };
            let Some(&comma) = commas.get(index) else {
                continue;
            };
            if next == index + 1 {
                self.push(Edit::rewrite(comma, comma + 1, ";"));
            } else {
                let next_start = ast.span(declarations[next]).start;
                self.push(Edit::replace(comma, next_start, "; "));
            }
        }
        if last + 1 < declarations.len() {
            let end = ast.span(declarations[last]).end;
            self.remove(Span::new(end, ast.span(list).end));
        }
    }

    pub(crate) fn visit_export_declaration(&mut self, stmt: NodeId) {
        let ast = self.ast;
        let span = ast.span(stmt);
        let NodeKind::ExportDeclaration {
            type_only,
            clause,
            module,
        } = ast.kind(stmt)
        else {
            return;
        };
        if *type_only {
            self.remove(span);
            return;
        }
        if !self.commonjs_module {
            self.keep_es_export(stmt, clause, *module);
            return;
        }

        let specifiers: Vec<NodeId> = match clause {
            ExportClause::Named(specifiers) => specifiers
                .iter()
                .copied()
                .filter(|&s| {
                    !matches!(ast.kind(s), NodeKind::ExportSpecifier { type_only: true, .. })
                })
                .collect(),
            _ => Vec::new(),
        };
        let text = match (clause, module) {
            (ExportClause::Star, Some(module)) => {
                self.helpers |= helpers::Helpers::EXPORT_STAR;
                format!("__exportStar(require({}), exports);", ast.text(*module))
            }
            (ExportClause::StarAs(name), Some(module)) => {
                let name = ast.property_name(*name);
                self.hoist(&name);
                format!(
                    "{} = require({});",
                    property_access("exports", &name),
                    ast.text(*module)
                )
            }
            (ExportClause::Named(_), Some(module)) => {
                if specifiers.is_empty() {
                    self.remove(span);
                    return;
                }
                let specifier = module_specifier(ast, *module);
                let variable = self.module_var(stmt, &specifier);
                let mut parts = vec![format!(
                    "var {} = require({});",
                    variable,
                    ast.text(*module)
                )];
                for &s in &specifiers {
                    let (local, exported) = export_names(ast, s);
                    self.hoist(&exported);
                    parts.push(getter(&exported, &property_access(&variable, &local)));
                }
                parts.join(" ")
            }
            (ExportClause::Named(_), None) => {
                let mut parts = Vec::new();
                for &s in &specifiers {
                    let NodeKind::ExportSpecifier { local, .. } = ast.kind(s) else {
                        continue;
                    };
                    if !self.exports_value(*local) {
                        continue;
                    }
                    let (name, exported) = export_names(ast, s);
                    self.hoist(&exported);
                    let part = match self.references.lookup(ast, self.binder, *local) {
                        Some(rewrite) if rewrite.live => {
                            getter(&exported, &rewrite.rewritten(&name))
                        }
                        Some(rewrite) => format!(
                            "{} = {};",
                            property_access("exports", &exported),
                            rewrite.rewritten(&name)
                        ),
                        None => format!("{} = {};", property_access("exports", &exported), name),
                    };
                    parts.push(part);
                }
                if parts.is_empty() {
                    self.remove(span);
                    return;
                }
                parts.join(" ")
            }
            (_, None) => return,
        };
        self.push(Edit::replace(span.start, span.end, text));
    }

    /// ES module output: drop type-only specifiers and mark local exports
    /// as uses
    fn keep_es_export(&mut self, stmt: NodeId, clause: &ExportClause, module: Option<NodeId>) {
        let ast = self.ast;
        let ExportClause::Named(specifiers) = clause else {
            return;
        };
        let mut kept = Vec::new();
        for &s in specifiers {
            let NodeKind::ExportSpecifier {
                type_only, local, ..
            } = ast.kind(s)
            else {
                continue;
            };
            if *type_only {
                continue;
            }
            if module.is_none() {
                if !self.exports_value(*local) {
                    continue;
                }
                self.references.lookup(ast, self.binder, *local);
            }
            kept.push(ast.text(s));
        }
        if kept.len() == specifiers.len() {
            return;
        }
        let span = ast.span(stmt);
        if kept.is_empty() && !specifiers.is_empty() {
            self.remove(span);
            return;
        }
        let from = module
            .map(|m| format!(" from {}", ast.text(m)))
            .unwrap_or_default();
        self.push(Edit::replace(
            span.start,
            span.end,
            format!("export {{ {} }}{};", kept.join(", "), from),
        ));
    }

    /// Whether an exported local has a runtime value
    fn exports_value(&self, local: NodeId) -> bool {
        let Some(symbol) = self.binder.resolve_identifier(local) else {
            return true;
        };
        let symbol = self.binder.symbol(symbol);
        !symbol.is_type_only()
            && symbol
                .declarations
                .iter()
                .any(|d| self.declaration_emits(d.node))
    }

    pub(crate) fn visit_export_assignment(
        &mut self,
        stmt: NodeId,
        is_equals: bool,
        expression: NodeId,
    ) {
        let ast = self.ast;
        let span = ast.span(stmt);
        if ast.identifier(expression).is_some() && !self.exports_value(expression) {
            self.remove(span);
            return;
        }
        if self.commonjs_module {
            let target = if is_equals {
                self.export_equals = true;
                "module.exports = "
            } else {
                "exports.default = "
            };
            self.push(Edit::rewrite(span.start, ast.span(expression).start, target));
        }
        self.visit(expression);
    }

    // ========== Prologue ==========

    /// `"use strict"`, helpers, the `__esModule` marker and the hoist line
    pub(crate) fn emit_prologue(&mut self) {
        let ast = self.ast;
        let statements = ast.statements(ast.root());
        let directives: Vec<NodeId> = statements
            .iter()
            .copied()
            .take_while(|&s| match ast.kind(s) {
                NodeKind::ExpressionStatement { expression } => {
                    matches!(ast.kind(*expression), NodeKind::StringLiteral { .. })
                }
                _ => false,
            })
            .collect();
        let use_strict = directives.iter().any(|&s| match ast.kind(s) {
            NodeKind::ExpressionStatement { expression } => matches!(
                ast.kind(*expression),
                NodeKind::StringLiteral { value } if value == "use strict"
            ),
            _ => false,
        });

        if self.options.emit_use_strict && self.options.commonjs() && !use_strict {
            self.push(Edit::insert(0, "\"use strict\";\n").with_priority(priority::USE_STRICT));
        }

        // After the directive prologue each fragment starts a new line;
        // before the first statement each fragment ends one
        let (at, after_directives) = match directives.last() {
            Some(&last) => (ast.span(last).end, true),
            None => (
                statements
                    .first()
                    .map_or(ast.source().len(), |&s| ast.span(s).start),
                false,
            ),
        };
        let line = |text: String| {
            if after_directives {
                format!("\n{}", text.trim_end_matches('\n'))
            } else if text.ends_with('\n') {
                text
            } else {
                format!("{}\n", text)
            }
        };

        if self.options.emit_helpers && !self.helpers.is_empty() {
            let definitions = self.helpers.definitions();
            self.push(Edit::insert(at, line(definitions)).with_priority(priority::HELPERS));
        }
        if !self.commonjs_module {
            return;
        }
        if !self.export_equals {
            let marker = "Object.defineProperty(exports, \"__esModule\", { value: true });";
            self.push(
                Edit::insert(at, line(marker.to_string()))
                    .with_priority(priority::ES_MODULE_MARKER),
            );
        }
        if !self.hoisted.is_empty() {
            let targets: Vec<String> = self
                .hoisted
                .iter()
                .rev()
                .map(|name| property_access("exports", name))
                .collect();
            let hoist = format!("{} = void 0;", targets.join(" = "));
            self.push(Edit::insert(at, line(hoist)).with_priority(priority::EXPORT_HOIST));
        }
    }
}

/// `Object.defineProperty(exports, "b", { ... get ... })` for a live binding
fn getter(exported: &str, value: &str) -> String {
    format!(
        "Object.defineProperty(exports, {}, {{ enumerable: true, get: function () {{ return {}; }} }});",
        quote(exported),
        value
    )
}

/// Local and exported names of an export specifier
fn export_names(ast: &Ast, specifier: NodeId) -> (String, String) {
    let NodeKind::ExportSpecifier {
        local, exported, ..
    } = ast.kind(specifier)
    else {
        return (String::new(), String::new());
    };
    let local_name = ast.property_name(*local);
    let exported_name = exported
        .map(|e| ast.property_name(e))
        .unwrap_or_else(|| local_name.clone());
    (local_name, exported_name)
}

fn module_specifier(ast: &Ast, module: NodeId) -> String {
    match ast.kind(module) {
        NodeKind::StringLiteral { value } => value.clone(),
        _ => ast.text(module).to_string(),
    }
}

fn has_binding_pattern(ast: &Ast, declarations: &[NodeId]) -> bool {
    declarations.iter().any(|&d| {
        matches!(
            ast.kind(d),
            NodeKind::VariableDeclarator { name, .. }
                if !matches!(ast.kind(*name), NodeKind::Identifier)
        )
    })
}

/// Identifiers bound by a binding name, in source order
pub(crate) fn bound_names(ast: &Ast, name: NodeId, out: &mut Vec<NodeId>) {
    match ast.kind(name) {
        NodeKind::Identifier => out.push(name),
        NodeKind::ObjectPattern { elements } => {
            for &element in elements {
                bound_names(ast, element, out);
            }
        }
        NodeKind::ArrayPattern { elements } => {
            for &element in elements.iter().flatten() {
                bound_names(ast, element, out);
            }
        }
        NodeKind::BindingElement { name, .. } => bound_names(ast, *name, out),
        _ => {}
    }
}
