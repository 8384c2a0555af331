//! The planner
//!
//! One depth-first traversal over the tree. Type syntax is scheduled for
//! removal where it is met, declarations with a structural rewrite are
//! handed to their transformer, and identifiers in value position are
//! looked up in the reference tracker.

use super::edit::Edit;
use super::references::RewriteMode;
use super::{EnumReference, ExportKind, TransformSession};
use crate::ast::*;
use crate::binder::{ConstValue, SymbolFlags};

impl<'a> TransformSession<'a> {
    pub(crate) fn visit(&mut self, id: NodeId) {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::VariableStatement { modifiers, list } => {
                self.visit_variable_statement(id, modifiers, *list)
            }
            NodeKind::VariableDeclarator {
                name,
                definite,
                type_annotation,
                init,
            } => {
                self.remove_span(*definite);
                self.remove_span(*type_annotation);
                self.visit(*name);
                if let Some(init) = init {
                    self.visit(*init);
                }
            }
            NodeKind::FunctionDeclaration(f) => self.visit_function_declaration(id, f),
            NodeKind::FunctionExpression(f)
            | NodeKind::ArrowFunction(f)
            | NodeKind::MethodDeclaration(f) => self.visit_function(f),
            NodeKind::ClassDeclaration(c) => self.visit_class_declaration(id, c),
            NodeKind::ClassExpression(c) => self.visit_class_expression(id, c),
            NodeKind::InterfaceDeclaration { modifiers, .. }
            | NodeKind::TypeAliasDeclaration { modifiers, .. } => {
                if modifiers.has(ModifierFlags::DECLARE) {
                    self.remove_ambient(ast.span(id));
                } else {
                    self.remove(ast.span(id));
                }
            }
            NodeKind::EnumDeclaration { .. } => self.visit_enum(id),
            NodeKind::ModuleDeclaration { .. } => self.visit_namespace(id),
            NodeKind::ImportDeclaration { .. } => self.visit_import(id),
            NodeKind::ImportEquals { .. } => self.visit_import_equals(id),
            NodeKind::ExportDeclaration { .. } => self.visit_export_declaration(id),
            NodeKind::ExportAssignment {
                is_equals,
                expression,
            } => self.visit_export_assignment(id, *is_equals, *expression),
            NodeKind::NamespaceExport { .. } => self.remove(ast.span(id)),
            NodeKind::CatchClause {
                param,
                type_annotation,
                body,
            } => {
                if let Some(param) = param {
                    self.visit(*param);
                }
                self.remove_span(*type_annotation);
                self.visit(*body);
            }
            NodeKind::Identifier => self.visit_identifier(id),
            NodeKind::ShorthandProperty { name, default } => {
                if let Some(text) = self.rewritten_reference(*name) {
                    self.insert(ast.span(*name).end, format!(": {}", text));
                }
                if let Some(default) = default {
                    self.visit(*default);
                }
            }
            NodeKind::Member { object, .. } => {
                if !self.inline_const_enum(id) {
                    self.visit(*object);
                }
            }
            NodeKind::Index { object, index, .. } => {
                if !self.inline_const_enum(id) {
                    self.visit(*object);
                    self.visit(*index);
                }
            }
            NodeKind::As {
                expression,
                type_span,
            }
            | NodeKind::Satisfies {
                expression,
                type_span,
            } => {
                self.visit(*expression);
                let end = ast.span(*expression).end;
                self.remove(Span::new(end, type_span.end));
            }
            NodeKind::TypeAssertion {
                type_span,
                expression,
            } => {
                let operand = ast.span(*expression);
                if self.source()[type_span.end..operand.start].contains('\n') {
                    // `return <T>\n x` must not become `return\n x`
                    self.push(Edit::replace(type_span.start, type_span.end, "("));
                    self.visit(*expression);
                    self.insert(operand.end, ")");
                } else {
                    self.remove(*type_span);
                    self.visit(*expression);
                }
            }
            NodeKind::NonNull { expression } => {
                self.visit(*expression);
                let end = ast.span(id).end;
                self.remove(Span::new(end - 1, end));
            }
            NodeKind::Instantiation {
                expression,
                type_arguments,
            } => {
                self.visit(*expression);
                self.remove(*type_arguments);
            }
            NodeKind::Call {
                callee,
                type_arguments,
                arguments,
                ..
            } => {
                if matches!(ast.kind(*callee), NodeKind::ImportKeyword) && self.options.commonjs() {
                    self.rewrite_dynamic_import(id, *callee);
                } else {
                    self.visit(*callee);
                }
                self.remove_span(*type_arguments);
                for &argument in arguments {
                    self.visit(argument);
                }
            }
            NodeKind::New {
                callee,
                type_arguments,
                arguments,
            } => {
                self.visit(*callee);
                self.remove_span(*type_arguments);
                for &argument in arguments.iter().flatten() {
                    self.visit(argument);
                }
            }
            NodeKind::TaggedTemplate {
                tag,
                type_arguments,
                template,
            } => {
                self.visit(*tag);
                self.remove_span(*type_arguments);
                self.visit(*template);
            }
            _ => {
                for child in ast.children(id) {
                    self.visit(child);
                }
            }
        }
    }

    pub(crate) fn remove_span(&mut self, span: Option<Span>) {
        if let Some(span) = span {
            self.remove(span);
        }
    }

    /// Remove a list of modifier keywords
    pub(crate) fn remove_modifiers(&mut self, modifiers: &Modifiers, flags: ModifierFlags) {
        for modifier in modifiers.list.iter().filter(|m| m.flag.intersects(flags)) {
            self.remove(modifier.span);
        }
    }

    // ========== Functions ==========

    fn visit_function_declaration(&mut self, id: NodeId, f: &'a Function) {
        let span = self.ast.span(id);
        if f.modifiers.has(ModifierFlags::DECLARE) {
            self.remove_ambient(span);
            return;
        }
        if f.body.is_none() {
            // Overload signature
            self.remove(span);
            return;
        }
        self.export_function(id, f);
        self.visit_function(f);
    }

    /// Signature and body of any function-like node
    pub(crate) fn visit_function(&mut self, f: &'a Function) {
        let ast = self.ast;
        self.remove_span(f.type_parameters);
        self.remove_span(f.optional);
        self.visit_parameters(f);
        self.remove_span(f.return_type);
        let Some(body) = f.body else {
            return;
        };
        if f.kind == FunctionKind::Arrow && self.is_asserted_object(body) {
            let span = ast.span(body);
            self.insert(span.start, "(");
            self.insert(span.end, ")");
        }
        self.visit(body);
    }

    fn visit_parameters(&mut self, f: &'a Function) {
        let ast = self.ast;
        for (index, &param) in f.params.iter().enumerate() {
            let NodeKind::Parameter {
                modifiers,
                name,
                optional,
                type_annotation,
                init,
                ..
            } = ast.kind(param)
            else {
                continue;
            };
            if matches!(ast.kind(*name), NodeKind::This) {
                let end = f
                    .params
                    .get(index + 1)
                    .map(|&next| ast.span(next).start)
                    .unwrap_or(ast.span(param).end);
                self.remove(Span::new(ast.span(param).start, end));
                continue;
            }
            self.remove_modifiers(modifiers, ModifierFlags::all());
            self.visit(*name);
            self.remove_span(*optional);
            self.remove_span(*type_annotation);
            if let Some(init) = init {
                self.visit(*init);
            }
        }
    }

    /// `<T>{ ... }` as the concise body of an arrow
    fn is_asserted_object(&self, body: NodeId) -> bool {
        let mut node = body;
        while let NodeKind::TypeAssertion { expression, .. } = self.ast.kind(node) {
            node = *expression;
        }
        node != body && matches!(self.ast.kind(node), NodeKind::ObjectLiteral { .. })
    }

    fn rewrite_dynamic_import(&mut self, call: NodeId, keyword: NodeId) {
        let span = self.ast.span(keyword);
        let end = self.ast.span(call).end;
        let (open, close) = if self.options.es2015() {
            ("Promise.resolve().then(() => require", ")")
        } else {
            (
                "Promise.resolve().then(function () { return require",
                "; })",
            )
        };
        self.push(Edit::rewrite(span.start, span.end, open));
        self.insert(end, close);
    }

    // ========== Variables ==========

    fn visit_variable_statement(&mut self, id: NodeId, modifiers: &Modifiers, list: NodeId) {
        if modifiers.has(ModifierFlags::DECLARE) {
            self.remove_ambient(self.ast.span(id));
            return;
        }
        match self.export_kind(id, modifiers) {
            ExportKind::CommonJs | ExportKind::Namespace { .. } => {
                self.visit_exported_variables(id, modifiers, list)
            }
            ExportKind::None | ExportKind::EsModule => self.visit(list),
        }
    }

    // ========== References ==========

    fn visit_identifier(&mut self, id: NodeId) {
        let span = self.ast.span(id);
        if let Some(rewrite) = self.references.lookup(self.ast, self.binder, id) {
            match rewrite.mode {
                RewriteMode::Prefix => self.insert(span.start, rewrite.text),
                RewriteMode::Replace => {
                    self.push(Edit::rewrite(span.start, span.end, rewrite.text))
                }
            }
        } else if let Some(prefix) = self.enum_member_prefix(id) {
            self.insert(span.start, prefix);
        }
    }

    /// Full text an identifier occurrence is rewritten to, if any
    fn rewritten_reference(&mut self, id: NodeId) -> Option<String> {
        let name = self.ast.text(id);
        if let Some(rewrite) = self.references.lookup(self.ast, self.binder, id) {
            return Some(rewrite.rewritten(name));
        }
        self.enum_member_prefix(id)
            .map(|prefix| format!("{}{}", prefix, name))
    }

    /// `E.` for a bare reference to a member of enum `E`
    fn enum_member_prefix(&self, id: NodeId) -> Option<String> {
        let symbol = self.binder.symbol(self.binder.resolve_identifier(id)?);
        if !symbol.has(SymbolFlags::ENUM_MEMBER) {
            return None;
        }
        let parent = self.binder.symbol(symbol.parent?);
        Some(format!("{}.", parent.name))
    }

    // ========== Const enums ==========

    /// Replace `E.A` by its value when `E` is a const enum
    fn inline_const_enum(&mut self, access: NodeId) -> bool {
        let Some(value) = self.const_enum_access(access) else {
            return false;
        };
        let ast = self.ast;
        let span = ast.span(access);
        let mut text = value.to_js();
        if text.starts_with('-') && self.is_access_object(access) {
            text = format!("({})", text);
        }
        let original = ast.text(access).replace("*/", "*\\/");
        tracing::trace!(access = %original, value = %text, "inlined const enum member");
        self.push(Edit::rewrite(
            span.start,
            span.end,
            format!("{} /* {} */", text, original),
        ));
        true
    }

    fn is_access_object(&self, node: NodeId) -> bool {
        self.ast.parent(node).is_some_and(|parent| match self.ast.kind(parent) {
            NodeKind::Member { object, .. } | NodeKind::Index { object, .. } => *object == node,
            NodeKind::Call { callee, .. } => *callee == node,
            _ => false,
        })
    }

    fn const_enum_access(&self, access: NodeId) -> Option<ConstValue> {
        let ast = self.ast;
        let (object, member) = match ast.kind(access) {
            NodeKind::Member {
                object,
                property,
                optional: false,
            } => (*object, ast.text(*property).to_string()),
            NodeKind::Index {
                object,
                index,
                optional: false,
            } => match ast.kind(*index) {
                NodeKind::StringLiteral { value } => (*object, value.clone()),
                _ => return None,
            },
            _ => return None,
        };

        let Some(symbol) = self.binder.entity_symbol(ast, object) else {
            let name = ast.identifier(object)?;
            if self.binder.resolve_identifier(object).is_some() {
                return None;
            }
            return self.enums?.const_enum_member(EnumReference::Global {
                name,
                member: &member,
            });
        };
        let entry = self.binder.symbol(symbol);
        if entry.has(SymbolFlags::CONST_ENUM) {
            let member = self.binder.member(symbol, &member)?;
            let declaration = self.binder.symbol(member).declarations.first()?;
            return self.binder.constant_value(declaration.node);
        }
        if entry.has(SymbolFlags::ALIAS) {
            return self.imported_const_enum(symbol, &member);
        }
        None
    }

    fn imported_const_enum(
        &self,
        symbol: crate::binder::SymbolId,
        member: &str,
    ) -> Option<ConstValue> {
        let enums = self.enums?;
        let ast = self.ast;
        let declaration = self.binder.symbol(symbol).declarations.first()?;
        let NodeKind::ImportSpecifier {
            imported, local, ..
        } = ast.kind(declaration.node)
        else {
            return None;
        };
        let import = ast.parent(declaration.node)?;
        let NodeKind::ImportDeclaration { module, .. } = ast.kind(import) else {
            return None;
        };
        let NodeKind::StringLiteral { value: from } = ast.kind(*module) else {
            return None;
        };
        let name = ast.property_name(imported.unwrap_or(*local));
        enums.const_enum_member(EnumReference::Imported {
            module: from,
            name: &name,
            member,
        })
    }
}
