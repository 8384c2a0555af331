//! Class declarations and expressions
//!
//! Type syntax inside a class is removed member by member. Parameter
//! properties become assignments in the constructor body, placed after the
//! top-level `super(...)` call. Decorators are turned into `__decorate`
//! calls after the class; a class with class-level or constructor parameter
//! decorators is wrapped so that the decorated value replaces the binding:
//!
//! ```text
//! let C = (() => {
//!     let C = class C { };
//!     C = __decorate([dec], C);
//!     return C;
//! })();
//! ```

use super::edit::{priority, Edit};
use super::helpers::{self, quote, Helpers};
use super::{ExportKind, TransformSession};
use crate::ast::*;

/// Decorator calls collected while visiting the members of a class
#[derive(Debug, Default)]
struct Decorations {
    /// `__decorate(...)` statements for members, in member order
    members: Vec<String>,
    /// `__param(i, d)` entries of the constructor
    constructor: Vec<String>,
}

impl<'a> TransformSession<'a> {
    pub(crate) fn visit_class_declaration(&mut self, id: NodeId, c: &'a Class) {
        let ast = self.ast;
        let span = ast.span(id);
        if c.modifiers.has(ModifierFlags::DECLARE) {
            self.remove_ambient(span);
            return;
        }
        let kind = self.export_kind(id, &c.modifiers);
        let wrapped =
            !c.decorators.is_empty() || constructor(ast, c).is_some_and(|f| has_param_decorators(ast, f));

        let name = match c.name {
            Some(name) => ast.text(name).to_string(),
            None => {
                let name = self.default_name(id);
                if kind != ExportKind::EsModule || wrapped {
                    self.insert(c.keyword.end, format!(" {}", name));
                }
                name
            }
        };
        let exported = if c.modifiers.has(ModifierFlags::DEFAULT) {
            "default".to_string()
        } else {
            name.clone()
        };

        let decorations = self.visit_class_parts(c, &name, true);
        if wrapped {
            self.wrap_decorated_class(id, c, &name, &exported, &kind, decorations);
            return;
        }

        let removed = match kind {
            ExportKind::CommonJs | ExportKind::Namespace { .. } => {
                ModifierFlags::EXPORT | ModifierFlags::DEFAULT | ModifierFlags::ABSTRACT
            }
            ExportKind::None | ExportKind::EsModule => ModifierFlags::ABSTRACT,
        };
        self.remove_modifiers(&c.modifiers, removed);

        let indent = self.indent_at(span.start);
        if !decorations.members.is_empty() {
            let text: String = decorations
                .members
                .iter()
                .map(|call| format!("\n{}{}", indent, call))
                .collect();
            self.push(Edit::insert(span.end, text).with_priority(priority::MEMBER_DECORATORS));
        }
        self.append_export(span.end, &kind, &exported, &name, priority::CLASS_EXPORT);
    }

    pub(crate) fn visit_class_expression(&mut self, id: NodeId, c: &'a Class) {
        let ast = self.ast;
        let decorated = !c.decorators.is_empty()
            || c.members.iter().any(|&m| member_is_decorated(ast, m));
        if decorated {
            self.note(
                "decorators on a class expression are left unchanged",
                ast.span(id).start,
            );
        }
        let name = c.name.map(|n| ast.text(n).to_string()).unwrap_or_default();
        for &decorator in &c.decorators {
            self.visit(decorator);
        }
        self.visit_class_parts(c, &name, false);
    }

    /// Heritage and members; decorators are collected only when `decorate`
    /// is set, otherwise they are left in place
    fn visit_class_parts(&mut self, c: &'a Class, name: &str, decorate: bool) -> Decorations {
        let source = self.source();
        self.remove_span(c.type_parameters);
        if let Some(extends) = c.extends {
            self.visit(extends);
        }
        self.remove_span(c.extends_type_arguments);
        if let Some(implements) = c.implements {
            let start = source[..implements.start].trim_end().len();
            self.remove(Span::new(start, implements.end));
        }

        let mut decorations = Decorations::default();
        let derived = c.extends.is_some();
        for &member in &c.members {
            self.visit_class_member(member, name, derived, decorate, &mut decorations);
        }
        decorations
    }

    fn visit_class_member(
        &mut self,
        member: NodeId,
        class_name: &str,
        derived: bool,
        decorate: bool,
        decorations: &mut Decorations,
    ) {
        let ast = self.ast;
        let span = ast.span(member);
        match ast.kind(member) {
            NodeKind::IndexSignature { .. } => self.remove(span),
            NodeKind::SemicolonElement => {}
            NodeKind::PropertyDeclaration {
                modifiers,
                decorators,
                name,
                optional,
                definite,
                type_annotation,
                init,
            } => {
                if modifiers.has(ModifierFlags::DECLARE | ModifierFlags::ABSTRACT) {
                    self.remove(span);
                    return;
                }
                if decorate {
                    if let Some(call) =
                        self.member_decoration(decorators, Vec::new(), *name, modifiers, class_name, "void 0")
                    {
                        decorations.members.push(call);
                    }
                }
                let private = matches!(ast.kind(*name), NodeKind::PrivateName);
                if init.is_none() && !private {
                    self.remove(span);
                    return;
                }
                self.visit_decorators(decorators, decorate);
                self.remove_modifiers(modifiers, ModifierFlags::TYPE_ONLY);
                self.visit_property_key(*name);
                self.remove_span(*optional);
                self.remove_span(*definite);
                self.remove_span(*type_annotation);
                if let Some(init) = init {
                    self.visit(*init);
                }
            }
            NodeKind::MethodDeclaration(f) => {
                if f.modifiers.has(ModifierFlags::DECLARE | ModifierFlags::ABSTRACT) || f.body.is_none() {
                    self.remove(span);
                    return;
                }
                if f.kind == FunctionKind::Constructor {
                    if decorate {
                        decorations.constructor = self.parameter_decorations(f);
                    }
                    self.parameter_properties(f, derived);
                } else if decorate {
                    let params = self.parameter_decorations(f);
                    if let Some(name) = f.name {
                        if let Some(call) = self.member_decoration(
                            &f.decorators,
                            params,
                            name,
                            &f.modifiers,
                            class_name,
                            "null",
                        ) {
                            decorations.members.push(call);
                        }
                    }
                }
                self.visit_decorators(&f.decorators, decorate);
                self.remove_modifiers(&f.modifiers, ModifierFlags::TYPE_ONLY);
                if let Some(name) = f.name {
                    self.visit_property_key(name);
                }
                self.visit_function(f);
            }
            _ => self.visit(member),
        }
    }

    fn visit_property_key(&mut self, key: NodeId) {
        if let NodeKind::ComputedPropertyName { expression } = self.ast.kind(key) {
            self.visit(*expression);
        }
    }

    /// Remove collected decorators, or visit them in place
    fn visit_decorators(&mut self, decorators: &[NodeId], decorate: bool) {
        for &decorator in decorators {
            if decorate {
                let span = self.ast.span(decorator);
                let end = helpers::skip_whitespace(self.source(), span.end);
                self.remove(Span::new(span.start, end));
            } else {
                self.visit(decorator);
            }
        }
    }

    fn decorator_text(&mut self, decorator: NodeId) -> String {
        match self.ast.kind(decorator) {
            NodeKind::Decorator { expression } => self.rewrite_node(*expression),
            _ => self.ast.text(decorator).to_string(),
        }
    }

    /// `__decorate([...], C.prototype, "m", null);` for a decorated member
    fn member_decoration(
        &mut self,
        decorators: &[NodeId],
        params: Vec<String>,
        key: NodeId,
        modifiers: &Modifiers,
        class_name: &str,
        descriptor: &str,
    ) -> Option<String> {
        if decorators.is_empty() && params.is_empty() {
            return None;
        }
        let ast = self.ast;
        let mut entries: Vec<String> = decorators.iter().map(|&d| self.decorator_text(d)).collect();
        entries.extend(params);
        let target = if modifiers.has(ModifierFlags::STATIC) {
            class_name.to_string()
        } else {
            format!("{}.prototype", class_name)
        };
        let key = match ast.kind(key) {
            NodeKind::ComputedPropertyName { expression }
                if !matches!(ast.kind(*expression), NodeKind::StringLiteral { .. }) =>
            {
                self.rewrite_node(*expression)
            }
            _ => quote(&ast.property_name(key)),
        };
        self.helpers |= Helpers::DECORATE;
        Some(format!(
            "__decorate([{}], {}, {}, {});",
            entries.join(", "),
            target,
            key,
            descriptor
        ))
    }

    /// `__param(i, d)` for every parameter decorator, removing them
    fn parameter_decorations(&mut self, f: &'a Function) -> Vec<String> {
        let ast = self.ast;
        let mut entries = Vec::new();
        for (index, &param) in f.params.iter().enumerate() {
            let NodeKind::Parameter { decorators, .. } = ast.kind(param) else {
                continue;
            };
            for &decorator in decorators {
                let text = self.decorator_text(decorator);
                entries.push(format!("__param({}, {})", index, text));
            }
            self.visit_decorators(decorators, true);
        }
        if !entries.is_empty() {
            self.helpers |= Helpers::PARAM;
        }
        entries
    }

    /// `this.a = a;` for every parameter property, after the top-level
    /// `super(...)` call when there is one
    fn parameter_properties(&mut self, f: &'a Function, derived: bool) {
        let ast = self.ast;
        let Some(body) = f.body else {
            return;
        };
        let body_span = ast.span(body);
        if derived && !contains_super_call(ast, body) {
            self.push(
                Edit::insert(body_span.start + 1, " super(...arguments);")
                    .with_priority(priority::SUPER_CALL),
            );
        }

        let assignments: Vec<String> = f
            .params
            .iter()
            .filter_map(|&param| match ast.kind(param) {
                NodeKind::Parameter { modifiers, name, .. }
                    if modifiers.has(ModifierFlags::PARAMETER_PROPERTY) =>
                {
                    ast.identifier(*name).map(|n| format!("this.{0} = {0};", n))
                }
                _ => None,
            })
            .collect();
        if assignments.is_empty() {
            return;
        }
        let assignments = assignments.join(" ");
        let super_statement = ast
            .statements(body)
            .iter()
            .copied()
            .find(|&stmt| is_super_call_statement(ast, stmt));
        match super_statement {
            Some(stmt) => {
                let end = ast.span(stmt).end;
                let separator = helpers::statement_separator(self.source(), end);
                self.insert(end, format!("{}{}", separator, assignments));
            }
            None => self.insert(body_span.start + 1, format!(" {}", assignments)),
        }
    }

    /// Wrap a decorated class declaration so the decorated value replaces
    /// the class binding
    fn wrap_decorated_class(
        &mut self,
        id: NodeId,
        c: &'a Class,
        name: &str,
        exported: &str,
        kind: &ExportKind,
        decorations: Decorations,
    ) {
        let ast = self.ast;
        let span = ast.span(id);
        let indent = self.indent_at(span.start);
        let inner = format!("{}    ", indent);
        let keyword = self.options.let_keyword();
        let (open, close) = if self.options.es2015() {
            ("(() => {", "})();")
        } else {
            ("(function () {", "}());")
        };

        let mut class_decorators: Vec<String> =
            c.decorators.iter().map(|&d| self.decorator_text(d)).collect();
        class_decorators.extend(decorations.constructor);
        self.helpers |= Helpers::DECORATE;

        let export = if *kind == ExportKind::EsModule && !c.modifiers.has(ModifierFlags::DEFAULT) {
            "export "
        } else {
            ""
        };
        self.push(Edit::rewrite(
            span.start,
            c.keyword.start,
            format!(
                "{0}{1} {2} = {3}\n{4}{1} {2} = ",
                export, keyword, name, open, inner
            ),
        ));

        let mut members = String::from(";");
        for call in &decorations.members {
            members.push_str(&format!("\n{}{}", inner, call));
        }
        self.push(Edit::insert(span.end, members).with_priority(priority::MEMBER_DECORATORS));
        self.push(
            Edit::insert(
                span.end,
                format!(
                    "\n{0}{1} = __decorate([{2}], {1});",
                    inner,
                    name,
                    class_decorators.join(", ")
                ),
            )
            .with_priority(priority::CLASS_DECORATORS),
        );
        self.push(
            Edit::insert(span.end, format!("\n{}return {};\n{}{}", inner, name, indent, close))
                .with_priority(priority::CLASS_WRAPPER_END),
        );

        let export = match kind {
            ExportKind::CommonJs | ExportKind::Namespace { .. } => {
                if *kind == ExportKind::CommonJs {
                    self.hoist(exported);
                }
                kind.host()
                    .map(|host| format!("{} = {};", helpers::property_access(host, exported), name))
            }
            ExportKind::EsModule if c.modifiers.has(ModifierFlags::DEFAULT) => {
                Some(format!("export default {};", name))
            }
            ExportKind::EsModule | ExportKind::None => None,
        };
        if let Some(export) = export {
            self.push(
                Edit::insert(span.end, format!("\n{}{}", indent, export))
                    .with_priority(priority::CLASS_EXPORT),
            );
        }
    }
}

fn constructor<'a>(ast: &'a Ast, c: &'a Class) -> Option<&'a Function> {
    c.members.iter().find_map(|&m| match ast.kind(m) {
        NodeKind::MethodDeclaration(f) if f.kind == FunctionKind::Constructor && f.body.is_some() => {
            Some(f.as_ref())
        }
        _ => None,
    })
}

fn has_param_decorators(ast: &Ast, f: &Function) -> bool {
    f.params.iter().any(|&p| {
        matches!(ast.kind(p), NodeKind::Parameter { decorators, .. } if !decorators.is_empty())
    })
}

fn member_is_decorated(ast: &Ast, member: NodeId) -> bool {
    match ast.kind(member) {
        NodeKind::PropertyDeclaration { decorators, .. } => !decorators.is_empty(),
        NodeKind::MethodDeclaration(f) => !f.decorators.is_empty() || has_param_decorators(ast, f),
        _ => false,
    }
}

fn is_super_call_statement(ast: &Ast, stmt: NodeId) -> bool {
    matches!(
        ast.kind(stmt),
        NodeKind::ExpressionStatement { expression }
            if matches!(ast.kind(*expression), NodeKind::Call { callee, .. } if matches!(ast.kind(*callee), NodeKind::Super))
    )
}

/// Whether a constructor body calls `super(...)`, looking into arrow
/// functions but not into other functions or classes
fn contains_super_call(ast: &Ast, body: NodeId) -> bool {
    let mut found = false;
    ast.walk(body, &mut |id| {
        if found {
            return false;
        }
        match ast.kind(id) {
            NodeKind::Call { callee, .. } if matches!(ast.kind(*callee), NodeKind::Super) => {
                found = true;
                false
            }
            NodeKind::FunctionDeclaration(_)
            | NodeKind::FunctionExpression(_)
            | NodeKind::MethodDeclaration(_)
            | NodeKind::ClassDeclaration(_)
            | NodeKind::ClassExpression(_) => false,
            _ => true,
        }
    });
    found
}
