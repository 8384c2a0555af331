//! Scopes, symbols and name resolution
//!
//! The binder runs two passes over a parsed file. The first creates a scope
//! for every node that introduces one and declares every binding, so that
//! hoisted functions and `var`s are visible before their declaration. The
//! second walks the tree again and resolves each identifier in value
//! position to a [`SymbolId`].
//!
//! Namespaces and enums merge across declarations that share a scope: the
//! exported members of a namespace and the members of an enum live in the
//! [`Symbol::members`] table of the merged symbol and are visible from the
//! body of every declaration.

mod constant;

pub use constant::{format_number, ConstValue};

use crate::ast::*;
use crate::error::{Diagnostic, SourceLocation};
use bitflags::bitflags;
use rustc_hash::FxHashMap;

/// Index of a symbol in the binder's table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ScopeId(u32);

bitflags! {
    /// What kind of declarations a symbol has
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SymbolFlags: u32 {
        const FUNCTION_SCOPED_VARIABLE = 1 << 0;
        const BLOCK_SCOPED_VARIABLE = 1 << 1;
        const PARAMETER = 1 << 2;
        const FUNCTION = 1 << 3;
        const CLASS = 1 << 4;
        const ENUM = 1 << 5;
        const CONST_ENUM = 1 << 6;
        const ENUM_MEMBER = 1 << 7;
        const NAMESPACE = 1 << 8;
        /// Import binding or `import x = ...`
        const ALIAS = 1 << 9;
        /// Interface, type alias or type-only import
        const TYPE = 1 << 10;

        const VARIABLE = Self::FUNCTION_SCOPED_VARIABLE.bits() | Self::BLOCK_SCOPED_VARIABLE.bits();
        const VALUE = Self::VARIABLE.bits()
            | Self::PARAMETER.bits()
            | Self::FUNCTION.bits()
            | Self::CLASS.bits()
            | Self::ENUM.bits()
            | Self::ENUM_MEMBER.bits();
    }
}

/// One declaration of a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declaration {
    /// The declaring node: declarator, function, class, enum, namespace,
    /// import specifier, parameter or enum member
    pub node: NodeId,
    /// The declaring identifier
    pub name: NodeId,
    pub flags: SymbolFlags,
    pub exported: bool,
}

/// A named entity, possibly declared more than once
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub flags: SymbolFlags,
    /// Declarations in source order
    pub declarations: Vec<Declaration>,
    /// Exported members of a namespace, or the members of an enum
    pub members: FxHashMap<String, SymbolId>,
    /// Namespace or enum this symbol is a member of
    pub parent: Option<SymbolId>,
}

impl Symbol {
    pub fn has(&self, flags: SymbolFlags) -> bool {
        self.flags.intersects(flags)
    }

    /// Declared only as an interface, type alias or type-only import
    pub fn is_type_only(&self) -> bool {
        self.flags.contains(SymbolFlags::TYPE)
            && !self.flags.intersects(SymbolFlags::VALUE | SymbolFlags::NAMESPACE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    File,
    Function,
    Block,
    /// One level of a namespace name; the innermost level holds the body
    Namespace,
    Enum,
    /// Name of a class or function expression
    Name,
}

#[derive(Debug, Clone)]
struct Scope {
    kind: ScopeKind,
    parent: Option<ScopeId>,
    locals: FxHashMap<String, SymbolId>,
    /// Namespace or enum whose members are visible in this scope
    container: Option<SymbolId>,
}

/// Symbol tables and resolved references of one file
#[derive(Debug, Clone, Default)]
pub struct Binder {
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
    node_scopes: FxHashMap<NodeId, ScopeId>,
    /// Identifier in value position to the symbol it refers to
    references: FxHashMap<NodeId, SymbolId>,
    /// Declaring identifier to its symbol
    declared: FxHashMap<NodeId, SymbolId>,
    constants: FxHashMap<NodeId, ConstValue>,
    exports: FxHashMap<String, SymbolId>,
    diagnostics: Vec<Diagnostic>,
    external_module: bool,
}

impl Binder {
    /// Bind a parsed file
    pub fn bind(ast: &Ast) -> Self {
        let mut binder = Binder::default();
        let root = ast.root();
        let file_scope = binder.new_scope(ScopeKind::File, None, None);
        binder.node_scopes.insert(root, file_scope);
        binder.external_module = ast
            .statements(root)
            .iter()
            .any(|&stmt| is_module_syntax(ast, stmt));

        for &stmt in ast.statements(root) {
            binder.declare_node(ast, stmt, file_scope);
        }
        binder.resolve_node(ast, root, file_scope);
        binder.check_export_assignments(ast);
        binder.constants = constant::evaluate_enums(ast, &binder);

        tracing::debug!(
            symbols = binder.symbols.len(),
            references = binder.references.len(),
            diagnostics = binder.diagnostics.len(),
            "bound file"
        );
        binder
    }

    /// Symbol an identifier in value position refers to. Declaring
    /// identifiers and unresolved globals yield `None`.
    pub fn resolve_identifier(&self, node: NodeId) -> Option<SymbolId> {
        self.references.get(&node).copied()
    }

    /// Symbol declared by a declaring identifier
    pub fn declared_symbol(&self, name: NodeId) -> Option<SymbolId> {
        self.declared.get(&name).copied()
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    /// Folded value of an enum member, if it is a compile-time constant
    pub fn constant_value(&self, member: NodeId) -> Option<ConstValue> {
        self.constants.get(&member).cloned()
    }

    /// Problems that make the file impossible to transform
    pub fn syntax_diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Symbol exported from the file under `name`
    pub fn exported_symbol(&self, name: &str) -> Option<SymbolId> {
        self.exports.get(name).copied()
    }

    /// Symbol declared at the top level of the file
    pub fn file_symbol(&self, name: &str) -> Option<SymbolId> {
        self.scopes
            .first()
            .and_then(|scope| scope.locals.get(name))
            .copied()
    }

    /// Member of a namespace or enum
    pub fn member(&self, container: SymbolId, name: &str) -> Option<SymbolId> {
        self.symbol(container).members.get(name).copied()
    }

    /// Whether the file has top-level import or export syntax
    pub fn is_external_module(&self) -> bool {
        self.external_module
    }

    /// Symbol named by an identifier or a dotted member chain
    pub fn entity_symbol(&self, ast: &Ast, expr: NodeId) -> Option<SymbolId> {
        match ast.kind(expr) {
            NodeKind::Identifier => self.resolve_identifier(expr),
            NodeKind::Paren { expression } => self.entity_symbol(ast, *expression),
            NodeKind::Member {
                object, property, ..
            } => {
                let container = self.entity_symbol(ast, *object)?;
                self.member(container, ast.text(*property))
            }
            NodeKind::Index { object, index, .. } => {
                let NodeKind::StringLiteral { value } = ast.kind(*index) else {
                    return None;
                };
                let container = self.entity_symbol(ast, *object)?;
                self.member(container, value)
            }
            _ => None,
        }
    }

    // ========== Scopes and declarations ==========

    fn new_scope(
        &mut self,
        kind: ScopeKind,
        parent: Option<ScopeId>,
        container: Option<SymbolId>,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            kind,
            parent,
            locals: FxHashMap::default(),
            container,
        });
        id
    }

    fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    fn new_symbol(&mut self, name: &str, parent: Option<SymbolId>) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            name: name.to_string(),
            flags: SymbolFlags::empty(),
            declarations: Vec::new(),
            members: FxHashMap::default(),
            parent,
        });
        id
    }

    fn add_declaration(&mut self, symbol: SymbolId, declaration: Declaration) {
        let entry = &mut self.symbols[symbol.index()];
        entry.flags |= declaration.flags;
        entry.declarations.push(declaration);
        self.declared.insert(declaration.name, symbol);
    }

    /// Declare a binding in a scope's local table
    fn declare_local(
        &mut self,
        ast: &Ast,
        scope: ScopeId,
        declaration: Declaration,
    ) -> SymbolId {
        let name = ast.property_name(declaration.name);
        let existing = self.scope(scope).locals.get(&name).copied();
        let symbol = match existing {
            Some(symbol) => symbol,
            None => {
                let symbol = self.new_symbol(&name, None);
                self.scopes[scope.0 as usize].locals.insert(name, symbol);
                symbol
            }
        };
        self.add_declaration(symbol, declaration);
        symbol
    }

    /// Declare a member of a namespace or enum
    fn declare_member(
        &mut self,
        ast: &Ast,
        container: SymbolId,
        declaration: Declaration,
    ) -> SymbolId {
        let name = ast.property_name(declaration.name);
        let symbol = match self.member(container, &name) {
            Some(symbol) => symbol,
            None => {
                let symbol = self.new_symbol(&name, Some(container));
                self.symbols[container.index()].members.insert(name, symbol);
                symbol
            }
        };
        self.add_declaration(symbol, declaration);
        symbol
    }

    /// Declare a statement-level binding, routing exported namespace
    /// members to the namespace's member table
    fn declare_in(
        &mut self,
        ast: &Ast,
        scope: ScopeId,
        declaration: Declaration,
    ) -> SymbolId {
        let container = self.scope(scope).container;
        match (self.scope(scope).kind, container) {
            (ScopeKind::Namespace, Some(container)) if declaration.exported => {
                self.declare_member(ast, container, declaration)
            }
            (ScopeKind::File, _) if declaration.exported => {
                let symbol = self.declare_local(ast, scope, declaration);
                let name = self.symbol(symbol).name.clone();
                self.exports.entry(name).or_insert(symbol);
                symbol
            }
            _ => self.declare_local(ast, scope, declaration),
        }
    }

    /// Nearest scope that receives `var` declarations
    fn var_scope(&self, mut scope: ScopeId) -> ScopeId {
        loop {
            let entry = self.scope(scope);
            match (entry.kind, entry.parent) {
                (ScopeKind::File | ScopeKind::Function | ScopeKind::Namespace, _) => return scope,
                (_, Some(parent)) => scope = parent,
                (_, None) => return scope,
            }
        }
    }

    fn lookup(&self, mut scope: ScopeId, name: &str) -> Option<SymbolId> {
        loop {
            let entry = self.scope(scope);
            if let Some(&symbol) = entry.locals.get(name) {
                return Some(symbol);
            }
            if let Some(container) = entry.container {
                if let Some(symbol) = self.member(container, name) {
                    return Some(symbol);
                }
            }
            scope = entry.parent?;
        }
    }

    /// Declare every identifier bound by a binding name
    fn declare_binding(
        &mut self,
        ast: &Ast,
        scope: ScopeId,
        name: NodeId,
        node: NodeId,
        flags: SymbolFlags,
        exported: bool,
    ) {
        match ast.kind(name) {
            NodeKind::Identifier => {
                self.declare_in(
                    ast,
                    scope,
                    Declaration {
                        node,
                        name,
                        flags,
                        exported,
                    },
                );
            }
            NodeKind::ObjectPattern { elements } => {
                for &element in elements {
                    self.declare_binding(ast, scope, element, element, flags, exported);
                }
            }
            NodeKind::ArrayPattern { elements } => {
                for &element in elements.iter().flatten() {
                    self.declare_binding(ast, scope, element, element, flags, exported);
                }
            }
            NodeKind::BindingElement { name: inner, .. } => {
                self.declare_binding(ast, scope, *inner, node, flags, exported);
            }
            _ => {}
        }
    }

    /// First pass: create scopes and declare bindings
    fn declare_node(&mut self, ast: &Ast, id: NodeId, scope: ScopeId) {
        match ast.kind(id) {
            NodeKind::VariableStatement { modifiers, list } => {
                let exported = modifiers.has(ModifierFlags::EXPORT);
                self.declare_variables(ast, *list, scope, exported);
            }
            NodeKind::VariableDeclarationList { .. } => {
                self.declare_variables(ast, id, scope, false);
            }
            NodeKind::FunctionDeclaration(f) => {
                if let Some(name) = f.name {
                    self.declare_in(
                        ast,
                        scope,
                        Declaration {
                            node: id,
                            name,
                            flags: SymbolFlags::FUNCTION,
                            exported: f.modifiers.has(ModifierFlags::EXPORT),
                        },
                    );
                }
                self.declare_function(ast, id, f, scope);
            }
            NodeKind::FunctionExpression(f) => match f.name {
                Some(name) => {
                    let name_scope = self.new_scope(ScopeKind::Name, Some(scope), None);
                    self.declare_local(
                        ast,
                        name_scope,
                        Declaration {
                            node: id,
                            name,
                            flags: SymbolFlags::FUNCTION,
                            exported: false,
                        },
                    );
                    self.declare_function(ast, id, f, name_scope);
                }
                None => self.declare_function(ast, id, f, scope),
            },
            NodeKind::ArrowFunction(f) | NodeKind::MethodDeclaration(f) => {
                self.declare_function(ast, id, f, scope);
            }
            NodeKind::ClassDeclaration(c) => {
                if let Some(name) = c.name {
                    self.declare_in(
                        ast,
                        scope,
                        Declaration {
                            node: id,
                            name,
                            flags: SymbolFlags::CLASS,
                            exported: c.modifiers.has(ModifierFlags::EXPORT),
                        },
                    );
                }
                self.declare_children(ast, id, scope);
            }
            NodeKind::ClassExpression(c) => match c.name {
                Some(name) => {
                    let name_scope = self.new_scope(ScopeKind::Name, Some(scope), None);
                    self.node_scopes.insert(id, name_scope);
                    self.declare_local(
                        ast,
                        name_scope,
                        Declaration {
                            node: id,
                            name,
                            flags: SymbolFlags::CLASS,
                            exported: false,
                        },
                    );
                    self.declare_children(ast, id, name_scope);
                }
                None => self.declare_children(ast, id, scope),
            },
            NodeKind::InterfaceDeclaration { modifiers, name }
            | NodeKind::TypeAliasDeclaration { modifiers, name } => {
                self.declare_in(
                    ast,
                    scope,
                    Declaration {
                        node: id,
                        name: *name,
                        flags: SymbolFlags::TYPE,
                        exported: modifiers.has(ModifierFlags::EXPORT),
                    },
                );
            }
            NodeKind::EnumDeclaration {
                modifiers,
                name,
                members,
                ..
            } => {
                let flags = if modifiers.has(ModifierFlags::CONST) {
                    SymbolFlags::CONST_ENUM
                } else {
                    SymbolFlags::ENUM
                };
                let symbol = self.declare_in(
                    ast,
                    scope,
                    Declaration {
                        node: id,
                        name: *name,
                        flags,
                        exported: modifiers.has(ModifierFlags::EXPORT),
                    },
                );
                let enum_scope = self.new_scope(ScopeKind::Enum, Some(scope), Some(symbol));
                self.node_scopes.insert(id, enum_scope);
                for &member in members {
                    let NodeKind::EnumMember { name, init, .. } = ast.kind(member) else {
                        continue;
                    };
                    self.declare_member(
                        ast,
                        symbol,
                        Declaration {
                            node: member,
                            name: *name,
                            flags: SymbolFlags::ENUM_MEMBER,
                            exported: true,
                        },
                    );
                    if let Some(init) = init {
                        self.declare_node(ast, *init, enum_scope);
                    }
                }
            }
            NodeKind::ModuleDeclaration {
                modifiers,
                names,
                body,
                global,
            } => {
                let identified = !*global
                    && names
                        .first()
                        .is_some_and(|&n| matches!(ast.kind(n), NodeKind::Identifier));
                if !identified {
                    if let Some(body) = body {
                        let block = self.new_scope(ScopeKind::Namespace, Some(scope), None);
                        self.node_scopes.insert(*body, block);
                        self.declare_statements(ast, *body, block);
                    }
                    return;
                }

                let mut level_scope = scope;
                let mut container: Option<SymbolId> = None;
                for (index, &name) in names.iter().enumerate() {
                    let declaration = Declaration {
                        node: id,
                        name,
                        flags: SymbolFlags::NAMESPACE,
                        exported: index > 0 || modifiers.has(ModifierFlags::EXPORT),
                    };
                    let symbol = match container {
                        Some(parent) => self.declare_member(ast, parent, declaration),
                        None => self.declare_in(ast, scope, declaration),
                    };
                    level_scope =
                        self.new_scope(ScopeKind::Namespace, Some(level_scope), Some(symbol));
                    container = Some(symbol);
                }
                if let Some(body) = body {
                    self.node_scopes.insert(*body, level_scope);
                    self.declare_statements(ast, *body, level_scope);
                }
            }
            NodeKind::ImportDeclaration {
                type_only,
                default,
                namespace,
                named,
                ..
            } => {
                let base = if *type_only {
                    SymbolFlags::ALIAS | SymbolFlags::TYPE
                } else {
                    SymbolFlags::ALIAS
                };
                for name in default.iter().chain(namespace.iter()) {
                    self.declare_local(
                        ast,
                        scope,
                        Declaration {
                            node: id,
                            name: *name,
                            flags: base,
                            exported: false,
                        },
                    );
                }
                for &specifier in named.iter().flatten() {
                    let NodeKind::ImportSpecifier {
                        type_only, local, ..
                    } = ast.kind(specifier)
                    else {
                        continue;
                    };
                    let flags = if *type_only {
                        SymbolFlags::ALIAS | SymbolFlags::TYPE
                    } else {
                        base
                    };
                    self.declare_local(
                        ast,
                        scope,
                        Declaration {
                            node: specifier,
                            name: *local,
                            flags,
                            exported: false,
                        },
                    );
                }
            }
            NodeKind::ImportEquals {
                modifiers,
                type_only,
                name,
                ..
            } => {
                let flags = if *type_only {
                    SymbolFlags::ALIAS | SymbolFlags::TYPE
                } else {
                    SymbolFlags::ALIAS
                };
                self.declare_in(
                    ast,
                    scope,
                    Declaration {
                        node: id,
                        name: *name,
                        flags,
                        exported: modifiers.has(ModifierFlags::EXPORT),
                    },
                );
            }
            NodeKind::Block { .. } => {
                let block = self.new_scope(ScopeKind::Block, Some(scope), None);
                self.node_scopes.insert(id, block);
                self.declare_statements(ast, id, block);
            }
            NodeKind::For { .. }
            | NodeKind::ForIn { .. }
            | NodeKind::ForOf { .. }
            | NodeKind::Switch { .. }
            | NodeKind::CatchClause { .. } => {
                let block = self.new_scope(ScopeKind::Block, Some(scope), None);
                self.node_scopes.insert(id, block);
                if let NodeKind::CatchClause {
                    param: Some(param), ..
                } = ast.kind(id)
                {
                    self.declare_binding(
                        ast,
                        block,
                        *param,
                        id,
                        SymbolFlags::BLOCK_SCOPED_VARIABLE,
                        false,
                    );
                }
                self.declare_children(ast, id, block);
            }
            _ => self.declare_children(ast, id, scope),
        }
    }

    fn declare_children(&mut self, ast: &Ast, id: NodeId, scope: ScopeId) {
        for child in ast.children(id) {
            self.declare_node(ast, child, scope);
        }
    }

    fn declare_statements(&mut self, ast: &Ast, id: NodeId, scope: ScopeId) {
        for &stmt in ast.statements(id) {
            self.declare_node(ast, stmt, scope);
        }
    }

    fn declare_variables(&mut self, ast: &Ast, list: NodeId, scope: ScopeId, exported: bool) {
        let NodeKind::VariableDeclarationList {
            kind, declarations, ..
        } = ast.kind(list)
        else {
            return;
        };
        let (target, flags) = match kind {
            VarKind::Var => (self.var_scope(scope), SymbolFlags::FUNCTION_SCOPED_VARIABLE),
            VarKind::Let | VarKind::Const => (scope, SymbolFlags::BLOCK_SCOPED_VARIABLE),
        };
        for &declarator in declarations {
            let NodeKind::VariableDeclarator { name, init, .. } = ast.kind(declarator) else {
                continue;
            };
            self.declare_binding(ast, target, *name, declarator, flags, exported);
            self.declare_node(ast, *name, scope);
            if let Some(init) = init {
                self.declare_node(ast, *init, scope);
            }
        }
    }

    fn declare_function(&mut self, ast: &Ast, id: NodeId, f: &Function, outer: ScopeId) {
        let scope = self.new_scope(ScopeKind::Function, Some(outer), None);
        self.node_scopes.insert(id, scope);
        for &decorator in &f.decorators {
            self.declare_node(ast, decorator, outer);
        }
        for &param in &f.params {
            let NodeKind::Parameter {
                decorators,
                name,
                init,
                ..
            } = ast.kind(param)
            else {
                continue;
            };
            for &decorator in decorators {
                self.declare_node(ast, decorator, outer);
            }
            self.declare_binding(ast, scope, *name, param, SymbolFlags::PARAMETER, false);
            self.declare_node(ast, *name, scope);
            if let Some(init) = init {
                self.declare_node(ast, *init, scope);
            }
        }
        if let Some(body) = f.body {
            if matches!(ast.kind(body), NodeKind::Block { .. }) {
                self.node_scopes.insert(body, scope);
                self.declare_statements(ast, body, scope);
            } else {
                self.declare_node(ast, body, scope);
            }
        }
    }

    // ========== Resolution ==========

    /// Second pass: resolve identifiers in value position
    fn resolve_node(&mut self, ast: &Ast, id: NodeId, scope: ScopeId) {
        let scope = self.node_scopes.get(&id).copied().unwrap_or(scope);
        match ast.kind(id) {
            NodeKind::Identifier => {
                if let Some(symbol) = self.lookup(scope, ast.text(id)) {
                    self.references.insert(id, symbol);
                }
            }
            NodeKind::Member { object, .. } => self.resolve_node(ast, *object, scope),
            NodeKind::PropertyAssignment { name, value } => {
                self.resolve_property_name(ast, *name, scope);
                self.resolve_node(ast, *value, scope);
            }
            NodeKind::FunctionDeclaration(f)
            | NodeKind::FunctionExpression(f)
            | NodeKind::ArrowFunction(f)
            | NodeKind::MethodDeclaration(f) => {
                let outer = self.scope(scope).parent.unwrap_or(scope);
                for &decorator in &f.decorators {
                    self.resolve_node(ast, decorator, outer);
                }
                if let (NodeKind::MethodDeclaration(_), Some(name)) = (ast.kind(id), f.name) {
                    self.resolve_property_name(ast, name, outer);
                }
                for &param in &f.params {
                    let NodeKind::Parameter {
                        decorators,
                        name,
                        init,
                        ..
                    } = ast.kind(param)
                    else {
                        continue;
                    };
                    for &decorator in decorators {
                        self.resolve_node(ast, decorator, outer);
                    }
                    self.resolve_binding(ast, *name, scope);
                    if let Some(init) = init {
                        self.resolve_node(ast, *init, scope);
                    }
                }
                if let Some(body) = f.body {
                    self.resolve_node(ast, body, scope);
                }
            }
            NodeKind::ClassDeclaration(c) | NodeKind::ClassExpression(c) => {
                for &decorator in &c.decorators {
                    self.resolve_node(ast, decorator, scope);
                }
                if let Some(extends) = c.extends {
                    self.resolve_node(ast, extends, scope);
                }
                for &member in &c.members {
                    self.resolve_node(ast, member, scope);
                }
            }
            NodeKind::PropertyDeclaration {
                decorators,
                name,
                init,
                ..
            } => {
                for &decorator in decorators {
                    self.resolve_node(ast, decorator, scope);
                }
                self.resolve_property_name(ast, *name, scope);
                if let Some(init) = init {
                    self.resolve_node(ast, *init, scope);
                }
            }
            NodeKind::VariableDeclarator { name, init, .. } => {
                self.resolve_binding(ast, *name, scope);
                if let Some(init) = init {
                    self.resolve_node(ast, *init, scope);
                }
            }
            NodeKind::CatchClause { param, body, .. } => {
                if let Some(param) = param {
                    self.resolve_binding(ast, *param, scope);
                }
                self.resolve_node(ast, *body, scope);
            }
            NodeKind::ObjectPattern { .. }
            | NodeKind::ArrayPattern { .. }
            | NodeKind::BindingElement { .. } => self.resolve_binding(ast, id, scope),
            NodeKind::Labeled { body, .. } => self.resolve_node(ast, *body, scope),
            NodeKind::Break { .. }
            | NodeKind::Continue { .. }
            | NodeKind::InterfaceDeclaration { .. }
            | NodeKind::TypeAliasDeclaration { .. }
            | NodeKind::ImportDeclaration { .. }
            | NodeKind::NamespaceExport { .. } => {}
            NodeKind::EnumDeclaration { members, .. } => {
                for &member in members {
                    if let NodeKind::EnumMember {
                        name,
                        init: Some(init),
                        ..
                    } = ast.kind(member)
                    {
                        self.resolve_property_name(ast, *name, scope);
                        self.resolve_node(ast, *init, scope);
                    }
                }
            }
            NodeKind::ModuleDeclaration { body, .. } => {
                if let Some(body) = body {
                    self.resolve_node(ast, *body, scope);
                }
            }
            NodeKind::ImportEquals { reference, .. } => {
                if let ModuleReference::Entity(entity) = reference {
                    self.resolve_node(ast, *entity, scope);
                }
            }
            NodeKind::ExportDeclaration { clause, module, .. } => {
                let ExportClause::Named(specifiers) = clause else {
                    return;
                };
                if module.is_some() {
                    return;
                }
                for &specifier in specifiers {
                    let NodeKind::ExportSpecifier {
                        local, exported, ..
                    } = ast.kind(specifier)
                    else {
                        continue;
                    };
                    if !matches!(ast.kind(*local), NodeKind::Identifier) {
                        continue;
                    }
                    self.resolve_node(ast, *local, scope);
                    if let Some(symbol) = self.resolve_identifier(*local) {
                        let name = ast.property_name(exported.unwrap_or(*local));
                        self.exports.entry(name).or_insert(symbol);
                    }
                }
            }
            _ => {
                for child in ast.children(id) {
                    self.resolve_node(ast, child, scope);
                }
            }
        }
    }

    fn resolve_property_name(&mut self, ast: &Ast, name: NodeId, scope: ScopeId) {
        if let NodeKind::ComputedPropertyName { expression } = ast.kind(name) {
            self.resolve_node(ast, *expression, scope);
        }
    }

    /// Resolve default values and computed keys inside a binding name
    fn resolve_binding(&mut self, ast: &Ast, name: NodeId, scope: ScopeId) {
        match ast.kind(name) {
            NodeKind::ObjectPattern { elements } => {
                for &element in elements {
                    self.resolve_binding(ast, element, scope);
                }
            }
            NodeKind::ArrayPattern { elements } => {
                for &element in elements.iter().flatten() {
                    self.resolve_binding(ast, element, scope);
                }
            }
            NodeKind::BindingElement {
                property,
                name,
                init,
                ..
            } => {
                if let Some(property) = property {
                    self.resolve_property_name(ast, *property, scope);
                }
                self.resolve_binding(ast, *name, scope);
                if let Some(init) = init {
                    self.resolve_node(ast, *init, scope);
                }
            }
            _ => {}
        }
    }

    // ========== Diagnostics ==========

    fn check_export_assignments(&mut self, ast: &Ast) {
        let source = ast.source();
        let mut export_equals = 0;
        let mut defaults = 0;
        let mut other_exports = false;

        for &stmt in ast.statements(ast.root()) {
            let location = SourceLocation::from_offset(source, ast.span(stmt).start);
            match ast.kind(stmt) {
                NodeKind::ExportAssignment { is_equals: true, .. } => {
                    export_equals += 1;
                    if export_equals > 1 {
                        self.diagnostics.push(Diagnostic::new(
                            "A module cannot have multiple 'export =' assignments",
                            location,
                        ));
                    }
                }
                NodeKind::ExportAssignment { is_equals: false, .. } => {
                    defaults += 1;
                    if defaults > 1 {
                        self.diagnostics.push(Diagnostic::new(
                            "A module cannot have multiple default exports",
                            location,
                        ));
                    }
                }
                NodeKind::FunctionDeclaration(f)
                    if f.modifiers.has(ModifierFlags::DEFAULT) && f.body.is_some() =>
                {
                    defaults += 1;
                    if defaults > 1 {
                        self.diagnostics.push(Diagnostic::new(
                            "A module cannot have multiple default exports",
                            location,
                        ));
                    }
                }
                NodeKind::ClassDeclaration(c)
                    if c.modifiers.has(ModifierFlags::DEFAULT)
                        && !c.modifiers.has(ModifierFlags::DECLARE) =>
                {
                    defaults += 1;
                    if defaults > 1 {
                        self.diagnostics.push(Diagnostic::new(
                            "A module cannot have multiple default exports",
                            location,
                        ));
                    }
                }
                _ => {}
            }
            if exports_value(ast, stmt) {
                other_exports = true;
            }
        }

        if export_equals > 0 && (other_exports || defaults > 0) {
            let location = ast
                .statements(ast.root())
                .iter()
                .find(|&&s| {
                    matches!(ast.kind(s), NodeKind::ExportAssignment { is_equals: true, .. })
                })
                .map(|&s| SourceLocation::from_offset(source, ast.span(s).start))
                .unwrap_or_default();
            self.diagnostics.push(Diagnostic::new(
                "An export assignment cannot be used in a module with other exported elements",
                location,
            ));
        }

        let mut nested = Vec::new();
        ast.walk(ast.root(), &mut |id| {
            if let NodeKind::ModuleBlock { statements } = ast.kind(id) {
                nested.extend(statements.iter().copied().filter(|&s| {
                    matches!(ast.kind(s), NodeKind::ExportAssignment { .. })
                }));
            }
            true
        });
        for stmt in nested {
            self.diagnostics.push(Diagnostic::new(
                "An export assignment cannot be used in a namespace",
                SourceLocation::from_offset(source, ast.span(stmt).start),
            ));
        }
    }
}

/// Top-level statement that makes the file a module
fn is_module_syntax(ast: &Ast, stmt: NodeId) -> bool {
    match ast.kind(stmt) {
        NodeKind::ImportDeclaration { .. }
        | NodeKind::ExportDeclaration { .. }
        | NodeKind::ExportAssignment { .. } => true,
        NodeKind::ImportEquals {
            modifiers,
            reference,
            ..
        } => {
            modifiers.has(ModifierFlags::EXPORT)
                || matches!(reference, ModuleReference::External(_))
        }
        _ => statement_modifiers(ast, stmt).is_some_and(|m| m.has(ModifierFlags::EXPORT)),
    }
}

/// Whether a top-level statement exports a value binding
fn exports_value(ast: &Ast, stmt: NodeId) -> bool {
    match ast.kind(stmt) {
        NodeKind::ExportDeclaration { type_only, .. } => !type_only,
        NodeKind::InterfaceDeclaration { .. } | NodeKind::TypeAliasDeclaration { .. } => false,
        _ => statement_modifiers(ast, stmt).is_some_and(|m| {
            m.has(ModifierFlags::EXPORT) && !m.has(ModifierFlags::DEFAULT | ModifierFlags::DECLARE)
        }),
    }
}

/// Modifiers of a declaration statement
pub fn statement_modifiers(ast: &Ast, stmt: NodeId) -> Option<&Modifiers> {
    match ast.kind(stmt) {
        NodeKind::VariableStatement { modifiers, .. }
        | NodeKind::InterfaceDeclaration { modifiers, .. }
        | NodeKind::TypeAliasDeclaration { modifiers, .. }
        | NodeKind::EnumDeclaration { modifiers, .. }
        | NodeKind::ModuleDeclaration { modifiers, .. }
        | NodeKind::ImportEquals { modifiers, .. } => Some(modifiers),
        NodeKind::FunctionDeclaration(f) => Some(&f.modifiers),
        NodeKind::ClassDeclaration(c) => Some(&c.modifiers),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    /// Every identifier node with the given name, in source order
    fn identifiers(ast: &Ast, name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        ast.walk(ast.root(), &mut |id| {
            if ast.identifier(id) == Some(name) {
                found.push(id);
            }
            true
        });
        found
    }

    fn bind(source: &str) -> (Ast, Binder) {
        let ast = parse(source).unwrap();
        let binder = Binder::bind(&ast);
        (ast, binder)
    }

    #[test]
    fn test_resolve_block_scope_shadowing() {
        let (ast, binder) = bind("let a = 1; { let a = 2; a; } a;");
        let ids = identifiers(&ast, "a");
        assert_eq!(ids.len(), 4);
        let outer = binder.declared_symbol(ids[0]).unwrap();
        let inner = binder.declared_symbol(ids[1]).unwrap();
        assert_ne!(outer, inner);
        assert_eq!(binder.resolve_identifier(ids[2]), Some(inner));
        assert_eq!(binder.resolve_identifier(ids[3]), Some(outer));
        assert_eq!(binder.resolve_identifier(ids[0]), None);
    }

    #[test]
    fn test_resolve_hoisted_function_and_var() {
        let (ast, binder) = bind("f(); x; function f() {} if (c) { var x = 1; }");
        let f = identifiers(&ast, "f");
        let x = identifiers(&ast, "x");
        assert_eq!(binder.resolve_identifier(f[0]), binder.declared_symbol(f[1]));
        assert_eq!(binder.resolve_identifier(x[0]), binder.declared_symbol(x[1]));
        assert!(binder.resolve_identifier(identifiers(&ast, "c")[0]).is_none());
    }

    #[test]
    fn test_resolve_parameters_and_catch() {
        let (ast, binder) = bind("const e = 0; function g(e) { return e; } try {} catch (e) { e; } e;");
        let e = identifiers(&ast, "e");
        let top = binder.declared_symbol(e[0]).unwrap();
        let param = binder.declared_symbol(e[1]).unwrap();
        let caught = binder.declared_symbol(e[3]).unwrap();
        assert_eq!(binder.resolve_identifier(e[2]), Some(param));
        assert_eq!(binder.resolve_identifier(e[4]), Some(caught));
        assert_eq!(binder.resolve_identifier(e[5]), Some(top));
        assert!(binder.symbol(param).has(SymbolFlags::PARAMETER));
    }

    #[test]
    fn test_property_names_are_not_references() {
        let (ast, binder) = bind("const a = 1; o.a; ({ a: 2 }); ({ a }); label: a;");
        let a = identifiers(&ast, "a");
        let symbol = binder.declared_symbol(a[0]);
        let resolved: Vec<_> = a.iter().map(|&id| binder.resolve_identifier(id)).collect();
        assert_eq!(resolved, vec![None, None, None, symbol, symbol]);
    }

    #[test]
    fn test_namespace_exports_merge_across_blocks() {
        let (ast, binder) = bind(
            "namespace N { export const x = 1; const y = 2; }\nnamespace N { x; y; }",
        );
        let x = identifiers(&ast, "x");
        let y = identifiers(&ast, "y");
        let n = binder.file_symbol("N").unwrap();
        assert_eq!(binder.symbol(n).declarations.len(), 2);
        let member = binder.member(n, "x").unwrap();
        assert_eq!(binder.resolve_identifier(x[1]), Some(member));
        assert_eq!(binder.resolve_identifier(y[1]), None);
    }

    #[test]
    fn test_dotted_namespace_members() {
        let (_, binder) = bind("namespace A.B { export function f() {} }");
        let a = binder.file_symbol("A").unwrap();
        let b = binder.member(a, "B").unwrap();
        assert!(binder.member(b, "f").is_some());
        assert!(binder.symbol(b).has(SymbolFlags::NAMESPACE));
    }

    #[test]
    fn test_enum_members_visible_in_initializers() {
        let (ast, binder) = bind("enum E { A = 1, B = A << 2 }\nenum E { C = B + 1 }");
        let e = binder.file_symbol("E").unwrap();
        assert_eq!(binder.symbol(e).declarations.len(), 2);
        let b = identifiers(&ast, "B");
        assert_eq!(binder.resolve_identifier(b[1]), binder.member(e, "B"));
    }

    #[test]
    fn test_class_expression_name_scope() {
        let (ast, binder) = bind("const K = class C { m() { return C; } }; C;");
        let c = identifiers(&ast, "C");
        assert_eq!(binder.resolve_identifier(c[1]), binder.declared_symbol(c[0]));
        assert_eq!(binder.resolve_identifier(c[2]), None);
    }

    #[test]
    fn test_imports_and_exports() {
        let (ast, binder) = bind(
            "import d, { a, type T, b as c } from './m';\nconst v = 1;\nexport { v as w };\nexport function f() {}",
        );
        assert!(binder.is_external_module());
        let t = binder.file_symbol("T").unwrap();
        assert!(binder.symbol(t).is_type_only());
        let c = binder.file_symbol("c").unwrap();
        assert!(binder.symbol(c).has(SymbolFlags::ALIAS));
        assert_eq!(binder.exported_symbol("w"), binder.file_symbol("v"));
        assert_eq!(binder.exported_symbol("f"), binder.file_symbol("f"));
        assert!(identifiers(&ast, "d").len() == 1);
    }

    #[test]
    fn test_entity_symbol_through_namespaces() {
        let (ast, binder) = bind("namespace N { export enum E { A } }\nN.E.A;");
        let stmt = ast.statements(ast.root())[1];
        let NodeKind::ExpressionStatement { expression } = ast.kind(stmt) else {
            panic!("expected expression statement");
        };
        let symbol = binder.entity_symbol(&ast, *expression).unwrap();
        assert!(binder.symbol(symbol).has(SymbolFlags::ENUM_MEMBER));
    }

    #[test]
    fn test_duplicate_export_equals() {
        let (_, binder) = bind("export = a;\nexport = b;");
        let messages: Vec<_> = binder
            .syntax_diagnostics()
            .iter()
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(
            messages,
            vec!["A module cannot have multiple 'export =' assignments"]
        );
        assert_eq!(binder.syntax_diagnostics()[0].location.line, 2);
    }

    #[test]
    fn test_export_equals_with_other_exports() {
        let (_, binder) = bind("export const a = 1;\nexport = a;");
        assert_eq!(binder.syntax_diagnostics().len(), 1);
        let (_, clean) = bind("interface I {}\nexport = I;");
        assert!(clean.syntax_diagnostics().is_empty());
    }
}
