//! Abstract Syntax Tree (AST) for TypeScript source
//!
//! Nodes live in an arena owned by [`Ast`] and refer to each other by
//! [`NodeId`]. Every node records byte offsets into the original text:
//! `pos` is the full start including leading trivia, `span` starts at the
//! first token. Parent links are filled in once parsing is complete.

mod kind;

pub use kind::*;

use bitflags::bitflags;

/// A half-open byte range `[start, end)` in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Empty span at an offset
    pub fn at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies within this span
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Merge two spans into one covering both
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Index of a node in the [`Ast`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// Declaration modifiers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModifierFlags: u16 {
        const EXPORT = 1 << 0;
        const DEFAULT = 1 << 1;
        const DECLARE = 1 << 2;
        const CONST = 1 << 3;
        const ABSTRACT = 1 << 4;
        const PUBLIC = 1 << 5;
        const PRIVATE = 1 << 6;
        const PROTECTED = 1 << 7;
        const READONLY = 1 << 8;
        const OVERRIDE = 1 << 9;
        const STATIC = 1 << 10;
        const ACCESSOR = 1 << 11;
        const IN = 1 << 12;
        const OUT = 1 << 13;

        /// Modifiers that promote a constructor parameter to a field
        const PARAMETER_PROPERTY = Self::PUBLIC.bits()
            | Self::PRIVATE.bits()
            | Self::PROTECTED.bits()
            | Self::READONLY.bits()
            | Self::OVERRIDE.bits();

        /// Modifiers that have no runtime meaning
        const TYPE_ONLY = Self::DECLARE.bits()
            | Self::ABSTRACT.bits()
            | Self::PUBLIC.bits()
            | Self::PRIVATE.bits()
            | Self::PROTECTED.bits()
            | Self::READONLY.bits()
            | Self::OVERRIDE.bits()
            | Self::IN.bits()
            | Self::OUT.bits();
    }
}

/// One modifier keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifier {
    pub flag: ModifierFlags,
    /// The keyword and the whitespace after it, up to the next token
    pub span: Span,
}

/// The modifiers of a declaration in source order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub flags: ModifierFlags,
    pub list: Vec<Modifier>,
}

impl Modifiers {
    pub fn has(&self, flag: ModifierFlags) -> bool {
        self.flags.intersects(flag)
    }

    pub fn push(&mut self, modifier: Modifier) {
        self.flags |= modifier.flag;
        self.list.push(modifier);
    }

    /// Span of the first modifier matching `flag`
    pub fn span_of(&self, flag: ModifierFlags) -> Option<Span> {
        self.list
            .iter()
            .find(|m| m.flag.intersects(flag))
            .map(|m| m.span)
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

/// One arena entry
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Full start, including leading whitespace and comments
    pub pos: usize,
    /// First token to end of the last token
    pub span: Span,
    pub parent: Option<NodeId>,
}

/// A parsed source file
#[derive(Debug, Clone)]
pub struct Ast {
    source: String,
    nodes: Vec<Node>,
    root: NodeId,
}

impl Ast {
    /// Assemble an arena and compute parent links
    pub(crate) fn new(source: String, mut nodes: Vec<Node>, root: NodeId) -> Self {
        for index in 0..nodes.len() {
            let parent = NodeId::new(index);
            for child in children_of(&nodes[index].kind) {
                nodes[child.index()].parent = Some(parent);
            }
        }
        Self {
            source,
            nodes,
            root,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Source text of a node, without leading trivia
    pub fn text(&self, id: NodeId) -> &str {
        let span = self.span(id);
        &self.source[span.start..span.end]
    }

    /// Source text of an arbitrary span
    pub fn slice(&self, span: Span) -> &str {
        &self.source[span.start..span.end]
    }

    /// Child nodes in source order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        children_of(self.kind(id))
    }

    /// Name of an identifier node
    pub fn identifier(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Identifier => Some(self.text(id)),
            _ => None,
        }
    }

    /// Statement list of a file, block, module block or case clause
    pub fn statements(&self, id: NodeId) -> &[NodeId] {
        match self.kind(id) {
            NodeKind::SourceFile { statements }
            | NodeKind::Block { statements }
            | NodeKind::ModuleBlock { statements } => statements,
            NodeKind::SwitchCase { body, .. } => body,
            _ => &[],
        }
    }

    /// Iterate over ancestors, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Name used for a property key: identifier text, string value or
    /// number text. Computed keys yield the text of their expression.
    pub fn property_name(&self, id: NodeId) -> String {
        match self.kind(id) {
            NodeKind::StringLiteral { value } => value.clone(),
            NodeKind::ComputedPropertyName { expression } => match self.kind(*expression) {
                NodeKind::StringLiteral { value } => value.clone(),
                _ => self.text(*expression).to_string(),
            },
            _ => self.text(id).to_string(),
        }
    }

    /// Depth-first pre-order walk from `id`
    pub fn walk(&self, id: NodeId, visit: &mut impl FnMut(NodeId) -> bool) {
        if visit(id) {
            for child in self.children(id) {
                self.walk(child, visit);
            }
        }
    }
}

fn push_opt(out: &mut Vec<NodeId>, id: &Option<NodeId>) {
    if let Some(id) = id {
        out.push(*id);
    }
}

fn function_children(out: &mut Vec<NodeId>, f: &Function) {
    out.extend(&f.decorators);
    push_opt(out, &f.name);
    out.extend(&f.params);
    push_opt(out, &f.body);
}

fn class_children(out: &mut Vec<NodeId>, c: &Class) {
    out.extend(&c.decorators);
    push_opt(out, &c.name);
    push_opt(out, &c.extends);
    out.extend(&c.members);
}

/// Child node ids of a node kind, in source order
fn children_of(kind: &NodeKind) -> Vec<NodeId> {
    let mut out = Vec::new();
    match kind {
        NodeKind::SourceFile { statements }
        | NodeKind::Block { statements }
        | NodeKind::ModuleBlock { statements } => out.extend(statements),
        NodeKind::Empty
        | NodeKind::Debugger
        | NodeKind::IndexSignature { .. }
        | NodeKind::SemicolonElement
        | NodeKind::Identifier
        | NodeKind::PrivateName
        | NodeKind::StringLiteral { .. }
        | NodeKind::NumericLiteral { .. }
        | NodeKind::BigIntLiteral
        | NodeKind::RegexLiteral
        | NodeKind::This
        | NodeKind::Super
        | NodeKind::Null
        | NodeKind::True
        | NodeKind::False
        | NodeKind::ImportKeyword
        | NodeKind::MetaProperty => {}
        NodeKind::ExpressionStatement { expression }
        | NodeKind::Decorator { expression }
        | NodeKind::SpreadElement { expression }
        | NodeKind::ComputedPropertyName { expression }
        | NodeKind::Paren { expression }
        | NodeKind::As { expression, .. }
        | NodeKind::Satisfies { expression, .. }
        | NodeKind::TypeAssertion { expression, .. }
        | NodeKind::NonNull { expression }
        | NodeKind::Instantiation { expression, .. } => out.push(*expression),
        NodeKind::If {
            test,
            consequent,
            alternate,
        } => {
            out.push(*test);
            out.push(*consequent);
            push_opt(&mut out, alternate);
        }
        NodeKind::For {
            init,
            test,
            update,
            body,
        } => {
            push_opt(&mut out, init);
            push_opt(&mut out, test);
            push_opt(&mut out, update);
            out.push(*body);
        }
        NodeKind::ForIn { left, right, body } | NodeKind::ForOf { left, right, body, .. } => {
            out.push(*left);
            out.push(*right);
            out.push(*body);
        }
        NodeKind::While { test, body } => {
            out.push(*test);
            out.push(*body);
        }
        NodeKind::DoWhile { body, test } => {
            out.push(*body);
            out.push(*test);
        }
        NodeKind::Break { label } | NodeKind::Continue { label } => push_opt(&mut out, label),
        NodeKind::Return { argument } => push_opt(&mut out, argument),
        NodeKind::Throw { argument } | NodeKind::Await { argument } => out.push(*argument),
        NodeKind::Try {
            block,
            handler,
            finalizer,
        } => {
            out.push(*block);
            push_opt(&mut out, handler);
            push_opt(&mut out, finalizer);
        }
        NodeKind::CatchClause { param, body, .. } => {
            push_opt(&mut out, param);
            out.push(*body);
        }
        NodeKind::Switch {
            discriminant,
            cases,
        } => {
            out.push(*discriminant);
            out.extend(cases);
        }
        NodeKind::SwitchCase { test, body } => {
            push_opt(&mut out, test);
            out.extend(body);
        }
        NodeKind::Labeled { label, body } => {
            out.push(*label);
            out.push(*body);
        }
        NodeKind::With { object, body } => {
            out.push(*object);
            out.push(*body);
        }
        NodeKind::VariableStatement { list, .. } => out.push(*list),
        NodeKind::VariableDeclarationList { declarations, .. } => out.extend(declarations),
        NodeKind::VariableDeclarator { name, init, .. } => {
            out.push(*name);
            push_opt(&mut out, init);
        }
        NodeKind::FunctionDeclaration(f)
        | NodeKind::FunctionExpression(f)
        | NodeKind::ArrowFunction(f)
        | NodeKind::MethodDeclaration(f) => function_children(&mut out, f),
        NodeKind::ClassDeclaration(c) | NodeKind::ClassExpression(c) => {
            class_children(&mut out, c)
        }
        NodeKind::InterfaceDeclaration { name, .. }
        | NodeKind::TypeAliasDeclaration { name, .. }
        | NodeKind::NamespaceExport { name } => out.push(*name),
        NodeKind::EnumDeclaration { name, members, .. } => {
            out.push(*name);
            out.extend(members);
        }
        NodeKind::EnumMember { name, init, .. } => {
            out.push(*name);
            push_opt(&mut out, init);
        }
        NodeKind::ModuleDeclaration { names, body, .. } => {
            out.extend(names);
            push_opt(&mut out, body);
        }
        NodeKind::ImportDeclaration {
            default,
            namespace,
            named,
            module,
            ..
        } => {
            push_opt(&mut out, default);
            push_opt(&mut out, namespace);
            if let Some(named) = named {
                out.extend(named);
            }
            out.push(*module);
        }
        NodeKind::ImportSpecifier {
            imported, local, ..
        } => {
            push_opt(&mut out, imported);
            out.push(*local);
        }
        NodeKind::ImportEquals {
            name, reference, ..
        } => {
            out.push(*name);
            match reference {
                ModuleReference::External(id) | ModuleReference::Entity(id) => out.push(*id),
            }
        }
        NodeKind::ExportDeclaration { clause, module, .. } => {
            match clause {
                ExportClause::Named(specifiers) => out.extend(specifiers),
                ExportClause::Star => {}
                ExportClause::StarAs(name) => out.push(*name),
            }
            push_opt(&mut out, module);
        }
        NodeKind::ExportSpecifier {
            local, exported, ..
        } => {
            out.push(*local);
            push_opt(&mut out, exported);
        }
        NodeKind::ExportAssignment { expression, .. } => out.push(*expression),
        NodeKind::PropertyDeclaration {
            decorators,
            name,
            init,
            ..
        } => {
            out.extend(decorators);
            out.push(*name);
            push_opt(&mut out, init);
        }
        NodeKind::StaticBlock { body } => out.push(*body),
        NodeKind::Parameter {
            decorators,
            name,
            init,
            ..
        } => {
            out.extend(decorators);
            out.push(*name);
            push_opt(&mut out, init);
        }
        NodeKind::TemplateLiteral { expressions } | NodeKind::Sequence { expressions } => {
            out.extend(expressions)
        }
        NodeKind::TaggedTemplate { tag, template, .. } => {
            out.push(*tag);
            out.push(*template);
        }
        NodeKind::ArrayLiteral { elements } | NodeKind::ArrayPattern { elements } => {
            out.extend(elements.iter().flatten())
        }
        NodeKind::ObjectLiteral { properties } => out.extend(properties),
        NodeKind::ObjectPattern { elements } => out.extend(elements),
        NodeKind::PropertyAssignment { name, value } => {
            out.push(*name);
            out.push(*value);
        }
        NodeKind::ShorthandProperty { name, default } => {
            out.push(*name);
            push_opt(&mut out, default);
        }
        NodeKind::Call {
            callee, arguments, ..
        } => {
            out.push(*callee);
            out.extend(arguments);
        }
        NodeKind::New {
            callee, arguments, ..
        } => {
            out.push(*callee);
            if let Some(arguments) = arguments {
                out.extend(arguments);
            }
        }
        NodeKind::Member {
            object, property, ..
        } => {
            out.push(*object);
            out.push(*property);
        }
        NodeKind::Index { object, index, .. } => {
            out.push(*object);
            out.push(*index);
        }
        NodeKind::Unary { operand, .. } | NodeKind::Update { operand, .. } => out.push(*operand),
        NodeKind::Binary { left, right, .. } => {
            out.push(*left);
            out.push(*right);
        }
        NodeKind::Assign { target, value, .. } => {
            out.push(*target);
            out.push(*value);
        }
        NodeKind::Conditional {
            test,
            consequent,
            alternate,
        } => {
            out.push(*test);
            out.push(*consequent);
            out.push(*alternate);
        }
        NodeKind::Yield { argument, .. } => push_opt(&mut out, argument),
        NodeKind::BindingElement {
            property,
            name,
            init,
            ..
        } => {
            push_opt(&mut out, property);
            out.push(*name);
            push_opt(&mut out, init);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_contains_and_merge() {
        let outer = Span::new(2, 10);
        assert!(outer.contains(Span::new(2, 10)));
        assert!(outer.contains(Span::at(10)));
        assert!(!outer.contains(Span::new(1, 4)));
        assert_eq!(Span::new(4, 6).merge(Span::new(1, 5)), Span::new(1, 6));
    }

    #[test]
    fn test_modifiers_lookup() {
        let mut mods = Modifiers::default();
        mods.push(Modifier {
            flag: ModifierFlags::EXPORT,
            span: Span::new(0, 7),
        });
        mods.push(Modifier {
            flag: ModifierFlags::DECLARE,
            span: Span::new(7, 15),
        });
        assert!(mods.has(ModifierFlags::DECLARE));
        assert!(mods.has(ModifierFlags::TYPE_ONLY));
        assert_eq!(mods.span_of(ModifierFlags::EXPORT), Some(Span::new(0, 7)));
        assert_eq!(mods.span_of(ModifierFlags::STATIC), None);
    }

    #[test]
    fn test_parent_links() {
        let nodes = vec![
            Node {
                kind: NodeKind::Identifier,
                pos: 0,
                span: Span::new(0, 1),
                parent: None,
            },
            Node {
                kind: NodeKind::ExpressionStatement {
                    expression: NodeId::new(0),
                },
                pos: 0,
                span: Span::new(0, 2),
                parent: None,
            },
            Node {
                kind: NodeKind::SourceFile {
                    statements: vec![NodeId::new(1)],
                },
                pos: 0,
                span: Span::new(0, 2),
                parent: None,
            },
        ];
        let ast = Ast::new("a;".to_string(), nodes, NodeId::new(2));
        assert_eq!(ast.parent(NodeId::new(0)), Some(NodeId::new(1)));
        assert_eq!(ast.parent(NodeId::new(1)), Some(NodeId::new(2)));
        assert_eq!(ast.ancestors(NodeId::new(0)).count(), 2);
        assert_eq!(ast.text(NodeId::new(0)), "a");
    }
}
