//! Node kinds of the syntax tree
//!
//! Only the distinctions the transform acts on are modelled. Type syntax is
//! never expanded into nodes: annotations, type parameter lists and type
//! arguments are kept as [`Span`]s so that they can be removed verbatim.

use super::{Modifiers, NodeId, Span};

/// What a node is, with the child references relevant to it
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    SourceFile {
        statements: Vec<NodeId>,
    },

    // ---------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------
    Block {
        statements: Vec<NodeId>,
    },
    Empty,
    ExpressionStatement {
        expression: NodeId,
    },
    If {
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    },
    For {
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ForIn {
        left: NodeId,
        right: NodeId,
        body: NodeId,
    },
    ForOf {
        is_await: bool,
        left: NodeId,
        right: NodeId,
        body: NodeId,
    },
    While {
        test: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        test: NodeId,
    },
    Break {
        label: Option<NodeId>,
    },
    Continue {
        label: Option<NodeId>,
    },
    Return {
        argument: Option<NodeId>,
    },
    Throw {
        argument: NodeId,
    },
    Try {
        block: NodeId,
        handler: Option<NodeId>,
        finalizer: Option<NodeId>,
    },
    CatchClause {
        param: Option<NodeId>,
        type_annotation: Option<Span>,
        body: NodeId,
    },
    Switch {
        discriminant: NodeId,
        cases: Vec<NodeId>,
    },
    SwitchCase {
        test: Option<NodeId>,
        body: Vec<NodeId>,
    },
    Labeled {
        label: NodeId,
        body: NodeId,
    },
    With {
        object: NodeId,
        body: NodeId,
    },
    Debugger,

    // ---------------------------------------------------------------
    // Declarations
    // ---------------------------------------------------------------
    VariableStatement {
        modifiers: Modifiers,
        list: NodeId,
    },
    VariableDeclarationList {
        kind: VarKind,
        keyword: Span,
        declarations: Vec<NodeId>,
        /// Offsets of the commas separating the declarators
        commas: Vec<usize>,
    },
    VariableDeclarator {
        name: NodeId,
        definite: Option<Span>,
        type_annotation: Option<Span>,
        init: Option<NodeId>,
    },
    FunctionDeclaration(Box<Function>),
    ClassDeclaration(Box<Class>),
    InterfaceDeclaration {
        modifiers: Modifiers,
        name: NodeId,
    },
    TypeAliasDeclaration {
        modifiers: Modifiers,
        name: NodeId,
    },
    EnumDeclaration {
        modifiers: Modifiers,
        name: NodeId,
        members: Vec<NodeId>,
        /// The braces around the members
        body: Span,
    },
    EnumMember {
        name: NodeId,
        init: Option<NodeId>,
        /// Offset of the comma that follows the member, if any
        comma: Option<usize>,
    },
    /// `namespace A.B.C { }`, `module M { }`, `declare module "m" { }` or
    /// `declare global { }`
    ModuleDeclaration {
        modifiers: Modifiers,
        /// Identifiers of a dotted chain, or a single string literal
        names: Vec<NodeId>,
        body: Option<NodeId>,
        global: bool,
    },
    ModuleBlock {
        statements: Vec<NodeId>,
    },
    ImportDeclaration {
        type_only: bool,
        default: Option<NodeId>,
        namespace: Option<NodeId>,
        named: Option<Vec<NodeId>>,
        module: NodeId,
    },
    ImportSpecifier {
        type_only: bool,
        imported: Option<NodeId>,
        local: NodeId,
    },
    ImportEquals {
        modifiers: Modifiers,
        type_only: bool,
        name: NodeId,
        reference: ModuleReference,
    },
    ExportDeclaration {
        type_only: bool,
        clause: ExportClause,
        module: Option<NodeId>,
    },
    ExportSpecifier {
        type_only: bool,
        local: NodeId,
        exported: Option<NodeId>,
    },
    /// `export = expr` or `export default expr`
    ExportAssignment {
        is_equals: bool,
        expression: NodeId,
    },
    /// `export as namespace X;`
    NamespaceExport {
        name: NodeId,
    },

    // ---------------------------------------------------------------
    // Class elements and function parts
    // ---------------------------------------------------------------
    PropertyDeclaration {
        modifiers: Modifiers,
        decorators: Vec<NodeId>,
        name: NodeId,
        optional: Option<Span>,
        definite: Option<Span>,
        type_annotation: Option<Span>,
        init: Option<NodeId>,
    },
    /// Method, accessor or constructor of a class or object literal
    MethodDeclaration(Box<Function>),
    IndexSignature {
        modifiers: Modifiers,
    },
    StaticBlock {
        body: NodeId,
    },
    SemicolonElement,
    Parameter {
        modifiers: Modifiers,
        decorators: Vec<NodeId>,
        rest: bool,
        name: NodeId,
        optional: Option<Span>,
        type_annotation: Option<Span>,
        init: Option<NodeId>,
    },
    Decorator {
        expression: NodeId,
    },

    // ---------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------
    Identifier,
    PrivateName,
    StringLiteral {
        value: String,
    },
    NumericLiteral {
        value: f64,
    },
    BigIntLiteral,
    RegexLiteral,
    TemplateLiteral {
        expressions: Vec<NodeId>,
    },
    TaggedTemplate {
        tag: NodeId,
        type_arguments: Option<Span>,
        template: NodeId,
    },
    This,
    Super,
    Null,
    True,
    False,
    /// The `import` of `import(...)`
    ImportKeyword,
    /// `new.target` or `import.meta`
    MetaProperty,
    ArrayLiteral {
        elements: Vec<Option<NodeId>>,
    },
    ObjectLiteral {
        properties: Vec<NodeId>,
    },
    PropertyAssignment {
        name: NodeId,
        value: NodeId,
    },
    /// `{ a }`, or `{ a = 1 }` inside an assignment pattern
    ShorthandProperty {
        name: NodeId,
        default: Option<NodeId>,
    },
    SpreadElement {
        expression: NodeId,
    },
    ComputedPropertyName {
        expression: NodeId,
    },
    FunctionExpression(Box<Function>),
    ArrowFunction(Box<Function>),
    ClassExpression(Box<Class>),
    Call {
        callee: NodeId,
        optional: bool,
        type_arguments: Option<Span>,
        arguments: Vec<NodeId>,
    },
    New {
        callee: NodeId,
        type_arguments: Option<Span>,
        arguments: Option<Vec<NodeId>>,
    },
    Member {
        object: NodeId,
        property: NodeId,
        optional: bool,
    },
    Index {
        object: NodeId,
        index: NodeId,
        optional: bool,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        operand: NodeId,
    },
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Assign {
        op: AssignOp,
        target: NodeId,
        value: NodeId,
    },
    Conditional {
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
    },
    Paren {
        expression: NodeId,
    },
    Sequence {
        expressions: Vec<NodeId>,
    },
    Await {
        argument: NodeId,
    },
    Yield {
        argument: Option<NodeId>,
        delegate: bool,
    },
    /// `expr as T`; `type_span` starts at the `as` keyword
    As {
        expression: NodeId,
        type_span: Span,
    },
    /// `expr satisfies T`; `type_span` starts at the `satisfies` keyword
    Satisfies {
        expression: NodeId,
        type_span: Span,
    },
    /// `<T>expr`; `type_span` covers the angle brackets
    TypeAssertion {
        type_span: Span,
        expression: NodeId,
    },
    /// `expr!`
    NonNull {
        expression: NodeId,
    },
    /// `f<T>` not followed by a call
    Instantiation {
        expression: NodeId,
        type_arguments: Span,
    },

    // ---------------------------------------------------------------
    // Binding patterns
    // ---------------------------------------------------------------
    ObjectPattern {
        elements: Vec<NodeId>,
    },
    ArrayPattern {
        elements: Vec<Option<NodeId>>,
    },
    BindingElement {
        /// Property key in `{ key: name }`
        property: Option<NodeId>,
        name: NodeId,
        init: Option<NodeId>,
        rest: bool,
    },
}

/// `var`, `let` or `const`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
        }
    }
}

/// Right-hand side of `import x = ...`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleReference {
    /// `require("m")`; the string literal node
    External(NodeId),
    /// `A.B.C`; an identifier or member expression
    Entity(NodeId),
}

/// What an `export ... ;` statement exports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportClause {
    /// `export { a, b as c }`
    Named(Vec<NodeId>),
    /// `export *`
    Star,
    /// `export * as ns`
    StarAs(NodeId),
}

/// Which flavour of function a [`Function`] is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Declaration,
    Expression,
    Arrow,
    Method,
    Getter,
    Setter,
    Constructor,
}

/// Everything shared by function declarations, expressions, arrows,
/// methods, accessors and constructors
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub kind: FunctionKind,
    pub modifiers: Modifiers,
    pub decorators: Vec<NodeId>,
    /// Binding name, or the property name of a method
    pub name: Option<NodeId>,
    /// Offset where a name belongs when the function has none
    pub name_insert_at: usize,
    /// `?` of an optional method
    pub optional: Option<Span>,
    pub type_parameters: Option<Span>,
    pub params: Vec<NodeId>,
    /// The parenthesised parameter list, or the bare parameter of `x => x`
    pub params_span: Span,
    /// `: T` including the colon
    pub return_type: Option<Span>,
    /// Block body, or the expression body of an arrow
    pub body: Option<NodeId>,
    pub is_async: bool,
    pub is_generator: bool,
}

/// A class declaration or expression
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub modifiers: Modifiers,
    pub decorators: Vec<NodeId>,
    /// The `class` keyword
    pub keyword: Span,
    pub name: Option<NodeId>,
    pub type_parameters: Option<Span>,
    pub extends: Option<NodeId>,
    pub extends_type_arguments: Option<Span>,
    /// `implements A, B` including the keyword
    pub implements: Option<Span>,
    pub members: Vec<NodeId>,
    /// The braces around the members
    pub body: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
    Typeof,
    Void,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    In,
    Instanceof,
    And,
    Or,
    Nullish,
}

impl BinaryOp {
    /// Binding power for precedence climbing; higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Nullish => 1,
            BinaryOp::Or => 2,
            BinaryOp::And => 3,
            BinaryOp::BitOr => 4,
            BinaryOp::BitXor => 5,
            BinaryOp::BitAnd => 6,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::StrictEq | BinaryOp::StrictNotEq => 7,
            BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::LtEq
            | BinaryOp::GtEq
            | BinaryOp::In
            | BinaryOp::Instanceof => 8,
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => 9,
            BinaryOp::Add | BinaryOp::Sub => 10,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 11,
            BinaryOp::Exp => 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Nullish,
}
