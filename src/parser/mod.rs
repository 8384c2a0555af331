//! TypeScript parser
//!
//! A recursive descent parser that produces the arena [`Ast`]. Everything
//! with a runtime meaning becomes a node. Type syntax is skipped and kept
//! as spans so later passes can cut it out of the text verbatim.
//!
//! Ambiguous constructs (arrow heads, `f<T>(x)` versus comparisons) are
//! resolved by speculative parsing: the parser saves its token position
//! and arena length, tries one reading, and rewinds on failure.

mod decl;
mod expr;
mod types;

use crate::ast::*;
use crate::error::{messages, Error, Result, SourceLocation};
use crate::lexer::{Keyword, Lexer, Token, TokenKind};

/// Parser state flags
#[derive(Debug, Clone, Copy, Default)]
struct ParserFlags {
    /// `in` is not a binary operator (for-statement heads)
    no_in: bool,
    /// Inside an async function
    in_async: bool,
    /// Inside a generator function
    in_generator: bool,
    /// Parsing a decorator expression, where `[` ends the expression
    in_decorator: bool,
    /// Parsing an `extends` clause, where `<` starts type arguments
    in_heritage: bool,
}

/// A recursive descent parser for TypeScript
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token<'src>>,
    pos: usize,
    nodes: Vec<Node>,
    flags: ParserFlags,
}

impl<'src> Parser<'src> {
    /// Create a new parser from source code
    pub fn new(source: &'src str) -> Result<Self> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self {
            source,
            tokens,
            pos: 0,
            nodes: Vec::new(),
            flags: ParserFlags::default(),
        })
    }

    /// Parse the whole source as a module
    pub fn parse_source_file(mut self) -> Result<Ast> {
        let mut statements = Vec::new();
        while !self.is_eof() {
            statements.push(self.parse_statement()?);
        }
        let span = Span::new(0, self.source.len());
        let root = self.push_node(NodeKind::SourceFile { statements }, 0, span);
        Ok(Ast::new(self.source.to_string(), self.nodes, root))
    }

    // ========== Token Access ==========

    fn current(&self) -> &Token<'src> {
        &self.tokens[self.pos]
    }

    fn peek(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    fn peek_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn text_at(&self, offset: usize) -> &'src str {
        self.tokens.get(self.pos + offset).map(|t| t.text).unwrap_or("")
    }

    fn is_eof(&self) -> bool {
        self.peek() == TokenKind::Eof
    }

    fn location(&self) -> SourceLocation {
        self.current().location
    }

    /// A line break separates the token at `offset` from the one before it
    fn newline_before_at(&self, offset: usize) -> bool {
        self.tokens
            .get(self.pos + offset)
            .is_some_and(|t| t.newline_before)
    }

    /// Create a parse error with source context
    fn error(&self, message: impl Into<String>, location: SourceLocation) -> Error {
        Error::parse_error_with_context(message, location, self.source)
    }

    fn unexpected(&self) -> Error {
        let loc = self.location();
        if self.is_eof() {
            self.error(messages::UNEXPECTED_END, loc)
        } else {
            self.error(
                format!("{} '{}'", messages::UNEXPECTED_TOKEN, self.current().text),
                loc,
            )
        }
    }

    fn expected(&self, what: &str) -> Error {
        let loc = self.location();
        self.error(messages::expected(what, self.current().text), loc)
    }

    fn advance(&mut self) -> Token<'src> {
        let token = self.tokens[self.pos];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'src>> {
        if self.peek() == kind {
            Ok(self.advance())
        } else {
            Err(self.expected(&format!("{:?}", kind)))
        }
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_contextual(&self, word: &str) -> bool {
        self.is_contextual_at(0, word)
    }

    fn is_contextual_at(&self, offset: usize, word: &str) -> bool {
        self.peek_at(offset) == TokenKind::Identifier && self.text_at(offset) == word
    }

    fn consume_contextual(&mut self, word: &str) -> bool {
        if self.is_contextual(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_contextual(&mut self, word: &str) -> Result<()> {
        if self.consume_contextual(word) {
            Ok(())
        } else {
            Err(self.expected(&format!("'{}'", word)))
        }
    }

    fn is_identifier_name_at(&self, offset: usize) -> bool {
        matches!(
            self.peek_at(offset),
            TokenKind::Identifier | TokenKind::Keyword(_)
        )
    }

    fn can_insert_semicolon(&self) -> bool {
        matches!(self.peek(), TokenKind::RightBrace | TokenKind::Eof) || self.current().newline_before
    }

    /// Automatic semicolon insertion (ASI)
    fn consume_semicolon(&mut self) -> Result<()> {
        if self.consume(TokenKind::Semicolon) || self.can_insert_semicolon() {
            Ok(())
        } else {
            Err(self.expected("';'"))
        }
    }

    // ========== Node Construction ==========

    /// End offset of the last consumed token
    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].end()
        }
    }

    /// Span of the current token plus the whitespace that follows it
    fn modifier_span(&self) -> Span {
        let start = self.current().start();
        let end = self
            .tokens
            .get(self.pos + 1)
            .map(|t| t.start())
            .unwrap_or(self.current().end());
        Span::new(start, end)
    }

    fn push_node(&mut self, kind: NodeKind, pos: usize, span: Span) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node {
            kind,
            pos,
            span,
            parent: None,
        });
        id
    }

    /// Allocate a node starting at token index `mark` and ending at the
    /// last consumed token
    fn finish(&mut self, kind: NodeKind, mark: usize) -> NodeId {
        let end = self.prev_end();
        self.finish_at(kind, mark, end)
    }

    fn finish_at(&mut self, kind: NodeKind, mark: usize, end: usize) -> NodeId {
        let start = self.tokens[mark].start();
        let pos = if mark == 0 {
            0
        } else {
            self.tokens[mark - 1].end()
        };
        self.push_node(kind, pos, Span::new(start, end.max(start)))
    }

    /// Run `f` speculatively, rewinding tokens and arena when it fails
    fn speculate<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Option<T> {
        let (pos, len, flags) = (self.pos, self.nodes.len(), self.flags);
        match f(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.pos = pos;
                self.nodes.truncate(len);
                self.flags = flags;
                None
            }
        }
    }

    /// Run `f` inside brackets, where `in` and `[` mean their usual things
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = self.flags;
        self.flags.no_in = false;
        self.flags.in_decorator = false;
        self.flags.in_heritage = false;
        let result = f(self);
        self.flags = saved;
        result
    }

    fn parse_identifier(&mut self) -> Result<NodeId> {
        if self.peek() == TokenKind::Identifier {
            let mark = self.pos;
            self.advance();
            Ok(self.finish(NodeKind::Identifier, mark))
        } else {
            Err(self.expected("identifier"))
        }
    }

    /// Identifier or reserved word, as used after `.` or in specifiers
    fn parse_identifier_name(&mut self) -> Result<NodeId> {
        if self.is_identifier_name_at(0) {
            let mark = self.pos;
            self.advance();
            Ok(self.finish(NodeKind::Identifier, mark))
        } else {
            Err(self.expected("identifier"))
        }
    }

    fn parse_string_literal(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        let token = self.expect(TokenKind::StringLiteral)?;
        let value = string_value(token.text);
        Ok(self.finish(NodeKind::StringLiteral { value }, mark))
    }

    // ========== Statements ==========

    fn parse_statement(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        match self.peek() {
            TokenKind::LeftBrace => self.parse_block(),
            TokenKind::Semicolon => {
                self.advance();
                Ok(self.finish(NodeKind::Empty, mark))
            }
            TokenKind::At | TokenKind::Keyword(Keyword::Export) => {
                self.parse_declaration_with_modifiers()
            }
            TokenKind::Keyword(Keyword::Const) if self.peek_at(1) == TokenKind::Keyword(Keyword::Enum) => {
                self.parse_declaration_with_modifiers()
            }
            TokenKind::Keyword(Keyword::Import)
                if !matches!(self.peek_at(1), TokenKind::LeftParen | TokenKind::Dot) =>
            {
                self.parse_import_declaration(mark, Modifiers::default())
            }
            TokenKind::Keyword(Keyword::Var) | TokenKind::Keyword(Keyword::Const) => {
                self.parse_variable_statement(mark, Modifiers::default())
            }
            TokenKind::Keyword(Keyword::Function) => {
                self.parse_function_declaration(mark, Modifiers::default(), Vec::new())
            }
            TokenKind::Keyword(Keyword::Class) => {
                self.parse_class_declaration(mark, Modifiers::default(), Vec::new())
            }
            TokenKind::Keyword(Keyword::Enum) => self.parse_enum(mark, Modifiers::default()),
            TokenKind::Keyword(Keyword::If) => self.parse_if_statement(),
            TokenKind::Keyword(Keyword::While) => self.parse_while_statement(),
            TokenKind::Keyword(Keyword::Do) => self.parse_do_while_statement(),
            TokenKind::Keyword(Keyword::For) => self.parse_for_statement(),
            TokenKind::Keyword(Keyword::Switch) => self.parse_switch_statement(),
            TokenKind::Keyword(Keyword::Break) | TokenKind::Keyword(Keyword::Continue) => {
                self.parse_break_or_continue()
            }
            TokenKind::Keyword(Keyword::Return) => self.parse_return_statement(),
            TokenKind::Keyword(Keyword::Throw) => {
                self.advance();
                let argument = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(self.finish(NodeKind::Throw { argument }, mark))
            }
            TokenKind::Keyword(Keyword::Try) => self.parse_try_statement(),
            TokenKind::Keyword(Keyword::With) => {
                self.advance();
                self.expect(TokenKind::LeftParen)?;
                let object = self.nested(|p| p.parse_expression())?;
                self.expect(TokenKind::RightParen)?;
                let body = self.parse_statement()?;
                Ok(self.finish(NodeKind::With { object, body }, mark))
            }
            TokenKind::Keyword(Keyword::Debugger) => {
                self.advance();
                self.consume_semicolon()?;
                Ok(self.finish(NodeKind::Debugger, mark))
            }
            TokenKind::Identifier => self.parse_identifier_statement(mark),
            _ => self.parse_expression_statement(),
        }
    }

    /// Statements that start with an identifier: contextual declarations,
    /// labels and plain expressions
    fn parse_identifier_statement(&mut self, mark: usize) -> Result<NodeId> {
        let same_line_next = !self.newline_before_at(1);
        match self.current().text {
            "let" if self.is_let_declaration() => {
                self.parse_variable_statement(mark, Modifiers::default())
            }
            "async"
                if self.peek_at(1) == TokenKind::Keyword(Keyword::Function) && same_line_next =>
            {
                self.parse_function_declaration(mark, Modifiers::default(), Vec::new())
            }
            "declare" | "abstract" if self.modifier_follows() => {
                self.parse_declaration_with_modifiers()
            }
            "interface" if self.peek_at(1) == TokenKind::Identifier && same_line_next => {
                self.parse_interface(mark, Modifiers::default())
            }
            "type" if self.peek_at(1) == TokenKind::Identifier && same_line_next => {
                self.parse_type_alias(mark, Modifiers::default())
            }
            "namespace" if self.peek_at(1) == TokenKind::Identifier && same_line_next => {
                self.parse_module_declaration(mark, Modifiers::default())
            }
            "module"
                if matches!(
                    self.peek_at(1),
                    TokenKind::Identifier | TokenKind::StringLiteral
                ) && same_line_next =>
            {
                self.parse_module_declaration(mark, Modifiers::default())
            }
            "global" if self.peek_at(1) == TokenKind::LeftBrace => {
                self.parse_module_declaration(mark, Modifiers::default())
            }
            _ if self.peek_at(1) == TokenKind::Colon => {
                let label = self.parse_identifier()?;
                self.advance();
                let body = self.parse_statement()?;
                Ok(self.finish(NodeKind::Labeled { label, body }, mark))
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn is_let_declaration(&self) -> bool {
        self.is_contextual("let")
            && matches!(
                self.peek_at(1),
                TokenKind::Identifier | TokenKind::LeftBrace | TokenKind::LeftBracket
            )
    }

    /// A declaration keyword follows the current token on the same line
    fn modifier_follows(&self) -> bool {
        if self.newline_before_at(1) {
            return false;
        }
        match self.peek_at(1) {
            TokenKind::Keyword(
                Keyword::Var
                | Keyword::Const
                | Keyword::Function
                | Keyword::Class
                | Keyword::Enum
                | Keyword::Import
                | Keyword::Export,
            ) => true,
            TokenKind::Identifier => matches!(
                self.text_at(1),
                "let"
                    | "interface"
                    | "type"
                    | "namespace"
                    | "module"
                    | "global"
                    | "abstract"
                    | "async"
                    | "declare"
            ),
            _ => false,
        }
    }

    pub(crate) fn parse_block(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        self.expect(TokenKind::LeftBrace)?;
        let statements = self.nested(|p| p.parse_statement_list())?;
        self.expect(TokenKind::RightBrace)?;
        Ok(self.finish(NodeKind::Block { statements }, mark))
    }

    /// Statements up to (not including) the closing `}`
    fn parse_statement_list(&mut self) -> Result<Vec<NodeId>> {
        let mut statements = Vec::new();
        while self.peek() != TokenKind::RightBrace {
            if self.is_eof() {
                return Err(self.unexpected());
            }
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    fn parse_expression_statement(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        let expression = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(self.finish(NodeKind::ExpressionStatement { expression }, mark))
    }

    fn parse_variable_statement(&mut self, mark: usize, modifiers: Modifiers) -> Result<NodeId> {
        let list = self.parse_variable_list()?;
        self.consume_semicolon()?;
        Ok(self.finish(NodeKind::VariableStatement { modifiers, list }, mark))
    }

    /// `var a = 1, b` without the terminating semicolon
    fn parse_variable_list(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        let token = self.advance();
        let kind = match token.text {
            "var" => VarKind::Var,
            "let" => VarKind::Let,
            _ => VarKind::Const,
        };
        let keyword = Span::new(token.start(), token.end());

        let mut declarations = Vec::new();
        let mut commas = Vec::new();
        loop {
            declarations.push(self.parse_variable_declarator()?);
            if self.peek() != TokenKind::Comma {
                break;
            }
            commas.push(self.current().start());
            self.advance();
        }

        Ok(self.finish(
            NodeKind::VariableDeclarationList {
                kind,
                keyword,
                declarations,
                commas,
            },
            mark,
        ))
    }

    fn parse_variable_declarator(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        let name = self.parse_binding_name()?;
        let definite = if self.peek() == TokenKind::Bang && !self.current().newline_before {
            let bang = self.advance();
            Some(Span::new(bang.start(), bang.end()))
        } else {
            None
        };
        let type_annotation = self.parse_type_annotation()?;
        let init = if self.consume(TokenKind::Equals) {
            Some(self.parse_assignment()?)
        } else {
            None
        };
        Ok(self.finish(
            NodeKind::VariableDeclarator {
                name,
                definite,
                type_annotation,
                init,
            },
            mark,
        ))
    }

    fn parse_paren_expression(&mut self) -> Result<NodeId> {
        self.expect(TokenKind::LeftParen)?;
        let expression = self.nested(|p| p.parse_expression())?;
        self.expect(TokenKind::RightParen)?;
        Ok(expression)
    }

    fn parse_if_statement(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        self.advance();
        let test = self.parse_paren_expression()?;
        let consequent = self.parse_statement()?;
        let alternate = if self.consume(TokenKind::Keyword(Keyword::Else)) {
            Some(self.parse_statement()?)
        } else {
            None
        };
        Ok(self.finish(
            NodeKind::If {
                test,
                consequent,
                alternate,
            },
            mark,
        ))
    }

    fn parse_while_statement(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        self.advance();
        let test = self.parse_paren_expression()?;
        let body = self.parse_statement()?;
        Ok(self.finish(NodeKind::While { test, body }, mark))
    }

    fn parse_do_while_statement(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        self.advance();
        let body = self.parse_statement()?;
        self.expect(TokenKind::Keyword(Keyword::While))?;
        let test = self.parse_paren_expression()?;
        // The semicolon after do-while is always optional
        self.consume(TokenKind::Semicolon);
        Ok(self.finish(NodeKind::DoWhile { body, test }, mark))
    }

    fn parse_for_statement(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        self.advance();
        let is_await = self.consume_contextual("await");
        self.expect(TokenKind::LeftParen)?;

        let init = if self.peek() == TokenKind::Semicolon {
            None
        } else {
            let saved = self.flags;
            self.flags.no_in = true;
            let init = if matches!(
                self.peek(),
                TokenKind::Keyword(Keyword::Var) | TokenKind::Keyword(Keyword::Const)
            ) || self.is_let_declaration()
            {
                self.parse_variable_list()
            } else {
                self.parse_expression()
            };
            self.flags = saved;
            Some(init?)
        };

        if let Some(left) = init {
            if self.consume_contextual("of") {
                let right = self.nested(|p| p.parse_assignment())?;
                self.expect(TokenKind::RightParen)?;
                let body = self.parse_statement()?;
                return Ok(self.finish(
                    NodeKind::ForOf {
                        is_await,
                        left,
                        right,
                        body,
                    },
                    mark,
                ));
            }
            if self.consume(TokenKind::Keyword(Keyword::In)) {
                let right = self.nested(|p| p.parse_expression())?;
                self.expect(TokenKind::RightParen)?;
                let body = self.parse_statement()?;
                return Ok(self.finish(NodeKind::ForIn { left, right, body }, mark));
            }
        }

        self.expect(TokenKind::Semicolon)?;
        let test = if self.peek() != TokenKind::Semicolon {
            Some(self.nested(|p| p.parse_expression())?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        let update = if self.peek() != TokenKind::RightParen {
            Some(self.nested(|p| p.parse_expression())?)
        } else {
            None
        };
        self.expect(TokenKind::RightParen)?;
        let body = self.parse_statement()?;

        Ok(self.finish(
            NodeKind::For {
                init,
                test,
                update,
                body,
            },
            mark,
        ))
    }

    fn parse_switch_statement(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        self.advance();
        let discriminant = self.parse_paren_expression()?;
        self.expect(TokenKind::LeftBrace)?;

        let mut cases = Vec::new();
        while !self.consume(TokenKind::RightBrace) {
            let case_mark = self.pos;
            let test = if self.consume(TokenKind::Keyword(Keyword::Case)) {
                Some(self.nested(|p| p.parse_expression())?)
            } else {
                self.expect(TokenKind::Keyword(Keyword::Default))?;
                None
            };
            self.expect(TokenKind::Colon)?;

            let mut body = Vec::new();
            while !matches!(
                self.peek(),
                TokenKind::Keyword(Keyword::Case)
                    | TokenKind::Keyword(Keyword::Default)
                    | TokenKind::RightBrace
            ) {
                if self.is_eof() {
                    return Err(self.unexpected());
                }
                body.push(self.parse_statement()?);
            }
            cases.push(self.finish(NodeKind::SwitchCase { test, body }, case_mark));
        }

        Ok(self.finish(
            NodeKind::Switch {
                discriminant,
                cases,
            },
            mark,
        ))
    }

    fn parse_break_or_continue(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        let keyword = self.advance();
        let label = if self.peek() == TokenKind::Identifier && !self.current().newline_before {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        self.consume_semicolon()?;
        let kind = if keyword.kind == TokenKind::Keyword(Keyword::Break) {
            NodeKind::Break { label }
        } else {
            NodeKind::Continue { label }
        };
        Ok(self.finish(kind, mark))
    }

    fn parse_return_statement(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        self.advance();
        let argument = if self.peek() == TokenKind::Semicolon || self.can_insert_semicolon() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;
        Ok(self.finish(NodeKind::Return { argument }, mark))
    }

    fn parse_try_statement(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        self.advance();
        let block = self.parse_block()?;

        let handler = if self.peek() == TokenKind::Keyword(Keyword::Catch) {
            let catch_mark = self.pos;
            self.advance();
            let (param, type_annotation) = if self.consume(TokenKind::LeftParen) {
                let param = self.parse_binding_name()?;
                let type_annotation = self.parse_type_annotation()?;
                self.expect(TokenKind::RightParen)?;
                (Some(param), type_annotation)
            } else {
                (None, None)
            };
            let body = self.parse_block()?;
            Some(self.finish(
                NodeKind::CatchClause {
                    param,
                    type_annotation,
                    body,
                },
                catch_mark,
            ))
        } else {
            None
        };

        let finalizer = if self.consume(TokenKind::Keyword(Keyword::Finally)) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.expected("'catch' or 'finally'"));
        }

        Ok(self.finish(
            NodeKind::Try {
                block,
                handler,
                finalizer,
            },
            mark,
        ))
    }
}

/// Decode the value of a quoted string literal
pub(crate) fn string_value(text: &str) -> String {
    let inner = if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        ""
    };
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('b') => result.push('\u{8}'),
            Some('f') => result.push('\u{c}'),
            Some('v') => result.push('\u{b}'),
            Some('0') => result.push('\0'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                if let Some(c) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    result.push(c);
                }
            }
            Some('u') => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|&c| c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                if let Some(c) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    result.push(c);
                }
            }
            // Line continuation
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some('\n') | Some('\u{2028}') | Some('\u{2029}') => {}
            Some(other) => result.push(other),
            None => {}
        }
    }

    result
}

/// Numeric value of a number literal
pub(crate) fn number_value(text: &str) -> f64 {
    let clean: String = text.chars().filter(|&c| c != '_').collect();
    let radix = match clean.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0b") | Some("0B") => Some(2),
        Some("0o") | Some("0O") => Some(8),
        _ => None,
    };
    if let Some(radix) = radix {
        return clean[2..]
            .chars()
            .filter_map(|c| c.to_digit(radix))
            .fold(0.0, |acc, d| acc * radix as f64 + d as f64);
    }
    // Legacy octal such as 0777
    if clean.len() > 1 && clean.starts_with('0') && clean.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        return clean[1..]
            .chars()
            .filter_map(|c| c.to_digit(8))
            .fold(0.0, |acc, d| acc * 8.0 + d as f64);
    }
    clean.parse::<f64>().unwrap_or(f64::NAN)
}

/// Parse TypeScript source into an [`Ast`]
pub fn parse(source: &str) -> Result<Ast> {
    Parser::new(source)?.parse_source_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statements(ast: &Ast) -> Vec<NodeId> {
        ast.statements(ast.root()).to_vec()
    }

    fn first_statement(source: &str) -> (Ast, NodeId) {
        let ast = parse(source).unwrap();
        let first = statements(&ast)[0];
        (ast, first)
    }

    #[test]
    fn test_parse_variable_declaration() {
        let (ast, stmt) = first_statement("let x: number = 1, y!: string;");
        let NodeKind::VariableStatement { list, .. } = ast.kind(stmt) else {
            panic!("expected variable statement");
        };
        let NodeKind::VariableDeclarationList {
            kind,
            declarations,
            commas,
            ..
        } = ast.kind(*list)
        else {
            panic!("expected declaration list");
        };
        assert_eq!(*kind, VarKind::Let);
        assert_eq!(declarations.len(), 2);
        assert_eq!(commas, &vec![17]);
        let NodeKind::VariableDeclarator {
            type_annotation, ..
        } = ast.kind(declarations[0])
        else {
            panic!("expected declarator");
        };
        assert_eq!(ast.slice(type_annotation.unwrap()), ": number");
        assert_eq!(ast.span(stmt), Span::new(0, 30));
    }

    #[test]
    fn test_parse_asi() {
        let ast = parse("let a = 1\nlet b = a\nb++\n").unwrap();
        assert_eq!(statements(&ast).len(), 3);
        assert!(parse("let a = 1 let b = 2").is_err());
    }

    #[test]
    fn test_parse_enum_members_and_commas() {
        let (ast, stmt) = first_statement("enum Color { Red, Green = 5, \"Blue\" }");
        let NodeKind::EnumDeclaration { members, .. } = ast.kind(stmt) else {
            panic!("expected enum");
        };
        assert_eq!(members.len(), 3);
        let NodeKind::EnumMember { comma, .. } = ast.kind(members[0]) else {
            panic!("expected member");
        };
        assert_eq!(*comma, Some(16));
        assert_eq!(ast.text(members[1]), "Green = 5");
        let NodeKind::EnumMember { comma, name, .. } = ast.kind(members[2]) else {
            panic!("expected member");
        };
        assert_eq!(*comma, None);
        assert!(matches!(ast.kind(*name), NodeKind::StringLiteral { value } if value == "Blue"));
    }

    #[test]
    fn test_parse_const_enum_modifier() {
        let (ast, stmt) = first_statement("export const enum E { A }");
        let NodeKind::EnumDeclaration { modifiers, .. } = ast.kind(stmt) else {
            panic!("expected enum");
        };
        assert!(modifiers.has(ModifierFlags::EXPORT));
        assert!(modifiers.has(ModifierFlags::CONST));
        assert_eq!(ast.slice(modifiers.list[1].span), "const ");
    }

    #[test]
    fn test_parse_arrow_versus_parenthesized() {
        let (ast, stmt) = first_statement("f((a, b) => a + b, (c));");
        let NodeKind::ExpressionStatement { expression } = ast.kind(stmt) else {
            panic!("expected expression statement");
        };
        let NodeKind::Call { arguments, .. } = ast.kind(*expression) else {
            panic!("expected call");
        };
        assert!(matches!(ast.kind(arguments[0]), NodeKind::ArrowFunction(_)));
        assert!(matches!(ast.kind(arguments[1]), NodeKind::Paren { .. }));
    }

    #[test]
    fn test_parse_generic_arrow_and_return_type() {
        let (ast, stmt) = first_statement("const id = <T,>(x: T): T => x;");
        let mut arrows = 0;
        ast.walk(stmt, &mut |id| {
            if let NodeKind::ArrowFunction(f) = ast.kind(id) {
                arrows += 1;
                assert_eq!(ast.slice(f.type_parameters.unwrap()), "<T,>");
                assert_eq!(ast.slice(f.return_type.unwrap()), ": T");
            }
            true
        });
        assert_eq!(arrows, 1);
    }

    #[test]
    fn test_parse_generic_call_versus_comparison() {
        let (ast, stmt) = first_statement("a < b > c;");
        let NodeKind::ExpressionStatement { expression } = ast.kind(stmt) else {
            panic!("expected expression statement");
        };
        assert!(matches!(
            ast.kind(*expression),
            NodeKind::Binary {
                op: BinaryOp::Gt,
                ..
            }
        ));

        let (ast, stmt) = first_statement("f<string, Array<number>>(1);");
        let NodeKind::ExpressionStatement { expression } = ast.kind(stmt) else {
            panic!("expected expression statement");
        };
        let NodeKind::Call { type_arguments, .. } = ast.kind(*expression) else {
            panic!("expected call");
        };
        assert_eq!(
            ast.slice(type_arguments.unwrap()),
            "<string, Array<number>>"
        );
    }

    #[test]
    fn test_parse_shift_operators_from_split_tokens() {
        let (ast, stmt) = first_statement("x >>>= y >> 2 >= 1;");
        let NodeKind::ExpressionStatement { expression } = ast.kind(stmt) else {
            panic!("expected expression statement");
        };
        let NodeKind::Assign { op, value, .. } = ast.kind(*expression) else {
            panic!("expected assignment");
        };
        assert_eq!(*op, AssignOp::UShr);
        assert!(matches!(
            ast.kind(*value),
            NodeKind::Binary {
                op: BinaryOp::GtEq,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_type_assertions() {
        let (ast, stmt) = first_statement("let v = <any>x as unknown as string satisfies T;");
        let mut kinds = Vec::new();
        ast.walk(stmt, &mut |id| {
            match ast.kind(id) {
                NodeKind::As { .. } => kinds.push("as"),
                NodeKind::Satisfies { .. } => kinds.push("satisfies"),
                NodeKind::TypeAssertion { .. } => kinds.push("assert"),
                _ => {}
            }
            true
        });
        assert_eq!(kinds, ["satisfies", "as", "as", "assert"]);
    }

    #[test]
    fn test_parse_class_members() {
        let source = "abstract class A<T> extends B<T> implements I, J {\n\
            private x?: number;\n\
            static readonly y = 1;\n\
            [key: string]: any;\n\
            constructor(public a: string, readonly b = 2) { super(); }\n\
            get v(): T { return this.t; }\n\
            m(): void;\n\
            m(x?: any) {}\n\
            static { init(); }\n\
        }";
        let (ast, stmt) = first_statement(source);
        let NodeKind::ClassDeclaration(class) = ast.kind(stmt) else {
            panic!("expected class");
        };
        assert!(class.modifiers.has(ModifierFlags::ABSTRACT));
        assert_eq!(ast.slice(class.implements.unwrap()), "implements I, J");
        assert_eq!(ast.slice(class.extends_type_arguments.unwrap()), "<T>");
        let kinds: Vec<&str> = class
            .members
            .iter()
            .map(|&m| match ast.kind(m) {
                NodeKind::PropertyDeclaration { .. } => "property",
                NodeKind::IndexSignature { .. } => "index",
                NodeKind::MethodDeclaration(f) => match f.kind {
                    FunctionKind::Constructor => "constructor",
                    FunctionKind::Getter => "getter",
                    _ if f.body.is_none() => "overload",
                    _ => "method",
                },
                NodeKind::StaticBlock { .. } => "static",
                _ => "other",
            })
            .collect();
        assert_eq!(
            kinds,
            [
                "property",
                "property",
                "index",
                "constructor",
                "getter",
                "overload",
                "method",
                "static"
            ]
        );
    }

    #[test]
    fn test_parse_parameter_properties() {
        let (ast, stmt) = first_statement("class C { constructor(private readonly a: A, b) {} }");
        let NodeKind::ClassDeclaration(class) = ast.kind(stmt) else {
            panic!("expected class");
        };
        let NodeKind::MethodDeclaration(ctor) = ast.kind(class.members[0]) else {
            panic!("expected constructor");
        };
        let NodeKind::Parameter { modifiers, .. } = ast.kind(ctor.params[0]) else {
            panic!("expected parameter");
        };
        assert!(modifiers.has(ModifierFlags::PRIVATE | ModifierFlags::READONLY));
        assert_eq!(modifiers.list.len(), 2);
        let NodeKind::Parameter { modifiers, .. } = ast.kind(ctor.params[1]) else {
            panic!("expected parameter");
        };
        assert!(modifiers.is_empty());
    }

    #[test]
    fn test_parse_decorators() {
        let (ast, stmt) = first_statement("@dec() @ns.other class C { @prop x; @m() [k]() {} }");
        let NodeKind::ClassDeclaration(class) = ast.kind(stmt) else {
            panic!("expected class");
        };
        assert_eq!(class.decorators.len(), 2);
        assert_eq!(ast.text(class.decorators[1]), "@ns.other");
        let NodeKind::MethodDeclaration(method) = ast.kind(class.members[1]) else {
            panic!("expected method");
        };
        assert_eq!(method.decorators.len(), 1);
    }

    #[test]
    fn test_parse_namespaces() {
        let (ast, stmt) = first_statement("export namespace A.B.C { export const x = 1; }");
        let NodeKind::ModuleDeclaration {
            names,
            body,
            modifiers,
            ..
        } = ast.kind(stmt)
        else {
            panic!("expected namespace");
        };
        assert_eq!(names.len(), 3);
        assert!(modifiers.has(ModifierFlags::EXPORT));
        assert_eq!(ast.statements(body.unwrap()).len(), 1);

        let (ast, stmt) = first_statement("declare module \"fs\";");
        assert!(matches!(
            ast.kind(stmt),
            NodeKind::ModuleDeclaration { body: None, .. }
        ));
    }

    #[test]
    fn test_parse_imports() {
        let ast = parse(
            "import a, { b, c as d, type E } from './m';\n\
             import * as ns from \"n\";\n\
             import type { T } from 't';\n\
             import x = require('x');\n\
             import y = A.B;\n\
             import 'side';",
        )
        .unwrap();
        let stmts = statements(&ast);
        let NodeKind::ImportDeclaration {
            default, named, ..
        } = ast.kind(stmts[0])
        else {
            panic!("expected import");
        };
        assert!(default.is_some());
        let named = named.as_ref().unwrap();
        assert_eq!(named.len(), 3);
        assert!(matches!(
            ast.kind(named[2]),
            NodeKind::ImportSpecifier {
                type_only: true,
                ..
            }
        ));
        assert!(matches!(
            ast.kind(stmts[1]),
            NodeKind::ImportDeclaration {
                namespace: Some(_),
                ..
            }
        ));
        assert!(matches!(
            ast.kind(stmts[2]),
            NodeKind::ImportDeclaration {
                type_only: true,
                ..
            }
        ));
        assert!(matches!(
            ast.kind(stmts[3]),
            NodeKind::ImportEquals {
                reference: ModuleReference::External(_),
                ..
            }
        ));
        assert!(matches!(
            ast.kind(stmts[4]),
            NodeKind::ImportEquals {
                reference: ModuleReference::Entity(_),
                ..
            }
        ));
        assert!(matches!(
            ast.kind(stmts[5]),
            NodeKind::ImportDeclaration { named: None, default: None, .. }
        ));
    }

    #[test]
    fn test_parse_exports() {
        let ast = parse(
            "export { a, b as c };\n\
             export * from 'm';\n\
             export * as ns from 'm';\n\
             export default a + 1;\n\
             export = foo;\n\
             export default function () {}\n\
             export type { T } from './t';",
        )
        .unwrap();
        let stmts = statements(&ast);
        assert!(matches!(
            ast.kind(stmts[0]),
            NodeKind::ExportDeclaration {
                clause: ExportClause::Named(_),
                module: None,
                ..
            }
        ));
        assert!(matches!(
            ast.kind(stmts[1]),
            NodeKind::ExportDeclaration {
                clause: ExportClause::Star,
                ..
            }
        ));
        assert!(matches!(
            ast.kind(stmts[2]),
            NodeKind::ExportDeclaration {
                clause: ExportClause::StarAs(_),
                ..
            }
        ));
        assert!(matches!(
            ast.kind(stmts[3]),
            NodeKind::ExportAssignment {
                is_equals: false,
                ..
            }
        ));
        assert!(matches!(
            ast.kind(stmts[4]),
            NodeKind::ExportAssignment {
                is_equals: true,
                ..
            }
        ));
        let NodeKind::FunctionDeclaration(f) = ast.kind(stmts[5]) else {
            panic!("expected function");
        };
        assert!(f.modifiers.has(ModifierFlags::DEFAULT));
        assert!(f.name.is_none());
        assert_eq!(ast.source().as_bytes()[f.name_insert_at - 1], b'n');
        assert!(matches!(
            ast.kind(stmts[6]),
            NodeKind::ExportDeclaration {
                type_only: true,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_interfaces_and_type_aliases() {
        let ast = parse(
            "interface I<T> extends J<T> { a: string; m(): void }\n\
             type U = { [K in keyof T]?: T[K] } | ((x: number) => void) | `a${string}`;\n\
             declare function f(x: number): x is 1;\n\
             let z = 1;",
        )
        .unwrap();
        let stmts = statements(&ast);
        assert!(matches!(
            ast.kind(stmts[0]),
            NodeKind::InterfaceDeclaration { .. }
        ));
        assert!(matches!(
            ast.kind(stmts[1]),
            NodeKind::TypeAliasDeclaration { .. }
        ));
        let NodeKind::FunctionDeclaration(f) = ast.kind(stmts[2]) else {
            panic!("expected function");
        };
        assert!(f.modifiers.has(ModifierFlags::DECLARE));
        assert!(f.body.is_none());
        assert_eq!(ast.slice(f.return_type.unwrap()), ": x is 1");
        assert!(matches!(
            ast.kind(stmts[3]),
            NodeKind::VariableStatement { .. }
        ));
    }

    #[test]
    fn test_parse_conditional_types() {
        let ast = parse(
            "type A<T> = T extends [infer H extends string, ...infer R] ? H : never;\nlet x;",
        )
        .unwrap();
        assert_eq!(statements(&ast).len(), 2);
    }

    #[test]
    fn test_parse_non_null_and_optional_chain() {
        let (ast, stmt) = first_statement("a!.b?.[c]?.(d)!;");
        let mut non_null = 0;
        let mut optional = 0;
        ast.walk(stmt, &mut |id| {
            match ast.kind(id) {
                NodeKind::NonNull { .. } => non_null += 1,
                NodeKind::Index { optional: true, .. } | NodeKind::Call { optional: true, .. } => {
                    optional += 1
                }
                _ => {}
            }
            true
        });
        assert_eq!(non_null, 2);
        assert_eq!(optional, 2);
    }

    #[test]
    fn test_parse_object_literal_members() {
        let (ast, stmt) =
            first_statement("x = { a, b: 1, [c]: 2, get d() { return 1 }, async *e() {}, ...f };");
        let NodeKind::ExpressionStatement { expression } = ast.kind(stmt) else {
            panic!("expected expression statement");
        };
        let NodeKind::Assign { value, .. } = ast.kind(*expression) else {
            panic!("expected assignment");
        };
        let NodeKind::ObjectLiteral { properties } = ast.kind(*value) else {
            panic!("expected object");
        };
        assert_eq!(properties.len(), 6);
        assert!(matches!(
            ast.kind(properties[0]),
            NodeKind::ShorthandProperty { .. }
        ));
        assert!(matches!(ast.kind(properties[4]), NodeKind::MethodDeclaration(f) if f.is_async && f.is_generator));
        assert!(matches!(ast.kind(properties[5]), NodeKind::SpreadElement { .. }));
    }

    #[test]
    fn test_parse_for_statements() {
        let ast = parse(
            "for (const [k, v] of map) {}\n\
             for (let i = 0; i < n; i++) {}\n\
             for (key in obj) ;\n\
             for await (const x of gen()) {}",
        )
        .unwrap();
        let stmts = statements(&ast);
        assert!(matches!(ast.kind(stmts[0]), NodeKind::ForOf { .. }));
        assert!(matches!(ast.kind(stmts[1]), NodeKind::For { .. }));
        assert!(matches!(ast.kind(stmts[2]), NodeKind::ForIn { .. }));
        assert!(matches!(
            ast.kind(stmts[3]),
            NodeKind::ForOf { is_await: true, .. }
        ));
    }

    #[test]
    fn test_parse_dynamic_import_and_meta() {
        let (ast, stmt) = first_statement("const m = await import('./m'), u = import.meta.url;");
        let mut import_calls = 0;
        let mut metas = 0;
        ast.walk(stmt, &mut |id| {
            match ast.kind(id) {
                NodeKind::ImportKeyword => import_calls += 1,
                NodeKind::MetaProperty => metas += 1,
                _ => {}
            }
            true
        });
        assert_eq!(import_calls, 1);
        assert_eq!(metas, 1);
    }

    #[test]
    fn test_parse_contextual_keywords_as_identifiers() {
        let ast = parse("type = 1; namespace.x = 2; declare(3); let async = 4; module.exports = 5;")
            .unwrap();
        let stmts = statements(&ast);
        assert_eq!(stmts.len(), 5);
        assert!(matches!(
            ast.kind(stmts[0]),
            NodeKind::ExpressionStatement { .. }
        ));
        assert!(matches!(
            ast.kind(stmts[3]),
            NodeKind::VariableStatement { .. }
        ));
    }

    #[test]
    fn test_parse_parent_links() {
        let (ast, stmt) = first_statement("foo(bar);");
        let mut identifiers = Vec::new();
        ast.walk(stmt, &mut |id| {
            if ast.kind(id) == &NodeKind::Identifier {
                identifiers.push(id);
            }
            true
        });
        assert_eq!(identifiers.len(), 2);
        assert_eq!(ast.ancestors(identifiers[1]).last(), Some(ast.root()));
    }

    #[test]
    fn test_parse_error_reports_location() {
        let err = parse("let a = ;").unwrap_err();
        let loc = err.location().unwrap();
        assert_eq!(loc.line, 1);
        assert_eq!(loc.column, 9);
    }

    #[test]
    fn test_string_and_number_values() {
        assert_eq!(string_value(r#""a\nA\x42\u{43}""#), "a\nABC");
        assert_eq!(string_value("'it\\'s'"), "it's");
        assert_eq!(number_value("0x1F"), 31.0);
        assert_eq!(number_value("1_000"), 1000.0);
        assert_eq!(number_value("0b101"), 5.0);
        assert_eq!(number_value("017"), 15.0);
        assert_eq!(number_value(".5"), 0.5);
    }
}
