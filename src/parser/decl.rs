//! Declarations: functions, classes, enums, namespaces, imports, exports,
//! and the parameter and binding-pattern syntax they share

use super::Parser;
use crate::ast::*;
use crate::error::Result;
use crate::lexer::{Keyword, TokenKind};

/// What is known about a function before its parameter list
pub(super) struct FunctionHeader {
    pub kind: FunctionKind,
    pub modifiers: Modifiers,
    pub decorators: Vec<NodeId>,
    pub name: Option<NodeId>,
    pub name_insert_at: usize,
    pub optional: Option<Span>,
    pub is_async: bool,
    pub is_generator: bool,
}

impl FunctionHeader {
    pub(super) fn new(kind: FunctionKind, name_insert_at: usize) -> Self {
        Self {
            kind,
            modifiers: Modifiers::default(),
            decorators: Vec::new(),
            name: None,
            name_insert_at,
            optional: None,
            is_async: false,
            is_generator: false,
        }
    }
}

fn class_modifier(text: &str) -> Option<ModifierFlags> {
    let flag = match text {
        "public" => ModifierFlags::PUBLIC,
        "private" => ModifierFlags::PRIVATE,
        "protected" => ModifierFlags::PROTECTED,
        "readonly" => ModifierFlags::READONLY,
        "static" => ModifierFlags::STATIC,
        "abstract" => ModifierFlags::ABSTRACT,
        "override" => ModifierFlags::OVERRIDE,
        "declare" => ModifierFlags::DECLARE,
        "accessor" => ModifierFlags::ACCESSOR,
        _ => return None,
    };
    Some(flag)
}

impl<'src> Parser<'src> {
    /// A statement led by decorators or modifiers
    pub(super) fn parse_declaration_with_modifiers(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        let mut decorators = self.parse_decorators()?;
        let mut modifiers = Modifiers::default();

        loop {
            let span = self.modifier_span();
            match self.peek() {
                TokenKind::Keyword(Keyword::Export) if !modifiers.has(ModifierFlags::EXPORT) => {
                    self.advance();
                    if decorators.is_empty() && modifiers.is_empty() {
                        if let Some(id) = self.parse_export_form(mark)? {
                            return Ok(id);
                        }
                    }
                    modifiers.push(Modifier {
                        flag: ModifierFlags::EXPORT,
                        span,
                    });
                }
                TokenKind::Keyword(Keyword::Default)
                    if modifiers.has(ModifierFlags::EXPORT)
                        && !modifiers.has(ModifierFlags::DEFAULT) =>
                {
                    self.advance();
                    modifiers.push(Modifier {
                        flag: ModifierFlags::DEFAULT,
                        span,
                    });
                    if !self.is_default_declaration_start() {
                        return self.parse_export_default_expression(mark);
                    }
                }
                TokenKind::Keyword(Keyword::Const)
                    if self.peek_at(1) == TokenKind::Keyword(Keyword::Enum) =>
                {
                    self.advance();
                    modifiers.push(Modifier {
                        flag: ModifierFlags::CONST,
                        span,
                    });
                }
                TokenKind::Identifier
                    if matches!(self.current().text, "declare" | "abstract")
                        && self.modifier_follows() =>
                {
                    let flag = if self.current().text == "declare" {
                        ModifierFlags::DECLARE
                    } else {
                        ModifierFlags::ABSTRACT
                    };
                    self.advance();
                    modifiers.push(Modifier { flag, span });
                }
                TokenKind::At => decorators.extend(self.parse_decorators()?),
                _ => break,
            }
        }

        self.parse_declaration(mark, modifiers, decorators)
    }

    fn is_default_declaration_start(&self) -> bool {
        match self.peek() {
            TokenKind::Keyword(Keyword::Class) | TokenKind::Keyword(Keyword::Function) => true,
            TokenKind::At => true,
            TokenKind::Identifier => match self.current().text {
                "async" => {
                    self.peek_at(1) == TokenKind::Keyword(Keyword::Function)
                        && !self.newline_before_at(1)
                }
                "abstract" => self.peek_at(1) == TokenKind::Keyword(Keyword::Class),
                "interface" => {
                    self.peek_at(1) == TokenKind::Identifier && !self.newline_before_at(1)
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn parse_declaration(
        &mut self,
        mark: usize,
        modifiers: Modifiers,
        decorators: Vec<NodeId>,
    ) -> Result<NodeId> {
        if self.peek() == TokenKind::Keyword(Keyword::Class) {
            return self.parse_class_declaration(mark, modifiers, decorators);
        }
        if !decorators.is_empty() {
            return Err(self.expected("class declaration after decorators"));
        }
        match self.peek() {
            TokenKind::Keyword(Keyword::Var) | TokenKind::Keyword(Keyword::Const) => {
                self.parse_variable_statement(mark, modifiers)
            }
            TokenKind::Keyword(Keyword::Function) => {
                self.parse_function_declaration(mark, modifiers, decorators)
            }
            TokenKind::Keyword(Keyword::Enum) => self.parse_enum(mark, modifiers),
            TokenKind::Keyword(Keyword::Import) => self.parse_import_declaration(mark, modifiers),
            TokenKind::Identifier => match self.current().text {
                "let" => self.parse_variable_statement(mark, modifiers),
                "async" => self.parse_function_declaration(mark, modifiers, decorators),
                "interface" => self.parse_interface(mark, modifiers),
                "type" => self.parse_type_alias(mark, modifiers),
                "namespace" | "module" | "global" => self.parse_module_declaration(mark, modifiers),
                _ => Err(self.expected("declaration")),
            },
            _ => Err(self.expected("declaration")),
        }
    }

    // ========== Functions ==========

    pub(super) fn parse_function_declaration(
        &mut self,
        mark: usize,
        modifiers: Modifiers,
        decorators: Vec<NodeId>,
    ) -> Result<NodeId> {
        let is_async = self.consume_contextual("async");
        self.expect(TokenKind::Keyword(Keyword::Function))?;
        let is_generator = self.consume(TokenKind::Star);
        let mut header = FunctionHeader::new(FunctionKind::Declaration, self.prev_end());
        header.modifiers = modifiers;
        header.decorators = decorators;
        header.is_async = is_async;
        header.is_generator = is_generator;
        if self.peek() == TokenKind::Identifier {
            header.name = Some(self.parse_identifier()?);
        }
        let function = self.parse_function_rest(header)?;
        Ok(self.finish(NodeKind::FunctionDeclaration(Box::new(function)), mark))
    }

    pub(super) fn parse_function_expression(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        let is_async = self.consume_contextual("async");
        self.expect(TokenKind::Keyword(Keyword::Function))?;
        let is_generator = self.consume(TokenKind::Star);
        let mut header = FunctionHeader::new(FunctionKind::Expression, self.prev_end());
        header.is_async = is_async;
        header.is_generator = is_generator;
        if self.peek() == TokenKind::Identifier {
            header.name = Some(self.parse_identifier()?);
        }
        let function = self.parse_function_rest(header)?;
        if function.body.is_none() {
            return Err(self.expected("'{'"));
        }
        Ok(self.finish(NodeKind::FunctionExpression(Box::new(function)), mark))
    }

    /// Type parameters, parameters, return type and optional body
    pub(super) fn parse_function_rest(&mut self, header: FunctionHeader) -> Result<Function> {
        let saved = self.flags;
        self.flags = Default::default();
        self.flags.in_async = header.is_async;
        self.flags.in_generator = header.is_generator;

        let result = self.parse_signature_and_body();
        self.flags = saved;
        let (type_parameters, params, params_span, return_type, body) = result?;

        Ok(Function {
            kind: header.kind,
            modifiers: header.modifiers,
            decorators: header.decorators,
            name: header.name,
            name_insert_at: header.name_insert_at,
            optional: header.optional,
            type_parameters,
            params,
            params_span,
            return_type,
            body,
            is_async: header.is_async,
            is_generator: header.is_generator,
        })
    }

    #[allow(clippy::type_complexity)]
    fn parse_signature_and_body(
        &mut self,
    ) -> Result<(Option<Span>, Vec<NodeId>, Span, Option<Span>, Option<NodeId>)> {
        let type_parameters = if self.peek() == TokenKind::Less {
            Some(self.skip_type_parameters()?)
        } else {
            None
        };
        let (params, params_span) = self.parse_parameters()?;
        let return_type = self.parse_return_type_annotation()?;
        let body = if self.peek() == TokenKind::LeftBrace {
            Some(self.parse_block()?)
        } else {
            self.consume_semicolon()?;
            None
        };
        Ok((type_parameters, params, params_span, return_type, body))
    }

    /// `( ... )`, returning the parameters and the span of the parentheses
    pub(super) fn parse_parameters(&mut self) -> Result<(Vec<NodeId>, Span)> {
        let start = self.current().start();
        self.expect(TokenKind::LeftParen)?;
        let params = self.nested(|p| {
            let mut params = Vec::new();
            while p.peek() != TokenKind::RightParen {
                params.push(p.parse_parameter()?);
                if !p.consume(TokenKind::Comma) {
                    break;
                }
            }
            Ok(params)
        })?;
        self.expect(TokenKind::RightParen)?;
        Ok((params, Span::new(start, self.prev_end())))
    }

    fn parse_parameter(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        let decorators = self.parse_decorators()?;

        let mut modifiers = Modifiers::default();
        while self.peek() == TokenKind::Identifier
            && matches!(
                self.current().text,
                "public" | "private" | "protected" | "readonly" | "override"
            )
            && matches!(
                self.peek_at(1),
                TokenKind::Identifier
                    | TokenKind::LeftBrace
                    | TokenKind::LeftBracket
                    | TokenKind::DotDotDot
            )
            && !self.newline_before_at(1)
        {
            let flag = class_modifier(self.current().text).unwrap_or(ModifierFlags::OVERRIDE);
            modifiers.push(Modifier {
                flag,
                span: self.modifier_span(),
            });
            self.advance();
        }

        let rest = self.consume(TokenKind::DotDotDot);
        let name = if self.peek() == TokenKind::Keyword(Keyword::This) {
            let this_mark = self.pos;
            self.advance();
            self.finish(NodeKind::This, this_mark)
        } else {
            self.parse_binding_name()?
        };
        let optional = self.parse_optional_marker();
        let type_annotation = self.parse_type_annotation()?;
        let init = if self.consume(TokenKind::Equals) {
            Some(self.parse_assignment()?)
        } else {
            None
        };

        Ok(self.finish(
            NodeKind::Parameter {
                modifiers,
                decorators,
                rest,
                name,
                optional,
                type_annotation,
                init,
            },
            mark,
        ))
    }

    fn parse_optional_marker(&mut self) -> Option<Span> {
        if self.peek() == TokenKind::Question {
            let token = self.advance();
            Some(Span::new(token.start(), token.end()))
        } else {
            None
        }
    }

    /// `@expr` decorators, possibly none
    pub(super) fn parse_decorators(&mut self) -> Result<Vec<NodeId>> {
        let mut decorators = Vec::new();
        while self.peek() == TokenKind::At {
            let mark = self.pos;
            self.advance();
            let saved = self.flags;
            self.flags.in_decorator = true;
            let expression = self.parse_lhs();
            self.flags = saved;
            let expression = expression?;
            decorators.push(self.finish(NodeKind::Decorator { expression }, mark));
        }
        Ok(decorators)
    }

    // ========== Binding Patterns ==========

    /// Identifier, object pattern or array pattern
    pub(super) fn parse_binding_name(&mut self) -> Result<NodeId> {
        match self.peek() {
            TokenKind::LeftBrace => self.parse_object_binding(),
            TokenKind::LeftBracket => self.parse_array_binding(),
            _ => self.parse_identifier(),
        }
    }

    fn parse_binding_init(&mut self) -> Result<Option<NodeId>> {
        if self.consume(TokenKind::Equals) {
            Ok(Some(self.nested(|p| p.parse_assignment())?))
        } else {
            Ok(None)
        }
    }

    fn parse_object_binding(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        self.advance();
        let mut elements = Vec::new();
        while self.peek() != TokenKind::RightBrace {
            let element_mark = self.pos;
            let element = if self.consume(TokenKind::DotDotDot) {
                let name = self.parse_identifier()?;
                NodeKind::BindingElement {
                    property: None,
                    name,
                    init: None,
                    rest: true,
                }
            } else {
                let key = self.parse_property_name()?;
                let (property, name) = if self.consume(TokenKind::Colon) {
                    (Some(key), self.parse_binding_name()?)
                } else {
                    (None, key)
                };
                let init = self.parse_binding_init()?;
                NodeKind::BindingElement {
                    property,
                    name,
                    init,
                    rest: false,
                }
            };
            elements.push(self.finish(element, element_mark));
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightBrace)?;
        Ok(self.finish(NodeKind::ObjectPattern { elements }, mark))
    }

    fn parse_array_binding(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        self.advance();
        let mut elements = Vec::new();
        loop {
            match self.peek() {
                TokenKind::RightBracket => break,
                TokenKind::Comma => {
                    self.advance();
                    elements.push(None);
                    continue;
                }
                _ => {}
            }
            let element_mark = self.pos;
            let rest = self.consume(TokenKind::DotDotDot);
            let name = self.parse_binding_name()?;
            let init = self.parse_binding_init()?;
            elements.push(Some(self.finish(
                NodeKind::BindingElement {
                    property: None,
                    name,
                    init,
                    rest,
                },
                element_mark,
            )));
            if self.peek() != TokenKind::RightBracket {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::RightBracket)?;
        Ok(self.finish(NodeKind::ArrayPattern { elements }, mark))
    }

    // ========== Classes ==========

    pub(super) fn parse_class_declaration(
        &mut self,
        mark: usize,
        modifiers: Modifiers,
        decorators: Vec<NodeId>,
    ) -> Result<NodeId> {
        let class = self.parse_class(modifiers, decorators)?;
        Ok(self.finish(NodeKind::ClassDeclaration(Box::new(class)), mark))
    }

    pub(super) fn parse_class(
        &mut self,
        modifiers: Modifiers,
        decorators: Vec<NodeId>,
    ) -> Result<Class> {
        let keyword = self.expect(TokenKind::Keyword(Keyword::Class))?;
        let keyword = Span::new(keyword.start(), keyword.end());

        let name = if self.peek() == TokenKind::Identifier && !self.is_contextual("implements") {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        let type_parameters = if self.peek() == TokenKind::Less {
            Some(self.skip_type_parameters()?)
        } else {
            None
        };

        let (extends, extends_type_arguments) = if self.consume(TokenKind::Keyword(Keyword::Extends)) {
            let saved = self.flags;
            self.flags.in_heritage = true;
            let base = self.parse_lhs();
            self.flags = saved;
            let base = base?;
            let type_arguments = if self.peek() == TokenKind::Less {
                Some(self.skip_type_arguments()?)
            } else {
                None
            };
            (Some(base), type_arguments)
        } else {
            (None, None)
        };

        let implements = if self.is_contextual("implements") {
            let start = self.current().start();
            self.advance();
            loop {
                self.skip_type()?;
                if !self.consume(TokenKind::Comma) {
                    break;
                }
            }
            Some(Span::new(start, self.prev_end()))
        } else {
            None
        };

        let body_start = self.current().start();
        self.expect(TokenKind::LeftBrace)?;
        let members = self.nested(|p| {
            let mut members = Vec::new();
            while p.peek() != TokenKind::RightBrace {
                if p.is_eof() {
                    return Err(p.unexpected());
                }
                members.push(p.parse_class_member()?);
            }
            Ok(members)
        })?;
        self.expect(TokenKind::RightBrace)?;

        Ok(Class {
            modifiers,
            decorators,
            keyword,
            name,
            type_parameters,
            extends,
            extends_type_arguments,
            implements,
            members,
            body: Span::new(body_start, self.prev_end()),
        })
    }

    /// A property name can start at `offset`
    fn is_property_name_start_at(&self, offset: usize) -> bool {
        matches!(
            self.peek_at(offset),
            TokenKind::Identifier
                | TokenKind::Keyword(_)
                | TokenKind::StringLiteral
                | TokenKind::NumberLiteral
                | TokenKind::BigIntLiteral
                | TokenKind::PrivateName
                | TokenKind::LeftBracket
        )
    }

    /// Whether the current word is a modifier rather than a member name
    fn class_modifier_applies(&self, is_static: bool) -> bool {
        let can_follow = self.is_property_name_start_at(1)
            || matches!(
                self.peek_at(1),
                TokenKind::LeftBrace | TokenKind::Star | TokenKind::DotDotDot
            );
        can_follow && (is_static || !self.newline_before_at(1))
    }

    fn is_index_signature(&self) -> bool {
        self.peek() == TokenKind::LeftBracket
            && self.peek_at(1) == TokenKind::Identifier
            && self.peek_at(2) == TokenKind::Colon
    }

    fn parse_class_member(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        if self.consume(TokenKind::Semicolon) {
            return Ok(self.finish(NodeKind::SemicolonElement, mark));
        }

        let decorators = self.parse_decorators()?;
        let mut modifiers = Modifiers::default();
        while self.peek() == TokenKind::Identifier {
            let Some(flag) = class_modifier(self.current().text) else {
                break;
            };
            if !self.class_modifier_applies(flag == ModifierFlags::STATIC) {
                break;
            }
            modifiers.push(Modifier {
                flag,
                span: self.modifier_span(),
            });
            self.advance();
        }

        if modifiers.flags == ModifierFlags::STATIC && self.peek() == TokenKind::LeftBrace {
            let body = self.parse_block()?;
            return Ok(self.finish(NodeKind::StaticBlock { body }, mark));
        }

        if self.is_index_signature() {
            self.skip_balanced()?;
            self.parse_type_annotation()?;
            if !self.consume(TokenKind::Comma) {
                self.consume_semicolon()?;
            }
            return Ok(self.finish(NodeKind::IndexSignature { modifiers }, mark));
        }

        let mut header = FunctionHeader::new(FunctionKind::Method, 0);
        self.parse_method_prefix(&mut header);
        header.name_insert_at = self.current().start();
        let name = self.parse_property_name()?;

        let is_constructor = header.kind == FunctionKind::Method
            && !header.is_async
            && !header.is_generator
            && match &self.nodes[name.index()].kind {
                NodeKind::Identifier => {
                    let span = self.nodes[name.index()].span;
                    &self.source[span.start..span.end] == "constructor"
                }
                NodeKind::StringLiteral { value } => value == "constructor",
                _ => false,
            }
            && self.peek() == TokenKind::LeftParen;
        if is_constructor {
            header.kind = FunctionKind::Constructor;
        }

        header.optional = self.parse_optional_marker();

        if matches!(self.peek(), TokenKind::LeftParen | TokenKind::Less)
            || header.kind != FunctionKind::Method
            || header.is_async
            || header.is_generator
        {
            header.name = Some(name);
            header.modifiers = modifiers;
            header.decorators = decorators;
            let function = self.parse_function_rest(header)?;
            return Ok(self.finish(NodeKind::MethodDeclaration(Box::new(function)), mark));
        }

        let definite = if self.peek() == TokenKind::Bang {
            let bang = self.advance();
            Some(Span::new(bang.start(), bang.end()))
        } else {
            None
        };
        let type_annotation = self.parse_type_annotation()?;
        let init = if self.consume(TokenKind::Equals) {
            let saved = self.flags;
            self.flags = Default::default();
            let init = self.parse_assignment();
            self.flags = saved;
            Some(init?)
        } else {
            None
        };
        self.consume_semicolon()?;

        Ok(self.finish(
            NodeKind::PropertyDeclaration {
                modifiers,
                decorators,
                name,
                optional: header.optional,
                definite,
                type_annotation,
                init,
            },
            mark,
        ))
    }

    /// `get`, `set`, `async` and `*` ahead of a method name
    pub(super) fn parse_method_prefix(&mut self, header: &mut FunctionHeader) {
        if (self.is_contextual("get") || self.is_contextual("set"))
            && self.is_property_name_start_at(1)
        {
            header.kind = if self.current().text == "get" {
                FunctionKind::Getter
            } else {
                FunctionKind::Setter
            };
            self.advance();
        } else if self.is_contextual("async")
            && !self.newline_before_at(1)
            && (self.is_property_name_start_at(1) || self.peek_at(1) == TokenKind::Star)
        {
            header.is_async = true;
            self.advance();
        }
        if self.consume(TokenKind::Star) {
            header.is_generator = true;
        }
    }

    /// Property name of a class member, object member or enum member
    pub(super) fn parse_property_name(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        match self.peek() {
            TokenKind::StringLiteral => self.parse_string_literal(),
            TokenKind::NumberLiteral => {
                let token = self.advance();
                let value = super::number_value(token.text);
                Ok(self.finish(NodeKind::NumericLiteral { value }, mark))
            }
            TokenKind::BigIntLiteral => {
                self.advance();
                Ok(self.finish(NodeKind::BigIntLiteral, mark))
            }
            TokenKind::PrivateName => {
                self.advance();
                Ok(self.finish(NodeKind::PrivateName, mark))
            }
            TokenKind::LeftBracket => {
                self.advance();
                let expression = self.nested(|p| p.parse_assignment())?;
                self.expect(TokenKind::RightBracket)?;
                Ok(self.finish(NodeKind::ComputedPropertyName { expression }, mark))
            }
            TokenKind::Identifier | TokenKind::Keyword(_) => self.parse_identifier_name(),
            _ => Err(self.expected("property name")),
        }
    }

    // ========== Enums, Interfaces, Type Aliases, Namespaces ==========

    pub(super) fn parse_enum(&mut self, mark: usize, modifiers: Modifiers) -> Result<NodeId> {
        self.expect(TokenKind::Keyword(Keyword::Enum))?;
        let name = self.parse_identifier()?;
        let body_start = self.current().start();
        self.expect(TokenKind::LeftBrace)?;

        let mut members = Vec::new();
        while self.peek() != TokenKind::RightBrace {
            let member_mark = self.pos;
            let member_name = self.parse_property_name()?;
            let init = if self.consume(TokenKind::Equals) {
                Some(self.nested(|p| p.parse_assignment())?)
            } else {
                None
            };
            let end = self.prev_end();
            let comma = if self.peek() == TokenKind::Comma {
                let comma = self.advance();
                Some(comma.start())
            } else {
                None
            };
            members.push(self.finish_at(
                NodeKind::EnumMember {
                    name: member_name,
                    init,
                    comma,
                },
                member_mark,
                end,
            ));
            if comma.is_none() {
                break;
            }
        }
        self.expect(TokenKind::RightBrace)?;

        Ok(self.finish(
            NodeKind::EnumDeclaration {
                modifiers,
                name,
                members,
                body: Span::new(body_start, self.prev_end()),
            },
            mark,
        ))
    }

    pub(super) fn parse_interface(&mut self, mark: usize, modifiers: Modifiers) -> Result<NodeId> {
        self.advance();
        let name = self.parse_identifier()?;
        if self.peek() == TokenKind::Less {
            self.skip_type_parameters()?;
        }
        if self.consume(TokenKind::Keyword(Keyword::Extends)) {
            loop {
                self.skip_type()?;
                if !self.consume(TokenKind::Comma) {
                    break;
                }
            }
        }
        if self.peek() != TokenKind::LeftBrace {
            return Err(self.expected("'{'"));
        }
        self.skip_balanced()?;
        Ok(self.finish(NodeKind::InterfaceDeclaration { modifiers, name }, mark))
    }

    pub(super) fn parse_type_alias(&mut self, mark: usize, modifiers: Modifiers) -> Result<NodeId> {
        self.advance();
        let name = self.parse_identifier()?;
        if self.peek() == TokenKind::Less {
            self.skip_type_parameters()?;
        }
        self.expect(TokenKind::Equals)?;
        self.skip_type()?;
        self.consume_semicolon()?;
        Ok(self.finish(NodeKind::TypeAliasDeclaration { modifiers, name }, mark))
    }

    pub(super) fn parse_module_declaration(
        &mut self,
        mark: usize,
        modifiers: Modifiers,
    ) -> Result<NodeId> {
        let global = self.is_contextual("global");
        let mut names = Vec::new();
        if global {
            names.push(self.parse_identifier()?);
        } else {
            self.advance();
            if self.peek() == TokenKind::StringLiteral {
                names.push(self.parse_string_literal()?);
            } else {
                names.push(self.parse_identifier()?);
                while self.consume(TokenKind::Dot) {
                    names.push(self.parse_identifier()?);
                }
            }
        }

        let body = if self.peek() == TokenKind::LeftBrace {
            let block_mark = self.pos;
            self.advance();
            let statements = self.nested(|p| p.parse_statement_list())?;
            self.expect(TokenKind::RightBrace)?;
            Some(self.finish(NodeKind::ModuleBlock { statements }, block_mark))
        } else {
            self.consume_semicolon()?;
            None
        };

        Ok(self.finish(
            NodeKind::ModuleDeclaration {
                modifiers,
                names,
                body,
                global,
            },
            mark,
        ))
    }

    // ========== Imports and Exports ==========

    fn is_type_only_import(&self) -> bool {
        if !self.is_contextual("type") {
            return false;
        }
        match self.peek_at(1) {
            TokenKind::LeftBrace | TokenKind::Star => true,
            // `import type from "m"` imports a default named `type`
            TokenKind::Identifier => {
                !self.is_contextual_at(1, "from") || self.is_contextual_at(2, "from")
            }
            _ => false,
        }
    }

    /// `type` ahead of a single import or export specifier
    fn is_type_only_specifier(&self) -> bool {
        self.is_contextual("type")
            && (self.is_identifier_name_at(1) || self.peek_at(1) == TokenKind::StringLiteral)
            && !(self.is_contextual_at(1, "as") && !self.is_identifier_name_at(2))
    }

    fn skip_import_attributes(&mut self) -> Result<()> {
        if (self.peek() == TokenKind::Keyword(Keyword::With) || self.is_contextual("assert"))
            && self.peek_at(1) == TokenKind::LeftBrace
            && !self.current().newline_before
        {
            self.advance();
            self.skip_balanced()?;
        }
        Ok(())
    }

    /// Identifier name or string used in import and export specifiers
    fn parse_module_export_name(&mut self) -> Result<NodeId> {
        if self.peek() == TokenKind::StringLiteral {
            self.parse_string_literal()
        } else {
            self.parse_identifier_name()
        }
    }

    fn parse_module_specifier(&mut self) -> Result<NodeId> {
        let module = self.parse_string_literal()?;
        self.skip_import_attributes()?;
        Ok(module)
    }

    pub(super) fn parse_import_declaration(
        &mut self,
        mark: usize,
        modifiers: Modifiers,
    ) -> Result<NodeId> {
        self.expect(TokenKind::Keyword(Keyword::Import))?;

        if self.peek() == TokenKind::StringLiteral {
            let module = self.parse_module_specifier()?;
            self.consume_semicolon()?;
            return Ok(self.finish(
                NodeKind::ImportDeclaration {
                    type_only: false,
                    default: None,
                    namespace: None,
                    named: None,
                    module,
                },
                mark,
            ));
        }

        let type_only = self.is_type_only_import();
        if type_only {
            self.advance();
        }

        if self.peek() == TokenKind::Identifier && self.peek_at(1) == TokenKind::Equals {
            return self.parse_import_equals(mark, modifiers, type_only);
        }

        let default = if self.peek() == TokenKind::Identifier {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        let mut namespace = None;
        let mut named = None;
        if default.is_none() || self.consume(TokenKind::Comma) {
            if self.consume(TokenKind::Star) {
                self.expect_contextual("as")?;
                namespace = Some(self.parse_identifier()?);
            } else if self.peek() == TokenKind::LeftBrace {
                named = Some(self.parse_import_specifiers()?);
            } else {
                return Err(self.expected("import clause"));
            }
        }

        self.expect_contextual("from")?;
        let module = self.parse_module_specifier()?;
        self.consume_semicolon()?;

        Ok(self.finish(
            NodeKind::ImportDeclaration {
                type_only,
                default,
                namespace,
                named,
                module,
            },
            mark,
        ))
    }

    fn parse_import_specifiers(&mut self) -> Result<Vec<NodeId>> {
        self.expect(TokenKind::LeftBrace)?;
        let mut specifiers = Vec::new();
        while self.peek() != TokenKind::RightBrace {
            let mark = self.pos;
            let type_only = self.is_type_only_specifier();
            if type_only {
                self.advance();
            }
            let first = self.parse_module_export_name()?;
            let (imported, local) = if self.consume_contextual("as") {
                (Some(first), self.parse_identifier()?)
            } else {
                (None, first)
            };
            specifiers.push(self.finish(
                NodeKind::ImportSpecifier {
                    type_only,
                    imported,
                    local,
                },
                mark,
            ));
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightBrace)?;
        Ok(specifiers)
    }

    /// `import x = require("m")` or `import x = A.B`
    fn parse_import_equals(
        &mut self,
        mark: usize,
        modifiers: Modifiers,
        type_only: bool,
    ) -> Result<NodeId> {
        let name = self.parse_identifier()?;
        self.expect(TokenKind::Equals)?;
        let reference = if self.is_contextual("require") && self.peek_at(1) == TokenKind::LeftParen {
            self.advance();
            self.advance();
            let module = self.parse_string_literal()?;
            self.expect(TokenKind::RightParen)?;
            ModuleReference::External(module)
        } else {
            let entity_mark = self.pos;
            let mut entity = self.parse_identifier()?;
            while self.consume(TokenKind::Dot) {
                let property = self.parse_identifier_name()?;
                entity = self.finish(
                    NodeKind::Member {
                        object: entity,
                        property,
                        optional: false,
                    },
                    entity_mark,
                );
            }
            ModuleReference::Entity(entity)
        };
        self.consume_semicolon()?;
        Ok(self.finish(
            NodeKind::ImportEquals {
                modifiers,
                type_only,
                name,
                reference,
            },
            mark,
        ))
    }

    /// Forms of `export` that are not a modified declaration. The `export`
    /// keyword has been consumed.
    fn parse_export_form(&mut self, mark: usize) -> Result<Option<NodeId>> {
        let type_only = self.is_contextual("type")
            && matches!(self.peek_at(1), TokenKind::LeftBrace | TokenKind::Star);
        match self.peek() {
            TokenKind::Star | TokenKind::LeftBrace => {}
            TokenKind::Identifier if type_only => {
                self.advance();
            }
            TokenKind::Equals => {
                self.advance();
                let expression = self.parse_assignment()?;
                self.consume_semicolon()?;
                return Ok(Some(self.finish(
                    NodeKind::ExportAssignment {
                        is_equals: true,
                        expression,
                    },
                    mark,
                )));
            }
            TokenKind::Identifier
                if self.is_contextual("as") && self.is_contextual_at(1, "namespace") =>
            {
                self.advance();
                self.advance();
                let name = self.parse_identifier()?;
                self.consume_semicolon()?;
                return Ok(Some(self.finish(NodeKind::NamespaceExport { name }, mark)));
            }
            _ => return Ok(None),
        }

        let (clause, module) = if self.consume(TokenKind::Star) {
            let clause = if self.consume_contextual("as") {
                ExportClause::StarAs(self.parse_module_export_name()?)
            } else {
                ExportClause::Star
            };
            self.expect_contextual("from")?;
            (clause, Some(self.parse_module_specifier()?))
        } else {
            let specifiers = self.parse_export_specifiers()?;
            let module = if self.consume_contextual("from") {
                Some(self.parse_module_specifier()?)
            } else {
                None
            };
            (ExportClause::Named(specifiers), module)
        };
        self.consume_semicolon()?;

        Ok(Some(self.finish(
            NodeKind::ExportDeclaration {
                type_only,
                clause,
                module,
            },
            mark,
        )))
    }

    fn parse_export_specifiers(&mut self) -> Result<Vec<NodeId>> {
        self.expect(TokenKind::LeftBrace)?;
        let mut specifiers = Vec::new();
        while self.peek() != TokenKind::RightBrace {
            let mark = self.pos;
            let type_only = self.is_type_only_specifier();
            if type_only {
                self.advance();
            }
            let local = self.parse_module_export_name()?;
            let exported = if self.consume_contextual("as") {
                Some(self.parse_module_export_name()?)
            } else {
                None
            };
            specifiers.push(self.finish(
                NodeKind::ExportSpecifier {
                    type_only,
                    local,
                    exported,
                },
                mark,
            ));
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightBrace)?;
        Ok(specifiers)
    }

    fn parse_export_default_expression(&mut self, mark: usize) -> Result<NodeId> {
        let expression = self.parse_assignment()?;
        self.consume_semicolon()?;
        Ok(self.finish(
            NodeKind::ExportAssignment {
                is_equals: false,
                expression,
            },
            mark,
        ))
    }
}
