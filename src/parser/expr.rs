//! Expression parsing

use super::decl::FunctionHeader;
use super::Parser;
use crate::ast::*;
use crate::error::Result;
use crate::lexer::{Keyword, TokenKind};

/// Precedence of `as` and `satisfies`, shared with relational operators
const AS_PRECEDENCE: u8 = 8;

/// Operators spelled with a run of adjacent `>` tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GreaterRun {
    Binary(BinaryOp),
    Assign(AssignOp),
}

/// Everything about an arrow function ahead of its `=>`
struct ArrowHead {
    type_parameters: Option<Span>,
    params: Vec<NodeId>,
    params_span: Span,
    return_type: Option<Span>,
    is_async: bool,
}

impl<'src> Parser<'src> {
    /// Comma-separated expression
    pub(super) fn parse_expression(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        let first = self.parse_assignment()?;
        if self.peek() != TokenKind::Comma {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.consume(TokenKind::Comma) {
            expressions.push(self.parse_assignment()?);
        }
        Ok(self.finish(NodeKind::Sequence { expressions }, mark))
    }

    pub(super) fn parse_assignment(&mut self) -> Result<NodeId> {
        if let Some(arrow) = self.try_parse_arrow_function()? {
            return Ok(arrow);
        }
        if self.flags.in_generator && self.is_contextual("yield") {
            return self.parse_yield();
        }

        let mark = self.pos;
        let target = self.parse_conditional()?;
        let Some((op, count)) = self.assignment_operator() else {
            return Ok(target);
        };
        for _ in 0..count {
            self.advance();
        }
        let value = self.parse_assignment()?;
        Ok(self.finish(NodeKind::Assign { op, target, value }, mark))
    }

    fn assignment_operator(&self) -> Option<(AssignOp, usize)> {
        let op = match self.peek() {
            TokenKind::Equals => AssignOp::Assign,
            TokenKind::PlusEquals => AssignOp::Add,
            TokenKind::MinusEquals => AssignOp::Sub,
            TokenKind::StarEquals => AssignOp::Mul,
            TokenKind::SlashEquals => AssignOp::Div,
            TokenKind::PercentEquals => AssignOp::Mod,
            TokenKind::StarStarEquals => AssignOp::Exp,
            TokenKind::LessLessEquals => AssignOp::Shl,
            TokenKind::AmpersandEquals => AssignOp::BitAnd,
            TokenKind::PipeEquals => AssignOp::BitOr,
            TokenKind::CaretEquals => AssignOp::BitXor,
            TokenKind::AmpersandAmpersandEquals => AssignOp::And,
            TokenKind::PipePipeEquals => AssignOp::Or,
            TokenKind::QuestionQuestionEquals => AssignOp::Nullish,
            TokenKind::Greater => {
                return match self.greater_run() {
                    (GreaterRun::Assign(op), count) => Some((op, count)),
                    _ => None,
                }
            }
            _ => return None,
        };
        Some((op, 1))
    }

    /// Join the `>` at the current position with the adjacent tokens that
    /// follow it
    fn greater_run(&self) -> (GreaterRun, usize) {
        let adjacent = |offset: usize| {
            self.tokens
                .get(self.pos + offset)
                .is_some_and(|t| t.start() == self.tokens[self.pos + offset - 1].end())
        };
        let is = |offset: usize, kind: TokenKind| self.peek_at(offset) == kind && adjacent(offset);

        if is(1, TokenKind::Greater) {
            if is(2, TokenKind::Greater) {
                if is(3, TokenKind::Equals) {
                    (GreaterRun::Assign(AssignOp::UShr), 4)
                } else {
                    (GreaterRun::Binary(BinaryOp::UShr), 3)
                }
            } else if is(2, TokenKind::Equals) {
                (GreaterRun::Assign(AssignOp::Shr), 3)
            } else {
                (GreaterRun::Binary(BinaryOp::Shr), 2)
            }
        } else if is(1, TokenKind::Equals) {
            (GreaterRun::Binary(BinaryOp::GtEq), 2)
        } else {
            (GreaterRun::Binary(BinaryOp::Gt), 1)
        }
    }

    // ========== Arrow Functions ==========

    fn try_parse_arrow_function(&mut self) -> Result<Option<NodeId>> {
        let candidate = match self.peek() {
            TokenKind::LeftParen | TokenKind::Less => true,
            TokenKind::Identifier => {
                (self.peek_at(1) == TokenKind::Arrow && !self.newline_before_at(1))
                    || (self.is_contextual("async")
                        && !self.newline_before_at(1)
                        && matches!(
                            self.peek_at(1),
                            TokenKind::LeftParen | TokenKind::Less | TokenKind::Identifier
                        ))
            }
            _ => false,
        };
        if !candidate {
            return Ok(None);
        }

        let mark = self.pos;
        let Some(head) = self.speculate(|p| p.parse_arrow_head()) else {
            return Ok(None);
        };

        let saved = self.flags;
        self.flags.in_async = head.is_async;
        self.flags.in_generator = false;
        self.flags.in_decorator = false;
        self.flags.in_heritage = false;
        let body = if self.peek() == TokenKind::LeftBrace {
            self.parse_block()
        } else {
            self.parse_assignment()
        };
        self.flags = saved;
        let body = body?;

        let function = Function {
            kind: FunctionKind::Arrow,
            modifiers: Modifiers::default(),
            decorators: Vec::new(),
            name: None,
            name_insert_at: self.tokens[mark].start(),
            optional: None,
            type_parameters: head.type_parameters,
            params: head.params,
            params_span: head.params_span,
            return_type: head.return_type,
            body: Some(body),
            is_async: head.is_async,
            is_generator: false,
        };
        Ok(Some(self.finish(NodeKind::ArrowFunction(Box::new(function)), mark)))
    }

    /// Parameters, return type and `=>`; fails if this is not an arrow
    fn parse_arrow_head(&mut self) -> Result<ArrowHead> {
        let is_async = self.is_contextual("async")
            && self.peek_at(1) != TokenKind::Arrow
            && !self.newline_before_at(1);
        if is_async {
            self.advance();
        }

        if self.peek() == TokenKind::Identifier && self.peek_at(1) == TokenKind::Arrow {
            let mark = self.pos;
            let name = self.parse_identifier()?;
            let param = self.finish(
                NodeKind::Parameter {
                    modifiers: Modifiers::default(),
                    decorators: Vec::new(),
                    rest: false,
                    name,
                    optional: None,
                    type_annotation: None,
                    init: None,
                },
                mark,
            );
            let params_span = self.nodes[name.index()].span;
            self.advance();
            return Ok(ArrowHead {
                type_parameters: None,
                params: vec![param],
                params_span,
                return_type: None,
                is_async,
            });
        }

        let type_parameters = if self.peek() == TokenKind::Less {
            Some(self.skip_type_parameters()?)
        } else {
            None
        };
        let saved = self.flags;
        self.flags.in_async = is_async;
        let params = self.parse_parameters();
        self.flags = saved;
        let (params, params_span) = params?;
        let return_type = self.parse_return_type_annotation()?;
        if self.peek() != TokenKind::Arrow || self.current().newline_before {
            return Err(self.expected("'=>'"));
        }
        self.advance();

        Ok(ArrowHead {
            type_parameters,
            params,
            params_span,
            return_type,
            is_async,
        })
    }

    fn parse_yield(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        self.advance();
        let delegate = !self.current().newline_before && self.consume(TokenKind::Star);
        let argument = if delegate
            || (!self.current().newline_before && self.peek().can_start_expression())
        {
            Some(self.parse_assignment()?)
        } else {
            None
        };
        Ok(self.finish(NodeKind::Yield { argument, delegate }, mark))
    }

    // ========== Operators ==========

    fn parse_conditional(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        let test = self.parse_binary(0)?;
        if !self.consume(TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.nested(|p| p.parse_assignment())?;
        self.expect(TokenKind::Colon)?;
        let alternate = self.parse_assignment()?;
        Ok(self.finish(
            NodeKind::Conditional {
                test,
                consequent,
                alternate,
            },
            mark,
        ))
    }

    fn binary_operator(&self) -> Option<(BinaryOp, usize)> {
        let op = match self.peek() {
            TokenKind::QuestionQuestion => BinaryOp::Nullish,
            TokenKind::PipePipe => BinaryOp::Or,
            TokenKind::AmpersandAmpersand => BinaryOp::And,
            TokenKind::Pipe => BinaryOp::BitOr,
            TokenKind::Caret => BinaryOp::BitXor,
            TokenKind::Ampersand => BinaryOp::BitAnd,
            TokenKind::EqualsEquals => BinaryOp::Eq,
            TokenKind::BangEquals => BinaryOp::NotEq,
            TokenKind::EqualsEqualsEquals => BinaryOp::StrictEq,
            TokenKind::BangEqualsEquals => BinaryOp::StrictNotEq,
            TokenKind::Less => BinaryOp::Lt,
            TokenKind::LessEquals => BinaryOp::LtEq,
            TokenKind::Keyword(Keyword::Instanceof) => BinaryOp::Instanceof,
            TokenKind::Keyword(Keyword::In) if !self.flags.no_in => BinaryOp::In,
            TokenKind::LessLess => BinaryOp::Shl,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            TokenKind::StarStar => BinaryOp::Exp,
            TokenKind::Greater => {
                return match self.greater_run() {
                    (GreaterRun::Binary(op), count) => Some((op, count)),
                    _ => None,
                }
            }
            _ => return None,
        };
        Some((op, 1))
    }

    /// Precedence climbing over binary operators, `as` and `satisfies`
    fn parse_binary(&mut self, min_precedence: u8) -> Result<NodeId> {
        let mark = self.pos;
        let mut left = self.parse_unary()?;

        loop {
            if (self.is_contextual("as") || self.is_contextual("satisfies"))
                && !self.current().newline_before
            {
                if AS_PRECEDENCE < min_precedence {
                    break;
                }
                let is_satisfies = self.is_contextual("satisfies");
                let type_start = self.current().start();
                self.advance();
                if !is_satisfies && self.peek() == TokenKind::Keyword(Keyword::Const) {
                    self.advance();
                } else {
                    self.skip_type()?;
                }
                let type_span = Span::new(type_start, self.prev_end());
                let kind = if is_satisfies {
                    NodeKind::Satisfies {
                        expression: left,
                        type_span,
                    }
                } else {
                    NodeKind::As {
                        expression: left,
                        type_span,
                    }
                };
                left = self.finish(kind, mark);
                continue;
            }

            let Some((op, count)) = self.binary_operator() else {
                break;
            };
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            for _ in 0..count {
                self.advance();
            }
            // `**` is right-associative
            let next = if op == BinaryOp::Exp {
                precedence
            } else {
                precedence + 1
            };
            let right = self.parse_binary(next)?;
            left = self.finish(NodeKind::Binary { op, left, right }, mark);
        }

        Ok(left)
    }

    /// `await` starts an expression here rather than naming a variable
    fn is_await_expression(&self) -> bool {
        if !self.is_contextual("await") {
            return false;
        }
        if self.flags.in_async {
            return true;
        }
        // Top-level await
        !self.newline_before_at(1)
            && matches!(
                self.peek_at(1),
                TokenKind::Identifier
                    | TokenKind::Keyword(_)
                    | TokenKind::NumberLiteral
                    | TokenKind::BigIntLiteral
                    | TokenKind::StringLiteral
                    | TokenKind::TemplateLiteral
                    | TokenKind::TemplateHead
            )
    }

    fn parse_unary(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        let op = match self.peek() {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Keyword(Keyword::Typeof) => Some(UnaryOp::Typeof),
            TokenKind::Keyword(Keyword::Void) => Some(UnaryOp::Void),
            TokenKind::Keyword(Keyword::Delete) => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(self.finish(NodeKind::Unary { op, operand }, mark));
        }

        match self.peek() {
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if self.advance().kind == TokenKind::PlusPlus {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                let operand = self.parse_unary()?;
                Ok(self.finish(
                    NodeKind::Update {
                        op,
                        prefix: true,
                        operand,
                    },
                    mark,
                ))
            }
            TokenKind::Less => {
                let type_start = self.current().start();
                self.advance();
                if self.peek() == TokenKind::Keyword(Keyword::Const) {
                    self.advance();
                } else {
                    self.skip_type()?;
                }
                self.expect(TokenKind::Greater)?;
                let type_span = Span::new(type_start, self.prev_end());
                let expression = self.parse_unary()?;
                Ok(self.finish(
                    NodeKind::TypeAssertion {
                        type_span,
                        expression,
                    },
                    mark,
                ))
            }
            _ if self.is_await_expression() => {
                self.advance();
                let argument = self.parse_unary()?;
                Ok(self.finish(NodeKind::Await { argument }, mark))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        let operand = self.parse_lhs()?;
        if matches!(self.peek(), TokenKind::PlusPlus | TokenKind::MinusMinus)
            && !self.current().newline_before
        {
            let op = if self.advance().kind == TokenKind::PlusPlus {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            return Ok(self.finish(
                NodeKind::Update {
                    op,
                    prefix: false,
                    operand,
                },
                mark,
            ));
        }
        Ok(operand)
    }

    // ========== Left-Hand Side ==========

    /// Member access, calls and the other postfix forms
    pub(super) fn parse_lhs(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        let head = self.parse_lhs_head()?;
        self.parse_member_tail(head, mark, true)
    }

    fn parse_lhs_head(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        match self.peek() {
            TokenKind::Keyword(Keyword::New) => self.parse_new(),
            TokenKind::Keyword(Keyword::Super) => {
                self.advance();
                Ok(self.finish(NodeKind::Super, mark))
            }
            TokenKind::Keyword(Keyword::Import) => {
                self.advance();
                if self.consume(TokenKind::Dot) {
                    self.parse_identifier_name()?;
                    Ok(self.finish(NodeKind::MetaProperty, mark))
                } else {
                    Ok(self.finish(NodeKind::ImportKeyword, mark))
                }
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_new(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        self.advance();
        if self.consume(TokenKind::Dot) {
            self.parse_identifier_name()?;
            return Ok(self.finish(NodeKind::MetaProperty, mark));
        }

        let callee_mark = self.pos;
        let head = self.parse_lhs_head()?;
        let callee = self.parse_member_tail(head, callee_mark, false)?;
        let type_arguments = if self.peek() == TokenKind::Less {
            self.speculate(|p| {
                let span = p.skip_type_arguments()?;
                if p.peek() == TokenKind::LeftParen {
                    Ok(span)
                } else {
                    Err(p.unexpected())
                }
            })
        } else {
            None
        };
        let arguments = if self.peek() == TokenKind::LeftParen {
            Some(self.parse_arguments()?)
        } else {
            None
        };

        Ok(self.finish(
            NodeKind::New {
                callee,
                type_arguments,
                arguments,
            },
            mark,
        ))
    }

    fn parse_member_name(&mut self) -> Result<NodeId> {
        if self.peek() == TokenKind::PrivateName {
            let mark = self.pos;
            self.advance();
            Ok(self.finish(NodeKind::PrivateName, mark))
        } else {
            self.parse_identifier_name()
        }
    }

    fn parse_member_tail(&mut self, mut expr: NodeId, mark: usize, allow_call: bool) -> Result<NodeId> {
        loop {
            let kind = match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.parse_member_name()?;
                    NodeKind::Member {
                        object: expr,
                        property,
                        optional: false,
                    }
                }
                TokenKind::QuestionDot if allow_call => {
                    self.advance();
                    match self.peek() {
                        TokenKind::LeftParen => NodeKind::Call {
                            callee: expr,
                            optional: true,
                            type_arguments: None,
                            arguments: self.parse_arguments()?,
                        },
                        TokenKind::LeftBracket => {
                            self.advance();
                            let index = self.nested(|p| p.parse_expression())?;
                            self.expect(TokenKind::RightBracket)?;
                            NodeKind::Index {
                                object: expr,
                                index,
                                optional: true,
                            }
                        }
                        TokenKind::Less => {
                            let type_arguments = Some(self.skip_type_arguments()?);
                            NodeKind::Call {
                                callee: expr,
                                optional: true,
                                type_arguments,
                                arguments: self.parse_arguments()?,
                            }
                        }
                        _ => NodeKind::Member {
                            object: expr,
                            property: self.parse_member_name()?,
                            optional: true,
                        },
                    }
                }
                TokenKind::LeftBracket if !self.flags.in_decorator => {
                    self.advance();
                    let index = self.nested(|p| p.parse_expression())?;
                    self.expect(TokenKind::RightBracket)?;
                    NodeKind::Index {
                        object: expr,
                        index,
                        optional: false,
                    }
                }
                TokenKind::LeftParen if allow_call => NodeKind::Call {
                    callee: expr,
                    optional: false,
                    type_arguments: None,
                    arguments: self.parse_arguments()?,
                },
                TokenKind::TemplateLiteral | TokenKind::TemplateHead => NodeKind::TaggedTemplate {
                    tag: expr,
                    type_arguments: None,
                    template: self.parse_template()?,
                },
                TokenKind::Bang if !self.current().newline_before => {
                    self.advance();
                    NodeKind::NonNull { expression: expr }
                }
                TokenKind::Less if allow_call && !self.flags.in_heritage => {
                    let Some(type_arguments) = self.try_parse_type_arguments_in_expression() else {
                        break;
                    };
                    match self.peek() {
                        TokenKind::LeftParen => NodeKind::Call {
                            callee: expr,
                            optional: false,
                            type_arguments: Some(type_arguments),
                            arguments: self.parse_arguments()?,
                        },
                        TokenKind::TemplateLiteral | TokenKind::TemplateHead => {
                            NodeKind::TaggedTemplate {
                                tag: expr,
                                type_arguments: Some(type_arguments),
                                template: self.parse_template()?,
                            }
                        }
                        _ => NodeKind::Instantiation {
                            expression: expr,
                            type_arguments,
                        },
                    }
                }
                _ => break,
            };
            expr = self.finish(kind, mark);
        }
        Ok(expr)
    }

    /// `<...>` in expression position, kept only when what follows could
    /// not continue a comparison
    fn try_parse_type_arguments_in_expression(&mut self) -> Option<Span> {
        self.speculate(|p| {
            let span = p.skip_type_arguments()?;
            let can_follow = match p.peek() {
                TokenKind::LeftParen | TokenKind::TemplateLiteral | TokenKind::TemplateHead => true,
                TokenKind::Less | TokenKind::Greater | TokenKind::Plus | TokenKind::Minus => false,
                kind => {
                    p.current().newline_before
                        || p.binary_operator().is_some()
                        || !kind.can_start_expression()
                }
            };
            if can_follow {
                Ok(span)
            } else {
                Err(p.unexpected())
            }
        })
    }

    fn parse_arguments(&mut self) -> Result<Vec<NodeId>> {
        self.expect(TokenKind::LeftParen)?;
        let arguments = self.nested(|p| {
            let mut arguments = Vec::new();
            while p.peek() != TokenKind::RightParen {
                arguments.push(p.parse_spread_or_assignment()?);
                if !p.consume(TokenKind::Comma) {
                    break;
                }
            }
            Ok(arguments)
        })?;
        self.expect(TokenKind::RightParen)?;
        Ok(arguments)
    }

    fn parse_spread_or_assignment(&mut self) -> Result<NodeId> {
        if self.peek() == TokenKind::DotDotDot {
            let mark = self.pos;
            self.advance();
            let expression = self.parse_assignment()?;
            Ok(self.finish(NodeKind::SpreadElement { expression }, mark))
        } else {
            self.parse_assignment()
        }
    }

    // ========== Primary Expressions ==========

    fn parse_primary(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        let token = *self.current();
        let simple = match token.kind {
            TokenKind::Identifier => {
                if token.text == "async"
                    && self.peek_at(1) == TokenKind::Keyword(Keyword::Function)
                    && !self.newline_before_at(1)
                {
                    return self.parse_function_expression();
                }
                NodeKind::Identifier
            }
            TokenKind::PrivateName => NodeKind::PrivateName,
            TokenKind::NumberLiteral => NodeKind::NumericLiteral {
                value: super::number_value(token.text),
            },
            TokenKind::BigIntLiteral => NodeKind::BigIntLiteral,
            TokenKind::StringLiteral => NodeKind::StringLiteral {
                value: super::string_value(token.text),
            },
            TokenKind::RegexLiteral => NodeKind::RegexLiteral,
            TokenKind::Keyword(Keyword::This) => NodeKind::This,
            TokenKind::Keyword(Keyword::Null) => NodeKind::Null,
            TokenKind::Keyword(Keyword::True) => NodeKind::True,
            TokenKind::Keyword(Keyword::False) => NodeKind::False,
            TokenKind::TemplateLiteral | TokenKind::TemplateHead => return self.parse_template(),
            TokenKind::LeftParen => {
                self.advance();
                let expression = self.nested(|p| p.parse_expression())?;
                self.expect(TokenKind::RightParen)?;
                return Ok(self.finish(NodeKind::Paren { expression }, mark));
            }
            TokenKind::LeftBracket => return self.parse_array_literal(),
            TokenKind::LeftBrace => return self.parse_object_literal(),
            TokenKind::Keyword(Keyword::Function) => return self.parse_function_expression(),
            TokenKind::Keyword(Keyword::Class) | TokenKind::At => {
                let decorators = self.parse_decorators()?;
                let class = self.parse_class(Modifiers::default(), decorators)?;
                return Ok(self.finish(NodeKind::ClassExpression(Box::new(class)), mark));
            }
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok(self.finish(simple, mark))
    }

    fn parse_template(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        let head = self.advance();
        let mut expressions = Vec::new();
        if head.kind == TokenKind::TemplateHead {
            loop {
                expressions.push(self.nested(|p| p.parse_expression())?);
                match self.peek() {
                    TokenKind::TemplateMiddle => {
                        self.advance();
                    }
                    TokenKind::TemplateTail => {
                        self.advance();
                        break;
                    }
                    _ => return Err(self.expected("'}'")),
                }
            }
        }
        Ok(self.finish(NodeKind::TemplateLiteral { expressions }, mark))
    }

    fn parse_array_literal(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        self.advance();
        let elements = self.nested(|p| {
            let mut elements = Vec::new();
            loop {
                match p.peek() {
                    TokenKind::RightBracket => break,
                    TokenKind::Comma => {
                        p.advance();
                        elements.push(None);
                        continue;
                    }
                    _ => {}
                }
                elements.push(Some(p.parse_spread_or_assignment()?));
                if p.peek() != TokenKind::RightBracket {
                    p.expect(TokenKind::Comma)?;
                }
            }
            Ok(elements)
        })?;
        self.expect(TokenKind::RightBracket)?;
        Ok(self.finish(NodeKind::ArrayLiteral { elements }, mark))
    }

    fn parse_object_literal(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        self.advance();
        let properties = self.nested(|p| {
            let mut properties = Vec::new();
            while p.peek() != TokenKind::RightBrace {
                properties.push(p.parse_object_member()?);
                if !p.consume(TokenKind::Comma) {
                    break;
                }
            }
            Ok(properties)
        })?;
        self.expect(TokenKind::RightBrace)?;
        Ok(self.finish(NodeKind::ObjectLiteral { properties }, mark))
    }

    fn parse_object_member(&mut self) -> Result<NodeId> {
        let mark = self.pos;
        if self.consume(TokenKind::DotDotDot) {
            let expression = self.parse_assignment()?;
            return Ok(self.finish(NodeKind::SpreadElement { expression }, mark));
        }

        let mut header = FunctionHeader::new(FunctionKind::Method, 0);
        self.parse_method_prefix(&mut header);
        header.name_insert_at = self.current().start();
        let name = self.parse_property_name()?;

        if matches!(self.peek(), TokenKind::LeftParen | TokenKind::Less)
            || header.kind != FunctionKind::Method
            || header.is_async
            || header.is_generator
        {
            header.name = Some(name);
            let function = self.parse_function_rest(header)?;
            if function.body.is_none() {
                return Err(self.expected("'{'"));
            }
            return Ok(self.finish(NodeKind::MethodDeclaration(Box::new(function)), mark));
        }

        if self.consume(TokenKind::Colon) {
            let value = self.parse_assignment()?;
            return Ok(self.finish(NodeKind::PropertyAssignment { name, value }, mark));
        }

        if self.nodes[name.index()].kind != NodeKind::Identifier {
            return Err(self.expected("':'"));
        }
        let default = if self.consume(TokenKind::Equals) {
            Some(self.parse_assignment()?)
        } else {
            None
        };
        Ok(self.finish(NodeKind::ShorthandProperty { name, default }, mark))
    }
}
