//! Type syntax
//!
//! Types never become nodes. These routines only recognise where a type
//! ends so that the caller can record its span.

use super::Parser;
use crate::ast::Span;
use crate::error::Result;
use crate::lexer::{Keyword, TokenKind};

impl<'src> Parser<'src> {
    /// `: T`, returning a span that includes the colon
    pub(super) fn parse_type_annotation(&mut self) -> Result<Option<Span>> {
        if self.peek() != TokenKind::Colon {
            return Ok(None);
        }
        let start = self.current().start();
        self.advance();
        self.skip_type()?;
        Ok(Some(Span::new(start, self.prev_end())))
    }

    /// Return type annotation, including type predicates such as
    /// `x is T`, `asserts x` and `asserts this is T`
    pub(super) fn parse_return_type_annotation(&mut self) -> Result<Option<Span>> {
        if self.peek() != TokenKind::Colon {
            return Ok(None);
        }
        let start = self.current().start();
        self.advance();

        let is_subject = |p: &Self, offset: usize| {
            matches!(
                p.peek_at(offset),
                TokenKind::Identifier | TokenKind::Keyword(Keyword::This)
            ) && !p.newline_before_at(offset)
        };
        if self.is_contextual("asserts") && is_subject(self, 1) {
            self.advance();
            self.advance();
            if self.is_contextual("is") && !self.current().newline_before {
                self.advance();
                self.skip_type()?;
            }
        } else if is_subject(self, 0) && self.is_contextual_at(1, "is") && !self.newline_before_at(1) {
            self.advance();
            self.advance();
            self.skip_type()?;
        } else {
            self.skip_type()?;
        }

        Ok(Some(Span::new(start, self.prev_end())))
    }

    /// Skip one complete type
    pub(super) fn skip_type(&mut self) -> Result<()> {
        if self.is_function_type_start() {
            return self.skip_function_type();
        }
        self.skip_union_type()?;
        if self.peek() == TokenKind::Keyword(Keyword::Extends) && !self.current().newline_before {
            self.advance();
            self.skip_union_type()?;
            self.expect(TokenKind::Question)?;
            self.skip_type()?;
            self.expect(TokenKind::Colon)?;
            self.skip_type()?;
        }
        Ok(())
    }

    fn is_function_type_start(&mut self) -> bool {
        match self.peek() {
            TokenKind::Less | TokenKind::Keyword(Keyword::New) => true,
            TokenKind::Identifier if self.current().text == "abstract" => {
                self.peek_at(1) == TokenKind::Keyword(Keyword::New)
            }
            TokenKind::LeftParen => {
                let pos = self.pos;
                let found = self
                    .speculate(|p| {
                        p.skip_balanced()?;
                        if p.peek() == TokenKind::Arrow {
                            Ok(())
                        } else {
                            Err(p.unexpected())
                        }
                    })
                    .is_some();
                self.pos = pos;
                found
            }
            _ => false,
        }
    }

    /// `<T>(a: T) => R`, `new () => R` or `abstract new () => R`
    fn skip_function_type(&mut self) -> Result<()> {
        self.consume_contextual("abstract");
        self.consume(TokenKind::Keyword(Keyword::New));
        if self.peek() == TokenKind::Less {
            self.skip_type_parameters()?;
        }
        if self.peek() != TokenKind::LeftParen {
            return Err(self.expected("'('"));
        }
        self.skip_balanced()?;
        self.expect(TokenKind::Arrow)?;
        let predicate_subject = matches!(
            self.peek(),
            TokenKind::Identifier | TokenKind::Keyword(Keyword::This)
        );
        if predicate_subject && (self.is_contextual("asserts") || self.is_contextual_at(1, "is")) {
            // Type predicate in a function type
            self.advance();
            self.advance();
            if self.consume_contextual("is") {
                self.skip_type()?;
            }
            return Ok(());
        }
        self.skip_type()
    }

    fn skip_union_type(&mut self) -> Result<()> {
        self.consume(TokenKind::Pipe);
        self.skip_intersection_type()?;
        while self.consume(TokenKind::Pipe) {
            self.skip_intersection_type()?;
        }
        Ok(())
    }

    fn skip_intersection_type(&mut self) -> Result<()> {
        self.consume(TokenKind::Ampersand);
        self.skip_type_operator()?;
        while self.consume(TokenKind::Ampersand) {
            self.skip_type_operator()?;
        }
        Ok(())
    }

    fn skip_type_operator(&mut self) -> Result<()> {
        let operand_follows = !self.newline_before_at(1)
            && !matches!(
                self.peek_at(1),
                TokenKind::Comma
                    | TokenKind::Greater
                    | TokenKind::RightParen
                    | TokenKind::RightBracket
                    | TokenKind::RightBrace
                    | TokenKind::Semicolon
                    | TokenKind::Equals
                    | TokenKind::Pipe
                    | TokenKind::Ampersand
                    | TokenKind::Eof
            );
        if operand_follows
            && (self.is_contextual("keyof")
                || self.is_contextual("unique")
                || self.is_contextual("readonly"))
        {
            self.advance();
            return self.skip_type_operator();
        }
        if operand_follows && self.is_contextual("infer") {
            self.advance();
            self.expect(TokenKind::Identifier)?;
            if self.peek() == TokenKind::Keyword(Keyword::Extends) {
                // A constraint, unless the `extends` starts a conditional type
                self.speculate(|p| {
                    p.advance();
                    p.skip_union_type()?;
                    if p.peek() == TokenKind::Question {
                        Err(p.unexpected())
                    } else {
                        Ok(())
                    }
                });
            }
            return Ok(());
        }
        self.skip_postfix_type()
    }

    /// Array types and indexed access
    fn skip_postfix_type(&mut self) -> Result<()> {
        self.skip_primary_type()?;
        while self.peek() == TokenKind::LeftBracket && !self.current().newline_before {
            self.advance();
            if !self.consume(TokenKind::RightBracket) {
                self.skip_type()?;
                self.expect(TokenKind::RightBracket)?;
            }
        }
        Ok(())
    }

    fn skip_primary_type(&mut self) -> Result<()> {
        match self.peek() {
            TokenKind::Identifier => {
                self.advance();
                self.skip_entity_name_rest()?;
                self.skip_optional_type_arguments()
            }
            TokenKind::Keyword(Keyword::Typeof) => {
                self.advance();
                if self.peek() == TokenKind::Keyword(Keyword::Import) {
                    return self.skip_import_type();
                }
                if !self.is_identifier_name_at(0) {
                    return Err(self.expected("identifier"));
                }
                self.advance();
                self.skip_entity_name_rest()?;
                self.skip_optional_type_arguments()
            }
            TokenKind::Keyword(Keyword::Import) => self.skip_import_type(),
            TokenKind::Keyword(
                Keyword::Void | Keyword::Null | Keyword::This | Keyword::True | Keyword::False,
            )
            | TokenKind::StringLiteral
            | TokenKind::NumberLiteral
            | TokenKind::BigIntLiteral
            | TokenKind::TemplateLiteral
            | TokenKind::Star
            | TokenKind::Question => {
                self.advance();
                Ok(())
            }
            TokenKind::Minus
                if matches!(
                    self.peek_at(1),
                    TokenKind::NumberLiteral | TokenKind::BigIntLiteral
                ) =>
            {
                self.advance();
                self.advance();
                Ok(())
            }
            TokenKind::TemplateHead => {
                self.advance();
                loop {
                    self.skip_type()?;
                    match self.advance().kind {
                        TokenKind::TemplateMiddle => {}
                        TokenKind::TemplateTail => return Ok(()),
                        _ => return Err(self.expected("'}'")),
                    }
                }
            }
            TokenKind::LeftBrace | TokenKind::LeftBracket | TokenKind::LeftParen => {
                self.skip_balanced()?;
                Ok(())
            }
            _ => Err(self.expected("type")),
        }
    }

    /// `.B.C` after the first name of a qualified name
    fn skip_entity_name_rest(&mut self) -> Result<()> {
        while self.peek() == TokenKind::Dot {
            self.advance();
            if !self.is_identifier_name_at(0) && self.peek() != TokenKind::PrivateName {
                return Err(self.expected("identifier"));
            }
            self.advance();
        }
        Ok(())
    }

    fn skip_optional_type_arguments(&mut self) -> Result<()> {
        if self.peek() == TokenKind::Less && !self.current().newline_before {
            self.skip_type_arguments()?;
        }
        Ok(())
    }

    /// `import("m").A<T>`
    fn skip_import_type(&mut self) -> Result<()> {
        self.expect(TokenKind::Keyword(Keyword::Import))?;
        if self.peek() != TokenKind::LeftParen {
            return Err(self.expected("'('"));
        }
        self.skip_balanced()?;
        self.skip_entity_name_rest()?;
        self.skip_optional_type_arguments()
    }

    /// `<A, B>` in a type reference, call or heritage clause
    pub(super) fn skip_type_arguments(&mut self) -> Result<Span> {
        let start = self.current().start();
        self.expect(TokenKind::Less)?;
        while self.peek() != TokenKind::Greater {
            self.skip_type()?;
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Greater)?;
        Ok(Span::new(start, self.prev_end()))
    }

    /// `<T extends U = D, ...>` on a declaration
    pub(super) fn skip_type_parameters(&mut self) -> Result<Span> {
        let start = self.current().start();
        self.expect(TokenKind::Less)?;
        while self.peek() != TokenKind::Greater {
            while (self.is_contextual("out")
                || self.peek() == TokenKind::Keyword(Keyword::Const)
                || self.peek() == TokenKind::Keyword(Keyword::In))
                && self.peek_at(1) == TokenKind::Identifier
            {
                self.advance();
            }
            self.expect(TokenKind::Identifier)?;
            if self.consume(TokenKind::Keyword(Keyword::Extends)) {
                self.skip_type()?;
            }
            if self.consume(TokenKind::Equals) {
                self.skip_type()?;
            }
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Greater)?;
        Ok(Span::new(start, self.prev_end()))
    }

    /// Skip from an opening bracket to its matching close
    pub(super) fn skip_balanced(&mut self) -> Result<Span> {
        let start = self.current().start();
        let mut depth = 0usize;
        loop {
            match self.peek() {
                TokenKind::LeftParen
                | TokenKind::LeftBracket
                | TokenKind::LeftBrace
                | TokenKind::TemplateHead => depth += 1,
                TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::RightBrace
                | TokenKind::TemplateTail => {
                    if depth == 0 {
                        return Err(self.unexpected());
                    }
                    depth -= 1;
                }
                TokenKind::Eof => return Err(self.unexpected()),
                _ => {}
            }
            self.advance();
            if depth == 0 {
                return Ok(Span::new(start, self.prev_end()));
            }
        }
    }
}
