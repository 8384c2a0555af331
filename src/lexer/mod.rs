//! TypeScript lexer/tokenizer
//!
//! Produces the full token stream up front. Every token keeps its byte offset
//! so the parser can build spans over the original text, and records whether a
//! line break preceded it for automatic semicolon insertion.

mod token;

pub use token::{Keyword, Token, TokenKind};

use crate::error::{messages, Error, Result, SourceLocation};

/// A lexer for TypeScript source code
pub struct Lexer<'src> {
    /// Source code being lexed
    source: &'src str,
    /// Source as bytes for faster access
    bytes: &'src [u8],
    /// Current position in bytes
    pos: usize,
    /// Current line number (1-indexed)
    line: u32,
    /// Current column number (1-indexed)
    column: u32,
    /// Kind of the last token produced, for regex/division disambiguation
    last_kind: Option<TokenKind>,
    /// Whether a newline was skipped before the token being scanned
    saw_newline: bool,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            last_kind: None,
            saw_newline: false,
        };
        lexer.skip_bom_and_shebang();
        lexer
    }

    fn skip_bom_and_shebang(&mut self) {
        if self.source.starts_with('\u{feff}') {
            self.pos = '\u{feff}'.len_utf8();
        }
        if self.source[self.pos..].starts_with("#!") {
            while let Some(c) = self.peek() {
                if c == '\n' {
                    break;
                }
                self.advance();
            }
        }
    }

    /// Get current source location
    fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            offset: self.pos,
        }
    }

    /// Create a lexer error with source context
    fn error(&self, message: impl Into<String>, location: SourceLocation) -> Error {
        Error::lexer_error(message, location).with_source_context(self.source)
    }

    /// Check if we've reached the end of input
    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        if self.is_eof() {
            None
        } else {
            self.source[self.pos..].chars().next()
        }
    }

    /// Peek at next character (one ahead)
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advance and return current character
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn is_line_terminator(c: char) -> bool {
        matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
    }

    /// Skip whitespace and comments, noting line breaks
    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        loop {
            while let Some(c) = self.peek() {
                if c.is_whitespace() || c == '\u{feff}' {
                    if Self::is_line_terminator(c) {
                        self.saw_newline = true;
                    }
                    self.advance();
                } else {
                    break;
                }
            }

            if self.peek() == Some('/') {
                if self.peek_next() == Some('/') {
                    while let Some(c) = self.peek() {
                        if Self::is_line_terminator(c) {
                            break;
                        }
                        self.advance();
                    }
                    continue;
                } else if self.peek_next() == Some('*') {
                    let start_loc = self.location();
                    self.advance();
                    self.advance();
                    loop {
                        match self.peek() {
                            None => {
                                return Err(self.error(messages::UNTERMINATED_COMMENT, start_loc))
                            }
                            Some('*') if self.peek_next() == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(c) => {
                                if Self::is_line_terminator(c) {
                                    self.saw_newline = true;
                                }
                                self.advance();
                            }
                        }
                    }
                    continue;
                }
            }

            break;
        }
        Ok(())
    }

    /// Check if character can start an identifier
    fn is_id_start(c: char) -> bool {
        c == '_' || c == '$' || c == '\\' || unicode_xid::UnicodeXID::is_xid_start(c)
    }

    /// Check if character can continue an identifier
    fn is_id_continue(c: char) -> bool {
        c == '_'
            || c == '$'
            || c == '\\'
            || c == '\u{200c}'
            || c == '\u{200d}'
            || unicode_xid::UnicodeXID::is_xid_continue(c)
    }

    fn token(&self, kind: TokenKind, start: usize, location: SourceLocation) -> Token<'src> {
        Token {
            kind,
            text: &self.source[start..self.pos],
            location,
            newline_before: self.saw_newline,
        }
    }

    /// Scan an identifier or reserved word
    fn scan_identifier(&mut self) -> Token<'src> {
        let start = self.pos;
        let start_loc = self.location();

        while let Some(c) = self.peek() {
            if c == '\\' {
                // \uXXXX or \u{...} escape inside an identifier
                self.advance();
                if self.peek() == Some('u') {
                    self.advance();
                    if self.peek() == Some('{') {
                        while let Some(c) = self.advance() {
                            if c == '}' {
                                break;
                            }
                        }
                    } else {
                        for _ in 0..4 {
                            self.advance();
                        }
                    }
                }
            } else if Self::is_id_continue(c) {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.pos];
        let kind = match Keyword::lookup(text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier,
        };
        self.token(kind, start, start_loc)
    }

    fn eat_digits(&mut self, accept: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if accept(c) || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Scan a numeric literal
    fn scan_number(&mut self) -> Token<'src> {
        let start = self.pos;
        let start_loc = self.location();

        if self.peek() == Some('0') {
            match self.peek_next() {
                Some('x') | Some('X') => {
                    self.advance();
                    self.advance();
                    self.eat_digits(|c| c.is_ascii_hexdigit());
                    return self.finish_number(start, start_loc);
                }
                Some('b') | Some('B') => {
                    self.advance();
                    self.advance();
                    self.eat_digits(|c| c == '0' || c == '1');
                    return self.finish_number(start, start_loc);
                }
                Some('o') | Some('O') => {
                    self.advance();
                    self.advance();
                    self.eat_digits(|c| ('0'..='7').contains(&c));
                    return self.finish_number(start, start_loc);
                }
                _ => {}
            }
        }

        self.eat_digits(|c| c.is_ascii_digit());

        if self.peek() == Some('.') {
            self.advance();
            self.eat_digits(|c| c.is_ascii_digit());
        }

        if matches!(self.peek(), Some('e') | Some('E'))
            && self
                .peek_next()
                .is_some_and(|c| c.is_ascii_digit() || c == '+' || c == '-')
        {
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            self.eat_digits(|c| c.is_ascii_digit());
        }

        self.finish_number(start, start_loc)
    }

    fn finish_number(&mut self, start: usize, start_loc: SourceLocation) -> Token<'src> {
        if self.peek() == Some('n') {
            self.advance();
            return self.token(TokenKind::BigIntLiteral, start, start_loc);
        }
        self.token(TokenKind::NumberLiteral, start, start_loc)
    }

    /// Scan a string literal
    fn scan_string(&mut self, quote: char) -> Result<Token<'src>> {
        let start = self.pos;
        let start_loc = self.location();
        self.advance(); // Opening quote

        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => {
                    return Err(self.error(messages::UNTERMINATED_STRING, start_loc));
                }
                Some('\\') => {
                    self.advance();
                    // Line continuations may escape a CRLF pair
                    if self.peek() == Some('\r') {
                        self.advance();
                        if self.peek() == Some('\n') {
                            self.advance();
                        }
                    } else {
                        self.advance();
                    }
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }

        Ok(self.token(TokenKind::StringLiteral, start, start_loc))
    }

    /// Scan template characters up to the closing backtick or the next `${`.
    /// Returns true when a substitution follows.
    fn scan_template_chars(&mut self, start_loc: SourceLocation) -> Result<bool> {
        loop {
            match self.peek() {
                None => {
                    return Err(self.error(messages::UNTERMINATED_TEMPLATE, start_loc));
                }
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some('$') if self.peek_next() == Some('{') => {
                    self.advance();
                    self.advance();
                    return Ok(true);
                }
                Some('`') => {
                    self.advance();
                    return Ok(false);
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Scan a template literal
    fn scan_template(&mut self) -> Result<Token<'src>> {
        let start = self.pos;
        let start_loc = self.location();
        self.advance(); // Opening backtick

        let kind = if self.scan_template_chars(start_loc)? {
            TokenKind::TemplateHead
        } else {
            TokenKind::TemplateLiteral
        };
        Ok(self.token(kind, start, start_loc))
    }

    /// Continue scanning a template literal after the `}` that closes a
    /// substitution. The produced token includes that `}`.
    fn scan_template_continuation(&mut self, brace: &Token<'src>) -> Result<Token<'src>> {
        let start = brace.start();
        let kind = if self.scan_template_chars(brace.location)? {
            TokenKind::TemplateMiddle
        } else {
            TokenKind::TemplateTail
        };
        Ok(Token {
            kind,
            text: &self.source[start..self.pos],
            location: brace.location,
            newline_before: brace.newline_before,
        })
    }

    /// Scan a regular expression literal; the opening `/` is already consumed
    fn scan_regex(&mut self, start: usize, start_loc: SourceLocation) -> Result<Token<'src>> {
        let mut in_class = false;
        loop {
            match self.peek() {
                None => return Err(self.error(messages::UNTERMINATED_REGEX, start_loc)),
                Some(c) if Self::is_line_terminator(c) => {
                    return Err(self.error(messages::UNTERMINATED_REGEX, start_loc))
                }
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some('[') => {
                    in_class = true;
                    self.advance();
                }
                Some(']') => {
                    in_class = false;
                    self.advance();
                }
                Some('/') if !in_class => {
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
        while let Some(c) = self.peek() {
            if Self::is_id_continue(c) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(self.token(TokenKind::RegexLiteral, start, start_loc))
    }

    fn regex_allowed(&self) -> bool {
        self.last_kind.is_none_or(|kind| kind.allows_regex_after())
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token<'src>> {
        self.saw_newline = false;
        self.skip_whitespace_and_comments()?;
        let token = self.scan_token()?;
        self.last_kind = Some(token.kind);
        Ok(token)
    }

    fn scan_token(&mut self) -> Result<Token<'src>> {
        let start_loc = self.location();
        let Some(c) = self.peek() else {
            return Ok(self.token(TokenKind::Eof, self.pos, start_loc));
        };

        if Self::is_id_start(c) {
            return Ok(self.scan_identifier());
        }

        if c.is_ascii_digit() || (c == '.' && self.peek_next().is_some_and(|n| n.is_ascii_digit()))
        {
            return Ok(self.scan_number());
        }

        if c == '"' || c == '\'' {
            return self.scan_string(c);
        }

        if c == '`' {
            return self.scan_template();
        }

        let start = self.pos;
        self.advance();

        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,
            '@' => TokenKind::At,
            // Never joined here; see `TokenKind`
            '>' => TokenKind::Greater,
            '?' => {
                if self.peek() == Some('.') && self.peek_next().is_none_or(|c| !c.is_ascii_digit())
                {
                    self.advance();
                    TokenKind::QuestionDot
                } else if self.peek() == Some('?') {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::QuestionQuestionEquals
                    } else {
                        TokenKind::QuestionQuestion
                    }
                } else {
                    TokenKind::Question
                }
            }
            '.' => {
                if self.peek() == Some('.') && self.peek_next() == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::DotDotDot
                } else {
                    TokenKind::Dot
                }
            }
            '+' => {
                if self.peek() == Some('+') {
                    self.advance();
                    TokenKind::PlusPlus
                } else if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::PlusEquals
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.peek() == Some('-') {
                    self.advance();
                    TokenKind::MinusMinus
                } else if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::MinusEquals
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::StarStarEquals
                    } else {
                        TokenKind::StarStar
                    }
                } else if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::StarEquals
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.regex_allowed() {
                    return self.scan_regex(start, start_loc);
                }
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::SlashEquals
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::PercentEquals
                } else {
                    TokenKind::Percent
                }
            }
            '<' => {
                if self.peek() == Some('<') {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::LessLessEquals
                    } else {
                        TokenKind::LessLess
                    }
                } else if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::LessEquals
                } else {
                    TokenKind::Less
                }
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::EqualsEqualsEquals
                    } else {
                        TokenKind::EqualsEquals
                    }
                } else if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    TokenKind::Equals
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::BangEqualsEquals
                    } else {
                        TokenKind::BangEquals
                    }
                } else {
                    TokenKind::Bang
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::AmpersandAmpersandEquals
                    } else {
                        TokenKind::AmpersandAmpersand
                    }
                } else if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::AmpersandEquals
                } else {
                    TokenKind::Ampersand
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::PipePipeEquals
                    } else {
                        TokenKind::PipePipe
                    }
                } else if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::PipeEquals
                } else {
                    TokenKind::Pipe
                }
            }
            '^' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::CaretEquals
                } else {
                    TokenKind::Caret
                }
            }
            '#' => {
                if self.peek().is_some_and(Self::is_id_start) {
                    while let Some(c) = self.peek() {
                        if Self::is_id_continue(c) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                    return Ok(self.token(TokenKind::PrivateName, start, start_loc));
                }
                return Err(self.error("Invalid private name", start_loc));
            }
            _ => {
                return Err(self.error(format!("Unexpected character '{}'", c), start_loc));
            }
        };

        Ok(self.token(kind, start, start_loc))
    }

    /// Tokenize the entire source into a vector of tokens
    pub fn tokenize(&mut self) -> Result<Vec<Token<'src>>> {
        let mut tokens = Vec::new();
        // Brace depth inside each open template substitution
        let mut brace_depth_stack: Vec<i32> = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;

            match token.kind {
                TokenKind::TemplateHead => {
                    brace_depth_stack.push(0);
                    tokens.push(token);
                }
                TokenKind::LeftBrace if !brace_depth_stack.is_empty() => {
                    if let Some(depth) = brace_depth_stack.last_mut() {
                        *depth += 1;
                    }
                    tokens.push(token);
                }
                TokenKind::RightBrace if !brace_depth_stack.is_empty() => {
                    let closes_substitution = brace_depth_stack.last() == Some(&0);
                    if closes_substitution {
                        let continuation = self.scan_template_continuation(&token)?;
                        if continuation.kind == TokenKind::TemplateTail {
                            brace_depth_stack.pop();
                        }
                        self.last_kind = Some(continuation.kind);
                        tokens.push(continuation);
                    } else {
                        if let Some(depth) = brace_depth_stack.last_mut() {
                            *depth -= 1;
                        }
                        tokens.push(token);
                    }
                }
                _ => {
                    tokens.push(token);
                }
            }

            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}

/// Tokenize a whole source text
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_empty_source() {
        let mut lexer = Lexer::new("");
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Eof);
    }

    #[test]
    fn test_identifiers_and_contextual_words() {
        let tokens = tokenize("foo type namespace _private $jquery").unwrap();
        assert!(tokens[..5].iter().all(|t| t.kind == TokenKind::Identifier));
        assert_eq!(tokens[1].text, "type");
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("const enum class")[..3],
            [
                TokenKind::Keyword(Keyword::Const),
                TokenKind::Keyword(Keyword::Enum),
                TokenKind::Keyword(Keyword::Class)
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("42 3.14 0xFF 0b1010 0o777 1e10 1_000 123n").unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(
            texts,
            ["42", "3.14", "0xFF", "0b1010", "0o777", "1e10", "1_000", "123n", ""]
        );
        assert_eq!(tokens[7].kind, TokenKind::BigIntLiteral);
    }

    #[test]
    fn test_offsets_and_newlines() {
        let tokens = tokenize("a\n  /* x\n */ b").unwrap();
        assert_eq!(tokens[0].start(), 0);
        assert!(!tokens[0].newline_before);
        assert_eq!(tokens[1].start(), 13);
        assert_eq!(tokens[1].end(), 14);
        assert!(tokens[1].newline_before);
        assert_eq!(tokens[1].location.line, 3);
    }

    #[test]
    fn test_greater_is_never_joined() {
        assert_eq!(
            kinds("a >>= b"),
            [
                TokenKind::Identifier,
                TokenKind::Greater,
                TokenKind::Greater,
                TokenKind::Equals,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_regex_versus_division() {
        let tokens = tokenize("x = a / b / c; y = /ab+c/gi.test(s)").unwrap();
        assert_eq!(tokens[3].kind, TokenKind::Slash);
        let regex = tokens
            .iter()
            .find(|t| t.kind == TokenKind::RegexLiteral)
            .unwrap();
        assert_eq!(regex.text, "/ab+c/gi");
    }

    #[test]
    fn test_regex_with_slash_in_class() {
        let tokens = tokenize("r = /[/]+/").unwrap();
        assert_eq!(tokens[2].text, "/[/]+/");
    }

    #[test]
    fn test_template_with_nested_braces() {
        let tokens = tokenize("`a${ {b: 1}.b }c${d}e`").unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(
            texts,
            ["`a${", "{", "b", ":", "1", "}", ".", "b", "}c${", "d", "}e`", ""]
        );
        assert_eq!(tokens[8].kind, TokenKind::TemplateMiddle);
        assert_eq!(tokens[10].kind, TokenKind::TemplateTail);
    }

    #[test]
    fn test_division_after_template() {
        let tokens = tokenize("`${a}` / 2").unwrap();
        assert_eq!(tokens[3].kind, TokenKind::Slash);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("let s = 'abc").unwrap_err();
        assert!(err.to_string().contains("Unterminated string literal"));
    }

    #[test]
    fn test_decorator_and_private_name() {
        assert_eq!(
            kinds("@dec #x")[..2],
            [TokenKind::At, TokenKind::Identifier]
        );
        assert_eq!(kinds("#x")[0], TokenKind::PrivateName);
    }
}
