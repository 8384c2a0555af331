//! Token definitions for the TypeScript lexer

use crate::error::SourceLocation;

/// A token produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'src> {
    /// The kind of token
    pub kind: TokenKind,
    /// The source text of the token
    pub text: &'src str,
    /// Location in source
    pub location: SourceLocation,
    /// A line terminator appeared between the previous token and this one
    pub newline_before: bool,
}

impl Token<'_> {
    /// Byte offset of the first character
    pub fn start(&self) -> usize {
        self.location.offset
    }

    /// Byte offset one past the last character
    pub fn end(&self) -> usize {
        self.location.offset + self.text.len()
    }

    /// Identifier or reserved word, usable as a property name
    pub fn is_identifier_name(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier | TokenKind::Keyword(_))
    }
}

/// The kind of a token
///
/// `>` is always produced as a single [`TokenKind::Greater`]; the parser joins
/// adjacent `>` tokens into shift and comparison operators so that nested type
/// argument lists such as `Array<Array<T>>` close correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal (42, 3.14, 0xFF)
    NumberLiteral,
    /// BigInt literal (42n)
    BigIntLiteral,
    /// String literal ("hello", 'world')
    StringLiteral,
    /// Template literal with no substitutions (`hello`)
    TemplateLiteral,
    /// Template head (`hello ${)
    TemplateHead,
    /// Template middle (} middle ${)
    TemplateMiddle,
    /// Template tail (} tail`)
    TemplateTail,
    /// Regular expression literal (/pattern/flags)
    RegexLiteral,

    // Identifiers and keywords
    /// Identifier, including contextual words such as `type` or `namespace`
    Identifier,
    /// Private name (#foo, #bar)
    PrivateName,
    /// Reserved word
    Keyword(Keyword),

    // Punctuators
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `.`
    Dot,
    /// `...`
    DotDotDot,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `?`
    Question,
    /// `?.`
    QuestionDot,
    /// `??`
    QuestionQuestion,
    /// `??=`
    QuestionQuestionEquals,
    /// `@`
    At,

    // Operators
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    StarStar,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,

    // Comparison operators
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEquals,
    /// `==`
    EqualsEquals,
    /// `===`
    EqualsEqualsEquals,
    /// `!=`
    BangEquals,
    /// `!==`
    BangEqualsEquals,

    // Bitwise operators
    /// `&`
    Ampersand,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `<<`
    LessLess,

    // Logical operators
    /// `!`
    Bang,
    /// `&&`
    AmpersandAmpersand,
    /// `||`
    PipePipe,

    // Assignment operators
    /// `=`
    Equals,
    /// `+=`
    PlusEquals,
    /// `-=`
    MinusEquals,
    /// `*=`
    StarEquals,
    /// `**=`
    StarStarEquals,
    /// `/=`
    SlashEquals,
    /// `%=`
    PercentEquals,
    /// `<<=`
    LessLessEquals,
    /// `&=`
    AmpersandEquals,
    /// `|=`
    PipeEquals,
    /// `^=`
    CaretEquals,
    /// `&&=`
    AmpersandAmpersandEquals,
    /// `||=`
    PipePipeEquals,

    // Arrow
    /// `=>`
    Arrow,

    // End of file
    /// End of input
    Eof,
}

/// Reserved words of the language
///
/// Contextual words (`type`, `declare`, `as`, `let`, `async`, ...) are
/// lexed as identifiers and recognised by the parser where they matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    Extends,
    False,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    New,
    Null,
    Return,
    Super,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
}

impl Keyword {
    /// Look up a reserved word
    pub fn lookup(text: &str) -> Option<Keyword> {
        let kw = match text {
            "break" => Keyword::Break,
            "case" => Keyword::Case,
            "catch" => Keyword::Catch,
            "class" => Keyword::Class,
            "const" => Keyword::Const,
            "continue" => Keyword::Continue,
            "debugger" => Keyword::Debugger,
            "default" => Keyword::Default,
            "delete" => Keyword::Delete,
            "do" => Keyword::Do,
            "else" => Keyword::Else,
            "enum" => Keyword::Enum,
            "export" => Keyword::Export,
            "extends" => Keyword::Extends,
            "false" => Keyword::False,
            "finally" => Keyword::Finally,
            "for" => Keyword::For,
            "function" => Keyword::Function,
            "if" => Keyword::If,
            "import" => Keyword::Import,
            "in" => Keyword::In,
            "instanceof" => Keyword::Instanceof,
            "new" => Keyword::New,
            "null" => Keyword::Null,
            "return" => Keyword::Return,
            "super" => Keyword::Super,
            "switch" => Keyword::Switch,
            "this" => Keyword::This,
            "throw" => Keyword::Throw,
            "true" => Keyword::True,
            "try" => Keyword::Try,
            "typeof" => Keyword::Typeof,
            "var" => Keyword::Var,
            "void" => Keyword::Void,
            "while" => Keyword::While,
            "with" => Keyword::With,
            _ => return None,
        };
        Some(kw)
    }

    /// Get the string representation of the keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Break => "break",
            Keyword::Case => "case",
            Keyword::Catch => "catch",
            Keyword::Class => "class",
            Keyword::Const => "const",
            Keyword::Continue => "continue",
            Keyword::Debugger => "debugger",
            Keyword::Default => "default",
            Keyword::Delete => "delete",
            Keyword::Do => "do",
            Keyword::Else => "else",
            Keyword::Enum => "enum",
            Keyword::Export => "export",
            Keyword::Extends => "extends",
            Keyword::False => "false",
            Keyword::Finally => "finally",
            Keyword::For => "for",
            Keyword::Function => "function",
            Keyword::If => "if",
            Keyword::Import => "import",
            Keyword::In => "in",
            Keyword::Instanceof => "instanceof",
            Keyword::New => "new",
            Keyword::Null => "null",
            Keyword::Return => "return",
            Keyword::Super => "super",
            Keyword::Switch => "switch",
            Keyword::This => "this",
            Keyword::Throw => "throw",
            Keyword::True => "true",
            Keyword::Try => "try",
            Keyword::Typeof => "typeof",
            Keyword::Var => "var",
            Keyword::Void => "void",
            Keyword::While => "while",
            Keyword::With => "with",
        }
    }

    /// A `/` after this keyword starts a regular expression
    fn allows_regex_after(&self) -> bool {
        !matches!(
            self,
            Keyword::This | Keyword::Super | Keyword::Null | Keyword::True | Keyword::False
        )
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TokenKind {
    /// Check if this token is an assignment operator other than the `>`-based ones
    pub fn is_assignment_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Equals
                | TokenKind::PlusEquals
                | TokenKind::MinusEquals
                | TokenKind::StarEquals
                | TokenKind::StarStarEquals
                | TokenKind::SlashEquals
                | TokenKind::PercentEquals
                | TokenKind::LessLessEquals
                | TokenKind::AmpersandEquals
                | TokenKind::PipeEquals
                | TokenKind::CaretEquals
                | TokenKind::AmpersandAmpersandEquals
                | TokenKind::PipePipeEquals
                | TokenKind::QuestionQuestionEquals
        )
    }

    /// Check if this token starts an expression
    pub fn can_start_expression(&self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::PrivateName
                | TokenKind::NumberLiteral
                | TokenKind::BigIntLiteral
                | TokenKind::StringLiteral
                | TokenKind::TemplateLiteral
                | TokenKind::TemplateHead
                | TokenKind::RegexLiteral
                | TokenKind::LeftParen
                | TokenKind::LeftBracket
                | TokenKind::LeftBrace
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Bang
                | TokenKind::Tilde
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::Less
                | TokenKind::At
                | TokenKind::Keyword(Keyword::True)
                | TokenKind::Keyword(Keyword::False)
                | TokenKind::Keyword(Keyword::Null)
                | TokenKind::Keyword(Keyword::This)
                | TokenKind::Keyword(Keyword::Super)
                | TokenKind::Keyword(Keyword::New)
                | TokenKind::Keyword(Keyword::Function)
                | TokenKind::Keyword(Keyword::Class)
                | TokenKind::Keyword(Keyword::Typeof)
                | TokenKind::Keyword(Keyword::Void)
                | TokenKind::Keyword(Keyword::Delete)
                | TokenKind::Keyword(Keyword::Import)
        )
    }

    /// Whether a `/` following a token of this kind begins a regex literal
    pub(crate) fn allows_regex_after(&self) -> bool {
        match self {
            TokenKind::Identifier
            | TokenKind::PrivateName
            | TokenKind::NumberLiteral
            | TokenKind::BigIntLiteral
            | TokenKind::StringLiteral
            | TokenKind::TemplateLiteral
            | TokenKind::TemplateTail
            | TokenKind::RegexLiteral
            | TokenKind::RightParen
            | TokenKind::RightBracket
            | TokenKind::RightBrace
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus => false,
            TokenKind::Keyword(kw) => kw.allows_regex_after(),
            _ => true,
        }
    }
}
