use std::fmt::Display;

use logos::Logos;

/// The raw lexical classes recognized by the `logos` state machine.
///
/// Words come out as identifiers and are turned into keywords afterwards,
/// once they have been lower-cased. Whitespace and comments are skipped.
#[derive(Logos, Debug, PartialEq, Clone)]
pub(crate) enum RawToken {
    /// Decimal literals such as `1.5`, `1.5e-3` or `2e10`.
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", parse_decimal)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", parse_decimal)]
    Decimal(f64),
    /// Integer literals, decimal or hexadecimal. Overflow is a lexing error.
    #[regex(r"[0-9]+", parse_integer)]
    #[regex(r"0[xX][0-9a-fA-F]+", parse_hex)]
    Integer(i64),
    /// Double-quoted strings with escapes already resolved.
    #[regex(r#""([^"\\]|\\.|"")*""#, parse_string, allow_greedy = true)]
    Literal(String),
    /// Words, lower-cased, with the optional `$` safety sigil kept.
    #[regex(r"\$?[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_lowercase())]
    Word(String),
    /// `// Comments.`
    #[regex(r"//[^\n]*", logos::skip, allow_greedy = true)]
    Comment,
    /// `/* Block comments. */`
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip, allow_greedy = true)]
    BlockComment,
    /// Spaces, tabs and line breaks.
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Whitespace,

    #[token("**")]
    StarStar,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    BangEqual,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("<<")]
    ShiftLeft,
    #[token(">>")]
    ShiftRight,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("&")]
    Ampersand,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,
    #[token("=")]
    Equals,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[token("@")]
    At,
}

/// Reserved words. Recognized case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    And,
    Or,
    Xor,
    Not,
    Matches,
    True,
    False,
    Null,
    Let,
    Function,
    Return,
    Is,
    Begin,
    End,
    If,
    Then,
    Elsif,
    Else,
    While,
    Loop,
    For,
    In,
    To,
    Step,
    Asc,
    Desc,
    Forall,
    Break,
    Continue,
    Exception,
    When,
    Others,
    Print,
    Put,
    Raise,
    Include,
    Import,
    Trace,
    On,
    Off,
    Auto,
    Boolean,
    Integer,
    Decimal,
    String,
    Bytes,
    Imaginary,
    Row,
}

/// Every keyword with its spelling.
const KEYWORDS: &[(&str, Keyword)] = &[("and", Keyword::And),
                                       ("or", Keyword::Or),
                                       ("xor", Keyword::Xor),
                                       ("not", Keyword::Not),
                                       ("matches", Keyword::Matches),
                                       ("true", Keyword::True),
                                       ("false", Keyword::False),
                                       ("null", Keyword::Null),
                                       ("let", Keyword::Let),
                                       ("function", Keyword::Function),
                                       ("return", Keyword::Return),
                                       ("is", Keyword::Is),
                                       ("begin", Keyword::Begin),
                                       ("end", Keyword::End),
                                       ("if", Keyword::If),
                                       ("then", Keyword::Then),
                                       ("elsif", Keyword::Elsif),
                                       ("else", Keyword::Else),
                                       ("while", Keyword::While),
                                       ("loop", Keyword::Loop),
                                       ("for", Keyword::For),
                                       ("in", Keyword::In),
                                       ("to", Keyword::To),
                                       ("step", Keyword::Step),
                                       ("asc", Keyword::Asc),
                                       ("desc", Keyword::Desc),
                                       ("forall", Keyword::Forall),
                                       ("break", Keyword::Break),
                                       ("continue", Keyword::Continue),
                                       ("exception", Keyword::Exception),
                                       ("when", Keyword::When),
                                       ("others", Keyword::Others),
                                       ("print", Keyword::Print),
                                       ("put", Keyword::Put),
                                       ("raise", Keyword::Raise),
                                       ("include", Keyword::Include),
                                       ("import", Keyword::Import),
                                       ("trace", Keyword::Trace),
                                       ("on", Keyword::On),
                                       ("off", Keyword::Off),
                                       ("auto", Keyword::Auto),
                                       ("boolean", Keyword::Boolean),
                                       ("integer", Keyword::Integer),
                                       ("decimal", Keyword::Decimal),
                                       ("string", Keyword::String),
                                       ("bytes", Keyword::Bytes),
                                       ("imaginary", Keyword::Imaginary),
                                       ("row", Keyword::Row)];

impl Keyword {
    /// Looks up a lower-case word.
    ///
    /// # Example
    /// ```
    /// use plume::interpreter::lexer::Keyword;
    ///
    /// assert_eq!(Keyword::from_word("elsif"), Some(Keyword::Elsif));
    /// assert_eq!(Keyword::from_word("counter"), None);
    /// ```
    #[must_use]
    pub fn from_word(word: &str) -> Option<Self> {
        KEYWORDS.iter().find(|(w, _)| *w == word).map(|(_, k)| *k)
    }

    /// The keyword's spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        KEYWORDS.iter()
                .find(|(_, k)| *k == self)
                .map_or("?", |(w, _)| w)
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A token as seen by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Integer literal.
    Integer(i64),
    /// Decimal literal.
    Decimal(f64),
    /// String literal, escapes resolved.
    Literal(String),
    /// A lower-cased name that is not a keyword, possibly starting with `$`.
    Identifier(String),
    /// A reserved word.
    Keyword(Keyword),
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `**`
    StarStar,
    /// `==`
    EqualEqual,
    /// `!=`
    BangEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,
    /// `&`
    Ampersand,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `!`
    Bang,
    /// `=`
    Equals,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `.`
    Dot,
    /// `@`
    At,
    /// Text that does not form a valid token: a malformed literal, an
    /// unterminated string or comment, a stray character.
    Invalid(String),
}

impl Token {
    /// `true` if this is the given keyword.
    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Self::Keyword(k) if *k == keyword)
    }
}

impl From<RawToken> for Token {
    fn from(raw: RawToken) -> Self {
        match raw {
            RawToken::Decimal(n) => Self::Decimal(n),
            RawToken::Integer(i) => Self::Integer(i),
            RawToken::Literal(s) => Self::Literal(s),
            RawToken::Word(w) => Keyword::from_word(&w).map_or(Self::Identifier(w), Self::Keyword),
            RawToken::Comment | RawToken::BlockComment | RawToken::Whitespace => {
                Self::Invalid(String::new())
            },
            RawToken::StarStar => Self::StarStar,
            RawToken::EqualEqual => Self::EqualEqual,
            RawToken::BangEqual => Self::BangEqual,
            RawToken::LessEqual => Self::LessEqual,
            RawToken::GreaterEqual => Self::GreaterEqual,
            RawToken::ShiftLeft => Self::ShiftLeft,
            RawToken::ShiftRight => Self::ShiftRight,
            RawToken::Plus => Self::Plus,
            RawToken::Minus => Self::Minus,
            RawToken::Star => Self::Star,
            RawToken::Slash => Self::Slash,
            RawToken::Percent => Self::Percent,
            RawToken::Less => Self::Less,
            RawToken::Greater => Self::Greater,
            RawToken::Ampersand => Self::Ampersand,
            RawToken::Pipe => Self::Pipe,
            RawToken::Caret => Self::Caret,
            RawToken::Tilde => Self::Tilde,
            RawToken::Bang => Self::Bang,
            RawToken::Equals => Self::Equals,
            RawToken::LParen => Self::LParen,
            RawToken::RParen => Self::RParen,
            RawToken::LBracket => Self::LBracket,
            RawToken::RBracket => Self::RBracket,
            RawToken::Comma => Self::Comma,
            RawToken::Semicolon => Self::Semicolon,
            RawToken::Dot => Self::Dot,
            RawToken::At => Self::At,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Self::Integer(i) => return write!(f, "{i}"),
            Self::Decimal(n) => return write!(f, "{n}"),
            Self::Literal(s) => return write!(f, "\"{s}\""),
            Self::Identifier(name) => return write!(f, "{name}"),
            Self::Keyword(k) => return write!(f, "{k}"),
            Self::Invalid(text) => return write!(f, "{text}"),
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::StarStar => "**",
            Self::EqualEqual => "==",
            Self::BangEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::Ampersand => "&",
            Self::Pipe => "|",
            Self::Caret => "^",
            Self::Tilde => "~",
            Self::Bang => "!",
            Self::Equals => "=",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Dot => ".",
            Self::At => "@",
        };
        write!(f, "{symbol}")
    }
}

/// A 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Line number.
    pub line:   usize,
    /// Column number, in characters.
    pub column: usize,
}

impl Position {
    /// Creates a position.
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A token together with where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    /// The token.
    pub token: Token,
    /// Its position.
    pub pos:   Position,
}

/// Parses a decimal literal from the current token slice.
fn parse_decimal(lex: &logos::Lexer<RawToken>) -> Option<f64> {
    lex.slice().parse().ok()
}

/// Parses a decimal integer literal. Returns `None` on overflow.
fn parse_integer(lex: &logos::Lexer<RawToken>) -> Option<i64> {
    lex.slice().parse().ok()
}

/// Parses a `0x` integer literal. Returns `None` on overflow.
fn parse_hex(lex: &logos::Lexer<RawToken>) -> Option<i64> {
    i64::from_str_radix(&lex.slice()[2..], 16).ok()
}

/// Strips the quotes from a string literal and resolves its escapes.
fn parse_string(lex: &logos::Lexer<RawToken>) -> Option<String> {
    let slice = lex.slice();
    unescape(&slice[1..slice.len() - 1])
}

/// Resolves backslash escapes and doubled quotes.
///
/// Returns `None` for an unknown escape or a malformed `\x` sequence.
pub(crate) fn unescape(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(match chars.next()? {
                                 'n' => '\n',
                                 't' => '\t',
                                 'r' => '\r',
                                 '0' => '\0',
                                 '\\' => '\\',
                                 '"' => '"',
                                 '\'' => '\'',
                                 'x' => {
                                     let hex: String = chars.by_ref().take(2).collect();
                                     if hex.len() != 2 {
                                         return None;
                                     }
                                     char::from(u8::from_str_radix(&hex, 16).ok()?)
                                 },
                                 _ => return None,
                             }),
            '"' => {
                // Only doubled quotes reach here.
                chars.next();
                out.push('"');
            },
            c => out.push(c),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(source: &str) -> Vec<Result<RawToken, ()>> {
        RawToken::lexer(source).collect()
    }

    #[test]
    fn numbers() {
        assert_eq!(raw("42 0x1F 1.5 2e3 1.5e-1"),
                   vec![Ok(RawToken::Integer(42)),
                        Ok(RawToken::Integer(31)),
                        Ok(RawToken::Decimal(1.5)),
                        Ok(RawToken::Decimal(2000.0)),
                        Ok(RawToken::Decimal(0.15)),]);
    }

    #[test]
    fn integer_overflow_is_an_error() {
        assert_eq!(raw("99999999999999999999"), vec![Err(())]);
    }

    #[test]
    fn strings_resolve_escapes_and_doubled_quotes() {
        assert_eq!(raw(r#""a\tb" "say ""hi""" "\x41""#),
                   vec![Ok(RawToken::Literal("a\tb".into())),
                        Ok(RawToken::Literal("say \"hi\"".into())),
                        Ok(RawToken::Literal("A".into())),]);
    }

    #[test]
    fn bad_escape_is_an_error() {
        assert_eq!(raw(r#""\q""#), vec![Err(())]);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(raw("1 // one\n/* two\n ** */ 3"),
                   vec![Ok(RawToken::Integer(1)), Ok(RawToken::Integer(3))]);
    }

    #[test]
    fn words_are_lower_cased_and_keep_sigil() {
        assert_eq!(raw("FooBar $Safe"),
                   vec![Ok(RawToken::Word("foobar".into())),
                        Ok(RawToken::Word("$safe".into())),]);
        assert_eq!(Token::from(RawToken::Word("elsif".into())),
                   Token::Keyword(Keyword::Elsif));
    }

    #[test]
    fn multi_character_operators() {
        assert_eq!(raw("** << >= != ."),
                   vec![Ok(RawToken::StarStar),
                        Ok(RawToken::ShiftLeft),
                        Ok(RawToken::GreaterEqual),
                        Ok(RawToken::BangEqual),
                        Ok(RawToken::Dot),]);
    }
}
