use std::io::{ErrorKind, Read};

use logos::Logos;

use crate::interpreter::lexer::{Lexeme, Position, RawToken, Token};

/// Bytes pulled from the reader per refill.
pub const CHUNK_SIZE: usize = 4096;
/// A token ending this close to the end of the buffered text is lexed again
/// after a refill, since the rest of it may not have arrived yet.
const LOOKAHEAD_MARGIN: usize = 8;

/// A lazy, non-restartable token sequence pulled from a reader.
///
/// The reader is read in chunks of [`CHUNK_SIZE`] bytes. Lexing runs over the
/// buffered text; a token that touches the end of the buffer (or looks like
/// the start of an unterminated string or comment) is discarded and lexed
/// again after the next refill, so tokens never split across chunks.
pub struct Tokenizer {
    name:       String,
    reader:     Box<dyn Read>,
    text:       String,
    carry:      Vec<u8>,
    offset:     usize,
    line:       usize,
    line_start: usize,
    eof:        bool,
}

impl Tokenizer {
    /// Creates a tokenizer pulling from `reader`. `name` identifies the
    /// source in diagnostics.
    pub fn new(name: impl Into<String>, reader: impl Read + 'static) -> Self {
        Self { name:       name.into(),
               reader:     Box::new(reader),
               text:       String::new(),
               carry:      Vec::new(),
               offset:     0,
               line:       1,
               line_start: 0,
               eof:        false, }
    }

    /// Creates a tokenizer over an in-memory string.
    ///
    /// # Example
    /// ```
    /// use plume::interpreter::{lexer::Token, tokenizer::Tokenizer};
    ///
    /// let tokens: Vec<Token> = Tokenizer::from_source("x = 1;").map(|l| l.token).collect();
    /// assert_eq!(tokens,
    ///            vec![Token::Identifier("x".into()),
    ///                 Token::Equals,
    ///                 Token::Integer(1),
    ///                 Token::Semicolon]);
    /// ```
    #[must_use]
    pub fn from_source(source: &str) -> Self {
        Self::new("<script>", std::io::Cursor::new(source.to_string().into_bytes()))
    }

    /// The source name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pulls one chunk from the reader into the text buffer.
    ///
    /// Incomplete UTF-8 sequences at the end of a chunk are carried over to
    /// the next one; invalid bytes become replacement characters.
    fn fill(&mut self) -> std::io::Result<()> {
        let mut buf = [0u8; CHUNK_SIZE];
        let n = loop {
            match self.reader.read(&mut buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {},
                Err(e) => return Err(e),
            }
        };

        if n == 0 {
            self.eof = true;
            if !self.carry.is_empty() {
                self.text.push_str(&String::from_utf8_lossy(&self.carry));
                self.carry.clear();
            }
            return Ok(());
        }

        self.carry.extend_from_slice(&buf[..n]);
        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.carry[start..]) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    self.carry.clear();
                    return Ok(());
                },
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    self.text
                        .push_str(&String::from_utf8_lossy(&self.carry[start..valid_end]));
                    match e.error_len() {
                        Some(len) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + len;
                        },
                        None => {
                            self.carry.drain(..valid_end);
                            return Ok(());
                        },
                    }
                },
            }
        }
    }

    /// Advances the line counter over `consumed`, which starts at absolute
    /// buffer offset `at`.
    fn track_lines(&mut self, consumed: &str, at: usize) {
        for (i, c) in consumed.char_indices() {
            if c == '\n' {
                self.line += 1;
                self.line_start = at + i + 1;
            }
        }
    }

    fn position_of(&self, at: usize) -> Position {
        let column = self.text[self.line_start..at].chars().count() + 1;
        Position::new(self.line, column)
    }

    /// Drops text that has already been consumed once enough of it piles up.
    fn compact(&mut self) {
        let cut = self.line_start.min(self.offset);
        if cut >= CHUNK_SIZE {
            self.text.drain(..cut);
            self.offset -= cut;
            self.line_start -= cut;
        }
    }

    /// Produces the next lexeme, or `None` once the input is exhausted.
    pub fn next_lexeme(&mut self) -> Option<Lexeme> {
        loop {
            let rest = &self.text[self.offset..];
            let mut lexer = RawToken::lexer(rest);
            let item = lexer.next();
            let span = lexer.span();

            let unterminated_comment = matches!(item, Some(Ok(RawToken::Slash)))
                                       && rest[span.end..].starts_with('*');
            let needs_more = !self.eof
                             && match &item {
                                 None | Some(Err(())) => true,
                                 Some(Ok(_)) => {
                                     unterminated_comment
                                     || span.end + LOOKAHEAD_MARGIN >= rest.len()
                                 },
                             };

            if needs_more {
                if let Err(e) = self.fill() {
                    self.eof = true;
                    tracing::warn!(source = %self.name, error = %e, "read failed");
                    let pos = self.position_of(self.offset);
                    return Some(Lexeme { token: Token::Invalid(format!("<read error: {e}>")),
                                         pos });
                }
                continue;
            }

            let base = self.offset;
            let Some(result) = item else {
                let skipped = self.text[base..].to_string();
                self.track_lines(&skipped, base);
                self.offset = self.text.len();
                return None;
            };

            let skipped = self.text[base..base + span.start].to_string();
            self.track_lines(&skipped, base);
            let pos = self.position_of(base + span.start);

            let start = base + span.start;
            let (token, end) = match result {
                _ if unterminated_comment => {
                    (Token::Invalid(self.text[start..].to_string()), self.text.len())
                },
                Ok(raw) => (Token::from(raw), base + span.end),
                Err(()) if self.text[start..].starts_with('"') => {
                    // An unterminated string swallows the rest of its line.
                    let end = self.text[start..].find('\n')
                                                .map_or(self.text.len(), |i| start + i);
                    (Token::Invalid(self.text[start..end].to_string()), end)
                },
                Err(()) => {
                    (Token::Invalid(self.text[start..base + span.end].to_string()), base + span.end)
                },
            };

            let consumed = self.text[start..end].to_string();
            self.track_lines(&consumed, start);
            self.offset = end;
            self.compact();

            return Some(Lexeme { token, pos });
        }
    }
}

impl Iterator for Tokenizer {
    type Item = Lexeme;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_lexeme()
    }
}

/// The token stream the parser reads from.
///
/// Wraps a stack of tokenizers (the top one is active; `include` pushes
/// more) and a push-back stack of arbitrary depth.
pub struct TokenStream {
    sources: Vec<Tokenizer>,
    pushed:  Vec<Lexeme>,
    last:    Position,
}

impl TokenStream {
    /// Creates a stream over a single source.
    #[must_use]
    pub fn new(source: Tokenizer) -> Self {
        Self { sources: vec![source],
               pushed:  Vec::new(),
               last:    Position::new(1, 1), }
    }

    /// Creates a stream over an in-memory string.
    #[must_use]
    pub fn from_source(source: &str) -> Self {
        Self::new(Tokenizer::from_source(source))
    }

    /// Takes the next lexeme. At the end of an included source this returns
    /// `None` until [`TokenStream::pop_source`] is called.
    pub fn next_lexeme(&mut self) -> Option<Lexeme> {
        let lexeme = match self.pushed.pop() {
            Some(lexeme) => Some(lexeme),
            None => self.sources.last_mut().and_then(Tokenizer::next_lexeme),
        };
        if let Some(l) = &lexeme {
            self.last = l.pos;
        }
        lexeme
    }

    /// Returns a lexeme to the stream; it is read again next.
    pub fn push_back(&mut self, lexeme: Lexeme) {
        self.pushed.push(lexeme);
    }

    /// Looks at the next lexeme without consuming it.
    pub fn peek(&mut self) -> Option<&Lexeme> {
        if self.pushed.is_empty() {
            let lexeme = self.sources.last_mut().and_then(Tokenizer::next_lexeme)?;
            self.pushed.push(lexeme);
        }
        self.pushed.last()
    }

    /// Looks at the next token without consuming it.
    pub fn peek_token(&mut self) -> Option<&Token> {
        self.peek().map(|l| &l.token)
    }

    /// The position of the most recently consumed lexeme.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.last
    }

    /// Makes `source` the active source until it is exhausted and popped.
    pub fn push_source(&mut self, source: Tokenizer) {
        tracing::debug!(source = source.name(), depth = self.sources.len(), "entering source");
        self.sources.push(source);
    }

    /// Returns to the including source. The outermost source stays.
    pub fn pop_source(&mut self) {
        if self.sources.len() > 1
           && let Some(source) = self.sources.pop()
        {
            tracing::debug!(source = source.name(), "leaving source");
        }
    }

    /// The number of includes currently open.
    #[must_use]
    pub fn include_depth(&self) -> usize {
        self.sources.len() - 1
    }

    /// Discards lexemes up to and including the next `;`, or to the end of
    /// the active source. Used to resume after a parse error.
    pub fn recover(&mut self) {
        while let Some(lexeme) = self.next_lexeme() {
            if lexeme.token == Token::Semicolon {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A reader that hands out its input a few bytes at a time.
    struct Trickle {
        data: Vec<u8>,
        at:   usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len() - self.at);
            buf[..n].copy_from_slice(&self.data[self.at..self.at + n]);
            self.at += n;
            Ok(n)
        }
    }

    fn trickle(source: &str, step: usize) -> Vec<Token> {
        Tokenizer::new("trickle",
                       Trickle { data: source.as_bytes().to_vec(),
                                 at: 0,
                                 step })
        .map(|l| l.token)
        .collect()
    }

    #[test]
    fn tokens_survive_chunk_boundaries() {
        let source = "let counter = 12345.5e-2; /* a\nlong comment */ print \"héllo, wörld\";";
        let whole: Vec<Token> = Tokenizer::from_source(source).map(|l| l.token).collect();
        for step in 1..7 {
            assert_eq!(trickle(source, step), whole, "step {step}");
        }
        assert_eq!(whole[3], Token::Decimal(123.455));
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let lexemes: Vec<Lexeme> = Tokenizer::from_source("a\n  /* x\n */ b").collect();
        assert_eq!(lexemes[0].pos, Position::new(1, 1));
        assert_eq!(lexemes[1].pos, Position::new(3, 5));
    }

    #[test]
    fn unterminated_input_is_invalid() {
        let tokens: Vec<Token> = Tokenizer::from_source("x = \"open").map(|l| l.token).collect();
        assert!(matches!(tokens.last(), Some(Token::Invalid(_))));

        let tokens: Vec<Token> = Tokenizer::from_source("1 /* open").map(|l| l.token).collect();
        assert_eq!(tokens.len(), 2);
        assert!(matches!(tokens[1], Token::Invalid(_)));
    }

    #[test]
    fn push_back_and_recover() {
        let mut stream = TokenStream::from_source("a b; c");
        let a = stream.next_lexeme().unwrap();
        stream.push_back(a);
        assert_eq!(stream.peek_token(), Some(&Token::Identifier("a".into())));

        stream.recover();
        assert_eq!(stream.next_lexeme().map(|l| l.token),
                   Some(Token::Identifier("c".into())));
        assert!(stream.next_lexeme().is_none());
    }

    #[test]
    fn included_sources_stack() {
        let mut stream = TokenStream::from_source("outer;");
        stream.push_source(Tokenizer::from_source("inner"));
        assert_eq!(stream.include_depth(), 1);
        assert_eq!(stream.next_lexeme().map(|l| l.token),
                   Some(Token::Identifier("inner".into())));
        assert!(stream.next_lexeme().is_none());

        stream.pop_source();
        assert_eq!(stream.next_lexeme().map(|l| l.token),
                   Some(Token::Identifier("outer".into())));
    }
}
