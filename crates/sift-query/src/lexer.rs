//! Equation lexer.
//!
//! Produces one [`Token`] per call from an owned, normalized copy of the
//! input. The lexer never rejects user input: characters it does not know act
//! as whitespace, a quote without a partner is ignored, and a separator with
//! no field name in front of it is a blank. The only failures are reading
//! before any input was supplied and, in strict mode, an unterminated phrase.

use serde::Serialize;
use tracing::trace;

use crate::{error::LexError, normalize::fold_into};

/// Terminator appended to every normalized buffer.
const SENTINEL: char = '\0';

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum TokenKind {
    /// End of input. Repeats once reached.
    End = 0,
    /// A separator with no meaning of its own (closing quote, stray `:`).
    Blank,
    /// `and`, `et`.
    And,
    /// `or`, `ou`.
    Or,
    /// `not`, `sauf`, `but`.
    AndNot,
    /// `near`.
    Near,
    /// `adj`.
    Adj,
    /// `+` prefix.
    Love,
    /// `-` prefix.
    Hate,
    /// A word followed by `:` or `=`.
    FieldName,
    /// A plain word.
    Term,
    /// A word containing `*` or `?`.
    WildTerm,
    /// A plain word inside quotes.
    PhraseTerm,
    /// A wildcard word inside quotes.
    PhraseWildTerm,
    /// A bare `*`.
    MatchAll,
    /// `(`.
    OpenParen,
    /// `)`.
    CloseParen,
    /// `[`.
    RangeStart,
    /// `]`.
    RangeEnd,
    /// Placeholder for an empty token slot; never produced by the lexer.
    None,
}

impl TokenKind {
    /// Every kind, in code order.
    pub const ALL: [Self; 20] = [
        Self::End,
        Self::Blank,
        Self::And,
        Self::Or,
        Self::AndNot,
        Self::Near,
        Self::Adj,
        Self::Love,
        Self::Hate,
        Self::FieldName,
        Self::Term,
        Self::WildTerm,
        Self::PhraseTerm,
        Self::PhraseWildTerm,
        Self::MatchAll,
        Self::OpenParen,
        Self::CloseParen,
        Self::RangeStart,
        Self::RangeEnd,
        Self::None,
    ];

    /// Human-readable name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::End => "END",
            Self::Blank => "BLANK",
            Self::And => "AND",
            Self::Or => "OR",
            Self::AndNot => "AND_NOT",
            Self::Near => "NEAR",
            Self::Adj => "ADJ",
            Self::Love => "LOVE",
            Self::Hate => "HATE",
            Self::FieldName => "FIELD_NAME",
            Self::Term => "TERM",
            Self::WildTerm => "WILD_TERM",
            Self::PhraseTerm => "PHRASE_TERM",
            Self::PhraseWildTerm => "PHRASE_WILD_TERM",
            Self::MatchAll => "MATCH_ALL",
            Self::OpenParen => "OPEN_PAREN",
            Self::CloseParen => "CLOSE_PAREN",
            Self::RangeStart => "RANGE_START",
            Self::RangeEnd => "RANGE_END",
            Self::None => "NONE",
        }
    }

    /// Looks up a kind by its numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// Whether this is one of the operator keywords.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::And | Self::Or | Self::AndNot | Self::Near | Self::Adj
        )
    }
}

/// Returns the diagnostic name of a numeric token code.
///
/// Codes outside the known range map to `"UNKNOWN"`.
pub fn token_name(code: u8) -> &'static str {
    TokenKind::from_code(code).map_or("UNKNOWN", TokenKind::name)
}

/// Operator keywords, in both supported languages.
const KEYWORDS: &[(&str, TokenKind)] = &[
    ("and", TokenKind::And),
    ("et", TokenKind::And),
    ("or", TokenKind::Or),
    ("ou", TokenKind::Or),
    ("not", TokenKind::AndNot),
    ("sauf", TokenKind::AndNot),
    ("but", TokenKind::AndNot),
    ("near", TokenKind::Near),
    ("adj", TokenKind::Adj),
];

/// Whether a bare word would lex as an operator keyword.
pub fn is_keyword_text(text: &str) -> bool {
    KEYWORDS.iter().any(|(keyword, _)| keyword.eq_ignore_ascii_case(text))
}

/// A lexed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Token kind.
    pub kind: TokenKind,
    /// Normalized text of the token.
    pub text: String,
    /// Byte range in the original input.
    pub span: (usize, usize),
}

impl Token {
    /// Creates a token.
    fn new(kind: TokenKind, text: impl Into<String>, span: (usize, usize)) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Lexer behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexerOptions {
    /// Fail on a quote with no closing partner instead of ignoring it.
    pub strict_quotes: bool,
}

/// Restartable, lazily evaluated lexer.
#[derive(Debug, Clone, Default)]
pub struct Lexer {
    /// Normalized characters with their byte offset in the original input.
    chars: Vec<(char, usize)>,
    /// Cursor into `chars`.
    pos: usize,
    /// Whether the cursor is between an opening and a closing quote.
    in_phrase: bool,
    /// Whether input has ever been supplied.
    initialized: bool,
    /// Behaviour switches.
    options: LexerOptions,
}

impl Lexer {
    /// Creates a lexer with no input.
    pub fn new(options: LexerOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Returns the next token.
    ///
    /// Supplying `input` restarts the lexer on that text. Once the end is
    /// reached, every further call returns [`TokenKind::End`].
    pub fn read(&mut self, input: Option<&str>) -> Result<Token, LexError> {
        if let Some(input) = input {
            self.reset(input);
        }
        if !self.initialized {
            return Err(LexError::Uninitialized);
        }
        self.next_token()
    }

    /// Whether the cursor is inside a quoted phrase.
    pub fn in_phrase(&self) -> bool {
        self.in_phrase
    }

    /// Loads and normalizes a new input.
    fn reset(&mut self, input: &str) {
        let mut chars = Vec::with_capacity(input.len() + 1);
        let mut folded = Vec::new();
        for (offset, ch) in input.char_indices() {
            folded.clear();
            fold_into(ch, &mut folded);
            for &c in &folded {
                let c = if is_accepted(c) { c } else { ' ' };
                chars.push((c, offset));
            }
        }
        chars.push((SENTINEL, input.len()));

        self.chars = chars;
        self.pos = 0;
        self.in_phrase = false;
        self.initialized = true;
    }

    /// Character at `index`, or the sentinel past the end.
    fn char_at(&self, index: usize) -> char {
        self.chars.get(index).map_or(SENTINEL, |&(c, _)| c)
    }

    /// Byte offset in the original input of the character at `index`.
    fn offset_at(&self, index: usize) -> usize {
        self.chars
            .get(index)
            .or_else(|| self.chars.last())
            .map_or(0, |&(_, offset)| offset)
    }

    /// Builds a token spanning `start..self.pos`.
    fn token(&self, kind: TokenKind, text: impl Into<String>, start: usize) -> Token {
        Token::new(kind, text, (self.offset_at(start), self.offset_at(self.pos)))
    }

    /// Emits a one-character token.
    fn single(&mut self, kind: TokenKind, ch: char) -> Token {
        let start = self.pos;
        self.pos += 1;
        self.token(kind, ch.to_string(), start)
    }

    /// Scans the next token.
    fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            let ch = self.char_at(self.pos);
            if ch == SENTINEL {
                return Ok(self.token(TokenKind::End, "", self.pos));
            }

            if ch == '"' {
                if let Some(token) = self.quote()? {
                    return Ok(token);
                }
                continue;
            }

            if is_word_char(ch) {
                return Ok(self.word());
            }

            if self.in_phrase {
                // Operator characters inside a phrase separate words.
                self.pos += 1;
                continue;
            }

            let token = match ch {
                '+' | '-' if self.pos > 0 && is_word_char(self.char_at(self.pos - 1)) => {
                    trace!(position = self.offset_at(self.pos), "in-word hyphen treated as blank");
                    self.pos += 1;
                    continue;
                }
                '+' => self.single(TokenKind::Love, ch),
                '-' => self.single(TokenKind::Hate, ch),
                '(' => self.single(TokenKind::OpenParen, ch),
                ')' => self.single(TokenKind::CloseParen, ch),
                '[' => self.single(TokenKind::RangeStart, ch),
                ']' => self.single(TokenKind::RangeEnd, ch),
                ':' | '=' => {
                    trace!(position = self.offset_at(self.pos), "separator without field name");
                    self.single(TokenKind::Blank, ch)
                }
                _ => {
                    self.pos += 1;
                    continue;
                }
            };
            return Ok(token);
        }
    }

    /// Handles a quote character at the cursor.
    ///
    /// Returns a blank token when a phrase closes, `None` when the quote only
    /// changes state.
    fn quote(&mut self) -> Result<Option<Token>, LexError> {
        let start = self.pos;
        self.pos += 1;

        if self.in_phrase {
            self.in_phrase = false;
            return Ok(Some(self.token(TokenKind::Blank, "\"", start)));
        }

        if self.chars[self.pos..].iter().any(|&(c, _)| c == '"') {
            self.in_phrase = true;
        } else if self.options.strict_quotes {
            return Err(LexError::UnterminatedPhrase {
                position: self.offset_at(start),
            });
        } else {
            trace!(position = self.offset_at(start), "unterminated quote ignored");
        }
        Ok(None)
    }

    /// Scans a word and classifies it.
    fn word(&mut self) -> Token {
        let start = self.pos;
        while self.continues_word(self.pos) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().map(|&(c, _)| c).collect();
        let wild = text.contains(['*', '?']);

        if self.in_phrase {
            let kind = if wild {
                TokenKind::PhraseWildTerm
            } else {
                TokenKind::PhraseTerm
            };
            return self.token(kind, text, start);
        }

        if !wild && let Some(separator) = self.field_separator() {
            let token = self.token(TokenKind::FieldName, text, start);
            self.pos = separator + 1;
            return token;
        }

        let kind = if text.chars().all(|c| c == '*') {
            TokenKind::MatchAll
        } else if wild {
            TokenKind::WildTerm
        } else {
            KEYWORDS
                .iter()
                .find(|(keyword, _)| *keyword == text)
                .map_or(TokenKind::Term, |&(_, kind)| kind)
        };
        self.token(kind, text, start)
    }

    /// Whether the character at `index` extends the current word.
    ///
    /// `.` and `@` join two word characters (`v1.2`, `me@host`).
    fn continues_word(&self, index: usize) -> bool {
        let ch = self.char_at(index);
        if is_word_char(ch) {
            return true;
        }
        matches!(ch, '.' | '@')
            && index > 0
            && is_word_char(self.char_at(index - 1))
            && is_word_char(self.char_at(index + 1))
    }

    /// Finds a `:` or `=` after the cursor, skipping spaces.
    fn field_separator(&self) -> Option<usize> {
        let mut index = self.pos;
        while self.char_at(index) == ' ' {
            index += 1;
        }
        matches!(self.char_at(index), ':' | '=').then_some(index)
    }
}

/// Whether `c` may appear in a word.
fn is_word_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '*' | '?')
}

/// Whether `c` survives normalization; everything else becomes a space.
fn is_accepted(c: char) -> bool {
    is_word_char(c)
        || matches!(
            c,
            ':' | '=' | '@' | '(' | ')' | '+' | '-' | '.' | '"' | '[' | ']'
        )
}

/// Lexes the whole input, including the final [`TokenKind::End`].
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(LexerOptions::default());
    let mut tokens = Vec::new();
    let mut next = lexer.read(Some(input));
    while let Ok(token) = next {
        let done = token.kind == TokenKind::End;
        tokens.push(token);
        if done {
            break;
        }
        next = lexer.read(None);
    }
    tokens
}

/// Renders every token of `input` on its own line, for fixtures and debugging.
pub fn dump_tokens(input: &str) -> String {
    let mut out = String::new();
    for token in tokenize(input) {
        out.push_str(&format!(
            "{:<16} {:<12} {}..{}\n",
            token.kind.name(),
            format!("{:?}", token.text),
            token.span.0,
            token.span.1
        ));
    }
    out
}
