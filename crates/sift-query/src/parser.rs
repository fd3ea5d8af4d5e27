//! Equation parser.
//!
//! Parses the token stream into a [`Node`] tree using recursive descent over
//! a fixed set of binary levels. The parser never fails: stray operators,
//! unbalanced parentheses and dangling modifiers are resolved by the recovery
//! rules below, and an equation that reduces to nothing yields
//! [`Node::match_nothing`].
//!
//! # Grammar
//!
//! ```text
//! expression → clause*
//! clause     → "+" or_expr | "-" or_expr | NOT or_expr | or_expr
//! or_expr    → and_expr (OR and_expr)*
//! and_expr   → andnot_expr (AND andnot_expr)*
//! andnot_expr→ near_expr ((NOT | AND NOT | AND "-") near_expr)*
//! near_expr  → adj_expr (NEAR adj_expr)*
//! adj_expr   → compound (ADJ compound)*
//! compound   → TERM | WILDTERM | "*" | PHRASE_TERM+ | "(" expression ")"
//!            | FIELD_NAME+ compound
//! ```
//!
//! Juxtaposed clauses are OR'd together; `+` clauses are AND'd and become the
//! required side of an AND_MAYBE; `-`/`NOT` clauses are subtracted from the
//! result (or from everything when nothing else is present).
//!
//! # Recovery rules
//!
//! - A `)` with no matching `(` is dropped; a `(` still open at the end of
//!   input is closed there.
//! - A binary operator is only taken as an operator when an operand follows
//!   it. Otherwise, and wherever a term is expected, an operator keyword is
//!   an ordinary term (`near death experience`, `rock AND`).
//! - A `+` or `-` with nothing to apply to is dropped.
//! - A field name with nothing to apply to is an ordinary term.
//! - Range brackets are dropped; their contents parse as terms.
//! - Parentheses nested deeper than the configured limit are dropped together
//!   with their closers; their contents join the enclosing group.

use std::collections::VecDeque;

use tracing::debug;

use crate::{
    ast::{Node, Operator},
    error::LexError,
    lexer::{Lexer, LexerOptions, Token, TokenKind},
};

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Gap of `NEAR` nodes.
    pub near_window: u32,
    /// Gap of `ADJ` nodes.
    pub adj_window: u32,
    /// Gap of quoted phrases.
    pub phrase_gap: u32,
    /// Deepest parenthesis nesting honoured.
    pub max_depth: usize,
    /// Reject unterminated phrases in [`QueryParser::try_parse`].
    pub strict_quotes: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            near_window: 5,
            adj_window: 1,
            phrase_gap: 0,
            max_depth: 32,
            strict_quotes: false,
        }
    }
}

/// A reusable, configured parser.
///
/// Holds no per-parse state, so one instance can serve any number of parses.
#[derive(Debug, Clone, Default)]
pub struct QueryParser {
    /// Windows and limits.
    options: ParserOptions,
}

impl QueryParser {
    /// Creates a parser with the given options.
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Returns the parser options.
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parses an equation into a raw (unoptimized) tree.
    ///
    /// When `default_field` is given and the root carries no field of its
    /// own, the root is scoped to it. Only the root is touched.
    pub fn parse(&self, equation: &str, default_field: Option<&str>) -> Node {
        let mut state = ParseState::new(equation, &self.options);
        let mut root = state
            .parse_expression(0)
            .unwrap_or_else(Node::match_nothing);
        if root.field().is_none()
            && let Some(field) = default_field
        {
            root.set_field(Some(field.to_string()));
        }
        root
    }

    /// Like [`parse`](Self::parse), but fails on an unterminated phrase when
    /// `strict_quotes` is set.
    pub fn try_parse(&self, equation: &str, default_field: Option<&str>) -> Result<Node, LexError> {
        if self.options.strict_quotes {
            let mut lexer = Lexer::new(LexerOptions {
                strict_quotes: true,
            });
            let mut token = lexer.read(Some(equation))?;
            while token.kind != TokenKind::End {
                token = lexer.read(None)?;
            }
        }
        Ok(self.parse(equation, default_field))
    }

    /// Parses an equation and flattens the result.
    pub fn parse_optimized(&self, equation: &str, default_field: Option<&str>) -> Node {
        crate::optimize(self.parse(equation, default_field))
    }
}

/// Parses an equation with default options and no default field.
pub fn parse(equation: &str) -> Node {
    QueryParser::default().parse(equation, None)
}

/// Binary operator levels, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    /// `OR`.
    Or,
    /// `AND`.
    And,
    /// `NOT`, `AND NOT`, `AND -`.
    AndNot,
    /// `NEAR`.
    Near,
    /// `ADJ`.
    Adj,
}

impl Level {
    /// The next tighter level, or `None` when operands are compounds.
    fn tighter(self) -> Option<Self> {
        match self {
            Self::Or => Some(Self::And),
            Self::And => Some(Self::AndNot),
            Self::AndNot => Some(Self::Near),
            Self::Near => Some(Self::Adj),
            Self::Adj => None,
        }
    }

    /// The node operator built by this level.
    fn operator(self) -> Operator {
        match self {
            Self::Or => Operator::Or,
            Self::And => Operator::And,
            Self::AndNot => Operator::Not,
            Self::Near => Operator::Near,
            Self::Adj => Operator::Phrase,
        }
    }

    /// The gap given to nodes built by this level.
    fn gap(self, options: &ParserOptions) -> u32 {
        match self {
            Self::Near => options.near_window,
            Self::Adj => options.adj_window,
            Self::Or | Self::And | Self::AndNot => 0,
        }
    }

    /// Token sequences recognised as this level's operator.
    fn spellings(self) -> &'static [&'static [TokenKind]] {
        match self {
            Self::Or => &[&[TokenKind::Or]],
            Self::And => &[&[TokenKind::And]],
            Self::AndNot => &[
                &[TokenKind::AndNot],
                &[TokenKind::And, TokenKind::AndNot],
                &[TokenKind::And, TokenKind::Hate],
            ],
            Self::Near => &[&[TokenKind::Near]],
            Self::Adj => &[&[TokenKind::Adj]],
        }
    }
}

/// Tokens the parser steps over without giving them meaning.
fn is_skippable(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Blank | TokenKind::RangeStart | TokenKind::RangeEnd | TokenKind::None
    )
}

/// Whether `kind` can begin an operand of a binary operator.
fn starts_operand(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Term
            | TokenKind::WildTerm
            | TokenKind::PhraseTerm
            | TokenKind::PhraseWildTerm
            | TokenKind::MatchAll
            | TokenKind::OpenParen
            | TokenKind::FieldName
    )
}

/// Whether `kind` is a clause modifier: `+`, `-` or `NOT`.
fn is_modifier(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Love | TokenKind::Hate | TokenKind::AndNot)
}

/// Whether `kind` can begin a compound, keywords included.
fn starts_compound(kind: TokenKind) -> bool {
    starts_operand(kind) || kind.is_keyword()
}

/// State of a single parse.
struct ParseState<'a> {
    /// Token source.
    lexer: Lexer,
    /// Tokens read but not yet consumed.
    lookahead: VecDeque<Token>,
    /// Parser configuration.
    options: &'a ParserOptions,
    /// Opening parentheses dropped by the depth limit whose closers are pending.
    skipped_parens: usize,
}

impl<'a> ParseState<'a> {
    /// Starts a parse of `equation`.
    fn new(equation: &str, options: &'a ParserOptions) -> Self {
        let mut lexer = Lexer::new(LexerOptions::default());
        let mut lookahead = VecDeque::new();
        lookahead.push_back(
            lexer
                .read(Some(equation))
                .unwrap_or_else(|_| end_token(equation.len())),
        );
        Self {
            lexer,
            lookahead,
            options,
            skipped_parens: 0,
        }
    }

    /// Reads tokens until the lookahead holds more than `index` entries.
    fn fill(&mut self, index: usize) {
        while self.lookahead.len() <= index {
            let token = match self.lexer.read(None) {
                Ok(token) => token,
                Err(_) => {
                    let at = self.lookahead.back().map_or(0, |t| t.span.1);
                    end_token(at)
                }
            };
            self.lookahead.push_back(token);
        }
    }

    /// The raw token at `index`, skippable tokens included.
    fn peek_raw(&mut self, index: usize) -> &Token {
        self.fill(index);
        &self.lookahead[index]
    }

    /// Kind of the `n`th meaningful token ahead.
    fn peek(&mut self, n: usize) -> TokenKind {
        let mut seen = 0;
        let mut index = 0;
        loop {
            let kind = self.peek_raw(index).kind;
            if kind == TokenKind::End {
                return kind;
            }
            if !is_skippable(kind) {
                if seen == n {
                    return kind;
                }
                seen += 1;
            }
            index += 1;
        }
    }

    /// Drops skippable tokens at the front.
    fn skip_blanks(&mut self) {
        while is_skippable(self.peek_raw(0).kind) {
            self.lookahead.pop_front();
        }
    }

    /// Consumes the next meaningful token.
    fn advance(&mut self) -> Token {
        self.skip_blanks();
        self.fill(0);
        let token = self.lookahead.pop_front();
        token.unwrap_or_else(|| end_token(0))
    }

    /// Length of the `level` operator at the cursor, or 0 when there is none.
    ///
    /// An operator only counts when an operand follows it.
    fn operator_len(&mut self, level: Level) -> usize {
        for spelling in level.spellings() {
            let matches = spelling
                .iter()
                .enumerate()
                .all(|(i, kind)| self.peek(i) == *kind);
            if !matches {
                continue;
            }
            let next = self.peek(spelling.len());
            if starts_operand(next) {
                return spelling.len();
            }
            if level == Level::Or
                && is_modifier(next)
                && starts_operand(self.peek(spelling.len() + 1))
            {
                return spelling.len();
            }
        }
        0
    }

    /// Parses an `OR` operand, honouring a leading `+`, `-` or `NOT`.
    ///
    /// A negated alternative matches everything but its operand.
    fn parse_alternative(&mut self, depth: usize) -> Option<Node> {
        let kind = self.peek(0);
        if !is_modifier(kind) {
            return self.parse_operand(Level::Or, depth);
        }
        self.advance();
        let operand = self.parse_operand(Level::Or, depth)?;
        if kind == TokenKind::Love {
            return Some(operand);
        }
        Node::combine(Operator::Not, vec![Node::match_all(), operand], 0)
    }

    /// Parses a chain of `level` operators into one N-ary node.
    fn parse_level(&mut self, level: Level, depth: usize) -> Option<Node> {
        let first = self.parse_operand(level, depth);
        let mut rest = Vec::new();
        loop {
            let len = self.operator_len(level);
            if len == 0 {
                break;
            }
            for _ in 0..len {
                self.advance();
            }
            if level == Level::Or {
                rest.extend(self.parse_alternative(depth));
            } else {
                rest.extend(self.parse_operand(level, depth));
            }
        }

        if rest.is_empty() {
            return first;
        }
        let mut operands = Vec::with_capacity(rest.len() + 1);
        match first {
            Some(node) => operands.push(node),
            // Nothing to subtract from: subtract from everything.
            None if level == Level::AndNot => operands.push(Node::match_all()),
            None => {}
        }
        operands.extend(rest);
        Node::combine(level.operator(), operands, level.gap(self.options))
    }

    /// Parses one operand of `level`.
    fn parse_operand(&mut self, level: Level, depth: usize) -> Option<Node> {
        match level.tighter() {
            Some(tighter) => self.parse_level(tighter, depth),
            None => self.parse_compound(depth),
        }
    }

    /// Parses a sequence of clauses up to `)` or the end of input.
    fn parse_expression(&mut self, depth: usize) -> Option<Node> {
        let mut neutral = Vec::new();
        let mut loved = Vec::new();
        let mut hated = Vec::new();

        loop {
            match self.peek(0) {
                TokenKind::End => break,
                TokenKind::CloseParen => {
                    if self.skipped_parens > 0 {
                        self.skipped_parens -= 1;
                        self.advance();
                    } else if depth > 0 {
                        break;
                    } else {
                        debug!("unmatched closing parenthesis dropped");
                        self.advance();
                    }
                }
                kind if is_modifier(kind) => {
                    let token = self.advance();
                    if starts_compound(self.peek(0)) {
                        let clause = self.parse_level(Level::Or, depth);
                        if kind == TokenKind::Love {
                            loved.extend(clause);
                        } else {
                            hated.extend(clause);
                        }
                    } else if kind == TokenKind::AndNot {
                        debug!(keyword = %token.text, "trailing keyword used as term");
                        neutral.push(Node::term(token.text));
                    } else {
                        debug!(modifier = %token.text, "dangling modifier dropped");
                    }
                }
                _ => neutral.extend(self.parse_level(Level::Or, depth)),
            }
        }

        let positive = match (
            Node::combine(Operator::And, loved, 0),
            Node::combine(Operator::Or, neutral, 0),
        ) {
            (Some(required), Some(optional)) => {
                Node::combine(Operator::AndMaybe, vec![required, optional], 0)
            }
            (required, optional) => required.or(optional),
        };

        if hated.is_empty() {
            return positive;
        }
        let mut children = Vec::with_capacity(hated.len() + 1);
        children.push(positive.unwrap_or_else(Node::match_all));
        children.extend(hated);
        Node::combine(Operator::Not, children, 0)
    }

    /// Parses the tightest-binding unit.
    ///
    /// Consumes nothing and returns `None` when the cursor is not at the
    /// start of a compound.
    fn parse_compound(&mut self, depth: usize) -> Option<Node> {
        self.skip_blanks();
        match self.peek(0) {
            TokenKind::Term => Some(Node::term(self.advance().text)),
            TokenKind::WildTerm => Some(Node::wildcard(self.advance().text)),
            TokenKind::MatchAll => {
                self.advance();
                Some(Node::match_all())
            }
            TokenKind::PhraseTerm | TokenKind::PhraseWildTerm => self.parse_phrase_run(),
            TokenKind::OpenParen => self.parse_group(depth),
            TokenKind::FieldName => self.parse_field(depth),
            kind if kind.is_keyword() => {
                let token = self.advance();
                debug!(keyword = %token.text, "keyword used as term");
                Some(Node::term(token.text))
            }
            _ => None,
        }
    }

    /// Parses consecutive quoted words into a phrase.
    fn parse_phrase_run(&mut self) -> Option<Node> {
        let mut words = Vec::new();
        loop {
            let node = match self.peek_raw(0).kind {
                TokenKind::PhraseTerm => Node::term(self.advance().text),
                TokenKind::PhraseWildTerm => Node::wildcard(self.advance().text),
                _ => break,
            };
            words.push(node);
        }
        Node::combine(Operator::Phrase, words, self.options.phrase_gap)
    }

    /// Parses `field:` prefixes and the compound they scope.
    ///
    /// In a chain like `a:b:x` the innermost name wins.
    fn parse_field(&mut self, depth: usize) -> Option<Node> {
        let mut names = Vec::new();
        while self.peek(0) == TokenKind::FieldName {
            names.push(self.advance().text);
        }
        if names.len() > 1 {
            debug!(dropped = ?&names[..names.len() - 1], "outer field names dropped");
        }

        if starts_compound(self.peek(0)) {
            let mut node = self.parse_compound(depth)?;
            if node.field().is_none() {
                node.set_field(names.pop());
            }
            return Some(node);
        }

        debug!("field name without value used as term");
        let text = names.pop()?;
        let mut node = Node::term(text);
        node.set_field(names.pop());
        Some(node)
    }

    /// Parses a parenthesized group.
    fn parse_group(&mut self, depth: usize) -> Option<Node> {
        if depth >= self.options.max_depth {
            while self.peek(0) == TokenKind::OpenParen {
                self.advance();
                self.skipped_parens += 1;
            }
            debug!(depth, "nesting limit reached, parentheses dropped");
            return self.parse_compound(depth);
        }

        self.advance();
        let inner = self.parse_expression(depth + 1);
        if self.peek(0) == TokenKind::CloseParen {
            self.advance();
        } else {
            debug!("unclosed parenthesis closed at end of input");
        }
        inner
    }
}

/// An end-of-input token at byte `at`.
fn end_token(at: usize) -> Token {
    Token {
        kind: TokenKind::End,
        text: String::new(),
        span: (at, at),
    }
}
