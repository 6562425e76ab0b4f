//! Token stream cursor with lookahead and span tracking
//!
//! Comment tokens are invisible to `peek`/`advance`; statement lists pull
//! them out explicitly with [`TokenCursor::next_comment`].

use crate::ast::Span;
use crate::lexer::{SpannedToken, Token};

use super::error::{ParseError, ParseResult};

pub struct TokenCursor {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl TokenCursor {
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        Self { tokens, pos: 0 }
    }

    // ========================================================================
    // Position and lookahead
    // ========================================================================

    /// Index of the n-th significant (non-comment) token from the cursor
    fn significant(&self, n: usize) -> Option<usize> {
        (self.pos..self.tokens.len())
            .filter(|&i| !matches!(self.tokens[i].token, Token::Comment(_)))
            .nth(n)
    }

    pub fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    /// Peek at a significant token n positions ahead (0 = current)
    pub fn peek_nth(&self, n: usize) -> &Token {
        self.significant(n)
            .map(|i| &self.tokens[i].token)
            .unwrap_or(&Token::Eof)
    }

    pub fn current_span(&self) -> Span {
        self.significant(0)
            .map(|i| self.tokens[i].span)
            .or_else(|| self.tokens.last().map(|t| t.span))
            .unwrap_or_default()
    }

    /// Span of the most recently consumed token
    pub fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span)
            .unwrap_or_default()
    }

    pub fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    // ========================================================================
    // Token consumption
    // ========================================================================

    /// Consume the next significant token, skipping any comments before it
    pub fn advance(&mut self) -> Token {
        match self.significant(0) {
            Some(i) if self.tokens[i].token != Token::Eof => {
                self.pos = i + 1;
                self.tokens[i].token.clone()
            }
            _ => Token::Eof,
        }
    }

    /// Take the comment directly at the cursor, if there is one
    pub fn next_comment(&mut self) -> Option<String> {
        match self.tokens.get(self.pos) {
            Some(SpannedToken {
                token: Token::Comment(text),
                ..
            }) => {
                let text = text.clone();
                self.pos += 1;
                Some(text)
            }
            _ => None,
        }
    }

    pub fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    pub fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn consume(&mut self, expected: Token) -> ParseResult<()> {
        if self.check(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&expected.describe()))
        }
    }

    pub fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::unexpected(expected, self.peek().clone(), self.current_span())
    }

    // ========================================================================
    // Token predicates
    // ========================================================================

    /// Check if the token n ahead could start an extract expression
    pub fn is_extract_start_at(&self, n: usize) -> bool {
        matches!(
            self.peek_nth(n),
            Token::Ident(_) | Token::Star | Token::LParen
        )
    }

    pub fn is_extract_start(&self) -> bool {
        self.is_extract_start_at(0)
    }
}
