//! Parser error types

use crate::ast::Span;
use crate::lexer::{LexError, Token};
use thiserror::Error;

/// Syntax errors. Every one of them aborts the whole parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected {}: expected {expected}", .found.describe())]
    UnexpectedToken {
        expected: String,
        found: Token,
        span: Span,
    },

    #[error("unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String, last_span: Span },

    #[error("a program needs at least one statement")]
    EmptyProgram { span: Span },

    #[error(transparent)]
    Lex(#[from] LexError),
}

impl ParseError {
    pub fn span(&self) -> &Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => span,
            ParseError::UnexpectedEof { last_span, .. } => last_span,
            ParseError::EmptyProgram { span } => span,
            ParseError::Lex(err) => err.span(),
        }
    }

    pub fn unexpected(expected: impl Into<String>, found: Token, span: Span) -> Self {
        match found {
            Token::Eof => ParseError::UnexpectedEof {
                expected: expected.into(),
                last_span: span,
            },
            found => ParseError::UnexpectedToken {
                expected: expected.into(),
                found,
                span,
            },
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
