//! Handwritten lexer for the lambda surface language

use crate::ast::Span;
use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Ident(String),
    Int(usize),
    /// Raw comment text including its delimiters
    Comment(String),

    // Keywords
    Define,
    Assume,
    Let,
    In,
    End,
    Rec,
    /// `lambda`, `\` or `λ`
    Lambda,
    /// `pi` or `Π`
    Pi,

    // Delimiters
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    Comma,     // ,
    Semicolon, // ;
    Colon,     // :
    Dot,       // .

    Eq,         // =
    Arrow,      // -> or →
    Star,       // *
    Underscore, // _

    Eof,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier `{}`", name),
            Token::Int(n) => format!("integer `{}`", n),
            Token::Comment(_) => "comment".to_string(),
            Token::Eof => "end of input".to_string(),
            other => format!("`{}`", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::Define => "define",
            Token::Assume => "assume",
            Token::Let => "let",
            Token::In => "in",
            Token::End => "end",
            Token::Rec => "rec",
            Token::Lambda => "lambda",
            Token::Pi => "pi",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Colon => ":",
            Token::Dot => ".",
            Token::Eq => "=",
            Token::Arrow => "->",
            Token::Star => "*",
            Token::Underscore => "_",
            Token::Ident(_) | Token::Int(_) | Token::Comment(_) | Token::Eof => "",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unexpected character: {0}")]
    UnexpectedChar(char, Span),
    #[error("unterminated block comment")]
    UnterminatedComment(Span),
    #[error("invalid number: {0}")]
    InvalidNumber(String, Span),
}

impl LexError {
    pub fn span(&self) -> &Span {
        match self {
            LexError::UnexpectedChar(_, span) => span,
            LexError::UnterminatedComment(span) => span,
            LexError::InvalidNumber(_, span) => span,
        }
    }
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            pos: 0,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<SpannedToken>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.token == Token::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Consumes up to (not including) the newline; `text` already holds the opener
    fn line_comment(&mut self, mut text: String) -> Token {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.advance();
        }
        Token::Comment(text.trim_end_matches('\r').to_string())
    }

    fn block_comment(&mut self, start: usize) -> Result<Token, LexError> {
        let mut text = String::from("/*");
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    text.push_str("*/");
                    return Ok(Token::Comment(text));
                }
                Some(c) => text.push(c),
                None => return Err(LexError::UnterminatedComment(Span::new(start, self.pos))),
            }
        }
    }

    fn next_token(&mut self) -> Result<SpannedToken, LexError> {
        self.skip_whitespace();
        let start = self.pos;

        let Some(c) = self.advance() else {
            return Ok(SpannedToken {
                token: Token::Eof,
                span: Span::new(start, start),
            });
        };

        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            ':' => Token::Colon,
            '.' => Token::Dot,
            '=' => Token::Eq,
            '*' => Token::Star,
            '\\' | 'λ' => Token::Lambda,
            'Π' => Token::Pi,
            '→' => Token::Arrow,
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    Token::Arrow
                } else {
                    return Err(LexError::UnexpectedChar('-', Span::new(start, self.pos)));
                }
            }
            '#' => self.line_comment(String::from("#")),
            '/' => match self.peek() {
                Some('/') => {
                    self.advance();
                    self.line_comment(String::from("//"))
                }
                Some('*') => {
                    self.advance();
                    self.block_comment(start)?
                }
                _ => return Err(LexError::UnexpectedChar('/', Span::new(start, self.pos))),
            },
            '_' if !self.peek().is_some_and(is_ident_continue) => Token::Underscore,
            c if c.is_ascii_digit() => self.lex_number(c, start)?,
            c if c.is_alphabetic() || c == '_' => self.lex_ident(c),
            _ => return Err(LexError::UnexpectedChar(c, Span::new(start, self.pos))),
        };

        Ok(SpannedToken {
            token,
            span: Span::new(start, self.pos),
        })
    }

    fn lex_number(&mut self, first: char, start: usize) -> Result<Token, LexError> {
        let mut s = String::from(first);
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            s.push(c);
            self.advance();
        }
        let n: usize = s
            .parse()
            .map_err(|_| LexError::InvalidNumber(s.clone(), Span::new(start, self.pos)))?;
        Ok(Token::Int(n))
    }

    fn lex_ident(&mut self, first: char) -> Token {
        let mut s = String::from(first);
        while let Some(c) = self.peek() {
            if !is_ident_continue(c) {
                break;
            }
            s.push(c);
            self.advance();
        }

        match s.as_str() {
            "define" => Token::Define,
            "assume" => Token::Assume,
            "let" => Token::Let,
            "in" => Token::In,
            "end" => Token::End,
            "rec" => Token::Rec,
            "lambda" => Token::Lambda,
            "pi" => Token::Pi,
            _ => Token::Ident(s),
        }
    }
}

fn is_ident_continue(c: char) -> bool {
    (c.is_alphanumeric() || c == '_') && c != 'λ' && c != 'Π'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_definition() {
        assert_eq!(
            tokens("define x = n1;"),
            vec![
                Token::Define,
                Token::Ident("x".into()),
                Token::Eq,
                Token::Ident("n1".into()),
                Token::Semicolon,
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_lambda_markers() {
        assert_eq!(
            tokens("lambda \\ λx Πy pi"),
            vec![
                Token::Lambda,
                Token::Lambda,
                Token::Lambda,
                Token::Ident("x".into()),
                Token::Pi,
                Token::Ident("y".into()),
                Token::Pi,
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_comments_keep_text() {
        assert_eq!(
            tokens("// one\n# two\n/* three */ x"),
            vec![
                Token::Comment("// one".into()),
                Token::Comment("# two".into()),
                Token::Comment("/* three */".into()),
                Token::Ident("x".into()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_arrow_and_extract() {
        assert_eq!(
            tokens("p[0][12] -> *"),
            vec![
                Token::Ident("p".into()),
                Token::LBracket,
                Token::Int(0),
                Token::RBracket,
                Token::LBracket,
                Token::Int(12),
                Token::RBracket,
                Token::Arrow,
                Token::Star,
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_underscore_vs_ident() {
        assert_eq!(
            tokens("_ _x"),
            vec![Token::Underscore, Token::Ident("_x".into()), Token::Eof]
        );
    }

    #[test]
    fn test_lone_minus_is_error() {
        let err = Lexer::new("a - b").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnexpectedChar('-', _)));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = Lexer::new("/* open").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnterminatedComment(_)));
    }
}
