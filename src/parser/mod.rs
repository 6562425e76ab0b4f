//! Recursive descent parser for the lambda surface language
//!
//! Alternatives are tried in a fixed order and the parser commits to the
//! first one whose leading token matches; there is no backtracking across
//! a committed prefix.
//!
//! ```text
//! Definition  := "define" ["type"] NAME "=" Expression ";"
//! Assumption  := "assume" NAME ":" Expression ";"
//! Expression  := RecLambda | Lambda | Pi | LetBlock | Application
//! RecLambda   := LAMBDA "rec" [NAME] "(" (NAME|"_") ":" Expression ")" ":" Expression "." Expression
//! Lambda      := LAMBDA (NAME|"_") ":" Expression "." Expression
//! Pi          := PI (NAME|"_") ":" Expression "." Expression
//! LetBlock    := "let" (Definition|Comment)* "in" Expression "end"
//! Application := (SpecialApp | Extract) { Extract } [ "->" Expression ]
//! SpecialApp  := ("sigma"|"tuple") Extract
//! Extract     := Atomic { "[" INTEGER "]" }
//! Atomic      := "*" | "Nat" | "(" Expression {"," Expression} ")" | NAME
//! ```

pub mod cursor;
pub mod error;

pub use cursor::TokenCursor;
pub use error::{ParseError, ParseResult};

use crate::ast::*;
use crate::lexer::{Lexer, SpannedToken, Token};

/// Lex and parse a whole source file
pub fn parse_source(source: &str) -> ParseResult<Program> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse_program()
}

pub struct Parser {
    cursor: TokenCursor,
}

impl Parser {
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
        }
    }

    fn peek(&self) -> &Token {
        self.cursor.peek()
    }

    fn check(&self, token: &Token) -> bool {
        self.cursor.check(token)
    }

    fn consume(&mut self, expected: Token) -> ParseResult<()> {
        self.cursor.consume(expected)
    }

    fn match_token(&mut self, token: &Token) -> bool {
        self.cursor.match_token(token)
    }

    // ========================================================================
    // Program parsing
    // ========================================================================

    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let mut statements = Vec::new();
        loop {
            if let Some(text) = self.cursor.next_comment() {
                let span = self.cursor.previous_span();
                statements.push(Spanned::new(Statement::Comment(text), span));
                continue;
            }
            if self.cursor.is_at_end() {
                break;
            }
            statements.push(self.parse_statement()?);
        }

        if statements.is_empty() {
            return Err(ParseError::EmptyProgram {
                span: self.cursor.current_span(),
            });
        }
        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> ParseResult<Spanned<Statement>> {
        let start = self.cursor.current_span();
        let stmt = match self.peek() {
            Token::Define => self.parse_definition()?,
            Token::Assume => self.parse_assumption()?,
            _ => return Err(self.cursor.unexpected("`define` or `assume`")),
        };
        Ok(Spanned::new(stmt, start.merge(&self.cursor.previous_span())))
    }

    fn parse_definition(&mut self) -> ParseResult<Statement> {
        self.consume(Token::Define)?;
        // `type` is only a flag when a name follows it
        let type_only = matches!(self.peek(), Token::Ident(t) if t == "type")
            && matches!(self.cursor.peek_nth(1), Token::Ident(_));
        if type_only {
            self.cursor.advance();
        }
        let name = self.expect_name()?;
        self.consume(Token::Eq)?;
        let body = self.parse_expr()?;
        self.consume(Token::Semicolon)?;
        Ok(Statement::Definition {
            name,
            type_only,
            body,
        })
    }

    fn parse_assumption(&mut self) -> ParseResult<Statement> {
        self.consume(Token::Assume)?;
        let name = self.expect_name()?;
        self.consume(Token::Colon)?;
        let ty = self.parse_expr()?;
        self.consume(Token::Semicolon)?;
        Ok(Statement::Assumption { name, ty })
    }

    fn expect_name(&mut self) -> ParseResult<Name> {
        match self.peek() {
            Token::Ident(name) => {
                let name = name.clone();
                self.cursor.advance();
                Ok(name)
            }
            _ => Err(self.cursor.unexpected("a name")),
        }
    }

    /// `NAME` or `_`; the anonymous binder yields `None`
    fn binder_name(&mut self) -> ParseResult<Option<Name>> {
        if self.match_token(&Token::Underscore) {
            return Ok(None);
        }
        self.expect_name().map(Some)
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        match self.peek() {
            Token::Lambda if self.cursor.peek_nth(1) == &Token::Rec => self.parse_rec_lambda(),
            Token::Lambda => self.parse_lambda(),
            Token::Pi => self.parse_pi(),
            Token::Let => self.parse_let(),
            _ => self.parse_application(),
        }
    }

    fn parse_rec_lambda(&mut self) -> ParseResult<Expr> {
        self.consume(Token::Lambda)?;
        self.consume(Token::Rec)?;
        let name = match self.peek() {
            Token::Ident(_) => Some(self.expect_name()?),
            _ => None,
        };
        self.consume(Token::LParen)?;
        let param = self.binder_name()?;
        self.consume(Token::Colon)?;
        let ty = self.parse_expr()?;
        self.consume(Token::RParen)?;
        self.consume(Token::Colon)?;
        let ret = self.parse_expr()?;
        self.consume(Token::Dot)?;
        let body = self.parse_expr()?;
        Ok(Expr::RecLambda(std::rc::Rc::new(RecLambda {
            name,
            param,
            ty,
            ret,
            body,
        })))
    }

    /// `(NAME|_) ":" Expression "." Expression`, shared by lambda and pi
    fn parse_binder_tail(&mut self) -> ParseResult<(Option<Name>, Box<Expr>, Box<Expr>)> {
        let param = self.binder_name()?;
        self.consume(Token::Colon)?;
        let ty = self.parse_expr()?;
        self.consume(Token::Dot)?;
        let body = self.parse_expr()?;
        Ok((param, Box::new(ty), Box::new(body)))
    }

    fn parse_lambda(&mut self) -> ParseResult<Expr> {
        self.consume(Token::Lambda)?;
        let (param, ty, body) = self.parse_binder_tail()?;
        Ok(Expr::Lambda { param, ty, body })
    }

    fn parse_pi(&mut self) -> ParseResult<Expr> {
        self.consume(Token::Pi)?;
        let (param, ty, body) = self.parse_binder_tail()?;
        Ok(Expr::Pi { param, ty, body })
    }

    fn parse_let(&mut self) -> ParseResult<Expr> {
        self.consume(Token::Let)?;
        let mut items = Vec::new();
        loop {
            if let Some(text) = self.cursor.next_comment() {
                items.push(Statement::Comment(text));
            } else if self.check(&Token::Define) {
                items.push(self.parse_definition()?);
            } else {
                break;
            }
        }
        self.consume(Token::In)?;
        let body = self.parse_expr()?;
        self.consume(Token::End)?;
        Ok(Expr::Let {
            items,
            body: Box::new(body),
        })
    }

    fn parse_application(&mut self) -> ParseResult<Expr> {
        let special = match self.peek() {
            Token::Ident(name) if self.cursor.is_extract_start_at(1) => name.parse::<SpecialFn>().ok(),
            _ => None,
        };
        let func = match special {
            Some(func) => {
                self.cursor.advance();
                let operand = self.parse_extract()?;
                Expr::SpecialApp {
                    func,
                    operand: Box::new(operand),
                }
            }
            None => self.parse_extract()?,
        };

        let mut args = Vec::new();
        while self.cursor.is_extract_start() {
            args.push(self.parse_extract()?);
        }

        let arrow = if self.match_token(&Token::Arrow) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        if args.is_empty() && arrow.is_none() {
            return Ok(func);
        }
        Ok(Expr::App {
            func: Box::new(func),
            args,
            arrow,
        })
    }

    fn parse_extract(&mut self) -> ParseResult<Expr> {
        let base = self.parse_atomic()?;
        let mut indices = Vec::new();
        while self.match_token(&Token::LBracket) {
            match self.peek() {
                Token::Int(n) => {
                    indices.push(*n);
                    self.cursor.advance();
                }
                _ => return Err(self.cursor.unexpected("an index")),
            }
            self.consume(Token::RBracket)?;
        }
        if indices.is_empty() {
            return Ok(base);
        }
        Ok(Expr::Extract {
            base: Box::new(base),
            indices,
        })
    }

    fn parse_atomic(&mut self) -> ParseResult<Expr> {
        match self.peek() {
            Token::Star => {
                self.cursor.advance();
                Ok(Expr::Const(Constant::Star))
            }
            Token::Ident(name) if name == "Nat" => {
                self.cursor.advance();
                Ok(Expr::Const(Constant::Nat))
            }
            Token::Ident(_) => Ok(Expr::Ident(self.expect_name()?)),
            Token::LParen => {
                self.cursor.advance();
                let mut items = vec![self.parse_expr()?];
                while self.match_token(&Token::Comma) {
                    items.push(self.parse_expr()?);
                }
                self.consume(Token::RParen)?;
                Ok(Expr::Tuple(items))
            }
            _ => Err(self.cursor.unexpected("an expression")),
        }
    }
}
