//! Concrete syntax tree for the lambda frontend
//!
//! Trees produced by the parser are immutable once normalized. Recursive
//! lambdas are shared through `Rc` so the semantic builder can key its
//! worklist on node identity rather than on structural equality.

use std::fmt;
use std::rc::Rc;

pub type Name = String;

/// Source location for error reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Human-readable source position (1-indexed line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    /// Counted in characters, not bytes
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets to line:column positions.
#[derive(Debug, Clone)]
pub struct SourceMap {
    source: String,
    /// Byte offset of the first character of every line
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source: source.to_string(),
            line_starts,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn position(&self, byte_offset: usize) -> Position {
        let offset = byte_offset.min(self.source.len());
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.line_starts[line_idx];
        let column = self.source[line_start..offset].chars().count() + 1;
        Position::new(line_idx + 1, column)
    }

    /// Text of a 1-indexed line without its line terminator
    pub fn line(&self, line_num: usize) -> Option<&str> {
        if line_num == 0 || line_num > self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[line_num - 1];
        let end = self
            .line_starts
            .get(line_num)
            .map(|next| next - 1)
            .unwrap_or(self.source.len());
        Some(self.source[start..end].trim_end_matches('\r'))
    }

    pub fn span_text(&self, span: &Span) -> &str {
        let end = span.end.min(self.source.len());
        &self.source[span.start.min(end)..end]
    }
}

/// A node paired with the source range it was parsed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    /// The universe marker `*`
    Star,
    Nat,
}

impl Constant {
    pub fn name(self) -> &'static str {
        match self {
            Constant::Star => "*",
            Constant::Nat => "Nat",
        }
    }
}

/// Head of a special application such as `sigma (A, B)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialFn {
    Sigma,
    Tuple,
}

impl SpecialFn {
    pub fn name(self) -> &'static str {
        match self {
            SpecialFn::Sigma => "sigma",
            SpecialFn::Tuple => "tuple",
        }
    }
}

impl std::str::FromStr for SpecialFn {
    type Err = crate::semantic::TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sigma" => Ok(SpecialFn::Sigma),
            "tuple" => Ok(SpecialFn::Tuple),
            other => Err(crate::semantic::TranslateError::UnknownSpecialFunction(
                other.to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecLambda {
    /// Optional self-name, also used as display name
    pub name: Option<Name>,
    pub param: Option<Name>,
    pub ty: Expr,
    pub ret: Expr,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Ident(Name),
    Const(Constant),
    /// Arity >= 1. A one-element tuple is parenthesized grouping.
    Tuple(Vec<Expr>),
    Lambda {
        param: Option<Name>,
        ty: Box<Expr>,
        body: Box<Expr>,
    },
    RecLambda(Rc<RecLambda>),
    Pi {
        param: Option<Name>,
        ty: Box<Expr>,
        body: Box<Expr>,
    },
    Extract {
        base: Box<Expr>,
        indices: Vec<usize>,
    },
    SpecialApp {
        func: SpecialFn,
        operand: Box<Expr>,
    },
    /// `func args... [-> arrow]`; the arrow field only exists before normalization
    App {
        func: Box<Expr>,
        args: Vec<Expr>,
        arrow: Option<Box<Expr>>,
    },
    Let {
        items: Vec<Statement>,
        body: Box<Expr>,
    },
}

impl Expr {
    pub fn ident(name: impl Into<Name>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn nat() -> Self {
        Expr::Const(Constant::Nat)
    }

    pub fn star() -> Self {
        Expr::Const(Constant::Star)
    }

    pub fn lambda(param: Option<&str>, ty: Expr, body: Expr) -> Self {
        Expr::Lambda {
            param: param.map(str::to_string),
            ty: Box::new(ty),
            body: Box::new(body),
        }
    }

    pub fn pi(param: Option<&str>, ty: Expr, body: Expr) -> Self {
        Expr::Pi {
            param: param.map(str::to_string),
            ty: Box::new(ty),
            body: Box::new(body),
        }
    }

    pub fn rec_lambda(
        name: Option<&str>,
        param: Option<&str>,
        ty: Expr,
        ret: Expr,
        body: Expr,
    ) -> Self {
        Expr::RecLambda(Rc::new(RecLambda {
            name: name.map(str::to_string),
            param: param.map(str::to_string),
            ty,
            ret,
            body,
        }))
    }

    pub fn app(func: Expr, args: Vec<Expr>) -> Self {
        Expr::App {
            func: Box::new(func),
            args,
            arrow: None,
        }
    }

    /// Unnormalized `lhs -> rhs` sugar
    pub fn arrow(lhs: Expr, rhs: Expr) -> Self {
        match lhs {
            Expr::App { func, args, arrow: None } => Expr::App {
                func,
                args,
                arrow: Some(Box::new(rhs)),
            },
            other => Expr::App {
                func: Box::new(other),
                args: Vec::new(),
                arrow: Some(Box::new(rhs)),
            },
        }
    }

    pub fn extract(base: Expr, indices: Vec<usize>) -> Self {
        Expr::Extract {
            base: Box::new(base),
            indices,
        }
    }

    /// Looks through one-element tuples, which are plain grouping.
    pub fn ungrouped(&self) -> &Expr {
        match self {
            Expr::Tuple(items) if items.len() == 1 => items[0].ungrouped(),
            other => other,
        }
    }

    /// Forms that may stand left of `->` without changing how they parse
    fn is_application_shaped(&self) -> bool {
        matches!(
            self,
            Expr::Ident(_)
                | Expr::Const(_)
                | Expr::Tuple(_)
                | Expr::Extract { .. }
                | Expr::SpecialApp { .. }
                | Expr::App { arrow: None, .. }
        )
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Definition {
        name: Name,
        /// Parsed from `define type`; carried but not interpreted
        type_only: bool,
        body: Expr,
    },
    Assumption {
        name: Name,
        ty: Expr,
    },
    /// Raw comment text, delimiters included
    Comment(String),
}

/// A whole source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub statements: Vec<Spanned<Statement>>,
}

impl Program {
    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter().map(|s| &s.node)
    }
}

// ============================================================================
// Printing
// ============================================================================

fn binder(name: &Option<Name>) -> &str {
    name.as_deref().unwrap_or("_")
}

fn is_line_comment(text: &str) -> bool {
    text.starts_with("//") || text.starts_with('#')
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => write!(f, "{}", name),
            Expr::Const(c) => write!(f, "{}", c.name()),
            Expr::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Expr::Lambda { param, ty, body } => {
                write!(f, "lambda {}: {}. {}", binder(param), ty, body)
            }
            Expr::RecLambda(rec) => {
                write!(f, "lambda rec ")?;
                if let Some(name) = &rec.name {
                    write!(f, "{} ", name)?;
                }
                write!(
                    f,
                    "({}: {}): {}. {}",
                    binder(&rec.param),
                    rec.ty,
                    rec.ret,
                    rec.body
                )
            }
            Expr::Pi { param: None, ty, body } if ty.is_application_shaped() => {
                write!(f, "{} -> {}", ty, body)
            }
            Expr::Pi { param, ty, body } => write!(f, "pi {}: {}. {}", binder(param), ty, body),
            Expr::Extract { base, indices } => {
                write!(f, "{}", base)?;
                for index in indices {
                    write!(f, "[{}]", index)?;
                }
                Ok(())
            }
            Expr::SpecialApp { func, operand } => write!(f, "{} {}", func.name(), operand),
            Expr::App { func, args, arrow } => {
                write!(f, "{}", func)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                if let Some(arrow) = arrow {
                    write!(f, " -> {}", arrow)?;
                }
                Ok(())
            }
            Expr::Let { items, body } => {
                write!(f, "let ")?;
                for item in items {
                    write!(f, "{}", item)?;
                    match item {
                        Statement::Comment(text) if is_line_comment(text) => writeln!(f)?,
                        _ => write!(f, " ")?,
                    }
                }
                write!(f, "in {} end", body)
            }
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Definition {
                name,
                type_only,
                body,
            } => {
                let flag = if *type_only { "type " } else { "" };
                write!(f, "define {}{} = {};", flag, name, body)
            }
            Statement::Assumption { name, ty } => write!(f, "assume {}: {};", name, ty),
            Statement::Comment(text) => write!(f, "{}", text),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in self.statements() {
            writeln!(f, "{}", stmt)?;
        }
        Ok(())
    }
}
