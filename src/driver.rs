//! Program walk shared by both backends
//!
//! Statements are visited in source order with one running scope, so later
//! top-level definitions see earlier ones. Fatal errors abort the walk and
//! no partial output is returned.

use thiserror::Error;

use crate::ast::{Program, Span, Spanned, Statement};
use crate::codegen::{EmitBinding, Emission, Emitter};
use crate::config::EmitterConfig;
use crate::lexer::LexError;
use crate::normalize::normalize_program;
use crate::parser::{parse_source, ParseError};
use crate::scope::Scope;
use crate::semantic::{AstBuilder, AstOutput, NodeRef, SemanticHost, TranslateError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrontendError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("{error}")]
    Translate {
        error: TranslateError,
        /// Statement being translated; `None` for deferred bodies
        span: Option<Span>,
    },
}

impl FrontendError {
    pub fn span(&self) -> Option<Span> {
        match self {
            FrontendError::Parse(err) => Some(*err.span()),
            FrontendError::Translate { span, .. } => *span,
        }
    }
}

impl From<LexError> for FrontendError {
    fn from(err: LexError) -> Self {
        FrontendError::Parse(ParseError::Lex(err))
    }
}

impl From<TranslateError> for FrontendError {
    fn from(error: TranslateError) -> Self {
        FrontendError::Translate { error, span: None }
    }
}

/// A translation target driven statement by statement
pub trait Backend {
    /// What a name is bound to in the running scope
    type Binding: Clone;
    type Output;

    fn statement(
        &mut self,
        stmt: &Spanned<Statement>,
        scope: &mut Scope<Self::Binding>,
    ) -> Result<(), FrontendError>;

    /// Runs after every non-comment top-level statement
    fn after_statement(&mut self) {}

    fn finish(self) -> Result<Self::Output, FrontendError>;
}

impl Backend for Emitter {
    type Binding = EmitBinding;
    type Output = Emission;

    fn statement(
        &mut self,
        stmt: &Spanned<Statement>,
        scope: &mut Scope<Self::Binding>,
    ) -> Result<(), FrontendError> {
        Emitter::statement(self, &stmt.node, scope);
        Ok(())
    }

    fn after_statement(&mut self) {
        self.end_statement();
    }

    fn finish(self) -> Result<Emission, FrontendError> {
        Ok(Emitter::finish(self))
    }
}

impl<H: SemanticHost> Backend for AstBuilder<H> {
    type Binding = NodeRef;
    type Output = AstOutput<H>;

    fn statement(
        &mut self,
        stmt: &Spanned<Statement>,
        scope: &mut Scope<NodeRef>,
    ) -> Result<(), FrontendError> {
        self.top_level(&stmt.node, scope)
            .map_err(|error| FrontendError::Translate {
                error,
                span: Some(stmt.span),
            })
    }

    fn finish(self) -> Result<AstOutput<H>, FrontendError> {
        Ok(AstBuilder::finish(self)?)
    }
}

pub fn run<B: Backend>(program: &Program, mut backend: B) -> Result<B::Output, FrontendError> {
    let mut scope = Scope::new();
    for stmt in &program.statements {
        tracing::trace!(span = ?stmt.span, "statement");
        backend.statement(stmt, &mut scope)?;
        if !matches!(stmt.node, Statement::Comment(_)) {
            backend.after_statement();
        }
    }
    backend.finish()
}

/// Lex, parse and normalize
pub fn parse_program(source: &str) -> Result<Program, FrontendError> {
    let program = normalize_program(parse_source(source)?);
    tracing::debug!(statements = program.statements.len(), "parsed program");
    Ok(program)
}

pub fn emit_program(program: &Program, config: EmitterConfig) -> Result<Emission, FrontendError> {
    run(program, Emitter::new(config))
}

pub fn emit(source: &str, config: EmitterConfig) -> Result<Emission, FrontendError> {
    emit_program(&parse_program(source)?, config)
}

pub fn build_ast_program<H: SemanticHost>(
    program: &Program,
    host: H,
) -> Result<AstOutput<H>, FrontendError> {
    run(program, AstBuilder::new(host))
}

pub fn build_ast<H: SemanticHost>(source: &str, host: H) -> Result<AstOutput<H>, FrontendError> {
    build_ast_program(&parse_program(source)?, host)
}
