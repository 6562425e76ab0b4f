//! Helpers for inspecting each pipeline stage in tests.
//!
//! Every helper reports failures as a `String` so tests can `unwrap()` with
//! a readable message instead of matching on the error enums.

use crate::ast::{Expr, Program};
use crate::codegen::Emission;
use crate::config::EmitterConfig;
use crate::driver::{self, FrontendError};
use crate::lexer::Lexer;
use crate::normalize::normalize;
use crate::parser::Parser;
use crate::semantic::{AstOutput, Prelude, SemanticHost};

fn describe(err: FrontendError) -> String {
    match err.span() {
        Some(span) => format!("{} at {}..{}", err, span.start, span.end),
        None => err.to_string(),
    }
}

// ============================================================================
// Front half
// ============================================================================

/// Parse a single expression without desugaring
pub fn parse_expr(input: &str) -> Result<Expr, String> {
    let tokens = Lexer::new(input)
        .tokenize()
        .map_err(|e| format!("Lexer error: {}", e))?;
    Parser::new(tokens)
        .parse_expr()
        .map_err(|e| format!("Parse error: {}", e))
}

/// Parse and desugar a single expression
pub fn normalized_expr(input: &str) -> Result<Expr, String> {
    parse_expr(input).map(normalize)
}

/// Parse and desugar a whole program
pub fn parse_program(input: &str) -> Result<Program, String> {
    driver::parse_program(input).map_err(describe)
}

// ============================================================================
// Instruction emitter
// ============================================================================

pub fn emission(input: &str) -> Result<Emission, String> {
    driver::emit(input, EmitterConfig::default()).map_err(describe)
}

/// Emitted lines without blank separators
pub fn emitted_lines(input: &str) -> Result<Vec<String>, String> {
    Ok(emission(input)?
        .texts()
        .into_iter()
        .map(str::to_string)
        .collect())
}

/// Warning messages, in report order
pub fn emitted_warnings(input: &str) -> Result<Vec<String>, String> {
    Ok(emission(input)?
        .warnings
        .iter()
        .map(ToString::to_string)
        .collect())
}

/// Index of the first line that starts with `prefix`
pub fn line_index(lines: &[String], prefix: &str) -> Option<usize> {
    lines.iter().position(|line| line.starts_with(prefix))
}

// ============================================================================
// Semantic AST
// ============================================================================

pub fn ast_with<H: SemanticHost>(input: &str, host: H) -> Result<AstOutput<H>, String> {
    driver::build_ast(input, host).map_err(describe)
}

pub fn ast(input: &str) -> Result<AstOutput, String> {
    ast_with(input, Prelude::new())
}

/// `(name, rendering)` for every top-level definition
pub fn rendered_definitions(input: &str) -> Result<Vec<(String, String)>, String> {
    let output = ast(input)?;
    Ok(output
        .definitions
        .iter()
        .map(|(name, node)| (name.clone(), output.arena.render_definition(*node)))
        .collect())
}
