//! Frontend for a small dependently-typed lambda calculus
//!
//! Source text is lexed, parsed, and desugared, then handed to one of two
//! backends: an emitter producing ordered term-builder instructions, or a
//! builder producing an in-memory semantic AST.

pub mod ast;
pub mod codegen;
pub mod config;
pub mod driver;
pub mod errors;
pub mod lexer;
pub mod normalize;
pub mod parser;
pub mod scope;
pub mod semantic;
pub mod test_support;

pub use ast::{Expr, Position, Program, SourceMap, Span, Statement};
pub use codegen::{Emission, Emitter, Line, Warning};
pub use config::{BackendKind, EmitterConfig, FrontendConfig};
pub use driver::{build_ast, emit, parse_program, Backend, FrontendError};
pub use errors::{
    find_similar, format_error, format_header, format_location, format_snippet,
    format_suggestions, format_warning, levenshtein_distance, Colors, ErrorConfig,
};
pub use lexer::Lexer;
pub use normalize::normalize;
pub use parser::Parser;
pub use scope::Scope;
pub use semantic::{AstArena, AstBuilder, AstOutput, Node, NodeRef, Prelude, SemanticHost};
