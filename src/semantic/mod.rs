//! Semantic AST backend
//!
//! Translates a normalized program into arena nodes. Recursive functions
//! are built in two steps: a bodyless nominal node is returned at once and
//! the body is translated later by draining a FIFO worklist, which is what
//! makes mutual recursion terminate.

pub mod arena;
pub mod builder;

use std::collections::HashMap;

use thiserror::Error;

pub use arena::{AstArena, Node, NodeRef, SlotError};
pub use builder::{AstBuilder, AstOutput, AstScope};

use crate::ast::{Constant, Name};

/// Fatal errors of the semantic backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("unresolved value: {name}")]
    UnresolvedValue { name: Name, suggestions: Vec<Name> },
    #[error("unknown constant: {0}")]
    UnknownConstant(Name),
    #[error("unknown special function: {0}")]
    UnknownSpecialFunction(String),
    #[error(transparent)]
    Slot(#[from] SlotError),
}

/// Lookup hooks into the environment that owns predefined names
pub trait SemanticHost {
    fn has_predefined_assumption(&self, name: &str) -> bool;

    fn assumption(&mut self, name: &str, arena: &mut AstArena) -> Option<NodeRef>;

    fn constant(&mut self, name: &str, arena: &mut AstArena) -> Option<NodeRef>;
}

/// Default host: the constants `*` and `Nat`, plus any assumptions
/// registered up front. Each name is allocated at most once.
#[derive(Debug, Default)]
pub struct Prelude {
    /// Predefined assumptions and the constant that types them
    declared: Vec<(Name, Constant)>,
    cache: HashMap<Name, NodeRef>,
}

impl Prelude {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assumption(mut self, name: impl Into<Name>, ty: Constant) -> Self {
        self.declared.push((name.into(), ty));
        self
    }

    fn cached(
        &mut self,
        key: String,
        arena: &mut AstArena,
        build: impl FnOnce(&mut AstArena) -> NodeRef,
    ) -> NodeRef {
        if let Some(node) = self.cache.get(&key) {
            return *node;
        }
        let node = build(arena);
        self.cache.insert(key, node);
        node
    }
}

fn constant_named(name: &str) -> Option<Constant> {
    match name {
        "*" => Some(Constant::Star),
        "Nat" => Some(Constant::Nat),
        _ => None,
    }
}

impl SemanticHost for Prelude {
    fn has_predefined_assumption(&self, name: &str) -> bool {
        self.declared.iter().any(|(n, _)| n == name)
    }

    fn assumption(&mut self, name: &str, arena: &mut AstArena) -> Option<NodeRef> {
        let (_, ty) = self.declared.iter().find(|(n, _)| n == name).cloned()?;
        let ty = self.constant(ty.name(), arena)?;
        let name = name.to_string();
        Some(self.cached(format!("assume:{}", name), arena, |arena| {
            arena.assume(name, ty)
        }))
    }

    fn constant(&mut self, name: &str, arena: &mut AstArena) -> Option<NodeRef> {
        let constant = constant_named(name)?;
        Some(self.cached(format!("const:{}", name), arena, |arena| {
            arena.constant(constant)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_constants_are_shared() {
        let mut arena = AstArena::new();
        let mut host = Prelude::new();
        let a = host.constant("Nat", &mut arena).unwrap();
        let b = host.constant("Nat", &mut arena).unwrap();
        assert_eq!(a, b);
        assert_eq!(arena.len(), 1);
        assert!(host.constant("Bool", &mut arena).is_none());
    }

    #[test]
    fn test_prelude_assumption_typed_by_constant() {
        let mut arena = AstArena::new();
        let mut host = Prelude::new().with_assumption("zero", Constant::Nat);
        assert!(host.has_predefined_assumption("zero"));
        assert!(!host.has_predefined_assumption("one"));
        let zero = host.assumption("zero", &mut arena).unwrap();
        assert_eq!(arena.render(zero), "zero");
        match arena.get(zero) {
            Node::Assume { ty, .. } => assert_eq!(arena.render(*ty), "Nat"),
            other => panic!("expected assumption, got {:?}", other),
        }
    }
}
