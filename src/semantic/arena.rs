//! Node storage for the semantic AST
//!
//! Nodes are addressed by `NodeRef` indices. A recursive function is
//! allocated as a `Nominal` node before its body exists; the body slot is
//! filled exactly once, after which it is read-only.

use std::fmt;

use thiserror::Error;

use crate::ast::{Constant, Name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(usize);

impl NodeRef {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Constant(Constant),
    /// Parameter binding; references to the parameter point here
    Param {
        name: Option<Name>,
        ty: NodeRef,
    },
    Lambda {
        param: NodeRef,
        body: NodeRef,
    },
    Pi {
        param: NodeRef,
        body: NodeRef,
    },
    App {
        func: NodeRef,
        arg: NodeRef,
    },
    Extract {
        base: NodeRef,
        index: usize,
    },
    Sigma(Vec<NodeRef>),
    Tuple(Vec<NodeRef>),
    Assume {
        name: Name,
        ty: NodeRef,
    },
    /// Recursive function whose body is attached after construction
    Nominal {
        name: Option<Name>,
        param: NodeRef,
        ret: NodeRef,
        body: Option<NodeRef>,
    },
}

/// Misuse of a nominal body slot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    #[error("node {0} is not a recursive function")]
    NotNominal(NodeRef),
    #[error("body of {0} is already attached")]
    AlreadyFilled(NodeRef),
    #[error("body of {0} read before it was attached")]
    Unfilled(NodeRef),
}

#[derive(Debug, Default)]
pub struct AstArena {
    nodes: Vec<Node>,
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn alloc(&mut self, node: Node) -> NodeRef {
        self.nodes.push(node);
        NodeRef(self.nodes.len() - 1)
    }

    pub fn get(&self, node: NodeRef) -> &Node {
        &self.nodes[node.0]
    }

    pub fn constant(&mut self, constant: Constant) -> NodeRef {
        self.alloc(Node::Constant(constant))
    }

    pub fn param(&mut self, name: Option<Name>, ty: NodeRef) -> NodeRef {
        self.alloc(Node::Param { name, ty })
    }

    pub fn lambda(&mut self, param: NodeRef, body: NodeRef) -> NodeRef {
        self.alloc(Node::Lambda { param, body })
    }

    pub fn pi(&mut self, param: NodeRef, body: NodeRef) -> NodeRef {
        self.alloc(Node::Pi { param, body })
    }

    pub fn app(&mut self, func: NodeRef, arg: NodeRef) -> NodeRef {
        self.alloc(Node::App { func, arg })
    }

    pub fn extract(&mut self, base: NodeRef, index: usize) -> NodeRef {
        self.alloc(Node::Extract { base, index })
    }

    pub fn sigma(&mut self, items: Vec<NodeRef>) -> NodeRef {
        self.alloc(Node::Sigma(items))
    }

    pub fn tuple(&mut self, items: Vec<NodeRef>) -> NodeRef {
        self.alloc(Node::Tuple(items))
    }

    pub fn assume(&mut self, name: impl Into<Name>, ty: NodeRef) -> NodeRef {
        self.alloc(Node::Assume {
            name: name.into(),
            ty,
        })
    }

    pub fn nominal(&mut self, name: Option<Name>, param: NodeRef, ret: NodeRef) -> NodeRef {
        self.alloc(Node::Nominal {
            name,
            param,
            ret,
            body: None,
        })
    }

    pub fn set_body(&mut self, nominal: NodeRef, new_body: NodeRef) -> Result<(), SlotError> {
        match &mut self.nodes[nominal.0] {
            Node::Nominal { body: Some(_), .. } => Err(SlotError::AlreadyFilled(nominal)),
            Node::Nominal { body, .. } => {
                *body = Some(new_body);
                Ok(())
            }
            _ => Err(SlotError::NotNominal(nominal)),
        }
    }

    pub fn body(&self, nominal: NodeRef) -> Result<NodeRef, SlotError> {
        match self.get(nominal) {
            Node::Nominal { body: Some(body), .. } => Ok(*body),
            Node::Nominal { body: None, .. } => Err(SlotError::Unfilled(nominal)),
            _ => Err(SlotError::NotNominal(nominal)),
        }
    }

    /// Nominal nodes whose body was never attached
    pub fn unfilled(&self) -> Vec<NodeRef> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node, Node::Nominal { body: None, .. }))
            .map(|(i, _)| NodeRef(i))
            .collect()
    }

    /// Debug rendering. Recursive functions and assumptions print by name
    /// so cyclic graphs stay finite.
    pub fn render(&self, node: NodeRef) -> String {
        match self.get(node) {
            Node::Constant(c) => c.name().to_string(),
            Node::Param { name, .. } => name.clone().unwrap_or_else(|| "_".to_string()),
            Node::Lambda { param, body } => {
                format!("lambda {}. {}", self.render_binder(*param), self.render(*body))
            }
            Node::Pi { param, body } => {
                format!("pi {}. {}", self.render_binder(*param), self.render(*body))
            }
            Node::App { func, arg } => format!("({} {})", self.render(*func), self.render(*arg)),
            Node::Extract { base, index } => format!("{}[{}]", self.render(*base), index),
            Node::Sigma(items) => format!("sigma({})", self.render_list(items)),
            Node::Tuple(items) => format!("({})", self.render_list(items)),
            Node::Assume { name, .. } => name.clone(),
            Node::Nominal { name, .. } => match name {
                Some(name) => name.clone(),
                None => format!("rec{}", node),
            },
        }
    }

    /// `lambda rec (x: T): R. B` for a nominal node, plain `render` otherwise
    pub fn render_definition(&self, node: NodeRef) -> String {
        match self.get(node) {
            Node::Nominal {
                param, ret, body, ..
            } => {
                let body = match body {
                    Some(body) => self.render(*body),
                    None => "?".to_string(),
                };
                format!(
                    "lambda rec ({}): {}. {}",
                    self.render_binder(*param),
                    self.render(*ret),
                    body
                )
            }
            _ => self.render(node),
        }
    }

    fn render_binder(&self, param: NodeRef) -> String {
        match self.get(param) {
            Node::Param { name, ty } => format!(
                "{}: {}",
                name.as_deref().unwrap_or("_"),
                self.render(*ty)
            ),
            _ => self.render(param),
        }
    }

    fn render_list(&self, items: &[NodeRef]) -> String {
        items
            .iter()
            .map(|item| self.render(*item))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nominal(arena: &mut AstArena) -> NodeRef {
        let nat = arena.constant(Constant::Nat);
        let param = arena.param(Some("x".into()), nat);
        arena.nominal(Some("f".into()), param, nat)
    }

    #[test]
    fn test_body_slot_filled_once() {
        let mut arena = AstArena::new();
        let f = nominal(&mut arena);
        assert_eq!(arena.body(f), Err(SlotError::Unfilled(f)));
        let body = arena.constant(Constant::Star);
        arena.set_body(f, body).unwrap();
        assert_eq!(arena.body(f), Ok(body));
        assert_eq!(arena.set_body(f, body), Err(SlotError::AlreadyFilled(f)));
    }

    #[test]
    fn test_set_body_rejects_other_nodes() {
        let mut arena = AstArena::new();
        let nat = arena.constant(Constant::Nat);
        assert_eq!(arena.set_body(nat, nat), Err(SlotError::NotNominal(nat)));
        assert_eq!(arena.body(nat), Err(SlotError::NotNominal(nat)));
    }

    #[test]
    fn test_render_self_reference_terminates() {
        let mut arena = AstArena::new();
        let f = nominal(&mut arena);
        let x = match arena.get(f) {
            Node::Nominal { param, .. } => *param,
            _ => unreachable!(),
        };
        let call = arena.app(f, x);
        arena.set_body(f, call).unwrap();
        assert_eq!(arena.render_definition(f), "lambda rec (x: Nat): Nat. (f x)");
        assert!(arena.unfilled().is_empty());
    }
}
