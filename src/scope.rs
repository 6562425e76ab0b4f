//! Lexical scopes with binding depth
//!
//! Entering any binder or let-block produces a new scope one level deeper.
//! Parameter bindings are copied into the new scope and addressed by
//! relative depth. Value definitions are addressed by name. A scope keeps
//! the definitions visible when it was created, and each level also has
//! one shared frame. Names missing from the copy fall back to the frames,
//! so a deferred recursive body sees a sibling defined later, while a
//! later redefinition never replaces a name the body already saw.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::Name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Parameter,
    Definition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding<T> {
    pub kind: BindingKind,
    pub ty: T,
    /// Depth of the scope that introduced the binding
    pub depth: usize,
}

/// How a name is referenced from a particular scope
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    /// Relative index: use-site depth minus binding depth
    Parameter { index: usize, ty: T },
    Definition { ty: T },
}

type Frame<T> = Rc<RefCell<HashMap<Name, Binding<T>>>>;

fn frame<T>() -> Frame<T> {
    Rc::new(RefCell::new(HashMap::new()))
}

#[derive(Debug, Clone)]
pub struct Scope<T> {
    params: Rc<HashMap<Name, Binding<T>>>,
    /// Definitions visible at creation plus those added to this scope
    defs: Rc<HashMap<Name, Binding<T>>>,
    /// Definition frames of every enclosing level, innermost last
    frames: Vec<Frame<T>>,
    depth: usize,
}

impl<T: Clone> Default for Scope<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Scope<T> {
    pub fn new() -> Self {
        Self {
            params: Rc::new(HashMap::new()),
            defs: Rc::new(HashMap::new()),
            frames: vec![frame()],
            depth: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// A copy of this scope one level deeper, with no new bindings
    pub fn push(&self) -> Self {
        let mut frames = self.frames.clone();
        frames.push(frame());
        Self {
            params: Rc::clone(&self.params),
            defs: Rc::clone(&self.defs),
            frames,
            depth: self.depth + 1,
        }
    }

    /// `push` plus a parameter bound at the new depth; `None` is the
    /// anonymous binder `_`
    pub fn push_param(&self, name: Option<&str>, ty: T) -> Self {
        let mut scope = self.push();
        if let Some(name) = name {
            let depth = scope.depth;
            Rc::make_mut(&mut scope.params).insert(
                name.to_string(),
                Binding {
                    kind: BindingKind::Parameter,
                    ty,
                    depth,
                },
            );
        }
        scope
    }

    /// The same bindings seen from another depth. Used to render a
    /// parameter's declared type at the place the parameter is used.
    pub fn rebased(&self, depth: usize) -> Self {
        Self {
            depth,
            ..self.clone()
        }
    }

    pub fn add_definition(&mut self, name: &str, ty: T) {
        let binding = Binding {
            kind: BindingKind::Definition,
            ty,
            depth: self.depth,
        };
        if let Some(frame) = self.frames.last() {
            frame.borrow_mut().insert(name.to_string(), binding.clone());
        }
        Rc::make_mut(&mut self.defs).insert(name.to_string(), binding);
    }

    pub fn lookup(&self, name: &str) -> Option<Binding<T>> {
        let param = self.params.get(name);
        let def = match self.defs.get(name) {
            Some(def) => Some(def.clone()),
            None => self
                .frames
                .iter()
                .rev()
                .find_map(|frame| frame.borrow().get(name).cloned()),
        };
        match (param, def) {
            (Some(param), Some(def)) if param.depth > def.depth => Some(param.clone()),
            (_, Some(def)) => Some(def),
            (Some(param), None) => Some(param.clone()),
            (None, None) => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn resolve(&self, name: &str) -> Option<Resolution<T>> {
        let binding = self.lookup(name)?;
        Some(match binding.kind {
            BindingKind::Parameter => {
                debug_assert!(binding.depth <= self.depth, "parameter bound below use site");
                Resolution::Parameter {
                    index: self.depth - binding.depth,
                    ty: binding.ty,
                }
            }
            BindingKind::Definition => Resolution::Definition { ty: binding.ty },
        })
    }

    /// Every visible name, for suggestions
    pub fn names(&self) -> Vec<Name> {
        let mut names: Vec<Name> = self.params.keys().cloned().collect();
        names.extend(self.defs.keys().cloned());
        for frame in &self.frames {
            names.extend(frame.borrow().keys().cloned());
        }
        names.sort();
        names.dedup();
        names
    }
}
