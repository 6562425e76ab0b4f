//! Program to arena translation with a deferred-body worklist

use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use super::{AstArena, Node, NodeRef, Prelude, SemanticHost, TranslateError};
use crate::ast::{Constant, Expr, Name, RecLambda, SpecialFn, Statement};
use crate::errors::find_similar;
use crate::scope::{Resolution, Scope};

/// Parameters bind their `Param` node, definitions the defined node
pub type AstScope = Scope<NodeRef>;

/// A recursive body waiting to be translated
#[derive(Debug)]
struct Task {
    source: Rc<RecLambda>,
    scope: AstScope,
    /// Receives the translated body
    nominal: NodeRef,
}

#[derive(Debug)]
pub struct AstBuilder<H = Prelude> {
    arena: AstArena,
    host: H,
    queue: VecDeque<Task>,
    /// Recursive lambdas already enqueued, by node identity
    seen: HashSet<*const RecLambda>,
    definitions: Vec<(Name, NodeRef)>,
}

/// Top-level definitions in statement order, over a fully drained arena
#[derive(Debug)]
pub struct AstOutput<H = Prelude> {
    pub arena: AstArena,
    pub definitions: Vec<(Name, NodeRef)>,
    pub host: H,
}

impl<H> AstOutput<H> {
    pub fn get(&self, name: &str) -> Option<NodeRef> {
        self.definitions
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, node)| *node)
    }

    pub fn render(&self, name: &str) -> Option<String> {
        self.get(name).map(|node| self.arena.render_definition(node))
    }
}

impl Default for AstBuilder<Prelude> {
    fn default() -> Self {
        Self::new(Prelude::new())
    }
}

impl<H: SemanticHost> AstBuilder<H> {
    pub fn new(host: H) -> Self {
        Self {
            arena: AstArena::new(),
            host,
            queue: VecDeque::new(),
            seen: HashSet::new(),
            definitions: Vec::new(),
        }
    }

    pub fn arena(&self) -> &AstArena {
        &self.arena
    }

    pub fn definitions(&self) -> &[(Name, NodeRef)] {
        &self.definitions
    }

    /// Bodies waiting in the worklist
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Distinct recursive lambdas ever enqueued
    pub fn enqueued(&self) -> usize {
        self.seen.len()
    }

    /// Translate a top-level statement and record what it defines
    pub fn top_level(
        &mut self,
        stmt: &Statement,
        scope: &mut AstScope,
    ) -> Result<(), TranslateError> {
        let defined = self.statement(stmt, scope)?;
        self.definitions.extend(defined);
        Ok(())
    }

    /// Zero or one `(name, node)` pairs; the name is bound in `scope`
    pub fn statement(
        &mut self,
        stmt: &Statement,
        scope: &mut AstScope,
    ) -> Result<Option<(Name, NodeRef)>, TranslateError> {
        let (name, node) = match stmt {
            Statement::Definition { name, body, .. } => {
                let node = match body.ungrouped() {
                    // The body may refer to the definition by name
                    Expr::RecLambda(rec) => self.rec_lambda(rec, scope, Some(name.as_str()))?,
                    other => self.expr(other, scope)?,
                };
                (name, node)
            }
            Statement::Assumption { name, ty } => {
                let predefined = if self.host.has_predefined_assumption(name) {
                    self.host.assumption(name, &mut self.arena)
                } else {
                    None
                };
                let node = match predefined {
                    Some(node) => node,
                    None => {
                        let ty = self.expr(ty, scope)?;
                        self.arena.assume(name.clone(), ty)
                    }
                };
                (name, node)
            }
            Statement::Comment(_) => return Ok(None),
        };
        scope.add_definition(name, node);
        Ok(Some((name.clone(), node)))
    }

    /// Translate queued bodies until none remain. Bodies may enqueue more.
    pub fn drain(&mut self) -> Result<(), TranslateError> {
        while let Some(task) = self.queue.pop_front() {
            tracing::trace!(nominal = %task.nominal, remaining = self.queue.len(), "translating deferred body");
            let mut scope = task.scope;
            let body = self.expr(&task.source.body, &mut scope)?;
            self.arena.set_body(task.nominal, body)?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<AstOutput<H>, TranslateError> {
        self.drain()?;
        tracing::debug!(
            nodes = self.arena.len(),
            definitions = self.definitions.len(),
            "semantic tree complete"
        );
        Ok(AstOutput {
            arena: self.arena,
            definitions: self.definitions,
            host: self.host,
        })
    }

    fn ident(&mut self, name: &Name, scope: &AstScope) -> Result<NodeRef, TranslateError> {
        match scope.resolve(name) {
            Some(Resolution::Parameter { ty, .. }) | Some(Resolution::Definition { ty }) => Ok(ty),
            None => {
                if let Some(node) = self.host.assumption(name, &mut self.arena) {
                    return Ok(node);
                }
                if let Some(node) = self.host.constant(name, &mut self.arena) {
                    return Ok(node);
                }
                let names = scope.names();
                Err(TranslateError::UnresolvedValue {
                    name: name.clone(),
                    suggestions: find_similar(name, names.iter().map(String::as_str), 2),
                })
            }
        }
    }

    fn constant(&mut self, constant: Constant, scope: &AstScope) -> Result<NodeRef, TranslateError> {
        if let Some(Resolution::Definition { ty } | Resolution::Parameter { ty, .. }) =
            scope.resolve(constant.name())
        {
            return Ok(ty);
        }
        self.host
            .constant(constant.name(), &mut self.arena)
            .ok_or_else(|| TranslateError::UnknownConstant(constant.name().to_string()))
    }

    /// Binder shared by lambda, pi and recursive lambda
    fn bind(
        &mut self,
        param: &Option<Name>,
        ty: &Expr,
        scope: &mut AstScope,
    ) -> Result<(NodeRef, AstScope), TranslateError> {
        let ty = self.expr(ty, scope)?;
        let param_node = self.arena.param(param.clone(), ty);
        Ok((param_node, scope.push_param(param.as_deref(), param_node)))
    }

    fn rec_lambda(
        &mut self,
        rec: &Rc<RecLambda>,
        scope: &mut AstScope,
        declared_as: Option<&str>,
    ) -> Result<NodeRef, TranslateError> {
        let (param, mut inner) = self.bind(&rec.param, &rec.ty, scope)?;
        let ret = self.expr(&rec.ret, &mut inner.clone())?;
        let nominal = self.arena.nominal(rec.name.clone(), param, ret);
        for name in declared_as.into_iter().chain(rec.name.as_deref()) {
            scope.add_definition(name, nominal);
            inner.add_definition(name, nominal);
        }
        if self.seen.insert(Rc::as_ptr(rec)) {
            tracing::trace!(%nominal, "enqueueing recursive body");
            self.queue.push_back(Task {
                source: Rc::clone(rec),
                scope: inner,
                nominal,
            });
        }
        Ok(nominal)
    }

    pub fn expr(&mut self, expr: &Expr, scope: &mut AstScope) -> Result<NodeRef, TranslateError> {
        match expr {
            Expr::Ident(name) => self.ident(name, scope),
            Expr::Const(constant) => self.constant(*constant, scope),
            Expr::Tuple(items) if items.len() == 1 => self.expr(&items[0], scope),
            Expr::Tuple(items) => {
                let nodes = items
                    .iter()
                    .map(|item| self.expr(item, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.arena.tuple(nodes))
            }
            Expr::Lambda { param, ty, body } => {
                let (param, mut inner) = self.bind(param, ty, scope)?;
                let body = self.expr(body, &mut inner)?;
                Ok(self.arena.lambda(param, body))
            }
            Expr::Pi { param, ty, body } => {
                let (param, mut inner) = self.bind(param, ty, scope)?;
                let body = self.expr(body, &mut inner)?;
                Ok(self.arena.pi(param, body))
            }
            Expr::RecLambda(rec) => self.rec_lambda(rec, scope, None),
            Expr::Extract { base, indices } => {
                let mut node = self.expr(base, scope)?;
                for index in indices {
                    node = self.arena.extract(node, *index);
                }
                Ok(node)
            }
            Expr::SpecialApp { func, operand } => {
                let operand = self.expr(operand, scope)?;
                match func {
                    SpecialFn::Sigma => {
                        let items = match self.arena.get(operand) {
                            Node::Tuple(items) => items.clone(),
                            _ => vec![operand],
                        };
                        Ok(self.arena.sigma(items))
                    }
                    SpecialFn::Tuple => Ok(operand),
                }
            }
            Expr::App { arrow: Some(_), .. } => {
                unreachable!("arrow sugar should be normalized before translation")
            }
            Expr::App { func, args, .. } => {
                let mut node = self.expr(func, scope)?;
                for arg in args {
                    let arg = self.expr(arg, scope)?;
                    node = self.arena.app(node, arg);
                }
                Ok(node)
            }
            Expr::Let { items, body } => {
                let mut inner = scope.push();
                for item in items {
                    self.statement(item, &mut inner)?;
                }
                self.expr(body, &mut inner)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::normalize::normalize;
    use crate::parser::Parser;

    fn build(input: &str) -> Result<(NodeRef, AstBuilder), TranslateError> {
        let tokens = Lexer::new(input).tokenize().unwrap();
        let expr = normalize(Parser::new(tokens).parse_expr().unwrap());
        let mut builder = AstBuilder::new(Prelude::new());
        let node = builder.expr(&expr, &mut Scope::new())?;
        builder.drain()?;
        Ok((node, builder))
    }

    #[test]
    fn test_parameter_reference_is_binding_node() {
        let (node, builder) = build("lambda x: Nat. x").unwrap();
        match builder.arena().get(node) {
            Node::Lambda { param, body } => assert_eq!(param, body),
            other => panic!("expected lambda, got {:?}", other),
        }
    }

    #[test]
    fn test_sigma_takes_tuple_elements() {
        let (node, builder) = build("sigma (Nat, *)").unwrap();
        assert_eq!(builder.arena().render(node), "sigma(Nat, *)");
    }

    #[test]
    fn test_self_reference_through_name() {
        let (node, builder) = build("lambda rec f (n: Nat): Nat. f n").unwrap();
        assert_eq!(
            builder.arena().render_definition(node),
            "lambda rec (n: Nat): Nat. (f n)"
        );
        assert_eq!(builder.enqueued(), 1);
        assert_eq!(builder.pending(), 0);
    }

    #[test]
    fn test_unresolved_value_is_fatal() {
        let err = build("lambda count: Nat. cuont").unwrap_err();
        assert_eq!(
            err,
            TranslateError::UnresolvedValue {
                name: "cuont".into(),
                suggestions: vec!["count".into()],
            }
        );
    }

    #[test]
    #[should_panic(expected = "arrow sugar should be normalized")]
    fn test_arrow_sugar_must_be_desugared_first() {
        let tokens = Lexer::new("Nat -> Nat").tokenize().unwrap();
        let expr = Parser::new(tokens).parse_expr().unwrap();
        let mut builder = AstBuilder::new(Prelude::new());
        let _ = builder.expr(&expr, &mut Scope::new());
    }
}
