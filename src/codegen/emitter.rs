//! Expression and statement lowering to builder calls
//!
//! Parameters are referenced as `w.var(type, index, "name")`, where the
//! index counts scope levels between use and binding site. Definitions and
//! assumptions are referenced by their variable name. Identifiers that
//! resolve to nothing are emitted verbatim and reported once.
//!
//! A recursive lambda is declared as a bodyless placeholder right away;
//! its `set` instruction waits in the log until every name its body
//! mentioned without resolving has been declared.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use super::log::InstructionLog;
use super::{Emission, Warning};
use crate::ast::{Constant, Expr, Name, RecLambda, SpecialFn, Statement};
use crate::config::EmitterConfig;
use crate::scope::{Resolution, Scope};

/// Declared type of a parameter, with the scope its type was written in
#[derive(Debug, Clone)]
pub struct Declared {
    pub ty: Expr,
    pub site: EmitScope,
    /// Rendered type and its unresolved names, keyed by use-site depth
    rendered: Rc<RefCell<HashMap<usize, (String, Vec<Name>)>>>,
}

impl Declared {
    pub fn new(ty: Expr, site: EmitScope) -> Self {
        Self {
            ty,
            site,
            rendered: Rc::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum EmitBinding {
    Param(Declared),
    /// Definition or assumption, rendered as this variable
    Value(Name),
}

pub type EmitScope = Scope<EmitBinding>;

#[derive(Debug, Clone, Copy, Default)]
struct Ctx {
    /// Position accepts a bare `{a, b}` aggregate
    inline_tuple: bool,
}

const INLINE: Ctx = Ctx { inline_tuple: true };

pub struct Emitter {
    config: EmitterConfig,
    log: InstructionLog,
    temp_counter: usize,
    /// Unresolved names outside recursive bodies, first-seen order
    unknown: Vec<Name>,
}

impl Emitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self {
            config,
            log: InstructionLog::new(),
            temp_counter: 0,
            unknown: Vec::new(),
        }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn log(&self) -> &InstructionLog {
        &self.log
    }

    /// Lower one top-level statement, including its print instructions
    pub fn statement(&mut self, stmt: &Statement, scope: &mut EmitScope) {
        let mut unresolved = Vec::new();
        match stmt {
            Statement::Definition { name, body, .. } => {
                self.definition(name, body, scope, &mut unresolved);
                let value = format!("{}({});", self.config.print_value, name);
                let ty = format!("{}({});", self.config.print_type, name);
                self.log.instruction(value);
                self.log.instruction(ty);
            }
            Statement::Assumption { name, ty } => {
                self.assumption(name, ty, scope, &mut unresolved);
                let print = format!("{}({});", self.config.print_type, name);
                self.log.instruction(print);
            }
            Statement::Comment(_) => {}
        }
        self.record_unknown(unresolved);
    }

    /// Flush satisfied deferred instructions and separate statements
    pub fn end_statement(&mut self) {
        self.log.progress();
        self.log.blank();
    }

    /// Final flush. Instructions still waiting are dropped with a warning.
    pub fn finish(mut self) -> Emission {
        self.end_statement();
        let (lines, pending) = self.log.into_parts();

        let mut warnings: Vec<Warning> = self
            .unknown
            .into_iter()
            .map(Warning::UnknownIdentifier)
            .collect();
        warnings.extend(pending.into_iter().map(|entry| Warning::PendingForwardReference {
            instruction: entry.inst,
            waiting_on: entry.depends.into_iter().collect(),
        }));
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
        Emission::new(lines, warnings, self.config.indent)
    }

    fn record_unknown(&mut self, names: Vec<Name>) {
        for name in names {
            if !self.unknown.contains(&name) {
                tracing::debug!(%name, "unresolved identifier");
                self.unknown.push(name);
            }
        }
    }

    fn fresh_name(&mut self) -> Name {
        self.temp_counter += 1;
        format!("{}{}", self.config.temp_prefix, self.temp_counter)
    }

    fn definition(
        &mut self,
        name: &str,
        body: &Expr,
        scope: &mut EmitScope,
        unresolved: &mut Vec<Name>,
    ) {
        self.log.comment(format!("// {} := {}", name, body));
        match body.ungrouped() {
            // Declares `name` itself as the placeholder
            Expr::RecLambda(rec) => {
                self.rec_lambda(rec, scope, Some(name), unresolved);
            }
            other => {
                let term = self.expr(other, scope, Ctx::default(), unresolved);
                scope.add_definition(name, EmitBinding::Value(name.to_string()));
                self.log.declare(name, format!("auto {} = {};", name, term));
            }
        }
    }

    fn assumption(
        &mut self,
        name: &str,
        ty: &Expr,
        scope: &mut EmitScope,
        unresolved: &mut Vec<Name>,
    ) {
        self.log.comment(format!("// assume {}: {}", name, ty));
        let ty = self.expr(ty, scope, Ctx::default(), unresolved);
        scope.add_definition(name, EmitBinding::Value(name.to_string()));
        let decl = format!(
            "auto {} = {}.assume({}, {:?});",
            name, self.config.world, ty, name
        );
        self.log.declare(name, decl);
    }

    fn rec_lambda(
        &mut self,
        rec: &RecLambda,
        scope: &mut EmitScope,
        declared_as: Option<&str>,
        unresolved: &mut Vec<Name>,
    ) -> String {
        let param_ty = self.expr(&rec.ty, scope, INLINE, unresolved);
        let mut inner = scope.push_param(
            rec.param.as_deref(),
            EmitBinding::Param(Declared::new(rec.ty.clone(), scope.clone())),
        );
        let ret_ty = self.expr(&rec.ret, &mut inner.clone(), Ctx::default(), unresolved);

        let mut placeholder = format!("{}.lambda_rec({}, {}", self.config.world, param_ty, ret_ty);
        if let Some(name) = &rec.name {
            placeholder.push_str(&format!(", {:?}", name));
        }
        placeholder.push(')');

        let var = match declared_as.or(rec.name.as_deref()) {
            Some(name) => name.to_string(),
            None => self.fresh_name(),
        };
        self.log
            .declare(&var, format!("auto {} = {};", var, placeholder));
        // Both the definition name and the self-name render as `var`
        for name in declared_as.into_iter().chain(rec.name.as_deref()) {
            scope.add_definition(name, EmitBinding::Value(var.clone()));
            inner.add_definition(name, EmitBinding::Value(var.clone()));
        }

        let mut depends = Vec::new();
        let body = self.expr(&rec.body, &mut inner, Ctx::default(), &mut depends);
        let depends: BTreeSet<Name> = depends.into_iter().collect();
        self.log
            .add_depending(format!("{}->set({});", var, body), depends);
        var
    }

    fn ident(&mut self, name: &Name, scope: &EmitScope, unresolved: &mut Vec<Name>) -> String {
        match scope.resolve(name) {
            None => {
                unresolved.push(name.clone());
                name.clone()
            }
            Some(Resolution::Parameter {
                index,
                ty: EmitBinding::Param(declared),
            }) => {
                let ty = self.declared_type(&declared, scope.depth(), unresolved);
                format!("{}.var({}, {}, {:?})", self.config.world, ty, index, name)
            }
            Some(Resolution::Definition {
                ty: EmitBinding::Value(var),
            }) => var,
            Some(_) => name.clone(),
        }
    }

    /// A parameter's type as seen from `depth`, translated once per depth
    fn declared_type(
        &mut self,
        declared: &Declared,
        depth: usize,
        unresolved: &mut Vec<Name>,
    ) -> String {
        if let Some((text, missing)) = declared.rendered.borrow().get(&depth) {
            unresolved.extend(missing.iter().cloned());
            return text.clone();
        }
        let mut missing = Vec::new();
        let mut site = declared.site.rebased(depth);
        let text = self.expr(&declared.ty, &mut site, INLINE, &mut missing);
        unresolved.extend(missing.iter().cloned());
        declared
            .rendered
            .borrow_mut()
            .insert(depth, (text.clone(), missing));
        text
    }

    fn expr(
        &mut self,
        expr: &Expr,
        scope: &mut EmitScope,
        ctx: Ctx,
        unresolved: &mut Vec<Name>,
    ) -> String {
        let w = self.config.world.clone();
        match expr {
            Expr::Ident(name) => self.ident(name, scope, unresolved),
            Expr::Const(Constant::Star) => format!("{}.star()", w),
            Expr::Const(Constant::Nat) => {
                if scope.contains("Nat") {
                    "Nat".to_string()
                } else {
                    format!("{}.nat()", w)
                }
            }
            Expr::Tuple(items) if items.len() == 1 => self.expr(&items[0], scope, ctx, unresolved),
            Expr::Tuple(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| self.expr(item, scope, Ctx::default(), unresolved))
                    .collect();
                let aggregate = format!("{{{}}}", parts.join(", "));
                if ctx.inline_tuple {
                    aggregate
                } else {
                    format!("{}.tuple({})", w, aggregate)
                }
            }
            Expr::Lambda { param, ty, body } | Expr::Pi { param, ty, body } => {
                let builder = if matches!(expr, Expr::Lambda { .. }) {
                    "lambda"
                } else {
                    "pi"
                };
                let param_ty = self.expr(ty, scope, INLINE, unresolved);
                let mut inner = scope.push_param(
                    param.as_deref(),
                    EmitBinding::Param(Declared::new((**ty).clone(), scope.clone())),
                );
                let body = self.expr(body, &mut inner, Ctx::default(), unresolved);
                format!("{}.{}({}, {})", w, builder, param_ty, body)
            }
            Expr::RecLambda(rec) => self.rec_lambda(rec, scope, None, unresolved),
            Expr::Extract { base, indices } => {
                let mut term = self.expr(base, scope, Ctx::default(), unresolved);
                for index in indices {
                    term = format!("{}.extract({}, {})", w, term, index);
                }
                term
            }
            Expr::SpecialApp { func, operand } => {
                let operand = self.expr(operand, scope, INLINE, unresolved);
                match func {
                    SpecialFn::Sigma => format!("{}.sigma({})", w, operand),
                    SpecialFn::Tuple => format!("{}.tuple({})", w, operand),
                }
            }
            Expr::App { arrow: Some(_), .. } => {
                unreachable!("arrow sugar should be normalized before lowering")
            }
            Expr::App { func, args, .. } if args.is_empty() => {
                self.expr(func, scope, ctx, unresolved)
            }
            Expr::App { func, args, .. } => {
                let mut term = self.expr(func, scope, Ctx::default(), unresolved);
                for arg in args {
                    let arg = self.expr(arg, scope, INLINE, unresolved);
                    term = format!("{}.app({}, {})", w, term, arg);
                }
                term
            }
            Expr::Let { items, body } => {
                let mut inner = scope.push();
                for item in items {
                    match item {
                        Statement::Definition { name, body, .. } => {
                            self.definition(name, body, &mut inner, unresolved)
                        }
                        Statement::Assumption { name, ty } => {
                            self.assumption(name, ty, &mut inner, unresolved)
                        }
                        Statement::Comment(_) => {}
                    }
                }
                self.expr(body, &mut inner, Ctx::default(), unresolved)
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

    fn emit_expr(input: &str) -> (String, Vec<Name>) {
        let tokens = Lexer::new(input).tokenize().unwrap();
        let expr = normalize(Parser::new(tokens).parse_expr().unwrap());
        let mut emitter = Emitter::new(EmitterConfig::default());
        let mut unresolved = Vec::new();
        let text = emitter.expr(&expr, &mut Scope::new(), Ctx::default(), &mut unresolved);
        (text, unresolved)
    }

    #[test]
    fn test_constants() {
        assert_eq!(emit_expr("*").0, "w.star()");
        assert_eq!(emit_expr("Nat").0, "w.nat()");
    }

    #[test]
    fn test_lambda_parameter_reference() {
        assert_eq!(
            emit_expr("lambda x: Nat. x").0,
            r#"w.lambda(w.nat(), w.var(w.nat(), 0, "x"))"#
        );
    }

    #[test]
    fn test_index_counts_intervening_binders() {
        assert_eq!(
            emit_expr("lambda x: Nat. lambda y: Nat. x").0,
            r#"w.lambda(w.nat(), w.lambda(w.nat(), w.var(w.nat(), 1, "x")))"#
        );
    }

    #[test]
    fn test_dependent_parameter_type_is_shifted_to_use_site() {
        // `y: x` refers to x at index 0 where it is written, 1 where y is used
        assert_eq!(
            emit_expr("lambda x: *. lambda y: x. y").0,
            concat!(
                r#"w.lambda(w.star(), w.lambda(w.var(w.star(), 0, "x"), "#,
                r#"w.var(w.var(w.star(), 1, "x"), 0, "y")))"#
            )
        );
    }

    #[test]
    fn test_tuple_inline_only_where_accepted() {
        assert_eq!(emit_expr("(Nat, *)").0, "w.tuple({w.nat(), w.star()})");
        assert_eq!(
            emit_expr("sigma (Nat, *)").0,
            "w.sigma({w.nat(), w.star()})"
        );
        assert_eq!(emit_expr("f (Nat, *)").0, "w.app(f, {w.nat(), w.star()})");
    }

    #[test]
    fn test_extract_chain_left_to_right() {
        assert_eq!(emit_expr("p[0][1]").0, "w.extract(w.extract(p, 0), 1)");
    }

    #[test]
    fn test_application_folds_left() {
        let (text, unresolved) = emit_expr("f a b");
        assert_eq!(text, "w.app(w.app(f, a), b)");
        assert_eq!(unresolved, vec!["f", "a", "b"]);
    }

    #[test]
    fn test_anonymous_rec_lambda_gets_temporary_name() {
        let tokens = Lexer::new("lambda rec (n: Nat): Nat. n").tokenize().unwrap();
        let expr = Parser::new(tokens).parse_expr().unwrap();
        let mut emitter = Emitter::new(EmitterConfig::default());
        let mut unresolved = Vec::new();
        let text = emitter.expr(&expr, &mut Scope::new(), Ctx::default(), &mut unresolved);
        assert_eq!(text, "lbl_tmp_1");
        let lines: Vec<&str> = emitter.log().lines().iter().map(|l| l.text()).collect();
        assert_eq!(
            lines,
            vec![
                "auto lbl_tmp_1 = w.lambda_rec(w.nat(), w.nat());",
                r#"lbl_tmp_1->set(w.var(w.nat(), 0, "n"));"#,
            ]
        );
    }

    #[test]
    #[should_panic(expected = "arrow sugar should be normalized")]
    fn test_arrow_sugar_must_be_desugared_first() {
        let tokens = Lexer::new("Nat -> Nat").tokenize().unwrap();
        let expr = Parser::new(tokens).parse_expr().unwrap();
        let mut emitter = Emitter::new(EmitterConfig::default());
        emitter.expr(&expr, &mut Scope::new(), Ctx::default(), &mut Vec::new());
    }
}
