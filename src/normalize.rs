//! Desugaring pass
//!
//! Rewrites `A -> B` (an application carrying an arrow tail) into an
//! anonymous Pi. Children are rewritten before their parent, and the pass
//! is idempotent.

use std::rc::Rc;

use crate::ast::{Expr, Program, RecLambda, Spanned, Statement};

pub fn normalize_program(program: Program) -> Program {
    Program {
        statements: program
            .statements
            .into_iter()
            .map(|s| Spanned::new(normalize_statement(s.node), s.span))
            .collect(),
    }
}

pub fn normalize_statement(stmt: Statement) -> Statement {
    match stmt {
        Statement::Definition {
            name,
            type_only,
            body,
        } => Statement::Definition {
            name,
            type_only,
            body: normalize(body),
        },
        Statement::Assumption { name, ty } => Statement::Assumption {
            name,
            ty: normalize(ty),
        },
        comment @ Statement::Comment(_) => comment,
    }
}

fn boxed(expr: Box<Expr>) -> Box<Expr> {
    Box::new(normalize(*expr))
}

pub fn normalize(expr: Expr) -> Expr {
    match expr {
        Expr::Ident(_) | Expr::Const(_) => expr,
        Expr::Tuple(items) => Expr::Tuple(items.into_iter().map(normalize).collect()),
        Expr::Lambda { param, ty, body } => Expr::Lambda {
            param,
            ty: boxed(ty),
            body: boxed(body),
        },
        Expr::Pi { param, ty, body } => Expr::Pi {
            param,
            ty: boxed(ty),
            body: boxed(body),
        },
        Expr::RecLambda(rec) => {
            let rec = Rc::try_unwrap(rec).unwrap_or_else(|shared| (*shared).clone());
            Expr::RecLambda(Rc::new(RecLambda {
                name: rec.name,
                param: rec.param,
                ty: normalize(rec.ty),
                ret: normalize(rec.ret),
                body: normalize(rec.body),
            }))
        }
        Expr::Extract { base, indices } => Expr::Extract {
            base: boxed(base),
            indices,
        },
        Expr::SpecialApp { func, operand } => Expr::SpecialApp {
            func,
            operand: boxed(operand),
        },
        Expr::App { func, args, arrow } => {
            let func = boxed(func);
            let args: Vec<Expr> = args.into_iter().map(normalize).collect();
            match arrow {
                None => Expr::App {
                    func,
                    args,
                    arrow: None,
                },
                Some(target) => {
                    // Without arguments the application is just its head
                    let domain = if args.is_empty() {
                        *func
                    } else {
                        Expr::App {
                            func,
                            args,
                            arrow: None,
                        }
                    };
                    normalize(Expr::Pi {
                        param: None,
                        ty: Box::new(domain),
                        body: target,
                    })
                }
            }
        }
        Expr::Let { items, body } => Expr::Let {
            items: items.into_iter().map(normalize_statement).collect(),
            body: boxed(body),
        },
    }
}
