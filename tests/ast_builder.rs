//! Semantic AST builder tests

use lambda_frontend::ast::Constant;
use lambda_frontend::driver::{parse_program, FrontendError};
use lambda_frontend::scope::Scope;
use lambda_frontend::semantic::{AstBuilder, AstOutput, Node, NodeRef, Prelude, TranslateError};
use lambda_frontend::test_support::{ast, ast_with, rendered_definitions};
use pretty_assertions::assert_eq;

fn node(output: &AstOutput, name: &str) -> NodeRef {
    output
        .get(name)
        .unwrap_or_else(|| panic!("no definition named {}", name))
}

fn nominal_parts(output: &AstOutput, nominal: NodeRef) -> (NodeRef, NodeRef) {
    match output.arena.get(nominal) {
        Node::Nominal {
            param,
            body: Some(body),
            ..
        } => (*param, *body),
        other => panic!("expected a filled nominal node, got {:?}", other),
    }
}

// ============================================================================
// Definitions and lookups
// ============================================================================

#[test]
fn prelude_scenario() {
    let src = "define Nat = Nat;\n\
               assume n1: Nat;\n\
               assume opPlus: Nat -> Nat -> Nat;\n\
               define test = opPlus n1 n1;";
    let output = ast(src).unwrap();
    let names: Vec<&str> = output.definitions.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["Nat", "n1", "opPlus", "test"]);

    match output.arena.get(node(&output, "opPlus")) {
        Node::Assume { ty, .. } => {
            assert_eq!(output.arena.render(*ty), "pi _: Nat. pi _: Nat. Nat")
        }
        other => panic!("expected assumption, got {:?}", other),
    }

    // both arguments are the very node bound by `assume n1`
    let n1 = node(&output, "n1");
    match output.arena.get(node(&output, "test")) {
        Node::App { func, arg } => {
            assert_eq!(*arg, n1);
            assert!(matches!(output.arena.get(*func), Node::App { arg, .. } if *arg == n1));
        }
        other => panic!("expected application, got {:?}", other),
    }
}

#[test]
fn definitions_render_in_order() {
    assert_eq!(
        rendered_definitions("assume A: *; define id = lambda x: A. x;").unwrap(),
        vec![
            ("A".to_string(), "A".to_string()),
            ("id".to_string(), "lambda x: A. x".to_string()),
        ]
    );
}

#[test]
fn unknown_name_is_fatal() {
    let err = ast("define a = z;").unwrap_err();
    assert!(err.starts_with("unresolved value: z"), "{}", err);
}

#[test]
fn unknown_name_reports_suggestion() {
    let program = parse_program("assume count: Nat; define b = cuont;").unwrap();
    let err = lambda_frontend::driver::build_ast_program(&program, Prelude::new()).unwrap_err();
    match err {
        FrontendError::Translate {
            error: TranslateError::UnresolvedValue { suggestions, .. },
            span: Some(_),
        } => assert_eq!(suggestions, vec!["count".to_string()]),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn predefined_assumption_resolves_free_name() {
    let host = Prelude::new().with_assumption("z", Constant::Nat);
    let output = ast_with("define a = z;", host).unwrap();
    assert!(matches!(
        output.arena.get(node(&output, "a")),
        Node::Assume { name, .. } if name == "z"
    ));
}

#[test]
fn predefined_assumption_is_reused_by_assume() {
    let host = Prelude::new().with_assumption("zero", Constant::Nat);
    let output = ast_with("assume zero: Nat; define one = zero;", host).unwrap();
    assert_eq!(node(&output, "zero"), node(&output, "one"));
    assert!(matches!(
        output.arena.get(node(&output, "zero")),
        Node::Assume { name, .. } if name == "zero"
    ));
    // Nat plus the host's assumption; nothing allocated for the statement
    assert_eq!(output.arena.len(), 2);
}

#[test]
fn empty_let_is_its_body() {
    let output = ast("define n = Nat; define t = let in Nat end;").unwrap();
    assert_eq!(node(&output, "n"), node(&output, "t"));
}

#[test]
fn grouping_is_transparent() {
    let output = ast("assume A: *; define a = (A); define b = ((A));").unwrap();
    assert_eq!(node(&output, "a"), node(&output, "A"));
    assert_eq!(node(&output, "b"), node(&output, "A"));
}

#[test]
fn tuples_sigma_and_projection() {
    let defs = rendered_definitions(
        "define s = sigma (Nat, *);\n\
         define t = tuple (Nat, *);\n\
         assume p: sigma (Nat, Nat);\n\
         define q = p[1][0];",
    )
    .unwrap();
    assert_eq!(defs[0].1, "sigma(Nat, *)");
    assert_eq!(defs[1].1, "(Nat, *)");
    assert_eq!(defs[3].1, "p[1][0]");
}

#[test]
fn inner_parameter_shadows_outer() {
    let output = ast("define f = lambda x: Nat. lambda x: *. x;").unwrap();
    let Node::Lambda { body: inner, .. } = output.arena.get(node(&output, "f")) else {
        panic!("expected lambda");
    };
    match output.arena.get(*inner) {
        Node::Lambda { param, body } => assert_eq!(param, body),
        other => panic!("expected lambda, got {:?}", other),
    }
}

// ============================================================================
// Recursion
// ============================================================================

#[test]
fn mutual_recursion_resolves_forward_reference() {
    let output = ast(
        "define r1 = lambda rec (x: Nat): Nat. r2 x;\n\
         define r2 = lambda rec (y: Nat): Nat. r1 y;",
    )
    .unwrap();
    let (r1, r2) = (node(&output, "r1"), node(&output, "r2"));
    let (x, r1_body) = nominal_parts(&output, r1);
    let (y, r2_body) = nominal_parts(&output, r2);
    assert_eq!(output.arena.get(r1_body), &Node::App { func: r2, arg: x });
    assert_eq!(output.arena.get(r2_body), &Node::App { func: r1, arg: y });
}

#[test]
fn deferred_body_keeps_binding_seen_at_definition() {
    let defs = rendered_definitions(
        "assume A: *; assume B: *;\n\
         define a = A;\n\
         define f = lambda rec (x: Nat): Nat. a;\n\
         define a = B;",
    )
    .unwrap();
    let f = defs.iter().find(|(name, _)| name == "f").unwrap();
    assert_eq!(f.1, "lambda rec (x: Nat): Nat. A");
}

#[test]
fn self_name_under_definition_is_the_defined_node() {
    let output = ast("define f = lambda rec g (x: Nat): Nat. g x;").unwrap();
    let f = node(&output, "f");
    let (x, body) = nominal_parts(&output, f);
    assert_eq!(output.arena.get(body), &Node::App { func: f, arg: x });
}

#[test]
fn each_recursive_lambda_is_enqueued_once() {
    let program = parse_program(
        "define r1 = lambda rec (x: Nat): Nat. r2 x;\n\
         define r2 = lambda rec (y: Nat): Nat. r1 y;",
    )
    .unwrap();
    let mut builder = AstBuilder::new(Prelude::new());
    let mut scope = Scope::new();
    for stmt in program.statements() {
        builder.top_level(stmt, &mut scope).unwrap();
    }
    assert_eq!(builder.pending(), 2);
    assert_eq!(builder.definitions().len(), 2);
    builder.drain().unwrap();
    assert_eq!(builder.pending(), 0);
    assert_eq!(builder.enqueued(), 2);
    assert!(builder.arena().unfilled().is_empty());
}

#[test]
fn drain_reaches_nested_recursive_bodies() {
    let output = ast(
        "define outer = lambda rec (x: Nat): Nat.\n\
             (lambda rec inner (y: Nat): Nat. inner y) x;",
    )
    .unwrap();
    assert!(output.arena.unfilled().is_empty());
    let (_, body) = nominal_parts(&output, node(&output, "outer"));
    let Node::App { func: inner, .. } = output.arena.get(body) else {
        panic!("expected application");
    };
    assert_eq!(
        output.arena.render_definition(*inner),
        "lambda rec (y: Nat): Nat. (inner y)"
    );
}

#[test]
fn mutual_recursion_inside_let() {
    let output = ast(
        "assume n1: Nat;\n\
         define test3 = lambda n: Nat. let\n\
             define r1 = lambda rec (x: Nat): Nat. r2 x;\n\
             define r2 = lambda rec (y: Nat): Nat. r1 n1;\n\
         in (r1 n, r2 n) end;",
    )
    .unwrap();
    assert!(output.arena.unfilled().is_empty());
    assert_eq!(
        output.render("test3").unwrap(),
        "lambda n: Nat. ((rec#4 n), (rec#6 n))"
    );
}
