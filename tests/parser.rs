use pebble_lang::lexer::tokenize;
use pebble_lang::parser::{parse, BinaryOp, Expr, Stmt};

fn parse_expr(source: &str) -> Expr {
    let program = parse(tokenize(source).unwrap()).unwrap();
    match program.statements.as_slice() {
        [Stmt::Expression(expr)] => expr.clone(),
        other => panic!("expected a single expression statement, got {other:?}"),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    // 2+3*4+5 parses as (2 + (3*4)) + 5
    let expr = parse_expr("2+3*4+5");
    match expr {
        Expr::Binary { op: BinaryOp::Add, left, right } => {
            assert_eq!(*right, Expr::Integer(5));
            match *left {
                Expr::Binary { op: BinaryOp::Add, left, right } => {
                    assert_eq!(*left, Expr::Integer(2));
                    assert_eq!(
                        *right,
                        Expr::Binary {
                            op: BinaryOp::Mul,
                            left: Box::new(Expr::Integer(3)),
                            right: Box::new(Expr::Integer(4)),
                        }
                    );
                }
                other => panic!("expected the outer left to be an addition, got {other:?}"),
            }
        }
        other => panic!("expected a top-level addition, got {other:?}"),
    }
}

#[test]
fn same_precedence_binary_operators_are_left_associative() {
    // x*y/z parses as (x*y)/z
    let expr = parse_expr("x*y/z");
    match expr {
        Expr::Binary { op: BinaryOp::Div, left, right } => {
            assert_eq!(*right, Expr::Identifier("z".to_string()));
            assert_eq!(
                *left,
                Expr::Binary {
                    op: BinaryOp::Mul,
                    left: Box::new(Expr::Identifier("x".to_string())),
                    right: Box::new(Expr::Identifier("y".to_string())),
                }
            );
        }
        other => panic!("expected a top-level division, got {other:?}"),
    }
}

#[test]
fn assignment_is_right_associative() {
    // a=b=4 parses with a's value being the inner assignment b=4
    let expr = parse_expr("a=b=4");
    match expr {
        Expr::Assign { target, value } => {
            assert_eq!(*target, Expr::Identifier("a".to_string()));
            assert_eq!(
                *value,
                Expr::Assign {
                    target: Box::new(Expr::Identifier("b".to_string())),
                    value: Box::new(Expr::Integer(4)),
                }
            );
        }
        other => panic!("expected a top-level assignment, got {other:?}"),
    }
}

#[test]
fn dotted_and_bracketed_access_parse_to_the_same_node() {
    assert_eq!(parse_expr("x.a"), parse_expr(r#"x["a"]"#));
}

#[test]
fn statement_lists_tolerate_trailing_and_extra_semicolons() {
    let program = parse(tokenize("1;;2;;;").unwrap()).unwrap();
    assert_eq!(program.statements, vec![Stmt::Expression(Expr::Integer(1)), Stmt::Expression(Expr::Integer(2))]);
}

#[test]
fn a_block_terminated_statement_needs_no_semicolon_before_the_next_one() {
    let program = parse(tokenize("if (true) { 1 } 2").unwrap()).unwrap();
    assert_eq!(program.statements.len(), 2);
}

#[test]
fn a_function_statement_desugars_to_an_assignment() {
    let program = parse(tokenize("function f(x) { return x }").unwrap()).unwrap();
    match program.statements.as_slice() {
        [Stmt::Expression(Expr::Assign { target, value })] => {
            assert_eq!(**target, Expr::Identifier("f".to_string()));
            assert!(matches!(**value, Expr::Function { .. }));
        }
        other => panic!("expected function sugar to desugar to one assignment statement, got {other:?}"),
    }
}

#[test]
fn a_missing_closing_paren_is_a_parse_error() {
    assert!(parse(tokenize("(1+2").unwrap()).is_err());
}
