use super::*;
use rout_lexer::Lexer;

fn parse(src: &str) -> Program {
    let tokens = Lexer::new(src).tokenize();
    Parser::new(tokens).parse_program().expect("parse should succeed")
}

fn parse_err(src: &str) -> ParseError {
    let tokens = Lexer::new(src).tokenize();
    Parser::new(tokens)
        .parse_program()
        .expect_err("expected parse error")
}

/// Extract the single expression from `var _x is <expr>;`.
fn parse_expr(src: &str) -> Expr {
    let full = format!("var _x is {src};");
    let prog = parse(&full);
    match prog.declarations.into_iter().next().unwrap() {
        Declaration::Var(v) => v.initializer.unwrap(),
        other => panic!("expected VarDecl, got {other:?}"),
    }
}

#[test]
fn empty_program() {
    let prog = parse("");
    assert!(prog.declarations.is_empty());
}

#[test]
fn stray_semicolons_are_skipped() {
    let prog = parse(";;var x : integer;;;");
    assert_eq!(prog.declarations.len(), 1);
}

#[test]
fn var_with_type_only() {
    let prog = parse("var x : integer;");
    match &prog.declarations[0] {
        Declaration::Var(v) => {
            assert_eq!(v.name, "x");
            assert!(matches!(v.ty, Some(Type::Primitive(PrimitiveKind::Integer, _))));
            assert!(v.initializer.is_none());
        }
        other => panic!("expected Var, got {other:?}"),
    }
}

#[test]
fn var_with_initializer_only() {
    let prog = parse("var x is 42;");
    match &prog.declarations[0] {
        Declaration::Var(v) => {
            assert!(v.ty.is_none());
            assert!(matches!(v.initializer, Some(Expr::Int(42, _))));
        }
        other => panic!("expected Var, got {other:?}"),
    }
}

#[test]
fn type_alias() {
    let prog = parse("type money is integer;");
    match &prog.declarations[0] {
        Declaration::TypeAlias(t) => {
            assert_eq!(t.name, "money");
            assert!(matches!(t.aliased, Type::Primitive(PrimitiveKind::Integer, _)));
        }
        other => panic!("expected TypeAlias, got {other:?}"),
    }
}

#[test]
fn routine_with_body() {
    let prog = parse("routine main() is print 1 end");
    match &prog.declarations[0] {
        Declaration::Routine(r) => {
            assert_eq!(r.name, "main");
            assert!(r.parameters.is_empty());
            assert!(r.return_type.is_none());
            assert!(r.body.is_some());
            assert!(r.expression_body.is_none());
        }
        other => panic!("expected Routine, got {other:?}"),
    }
}

#[test]
fn routine_with_expression_body() {
    let prog = parse("routine twice(x : integer) : integer => x * 2;");
    match &prog.declarations[0] {
        Declaration::Routine(r) => {
            assert!(r.body.is_none());
            assert!(matches!(r.expression_body, Some(Expr::Binary { .. })));
            assert_eq!(r.parameters.len(), 1);
            assert!(!r.parameters[0].by_ref);
        }
        other => panic!("expected Routine, got {other:?}"),
    }
}

#[test]
fn ref_parameter() {
    let prog = parse("routine bump(ref n : integer) is n := n + 1 end");
    match &prog.declarations[0] {
        Declaration::Routine(r) => {
            assert!(r.parameters[0].by_ref);
            assert_eq!(r.parameters[0].name, "n");
        }
        other => panic!("expected Routine, got {other:?}"),
    }
}

#[test]
fn precedence_mul_over_add() {
    // 1 + 2 * 3 parses as 1 + (2 * 3)
    match parse_expr("1 + 2 * 3") {
        Expr::Binary { op: BinaryOp::Add, right, .. } => {
            assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
        }
        other => panic!("expected Add at top, got {other:?}"),
    }
}

#[test]
fn left_associativity() {
    // 10 - 3 - 2 parses as (10 - 3) - 2
    match parse_expr("10 - 3 - 2") {
        Expr::Binary { op: BinaryOp::Sub, left, right, .. } => {
            assert!(matches!(*left, Expr::Binary { op: BinaryOp::Sub, .. }));
            assert!(matches!(*right, Expr::Int(2, _)));
        }
        other => panic!("expected Sub at top, got {other:?}"),
    }
}

#[test]
fn comparison_below_and() {
    // a < b and c > d parses as (a < b) and (c > d)
    match parse_expr("a < b and c > d") {
        Expr::Binary { op: BinaryOp::And, left, right, .. } => {
            assert!(matches!(*left, Expr::Binary { op: BinaryOp::Less, .. }));
            assert!(matches!(*right, Expr::Binary { op: BinaryOp::Greater, .. }));
        }
        other => panic!("expected And at top, got {other:?}"),
    }
}

#[test]
fn unary_not_and_minus() {
    assert!(matches!(
        parse_expr("not true"),
        Expr::Unary { op: UnaryOp::Not, .. }
    ));
    match parse_expr("-(-5)") {
        Expr::Unary { op: UnaryOp::Neg, operand, .. } => {
            assert!(matches!(*operand, Expr::Unary { op: UnaryOp::Neg, .. }));
        }
        other => panic!("expected nested Neg, got {other:?}"),
    }
}

#[test]
fn parenthesized_expression() {
    // (1 + 2) * 3 parses as Mul with Add on the left
    match parse_expr("(1 + 2) * 3") {
        Expr::Binary { op: BinaryOp::Mul, left, .. } => {
            assert!(matches!(*left, Expr::Binary { op: BinaryOp::Add, .. }));
        }
        other => panic!("expected Mul at top, got {other:?}"),
    }
}

#[test]
fn array_literal() {
    match parse_expr("[1, 2, 3]") {
        Expr::ArrayLit { elements, .. } => assert_eq!(elements.len(), 3),
        other => panic!("expected ArrayLit, got {other:?}"),
    }
}

#[test]
fn record_literal() {
    match parse_expr("{name: \"Ann\", age: 30}") {
        Expr::RecordLit { fields, .. } => {
            assert_eq!(fields.len(), 2);
            assert_eq!(fields[0].name, "name");
            assert_eq!(fields[1].name, "age");
        }
        other => panic!("expected RecordLit, got {other:?}"),
    }
}

#[test]
fn access_chain_expression() {
    match parse_expr("arr[i + 1]") {
        Expr::Primary(mp) => {
            assert_eq!(mp.base, "arr");
            assert!(matches!(mp.accesses[0], Access::Index { .. }));
        }
        other => panic!("expected Primary, got {other:?}"),
    }
    match parse_expr("person.age") {
        Expr::Primary(mp) => {
            assert_eq!(mp.base, "person");
            match &mp.accesses[0] {
                Access::Field { name, .. } => assert_eq!(name, "age"),
                other => panic!("expected Field, got {other:?}"),
            }
        }
        other => panic!("expected Primary, got {other:?}"),
    }
}

#[test]
fn for_range_and_for_each() {
    let prog = parse("routine main() is for i in 1..5 loop print i end end");
    let Declaration::Routine(r) = &prog.declarations[0] else { panic!() };
    let body = r.body.as_ref().unwrap();
    match &body.elements[0] {
        BodyElement::Statement(Statement::For(f)) => {
            assert_eq!(f.variable, "i");
            assert!(!f.reverse);
            assert!(matches!(f.source, ForSource::Range { .. }));
        }
        other => panic!("expected For, got {other:?}"),
    }

    let prog = parse("routine main() is for x in arr loop print x end end");
    let Declaration::Routine(r) = &prog.declarations[0] else { panic!() };
    match &r.body.as_ref().unwrap().elements[0] {
        BodyElement::Statement(Statement::For(f)) => match &f.source {
            ForSource::Each { array, .. } => assert_eq!(array, "arr"),
            other => panic!("expected Each, got {other:?}"),
        },
        other => panic!("expected For, got {other:?}"),
    }
}

#[test]
fn for_reverse() {
    let prog = parse("routine main() is for i in 1..5 reverse loop print i end end");
    let Declaration::Routine(r) = &prog.declarations[0] else { panic!() };
    match &r.body.as_ref().unwrap().elements[0] {
        BodyElement::Statement(Statement::For(f)) => assert!(f.reverse),
        other => panic!("expected For, got {other:?}"),
    }
}

#[test]
fn for_each_over_non_identifier_is_rejected() {
    parse_err("routine main() is for x in 1 + 2 loop print x end end");
}

#[test]
fn return_with_and_without_value() {
    let prog = parse("routine f() : integer is return 1 end");
    let Declaration::Routine(r) = &prog.declarations[0] else { panic!() };
    match &r.body.as_ref().unwrap().elements[0] {
        BodyElement::Statement(Statement::Return(ret)) => assert!(ret.value.is_some()),
        other => panic!("expected Return, got {other:?}"),
    }

    let prog = parse("routine f() is return end");
    let Declaration::Routine(r) = &prog.declarations[0] else { panic!() };
    match &r.body.as_ref().unwrap().elements[0] {
        BodyElement::Statement(Statement::Return(ret)) => assert!(ret.value.is_none()),
        other => panic!("expected Return, got {other:?}"),
    }
}

#[test]
fn print_forms() {
    // bare list and parenthesized list both parse
    let prog = parse("routine main() is print 1, 2; print(3, 4) end");
    let Declaration::Routine(r) = &prog.declarations[0] else { panic!() };
    let body = r.body.as_ref().unwrap();
    match (&body.elements[0], &body.elements[1]) {
        (
            BodyElement::Statement(Statement::Print(a)),
            BodyElement::Statement(Statement::Print(b)),
        ) => {
            assert_eq!(a.expressions.len(), 2);
            assert_eq!(b.expressions.len(), 2);
        }
        other => panic!("expected two Print statements, got {other:?}"),
    }
}

#[test]
fn assignment_with_accesses() {
    let prog = parse("routine main() is arr[1] := 5; p.age := 31 end");
    let Declaration::Routine(r) = &prog.declarations[0] else { panic!() };
    let body = r.body.as_ref().unwrap();
    match &body.elements[0] {
        BodyElement::Statement(Statement::Assignment(a)) => {
            assert_eq!(a.target.base, "arr");
            assert!(matches!(a.target.accesses[0], Access::Index { .. }));
        }
        other => panic!("expected Assignment, got {other:?}"),
    }
}

#[test]
fn array_type_with_and_without_size() {
    let prog = parse("var a : array[4] integer; var b : array[] integer;");
    match &prog.declarations[0] {
        Declaration::Var(v) => match v.ty.as_ref().unwrap() {
            Type::Array { size, element, .. } => {
                assert!(size.is_some());
                assert!(matches!(**element, Type::Primitive(PrimitiveKind::Integer, _)));
            }
            other => panic!("expected Array, got {other:?}"),
        },
        other => panic!("expected Var, got {other:?}"),
    }
    match &prog.declarations[1] {
        Declaration::Var(v) => match v.ty.as_ref().unwrap() {
            Type::Array { size, .. } => assert!(size.is_none()),
            other => panic!("expected Array, got {other:?}"),
        },
        other => panic!("expected Var, got {other:?}"),
    }
}

#[test]
fn record_type() {
    let prog = parse("type person is record var name : string; var age : integer; end;");
    match &prog.declarations[0] {
        Declaration::TypeAlias(t) => match &t.aliased {
            Type::Record { fields, .. } => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].name, "name");
                assert_eq!(fields[1].name, "age");
            }
            other => panic!("expected Record, got {other:?}"),
        },
        other => panic!("expected TypeAlias, got {other:?}"),
    }
}

#[test]
fn user_type_reference() {
    let prog = parse("var p : person;");
    match &prog.declarations[0] {
        Declaration::Var(v) => match v.ty.as_ref().unwrap() {
            Type::User { name, .. } => assert_eq!(name, "person"),
            other => panic!("expected User, got {other:?}"),
        },
        other => panic!("expected Var, got {other:?}"),
    }
}

#[test]
fn xor_keyword_is_not_an_operator() {
    // reserved word, but no production consumes it
    parse_err("var x is true xor false;");
}

#[test]
fn error_token_is_rejected() {
    let err = parse_err("var x is @;");
    let message = err.to_string();
    assert!(message.contains("Parse error"), "got: {message}");
}

#[test]
fn missing_assign_is_rejected() {
    parse_err("routine main() is x 5 end");
}

#[test]
fn error_carries_location() {
    let err = parse_err("routine main() is\n    x := ;\nend");
    let message = err.to_string();
    assert!(message.contains("line 2"), "got: {message}");
}

#[test]
fn parse_is_deterministic() {
    let src = "routine main() is var x : integer is 5; print x + 1 end";
    let first = format!("{:?}", parse(src));
    let second = format!("{:?}", parse(src));
    assert_eq!(first, second);
}
