// tests/parser_tests.rs

use sluice::{
    ast::{BinOp, Expr, Plan, Stage, Terminal},
    lexer::Lexer,
    parser::{ParseError, Parser, parse_expression, parse_query},
};

fn plan(query: &str) -> Plan {
    Plan::from_query(&parse_query(query).unwrap()).unwrap()
}

fn plan_err(query: &str) -> String {
    Plan::from_query(&parse_query(query).unwrap()).unwrap_err().to_string()
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_comparison() {
    let expr = parse_expression("@[age] > 5").unwrap();

    assert!(matches!(
        expr,
        Expr::BinaryOp {
            op: BinOp::GreaterThan,
            ..
        }
    ));
}

#[test]
fn test_parentheses() {
    let expr = parse_expression("(1 + 2) * 3").unwrap();

    // Multiply(Add(1, 2), 3)
    match expr {
        Expr::BinaryOp {
            op: BinOp::Multiply,
            left,
            right,
        } => {
            assert!(matches!(*left, Expr::BinaryOp { op: BinOp::Add, .. }));
            assert_eq!(*right, Expr::Integer(3));
        }
        other => panic!("Expected multiplication, got {:?}", other),
    }
}

#[test]
fn test_and_binds_tighter_than_or() {
    let expr = parse_expression("true or false and false").unwrap();

    match expr {
        Expr::BinaryOp { op: BinOp::Or, right, .. } => {
            assert!(matches!(*right, Expr::BinaryOp { op: BinOp::And, .. }));
        }
        other => panic!("Expected or at the top, got {:?}", other),
    }
}

#[test]
fn test_dot_and_bracket_access_agree() {
    let dotted = parse_expression("@.name").unwrap();
    let bracketed = parse_expression("@[name]").unwrap();
    assert_eq!(dotted, bracketed);
}

#[test]
fn test_method_call() {
    let expr = parse_expression("@[books].any(@[published])").unwrap();

    match expr {
        Expr::MethodCall { method, args, .. } => {
            assert_eq!(method, "any");
            assert_eq!(args.len(), 1);
        }
        other => panic!("Expected method call, got {:?}", other),
    }
}

#[test]
fn test_not_keyword() {
    let expr = parse_expression("not @[active]").unwrap();
    assert!(matches!(expr, Expr::Not(_)));
}

#[test]
fn test_bang_is_rejected() {
    let err = parse_expression("!@[active]").unwrap_err();
    assert!(matches!(err, ParseError::Lex(_)));
}

#[test]
fn test_trailing_tokens_rejected() {
    assert!(parse_expression("1 2").is_err());
}

#[test]
fn test_parser_struct_api() {
    let mut parser = Parser::new(Lexer::new("$ | count")).unwrap();
    let query = parser.parse_query().unwrap();
    assert_eq!(query.stages.len(), 1);
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_query_must_start_with_dollar() {
    let err = parse_query("filter(@[age] > 5)").unwrap_err();
    assert!(matches!(err, ParseError::Unexpected { .. }));
}

#[test]
fn test_bare_source_collects() {
    let query = parse_query("$").unwrap();
    assert!(query.stages.is_empty());
    assert_eq!(plan("$").terminal, Terminal::Collect);
}

#[test]
fn test_stage_without_parens() {
    let plan = plan("$ | sort | count");

    assert_eq!(plan.stages, vec![Stage::Sort { key: None, descending: false }]);
    assert_eq!(plan.terminal, Terminal::Count);
}

#[test]
fn test_stage_positions() {
    let query = parse_query("$\n  | filter(@[a])").unwrap();
    let position = query.stages[0].position;
    assert_eq!(position.line, 2);
    assert_eq!(position.column, 5);
}

#[test]
fn test_plan_stages_in_order() {
    let plan = plan("$ | expand(@[books]) | filter(@[published]) | sort_desc(@[price]) | skip(1) | limit(2)");

    assert_eq!(plan.stages.len(), 5);
    assert!(matches!(plan.stages[0], Stage::Expand(_)));
    assert!(matches!(plan.stages[1], Stage::Filter(_)));
    assert!(matches!(plan.stages[2], Stage::Sort { key: Some(_), descending: true }));
    assert_eq!(plan.stages[3], Stage::Skip(1));
    assert_eq!(plan.stages[4], Stage::Limit(2));
}

#[test]
fn test_flat_map_alias() {
    let plan = plan("$ | flat_map(@[books])");
    assert!(matches!(plan.stages[0], Stage::Expand(_)));
}

#[test]
fn test_terminals() {
    assert_eq!(plan("$ | avg").terminal, Terminal::Average(None));
    assert!(matches!(plan("$ | average(@[price])").terminal, Terminal::Average(Some(_))));
    assert!(matches!(plan("$ | sum(@[price])").terminal, Terminal::Sum(Some(_))));
    assert!(matches!(plan("$ | group_by(@[age])").terminal, Terminal::GroupBy(_)));
    assert!(matches!(plan("$ | partition_by(@[active])").terminal, Terminal::PartitionBy(_)));
    assert!(matches!(plan("$ | any_match(@[active])").terminal, Terminal::AnyMatch(_)));
    assert!(matches!(plan("$ | all_match(@[active])").terminal, Terminal::AllMatch(_)));
    assert_eq!(plan("$ | join").terminal, Terminal::Join(String::new()));
    assert_eq!(plan("$ | join(\", \")").terminal, Terminal::Join(", ".to_string()));
}

// ============================================================================
// Invalid arguments
// ============================================================================

#[test]
fn test_filter_without_predicate() {
    let err = plan_err("$ | filter()");
    assert!(err.starts_with("Invalid argument: filter() requires a predicate"), "{}", err);
}

#[test]
fn test_group_by_without_key() {
    assert!(plan_err("$ | group_by").contains("requires a key extractor"));
}

#[test]
fn test_unknown_stage() {
    assert!(plan_err("$ | explode(@[a])").contains("unknown stage 'explode'"));
}

#[test]
fn test_terminal_must_be_last() {
    assert!(plan_err("$ | count | filter(@[a])").contains("must be the last stage"));
}

#[test]
fn test_bad_counts() {
    assert!(plan_err("$ | limit(-1)").contains("non-negative integer"));
    assert!(plan_err("$ | skip(\"two\")").contains("non-negative integer"));
    assert!(plan_err("$ | limit").contains("requires a count"));
}

#[test]
fn test_too_many_arguments() {
    assert!(plan_err("$ | map(@[a], @[b])").contains("at most 1"));
    assert!(plan_err("$ | count(@[a])").contains("at most 0"));
}

#[test]
fn test_join_separator_must_be_literal() {
    assert!(plan_err("$ | join(@[sep])").contains("string literal"));
}
