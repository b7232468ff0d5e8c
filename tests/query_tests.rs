// tests/query_tests.rs

use std::collections::BTreeMap;

use serde_json::json;
use sluice::{
    AbsentPolicy, EvalError, Evaluator, PipelineError, Value,
    cli::json_to_value,
    parser::{parse_expression, parse_query},
};

fn users() -> Value {
    json_to_value(json!([
        {"name": "Seven", "age": 7, "active": true},
        {"name": "Four", "age": 4, "active": false},
        {"name": "Eleven", "age": 11, "active": true},
        {"name": "Three", "age": 3, "active": true},
        {"name": "Nine", "age": 9, "active": false},
        {"name": "One", "age": 1, "active": true},
        {"name": "Twelve", "age": 12, "active": true}
    ]))
}

fn library() -> Value {
    json_to_value(json!([
        {"name": "Author A", "active": true, "books": [
            {"name": "A1", "price": 100, "published": true},
            {"name": "A2", "price": 200, "published": true},
            {"name": "A3", "price": 220, "published": true}
        ]},
        {"name": "Author B", "active": true, "books": [
            {"name": "B1", "price": 80, "published": true},
            {"name": "B2", "price": 80, "published": false},
            {"name": "B3", "price": 190, "published": true},
            {"name": "B4", "price": 210, "published": true}
        ]},
        {"name": "Author C", "active": true, "books": [
            {"name": "C1", "price": 110, "published": true},
            {"name": "C2", "price": 120, "published": false},
            {"name": "C3", "price": 130, "published": true}
        ]},
        {"name": "Author D", "active": false, "books": [
            {"name": "D1", "price": 200, "published": true},
            {"name": "D2", "price": 300, "published": false}
        ]},
        {"name": "Author X", "active": true, "books": []}
    ]))
}

fn eval_query(query: &str, input: Value) -> Result<Value, EvalError> {
    let query = parse_query(query).expect("query should parse");
    Evaluator::new().eval_query(&query, input)
}

fn eval_with(policy: AbsentPolicy, query: &str, input: Value) -> Result<Value, EvalError> {
    let query = parse_query(query).expect("query should parse");
    Evaluator::with_absent_policy(policy).eval_query(&query, input)
}

fn eval_expr(expr: &str, record: Value) -> Result<Value, EvalError> {
    let expr = parse_expression(expr).expect("expression should parse");
    Evaluator::new().eval_expression(&expr, &record)
}

fn strings(items: &[&str]) -> Value {
    Value::Array(items.iter().map(|s| Value::from(*s)).collect())
}

fn object(pairs: Vec<(&str, Value)>) -> Value {
    let map: BTreeMap<String, Value> = pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    Value::Object(map)
}

// ============================================================================
// Stages
// ============================================================================

#[test]
fn test_names_of_length_four() {
    let names = strings(&["John", "Jane", "Mary", "Harry", "Joe"]);
    let result = eval_query("$ | filter(@.length() == 4) | sort | limit(2)", names).unwrap();

    assert_eq!(result, strings(&["Jane", "John"]));
}

#[test]
fn test_filter_and_sort_by_name() {
    let result = eval_query("$ | filter(@[age] > 5) | sort(@[name]) | map(@[name])", users()).unwrap();
    assert_eq!(result, strings(&["Eleven", "Nine", "Seven", "Twelve"]));
}

#[test]
fn test_sort_desc_by_age() {
    let result = eval_query("$ | sort_desc(@[age]) | limit(3) | map(@.name)", users()).unwrap();
    assert_eq!(result, strings(&["Twelve", "Eleven", "Nine"]));
}

#[test]
fn test_sort_is_stable_on_equal_keys() {
    let result = eval_query("$ | sort(@[active]) | map(@[name])", users()).unwrap();
    assert_eq!(
        result,
        strings(&["Four", "Nine", "Seven", "Eleven", "Three", "One", "Twelve"])
    );
}

#[test]
fn test_skip_then_limit() {
    let result = eval_query("$ | skip(5) | limit(10) | map(@[name])", users()).unwrap();
    assert_eq!(result, strings(&["One", "Twelve"]));
}

#[test]
fn test_map_to_object() {
    let result = eval_query("$ | limit(1) | map({who: @[name], next: @[age] + 1})", users()).unwrap();
    assert_eq!(
        result,
        Value::Array(vec![object(vec![("next", Value::Integer(8)), ("who", Value::from("Seven"))])])
    );
}

#[test]
fn test_expand_published_books() {
    let result = eval_query(
        "$ | expand(@[books]) | filter(@[published]) | map(@[name])",
        library(),
    )
    .unwrap();
    assert_eq!(result, strings(&["A1", "A2", "A3", "B1", "B3", "B4", "C1", "C3", "D1"]));
}

#[test]
fn test_active_authors_with_a_published_book() {
    let result = eval_query(
        "$ | filter(@[active]) | filter(@[books].any(@[published])) | map(@[name])",
        library(),
    )
    .unwrap();
    assert_eq!(result, strings(&["Author A", "Author B", "Author C"]));
}

#[test]
fn test_missing_field_is_null() {
    let result = eval_query("$ | limit(1) | map(@[email])", users()).unwrap();
    assert_eq!(result, Value::Array(vec![Value::Null]));
}

// ============================================================================
// Terminals
// ============================================================================

#[test]
fn test_average_of_two_authors() {
    let result = eval_query(
        r#"$ | filter(@[name] == "Author A" or @[name] == "Author B") | expand(@[books]) | avg(@[price])"#,
        library(),
    )
    .unwrap();
    assert_eq!(result, Value::Float(1080.0 / 7.0));
}

#[test]
fn test_average_of_whole_library() {
    let result = eval_query("$ | expand(@[books]) | avg(@[price])", library()).unwrap();
    assert_eq!(result, Value::Float(1940.0 / 12.0));
}

#[test]
fn test_average_exact_is_float() {
    let result = eval_query("$ | avg", json_to_value(json!([90, 100]))).unwrap();
    assert_eq!(result, Value::Float(95.0));
    assert_eq!(sluice::to_json(&result), "95.0");
}

#[test]
fn test_average_of_nothing() {
    let query = "$ | filter(@[age] > 100) | avg(@[age])";

    assert_eq!(eval_query(query, users()).unwrap(), Value::Null);
    assert_eq!(
        eval_with(AbsentPolicy::Default(0.0), query, users()).unwrap(),
        Value::Float(0.0)
    );

    let err = eval_with(AbsentPolicy::Fail, query, users()).unwrap_err();
    assert!(matches!(err, EvalError::Pipeline(PipelineError::IllegalState(_))));
}

#[test]
fn test_average_requires_numbers() {
    let err = eval_query("$ | avg(@[name])", users()).unwrap_err();
    assert!(matches!(err, EvalError::TypeError(_)));
}

#[test]
fn test_count() {
    let result = eval_query("$ | filter(@[active]) | count", users()).unwrap();
    assert_eq!(result, Value::Integer(5));
}

#[test]
fn test_sum_stays_integer() {
    let result = eval_query("$ | sum(@[age])", users()).unwrap();
    assert_eq!(result, Value::Integer(47));

    let result = eval_query("$ | sum", json_to_value(json!([1.5, 2]))).unwrap();
    assert_eq!(result, Value::Float(3.5));

    let result = eval_query("$ | sum", Value::Array(vec![])).unwrap();
    assert_eq!(result, Value::Integer(0));
}

#[test]
fn test_sum_overflow_switches_to_float() {
    let big = json_to_value(json!([i64::MAX, 1]));
    let result = eval_query("$ | sum", big).unwrap();
    assert_eq!(result, Value::Float(i64::MAX as f64 + 1.0));

    // Same answer as adding with +
    let added = eval_query("$ | map(@ + 1)", json_to_value(json!([i64::MAX]))).unwrap();
    assert_eq!(added, Value::Array(vec![result]));
}

#[test]
fn test_partition_of_empty() {
    let words = strings(&[]);
    let result = eval_query(r#"$ | partition_by(@.startswith("c"))"#, words).unwrap();

    assert_eq!(
        result,
        object(vec![("false", Value::Array(vec![])), ("true", Value::Array(vec![]))])
    );
}

#[test]
fn test_group_of_empty() {
    let result = eval_query(r#"$ | group_by(@.startswith("c"))"#, strings(&[])).unwrap();
    assert_eq!(result, Value::Object(BTreeMap::new()));
}

#[test]
fn test_group_by_length() {
    let result = eval_query("$ | group_by(@.length())", strings(&["cat", "crab", "dog"])).unwrap();
    assert_eq!(
        result,
        object(vec![("3", strings(&["cat", "dog"])), ("4", strings(&["crab"]))])
    );
}

#[test]
fn test_partition_ages() {
    let result = eval_query("$ | map(@[age]) | partition_by(@ >= 10)", users()).unwrap();
    assert_eq!(result.get("true"), Some(&json_to_value(json!([11, 12]))));
    assert_eq!(result.get("false"), Some(&json_to_value(json!([7, 4, 3, 9, 1]))));
}

#[test]
fn test_any_and_all_match() {
    assert_eq!(
        eval_query("$ | any_match(@[age] > 10)", users()).unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        eval_query("$ | all_match(@[active])", users()).unwrap(),
        Value::Boolean(false)
    );
}

#[test]
fn test_join() {
    let result = eval_query(r#"$ | map(@[name]) | limit(3) | join(", ")"#, users()).unwrap();
    assert_eq!(result, Value::from("Seven, Four, Eleven"));

    let result = eval_query("$ | join", strings(&["w", "o", "l", "f"])).unwrap();
    assert_eq!(result, Value::from("wolf"));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_filter_without_predicate_is_invalid_argument() {
    let err = eval_query("$ | filter()", users()).unwrap_err();
    assert!(matches!(err, EvalError::Pipeline(PipelineError::InvalidArgument(_))));
}

#[test]
fn test_source_must_be_array() {
    let err = eval_query("$ | count", Value::Integer(3)).unwrap_err();
    assert!(matches!(err, EvalError::TypeError(_)));
}

#[test]
fn test_expand_requires_arrays() {
    let err = eval_query("$ | expand(@[name])", users()).unwrap_err();
    assert!(matches!(err, EvalError::TypeError(_)));
}

#[test]
fn test_min_integer_divided_by_minus_one() {
    let records = json_to_value(json!([{"n": i64::MIN}]));
    let result = eval_query("$ | map(@[n] / -1)", records).unwrap();
    assert_eq!(result, Value::Array(vec![Value::Float(-(i64::MIN as f64))]));

    let result = eval_expr("(0 - 9223372036854775807 - 1) / -1", Value::Null).unwrap();
    assert_eq!(result, Value::Float(-(i64::MIN as f64)));

    let result = eval_expr("(0 - 9223372036854775807 - 1) % -1", Value::Null).unwrap();
    assert!(matches!(result, Value::Float(_)));
}

#[test]
fn test_division_by_zero() {
    let err = eval_query("$ | map(@[age] / 0)", users()).unwrap_err();
    assert_eq!(err, EvalError::DivisionByZero);
}

// ============================================================================
// Expressions and methods
// ============================================================================

#[test]
fn test_arithmetic() {
    let record = object(vec![("price", Value::Integer(100))]);

    assert_eq!(eval_expr("@[price] * 1.1", record.clone()).unwrap(), Value::Integer(110));
    assert_eq!(eval_expr("@[price] / 4", record.clone()).unwrap(), Value::Integer(25));
    assert_eq!(eval_expr("@[price] / 8", record.clone()).unwrap(), Value::Float(12.5));
    assert_eq!(eval_expr("@[price] % 7", record.clone()).unwrap(), Value::Integer(2));
    assert_eq!(eval_expr("-@[price] + 1", record).unwrap(), Value::Integer(-99));
}

#[test]
fn test_mixed_equality() {
    assert_eq!(eval_expr("1 == 1.0", Value::Null).unwrap(), Value::Boolean(true));
    assert_eq!(eval_expr("\"1\" == 1", Value::Null).unwrap(), Value::Boolean(false));
}

#[test]
fn test_string_concatenation() {
    let record = object(vec![("first", Value::from("John")), ("last", Value::from("Doe"))]);
    let result = eval_expr(r#"@[first] + " " + @[last]"#, record).unwrap();
    assert_eq!(result, Value::from("John Doe"));
}

#[test]
fn test_logical_short_circuit() {
    // The right side would fail if evaluated
    assert_eq!(eval_expr("false and 1 / 0 == 1", Value::Null).unwrap(), Value::Boolean(false));
    assert_eq!(eval_expr("true or 1 / 0 == 1", Value::Null).unwrap(), Value::Boolean(true));
    assert_eq!(eval_expr("not null", Value::Null).unwrap(), Value::Boolean(true));
}

#[test]
fn test_string_methods() {
    let record = Value::from("Harry");

    assert_eq!(eval_expr("@.upper()", record.clone()).unwrap(), Value::from("HARRY"));
    assert_eq!(eval_expr("@.lower()", record.clone()).unwrap(), Value::from("harry"));
    assert_eq!(eval_expr("@.length()", record.clone()).unwrap(), Value::Integer(5));
    assert_eq!(eval_expr(r#"@.startswith("Ha")"#, record.clone()).unwrap(), Value::Boolean(true));
    assert_eq!(eval_expr(r#"@.endswith("y")"#, record.clone()).unwrap(), Value::Boolean(true));
    assert_eq!(eval_expr(r#"@.contains("rr")"#, record.clone()).unwrap(), Value::Boolean(true));
    assert_eq!(eval_expr(r#"@.matches("^H[a-z]+$")"#, record.clone()).unwrap(), Value::Boolean(true));
    assert_eq!(eval_expr("@.type()", record).unwrap(), Value::from("string"));
}

#[test]
fn test_array_methods() {
    let record = json_to_value(json!({"tags": ["a", "b", "c"], "scores": [3, 8]}));

    assert_eq!(eval_expr("@[tags].count()", record.clone()).unwrap(), Value::Integer(3));
    assert_eq!(eval_expr(r#"@[tags].contains("b")"#, record.clone()).unwrap(), Value::Boolean(true));
    assert_eq!(eval_expr("@[scores].all(@ > 2)", record.clone()).unwrap(), Value::Boolean(true));
    assert_eq!(eval_expr("@[scores].any(@ > 8)", record.clone()).unwrap(), Value::Boolean(false));
    assert_eq!(eval_expr("@[tags][-1]", record.clone()).unwrap(), Value::from("c"));
    assert_eq!(eval_expr("@[tags][10]", record).unwrap(), Value::Null);
}

#[test]
fn test_method_type_errors() {
    assert!(matches!(eval_expr("@.upper()", Value::Integer(1)), Err(EvalError::TypeError(_))));
    assert!(matches!(eval_expr("@.explode()", Value::Null), Err(EvalError::TypeError(_))));
    assert!(matches!(eval_expr(r#"@.matches("(")"#, Value::from("x")), Err(EvalError::TypeError(_))));
}

#[test]
fn test_string_key_on_array_is_access_error() {
    let record = json_to_value(json!({"tags": ["a"]}));
    assert!(matches!(eval_expr("@[tags][name]", record), Err(EvalError::AccessError(_))));
}
