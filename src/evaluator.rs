use std::collections::BTreeMap;

use regex::Regex;
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    ast::{BinOp, Expr, Plan, Query, Stage, Terminal},
    error::PipelineError,
    stream::{AbsentPolicy, Pipeline},
    value::Value,
};

/// What `$` and `@` refer to while evaluating an expression
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// The source collection (`$`)
    pub root: &'a Value,
    /// The current record (`@`)
    pub current: &'a Value,
}

impl<'a> EvalContext<'a> {
    pub fn new(root: &'a Value, current: &'a Value) -> Self {
        EvalContext { root, current }
    }

    /// Same root, `@` rebound to `current`
    pub fn with_current<'b>(&self, current: &'b Value) -> EvalContext<'b>
    where
        'a: 'b,
    {
        EvalContext {
            root: self.root,
            current,
        }
    }
}

/// Errors that can occur during query evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Type mismatch or invalid operation for the given type
    #[error("Type error: {0}")]
    TypeError(String),

    /// Invalid field access or array index
    #[error("Access error: {0}")]
    AccessError(String),

    #[error("Division by zero")]
    DivisionByZero,

    /// Planning or pipeline failure (invalid argument, illegal state)
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Runs parsed queries over a collection of records.
///
/// Every stage is carried out by a [`Pipeline`]: expressions are evaluated
/// per record first (evaluation can fail), then the pipeline does the
/// filtering, ordering, grouping or averaging on the results.
#[derive(Debug, Default)]
pub struct Evaluator {
    absent: AbsentPolicy,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// How `avg` resolves an empty input
    pub fn with_absent_policy(absent: AbsentPolicy) -> Self {
        Evaluator { absent }
    }

    /// Evaluates a complete query against a collection.
    ///
    /// # Examples
    ///
    /// ```
    /// use sluice::{Evaluator, Value};
    /// use sluice::parser::parse_query;
    ///
    /// let names = Value::Array(vec!["John".into(), "Jane".into(), "Mary".into(), "Harry".into(), "Joe".into()]);
    /// let query = parse_query("$ | filter(@.length() == 4) | sort | limit(2)").unwrap();
    ///
    /// let result = Evaluator::new().eval_query(&query, names).unwrap();
    /// assert_eq!(result, Value::Array(vec!["Jane".into(), "John".into()]));
    /// ```
    pub fn eval_query(&self, query: &Query, input: Value) -> Result<Value, EvalError> {
        let plan = Plan::from_query(query)?;
        self.eval_plan(&plan, input)
    }

    pub fn eval_plan(&self, plan: &Plan, input: Value) -> Result<Value, EvalError> {
        debug!(stages = plan.stages.len(), terminal = ?plan.terminal, "running query");

        let root = input;
        let mut items = match &root {
            Value::Array(items) => items.clone(),
            other => {
                return Err(EvalError::TypeError(format!(
                    "query source must be an array, got {}",
                    other.type_name()
                )));
            }
        };

        for stage in &plan.stages {
            items = self.eval_stage(stage, items, &root)?;
            trace!(?stage, remaining = items.len(), "stage done");
        }

        let result = self.eval_terminal(&plan.terminal, items, &root)?;
        debug!(result = result.type_name(), "query finished");
        Ok(result)
    }

    /// Evaluates a single expression with both `$` and `@` bound to `record`.
    pub fn eval_expression(&self, expr: &Expr, record: &Value) -> Result<Value, EvalError> {
        self.eval_expr(expr, &EvalContext::new(record, record))
    }

    /// Pairs every item with `expr` evaluated against it
    fn keyed(&self, items: Vec<Value>, expr: &Expr, root: &Value) -> Result<Vec<(Value, Value)>, EvalError> {
        let mut result = Vec::with_capacity(items.len());

        for item in items {
            let key = self.eval_expr(expr, &EvalContext::new(root, &item))?;
            result.push((item, key));
        }

        Ok(result)
    }

    fn eval_stage(&self, stage: &Stage, items: Vec<Value>, root: &Value) -> Result<Vec<Value>, EvalError> {
        let result = match stage {
            Stage::Filter(predicate) => Pipeline::from_vec(self.keyed(items, predicate, root)?)
                .filter(|(_, keep)| keep.as_bool())
                .map(|(item, _)| item)
                .collect()?,
            Stage::Expand(children) => {
                let mut lists = Vec::with_capacity(items.len());
                for (_, value) in self.keyed(items, children, root)? {
                    match value {
                        Value::Array(list) => lists.push(list),
                        other => {
                            return Err(EvalError::TypeError(format!(
                                "expand() requires array children, got {}",
                                other.type_name()
                            )));
                        }
                    }
                }
                Pipeline::from_vec(lists).expand(|list| list).collect()?
            }
            Stage::Map(transform) => Pipeline::from_vec(self.keyed(items, transform, root)?)
                .map(|(_, mapped)| mapped)
                .collect()?,
            Stage::Sort { key, descending } => {
                let keyed = match key {
                    Some(key) => self.keyed(items, key, root)?,
                    None => items.into_iter().map(|item| (item.clone(), item)).collect(),
                };
                let descending = *descending;
                Pipeline::from_vec(keyed)
                    .sorted_by(move |(_, a), (_, b)| {
                        if descending { b.compare(a) } else { a.compare(b) }
                    })
                    .map(|(item, _)| item)
                    .collect()?
            }
            Stage::Limit(n) => Pipeline::from_vec(items).limit(*n).collect()?,
            Stage::Skip(n) => Pipeline::from_vec(items).skip(*n).collect()?,
        };
        Ok(result)
    }

    fn eval_terminal(&self, terminal: &Terminal, items: Vec<Value>, root: &Value) -> Result<Value, EvalError> {
        match terminal {
            Terminal::Collect => Ok(Value::Array(Pipeline::from_vec(items).collect()?)),
            Terminal::Count => Ok(Value::Integer(Pipeline::from_vec(items).count()? as i64)),
            Terminal::Average(extract) => {
                let numbers = self.numbers(items, extract.as_ref(), root, "avg")?;
                let mean = Pipeline::from_vec(numbers).average(|n| n.as_float().unwrap_or_default())?;
                Ok(match self.absent.resolve(mean)? {
                    Some(mean) => Value::Float(mean),
                    None => Value::Null,
                })
            }
            Terminal::Sum(extract) => {
                let numbers = self.numbers(items, extract.as_ref(), root, "sum")?;
                if numbers.iter().all(|n| matches!(n, Value::Integer(_))) {
                    // None once the running total overflows
                    let total = Pipeline::from_vec(numbers.clone())
                        .map(|n| n.as_int())
                        .reduce(Some(0), |total, n| total.zip(n).and_then(|(t, n)| t.checked_add(n)))?;
                    if let Some(total) = total {
                        return Ok(Value::Integer(total));
                    }
                }
                let total = Pipeline::from_vec(numbers).sum(|n| n.as_float().unwrap_or_default())?;
                Ok(Value::Float(total))
            }
            Terminal::GroupBy(key) => {
                let groups = Pipeline::from_vec(self.keyed(items, key, root)?).group_by(|(_, k)| k.as_string())?;
                Ok(Value::Object(
                    groups
                        .into_iter()
                        .map(|(k, members)| (k, strip_keys(members)))
                        .collect(),
                ))
            }
            Terminal::PartitionBy(predicate) => {
                let parts =
                    Pipeline::from_vec(self.keyed(items, predicate, root)?).partition_by(|(_, k)| k.as_bool())?;
                let object: BTreeMap<String, Value> = parts
                    .into_iter()
                    .map(|(side, members)| (side.to_string(), strip_keys(members)))
                    .collect();
                Ok(Value::Object(object))
            }
            Terminal::AnyMatch(predicate) => Ok(Value::Boolean(
                Pipeline::from_vec(self.keyed(items, predicate, root)?).any_match(|(_, k)| k.as_bool())?,
            )),
            Terminal::AllMatch(predicate) => Ok(Value::Boolean(
                Pipeline::from_vec(self.keyed(items, predicate, root)?).all_match(|(_, k)| k.as_bool())?,
            )),
            Terminal::Join(separator) => Ok(Value::String(Pipeline::from_vec(items).join(separator)?)),
        }
    }

    /// Extracted numeric values, or a type error naming the operation
    fn numbers(
        &self,
        items: Vec<Value>,
        extract: Option<&Expr>,
        root: &Value,
        operation: &str,
    ) -> Result<Vec<Value>, EvalError> {
        let values: Vec<Value> = match extract {
            Some(expr) => self.keyed(items, expr, root)?.into_iter().map(|(_, v)| v).collect(),
            None => items,
        };

        if let Some(bad) = values.iter().find(|v| v.as_float().is_none()) {
            return Err(EvalError::TypeError(format!(
                "{}() requires numeric values, got {}",
                operation,
                bad.type_name()
            )));
        }
        Ok(values)
    }

    fn eval_expr(&self, expr: &Expr, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
        match expr {
            Expr::Float(n) => Ok(Value::Float(*n)),
            Expr::Integer(n) => Ok(Value::Integer(*n)),
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Root => Ok(ctx.root.clone()),
            Expr::Current => Ok(ctx.current.clone()),
            Expr::Key(name) => Ok(Value::String(name.clone())),
            Expr::Access { object, key } => {
                let obj_value = self.eval_expr(object, ctx)?;
                let key_value = self.eval_expr(key, ctx)?;
                apply_access(&obj_value, &key_value)
            }
            Expr::BinaryOp { op: BinOp::And, left, right } => {
                let left_val = self.eval_expr(left, ctx)?;
                if !left_val.as_bool() {
                    return Ok(Value::Boolean(false));
                }
                Ok(Value::Boolean(self.eval_expr(right, ctx)?.as_bool()))
            }
            Expr::BinaryOp { op: BinOp::Or, left, right } => {
                let left_val = self.eval_expr(left, ctx)?;
                if left_val.as_bool() {
                    return Ok(Value::Boolean(true));
                }
                Ok(Value::Boolean(self.eval_expr(right, ctx)?.as_bool()))
            }
            Expr::BinaryOp { op, left, right } => {
                let left_val = self.eval_expr(left, ctx)?;
                let right_val = self.eval_expr(right, ctx)?;
                apply_binop(*op, &left_val, &right_val)
            }
            Expr::Not(inner) => Ok(Value::Boolean(!self.eval_expr(inner, ctx)?.as_bool())),
            Expr::MethodCall { object, method, args } => {
                let obj_value = self.eval_expr(object, ctx)?;
                self.eval_method_call(&obj_value, method, args, ctx)
            }
            Expr::Object(items) => {
                let mut map = BTreeMap::new();
                for (key, expr) in items {
                    map.insert(key.clone(), self.eval_expr(expr, ctx)?);
                }
                Ok(Value::Object(map))
            }
            Expr::Array(exprs) => {
                let mut arr = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    arr.push(self.eval_expr(expr, ctx)?);
                }
                Ok(Value::Array(arr))
            }
        }
    }

    /// Dispatch method calls to their implementations
    fn eval_method_call(
        &self,
        object: &Value,
        method: &str,
        args: &[Expr],
        ctx: &EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        match method {
            // Array methods
            "any" => self.method_any(object, args, ctx),
            "all" => self.method_all(object, args, ctx),
            "count" => match object {
                Value::Array(arr) => Ok(Value::Integer(arr.len() as i64)),
                _ => Err(requires(".count()", "array", object)),
            },
            "length" => match object {
                Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
                Value::Array(arr) => Ok(Value::Integer(arr.len() as i64)),
                Value::Object(obj) => Ok(Value::Integer(obj.len() as i64)),
                _ => Err(requires(".length()", "string, array or object", object)),
            },
            "contains" => {
                let needle = self.single_arg(".contains()", args, ctx)?;
                match (object, &needle) {
                    (Value::String(s), Value::String(n)) => Ok(Value::Boolean(s.contains(n.as_str()))),
                    (Value::Array(arr), n) => Ok(Value::Boolean(arr.iter().any(|item| values_equal(item, n)))),
                    _ => Err(requires(".contains()", "string or array", object)),
                }
            }
            // String methods
            "upper" => Ok(Value::String(as_str(".upper()", object)?.to_uppercase())),
            "lower" => Ok(Value::String(as_str(".lower()", object)?.to_lowercase())),
            "startswith" => {
                let s = as_str(".startswith()", object)?;
                let prefix = self.single_arg(".startswith()", args, ctx)?;
                Ok(Value::Boolean(s.starts_with(as_str(".startswith()", &prefix)?)))
            }
            "endswith" => {
                let s = as_str(".endswith()", object)?;
                let suffix = self.single_arg(".endswith()", args, ctx)?;
                Ok(Value::Boolean(s.ends_with(as_str(".endswith()", &suffix)?)))
            }
            "matches" => {
                let s = as_str(".matches()", object)?;
                let pattern = self.single_arg(".matches()", args, ctx)?;
                let re = Regex::new(as_str(".matches()", &pattern)?)
                    .map_err(|e| EvalError::TypeError(format!("invalid regex: {e}")))?;
                Ok(Value::Boolean(re.is_match(s)))
            }
            "type" => Ok(Value::String(object.type_name().to_string())),
            _ => Err(EvalError::TypeError(format!("Unknown method: {}", method))),
        }
    }

    fn single_arg(&self, method: &str, args: &[Expr], ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
        match args {
            [arg] => self.eval_expr(arg, ctx),
            _ => Err(EvalError::TypeError(format!(
                "{} requires exactly one argument, got {}",
                method,
                args.len()
            ))),
        }
    }

    /// .any(pred) - true if any element matches, `@` bound to each element
    fn method_any(&self, object: &Value, args: &[Expr], ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
        let arr = object.as_array().ok_or_else(|| requires(".any()", "array", object))?;
        let [predicate] = args else {
            return Err(EvalError::TypeError(".any() requires a predicate argument".to_string()));
        };

        for item in arr {
            if self.eval_expr(predicate, &ctx.with_current(item))?.as_bool() {
                return Ok(Value::Boolean(true));
            }
        }
        Ok(Value::Boolean(false))
    }

    /// .all(pred) - true if every element matches
    fn method_all(&self, object: &Value, args: &[Expr], ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
        let arr = object.as_array().ok_or_else(|| requires(".all()", "array", object))?;
        let [predicate] = args else {
            return Err(EvalError::TypeError(".all() requires a predicate argument".to_string()));
        };

        for item in arr {
            if !self.eval_expr(predicate, &ctx.with_current(item))?.as_bool() {
                return Ok(Value::Boolean(false));
            }
        }
        Ok(Value::Boolean(true))
    }
}

fn requires(method: &str, expected: &str, got: &Value) -> EvalError {
    EvalError::TypeError(format!("{} requires {}, got {}", method, expected, got.type_name()))
}

fn as_str<'v>(method: &str, value: &'v Value) -> Result<&'v str, EvalError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(requires(method, "string", other)),
    }
}

fn strip_keys(members: Vec<(Value, Value)>) -> Value {
    Value::Array(members.into_iter().map(|(item, _)| item).collect())
}

fn apply_access(object: &Value, key: &Value) -> Result<Value, EvalError> {
    match (object, key) {
        (Value::Object(map), Value::String(k)) => Ok(map.get(k).cloned().unwrap_or(Value::Null)),
        (Value::Object(map), Value::Integer(_) | Value::Float(_) | Value::Boolean(_)) => {
            Ok(map.get(&key.as_string()).cloned().unwrap_or(Value::Null))
        }
        (Value::Array(arr), Value::Integer(n)) => {
            let index = if *n < 0 {
                // -1 is the last element
                let back = n.unsigned_abs() as usize;
                match arr.len().checked_sub(back) {
                    Some(index) => index,
                    None => return Ok(Value::Null),
                }
            } else {
                *n as usize
            };
            Ok(arr.get(index).cloned().unwrap_or(Value::Null))
        }
        (Value::Null, _) => Ok(Value::Null),
        (Value::Array(_), Value::String(k)) => Err(EvalError::AccessError(format!(
            "Cannot use string key '{}' on array; use integer index instead",
            k
        ))),
        _ => Err(EvalError::AccessError(format!(
            "Cannot access {} with {} key",
            object.type_name(),
            key.type_name()
        ))),
    }
}

/// Equality that treats `1` and `1.0` as equal
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (a, b) => match (a.as_float(), b.as_float()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
    }
}

fn apply_binop(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Equal => Ok(Value::Boolean(values_equal(left, right))),
        BinOp::NotEqual => Ok(Value::Boolean(!values_equal(left, right))),
        BinOp::LessThan | BinOp::GreaterThan | BinOp::LessEqual | BinOp::GreaterEqual => {
            compare(op, left, right)
        }
        BinOp::Add => match (left, right) {
            (Value::String(a), b) => Ok(Value::String(format!("{}{}", a, b.as_string()))),
            (a, Value::String(b)) => Ok(Value::String(format!("{}{}", a.as_string(), b))),
            _ => arithmetic(op, left, right),
        },
        BinOp::Subtract | BinOp::Multiply | BinOp::Divide | BinOp::Modulo => arithmetic(op, left, right),
        BinOp::And => Ok(Value::Boolean(left.as_bool() && right.as_bool())),
        BinOp::Or => Ok(Value::Boolean(left.as_bool() || right.as_bool())),
    }
}

fn compare(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (a, b) => match (a.as_float(), b.as_float()) {
            (Some(_), Some(_)) => a.compare(b),
            _ => {
                return Err(EvalError::TypeError(format!(
                    "Cannot compare {} and {}",
                    left.type_name(),
                    right.type_name()
                )));
            }
        },
    };

    let result = match op {
        BinOp::LessThan => ordering.is_lt(),
        BinOp::GreaterThan => ordering.is_gt(),
        BinOp::LessEqual => ordering.is_le(),
        _ => ordering.is_ge(),
    };
    Ok(Value::Boolean(result))
}

fn verb(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "add",
        BinOp::Subtract => "subtract",
        BinOp::Multiply => "multiply",
        BinOp::Divide => "divide",
        _ => "take the modulo of",
    }
}

fn arithmetic(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => integer_arithmetic(op, *a, *b),
        (Value::Float(a), Value::Float(b)) => float_arithmetic(op, *a, *b),
        (a, b) => match (a.as_float(), b.as_float()) {
            // Mixed integer/float: go through Decimal so 100 * 1.1 is exactly 110
            (Some(x), Some(y)) => match decimal_arithmetic(op, a, b)? {
                Some(result) => Ok(result),
                None => float_arithmetic(op, x, y),
            },
            _ => Err(EvalError::TypeError(format!(
                "Cannot {} {} and {}",
                verb(op),
                a.type_name(),
                b.type_name()
            ))),
        },
    }
}

fn integer_arithmetic(op: BinOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let checked = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Subtract => a.checked_sub(b),
        BinOp::Multiply => a.checked_mul(b),
        BinOp::Divide => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            // i64::MIN / -1 overflows both ways and falls through to floats
            match a.checked_rem(b) {
                Some(0) => a.checked_div(b),
                _ => return float_arithmetic(op, a as f64, b as f64),
            }
        }
        _ => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            a.checked_rem(b)
        }
    };

    match checked {
        Some(n) => Ok(Value::Integer(n)),
        None => float_arithmetic(op, a as f64, b as f64),
    }
}

fn float_arithmetic(op: BinOp, a: f64, b: f64) -> Result<Value, EvalError> {
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Subtract => a - b,
        BinOp::Multiply => a * b,
        BinOp::Divide => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
        _ => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a % b
        }
    };
    Ok(Value::Float(result))
}

/// `Ok(None)` when either side does not fit a Decimal or the operation overflows
fn decimal_arithmetic(op: BinOp, left: &Value, right: &Value) -> Result<Option<Value>, EvalError> {
    let (Some(a), Some(b)) = (to_decimal(left), to_decimal(right)) else {
        return Ok(None);
    };

    if matches!(op, BinOp::Divide | BinOp::Modulo) && b.is_zero() {
        return Err(EvalError::DivisionByZero);
    }

    let result = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Subtract => a.checked_sub(b),
        BinOp::Multiply => a.checked_mul(b),
        BinOp::Divide => a.checked_div(b),
        _ => a.checked_rem(b),
    };

    Ok(result.and_then(|rd| {
        if rd.is_integer() && let Some(n) = rd.to_i64() {
            Some(Value::Integer(n))
        } else {
            rd.to_f64().map(Value::Float)
        }
    }))
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Integer(n) => Decimal::from_i64(*n),
        Value::Float(n) => Decimal::from_f64(*n),
        _ => None,
    }
}
