use crate::{
    ast::{Expr, Query, StageCall},
    error::PipelineError,
};

/// Intermediate stage of a planned query.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// `filter(pred)`
    Filter(Expr),

    /// `expand(children)` / `flat_map(children)`
    Expand(Expr),

    /// `map(expr)`
    Map(Expr),

    /// `sort`, `sort(key)`, `sort_desc`, `sort_desc(key)`
    ///
    /// Without a key the records themselves are compared.
    Sort { key: Option<Expr>, descending: bool },

    /// `limit(n)`
    Limit(usize),

    /// `skip(n)`
    Skip(usize),
}

/// Terminal operation of a planned query. Queries without one collect.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Terminal {
    #[default]
    Collect,
    Count,
    /// Mean of the records, or of `expr` evaluated per record
    Average(Option<Expr>),
    Sum(Option<Expr>),
    GroupBy(Expr),
    PartitionBy(Expr),
    AnyMatch(Expr),
    AllMatch(Expr),
    /// `join` / `join(sep)`; separator defaults to the empty string
    Join(String),
}

/// Validated query: stages in order plus exactly one terminal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Plan {
    pub stages: Vec<Stage>,
    pub terminal: Terminal,
}

impl Plan {
    /// Checks stage names and arguments.
    ///
    /// Fails with [`PipelineError::InvalidArgument`] for unknown stages,
    /// missing or extra arguments, malformed counts, and terminals that are
    /// not the last stage.
    pub fn from_query(query: &Query) -> Result<Plan, PipelineError> {
        let mut plan = Plan::default();
        let last = query.stages.len().saturating_sub(1);

        for (index, call) in query.stages.iter().enumerate() {
            if let Some(terminal) = plan_terminal(call)? {
                if index != last {
                    return Err(PipelineError::invalid_argument(format!(
                        "{}() is a terminal operation and must be the last stage (at {})",
                        call.name, call.position
                    )));
                }
                plan.terminal = terminal;
            } else {
                plan.stages.push(plan_stage(call)?);
            }
        }

        Ok(plan)
    }
}

fn plan_stage(call: &StageCall) -> Result<Stage, PipelineError> {
    match call.name.as_str() {
        "filter" => Ok(Stage::Filter(required_arg(call, "a predicate")?)),
        "expand" | "flat_map" => Ok(Stage::Expand(required_arg(call, "a child extractor")?)),
        "map" => Ok(Stage::Map(required_arg(call, "a transform expression")?)),
        "sort" => Ok(Stage::Sort {
            key: optional_arg(call)?,
            descending: false,
        }),
        "sort_desc" => Ok(Stage::Sort {
            key: optional_arg(call)?,
            descending: true,
        }),
        "limit" => Ok(Stage::Limit(count_arg(call)?)),
        "skip" => Ok(Stage::Skip(count_arg(call)?)),
        _ => Err(PipelineError::invalid_argument(format!(
            "unknown stage '{}' at {}",
            call.name, call.position
        ))),
    }
}

/// `Ok(None)` when `call` is not a terminal
fn plan_terminal(call: &StageCall) -> Result<Option<Terminal>, PipelineError> {
    let terminal = match call.name.as_str() {
        "collect" => {
            no_args(call)?;
            Terminal::Collect
        }
        "count" => {
            no_args(call)?;
            Terminal::Count
        }
        "avg" | "average" => Terminal::Average(optional_arg(call)?),
        "sum" => Terminal::Sum(optional_arg(call)?),
        "group_by" => Terminal::GroupBy(required_arg(call, "a key extractor")?),
        "partition_by" => Terminal::PartitionBy(required_arg(call, "a predicate")?),
        "any_match" => Terminal::AnyMatch(required_arg(call, "a predicate")?),
        "all_match" => Terminal::AllMatch(required_arg(call, "a predicate")?),
        "join" => match optional_arg(call)? {
            None => Terminal::Join(String::new()),
            Some(Expr::String(sep)) => Terminal::Join(sep),
            Some(other) => {
                return Err(PipelineError::invalid_argument(format!(
                    "join() separator must be a string literal, got {:?}",
                    other
                )));
            }
        },
        _ => return Ok(None),
    };
    Ok(Some(terminal))
}

fn required_arg(call: &StageCall, what: &str) -> Result<Expr, PipelineError> {
    match call.args.as_slice() {
        [arg] => Ok(arg.clone()),
        [] => Err(PipelineError::invalid_argument(format!(
            "{}() requires {} (at {})",
            call.name, what, call.position
        ))),
        _ => Err(too_many(call, 1)),
    }
}

fn optional_arg(call: &StageCall) -> Result<Option<Expr>, PipelineError> {
    match call.args.as_slice() {
        [] => Ok(None),
        [arg] => Ok(Some(arg.clone())),
        _ => Err(too_many(call, 1)),
    }
}

fn no_args(call: &StageCall) -> Result<(), PipelineError> {
    if call.args.is_empty() {
        Ok(())
    } else {
        Err(too_many(call, 0))
    }
}

fn count_arg(call: &StageCall) -> Result<usize, PipelineError> {
    match required_arg(call, "a count")? {
        Expr::Integer(n) if n >= 0 => Ok(n as usize),
        other => Err(PipelineError::invalid_argument(format!(
            "{}() count must be a non-negative integer, got {:?}",
            call.name, other
        ))),
    }
}

fn too_many(call: &StageCall, max: usize) -> PipelineError {
    PipelineError::invalid_argument(format!(
        "{}() takes at most {} argument(s), got {} (at {})",
        call.name,
        max,
        call.args.len(),
        call.position
    ))
}
