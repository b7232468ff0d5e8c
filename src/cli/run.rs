//! Execute sluice queries against JSON input

use tracing::debug;

use super::{CliError, json_to_value};
use crate::{
    Evaluator, Value,
    ast::Plan,
    output::{to_json, to_json_pretty, to_lines},
    parser::parse_query,
    stream::AbsentPolicy,
};

/// Options for the run command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// The query to execute
    pub query: String,
    /// JSON input string (an array of records)
    pub input: Option<String>,
    /// Only validate syntax, don't execute
    pub syntax_only: bool,
    /// How `avg` treats an empty input
    pub absent: AbsentPolicy,
}

/// Result of a run
#[derive(Debug, PartialEq)]
pub enum RunResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Query executed successfully
    Success(Value),
}

/// Parse and plan the query, then evaluate it unless `syntax_only` is set.
pub fn execute_run(options: &RunOptions) -> Result<RunResult, CliError> {
    let query = parse_query(&options.query)?;

    if options.syntax_only {
        // Stage names and arguments are part of the syntax
        Plan::from_query(&query)?;
        return Ok(RunResult::SyntaxValid);
    }

    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let json_value: serde_json::Value = serde_json::from_str(json_str)?;
    let input = json_to_value(json_value);

    debug!(query = %options.query, "executing query");
    let result = Evaluator::with_absent_policy(options.absent).eval_query(&query, input)?;
    Ok(RunResult::Success(result))
}

/// Formats a result for stdout: JSON (compact or pretty) or one line per element.
pub fn render(value: &Value, pretty: bool, lines: bool) -> String {
    if lines {
        to_lines(value).join("\n")
    } else if pretty {
        to_json_pretty(value)
    } else {
        to_json(value)
    }
}
