use crate::{ast::Expr, lexer::Position};

/// One `name(args...)` segment of a query, as written.
///
/// Names and arities are checked when the query is planned, not when it is
/// parsed, so `filter()` parses fine and is rejected later as an invalid
/// argument.
#[derive(Debug, Clone, PartialEq)]
pub struct StageCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub position: Position,
}

/// Complete query: `$` followed by `|`-separated stage calls.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub stages: Vec<StageCall>,
}
