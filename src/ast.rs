//! # Query language - Abstract Syntax Tree
//!
//! A query is a pipeline over a collection of records. It starts with `$`
//! (the source collection) and chains stages with `|`:
//!
//! ```text
//! $ | stage | stage | ... | terminal
//! ```
//!
//! This module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Per-record expressions (literals, access, operators, methods)
//! - **[operators]** - Binary operators (comparison, arithmetic, logical)
//! - **[query]** - Parsed query: stage calls as written
//! - **[plan]** - Validated stages and the terminal operation
//!
//! ## Stages
//!
//! - `filter(pred)` - keep records where `pred` holds
//! - `expand(children)` - replace each record with its children
//! - `map(expr)` - replace each record with `expr`
//! - `sort` / `sort(key)` / `sort_desc(key)` - stable ordering
//! - `limit(n)` / `skip(n)`
//!
//! ## Terminals
//!
//! `collect` (the default), `count`, `avg`, `sum`, `group_by`,
//! `partition_by`, `any_match`, `all_match`, `join`.
//!
//! ## Examples
//!
//! ```text
//! $ | filter(@.length() == 4) | sort | limit(2)
//! $ | expand(@[books]) | avg(@[price])
//! $ | filter(@[active]) | filter(@[books].any(@[published]))
//! $ | partition_by(@.startswith("c"))
//! ```
pub mod expressions;
pub mod operators;
pub mod plan;
pub mod query;
pub mod tokens;

pub use expressions::Expr;
pub use operators::BinOp;
pub use plan::{Plan, Stage, Terminal};
pub use query::{Query, StageCall};
pub use tokens::Token;
