pub mod ast;
pub mod cli;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod stream;
pub mod value;

pub use ast::{BinOp, Expr, Plan, Query, Stage, Terminal, Token};
pub use error::PipelineError;
pub use evaluator::{EvalContext, EvalError, Evaluator};
pub use lexer::{LexError, Lexer, Position};
pub use output::{to_json, to_json_pretty};
pub use parser::{ParseError, Parser};
pub use stream::{AbsentPolicy, Pipeline, SharedSource, SourceMode};
pub use value::Value;
