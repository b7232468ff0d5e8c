//! CLI support for sluice
//!
//! Provides programmatic access to the `sluice` subcommands so they can be
//! embedded and tested without spawning the binary.

mod convert;
mod demo;
mod docs;
mod run;

pub use convert::{json_to_value, value_to_json};
pub use demo::{
    Author, Book, DemoKind, User, collectors_report, library, library_json, library_report, render_demo, users,
    users_json, users_report,
};
pub use docs::{DocCategory, get_doc_category, get_docs_overview};
pub use run::{RunOptions, RunResult, execute_run, render};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] crate::ParseError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::PipelineError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,

    #[error("Unknown category: '{0}'\nRun 'sluice docs' to see available categories.")]
    UnknownCategory(String),

    #[error("Unknown demo: '{0}' (expected users, library, collectors or all)")]
    UnknownDemo(String),
}
