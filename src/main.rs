use std::{
    io::{self, Read},
    path::PathBuf,
};

use clap::{Parser as ClapParser, Subcommand};
use sluice::{
    cli::{self, CliError, DemoKind, RunOptions, RunResult},
    config::Settings,
};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "sluice")]
#[command(about = "sluice - declarative query pipelines over JSON records")]
#[command(version)]
struct Cli {
    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query against a JSON array
    Run {
        /// The query, e.g. '$ | filter(@[age] > 5) | sort(@[name])'
        query: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Print one line per element
        #[arg(long)]
        lines: bool,

        /// Only validate the query, don't execute
        #[arg(long)]
        syntax_only: bool,
    },

    /// Print the sample reports (users, library, collectors, all)
    Demo {
        #[arg(default_value = "all")]
        which: String,

        /// Dump the sample records as JSON instead
        #[arg(long)]
        json: bool,
    },

    /// List documentation categories
    Docs,

    /// Show documentation for a specific category
    Doc {
        /// Category name (use 'sluice docs' to list categories)
        category: String,
    },
}

fn init_logging(settings: &Settings, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.logging.level))
    };

    // Results go to stdout, so logs stay on stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = Settings::load(cli.config.as_deref())?;
    init_logging(&settings, cli.verbose);

    match cli.command {
        Commands::Run {
            query,
            input,
            pretty,
            lines,
            syntax_only,
        } => run_query(
            &settings,
            query,
            input,
            pretty || settings.output.pretty,
            lines || settings.output.lines,
            syntax_only,
        ),
        Commands::Demo { which, json } => {
            let kind: DemoKind = which.parse()?;
            for line in cli::render_demo(kind, json)? {
                println!("{}", line);
            }
            Ok(())
        }
        Commands::Docs => {
            print!("{}", cli::get_docs_overview());
            Ok(())
        }
        Commands::Doc { category } => {
            print!("{}", cli::get_doc_category(&category)?);
            Ok(())
        }
    }
}

fn run_query(
    settings: &Settings,
    query: String,
    input: Option<String>,
    pretty: bool,
    lines: bool,
    syntax_only: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !syntax_only && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = RunOptions {
        query,
        input,
        syntax_only,
        absent: settings.query.absent_policy(),
    };

    match cli::execute_run(&options)? {
        RunResult::SyntaxValid => println!("Syntax is valid"),
        RunResult::Success(output) => println!("{}", cli::render(&output, pretty, lines)),
    }
    Ok(())
}
