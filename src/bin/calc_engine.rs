//! Command-line front end for the expression engine
//!
//! Evaluates single expressions directly, or reads one expression per line
//! from stdin and runs them as jobs on the worker pool.

use anyhow::{Context, Result};
use calc_engine::parser::{parse, render_postfix};
use calc_engine::{EngineConfig, InMemoryJobStore, JobStore, OwnerKey, WorkerPool, evaluate};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead};
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "calc-engine")]
#[command(about = "Evaluate arithmetic expressions, directly or as background jobs")]
#[command(version)]
struct Cli {
    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one expression and print its value
    Eval {
        /// Expression to evaluate (reads one line from stdin if omitted)
        expression: Option<String>,
    },
    /// Print the postfix form of an expression
    Postfix {
        /// Expression to convert
        expression: String,
    },
    /// Submit every stdin line as a job and print the resulting jobs as JSON
    Run {
        /// Worker count, overriding COMPUTING_POWER
        #[arg(short, long)]
        workers: Option<usize>,
        /// Owner key the jobs are submitted under
        #[arg(short, long, default_value = "cli")]
        owner: String,
        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Eval { expression } => handle_eval(expression),
        Commands::Postfix { expression } => handle_postfix(&expression),
        Commands::Run {
            workers,
            owner,
            pretty,
        } => handle_run(workers, OwnerKey::new(owner), pretty).await,
    };

    if let Err(err) = outcome {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn handle_eval(expression: Option<String>) -> Result<()> {
    let expression = match expression {
        Some(expression) => expression,
        None => {
            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .context("reading expression from stdin")?;
            line
        }
    };

    let result = evaluate(&expression)?;
    println!("{result}");
    Ok(())
}

fn handle_postfix(expression: &str) -> Result<()> {
    let postfix = parse(expression)?;
    println!("{}", render_postfix(&postfix));
    Ok(())
}

async fn handle_run(workers: Option<usize>, owner: OwnerKey, pretty: bool) -> Result<()> {
    let mut config = EngineConfig::from_env().context("reading configuration from environment")?;
    if let Some(workers) = workers {
        config = config.with_worker_count(workers);
    }

    let store = Arc::new(InMemoryJobStore::new());
    let (pool, submitter) = WorkerPool::start(&config, store.clone())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        submitter.submit(line, owner.clone()).await?;
    }
    drop(submitter);

    let stats = pool.join().await;
    log::info!("{} job(s) processed", stats.processed);

    let jobs = store.list_jobs(&owner).await?;
    let output = if pretty {
        serde_json::to_string_pretty(&jobs)?
    } else {
        serde_json::to_string(&jobs)?
    };
    println!("{output}");
    Ok(())
}
