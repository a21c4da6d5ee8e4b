//! Colloquy - conversational speech feedback CLI
//!
//! ## Commands
//!
//! - `analyze`: run one transcript through the workflow and store the result
//! - `latest`: show the most recent stored result
//! - `rubric`: print the validated rubric table
//! - `queue`: feed newline-delimited transcripts from stdin through the work queue

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::{info, Level};

use colloquy_core::telemetry::init_tracing;
use colloquy_core::{
    CapabilityConfig, HttpCapability, RubricTable, WorkQueue, Workflow, WorkflowConfig,
    WorkflowResult,
};
use colloquy_store::{FeedbackRecord, FeedbackStore, FsFeedbackStore};

#[derive(Parser)]
#[command(name = "colloquy")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Conversational speech feedback", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one transcript and store the result
    Analyze {
        /// Transcript file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Feedback store directory
        #[arg(long, env = "COLLOQUY_STORE_DIR", default_value = ".colloquy")]
        store: PathBuf,

        /// Rubric JSON file (default: built-in rubric)
        #[arg(long, env = "COLLOQUY_RUBRIC")]
        rubric: Option<PathBuf>,

        /// Per-evaluator timeout in milliseconds
        #[arg(long, env = "COLLOQUY_EVALUATOR_TIMEOUT_MS", default_value = "30000")]
        timeout_ms: u64,
    },

    /// Show the most recent stored result
    Latest {
        /// Feedback store directory
        #[arg(long, env = "COLLOQUY_STORE_DIR", default_value = ".colloquy")]
        store: PathBuf,
    },

    /// Print the rubric table after validation
    Rubric {
        /// Rubric JSON file (default: built-in rubric)
        #[arg(long, env = "COLLOQUY_RUBRIC")]
        rubric: Option<PathBuf>,
    },

    /// Queue newline-delimited transcripts from stdin
    Queue {
        /// Feedback store directory
        #[arg(long, env = "COLLOQUY_STORE_DIR", default_value = ".colloquy")]
        store: PathBuf,

        /// Rubric JSON file (default: built-in rubric)
        #[arg(long, env = "COLLOQUY_RUBRIC")]
        rubric: Option<PathBuf>,

        /// Maximum number of pending transcripts
        #[arg(long, default_value = "16")]
        capacity: usize,
    },
}

#[derive(Serialize)]
struct AnalyzeOutput<'a> {
    id: String,
    elapsed_ms: u64,
    #[serde(flatten)]
    result: &'a WorkflowResult,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Analyze {
            input,
            store,
            rubric,
            timeout_ms,
        } => cmd_analyze(&input, &store, rubric.as_deref(), timeout_ms).await,
        Commands::Latest { store } => cmd_latest(&store).await,
        Commands::Rubric { rubric } => cmd_rubric(rubric.as_deref()),
        Commands::Queue {
            store,
            rubric,
            capacity,
        } => cmd_queue(&store, rubric.as_deref(), capacity).await,
    }
}

fn load_rubric(path: Option<&Path>) -> Result<RubricTable> {
    match path {
        Some(path) => RubricTable::from_json_file(path)
            .with_context(|| format!("Failed to load rubric from {:?}", path)),
        None => Ok(RubricTable::standard()),
    }
}

fn build_workflow(rubric: Option<&Path>, config: WorkflowConfig) -> Result<Workflow> {
    let capability_config = CapabilityConfig::from_env();
    capability_config
        .validate()
        .context("Invalid capability configuration")?;
    let capability =
        HttpCapability::new(capability_config).context("Failed to create HTTP capability")?;
    let rubric = load_rubric(rubric)?;
    Workflow::new(Arc::new(capability), rubric, config).context("Failed to build workflow")
}

fn open_store(dir: &Path) -> Result<FsFeedbackStore> {
    FsFeedbackStore::new(dir).with_context(|| format!("Failed to open feedback store at {:?}", dir))
}

async fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read transcript from stdin")?;
        Ok(text)
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read transcript from {}", input))
    }
}

/// Analyze one transcript
async fn cmd_analyze(
    input: &str,
    store_dir: &Path,
    rubric: Option<&Path>,
    timeout_ms: u64,
) -> Result<()> {
    let text = read_input(input).await?;
    let workflow = build_workflow(
        rubric,
        WorkflowConfig::from_env().with_evaluator_timeout_ms(timeout_ms),
    )?;
    let store = open_store(store_dir)?;

    let timed = workflow.run_timed(&text).await;
    let record = timed.to_record(&text)?;
    store
        .save(&record)
        .await
        .context("Failed to store feedback")?;
    info!(id = %record.id, "Stored feedback");

    let output = AnalyzeOutput {
        id: record.id.to_string(),
        elapsed_ms: timed.elapsed_ms,
        result: &timed.result,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Show the most recent stored result
async fn cmd_latest(store_dir: &Path) -> Result<()> {
    let store = open_store(store_dir)?;
    match store.most_recent().await? {
        Some(record) => print_record(&record)?,
        None => println!("No feedback stored in {:?}", store_dir),
    }
    Ok(())
}

fn print_record(record: &FeedbackRecord) -> Result<()> {
    println!("feedback {}", record.id);
    println!(
        "Date:    {}",
        record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Input:   {}", record.input_digest.short());
    println!("Score:   {:.2}", record.total_score);
    println!("Elapsed: {} ms", record.elapsed_ms);
    println!();
    println!("    {}", record.summary);
    println!();
    println!("{}", serde_json::to_string_pretty(&record.reports)?);
    Ok(())
}

/// Print the rubric table
fn cmd_rubric(rubric: Option<&Path>) -> Result<()> {
    let table = load_rubric(rubric)?;
    for entry in table.rubrics() {
        println!("{}", entry.category);
        for c in &entry.characteristics {
            println!(
                "  {:<32} {:<24} {:<11} {:.2}",
                c.name,
                c.raw_field,
                format!("{:?}", c.orientation).to_lowercase(),
                c.weight
            );
        }
    }
    Ok(())
}

/// Feed stdin lines through the work queue
async fn cmd_queue(store_dir: &Path, rubric: Option<&Path>, capacity: usize) -> Result<()> {
    let workflow = Arc::new(build_workflow(rubric, WorkflowConfig::from_env())?);
    let store: Arc<dyn FeedbackStore> = Arc::new(open_store(store_dir)?);
    let (queue, worker) = WorkQueue::spawn(workflow, store, capacity);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut submitted = 0usize;
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        queue.submit(line).await?;
        submitted += 1;
    }
    queue.shutdown();

    let processed = worker.await.context("Work queue worker failed")?;
    println!("Processed {} of {} transcripts", processed, submitted);
    Ok(())
}
