//! finq CLI
//!
//! Ask questions of the mini-Bloomberg dataset in natural language.

use clap::{Parser, Subcommand};
use finq::llm::{CompletionService, LlmClient};
use finq::otel::init_tracing;
use finq::pipeline::Pipeline;
use finq::query::{GateMode, QueryExecutor, SafetyGate, SqliteStore};
use finq::render::{render_answer_json, render_result, render_table, OutputFormat};
use finq::schema::{bootstrap, SCHEMA_DESCRIPTOR};
use finq::session::{describe_error, SessionInput};
use finq::types::{Question, SyntheticQuery};
use finq::Config;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;

/// finq - natural-language questions over a financial SQLite dataset
#[derive(Parser)]
#[command(name = "finq")]
#[command(about = "Translate questions into read-only SQL, run them, and summarize the answer", long_about = None)]
#[command(version)]
struct Cli {
    /// Database path (overrides FINQ_DB_PATH)
    #[arg(long, global = true)]
    db_path: Option<String>,

    /// Completion model (overrides FINQ_LLM_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Safety gate mode (overrides FINQ_GATE)
    #[arg(long, global = true, value_enum)]
    gate: Option<GateMode>,

    /// Completion call timeout in seconds (overrides FINQ_LLM_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session (default)
    Repl,

    /// Answer a single question
    Ask {
        /// Question in natural language
        question: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Create tables and load seed data
    Init,

    /// Run SQL through the safety gate without the language model
    Query {
        /// SQL query string
        sql: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Print the schema descriptor given to the model
    Schema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = init_tracing("finq", "warn", cli.log_json)?;

    let mut config = Config::load()?;
    if let Some(path) = &cli.db_path {
        config.db_path = finq::config::expand_path(path);
    }
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(gate) = cli.gate {
        config.gate = gate;
    }
    if let Some(secs) = cli.timeout_secs {
        config.timeout_secs = secs;
    }

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Repl => cmd_repl(&config).await?,
        Commands::Ask { question, format } => cmd_ask(&config, &question, format).await?,
        Commands::Init => cmd_init(&config)?,
        Commands::Query { sql, format } => cmd_query(&config, &sql, format)?,
        Commands::Schema => println!("{}", SCHEMA_DESCRIPTOR.trim()),
    }

    Ok(())
}

fn build_pipeline(config: &Config) -> anyhow::Result<Pipeline> {
    bootstrap(&config.db_path)?;

    let llm: Arc<dyn CompletionService> = Arc::new(LlmClient::from_config(config)?);
    tracing::info!(model = llm.model(), gate = %config.gate, db = %config.db_path.display(), "Pipeline ready");

    Ok(Pipeline::from_config(config, llm))
}

fn cmd_init(config: &Config) -> anyhow::Result<()> {
    bootstrap(&config.db_path)?;

    println!("✓ Database initialized");
    println!("  Path: {}", config.db_path.display());

    Ok(())
}

fn cmd_query(config: &Config, sql: &str, format: OutputFormat) -> anyhow::Result<()> {
    let executor = QueryExecutor::new(
        Arc::new(SqliteStore::new(&config.db_path)),
        SafetyGate::new(config.gate),
    );

    let result = executor.execute(&SyntheticQuery::new(sql.trim()))?;
    println!("{}", render_result(&result, format)?);

    Ok(())
}

async fn cmd_ask(config: &Config, question: &str, format: OutputFormat) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config)?;
    let answer = pipeline.ask(question).await?;

    match format {
        OutputFormat::Json => println!("{}", render_answer_json(&answer)?),
        OutputFormat::Csv => print!("{}", render_result(&answer.result, format)?),
        OutputFormat::Table => {
            println!("[Generated SQL]: {}", answer.query);
            println!("\n[Raw Results]:\n{}", render_table(&answer.result));
            if let Some(summary) = answer.summary_text() {
                println!("\n[AI Answer]: {}", summary);
            }
        }
    }

    if let Err(e) = answer.summary {
        anyhow::bail!(describe_error(&e));
    }

    Ok(())
}

async fn cmd_repl(config: &Config) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config)?;
    let mut editor = DefaultEditor::new()?;

    println!("--- Mini-Bloomberg AI Terminal ---");
    println!("Type \"quit\" or \"exit\" to leave.");

    loop {
        let line = match editor.readline("\nQuestion: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        match SessionInput::parse(&line) {
            SessionInput::Empty => continue,
            SessionInput::Exit => break,
            SessionInput::Question(question) => {
                let _ = editor.add_history_entry(question.as_str());
                if let Err(e) = answer_interactively(&pipeline, &question).await {
                    println!("\n{}\n", describe_error(&e));
                }
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}

/// Run one question, printing each stage's output as soon as it exists.
async fn answer_interactively(pipeline: &Pipeline, input: &str) -> finq::Result<()> {
    let question = Question::new(input)?;

    let query = pipeline.synthesize(&question).await?;
    println!("\n[Generated SQL]: {}", query);

    let result = pipeline.execute(&query)?;
    println!("\n[Raw Results]:\n{}", render_table(&result));

    let summary = pipeline.summarize(&question, &query, &result).await?;
    println!("\n[AI Answer]: {}\n", summary);

    Ok(())
}
