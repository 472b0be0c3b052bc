//! huginn: post classification CLI
//!
//! Classify a post against the triage taxonomy, or validate stored model
//! outputs and summarise how many needed fallback records.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use huginn::{
    CallOptions, CompletionProvider, Config, ResponseContract, ValidatedRecord,
    triage_system_prompt,
};

/// Huginn CLI
#[derive(Parser)]
#[command(name = "huginn")]
#[command(version = huginn::PKG_VERSION)]
#[command(about = "LLM post classification")]
struct Args {
    /// Config file (default: ~/.huginn/config.toml, then /etc/huginn/config.toml)
    #[arg(short, long, env = "HUGINN_CONFIG")]
    config: Option<PathBuf>,

    /// Fail instead of substituting fallback records
    #[arg(long)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one post
    Classify {
        /// Post text (or omit to read from stdin)
        text: Option<String>,
        /// Provider name (default: from config)
        #[arg(short, long)]
        provider: Option<String>,
        /// Model override
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Validate raw model outputs, one per line
    Validate {
        /// File of raw outputs
        file: PathBuf,
    },

    /// Print version and build information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let contract = if args.strict {
        ResponseContract::post_triage().strict()
    } else {
        ResponseContract::post_triage()
    };

    match args.command {
        Command::Classify {
            text,
            provider,
            model,
        } => {
            let text = resolve_text(text, "classify")?;
            let config = Config::load(args.config.as_deref())?.with_env_overrides()?;
            let mut builder =
                config.client_builder(provider.as_deref(), |name| std::env::var(name).ok())?;
            if let Some(model) = model {
                builder = builder.model(model);
            }
            let client = builder.build()?;

            let options =
                CallOptions::default().system_prompt(triage_system_prompt(contract.schema()));
            let record = client.classify(&text, &options, &contract).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);

            let stats = client.stats();
            tracing::info!(
                calls = stats.total_calls,
                avg_ms = stats.average_duration.as_millis() as u64,
                "done"
            );
        }

        Command::Validate { file } => {
            let content = std::fs::read_to_string(&file)?;
            let lines: Vec<&str> = content.lines().collect();
            let records = contract.process(&lines)?;
            print_report(&records);
        }

        Command::Version => {
            println!("huginn {}", huginn::version_string());
        }
    }

    Ok(())
}

/// Resolve text input from an optional CLI argument and/or stdin.
///
/// - arg only → arg
/// - stdin only → stdin
/// - both → `"{arg}\n\n{stdin}"`
/// - neither → error
fn resolve_text(arg: Option<String>, command: &str) -> Result<String, Box<dyn std::error::Error>> {
    let stdin_is_pipe = !io::stdin().is_terminal();
    let stdin_text = if stdin_is_pipe {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    } else {
        None
    };

    match (arg, stdin_text) {
        (Some(a), Some(s)) => Ok(format!("{a}\n\n{s}")),
        (Some(a), None) => Ok(a),
        (None, Some(s)) => Ok(s),
        (None, None) => {
            Err(format!("{command}: no input provided (pass text as argument or via stdin)").into())
        }
    }
}

fn print_report(records: &[ValidatedRecord]) {
    let report = ResponseContract::report(records);
    println!("total:        {}", report.total);
    println!("valid:        {}", report.valid);
    println!("defaulted:    {}", report.default);
    println!("success rate: {:.1}%", report.success_rate);
}
