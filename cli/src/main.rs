//! Agriforms CLI
//!
//! Operator tooling for form schemas and attachments.
//!
//! # Usage
//!
//! ```bash
//! agriforms schema check forms/aide_scolaire.json
//! agriforms schema fmt forms/aide_scolaire.json --write
//! agriforms schema import-legacy rows.json --key aide_scolaire --title "Aide scolaire"
//! agriforms schema list
//! agriforms attach check scan.pdf --mime application/pdf
//! agriforms fill forms/aide_scolaire.json --inputs answers.json --format yaml
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "agriforms")]
#[command(version)]
#[command(about = "Agriforms schema and attachment tooling", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(long, env = "AGRIFORMS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true)]
    format: Option<output::OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and convert form schemas
    Schema {
        #[command(subcommand)]
        action: SchemaCommands,
    },
    /// Validate attachments
    Attach {
        #[command(subcommand)]
        action: AttachCommands,
    },
    /// Replay inputs through a form and print the submission
    Fill {
        /// Schema file
        schema: PathBuf,
        /// JSON list of inputs
        #[arg(long)]
        inputs: PathBuf,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Parse and lint a schema
    Check { file: PathBuf },
    /// Rewrite a schema in canonical form
    Fmt {
        file: PathBuf,
        /// Overwrite the file instead of printing
        #[arg(long)]
        write: bool,
    },
    /// Convert stored field rows into a schema
    ImportLegacy {
        rows: PathBuf,
        #[arg(long)]
        key: String,
        #[arg(long)]
        title: Option<String>,
    },
    /// List schemas in the configured schema directory
    List,
}

#[derive(Subcommand)]
enum AttachCommands {
    /// Run the attachment validator on a file
    Check {
        file: PathBuf,
        /// Declared content type
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,
        /// Override the size limit
        #[arg(long)]
        max_bytes: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let profile = config::Profile::load()?;
    let format = cli.format.or(profile.default_format).unwrap_or_default();
    let engine = profile.engine_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Schema { action } => commands::schema::handle(action, &engine, format).await,
        Commands::Attach { action } => commands::attach::handle(action, &engine, format),
        Commands::Fill { schema, inputs } => commands::fill::handle(&schema, &inputs, &engine, format),
    }
}
