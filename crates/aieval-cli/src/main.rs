//! aieval CLI: grade assignment submissions against an answer key.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

use commands::evaluate::EvaluateArgs;
use commands::export::ExportFormat;

#[derive(Parser)]
#[command(
    name = "aieval",
    version,
    about = "LLM assignment evaluator with AI-authorship detection"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Session file (overrides `session_path` from the config)
    #[arg(long, global = true)]
    session: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate submissions against an answer key and add them to the session
    Evaluate(EvaluateArgs),

    /// Show the session's result table and summary statistics
    Dashboard,

    /// Export the session's result table
    Export {
        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Output file (`-` for stdout). Defaults to student_evaluations.<ext>
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Clear the session's result table
    Reset,

    /// Show how a document splits into numbered answers
    Segment {
        /// Document to segment (.pdf or .docx)
        file: PathBuf,

        /// Read the file as plain UTF-8 text instead of extracting it
        #[arg(long)]
        plain: bool,

        /// Print the segments as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,
    },

    /// Create a starter aieval.toml
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("aieval=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;
    let session = cli.session;

    let result = match cli.command {
        Commands::Evaluate(args) => commands::evaluate::execute(args, config, session).await,
        Commands::Dashboard => commands::dashboard::execute(config, session),
        Commands::Export { format, output } => {
            commands::export::execute(format, output, config, session)
        }
        Commands::Reset => commands::reset::execute(config, session),
        Commands::Segment { file, plain, json } => {
            commands::segment::execute(file, plain, json, config).await
        }
        Commands::ListModels { provider } => commands::list_models::execute(provider, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
