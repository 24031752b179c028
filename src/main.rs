use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use parley::retrieval::{ChunkRetriever, Retriever};
use parley::speech::{CommandCapture, CommandSpeech, ConsoleCapture, ConsoleOutput};
use parley::{Assistant, Config, OllamaGenerator};

/// Parley - voice-activated query assistant
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Path to config file (defaults to the platform config dir)
    #[arg(short, long, env = "PARLEY_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Typed conversation loop (no audio)
    Console,
    /// Voice mode without console output (for service managers)
    Headless,
    /// Validate the knowledge chunk file and report stats
    Ingest {
        /// Chunk file to check (defaults to the configured one)
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,parley=info",
        1 => "info,parley=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match cli.config {
        Some(path) => Config::load_from(Some(&path))?,
        None => Config::load()?,
    };
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Some(Command::Console) => run_console(&config).await,
        Some(Command::Headless) => run_voice(&config, true).await,
        Some(Command::Ingest { file }) => run_ingest(&config, file.as_deref()),
        None => run_voice(&config, false).await,
    }
}

/// Build the retriever, degrading gracefully when the chunk file is missing
fn build_retriever(config: &Config) -> Option<Arc<dyn Retriever>> {
    let path = config.retrieval.chunks_file.as_ref()?;
    match ChunkRetriever::load(path) {
        Ok(retriever) => Some(Arc::new(retriever)),
        Err(e) => {
            tracing::warn!(error = %e, "knowledge base unavailable, continuing without it");
            None
        }
    }
}

/// Voice mode: wake detection plus spoken sessions until interrupted
async fn run_voice(config: &Config, headless: bool) -> anyhow::Result<()> {
    let capture_command = config.speech.capture_command.as_deref().ok_or_else(|| {
        anyhow::anyhow!("voice mode requires speech.capture_command in the config")
    })?;
    let speak_command = config.speech.speak_command.as_deref().ok_or_else(|| {
        anyhow::anyhow!("voice mode requires speech.speak_command in the config")
    })?;

    let capture = Arc::new(CommandCapture::new(capture_command)?);
    let speech = Arc::new(CommandSpeech::new(speak_command)?);
    let retriever = build_retriever(config);
    let generator = Arc::new(OllamaGenerator::new(&config.generator)?);

    let assistant = Assistant::new(config, capture, speech, retriever, generator)?;

    if !headless {
        println!("Parley voice assistant");
        println!("Wake phrases: {}", config.wake.phrases.join(", "));
        println!("Press Ctrl+C to stop\n");
    }

    assistant.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    assistant.shutdown().await;

    Ok(())
}

/// Console mode: typed questions, printed answers
async fn run_console(config: &Config) -> anyhow::Result<()> {
    let capture = Arc::new(ConsoleCapture::new());
    let speech = Arc::new(ConsoleOutput);
    let retriever = build_retriever(config);
    let generator = Arc::new(OllamaGenerator::new(&config.generator)?);

    let assistant = Assistant::new(config, capture, speech, retriever, generator)?;
    assistant.run_console().await?;

    Ok(())
}

/// Validate the chunk file and print index stats
fn run_ingest(config: &Config, file: Option<&std::path::Path>) -> anyhow::Result<()> {
    let path = file
        .or(config.retrieval.chunks_file.as_deref())
        .ok_or_else(|| anyhow::anyhow!("no chunk file given and none configured"))?;

    let retriever = ChunkRetriever::load(path)?;
    println!("Chunk index OK: {} chunks in {}", retriever.len(), path.display());

    if retriever.is_empty() {
        println!("Warning: the index is empty; knowledge questions will route to general answers");
    }

    Ok(())
}
