use anyhow::Result;
use clap::Parser;

use tokenscope_cli::app::{self, OneShot};

#[derive(Parser)]
#[command(name = "tokenscope")]
#[command(about = "Tokenscope - inspect a language model's next-token distribution at any token")]
#[command(version)]
struct Cli {
    /// Tokenize this text, print one distribution and exit
    #[arg(short, long)]
    text: Option<String>,

    /// Token index (0-based) to inspect with --text; omit for the token after the text
    #[arg(short, long, requires = "text")]
    index: Option<usize>,

    /// Model to load (HuggingFace model ID or local path)
    #[arg(short, long)]
    model: Option<String>,

    /// Custom .pt weights loaded into the model
    #[arg(long)]
    weights: Option<String>,

    /// Model server base URL
    #[arg(long)]
    api_base: Option<String>,

    /// Quiet period before re-tokenizing, in milliseconds
    #[arg(long)]
    debounce_ms: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = tokenscope_core::Settings::load();

    if let Some(base) = cli.api_base {
        settings = settings.with_api_base(base);
    }
    if let Some(ms) = cli.debounce_ms {
        settings.session.debounce_ms = ms;
    }

    if let Some(text) = cli.text {
        app::run_once(
            &settings,
            OneShot {
                text,
                index: cli.index,
                model: cli.model,
                weights: cli.weights,
            },
        )
        .await?;
    } else {
        if let Some(model) = cli.model {
            settings.model.default_path = model;
        }
        if cli.weights.is_some() {
            settings.model.custom_weights_path = cli.weights;
        }
        app::run_interactive(settings).await?;
    }

    Ok(())
}
