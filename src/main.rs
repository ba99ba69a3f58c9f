use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gamegirl::config::settings_io::{load_settings, save_settings, settings_path};
use gamegirl::engine::engine::Engine;
use gamegirl::engine::llm_client::ChatCompletionsClient;
use gamegirl::engine::narrator::Narrator;
use gamegirl::model::game_save::next_story_path;
use gamegirl::ui::console::Terminal;

#[derive(Parser, Debug)]
#[command(name = "gamegirl", version, about = "Generative Story Game")]
struct Cli {
    /// Save file to resume instead of starting a new story
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Settings file (default: <config dir>/gamegirl/settings.json)
    #[arg(long, env = "GAMEGIRL_CONFIG")]
    config: Option<PathBuf>,

    /// Chat completions URL
    #[arg(long)]
    endpoint: Option<String>,

    #[arg(long)]
    model: Option<String>,

    /// Directory for new story_<n>.gsg files
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Write the effective settings to the settings file and exit
    #[arg(long)]
    init_config: bool,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they stay out of the story text.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("GAMEGIRL_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(settings_path);
    let mut settings = load_settings(&config_path);
    if let Some(endpoint) = cli.endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(model) = cli.model {
        settings.model = model;
    }
    if let Some(save_dir) = cli.save_dir {
        settings.save_dir = save_dir;
    }

    if cli.init_config {
        save_settings(&settings, &config_path)
            .with_context(|| format!("writing settings to {}", config_path.display()))?;
        println!("Settings written to {}", config_path.display());
        return Ok(());
    }

    let client = ChatCompletionsClient::new(&settings).context("building model client")?;
    let narrator = Narrator::new(client, settings.max_attempts, settings.max_tokens);

    let mut engine = match cli.file {
        Some(path) => Engine::resume(narrator, Terminal::new(), path.clone())
            .with_context(|| format!("resuming story from {}", path.display()))?,
        None => {
            let path = next_story_path(&settings.save_dir).with_context(|| {
                format!("scanning {} for saved stories", settings.save_dir.display())
            })?;
            tracing::info!(path = %path.display(), "starting new story");
            Engine::new(narrator, Terminal::new(), path)
        }
    };

    engine.run().context("story ended with an error")?;
    Ok(())
}
