// Entrypoint for the CLI application.
// - Keeps `main` small: pick a config file, build the orchestrator and hand
//   it to the UI loop.
// - Only configuration problems end the program; failed commands are
//   reported inside the menu.

use anyhow::Context;
use dialoguer::Input;
use photoapp_cli::config::{default_config_path, ClientConfig, CONFIG_ENV};
use photoapp_cli::{ui::main_menu, Orchestrator};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they stay out of the menu output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    println!("** Welcome to the photoapp client **");
    println!();

    let config_path = match std::env::var(CONFIG_ENV) {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => prompt_config_path()?,
    };

    let config = ClientConfig::load(&config_path)
        .and_then(ClientConfig::with_env_override)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let orch = Orchestrator::connect(config).context("creating web service client")?;

    // Start the interactive menu. This call blocks until the user exits.
    main_menu(&orch)?;
    Ok(())
}

/// Ask which config file to use; ENTER keeps the default.
fn prompt_config_path() -> anyhow::Result<PathBuf> {
    let default = default_config_path();
    let answer: String = Input::new()
        .with_prompt("Config file for this session")
        .default(default.display().to_string())
        .interact_text()?;
    Ok(PathBuf::from(answer.trim()))
}
