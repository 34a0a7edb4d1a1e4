//! Versify CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use versify::cli::commands::{self, AddArgs};
use versify::cli::{Cli, Commands};
use versify::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("versify={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.uploads_dir())?;

    // Execute command
    match cli.command {
        Commands::Add {
            file,
            title,
            artist,
            genre,
            language,
            uploader,
            generate,
        } => {
            let args = AddArgs {
                file,
                title,
                artist,
                genre,
                language,
                uploader,
                generate,
            };
            commands::run_add(args, settings).await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Show { id } => {
            commands::run_show(id, settings).await?;
        }

        Commands::Lyrics { id, audio } => {
            commands::run_lyrics(id, audio, settings).await?;
        }

        Commands::Remove { id, keep_file } => {
            commands::run_remove(id, keep_file, settings).await?;
        }

        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| settings.server.host.clone());
            let port = port.unwrap_or(settings.server.port);
            commands::run_serve(&host, port, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, config_path.as_deref())?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings, config_path)?;
        }
    }

    Ok(())
}
