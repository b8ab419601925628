use std::process::ExitCode;

use clap::Parser;
use icebreaker::cli::handle_chat;
use icebreaker::cli::handle_config_command;
use icebreaker::cli::handle_diagnose;
use icebreaker::cli::handle_self_test;
use icebreaker::cli::handle_serve;
use icebreaker::cli::Cli;
use icebreaker::cli::Commands;
use icebreaker::AppConfig;
use icebreaker::Result;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error[{}]: {}", e.kind(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load_from(cli.config.as_deref())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    icebreaker::logging::init_logging(&config)?;
    info!(
        "Configuration loaded: provider {} with model {}",
        config.provider.kind,
        config.llm_model()
    );

    match &cli.command {
        Some(Commands::Serve { host, port }) => {
            handle_serve(&config, host.clone(), *port).await
        }
        Some(Commands::Config) => handle_config_command(&config),
        Some(Commands::Diagnose) => handle_diagnose(&config, cli.api_key.as_deref()).await,
        None if cli.test => handle_self_test(&config, cli.model.as_deref()).await,
        None => {
            handle_chat(
                &config,
                cli.profile_request(),
                cli.model.as_deref(),
                &cli.question,
                cli.verbose,
            )
            .await
        }
    }
}
