use anyhow::Result;
use clap::Parser;
use std::path::Path;

use postgate::cli::commands::init_config::InitConfigCommand;
use postgate::cli::commands::posts::{CreateCommand, ListCommand, ShowCommand, UpdateCommand};
use postgate::cli::commands::transition::TransitionCommand;
use postgate::cli::commands::{build_service, show_how_to_get_started, CliService};
use postgate::cli::{Cli, Commands};
use postgate::lifecycle::LifecycleEvent;
use postgate::store::PostId;
use postgate::{init_config, init_telemetry, shutdown_telemetry};

fn main() {
    let cli = Cli::parse();

    let result = tokio::runtime::Runtime::new()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| runtime.block_on(run(cli)));
    shutdown_telemetry();

    if let Err(e) = result {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        None => {
            show_how_to_get_started();
            Ok(())
        }
        // Must work before any configuration exists
        Some(Commands::InitConfig { path, force }) => InitConfigCommand { path, force }.execute(),
        Some(Commands::Create { title, content }) => {
            let service = open_service(config_path).await?;
            CreateCommand { title, content }.execute(&service).await
        }
        Some(Commands::Update { id, title, content }) => {
            let service = open_service(config_path).await?;
            UpdateCommand { id, title, content }.execute(&service).await
        }
        Some(Commands::Show { id }) => {
            let service = open_service(config_path).await?;
            ShowCommand { id }.execute(&service).await
        }
        Some(Commands::List { scope }) => {
            let service = open_service(config_path).await?;
            ListCommand {
                filter: scope.into(),
            }
            .execute(&service)
            .await
        }
        Some(Commands::VerifyAi { id }) => {
            transition(config_path, id, LifecycleEvent::VerifyWithAi).await
        }
        Some(Commands::Verify { id }) => transition(config_path, id, LifecycleEvent::Verify).await,
        Some(Commands::Publish { id }) => transition(config_path, id, LifecycleEvent::Publish).await,
        Some(Commands::Delete { id }) => transition(config_path, id, LifecycleEvent::Delete).await,
        Some(Commands::Restore { id }) => transition(config_path, id, LifecycleEvent::Restore).await,
    }
}

/// Load configuration, start logging and open the configured store
async fn open_service(config_path: Option<&Path>) -> Result<CliService> {
    let config = init_config(config_path)?;
    init_telemetry(
        &config.observability.log_level,
        config.observability.json_logs,
    )?;
    build_service(config).await
}

async fn transition(config_path: Option<&Path>, id: PostId, event: LifecycleEvent) -> Result<()> {
    let service = open_service(config_path).await?;
    TransitionCommand::new(id, event).execute(&service).await
}
