mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, TrackReferralArgs};
use linkio_client::{LinkIo, PendingOutcome};
use linkio_core::{classify, DeviceIdentity, RedbStore};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.sdk_config()?;
    debug!("Config: {:?}", config);

    match &cli.command {
        Commands::Classify(args) => match classify(Some(args.uri.as_str()), &config) {
            Some(link) => {
                println!("{}", serde_json::to_string_pretty(&link)?);
                Ok(ExitCode::SUCCESS)
            }
            None => {
                println!("no match");
                Ok(ExitCode::from(1))
            }
        },
        Commands::DeviceId => {
            let store = open_store(&cli)?;
            println!("{}", DeviceIdentity::get_or_create(&*store)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::CheckPending => {
            let linkio = LinkIo::new(config, open_store(&cli)?)?;
            info!("Checking pending link for device {}", linkio.device_id()?);
            match linkio.check_pending_link_now().await {
                PendingOutcome::Delivered(link) | PendingOutcome::Buffered(link) => {
                    println!("{}", serde_json::to_string_pretty(&link)?);
                    Ok(ExitCode::SUCCESS)
                }
                PendingOutcome::NoPendingLink | PendingOutcome::AlreadyInFlight => {
                    println!("no pending link");
                    Ok(ExitCode::from(1))
                }
            }
        }
        Commands::TrackReferral(args) => {
            let linkio = LinkIo::new(config, open_store(&cli)?)?;
            let accepted = track_referral(&linkio, args).await?;
            println!("{}", accepted);
            Ok(if accepted {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
    }
}

fn open_store(cli: &Cli) -> Result<Arc<RedbStore>> {
    let path = cli.db_path();
    let store = RedbStore::open(&path)
        .with_context(|| format!("opening store at {}", path.display()))?;
    Ok(Arc::new(store))
}

async fn track_referral(linkio: &LinkIo, args: &TrackReferralArgs) -> Result<bool> {
    let metadata = args
        .metadata
        .as_deref()
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .context("--metadata must be valid JSON")?;
    Ok(linkio
        .track_referral_now(&args.code, &args.user, metadata)
        .await)
}
