//! host-inventory-sync worker binary

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use host_inventory_sync::clients::{HostInventoryClient, IngressApiClient, TopologicalInventoryClient};
use host_inventory_sync::config::{Cli, Commands, LogFormat, RunArgs};
use host_inventory_sync::{health, EventSubscriber, HostInventorySync, Identity};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format, cli.verbose)?;

    let http_client = Client::builder()
        .user_agent(concat!("host-inventory-sync/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")?;

    let host_inventory_api = cli
        .host_inventory_api
        .context("--host-inventory-api (HOST_INVENTORY_API) is required")?;
    let host_inventory = HostInventoryClient::new(http_client.clone(), &host_inventory_api);

    match cli.command {
        Commands::Run(args) => run(args, http_client, host_inventory).await,
        Commands::ListHosts { tenant } => {
            let hosts = host_inventory
                .list_hosts(&Identity::for_account(&tenant))
                .await
                .context("Failed to list Host Inventory hosts")?;
            println!("{}", serde_json::to_string_pretty(&hosts)?);
            Ok(())
        }
    }
}

fn init_tracing(format: LogFormat, verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    }
    .map_err(|err| anyhow::anyhow!(err))
}

async fn run(args: RunArgs, http_client: Client, host_inventory: HostInventoryClient) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        topic = %args.topic,
        "Starting host inventory sync"
    );

    if let Some(port) = args.health_port {
        tokio::spawn(async move {
            if let Err(err) = health::serve(port).await {
                error!(error = %err, "Health endpoint stopped");
            }
        });
    }

    let sync = HostInventorySync::new(
        Arc::new(TopologicalInventoryClient::new(
            http_client.clone(),
            &args.topological_inventory_url,
        )),
        Arc::new(host_inventory),
        Arc::new(IngressApiClient::new(http_client, &args.ingress_api_url)),
    );

    let subscriber = EventSubscriber::connect(&args.subscriber_config())
        .await
        .context("Failed to subscribe to persister output")?;
    subscriber
        .run(&sync, shutdown_signal())
        .await
        .context("Subscription ended with a fatal error")?;

    info!("Host inventory sync stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
