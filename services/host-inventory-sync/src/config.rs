//! Command line and environment configuration

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::subscriber::SubscriberConfig;

pub const DEFAULT_TOPIC: &str = "platform.topological-inventory.persister-output";
pub const DEFAULT_PERSIST_REF: &str = "host_inventory_sync_worker";
pub const DEFAULT_CLIENT_REF: &str = "persister-worker";

#[derive(Parser, Debug)]
#[command(name = "host-inventory-sync")]
#[command(about = "Registers Topological Inventory VMs in Host Inventory", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Host Inventory API location without scheme, e.g. `inventory:8080/api/inventory/`
    #[arg(long, env = "HOST_INVENTORY_API", global = true)]
    pub host_inventory_api: Option<String>,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json, global = true)]
    pub log_format: LogFormat,

    /// Enable verbose logging (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Consume persister events and sync hosts until stopped
    Run(RunArgs),

    /// Print the Host Inventory hosts visible to a tenant
    ListHosts {
        /// Tenant account number
        #[arg(long)]
        tenant: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Topological Inventory API root
    #[arg(long, env = "TOPOLOGICAL_INVENTORY_URL")]
    pub topological_inventory_url: String,

    /// Topological Inventory Ingress API root
    #[arg(long, env = "INGRESS_API_URL")]
    pub ingress_api_url: String,

    /// Kafka host
    #[arg(long, env = "QUEUE_HOST", default_value = "localhost")]
    pub queue_host: String,

    /// Kafka port
    #[arg(long, env = "QUEUE_PORT", default_value_t = 9092)]
    pub queue_port: u16,

    /// Topic carrying persister output
    #[arg(long, env = "SYNC_TOPIC", default_value = DEFAULT_TOPIC)]
    pub topic: String,

    /// Consumer group the offsets are kept under
    #[arg(long, env = "SYNC_PERSIST_REF", default_value = DEFAULT_PERSIST_REF)]
    pub persist_ref: String,

    /// Kafka client id
    #[arg(long, env = "SYNC_CLIENT_REF", default_value = DEFAULT_CLIENT_REF)]
    pub client_ref: String,

    /// Serve `GET /health` on this port
    #[arg(long, env = "HEALTH_PORT")]
    pub health_port: Option<u16>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl RunArgs {
    pub fn subscriber_config(&self) -> SubscriberConfig {
        SubscriberConfig {
            queue_host: self.queue_host.clone(),
            queue_port: self.queue_port,
            topic: self.topic.clone(),
            persist_ref: self.persist_ref.clone(),
            client_ref: self.client_ref.clone(),
        }
    }
}
