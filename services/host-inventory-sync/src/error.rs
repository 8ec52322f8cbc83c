//! Error types for the sync worker

use rdkafka::error::KafkaError;
use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to one of the inventory APIs
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport level failure (connect, TLS, reset)
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("{url} returned {status}: {body}")]
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },

    /// The response body was not the JSON we expected
    #[error("Failed to parse response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reasons a single event was dropped
#[derive(Debug, Error)]
pub enum SyncError {
    /// Message body is not a valid event
    #[error("Invalid event payload")]
    InvalidPayload(#[from] serde_json::Error),

    /// Event has no `external_tenant`
    #[error("Event is missing external_tenant")]
    MissingTenant,

    /// Fetching a VM from Topological Inventory failed
    #[error("Failed to fetch VM {vm_id} from Topological Inventory")]
    FetchVm {
        vm_id: String,
        #[source]
        source: ClientError,
    },

    /// Creating the Host Inventory host failed
    #[error("Failed to create host for VM {}", .source_ref.as_deref().unwrap_or("<unknown>"))]
    CreateHost {
        source_ref: Option<String>,
        #[source]
        source: ClientError,
    },

    /// Saving the mappings through the Ingress API failed
    #[error("Failed to save {count} VMs to Topological Inventory")]
    SaveVms {
        count: usize,
        #[source]
        source: ClientError,
    },
}

impl SyncError {
    /// Short label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::InvalidPayload(_) => "invalid_payload",
            SyncError::MissingTenant => "missing_tenant",
            SyncError::FetchVm { .. } => "fetch_vm",
            SyncError::CreateHost { .. } => "create_host",
            SyncError::SaveVms { .. } => "save_vms",
        }
    }
}

/// Failures that stop the subscriber loop
#[derive(Debug, Error)]
pub enum SubscriberError {
    #[error("Failed to create Kafka consumer")]
    Create(#[source] KafkaError),

    #[error("Failed to connect to Kafka at {brokers}")]
    Connect {
        brokers: String,
        #[source]
        source: KafkaError,
    },

    #[error("Kafka connect task failed")]
    Join(#[from] tokio::task::JoinError),

    #[error("Fatal Kafka error")]
    Fatal(#[source] KafkaError),
}

/// Render an error with every `source()` below it, outermost first
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut chain = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        current = cause.source();
    }
    chain
}
