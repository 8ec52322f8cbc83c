//! Inventory API Clients
//!
//! Trait-based seams for the three services the processor talks to, plus the
//! reqwest implementations used in production.

use async_trait::async_trait;
use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::identity::Identity;
use crate::types::{CreateHostRequest, CreatedHost, VmHostMapping, VmRecord};

pub mod host_inventory;
pub mod ingress;
pub mod topological;

pub use host_inventory::HostInventoryClient;
pub use ingress::IngressApiClient;
pub use topological::TopologicalInventoryClient;

/// Result of looking a VM up by id
#[derive(Debug, Clone, PartialEq)]
pub enum VmLookup {
    Found(VmRecord),
    NotFound,
}

/// Source of VM facts (Topological Inventory)
#[async_trait]
pub trait SourceInventory: Send + Sync {
    /// Fetch one VM; a 404 is `VmLookup::NotFound`, not an error
    async fn fetch_vm(&self, identity: &Identity, vm_id: &str) -> Result<VmLookup, ClientError>;
}

/// Destination for host records (Host Inventory)
#[async_trait]
pub trait HostInventory: Send + Sync {
    async fn create_host(
        &self,
        identity: &Identity,
        request: &CreateHostRequest,
    ) -> Result<CreatedHost, ClientError>;
}

/// Write-back of VM to host mappings (Topological Inventory Ingress API)
#[async_trait]
pub trait InventoryWriter: Send + Sync {
    /// Save the mappings as partial `vms` data for `source`
    async fn save_vms(
        &self,
        source: Option<&str>,
        mappings: &[VmHostMapping],
    ) -> Result<(), ClientError>;
}

/// Turn a non-success response into `ClientError::Status`
async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status { status, url, body })
}

/// Decode a JSON body, keeping the URL for the error
async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let url = response.url().to_string();
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode { url, source })
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
pub(crate) mod test_server {
    use axum::Router;
    use tokio::net::TcpListener;

    /// Serve `router` on an ephemeral local port, returning `127.0.0.1:port`
    pub async fn spawn(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr.to_string()
    }

    /// A local address nothing listens on
    pub async fn closed_addr() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr.to_string()
    }

    /// Client that never routes the local test server through a proxy
    pub fn http_client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }
}
