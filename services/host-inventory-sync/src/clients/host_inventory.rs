//! Host Inventory API Client
//!
//! Creates host records from VM network facts. The configured API location
//! is a host and path prefix without scheme, e.g.
//! `inventory:8080/r/insights/platform/inventory/api/`, and is joined
//! verbatim with `v1/hosts`.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::{decode_json, ensure_success, HostInventory};
use crate::error::ClientError;
use crate::identity::{Identity, IDENTITY_HEADER};
use crate::types::{CreateHostRequest, CreatedHost};

pub struct HostInventoryClient {
    client: Client,
    api_location: String,
}

impl HostInventoryClient {
    pub fn new(client: Client, api_location: &str) -> Self {
        Self {
            client,
            api_location: api_location.to_string(),
        }
    }

    fn hosts_url(&self) -> String {
        format!("http://{}v1/hosts", self.api_location)
    }

    /// List the hosts visible to `identity`
    pub async fn list_hosts(&self, identity: &Identity) -> Result<serde_json::Value, ClientError> {
        let url = self.hosts_url();
        debug!(%url, "Listing Host Inventory hosts");

        let response = self
            .client
            .get(&url)
            .header(IDENTITY_HEADER, identity.header_value())
            .send()
            .await?;

        decode_json(ensure_success(response).await?).await
    }
}

#[async_trait]
impl HostInventory for HostInventoryClient {
    async fn create_host(
        &self,
        identity: &Identity,
        request: &CreateHostRequest,
    ) -> Result<CreatedHost, ClientError> {
        let url = self.hosts_url();
        debug!(%url, macs = ?request.mac_addresses, "Creating Host Inventory host");

        let response = self
            .client
            .post(&url)
            .header(IDENTITY_HEADER, identity.header_value())
            .json(request)
            .send()
            .await?;

        let created: CreatedHost = decode_json(ensure_success(response).await?).await?;
        info!(host_id = %created.id, account = %request.account, "Created Host Inventory host");

        Ok(created)
    }
}
