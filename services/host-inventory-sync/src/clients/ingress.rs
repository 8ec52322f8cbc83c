//! Topological Inventory Ingress API Client
//!
//! Saves VM to host mappings back into Topological Inventory. The mappings
//! travel as `partial_data` of the `vms` collection: only the listed VMs are
//! touched, every other VM of the source stays as it is.

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use super::{ensure_success, trim_base, InventoryWriter};
use crate::error::ClientError;
use crate::types::{IngressInventory, VmHostMapping};

pub struct IngressApiClient {
    client: Client,
    base_url: String,
}

impl IngressApiClient {
    /// `base_url` is the API root, e.g.
    /// `http://ingress:8080/api/topological-inventory-ingress-api/v0`
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }

    fn inventory_url(&self) -> String {
        format!("{}/inventory", self.base_url)
    }
}

#[async_trait]
impl InventoryWriter for IngressApiClient {
    async fn save_vms(
        &self,
        source: Option<&str>,
        mappings: &[VmHostMapping],
    ) -> Result<(), ClientError> {
        let inventory = IngressInventory::partial_vms(source, mappings);

        let response = self
            .client
            .post(self.inventory_url())
            .json(&inventory)
            .send()
            .await?;
        ensure_success(response).await?;

        info!(
            source = source.unwrap_or_default(),
            count = mappings.len(),
            "Saved VMs to Topological Inventory"
        );
        Ok(())
    }
}
