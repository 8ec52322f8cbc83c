//! Topological Inventory API Client
//!
//! Read-only access to VM records: `GET {base}/v0.1/vms/{id}`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::{decode_json, ensure_success, trim_base, SourceInventory, VmLookup};
use crate::error::ClientError;
use crate::identity::{Identity, IDENTITY_HEADER};

pub struct TopologicalInventoryClient {
    client: Client,
    base_url: String,
}

impl TopologicalInventoryClient {
    /// `base_url` is the API root, e.g. `http://topology:8080/api/topological-inventory`
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }

    fn vm_url(&self, vm_id: &str) -> String {
        format!("{}/v0.1/vms/{}", self.base_url, vm_id)
    }
}

#[async_trait]
impl SourceInventory for TopologicalInventoryClient {
    async fn fetch_vm(&self, identity: &Identity, vm_id: &str) -> Result<VmLookup, ClientError> {
        let url = self.vm_url(vm_id);
        debug!(vm_id, %url, "Fetching VM from Topological Inventory");

        let response = self
            .client
            .get(&url)
            .header(IDENTITY_HEADER, identity.header_value())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(VmLookup::NotFound);
        }

        let response = ensure_success(response).await?;
        Ok(VmLookup::Found(decode_json(response).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::test_server;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::get;
    use axum::{Json, Router};

    async fn vm_handler(
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> Result<Json<serde_json::Value>, AxumStatus> {
        let expected = Identity::for_account("acct1");
        if headers.get(IDENTITY_HEADER).and_then(|v| v.to_str().ok())
            != Some(expected.header_value())
        {
            return Err(AxumStatus::UNAUTHORIZED);
        }

        match id.as_str() {
            "v1" => Ok(Json(serde_json::json!({
                "id": "v1",
                "source_ref": "vm-1",
                "extra": {"network": {"mac_addresses": ["aa:bb"]}}
            }))),
            "broken" => Err(AxumStatus::INTERNAL_SERVER_ERROR),
            _ => Err(AxumStatus::NOT_FOUND),
        }
    }

    async fn client() -> TopologicalInventoryClient {
        let router = Router::new().route("/api/v0.1/vms/:id", get(vm_handler));
        let addr = test_server::spawn(router).await;
        TopologicalInventoryClient::new(test_server::http_client(), &format!("http://{}/api/", addr))
    }

    #[tokio::test]
    async fn test_fetch_vm_found() {
        let client = client().await;
        let identity = Identity::for_account("acct1");

        let lookup = client.fetch_vm(&identity, "v1").await.unwrap();

        let VmLookup::Found(vm) = lookup else {
            panic!("expected VM to be found");
        };
        assert_eq!(vm.source_ref.as_deref(), Some("vm-1"));
        assert_eq!(vm.mac_addresses(), Some(&["aa:bb".to_string()][..]));
    }

    #[tokio::test]
    async fn test_fetch_vm_not_found() {
        let client = client().await;
        let identity = Identity::for_account("acct1");

        let lookup = client.fetch_vm(&identity, "missing").await.unwrap();
        assert_eq!(lookup, VmLookup::NotFound);
    }

    #[tokio::test]
    async fn test_fetch_vm_server_error() {
        let client = client().await;
        let identity = Identity::for_account("acct1");

        let err = client.fetch_vm(&identity, "broken").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
    }

    #[tokio::test]
    async fn test_fetch_vm_wrong_identity_is_error() {
        let client = client().await;
        let identity = Identity::for_account("someone-else");

        let err = client.fetch_vm(&identity, "v1").await.unwrap_err();
        assert!(matches!(err, ClientError::Status { .. }));
    }
}
