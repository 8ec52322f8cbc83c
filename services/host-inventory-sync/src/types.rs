//! Host Inventory Sync Types
//!
//! Wire types for the persister event, the Topological Inventory VM record,
//! the Host Inventory host request and the Ingress API write-back.

use serde::{Deserialize, Deserializer, Serialize};

/// Inventory schema the write-back is tagged with
pub const INGRESS_SCHEMA: &str = "Default";

/// Collection the VM to host mappings are saved into
pub const VMS_COLLECTION: &str = "vms";

// ============================================================
// Inbound Event
// ============================================================

/// Persister output event naming the VMs a refresh touched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncEvent {
    /// Tenant account number
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub external_tenant: Option<String>,
    /// Source the refresh came from, echoed back on write-back
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub payload: Option<EventPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub vms: Option<VmChanges>,
}

/// VM references grouped by change kind
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VmChanges {
    #[serde(default)]
    pub created: Option<Vec<VmReference>>,
    #[serde(default)]
    pub updated: Option<Vec<VmReference>>,
    #[serde(default)]
    pub deleted: Option<Vec<VmReference>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VmReference {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

impl SyncEvent {
    /// VM ids across updated, created and deleted, in that order.
    ///
    /// Ids listed under several change kinds appear once per listing.
    pub fn changed_vm_ids(&self) -> Vec<String> {
        let Some(vms) = self.payload.as_ref().and_then(|p| p.vms.as_ref()) else {
            return Vec::new();
        };

        [&vms.updated, &vms.created, &vms.deleted]
            .into_iter()
            .flatten()
            .flatten()
            .map(|vm| vm.id.clone())
            .collect()
    }
}

/// Topological Inventory ids are bigints and may be serialized either way.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_to_string(serde_json::Value::deserialize(deserializer)?)
}

/// Account numbers are digits and some producers send them unquoted
fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => scalar_to_string(value).map(Some),
    }
}

fn scalar_to_string<E: serde::de::Error>(value: serde_json::Value) -> Result<String, E> {
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(E::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

// ============================================================
// Topological Inventory
// ============================================================

/// VM as returned by `GET /v0.1/vms/{id}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VmRecord {
    #[serde(default)]
    pub source_ref: Option<String>,
    /// Set once the VM has been registered in Host Inventory
    #[serde(default)]
    pub host_inventory_uuid: Option<String>,
    #[serde(default)]
    pub extra: Option<VmExtra>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VmExtra {
    #[serde(default)]
    pub network: Option<VmNetwork>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VmNetwork {
    #[serde(default)]
    pub mac_addresses: Option<Vec<String>>,
}

impl VmRecord {
    /// MAC addresses, or `None` when the network facts are missing or empty
    pub fn mac_addresses(&self) -> Option<&[String]> {
        self.extra
            .as_ref()
            .and_then(|extra| extra.network.as_ref())
            .and_then(|network| network.mac_addresses.as_deref())
            .filter(|macs| !macs.is_empty())
    }

    pub fn is_registered(&self) -> bool {
        self.host_inventory_uuid.is_some()
    }
}

// ============================================================
// Host Inventory
// ============================================================

/// Body of `POST /v1/hosts`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateHostRequest {
    pub mac_addresses: Vec<String>,
    pub account: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedHost {
    pub id: String,
}

// ============================================================
// Ingress API
// ============================================================

/// Partial VM data linking a VM to its Host Inventory host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmHostMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    pub host_inventory_uuid: String,
}

/// Body of the Ingress API `save_inventory` call
#[derive(Debug, Clone, Serialize)]
pub struct IngressInventory<'a> {
    pub schema: IngressSchema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'a str>,
    pub collections: Vec<InventoryCollection<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngressSchema {
    pub name: String,
}

/// A collection sent as `partial_data` only touches the listed entities
#[derive(Debug, Clone, Serialize)]
pub struct InventoryCollection<'a> {
    pub name: String,
    pub partial_data: &'a [VmHostMapping],
}

impl<'a> IngressInventory<'a> {
    /// Partial update of the `vms` collection
    pub fn partial_vms(source: Option<&'a str>, mappings: &'a [VmHostMapping]) -> Self {
        Self {
            schema: IngressSchema {
                name: INGRESS_SCHEMA.to_string(),
            },
            source,
            collections: vec![InventoryCollection {
                name: VMS_COLLECTION.to_string(),
                partial_data: mappings,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_vm_ids_order_and_duplicates() {
        let event: SyncEvent = serde_json::from_value(serde_json::json!({
            "external_tenant": "acct1",
            "source": "src1",
            "payload": {"vms": {
                "created": [{"id": "c1"}, {"id": "dup"}],
                "updated": [{"id": "u1"}],
                "deleted": [{"id": "dup"}]
            }}
        }))
        .unwrap();

        assert_eq!(event.changed_vm_ids(), vec!["u1", "c1", "dup", "dup"]);
    }

    #[test]
    fn test_changed_vm_ids_missing_lists() {
        let event: SyncEvent = serde_json::from_value(serde_json::json!({
            "external_tenant": "acct1",
            "payload": {"vms": {"created": null, "updated": [{"id": 42}]}}
        }))
        .unwrap();
        assert_eq!(event.changed_vm_ids(), vec!["42"]);

        let empty: SyncEvent = serde_json::from_value(serde_json::json!({
            "external_tenant": "acct1"
        }))
        .unwrap();
        assert!(empty.changed_vm_ids().is_empty());
    }

    #[test]
    fn test_external_tenant_accepts_number() {
        let event: SyncEvent = serde_json::from_value(serde_json::json!({
            "external_tenant": 12345,
            "payload": {"vms": {"created": [{"id": "v1"}]}}
        }))
        .unwrap();
        assert_eq!(event.external_tenant.as_deref(), Some("12345"));

        let null_tenant: SyncEvent =
            serde_json::from_value(serde_json::json!({"external_tenant": null})).unwrap();
        assert_eq!(null_tenant.external_tenant, None);

        let missing: SyncEvent = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(missing.external_tenant, None);

        let rejected = serde_json::from_value::<SyncEvent>(serde_json::json!({
            "external_tenant": ["acct1"]
        }));
        assert!(rejected.is_err());
    }

    #[test]
    fn test_vm_reference_rejects_object_id() {
        let result = serde_json::from_value::<VmReference>(serde_json::json!({"id": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_mac_addresses_filtering() {
        let with_macs: VmRecord = serde_json::from_value(serde_json::json!({
            "source_ref": "v1",
            "extra": {"network": {"mac_addresses": ["aa:bb"]}},
            "name": "ignored"
        }))
        .unwrap();
        assert_eq!(with_macs.mac_addresses(), Some(&["aa:bb".to_string()][..]));

        let empty: VmRecord = serde_json::from_value(serde_json::json!({
            "extra": {"network": {"mac_addresses": []}}
        }))
        .unwrap();
        assert_eq!(empty.mac_addresses(), None);

        let no_network: VmRecord =
            serde_json::from_value(serde_json::json!({"extra": {}})).unwrap();
        assert_eq!(no_network.mac_addresses(), None);
    }

    #[test]
    fn test_ingress_partial_vms_shape() {
        let mappings = vec![VmHostMapping {
            source_ref: Some("v1".to_string()),
            host_inventory_uuid: "h1".to_string(),
        }];

        let body = serde_json::to_value(IngressInventory::partial_vms(Some("src1"), &mappings))
            .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "schema": {"name": "Default"},
                "source": "src1",
                "collections": [{
                    "name": "vms",
                    "partial_data": [{"source_ref": "v1", "host_inventory_uuid": "h1"}]
                }]
            })
        );
    }

    #[test]
    fn test_ingress_omits_missing_source_and_source_ref() {
        let mappings = vec![VmHostMapping {
            source_ref: None,
            host_inventory_uuid: "h1".to_string(),
        }];

        let body = serde_json::to_value(IngressInventory::partial_vms(None, &mappings)).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "schema": {"name": "Default"},
                "collections": [{
                    "name": "vms",
                    "partial_data": [{"host_inventory_uuid": "h1"}]
                }]
            })
        );
    }
}
