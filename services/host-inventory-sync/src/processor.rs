//! Per-event sync pipeline
//!
//! For one persister event:
//! 1. Require a tenant, build its identity
//! 2. Fetch every changed VM from Topological Inventory (404s are skipped)
//! 3. Create a Host Inventory host for each VM with MAC addresses that has
//!    no host yet
//! 4. Save all new VM to host links back in a single partial update
//!
//! Any failure aborts the event before the write-back. Nothing is retried.

use std::sync::Arc;

use tracing::info;

use crate::clients::{HostInventory, InventoryWriter, SourceInventory, VmLookup};
use crate::error::SyncError;
use crate::identity::Identity;
use crate::types::{CreateHostRequest, SyncEvent, VmHostMapping, VmRecord};

/// What processing one event amounted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No VM qualified for a new host
    NothingToWrite { fetched: usize },
    /// Mappings were saved through the Ingress API
    Written { fetched: usize, mappings: usize },
}

pub struct HostInventorySync {
    source: Arc<dyn SourceInventory>,
    hosts: Arc<dyn HostInventory>,
    writer: Arc<dyn InventoryWriter>,
}

impl HostInventorySync {
    pub fn new(
        source: Arc<dyn SourceInventory>,
        hosts: Arc<dyn HostInventory>,
        writer: Arc<dyn InventoryWriter>,
    ) -> Self {
        Self {
            source,
            hosts,
            writer,
        }
    }

    /// Parse a raw message body and process it
    pub async fn handle_payload(&self, payload: &[u8]) -> Result<SyncOutcome, SyncError> {
        let event: SyncEvent = serde_json::from_slice(payload)?;
        self.process(&event).await
    }

    pub async fn process(&self, event: &SyncEvent) -> Result<SyncOutcome, SyncError> {
        let tenant = event
            .external_tenant
            .as_deref()
            .ok_or(SyncError::MissingTenant)?;
        let identity = Identity::for_account(tenant);

        let vms = self.fetch_changed_vms(event, &identity).await?;
        let fetched = vms.len();

        let mut mappings = Vec::new();
        for vm in &vms {
            // Only VMs with MAC addresses can be matched to a host for now
            let Some(mac_addresses) = vm.mac_addresses() else {
                continue;
            };
            if vm.is_registered() {
                continue;
            }

            let request = CreateHostRequest {
                mac_addresses: mac_addresses.to_vec(),
                account: tenant.to_string(),
            };
            let created = self
                .hosts
                .create_host(&identity, &request)
                .await
                .map_err(|source| SyncError::CreateHost {
                    source_ref: vm.source_ref.clone(),
                    source,
                })?;

            mappings.push(VmHostMapping {
                source_ref: vm.source_ref.clone(),
                host_inventory_uuid: created.id,
            });
        }

        if mappings.is_empty() {
            return Ok(SyncOutcome::NothingToWrite { fetched });
        }

        let source = event.source.as_deref();
        self.writer
            .save_vms(source, &mappings)
            .await
            .map_err(|err| SyncError::SaveVms {
                count: mappings.len(),
                source: err,
            })?;

        info!(
            tenant,
            source = source.unwrap_or_default(),
            count = mappings.len(),
            "Linked VMs to Host Inventory hosts"
        );

        Ok(SyncOutcome::Written {
            fetched,
            mappings: mappings.len(),
        })
    }

    async fn fetch_changed_vms(
        &self,
        event: &SyncEvent,
        identity: &Identity,
    ) -> Result<Vec<VmRecord>, SyncError> {
        let mut vms = Vec::new();

        // TODO: switch to a filtered list call once Topological Inventory offers one
        for vm_id in event.changed_vm_ids() {
            match self.source.fetch_vm(identity, &vm_id).await {
                Ok(VmLookup::Found(vm)) => vms.push(vm),
                Ok(VmLookup::NotFound) => {
                    info!(vm_id = %vm_id, "Vm was not found in Topological Inventory");
                }
                Err(source) => return Err(SyncError::FetchVm { vm_id, source }),
            }
        }

        Ok(vms)
    }
}
