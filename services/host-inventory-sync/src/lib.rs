//! Host Inventory Sync
//!
//! Consumes Topological Inventory persister events, registers every VM that
//! carries network facts as a Host Inventory host, and writes the resulting
//! host ids back through the Ingress API.
//!
//! ## Flow
//!
//! 1. [`subscriber::EventSubscriber`] pulls one Kafka message at a time
//! 2. [`processor::HostInventorySync`] fetches each changed VM, creates hosts
//! 3. The VM to host mappings are saved back as partial VM data
//!
//! Failures never leave the per-message boundary: they are logged and the
//! message counts as consumed.

pub mod clients;
pub mod config;
pub mod error;
pub mod health;
pub mod identity;
pub mod processor;
pub mod subscriber;
pub mod types;

pub use clients::{HostInventory, InventoryWriter, SourceInventory, VmLookup};
pub use error::{ClientError, SubscriberError, SyncError};
pub use identity::Identity;
pub use processor::{HostInventorySync, SyncOutcome};
pub use subscriber::EventSubscriber;
