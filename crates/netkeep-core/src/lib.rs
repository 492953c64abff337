// netkeep-core: Inventory engine between the storage layer and consumers (server/CLI).

pub mod addr;
pub mod backup;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod store;
pub mod utilization;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backup::{ImportCounts, Snapshot, SnapshotExporter, SnapshotImporter};
pub use error::CoreError;
pub use reconcile::Reconciler;
pub use store::MemoryStore;
pub use utilization::SubnetUtilization;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Core entities
    Category, ChangeAction, ChangeEntry, Device, DeviceState, EntityId, IpAddress, IpRange,
    IpStatus, MacAddress, RangeScheme, SchemeEntry, Service, Site, SiteSettings, Subnet,
    SubnetTemplate, Vlan, WifiNetwork,
    // Supporting enums
    NetworkRole, Protocol, ServiceHealth, VlanStatus, WifiBand, WifiSecurity,
};
