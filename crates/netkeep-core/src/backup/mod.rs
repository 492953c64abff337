// ── Site backup / restore ──
//
// A snapshot is one self-contained JSON document for a whole site.
// Export substitutes opaque export-id strings for store-native ids;
// import replays the document into a freshly wiped site, remapping every
// cross-entity reference through the export ids.

mod export;
mod import;
mod snapshot;

pub use export::SnapshotExporter;
pub use import::{ImportCounts, SkippedCounts, SnapshotImporter};
pub use snapshot::{Snapshot, SNAPSHOT_VERSION};
