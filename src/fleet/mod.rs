mod records;
mod snapshot;
mod watch;

pub use records::{LOCAL_MACHINE_ID, MachineRecord, ServiceRecord, ServiceStatus};
pub use snapshot::{
    FleetSnapshot, TopologySignature, load_snapshot, parse_snapshot, sample_snapshot,
};
pub use watch::{SnapshotResult, SnapshotWatcher};
