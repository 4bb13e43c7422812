//! Events emitted by store writes.

use crate::model::{Job, Volume, VolumeImage, VolumeVolumeImage};

/// Change notification published after every successful write.
///
/// Callers holding a provisional job can subscribe and wait for the
/// matching `JobUpdated` instead of polling.
#[derive(Debug, Clone)]
pub enum Event {
    // Job events
    JobCreated(Job),
    JobUpdated { id: String, old: Job, new: Job },
    JobDeleted { id: String },

    // Volume events
    VolumeCreated(Volume),
    VolumeUpdated { id: String, old: Volume, new: Volume },
    VolumeDeleted { id: String },

    // Volume image events
    VolumeImageCreated(VolumeImage),
    VolumeImageUpdated {
        id: String,
        old: VolumeImage,
        new: VolumeImage,
    },
    VolumeImageDeleted { id: String },

    // Snapshot link events
    SnapshotLinked(VolumeVolumeImage),
    SnapshotLinkUpdated {
        id: String,
        old: VolumeVolumeImage,
        new: VolumeVolumeImage,
    },
    SnapshotUnlinked { id: String, volume_id: String },
}
