use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Placement, Properties, timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeImageState {
    Creating,
    Available,
    Deleting,
    Deleted,
    Error,
}

impl VolumeImageState {
    pub fn as_str(self) -> &'static str {
        match self {
            VolumeImageState::Creating => "creating",
            VolumeImageState::Available => "available",
            VolumeImageState::Deleting => "deleting",
            VolumeImageState::Deleted => "deleted",
            VolumeImageState::Error => "error",
        }
    }
}

/// Lifecycle of the link between a volume and a snapshot taken from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotState {
    Snapshotting,
    Available,
    Error,
}

impl SnapshotState {
    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotState::Snapshotting => "snapshotting",
            SnapshotState::Available => "available",
            SnapshotState::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeImageCreate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Properties,
    /// Where the image content comes from, for images not taken from a volume.
    pub image_location: Option<String>,
    #[serde(default)]
    pub bootable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeImage {
    pub id: String,
    pub tenant_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: Properties,
    pub placement: Placement,
    pub provider_assigned_id: Option<String>,
    pub state: VolumeImageState,
    pub image_location: Option<String>,
    pub bootable: bool,
    pub created: Option<String>,
    pub updated: Option<String>,
}

impl VolumeImage {
    pub fn new(
        tenant_id: String,
        create: &VolumeImageCreate,
        placement: Placement,
        provider_assigned_id: String,
        state: VolumeImageState,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            name: create.name.clone(),
            description: create.description.clone(),
            properties: create.properties.clone(),
            placement,
            provider_assigned_id: Some(provider_assigned_id),
            state,
            image_location: create.image_location.clone(),
            bootable: create.bootable,
            created: None,
            updated: Some(timestamp()),
        }
    }
}

/// Entry of a volume's image collection.
///
/// Removing the entry never deletes the image it points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeVolumeImage {
    pub id: String,
    pub volume_id: String,
    pub volume_image_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: Properties,
    pub state: SnapshotState,
    pub created: Option<String>,
    pub updated: Option<String>,
}

impl VolumeVolumeImage {
    pub fn snapshotting(volume_id: String, volume_image_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            volume_id,
            volume_image_id,
            name: None,
            description: None,
            properties: Properties::new(),
            state: SnapshotState::Snapshotting,
            created: None,
            updated: Some(timestamp()),
        }
    }
}
