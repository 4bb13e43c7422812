use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Placement, Properties, VolumeConfig, timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeState {
    Creating,
    Available,
    Deleting,
    Deleted,
    Error,
}

impl VolumeState {
    pub fn as_str(self) -> &'static str {
        match self {
            VolumeState::Creating => "creating",
            VolumeState::Available => "available",
            VolumeState::Deleting => "deleting",
            VolumeState::Deleted => "deleted",
            VolumeState::Error => "error",
        }
    }
}

/// Creation request handed to the provider connector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeCreate {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Also used as placement hints.
    #[serde(default)]
    pub properties: Properties,
    pub config: VolumeConfig,
}

/// Creation request resolved from a stored template.
///
/// Name and description override the template's; properties are merged
/// over the template's, these winning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeFromTemplate {
    pub template_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Properties,
}

/// A block volume provisioned in a provider account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub tenant_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: Properties,
    pub placement: Placement,
    pub provider_assigned_id: Option<String>,
    pub state: VolumeState,
    pub capacity_kb: u64,
    pub volume_type: Option<String>,
    pub bootable: bool,
    /// Stamped once the provider confirms the volume exists.
    pub created: Option<String>,
    pub updated: Option<String>,
}

impl Volume {
    pub fn new(
        tenant_id: String,
        create: &VolumeCreate,
        placement: Placement,
        provider_assigned_id: String,
        state: VolumeState,
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
            capacity_kb: create.config.capacity_kb,
            volume_type: create.config.volume_type.clone(),
            bootable: false,
            created: None,
            updated: Some(timestamp()),
        }
    }
}
