use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AttributeUpdate, Properties, timestamp};

/// Shape of a volume: what the provider needs to allocate it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeConfig {
    pub format: Option<String>,
    pub capacity_kb: u64,
    pub volume_type: Option<String>,
}

/// Named, tenant-owned volume configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeConfiguration {
    pub id: String,
    pub tenant_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: Properties,
    pub config: VolumeConfig,
    pub created: String,
    pub updated: Option<String>,
}

impl VolumeConfiguration {
    pub fn new(
        tenant_id: String,
        name: Option<String>,
        description: Option<String>,
        properties: Properties,
        config: VolumeConfig,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            name,
            description,
            properties,
            config,
            created: timestamp(),
            updated: None,
        }
    }
}

/// Named, tenant-owned template pointing at a stored configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeTemplate {
    pub id: String,
    pub tenant_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: Properties,
    pub volume_config_id: String,
    pub created: String,
    pub updated: Option<String>,
}

impl VolumeTemplate {
    pub fn new(
        tenant_id: String,
        name: Option<String>,
        description: Option<String>,
        properties: Properties,
        volume_config_id: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            name,
            description,
            properties,
            volume_config_id,
            created: timestamp(),
            updated: None,
        }
    }
}

/// Request to store a volume configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeConfigurationCreate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Properties,
    #[serde(flatten)]
    pub config: VolumeConfig,
}

/// Partial update of a volume configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeConfigurationUpdate {
    #[serde(flatten)]
    pub attributes: AttributeUpdate,
    pub format: Option<String>,
    pub capacity_kb: Option<u64>,
    pub volume_type: Option<String>,
}

/// Request to store a volume template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeTemplateCreate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Properties,
    pub volume_config_id: String,
}

/// Partial update of a volume template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeTemplateUpdate {
    #[serde(flatten)]
    pub attributes: AttributeUpdate,
    pub volume_config_id: Option<String>,
}
