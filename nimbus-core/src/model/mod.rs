//! Domain model: jobs, provider-backed resources and their templates.

mod job;
mod template;
mod volume;
mod volume_image;

pub use job::{Job, JobAction, JobBuilder, JobState};
pub use template::{
    VolumeConfig, VolumeConfiguration, VolumeConfigurationCreate, VolumeConfigurationUpdate,
    VolumeTemplate, VolumeTemplateCreate, VolumeTemplateUpdate,
};
pub use volume::{Volume, VolumeCreate, VolumeFromTemplate, VolumeState};
pub use volume_image::{
    SnapshotState, VolumeImage, VolumeImageCreate, VolumeImageState, VolumeVolumeImage,
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Free-form key/value attributes attached to entities and used as placement hints.
pub type Properties = HashMap<String, String>;

/// Current time in the RFC 3339 form used for every stored timestamp.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Resource-kind tag carried by job references.
///
/// Completion dispatch is keyed on this tag rather than on the shape of
/// the referenced record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Volume,
    VolumeImage,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Volume => write!(f, "volume"),
            ResourceKind::VolumeImage => write!(f, "volume_image"),
        }
    }
}

/// Reference from a job to a resource.
///
/// `provider_assigned_id` and `account_id` are the correlation key the
/// completion path uses; they are copied at submission time because the
/// notification itself carries nothing but the provider job id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub id: String,
    pub provider_assigned_id: Option<String>,
    pub account_id: Option<String>,
}

impl ResourceRef {
    pub fn volume(volume: &Volume) -> Self {
        Self {
            kind: ResourceKind::Volume,
            id: volume.id.clone(),
            provider_assigned_id: volume.provider_assigned_id.clone(),
            account_id: Some(volume.placement.account_id.clone()),
        }
    }

    pub fn volume_image(image: &VolumeImage) -> Self {
        Self {
            kind: ResourceKind::VolumeImage,
            id: image.id.clone(),
            provider_assigned_id: image.provider_assigned_id.clone(),
            account_id: Some(image.placement.account_id.clone()),
        }
    }
}

/// The provider account and location a resource lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub account_id: String,
    pub provider_type: String,
    pub location: String,
}

/// Partial update of the descriptive attributes shared by every entity.
///
/// Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: Option<Properties>,
}

impl AttributeUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.properties.is_none()
    }

    /// Apply to the given fields, returning whether anything was set.
    pub(crate) fn apply(
        &self,
        name: &mut Option<String>,
        description: &mut Option<String>,
        properties: &mut Properties,
    ) -> bool {
        if let Some(n) = &self.name {
            *name = Some(n.clone());
        }
        if let Some(d) = &self.description {
            *description = Some(d.clone());
        }
        if let Some(p) = &self.properties {
            *properties = p.clone();
        }
        !self.is_empty()
    }
}
