//! Volume configurations and templates. Purely local records.

use std::sync::Arc;

use tracing::info;

use crate::error::{CloudError, Result};
use crate::model::{
    VolumeConfiguration, VolumeConfigurationCreate, VolumeConfigurationUpdate, VolumeTemplate,
    VolumeTemplateCreate, VolumeTemplateUpdate, timestamp,
};
use crate::store::{DataStore, StoreError};

#[derive(Clone)]
pub struct TemplateManager {
    store: Arc<dyn DataStore>,
}

impl TemplateManager {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    // === Configurations ===

    pub async fn create_configuration(
        &self,
        tenant_id: &str,
        request: VolumeConfigurationCreate,
    ) -> Result<VolumeConfiguration> {
        if request.config.capacity_kb == 0 {
            return Err(CloudError::InvalidRequest(
                "capacity_kb must be positive".to_string(),
            ));
        }
        if let Some(name) = request.name.as_deref() {
            self.ensure_configuration_name_free(tenant_id, name, None)
                .await?;
        }

        let config = VolumeConfiguration::new(
            tenant_id.to_string(),
            request.name,
            request.description,
            request.properties,
            request.config,
        );
        self.store
            .insert_volume_configuration(&config)
            .await
            .map_err(|e| name_taken(e, "volume configuration", config.name.as_deref()))?;

        info!(config_id = %config.id, tenant_id = %tenant_id, "Created volume configuration");
        Ok(config)
    }

    pub async fn get_configuration(
        &self,
        tenant_id: &str,
        id: &str,
    ) -> Result<VolumeConfiguration> {
        self.store
            .get_volume_configuration(id)
            .await?
            .filter(|c| c.tenant_id == tenant_id)
            .ok_or_else(|| CloudError::NotFound(format!("volume configuration {}", id)))
    }

    pub async fn list_configurations(&self, tenant_id: &str) -> Result<Vec<VolumeConfiguration>> {
        Ok(self.store.list_volume_configurations(tenant_id).await?)
    }

    pub async fn update_configuration(
        &self,
        tenant_id: &str,
        id: &str,
        update: VolumeConfigurationUpdate,
    ) -> Result<VolumeConfiguration> {
        let mut config = self.get_configuration(tenant_id, id).await?;

        if let Some(name) = update.attributes.name.as_deref() {
            self.ensure_configuration_name_free(tenant_id, name, Some(id))
                .await?;
        }
        if update.capacity_kb == Some(0) {
            return Err(CloudError::InvalidRequest(
                "capacity_kb must be positive".to_string(),
            ));
        }

        update.attributes.apply(
            &mut config.name,
            &mut config.description,
            &mut config.properties,
        );
        if let Some(format) = update.format {
            config.config.format = Some(format);
        }
        if let Some(capacity_kb) = update.capacity_kb {
            config.config.capacity_kb = capacity_kb;
        }
        if let Some(volume_type) = update.volume_type {
            config.config.volume_type = Some(volume_type);
        }
        config.updated = Some(timestamp());

        self.store
            .update_volume_configuration(&config)
            .await
            .map_err(|e| name_taken(e, "volume configuration", config.name.as_deref()))?;
        Ok(config)
    }

    /// Configurations still referenced by a template cannot be deleted.
    pub async fn delete_configuration(&self, tenant_id: &str, id: &str) -> Result<()> {
        let config = self.get_configuration(tenant_id, id).await?;

        let templates = self.store.list_volume_templates(tenant_id).await?;
        if let Some(template) = templates.iter().find(|t| t.volume_config_id == config.id) {
            return Err(CloudError::ResourceConflict(format!(
                "volume configuration {} is used by template {}",
                id, template.id
            )));
        }

        self.store.delete_volume_configuration(id).await?;
        info!(config_id = %id, "Deleted volume configuration");
        Ok(())
    }

    async fn ensure_configuration_name_free(
        &self,
        tenant_id: &str,
        name: &str,
        except_id: Option<&str>,
    ) -> Result<()> {
        match self
            .store
            .get_volume_configuration_by_name(tenant_id, name)
            .await?
        {
            Some(existing) if Some(existing.id.as_str()) != except_id => {
                Err(CloudError::ResourceConflict(format!(
                    "volume configuration named '{}' already exists",
                    name
                )))
            }
            _ => Ok(()),
        }
    }

    // === Templates ===

    pub async fn create_template(
        &self,
        tenant_id: &str,
        request: VolumeTemplateCreate,
    ) -> Result<VolumeTemplate> {
        self.ensure_configuration_exists(tenant_id, &request.volume_config_id)
            .await?;
        if let Some(name) = request.name.as_deref() {
            self.ensure_template_name_free(tenant_id, name, None).await?;
        }

        let template = VolumeTemplate::new(
            tenant_id.to_string(),
            request.name,
            request.description,
            request.properties,
            request.volume_config_id,
        );
        self.store
            .insert_volume_template(&template)
            .await
            .map_err(|e| name_taken(e, "volume template", template.name.as_deref()))?;

        info!(template_id = %template.id, tenant_id = %tenant_id, "Created volume template");
        Ok(template)
    }

    pub async fn get_template(&self, tenant_id: &str, id: &str) -> Result<VolumeTemplate> {
        self.store
            .get_volume_template(id)
            .await?
            .filter(|t| t.tenant_id == tenant_id)
            .ok_or_else(|| CloudError::NotFound(format!("volume template {}", id)))
    }

    pub async fn list_templates(&self, tenant_id: &str) -> Result<Vec<VolumeTemplate>> {
        Ok(self.store.list_volume_templates(tenant_id).await?)
    }

    pub async fn update_template(
        &self,
        tenant_id: &str,
        id: &str,
        update: VolumeTemplateUpdate,
    ) -> Result<VolumeTemplate> {
        let mut template = self.get_template(tenant_id, id).await?;

        if let Some(name) = update.attributes.name.as_deref() {
            self.ensure_template_name_free(tenant_id, name, Some(id))
                .await?;
        }
        if let Some(config_id) = update.volume_config_id {
            self.ensure_configuration_exists(tenant_id, &config_id)
                .await?;
            template.volume_config_id = config_id;
        }

        update.attributes.apply(
            &mut template.name,
            &mut template.description,
            &mut template.properties,
        );
        template.updated = Some(timestamp());

        self.store
            .update_volume_template(&template)
            .await
            .map_err(|e| name_taken(e, "volume template", template.name.as_deref()))?;
        Ok(template)
    }

    pub async fn delete_template(&self, tenant_id: &str, id: &str) -> Result<()> {
        self.get_template(tenant_id, id).await?;
        self.store.delete_volume_template(id).await?;
        info!(template_id = %id, "Deleted volume template");
        Ok(())
    }

    /// A template together with the configuration it points at.
    pub async fn resolve_template(
        &self,
        tenant_id: &str,
        id: &str,
    ) -> Result<(VolumeTemplate, VolumeConfiguration)> {
        let template = self.get_template(tenant_id, id).await?;
        let config = self
            .store
            .get_volume_configuration(&template.volume_config_id)
            .await?
            .ok_or_else(|| {
                CloudError::InvalidRequest(format!(
                    "template {} references missing configuration {}",
                    id, template.volume_config_id
                ))
            })?;
        Ok((template, config))
    }

    async fn ensure_configuration_exists(&self, tenant_id: &str, config_id: &str) -> Result<()> {
        match self.get_configuration(tenant_id, config_id).await {
            Ok(_) => Ok(()),
            Err(CloudError::NotFound(_)) => Err(CloudError::InvalidRequest(format!(
                "volume configuration {} does not exist",
                config_id
            ))),
            Err(e) => Err(e),
        }
    }

    async fn ensure_template_name_free(
        &self,
        tenant_id: &str,
        name: &str,
        except_id: Option<&str>,
    ) -> Result<()> {
        match self.store.get_volume_template_by_name(tenant_id, name).await? {
            Some(existing) if Some(existing.id.as_str()) != except_id => {
                Err(CloudError::ResourceConflict(format!(
                    "volume template named '{}' already exists",
                    name
                )))
            }
            _ => Ok(()),
        }
    }
}

/// The store enforces name uniqueness too; a conflict there means a
/// concurrent request took the name after the upfront check.
fn name_taken(e: StoreError, kind: &str, name: Option<&str>) -> CloudError {
    match e {
        StoreError::Conflict(_) => CloudError::ResourceConflict(format!(
            "{} named '{}' already exists",
            kind,
            name.unwrap_or_default()
        )),
        e => e.into(),
    }
}
