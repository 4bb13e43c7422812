//! In-memory store used by development mode and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};

use crate::model::{
    Job, Volume, VolumeConfiguration, VolumeImage, VolumeImageState, VolumeState, VolumeTemplate,
    VolumeVolumeImage,
};

use super::EVENT_CHANNEL_CAPACITY;
use super::error::{Result, StoreError};
use super::event::Event;
use super::traits::{
    DataStore, JobStore, ResourceWrite, SubmissionStore, TemplateStore, VolumeImageStore,
    VolumeStore,
};

/// Rows keyed by id, remembering insertion order.
struct Table<T> {
    next_seq: u64,
    rows: HashMap<String, (u64, T)>,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            next_seq: 0,
            rows: HashMap::new(),
        }
    }

    fn insert(&mut self, id: &str, value: T) -> Result<()> {
        if self.rows.contains_key(id) {
            return Err(StoreError::Conflict(format!("'{}' already exists", id)));
        }
        self.next_seq += 1;
        self.rows.insert(id.to_string(), (self.next_seq, value));
        Ok(())
    }

    fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    fn get(&self, id: &str) -> Option<T> {
        self.rows.get(id).map(|(_, v)| v.clone())
    }

    /// Replace a row, returning the previous value.
    fn replace(&mut self, id: &str, value: T) -> Result<T> {
        match self.rows.get_mut(id) {
            Some((_, row)) => Ok(std::mem::replace(row, value)),
            None => Err(StoreError::NotFound(format!("'{}' not found", id))),
        }
    }

    fn remove(&mut self, id: &str) -> Option<T> {
        self.rows.remove(id).map(|(_, v)| v)
    }

    /// Matching rows in insertion order.
    fn ordered(&self, filter: impl Fn(&T) -> bool) -> Vec<T> {
        let mut rows: Vec<_> = self.rows.values().filter(|(_, v)| filter(v)).collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, v)| v.clone()).collect()
    }

    /// Best match for a provider lookup: live rows first, then newest.
    fn find_live(&self, filter: impl Fn(&T) -> bool, is_deleted: impl Fn(&T) -> bool) -> Option<T> {
        self.rows
            .values()
            .filter(|(_, v)| filter(v))
            .min_by_key(|(seq, v)| (is_deleted(v), std::cmp::Reverse(*seq)))
            .map(|(_, v)| v.clone())
    }
}

/// Tables grouped behind one lock so multi-row writes stay atomic.
struct Tables {
    jobs: Table<Job>,
    volumes: Table<Volume>,
    images: Table<VolumeImage>,
    links: Table<VolumeVolumeImage>,
    configurations: Table<VolumeConfiguration>,
    templates: Table<VolumeTemplate>,
}

impl Tables {
    fn new() -> Self {
        Self {
            jobs: Table::new(),
            volumes: Table::new(),
            images: Table::new(),
            links: Table::new(),
            configurations: Table::new(),
            templates: Table::new(),
        }
    }
}

/// `DataStore` backed by process memory.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    events: broadcast::Sender<Event>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tables: RwLock::new(Tables::new()),
            events,
        }
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn account_matches(account_id: Option<&str>, actual: &str) -> bool {
    account_id.is_none_or(|a| a == actual)
}

/// Reject a name another record of the same tenant already holds.
fn ensure_name_free<T: Clone>(
    table: &Table<T>,
    name: Option<&str>,
    holds: impl Fn(&T, &str) -> bool,
) -> Result<()> {
    let Some(name) = name else {
        return Ok(());
    };
    if table.rows.values().any(|(_, row)| holds(row, name)) {
        return Err(StoreError::Conflict(format!("name '{}' already exists", name)));
    }
    Ok(())
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn insert_job(&self, job: &Job) -> Result<()> {
        self.tables.write().await.jobs.insert(&job.id, job.clone())?;
        self.emit(Event::JobCreated(job.clone()));
        Ok(())
    }

    async fn get_job(&self, id: &str) -> Result<Option<Job>> {
        Ok(self.tables.read().await.jobs.get(id))
    }

    async fn get_job_by_provider_id(&self, provider_job_id: &str) -> Result<Option<Job>> {
        let tables = self.tables.read().await;
        Ok(tables
            .jobs
            .ordered(|j| j.provider_assigned_id.as_deref() == Some(provider_job_id))
            .pop())
    }

    async fn list_jobs(&self, tenant_id: Option<&str>) -> Result<Vec<Job>> {
        let tables = self.tables.read().await;
        Ok(tables
            .jobs
            .ordered(|j| tenant_id.is_none_or(|t| j.tenant_id.as_deref() == Some(t))))
    }

    async fn update_job(&self, job: &Job) -> Result<()> {
        let old = self.tables.write().await.jobs.replace(&job.id, job.clone())?;
        self.emit(Event::JobUpdated {
            id: job.id.clone(),
            old,
            new: job.clone(),
        });
        Ok(())
    }

    async fn delete_job(&self, id: &str) -> Result<bool> {
        let removed = self.tables.write().await.jobs.remove(id).is_some();
        if removed {
            self.emit(Event::JobDeleted { id: id.to_string() });
        }
        Ok(removed)
    }
}

#[async_trait]
impl VolumeStore for MemoryStore {
    async fn insert_volume(&self, volume: &Volume) -> Result<()> {
        self.tables
            .write()
            .await
            .volumes
            .insert(&volume.id, volume.clone())?;
        self.emit(Event::VolumeCreated(volume.clone()));
        Ok(())
    }

    async fn get_volume(&self, id: &str) -> Result<Option<Volume>> {
        Ok(self.tables.read().await.volumes.get(id))
    }

    async fn get_volume_by_provider_id(
        &self,
        account_id: Option<&str>,
        provider_id: &str,
    ) -> Result<Option<Volume>> {
        let tables = self.tables.read().await;
        Ok(tables.volumes.find_live(
            |v| {
                v.provider_assigned_id.as_deref() == Some(provider_id)
                    && account_matches(account_id, &v.placement.account_id)
            },
            |v| v.state == VolumeState::Deleted,
        ))
    }

    async fn list_volumes(&self, tenant_id: &str) -> Result<Vec<Volume>> {
        let tables = self.tables.read().await;
        Ok(tables.volumes.ordered(|v| v.tenant_id == tenant_id))
    }

    async fn update_volume(&self, volume: &Volume) -> Result<()> {
        let old = self
            .tables
            .write()
            .await
            .volumes
            .replace(&volume.id, volume.clone())?;
        self.emit(Event::VolumeUpdated {
            id: volume.id.clone(),
            old,
            new: volume.clone(),
        });
        Ok(())
    }

    async fn delete_volume(&self, id: &str) -> Result<bool> {
        let removed = self.tables.write().await.volumes.remove(id).is_some();
        if removed {
            self.emit(Event::VolumeDeleted { id: id.to_string() });
        }
        Ok(removed)
    }
}

#[async_trait]
impl VolumeImageStore for MemoryStore {
    async fn insert_volume_image(&self, image: &VolumeImage) -> Result<()> {
        self.tables
            .write()
            .await
            .images
            .insert(&image.id, image.clone())?;
        self.emit(Event::VolumeImageCreated(image.clone()));
        Ok(())
    }

    async fn get_volume_image(&self, id: &str) -> Result<Option<VolumeImage>> {
        Ok(self.tables.read().await.images.get(id))
    }

    async fn get_volume_image_by_provider_id(
        &self,
        account_id: Option<&str>,
        provider_id: &str,
    ) -> Result<Option<VolumeImage>> {
        let tables = self.tables.read().await;
        Ok(tables.images.find_live(
            |i| {
                i.provider_assigned_id.as_deref() == Some(provider_id)
                    && account_matches(account_id, &i.placement.account_id)
            },
            |i| i.state == VolumeImageState::Deleted,
        ))
    }

    async fn list_volume_images(&self, tenant_id: &str) -> Result<Vec<VolumeImage>> {
        let tables = self.tables.read().await;
        Ok(tables.images.ordered(|i| i.tenant_id == tenant_id))
    }

    async fn update_volume_image(&self, image: &VolumeImage) -> Result<()> {
        let old = self
            .tables
            .write()
            .await
            .images
            .replace(&image.id, image.clone())?;
        self.emit(Event::VolumeImageUpdated {
            id: image.id.clone(),
            old,
            new: image.clone(),
        });
        Ok(())
    }

    async fn delete_volume_image(&self, id: &str) -> Result<bool> {
        let removed = self.tables.write().await.images.remove(id).is_some();
        if removed {
            self.emit(Event::VolumeImageDeleted { id: id.to_string() });
        }
        Ok(removed)
    }

    async fn get_snapshot_link(&self, id: &str) -> Result<Option<VolumeVolumeImage>> {
        Ok(self.tables.read().await.links.get(id))
    }

    async fn get_snapshot_link_by_image(
        &self,
        volume_image_id: &str,
    ) -> Result<Option<VolumeVolumeImage>> {
        let tables = self.tables.read().await;
        Ok(tables
            .links
            .ordered(|l| l.volume_image_id == volume_image_id)
            .pop())
    }

    async fn list_snapshot_links(&self, volume_id: &str) -> Result<Vec<VolumeVolumeImage>> {
        let tables = self.tables.read().await;
        Ok(tables.links.ordered(|l| l.volume_id == volume_id))
    }

    async fn update_snapshot_link(&self, link: &VolumeVolumeImage) -> Result<()> {
        let old = self
            .tables
            .write()
            .await
            .links
            .replace(&link.id, link.clone())?;
        self.emit(Event::SnapshotLinkUpdated {
            id: link.id.clone(),
            old,
            new: link.clone(),
        });
        Ok(())
    }

    async fn delete_snapshot_link(&self, id: &str) -> Result<bool> {
        let removed = self.tables.write().await.links.remove(id);
        match removed {
            Some(link) => {
                self.emit(Event::SnapshotUnlinked {
                    id: link.id,
                    volume_id: link.volume_id,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn commit_with_job(&self, write: ResourceWrite<'_>, job: &Job) -> Result<()> {
        let mut events = Vec::with_capacity(3);
        {
            let mut tables = self.tables.write().await;

            // Every check runs before the first table is touched
            if let Some(parent) = job.parent_job_id.as_deref() {
                if !tables.jobs.contains(parent) {
                    return Err(StoreError::NotFound(format!("parent job {}", parent)));
                }
            }
            if tables.jobs.contains(&job.id) {
                return Err(StoreError::Conflict(format!("'{}' already exists", job.id)));
            }
            if let ResourceWrite::InsertSnapshot(_, link) = write {
                if tables.links.contains(&link.id) {
                    return Err(StoreError::Conflict(format!("'{}' already exists", link.id)));
                }
            }

            match write {
                ResourceWrite::InsertVolume(volume) => {
                    tables.volumes.insert(&volume.id, volume.clone())?;
                    events.push(Event::VolumeCreated(volume.clone()));
                }
                ResourceWrite::UpdateVolume(volume) => {
                    let old = tables.volumes.replace(&volume.id, volume.clone())?;
                    events.push(Event::VolumeUpdated {
                        id: volume.id.clone(),
                        old,
                        new: volume.clone(),
                    });
                }
                ResourceWrite::InsertVolumeImage(image) => {
                    tables.images.insert(&image.id, image.clone())?;
                    events.push(Event::VolumeImageCreated(image.clone()));
                }
                ResourceWrite::UpdateVolumeImage(image) => {
                    let old = tables.images.replace(&image.id, image.clone())?;
                    events.push(Event::VolumeImageUpdated {
                        id: image.id.clone(),
                        old,
                        new: image.clone(),
                    });
                }
                ResourceWrite::InsertSnapshot(image, link) => {
                    tables.images.insert(&image.id, image.clone())?;
                    tables.links.insert(&link.id, link.clone())?;
                    events.push(Event::VolumeImageCreated(image.clone()));
                    events.push(Event::SnapshotLinked(link.clone()));
                }
                ResourceWrite::RemoveSnapshotLink(link) => {
                    let removed = tables
                        .links
                        .remove(&link.id)
                        .ok_or_else(|| StoreError::NotFound(format!("'{}' not found", link.id)))?;
                    events.push(Event::SnapshotUnlinked {
                        id: removed.id,
                        volume_id: removed.volume_id,
                    });
                }
            }

            tables.jobs.insert(&job.id, job.clone())?;
        }

        events.push(Event::JobCreated(job.clone()));
        for event in events {
            self.emit(event);
        }
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn insert_volume_configuration(&self, config: &VolumeConfiguration) -> Result<()> {
        let mut tables = self.tables.write().await;
        ensure_name_free(&tables.configurations, config.name.as_deref(), |c, name| {
            c.tenant_id == config.tenant_id && c.name.as_deref() == Some(name)
        })?;
        tables.configurations.insert(&config.id, config.clone())
    }

    async fn get_volume_configuration(&self, id: &str) -> Result<Option<VolumeConfiguration>> {
        Ok(self.tables.read().await.configurations.get(id))
    }

    async fn get_volume_configuration_by_name(
        &self,
        tenant_id: &str,
        name: &str,
    ) -> Result<Option<VolumeConfiguration>> {
        let tables = self.tables.read().await;
        Ok(tables
            .configurations
            .ordered(|c| c.tenant_id == tenant_id && c.name.as_deref() == Some(name))
            .pop())
    }

    async fn list_volume_configurations(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<VolumeConfiguration>> {
        let tables = self.tables.read().await;
        Ok(tables.configurations.ordered(|c| c.tenant_id == tenant_id))
    }

    async fn update_volume_configuration(&self, config: &VolumeConfiguration) -> Result<()> {
        let mut tables = self.tables.write().await;
        ensure_name_free(&tables.configurations, config.name.as_deref(), |c, name| {
            c.id != config.id && c.tenant_id == config.tenant_id && c.name.as_deref() == Some(name)
        })?;
        tables
            .configurations
            .replace(&config.id, config.clone())
            .map(|_| ())
    }

    async fn delete_volume_configuration(&self, id: &str) -> Result<bool> {
        Ok(self.tables.write().await.configurations.remove(id).is_some())
    }

    async fn insert_volume_template(&self, template: &VolumeTemplate) -> Result<()> {
        let mut tables = self.tables.write().await;
        ensure_name_free(&tables.templates, template.name.as_deref(), |t, name| {
            t.tenant_id == template.tenant_id && t.name.as_deref() == Some(name)
        })?;
        tables.templates.insert(&template.id, template.clone())
    }

    async fn get_volume_template(&self, id: &str) -> Result<Option<VolumeTemplate>> {
        Ok(self.tables.read().await.templates.get(id))
    }

    async fn get_volume_template_by_name(
        &self,
        tenant_id: &str,
        name: &str,
    ) -> Result<Option<VolumeTemplate>> {
        let tables = self.tables.read().await;
        Ok(tables
            .templates
            .ordered(|t| t.tenant_id == tenant_id && t.name.as_deref() == Some(name))
            .pop())
    }

    async fn list_volume_templates(&self, tenant_id: &str) -> Result<Vec<VolumeTemplate>> {
        let tables = self.tables.read().await;
        Ok(tables.templates.ordered(|t| t.tenant_id == tenant_id))
    }

    async fn update_volume_template(&self, template: &VolumeTemplate) -> Result<()> {
        let mut tables = self.tables.write().await;
        ensure_name_free(&tables.templates, template.name.as_deref(), |t, name| {
            t.id != template.id
                && t.tenant_id == template.tenant_id
                && t.name.as_deref() == Some(name)
        })?;
        tables
            .templates
            .replace(&template.id, template.clone())
            .map(|_| ())
    }

    async fn delete_volume_template(&self, id: &str) -> Result<bool> {
        Ok(self.tables.write().await.templates.remove(id).is_some())
    }
}

impl DataStore for MemoryStore {
    fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}
