//! SQLite-backed store.
//!
//! Each table keeps the columns lookups filter on next to the full record
//! encoded as JSON in `data`. Rows come back in insertion order (`rowid`).

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use tokio::sync::broadcast;
use tracing::debug;

use crate::model::{
    Job, Volume, VolumeConfiguration, VolumeImage, VolumeTemplate, VolumeVolumeImage,
};

use super::EVENT_CHANNEL_CAPACITY;
use super::error::{Result, StoreError};
use super::event::Event;
use super::traits::{
    DataStore, JobStore, ResourceWrite, SubmissionStore, TemplateStore, VolumeImageStore,
    VolumeStore,
};

const JOBS: &str = "jobs";
const VOLUMES: &str = "volumes";
const VOLUME_IMAGES: &str = "volume_images";
const SNAPSHOT_LINKS: &str = "volume_volume_images";
const CONFIGURATIONS: &str = "volume_configurations";
const TEMPLATES: &str = "volume_templates";

/// SQLite-backed `DataStore`.
pub struct SqliteStore {
    pool: SqlitePool,
    events: broadcast::Sender<Event>,
}

impl SqliteStore {
    /// Open (or create) `nimbus.db` inside `metadata_dir`.
    pub async fn new(metadata_dir: &str) -> Result<Self> {
        let db_path = format!("{}/nimbus.db", metadata_dir);
        let db_url = format!("sqlite:{}?mode=rwc", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        debug!(path = %db_path, "Opened SQLite store");
        Self::with_pool(pool).await
    }

    /// Private in-memory database. One connection, since every connection
    /// to `sqlite::memory:` sees its own database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let store = Self { pool, events };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        // Jobs table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                tenant_id TEXT,
                provider_assigned_id TEXT,
                state TEXT NOT NULL,
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS jobs_provider_id ON jobs (provider_assigned_id)")
            .execute(&self.pool)
            .await?;

        // Provider-backed resources
        for table in [VOLUMES, VOLUME_IMAGES] {
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    tenant_id TEXT NOT NULL,
                    account_id TEXT NOT NULL,
                    provider_assigned_id TEXT,
                    state TEXT NOT NULL,
                    data TEXT NOT NULL
                )
                "#
            ))
            .execute(&self.pool)
            .await?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {table}_provider_id ON {table} (account_id, provider_assigned_id)"
            ))
            .execute(&self.pool)
            .await?;
        }

        // Snapshot links
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS volume_volume_images (
                id TEXT PRIMARY KEY,
                volume_id TEXT NOT NULL,
                volume_image_id TEXT NOT NULL,
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Configurations and templates
        for table in [CONFIGURATIONS, TEMPLATES] {
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    tenant_id TEXT NOT NULL,
                    name TEXT,
                    data TEXT NOT NULL
                )
                "#
            ))
            .execute(&self.pool)
            .await?;

            // NULL names never collide
            sqlx::query(&format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {table}_tenant_name ON {table} (tenant_id, name)"
            ))
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    fn emit(&self, event: Event) {
        let _ = self.events.send(event);
    }

    async fn fetch_by_id<T: DeserializeOwned>(&self, table: &str, id: &str) -> Result<Option<T>> {
        let row = sqlx::query(&format!("SELECT data FROM {table} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| decode(&r)).transpose()
    }

    /// Delete a row, returning the record it held.
    async fn remove<T: DeserializeOwned>(&self, table: &str, id: &str) -> Result<Option<T>> {
        let mut conn = self.pool.acquire().await?;
        remove_row(&mut conn, table, id).await
    }

    /// Swap the record stored under `id`, returning the previous one.
    async fn replace<T: Serialize + DeserializeOwned + Sync>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        columns: &[(&str, Option<&str>)],
    ) -> Result<T> {
        let mut tx = self.pool.begin().await?;
        let old = replace_row(&mut tx, table, id, record, columns).await?;
        tx.commit().await?;
        Ok(old)
    }
}

fn decode<T: DeserializeOwned>(row: &SqliteRow) -> Result<T> {
    let data: String = row.get("data");
    Ok(serde_json::from_str(&data)?)
}

fn decode_all<T: DeserializeOwned>(rows: &[SqliteRow]) -> Result<Vec<T>> {
    rows.iter().map(decode).collect()
}

/// Map a failed write, turning unique-constraint hits into `Conflict`.
fn write_error(e: sqlx::Error, id: &str) -> StoreError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            StoreError::Conflict(format!("'{}' conflicts with an existing record", id))
        }
        _ => e.into(),
    }
}

/// Indexed columns of volumes and volume images.
fn resource_columns<'a>(
    provider_assigned_id: Option<&'a str>,
    state: &'a str,
) -> [(&'static str, Option<&'a str>); 2] {
    [
        ("provider_assigned_id", provider_assigned_id),
        ("state", Some(state)),
    ]
}

async fn insert_job_row(conn: &mut SqliteConnection, job: &Job) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO jobs (id, tenant_id, provider_assigned_id, state, data)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&job.id)
    .bind(&job.tenant_id)
    .bind(&job.provider_assigned_id)
    .bind(job.state.as_str())
    .bind(serde_json::to_string(job)?)
    .execute(&mut *conn)
    .await
    .map_err(|e| write_error(e, &job.id))?;
    Ok(())
}

async fn insert_volume_row(conn: &mut SqliteConnection, volume: &Volume) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO volumes (id, tenant_id, account_id, provider_assigned_id, state, data)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&volume.id)
    .bind(&volume.tenant_id)
    .bind(&volume.placement.account_id)
    .bind(&volume.provider_assigned_id)
    .bind(volume.state.as_str())
    .bind(serde_json::to_string(volume)?)
    .execute(&mut *conn)
    .await
    .map_err(|e| write_error(e, &volume.id))?;
    Ok(())
}

async fn insert_image_row(conn: &mut SqliteConnection, image: &VolumeImage) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO volume_images (id, tenant_id, account_id, provider_assigned_id, state, data)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&image.id)
    .bind(&image.tenant_id)
    .bind(&image.placement.account_id)
    .bind(&image.provider_assigned_id)
    .bind(image.state.as_str())
    .bind(serde_json::to_string(image)?)
    .execute(&mut *conn)
    .await
    .map_err(|e| write_error(e, &image.id))?;
    Ok(())
}

async fn insert_link_row(conn: &mut SqliteConnection, link: &VolumeVolumeImage) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO volume_volume_images (id, volume_id, volume_image_id, data)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&link.id)
    .bind(&link.volume_id)
    .bind(&link.volume_image_id)
    .bind(serde_json::to_string(link)?)
    .execute(&mut *conn)
    .await
    .map_err(|e| write_error(e, &link.id))?;
    Ok(())
}

async fn remove_row<T: DeserializeOwned>(
    conn: &mut SqliteConnection,
    table: &str,
    id: &str,
) -> Result<Option<T>> {
    let row = sqlx::query(&format!("DELETE FROM {table} WHERE id = ? RETURNING data"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(|r| decode(&r)).transpose()
}

/// Overwrite a row inside the caller's transaction, returning the old record.
async fn replace_row<T: Serialize + DeserializeOwned + Sync>(
    conn: &mut SqliteConnection,
    table: &str,
    id: &str,
    record: &T,
    columns: &[(&str, Option<&str>)],
) -> Result<T> {
    let row = sqlx::query(&format!("SELECT data FROM {table} WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    let old = match row {
        Some(r) => decode(&r)?,
        None => return Err(StoreError::NotFound(format!("'{}' not found", id))),
    };

    let mut assignments: Vec<String> = columns.iter().map(|(c, _)| format!("{c} = ?")).collect();
    assignments.push("data = ?".to_string());
    let sql = format!("UPDATE {table} SET {} WHERE id = ?", assignments.join(", "));

    let mut query = sqlx::query(&sql);
    for (_, value) in columns {
        query = query.bind(*value);
    }
    query
        .bind(serde_json::to_string(record)?)
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| write_error(e, id))?;

    Ok(old)
}

#[async_trait]
impl JobStore for SqliteStore {
    async fn insert_job(&self, job: &Job) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        insert_job_row(&mut conn, job).await?;
        self.emit(Event::JobCreated(job.clone()));
        Ok(())
    }

    async fn get_job(&self, id: &str) -> Result<Option<Job>> {
        self.fetch_by_id(JOBS, id).await
    }

    async fn get_job_by_provider_id(&self, provider_job_id: &str) -> Result<Option<Job>> {
        let row = sqlx::query(
            "SELECT data FROM jobs WHERE provider_assigned_id = ? ORDER BY rowid DESC LIMIT 1",
        )
        .bind(provider_job_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| decode(&r)).transpose()
    }

    async fn list_jobs(&self, tenant_id: Option<&str>) -> Result<Vec<Job>> {
        let rows = match tenant_id {
            Some(tenant) => {
                sqlx::query("SELECT data FROM jobs WHERE tenant_id = ? ORDER BY rowid")
                    .bind(tenant)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT data FROM jobs ORDER BY rowid")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        decode_all(&rows)
    }

    async fn update_job(&self, job: &Job) -> Result<()> {
        let old = self
            .replace(
                JOBS,
                &job.id,
                job,
                &[
                    ("provider_assigned_id", job.provider_assigned_id.as_deref()),
                    ("state", Some(job.state.as_str())),
                ],
            )
            .await?;
        self.emit(Event::JobUpdated {
            id: job.id.clone(),
            old,
            new: job.clone(),
        });
        Ok(())
    }

    async fn delete_job(&self, id: &str) -> Result<bool> {
        let removed: Option<Job> = self.remove(JOBS, id).await?;
        if removed.is_some() {
            self.emit(Event::JobDeleted { id: id.to_string() });
        }
        Ok(removed.is_some())
    }
}

#[async_trait]
impl VolumeStore for SqliteStore {
    async fn insert_volume(&self, volume: &Volume) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        insert_volume_row(&mut conn, volume).await?;
        self.emit(Event::VolumeCreated(volume.clone()));
        Ok(())
    }

    async fn get_volume(&self, id: &str) -> Result<Option<Volume>> {
        self.fetch_by_id(VOLUMES, id).await
    }

    async fn get_volume_by_provider_id(
        &self,
        account_id: Option<&str>,
        provider_id: &str,
    ) -> Result<Option<Volume>> {
        let row = sqlx::query(
            r#"
            SELECT data FROM volumes
            WHERE provider_assigned_id = ? AND (? IS NULL OR account_id = ?)
            ORDER BY state = 'deleted', rowid DESC
            LIMIT 1
            "#,
        )
        .bind(provider_id)
        .bind(account_id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| decode(&r)).transpose()
    }

    async fn list_volumes(&self, tenant_id: &str) -> Result<Vec<Volume>> {
        let rows = sqlx::query("SELECT data FROM volumes WHERE tenant_id = ? ORDER BY rowid")
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;
        decode_all(&rows)
    }

    async fn update_volume(&self, volume: &Volume) -> Result<()> {
        let old = self
            .replace(
                VOLUMES,
                &volume.id,
                volume,
                &resource_columns(volume.provider_assigned_id.as_deref(), volume.state.as_str()),
            )
            .await?;
        self.emit(Event::VolumeUpdated {
            id: volume.id.clone(),
            old,
            new: volume.clone(),
        });
        Ok(())
    }

    async fn delete_volume(&self, id: &str) -> Result<bool> {
        let removed: Option<Volume> = self.remove(VOLUMES, id).await?;
        if removed.is_some() {
            self.emit(Event::VolumeDeleted { id: id.to_string() });
        }
        Ok(removed.is_some())
    }
}

#[async_trait]
impl VolumeImageStore for SqliteStore {
    async fn insert_volume_image(&self, image: &VolumeImage) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        insert_image_row(&mut conn, image).await?;
        self.emit(Event::VolumeImageCreated(image.clone()));
        Ok(())
    }

    async fn get_volume_image(&self, id: &str) -> Result<Option<VolumeImage>> {
        self.fetch_by_id(VOLUME_IMAGES, id).await
    }

    async fn get_volume_image_by_provider_id(
        &self,
        account_id: Option<&str>,
        provider_id: &str,
    ) -> Result<Option<VolumeImage>> {
        let row = sqlx::query(
            r#"
            SELECT data FROM volume_images
            WHERE provider_assigned_id = ? AND (? IS NULL OR account_id = ?)
            ORDER BY state = 'deleted', rowid DESC
            LIMIT 1
            "#,
        )
        .bind(provider_id)
        .bind(account_id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| decode(&r)).transpose()
    }

    async fn list_volume_images(&self, tenant_id: &str) -> Result<Vec<VolumeImage>> {
        let rows = sqlx::query("SELECT data FROM volume_images WHERE tenant_id = ? ORDER BY rowid")
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;
        decode_all(&rows)
    }

    async fn update_volume_image(&self, image: &VolumeImage) -> Result<()> {
        let old = self
            .replace(
                VOLUME_IMAGES,
                &image.id,
                image,
                &resource_columns(image.provider_assigned_id.as_deref(), image.state.as_str()),
            )
            .await?;
        self.emit(Event::VolumeImageUpdated {
            id: image.id.clone(),
            old,
            new: image.clone(),
        });
        Ok(())
    }

    async fn delete_volume_image(&self, id: &str) -> Result<bool> {
        let removed: Option<VolumeImage> = self.remove(VOLUME_IMAGES, id).await?;
        if removed.is_some() {
            self.emit(Event::VolumeImageDeleted { id: id.to_string() });
        }
        Ok(removed.is_some())
    }

    async fn get_snapshot_link(&self, id: &str) -> Result<Option<VolumeVolumeImage>> {
        self.fetch_by_id(SNAPSHOT_LINKS, id).await
    }

    async fn get_snapshot_link_by_image(
        &self,
        volume_image_id: &str,
    ) -> Result<Option<VolumeVolumeImage>> {
        let row = sqlx::query(
            "SELECT data FROM volume_volume_images WHERE volume_image_id = ? ORDER BY rowid DESC LIMIT 1",
        )
        .bind(volume_image_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| decode(&r)).transpose()
    }

    async fn list_snapshot_links(&self, volume_id: &str) -> Result<Vec<VolumeVolumeImage>> {
        let rows =
            sqlx::query("SELECT data FROM volume_volume_images WHERE volume_id = ? ORDER BY rowid")
                .bind(volume_id)
                .fetch_all(&self.pool)
                .await?;
        decode_all(&rows)
    }

    async fn update_snapshot_link(&self, link: &VolumeVolumeImage) -> Result<()> {
        let old = self.replace(SNAPSHOT_LINKS, &link.id, link, &[]).await?;
        self.emit(Event::SnapshotLinkUpdated {
            id: link.id.clone(),
            old,
            new: link.clone(),
        });
        Ok(())
    }

    async fn delete_snapshot_link(&self, id: &str) -> Result<bool> {
        let removed: Option<VolumeVolumeImage> = self.remove(SNAPSHOT_LINKS, id).await?;
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
impl SubmissionStore for SqliteStore {
    async fn commit_with_job(&self, write: ResourceWrite<'_>, job: &Job) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(parent) = job.parent_job_id.as_deref() {
            let row = sqlx::query("SELECT id FROM jobs WHERE id = ?")
                .bind(parent)
                .fetch_optional(&mut *tx)
                .await?;
            if row.is_none() {
                return Err(StoreError::NotFound(format!("parent job {}", parent)));
            }
        }

        let mut events = Vec::with_capacity(3);
        match write {
            ResourceWrite::InsertVolume(volume) => {
                insert_volume_row(&mut tx, volume).await?;
                events.push(Event::VolumeCreated(volume.clone()));
            }
            ResourceWrite::UpdateVolume(volume) => {
                let columns =
                    resource_columns(volume.provider_assigned_id.as_deref(), volume.state.as_str());
                let old = replace_row(&mut tx, VOLUMES, &volume.id, volume, &columns).await?;
                events.push(Event::VolumeUpdated {
                    id: volume.id.clone(),
                    old,
                    new: volume.clone(),
                });
            }
            ResourceWrite::InsertVolumeImage(image) => {
                insert_image_row(&mut tx, image).await?;
                events.push(Event::VolumeImageCreated(image.clone()));
            }
            ResourceWrite::UpdateVolumeImage(image) => {
                let columns =
                    resource_columns(image.provider_assigned_id.as_deref(), image.state.as_str());
                let old = replace_row(&mut tx, VOLUME_IMAGES, &image.id, image, &columns).await?;
                events.push(Event::VolumeImageUpdated {
                    id: image.id.clone(),
                    old,
                    new: image.clone(),
                });
            }
            ResourceWrite::InsertSnapshot(image, link) => {
                insert_image_row(&mut tx, image).await?;
                insert_link_row(&mut tx, link).await?;
                events.push(Event::VolumeImageCreated(image.clone()));
                events.push(Event::SnapshotLinked(link.clone()));
            }
            ResourceWrite::RemoveSnapshotLink(link) => {
                let removed: VolumeVolumeImage = remove_row(&mut tx, SNAPSHOT_LINKS, &link.id)
                    .await?
                    .ok_or_else(|| StoreError::NotFound(format!("'{}' not found", link.id)))?;
                events.push(Event::SnapshotUnlinked {
                    id: removed.id,
                    volume_id: removed.volume_id,
                });
            }
        }

        insert_job_row(&mut tx, job).await?;
        tx.commit().await?;

        events.push(Event::JobCreated(job.clone()));
        for event in events {
            self.emit(event);
        }
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for SqliteStore {
    async fn insert_volume_configuration(&self, config: &VolumeConfiguration) -> Result<()> {
        sqlx::query(
            "INSERT INTO volume_configurations (id, tenant_id, name, data) VALUES (?, ?, ?, ?)",
        )
        .bind(&config.id)
        .bind(&config.tenant_id)
        .bind(&config.name)
        .bind(serde_json::to_string(config)?)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &config.id))?;
        Ok(())
    }

    async fn get_volume_configuration(&self, id: &str) -> Result<Option<VolumeConfiguration>> {
        self.fetch_by_id(CONFIGURATIONS, id).await
    }

    async fn get_volume_configuration_by_name(
        &self,
        tenant_id: &str,
        name: &str,
    ) -> Result<Option<VolumeConfiguration>> {
        let row = sqlx::query(
            "SELECT data FROM volume_configurations WHERE tenant_id = ? AND name = ? LIMIT 1",
        )
        .bind(tenant_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| decode(&r)).transpose()
    }

    async fn list_volume_configurations(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<VolumeConfiguration>> {
        let rows = sqlx::query(
            "SELECT data FROM volume_configurations WHERE tenant_id = ? ORDER BY rowid",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        decode_all(&rows)
    }

    async fn update_volume_configuration(&self, config: &VolumeConfiguration) -> Result<()> {
        self.replace(
            CONFIGURATIONS,
            &config.id,
            config,
            &[("name", config.name.as_deref())],
        )
        .await
        .map(|_| ())
    }

    async fn delete_volume_configuration(&self, id: &str) -> Result<bool> {
        let removed: Option<VolumeConfiguration> = self.remove(CONFIGURATIONS, id).await?;
        Ok(removed.is_some())
    }

    async fn insert_volume_template(&self, template: &VolumeTemplate) -> Result<()> {
        sqlx::query("INSERT INTO volume_templates (id, tenant_id, name, data) VALUES (?, ?, ?, ?)")
            .bind(&template.id)
            .bind(&template.tenant_id)
            .bind(&template.name)
            .bind(serde_json::to_string(template)?)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, &template.id))?;
        Ok(())
    }

    async fn get_volume_template(&self, id: &str) -> Result<Option<VolumeTemplate>> {
        self.fetch_by_id(TEMPLATES, id).await
    }

    async fn get_volume_template_by_name(
        &self,
        tenant_id: &str,
        name: &str,
    ) -> Result<Option<VolumeTemplate>> {
        let row =
            sqlx::query("SELECT data FROM volume_templates WHERE tenant_id = ? AND name = ? LIMIT 1")
                .bind(tenant_id)
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        row.map(|r| decode(&r)).transpose()
    }

    async fn list_volume_templates(&self, tenant_id: &str) -> Result<Vec<VolumeTemplate>> {
        let rows =
            sqlx::query("SELECT data FROM volume_templates WHERE tenant_id = ? ORDER BY rowid")
                .bind(tenant_id)
                .fetch_all(&self.pool)
                .await?;
        decode_all(&rows)
    }

    async fn update_volume_template(&self, template: &VolumeTemplate) -> Result<()> {
        self.replace(
            TEMPLATES,
            &template.id,
            template,
            &[("name", template.name.as_deref())],
        )
        .await
        .map(|_| ())
    }

    async fn delete_volume_template(&self, id: &str) -> Result<bool> {
        let removed: Option<VolumeTemplate> = self.remove(TEMPLATES, id).await?;
        Ok(removed.is_some())
    }
}

impl DataStore for SqliteStore {
    fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}
