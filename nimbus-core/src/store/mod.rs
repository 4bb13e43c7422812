//! Persistence boundary and its engines.

mod error;
mod event;
mod memory;
mod sqlite;
mod traits;

pub use error::{Result, StoreError};
pub use event::Event;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{
    DataStore, JobStore, ResourceWrite, SubmissionStore, TemplateStore, VolumeImageStore,
    VolumeStore,
};

/// Capacity of the change-event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;
