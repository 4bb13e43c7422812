//! Job orchestration for provider-backed volumes and volume images.
//!
//! Resource managers submit operations to pluggable provider connectors,
//! persist provisional state, and reconcile provider completions that
//! arrive later, possibly more than once.

pub mod cloud;
pub mod completion;
pub mod connector;
pub mod error;
pub mod job;
pub mod manager;
pub mod model;
pub mod placement;
pub mod store;
pub mod template;
pub mod volume;
pub mod volume_image;

#[cfg(test)]
mod testing;

pub use cloud::Cloud;
pub use completion::{
    ChannelNotifier, CompletionDispatcher, CompletionListener, CompletionNotifier,
    CompletionOutcome, NoopNotifier,
};
pub use connector::{ConnectorRegistry, MockConnector};
pub use error::{CloudError, Result};
pub use job::JobManager;
pub use manager::ManagerContext;
pub use placement::{ProviderAccount, StaticPlacement};
pub use store::{DataStore, MemoryStore, SqliteStore};
pub use volume::VolumeManager;
pub use volume_image::VolumeImageManager;
