//! Client-side document core for Docket.
//!
//! Documents live in a local key/value store, are published one at a time to
//! a hierarchical remote store, and are pulled back per project. This crate
//! is the single source of truth for the index, selection and merge rules.

pub mod clock;
pub mod config;
pub mod context;
pub mod db;
pub mod handle;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, CoreConfig, LoggingConfig};
pub use context::CoreContext;
pub use handle::{CoreHandle, ProjectHandle};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::document::{BufferState, Document};
pub use model::hierarchy::{unflatten_documents, DocumentNode};
pub use model::path::DOC_SEPARATOR;
pub use model::project::ProjectDraft;
pub use repo::document_repo::{DocumentRepository, PendingPublish, RepoError, RepoResult};
pub use service::project_service::{CreatedProject, ProjectService};
pub use service::project_sync::{InitOutcome, ProjectSynchronizer, SkipReason};
pub use store::local::{LocalStore, LocalStoreError, SqliteLocalStore};
pub use store::memory_remote::MemoryRemoteStore;
pub use store::remote::{CommitAck, CommitSignal, RemoteError, RemoteResult, RemoteStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
