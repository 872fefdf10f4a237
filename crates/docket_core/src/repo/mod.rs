//! Repository layer over the local and remote store adapters.
//!
//! # Responsibility
//! - Define document-level data access on top of raw key/value storage.
//! - Isolate storage key layout from service orchestration.
//!
//! # Invariants
//! - Repository APIs surface adapter failures as `RepoError`; missing data
//!   is reported as `None`, never as an error.

pub mod document_repo;
