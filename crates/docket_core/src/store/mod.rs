//! Storage adapters consumed by the document core.
//!
//! # Responsibility
//! - Name every persisted key (`keys`).
//! - Define the local key/value and remote hierarchical store contracts.
//! - Ship one concrete adapter for each contract.
//!
//! # Invariants
//! - Adapters never interpret document payloads.
//! - Adapter failures are surfaced unchanged to callers; nothing retries.

pub mod keys;
pub mod local;
pub mod memory_remote;
pub mod remote;
