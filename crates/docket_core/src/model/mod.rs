//! Domain model for project documents.
//!
//! # Responsibility
//! - Define the semi-structured `Document` payload and its typed accessors.
//! - Define dot-separated document paths and the derived hierarchy view.
//!
//! # Invariants
//! - A document's parent is found by dropping the last path segment.
//! - Hierarchy nodes are derived on demand and never persisted.

pub mod document;
pub mod hierarchy;
pub mod path;
pub mod project;
