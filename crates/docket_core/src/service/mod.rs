//! Use-case services built on the document repository.
//!
//! # Responsibility
//! - Orchestrate repository and remote calls into project-level APIs.
//! - Keep the handle layer decoupled from storage details.

pub mod project_service;
pub mod project_sync;
