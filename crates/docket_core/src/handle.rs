//! Typed facade exposed to UI callers.
//!
//! # Responsibility
//! - Group document and project operations behind one owned handle.
//! - Expose the path separator and hierarchy reconstruction helpers.
//!
//! # Invariants
//! - The handle owns one `DocumentRepository`; ids it issues stay unique for
//!   the handle's lifetime.

use crate::context::CoreContext;
use crate::model::document::Document;
use crate::model::hierarchy::{unflatten_documents, DocumentNode};
use crate::model::path;
use crate::model::project::ProjectDraft;
use crate::repo::document_repo::{DocumentRepository, RepoResult};
use crate::service::project_service::{CreatedProject, ProjectService};
use crate::service::project_sync::{InitOutcome, ProjectSynchronizer};
use crate::store::remote::{CommitAck, RemoteResult};
use serde_json::Value;
use std::collections::BTreeMap;

/// Entry point bundling the document repository and project service.
pub struct CoreHandle {
    documents: DocumentRepository,
    projects: ProjectService,
}

impl CoreHandle {
    pub const DOC_SEPARATOR: &'static str = path::DOC_SEPARATOR;

    pub fn new(ctx: CoreContext) -> Self {
        Self {
            projects: ProjectService::new(ctx.clone()),
            documents: DocumentRepository::new(ctx),
        }
    }

    pub fn context(&self) -> &CoreContext {
        self.documents.context()
    }

    pub fn document(&self) -> &DocumentRepository {
        &self.documents
    }

    pub fn project(&self) -> ProjectHandle<'_> {
        ProjectHandle {
            service: &self.projects,
            sync: ProjectSynchronizer::new(&self.documents),
        }
    }

    /// Nested view of any flat `path -> document` map.
    pub fn unflatten_documents<'a, I>(flat: I) -> BTreeMap<String, DocumentNode>
    where
        I: IntoIterator<Item = (&'a String, &'a Document)>,
    {
        unflatten_documents(flat)
    }

    /// Nested view of every local document of `project_id`.
    pub fn document_tree(&self, project_id: &str) -> RepoResult<BTreeMap<String, DocumentNode>> {
        let documents = self.documents.get_all_documents(project_id)?;
        Ok(unflatten_documents(&documents))
    }
}

/// Project operations borrowed from a `CoreHandle`.
pub struct ProjectHandle<'h> {
    service: &'h ProjectService,
    sync: ProjectSynchronizer<'h>,
}

impl ProjectHandle<'_> {
    pub fn get_all(&self) -> RemoteResult<Option<Value>> {
        self.service.get_all()
    }

    pub fn get(&self, project_id: &str) -> RemoteResult<Option<Value>> {
        self.service.get(project_id)
    }

    pub fn create(&self, draft: &ProjectDraft) -> RemoteResult<CreatedProject> {
        self.service.create(draft)
    }

    pub fn delete(&self, project_id: &str) -> RemoteResult<CommitAck> {
        self.service.delete(project_id)
    }

    pub fn update(&self, project_id: &str, project: Value) -> RemoteResult<CommitAck> {
        self.service.update(project_id, project)
    }

    /// Pulls remote documents into the local store.
    pub fn init(&self, project_id: &str, force: bool) -> RepoResult<InitOutcome> {
        self.sync.initialize_project(project_id, force)
    }
}
