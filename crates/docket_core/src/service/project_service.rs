//! Project metadata use-case service.
//!
//! # Responsibility
//! - Read and write project records under `{account}/thing/project`.
//!
//! # Invariants
//! - Every write is a tree nested under the context account.
//! - Project ids are fresh v4 UUIDs.

use crate::context::CoreContext;
use crate::model::project::ProjectDraft;
use crate::store::keys;
use crate::store::remote::{nest_tree, CommitAck, RemoteResult};
use log::info;
use serde_json::Value;
use uuid::Uuid;

const THING_SEGMENT: &str = "thing";
const PROJECT_SEGMENT: &str = "project";

/// A project record submitted to the remote store.
#[derive(Debug)]
pub struct CreatedProject {
    pub project_id: String,
    /// Resolves when the remote store confirms the record.
    pub ack: CommitAck,
}

/// Project CRUD over the remote store.
#[derive(Clone)]
pub struct ProjectService {
    ctx: CoreContext,
}

impl ProjectService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    /// All project records of the account, keyed by project id.
    pub fn get_all(&self) -> RemoteResult<Option<Value>> {
        self.ctx
            .remote
            .fetch(&keys::projects_glob(&self.ctx.account_id))
    }

    /// One project record subtree.
    pub fn get(&self, project_id: &str) -> RemoteResult<Option<Value>> {
        self.ctx
            .remote
            .fetch(&keys::project_glob(&self.ctx.account_id, project_id))
    }

    /// Submits a new project record and returns its generated id.
    pub fn create(&self, draft: &ProjectDraft) -> RemoteResult<CreatedProject> {
        let project_id = Uuid::new_v4().to_string();
        let ack = self.submit_record(&project_id, draft.to_record(&self.ctx.config))?;
        info!(
            "event=project_create module=service status=submitted project_id={}",
            project_id
        );
        Ok(CreatedProject { project_id, ack })
    }

    /// Submits a tombstone (`null`) for the project record.
    pub fn delete(&self, project_id: &str) -> RemoteResult<CommitAck> {
        let ack = self.submit_record(project_id, Value::Null)?;
        info!(
            "event=project_delete module=service status=submitted project_id={}",
            project_id
        );
        Ok(ack)
    }

    /// Deep-merges `project` into the stored record.
    pub fn update(&self, project_id: &str, project: Value) -> RemoteResult<CommitAck> {
        let ack = self.submit_record(project_id, project)?;
        info!(
            "event=project_update module=service status=submitted project_id={}",
            project_id
        );
        Ok(ack)
    }

    fn submit_record(&self, project_id: &str, record: Value) -> RemoteResult<CommitAck> {
        let tree = nest_tree(
            &[
                self.ctx.account_id.as_str(),
                THING_SEGMENT,
                PROJECT_SEGMENT,
                project_id,
            ],
            record,
        );
        self.ctx.remote.submit(tree)
    }
}
