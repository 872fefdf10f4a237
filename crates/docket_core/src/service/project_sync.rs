//! Remote-to-local project initialization.
//!
//! # Responsibility
//! - Pull every published document of a project and merge it into the
//!   local store, at most once per staleness window unless forced.
//!
//! # Invariants
//! - A remote document replaces the local one only when no local copy
//!   exists or the remote `updatedAt` is strictly newer.
//! - Documents that exist only locally are never touched.
//! - The initialization marker is written only after a completed merge;
//!   an unavailable remote leaves it unchanged.

use crate::clock::{format_timestamp, parse_timestamp};
use crate::model::document::Document;
use crate::repo::document_repo::{DocumentRepository, RepoResult};
use crate::store::keys;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::time::Instant;

/// Result of one `initialize_project` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Nothing was fetched (see reason).
    Skipped { reason: SkipReason },
    /// The remote store returned no result; nothing was merged.
    Aborted,
    /// Remote documents were merged.
    Merged {
        /// Documents written from the remote copy.
        applied: usize,
        /// Remote documents ignored because the local copy won.
        kept: usize,
    },
}

/// Reason why initialization did not contact the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Empty project id.
    MissingProject,
    /// Last initialization is inside the staleness window.
    Fresh,
}

/// Merges remote project documents into the local store.
pub struct ProjectSynchronizer<'repo> {
    repo: &'repo DocumentRepository,
}

impl<'repo> ProjectSynchronizer<'repo> {
    pub fn new(repo: &'repo DocumentRepository) -> Self {
        Self { repo }
    }

    /// Fetches all remote documents of `project_id` and merges them locally.
    ///
    /// Without `force`, a project initialized within the staleness window
    /// is skipped without fetching.
    pub fn initialize_project(&self, project_id: &str, force: bool) -> RepoResult<InitOutcome> {
        if project_id.is_empty() {
            return Ok(InitOutcome::Skipped {
                reason: SkipReason::MissingProject,
            });
        }

        let ctx = self.repo.context();
        if !force && self.is_fresh(project_id, ctx.clock.now())? {
            debug!(
                "event=project_init module=sync status=skipped reason=fresh project_id={}",
                project_id
            );
            return Ok(InitOutcome::Skipped {
                reason: SkipReason::Fresh,
            });
        }

        let started_at = Instant::now();
        let Some(fetched) = self.repo.fetch_all_documents(project_id)? else {
            warn!(
                "event=project_init module=sync status=aborted reason=remote_unavailable project_id={}",
                project_id
            );
            return Ok(InitOutcome::Aborted);
        };

        let remote_documents = match fetched {
            Value::Object(entries) => entries,
            Value::Null => Map::new(),
            _ => {
                warn!(
                    "event=project_init module=sync status=coerced reason=not_an_object project_id={}",
                    project_id
                );
                Map::new()
            }
        };

        let mut applied = 0;
        let mut kept = 0;
        for (path, value) in remote_documents {
            let Some(remote) = Document::from_value(value) else {
                warn!(
                    "event=project_init module=sync status=skipped reason=not_an_object project_id={} path={}",
                    project_id, path
                );
                continue;
            };
            let local = self.repo.get_document(project_id, &path)?;
            if remote_wins(local.as_ref(), &remote) {
                self.repo.set_document(project_id, &path, Some(&remote))?;
                applied += 1;
            } else {
                kept += 1;
            }
        }

        ctx.local.store(
            &keys::init_marker_key(project_id),
            &Value::String(format_timestamp(ctx.clock.now())),
        )?;
        info!(
            "event=project_init module=sync status=ok project_id={} applied={} kept={} duration_ms={}",
            project_id,
            applied,
            kept,
            started_at.elapsed().as_millis()
        );
        Ok(InitOutcome::Merged { applied, kept })
    }

    /// Time of the last completed initialization, if recorded and parseable.
    pub fn last_initialized_at(&self, project_id: &str) -> RepoResult<Option<DateTime<Utc>>> {
        let stored = self
            .repo
            .context()
            .local
            .retrieve(&keys::init_marker_key(project_id))?;
        Ok(stored
            .as_ref()
            .and_then(Value::as_str)
            .and_then(parse_timestamp))
    }

    fn is_fresh(&self, project_id: &str, now: DateTime<Utc>) -> RepoResult<bool> {
        let Some(last) = self.last_initialized_at(project_id)? else {
            return Ok(false);
        };
        let window = self.repo.context().config.staleness_window();
        Ok(match now.checked_sub_signed(window) {
            Some(threshold) => last > threshold,
            None => true,
        })
    }
}

/// Merge precedence between a local document and its remote counterpart.
///
/// Unparseable or missing timestamps on either side keep the local copy.
pub fn remote_wins(local: Option<&Document>, remote: &Document) -> bool {
    let Some(local) = local else {
        return true;
    };
    matches!(
        (remote.updated_at(), local.updated_at()),
        (Some(remote_at), Some(local_at)) if remote_at > local_at
    )
}
