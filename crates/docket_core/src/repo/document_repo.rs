//! Document repository over the local key/value store.
//!
//! # Responsibility
//! - CRUD over flat, path-keyed documents of one project.
//! - Maintain the per-project document index and selected-document pointer.
//! - Track buffered (unpublished) state and publish single documents.
//!
//! # Invariants
//! - After every mutating call the index lists exactly the paths with a
//!   persisted document, without duplicates, in first-insertion order.
//! - Every `set_document` call, deletes included, moves the selection to the
//!   written path.
//! - Deleting a document never touches its descendants.
//! - Index and selection inconsistencies are tolerated on read, never raised.
//! - A generated document id is never handed out twice in one process.

use crate::context::CoreContext;
use crate::logging::sanitize_message;
use crate::model::document::Document;
use crate::model::path::{child_path, is_descendant_of, ROOT_PATH};
use crate::store::keys;
use crate::store::local::LocalStoreError;
use crate::store::remote::{nest_tree, CommitAck, RemoteError};
use indexmap::IndexMap;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use rand::Rng;
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_ATTEMPTS_PER_LENGTH: usize = 64;
const MAX_LOGGED_PATH_CHARS: usize = 96;

/// Every document id handed out by any repository in this process.
static ISSUED_DOCUMENT_IDS: Lazy<Mutex<HashSet<String>>> =
    Lazy::new(|| Mutex::new(HashSet::new()));

pub type RepoResult<T> = Result<T, RepoError>;

/// Adapter failures surfaced by repository operations.
#[derive(Debug)]
pub enum RepoError {
    Local(LocalStoreError),
    Remote(RemoteError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(err) => write!(f, "local store error: {err}"),
            Self::Remote(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Local(err) => Some(err),
            Self::Remote(err) => Some(err),
        }
    }
}

impl From<LocalStoreError> for RepoError {
    fn from(value: LocalStoreError) -> Self {
        Self::Local(value)
    }
}

impl From<RemoteError> for RepoError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

/// A submitted publish waiting for the remote commit acknowledgement.
///
/// Hand it back to `DocumentRepository::settle_publish` to clear the
/// buffered flag once the remote store confirms the write.
#[derive(Debug)]
pub struct PendingPublish {
    project_id: String,
    path: String,
    published: Document,
    ack: CommitAck,
}

impl PendingPublish {
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Payload exactly as submitted to the remote store.
    pub fn published(&self) -> &Document {
        &self.published
    }
}

/// Document CRUD, index maintenance and publishing for one account session.
pub struct DocumentRepository {
    ctx: CoreContext,
}

impl DocumentRepository {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &CoreContext {
        &self.ctx
    }

    /// Writes (`Some`) or deletes (`None`) the document at `path`.
    ///
    /// # Side effects
    /// - Appends `path` to the index on first write; removes it on delete.
    /// - Always sets the selected-document pointer to `path`.
    pub fn set_document(
        &self,
        project_id: &str,
        path: &str,
        value: Option<&Document>,
    ) -> RepoResult<()> {
        let local = self.ctx.local.as_ref();
        let index_key = keys::docs_index_key(project_id);
        let mut index = self.document_index(project_id)?;

        match value {
            Some(document) => {
                local.store(&keys::doc_key(project_id, path), &document.to_value())?;
                if !index.iter().any(|entry| entry == path) {
                    index.push(path.to_string());
                    local.store(&index_key, &index_to_value(&index))?;
                }
            }
            None => {
                local.store(&keys::doc_key(project_id, path), &Value::Null)?;
                index.retain(|entry| entry != path);
                local.store(&index_key, &index_to_value(&index))?;
            }
        }

        self.open_document(project_id, path)?;
        debug!(
            "event=doc_set module=repo status=ok project_id={} path={} deleted={} index_len={}",
            project_id,
            loggable(path),
            value.is_none(),
            index.len()
        );
        Ok(())
    }

    /// Shallow-merges `partial` over the stored document and marks it buffered.
    ///
    /// A missing document is treated as empty. Returns the written document.
    pub fn update_document(
        &self,
        project_id: &str,
        path: &str,
        partial: &Document,
    ) -> RepoResult<Document> {
        let mut document = self.get_document(project_id, path)?.unwrap_or_default();
        document.merge(partial);
        document.set_updated_at(self.ctx.clock.now());
        document.set_buffered(true);
        self.set_document(project_id, path, Some(&document))?;
        Ok(document)
    }

    /// Creates a buffered document under `parent_path` (root by default).
    ///
    /// Returns the new path: `{parent}.{id}`, or just `{id}` under the root.
    pub fn create_document(
        &self,
        project_id: &str,
        parent_path: Option<&str>,
        value: Option<Document>,
    ) -> RepoResult<String> {
        let parent = parent_path.unwrap_or(ROOT_PATH);
        let path = child_path(parent, &self.generate_document_id());
        let mut document = value.unwrap_or_else(|| Document::with_title_content("", ""));
        document.set_created_at(self.ctx.clock.now());
        document.set_buffered(true);
        self.set_document(project_id, &path, Some(&document))?;
        info!(
            "event=doc_create module=repo status=ok project_id={} path={}",
            project_id,
            loggable(&path)
        );
        Ok(path)
    }

    /// Deletes one document. Descendant paths are left in place.
    pub fn delete_document(&self, project_id: &str, path: &str) -> RepoResult<()> {
        self.set_document(project_id, path, None)
    }

    /// Returns the stored document, or `None` when absent.
    ///
    /// A stored value that is not a JSON object reads as absent.
    pub fn get_document(&self, project_id: &str, path: &str) -> RepoResult<Option<Document>> {
        let stored = self.ctx.local.retrieve(&keys::doc_key(project_id, path))?;
        Ok(stored.and_then(|value| {
            let document = Document::from_value(value);
            if document.is_none() {
                warn!(
                    "event=doc_read module=repo status=skipped reason=not_an_object project_id={} path={}",
                    project_id,
                    loggable(path)
                );
            }
            document
        }))
    }

    /// All documents listed by the index, in index order.
    ///
    /// Index entries without a stored document are skipped.
    pub fn get_all_documents(&self, project_id: &str) -> RepoResult<IndexMap<String, Document>> {
        let mut documents = IndexMap::new();
        for path in self.document_index(project_id)? {
            match self.get_document(project_id, &path)? {
                Some(document) => {
                    documents.insert(path, document);
                }
                None => debug!(
                    "event=doc_list module=repo status=skipped reason=missing_document project_id={} path={}",
                    project_id,
                    loggable(&path)
                ),
            }
        }
        Ok(documents)
    }

    /// Returns the selected path, falling back to the first document.
    ///
    /// # Side effects
    /// - When the fallback is used, the first document becomes selected.
    pub fn get_selected_document(&self, project_id: &str) -> RepoResult<Option<String>> {
        let stored = self
            .ctx
            .local
            .retrieve(&keys::selected_doc_key(project_id))?;
        if let Some(Value::String(selected)) = stored {
            return Ok(Some(selected));
        }

        let first = self.get_all_documents(project_id)?.into_keys().next();
        if let Some(path) = first.as_deref() {
            self.open_document(project_id, path)?;
        }
        Ok(first)
    }

    /// Moves the selection to `path` without touching document content.
    pub fn open_document(&self, project_id: &str, path: &str) -> RepoResult<()> {
        self.ctx.local.store(
            &keys::selected_doc_key(project_id),
            &Value::String(path.to_string()),
        )?;
        Ok(())
    }

    /// Submits the local document (minus its buffer state) to the remote store.
    ///
    /// Returns `Ok(None)` without contacting the remote when nothing is
    /// stored at `path`. The buffered flag stays set until the returned
    /// `PendingPublish` is settled.
    pub fn publish_document(
        &self,
        project_id: &str,
        path: &str,
    ) -> RepoResult<Option<PendingPublish>> {
        let Some(document) = self.get_document(project_id, path)? else {
            warn!(
                "event=doc_publish module=repo status=skipped reason=missing_document project_id={} path={}",
                project_id,
                loggable(path)
            );
            return Ok(None);
        };

        let published = document.without_buffer_state();
        let tree = nest_tree(
            &[
                self.ctx.account_id.as_str(),
                "document",
                project_id,
                path,
            ],
            published.to_value(),
        );
        let ack = self.ctx.remote.submit(tree)?;
        info!(
            "event=doc_publish module=repo status=submitted project_id={} path={}",
            project_id,
            loggable(path)
        );

        Ok(Some(PendingPublish {
            project_id: project_id.to_string(),
            path: path.to_string(),
            published,
            ack,
        }))
    }

    /// Waits for the remote commit, then stores the published snapshot with
    /// `inBuffer = false`.
    ///
    /// On a failed or dropped commit nothing is written locally and the
    /// document stays buffered.
    pub async fn settle_publish(&self, pending: PendingPublish) -> RepoResult<()> {
        let PendingPublish {
            project_id,
            path,
            published,
            ack,
        } = pending;

        if let Err(err) = ack.await {
            warn!(
                "event=doc_publish module=repo status=error project_id={} path={} error={}",
                project_id,
                loggable(&path),
                err
            );
            return Err(err.into());
        }

        let mut committed = published;
        committed.set_buffered(false);
        self.set_document(&project_id, &path, Some(&committed))?;
        info!(
            "event=doc_publish module=repo status=committed project_id={} path={}",
            project_id,
            loggable(&path)
        );
        Ok(())
    }

    /// Fresh lowercase alphanumeric id, never issued before in this process.
    pub fn generate_document_id(&self) -> String {
        let mut rng = rand::thread_rng();
        let mut issued = ISSUED_DOCUMENT_IDS
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut length = self.ctx.config.document_id_length.max(1);
        let mut attempts = 0;
        loop {
            let id: String = (0..length)
                .map(|_| char::from(ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())]))
                .collect();
            if issued.insert(id.clone()) {
                return id;
            }
            attempts += 1;
            // Crowded id space: widen instead of spinning.
            if attempts % ID_ATTEMPTS_PER_LENGTH == 0 {
                length += 1;
            }
        }
    }

    /// Reads one published document subtree from the remote store.
    pub fn fetch_document(&self, project_id: &str, path: &str) -> RepoResult<Option<Value>> {
        let glob = keys::document_subtree_glob(&self.ctx.account_id, project_id, path);
        Ok(self.ctx.remote.fetch(&glob)?)
    }

    /// Reads every published document of the project, keyed by path.
    pub fn fetch_all_documents(&self, project_id: &str) -> RepoResult<Option<Value>> {
        let glob = keys::document_glob(&self.ctx.account_id, project_id);
        Ok(self.ctx.remote.fetch(&glob)?)
    }

    /// Reads only the titles of published documents: `{path: {title}}`.
    pub fn fetch_all_titles(&self, project_id: &str) -> RepoResult<Option<Value>> {
        let glob = keys::document_titles_glob(&self.ctx.account_id, project_id);
        Ok(self.ctx.remote.fetch(&glob)?)
    }

    /// The project's document index.
    ///
    /// A stored value that is not an array reads as empty; non-string and
    /// repeated entries are dropped.
    pub fn document_index(&self, project_id: &str) -> RepoResult<Vec<String>> {
        let stored = self
            .ctx
            .local
            .retrieve(&keys::docs_index_key(project_id))?;
        let entries = match stored {
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                warn!(
                    "event=doc_index module=repo status=coerced reason=not_an_array project_id={}",
                    project_id
                );
                Vec::new()
            }
            None => Vec::new(),
        };

        let mut seen = HashSet::new();
        Ok(entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(path) => Some(path),
                _ => None,
            })
            .filter(|path| seen.insert(path.clone()))
            .collect())
    }

    /// Indexed paths strictly below `path`, in index order.
    ///
    /// Useful to find documents left behind after deleting an ancestor.
    pub fn descendant_paths(&self, project_id: &str, path: &str) -> RepoResult<Vec<String>> {
        Ok(self
            .document_index(project_id)?
            .into_iter()
            .filter(|candidate| is_descendant_of(candidate, path))
            .collect())
    }
}

fn index_to_value(index: &[String]) -> Value {
    Value::Array(index.iter().cloned().map(Value::String).collect())
}

fn loggable(path: &str) -> String {
    sanitize_message(path, MAX_LOGGED_PATH_CHARS)
}
