//! In-process remote store.
//!
//! # Responsibility
//! - Evaluate `*` / `**` globs over one JSON tree.
//! - Hold commit acknowledgements until the owner releases them, so callers
//!   can observe the window between submit and durability.
//!
//! # Invariants
//! - Writes are visible to `fetch` immediately; only the ack is deferred.
//! - `fetch` while offline returns `Ok(None)` and still counts as a fetch.

use crate::store::remote::{CommitAck, CommitSignal, RemoteError, RemoteResult, RemoteStore};
use log::debug;
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};

const SEGMENT_SEPARATOR: char = '/';
const ANY_SEGMENT: &str = "*";
const ANY_SUBTREE: &str = "**";

/// Single-threaded in-memory implementation of `RemoteStore`.
#[derive(Debug)]
pub struct MemoryRemoteStore {
    root: RefCell<Map<String, Value>>,
    available: Cell<bool>,
    auto_commit: Cell<bool>,
    fetch_count: Cell<usize>,
    pending: RefCell<Vec<CommitSignal>>,
    submissions: RefCell<Vec<Value>>,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemoteStore {
    /// Creates an empty, online store that defers commit acknowledgements.
    pub fn new() -> Self {
        Self {
            root: RefCell::new(Map::new()),
            available: Cell::new(true),
            auto_commit: Cell::new(false),
            fetch_count: Cell::new(0),
            pending: RefCell::new(Vec::new()),
            submissions: RefCell::new(Vec::new()),
        }
    }

    /// Acknowledge every write as soon as it is submitted.
    pub fn with_auto_commit(self) -> Self {
        self.auto_commit.set(true);
        self
    }

    /// Merges `tree` without recording a submission or issuing an ack.
    pub fn seed(&self, tree: Value) -> RemoteResult<()> {
        let Value::Object(tree) = tree else {
            return Err(RemoteError::InvalidTree("seed tree must be an object".to_string()));
        };
        deep_merge(&mut self.root.borrow_mut(), tree);
        Ok(())
    }

    /// Toggles availability. Offline fetches yield `Ok(None)`; offline
    /// submits fail with `RemoteError::Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.get()
    }

    pub fn pending_commits(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Confirms all pending writes. Returns how many were confirmed.
    pub fn commit_pending(&self) -> usize {
        let signals: Vec<CommitSignal> = self.pending.borrow_mut().drain(..).collect();
        let count = signals.len();
        for signal in signals {
            signal.commit();
        }
        count
    }

    /// Drops all pending acknowledgements without confirming them.
    pub fn drop_pending(&self) -> usize {
        let signals: Vec<CommitSignal> = self.pending.borrow_mut().drain(..).collect();
        signals.len()
    }

    /// Trees passed to `submit`, oldest first.
    pub fn submissions(&self) -> Vec<Value> {
        self.submissions.borrow().clone()
    }

    /// Reads one node by literal segments without counting as a fetch.
    pub fn value_at(&self, segments: &[&str]) -> Option<Value> {
        let root = self.root.borrow();
        let (first, rest) = segments.split_first()?;
        let mut node = root.get(*first)?;
        for segment in rest {
            node = node.get(*segment)?;
        }
        Some(node.clone())
    }
}

impl RemoteStore for MemoryRemoteStore {
    fn fetch(&self, glob: &str) -> RemoteResult<Option<Value>> {
        let segments = parse_glob(glob)?;
        self.fetch_count.set(self.fetch_count.get() + 1);
        if !self.available.get() {
            debug!("event=remote_fetch module=memory_remote status=unavailable");
            return Ok(None);
        }

        let literal_len = segments
            .iter()
            .take_while(|segment| !is_wildcard(segment))
            .count();
        let (literal, pattern) = segments.split_at(literal_len);

        let root = Value::Object(self.root.borrow().clone());
        let mut node = &root;
        for segment in literal {
            match node.get(*segment) {
                Some(child) => node = child,
                None => return Ok(Some(Value::Null)),
            }
        }

        if pattern.is_empty() {
            return Ok(Some(node.clone()));
        }
        Ok(Some(
            select(node, pattern).unwrap_or_else(|| Value::Object(Map::new())),
        ))
    }

    fn submit(&self, tree: Value) -> RemoteResult<CommitAck> {
        if !self.available.get() {
            return Err(RemoteError::Unavailable("remote store is offline".to_string()));
        }
        let Value::Object(object) = tree.clone() else {
            return Err(RemoteError::InvalidTree("write tree must be an object".to_string()));
        };

        deep_merge(&mut self.root.borrow_mut(), object);
        self.submissions.borrow_mut().push(tree);

        if self.auto_commit.get() {
            return Ok(CommitAck::committed());
        }
        let (signal, ack) = CommitAck::channel();
        self.pending.borrow_mut().push(signal);
        Ok(ack)
    }
}

fn parse_glob(glob: &str) -> RemoteResult<Vec<&str>> {
    if glob.is_empty() {
        return Err(RemoteError::InvalidGlob(glob.to_string()));
    }
    let segments: Vec<&str> = glob.split(SEGMENT_SEPARATOR).collect();
    let misplaced_subtree = segments
        .iter()
        .enumerate()
        .any(|(idx, segment)| *segment == ANY_SUBTREE && idx + 1 != segments.len());
    if misplaced_subtree {
        return Err(RemoteError::InvalidGlob(glob.to_string()));
    }
    Ok(segments)
}

fn is_wildcard(segment: &str) -> bool {
    segment == ANY_SEGMENT || segment == ANY_SUBTREE
}

/// Prunes `node` to the parts matched by `pattern`; `None` when nothing matches.
fn select(node: &Value, pattern: &[&str]) -> Option<Value> {
    let Some((head, rest)) = pattern.split_first() else {
        return Some(node.clone());
    };

    match *head {
        ANY_SUBTREE => Some(node.clone()),
        ANY_SEGMENT => {
            let matched: Map<String, Value> = node
                .as_object()?
                .iter()
                .filter_map(|(key, child)| select(child, rest).map(|value| (key.clone(), value)))
                .collect();
            (!matched.is_empty()).then_some(Value::Object(matched))
        }
        literal => {
            let value = select(node.get(literal)?, rest)?;
            let mut wrapped = Map::new();
            wrapped.insert(literal.to_string(), value);
            Some(Value::Object(wrapped))
        }
    }
}

fn deep_merge(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match value {
            Value::Null => {
                target.remove(&key);
            }
            Value::Object(child_patch) => match target.get_mut(&key) {
                Some(Value::Object(existing)) => deep_merge(existing, child_patch),
                _ => {
                    let mut fresh = Map::new();
                    deep_merge(&mut fresh, child_patch);
                    target.insert(key, Value::Object(fresh));
                }
            },
            other => {
                target.insert(key, other);
            }
        }
    }
}
