//! Remote hierarchical store contract.
//!
//! # Responsibility
//! - Define glob reads and tree writes against the authoritative store.
//! - Model write durability as a `CommitAck` future.
//!
//! # Invariants
//! - `fetch` returning `Ok(None)` means "not available right now", which is
//!   different from an empty or missing subtree.
//! - In a submitted tree, a `null` leaf deletes that subtree remotely.
//! - A `CommitAck` resolves exactly once.

use futures::channel::oneshot;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Transport or service failure reported by the adapter.
    Unavailable(String),
    /// Glob pattern cannot be evaluated.
    InvalidGlob(String),
    /// Submitted tree is not an object.
    InvalidTree(String),
    /// Adapter dropped the write before confirming it.
    CommitDropped,
    /// Adapter refused the write after accepting it.
    CommitRejected(String),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "remote store unavailable: {message}"),
            Self::InvalidGlob(pattern) => write!(f, "invalid remote glob: `{pattern}`"),
            Self::InvalidTree(message) => write!(f, "invalid remote write tree: {message}"),
            Self::CommitDropped => write!(f, "remote commit acknowledgement was dropped"),
            Self::CommitRejected(message) => write!(f, "remote commit rejected: {message}"),
        }
    }
}

impl Error for RemoteError {}

/// Hierarchical remote store consumed by the synchronizer and publisher.
pub trait RemoteStore {
    /// Reads the subtree selected by `glob`.
    ///
    /// `*` matches exactly one segment; a trailing `**` matches the whole
    /// remaining subtree. The returned value is rooted at the last literal
    /// segment before the first wildcard.
    fn fetch(&self, glob: &str) -> RemoteResult<Option<Value>>;

    /// Deep-merges `tree` into the store and returns the durability signal.
    fn submit(&self, tree: Value) -> RemoteResult<CommitAck>;
}

/// Resolves once the remote store reports a submitted write as durable.
#[derive(Debug)]
pub struct CommitAck {
    receiver: oneshot::Receiver<RemoteResult<()>>,
}

/// Sending half held by the adapter until the write is durable.
#[derive(Debug)]
pub struct CommitSignal {
    sender: oneshot::Sender<RemoteResult<()>>,
}

impl CommitAck {
    pub fn channel() -> (CommitSignal, CommitAck) {
        let (sender, receiver) = oneshot::channel();
        (CommitSignal { sender }, CommitAck { receiver })
    }

    /// Acknowledgement for adapters whose writes are durable on return.
    pub fn committed() -> Self {
        let (signal, ack) = Self::channel();
        signal.commit();
        ack
    }

    /// Non-blocking check for event-loop callers.
    ///
    /// Returns `None` while the commit is still pending.
    pub fn try_result(&mut self) -> Option<RemoteResult<()>> {
        match self.receiver.try_recv() {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(RemoteError::CommitDropped)),
        }
    }
}

impl Future for CommitAck {
    type Output = RemoteResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(RemoteError::CommitDropped)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl CommitSignal {
    pub fn commit(self) {
        // Receiver may already be gone; the write itself is unaffected.
        let _ = self.sender.send(Ok(()));
    }

    pub fn reject(self, message: impl Into<String>) {
        let _ = self
            .sender
            .send(Err(RemoteError::CommitRejected(message.into())));
    }
}

/// Wraps `leaf` in nested single-key objects, outermost segment first.
pub fn nest_tree(segments: &[&str], leaf: Value) -> Value {
    segments.iter().rev().fold(leaf, |inner, segment| {
        let mut level = Map::new();
        level.insert((*segment).to_string(), inner);
        Value::Object(level)
    })
}
