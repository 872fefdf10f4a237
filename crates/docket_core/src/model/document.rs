//! Document payload model.
//!
//! # Responsibility
//! - Keep arbitrary document fields in insertion order.
//! - Give the known fields (`title`, `content`, timestamps, buffer state)
//!   stable typed accessors.
//!
//! # Invariants
//! - Unknown fields survive every read/modify/write cycle untouched.
//! - The buffer state lives under `_` and never leaves the local store.

use crate::clock::{format_timestamp, parse_timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const TITLE_FIELD: &str = "title";
pub const CONTENT_FIELD: &str = "content";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";
/// Local-only bookkeeping field.
pub const BUFFER_STATE_FIELD: &str = "_";

/// Local publish bookkeeping for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferState {
    /// `true` while local edits have not been confirmed by the remote store.
    #[serde(rename = "inBuffer")]
    pub in_buffer: bool,
}

/// One project document: an ordered map of dynamically typed fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document with only `title` and `content` set.
    pub fn with_title_content(title: impl Into<String>, content: impl Into<String>) -> Self {
        let mut document = Self::new();
        document.set_title(title);
        document.set_content(content);
        document
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Converts a JSON value into a document. Only objects qualify.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.shift_remove(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Shallow merge: every field of `patch` overwrites the same field here.
    pub fn merge(&mut self, patch: &Document) {
        for (field, value) in &patch.fields {
            self.fields.insert(field.clone(), value.clone());
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.fields.get(TITLE_FIELD).and_then(Value::as_str)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.fields
            .insert(TITLE_FIELD.to_string(), Value::String(title.into()));
    }

    pub fn content(&self) -> Option<&str> {
        self.fields.get(CONTENT_FIELD).and_then(Value::as_str)
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.fields
            .insert(CONTENT_FIELD.to_string(), Value::String(content.into()));
    }

    /// Parsed `createdAt`, `None` when missing or not a timestamp.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(CREATED_AT_FIELD)
    }

    pub fn set_created_at(&mut self, instant: DateTime<Utc>) {
        self.fields.insert(
            CREATED_AT_FIELD.to_string(),
            Value::String(format_timestamp(instant)),
        );
    }

    /// Parsed `updatedAt`, `None` when missing or not a timestamp.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(UPDATED_AT_FIELD)
    }

    pub fn set_updated_at(&mut self, instant: DateTime<Utc>) {
        self.fields.insert(
            UPDATED_AT_FIELD.to_string(),
            Value::String(format_timestamp(instant)),
        );
    }

    pub fn buffer_state(&self) -> Option<BufferState> {
        self.fields
            .get(BUFFER_STATE_FIELD)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// `true` when local edits are waiting for a confirmed publish.
    pub fn is_buffered(&self) -> bool {
        self.buffer_state().is_some_and(|state| state.in_buffer)
    }

    pub fn set_buffered(&mut self, in_buffer: bool) {
        let mut state = Map::new();
        state.insert("inBuffer".to_string(), Value::Bool(in_buffer));
        self.fields
            .insert(BUFFER_STATE_FIELD.to_string(), Value::Object(state));
    }

    /// Copy without the local-only buffer state, as sent to the remote.
    pub fn without_buffer_state(&self) -> Self {
        let mut published = self.clone();
        published.remove(BUFFER_STATE_FIELD);
        published
    }

    fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.fields
            .get(field)
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
    }
}
