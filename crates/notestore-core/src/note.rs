//! The note record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::ValidationError;
use crate::KEY_PATH;

/// A note. The title is the record's only attribute and its store key.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
}

impl Note {
    /// Create a note without validating the title.
    ///
    /// Use [`crate::validate_title`] first when the title comes from a caller.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// The title, which doubles as the store key.
    pub fn key(&self) -> &str {
        &self.title
    }

    /// Convert to the object shape persisted in the store: `{"title": ...}`.
    pub fn to_record(&self) -> Value {
        let mut object = Map::new();
        object.insert(KEY_PATH.to_string(), Value::String(self.title.clone()));
        Value::Object(object)
    }

    /// Rebuild a note from a stored object.
    ///
    /// Extra fields are ignored; a missing or non-string title is rejected.
    pub fn from_record(record: &Value) -> Result<Self, ValidationError> {
        match record.get(KEY_PATH) {
            Some(Value::String(title)) => Ok(Self::new(title.clone())),
            Some(other) => Err(ValidationError::MalformedRecord(format!(
                "`{KEY_PATH}` must be a string, got {other}"
            ))),
            None => Err(ValidationError::MalformedRecord(format!(
                "missing `{KEY_PATH}` field"
            ))),
        }
    }
}

impl fmt::Debug for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Note({:?})", self.title)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

impl From<&str> for Note {
    fn from(title: &str) -> Self {
        Self::new(title)
    }
}
