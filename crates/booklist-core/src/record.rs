//! Book record types
//!
//! [`Book`] is the sole domain entity. Identifiers and creation
//! timestamps are always assigned by the table store; the client only
//! ever sends [`NewBook`] (on insert) and [`BookChanges`] (on update).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Column holding the store-assigned identifier
pub const ID_COLUMN: &str = "id";

/// A book row as stored in the table and shown in the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Book {
    /// Store-assigned unique identifier
    ///
    /// Identity columns come back as JSON numbers; they are kept as text.
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    /// Book title
    pub name: String,
    /// Book author
    pub author: String,
    /// Store-managed creation timestamp, only used for ordering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Book {
    /// Copy of this record with the name replaced
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Copy of this record with the author replaced
    pub fn with_author(&self, author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            ..self.clone()
        }
    }

    /// The editable fields of this record
    pub fn changes(&self) -> BookChanges {
        BookChanges {
            name: self.name.clone(),
            author: self.author.clone(),
        }
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Int(id) => id.to_string(),
        RawId::Uint(id) => id.to_string(),
    })
}

/// Insert payload for a new book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub name: String,
    pub author: String,
}

impl NewBook {
    pub fn new(name: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            author: author.into(),
        }
    }
}

/// Update payload: the fields a client is allowed to change
///
/// Never carries the identifier or the timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookChanges {
    pub name: String,
    pub author: String,
}
