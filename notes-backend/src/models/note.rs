use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-authored text record with title, content, and tags.
///
/// `updated_at` equals `created_at` on creation; no update operation
/// exists, so it never moves afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named label, unique by name, attachable to many notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}
