//! Client for the notes HTTP API, used by the chat dispatcher

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A completed note ready for submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// Seam between the note-creation dialog and the notes API
#[async_trait]
pub trait NoteSubmitter: Send + Sync {
    async fn submit(&self, note: &NewNote) -> Result<(), String>;
}

pub struct NotesApiClient {
    base_url: String,
}

impl NotesApiClient {
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }
}

#[async_trait]
impl NoteSubmitter for NotesApiClient {
    /// POST the note to the API. Any non-success status is a failure.
    async fn submit(&self, note: &NewNote) -> Result<(), String> {
        let url = format!("{}/notes", self.base_url);

        let response = crate::http::shared_client()
            .post(&url)
            .json(note)
            .send()
            .await
            .map_err(|e| format!("Request to {} failed: {}", url, e))?;

        if !response.status().is_success() {
            return Err(format!("Notes API returned HTTP {}", response.status()));
        }

        Ok(())
    }
}
