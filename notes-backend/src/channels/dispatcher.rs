//! Dispatcher routes chat messages through the note-creation dialog.
//!
//! Dialog state is kept in process memory per chat/user key; a restart
//! drops all in-flight dialogs.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use crate::channels::types::{DispatchResult, NormalizedMessage};
use crate::notes_client::{NewNote, NoteSubmitter};

const START_COMMAND: &str = "/newnote";

/// Progress of one user's note-creation dialog.
/// Absence from the map is the idle state.
#[derive(Debug, Clone)]
enum DialogState {
    AwaitingTitle,
    AwaitingContent { title: String },
    AwaitingTags { title: String, content: String },
}

struct DialogEntry {
    state: DialogState,
    last_activity: DateTime<Utc>,
}

impl DialogEntry {
    fn new(state: DialogState) -> Self {
        Self {
            state,
            last_activity: Utc::now(),
        }
    }
}

/// Dispatcher walks each user through title → content → tags and
/// submits the finished note to the API.
pub struct MessageDispatcher {
    submitter: Arc<dyn NoteSubmitter>,
    dialogs: DashMap<String, DialogEntry>,
}

impl MessageDispatcher {
    pub fn new(submitter: Arc<dyn NoteSubmitter>) -> Self {
        Self {
            submitter,
            dialogs: DashMap::new(),
        }
    }

    /// Dispatch one message and return the reply to send back to the user
    pub async fn dispatch(&self, message: NormalizedMessage) -> DispatchResult {
        let key = dialog_key(&message);
        let text = message.text.trim();

        if text == "/start" {
            log::info!("[DIALOG] User {} started the conversation", message.user_id);
            return DispatchResult::success(
                "Welcome to the Notes Bot! Send /newnote to create a note.",
            );
        }

        if text == "/cancel" {
            return if self.dialogs.remove(&key).is_some() {
                DispatchResult::success("Note creation cancelled.")
            } else {
                DispatchResult::success("Nothing to cancel.")
            };
        }

        if text == START_COMMAND {
            // Entering the dialog always restarts it; partial fields are discarded
            self.dialogs
                .insert(key, DialogEntry::new(DialogState::AwaitingTitle));
            return DispatchResult::success("Let's create a note. What is the title?");
        }

        let Some((_, entry)) = self.dialogs.remove(&key) else {
            // No dialog in progress — plain echo handler
            return DispatchResult::success(format!("You said: {}", message.text));
        };

        match entry.state {
            DialogState::AwaitingTitle => {
                self.dialogs.insert(
                    key,
                    DialogEntry::new(DialogState::AwaitingContent {
                        title: text.to_string(),
                    }),
                );
                DispatchResult::success("Got it. What is the content?")
            }
            DialogState::AwaitingContent { title } => {
                self.dialogs.insert(
                    key,
                    DialogEntry::new(DialogState::AwaitingTags {
                        title,
                        content: text.to_string(),
                    }),
                );
                DispatchResult::success("What tags should it have? (comma-separated)")
            }
            DialogState::AwaitingTags { title, content } => {
                // The dialog ends here whatever the submission outcome
                let note = NewNote {
                    title,
                    content,
                    tags: parse_tag_list(text),
                };

                match self.submitter.submit(&note).await {
                    Ok(()) => {
                        log::info!(
                            "[DIALOG] User {} created note '{}'",
                            message.user_id,
                            note.title
                        );
                        DispatchResult::success(format!("Note '{}' saved.", note.title))
                    }
                    Err(e) => {
                        log::error!(
                            "[DIALOG] Failed to submit note for user {}: {}",
                            message.user_id,
                            e
                        );
                        DispatchResult::error("Failed to save the note. Please try again.")
                    }
                }
            }
        }
    }

    /// Drop dialogs idle longer than `max_idle`. Returns how many were removed.
    pub fn expire_stale_dialogs(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let before = self.dialogs.len();
        self.dialogs.retain(|_, entry| entry.last_activity >= cutoff);
        before - self.dialogs.len()
    }
}

/// One dialog per user per chat
fn dialog_key(message: &NormalizedMessage) -> String {
    format!(
        "{}:{}:{}",
        message.channel_type, message.chat_id, message.user_id
    )
}

/// Split a comma-separated tag list, trimming whitespace and dropping
/// empty segments.
pub fn parse_tag_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records submissions instead of calling the HTTP API
    #[derive(Default)]
    struct RecordingSubmitter {
        notes: Mutex<Vec<NewNote>>,
        fail: bool,
    }

    #[async_trait]
    impl NoteSubmitter for RecordingSubmitter {
        async fn submit(&self, note: &NewNote) -> Result<(), String> {
            if self.fail {
                return Err("connection refused".to_string());
            }
            self.notes.lock().unwrap().push(note.clone());
            Ok(())
        }
    }

    fn message(user_id: &str, text: &str) -> NormalizedMessage {
        NormalizedMessage {
            channel_type: "telegram".to_string(),
            chat_id: user_id.to_string(),
            user_id: user_id.to_string(),
            user_name: user_id.to_string(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_round_trip_creates_one_note() {
        let submitter = Arc::new(RecordingSubmitter::default());
        let dispatcher = MessageDispatcher::new(submitter.clone());

        dispatcher.dispatch(message("alice", "/newnote")).await;
        dispatcher.dispatch(message("alice", "T")).await;
        dispatcher.dispatch(message("alice", "C")).await;
        let result = dispatcher.dispatch(message("alice", "x,y")).await;

        assert!(result.success);
        let notes = submitter.notes.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "T");
        assert_eq!(notes[0].content, "C");
        assert_eq!(notes[0].tags, vec!["x", "y"]);
        assert_eq!(dispatcher.dialogs.len(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_dialogs_do_not_interfere() {
        let submitter = Arc::new(RecordingSubmitter::default());
        let dispatcher = MessageDispatcher::new(submitter.clone());

        dispatcher.dispatch(message("alice", "/newnote")).await;
        dispatcher.dispatch(message("bob", "/newnote")).await;
        dispatcher.dispatch(message("alice", "Alice title")).await;
        dispatcher.dispatch(message("bob", "Bob title")).await;
        dispatcher.dispatch(message("bob", "Bob content")).await;
        dispatcher.dispatch(message("alice", "Alice content")).await;
        dispatcher.dispatch(message("alice", "a")).await;
        dispatcher.dispatch(message("bob", "b")).await;

        let notes = submitter.notes.lock().unwrap();
        assert_eq!(notes.len(), 2);

        let alice = notes.iter().find(|n| n.title == "Alice title").unwrap();
        assert_eq!(alice.content, "Alice content");
        assert_eq!(alice.tags, vec!["a"]);

        let bob = notes.iter().find(|n| n.title == "Bob title").unwrap();
        assert_eq!(bob.content, "Bob content");
        assert_eq!(bob.tags, vec!["b"]);
    }

    #[tokio::test]
    async fn test_start_command_mid_dialog_restarts_collection() {
        let submitter = Arc::new(RecordingSubmitter::default());
        let dispatcher = MessageDispatcher::new(submitter.clone());

        dispatcher.dispatch(message("alice", "/newnote")).await;
        dispatcher.dispatch(message("alice", "Old title")).await;
        dispatcher.dispatch(message("alice", "/newnote")).await;
        dispatcher.dispatch(message("alice", "New title")).await;
        dispatcher.dispatch(message("alice", "Content")).await;
        dispatcher.dispatch(message("alice", "tag")).await;

        let notes = submitter.notes.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "New title");
    }

    #[tokio::test]
    async fn test_cancel_clears_dialog() {
        let submitter = Arc::new(RecordingSubmitter::default());
        let dispatcher = MessageDispatcher::new(submitter.clone());

        dispatcher.dispatch(message("alice", "/newnote")).await;
        let result = dispatcher.dispatch(message("alice", "/cancel")).await;
        assert_eq!(result.response, "Note creation cancelled.");
        assert_eq!(dispatcher.dialogs.len(), 0);

        // Next text is handled as plain chat again
        let result = dispatcher.dispatch(message("alice", "hello")).await;
        assert_eq!(result.response, "You said: hello");
    }

    #[tokio::test]
    async fn test_submit_failure_reports_generic_error_and_resets() {
        let submitter = Arc::new(RecordingSubmitter {
            fail: true,
            ..Default::default()
        });
        let dispatcher = MessageDispatcher::new(submitter.clone());

        dispatcher.dispatch(message("alice", "/newnote")).await;
        dispatcher.dispatch(message("alice", "T")).await;
        dispatcher.dispatch(message("alice", "C")).await;
        let result = dispatcher.dispatch(message("alice", "x")).await;

        assert!(!result.success);
        assert_eq!(result.response, "Failed to save the note. Please try again.");
        assert_eq!(dispatcher.dialogs.len(), 0);
    }

    #[tokio::test]
    async fn test_text_without_dialog_is_echoed() {
        let submitter = Arc::new(RecordingSubmitter::default());
        let dispatcher = MessageDispatcher::new(submitter);

        let result = dispatcher.dispatch(message("alice", "just chatting")).await;
        assert_eq!(result.response, "You said: just chatting");
    }

    #[tokio::test]
    async fn test_whitespace_tag_input_yields_no_tags() {
        let submitter = Arc::new(RecordingSubmitter::default());
        let dispatcher = MessageDispatcher::new(submitter.clone());

        dispatcher.dispatch(message("alice", "/newnote")).await;
        dispatcher.dispatch(message("alice", "T")).await;
        dispatcher.dispatch(message("alice", "C")).await;
        dispatcher.dispatch(message("alice", " , , ")).await;

        let notes = submitter.notes.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].tags.is_empty());
    }

    #[tokio::test]
    async fn test_expire_stale_dialogs_drops_only_old_entries() {
        let submitter = Arc::new(RecordingSubmitter::default());
        let dispatcher = MessageDispatcher::new(submitter);

        dispatcher.dispatch(message("alice", "/newnote")).await;
        dispatcher.dispatch(message("bob", "/newnote")).await;

        // Age alice's dialog past the cutoff
        let alice_key = dialog_key(&message("alice", ""));
        dispatcher
            .dialogs
            .get_mut(&alice_key)
            .unwrap()
            .last_activity = Utc::now() - Duration::minutes(45);

        let removed = dispatcher.expire_stale_dialogs(Duration::minutes(30));
        assert_eq!(removed, 1);
        assert!(!dispatcher.dialogs.contains_key(&alice_key));
        assert_eq!(dispatcher.dialogs.len(), 1);
    }

    #[test]
    fn test_parse_tag_list() {
        assert_eq!(parse_tag_list("a, b ,, c"), vec!["a", "b", "c"]);
        assert_eq!(parse_tag_list(""), Vec::<String>::new());
        assert_eq!(parse_tag_list("  "), Vec::<String>::new());
        assert_eq!(parse_tag_list("one"), vec!["one"]);
    }
}
