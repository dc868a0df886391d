//! Shared channel message types

/// A chat message normalized to a channel-independent shape
#[derive(Debug, Clone)]
pub struct NormalizedMessage {
    pub channel_type: String,
    pub chat_id: String,
    pub user_id: String,
    pub user_name: String,
    pub text: String,
}

/// Outcome of dispatching one message: the reply to send back
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub success: bool,
    pub response: String,
}

impl DispatchResult {
    pub fn success(response: impl Into<String>) -> Self {
        Self {
            success: true,
            response: response.into(),
        }
    }

    pub fn error(response: impl Into<String>) -> Self {
        Self {
            success: false,
            response: response.into(),
        }
    }
}
