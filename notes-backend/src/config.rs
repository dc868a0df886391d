use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
    /// Explicit override for the API base URL the chat dispatcher posts to
    /// (e.g. "https://notes.example.com").
    pub const NOTES_API_URL: &str = "NOTES_API_URL";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/notes.db";
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub telegram_bot_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var(env_vars::PORT)
                .unwrap_or_else(|_| defaults::PORT.to_string())
                .parse()
                .expect("PORT must be a valid number"),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            telegram_bot_token: env::var(env_vars::TELEGRAM_BOT_TOKEN)
                .ok()
                .filter(|t| !t.is_empty()),
        }
    }
}

/// Base URL the chat dispatcher uses to reach the notes API.
///
/// Set NOTES_API_URL to target a remote instance.
/// Falls back to http://localhost:{PORT} (the server in this process).
pub fn api_base_url() -> String {
    if let Ok(url) = env::var(env_vars::NOTES_API_URL) {
        if !url.is_empty() {
            return url.trim_end_matches('/').to_string();
        }
    }

    let port = env::var(env_vars::PORT)
        .unwrap_or_else(|_| defaults::PORT.to_string());
    format!("http://localhost:{}", port)
}
