//! Telegram channel — teloxide long-polling transport.
//!
//! Normalizes incoming text messages, runs them through the dispatcher,
//! and relays the reply. Contains no note logic of its own.

use std::sync::Arc;

use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::channels::dispatcher::MessageDispatcher;
use crate::channels::types::NormalizedMessage;

pub struct TelegramChannel {
    bot: Bot,
    dispatcher: Arc<MessageDispatcher>,
    cancel_token: CancellationToken,
}

impl TelegramChannel {
    pub fn new(
        token: &str,
        dispatcher: Arc<MessageDispatcher>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            bot: Bot::new(token),
            dispatcher,
            cancel_token,
        }
    }

    /// Spawn the long-polling loop. Returns immediately; the loop runs
    /// until the cancellation token fires.
    pub fn start(&self) {
        let bot = self.bot.clone();
        let message_dispatcher = self.dispatcher.clone();
        let cancel = self.cancel_token.clone();

        tokio::spawn(async move {
            let handler = Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
                let message_dispatcher = message_dispatcher.clone();
                async move {
                    let Some(text) = msg.text() else {
                        return respond(());
                    };

                    let user_id = msg
                        .from()
                        .map(|u| u.id.0.to_string())
                        .unwrap_or_else(|| msg.chat.id.0.to_string());
                    let user_name = msg
                        .from()
                        .and_then(|u| u.username.clone())
                        .unwrap_or_else(|| "unknown".to_string());

                    let normalized = NormalizedMessage {
                        channel_type: "telegram".to_string(),
                        chat_id: msg.chat.id.0.to_string(),
                        user_id,
                        user_name,
                        text: text.to_string(),
                    };

                    let result = message_dispatcher.dispatch(normalized).await;
                    if let Err(e) = bot.send_message(msg.chat.id, result.response).await {
                        log::error!(
                            "[TELEGRAM] Failed to send reply to chat {}: {}",
                            msg.chat.id,
                            e
                        );
                    }

                    respond(())
                }
            });

            let mut dispatcher = Dispatcher::builder(bot, handler)
                .enable_ctrlc_handler()
                .build();

            // Bridge process shutdown into teloxide's own shutdown token
            let shutdown_token = dispatcher.shutdown_token();
            tokio::spawn(async move {
                cancel.cancelled().await;
                let _ = shutdown_token.shutdown();
            });

            dispatcher.dispatch().await;
            log::info!("[TELEGRAM] Polling loop stopped");
        });
    }
}
