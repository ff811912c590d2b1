//! The chat-side operations the command handler needs.

use async_trait::async_trait;

/// Where an invocation came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub chat_id: i64,
    pub message_id: i64,
    pub author: String,
}

/// A reply the bot has posted and may edit later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub message_id: i64,
}

/// Platform-neutral rendering of a single link button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub label: String,
    pub url: String,
    /// Advisory. Surfaces that can't disable a link button render it as
    /// usual, so a disabled view must never carry the download link.
    pub disabled: bool,
}

/// Static usage card for the `help` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpCard {
    pub title: String,
    /// HTML allowed.
    pub description: String,
    /// (usage, explanation) pairs.
    pub fields: Vec<(String, String)>,
}

#[async_trait]
pub trait ChatSurface: Send + Sync {
    /// Reply with Telegram-HTML formatted text.
    async fn reply_html(&self, to: &Origin, html: &str) -> Result<SentMessage, String>;

    /// Reply with a message carrying one link button.
    async fn reply_button(&self, to: &Origin, button: &ButtonView) -> Result<SentMessage, String>;

    /// Replace the button on a message the bot sent earlier.
    async fn edit_button(&self, message: &SentMessage, button: &ButtonView) -> Result<(), String>;

    async fn reply_help(&self, to: &Origin, help: &HelpCard) -> Result<SentMessage, String>;
}

#[cfg(test)]
pub(crate) mod recording {
    //! In-memory surface that records every call.

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Sent {
        Html(String),
        Button(ButtonView),
        Help(HelpCard),
    }

    #[derive(Default)]
    pub struct RecordingSurface {
        next_id: AtomicI64,
        pub replies: Mutex<Vec<(SentMessage, Sent)>>,
        pub edits: Mutex<Vec<(SentMessage, ButtonView)>>,
        /// Simulates the reply having been deleted before the edit.
        pub fail_edits: AtomicBool,
    }

    impl RecordingSurface {
        fn record(&self, to: &Origin, sent: Sent) -> SentMessage {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1000;
            let message = SentMessage {
                chat_id: to.chat_id,
                message_id: id,
            };
            self.replies.lock().unwrap().push((message, sent));
            message
        }

        pub fn replies(&self) -> Vec<Sent> {
            self.replies.lock().unwrap().iter().map(|(_, s)| s.clone()).collect()
        }

        pub fn edits(&self) -> Vec<(SentMessage, ButtonView)> {
            self.edits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatSurface for RecordingSurface {
        async fn reply_html(&self, to: &Origin, html: &str) -> Result<SentMessage, String> {
            Ok(self.record(to, Sent::Html(html.to_string())))
        }

        async fn reply_button(&self, to: &Origin, button: &ButtonView) -> Result<SentMessage, String> {
            Ok(self.record(to, Sent::Button(button.clone())))
        }

        async fn edit_button(&self, message: &SentMessage, button: &ButtonView) -> Result<(), String> {
            if self.fail_edits.load(Ordering::SeqCst) {
                return Err("Bad Request: message to edit not found".to_string());
            }
            self.edits.lock().unwrap().push((*message, button.clone()));
            Ok(())
        }

        async fn reply_help(&self, to: &Origin, help: &HelpCard) -> Result<SentMessage, String> {
            Ok(self.record(to, Sent::Help(help.clone())))
        }
    }

    pub fn origin() -> Origin {
        Origin {
            chat_id: -100123,
            message_id: 42,
            author: "alice".to_string(),
        }
    }
}
