//! Download button that expires.
//!
//! A button starts `Active`, showing the cobalt link. When its deadline passes
//! (or it is cancelled) it becomes `Expired` for good and the message it was
//! attached to is edited to show a dead "expired" button instead.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, warn};

use crate::surface::{ButtonView, ChatSurface, SentMessage};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

const ACTIVE_LABEL: &str = "download";
const EXPIRED_LABEL: &str = "expired";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Active,
    Expired,
}

pub struct DownloadButton {
    link: String,
    landing_url: String,
    state: ButtonState,
    deadline: Instant,
    cancel: Arc<Notify>,
}

impl DownloadButton {
    /// `landing_url` is where the expired button points instead of `link`.
    pub fn new(link: impl Into<String>, timeout: Duration, landing_url: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            landing_url: landing_url.into(),
            state: ButtonState::Active,
            deadline: Instant::now() + timeout,
            cancel: Arc::new(Notify::new()),
        }
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Handle that ends the countdown early. A cancel that arrives before
    /// `expire` starts waiting is not lost.
    pub fn cancel_handle(&self) -> Arc<Notify> {
        self.cancel.clone()
    }

    pub fn view(&self) -> ButtonView {
        match self.state {
            ButtonState::Active => ButtonView {
                label: ACTIVE_LABEL.to_string(),
                url: self.link.clone(),
                disabled: false,
            },
            ButtonState::Expired => ButtonView {
                label: EXPIRED_LABEL.to_string(),
                url: self.landing_url.clone(),
                disabled: true,
            },
        }
    }

    /// Wait for the deadline or a cancel, then expire and edit `message`.
    ///
    /// The edit is best-effort: if the message is gone the failure is logged
    /// and the button still ends up `Expired`.
    pub async fn expire<S>(mut self, surface: &S, message: &SentMessage) -> Self
    where
        S: ChatSurface + ?Sized,
    {
        tokio::select! {
            _ = sleep_until(self.deadline) => {}
            _ = self.cancel.notified() => {
                debug!("Download button on message {} cancelled", message.message_id);
            }
        }

        self.state = ButtonState::Expired;

        if let Err(e) = surface.edit_button(message, &self.view()).await {
            warn!(
                "Failed to expire button on message {} in chat {}: {e}",
                message.message_id, message.chat_id
            );
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::{RecordingSurface, origin};
    use std::sync::atomic::Ordering;

    const LINK: &str = "https://cdn.example/clip.mp4";
    const LANDING: &str = "https://cobalt.tools/";

    #[test]
    fn test_new_button_is_active_download_link() {
        let button = DownloadButton::new(LINK, DEFAULT_TIMEOUT, LANDING);
        assert_eq!(button.state(), ButtonState::Active);
        assert_eq!(
            button.view(),
            ButtonView {
                label: "download".to_string(),
                url: LINK.to_string(),
                disabled: false,
            }
        );
    }

    #[tokio::test]
    async fn test_expires_after_timeout_and_edits_message() {
        let surface = RecordingSurface::default();
        let sent = surface
            .reply_button(&origin(), &DownloadButton::new(LINK, DEFAULT_TIMEOUT, LANDING).view())
            .await
            .unwrap();

        let button = DownloadButton::new(LINK, Duration::from_millis(50), LANDING);
        let started = Instant::now();
        let button = button.expire(&surface, &sent).await;

        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(button.state(), ButtonState::Expired);

        let edits = surface.edits();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].0, sent);
        assert_eq!(edits[0].1.label, "expired");
        assert!(edits[0].1.disabled);
        assert_eq!(edits[0].1.url, LANDING);
        assert_ne!(edits[0].1.url, LINK);
    }

    #[tokio::test]
    async fn test_stays_active_before_deadline() {
        let surface = RecordingSurface::default();
        let sent = SentMessage { chat_id: 1, message_id: 2 };
        let button = DownloadButton::new(LINK, Duration::from_millis(200), LANDING);

        let task = tokio::spawn(async move { button.expire(&surface, &sent).await.state() });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!task.is_finished());

        assert_eq!(task.await.unwrap(), ButtonState::Expired);
    }

    #[tokio::test]
    async fn test_cancel_expires_early() {
        let surface = RecordingSurface::default();
        let sent = SentMessage { chat_id: 1, message_id: 2 };
        let button = DownloadButton::new(LINK, Duration::from_secs(3600), LANDING);

        // Cancelling before anyone waits still counts.
        button.cancel_handle().notify_one();
        let button = tokio::time::timeout(Duration::from_secs(1), button.expire(&surface, &sent))
            .await
            .expect("cancel should end the wait");

        assert_eq!(button.state(), ButtonState::Expired);
        assert_eq!(surface.edits().len(), 1);
    }

    #[tokio::test]
    async fn test_edit_failure_is_swallowed() {
        let surface = RecordingSurface::default();
        surface.fail_edits.store(true, Ordering::SeqCst);
        let sent = SentMessage { chat_id: 1, message_id: 2 };

        let button = DownloadButton::new(LINK, Duration::from_millis(10), LANDING)
            .expire(&surface, &sent)
            .await;

        assert_eq!(button.state(), ButtonState::Expired);
        assert!(surface.edits().is_empty());
        assert!(surface.replies().is_empty());
    }
}
