//! Transient user-visible notifications.
//!
//! Operations never crash the session on failure. They raise a [`Notice`]
//! through a [`Notices`] handle and the view layer shows it as a toast.

use serde::Serialize;
use tokio::sync::mpsc;
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Info, title, message)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Success, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Error, title, message)
    }

    fn with_level(level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }
}

impl From<&AppError> for Notice {
    fn from(err: &AppError) -> Self {
        let message = match err {
            AppError::AuthRequired => "Please sign in to continue.".to_string(),
            AppError::AccessDenied => "You don't have access to this page.".to_string(),
            other => other.detail(),
        };
        Notice::error(err.to_string(), message)
    }
}

/// Sending half of a notice channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Notices {
    tx: mpsc::UnboundedSender<Notice>,
}

impl Notices {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// A handle nobody listens to. Errors still reach the caller as `Err`.
    pub fn detached() -> Self {
        Self::channel().0
    }

    pub fn raise(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => {
                tracing::warn!(title = %notice.title, message = %notice.message, "notice raised")
            }
            _ => tracing::debug!(title = %notice.title, message = %notice.message, "notice raised"),
        }
        if self.tx.send(notice).is_err() {
            tracing::trace!("notice dropped, no listener");
        }
    }

    pub fn raise_error(&self, err: &AppError) {
        self.raise(Notice::from(err));
    }
}
