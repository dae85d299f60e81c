//! Transient status messages, confirmation dialogs and flash storage.
//!
//! Toasts survive exactly one redirect: a handler pushes them into the
//! session and the next rendered page takes them out.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::warn;

/// Session key holding pending toasts.
const TOASTS_KEY: &str = "toasts";

/// Toast color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Danger,
}

impl Severity {
    /// CSS class suffix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Danger => "danger",
        }
    }
}

/// Where a toast is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Top of the viewport.
    Top,
    /// Vertically centered.
    Middle,
    /// Bottom of the viewport.
    Bottom,
}

impl Position {
    /// CSS class suffix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Middle => "middle",
            Self::Bottom => "bottom",
        }
    }
}

/// A transient status message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    /// Text shown to the user.
    pub message: String,
    /// How long the toast stays visible.
    pub duration_ms: u32,
    /// Color.
    pub color: Severity,
    /// Placement.
    pub position: Position,
    /// Icon name.
    pub icon: String,
}

impl Toast {
    /// Short green toast confirming an operation.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            duration_ms: 1500,
            color: Severity::Success,
            position: Position::Middle,
            icon: "checkmark-circle-outline".to_string(),
        }
    }

    /// Longer red toast carrying a failure message.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            duration_ms: 3000,
            color: Severity::Danger,
            position: Position::Middle,
            icon: "alert-circle-outline".to_string(),
        }
    }
}

/// A confirmation dialog.
///
/// The confirm button posts to `action`; cancel returns to `cancel_href`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Dialog title.
    pub header: String,
    /// Question asked.
    pub message: String,
    /// Label of the confirm button.
    pub confirm_label: String,
    /// Form action of the confirm button.
    pub action: String,
    /// Link followed on cancel.
    pub cancel_href: String,
}

impl Alert {
    /// Dialog with a "Cancel" link back to `cancel_href`.
    #[must_use]
    pub fn confirm(
        header: impl Into<String>,
        message: impl Into<String>,
        confirm_label: impl Into<String>,
        action: impl Into<String>,
        cancel_href: impl Into<String>,
    ) -> Self {
        Self {
            header: header.into(),
            message: message.into(),
            confirm_label: confirm_label.into(),
            action: action.into(),
            cancel_href: cancel_href.into(),
        }
    }
}

/// Queue a toast for the next rendered page.
///
/// Session failures are logged and the toast is dropped.
pub async fn push_toast(session: &Session, toast: Toast) {
    let mut toasts = match session.get::<Vec<Toast>>(TOASTS_KEY).await {
        Ok(existing) => existing.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "Failed to read pending toasts");
            Vec::new()
        }
    };
    toasts.push(toast);

    if let Err(e) = session.insert(TOASTS_KEY, toasts).await {
        warn!(error = %e, "Failed to store toast");
    }
}

/// Take all pending toasts.
pub async fn take_toasts(session: &Session) -> Vec<Toast> {
    match session.remove::<Vec<Toast>>(TOASTS_KEY).await {
        Ok(toasts) => toasts.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "Failed to take pending toasts");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[test]
    fn test_toast_presets() {
        let ok = Toast::success("Saved");
        assert_eq!(ok.duration_ms, 1500);
        assert_eq!(ok.color, Severity::Success);
        assert_eq!(ok.icon, "checkmark-circle-outline");

        let failed = Toast::failure("Network error");
        assert_eq!(failed.duration_ms, 3000);
        assert_eq!(failed.color.as_str(), "danger");
        assert_eq!(failed.position.as_str(), "middle");
    }

    #[tokio::test]
    async fn test_toasts_are_taken_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        push_toast(&session, Toast::success("one")).await;
        push_toast(&session, Toast::failure("two")).await;

        let toasts = take_toasts(&session).await;
        let messages: Vec<_> = toasts.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, ["one", "two"]);
        assert!(take_toasts(&session).await.is_empty());
    }
}
