//! Transient, dismissable notices shown to the user.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Most notices kept at once; older ones fall off.
const MAX_NOTICES: usize = 8;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// Rejected input.
    Warning,
    /// Failed operation.
    Error,
}

/// A single user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Identifier used to dismiss the notice.
    pub id: u32,
    /// Severity.
    pub level: NoticeLevel,
    /// Text shown to the user.
    pub message: String,
}

/// Queue of pending notices for one session.
#[derive(Debug, Clone, Default)]
pub struct NoticeBoard {
    next_id: u32,
    notices: VecDeque<Notice>,
}

impl NoticeBoard {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a notice and return its ID.
    pub fn post(&mut self, level: NoticeLevel, message: impl Into<String>) -> u32 {
        self.next_id += 1;
        let id = self.next_id;
        self.notices.push_back(Notice {
            id,
            level,
            message: message.into(),
        });
        if self.notices.len() > MAX_NOTICES {
            self.notices.pop_front();
        }
        id
    }

    /// Dismiss a notice. Returns whether it was present.
    pub fn dismiss(&mut self, id: u32) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != before
    }

    /// Pending notices, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Most recent notice.
    #[must_use]
    pub fn latest(&self) -> Option<&Notice> {
        self.notices.back()
    }

    /// Number of pending notices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notices.len()
    }

    /// Whether no notice is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    /// Drop all notices.
    pub fn clear(&mut self) {
        self.notices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_and_dismiss() {
        let mut board = NoticeBoard::new();
        let a = board.post(NoticeLevel::Warning, "No object selected");
        let b = board.post(NoticeLevel::Info, "Saved");
        assert_ne!(a, b);
        assert!(board.dismiss(a));
        assert!(!board.dismiss(a));
        assert_eq!(board.len(), 1);
        assert_eq!(board.latest().map(|n| n.id), Some(b));
    }

    #[test]
    fn oldest_notices_fall_off() {
        let mut board = NoticeBoard::new();
        for i in 0..(MAX_NOTICES + 3) {
            board.post(NoticeLevel::Info, format!("n{i}"));
        }
        assert_eq!(board.len(), MAX_NOTICES);
        assert_eq!(board.iter().next().map(|n| n.message.as_str()), Some("n3"));
    }
}
