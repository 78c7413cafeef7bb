//! Feedback Channel
//!
//! Transient user-visible notices. At most one is on screen; a new notice
//! evicts the old one. Expiry is derived from the notice's creation time,
//! so nothing has to be scheduled and paused-clock tests stay exact.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// How long a notice stays fully visible
pub const NOTICE_LIFETIME: Duration = Duration::from_secs(4);

/// Length of the exit transition after the lifetime ends
pub const NOTICE_EXIT: Duration = Duration::from_millis(300);

const HISTORY_LIMIT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeKind::Info => write!(f, "info"),
            NoticeKind::Success => write!(f, "success"),
            NoticeKind::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticePhase {
    Visible,
    /// Playing the exit transition
    Leaving,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub id: u64,
    pub message: String,
    pub kind: NoticeKind,
    pub created_at: Instant,
}

impl Notice {
    /// Phase at `now`, or `None` once the notice is gone
    pub fn phase_at(&self, now: Instant) -> Option<NoticePhase> {
        let age = now.saturating_duration_since(self.created_at);
        if age < NOTICE_LIFETIME {
            Some(NoticePhase::Visible)
        } else if age < NOTICE_LIFETIME + NOTICE_EXIT {
            Some(NoticePhase::Leaving)
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
pub struct FeedbackChannel {
    current: Option<Notice>,
    history: VecDeque<Notice>,
    next_id: u64,
}

impl FeedbackChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is displayed with a new notice
    pub fn notify(&mut self, message: impl Into<String>, kind: NoticeKind) -> u64 {
        let message = message.into();
        match kind {
            NoticeKind::Error => warn!("🔔 [{}] {}", kind, message),
            _ => info!("🔔 [{}] {}", kind, message),
        }

        self.next_id += 1;
        let notice = Notice {
            id: self.next_id,
            message,
            kind,
            created_at: Instant::now(),
        };

        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(notice.clone());
        self.current = Some(notice);
        self.next_id
    }

    /// Notice on screen right now, including one in its exit transition
    pub fn current(&mut self) -> Option<&Notice> {
        let now = Instant::now();
        if self
            .current
            .as_ref()
            .is_some_and(|n| n.phase_at(now).is_none())
        {
            self.current = None;
        }
        self.current.as_ref()
    }

    /// Phase of the displayed notice
    pub fn phase(&mut self) -> Option<NoticePhase> {
        let now = Instant::now();
        self.current().and_then(|n| n.phase_at(now))
    }

    /// Every notice emitted recently, oldest first
    pub fn history(&self) -> impl Iterator<Item = &Notice> {
        self.history.iter()
    }
}
