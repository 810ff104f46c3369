//! Transient user-visible notices

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: Instant,
}

/// Notices that disappear after a fixed time-to-live
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    ttl: Duration,
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            notices: Vec::new(),
        }
    }

    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
            raised_at: Instant::now(),
        });
    }

    /// Drop notices older than the time-to-live
    pub fn expire(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.notices
            .retain(|n| now.saturating_duration_since(n.raised_at) < ttl);
    }

    pub fn active(&self) -> &[Notice] {
        &self.notices
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.notices.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_notices_expire_after_ttl() {
        let mut board = NoticeBoard::new(Duration::from_secs(3));
        board.push(NoticeLevel::Success, "Data refreshed");

        tokio::time::advance(Duration::from_secs(1)).await;
        board.push(NoticeLevel::Error, "Failed to load tasks");
        board.expire(Instant::now());
        assert_eq!(board.active().len(), 2);

        tokio::time::advance(Duration::from_secs(2)).await;
        board.expire(Instant::now());
        assert_eq!(board.active().len(), 1);
        assert_eq!(board.latest().unwrap().level, NoticeLevel::Error);
    }
}
