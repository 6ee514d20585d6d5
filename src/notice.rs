//! Transient notifications and confirmation dialogs

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A message shown to the user until it auto-dismisses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub shown_at: Instant,
    pub duration: Duration,
}

impl Notice {
    pub fn is_visible(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) < self.duration
    }
}

/// Where the views send their notices
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NoticeKind, message: &str);

    fn success(&self, message: &str) {
        self.notify(NoticeKind::Success, message);
    }

    fn error(&self, message: &str) {
        self.notify(NoticeKind::Error, message);
    }

    /// Hide whatever is showing
    fn clear(&self) {}
}

/// Keeps the notices posted so far; the latest one is the one on screen.
#[derive(Debug)]
pub struct NoticeBoard {
    duration: Duration,
    history: Mutex<VecDeque<Notice>>,
}

const HISTORY_LIMIT: usize = 32;

impl NoticeBoard {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            history: Mutex::new(VecDeque::new()),
        }
    }

    /// The notice on screen at `now`, if it has not yet dismissed itself
    pub fn visible(&self, now: Instant) -> Option<Notice> {
        let history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.back().filter(|n| n.is_visible(now)).cloned()
    }

    pub fn latest(&self) -> Option<Notice> {
        let history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.back().cloned()
    }

    pub fn history(&self) -> Vec<Notice> {
        let history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.iter().cloned().collect()
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl Notifier for NoticeBoard {
    fn notify(&self, kind: NoticeKind, message: &str) {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        if history.len() == HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(Notice {
            kind,
            message: message.to_string(),
            shown_at: Instant::now(),
            duration: self.duration,
        });
    }

    fn clear(&self) {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(last) = history.back_mut() {
            last.duration = Duration::ZERO;
        }
    }
}

/// Asks the user a yes/no question before a destructive action
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

/// Answers from a fixed script and records the questions asked
#[derive(Debug, Clone, Default)]
pub struct ScriptedConfirm {
    answers: VecDeque<bool>,
    pub asked: Vec<String>,
}

impl ScriptedConfirm {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            asked: Vec::new(),
        }
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, message: &str) -> bool {
        self.asked.push(message.to_string());
        self.answers.pop_front().unwrap_or(false)
    }
}
