use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{error, info, warn};

/// Entries kept before the oldest is dropped
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Success,
    Error,
    Warning,
    Info,
}

/// One operator-facing notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub level: ActivityLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Bounded, newest-first history of beacon outcomes
///
/// Every recorded entry is also emitted through `tracing`.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ActivityLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn record<S: Into<String>>(&mut self, level: ActivityLevel, message: S) {
        self.push(ActivityEntry {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        });
    }

    /// Insert an entry that already carries its own timestamp
    pub fn push(&mut self, entry: ActivityEntry) {
        match entry.level {
            ActivityLevel::Success | ActivityLevel::Info => info!("{}", entry.message),
            ActivityLevel::Warning => warn!("{}", entry.message),
            ActivityLevel::Error => error!("{}", entry.message),
        }

        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Newest first
    pub fn entries(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&ActivityEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
