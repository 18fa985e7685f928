use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single human-readable failure summary attached to an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertError {
    pub start_time: DateTime<Utc>,
    pub message: String,
}

impl AlertError {
    pub fn new(start_time: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            start_time,
            message: message.into(),
        }
    }

    /// An error stamped with the current time.
    pub fn now(message: impl Into<String>) -> Self {
        Self::new(Utc::now(), message)
    }
}
