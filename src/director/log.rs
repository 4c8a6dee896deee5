//! Bounded operator log

use skyfleet_shared::now_ms;
use std::collections::VecDeque;
use tracing::info;

/// Last `capacity` Director events, shown to the operator on poll
#[derive(Debug, Clone)]
pub struct OperatorLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl OperatorLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a line, dropping the oldest when full; also traced
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("[DIRECTOR] {}", message);

        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(format!("{} {}", now_ms(), message));
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Newline-separated, oldest first
    pub fn render(&self) -> String {
        self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}
