//! User-facing progress reporting.

use std::sync::{Mutex, PoisonError};

/// Receives the messages a run shows to the user.
pub trait Notifier: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Prints progress to stdout and failures to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn info(&self, message: &str) {
        println!("  [DONE] {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("  [FAIL] {}", message);
    }
}

/// A message captured by [`MemoryNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Keeps every message in memory. Used by tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|n| match n {
                Notice::Error(m) => Some(m),
                Notice::Info(_) => None,
            })
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|n| match n {
                Notice::Info(m) => Some(m),
                Notice::Error(_) => None,
            })
            .collect()
    }

    fn push(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

impl Notifier for MemoryNotifier {
    fn info(&self, message: &str) {
        self.push(Notice::Info(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(Notice::Error(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_notifier_keeps_order_and_kind() {
        let notifier = MemoryNotifier::new();
        notifier.info("Committed a.txt");
        notifier.error("Failed to push: rejected");
        notifier.info("Committed b.txt");

        assert_eq!(
            notifier.notices(),
            vec![
                Notice::Info("Committed a.txt".to_string()),
                Notice::Error("Failed to push: rejected".to_string()),
                Notice::Info("Committed b.txt".to_string()),
            ]
        );
        assert_eq!(notifier.errors(), vec!["Failed to push: rejected"]);
        assert_eq!(notifier.infos().len(), 2);
    }
}
