//! The shared commit-message field generators write into.

use std::sync::{Arc, Mutex, PoisonError};

/// A cloneable handle to one message field.
///
/// Every clone sees the same value: a generator task writes it while the
/// orchestrator polls it.
#[derive(Debug, Clone, Default)]
pub struct InputBox {
    value: Arc<Mutex<String>>,
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> String {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, value: impl Into<String>) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = value.into();
    }

    pub fn clear(&self) {
        self.set(String::new());
    }
}
