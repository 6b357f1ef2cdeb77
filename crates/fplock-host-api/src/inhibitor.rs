//! Scoped inhibitor lock

use std::fmt;

/// An acquired inhibitor lock
///
/// The lock is held for as long as this value lives. The guard is whatever
/// the transport hands back (an owned file descriptor for logind); dropping
/// it is what releases the lock.
pub struct InhibitorLock {
    description: String,
    _guard: Box<dyn Send + Sync>,
}

impl InhibitorLock {
    pub fn new(description: impl Into<String>, guard: impl Send + Sync + 'static) -> Self {
        Self {
            description: description.into(),
            _guard: Box::new(guard),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for InhibitorLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InhibitorLock")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
