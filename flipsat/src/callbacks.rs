//! Callbacks into the embedding application.
use std::sync::{Arc, Mutex};

/// Termination poll and message lock.
#[derive(Default)]
pub struct Callbacks {
    /// Polled every `termint` flips, returning `true` stops the search.
    pub terminate: Option<Box<dyn FnMut() -> bool + Send>>,
    /// Shared by engine instances that interleave diagnostic output.
    pub msg_lock: Option<Arc<Mutex<()>>>,
}

impl Callbacks {
    /// Whether the embedding application asks the search to stop.
    pub fn should_terminate(&mut self) -> bool {
        match &mut self.terminate {
            Some(terminate) => terminate(),
            None => false,
        }
    }

    /// Run `report` while holding the message lock.
    pub fn with_msg_lock<T>(&self, report: impl FnOnce() -> T) -> T {
        match &self.msg_lock {
            Some(lock) => {
                // A poisoned lock only means another reporter panicked.
                let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                report()
            }
            None => report(),
        }
    }
}
