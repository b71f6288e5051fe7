use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Keyed lock table serializing mutations of a single document path.
///
/// Writers and trash transitions hold the guard across their whole
/// read-decide-write sequence. An entry lives only while someone holds or
/// waits on it.
#[derive(Debug, Default)]
pub(crate) struct PathLocks {
    entries: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl PathLocks {
    pub(crate) async fn lock(self: &Arc<Self>, path: &str) -> PathGuard {
        let entry = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.entry(path.to_owned()).or_default().clone()
        };

        let guard = entry.lock_owned().await;

        PathGuard {
            locks: Arc::clone(self),
            path: path.to_owned(),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

pub(crate) struct PathGuard {
    locks: Arc<PathLocks>,
    path: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        let mut entries = self
            .locks
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Release first so the strong count reflects only the table and waiters.
        self.guard.take();

        if let Some(entry) = entries.get(&self.path) {
            if Arc::strong_count(entry) == 1 {
                entries.remove(&self.path);
            }
        }
    }
}
