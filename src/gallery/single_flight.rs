use std::{
    collections::HashMap,
    future::Future,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

type Slot = Arc<tokio::sync::Mutex<()>>;

/// Per-cache-path mutual exclusion for thumbnail generation.
///
/// Callers racing on the same key run one at a time; the closure is expected to check
/// whether a previous holder already produced the file. Entries are dropped as soon as
/// nobody holds or waits on them.
#[derive(Default)]
pub struct SingleFlight {
    inflight: Mutex<HashMap<PathBuf, Slot>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run<F, Fut, T>(&self, key: &Path, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let slot = {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            inflight.entry(key.to_path_buf()).or_default().clone()
        };
        let release = Release {
            owner: self,
            key,
            slot,
        };

        let _held = release.slot.lock().await;
        work().await
    }

    /// Number of keys currently being worked on or waited for
    pub fn len(&self) -> usize {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Release<'a> {
    owner: &'a SingleFlight,
    key: &'a Path,
    slot: Slot,
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        let mut inflight = self
            .owner
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // The map and this guard hold the last two references: nobody else is waiting.
        if let Some(current) = inflight.get(self.key)
            && Arc::ptr_eq(current, &self.slot)
            && Arc::strong_count(&self.slot) <= 2
        {
            inflight.remove(self.key);
        }
    }
}
