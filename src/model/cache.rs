use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use crate::foundation::error::KissResult;
use crate::model::pipeline::{ModelLoader, VideoModel};

/// Caller-owned cache for the loaded inference pipeline.
///
/// Loading happens at most once per cache lifetime unless [`ModelCache::invalidate`] is called.
/// Concurrent `get_or_load` calls wait on the same load instead of loading twice.
#[derive(Default)]
pub struct ModelCache {
    slot: Mutex<Option<Arc<dyn VideoModel>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached model, loading it with `loader` on a miss.
    ///
    /// Load failures are not cached; the next call retries.
    pub fn get_or_load(&self, loader: &dyn ModelLoader) -> KissResult<Arc<dyn VideoModel>> {
        let mut slot = self.lock();
        if let Some(model) = slot.as_ref() {
            info!(model = model.name(), "using cached model");
            return Ok(Arc::clone(model));
        }

        let model = loader.load()?;
        info!(model = model.name(), "model loaded");
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Drop the cached model so the next request reloads it.
    pub fn invalidate(&self) {
        if self.lock().take().is_some() {
            info!("model cache invalidated");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<dyn VideoModel>>> {
        // A panic while loading leaves the slot empty, so a poisoned lock is still consistent.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/cache.rs"]
mod tests;
