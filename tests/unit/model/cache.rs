use std::sync::atomic::{AtomicUsize, Ordering};

use image::RgbImage;

use super::*;
use crate::foundation::error::KissError;
use crate::model::pipeline::GenerationRequest;

struct Stub;

impl VideoModel for Stub {
    fn name(&self) -> &str {
        "stub"
    }

    fn has_lora(&self) -> bool {
        false
    }

    fn generate(&self, req: &GenerationRequest) -> KissResult<RgbImage> {
        Ok(req.image.clone())
    }
}

#[derive(Default)]
struct CountingLoader {
    loads: AtomicUsize,
    fail: bool,
}

impl ModelLoader for CountingLoader {
    fn load(&self) -> KissResult<Arc<dyn VideoModel>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(KissError::model_unavailable("no weights"));
        }
        Ok(Arc::new(Stub))
    }
}

#[test]
fn loads_once_then_reuses() {
    let cache = ModelCache::new();
    let loader = CountingLoader::default();
    assert!(!cache.is_loaded());

    let a = cache.get_or_load(&loader).unwrap();
    let b = cache.get_or_load(&loader).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    assert!(cache.is_loaded());
}

#[test]
fn invalidate_forces_reload() {
    let cache = ModelCache::new();
    let loader = CountingLoader::default();
    cache.get_or_load(&loader).unwrap();
    cache.invalidate();
    assert!(!cache.is_loaded());
    cache.get_or_load(&loader).unwrap();
    assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
}

#[test]
fn failures_are_not_cached() {
    let cache = ModelCache::new();
    let loader = CountingLoader {
        fail: true,
        ..CountingLoader::default()
    };
    assert!(matches!(
        cache.get_or_load(&loader),
        Err(KissError::ModelUnavailable(_))
    ));
    assert!(cache.get_or_load(&loader).is_err());
    assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    assert!(!cache.is_loaded());
}

#[test]
fn concurrent_callers_share_one_load() {
    let cache = Arc::new(ModelCache::new());
    let loader = Arc::new(CountingLoader::default());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let loader = Arc::clone(&loader);
            std::thread::spawn(move || cache.get_or_load(loader.as_ref()).map(|_| ()))
        })
        .collect();
    for h in handles {
        h.join().unwrap().unwrap();
    }
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
}
