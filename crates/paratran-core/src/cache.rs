//! Single-slot model cache.
//!
//! Holds at most one loaded model, keyed by [`ModelIdentity`]. A request for
//! the held identity returns it untouched; any other identity loads a new
//! model and replaces the slot.
//!
//! Replacement is atomic: the new model is loaded while the slot lock is
//! held and only swapped in after the load succeeds, so a failed load keeps
//! the previous entry. Handles are reference counted, so an inference that
//! is still running on the old model finishes on it even after a swap.
//! Concurrent callers asking for different identities serialise on the lock;
//! the slot still only ever holds one model.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::engine::{ModelHandle, ModelIdentity, ModelLoader};
use crate::error::Result;

/// A loaded model bound to the identity it was loaded for.
#[derive(Clone)]
pub struct CachedModel {
    identity: ModelIdentity,
    handle: Arc<dyn ModelHandle>,
}

impl CachedModel {
    /// Identity this model was loaded for.
    pub fn identity(&self) -> &ModelIdentity {
        &self.identity
    }

    /// The loaded model.
    pub fn handle(&self) -> &Arc<dyn ModelHandle> {
        &self.handle
    }

    /// Whether two entries share the same loaded instance.
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.handle, &other.handle)
    }
}

impl std::fmt::Debug for CachedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedModel")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Process-wide model slot, owned by the entry point and shared by reference.
pub struct ModelCache {
    loader: Arc<dyn ModelLoader>,
    slot: Mutex<Option<CachedModel>>,
}

impl ModelCache {
    /// Create an empty cache backed by `loader`.
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            slot: Mutex::new(None),
        }
    }

    /// Return the model for `identity`, loading it if the slot holds another.
    pub fn get_model(&self, identity: &ModelIdentity) -> Result<CachedModel> {
        let mut slot = self.slot.lock();

        if let Some(cached) = slot.as_ref() {
            if cached.identity == *identity {
                debug!(model = %identity, "model cache hit");
                return Ok(cached.clone());
            }
            info!(
                previous = %cached.identity,
                requested = %identity,
                "model identity changed, reloading"
            );
        }

        info!(model = %identity, "loading model");
        let handle = match self.loader.load(identity) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(model = %identity, error = %e, "model load failed, keeping previous entry");
                return Err(e);
            }
        };

        let entry = CachedModel {
            identity: identity.clone(),
            handle,
        };
        *slot = Some(entry.clone());
        info!(model = %identity, "model ready");
        Ok(entry)
    }

    /// Identity of the currently held model, if any.
    pub fn current(&self) -> Option<ModelIdentity> {
        self.slot.lock().as_ref().map(|m| m.identity.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TranscribeError;
    use crate::testutil::FakeLoader;
    use assert_matches::assert_matches;

    #[test]
    fn starts_empty() {
        let cache = ModelCache::new(Arc::new(FakeLoader::new()));
        assert!(cache.current().is_none());
    }

    #[test]
    fn same_identity_is_a_hit() {
        let loader = Arc::new(FakeLoader::new());
        let cache = ModelCache::new(loader.clone());
        let id = ModelIdentity::new("m1", None);

        let first = cache.get_model(&id).unwrap();
        let second = cache.get_model(&id).unwrap();

        assert_eq!(loader.load_count(), 1);
        assert!(first.same_instance(&second));
        assert_eq!(cache.current(), Some(id));
    }

    #[test]
    fn different_identity_triggers_exactly_one_reload() {
        let loader = Arc::new(FakeLoader::new());
        let cache = ModelCache::new(loader.clone());
        let a = ModelIdentity::new("m1", None);
        let b = ModelIdentity::new("m1", Some("/models".into()));

        let first = cache.get_model(&a).unwrap();
        let second = cache.get_model(&b).unwrap();
        let third = cache.get_model(&b).unwrap();

        assert_eq!(loader.load_count(), 2);
        assert!(!first.same_instance(&second));
        assert!(second.same_instance(&third));
        assert_eq!(cache.current(), Some(b));
    }

    #[test]
    fn switching_back_reloads() {
        let loader = Arc::new(FakeLoader::new());
        let cache = ModelCache::new(loader.clone());
        let a = ModelIdentity::new("a", None);
        let b = ModelIdentity::new("b", None);

        let _ = cache.get_model(&a).unwrap();
        let _ = cache.get_model(&b).unwrap();
        let _ = cache.get_model(&a).unwrap();

        assert_eq!(loader.load_count(), 3);
    }

    #[test]
    fn failed_load_keeps_previous_entry() {
        let loader = Arc::new(FakeLoader::new().failing_for("broken"));
        let cache = ModelCache::new(loader.clone());
        let good = ModelIdentity::new("good", None);
        let bad = ModelIdentity::new("broken", None);

        let held = cache.get_model(&good).unwrap();
        assert_matches!(cache.get_model(&bad), Err(TranscribeError::ModelLoad(_)));
        assert_eq!(cache.current(), Some(good.clone()));

        // Still a hit afterwards, no reload.
        let again = cache.get_model(&good).unwrap();
        assert!(held.same_instance(&again));
        assert_eq!(loader.load_count(), 2);
    }

    #[test]
    fn failed_first_load_leaves_cache_empty() {
        let cache = ModelCache::new(Arc::new(FakeLoader::new().failing_for("broken")));
        assert!(cache.get_model(&ModelIdentity::new("broken", None)).is_err());
        assert!(cache.current().is_none());
    }

    #[test]
    fn concurrent_same_identity_loads_once() {
        let loader = Arc::new(FakeLoader::new());
        let cache = Arc::new(ModelCache::new(loader.clone()));
        let id = ModelIdentity::new("shared", None);

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let id = id.clone();
                std::thread::spawn(move || cache.get_model(&id).map(|_| ()))
            })
            .collect();
        for t in threads {
            t.join().unwrap().unwrap();
        }

        assert_eq!(loader.load_count(), 1);
    }
}
