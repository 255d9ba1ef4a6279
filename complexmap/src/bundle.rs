//! Process-lifetime cache of compiled bundles.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use log::{debug, warn};
use once_cell::sync::OnceCell;

use crate::errors::{CompileError, CompileFailure, MappingError, MappingResult};
use crate::synth::{CompiledBundle, ErasedBundle};
use crate::types::{Mappable, TypeKey};

/// Cache key of one (source, target, tag) triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BundleKey {
    pub source: TypeKey,
    pub target: TypeKey,
    pub tag: String,
}

impl BundleKey {
    pub fn of<S: Mappable, T: Mappable>(tag: &str) -> Self {
        Self {
            source: TypeKey::of::<S>(),
            target: TypeKey::of::<T>(),
            tag: tag.to_string(),
        }
    }
}

type Slot = Arc<OnceCell<Result<ErasedBundle, CompileError>>>;

/// Bundles keyed by their exact triple. Each key is initialized at most once;
/// failures are cached alongside successes.
#[derive(Default)]
pub struct BundleCache {
    entries: DashMap<BundleKey, Slot>,
    syntheses: AtomicUsize,
}

impl BundleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached bundle for `(S, T, tag)`, running `compile` on first access.
    ///
    /// Concurrent first callers for the same key block until the single
    /// synthesis finishes and then share its outcome.
    pub fn get_or_compile<S, T, F>(&self, tag: &str, compile: F) -> MappingResult<Arc<CompiledBundle<S, T>>>
    where
        S: Mappable,
        T: Mappable,
        F: FnOnce() -> Result<CompiledBundle<S, T>, CompileFailure>,
    {
        let key = BundleKey::of::<S, T>(tag);
        let slot = self.slot(&key);
        let outcome = slot.get_or_init(|| {
            self.syntheses.fetch_add(1, Ordering::Relaxed);
            debug!("synthesizing bundle {} -> {} (tag {:?})", key.source, key.target, key.tag);
            match compile() {
                Ok(bundle) => Ok(Arc::new(bundle) as ErasedBundle),
                Err(reason) => {
                    let err = CompileError {
                        source_type: key.source.short_name().to_string(),
                        target_type: key.target.short_name().to_string(),
                        tag: key.tag.clone(),
                        reason,
                    };
                    warn!("{err}");
                    Err(err)
                }
            }
        });

        match outcome {
            Ok(erased) => Arc::clone(erased)
                .downcast::<CompiledBundle<S, T>>()
                .map_err(|_| MappingError::BundleType {
                    source_type: key.source.name().to_string(),
                    target_type: key.target.name().to_string(),
                }),
            Err(err) => Err(err.clone().into()),
        }
    }

    fn slot(&self, key: &BundleKey) -> Slot {
        if let Some(slot) = self.entries.get(key) {
            return Arc::clone(slot.value());
        }
        let entry = self.entries.entry(key.clone()).or_default();
        Arc::clone(entry.value())
    }

    /// Whether the triple has finished compiling, successfully or not.
    pub fn is_compiled(&self, key: &BundleKey) -> bool {
        self.entries.get(key).is_some_and(|slot| slot.get().is_some())
    }

    /// Number of syntheses run so far, failed ones included.
    pub fn syntheses(&self) -> usize {
        self.syntheses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
