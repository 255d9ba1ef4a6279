use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use crate::types::{Cloner, FieldDescriptor, FieldId, Getter, Setter};

/// Get/set entry points for one field.
///
/// Accessors assume a valid owner instance; callers guard absent owners.
#[derive(Debug)]
pub struct FieldAccessor {
    pub field: FieldId,
    pub name: &'static str,
    getter: Getter,
    setter: Setter,
    cloner: Cloner,
}

impl FieldAccessor {
    fn synthesize(field: &FieldDescriptor) -> Self {
        Self {
            field: field.id(),
            name: field.name,
            getter: field.get,
            setter: field.set,
            cloner: field.clone_value,
        }
    }

    /// Borrow the field out of `owner`.
    #[inline]
    pub fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        (self.getter)(owner)
    }

    /// Clone the field value out of `owner`.
    #[inline]
    pub fn read(&self, owner: &dyn Any) -> Option<Box<dyn Any>> {
        self.get(owner).and_then(self.cloner)
    }

    /// Write `value` into the field of `owner`; `false` if either has the wrong type.
    #[inline]
    pub fn set(&self, owner: &mut dyn Any, value: Box<dyn Any>) -> bool {
        (self.setter)(owner, value)
    }
}

/// Memoized field accessors keyed by field identity.
#[derive(Debug)]
pub struct AccessorCache {
    enabled: bool,
    cache: DashMap<FieldId, Arc<FieldAccessor>>,
    syntheses: AtomicUsize,
}

impl Default for AccessorCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AccessorCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            cache: DashMap::new(),
            syntheses: AtomicUsize::new(0),
        }
    }

    pub fn accessor_of(&self, field: &FieldDescriptor) -> Arc<FieldAccessor> {
        if !self.enabled {
            return Arc::new(self.synthesize(field));
        }
        if let Some(hit) = self.cache.get(&field.id()) {
            return Arc::clone(hit.value());
        }
        let entry = self
            .cache
            .entry(field.id())
            .or_insert_with(|| Arc::new(self.synthesize(field)));
        Arc::clone(entry.value())
    }

    fn synthesize(&self, field: &FieldDescriptor) -> FieldAccessor {
        self.syntheses.fetch_add(1, Ordering::Relaxed);
        FieldAccessor::synthesize(field)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of accessors synthesized so far.
    pub fn syntheses(&self) -> usize {
        self.syntheses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
