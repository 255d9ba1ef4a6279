//! Shape auto-registration via the inventory crate.
//!
//! Every `#[derive(Mappable)]` submits a [`ShapeRegistration`], which gives the
//! mapper a registry keyed by type identity without any global mutable state.

use std::any::TypeId;

use crate::types::{Mappable, TypeKey, TypeShape};

/// Submitted to the inventory by the `Mappable` derive macro.
pub struct ShapeRegistration {
    pub key: fn() -> TypeKey,
    pub shape: fn() -> &'static TypeShape,
}

inventory::collect!(ShapeRegistration);

/// Get all registered shapes.
pub fn registered_shapes() -> impl Iterator<Item = &'static ShapeRegistration> {
    inventory::iter::<ShapeRegistration>()
}

/// Find the shape of a registered type by its `TypeId`.
pub fn shape_of(type_id: TypeId) -> Option<&'static TypeShape> {
    registered_shapes()
        .find(|registration| (registration.key)().id() == type_id)
        .map(|registration| (registration.shape)())
}

/// Find a registered shape by its fully qualified or short type name.
///
/// A short name shared by several registered types is ambiguous and yields `None`.
pub fn shape_by_name(name: &str) -> Option<&'static TypeShape> {
    let mut short = None;
    let mut ambiguous = false;
    for registration in registered_shapes() {
        let key = (registration.key)();
        if key.name() == name {
            return Some((registration.shape)());
        }
        if key.short_name() == name {
            ambiguous |= short.is_some_and(|seen: TypeKey| seen != key);
            short = Some(key);
        }
    }
    if ambiguous {
        return None;
    }
    short.and_then(|key| shape_of(key.id()))
}

/// Check if a type is registered.
pub fn is_registered<T: Mappable>() -> bool {
    let type_id = TypeId::of::<T>();
    registered_shapes().any(|registration| (registration.key)().id() == type_id)
}
