//! Reflected type shapes.
//!
//! A [`TypeShape`] is the static description of a struct that the
//! `#[derive(Mappable)]` macro emits: its fields in declaration order, how to
//! read, write, clone and default each of them, and the mapping annotations
//! declared on them. Everything the resolver and the synthesizers know about
//! a type comes from here.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Stable identifier of a Rust type.
///
/// Equality and hashing only consider the [`TypeId`]; the name is carried for
/// diagnostics and rendering.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, e.g. `my_app::models::Customer`.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path (generic arguments are kept).
    pub fn short_name(&self) -> &'static str {
        let head = self.name.split('<').next().unwrap_or(self.name);
        match head.rfind("::") {
            Some(pos) => &self.name[pos + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Identity of a field: the owning type plus the declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId {
    pub owner: TypeId,
    pub index: usize,
}

pub type Getter = fn(&dyn Any) -> Option<&dyn Any>;
pub type Setter = fn(&mut dyn Any, Box<dyn Any>) -> bool;
pub type Cloner = fn(&dyn Any) -> Option<Box<dyn Any>>;
pub type DefaultProvider = fn() -> Box<dyn Any>;

/// Implemented by `#[derive(Mappable)]`.
pub trait Mappable: Any {
    fn shape() -> &'static TypeShape;
}

/// Static description of a mappable struct.
pub struct TypeShape {
    pub key: TypeKey,
    pub fields: Vec<FieldDescriptor>,
    /// Parameterless constructor; `None` for `#[complexmap(no_default)]` types.
    pub construct: Option<DefaultProvider>,
}

impl TypeShape {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_id(&self, index: usize) -> Option<FieldId> {
        self.fields.get(index).map(FieldDescriptor::id)
    }

    pub fn writable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| field.writable)
    }

    pub fn is_constructible(&self) -> bool {
        self.construct.is_some()
    }
}

impl fmt::Debug for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeShape")
            .field("key", &self.key)
            .field("fields", &self.fields)
            .field("constructible", &self.construct.is_some())
            .finish()
    }
}

/// Whether the search may descend into a field's type.
#[derive(Clone, Copy)]
pub enum FieldKind {
    /// Built-in value type; never decomposed.
    Leaf,
    /// Struct type whose own fields are searched.
    Composite(NestedShape),
}

impl FieldKind {
    pub fn is_leaf(&self) -> bool {
        matches!(self, FieldKind::Leaf)
    }

    pub fn nested(&self) -> Option<&NestedShape> {
        match self {
            FieldKind::Leaf => None,
            FieldKind::Composite(nested) => Some(nested),
        }
    }
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Leaf => f.write_str("Leaf"),
            FieldKind::Composite(nested) => write!(f, "Composite({:?})", (nested.shape)().key),
        }
    }
}

/// Link from a composite field to the shape of the object it holds.
#[derive(Clone, Copy)]
pub struct NestedShape {
    pub shape: fn() -> &'static TypeShape,
    /// Turns the field value (`T` or `Option<T>`) into the nested object;
    /// `None` when the object is absent.
    pub enter: Getter,
}

/// One mapping annotation as written on a target field.
#[derive(Clone, Copy)]
pub struct AnnotationDecl {
    pub source_field: &'static str,
    pub qualifier: Option<fn() -> TypeKey>,
    /// Raw comma-separated tag list.
    pub tags: &'static str,
    pub source_read_only: bool,
    pub target_read_only: bool,
}

impl fmt::Debug for AnnotationDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationDecl")
            .field("source_field", &self.source_field)
            .field("qualifier", &self.qualifier.map(|key| key()))
            .field("tags", &self.tags)
            .field("source_read_only", &self.source_read_only)
            .field("target_read_only", &self.target_read_only)
            .finish()
    }
}

/// A reflected field of a [`TypeShape`].
pub struct FieldDescriptor {
    pub owner: TypeKey,
    pub index: usize,
    pub name: &'static str,
    pub value_type: TypeKey,
    pub kind: FieldKind,
    pub writable: bool,
    pub annotations: Vec<AnnotationDecl>,
    /// Reads the field out of an owner instance.
    pub get: Getter,
    /// Replaces the field on an owner instance; `false` on a type mismatch.
    pub set: Setter,
    /// Clones a value of the field's type.
    pub clone_value: Cloner,
    pub default_value: Option<DefaultProvider>,
}

impl FieldDescriptor {
    pub fn id(&self) -> FieldId {
        FieldId {
            owner: self.owner.id(),
            index: self.index,
        }
    }

    /// `Owner.field`, used in logs and error messages.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner.short_name(), self.name)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("kind", &self.kind)
            .field("writable", &self.writable)
            .field("annotations", &self.annotations.len())
            .finish()
    }
}
