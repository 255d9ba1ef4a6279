//! ComplexMap core library.
//!
//! Bidirectional record mapping driven by per-field annotations. A pair of
//! `#[derive(Mappable)]` structs is compiled on first use into a bundle of six
//! artifacts (a projection, a constructor and a copier in each direction),
//! which is cached for the rest of the process.
//!
//! ```ignore
//! use complexmap::{Mappable, Mapper};
//!
//! #[derive(Default, Clone, Mappable)]
//! struct Address {
//!     city: String,
//! }
//!
//! #[derive(Default, Clone, Mappable)]
//! struct Customer {
//!     name: String,
//!     address: Option<Address>,
//! }
//!
//! #[derive(Default, Clone, Mappable)]
//! struct CustomerRow {
//!     #[complexmap(from = "name")]
//!     name: String,
//!     #[complexmap(from = "city", tags = "detail")]
//!     city: String,
//! }
//!
//! let mapper = Mapper::global();
//! let row: Option<CustomerRow> = mapper.materialize(&customer, "detail")?;
//! ```

extern crate self as complexmap;

pub mod accessors;
pub mod annotations;
pub mod bundle;
pub mod config;
pub mod errors;
pub mod facade;
pub mod registry;
pub mod resolver;
pub mod synth;
pub mod types;

pub use accessors::{AccessorCache, FieldAccessor};
pub use annotations::{AnnotationIndex, FieldAnnotation};
pub use bundle::{BundleCache, BundleKey};
pub use config::{MapperConfig, TagMismatch};
pub use errors::*;
pub use facade::{CacheStats, DataRange, Mapper, Projected, SourceMapper};
pub use registry::{ShapeRegistration, is_registered, registered_shapes, shape_by_name, shape_of};
pub use resolver::{Binding, BindingEntry, BindingPlan, BindingResolver, DirectionalPlan};
pub use synth::expression::{Expr, MemberBinding, Projection};
pub use synth::{ArtifactSynthesizer, CompiledBundle};
pub use types::{
    AnnotationDecl, FieldDescriptor, FieldId, FieldKind, Mappable, NestedShape, TypeKey, TypeShape,
};

pub use complexmap_macros::Mappable;

// Re-export inventory for auto-registration in the derive macro
pub use inventory;
