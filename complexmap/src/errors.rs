use std::borrow::Cow;

use thiserror::Error;

/// Top-level error type returned by the mapper.
#[derive(Debug, Error)]
pub enum MappingError {
    /// A (source, target, tag) triple could not be compiled into a bundle.
    #[error(transparent)]
    CannotCompile(#[from] CompileError),

    /// Mapper configuration could not be parsed or holds an invalid value.
    #[error("invalid mapper configuration: {message}")]
    Config { message: Cow<'static, str> },

    /// Reading a configuration file failed.
    #[error("failed to read mapper configuration: {0}")]
    Io(#[from] std::io::Error),

    /// A cached bundle did not have the requested concrete type.
    #[error("cached bundle for {source_type} -> {target_type} has an unexpected type")]
    BundleType { source_type: String, target_type: String },
}

impl From<toml::de::Error> for MappingError {
    fn from(err: toml::de::Error) -> Self {
        MappingError::Config {
            message: err.to_string().into(),
        }
    }
}

/// Synthesis of one triple failed. Cached by the bundle cache, so the same
/// value is handed back on every later request for the triple.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot compile mapping {source_type} -> {target_type} (tag {tag:?}): {reason}")]
pub struct CompileError {
    pub source_type: String,
    pub target_type: String,
    pub tag: String,
    pub reason: CompileFailure,
}

/// Configuration problems detected while compiling a binding plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileFailure {
    /// The type has no parameterless constructor (`#[complexmap(no_default)]`).
    #[error("type `{type_name}` cannot be default-constructed")]
    NotConstructible { type_name: String },

    /// A field that falls back to its default value has no default provider.
    #[error("field `{type_name}.{field}` has no default value")]
    NoDefault { type_name: String, field: String },

    /// An annotation qualified with a source type names a field that type does not have.
    #[error("`{owner}.{field}` maps from `{source_type}.{source_field}`, which does not exist")]
    UnknownSourceField {
        owner: String,
        field: String,
        source_type: String,
        source_field: String,
    },

    /// A bound pair of fields does not share a value type.
    #[error("`{target}` ({target_value}) cannot be assigned from `{path}` ({source_value})")]
    TypeMismatch {
        target: String,
        target_value: String,
        path: String,
        source_value: String,
    },
}

pub type MappingResult<T> = Result<T, MappingError>;
