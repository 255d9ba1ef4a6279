//! Mapper configuration.
//!
//! Loaded from TOML (text or file) with environment overrides:
//!
//! ```toml
//! cache_accessors = true
//! max_depth = 16
//! tag_mismatch = "exclude"   # or "continue"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{MappingError, MappingResult};

pub const ENV_CACHE_ACCESSORS: &str = "COMPLEXMAP_CACHE_ACCESSORS";
pub const ENV_MAX_DEPTH: &str = "COMPLEXMAP_MAX_DEPTH";
pub const ENV_TAG_MISMATCH: &str = "COMPLEXMAP_TAG_MISMATCH";

/// Default bound on the length of a resolved access path.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// What the resolver does when the best annotation for a field does not
/// admit the requested tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TagMismatch {
    /// The field falls back to its default value; no further search.
    #[default]
    Exclude,
    /// Keep searching sibling fields and deeper levels for another match.
    Continue,
}

impl TagMismatch {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "exclude" => Some(TagMismatch::Exclude),
            "continue" => Some(TagMismatch::Continue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapperConfig {
    /// Memoize field accessors. Disable only for diagnostics.
    pub cache_accessors: bool,
    /// Maximum number of fields in a resolved access path.
    pub max_depth: usize,
    pub tag_mismatch: TagMismatch,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            cache_accessors: true,
            max_depth: DEFAULT_MAX_DEPTH,
            tag_mismatch: TagMismatch::Exclude,
        }
    }
}

impl MapperConfig {
    pub fn from_toml_str(raw: &str) -> MappingResult<Self> {
        let config: MapperConfig = toml::from_str(raw)?;
        config.validate()
    }

    pub fn from_path(path: impl AsRef<Path>) -> MappingResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> MappingResult<Self> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> MappingResult<Self> {
        if let Ok(raw) = std::env::var(ENV_CACHE_ACCESSORS) {
            self.cache_accessors = parse_bool(&raw).ok_or_else(|| MappingError::Config {
                message: format!("{ENV_CACHE_ACCESSORS} must be a boolean, got {raw:?}").into(),
            })?;
        }
        if let Ok(raw) = std::env::var(ENV_MAX_DEPTH) {
            self.max_depth = raw.trim().parse().map_err(|_| MappingError::Config {
                message: format!("{ENV_MAX_DEPTH} must be a positive integer, got {raw:?}").into(),
            })?;
        }
        if let Ok(raw) = std::env::var(ENV_TAG_MISMATCH) {
            self.tag_mismatch = TagMismatch::parse(&raw).ok_or_else(|| MappingError::Config {
                message: format!("{ENV_TAG_MISMATCH} must be `exclude` or `continue`, got {raw:?}").into(),
            })?;
        }
        self.validate()
    }

    fn validate(self) -> MappingResult<Self> {
        if self.max_depth == 0 {
            return Err(MappingError::Config {
                message: "max_depth must be at least 1".into(),
            });
        }
        Ok(self)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
