use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;

use crate::types::{AnnotationDecl, FieldDescriptor, FieldId, TypeKey};

/// A parsed mapping annotation of a target field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAnnotation {
    pub source_field: &'static str,
    /// `None` matches any source type.
    pub qualifier: Option<TypeKey>,
    /// Empty set applies unconditionally.
    pub tags: BTreeSet<String>,
    pub source_read_only: bool,
    pub target_read_only: bool,
}

impl FieldAnnotation {
    pub fn parse(decl: &AnnotationDecl) -> Self {
        Self {
            source_field: decl.source_field,
            qualifier: decl.qualifier.map(|key| key()),
            tags: parse_tags(decl.tags),
            source_read_only: decl.source_read_only,
            target_read_only: decl.target_read_only,
        }
    }

    /// Whether this annotation applies under `tag`.
    pub fn admits(&self, tag: &str) -> bool {
        self.tags.is_empty() || self.tags.contains(tag)
    }

    pub fn is_qualified_for(&self, key: TypeKey) -> bool {
        self.qualifier == Some(key)
    }
}

/// Splits a comma-separated tag declaration, trimming and dropping empty entries.
pub fn parse_tags(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Memoized per-field annotation lookup.
#[derive(Debug, Default)]
pub struct AnnotationIndex {
    cache: DashMap<FieldId, Arc<[FieldAnnotation]>>,
}

impl AnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotations declared on `field`, in declaration order. Never fails;
    /// a field without annotations yields an empty slice.
    pub fn annotations_of(&self, field: &FieldDescriptor) -> Arc<[FieldAnnotation]> {
        if let Some(hit) = self.cache.get(&field.id()) {
            return Arc::clone(hit.value());
        }
        let entry = self
            .cache
            .entry(field.id())
            .or_insert_with(|| field.annotations.iter().map(FieldAnnotation::parse).collect());
        Arc::clone(entry.value())
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
