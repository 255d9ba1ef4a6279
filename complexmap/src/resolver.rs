//! Binding resolution.
//!
//! For every writable target field the resolver runs a depth-first search
//! through the source type graph, looking for the source field named by one
//! of the target field's annotations. The result is a [`BindingPlan`]: an
//! access path per bound field or a default-value marker. The reverse plan
//! binds every writable source field to at most one target field, one level
//! deep.

use std::fmt;

use log::trace;

use crate::annotations::{AnnotationIndex, FieldAnnotation};
use crate::config::{MapperConfig, TagMismatch};
use crate::types::{FieldDescriptor, TypeKey, TypeShape};

/// Chain of fields from the root of the reading side, e.g. `[address, city]`.
pub type AccessPath = Vec<&'static FieldDescriptor>;

#[derive(Clone)]
pub enum Binding {
    Path(AccessPath),
    UseDefault,
}

impl Binding {
    pub fn path(&self) -> Option<&[&'static FieldDescriptor]> {
        match self {
            Binding::Path(path) => Some(path),
            Binding::UseDefault => None,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Binding::UseDefault)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Path(path) => f.write_str(&render_path(path)),
            Binding::UseDefault => f.write_str("<default>"),
        }
    }
}

/// Renders an access path as `a.b.c`.
pub fn render_path(path: &[&FieldDescriptor]) -> String {
    path.iter().map(|field| field.name).collect::<Vec<_>>().join(".")
}

#[derive(Debug, Clone)]
pub struct BindingEntry {
    /// Field written on the producing side.
    pub target: &'static FieldDescriptor,
    pub binding: Binding,
}

/// Plan for one direction: reads `from`, writes `to`.
#[derive(Debug, Clone)]
pub struct DirectionalPlan {
    pub from: &'static TypeShape,
    pub to: &'static TypeShape,
    pub entries: Vec<BindingEntry>,
}

impl DirectionalPlan {
    pub fn entry(&self, field: &str) -> Option<&BindingEntry> {
        self.entries.iter().find(|entry| entry.target.name == field)
    }

    pub fn bound(&self) -> impl Iterator<Item = &BindingEntry> {
        self.entries.iter().filter(|entry| !entry.binding.is_default())
    }

    pub fn defaulted(&self) -> impl Iterator<Item = &BindingEntry> {
        self.entries.iter().filter(|entry| entry.binding.is_default())
    }
}

/// Resolved mapping decisions for one (source, target, tag) triple.
#[derive(Debug, Clone)]
pub struct BindingPlan {
    pub tag: String,
    pub forward: DirectionalPlan,
    pub backward: DirectionalPlan,
    /// Source types reachable by the search, root first.
    pub levels: Vec<&'static TypeShape>,
}

enum Search {
    Bound(AccessPath),
    Excluded,
    NotFound,
}

pub struct BindingResolver<'a> {
    annotations: &'a AnnotationIndex,
    config: &'a MapperConfig,
}

impl<'a> BindingResolver<'a> {
    pub fn new(annotations: &'a AnnotationIndex, config: &'a MapperConfig) -> Self {
        Self { annotations, config }
    }

    pub fn resolve(&self, source: &'static TypeShape, target: &'static TypeShape, tag: &str) -> BindingPlan {
        let forward = DirectionalPlan {
            from: source,
            to: target,
            entries: target
                .writable_fields()
                .map(|field| BindingEntry {
                    target: field,
                    binding: self.resolve_forward(source, field, tag),
                })
                .collect(),
        };
        let backward = DirectionalPlan {
            from: target,
            to: source,
            entries: source
                .writable_fields()
                .map(|field| BindingEntry {
                    target: field,
                    binding: self.resolve_backward(source, target, field, tag),
                })
                .collect(),
        };
        BindingPlan {
            tag: tag.to_string(),
            forward,
            backward,
            levels: self.reachable_levels(source),
        }
    }

    fn resolve_forward(&self, source: &'static TypeShape, field: &'static FieldDescriptor, tag: &str) -> Binding {
        let annotations = self.annotations.annotations_of(field);
        if annotations.is_empty() {
            return Binding::UseDefault;
        }
        let mut path = Vec::new();
        let mut stack = vec![source.key];
        match self.search(source, &annotations, field, tag, &mut path, &mut stack) {
            Search::Bound(path) => Binding::Path(path),
            Search::Excluded | Search::NotFound => Binding::UseDefault,
        }
    }

    fn search(
        &self,
        level: &'static TypeShape,
        annotations: &[FieldAnnotation],
        field: &FieldDescriptor,
        tag: &str,
        path: &mut AccessPath,
        stack: &mut Vec<TypeKey>,
    ) -> Search {
        for candidate in &level.fields {
            if let Some(annotation) = forward_match(annotations, level.key, candidate) {
                if annotation.admits(tag) {
                    let mut bound = path.clone();
                    bound.push(candidate);
                    return Search::Bound(bound);
                }
                match self.config.tag_mismatch {
                    TagMismatch::Exclude => {
                        trace!(
                            "{} excluded under tag {tag:?} by {}",
                            field.qualified_name(),
                            candidate.qualified_name()
                        );
                        return Search::Excluded;
                    }
                    TagMismatch::Continue => continue,
                }
            }

            let Some(nested) = candidate.kind.nested() else {
                continue;
            };
            let nested_shape = (nested.shape)();
            if stack.contains(&nested_shape.key) {
                trace!("not revisiting {} through {}", nested_shape.key, candidate.qualified_name());
                continue;
            }
            if path.len() + 2 > self.config.max_depth {
                trace!("depth limit reached at {}", candidate.qualified_name());
                continue;
            }

            path.push(candidate);
            stack.push(nested_shape.key);
            let outcome = self.search(nested_shape, annotations, field, tag, path, stack);
            stack.pop();
            path.pop();
            match outcome {
                Search::NotFound => continue,
                found => return found,
            }
        }
        Search::NotFound
    }

    fn resolve_backward(
        &self,
        source: &'static TypeShape,
        target: &'static TypeShape,
        field: &'static FieldDescriptor,
        tag: &str,
    ) -> Binding {
        let mut specific = Vec::new();
        let mut agnostic = Vec::new();
        for candidate in &target.fields {
            let annotations = self.annotations.annotations_of(candidate);
            for annotation in annotations.iter() {
                if annotation.source_field != field.name || annotation.source_read_only {
                    continue;
                }
                if annotation.is_qualified_for(source.key) {
                    specific.push((candidate, annotation.clone()));
                } else if annotation.qualifier.is_none() {
                    agnostic.push((candidate, annotation.clone()));
                }
            }
        }

        for (candidate, annotation) in specific.into_iter().chain(agnostic) {
            if annotation.admits(tag) {
                return Binding::Path(vec![candidate]);
            }
            if self.config.tag_mismatch == TagMismatch::Exclude {
                trace!(
                    "{} excluded under tag {tag:?} by {}",
                    field.qualified_name(),
                    candidate.qualified_name()
                );
                return Binding::UseDefault;
            }
        }
        Binding::UseDefault
    }

    /// Composite types the forward search can reach from `root`, root first.
    fn reachable_levels(&self, root: &'static TypeShape) -> Vec<&'static TypeShape> {
        let mut levels = vec![root];
        let mut stack = vec![root.key];
        self.collect_levels(root, 1, &mut stack, &mut levels);
        levels
    }

    fn collect_levels(
        &self,
        level: &'static TypeShape,
        depth: usize,
        stack: &mut Vec<TypeKey>,
        levels: &mut Vec<&'static TypeShape>,
    ) {
        if depth + 1 > self.config.max_depth {
            return;
        }
        for field in &level.fields {
            let Some(nested) = field.kind.nested() else {
                continue;
            };
            let shape = (nested.shape)();
            if stack.contains(&shape.key) {
                continue;
            }
            if !levels.iter().any(|seen| seen.key == shape.key) {
                levels.push(shape);
            }
            stack.push(shape.key);
            self.collect_levels(shape, depth + 1, stack, levels);
            stack.pop();
        }
    }
}

/// Best annotation binding `candidate` (a field of `level`): qualifier-specific
/// before qualifier-agnostic; target-read-only annotations never qualify.
fn forward_match<'f>(
    annotations: &'f [FieldAnnotation],
    level: TypeKey,
    candidate: &FieldDescriptor,
) -> Option<&'f FieldAnnotation> {
    let matching = annotations
        .iter()
        .filter(|annotation| annotation.source_field == candidate.name && !annotation.target_read_only);
    let mut agnostic = None;
    for annotation in matching {
        if annotation.is_qualified_for(level) {
            return Some(annotation);
        }
        if agnostic.is_none() && annotation.qualifier.is_none() {
            agnostic = Some(annotation);
        }
    }
    agnostic
}
