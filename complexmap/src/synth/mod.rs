//! Artifact synthesis.
//!
//! A [`BindingPlan`] is validated once and then handed to two independent
//! backends: [`closures`] produces directly callable constructors and copiers,
//! [`expression`] produces analyzable projections. Both directions are built
//! in the same pass and stored together in a [`CompiledBundle`].

pub mod closures;
pub mod expression;

use std::any::Any;
use std::sync::Arc;

use log::debug;
use serde::Serialize;

use crate::accessors::AccessorCache;
use crate::annotations::AnnotationIndex;
use crate::errors::CompileFailure;
use crate::registry;
use crate::resolver::{Binding, BindingPlan, DirectionalPlan, render_path};
use crate::types::{DefaultProvider, Mappable, TypeShape};

use closures::{Constructor, Copier, CopyProgram};
use expression::Projection;

/// The six artifacts compiled for one (source, target, tag) triple.
pub struct CompiledBundle<S, T> {
    plan: BindingPlan,
    select_forward: Projection<S, T>,
    get_forward: Constructor<S, T>,
    set_forward: Copier<S, T>,
    select_backward: Projection<T, S>,
    get_backward: Constructor<T, S>,
    set_backward: Copier<T, S>,
}

impl<S, T> CompiledBundle<S, T> {
    pub fn plan(&self) -> &BindingPlan {
        &self.plan
    }

    pub fn tag(&self) -> &str {
        &self.plan.tag
    }

    /// Source to target projection.
    pub fn select_forward(&self) -> &Projection<S, T> {
        &self.select_forward
    }

    /// Builds a new target from `source`.
    pub fn get_forward(&self, source: &S) -> Option<T> {
        (self.get_forward)(source)
    }

    /// Copies bound fields of `source` into an existing `target`.
    pub fn set_forward(&self, source: &S, target: &mut T) {
        (self.set_forward)(source, target)
    }

    /// Target to source projection.
    pub fn select_backward(&self) -> &Projection<T, S> {
        &self.select_backward
    }

    pub fn get_backward(&self, target: &T) -> Option<S> {
        (self.get_backward)(target)
    }

    pub fn set_backward(&self, target: &T, source: &mut S) {
        (self.set_backward)(target, source)
    }

    /// JSON report of the binding plan.
    pub fn describe(&self) -> serde_json::Value {
        let report = PlanReport {
            source: self.plan.forward.from.key.name(),
            target: self.plan.forward.to.key.name(),
            tag: &self.plan.tag,
            forward: direction_report(&self.plan.forward),
            backward: direction_report(&self.plan.backward),
        };
        serde_json::to_value(report).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Serialize)]
struct PlanReport<'a> {
    source: &'static str,
    target: &'static str,
    tag: &'a str,
    forward: Vec<EntryReport>,
    backward: Vec<EntryReport>,
}

#[derive(Serialize)]
struct EntryReport {
    field: &'static str,
    /// `None` when the field takes its default value.
    path: Option<String>,
}

fn direction_report(plan: &DirectionalPlan) -> Vec<EntryReport> {
    plan.entries
        .iter()
        .map(|entry| EntryReport {
            field: entry.target.name,
            path: entry.binding.path().map(render_path),
        })
        .collect()
}

pub struct ArtifactSynthesizer<'a> {
    annotations: &'a AnnotationIndex,
    accessors: &'a AccessorCache,
}

impl<'a> ArtifactSynthesizer<'a> {
    pub fn new(annotations: &'a AnnotationIndex, accessors: &'a AccessorCache) -> Self {
        Self { annotations, accessors }
    }

    pub fn synthesize<S: Mappable, T: Mappable>(&self, plan: BindingPlan) -> Result<CompiledBundle<S, T>, CompileFailure> {
        self.validate(&plan)?;
        let construct_target = constructor_of(plan.forward.to)?;
        let construct_source = constructor_of(plan.forward.from)?;

        let forward = Arc::new(CopyProgram::compile(&plan.forward, self.accessors));
        let backward = Arc::new(CopyProgram::compile(&plan.backward, self.accessors));
        debug!(
            "compiled {} -> {} (tag {:?}): {} forward copies, {} backward copies",
            plan.forward.from.key,
            plan.forward.to.key,
            plan.tag,
            forward.len(),
            backward.len()
        );

        Ok(CompiledBundle {
            select_forward: Projection::build(&plan.forward, construct_target),
            get_forward: closures::constructor(Arc::clone(&forward), construct_target),
            set_forward: closures::copier(forward),
            select_backward: Projection::build(&plan.backward, construct_source),
            get_backward: closures::constructor(Arc::clone(&backward), construct_source),
            set_backward: closures::copier(backward),
            plan,
        })
    }

    /// Rejects plans that would compile into a partially working bundle.
    pub fn validate(&self, plan: &BindingPlan) -> Result<(), CompileFailure> {
        constructor_of(plan.forward.to)?;
        constructor_of(plan.forward.from)?;
        validate_direction(&plan.forward)?;
        validate_direction(&plan.backward)?;
        self.validate_annotations(plan)
    }

    /// Qualified annotations must name a field that exists on their source type,
    /// whether that type is part of this plan or only known to the registry.
    fn validate_annotations(&self, plan: &BindingPlan) -> Result<(), CompileFailure> {
        for field in &plan.forward.to.fields {
            for annotation in self.annotations.annotations_of(field).iter() {
                let Some(qualifier) = annotation.qualifier else {
                    continue;
                };
                let level = plan
                    .levels
                    .iter()
                    .copied()
                    .find(|level| level.key == qualifier)
                    .or_else(|| registry::shape_of(qualifier.id()));
                let Some(level) = level else {
                    continue;
                };
                if level.field(annotation.source_field).is_none() {
                    return Err(CompileFailure::UnknownSourceField {
                        owner: field.owner.short_name().to_string(),
                        field: field.name.to_string(),
                        source_type: qualifier.short_name().to_string(),
                        source_field: annotation.source_field.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn constructor_of(shape: &TypeShape) -> Result<DefaultProvider, CompileFailure> {
    shape.construct.ok_or_else(|| CompileFailure::NotConstructible {
        type_name: shape.key.short_name().to_string(),
    })
}

fn validate_direction(plan: &DirectionalPlan) -> Result<(), CompileFailure> {
    for entry in &plan.entries {
        match &entry.binding {
            Binding::Path(path) => {
                let Some(leaf) = path.last() else {
                    continue;
                };
                if leaf.value_type != entry.target.value_type {
                    return Err(CompileFailure::TypeMismatch {
                        target: entry.target.qualified_name(),
                        target_value: entry.target.value_type.short_name().to_string(),
                        path: format!("{}.{}", plan.from.key.short_name(), render_path(path)),
                        source_value: leaf.value_type.short_name().to_string(),
                    });
                }
            }
            Binding::UseDefault => {
                if entry.target.default_value.is_none() {
                    return Err(CompileFailure::NoDefault {
                        type_name: entry.target.owner.short_name().to_string(),
                        field: entry.target.name.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Type-erased handle to a bundle, as stored by the bundle cache.
pub(crate) type ErasedBundle = Arc<dyn Any + Send + Sync>;
