//! Public mapping surface.
//!
//! [`Mapper`] is the composition root: it owns the configuration and the
//! three caches and hands out compiled bundles. [`SourceMapper`] binds a
//! mapper to a source collection and produces lazy [`Projected`] sequences.

use std::borrow::Borrow;
use std::iter::{Skip, Take};
use std::sync::Arc;

use log::warn;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::accessors::AccessorCache;
use crate::annotations::AnnotationIndex;
use crate::bundle::BundleCache;
use crate::config::MapperConfig;
use crate::errors::MappingResult;
use crate::registry;
use crate::resolver::{BindingPlan, BindingResolver};
use crate::synth::expression::Projection;
use crate::synth::{ArtifactSynthesizer, CompiledBundle};
use crate::types::Mappable;

/// Snapshot of cache sizes and synthesis counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub annotations: usize,
    pub accessors: usize,
    pub accessor_syntheses: usize,
    pub bundles: usize,
    pub bundle_syntheses: usize,
}

static GLOBAL: OnceCell<Mapper> = OnceCell::new();

pub struct Mapper {
    config: MapperConfig,
    annotations: AnnotationIndex,
    accessors: AccessorCache,
    bundles: BundleCache,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new(MapperConfig::default())
    }
}

impl Mapper {
    pub fn new(config: MapperConfig) -> Self {
        Self {
            accessors: AccessorCache::new(config.cache_accessors),
            annotations: AnnotationIndex::new(),
            bundles: BundleCache::new(),
            config,
        }
    }

    /// Process-wide mapper configured from the environment on first use.
    ///
    /// Fails while the `COMPLEXMAP_*` environment holds an invalid value;
    /// nothing is initialized in that case.
    pub fn try_global() -> MappingResult<&'static Mapper> {
        GLOBAL.get_or_try_init(|| MapperConfig::from_env().map(Mapper::new))
    }

    /// Same instance as [`Mapper::try_global`]. An invalid environment is
    /// logged and the default configuration is used instead.
    pub fn global() -> &'static Mapper {
        GLOBAL.get_or_init(|| {
            let config = MapperConfig::from_env().unwrap_or_else(|err| {
                warn!("ignoring mapper environment: {err}");
                MapperConfig::default()
            });
            Mapper::new(config)
        })
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Resolves the binding plan for `(S, T, tag)` without compiling or caching it.
    pub fn plan<S: Mappable, T: Mappable>(&self, tag: &str) -> BindingPlan {
        BindingResolver::new(&self.annotations, &self.config).resolve(S::shape(), T::shape(), tag)
    }

    /// Like [`Mapper::plan`], for types looked up in the registry by name.
    pub fn plan_by_name(&self, source: &str, target: &str, tag: &str) -> Option<BindingPlan> {
        let source = registry::shape_by_name(source)?;
        let target = registry::shape_by_name(target)?;
        Some(BindingResolver::new(&self.annotations, &self.config).resolve(source, target, tag))
    }

    pub fn bundle<S: Mappable, T: Mappable>(&self, tag: &str) -> MappingResult<Arc<CompiledBundle<S, T>>> {
        self.bundles.get_or_compile(tag, || {
            let plan = self.plan::<S, T>(tag);
            ArtifactSynthesizer::new(&self.annotations, &self.accessors).synthesize(plan)
        })
    }

    /// New target built from `source`; `Ok(None)` when `source` is absent.
    pub fn materialize<'s, S: Mappable, T: Mappable>(
        &self,
        source: impl Into<Option<&'s S>>,
        tag: &str,
    ) -> MappingResult<Option<T>> {
        let Some(source) = source.into() else {
            return Ok(None);
        };
        Ok(self.bundle::<S, T>(tag)?.get_forward(source))
    }

    /// Copies `source` into `target`; an absent source leaves `target` untouched.
    pub fn populate<'s, S: Mappable, T: Mappable>(
        &self,
        source: impl Into<Option<&'s S>>,
        target: &mut T,
        tag: &str,
    ) -> MappingResult<()> {
        let Some(source) = source.into() else {
            return Ok(());
        };
        self.bundle::<S, T>(tag)?.set_forward(source, target);
        Ok(())
    }

    pub fn materialize_backward<'t, S: Mappable, T: Mappable>(
        &self,
        target: impl Into<Option<&'t T>>,
        tag: &str,
    ) -> MappingResult<Option<S>> {
        let Some(target) = target.into() else {
            return Ok(None);
        };
        Ok(self.bundle::<S, T>(tag)?.get_backward(target))
    }

    pub fn populate_backward<'t, S: Mappable, T: Mappable>(
        &self,
        target: impl Into<Option<&'t T>>,
        source: &mut S,
        tag: &str,
    ) -> MappingResult<()> {
        let Some(target) = target.into() else {
            return Ok(());
        };
        self.bundle::<S, T>(tag)?.set_backward(target, source);
        Ok(())
    }

    /// Binds this mapper to a collection of `S` (owned or borrowed items).
    pub fn over<S, I>(&self, items: I) -> SourceMapper<'_, S, I::IntoIter>
    where
        S: Mappable,
        I: IntoIterator,
        I::Item: Borrow<S>,
    {
        SourceMapper {
            mapper: self,
            items: items.into_iter(),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            annotations: self.annotations.len(),
            accessors: self.accessors.len(),
            accessor_syntheses: self.accessors.syntheses(),
            bundles: self.bundles.len(),
            bundle_syntheses: self.bundles.syntheses(),
        }
    }
}

/// A mapper bound to a sequence of `S`.
pub struct SourceMapper<'m, S, I> {
    mapper: &'m Mapper,
    items: I,
    _marker: std::marker::PhantomData<fn() -> S>,
}

impl<'m, S, I> SourceMapper<'m, S, I>
where
    S: Mappable,
    I: Iterator,
    I::Item: Borrow<S>,
{
    /// Lazily maps every item to `T` through the forward projection.
    pub fn project<T: Mappable>(self, tag: &str) -> MappingResult<Projected<S, T, I>> {
        let bundle = self.mapper.bundle::<S, T>(tag)?;
        Ok(Projected {
            side: Side::Forward(bundle),
            items: self.items,
        })
    }

    /// Treats the items as targets of a `U -> S` mapping and maps them back to `U`.
    pub fn unproject<U: Mappable>(self, tag: &str) -> MappingResult<Projected<S, U, I>> {
        let bundle = self.mapper.bundle::<U, S>(tag)?;
        Ok(Projected {
            side: Side::Backward(bundle),
            items: self.items,
        })
    }
}

enum Side<A, B> {
    Forward(Arc<CompiledBundle<A, B>>),
    Backward(Arc<CompiledBundle<B, A>>),
}

impl<A: Mappable, B: Mappable> Side<A, B> {
    fn projection(&self) -> &Projection<A, B> {
        match self {
            Side::Forward(bundle) => bundle.select_forward(),
            Side::Backward(bundle) => bundle.select_backward(),
        }
    }
}

/// Lazy sequence of projected items; nothing is evaluated until iterated.
pub struct Projected<A, B, I> {
    side: Side<A, B>,
    items: I,
}

impl<A, B, I> Projected<A, B, I>
where
    A: Mappable,
    B: Mappable,
    I: Iterator,
    I::Item: Borrow<A>,
{
    /// The projection applied to every item.
    pub fn expression(&self) -> &Projection<A, B> {
        self.side.projection()
    }

    pub fn range(self, range: impl Into<DataRange>) -> Take<Skip<Self>> {
        let range = range.into();
        self.skip(range.begin).take(range.count)
    }
}

impl<A, B, I> Iterator for Projected<A, B, I>
where
    A: Mappable,
    B: Mappable,
    I: Iterator,
    I::Item: Borrow<A>,
{
    type Item = B;

    fn next(&mut self) -> Option<B> {
        loop {
            let item = self.items.next()?;
            if let Some(mapped) = self.side.projection().evaluate(item.borrow()) {
                return Some(mapped);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.items.size_hint().1)
    }
}

/// A page of a sequence: `count` items starting at `begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DataRange {
    pub begin: usize,
    pub count: usize,
}

impl DataRange {
    pub fn new(begin: usize, count: usize) -> Self {
        Self { begin, count }
    }

    /// Exclusive end index.
    pub fn end(&self) -> usize {
        self.begin.saturating_add(self.count)
    }

    /// Range of page `page` (zero based) with `size` items per page.
    pub fn page(page: usize, size: usize) -> Self {
        Self {
            begin: page.saturating_mul(size),
            count: size,
        }
    }
}

impl From<(usize, usize)> for DataRange {
    fn from((begin, count): (usize, usize)) -> Self {
        Self { begin, count }
    }
}
