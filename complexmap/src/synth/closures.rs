//! Executable backend: constructors and copiers as boxed closures.

use std::any::Any;
use std::sync::Arc;

use crate::accessors::{AccessorCache, FieldAccessor};
use crate::resolver::{Binding, DirectionalPlan};
use crate::types::{DefaultProvider, Getter};

pub type Constructor<A, B> = Box<dyn Fn(&A) -> Option<B> + Send + Sync>;
pub type Copier<A, B> = Box<dyn Fn(&A, &mut B) + Send + Sync>;

struct Link {
    accessor: Arc<FieldAccessor>,
    enter: Getter,
}

/// Copies one resolved field from a reading instance into a writing instance.
struct FieldCopy {
    chain: Vec<Link>,
    leaf: Arc<FieldAccessor>,
    sink: Arc<FieldAccessor>,
    fallback: Option<DefaultProvider>,
}

impl FieldCopy {
    fn read(&self, from: &dyn Any) -> Option<Box<dyn Any>> {
        let mut owner = from;
        for link in &self.chain {
            owner = link.accessor.get(owner).and_then(link.enter)?;
        }
        self.leaf.read(owner)
    }

    /// An absent intermediate object writes the field's default value.
    fn apply(&self, from: &dyn Any, to: &mut dyn Any) {
        let value = self.read(from).or_else(|| self.fallback.map(|provider| provider()));
        if let Some(value) = value {
            self.sink.set(to, value);
        }
    }
}

/// Compiled field copies of one direction. `UseDefault` entries are only
/// written by constructors; copiers leave them untouched.
pub(crate) struct CopyProgram {
    copies: Vec<FieldCopy>,
    defaults: Vec<(Arc<FieldAccessor>, DefaultProvider)>,
}

impl CopyProgram {
    /// Expects a validated plan: every path ends in a field of the sink's type
    /// and every composite link carries its nested shape.
    pub(crate) fn compile(plan: &DirectionalPlan, accessors: &AccessorCache) -> Self {
        let copies = plan
            .entries
            .iter()
            .filter_map(|entry| {
                let Binding::Path(path) = &entry.binding else {
                    return None;
                };
                let (leaf, links) = path.split_last()?;
                let chain = links
                    .iter()
                    .map(|field| {
                        field.kind.nested().map(|nested| Link {
                            accessor: accessors.accessor_of(field),
                            enter: nested.enter,
                        })
                    })
                    .collect::<Option<Vec<_>>>()?;
                Some(FieldCopy {
                    chain,
                    leaf: accessors.accessor_of(leaf),
                    sink: accessors.accessor_of(entry.target),
                    fallback: entry.target.default_value,
                })
            })
            .collect();
        let defaults = plan
            .entries
            .iter()
            .filter(|entry| matches!(entry.binding, Binding::UseDefault))
            .filter_map(|entry| {
                let provider = entry.target.default_value?;
                Some((accessors.accessor_of(entry.target), provider))
            })
            .collect();
        Self { copies, defaults }
    }

    pub(crate) fn len(&self) -> usize {
        self.copies.len()
    }

    fn run(&self, from: &dyn Any, to: &mut dyn Any) {
        for copy in &self.copies {
            copy.apply(from, to);
        }
    }

    /// Fresh targets get the field type's default, whatever the owner's
    /// `Default` impl chose.
    fn reset(&self, to: &mut dyn Any) {
        for (sink, provider) in &self.defaults {
            sink.set(to, provider());
        }
    }
}

pub(crate) fn constructor<A: Any, B: Any>(program: Arc<CopyProgram>, construct: DefaultProvider) -> Constructor<A, B> {
    Box::new(move |from: &A| {
        let mut to = construct();
        program.reset(&mut *to);
        program.run(from, &mut *to);
        to.downcast::<B>().ok().map(|to| *to)
    })
}

pub(crate) fn copier<A: Any, B: Any>(program: Arc<CopyProgram>) -> Copier<A, B> {
    Box::new(move |from: &A, to: &mut B| program.run(from, to))
}
