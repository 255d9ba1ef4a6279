//! Projection backend: an analyzable expression tree built from a plan.
//!
//! A [`Projection`] is the lambda `|x: S| T { a: x.b.c, d: <default> }`. It only
//! holds field descriptors and default providers, so it can be inspected and
//! translated by a query engine (see [`Projection::select_list`]) or evaluated
//! in-process with [`Projection::evaluate`].

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use crate::resolver::{Binding, DirectionalPlan};
use crate::types::{DefaultProvider, FieldDescriptor, FieldKind, TypeKey, TypeShape};

#[derive(Clone)]
pub enum Expr {
    /// The lambda parameter.
    Param(TypeKey),
    /// `base.field`
    Member {
        base: Box<Expr>,
        field: &'static FieldDescriptor,
    },
    /// Default value of a type.
    Default { ty: TypeKey, provider: DefaultProvider },
}

impl Expr {
    fn from_path(param: TypeKey, path: &[&'static FieldDescriptor]) -> Self {
        path.iter().fold(Expr::Param(param), |base, &field| Expr::Member {
            base: Box::new(base),
            field,
        })
    }

    /// Borrow the value this expression denotes; `None` when an intermediate object is absent.
    fn eval<'a>(&self, param: &'a dyn Any) -> Option<&'a dyn Any> {
        match self {
            Expr::Param(_) => Some(param),
            Expr::Member { base, field } => {
                let owner = base.eval_owner(param)?;
                (field.get)(owner)
            }
            Expr::Default { .. } => None,
        }
    }

    /// Like [`Expr::eval`], but enters composite members so their fields can be read.
    fn eval_owner<'a>(&self, param: &'a dyn Any) -> Option<&'a dyn Any> {
        match self {
            Expr::Param(_) => Some(param),
            Expr::Member { field, .. } => match field.kind {
                FieldKind::Composite(nested) => self.eval(param).and_then(nested.enter),
                FieldKind::Leaf => None,
            },
            Expr::Default { .. } => None,
        }
    }

    fn materialize(&self, param: &dyn Any) -> Option<Box<dyn Any>> {
        match self {
            Expr::Param(_) => None,
            Expr::Member { field, .. } => self.eval(param).and_then(field.clone_value),
            Expr::Default { provider, .. } => Some(provider()),
        }
    }

    /// Dotted member path below the parameter, if this is a member chain.
    pub fn member_path(&self) -> Option<String> {
        match self {
            Expr::Param(_) => Some(String::new()),
            Expr::Member { base, field } => {
                let prefix = base.member_path()?;
                Some(if prefix.is_empty() {
                    field.name.to_string()
                } else {
                    format!("{prefix}.{}", field.name)
                })
            }
            Expr::Default { .. } => None,
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Param(_) => f.write_str("x"),
            Expr::Member { base, field } => write!(f, "{base}.{}", field.name),
            Expr::Default { ty, .. } => write!(f, "<{ty} as Default>::default()"),
        }
    }
}

/// One `field: value` assignment of the member initializer.
#[derive(Debug, Clone)]
pub struct MemberBinding {
    pub member: &'static FieldDescriptor,
    pub value: Expr,
}

/// Side-effect-free projection from `S` to `T`.
pub struct Projection<S, T> {
    param: TypeKey,
    target: &'static TypeShape,
    bindings: Vec<MemberBinding>,
    construct: DefaultProvider,
    _marker: PhantomData<fn(&S) -> T>,
}

impl<S: Any, T: Any> Projection<S, T> {
    /// Every entry is expected to have passed plan validation: `UseDefault`
    /// members carry a default provider and `construct` builds a `T`.
    pub(crate) fn build(plan: &DirectionalPlan, construct: DefaultProvider) -> Self {
        let param = plan.from.key;
        let bindings = plan
            .entries
            .iter()
            .filter_map(|entry| {
                let value = match &entry.binding {
                    Binding::Path(path) => Expr::from_path(param, path),
                    Binding::UseDefault => Expr::Default {
                        ty: entry.target.value_type,
                        provider: entry.target.default_value?,
                    },
                };
                Some(MemberBinding {
                    member: entry.target,
                    value,
                })
            })
            .collect();
        Self {
            param,
            target: plan.to,
            bindings,
            construct,
            _marker: PhantomData,
        }
    }

    pub fn bindings(&self) -> &[MemberBinding] {
        &self.bindings
    }

    pub fn parameter(&self) -> TypeKey {
        self.param
    }

    pub fn target(&self) -> &'static TypeShape {
        self.target
    }

    /// Dotted source path assigned to `member`; `None` when it takes a default.
    pub fn source_path(&self, member: &str) -> Option<String> {
        self.bindings
            .iter()
            .find(|binding| binding.member.name == member)
            .and_then(|binding| binding.value.member_path())
    }

    /// `address.city AS city, DEFAULT AS note`, in member order.
    pub fn select_list(&self) -> String {
        self.bindings
            .iter()
            .map(|binding| match binding.value.member_path() {
                Some(path) => format!("{path} AS {}", binding.member.name),
                None => format!("DEFAULT AS {}", binding.member.name),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Evaluates the projection against one instance.
    ///
    /// Members whose path crosses an absent object receive their default value.
    pub fn evaluate(&self, source: &S) -> Option<T> {
        let mut target = (self.construct)();
        for binding in &self.bindings {
            let value = binding
                .value
                .materialize(source)
                .or_else(|| binding.member.default_value.map(|provider| provider()));
            if let Some(value) = value {
                (binding.member.set)(&mut *target, value);
            }
        }
        target.downcast::<T>().ok().map(|target| *target)
    }
}

impl<S, T> fmt::Display for Projection<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|x: {}| {} {{ ", self.param, self.target.key)?;
        for (position, binding) in self.bindings.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", binding.member.name, binding.value)?;
        }
        f.write_str(" }")
    }
}

impl<S, T> fmt::Debug for Projection<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
