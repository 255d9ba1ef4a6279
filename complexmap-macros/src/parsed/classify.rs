use super::*;

/// Type names the mapper treats as indivisible values.
const LEAF_TYPES: &[&str] = &[
    "String", "str", "bool", "char", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128",
    "usize", "f32", "f64", "Decimal", "DateTime", "NaiveDate", "NaiveDateTime", "NaiveTime", "Duration", "Uuid",
    "Vec", "VecDeque", "HashMap", "BTreeMap", "HashSet", "BTreeSet", "Option", "Box", "Rc", "Arc", "Cow",
    "PhantomData",
];

/// How a field's type takes part in the source graph search.
#[derive(Clone)]
pub(crate) enum FieldClass {
    Leaf,
    /// Struct deriving `Mappable`, declared as `T`, `Box<T>`, `Option<T>` or `Option<Box<T>>`.
    Composite { inner: Type, optional: bool, boxed: bool },
}

pub(crate) fn classify_type(ty: &Type) -> FieldClass {
    let (optional, ty) = match unwrap_generic(ty, "Option") {
        Some(inner) => (true, inner),
        None => (false, ty),
    };
    let (boxed, ty) = match unwrap_generic(ty, "Box") {
        Some(inner) => (true, inner),
        None => (false, ty),
    };

    match ty {
        Type::Path(path) if path.qself.is_none() && !is_leaf_path(path) => FieldClass::Composite {
            inner: ty.clone(),
            optional,
            boxed,
        },
        _ => FieldClass::Leaf,
    }
}

/// Replaces `Self` with the owner's name so the type can be used inside nested items.
pub(crate) fn resolve_self(ty: &Type, owner: &Ident) -> Result<Type> {
    fn replace(tokens: TokenStream2, owner: &Ident) -> TokenStream2 {
        tokens
            .into_iter()
            .map(|tree| match tree {
                proc_macro2::TokenTree::Ident(ident) if ident == "Self" => {
                    proc_macro2::TokenTree::Ident(Ident::new(&owner.to_string(), ident.span()))
                }
                proc_macro2::TokenTree::Group(group) => {
                    let mut replaced = proc_macro2::Group::new(group.delimiter(), replace(group.stream(), owner));
                    replaced.set_span(group.span());
                    proc_macro2::TokenTree::Group(replaced)
                }
                other => other,
            })
            .collect()
    }
    syn::parse2(replace(quote!(#ty), owner))
}

fn is_leaf_path(path: &TypePath) -> bool {
    last_ident_str(path).is_some_and(|name| LEAF_TYPES.contains(&name.as_str()))
}

fn unwrap_generic<'t>(ty: &'t Type, wrapper: &str) -> Option<&'t Type> {
    match ty {
        Type::Path(path) if last_ident_str(path).as_deref() == Some(wrapper) => {
            match &path.path.segments.last()?.arguments {
                syn::PathArguments::AngleBracketed(args) => args.args.first().and_then(|arg| match arg {
                    syn::GenericArgument::Type(inner) => Some(inner),
                    _ => None,
                }),
                _ => None,
            }
        }
        _ => None,
    }
}

fn last_ident_str(path: &TypePath) -> Option<String> {
    path.path.segments.last().map(|seg| seg.ident.to_string())
}
