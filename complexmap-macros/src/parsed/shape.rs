use super::classify::{FieldClass, resolve_self};
use super::field::{ParsedAnnotation, ParsedField};
use super::*;

pub(crate) struct ParsedShape {
    name: Ident,
    fields: Vec<ParsedField>,
    no_default: bool,
}

impl ParsedShape {
    pub(crate) fn from_input(input: &DeriveInput) -> Result<Self> {
        if !input.generics.params.is_empty() {
            return Err(Error::new(input.generics.span(), "Mappable cannot be derived for generic types"));
        }

        let mut no_default = false;
        for attr in &input.attrs {
            if attr.path().is_ident("complexmap") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("no_default") {
                        if no_default {
                            return Err(meta.error("duplicate `no_default`"));
                        }
                        no_default = true;
                        Ok(())
                    } else {
                        Err(meta.error("unsupported complexmap container attribute"))
                    }
                })?;
            }
        }

        let mut fields = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(named) => named.named.iter().map(ParsedField::from_field).collect::<Result<Vec<_>>>()?,
                _ => return Err(Error::new(input.ident.span(), "Mappable requires named fields")),
            },
            // Enums are opaque values: a shape with no fields to descend into.
            Data::Enum(_) => Vec::new(),
            Data::Union(_) => return Err(Error::new(input.ident.span(), "Mappable cannot be derived for unions")),
        };

        for field in &mut fields {
            field.ty = resolve_self(&field.ty, &input.ident)?;
            if let FieldClass::Composite { inner, .. } = &mut field.class {
                *inner = resolve_self(inner, &input.ident)?;
            }
        }

        Ok(Self {
            name: input.ident.clone(),
            fields,
            no_default,
        })
    }

    pub(crate) fn emit(&self) -> TokenStream2 {
        let name = &self.name;
        let helpers = self.fields.iter().map(|field| self.emit_helpers(field));
        let descriptors = self.fields.iter().enumerate().map(|(index, field)| self.emit_descriptor(index, field));
        let construct = if self.no_default {
            quote! { ::core::option::Option::None }
        } else {
            quote! {{
                fn __complexmap_construct() -> ::std::boxed::Box<dyn ::std::any::Any> {
                    ::std::boxed::Box::new(<#name as ::core::default::Default>::default())
                }
                ::core::option::Option::Some(__complexmap_construct as ::complexmap::types::DefaultProvider)
            }}
        };

        quote! {
            impl ::complexmap::types::Mappable for #name {
                fn shape() -> &'static ::complexmap::types::TypeShape {
                    static SHAPE: ::std::sync::OnceLock<::complexmap::types::TypeShape> = ::std::sync::OnceLock::new();
                    #(#helpers)*
                    SHAPE.get_or_init(|| ::complexmap::types::TypeShape {
                        key: ::complexmap::types::TypeKey::of::<#name>(),
                        fields: ::std::vec![#(#descriptors),*],
                        construct: #construct,
                    })
                }
            }

            ::complexmap::inventory::submit! {
                ::complexmap::registry::ShapeRegistration {
                    key: ::complexmap::types::TypeKey::of::<#name>,
                    shape: <#name as ::complexmap::types::Mappable>::shape,
                }
            }
        }
    }

    /// Accessor functions for one field, named after it.
    fn emit_helpers(&self, field: &ParsedField) -> TokenStream2 {
        let owner = &self.name;
        let ident = &field.ident;
        let ty = &field.ty;
        let get = format_ident!("__complexmap_get_{}", ident);
        let set = format_ident!("__complexmap_set_{}", ident);
        let clone = format_ident!("__complexmap_clone_{}", ident);
        let default = format_ident!("__complexmap_default_{}", ident);
        let enter = format_ident!("__complexmap_enter_{}", ident);

        let default_fn = (!field.no_default).then(|| {
            quote! {
                fn #default() -> ::std::boxed::Box<dyn ::std::any::Any> {
                    ::std::boxed::Box::new(<#ty as ::core::default::Default>::default())
                }
            }
        });

        let enter_fn = match &field.class {
            FieldClass::Leaf => None,
            FieldClass::Composite { inner, optional, boxed } => {
                let unwrap = match (*optional, *boxed) {
                    (false, false) => quote! { value.downcast_ref::<#inner>() },
                    (false, true) => quote! {
                        value.downcast_ref::<::std::boxed::Box<#inner>>().map(|value| &**value)
                    },
                    (true, false) => quote! {
                        value
                            .downcast_ref::<::core::option::Option<#inner>>()
                            .and_then(::core::option::Option::as_ref)
                    },
                    (true, true) => quote! {
                        value
                            .downcast_ref::<::core::option::Option<::std::boxed::Box<#inner>>>()
                            .and_then(::core::option::Option::as_deref)
                    },
                };
                Some(quote! {
                    fn #enter(value: &dyn ::std::any::Any) -> ::core::option::Option<&dyn ::std::any::Any> {
                        #unwrap.map(|value| value as &dyn ::std::any::Any)
                    }
                })
            }
        };

        quote! {
            fn #get(owner: &dyn ::std::any::Any) -> ::core::option::Option<&dyn ::std::any::Any> {
                owner.downcast_ref::<#owner>().map(|owner| &owner.#ident as &dyn ::std::any::Any)
            }

            fn #set(owner: &mut dyn ::std::any::Any, value: ::std::boxed::Box<dyn ::std::any::Any>) -> bool {
                match (owner.downcast_mut::<#owner>(), value.downcast::<#ty>()) {
                    (::core::option::Option::Some(owner), ::core::result::Result::Ok(value)) => {
                        owner.#ident = *value;
                        true
                    }
                    _ => false,
                }
            }

            fn #clone(value: &dyn ::std::any::Any) -> ::core::option::Option<::std::boxed::Box<dyn ::std::any::Any>> {
                value
                    .downcast_ref::<#ty>()
                    .map(|value| ::std::boxed::Box::new(::core::clone::Clone::clone(value)) as ::std::boxed::Box<dyn ::std::any::Any>)
            }

            #default_fn
            #enter_fn
        }
    }

    fn emit_descriptor(&self, index: usize, field: &ParsedField) -> TokenStream2 {
        let owner = &self.name;
        let ident = &field.ident;
        let name = &field.name;
        let ty = &field.ty;
        let writable = !field.skip;
        let get = format_ident!("__complexmap_get_{}", ident);
        let set = format_ident!("__complexmap_set_{}", ident);
        let clone = format_ident!("__complexmap_clone_{}", ident);
        let default = format_ident!("__complexmap_default_{}", ident);
        let enter = format_ident!("__complexmap_enter_{}", ident);

        let kind = match &field.class {
            FieldClass::Leaf => quote! { ::complexmap::types::FieldKind::Leaf },
            FieldClass::Composite { inner, .. } => quote! {
                ::complexmap::types::FieldKind::Composite(::complexmap::types::NestedShape {
                    shape: <#inner as ::complexmap::types::Mappable>::shape,
                    enter: #enter,
                })
            },
        };
        let default_value = if field.no_default {
            quote! { ::core::option::Option::None }
        } else {
            quote! { ::core::option::Option::Some(#default as ::complexmap::types::DefaultProvider) }
        };
        let annotations = field.annotations.iter().map(emit_annotation);

        quote! {
            ::complexmap::types::FieldDescriptor {
                owner: ::complexmap::types::TypeKey::of::<#owner>(),
                index: #index,
                name: #name,
                value_type: ::complexmap::types::TypeKey::of::<#ty>(),
                kind: #kind,
                writable: #writable,
                annotations: ::std::vec![#(#annotations),*],
                get: #get,
                set: #set,
                clone_value: #clone,
                default_value: #default_value,
            }
        }
    }
}

fn emit_annotation(annotation: &ParsedAnnotation) -> TokenStream2 {
    let source_field = &annotation.source_field;
    let tags = &annotation.tags;
    let source_read_only = annotation.source_read_only;
    let target_read_only = annotation.target_read_only;
    let qualifier = match &annotation.qualifier {
        Some(ty) => quote! {
            ::core::option::Option::Some(
                ::complexmap::types::TypeKey::of::<#ty> as fn() -> ::complexmap::types::TypeKey
            )
        },
        None => quote! { ::core::option::Option::None },
    };
    quote! {
        ::complexmap::types::AnnotationDecl {
            source_field: #source_field,
            qualifier: #qualifier,
            tags: #tags,
            source_read_only: #source_read_only,
            target_read_only: #target_read_only,
        }
    }
}
