use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{
    Attribute, Data, DeriveInput, Error, Field, Fields, Ident, LitStr, Result, Type, TypePath, parse_macro_input,
    spanned::Spanned,
};

mod parsed;

use parsed::ParsedShape;

/// Emits the reflected shape of a struct and registers it with the mapper.
///
/// Field attributes (repeatable):
///
/// - `#[complexmap(from = "name", source = Type, tags = "a, b", source_read_only, target_read_only)]`
///   declares one mapping annotation; only `from` is required.
/// - `#[complexmap(skip)]` keeps the field out of every binding plan.
/// - `#[complexmap(opaque)]` never descends into the field's type.
/// - `#[complexmap(no_default)]` the field has no default value.
///
/// Container attribute: `#[complexmap(no_default)]` for types without `Default`.
///
/// Enums derive a shape with no fields, so structs holding them can be mapped
/// and the enum value itself is copied whole.
#[proc_macro_derive(Mappable, attributes(complexmap))]
pub fn derive_mappable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match ParsedShape::from_input(&input) {
        Ok(parsed) => parsed.emit().into(),
        Err(err) => err.to_compile_error().into(),
    }
}
