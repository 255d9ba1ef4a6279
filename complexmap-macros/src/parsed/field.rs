use super::classify::{FieldClass, classify_type};
use super::*;

/// One `#[complexmap(from = ...)]` declaration.
pub(crate) struct ParsedAnnotation {
    pub source_field: LitStr,
    pub qualifier: Option<Type>,
    pub tags: String,
    pub source_read_only: bool,
    pub target_read_only: bool,
}

pub(crate) struct ParsedField {
    pub ident: Ident,
    pub name: String,
    pub ty: Type,
    pub class: FieldClass,
    pub annotations: Vec<ParsedAnnotation>,
    pub skip: bool,
    pub no_default: bool,
}

impl ParsedField {
    pub(crate) fn from_field(field: &Field) -> Result<Self> {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| Error::new(field.span(), "Mappable requires named fields"))?;
        let name = ident.unraw().to_string();

        let mut annotations = Vec::new();
        let mut skip = false;
        let mut opaque = false;
        let mut no_default = false;

        for attr in &field.attrs {
            if attr.path().is_ident("complexmap") {
                Self::parse_field_attr(attr, &mut annotations, &mut skip, &mut opaque, &mut no_default)?;
            }
        }

        let class = if opaque { FieldClass::Leaf } else { classify_type(&field.ty) };

        Ok(Self {
            ident,
            name,
            ty: field.ty.clone(),
            class,
            annotations,
            skip,
            no_default,
        })
    }

    fn parse_field_attr(
        attr: &Attribute,
        annotations: &mut Vec<ParsedAnnotation>,
        skip: &mut bool,
        opaque: &mut bool,
        no_default: &mut bool,
    ) -> Result<()> {
        let mut source_field: Option<LitStr> = None;
        let mut qualifier: Option<Type> = None;
        let mut tags: Option<String> = None;
        let mut source_read_only = false;
        let mut target_read_only = false;

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("from") {
                if source_field.is_some() {
                    return Err(meta.error("duplicate `from`"));
                }
                let lit: LitStr = meta.value()?.parse()?;
                if lit.value().trim().is_empty() {
                    return Err(Error::new(lit.span(), "`from` must name a source field"));
                }
                source_field = Some(lit);
            } else if meta.path.is_ident("source") {
                if qualifier.is_some() {
                    return Err(meta.error("duplicate `source`"));
                }
                qualifier = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("tags") {
                if tags.is_some() {
                    return Err(meta.error("duplicate `tags`"));
                }
                let lit: LitStr = meta.value()?.parse()?;
                tags = Some(normalize_tags(&lit)?);
            } else if meta.path.is_ident("source_read_only") {
                set_flag(&meta, &mut source_read_only, "source_read_only")?;
            } else if meta.path.is_ident("target_read_only") {
                set_flag(&meta, &mut target_read_only, "target_read_only")?;
            } else if meta.path.is_ident("skip") {
                set_flag(&meta, skip, "skip")?;
            } else if meta.path.is_ident("opaque") {
                set_flag(&meta, opaque, "opaque")?;
            } else if meta.path.is_ident("no_default") {
                set_flag(&meta, no_default, "no_default")?;
            } else {
                return Err(meta.error("unsupported complexmap field attribute"));
            }
            Ok(())
        })?;

        let declares_annotation = qualifier.is_some() || tags.is_some() || source_read_only || target_read_only;
        match source_field {
            Some(source_field) => annotations.push(ParsedAnnotation {
                source_field,
                qualifier,
                tags: tags.unwrap_or_default(),
                source_read_only,
                target_read_only,
            }),
            None if declares_annotation => {
                return Err(Error::new(attr.span(), "mapping annotation requires `from = \"field\"`"));
            }
            None => {}
        }
        Ok(())
    }
}

fn set_flag(meta: &syn::meta::ParseNestedMeta<'_>, flag: &mut bool, name: &str) -> Result<()> {
    if *flag {
        return Err(meta.error(format!("duplicate `{name}`")));
    }
    *flag = true;
    Ok(())
}

/// Validates each tag token and rejoins them as `a,b`.
fn normalize_tags(lit: &LitStr) -> Result<String> {
    let token = regex::Regex::new(r"^[A-Za-z0-9_.:\-]+$").map_err(|err| Error::new(lit.span(), err.to_string()))?;
    let raw = lit.value();
    let mut tags = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|tag| !tag.is_empty()) {
        if !token.is_match(tag) {
            return Err(Error::new(
                lit.span(),
                format!("invalid tag `{tag}`: tags may only contain letters, digits, `_`, `.`, `:` and `-`"),
            ));
        }
        tags.push(tag);
    }
    Ok(tags.join(","))
}
