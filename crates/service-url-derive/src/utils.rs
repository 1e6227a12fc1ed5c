//! Attribute parsing shared by the derive macros.

use proc_macro2::{Ident, Span};
use quote::{quote, quote_spanned};
use syn::{
    Attribute, Data, DeriveInput, Expr, Field, Fields, Lit, LitChar, LitStr, Path, Type,
    spanned::Spanned,
};

pub(crate) fn parse_docs(attrs: &[Attribute]) -> String {
    let doc_lines = attrs.iter().filter_map(|attr| {
        if attr.meta.path().is_ident("doc") {
            let name_value = attr.meta.require_name_value().ok()?;
            let Expr::Lit(doc_literal) = &name_value.value else {
                return None;
            };
            match &doc_literal.lit {
                Lit::Str(doc_literal) => Some(doc_literal.value()),
                _ => None,
            }
        } else {
            None
        }
    });

    let mut docs = String::new();
    for line in doc_lines {
        let line = line.trim();
        if line.is_empty() {
            if !docs.is_empty() {
                // New paragraph; convert it to a new line.
                docs.push('\n');
            }
        } else {
            if !docs.is_empty() && !docs.ends_with(|ch: char| ch.is_ascii_whitespace()) {
                docs.push(' ');
            }
            docs.push_str(line);
        }
    }
    docs
}

pub(crate) fn wrap_in_option(val: Option<proc_macro2::TokenStream>) -> proc_macro2::TokenStream {
    if let Some(val) = val {
        quote!(::core::option::Option::Some(#val))
    } else {
        quote!(::core::option::Option::None)
    }
}

fn config_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|attr| attr.path().is_ident("config"))
}

/// Mirrors `UrlPart` from the main crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UrlSlot {
    Query,
    User,
    Password,
    Host,
    Port,
    Path(u8),
}

impl UrlSlot {
    fn parse(lit: &LitStr) -> syn::Result<Self> {
        let s = lit.value().to_ascii_lowercase();
        Ok(match s.as_str() {
            "" | "query" => Self::Query,
            "user" => Self::User,
            "pass" | "password" => Self::Password,
            "host" => Self::Host,
            "port" => Self::Port,
            "path" => Self::Path(1),
            _ => {
                let index = s
                    .strip_prefix("path")
                    .and_then(|idx| idx.parse::<u8>().ok())
                    .filter(|&idx| idx > 0);
                let Some(index) = index else {
                    let message = "unsupported URL part; expected one of `query`, `user`, `pass`, `host`, `port`, \
                                   `path`, `path1`, `path2`, …";
                    return Err(syn::Error::new(lit.span(), message));
                };
                Self::Path(index)
            }
        })
    }

    pub(crate) fn to_tokens(self, cr: &proc_macro2::TokenStream) -> proc_macro2::TokenStream {
        match self {
            Self::Query => quote!(#cr::metadata::UrlPart::Query),
            Self::User => quote!(#cr::metadata::UrlPart::User),
            Self::Password => quote!(#cr::metadata::UrlPart::Password),
            Self::Host => quote!(#cr::metadata::UrlPart::Host),
            Self::Port => quote!(#cr::metadata::UrlPart::Port),
            Self::Path(idx) => quote!(#cr::metadata::UrlPart::Path(#idx)),
        }
    }
}

#[derive(Default)]
pub(crate) struct ConfigFieldAttrs {
    pub(crate) key: Option<LitStr>,
    pub(crate) aliases: Vec<LitStr>,
    pub(crate) url: Option<UrlSlot>,
    pub(crate) default: Option<LitStr>,
    pub(crate) required: bool,
    pub(crate) sep: Option<LitChar>,
    pub(crate) skip: bool,
}

impl ConfigFieldAttrs {
    fn new(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        let mut skip_span = None;
        for attr in config_attrs(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("key") {
                    this.key = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("alias") {
                    this.aliases.push(meta.value()?.parse()?);
                } else if meta.path.is_ident("url") {
                    let lit: LitStr = meta.value()?.parse()?;
                    this.url = Some(UrlSlot::parse(&lit)?);
                } else if meta.path.is_ident("default") {
                    this.default = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("required") {
                    this.required = true;
                } else if meta.path.is_ident("sep") {
                    this.sep = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("skip") {
                    this.skip = true;
                    skip_span = Some(meta.path.span());
                } else {
                    return Err(meta.error(
                        "Unsupported attribute; expected one of `key`, `alias`, `url`, `default`, `required`, \
                         `sep` or `skip`",
                    ));
                }
                Ok(())
            })?;
        }

        if let Some(skip_span) = skip_span {
            let has_other_attrs = this.key.is_some()
                || !this.aliases.is_empty()
                || this.url.is_some()
                || this.default.is_some()
                || this.required
                || this.sep.is_some();
            if has_other_attrs {
                let message = "skipped fields cannot have other `config` attributes";
                return Err(syn::Error::new(skip_span, message));
            }
        }
        Ok(this)
    }
}

pub(crate) struct ConfigField {
    pub(crate) attrs: ConfigFieldAttrs,
    pub(crate) name: Ident,
    pub(crate) ty: Type,
    pub(crate) docs: String,
}

impl ConfigField {
    fn new(raw: &Field) -> syn::Result<Self> {
        let name = raw.ident.clone().ok_or_else(|| {
            let message = "Only named fields are supported";
            syn::Error::new_spanned(raw, message)
        })?;
        let attrs = ConfigFieldAttrs::new(&raw.attrs)?;

        let is_query = attrs.url.is_none_or(|url| url == UrlSlot::Query);
        if !attrs.aliases.is_empty() && attrs.key.is_none() && !is_query {
            let message = "`alias` requires `key` for fields not placed into the query";
            return Err(syn::Error::new_spanned(&attrs.aliases[0], message));
        }

        Ok(Self {
            attrs,
            name,
            ty: raw.ty.clone(),
            docs: parse_docs(&raw.attrs),
        })
    }

    pub(crate) fn name_span(&self) -> Span {
        self.name.span()
    }

    /// Name of the field in Rust code, with the raw identifier prefix stripped.
    pub(crate) fn rust_name(&self) -> String {
        let name = self.name.to_string();
        match name.strip_prefix("r#") {
            Some(stripped) => stripped.to_owned(),
            None => name,
        }
    }

    pub(crate) fn url_slot(&self) -> UrlSlot {
        self.attrs.url.unwrap_or(UrlSlot::Query)
    }

    /// Returns all query keys of the field; the first key is canonical.
    pub(crate) fn keys(&self) -> Vec<LitStr> {
        let canonical = match &self.attrs.key {
            Some(key) => Some(key.clone()),
            None if self.url_slot() == UrlSlot::Query => {
                Some(LitStr::new(&self.rust_name(), self.name_span()))
            }
            None => None,
        };
        canonical
            .into_iter()
            .chain(self.attrs.aliases.iter().cloned())
            .collect()
    }
}

#[derive(Default)]
pub(crate) struct ConfigContainerAttrs {
    pub(crate) cr: Option<Path>,
    pub(crate) scheme: Option<LitStr>,
    pub(crate) force_query: bool,
}

impl ConfigContainerAttrs {
    fn new(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in config_attrs(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("crate") {
                    this.cr = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("scheme") {
                    let scheme: LitStr = meta.value()?.parse()?;
                    let is_valid = scheme.value().chars().enumerate().all(|(i, ch)| {
                        ch.is_ascii_alphabetic() || (i > 0 && (ch.is_ascii_digit() || "+-.".contains(ch)))
                    });
                    if scheme.value().is_empty() || !is_valid {
                        return Err(syn::Error::new(scheme.span(), "invalid URL scheme"));
                    }
                    this.scheme = Some(scheme);
                } else if meta.path.is_ident("force_query") {
                    this.force_query = true;
                } else {
                    return Err(meta.error(
                        "Unsupported attribute; expected one of `crate`, `scheme` or `force_query`",
                    ));
                }
                Ok(())
            })?;
        }
        Ok(this)
    }
}

pub(crate) struct ConfigContainer {
    pub(crate) attrs: ConfigContainerAttrs,
    pub(crate) name: Ident,
    pub(crate) help: String,
    /// All struct fields including skipped ones.
    pub(crate) fields: Vec<ConfigField>,
}

impl ConfigContainer {
    pub(crate) fn new(raw: &DeriveInput) -> syn::Result<Self> {
        let Data::Struct(data) = &raw.data else {
            let message = "#[derive(DescribeConfig)] can only be placed on structs";
            return Err(syn::Error::new_spanned(raw, message));
        };
        if !matches!(data.fields, Fields::Named(_)) {
            let message = "#[derive(DescribeConfig)] requires a struct with named fields";
            return Err(syn::Error::new_spanned(raw, message));
        }
        if raw.generics.type_params().count() != 0
            || raw.generics.const_params().count() != 0
            || raw.generics.lifetimes().count() != 0
        {
            let message = "generics are not supported";
            return Err(syn::Error::new_spanned(&raw.generics, message));
        }

        let fields = data
            .fields
            .iter()
            .map(ConfigField::new)
            .collect::<syn::Result<_>>()?;
        Ok(Self {
            attrs: ConfigContainerAttrs::new(&raw.attrs)?,
            name: raw.ident.clone(),
            help: parse_docs(&raw.attrs),
            fields,
        })
    }

    pub(crate) fn cr(&self, span: Span) -> proc_macro2::TokenStream {
        cr_tokens(self.attrs.cr.as_ref(), span)
    }

    pub(crate) fn visible_fields(&self) -> impl Iterator<Item = &ConfigField> + '_ {
        self.fields.iter().filter(|field| !field.attrs.skip)
    }
}

pub(crate) fn cr_tokens(cr: Option<&Path>, span: Span) -> proc_macro2::TokenStream {
    if let Some(cr) = cr {
        quote!(#cr)
    } else {
        quote_spanned!(span=> ::service_url)
    }
}

#[derive(Default)]
pub(crate) struct EnumVariantAttrs {
    pub(crate) rename: Option<LitStr>,
    pub(crate) aliases: Vec<LitStr>,
}

impl EnumVariantAttrs {
    fn new(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in config_attrs(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    this.rename = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("alias") {
                    this.aliases.push(meta.value()?.parse()?);
                } else {
                    return Err(meta.error(
                        "Unsupported attribute; expected one of `rename` or `alias`",
                    ));
                }
                Ok(())
            })?;
        }
        Ok(this)
    }
}

pub(crate) struct EnumVariant {
    pub(crate) attrs: EnumVariantAttrs,
    pub(crate) name: Ident,
}

impl EnumVariant {
    pub(crate) fn canonical_name(&self) -> LitStr {
        self.attrs
            .rename
            .clone()
            .unwrap_or_else(|| LitStr::new(&self.name.to_string(), self.name.span()))
    }
}

#[derive(Default)]
pub(crate) struct EnumContainerAttrs {
    pub(crate) cr: Option<Path>,
    pub(crate) case_sensitive: bool,
}

pub(crate) struct EnumContainer {
    pub(crate) attrs: EnumContainerAttrs,
    pub(crate) name: Ident,
    pub(crate) variants: Vec<EnumVariant>,
}

impl EnumContainer {
    pub(crate) fn new(raw: &DeriveInput) -> syn::Result<Self> {
        let Data::Enum(data) = &raw.data else {
            let message = "#[derive(EnumValue)] can only be placed on enums";
            return Err(syn::Error::new_spanned(raw, message));
        };
        if !raw.generics.params.is_empty() {
            let message = "generics are not supported";
            return Err(syn::Error::new_spanned(&raw.generics, message));
        }

        let mut attrs = EnumContainerAttrs::default();
        for attr in config_attrs(&raw.attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("crate") {
                    attrs.cr = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("case_sensitive") {
                    attrs.case_sensitive = true;
                } else {
                    return Err(meta.error(
                        "Unsupported attribute; expected one of `crate` or `case_sensitive`",
                    ));
                }
                Ok(())
            })?;
        }

        let variants = data.variants.iter().map(|variant| {
            if !matches!(variant.fields, Fields::Unit) {
                let message = "only unit variants are supported";
                return Err(syn::Error::new_spanned(variant, message));
            }
            Ok(EnumVariant {
                attrs: EnumVariantAttrs::new(&variant.attrs)?,
                name: variant.ident.clone(),
            })
        });
        let this = Self {
            attrs,
            name: raw.ident.clone(),
            variants: variants.collect::<syn::Result<_>>()?,
        };
        this.check_unique_names()?;
        Ok(this)
    }

    fn check_unique_names(&self) -> syn::Result<()> {
        let normalize = |name: &str| {
            if self.attrs.case_sensitive {
                name.to_owned()
            } else {
                name.to_ascii_lowercase()
            }
        };

        let all_names = self.variants.iter().flat_map(|variant| {
            let canonical = variant.canonical_name();
            [canonical].into_iter().chain(variant.attrs.aliases.iter().cloned())
        });
        let mut seen = std::collections::HashSet::new();
        for name in all_names {
            if name.value().is_empty() {
                return Err(syn::Error::new(name.span(), "variant name cannot be empty"));
            }
            if !seen.insert(normalize(&name.value())) {
                let message = format!("variant name `{}` is repeated", name.value());
                return Err(syn::Error::new(name.span(), message));
            }
        }
        Ok(())
    }

    pub(crate) fn cr(&self, span: Span) -> proc_macro2::TokenStream {
        cr_tokens(self.attrs.cr.as_ref(), span)
    }
}
