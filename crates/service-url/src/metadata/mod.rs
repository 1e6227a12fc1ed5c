//! Configuration metadata.
//!
//! Metadata is produced once per configuration type by the [`DescribeConfig`](macro@crate::DescribeConfig)
//! derive macro and is available as the [`DescribeConfig::DESCRIPTION`](crate::DescribeConfig::DESCRIPTION)
//! constant. It is never mutated afterwards; everything in this module is `'static` schema data.

use std::{any, fmt};

use serde::Serialize;

use crate::{codec, error::ConfigError};

#[doc(hidden)] // used in the derive macros
pub mod _private;

/// Metadata for a configuration record (i.e., a group of related fields encoded in a single service URL).
#[derive(Debug, Clone, Copy)]
pub struct ConfigMetadata {
    /// Type of this configuration.
    pub ty: RustType,
    /// Help regarding the config itself.
    pub help: &'static str,
    /// Scheme of service URLs for this configuration, if fixed.
    pub scheme: Option<&'static str>,
    /// Whether composed URLs always contain `?`, even if there are no query params.
    pub force_query: bool,
    /// Codec-visible fields in the declaration order.
    pub fields: &'static [FieldMetadata],
}

impl ConfigMetadata {
    /// Finds the field having the specified query key (either canonical or alias).
    /// If several fields match, the one declared first wins.
    pub fn field_for_key(&self, key: &str) -> Option<(usize, &'static FieldMetadata)> {
        let fields: &'static [FieldMetadata] = self.fields;
        fields
            .iter()
            .enumerate()
            .find(|(_, field)| field.has_key(key))
    }

    /// Returns the field placed into the specified structural URL slot.
    pub fn field_at(&self, part: UrlPart) -> Option<(usize, &'static FieldMetadata)> {
        let fields: &'static [FieldMetadata] = self.fields;
        fields
            .iter()
            .enumerate()
            .find(|(_, field)| field.url_part == part && part != UrlPart::Query)
    }

    /// Iterates over fields serialized as query params.
    pub fn query_fields(&self) -> impl Iterator<Item = (usize, &'static FieldMetadata)> + '_ {
        let fields: &'static [FieldMetadata] = self.fields;
        fields
            .iter()
            .enumerate()
            .filter(|(_, field)| field.url_part == UrlPart::Query)
    }

    /// Returns the number of path segments declared by the config.
    pub fn path_len(&self) -> usize {
        self.fields
            .iter()
            .filter(|field| matches!(field.url_part, UrlPart::Path(_)))
            .count()
    }

    /// Returns all canonical query keys sorted lexicographically. This is the order in which
    /// query params are serialized.
    pub fn sorted_query_keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self
            .query_fields()
            .filter_map(|(_, field)| field.canonical_key())
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Checks that all default values declared in the schema can be decoded according to their field kind.
    ///
    /// This only checks the textual shape of defaults; the typed check (which also runs importers
    /// of composite values) is [`testing::check_defaults()`](crate::testing::check_defaults).
    ///
    /// # Errors
    ///
    /// Returns a schema error pointing to the first field with an invalid default.
    pub fn check_defaults(&'static self) -> Result<(), ConfigError> {
        for field in self.fields {
            if let Some(default) = field.default_value {
                codec::decode(field.kind, default, field.separator)
                    .map_err(|err| ConfigError::invalid_default(self, field, err))?;
            }
        }
        Ok(())
    }

    /// Produces a serializable description of this config. This is intended to be consumed
    /// by documentation renderers.
    pub fn describe(&self) -> ConfigDescription {
        ConfigDescription {
            ty: self.ty.name_in_code(),
            help: self.help,
            scheme: self.scheme,
            force_query: self.force_query,
            fields: self.fields.iter().map(FieldMetadata::describe).collect(),
        }
    }
}

/// Metadata for a specific configuration field.
#[derive(Debug, Clone, Copy)]
pub struct FieldMetadata {
    /// Name of the field in Rust code.
    pub name: &'static str,
    /// Query keys for the field. The first key is canonical and is used during serialization.
    /// May be empty for fields placed into a structural URL slot.
    pub keys: &'static [&'static str],
    /// Human-readable field help parsed from the doc comment.
    pub help: &'static str,
    /// Rust type of the field.
    pub rust_type: RustType,
    /// Semantic kind of the field determining its textual encoding.
    pub kind: SemanticKind,
    /// Structural URL slot the field is placed into.
    pub url_part: UrlPart,
    /// Raw default value. Applied only if the field was not explicitly set.
    pub default_value: Option<&'static str>,
    /// Whether the field must be present in a parsed URL.
    pub required: bool,
    /// Whether the field value is secret and must not be logged.
    pub is_secret: bool,
    /// Separator for list items.
    pub separator: char,
}

impl FieldMetadata {
    /// Returns the canonical query key, if the field is accessible by key.
    pub fn canonical_key(&self) -> Option<&'static str> {
        self.keys.first().copied()
    }

    /// Returns aliases of the canonical key.
    pub fn aliases(&self) -> &'static [&'static str] {
        self.keys.get(1..).unwrap_or_default()
    }

    /// Checks whether the field is addressed by the provided key. Keys are case-sensitive.
    pub fn has_key(&self, key: &str) -> bool {
        self.keys.contains(&key)
    }

    /// Returns the enum formatter if this field is an enumeration.
    pub fn enum_formatter(&self) -> Option<&'static EnumFormatter> {
        match self.kind {
            SemanticKind::Enum(formatter) => Some(formatter),
            _ => None,
        }
    }

    fn describe(&self) -> FieldDescription {
        FieldDescription {
            name: self.name,
            keys: self.keys,
            help: self.help,
            rust_type: self.rust_type.name_in_code(),
            kind: self.kind.to_string(),
            url_part: self.url_part,
            default: self.default_value,
            required: self.required,
            separator: self.separator,
            values: self.enum_formatter().map(EnumFormatter::names),
        }
    }
}

/// Serializable description of a [`ConfigMetadata`].
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct ConfigDescription {
    /// Name of the config type.
    #[serde(rename = "type")]
    pub ty: &'static str,
    /// Help regarding the config.
    pub help: &'static str,
    /// Service URL scheme.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<&'static str>,
    /// Whether URLs always have a query.
    pub force_query: bool,
    /// Field descriptions in the declaration order.
    pub fields: Vec<FieldDescription>,
}

/// Serializable description of a [`FieldMetadata`].
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct FieldDescription {
    /// Field name in Rust code.
    pub name: &'static str,
    /// Query keys.
    pub keys: &'static [&'static str],
    /// Field help.
    pub help: &'static str,
    /// Field type as specified in code.
    pub rust_type: &'static str,
    /// Human-readable semantic kind, e.g. `uint16` or `list<text>`.
    pub kind: String,
    /// URL placement.
    pub url_part: UrlPart,
    /// Raw default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
    /// Is the field required?
    pub required: bool,
    /// Separator for list items.
    pub separator: char,
    /// Allowed values for enumerations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<&'static [&'static str]>,
}

/// Representation of a Rust type.
#[derive(Clone, Copy)]
pub struct RustType {
    id: fn() -> any::TypeId,
    name_in_code: &'static str,
}

impl fmt::Debug for RustType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name_in_code)
    }
}

impl PartialEq for RustType {
    fn eq(&self, other: &Self) -> bool {
        (self.id)() == (other.id)()
    }
}

impl RustType {
    /// Creates a new type.
    #[allow(clippy::incompatible_msrv)] // false positive; `TypeId::of` is referenced, not invoked
    pub const fn of<T: 'static>(name_in_code: &'static str) -> Self {
        Self {
            id: any::TypeId::of::<T>,
            name_in_code,
        }
    }

    /// Returns the unique ID of this type.
    pub fn id(&self) -> any::TypeId {
        (self.id)()
    }

    /// Returns the name of this type as specified in code.
    pub const fn name_in_code(&self) -> &'static str {
        self.name_in_code
    }
}

/// Structural part of a URL a field is placed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlPart {
    /// Query param. This is the default placement.
    Query,
    /// Username in the URL userinfo.
    User,
    /// Password in the URL userinfo.
    Password,
    /// Host. If the config has no [`Self::Port`] field, the port (if any) is kept together with the host.
    Host,
    /// Port.
    Port,
    /// Path segment with a 1-based index. Index 1 is the base path.
    Path(u8),
}

impl UrlPart {
    /// Parses a URL part from its textual name (e.g., `host` or `path2`). Matching is case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.to_ascii_lowercase();
        Some(match s.as_str() {
            "" | "query" => Self::Query,
            "user" => Self::User,
            "pass" | "password" => Self::Password,
            "host" => Self::Host,
            "port" => Self::Port,
            "path" => Self::Path(1),
            _ => {
                let index: u8 = s.strip_prefix("path")?.parse().ok()?;
                if index == 0 {
                    return None;
                }
                Self::Path(index)
            }
        })
    }
}

impl fmt::Display for UrlPart {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => formatter.write_str("query"),
            Self::User => formatter.write_str("user"),
            Self::Password => formatter.write_str("password"),
            Self::Host => formatter.write_str("host"),
            Self::Port => formatter.write_str("port"),
            Self::Path(idx) => write!(formatter, "path{idx}"),
        }
    }
}

/// Width and signedness of an integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntWidth {
    /// Is the integer signed?
    pub signed: bool,
    /// Bit width of the integer, up to 64.
    pub bits: u32,
}

impl IntWidth {
    /// Smallest value representable with this width.
    pub const fn min(self) -> i128 {
        if self.signed {
            -(1_i128 << (self.bits - 1))
        } else {
            0
        }
    }

    /// Largest value representable with this width.
    pub const fn max(self) -> i128 {
        if self.signed {
            (1_i128 << (self.bits - 1)) - 1
        } else {
            (1_i128 << self.bits) - 1
        }
    }
}

impl fmt::Display for IntWidth {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.signed { "int" } else { "uint" };
        write!(formatter, "{prefix}{}", self.bits)
    }
}

/// Codec-level type classification of a field.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub enum SemanticKind {
    /// Arbitrary string.
    Text,
    /// Boolean value.
    Bool,
    /// Signed or unsigned integer with the specified width.
    Int(IntWidth),
    /// Enumeration with the specified formatter.
    Enum(&'static EnumFormatter),
    /// Homogeneous list of items. `len` is set for fixed-length arrays.
    List {
        /// Kind of list items.
        item: ItemKind,
        /// Expected number of items.
        len: Option<usize>,
    },
    /// Map with string keys.
    Map {
        /// Kind of map values.
        value: ItemKind,
    },
    /// User-defined value encoded by its [`ConfigProp`](crate::value::ConfigProp) implementation.
    Composite,
}

impl fmt::Display for SemanticKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => formatter.write_str("text"),
            Self::Bool => formatter.write_str("bool"),
            Self::Int(width) => fmt::Display::fmt(width, formatter),
            Self::Enum(_) => formatter.write_str("enum"),
            Self::List { item, len: None } => write!(formatter, "list<{item}>"),
            Self::List {
                item,
                len: Some(len),
            } => write!(formatter, "list<{item}; {len}>"),
            Self::Map { value } => write!(formatter, "map<text, {value}>"),
            Self::Composite => formatter.write_str("composite"),
        }
    }
}

/// Kind of list items or map values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ItemKind {
    /// Arbitrary string.
    Text,
    /// Integer.
    Int(IntWidth),
    /// User-defined composite value.
    Composite,
    /// Kind that cannot be nested into a collection; contains the kind name.
    Unsupported(&'static str),
}

impl ItemKind {
    /// Converts the semantic kind of a collection element.
    pub const fn of(kind: SemanticKind) -> Self {
        match kind {
            SemanticKind::Text => Self::Text,
            SemanticKind::Int(width) => Self::Int(width),
            SemanticKind::Composite => Self::Composite,
            SemanticKind::Bool => Self::Unsupported("bool"),
            SemanticKind::Enum(_) => Self::Unsupported("enum"),
            SemanticKind::List { .. } => Self::Unsupported("list"),
            SemanticKind::Map { .. } => Self::Unsupported("map"),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => formatter.write_str("text"),
            Self::Int(width) => fmt::Display::fmt(width, formatter),
            Self::Composite => formatter.write_str("composite"),
            Self::Unsupported(name) => formatter.write_str(name),
        }
    }
}

/// Bidirectional mapping between enum ordinals and their names.
///
/// # Examples
///
/// ```
/// # use service_url::metadata::EnumFormatter;
/// const FORMATTER: EnumFormatter =
///     EnumFormatter::new(&["None", "Markdown", "HTML"]).with_aliases(&[("md", 1)]);
///
/// assert_eq!(FORMATTER.parse("html"), Some(2));
/// assert_eq!(FORMATTER.parse("md"), Some(1));
/// assert_eq!(FORMATTER.parse("xml"), None);
/// assert_eq!(FORMATTER.print(1), Some("Markdown"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EnumFormatter {
    names: &'static [&'static str],
    aliases: &'static [(&'static str, usize)],
    case_sensitive: bool,
}

impl EnumFormatter {
    /// Creates a formatter with the specified names; the name index is the enum ordinal.
    pub const fn new(names: &'static [&'static str]) -> Self {
        Self {
            names,
            aliases: &[],
            case_sensitive: false,
        }
    }

    /// Adds aliases mapping to ordinals. Aliases are accepted when parsing, but never printed.
    #[must_use]
    pub const fn with_aliases(mut self, aliases: &'static [(&'static str, usize)]) -> Self {
        self.aliases = aliases;
        self
    }

    /// Makes name matching case-sensitive. By default, names are matched ignoring ASCII case.
    #[must_use]
    pub const fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    /// Returns canonical names in the ordinal order.
    pub fn names(&self) -> &'static [&'static str] {
        self.names
    }

    /// Returns aliases.
    pub fn aliases(&self) -> &'static [(&'static str, usize)] {
        self.aliases
    }

    /// Returns the canonical name for the ordinal.
    pub fn print(&self, ordinal: usize) -> Option<&'static str> {
        self.names.get(ordinal).copied()
    }

    /// Parses a name or alias into an ordinal.
    pub fn parse(&self, s: &str) -> Option<usize> {
        let matches = |name: &str| {
            if self.case_sensitive {
                name == s
            } else {
                name.eq_ignore_ascii_case(s)
            }
        };

        if let Some(ordinal) = self.names.iter().position(|&name| matches(name)) {
            return Some(ordinal);
        }
        self.aliases
            .iter()
            .find_map(|&(alias, ordinal)| matches(alias).then_some(ordinal))
    }
}
