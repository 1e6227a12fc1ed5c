//! Codec errors.

use std::{fmt, num::ParseIntError};

use crate::metadata::{ConfigMetadata, FieldMetadata, IntWidth, UrlPart};

/// Error encoding or decoding a single value, irrespective of the field it belongs to.
#[derive(Debug)]
#[non_exhaustive]
pub enum ValueError {
    /// Boolean literal is not recognized.
    InvalidBool {
        /// Offending literal.
        value: String,
    },
    /// Value cannot be parsed as an integer.
    InvalidInteger {
        /// Offending value.
        value: String,
        /// Underlying parsing error, if any.
        err: Option<ParseIntError>,
    },
    /// Integer does not fit into the declared width.
    IntegerOutOfRange {
        /// Offending value.
        value: String,
        /// Expected integer width.
        width: IntWidth,
    },
    /// Enum name is not in the enumerated set.
    UnknownVariant {
        /// Offending name.
        value: String,
        /// All canonical names of the enum.
        expected: &'static [&'static str],
    },
    /// Enum ordinal does not correspond to any variant.
    InvalidOrdinal {
        /// Offending ordinal.
        ordinal: usize,
    },
    /// Fixed-length list has an unexpected number of items.
    LengthMismatch {
        /// Expected number of items.
        expected: usize,
        /// Actual number of items.
        actual: usize,
    },
    /// Map entry is not a `key:value` pair.
    MalformedPair {
        /// Offending entry.
        pair: String,
    },
    /// List item failed to decode or encode.
    InvalidItem {
        /// Zero-based item index.
        index: usize,
        /// Item error.
        inner: Box<ValueError>,
    },
    /// Map value failed to decode or encode.
    InvalidMapValue {
        /// Map key of the failing entry.
        key: String,
        /// Value error.
        inner: Box<ValueError>,
    },
    /// Kind cannot be encoded in the requested position (e.g., a boolean inside a list).
    UnsupportedKind {
        /// Name of the unsupported kind.
        kind: &'static str,
    },
    /// Intermediate value has an unexpected shape for the target type.
    TypeMismatch {
        /// Expected value shape.
        expected: &'static str,
        /// Actual value shape.
        actual: &'static str,
    },
    /// Error reported by a composite value importer / exporter.
    Custom(anyhow::Error),
}

impl fmt::Display for ValueError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBool { value } => write!(
                formatter,
                "cannot parse `{value}` as boolean; expected one of 1, true, yes, 0, false, no (case-insensitive)"
            ),
            Self::InvalidInteger { value, err: Some(err) } => {
                write!(formatter, "cannot parse `{value}` as integer: {err}")
            }
            Self::InvalidInteger { value, err: None } => {
                write!(formatter, "cannot parse `{value}` as integer")
            }
            Self::IntegerOutOfRange { value, width } => write!(
                formatter,
                "integer {value} does not fit into {width} (allowed range: {}..={})",
                width.min(),
                width.max()
            ),
            Self::UnknownVariant { value, expected } => {
                write!(formatter, "unknown variant `{value}`, expected one of: ")?;
                for (i, name) in expected.iter().enumerate() {
                    let comma = if i + 1 < expected.len() { ", " } else { "" };
                    write!(formatter, "`{name}`{comma}")?;
                }
                Ok(())
            }
            Self::InvalidOrdinal { ordinal } => {
                write!(formatter, "enum ordinal {ordinal} does not correspond to a variant")
            }
            Self::LengthMismatch { expected, actual } => {
                write!(formatter, "expected {expected} items, got {actual}")
            }
            Self::MalformedPair { pair } => {
                write!(formatter, "malformed map entry `{pair}`; expected `key:value`")
            }
            Self::InvalidItem { index, inner } => write!(formatter, "item #{index}: {inner}"),
            Self::InvalidMapValue { key, inner } => write!(formatter, "value for `{key}`: {inner}"),
            Self::UnsupportedKind { kind } => {
                write!(formatter, "values of kind `{kind}` are not supported in this position")
            }
            Self::TypeMismatch { expected, actual } => {
                write!(formatter, "invalid value shape: expected {expected}, got {actual}")
            }
            Self::Custom(err) => write!(formatter, "{err:#}"),
        }
    }
}

impl std::error::Error for ValueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidInteger { err: Some(err), .. } => Some(err),
            Self::InvalidItem { inner, .. } | Self::InvalidMapValue { inner, .. } => Some(&**inner),
            Self::Custom(err) => Some(&**err),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for ValueError {
    fn from(err: anyhow::Error) -> Self {
        Self::Custom(err)
    }
}

/// Kind of a [`ConfigError`].
#[derive(Debug)]
#[non_exhaustive]
pub enum ConfigErrorKind {
    /// Schema is invalid, e.g. a default value cannot be decoded.
    Schema(ValueError),
    /// Service URL is syntactically malformed.
    Url(url::ParseError),
    /// Value does not match the kind of its field.
    Decode(ValueError),
    /// Field value cannot be encoded.
    Encode(ValueError),
    /// Required field is absent.
    MissingRequired,
    /// Query key does not correspond to any field.
    UnsupportedKey,
    /// URL has more path segments than declared by the config.
    UnexpectedPathSegment {
        /// One-based index of the unexpected segment.
        index: usize,
        /// Segment contents.
        segment: String,
    },
    /// URL scheme differs from the one declared by the config.
    SchemeMismatch {
        /// Declared scheme.
        expected: &'static str,
        /// Scheme of the URL.
        actual: String,
    },
    /// Value cannot be placed into the URL part, e.g. credentials for a URL without a host.
    InvalidUrlPart(UrlPart),
    /// Config does not declare a scheme, so a URL cannot be composed.
    MissingScheme,
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(err) => write!(formatter, "invalid default value: {err}"),
            Self::Url(err) => write!(formatter, "malformed service URL: {err}"),
            Self::Decode(err) => write!(formatter, "error decoding value: {err}"),
            Self::Encode(err) => write!(formatter, "error encoding value: {err}"),
            Self::MissingRequired => formatter.write_str("required value is missing"),
            Self::UnsupportedKey => formatter.write_str("unsupported key"),
            Self::UnexpectedPathSegment { index, segment } => {
                write!(formatter, "unexpected path segment #{index} `{segment}`")
            }
            Self::SchemeMismatch { expected, actual } => {
                write!(formatter, "unexpected URL scheme `{actual}`, expected `{expected}`")
            }
            Self::InvalidUrlPart(part) => {
                write!(formatter, "value cannot be placed into URL {part}")
            }
            Self::MissingScheme => formatter.write_str("config does not declare a URL scheme"),
        }
    }
}

/// Error produced by URL decomposition / composition and by the [key resolver](crate::KeyResolver).
pub struct ConfigError {
    kind: ConfigErrorKind,
    config: Option<&'static ConfigMetadata>,
    field: Option<&'static FieldMetadata>,
    key: Option<String>,
}

impl fmt::Debug for ConfigError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ConfigError")
            .field("kind", &self.kind)
            .field("config.ty", &self.config.map(|meta| meta.ty))
            .field("field", &self.field.map(|field| field.name))
            .field("key", &self.key)
            .finish()
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.kind)?;
        match (self.config, self.field) {
            (Some(config), Some(field)) => write!(
                formatter,
                " for field `{}.{}`",
                config.ty.name_in_code(),
                field.name
            )?,
            (Some(config), None) => write!(formatter, " in `{}`", config.ty.name_in_code())?,
            _ => { /* no context */ }
        }
        if let Some(key) = &self.key {
            write!(formatter, " (key: `{key}`)")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ConfigErrorKind::Schema(err)
            | ConfigErrorKind::Decode(err)
            | ConfigErrorKind::Encode(err) => Some(err),
            ConfigErrorKind::Url(err) => Some(err),
            _ => None,
        }
    }
}

impl From<url::ParseError> for ConfigError {
    fn from(err: url::ParseError) -> Self {
        Self::new(ConfigErrorKind::Url(err))
    }
}

impl ConfigError {
    fn new(kind: ConfigErrorKind) -> Self {
        Self {
            kind,
            config: None,
            field: None,
            key: None,
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> &ConfigErrorKind {
        &self.kind
    }

    /// Returns metadata for the failing config, if any.
    pub fn config(&self) -> Option<&'static ConfigMetadata> {
        self.config
    }

    /// Returns metadata for the failing field, if any. The field is guaranteed to be contained in [`Self::config()`].
    pub fn field(&self) -> Option<&'static FieldMetadata> {
        self.field
    }

    /// Returns the query key this error concerns, if any.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub(crate) fn for_config(mut self, config: &'static ConfigMetadata) -> Self {
        self.config = Some(config);
        self
    }

    pub(crate) fn for_field(mut self, config: &'static ConfigMetadata, field: &'static FieldMetadata) -> Self {
        self.config = Some(config);
        self.field = Some(field);
        self
    }

    pub(crate) fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_owned());
        self
    }

    pub(crate) fn invalid_default(
        config: &'static ConfigMetadata,
        field: &'static FieldMetadata,
        err: ValueError,
    ) -> Self {
        Self::new(ConfigErrorKind::Schema(err)).for_field(config, field)
    }

    pub(crate) fn decode(
        config: &'static ConfigMetadata,
        field: &'static FieldMetadata,
        err: ValueError,
    ) -> Self {
        Self::new(ConfigErrorKind::Decode(err)).for_field(config, field)
    }

    pub(crate) fn encode(
        config: &'static ConfigMetadata,
        field: &'static FieldMetadata,
        err: ValueError,
    ) -> Self {
        Self::new(ConfigErrorKind::Encode(err)).for_field(config, field)
    }

    pub(crate) fn missing_required(
        config: &'static ConfigMetadata,
        field: &'static FieldMetadata,
    ) -> Self {
        Self::new(ConfigErrorKind::MissingRequired).for_field(config, field)
    }

    pub(crate) fn unsupported_key(config: &'static ConfigMetadata, key: &str) -> Self {
        Self::new(ConfigErrorKind::UnsupportedKey)
            .for_config(config)
            .with_key(key)
    }

    pub(crate) fn unexpected_path_segment(
        config: &'static ConfigMetadata,
        index: usize,
        segment: String,
    ) -> Self {
        Self::new(ConfigErrorKind::UnexpectedPathSegment { index, segment }).for_config(config)
    }

    pub(crate) fn scheme_mismatch(
        config: &'static ConfigMetadata,
        expected: &'static str,
        actual: &str,
    ) -> Self {
        let actual = actual.to_owned();
        Self::new(ConfigErrorKind::SchemeMismatch { expected, actual }).for_config(config)
    }

    pub(crate) fn invalid_url_part(config: &'static ConfigMetadata, part: UrlPart) -> Self {
        Self::new(ConfigErrorKind::InvalidUrlPart(part)).for_config(config)
    }

    pub(crate) fn missing_scheme(config: &'static ConfigMetadata) -> Self {
        Self::new(ConfigErrorKind::MissingScheme).for_config(config)
    }
}
