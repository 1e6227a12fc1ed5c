//! Intermediate value model and its bridging with Rust types.
//!
//! Decoding a field is a two-step process: the [codec](crate::codec) converts raw text into a [`Value`]
//! according to the field's [`SemanticKind`], and then [`UrlValue::from_value()`] converts the value
//! into the field type. Encoding goes in the opposite direction.
//!
//! # Supported types
//!
//! [`UrlValue`] is implemented for:
//!
//! - [`String`] and [`SecretString`] (text)
//! - `bool`
//! - Signed and unsigned integers up to 64 bits wide, including `usize` / `isize`
//! - Enums deriving [`EnumValue`](macro@crate::EnumValue)
//! - Types implementing [`ConfigProp`] (composite values)
//! - [`Vec`] and arrays of text, integer or composite items
//! - [`BTreeMap`] and [`HashMap`] with string keys and text or integer values

use std::{
    collections::{BTreeMap, HashMap},
    hash::BuildHasher,
};

use secrecy::{ExposeSecret, SecretString};

use crate::{
    error::ValueError,
    metadata::{EnumFormatter, IntWidth, ItemKind, SemanticKind},
};

#[doc(hidden)] // used in the derive macros
pub mod _private;

/// Decoded value of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Value {
    /// Text. Also used for composite values, which are stored in the exported form.
    Text(String),
    /// Boolean value.
    Bool(bool),
    /// Integer value. The range of the value is checked against the field width during decoding.
    Int(i128),
    /// Enum ordinal.
    Enum(usize),
    /// List of values.
    List(Vec<Value>),
    /// Map with string keys.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns a human-readable name of the value shape, e.g. `text`.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Enum(_) => "enum",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Extracts text from this value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a text.
    pub fn into_text(self) -> Result<String, ValueError> {
        match self {
            Self::Text(s) => Ok(s),
            other => Err(other.mismatch("text")),
        }
    }

    pub(crate) fn mismatch(&self, expected: &'static str) -> ValueError {
        ValueError::TypeMismatch {
            expected,
            actual: self.shape(),
        }
    }
}

/// Type that can be placed into a service URL.
///
/// This trait is implemented for many standard types (see the [module docs](self)); for user-defined types,
/// implement [`ConfigProp`] or derive [`EnumValue`](macro@crate::EnumValue).
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be placed into a service URL",
    label = "unsupported field type",
    note = "implement `ConfigProp` for composite values, or derive `EnumValue` for unit enums"
)]
pub trait UrlValue: Sized {
    /// Semantic kind determining the textual encoding of the type.
    const KIND: SemanticKind;
    /// Is this type secret? Values of secret types are never logged.
    const SECRET: bool = false;

    /// Converts this value into the intermediate representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented (e.g., a composite value cannot be exported).
    fn to_value(&self) -> Result<Value, ValueError>;

    /// Converts the intermediate representation into this type.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has an unexpected shape or is otherwise invalid.
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

/// User-defined composite value with custom textual encoding, e.g. a structured token.
///
/// # Examples
///
/// ```
/// # use service_url::value::ConfigProp;
/// # use anyhow::Context as _;
/// /// Token in the `{id}.{secret}` format.
/// #[derive(Debug, PartialEq)]
/// struct Token {
///     id: u32,
///     secret: String,
/// }
///
/// impl ConfigProp for Token {
///     fn import_from_text(text: &str) -> anyhow::Result<Self> {
///         let (id, secret) = text.split_once('.').context("token must contain a dot")?;
///         Ok(Self {
///             id: id.parse().context("invalid token ID")?,
///             secret: secret.to_owned(),
///         })
///     }
///
///     fn export_to_text(&self) -> anyhow::Result<String> {
///         Ok(format!("{}.{}", self.id, self.secret))
///     }
/// }
///
/// let token = Token::import_from_text("42.s3cr3t")?;
/// assert_eq!(token.id, 42);
/// assert!(Token::import_from_text("s3cr3t").is_err());
/// # anyhow::Ok(())
/// ```
pub trait ConfigProp: Sized {
    /// Parses the value from its textual representation.
    ///
    /// # Errors
    ///
    /// Returns a domain-specific error if the text is malformed.
    fn import_from_text(text: &str) -> anyhow::Result<Self>;

    /// Serializes the value to text. The output must be accepted by [`Self::import_from_text()`].
    ///
    /// # Errors
    ///
    /// Returns a domain-specific error if the value cannot be serialized.
    fn export_to_text(&self) -> anyhow::Result<String>;
}

impl<T: ConfigProp> UrlValue for T {
    const KIND: SemanticKind = SemanticKind::Composite;

    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Text(self.export_to_text()?))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        let text = value.into_text()?;
        Ok(Self::import_from_text(&text)?)
    }
}

/// Enumeration with a fixed set of names. Should be derived using the [`EnumValue`](macro@crate::EnumValue) macro.
pub trait EnumValue: Sized + 'static {
    /// Formatter mapping enum ordinals to names.
    const FORMATTER: &'static EnumFormatter;

    /// Returns the ordinal of this variant.
    fn ordinal(&self) -> usize;

    /// Creates a variant from its ordinal.
    fn from_ordinal(ordinal: usize) -> Option<Self>;
}

impl UrlValue for String {
    const KIND: SemanticKind = SemanticKind::Text;

    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Text(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        value.into_text()
    }
}

impl UrlValue for SecretString {
    const KIND: SemanticKind = SemanticKind::Text;
    const SECRET: bool = true;

    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Text(self.expose_secret().to_owned()))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        value.into_text().map(Self::from)
    }
}

impl UrlValue for bool {
    const KIND: SemanticKind = SemanticKind::Bool;

    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(flag) => Ok(flag),
            other => Err(other.mismatch("bool")),
        }
    }
}

macro_rules! impl_url_value_for_int {
    ($($int:ty: $signed:tt),+) => {
        $(
        impl UrlValue for $int {
            const KIND: SemanticKind = SemanticKind::Int(IntWidth {
                signed: $signed,
                bits: <$int>::BITS,
            });

            fn to_value(&self) -> Result<Value, ValueError> {
                Ok(Value::Int(i128::from(*self)))
            }

            fn from_value(value: Value) -> Result<Self, ValueError> {
                let Value::Int(int) = value else {
                    return Err(value.mismatch("integer"));
                };
                <$int>::try_from(int).map_err(|_| ValueError::IntegerOutOfRange {
                    value: int.to_string(),
                    width: IntWidth {
                        signed: $signed,
                        bits: <$int>::BITS,
                    },
                })
            }
        }
        )+
    };
}

impl_url_value_for_int!(
    u8: false, u16: false, u32: false, u64: false,
    i8: true, i16: true, i32: true, i64: true
);

macro_rules! impl_url_value_for_size {
    ($($int:ty: $signed:tt),+) => {
        $(
        impl UrlValue for $int {
            const KIND: SemanticKind = SemanticKind::Int(IntWidth {
                signed: $signed,
                bits: <$int>::BITS,
            });

            fn to_value(&self) -> Result<Value, ValueError> {
                i128::try_from(*self)
                    .map(Value::Int)
                    .map_err(|err| ValueError::Custom(err.into()))
            }

            fn from_value(value: Value) -> Result<Self, ValueError> {
                let Value::Int(int) = value else {
                    return Err(value.mismatch("integer"));
                };
                <$int>::try_from(int).map_err(|_| ValueError::IntegerOutOfRange {
                    value: int.to_string(),
                    width: IntWidth {
                        signed: $signed,
                        bits: <$int>::BITS,
                    },
                })
            }
        }
        )+
    };
}

impl_url_value_for_size!(usize: false, isize: true);

fn items_to_values<'a, T: UrlValue + 'a>(
    items: impl Iterator<Item = &'a T>,
) -> Result<Vec<Value>, ValueError> {
    items
        .enumerate()
        .map(|(index, item)| {
            item.to_value().map_err(|err| ValueError::InvalidItem {
                index,
                inner: Box::new(err),
            })
        })
        .collect()
}

fn items_from_value<T: UrlValue>(value: Value) -> Result<Vec<T>, ValueError> {
    let Value::List(items) = value else {
        return Err(value.mismatch("list"));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            T::from_value(item).map_err(|err| ValueError::InvalidItem {
                index,
                inner: Box::new(err),
            })
        })
        .collect()
}

impl<T: UrlValue> UrlValue for Vec<T> {
    const KIND: SemanticKind = SemanticKind::List {
        item: ItemKind::of(T::KIND),
        len: None,
    };
    const SECRET: bool = T::SECRET;

    fn to_value(&self) -> Result<Value, ValueError> {
        items_to_values(self.iter()).map(Value::List)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        items_from_value(value)
    }
}

impl<T: UrlValue, const N: usize> UrlValue for [T; N] {
    const KIND: SemanticKind = SemanticKind::List {
        item: ItemKind::of(T::KIND),
        len: Some(N),
    };
    const SECRET: bool = T::SECRET;

    fn to_value(&self) -> Result<Value, ValueError> {
        items_to_values(self.iter()).map(Value::List)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        let items: Vec<T> = items_from_value(value)?;
        items
            .try_into()
            .map_err(|items: Vec<T>| ValueError::LengthMismatch {
                expected: N,
                actual: items.len(),
            })
    }
}

fn entries_to_value<'a, V: UrlValue + 'a>(
    entries: impl Iterator<Item = (&'a String, &'a V)>,
) -> Result<Value, ValueError> {
    let map = entries
        .map(|(key, value)| {
            let value = value.to_value().map_err(|err| ValueError::InvalidMapValue {
                key: key.clone(),
                inner: Box::new(err),
            })?;
            Ok((key.clone(), value))
        })
        .collect::<Result<_, ValueError>>()?;
    Ok(Value::Map(map))
}

fn entries_from_value<V: UrlValue>(
    value: Value,
) -> Result<impl Iterator<Item = Result<(String, V), ValueError>>, ValueError> {
    let Value::Map(map) = value else {
        return Err(value.mismatch("map"));
    };
    Ok(map.into_iter().map(|(key, value)| match V::from_value(value) {
        Ok(value) => Ok((key, value)),
        Err(err) => Err(ValueError::InvalidMapValue {
            key,
            inner: Box::new(err),
        }),
    }))
}

impl<V: UrlValue> UrlValue for BTreeMap<String, V> {
    const KIND: SemanticKind = SemanticKind::Map {
        value: ItemKind::of(V::KIND),
    };
    const SECRET: bool = V::SECRET;

    fn to_value(&self) -> Result<Value, ValueError> {
        entries_to_value(self.iter())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        entries_from_value(value)?.collect()
    }
}

impl<V: UrlValue, S: BuildHasher + Default> UrlValue for HashMap<String, V, S> {
    const KIND: SemanticKind = SemanticKind::Map {
        value: ItemKind::of(V::KIND),
    };
    const SECRET: bool = V::SECRET;

    fn to_value(&self) -> Result<Value, ValueError> {
        entries_to_value(self.iter())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        entries_from_value(value)?.collect()
    }
}
