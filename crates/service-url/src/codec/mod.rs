//! Type-directed textual codec for field values.
//!
//! All functions in this module are pure; they convert between raw strings as they appear in service URLs
//! and [`Value`]s according to a [`SemanticKind`].
//!
//! | Kind | Encoding | Decoding |
//! |------|----------|----------|
//! | text, composite | as is | as is |
//! | bool | `Yes` / `No` | case-insensitive `1`, `true`, `yes` / `0`, `false`, `no` |
//! | integer | base 10 | optional sign, then optional `0x` / `#` (hex), `0o` (octal) or `0b` (binary) prefix |
//! | enum | canonical variant name | variant name or alias |
//! | list | items joined with the field separator | split on the field separator |
//! | map | `key:value` entries sorted by key and joined with `,` | split on `,`, then on the first `:` |
//!
//! An empty string is decoded to an empty list / map. Consequently, a list consisting of a single empty item
//! is encoded as an empty string and is decoded back as an empty list.

use std::collections::BTreeMap;

use crate::{
    error::ValueError,
    metadata::{EnumFormatter, IntWidth, ItemKind, SemanticKind},
    value::Value,
};


const TRUE_LITERALS: [&str; 3] = ["1", "true", "yes"];
const FALSE_LITERALS: [&str; 3] = ["0", "false", "no"];

/// Decodes a raw value according to the semantic `kind`. `separator` is used to split list items.
///
/// # Errors
///
/// Returns an error if the raw value does not match the kind.
pub fn decode(kind: SemanticKind, raw: &str, separator: char) -> Result<Value, ValueError> {
    Ok(match kind {
        SemanticKind::Text | SemanticKind::Composite => Value::Text(raw.to_owned()),
        SemanticKind::Bool => Value::Bool(decode_bool(raw)?),
        SemanticKind::Int(width) => Value::Int(decode_int(raw, width)?),
        SemanticKind::Enum(formatter) => Value::Enum(decode_enum(formatter, raw)?),
        SemanticKind::List { item, len } => {
            let items = decode_list(item, raw, separator)?;
            if let Some(expected) = len
                && items.len() != expected
            {
                return Err(ValueError::LengthMismatch {
                    expected,
                    actual: items.len(),
                });
            }
            Value::List(items)
        }
        SemanticKind::Map { value } => Value::Map(decode_map(value, raw)?),
    })
}

/// Encodes a value according to the semantic `kind`. `separator` is used to join list items.
///
/// # Errors
///
/// Returns an error if the value has a shape not matching the kind, or is out of range for it.
pub fn encode(kind: SemanticKind, value: &Value, separator: char) -> Result<String, ValueError> {
    match (kind, value) {
        (SemanticKind::Text | SemanticKind::Composite, Value::Text(text)) => Ok(text.clone()),
        (SemanticKind::Bool, Value::Bool(flag)) => Ok(encode_bool(*flag).to_owned()),
        (SemanticKind::Int(width), Value::Int(int)) => encode_int(*int, width),
        (SemanticKind::Enum(formatter), Value::Enum(ordinal)) => formatter
            .print(*ordinal)
            .map(str::to_owned)
            .ok_or(ValueError::InvalidOrdinal { ordinal: *ordinal }),
        (SemanticKind::List { item, len }, Value::List(items)) => {
            if let Some(expected) = len
                && items.len() != expected
            {
                return Err(ValueError::LengthMismatch {
                    expected,
                    actual: items.len(),
                });
            }
            let items = items
                .iter()
                .enumerate()
                .map(|(index, value)| {
                    encode_item(item, value).map_err(|err| ValueError::InvalidItem {
                        index,
                        inner: Box::new(err),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let mut buffer = [0; 4];
            let separator: &str = separator.encode_utf8(&mut buffer);
            Ok(items.join(separator))
        }
        (SemanticKind::Map { value: value_kind }, Value::Map(map)) => {
            let entries = map
                .iter()
                .map(|(key, value)| {
                    let value = encode_item(value_kind, value).map_err(|err| {
                        ValueError::InvalidMapValue {
                            key: key.clone(),
                            inner: Box::new(err),
                        }
                    })?;
                    Ok(format!("{key}:{value}"))
                })
                .collect::<Result<Vec<_>, ValueError>>()?;
            Ok(entries.join(","))
        }
        (kind, value) => Err(value.mismatch(expected_shape(kind))),
    }
}

fn expected_shape(kind: SemanticKind) -> &'static str {
    match kind {
        SemanticKind::Text | SemanticKind::Composite => "text",
        SemanticKind::Bool => "bool",
        SemanticKind::Int(_) => "integer",
        SemanticKind::Enum(_) => "enum",
        SemanticKind::List { .. } => "list",
        SemanticKind::Map { .. } => "map",
    }
}

/// Decodes a boolean literal.
///
/// # Errors
///
/// Returns an error if the literal is not recognized.
pub fn decode_bool(raw: &str) -> Result<bool, ValueError> {
    if TRUE_LITERALS.iter().any(|lit| lit.eq_ignore_ascii_case(raw)) {
        Ok(true)
    } else if FALSE_LITERALS.iter().any(|lit| lit.eq_ignore_ascii_case(raw)) {
        Ok(false)
    } else {
        Err(ValueError::InvalidBool {
            value: raw.to_owned(),
        })
    }
}

/// Encodes a boolean as `Yes` / `No`.
pub fn encode_bool(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

/// Splits an optional base prefix from the number. Returns the remaining digits and the radix.
fn strip_radix_prefix(number: &str) -> (&str, u32) {
    if let Some(digits) = number.strip_prefix('#') {
        return (digits, 16);
    }

    let radix = match number.as_bytes() {
        [b'0', b'x' | b'X', ..] => 16,
        [b'0', b'o' | b'O', ..] => 8,
        [b'0', b'b' | b'B', ..] => 2,
        _ => return (number, 10),
    };
    (&number[2..], radix)
}

/// Decodes an integer that must fit into the specified `width`.
///
/// # Errors
///
/// Returns an error if the input is not a number, or if it doesn't fit into `width`.
pub fn decode_int(raw: &str, width: IntWidth) -> Result<i128, ValueError> {
    let (is_negative, unsigned) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let (digits, radix) = strip_radix_prefix(unsigned);
    if digits.starts_with(['+', '-']) {
        return Err(ValueError::InvalidInteger {
            value: raw.to_owned(),
            err: None,
        });
    }

    let magnitude =
        u128::from_str_radix(digits, radix).map_err(|err| ValueError::InvalidInteger {
            value: raw.to_owned(),
            err: Some(err),
        })?;
    let out_of_range = || ValueError::IntegerOutOfRange {
        value: raw.to_owned(),
        width,
    };
    // Widths are at most 64 bits, so any in-range magnitude fits into `i128`.
    let magnitude = i128::try_from(magnitude).map_err(|_| out_of_range())?;
    let value = if is_negative { -magnitude } else { magnitude };

    if (width.min()..=width.max()).contains(&value) {
        Ok(value)
    } else {
        Err(out_of_range())
    }
}

/// Encodes an integer in base 10, checking that it fits into `width`.
fn encode_int(value: i128, width: IntWidth) -> Result<String, ValueError> {
    if (width.min()..=width.max()).contains(&value) {
        Ok(value.to_string())
    } else {
        Err(ValueError::IntegerOutOfRange {
            value: value.to_string(),
            width,
        })
    }
}

fn decode_enum(formatter: &EnumFormatter, raw: &str) -> Result<usize, ValueError> {
    formatter
        .parse(raw)
        .ok_or_else(|| ValueError::UnknownVariant {
            value: raw.to_owned(),
            expected: formatter.names(),
        })
}

/// Decodes a single list item or map value.
fn decode_item(kind: ItemKind, raw: &str) -> Result<Value, ValueError> {
    match kind {
        ItemKind::Text | ItemKind::Composite => Ok(Value::Text(raw.to_owned())),
        ItemKind::Int(width) => decode_int(raw, width).map(Value::Int),
        ItemKind::Unsupported(kind) => Err(ValueError::UnsupportedKind { kind }),
    }
}

fn encode_item(kind: ItemKind, value: &Value) -> Result<String, ValueError> {
    match (kind, value) {
        (ItemKind::Text | ItemKind::Composite, Value::Text(text)) => Ok(text.clone()),
        (ItemKind::Int(width), Value::Int(int)) => encode_int(*int, width),
        (ItemKind::Unsupported(kind), _) => Err(ValueError::UnsupportedKind { kind }),
        (ItemKind::Text | ItemKind::Composite, value) => Err(value.mismatch("text")),
        (ItemKind::Int(_), value) => Err(value.mismatch("integer")),
    }
}

fn decode_list(item: ItemKind, raw: &str, separator: char) -> Result<Vec<Value>, ValueError> {
    if raw.is_empty() {
        return Ok(vec![]);
    }
    raw.split(separator)
        .enumerate()
        .map(|(index, item_raw)| {
            decode_item(item, item_raw).map_err(|err| ValueError::InvalidItem {
                index,
                inner: Box::new(err),
            })
        })
        .collect()
}

fn decode_map(value_kind: ItemKind, raw: &str) -> Result<BTreeMap<String, Value>, ValueError> {
    let mut map = BTreeMap::new();
    if raw.is_empty() {
        return Ok(map);
    }

    for pair in raw.split(',') {
        let Some((key, value_raw)) = pair.split_once(':') else {
            return Err(ValueError::MalformedPair {
                pair: pair.to_owned(),
            });
        };
        let value = decode_item(value_kind, value_raw).map_err(|err| {
            ValueError::InvalidMapValue {
                key: key.to_owned(),
                inner: Box::new(err),
            }
        })?;
        map.insert(key.to_owned(), value);
    }
    Ok(map)
}
