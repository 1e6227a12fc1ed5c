//! Helpers for code generated by the `EnumValue` derive macro.

use super::{EnumValue, Value};
use crate::error::ValueError;

pub fn enum_to_value<T: EnumValue>(value: &T) -> Result<Value, ValueError> {
    let ordinal = value.ordinal();
    if T::FORMATTER.print(ordinal).is_none() {
        return Err(ValueError::InvalidOrdinal { ordinal });
    }
    Ok(Value::Enum(ordinal))
}

pub fn enum_from_value<T: EnumValue>(value: Value) -> Result<T, ValueError> {
    let ordinal = match value {
        Value::Enum(ordinal) => ordinal,
        Value::Text(name) => {
            T::FORMATTER
                .parse(&name)
                .ok_or_else(|| ValueError::UnknownVariant {
                    value: name,
                    expected: T::FORMATTER.names(),
                })?
        }
        other => return Err(other.mismatch("enum")),
    };
    T::from_ordinal(ordinal).ok_or(ValueError::InvalidOrdinal { ordinal })
}
