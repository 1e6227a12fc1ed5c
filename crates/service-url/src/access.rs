//! Index-based access to config fields.

use crate::{
    DescribeConfig, codec,
    error::{ConfigError, ValueError},
    metadata::FieldMetadata,
    value::Value,
};

/// Configuration fields of which can be read and written by their index in [`ConfigMetadata::fields`].
///
/// This is a supertrait for [`DescribeConfig`] that is automatically derived
/// via [`derive(DescribeConfig)`](macro@crate::DescribeConfig).
///
/// [`ConfigMetadata::fields`]: crate::metadata::ConfigMetadata::fields
pub trait AccessConfig {
    /// Reads the field with the specified index.
    ///
    /// # Errors
    ///
    /// Returns an error if the field value cannot be represented as a [`Value`].
    ///
    /// # Panics
    ///
    /// May panic if `index` is out of bounds.
    fn read_field(&self, index: usize) -> Result<Value, ValueError>;

    /// Writes the field with the specified index. If an error is returned, the field is not changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be converted to the field type.
    ///
    /// # Panics
    ///
    /// May panic if `index` is out of bounds.
    fn write_field(&mut self, index: usize, value: Value) -> Result<(), ValueError>;
}

/// Reads a field and encodes it according to its metadata.
pub(crate) fn read_encoded<C: DescribeConfig>(
    config: &C,
    index: usize,
) -> Result<String, ConfigError> {
    let metadata = &C::DESCRIPTION;
    let field: &'static FieldMetadata = &metadata.fields[index];
    let value = config
        .read_field(index)
        .map_err(|err| ConfigError::encode(metadata, field, err))?;
    codec::encode(field.kind, &value, field.separator)
        .map_err(|err| ConfigError::encode(metadata, field, err))
}

/// Decodes a raw value according to field metadata and writes it to the field.
pub(crate) fn write_encoded<C: DescribeConfig>(
    config: &mut C,
    index: usize,
    raw: &str,
) -> Result<(), ConfigError> {
    let metadata = &C::DESCRIPTION;
    let field: &'static FieldMetadata = &metadata.fields[index];
    let value = codec::decode(field.kind, raw, field.separator)
        .map_err(|err| ConfigError::decode(metadata, field, err))?;
    config
        .write_field(index, value)
        .map_err(|err| ConfigError::decode(metadata, field, err))
}
