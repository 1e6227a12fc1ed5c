//! Key-based access to a config instance.

use std::{collections::BTreeMap, fmt};

use crate::{
    DescribeConfig,
    access::{read_encoded, write_encoded},
    codec,
    error::ConfigError,
    metadata::ConfigMetadata,
};

#[cfg(test)]
mod tests;

/// Per-message parameters overriding config fields. Keys are query keys of the config
/// (either canonical or aliases); values are raw, i.e. not yet decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    /// Key of the message title param.
    pub const TITLE: &'static str = "title";

    /// Creates empty params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value for the specified key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Sets a raw value for the specified key, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes the value for the specified key.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Returns the message title, if set.
    pub fn title(&self) -> Option<&str> {
        self.get(Self::TITLE)
    }

    /// Sets the message title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.set(Self::TITLE, title);
    }

    /// Iterates over params in the key order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &str)> + '_ {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Returns the number of params.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks whether there are no params.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Params {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// Resolver of query keys bound to a single config instance.
///
/// The resolver gets and sets config fields by their query keys (canonical or aliases), decoding and encoding
/// values according to the [config metadata](DescribeConfig::DESCRIPTION). It also tracks which fields were
/// explicitly set, so that [defaults](Self::set_defaults()) never overwrite them.
///
/// # Examples
///
/// ```
/// use service_url::{DescribeConfig, KeyResolver, Params};
///
/// #[derive(Debug, Default, Clone, DescribeConfig)]
/// struct TestConfig {
///     #[config(default = "Hello")]
///     title: String,
///     #[config(key = "priority", alias = "prio", default = "3")]
///     priority: u8,
/// }
///
/// let mut config = TestConfig::default();
/// let mut resolver = KeyResolver::new(&mut config);
/// resolver.set("prio", "0x5")?;
/// resolver.set_defaults()?;
/// assert_eq!(resolver.get("priority")?.as_deref(), Some("5"));
/// assert_eq!(resolver.get("title")?.as_deref(), Some("Hello"));
///
/// // Per-message params are applied to a copy of the config.
/// let updated = resolver.update_from_params(&Params::from([("title", "Alert")]))?;
/// assert_eq!(updated.title, "Alert");
/// assert_eq!(config.title, "Hello");
/// # anyhow::Ok(())
/// ```
pub struct KeyResolver<'a, C> {
    config: &'a mut C,
    explicitly_set: Vec<bool>,
}

impl<C: DescribeConfig> fmt::Debug for KeyResolver<'_, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("KeyResolver")
            .field("config", &C::DESCRIPTION.ty)
            .field("explicitly_set", &self.explicitly_set)
            .finish_non_exhaustive()
    }
}

impl<'a, C: DescribeConfig> KeyResolver<'a, C> {
    /// Creates a resolver for the provided config.
    pub fn new(config: &'a mut C) -> Self {
        Self {
            config,
            explicitly_set: vec![false; C::DESCRIPTION.fields.len()],
        }
    }

    /// Returns the metadata of the bound config.
    pub fn metadata(&self) -> &'static ConfigMetadata {
        &C::DESCRIPTION
    }

    /// Returns a shared reference to the bound config.
    pub fn config(&self) -> &C {
        self.config
    }

    /// Lists canonical keys of all fields accessible by key, sorted lexicographically.
    pub fn query_keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self
            .metadata()
            .fields
            .iter()
            .filter_map(|field| field.canonical_key())
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Gets the encoded value of the field with the specified query key. Returns `Ok(None)` if there is no such field.
    ///
    /// # Errors
    ///
    /// Returns an error if the field value cannot be encoded.
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let Some((index, _)) = self.metadata().field_for_key(key) else {
            return Ok(None);
        };
        read_encoded(&*self.config, index)
            .map(Some)
            .map_err(|err| err.with_key(key))
    }

    /// Decodes `value` and sets the field with the specified query key.
    ///
    /// # Errors
    ///
    /// Returns an error if no field has the specified key, or if the value cannot be decoded.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let metadata = self.metadata();
        let (index, _) = metadata
            .field_for_key(key)
            .ok_or_else(|| ConfigError::unsupported_key(metadata, key))?;
        self.set_field(index, value, Some(key))
    }

    /// Sets a field by its index. This is used for fields placed into structural URL parts, which may have no keys.
    pub(crate) fn set_field(
        &mut self,
        index: usize,
        value: &str,
        key: Option<&str>,
    ) -> Result<(), ConfigError> {
        let field = &self.metadata().fields[index];
        write_encoded(self.config, index, value).map_err(|err| match key {
            Some(key) => err.with_key(key),
            None => err,
        })?;
        self.explicitly_set[index] = true;

        if field.is_secret {
            tracing::trace!(field = field.name, key, "set secret field");
        } else {
            tracing::trace!(field = field.name, key, value, "set field");
        }
        Ok(())
    }

    /// Sets all fields having a declared default value that were not explicitly set via this resolver.
    ///
    /// # Errors
    ///
    /// Returns a schema error if a default value cannot be decoded. This cannot happen for configs
    /// passing [`check_defaults()`](crate::testing::check_defaults).
    pub fn set_defaults(&mut self) -> Result<(), ConfigError> {
        let metadata = self.metadata();
        for (index, field) in metadata.fields.iter().enumerate() {
            let Some(default) = field.default_value else {
                continue;
            };
            if self.explicitly_set[index] {
                continue;
            }

            codec::decode(field.kind, default, field.separator)
                .and_then(|value| self.config.write_field(index, value))
                .map_err(|err| ConfigError::invalid_default(metadata, field, err))?;
            if field.is_secret {
                tracing::trace!(field = field.name, "applied default value for secret field");
            } else {
                tracing::trace!(field = field.name, default, "applied default value");
            }
        }
        Ok(())
    }

    /// Applies per-message params to the bound config.
    ///
    /// # Errors
    ///
    /// Returns an error if a param key is not supported, or a param value cannot be decoded.
    /// Params preceding the failing one remain applied.
    pub fn apply_params(&mut self, params: &Params) -> Result<(), ConfigError> {
        for (key, value) in params.iter() {
            self.set(key, value)?;
        }
        tracing::debug!(
            config = ?self.metadata().ty,
            param_count = params.len(),
            "applied params"
        );
        Ok(())
    }

    /// Creates a copy of the bound config with the params applied. Neither the bound config nor `params` are modified.
    ///
    /// # Errors
    ///
    /// Returns an error if a param key is not supported, or a param value cannot be decoded.
    pub fn update_from_params(&self, params: &Params) -> Result<C, ConfigError>
    where
        C: Clone,
    {
        let mut config = self.config.clone();
        KeyResolver::new(&mut config).apply_params(params)?;
        Ok(config)
    }
}
