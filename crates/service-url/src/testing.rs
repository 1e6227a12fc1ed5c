//! Testing tools for service configs.

use std::fmt;

use url::Url;

use crate::{
    ConfigError, DescribeConfig, KeyResolver, ServiceConfig,
    metadata::{ConfigMetadata, UrlPart},
};

/// Tests config construction from the provided service URL. Defaults are applied before the URL is decomposed,
/// the same way as in [`ServiceConfig::from_url()`].
///
/// # Errors
///
/// Propagates URL parsing and decomposition errors, which allows testing negative cases.
///
/// # Examples
///
/// ## Basic usage
///
/// ```
/// use service_url::{testing, DescribeConfig};
///
/// #[derive(Debug, Clone, Default, DescribeConfig)]
/// #[config(scheme = "test")]
/// struct TestConfig {
///     #[config(url = "host")]
///     host: String,
///     #[config(alias = "flag", default = "yes")]
///     enabled: bool,
/// }
///
/// let config: TestConfig = testing::test("test://example.com")?;
/// assert_eq!(config.host, "example.com");
/// assert!(config.enabled);
/// # anyhow::Ok(())
/// ```
///
/// ## Testing errors
///
/// ```
/// # use service_url::{testing, DescribeConfig};
/// #[derive(Debug, Clone, Default, DescribeConfig)]
/// #[config(scheme = "test")]
/// struct TestConfig {
///     #[config(alias = "flag", default = "yes")]
///     enabled: bool,
/// }
///
/// let err = testing::test::<TestConfig>("test://?flag=maybe").unwrap_err();
/// assert_eq!(err.field().unwrap().name, "enabled");
/// assert_eq!(err.key(), Some("flag"));
/// assert!(err.to_string().contains("cannot parse `maybe` as boolean"));
/// ```
pub fn test<C: ServiceConfig>(url: &str) -> Result<C, ConfigError> {
    C::from_url_str(url)
}

/// Tests config construction ensuring that *all* declared config fields are covered by the URL.
///
/// # Panics
///
/// Panics if the URL doesn't cover all fields in the config. The panic message will contain
/// names of the missing fields.
///
/// # Errors
///
/// Propagates URL parsing and decomposition errors, which allows testing negative cases.
///
/// # Examples
///
/// ```should_panic
/// # use service_url::{testing, DescribeConfig};
/// #[derive(Debug, Clone, Default, DescribeConfig)]
/// #[config(scheme = "test")]
/// struct TestConfig {
///     #[config(url = "host")]
///     host: String,
///     #[config(default = "3")]
///     retries: u8,
/// }
///
/// // Will panic with a message detailing missing fields (`retries` in this case)
/// testing::test_complete::<TestConfig>("test://example.com")?;
/// # anyhow::Ok(())
/// ```
#[track_caller] // necessary for assertion panics to be located in the test code, rather than in this crate
pub fn test_complete<C: ServiceConfig>(url: &str) -> Result<C, ConfigError> {
    let parsed = Url::parse(url)?;
    let metadata: &'static ConfigMetadata = &C::DESCRIPTION;
    let covered = covered_fields(metadata, &parsed);
    let missing: Vec<_> = metadata
        .fields
        .iter()
        .zip(&covered)
        .filter_map(|(field, &is_covered)| (!is_covered).then_some(field.name))
        .collect();
    assert!(
        missing.is_empty(),
        "URL does not cover fields in `{}`: {missing:?}",
        metadata.ty.name_in_code()
    );
    C::from_url(&parsed)
}

/// Returns flags for each config field whether it is set by the URL.
fn covered_fields(metadata: &'static ConfigMetadata, url: &Url) -> Vec<bool> {
    let mut covered = vec![false; metadata.fields.len()];
    let mut cover = |part: UrlPart| {
        if let Some((index, _)) = metadata.field_at(part) {
            covered[index] = true;
        }
    };

    if !url.username().is_empty() {
        cover(UrlPart::User);
    }
    if url.password().is_some() {
        cover(UrlPart::Password);
    }
    if url.host_str().is_some_and(|host| !host.is_empty()) {
        cover(UrlPart::Host);
    }
    if url.port().is_some() {
        cover(UrlPart::Port);
    }
    let segment_count = url
        .path_segments()
        .into_iter()
        .flatten()
        .filter(|segment| !segment.is_empty())
        .count();
    for idx in 1..=segment_count {
        if let Ok(idx) = u8::try_from(idx) {
            cover(UrlPart::Path(idx));
        }
    }

    for (key, _) in url.query_pairs() {
        if let Some((index, _)) = metadata.field_for_key(&key) {
            covered[index] = true;
        }
    }
    covered
}

/// Checks that a config survives a round trip through its service URL. Returns the composed URL.
///
/// The config is composed into a URL, which is then decomposed into a new config instance (with defaults
/// applied first) and composed again. Both configs and both URLs must be equal.
///
/// # Panics
///
/// Panics if the URL cannot be composed or decomposed, or if the round trip changes the config or the URL.
///
/// # Examples
///
/// ```
/// # use service_url::{testing, DescribeConfig};
/// #[derive(Debug, Clone, Default, PartialEq, DescribeConfig)]
/// #[config(scheme = "test")]
/// struct TestConfig {
///     #[config(url = "host")]
///     host: String,
///     tags: Vec<String>,
/// }
///
/// let config = TestConfig {
///     host: "example.com".into(),
///     tags: vec!["a b".into(), "c&d".into()],
/// };
/// let url = testing::assert_round_trip(&config);
/// assert_eq!(url.as_str(), "test://example.com?tags=a+b%2Cc%26d");
/// ```
#[track_caller]
pub fn assert_round_trip<C>(config: &C) -> Url
where
    C: ServiceConfig + PartialEq + fmt::Debug,
{
    let url = match config.url() {
        Ok(url) => url,
        Err(err) => panic!("failed composing URL for {config:?}: {err}"),
    };
    let restored = match C::from_url(&url) {
        Ok(restored) => restored,
        Err(err) => panic!("failed decomposing URL `{url}`: {err}"),
    };
    assert_eq!(restored, *config, "config changed after round trip via `{url}`");

    let restored_url = match restored.url() {
        Ok(url) => url,
        Err(err) => panic!("failed composing URL for restored config {restored:?}: {err}"),
    };
    assert_eq!(
        restored_url.as_str(),
        url.as_str(),
        "URL changed after round trip"
    );
    url
}

/// Checks that all default values declared by the config are valid for their fields. Returns
/// the default config instance with the declared defaults applied.
///
/// Unlike [`ConfigMetadata::check_defaults()`], this also checks that defaults are accepted by the field types,
/// e.g. that composite values can be imported from them.
///
/// # Errors
///
/// Returns a schema error pointing to the first field with an invalid default.
///
/// # Examples
///
/// ```
/// # use service_url::{testing, DescribeConfig, ConfigErrorKind};
/// # use assert_matches::assert_matches;
/// #[derive(Debug, Default, DescribeConfig)]
/// struct TestConfig {
///     #[config(default = "0x10")]
///     size: u8,
///     #[config(default = "256")]
///     capacity: u8,
/// }
///
/// let err = testing::check_defaults::<TestConfig>().unwrap_err();
/// assert_eq!(err.field().unwrap().name, "capacity");
/// assert_matches!(err.kind(), ConfigErrorKind::Schema(_));
/// ```
pub fn check_defaults<C: DescribeConfig + Default>() -> Result<C, ConfigError> {
    let metadata: &'static ConfigMetadata = &C::DESCRIPTION;
    metadata.check_defaults()?;

    let mut config = C::default();
    KeyResolver::new(&mut config).set_defaults()?;
    Ok(config)
}
