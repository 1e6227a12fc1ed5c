use assert_matches::assert_matches;
use secrecy::{ExposeSecret, SecretString};
use tracing_test::traced_test;

use super::*;
use crate::{
    ConfigErrorKind, DescribeConfig, ValueError,
    testonly::{AuthKind, GotifyConfig, MailConfig, NtfyConfig, Priority},
};

#[test]
fn getting_and_setting_fields() {
    let mut config = NtfyConfig::default();
    let mut resolver = KeyResolver::new(&mut config);
    assert_eq!(resolver.get("priority").unwrap().as_deref(), Some("Default"));

    resolver.set("priority", "high").unwrap();
    assert_eq!(resolver.get("priority").unwrap().as_deref(), Some("High"));
    resolver.set("tags", "a,b").unwrap();
    assert_eq!(resolver.get("tags").unwrap().as_deref(), Some("a,b"));
    resolver.set("disableTLS", "1").unwrap();
    assert_eq!(resolver.get("disableTLS").unwrap().as_deref(), Some("Yes"));

    assert_eq!(config.priority, Priority::High);
    assert_eq!(config.tags, ["a", "b"]);
    assert!(config.disable_tls);
}

#[test]
fn aliases_are_equivalent_to_canonical_keys() {
    let mut via_alias = NtfyConfig::default();
    KeyResolver::new(&mut via_alias).set("prio", "urgent").unwrap();
    let mut via_key = NtfyConfig::default();
    KeyResolver::new(&mut via_key).set("priority", "urgent").unwrap();
    assert_eq!(via_alias, via_key);
    assert_eq!(via_alias.priority, Priority::Max);

    let resolver = KeyResolver::new(&mut via_alias);
    assert_eq!(resolver.get("prio").unwrap(), resolver.get("priority").unwrap());
}

#[test]
fn integers_with_prefixes() {
    let mut config = GotifyConfig::default();
    let mut resolver = KeyResolver::new(&mut config);
    resolver.set("priority", "-0x10").unwrap();
    assert_eq!(resolver.get("priority").unwrap().as_deref(), Some("-16"));
    resolver.set("priority", "0b101").unwrap();
    assert_eq!(config.priority, 5);
}

#[test]
fn unknown_keys() {
    let mut config = NtfyConfig::default();
    let mut resolver = KeyResolver::new(&mut config);
    assert_eq!(resolver.get("foo").unwrap(), None);
    // Keys are case-sensitive.
    assert_eq!(resolver.get("Priority").unwrap(), None);

    let err = resolver.set("foo", "bar").unwrap_err();
    assert_matches!(err.kind(), ConfigErrorKind::UnsupportedKey);
    assert_eq!(err.key(), Some("foo"));
    assert!(err.field().is_none());
    assert_eq!(err.config().unwrap().ty.name_in_code(), "NtfyConfig");
    assert_eq!(err.to_string(), "unsupported key in `NtfyConfig` (key: `foo`)");
}

#[test]
fn invalid_values_leave_fields_unchanged() {
    let mut config = NtfyConfig::default();
    let mut resolver = KeyResolver::new(&mut config);
    resolver.set("prio", "low").unwrap();

    let err = resolver.set("prio", "Critical").unwrap_err();
    assert_matches!(
        err.kind(),
        ConfigErrorKind::Decode(ValueError::UnknownVariant { value, .. }) if value == "Critical"
    );
    assert_eq!(err.key(), Some("prio"));
    assert_eq!(err.field().unwrap().name, "priority");
    let message = err.to_string();
    assert!(message.contains("for field `NtfyConfig.priority`"), "{message}");
    assert!(message.contains("`Min`, `Low`, `Default`, `High`, `Max`"), "{message}");

    assert_eq!(config.priority, Priority::Low);
}

#[test]
fn listing_query_keys() {
    let mut config = NtfyConfig::default();
    let resolver = KeyResolver::new(&mut config);
    assert_eq!(
        resolver.query_keys(),
        ["cache", "disableTLS", "priority", "tags", "title"]
    );
    assert_eq!(resolver.metadata().ty.name_in_code(), "NtfyConfig");
}

#[test]
fn setting_defaults() {
    let mut config = NtfyConfig::default();
    KeyResolver::new(&mut config).set_defaults().unwrap();
    assert_eq!(config.host, "ntfy.sh");
    assert_eq!(config.priority, Priority::Default);
    assert!(config.cache);
    assert!(!config.disable_tls);
    assert!(config.tags.is_empty());
    // Fields without defaults are not touched.
    assert_eq!(config.topic, "");
}

#[test]
fn defaults_do_not_override_explicit_values() {
    let mut config = NtfyConfig::default();
    let mut resolver = KeyResolver::new(&mut config);
    resolver.set("cache", "no").unwrap();
    resolver.set("prio", "5").unwrap();
    resolver.set_defaults().unwrap();
    assert!(!resolver.config().cache);
    assert_eq!(resolver.config().priority, Priority::Max);
    assert_eq!(resolver.config().host, "ntfy.sh");

    let mut config = GotifyConfig::default();
    let mut resolver = KeyResolver::new(&mut config);
    resolver.set("insecure", "yes").unwrap();
    resolver.set_defaults().unwrap();
    assert!(config.disable_tls);
}

#[test]
fn applying_params() {
    let mut config = NtfyConfig::default();
    let mut resolver = KeyResolver::new(&mut config);
    let params = Params::from([("title", "Disk full"), ("prio", "4")]);
    resolver.apply_params(&params).unwrap();
    assert_eq!(config.title, "Disk full");
    assert_eq!(config.priority, Priority::High);
}

#[test]
fn params_preceding_failing_one_remain_applied() {
    let mut config = NtfyConfig::default();
    let mut resolver = KeyResolver::new(&mut config);
    let params = Params::from([("title", "Disk full"), ("unknown", "?")]);
    let err = resolver.apply_params(&params).unwrap_err();
    assert_eq!(err.key(), Some("unknown"));
    assert_eq!(config.title, "Disk full");
}

#[test]
fn updating_from_params_is_copy_on_write() {
    let mut config = GotifyConfig {
        host: "gotify.example.com".into(),
        token: "Aaa.bbb".into(),
        sent_count: 3,
        ..GotifyConfig::default()
    };
    let original = config.clone();
    let resolver = KeyResolver::new(&mut config);

    let mut params = Params::new();
    params.set("priority", "7");
    params.set_title("ignored");
    let err = resolver.update_from_params(&params).unwrap_err();
    assert_eq!(err.key(), Some("title"));

    params.remove(Params::TITLE);
    let params_copy = params.clone();
    let updated = resolver.update_from_params(&params).unwrap();
    assert_eq!(updated.priority, 7);
    assert_eq!(updated.host, "gotify.example.com");
    assert_eq!(updated.sent_count, 3);

    assert_eq!(config, original);
    assert_eq!(params, params_copy);
}

#[test]
fn params_basics() {
    let mut params: Params = [("b", "2"), ("a", "1")].into_iter().collect();
    assert_eq!(params.len(), 2);
    assert!(!params.is_empty());
    assert_eq!(params.title(), None);

    params.set_title("Hello");
    assert_eq!(params.title(), Some("Hello"));
    assert_eq!(params.get(Params::TITLE), Some("Hello"));
    assert_eq!(params.set("a", "3").as_deref(), Some("1"));

    let entries: Vec<_> = params.iter().collect();
    assert_eq!(entries, [("a", "3"), ("b", "2"), ("title", "Hello")]);

    assert_eq!(params.remove("b").as_deref(), Some("2"));
    assert_eq!(params.get("b"), None);
    assert!(Params::new().is_empty());
}

#[test]
fn secret_fields() {
    let mut config = MailConfig::default();
    let mut resolver = KeyResolver::new(&mut config);
    resolver.set("apiKey", "k3y").unwrap();
    resolver.set("to", "ops@example.com,dev@example.com").unwrap();
    resolver.set("auth", "CRAM-MD5").unwrap();
    assert_eq!(resolver.get("apiKey").unwrap().as_deref(), Some("k3y"));

    // Enum names are case-sensitive for this enum.
    let err = resolver.set("auth", "plain").unwrap_err();
    assert_matches!(
        err.kind(),
        ConfigErrorKind::Decode(ValueError::UnknownVariant { .. })
    );

    assert_eq!(config.api_key.expose_secret(), "k3y");
    assert_eq!(config.to_addresses, ["ops@example.com", "dev@example.com"]);
    assert_eq!(config.auth, AuthKind::CramMd5);
}

#[test]
fn resolver_debug_does_not_expose_config() {
    let mut config = MailConfig::default();
    let mut resolver = KeyResolver::new(&mut config);
    resolver.set("apiKey", "k3y").unwrap();
    let debug = format!("{resolver:?}");
    assert!(debug.contains("MailConfig"), "{debug}");
    assert!(!debug.contains("k3y"), "{debug}");
}

#[derive(Debug, DescribeConfig)]
#[config(crate = crate)]
struct ConfigWithSecretDefault {
    #[config(key = "apiKey", default = "d3fault-k3y")]
    api_key: SecretString,
    #[config(default = "public-label")]
    label: String,
}

#[traced_test]
#[test]
fn secret_values_are_not_logged() {
    let mut config = ConfigWithSecretDefault {
        api_key: String::new().into(),
        label: String::new(),
    };
    let mut resolver = KeyResolver::new(&mut config);
    resolver.set_defaults().unwrap();
    assert!(logs_contain("applied default value for secret field"));
    assert!(logs_contain("public-label"));
    assert!(!logs_contain("d3fault-k3y"));

    resolver.set("apiKey", "upd4ted-k3y").unwrap();
    assert!(logs_contain("set secret field"));
    assert!(!logs_contain("upd4ted-k3y"));
    assert_eq!(config.api_key.expose_secret(), "upd4ted-k3y");
}
