//! Test-only functionality shared among multiple test modules.

use std::collections::{BTreeMap, HashMap};

use anyhow::Context as _;
use secrecy::SecretString;

use crate::{DescribeConfig, EnumValue, value::ConfigProp};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumValue)]
#[config(crate = crate)]
pub(crate) enum Priority {
    #[config(alias = "1")]
    Min,
    #[config(alias = "2")]
    Low,
    #[default]
    #[config(alias = "3")]
    Default,
    #[config(alias = "4")]
    High,
    #[config(alias = "5", alias = "urgent")]
    Max,
}

/// Push notifications via a topic on an ntfy-like server.
#[derive(Debug, Clone, Default, PartialEq, DescribeConfig)]
#[config(crate = crate, scheme = "ntfy")]
pub(crate) struct NtfyConfig {
    /// Username for authentication.
    #[config(url = "user")]
    pub username: String,
    /// Password for authentication.
    #[config(url = "pass")]
    pub password: String,
    /// Server host.
    #[config(url = "host", default = "ntfy.sh")]
    pub host: String,
    /// Target topic.
    #[config(url = "path", required)]
    pub topic: String,
    /// Message title.
    #[config(default = "")]
    pub title: String,
    /// Message priority.
    #[config(alias = "prio", default = "Default")]
    pub priority: Priority,
    /// Message tags.
    #[config(default = "")]
    pub tags: Vec<String>,
    #[config(default = "yes")]
    pub cache: bool,
    #[config(key = "disableTLS", default = "No")]
    pub disable_tls: bool,
}

impl NtfyConfig {
    pub(crate) fn sample() -> Self {
        Self {
            username: "admin".into(),
            password: "p@ss word".into(),
            host: "push.example.com".into(),
            topic: "alerts".into(),
            title: "Disk full".into(),
            priority: Priority::High,
            tags: vec!["warning".into(), "skull".into()],
            cache: false,
            disable_tls: true,
        }
    }
}

/// Messages to a Gotify-like server.
#[derive(Debug, Clone, Default, PartialEq, DescribeConfig)]
#[config(crate = crate, scheme = "gotify")]
pub(crate) struct GotifyConfig {
    /// Server host, optionally with a port.
    #[config(url = "host", required)]
    pub host: String,
    /// Application token.
    #[config(url = "path", required)]
    pub token: String,
    /// Message priority.
    #[config(default = "0")]
    pub priority: i8,
    #[config(key = "disableTLS", alias = "insecure", default = "No")]
    pub disable_tls: bool,
    #[config(skip)]
    pub sent_count: u32,
}

/// Webhook token in the `{id}/{secret}` format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct WebhookToken {
    pub id: u64,
    pub secret: String,
}

impl WebhookToken {
    pub(crate) fn new(id: u64, secret: &str) -> Self {
        Self {
            id,
            secret: secret.to_owned(),
        }
    }
}

impl ConfigProp for WebhookToken {
    fn import_from_text(text: &str) -> anyhow::Result<Self> {
        let (id, secret) = text.split_once('/').context("token must contain '/'")?;
        Ok(Self {
            id: id.parse().context("invalid webhook ID")?,
            secret: secret.to_owned(),
        })
    }

    fn export_to_text(&self) -> anyhow::Result<String> {
        anyhow::ensure!(!self.secret.contains('/'), "webhook secret cannot contain '/'");
        Ok(format!("{}/{}", self.id, self.secret))
    }
}

/// Generic webhook with composite tokens and collections.
#[derive(Debug, Clone, Default, PartialEq, DescribeConfig)]
#[config(crate = crate, scheme = "hook")]
pub(crate) struct HookConfig {
    #[config(url = "host", required)]
    pub host: String,
    #[config(url = "port")]
    pub port: u16,
    #[config(url = "path1")]
    pub channel: String,
    #[config(url = "path2")]
    pub thread: String,
    /// Webhook token.
    #[config(required)]
    pub token: WebhookToken,
    /// Extra HTTP headers.
    #[config(default = "")]
    pub headers: BTreeMap<String, String>,
    #[config(key = "limits", default = "")]
    pub rate_limits: HashMap<String, u32>,
    #[config(key = "retry", default = "3,10")]
    pub retry_delays: [u16; 2],
    #[config(key = "fallback", sep = ';', default = "")]
    pub fallback_tokens: Vec<WebhookToken>,
}

impl HookConfig {
    pub(crate) fn sample() -> Self {
        Self {
            host: "hooks.example.com".into(),
            port: 8443,
            channel: "ops".into(),
            thread: "42".into(),
            token: WebhookToken::new(123, "s3cr3t"),
            headers: BTreeMap::from([
                ("Accept".to_owned(), "text/plain".to_owned()),
                ("X-Origin".to_owned(), "monitor:eu-1".to_owned()),
            ]),
            rate_limits: HashMap::from([("burst".to_owned(), 10), ("daily".to_owned(), 1_000)]),
            retry_delays: [5, 60],
            fallback_tokens: vec![WebhookToken::new(1, "a"), WebhookToken::new(2, "b,c")],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumValue)]
#[config(crate = crate, case_sensitive)]
pub(crate) enum AuthKind {
    None,
    #[default]
    Plain,
    #[config(rename = "CRAM-MD5")]
    CramMd5,
}

/// E-mail delivery via SMTP; contains secrets.
#[derive(Debug, DescribeConfig)]
#[config(crate = crate, scheme = "smtp")]
pub(crate) struct MailConfig {
    #[config(url = "user")]
    pub username: String,
    #[config(url = "password")]
    pub password: SecretString,
    #[config(url = "host", required)]
    pub host: String,
    #[config(url = "port", default = "25")]
    pub port: u16,
    /// Sender address.
    #[config(key = "fromAddress", alias = "from")]
    pub from_address: String,
    /// Recipient addresses.
    #[config(key = "toAddresses", alias = "to", required)]
    pub to_addresses: Vec<String>,
    #[config(default = "Plain")]
    pub auth: AuthKind,
    #[config(key = "apiKey")]
    pub api_key: SecretString,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new().into(),
            host: String::new(),
            port: 0,
            from_address: String::new(),
            to_addresses: vec![],
            auth: AuthKind::default(),
            api_key: String::new().into(),
        }
    }
}
