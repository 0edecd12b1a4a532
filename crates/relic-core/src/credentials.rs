//! Caller identity: consumer-key parsing and the credentials forwarded upstream.
//!
//! Consumer keys look like `<digits>-<opaque>`. The leading integer is the
//! API consumer id. Malformed keys never fail a request; they just make the
//! caller anonymous for the purpose of response shaping.

use std::sync::LazyLock;

use regex::Regex;

static CONSUMER_KEY_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)-").unwrap());

/// Extract the numeric consumer id from the start of a consumer key.
pub fn api_id(consumer_key: &str) -> Option<u32> {
    CONSUMER_KEY_ID
        .captures(consumer_key)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Whether the consumer id belongs to a browser extension.
pub fn is_extension(api_id: Option<u32>, extension_ids: &[u32]) -> bool {
    api_id.is_some_and(|id| extension_ids.contains(&id))
}

/// Headers copied from the inbound request onto every upstream call.
pub const FORWARDED_HEADERS: &[&str] = &[
    "user-agent",
    "x-forwarded-for",
    "origin",
    "referer",
    "accept-language",
];

/// Everything about the caller that upstream calls need.
///
/// The proxy does not authenticate; it passes these through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Caller {
    pub consumer_key: String,
    pub access_token: Option<String>,
    pub guid: Option<String>,
    pub locale: Option<String>,
    pub api_id: Option<u32>,
    pub is_extension: bool,
    /// Lower-cased header name → value, restricted to [`FORWARDED_HEADERS`].
    pub forwarded: Vec<(String, String)>,
}

impl Caller {
    pub fn new(consumer_key: impl Into<String>, extension_ids: &[u32]) -> Self {
        let consumer_key = consumer_key.into();
        let api_id = api_id(&consumer_key);
        Self {
            is_extension: is_extension(api_id, extension_ids),
            api_id,
            consumer_key,
            ..Default::default()
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Keep only the headers in [`FORWARDED_HEADERS`].
    pub fn with_forwarded<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.forwarded = headers
            .into_iter()
            .filter_map(|(k, v)| {
                let name = k.as_ref().to_ascii_lowercase();
                FORWARDED_HEADERS
                    .contains(&name.as_str())
                    .then(|| (name, v.into()))
            })
            .collect();
        self
    }

    /// Query parameters carrying the caller credentials upstream.
    pub fn credential_params(&self) -> Vec<(&'static str, &str)> {
        let mut params = vec![("consumer_key", self.consumer_key.as_str())];
        if let Some(ref token) = self.access_token {
            params.push(("access_token", token.as_str()));
        }
        if let Some(ref guid) = self.guid {
            params.push(("guid", guid.as_str()));
        }
        if let Some(ref locale) = self.locale {
            params.push(("locale_lang", locale.as_str()));
        }
        params
    }
}
