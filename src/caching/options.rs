//! Cache-Control directives (RFC 9111 section 5.2.2).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Who may store the response.
///
/// `public` and `private` are recognised case-insensitively; any other token
/// (e.g. an extension directive) is emitted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Access {
    Public,
    Private,
    Custom(String),
}

impl Access {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Custom(token) => token,
        }
    }
}

impl From<String> for Access {
    fn from(token: String) -> Self {
        let token = token.trim();
        if token.eq_ignore_ascii_case("public") {
            Self::Public
        } else if token.eq_ignore_ascii_case("private") {
            Self::Private
        } else {
            Self::Custom(token.to_string())
        }
    }
}

impl From<&str> for Access {
    fn from(token: &str) -> Self {
        Self::from(token.to_string())
    }
}

impl From<Access> for String {
    fn from(access: Access) -> Self {
        access.as_str().to_string()
    }
}

/// Cache-Control directive values. Zero durations and `false` flags are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub access: Option<Access>,
    pub max_age: Duration,
    pub s_max_age: Duration,
    pub no_cache: bool,
    pub no_store: bool,
    pub must_revalidate: bool,
    pub proxy_revalidate: bool,
    pub must_understand: bool,
    pub no_transform: bool,
    pub immutable: bool,
}

/// Seconds of `d`, rounded half away from zero.
fn rounded_secs(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() >= 500_000_000 {
        secs + 1
    } else {
        secs
    }
}

impl Options {
    /// Render the directives in their fixed order, separated by `", "`.
    ///
    /// Returns an empty string when nothing is set.
    pub fn build_header_value(&self) -> String {
        let mut directives: Vec<String> = Vec::new();

        if let Some(access) = self.access.as_ref().filter(|a| !a.as_str().is_empty()) {
            directives.push(access.as_str().to_string());
        }
        if !self.max_age.is_zero() {
            directives.push(format!("max-age={}", rounded_secs(self.max_age)));
        }
        if !self.s_max_age.is_zero() {
            directives.push(format!("s-max-age={}", rounded_secs(self.s_max_age)));
        }

        let flags = [
            (self.no_cache, "no-cache"),
            (self.no_store, "no-store"),
            (self.must_revalidate, "must-revalidate"),
            (self.proxy_revalidate, "proxy-revalidate"),
            (self.must_understand, "must-understand"),
            (self.no_transform, "no-transform"),
            (self.immutable, "immutable"),
        ];
        directives.extend(
            flags
                .into_iter()
                .filter(|(set, _)| *set)
                .map(|(_, token)| token.to_string()),
        );

        directives.join(", ")
    }

    pub fn public(max_age: Duration) -> Self {
        Self {
            access: Some(Access::Public),
            max_age,
            ..Self::default()
        }
    }

    pub fn private(max_age: Duration) -> Self {
        Self {
            access: Some(Access::Private),
            max_age,
            ..Self::default()
        }
    }

    pub fn no_cache() -> Self {
        Self {
            no_cache: true,
            ..Self::default()
        }
    }

    pub fn no_store() -> Self {
        Self {
            no_store: true,
            ..Self::default()
        }
    }
}
