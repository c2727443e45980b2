use std::fmt;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;

pub const DEFAULT_USERNAME: &str = "admin";

/// Insecure fallback password. Servers running with it log a warning at startup.
pub const DEFAULT_PASSWORD: &str = "change-me-now";

/// Value of the `WWW-Authenticate` header sent with every rejection.
pub const BASIC_CHALLENGE: &str = "Basic realm=\"Admin Area\"";

/// A username/password pair, either configured or presented by a client.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse an `Authorization: Basic <base64(user:pass)>` header value.
    /// The password may itself contain `:`.
    pub fn from_basic_header(header_value: &str) -> Option<Self> {
        let (scheme, encoded) = header_value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = BASE64_STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some(Self::new(username, password))
    }

    /// Render as an `Authorization` header value.
    pub fn to_basic_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", BASE64_STANDARD.encode(raw))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Guard for administrative operations.
///
/// Holds the configured credential pair and checks every request on its own;
/// there is no session state.
#[derive(Debug, Clone)]
pub struct AuthGate {
    expected: Credentials,
}

impl AuthGate {
    pub fn new(expected: Credentials) -> Self {
        Self { expected }
    }

    pub fn username(&self) -> &str {
        &self.expected.username
    }

    pub fn uses_default_password(&self) -> bool {
        self.expected.password == DEFAULT_PASSWORD
    }

    /// Allow iff both username and password match byte-for-byte.
    pub fn authorize(&self, presented: Option<&Credentials>) -> Decision {
        let Some(presented) = presented else {
            return Decision::Deny;
        };
        let user_ok = constant_time_eq(
            presented.username.as_bytes(),
            self.expected.username.as_bytes(),
        );
        let pass_ok = constant_time_eq(
            presented.password.as_bytes(),
            self.expected.password.as_bytes(),
        );
        if user_ok & pass_ok {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    /// Authorize a raw `Authorization` header value. Missing, malformed and
    /// mismatching headers are all denied the same way.
    pub fn authorize_header(&self, header_value: Option<&str>) -> Decision {
        let presented = header_value.and_then(Credentials::from_basic_header);
        self.authorize(presented.as_ref())
    }
}

/// Compare without returning early on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
