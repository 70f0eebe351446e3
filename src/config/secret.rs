//! Credential wrappers for backend keys and session tokens
//!
//! API keys and access tokens are held in [`secrecy::Secret`] so they are
//! zeroized on drop and never printed by `Debug`. Call
//! [`ExposeSecret::expose_secret`](secrecy::ExposeSecret) at the point where
//! a header is built, and nowhere else.
//!
//! ```rust
//! use ferry::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let key = secret_string("service-role-key");
//! assert_eq!(key.expose_secret().as_str(), "service-role-key");
//! assert!(!format!("{key:?}").contains("service-role-key"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret};
use serde::{Deserialize, Deserializer};
use zeroize::Zeroize;

/// String credential that zeroizes its buffer on drop
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}

impl SecretValue {
    /// Borrow the credential text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the credential is empty
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        SecretValue(value)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Secret credential as stored in configuration
pub type SecretString = Secret<SecretValue>;

/// Wrap a plain string into a [`SecretString`]
pub fn secret_string(value: impl Into<String>) -> SecretString {
    Secret::new(SecretValue::from(value.into()))
}
