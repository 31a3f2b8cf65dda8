//! Secret handling for credentials in configuration
//!
//! Connection strings carry passwords. They are held in a `secrecy::Secret`
//! so memory is zeroed on drop, `Debug` output is redacted, and the raw value
//! is only reachable through `expose_secret()`.
//!
//! # Example
//!
//! ```rust
//! use entsoe_etl::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let dsn = secret_string("postgresql://etl:hunter2@db:5432/energy".to_string());
//! assert!(dsn.expose_secret().as_ref().starts_with("postgresql://"));
//! assert!(!format!("{dsn:?}").contains("hunter2"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Placeholder written wherever a secret would otherwise be printed
pub const REDACTED: &str = "[REDACTED]";

/// String payload of a [`SecretString`]
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    /// Connection URL with the user-info part masked
    ///
    /// `postgresql://etl:pw@db:5432/energy` becomes `postgresql://***@db:5432/energy`.
    pub fn redacted_url(&self) -> String {
        let (scheme, rest) = match self.0.split_once("://") {
            Some((scheme, rest)) => (scheme, rest),
            None => return REDACTED.to_string(),
        };
        match rest.rsplit_once('@') {
            Some((_, host)) => format!("{scheme}://***@{host}"),
            None => format!("{scheme}://{rest}"),
        }
    }
}

/// Serializes as a placeholder so configuration dumps never carry credentials
impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(REDACTED)
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

/// Type alias for a secret string
pub type SecretString = Secret<SecretValue>;

/// Wraps a plain string as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_string_creation() {
        let secret = secret_string("postgresql://u:p@h/db".to_string());
        assert_eq!(secret.expose_secret(), "postgresql://u:p@h/db");
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("sensitive-data".to_string());
        let debug_output = format!("{secret:?}");
        assert!(!debug_output.contains("sensitive-data"));
    }

    #[test]
    fn test_redacted_url_masks_credentials() {
        let secret = secret_string("postgresql://etl:p@ss@db.local:5432/energy".to_string());
        assert_eq!(
            secret.expose_secret().redacted_url(),
            "postgresql://***@db.local:5432/energy"
        );

        let bare = secret_string("postgres://db.local/energy".to_string());
        assert_eq!(
            bare.expose_secret().redacted_url(),
            "postgres://db.local/energy"
        );

        let garbage = secret_string("not a url".to_string());
        assert_eq!(garbage.expose_secret().redacted_url(), REDACTED);
    }

    #[test]
    fn test_secret_serializes_redacted() {
        #[derive(Serialize, Deserialize)]
        struct Holder {
            dsn: SecretString,
        }

        let parsed: Holder = serde_json::from_str(r#"{"dsn":"postgresql://u:pw@h/db"}"#).unwrap();
        assert_eq!(parsed.dsn.expose_secret(), "postgresql://u:pw@h/db");

        let json = serde_json::to_string(&parsed).unwrap();
        assert!(!json.contains("pw"));
        assert!(json.contains(REDACTED));
    }
}
