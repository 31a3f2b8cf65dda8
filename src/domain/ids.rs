//! Domain identifier types with validation
//!
//! Newtype wrappers for the codes that flow through the pipeline. Codes are
//! normalized on construction so that joins never depend on input casing or
//! stray whitespace.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Country code newtype wrapper
///
/// Usually an ISO 3166 alpha-2 code (`FR`, `DE`), but compound market codes such
/// as `DE_LU` are accepted. Stored upper case.
///
/// # Examples
///
/// ```
/// use entsoe_etl::domain::ids::CountryCode;
/// use std::str::FromStr;
///
/// let code = CountryCode::from_str(" fr ").unwrap();
/// assert_eq!(code.as_str(), "FR");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Creates a new CountryCode, normalizing to upper case
    pub fn new(code: impl Into<String>) -> Result<Self, String> {
        let code = code.into().trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err("Country code cannot be empty".to_string());
        }
        if code.len() > 8 {
            return Err(format!("Country code too long: {code}"));
        }
        if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(format!("Invalid country code: {code}"));
        }
        Ok(Self(code))
    }

    /// Returns the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Bidding zone identifier (EIC code such as `10YFR-RTE------C`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BiddingZone(String);

impl BiddingZone {
    /// Creates a new BiddingZone from an mRID string
    pub fn new(zone: impl Into<String>) -> Result<Self, String> {
        let zone = zone.into().trim().to_string();
        if zone.is_empty() {
            return Err("Bidding zone cannot be empty".to_string());
        }
        if zone.len() > 32 || zone.chars().any(char::is_whitespace) {
            return Err(format!("Invalid bidding zone: {zone}"));
        }
        Ok(Self(zone))
    }

    /// Returns the zone as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Production-type (PSR) code, e.g. `B16` for solar
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PsrType(String);

impl PsrType {
    /// Creates a new PsrType, normalizing to upper case
    pub fn new(code: impl Into<String>) -> Result<Self, String> {
        let code = code.into().trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err("PSR type cannot be empty".to_string());
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!("Invalid PSR type: {code}"));
        }
        Ok(Self(code))
    }

    /// Returns the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_newtype_impls {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_newtype_impls!(CountryCode);
string_newtype_impls!(BiddingZone);
string_newtype_impls!(PsrType);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_code_normalizes() {
        let code = CountryCode::new("de_lu").unwrap();
        assert_eq!(code.as_str(), "DE_LU");
        assert_eq!(code.to_string(), "DE_LU");
    }

    #[test]
    fn test_country_code_rejects_garbage() {
        assert!(CountryCode::new("").is_err());
        assert!(CountryCode::new("   ").is_err());
        assert!(CountryCode::new("F R").is_err());
        assert!(CountryCode::new("FRANCEFRANCE").is_err());
    }

    #[test]
    fn test_bidding_zone_keeps_dashes() {
        let zone = BiddingZone::new("10YFR-RTE------C").unwrap();
        assert_eq!(zone.as_str(), "10YFR-RTE------C");
        assert!(BiddingZone::new("10Y FR").is_err());
    }

    #[test]
    fn test_psr_type_uppercases() {
        assert_eq!(PsrType::new("b16").unwrap().as_str(), "B16");
        assert!(PsrType::new("B-16").is_err());
    }

    #[test]
    fn test_serde_validates_on_deserialize() {
        let ok: CountryCode = serde_json::from_str("\"fr\"").unwrap();
        assert_eq!(ok.as_str(), "FR");
        assert!(serde_json::from_str::<CountryCode>("\"\"").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"FR\"");
    }
}
