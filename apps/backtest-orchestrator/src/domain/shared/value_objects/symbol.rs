//! Symbol value object for instrument identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::task::errors::TaskError;

/// An exchange-qualified instrument identifier.
///
/// Examples:
/// - A-share: "SHSE.600000", "SZSE.300750"
/// - Index: "SHSE.000300"
/// - Bare ticker: "AAPL"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol.
    ///
    /// The symbol is normalized to uppercase.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().to_uppercase())
    }

    /// Get the symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Exchange prefix for qualified symbols ("SHSE.600000" -> "SHSE").
    #[must_use]
    pub fn exchange(&self) -> Option<&str> {
        self.0.split_once('.').map(|(exchange, _)| exchange)
    }

    /// Instrument code without the exchange prefix.
    #[must_use]
    pub fn code(&self) -> &str {
        self.0
            .split_once('.')
            .map_or(self.0.as_str(), |(_, code)| code)
    }

    /// Validate the symbol for job construction.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is empty, too long, or contains
    /// characters outside `[A-Z0-9.]` (at most one separator dot).
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.0.is_empty() {
            return Err(TaskError::InvalidSymbol {
                value: self.0.clone(),
                message: "symbol cannot be empty".to_string(),
            });
        }

        if self.0.len() > 32 {
            return Err(TaskError::InvalidSymbol {
                value: self.0.clone(),
                message: "symbol exceeds maximum length".to_string(),
            });
        }

        if !self.0.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
            return Err(TaskError::InvalidSymbol {
                value: self.0.clone(),
                message: "symbol contains invalid characters".to_string(),
            });
        }

        let dots = self.0.chars().filter(|&c| c == '.').count();
        if dots > 1 || self.0.starts_with('.') || self.0.ends_with('.') {
            return Err(TaskError::InvalidSymbol {
                value: self.0.clone(),
                message: "malformed exchange qualifier".to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_new_normalizes_case() {
        let s = Symbol::new("shse.600000");
        assert_eq!(s.as_str(), "SHSE.600000");
    }

    #[test]
    fn symbol_display() {
        let s = Symbol::new("SZSE.300750");
        assert_eq!(format!("{s}"), "SZSE.300750");
    }

    #[test]
    fn symbol_exchange_and_code() {
        let s = Symbol::new("SHSE.600000");
        assert_eq!(s.exchange(), Some("SHSE"));
        assert_eq!(s.code(), "600000");
    }

    #[test]
    fn bare_ticker_has_no_exchange() {
        let s = Symbol::new("AAPL");
        assert_eq!(s.exchange(), None);
        assert_eq!(s.code(), "AAPL");
    }

    #[test]
    fn symbol_validate_empty() {
        assert!(Symbol::new("").validate().is_err());
    }

    #[test]
    fn symbol_validate_too_long() {
        assert!(Symbol::new("A".repeat(40)).validate().is_err());
    }

    #[test]
    fn symbol_validate_invalid_chars() {
        assert!(Symbol::new("SHSE 600000").validate().is_err());
        assert!(Symbol::new("SHSE!600000").validate().is_err());
    }

    #[test]
    fn symbol_validate_malformed_qualifier() {
        assert!(Symbol::new(".600000").validate().is_err());
        assert!(Symbol::new("SHSE.").validate().is_err());
        assert!(Symbol::new("A.B.C").validate().is_err());
    }

    #[test]
    fn symbol_validate_valid() {
        assert!(Symbol::new("SHSE.600000").validate().is_ok());
        assert!(Symbol::new("AAPL").validate().is_ok());
    }

    #[test]
    fn symbol_from_conversions() {
        let s1: Symbol = "SHSE.600000".into();
        assert_eq!(s1.as_str(), "SHSE.600000");

        let s2: Symbol = String::from("szse.000001").into();
        assert_eq!(s2.as_str(), "SZSE.000001");
    }

    #[test]
    fn symbol_serde_roundtrip() {
        let s = Symbol::new("SHSE.600000");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"SHSE.600000\"");

        let parsed: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, s);
    }

    #[test]
    fn symbol_hash_works() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Symbol::new("SHSE.600000"));
        set.insert(Symbol::new("SZSE.300750"));
        set.insert(Symbol::new("shse.600000")); // same as first after normalization

        assert_eq!(set.len(), 2);
    }
}
