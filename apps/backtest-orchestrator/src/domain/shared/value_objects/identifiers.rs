//! Strongly-typed identifiers for domain entities.
//!
//! These prevent mixing up IDs from different contexts.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Generate a new unique identifier using UUID v4.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Get the inner string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id!(TaskId, "Unique identifier for a backtest task.");
define_id!(
    IndexCode,
    "Market index reference expanded into constituent symbols at execution time."
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_new_and_display() {
        let id = TaskId::new("task-123");
        assert_eq!(id.as_str(), "task-123");
        assert_eq!(format!("{id}"), "task-123");
    }

    #[test]
    fn task_id_generate_is_unique() {
        let id1 = TaskId::generate();
        let id2 = TaskId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn task_id_equality() {
        let id1 = TaskId::new("task-123");
        let id2 = TaskId::new("task-123");
        let id3 = TaskId::new("task-456");
        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn task_id_from_string() {
        let id: TaskId = "task-123".into();
        assert_eq!(id.as_str(), "task-123");

        let id: TaskId = String::from("task-456").into();
        assert_eq!(id.as_str(), "task-456");
    }

    #[test]
    fn index_code_new() {
        let idx = IndexCode::new("SHSE.000300");
        assert_eq!(idx.as_str(), "SHSE.000300");
    }

    #[test]
    fn serde_roundtrip() {
        let id = TaskId::new("task-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"task-123\"");

        let parsed: TaskId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn hash_works_for_collections() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(TaskId::new("task-1"));
        set.insert(TaskId::new("task-2"));
        set.insert(TaskId::new("task-1")); // duplicate

        assert_eq!(set.len(), 2);
    }
}
