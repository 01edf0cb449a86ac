//! Universe Port (Driven Port)
//!
//! Interface for resolving an index reference into its constituent symbols.
//! Resolution happens once per task run, at runner entry; the resolved list
//! is persisted back so later reads see a stable universe.

use async_trait::async_trait;

use crate::domain::shared::{IndexCode, Symbol};

/// Universe resolution error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    /// The index is not known to the universe source.
    #[error("unknown index: {index}")]
    UnknownIndex {
        /// The index that failed to resolve.
        index: IndexCode,
    },

    /// Backend failure while resolving.
    #[error("universe backend error: {message}")]
    Backend {
        /// Source-specific description.
        message: String,
    },
}

/// Port for index-to-constituents resolution.
#[async_trait]
pub trait UniversePort: Send + Sync {
    /// Resolve an index into its current constituent symbols.
    ///
    /// # Errors
    ///
    /// Returns [`UniverseError::UnknownIndex`] when the index does not exist.
    async fn index_constituents(&self, index: &IndexCode) -> Result<Vec<Symbol>, UniverseError>;
}
