//! Static index-membership universe.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::{UniverseError, UniversePort};
use crate::domain::shared::{IndexCode, Symbol};

/// Universe resolver backed by a fixed membership table.
///
/// Constituent lists are loaded once at startup and never change while the
/// process runs; index rebalancing means restarting with a new table.
#[derive(Debug, Clone, Default)]
pub struct StaticUniverse {
    indices: HashMap<IndexCode, Vec<Symbol>>,
}

impl StaticUniverse {
    /// Create an empty universe.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an index and its constituents.
    #[must_use]
    pub fn with_index(mut self, index: IndexCode, constituents: Vec<Symbol>) -> Self {
        self.indices.insert(index, constituents);
        self
    }

    /// Number of known indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Check whether no index is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[async_trait]
impl UniversePort for StaticUniverse {
    async fn index_constituents(&self, index: &IndexCode) -> Result<Vec<Symbol>, UniverseError> {
        let Some(constituents) = self.indices.get(index) else {
            return Err(UniverseError::UnknownIndex {
                index: index.clone(),
            });
        };
        debug!(index = %index, count = constituents.len(), "resolved index constituents");
        Ok(constituents.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csi300_sample() -> StaticUniverse {
        StaticUniverse::new().with_index(
            IndexCode::new("SHSE.000300"),
            vec![
                Symbol::new("SHSE.600000"),
                Symbol::new("SHSE.600036"),
                Symbol::new("SZSE.000001"),
            ],
        )
    }

    #[tokio::test]
    async fn resolves_known_index() {
        let universe = csi300_sample();
        let constituents = universe
            .index_constituents(&IndexCode::new("SHSE.000300"))
            .await
            .unwrap();
        assert_eq!(constituents.len(), 3);
        assert_eq!(constituents[0].as_str(), "SHSE.600000");
    }

    #[tokio::test]
    async fn unknown_index_is_an_error() {
        let universe = csi300_sample();
        let result = universe
            .index_constituents(&IndexCode::new("SHSE.000905"))
            .await;
        assert!(matches!(result, Err(UniverseError::UnknownIndex { .. })));
    }

    #[test]
    fn empty_by_default() {
        let universe = StaticUniverse::new();
        assert!(universe.is_empty());
        assert_eq!(universe.len(), 0);
    }
}
