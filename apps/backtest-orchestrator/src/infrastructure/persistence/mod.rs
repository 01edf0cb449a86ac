//! Persistence Adapters
//!
//! Implementations of the repository traits.

pub mod in_memory;

pub use in_memory::{InMemorySymbolResultRepository, InMemoryTaskRepository};

// Note: the database-backed adapter lands once the shared schema settles.
// The in-memory repositories carry the same CAS semantics in the meantime.
