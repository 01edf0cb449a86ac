//! Universe Adapters
//!
//! Implementations of `UniversePort` for resolving index constituents.

pub mod static_universe;

pub use static_universe::StaticUniverse;
