// # Standings Store Implementations
//
// This module provides implementations of the StandingsStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::{FileStandingsStore, FileStandingsStoreFactory};
pub use memory::{MemoryStandingsStore, MemoryStandingsStoreFactory};
