// # standings-core
//
// Core library for the league standings engine.
//
// ## Architecture Overview
//
// This library maintains per-(league, team) aggregate statistics, kept
// consistent as finalized match results arrive, and exposes them as ranked
// tables and derived read views:
//
// - **OutcomeSource**: Trait for feeds of finalized match results
// - **StandingsStore**: Trait for the transactional row repository
// - **StandingsEngine**: Incremental ingestion plus full recalculation,
//   both driven by one shared per-match fold
// - **StandingsQueries**: Ranked tables, top scorers/defenses, home/away
//   splits, form table, league summary
// - **ComponentRegistry**: Plugin-based registry for sources and stores
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Event-Driven**: Uses async streams for result ingestion
// 3. **Single Fold**: Incremental and full-recompute paths share one pure
//    per-match function, making their equivalence structural
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Row-Scoped Writes**: Records mutate inside the store, atomically per
//    match; callers never read-modify-write

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod query;
pub mod ranking;
pub mod registry;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{LeagueConfig, OutcomeSourceConfig, StandingsConfig, StoreConfig};
pub use engine::{EngineEvent, StandingsEngine};
pub use error::{Error, Result};
pub use model::{MatchOutcome, StandingsRecord, TeamResult, Venue, fold_outcome};
pub use query::{HomeAwaySplit, LeagueSummary, StandingsQueries};
pub use ranking::TableEntry;
pub use registry::ComponentRegistry;
pub use store::{FileStandingsStore, MemoryStandingsStore};
pub use traits::{OutcomeSource, StandingsStore};
