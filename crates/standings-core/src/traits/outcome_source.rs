// # Outcome Source Trait
//
// Defines the interface to the external match-lifecycle collaborator: the
// component that decides when a fixture is final and emits exactly one
// MatchOutcome for it.
//
// ## Responsibility boundary
//
// Sources observe and deliver; they make no standings decisions. Whether an
// outcome is valid for ingestion (known league, sane teams) is the engine's
// call. Deduplication of repeated delivery is the collaborator's obligation,
// not this trait's.
//
// ## Implementations
//
// - JSON-lines file feed: `standings-source-jsonl` crate
// - In-process channels: test doubles and embedded usage
//
// ## Usage
//
// ```rust,ignore
// use standings_core::OutcomeSource;
// use tokio_stream::StreamExt;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* OutcomeSource implementation */;
//
//     // Everything already finalized
//     let backlog = source.backlog().await?;
//
//     // Newly finalized outcomes as they arrive
//     let mut stream = source.watch();
//     while let Some(outcome) = stream.next().await {
//         println!("final: {} {}-{} {}", outcome.home_team,
//                  outcome.home_goals, outcome.away_goals, outcome.away_team);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::pin::Pin;
use tokio_stream::Stream;

use crate::model::MatchOutcome;

/// Trait for outcome source implementations
///
/// This trait defines two core capabilities:
/// 1. **backlog()**: Fetch all already-finalized outcomes
/// 2. **watch()**: Stream of newly finalized outcomes
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait OutcomeSource: Send + Sync {
    /// Get every outcome finalized so far
    ///
    /// Used to seed standings at startup. Outcomes should be returned in
    /// the order they were finalized; consumers that need strict date order
    /// sort before replaying.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<MatchOutcome>)`: The finalized history (possibly empty)
    /// - `Err(Error)`: If the feed cannot be read
    async fn backlog(&self) -> Result<Vec<MatchOutcome>, crate::Error>;

    /// Watch for newly finalized outcomes
    ///
    /// Returns a stream that yields a `MatchOutcome` each time a fixture
    /// completes. The stream should run indefinitely and never terminate
    /// under normal conditions, and must be cancellation-safe (dropping
    /// the stream cleans up resources).
    fn watch(&self) -> Pin<Box<dyn Stream<Item = MatchOutcome> + Send + 'static>>;
}

/// Helper trait for constructing outcome sources from configuration
pub trait OutcomeSourceFactory: Send + Sync {
    /// Create an OutcomeSource instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this source type
    ///
    /// # Returns
    ///
    /// A boxed OutcomeSource trait object
    fn create(
        &self,
        config: &crate::config::OutcomeSourceConfig,
    ) -> Result<Box<dyn OutcomeSource>, crate::Error>;
}
