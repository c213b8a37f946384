// # JSON-Lines Outcome Source
//
// This crate provides a file-based outcome source for the standings system.
//
// ## Purpose
//
// Stands in for the external match-lifecycle collaborator: whatever system
// decides a fixture is final appends one JSON object per completed match to
// a feed file, and this source delivers those records to the engine.
//
// ## Feed Format
//
// One JSON object per line, append-only:
//
// ```json
// {"league_id":"premier-league","home_team":"Alpha","away_team":"Beta",
//  "home_goals":2,"away_goals":1,"date":"2025-03-01T15:00:00Z"}
// ```
//
// ## Behavior
//
// - `backlog()` parses everything up to the last complete line and
//   remembers the consumed byte offset
// - `watch()` polls the file at a configurable interval and yields outcomes
//   appended after the offset; a partial trailing line (no newline yet)
//   stays pending until its newline arrives
// - Malformed or invalid lines are logged and skipped; one bad record never
//   stalls the feed
// - A shrinking file is treated as rotation and re-read from the start

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::Mutex;
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;

use standings_core::ComponentRegistry;
use standings_core::config::OutcomeSourceConfig;
use standings_core::traits::{OutcomeSource, OutcomeSourceFactory};
use standings_core::{Error, MatchOutcome, Result};

/// Default polling interval for the feed file
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// One line of the feed, before validation
///
/// Goal counts are read as `i64` so a negative count is rejected by
/// [`MatchOutcome::new`] instead of failing opaquely at deserialization.
#[derive(Debug, Deserialize)]
struct RawOutcome {
    league_id: String,
    home_team: String,
    away_team: String,
    home_goals: i64,
    away_goals: i64,
    date: DateTime<Utc>,
}

impl RawOutcome {
    fn validate(self) -> Result<MatchOutcome> {
        MatchOutcome::new(
            self.league_id,
            self.home_team,
            self.away_team,
            self.home_goals,
            self.away_goals,
            self.date,
        )
    }
}

/// Parse a chunk of feed text into outcomes
///
/// Only complete lines (terminated by `\n`) are consumed. Returns the
/// parsed outcomes and the number of bytes consumed; the caller keeps any
/// unconsumed tail for the next read.
fn parse_feed_chunk(chunk: &str) -> (Vec<MatchOutcome>, usize) {
    let consumed = match chunk.rfind('\n') {
        Some(idx) => idx + 1,
        None => return (Vec::new(), 0),
    };

    let mut outcomes = Vec::new();
    for line in chunk[..consumed].lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawOutcome>(line) {
            Ok(raw) => match raw.validate() {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::warn!("Skipping invalid feed record: {}", e);
                }
            },
            Err(e) => {
                tracing::warn!("Skipping malformed feed line: {}", e);
            }
        }
    }

    (outcomes, consumed)
}

/// JSON-lines file outcome source
pub struct JsonlOutcomeSource {
    /// Path to the feed file
    path: PathBuf,

    /// Polling interval
    poll_interval: Duration,

    /// Byte offset of the first unconsumed feed byte
    consumed: Arc<Mutex<u64>>,
}

impl JsonlOutcomeSource {
    /// Create a new JSONL outcome source
    ///
    /// # Parameters
    ///
    /// - `path`: Path to the feed file (may not exist yet)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_interval(path, Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS))
    }

    /// Create with a custom polling interval
    pub fn with_interval(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            path: path.into(),
            poll_interval,
            consumed: Arc::new(Mutex::new(0)),
        }
    }
}

#[async_trait::async_trait]
impl OutcomeSource for JsonlOutcomeSource {
    async fn backlog(&self) -> Result<Vec<MatchOutcome>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Feed file {} does not exist yet", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(Error::source(format!(
                    "Failed to read feed file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let (outcomes, consumed) = parse_feed_chunk(&content);
        *self.consumed.lock().await = consumed as u64;

        tracing::debug!(
            "Read {} backlog outcome(s) from {}",
            outcomes.len(),
            self.path.display()
        );
        Ok(outcomes)
    }

    fn watch(&self) -> std::pin::Pin<Box<dyn Stream<Item = MatchOutcome> + Send + 'static>> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        let path = self.path.clone();
        let poll_interval = self.poll_interval;
        let consumed = Arc::clone(&self.consumed);

        tokio::spawn(async move {
            tracing::info!(
                "Watching result feed {} (interval={:?})",
                path.display(),
                poll_interval
            );

            loop {
                tokio::time::sleep(poll_interval).await;

                let file_len = match tokio::fs::metadata(&path).await {
                    Ok(meta) => meta.len(),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(e) => {
                        tracing::warn!("Failed to stat feed file: {}", e);
                        continue;
                    }
                };

                let mut offset = consumed.lock().await;

                if file_len < *offset {
                    tracing::warn!(
                        "Feed file shrank ({} -> {} bytes), assuming rotation",
                        *offset,
                        file_len
                    );
                    *offset = 0;
                }
                if file_len == *offset {
                    continue;
                }

                let mut file = match tokio::fs::File::open(&path).await {
                    Ok(file) => file,
                    Err(e) => {
                        tracing::warn!("Failed to open feed file: {}", e);
                        continue;
                    }
                };
                if let Err(e) = file.seek(std::io::SeekFrom::Start(*offset)).await {
                    tracing::warn!("Failed to seek feed file: {}", e);
                    continue;
                }

                let mut chunk = String::new();
                if let Err(e) = file.read_to_string(&mut chunk).await {
                    tracing::warn!("Failed to read feed file: {}", e);
                    continue;
                }

                let (outcomes, chunk_consumed) = parse_feed_chunk(&chunk);
                *offset += chunk_consumed as u64;
                drop(offset);

                for outcome in outcomes {
                    tracing::debug!(
                        "Feed outcome: {} {}-{} {} ({})",
                        outcome.home_team,
                        outcome.home_goals,
                        outcome.away_goals,
                        outcome.away_team,
                        outcome.league_id
                    );
                    if tx.send(outcome).is_err() {
                        tracing::error!("Receiver dropped, stopping feed watcher");
                        return;
                    }
                }
            }
        });

        Box::pin(UnboundedReceiverStream::new(rx))
    }
}

/// Factory for creating JSONL outcome sources
pub struct JsonlFactory;

impl OutcomeSourceFactory for JsonlFactory {
    fn create(&self, config: &OutcomeSourceConfig) -> Result<Box<dyn OutcomeSource>> {
        match config {
            OutcomeSourceConfig::Jsonl {
                path,
                poll_interval_secs,
            } => Ok(Box::new(JsonlOutcomeSource::with_interval(
                path,
                Duration::from_secs(*poll_interval_secs),
            ))),
            _ => Err(Error::config("Invalid config for JSONL outcome source")),
        }
    }
}

/// Register the JSONL outcome source with a registry
pub fn register(registry: &ComponentRegistry) {
    registry.register_source("jsonl", Box::new(JsonlFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_factory_creation() {
        let factory = JsonlFactory;

        let config = OutcomeSourceConfig::Jsonl {
            path: "/var/lib/standings/results.jsonl".to_string(),
            poll_interval_secs: 5,
        };

        let source = factory.create(&config);
        assert!(source.is_ok());
    }

    #[test]
    fn test_parse_feed_chunk_skips_bad_lines() {
        let chunk = concat!(
            r#"{"league_id":"l1","home_team":"Alpha","away_team":"Beta","home_goals":2,"away_goals":1,"date":"2025-03-01T15:00:00Z"}"#,
            "\n",
            "not json at all\n",
            r#"{"league_id":"l1","home_team":"Alpha","away_team":"Beta","home_goals":-1,"away_goals":0,"date":"2025-03-02T15:00:00Z"}"#,
            "\n",
            r#"{"league_id":"l1","home_team":"Beta","away_team":"Alpha","home_goals":0,"away_goals":0,"date":"2025-03-03T15:00:00Z"}"#,
            "\n",
        );

        let (outcomes, consumed) = parse_feed_chunk(chunk);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].home_goals, 2);
        assert_eq!(outcomes[1].home_team, "Beta");
        assert_eq!(consumed, chunk.len());
    }

    #[test]
    fn test_parse_feed_chunk_keeps_partial_tail() {
        let complete = r#"{"league_id":"l1","home_team":"Alpha","away_team":"Beta","home_goals":1,"away_goals":0,"date":"2025-03-01T15:00:00Z"}"#;
        let chunk = format!("{}\n{{\"league_id\":\"l1\",\"home_te", complete);

        let (outcomes, consumed) = parse_feed_chunk(&chunk);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(consumed, complete.len() + 1);
    }

    #[tokio::test]
    async fn test_backlog_reads_existing_feed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"league_id":"l1","home_team":"Alpha","away_team":"Beta","home_goals":2,"away_goals":1,"date":"2025-03-01T15:00:00Z"}}"#
        )
        .unwrap();
        writeln!(
            file,
            r#"{{"league_id":"l1","home_team":"Beta","away_team":"Alpha","home_goals":0,"away_goals":0,"date":"2025-03-08T15:00:00Z"}}"#
        )
        .unwrap();
        file.flush().unwrap();

        let source = JsonlOutcomeSource::new(file.path());
        let backlog = source.backlog().await.unwrap();

        assert_eq!(backlog.len(), 2);
        assert_eq!(backlog[0].home_team, "Alpha");
        assert_eq!(backlog[1].away_goals, 0);
    }

    #[tokio::test]
    async fn test_backlog_missing_file_is_empty() {
        let source = JsonlOutcomeSource::new("/nonexistent/results.jsonl");
        let backlog = source.backlog().await.unwrap();
        assert!(backlog.is_empty());
    }
}
