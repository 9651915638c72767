//! Migration driver - the sequential fetch/upsert/acknowledge control loop.
//!
//! One row is in flight at any time. The driver advances its cursor only on
//! a confirmed sink success and reacts to classified failures with fixed
//! cooldowns; fatal conditions propagate as errors so the terminal decision
//! (process exit) stays with the caller and the loop remains testable.

use crate::classify::{classify, Outcome};
use crate::cursor::{Cursor, MigrationMode};
use crate::error::{MigrateError, Result};
use crate::source::RowSource;
use crate::source::SqlValue;
use crate::target::DocumentSink;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Driver parameters, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct DriverSettings {
    /// Source table, for log and error context.
    pub table: String,

    /// Primary-key column naming the document id.
    pub primary_key: String,

    /// Post-write disposition.
    pub mode: MigrationMode,

    /// Wait after a rate-limited upsert.
    pub throttle_cooldown: Duration,

    /// Wait when the source has no rows.
    pub idle_cooldown: Duration,
}

/// What one cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Row written and acknowledged (deleted or stepped past).
    Migrated,

    /// Target already held the row; acknowledged like a success.
    ConflictResolved,

    /// Row too large for the target; stepped past without writing.
    Skipped,

    /// Rate limited; nothing changed, cycle repeats after the cooldown.
    Throttled,

    /// Source empty; cycle repeats after the long cooldown.
    SourceDrained,
}

/// Running totals, logged on waits and exposed for tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub migrated: u64,
    pub conflicts: u64,
    pub skipped_too_large: u64,
    pub throttle_waits: u64,
    pub idle_waits: u64,
}

/// The migration control loop.
///
/// Owns the cursor exclusively; no synchronization is needed because
/// processing is strictly sequential.
pub struct MigrationDriver<S, K> {
    source: S,
    sink: K,
    cursor: Cursor,
    settings: DriverSettings,
    stats: DriverStats,
}

impl<S: RowSource, K: DocumentSink> MigrationDriver<S, K> {
    /// Create a driver at offset 0.
    pub fn new(source: S, sink: K, settings: DriverSettings) -> Self {
        Self {
            source,
            sink,
            cursor: Cursor::new(),
            settings,
            stats: DriverStats::default(),
        }
    }

    /// Current read offset.
    pub fn offset(&self) -> i64 {
        self.cursor.current()
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    /// Run cycles forever, sleeping through the returned cooldowns.
    ///
    /// Returns only by propagating a fatal error; `Ok` is unreachable in
    /// normal operation.
    pub async fn run(mut self) -> Result<()> {
        info!(
            table = %self.settings.table,
            mode = ?self.settings.mode,
            "migration driver starting"
        );

        loop {
            let (outcome, cooldown) = self.run_cycle().await.map_err(|e| {
                error!(offset = self.cursor.current(), "fatal migration error");
                e
            })?;

            if let Some(delay) = cooldown {
                info!(
                    ?outcome,
                    delay_secs = delay.as_secs(),
                    migrated = self.stats.migrated,
                    conflicts = self.stats.conflicts,
                    skipped = self.stats.skipped_too_large,
                    "cooling down"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Execute one fetch/upsert/acknowledge cycle.
    ///
    /// Returns the outcome and the cooldown to observe before the next
    /// cycle (`None` means loop immediately). Fatal conditions come back as
    /// errors with the cursor untouched.
    pub async fn run_cycle(&mut self) -> Result<(CycleOutcome, Option<Duration>)> {
        let offset = self.cursor.current();

        let Some(row) = self.source.fetch_next(offset).await? else {
            self.stats.idle_waits += 1;
            debug!(offset, "source drained");
            return Ok((CycleOutcome::SourceDrained, Some(self.settings.idle_cooldown)));
        };

        let doc = row
            .into_document(&self.settings.primary_key)
            .ok_or_else(|| MigrateError::MissingPrimaryKey {
                table: self.settings.table.clone(),
                column: self.settings.primary_key.clone(),
            })?;

        let response = self.sink.upsert(&doc).await?;

        match classify(&response) {
            Outcome::Success => {
                self.acknowledge(&doc.key).await?;
                self.stats.migrated += 1;
                Ok((CycleOutcome::Migrated, None))
            }
            Outcome::Conflict => {
                // The target already reflects the intent; treat exactly
                // like a confirmed write.
                debug!(id = %doc.id, "conflict on upsert, target already has document");
                self.acknowledge(&doc.key).await?;
                self.stats.conflicts += 1;
                Ok((CycleOutcome::ConflictResolved, None))
            }
            Outcome::PayloadTooLarge => {
                warn!(
                    id = %doc.id,
                    offset,
                    "document exceeds target size limit, skipping row"
                );
                self.cursor.advance();
                self.stats.skipped_too_large += 1;
                Ok((CycleOutcome::Skipped, None))
            }
            Outcome::Throttled => {
                self.stats.throttle_waits += 1;
                debug!(id = %doc.id, "rate limited by target");
                Ok((CycleOutcome::Throttled, Some(self.settings.throttle_cooldown)))
            }
            Outcome::NoRowsAvailable => {
                // classify never yields this for a sink response; the empty
                // fetch above is the only producer.
                Ok((CycleOutcome::SourceDrained, Some(self.settings.idle_cooldown)))
            }
            Outcome::Fatal => Err(MigrateError::SinkRejected {
                status: response.status,
                message: response.body,
            }),
        }
    }

    /// Confirm a written row: delete it at the source, or step past it.
    async fn acknowledge(&mut self, pk: &SqlValue) -> Result<()> {
        match self.settings.mode {
            MigrationMode::DeleteAfterMigrate => {
                let affected = self.source.delete_row(pk).await.map_err(|e| {
                    // A row we cannot remove would be reprocessed forever;
                    // halt for operator intervention instead.
                    MigrateError::DeleteFailed {
                        table: self.settings.table.clone(),
                        message: e.to_string(),
                    }
                })?;
                if affected == 0 {
                    warn!(?pk, "delete matched no rows; source row already gone");
                }
                self.cursor.hold();
            }
            MigrationMode::AdvanceOnly => self.cursor.advance(),
        }
        Ok(())
    }
}
