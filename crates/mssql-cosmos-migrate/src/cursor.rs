//! Read-position bookkeeping for the migration driver.

use serde::{Deserialize, Serialize};

/// Post-write disposition, fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationMode {
    /// Remove each source row after a confirmed upsert. The next row then
    /// appears at the same offset, so the cursor never moves.
    DeleteAfterMigrate,

    /// Leave source rows in place and step the cursor past them.
    AdvanceOnly,
}

/// Current read position into the source's primary-key ordering.
///
/// The cursor counts rows already migrated and not deleted. It has a single
/// owner (the driver) and is only mutated after a confirmed sink success, so
/// it is monotonically non-decreasing for the life of the process. There is
/// no persisted checkpoint: a restart begins again at offset 0 and relies on
/// upsert idempotence to absorb reprocessing.
#[derive(Debug, Default)]
pub struct Cursor {
    offset: i64,
}

impl Cursor {
    /// Cursor positioned at the start of the table.
    pub fn new() -> Self {
        Self { offset: 0 }
    }

    /// Current offset.
    pub fn current(&self) -> i64 {
        self.offset
    }

    /// Step past a migrated (or skipped) row. Advance-mode acknowledgement.
    pub fn advance(&mut self) {
        self.offset += 1;
    }

    /// Keep the position after a delete: the deleted row's successor now
    /// occupies the same offset.
    pub fn hold(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        assert_eq!(Cursor::new().current(), 0);
    }

    #[test]
    fn test_advance_increments_by_one() {
        let mut cursor = Cursor::new();
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.current(), 2);
    }

    #[test]
    fn test_hold_keeps_offset() {
        let mut cursor = Cursor::new();
        cursor.advance();
        cursor.hold();
        cursor.hold();
        assert_eq!(cursor.current(), 1);
    }
}
