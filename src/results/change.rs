/// Outcome of a mutating statement.
///
/// Zero in either field means "nothing affected" or "no identity generated"; it is never an
/// error signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeResult {
    /// Rows inserted, updated or deleted.
    pub changes: u64,
    /// Identity generated by the most recent insert, or 0.
    pub last_insert_rowid: u64,
}

impl ChangeResult {
    #[must_use]
    pub fn new(changes: u64, last_insert_rowid: u64) -> Self {
        Self {
            changes,
            last_insert_rowid,
        }
    }

    /// Fold a later result into this one: counts add up, the newest rowid wins.
    pub fn accumulate(&mut self, next: ChangeResult) {
        self.changes += next.changes;
        self.last_insert_rowid = next.last_insert_rowid;
    }
}
