/// Asks the operator before destructive work.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Receives one marker per table processed.
pub trait Progress: Send + Sync {
    fn on_table(&self, table: &str);
}

/// Progress observer that discards markers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn on_table(&self, _table: &str) {}
}

/// Counters for a finished operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub tables: usize,
    pub rows: usize,
    pub statements: usize,
}

/// Result of an operation that may be declined by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed(Summary),
    Cancelled,
}

impl Outcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }
}
