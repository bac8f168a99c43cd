use serde::Serialize;

use crate::backend::{BackendError, CommandFlusher};
use crate::command::{CommandBatch, ImplicitSet, VisitedSet};

/// Output of one or more resolution calls.
///
/// The two effect channels stay apart: `flushed` lists single-entry batches
/// that were already executed while walking, `batch` holds everything the
/// caller still has to execute.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Resolution {
    pub batch: CommandBatch,
    pub implicit: ImplicitSet,
    pub flushed: Vec<CommandBatch>,
}

impl Resolution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand the deferred batch to `executor`. Flushed entries are not part of
    /// it and are not executed again.
    pub fn execute_remaining(&self, executor: &dyn CommandFlusher) -> Result<(), BackendError> {
        if self.batch.is_empty() {
            return Ok(());
        }
        executor.execute(&self.batch)
    }
}

/// Bookkeeping for a single top-level call.
pub(crate) struct WalkState<'r> {
    pub depth: u32,
    pub visited: VisitedSet,
    pub output: &'r mut Resolution,
}

impl<'r> WalkState<'r> {
    pub fn new(output: &'r mut Resolution) -> Self {
        WalkState {
            depth: 0,
            visited: VisitedSet::new(),
            output,
        }
    }
}
