//! Invocation recording for substituted methods.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// One recorded invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// 1-based position among all calls to this substitution
    pub sequence: usize,
    /// Arguments as received
    pub arguments: Vec<Value>,
}

/// Captures the arguments a substitution is invoked with
///
/// The call count is exact; the retained history is bounded and drops
/// the oldest records first.
#[derive(Debug)]
pub struct CallRecorder {
    count: Cell<usize>,
    last: RefCell<Option<Vec<Value>>>,
    history: RefCell<VecDeque<CallRecord>>,
    history_limit: usize,
}

impl Default for CallRecorder {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_LIMIT)
    }
}

impl CallRecorder {
    /// Create a recorder retaining at most `history_limit` records
    #[must_use]
    pub fn new(history_limit: usize) -> Self {
        Self {
            count: Cell::new(0),
            last: RefCell::new(None),
            history: RefCell::new(VecDeque::new()),
            history_limit,
        }
    }

    /// Record an invocation
    pub fn record(&self, args: &[Value]) {
        let sequence = self.count.get() + 1;
        self.count.set(sequence);
        *self.last.borrow_mut() = Some(args.to_vec());

        if self.history_limit == 0 {
            return;
        }
        let mut history = self.history.borrow_mut();
        while history.len() >= self.history_limit {
            history.pop_front();
        }
        history.push_back(CallRecord {
            sequence,
            arguments: args.to_vec(),
        });
    }

    /// Whether the substitution has been invoked at least once
    #[must_use]
    pub fn was_invoked(&self) -> bool {
        self.count.get() > 0
    }

    /// Total number of invocations
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.count.get()
    }

    /// Arguments of the most recent invocation (empty if never invoked)
    #[must_use]
    pub fn last_arguments(&self) -> Vec<Value> {
        self.last.borrow().clone().unwrap_or_default()
    }

    /// Retained invocation history, oldest first
    #[must_use]
    pub fn calls(&self) -> Vec<CallRecord> {
        self.history.borrow().iter().cloned().collect()
    }
}
