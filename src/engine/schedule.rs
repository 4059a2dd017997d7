//! Deferred-work queue on a logical clock.
//!
//! Every delay in the coordinator is explicit: work is enqueued with a
//! millisecond offset and runs when the host drives the clock past its due
//! time. Ties run in scheduling order, so a refresh enqueued before a render
//! at the same instant always executes first.

use crate::engine::summary::SummaryItem;
use crate::rules::FieldType;

/// A validation pass's trigger, carried through deferred work so a refresh
/// scheduled mid-pass keeps the trigger of the pass that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassContext {
    /// A submit attempt: announcements fire, the summary may take focus.
    Submit,
    /// A field-level change: silent refresh, no focus movement.
    Change,
}

/// Handle for cancelling a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Clone)]
pub enum Task {
    /// Re-run the whole global pass with the given trigger.
    SummaryRefresh { context: PassContext },
    /// Settled render of the summary block, after the inline churn quiets.
    RenderSummary {
        context: PassContext,
        heading: String,
        items: Vec<SummaryItem>,
    },
    /// Populate the assertive summary region.
    AnnounceAssertiveSummary { text: String },
    /// Empty the assertive summary region once it has been heard.
    ClearAssertiveSummary,
    /// Mirror the submit control's label into its live region.
    AnnounceSubmitControl { text: String },
    /// Debounced repeat announcement after rapid submit-control flips.
    ReannounceSubmitControl { text: String },
    /// Dispatch a synthetic change so the host runtime notices the edit.
    SyntheticChange { control_id: String },
    /// Re-run one field's validators outside the current call stack.
    RevalidateField { field_id: String, field_type: FieldType },
    /// Release the global pass guard at the end of the current tick.
    ClearGlobalBusy,
}

#[derive(Debug)]
struct Entry {
    id: TaskId,
    due: u64,
    seq: u64,
    task: Task,
}

/// Single-owner task queue. Not a thread: the engine drains it as the host
/// drives the clock forward.
#[derive(Debug, Default)]
pub struct Scheduler {
    now: u64,
    next_seq: u64,
    entries: Vec<Entry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn set_now(&mut self, now: u64) {
        debug_assert!(now >= self.now);
        self.now = now;
    }

    pub fn schedule(&mut self, delay_ms: u64, task: Task) -> TaskId {
        let id = TaskId(self.next_seq);
        self.entries.push(Entry {
            id,
            due: self.now + delay_ms,
            seq: self.next_seq,
            task,
        });
        self.next_seq += 1;
        id
    }

    pub fn cancel(&mut self, id: TaskId) {
        self.entries.retain(|e| e.id != id);
    }

    /// Pops the earliest task due at or before the current time. Due-time
    /// ties resolve by scheduling order.
    pub fn pop_due(&mut self) -> Option<Task> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= self.now)
            .min_by_key(|(_, e)| (e.due, e.seq))
            .map(|(i, _)| i)?;
        Some(self.entries.remove(idx).task)
    }

    /// Due time of the earliest pending task.
    pub fn next_due(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.due).min()
    }

    /// Pending tasks, for diagnostics.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_run_in_due_then_scheduling_order() {
        let mut sched = Scheduler::new();
        sched.schedule(50, Task::ClearAssertiveSummary);
        sched.schedule(0, Task::SummaryRefresh { context: PassContext::Change });
        sched.schedule(0, Task::ClearGlobalBusy);

        assert!(matches!(sched.pop_due(), Some(Task::SummaryRefresh { .. })));
        assert!(matches!(sched.pop_due(), Some(Task::ClearGlobalBusy)));
        assert!(sched.pop_due().is_none(), "50ms task is not due yet");

        sched.set_now(50);
        assert!(matches!(sched.pop_due(), Some(Task::ClearAssertiveSummary)));
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn cancelled_tasks_never_fire() {
        let mut sched = Scheduler::new();
        let id = sched.schedule(120, Task::ReannounceSubmitControl { text: "Next".into() });
        sched.schedule(120, Task::AnnounceSubmitControl { text: "Next".into() });
        sched.cancel(id);
        sched.set_now(200);
        assert!(matches!(sched.pop_due(), Some(Task::AnnounceSubmitControl { .. })));
        assert!(sched.pop_due().is_none());
    }
}
