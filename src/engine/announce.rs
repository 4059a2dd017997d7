//! Live-region announcement choreography.
//!
//! Screen readers only re-read an assertive region when its text actually
//! changes, and they drop text swapped in during the same tick it was
//! cleared. The sequences here work around both: clear first, repopulate
//! after a beat with an invisible nonce appended so repeated headings still
//! differ, then empty the region again once it has been heard. The submit
//! control's mirror region fires twice on state entry and debounces rapid
//! flips.

use tracing::debug;

use crate::host::{Channel, Host, SubmitState};
use crate::locale::Locale;

use super::schedule::{Scheduler, Task, TaskId};

const ASSERTIVE_SETTLE_MS: u64 = 350;
const ASSERTIVE_CLEAR_MS: u64 = 2000;
const SUBMIT_FIRST_FIRE_MS: u64 = 50;
const SUBMIT_SECOND_FIRE_MS: u64 = 300;
const SUBMIT_DEBOUNCE_MS: u64 = 120;

#[derive(Debug, Default)]
pub struct Announcer {
    pending_assertive: Vec<TaskId>,
    pending_reannounce: Option<TaskId>,
}

impl Announcer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the summary heading on the assertive channel: clear now,
    /// repopulate at +350ms with a nonce, clear again at +2000ms. A newer
    /// announcement cancels whatever an older one still had queued.
    pub fn announce_summary(&mut self, sched: &mut Scheduler, host: &mut dyn Host, text: &str) {
        for id in self.pending_assertive.drain(..) {
            sched.cancel(id);
        }
        host.announce(Channel::AssertiveSummary, "");
        let nonced = format!("{text}\u{200b}{}", sched.now());
        self.pending_assertive.push(
            sched.schedule(ASSERTIVE_SETTLE_MS, Task::AnnounceAssertiveSummary { text: nonced }),
        );
        self.pending_assertive
            .push(sched.schedule(ASSERTIVE_CLEAR_MS, Task::ClearAssertiveSummary));
        debug!(text = %text, at = sched.now(), "assertive summary announcement queued");
    }

    /// Puts the submit control into its processing state and fires its
    /// label into the mirror region twice, so a reader that misses the
    /// first pass catches the second.
    pub fn submit_processing(&mut self, sched: &mut Scheduler, host: &mut dyn Host, locale: Locale) {
        let label = submit_label(locale);
        host.set_submit_control(SubmitState::Processing, label);
        sched.schedule(
            SUBMIT_FIRST_FIRE_MS,
            Task::AnnounceSubmitControl { text: label.to_string() },
        );
        sched.schedule(
            SUBMIT_SECOND_FIRE_MS,
            Task::AnnounceSubmitControl { text: label.to_string() },
        );
        debug!(label, "submit control entered processing state");
    }

    /// Restores the submit control's default state, announcing immediately
    /// and once more after a debounce window. Flips inside the window
    /// collapse into a single trailing announcement.
    pub fn submit_default(&mut self, sched: &mut Scheduler, host: &mut dyn Host, locale: Locale) {
        let label = submit_label(locale);
        host.set_submit_control(SubmitState::Default, label);
        host.announce(Channel::SubmitControl, label);
        if let Some(id) = self.pending_reannounce.take() {
            sched.cancel(id);
        }
        self.pending_reannounce = Some(sched.schedule(
            SUBMIT_DEBOUNCE_MS,
            Task::ReannounceSubmitControl { text: label.to_string() },
        ));
        debug!(label, "submit control restored to default state");
    }

    /// Called when a queued reannounce task fires.
    pub fn reannounce_fired(&mut self) {
        self.pending_reannounce = None;
    }
}

pub fn submit_label(locale: Locale) -> &'static str {
    locale.pick("Next", "Suivant")
}
