//! Per-call milestone collection.
//!
//! [`CallInfo`] is an append-only ordered log of named milestones, each
//! timestamped against a monotonic clock anchored at `start()`. The engine
//! resets it at the start of every call and hands out a snapshot when the
//! first remote frame decodes.

use std::time::Instant;

/// A named point in a call's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Milestone {
    Start,
    RemoteUserRecvCall,
    AcceptCall,
    LocalUserJoinChannel,
    RemoteUserJoinChannel,
    RecvFirstFrame,
    End,
}

/// One recorded milestone: its kind and the number of milliseconds since
/// [`CallInfo::start`] was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestoneEntry {
    pub milestone: Milestone,
    pub elapsed_ms: u64,
}

/// An append-only, per-call log of [`Milestone`] timings.
#[derive(Debug, Clone, Default)]
pub struct CallInfo {
    anchor: Option<Instant>,
    entries: Vec<MilestoneEntry>,
}

impl CallInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the buffer and records `Milestone::Start` at elapsed 0.
    ///
    /// Called at the beginning of every call, both outgoing (`call()`) and
    /// incoming (on receipt of `VideoCall`/`AudioCall`).
    pub fn start(&mut self) {
        self.entries.clear();
        self.anchor = Some(Instant::now());
        self.record(Milestone::Start);
    }

    /// Appends `milestone` with the elapsed time since `start()`.
    ///
    /// No-op (besides a debug log) if `start()` was never called — this
    /// should not happen on any reachable engine path, but recording nothing
    /// is safer than panicking on a timestamp that can't be computed.
    pub fn record(&mut self, milestone: Milestone) {
        let Some(anchor) = self.anchor else {
            log::debug!("CallInfo::record({milestone:?}) before start(), ignoring");
            return;
        };
        self.entries.push(MilestoneEntry {
            milestone,
            elapsed_ms: anchor.elapsed().as_millis() as u64,
        });
    }

    /// Records `Milestone::End` and returns a snapshot of the full buffer
    /// without clearing it — callers that want a clean slate should call
    /// `start()` on the next call.
    pub fn finish(&mut self) -> Vec<MilestoneEntry> {
        self.record(Milestone::End);
        self.entries.clone()
    }

    /// A snapshot of the milestones recorded so far, in recording order.
    pub fn snapshot(&self) -> Vec<MilestoneEntry> {
        self.entries.clone()
    }

    pub fn has(&self, milestone: Milestone) -> bool {
        self.entries.iter().any(|e| e.milestone == milestone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_resets_and_records_start_at_zero() {
        let mut info = CallInfo::new();
        info.record(Milestone::AcceptCall); // before start(): ignored
        info.start();

        let snapshot = info.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].milestone, Milestone::Start);
    }

    #[test]
    fn milestones_are_recorded_in_order() {
        let mut info = CallInfo::new();
        info.start();
        info.record(Milestone::LocalUserJoinChannel);
        info.record(Milestone::RemoteUserJoinChannel);
        info.record(Milestone::RecvFirstFrame);

        let snapshot = info.snapshot();
        assert_eq!(
            snapshot.iter().map(|e| e.milestone).collect::<Vec<_>>(),
            vec![
                Milestone::Start,
                Milestone::LocalUserJoinChannel,
                Milestone::RemoteUserJoinChannel,
                Milestone::RecvFirstFrame,
            ]
        );
    }

    #[test]
    fn finish_appends_end_without_clearing() {
        let mut info = CallInfo::new();
        info.start();
        let finished = info.finish();
        assert_eq!(finished.last().unwrap().milestone, Milestone::End);
        assert!(info.has(Milestone::End));
    }

    #[test]
    fn second_start_clears_previous_entries() {
        let mut info = CallInfo::new();
        info.start();
        info.record(Milestone::AcceptCall);
        info.start();
        assert_eq!(info.snapshot().len(), 1);
    }
}
