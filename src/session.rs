use std::collections::VecDeque;

use conv_engine::Explorer;
use log::{info, warn};
use scanner::{ScanController, ScanState, ScanTask, Tick};

use crate::config::{ExplorerDraft, SweepStep};

/// A scripted exploration: the explorer, its scan and the sweep steps still to apply.
#[derive(Debug)]
pub struct Session {
    explorer: Explorer,
    controller: ScanController,
    sweep: VecDeque<SweepStep>,
    interval_ms: u64,
    target: usize,
    ticks: usize,
}

impl Session {
    pub fn new(draft: &ExplorerDraft) -> Self {
        let explorer = Explorer::new(draft.params, draft.kernel, draft.show_values);
        let controller = ScanController::new(explorer.output_dims());

        Self {
            explorer,
            controller,
            sweep: draft.sweep.iter().cloned().collect(),
            interval_ms: draft.scan.interval_ms,
            target: draft.scan.ticks,
            ticks: 0,
        }
    }

    pub fn explorer(&self) -> &Explorer {
        &self.explorer
    }

    pub fn state(&self) -> ScanState {
        self.controller.state()
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// Amount of ticks that moved the selection so far.
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Whether the requested amount of ticks has been reached.
    pub fn is_done(&self) -> bool {
        self.ticks >= self.target
    }

    pub fn pending_steps(&self) -> usize {
        self.sweep.len()
    }

    /// Starts the scan, returning the task a ticker has to drive.
    pub fn start(&mut self) -> Option<ScanTask> {
        self.controller.start(self.interval_ms);
        self.controller.task().cloned()
    }

    pub fn stop(&mut self) -> ScanState {
        self.controller.stop()
    }

    /// Forwards a tick to the scan.
    ///
    /// # Returns
    /// `true` if the tick belongs to the live task and was counted.
    pub fn tick(&mut self, tick: Tick) -> bool {
        let live = self
            .controller
            .task()
            .is_some_and(|task| task.generation() == tick.generation);

        if live {
            self.controller.tick(tick);
            self.ticks += 1;
        }

        live
    }

    /// Applies the next sweep step if it's due at the current tick count.
    pub fn apply_next_due(&mut self) -> bool {
        match self.sweep.front() {
            Some(step) if step.after <= self.ticks => {}
            _ => return false,
        }

        if let Some(step) = self.sweep.pop_front() {
            self.apply(step);
        }

        true
    }

    /// Restarts a scan stopped by a step that left no output.
    ///
    /// Since an idle scan doesn't tick, the pending steps are applied early, one at a time, until
    /// there's output again.
    ///
    /// # Returns
    /// The task of the restarted scan, or `None` if the sweep ran out while there's still no output.
    pub fn resume(&mut self) -> Option<ScanTask> {
        while !self.controller.dims().is_positive() {
            let Some(step) = self.sweep.pop_front() else {
                warn!(ticks = self.ticks, target = self.target; "sweep ended without output, scan stays idle");
                return None;
            };

            info!(after = step.after, ticks = self.ticks; "scan is idle, applying sweep step early");
            self.apply(step);
        }

        self.start()
    }

    fn apply(&mut self, step: SweepStep) {
        self.explorer.replace(step.params);
        self.controller.set_dimensions(self.explorer.output_dims());
    }
}

#[cfg(test)]
mod tests {
    use conv_engine::Coord;

    use super::*;
    use crate::config;

    const LOSE_AND_REGAIN: &str = r#"{
        "scan": { "interval_ms": 60, "ticks": 6 },
        "sweep": [
            { "after": 2, "dilation": 20 },
            { "after": 4, "dilation": 1 }
        ]
    }"#;

    fn live(session: &Session) -> Tick {
        Tick {
            generation: session.controller.task().unwrap().generation(),
        }
    }

    #[test]
    fn due_steps_follow_the_tick_count() {
        let draft = config::parse(r#"{ "sweep": [{ "after": 2, "stride": 2 }] }"#).unwrap();
        let mut session = Session::new(&draft);
        session.start();

        session.tick(live(&session));
        assert!(!session.apply_next_due());

        session.tick(live(&session));
        assert!(session.apply_next_due());
        assert!(!session.apply_next_due());
        assert_eq!(session.explorer().params().stride(), 2);
        assert!(session.is_running());
    }

    #[test]
    fn losing_the_output_stops_counting() {
        let draft = config::parse(LOSE_AND_REGAIN).unwrap();
        let mut session = Session::new(&draft);
        let first = session.start().unwrap();

        session.tick(live(&session));
        session.tick(live(&session));
        assert!(session.apply_next_due());
        assert!(!session.is_running());
        assert!(first.is_cancelled());

        assert!(!session.tick(Tick {
            generation: first.generation(),
        }));
        assert_eq!(session.ticks(), 2);
    }

    #[test]
    fn resume_applies_the_next_step_and_restarts() {
        let draft = config::parse(LOSE_AND_REGAIN).unwrap();
        let mut session = Session::new(&draft);
        let first = session.start().unwrap();

        session.tick(live(&session));
        session.tick(live(&session));
        session.apply_next_due();

        let second = session.resume().unwrap();
        assert!(second.generation() > first.generation());
        assert_eq!(session.pending_steps(), 0);
        assert_eq!(session.explorer().params().dilation(), 1);
        assert_eq!(session.state().selected, Some(Coord::new(0, 0)));

        for _ in 0..4 {
            assert!(session.tick(live(&session)));
        }
        assert!(session.is_done());
        assert_eq!(session.state().selected, Some(Coord::new(4, 0)));
    }

    #[test]
    fn resume_without_a_recovering_step() {
        let draft = config::parse(r#"{ "scan": { "ticks": 4 }, "sweep": [{ "after": 1, "kernel_size": 30 }] }"#)
            .unwrap();
        let mut session = Session::new(&draft);
        session.start();

        session.tick(live(&session));
        session.apply_next_due();
        assert!(!session.is_running());

        assert!(session.resume().is_none());
        assert!(!session.is_running());
        assert_eq!(session.state().selected, None);
    }

    #[test]
    fn resume_with_output_just_restarts() {
        let draft = config::parse(r#"{ "sweep": [{ "after": 9, "stride": 2 }] }"#).unwrap();
        let mut session = Session::new(&draft);

        assert!(session.resume().is_some());
        assert_eq!(session.pending_steps(), 1);
    }
}
