use std::time::Duration;

use conv_engine::{Coord, OutputDimensions};
use log::{debug, info, trace};
use tokio_util::sync::CancellationToken;

use crate::{ScanState, Tick};

/// Lower bound for the tick period, shorter intervals are raised to it.
pub const MIN_INTERVAL_MS: u64 = 60;

const DEFAULT_INTERVAL_MS: u64 = 200;

/// The schedulable side of a running scan.
///
/// The controller owns the task and cancels its token when the scan stops, the host only uses it to
/// drive a ticker.
#[derive(Debug, Clone)]
pub struct ScanTask {
    generation: u64,
    period: Duration,
    token: CancellationToken,
}

impl ScanTask {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Cycles the selected output cell over time and keeps it inside the current output.
///
/// It's idle when there's no task and scanning otherwise. A task only exists while the output
/// dimensions are positive, so a running scan always has a valid selection.
#[derive(Debug)]
pub struct ScanController {
    dims: OutputDimensions,
    selected: Option<Coord>,
    interval_ms: u64,
    task: Option<ScanTask>,
    generation: u64,
}

impl ScanController {
    /// Creates a new idle `ScanController`.
    ///
    /// # Arguments
    /// * `dims` - The current output dimensions.
    ///
    /// # Returns
    /// A controller selecting the first cell, or nothing if there's no output.
    pub fn new(dims: OutputDimensions) -> Self {
        Self {
            dims,
            selected: dims.is_positive().then_some(Coord::new(0, 0)),
            interval_ms: DEFAULT_INTERVAL_MS,
            task: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> ScanState {
        ScanState {
            selected: self.selected,
            running: self.task.is_some(),
            interval_ms: self.interval_ms,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub fn dims(&self) -> OutputDimensions {
        self.dims
    }

    /// Returns the live scan task, if scanning.
    pub fn task(&self) -> Option<&ScanTask> {
        self.task.as_ref()
    }

    /// Starts scanning from the first cell.
    ///
    /// Does nothing when there's no output. Starting while already scanning replaces the running
    /// task, cancelling the previous one.
    ///
    /// # Arguments
    /// * `interval_ms` - Requested time between ticks, raised to [`MIN_INTERVAL_MS`].
    ///
    /// # Returns
    /// The updated scan state.
    pub fn start(&mut self, interval_ms: u64) -> ScanState {
        if !self.dims.is_positive() {
            debug!(width = self.dims.width, height = self.dims.height; "no output to scan");
            return self.state();
        }

        self.cancel_task();
        self.generation += 1;
        self.interval_ms = interval_ms;
        self.selected = Some(Coord::new(0, 0));

        let period = Duration::from_millis(interval_ms.max(MIN_INTERVAL_MS));
        self.task = Some(ScanTask {
            generation: self.generation,
            period,
            token: CancellationToken::new(),
        });

        info!(generation = self.generation, period_ms = period.as_millis() as u64; "scan started");
        self.state()
    }

    /// Stops scanning, keeping the current selection.
    pub fn stop(&mut self) -> ScanState {
        if self.cancel_task() {
            info!(generation = self.generation; "scan stopped");
        }

        self.state()
    }

    /// Advances the selection one cell in row-major order, wrapping to the first cell.
    ///
    /// Ticks received while idle or produced by an older task don't change anything.
    pub fn tick(&mut self, tick: Tick) -> ScanState {
        let Some(task) = &self.task else {
            trace!(generation = tick.generation; "tick while idle");
            return self.state();
        };

        if task.generation != tick.generation {
            trace!(generation = tick.generation, live = task.generation; "stale tick");
            return self.state();
        }

        let Some((h, w)) = self.dims.shape() else {
            return self.state();
        };

        let next = match self.selected {
            Some(Coord { x, y }) => (y * w + x + 1) % (w * h),
            None => 0,
        };

        self.selected = Some(Coord::new(next % w, next / w));
        self.state()
    }

    /// Selects an output cell, clamping it into the current output.
    pub fn set_selected(&mut self, x: usize, y: usize) -> ScanState {
        self.selected = Some(Coord::new(x, y));
        self.clamp_selected();
        self.state()
    }

    /// Reacts to a geometry change.
    ///
    /// When there's no output anymore the selection is cleared and the scan is stopped, otherwise the
    /// selection is clamped into the new bounds on each axis. Regaining the output selects the first
    /// cell but doesn't restart the scan.
    pub fn set_dimensions(&mut self, dims: OutputDimensions) -> ScanState {
        self.dims = dims;

        if !dims.is_positive() && self.cancel_task() {
            info!(width = dims.width, height = dims.height; "scan stopped, no output");
        }

        self.clamp_selected();
        self.state()
    }

    fn clamp_selected(&mut self) {
        let Coord { x, y } = self.selected.unwrap_or(Coord::new(0, 0));
        self.selected = self.dims.shape().map(|(h, w)| Coord {
            x: x.min(w - 1),
            y: y.min(h - 1),
        });
    }

    fn cancel_task(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.token.cancel();
                true
            }
            None => false,
        }
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        self.cancel_task();
    }
}
