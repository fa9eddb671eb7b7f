use conv_engine::Coord;
use serde::Serialize;

/// Snapshot of the scan handed back by every controller operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanState {
    /// The highlighted output cell, `None` when there's no valid output.
    pub selected: Option<Coord>,
    pub running: bool,
    /// The configured interval, before the lower bound is applied.
    pub interval_ms: u64,
}

/// A single scan step emitted by a ticker.
///
/// The generation identifies the scan task that produced it, ticks from a stopped or replaced task
/// are ignored by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}
