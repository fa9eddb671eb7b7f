pub mod controller;
pub mod state;
pub mod ticker;

pub use controller::{MIN_INTERVAL_MS, ScanController, ScanTask};
pub use state::{ScanState, Tick};
