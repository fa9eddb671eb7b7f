pub mod convolution;
pub mod error;
pub mod explorer;
pub mod geometry;
pub mod input;
pub mod params;
pub mod presets;
pub mod validation;

pub use convolution::{CellTrace, OutputGrid, TapContribution, convolve, convolve_at};
pub use error::{ConvErr, Result};
pub use explorer::Explorer;
pub use geometry::{Coord, OutputDimensions, ReceptiveField};
pub use input::{InputCache, InputGrid, generate_input};
pub use params::HyperparameterSet;
pub use presets::{ArchPreset, KernelPreset};
pub use validation::{Diagnostic, validate};
