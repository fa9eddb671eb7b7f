use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire convolution engine.
pub type Result<T> = std::result::Result<T, ConvErr>;

/// The convolution engine's error type.
///
/// Degenerate geometry is never an error, only malformed inputs to the
/// constructors and preset lookups are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvErr {
    InvalidParameter {
        name: &'static str,
        got: usize,
        min: usize,
    },
    UnknownKernelPreset(String),
    UnknownArchPreset(String),
}

impl Display for ConvErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConvErr::InvalidParameter { name, got, min } => {
                format!("The hyperparameter {name} must be at least {min}, got {got}")
            }
            ConvErr::UnknownKernelPreset(name) => format!(
                "There's no kernel preset named '{name}', expected one of edge_detect, blur, sharpen, identity or emboss"
            ),
            ConvErr::UnknownArchPreset(name) => format!(
                "There's no hyperparameter preset named '{name}', expected one of basic, same_padding, strided, dilated or large_kernel"
            ),
        };

        write!(f, "{s}")
    }
}

impl Error for ConvErr {}
