use serde::Serialize;

use crate::{ConvErr, Result};

/// An immutable snapshot of the convolution hyperparameters.
///
/// It is never mutated in place, every edit produces a whole new set which is then handed to the
/// pure functions of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HyperparameterSet {
    pub(crate) input_width: usize,
    pub(crate) input_height: usize,
    pub(crate) kernel_size: usize,
    pub(crate) stride: usize,
    pub(crate) padding: usize,
    pub(crate) dilation: usize,
}

impl HyperparameterSet {
    /// Creates a new `HyperparameterSet`.
    ///
    /// The kernel size is not required to be odd, only the UI restricts it to odd values.
    ///
    /// # Arguments
    /// * `input_width` - Width of the unpadded input, at least 1.
    /// * `input_height` - Height of the unpadded input, at least 1.
    /// * `kernel_size` - Side length of the square kernel, at least 1.
    /// * `stride` - Step between kernel placements, at least 1.
    /// * `padding` - Zero cells added on each side of both axes.
    /// * `dilation` - Spacing between kernel taps, at least 1.
    ///
    /// # Returns
    /// A new `HyperparameterSet` or `ConvErr::InvalidParameter` naming the first field out of range.
    pub fn new(
        input_width: usize,
        input_height: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        dilation: usize,
    ) -> Result<Self> {
        let positive = [
            ("input_width", input_width),
            ("input_height", input_height),
            ("kernel_size", kernel_size),
            ("stride", stride),
            ("dilation", dilation),
        ];

        if let Some(&(name, got)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(ConvErr::InvalidParameter { name, got, min: 1 });
        }

        Ok(Self {
            input_width,
            input_height,
            kernel_size,
            stride,
            padding,
            dilation,
        })
    }

    pub fn input_width(&self) -> usize {
        self.input_width
    }

    pub fn input_height(&self) -> usize {
        self.input_height
    }

    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn dilation(&self) -> usize {
        self.dilation
    }

    /// Returns a copy of this set with a different input size.
    ///
    /// # Errors
    /// `ConvErr::InvalidParameter` if either side is zero.
    pub fn with_input(&self, width: usize, height: usize) -> Result<Self> {
        Self::new(
            width,
            height,
            self.kernel_size,
            self.stride,
            self.padding,
            self.dilation,
        )
    }

    /// Returns a copy of this set with different kernel hyperparameters and the same input size.
    ///
    /// # Errors
    /// `ConvErr::InvalidParameter` if the kernel size, stride or dilation are zero.
    pub fn with_kernel(
        &self,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        dilation: usize,
    ) -> Result<Self> {
        Self::new(
            self.input_width,
            self.input_height,
            kernel_size,
            stride,
            padding,
            dilation,
        )
    }
}

impl Default for HyperparameterSet {
    fn default() -> Self {
        Self {
            input_width: 12,
            input_height: 12,
            kernel_size: 3,
            stride: 1,
            padding: 1,
            dilation: 1,
        }
    }
}
