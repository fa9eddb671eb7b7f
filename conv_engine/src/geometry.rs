use ndarray::Array2;
use serde::Serialize;

use crate::HyperparameterSet;

/// A cell position, `x` is the column and `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Output spatial size of a convolution.
///
/// Either side may be zero or negative, which means the hyperparameters produce no output. That is a
/// regular value and not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct OutputDimensions {
    pub width: i64,
    pub height: i64,
}

impl OutputDimensions {
    pub fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }

    /// Whether both sides are strictly positive.
    pub fn is_positive(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// The amount of output cells, zero if there's no valid output.
    pub fn area(&self) -> usize {
        match self.shape() {
            Some((h, w)) => h * w,
            None => 0,
        }
    }

    /// Returns the `(rows, cols)` shape of the output grid if there's any output at all.
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.is_positive()
            .then(|| (self.height as usize, self.width as usize))
    }

    pub fn contains(&self, coord: Coord) -> bool {
        (coord.x as i64) < self.width && (coord.y as i64) < self.height
    }
}

/// Region of the padded input read to produce a single output cell, bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ReceptiveField {
    pub start_x: usize,
    pub start_y: usize,
    pub end_x: usize,
    pub end_y: usize,
}

impl ReceptiveField {
    /// Side length of the field, which is the effective kernel size it was built with.
    pub fn size(&self) -> usize {
        self.end_x - self.start_x + 1
    }

    pub fn contains(&self, coord: Coord) -> bool {
        (self.start_x..=self.end_x).contains(&coord.x)
            && (self.start_y..=self.end_y).contains(&coord.y)
    }
}

/// Computes the footprint of a kernel once dilation is applied.
///
/// # Arguments
/// * `kernel_size` - Amount of taps per axis.
/// * `dilation` - Spacing between consecutive taps.
///
/// # Returns
/// `(kernel_size - 1) * dilation + 1`, odd whenever `kernel_size` is odd.
pub fn effective_kernel_size(kernel_size: usize, dilation: usize) -> usize {
    kernel_size
        .saturating_sub(1)
        .saturating_mul(dilation)
        .saturating_add(1)
}

/// Computes the output size along one axis.
///
/// The division floors towards negative infinity, so a kernel larger than the padded input gives a
/// non-positive size instead of rounding up to one. Sizes beyond `i64::MAX` saturate.
///
/// # Arguments
/// * `input_size` - Unpadded input size along the axis.
/// * `padding` - Padding on each side.
/// * `effective_kernel` - Effective kernel size.
/// * `stride` - Kernel step, at least 1.
///
/// # Returns
/// The output size, which may be zero or negative.
pub fn output_dimension(
    input_size: usize,
    padding: usize,
    effective_kernel: usize,
    stride: usize,
) -> i64 {
    let to_i64 = |v: Option<usize>| v.and_then(|v| i64::try_from(v).ok()).unwrap_or(i64::MAX);

    let padded = to_i64(padding.checked_mul(2).and_then(|p| p.checked_add(input_size)));
    let numerator = padded.saturating_sub(to_i64(Some(effective_kernel)));
    numerator
        .div_euclid(to_i64(Some(stride.max(1))))
        .saturating_add(1)
}

/// Computes both output sides for the given hyperparameters.
pub fn output_dimensions(params: &HyperparameterSet) -> OutputDimensions {
    let effective = effective_kernel_size(params.kernel_size, params.dilation);

    OutputDimensions {
        width: output_dimension(params.input_width, params.padding, effective, params.stride),
        height: output_dimension(params.input_height, params.padding, effective, params.stride),
    }
}

/// Size of the input once padding is added on every side, as `(width, height)`.
pub fn padded_dimensions(params: &HyperparameterSet) -> (usize, usize) {
    let pad = |size: usize| size.saturating_add(params.padding.saturating_mul(2));
    (pad(params.input_width), pad(params.input_height))
}

/// Computes the receptive field of an output coordinate in padded input space.
///
/// Out of range output coordinates still get a field, checking them is up to the caller.
pub fn receptive_field(
    output_x: usize,
    output_y: usize,
    stride: usize,
    effective_kernel: usize,
) -> ReceptiveField {
    let start_x = output_x * stride;
    let start_y = output_y * stride;
    let span = effective_kernel.max(1) - 1;

    ReceptiveField {
        start_x,
        start_y,
        end_x: start_x + span,
        end_y: start_y + span,
    }
}

/// Lists the positions of a receptive field actually sampled by the kernel, in row-major order.
///
/// # Arguments
/// * `field` - The receptive field.
/// * `dilation` - Spacing between taps, starting at the field's top-left corner.
///
/// # Returns
/// `kernel_size²` positions for a field built by [`receptive_field`].
pub fn kernel_tap_set(field: &ReceptiveField, dilation: usize) -> Vec<Coord> {
    let step = dilation.max(1);

    (field.start_y..=field.end_y)
        .step_by(step)
        .flat_map(|y| {
            (field.start_x..=field.end_x)
                .step_by(step)
                .map(move |x| Coord { x, y })
        })
        .collect()
}

/// Returns the center of a receptive field, exact whenever the effective kernel size is odd.
pub fn kernel_center(field: &ReceptiveField) -> Coord {
    Coord {
        x: (field.start_x + field.end_x) / 2,
        y: (field.start_y + field.end_y) / 2,
    }
}

/// Whether a padded input cell can ever be the top-left anchor of a receptive field.
///
/// # Arguments
/// * `padded_x`, `padded_y` - Cell in padded input space.
/// * `padding` - Padding on each side.
/// * `input_width`, `input_height` - Unpadded input size.
/// * `stride` - Kernel step.
///
/// # Returns
/// `true` if the cell is inside the unpadded region and its offset from the padding is a multiple of
/// the stride on both axes.
pub fn is_valid_kernel_anchor(
    padded_x: usize,
    padded_y: usize,
    padding: usize,
    input_width: usize,
    input_height: usize,
    stride: usize,
) -> bool {
    let stride = stride.max(1);
    let inside = |p: usize, size: usize| p >= padding && p - padding < size;

    inside(padded_x, input_width)
        && inside(padded_y, input_height)
        && (padded_x - padding) % stride == 0
        && (padded_y - padding) % stride == 0
}

/// Whether a padded input cell belongs to the zero padding border.
pub fn is_padding_cell(padded_x: usize, padded_y: usize, params: &HyperparameterSet) -> bool {
    let (w, h) = padded_dimensions(params);
    let p = params.padding;

    padded_x < p || padded_y < p || padded_x >= w - p || padded_y >= h - p
}

/// Marks every valid kernel anchor of the padded input.
///
/// # Returns
/// A `(padded_height, padded_width)` mask.
pub fn anchor_mask(params: &HyperparameterSet) -> Array2<bool> {
    let (w, h) = padded_dimensions(params);

    Array2::from_shape_fn((h, w), |(y, x)| {
        is_valid_kernel_anchor(
            x,
            y,
            params.padding,
            params.input_width,
            params.input_height,
            params.stride,
        )
    })
}
