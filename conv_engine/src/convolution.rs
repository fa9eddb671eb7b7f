use ndarray::{Array2, ArrayView2};
use serde::Serialize;

use crate::{
    HyperparameterSet,
    geometry::{Coord, effective_kernel_size, output_dimensions, receptive_field},
};

/// Rounded convolution results, `(output_height, output_width)`.
pub type OutputGrid = Array2<i64>;

/// What a single kernel tap added to an output cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TapContribution {
    /// Tap position in padded input space.
    pub padded: Coord,
    /// `(ky, kx)` index into the nominal kernel.
    pub kernel_index: (usize, usize),
    /// Input sample, zero inside the padding.
    pub sample: f64,
    /// The weight applied, `None` when the index falls outside the weight matrix.
    pub weight: Option<f64>,
}

/// Breakdown of a single output cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellTrace {
    pub raw: f64,
    pub value: i64,
    pub taps: Vec<TapContribution>,
}

/// Convolves the input with the kernel weights.
///
/// Taps landing in the padding sample zero. Kernel indexes outside the weight matrix contribute
/// nothing, so a 3x3 matrix with `kernel_size = 5` only weights the top-left 3x3 taps even though the
/// receptive field spans the whole dilated 5x5 footprint.
///
/// # Arguments
/// * `input` - The unpadded input, `(input_height, input_width)`.
/// * `weights` - The kernel weights, indexed as `[ky, kx]`.
/// * `params` - The hyperparameters.
///
/// # Returns
/// The output grid, empty when the parameters produce no output.
pub fn convolve(
    input: ArrayView2<f64>,
    weights: ArrayView2<f64>,
    params: &HyperparameterSet,
) -> OutputGrid {
    let Some(shape) = output_dimensions(params).shape() else {
        return Array2::zeros((0, 0));
    };

    Array2::from_shape_fn(shape, |(oy, ox)| {
        let mut sum = 0.0;
        for_each_tap(input, params, ox, oy, |ky, kx, _, sample| {
            if let Some(w) = weights.get((ky, kx)) {
                sum += sample * w;
            }
        });

        round_half_up(sum)
    })
}

/// Computes a single output cell and records every tap that went into it.
///
/// The coordinate isn't range checked, out of range cells just read padding.
pub fn convolve_at(
    input: ArrayView2<f64>,
    weights: ArrayView2<f64>,
    params: &HyperparameterSet,
    output_x: usize,
    output_y: usize,
) -> CellTrace {
    let mut raw = 0.0;
    let mut taps = Vec::with_capacity(params.kernel_size * params.kernel_size);

    for_each_tap(input, params, output_x, output_y, |ky, kx, padded, sample| {
        let weight = weights.get((ky, kx)).copied();
        if let Some(w) = weight {
            raw += sample * w;
        }

        taps.push(TapContribution {
            padded,
            kernel_index: (ky, kx),
            sample,
            weight,
        });
    });

    CellTrace {
        raw,
        value: round_half_up(raw),
        taps,
    }
}

fn for_each_tap<F>(
    input: ArrayView2<f64>,
    params: &HyperparameterSet,
    output_x: usize,
    output_y: usize,
    mut f: F,
) where
    F: FnMut(usize, usize, Coord, f64),
{
    let &HyperparameterSet {
        input_width,
        input_height,
        kernel_size,
        stride,
        padding,
        dilation,
    } = params;

    let effective = effective_kernel_size(kernel_size, dilation);
    let field = receptive_field(output_x, output_y, stride, effective);

    for ky in 0..kernel_size {
        for kx in 0..kernel_size {
            let padded = Coord {
                x: field.start_x + kx * dilation,
                y: field.start_y + ky * dilation,
            };

            let sample = match (
                unpad(padded.x, padding, input_width),
                unpad(padded.y, padding, input_height),
            ) {
                (Some(x), Some(y)) => input.get((y, x)).copied().unwrap_or(0.0),
                _ => 0.0,
            };

            f(ky, kx, padded, sample);
        }
    }
}

fn unpad(p: usize, padding: usize, size: usize) -> Option<usize> {
    p.checked_sub(padding).filter(|i| *i < size)
}

/// Rounds to the nearest integer with halves going up, `-2.5` becomes `-2`.
fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use ndarray::arr2;

    use super::*;
    use crate::{KernelPreset, generate_input};

    #[test]
    fn identity_reproduces_input() {
        let input = generate_input(6, 5);
        let params = HyperparameterSet::new(6, 5, 3, 1, 1, 1).unwrap();
        let out = convolve(input.view(), KernelPreset::Identity.weights().view(), &params);

        assert_eq!(out.dim(), (5, 6));
        for ((y, x), v) in out.indexed_iter() {
            assert_eq!(*v, input[[y, x]] as i64);
        }
    }

    #[test]
    fn zero_padding_contributes_nothing() {
        let input = Array2::from_elem((3, 3), 1.0);
        let ones = Array2::from_elem((3, 3), 1.0);
        let params = HyperparameterSet::new(3, 3, 3, 1, 1, 1).unwrap();
        let out = convolve(input.view(), ones.view(), &params);

        assert_eq!(out, arr2(&[[4, 6, 4], [6, 9, 6], [4, 6, 4]]));
    }

    #[test]
    fn stride_and_dilation() {
        let input = Array2::from_shape_fn((5, 5), |(y, x)| (y * 5 + x) as f64);
        let ones = Array2::from_elem((3, 3), 1.0);

        // eff 5, no padding: single output summing the corners, edge midpoints and center
        let params = HyperparameterSet::new(5, 5, 3, 1, 0, 2).unwrap();
        let out = convolve(input.view(), ones.view(), &params);
        assert_eq!(out, arr2(&[[108]]));

        let params = HyperparameterSet::new(5, 5, 1, 2, 0, 1).unwrap();
        let out = convolve(input.view(), ones.view(), &params);
        assert_eq!(out, arr2(&[[0, 2, 4], [10, 12, 14], [20, 22, 24]]));
    }

    #[test]
    fn taps_outside_weight_matrix_are_ignored() {
        let input = Array2::from_elem((5, 5), 1.0);
        let ones = Array2::from_elem((3, 3), 1.0);
        let params = HyperparameterSet::new(5, 5, 5, 1, 0, 1).unwrap();

        let out = convolve(input.view(), ones.view(), &params);
        assert_eq!(out, arr2(&[[9]]));

        let trace = convolve_at(input.view(), ones.view(), &params, 0, 0);
        assert_eq!(trace.taps.len(), 25);
        assert_eq!(trace.taps.iter().filter(|t| t.weight.is_none()).count(), 16);
    }

    #[test]
    fn no_output_is_empty_grid() {
        let input = generate_input(2, 2);
        let params = HyperparameterSet::new(2, 2, 5, 1, 0, 1).unwrap();
        let out = convolve(input.view(), KernelPreset::Blur.weights().view(), &params);

        assert_eq!(out.len(), 0);
    }

    #[test]
    fn trace_matches_grid() {
        let input = generate_input(7, 7);
        let weights = KernelPreset::Emboss.weights();
        let params = HyperparameterSet::new(7, 7, 3, 2, 1, 1).unwrap();
        let out = convolve(input.view(), weights.view(), &params);

        let trace = convolve_at(input.view(), weights.view(), &params, 2, 1);
        assert_eq!(trace.value, out[[1, 2]]);
        assert_eq!(trace.taps[0].padded, Coord::new(4, 2));
    }

    #[test]
    fn rounding_halves_up() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.6), -3);
    }
}
