use std::sync::Arc;

use log::{debug, info};
use ndarray::Array2;

use crate::{
    CellTrace, Diagnostic, HyperparameterSet, InputCache, InputGrid, KernelPreset, OutputGrid,
    convolution::{convolve, convolve_at},
    geometry::{
        self, Coord, OutputDimensions, ReceptiveField, effective_kernel_size, kernel_center,
        kernel_tap_set, output_dimensions, receptive_field,
    },
    validation::validate,
};

/// Values derived from a snapshot, always recomputed together.
#[derive(Debug)]
struct Derived {
    effective_kernel: usize,
    output_dims: OutputDimensions,
    diagnostics: Vec<Diagnostic>,
    input: Arc<InputGrid>,
    output: Option<OutputGrid>,
}

/// Holds the current hyperparameter snapshot and everything derived from it.
///
/// Every setter replaces the snapshot and recomputes the derived values from scratch, nothing is
/// patched incrementally. Only the synthetic input is cached, by input size.
#[derive(Debug)]
pub struct Explorer {
    params: HyperparameterSet,
    kernel: KernelPreset,
    show_values: bool,
    cache: InputCache,
    derived: Derived,
}

impl Explorer {
    /// Creates a new `Explorer`.
    ///
    /// # Arguments
    /// * `params` - The initial hyperparameters.
    /// * `kernel` - The kernel weights used for the output values.
    /// * `show_values` - Whether to compute the output values at all.
    ///
    /// # Returns
    /// A new `Explorer` with every derived value already computed.
    pub fn new(params: HyperparameterSet, kernel: KernelPreset, show_values: bool) -> Self {
        let mut cache = InputCache::new();
        let derived = derive(&params, kernel, show_values, &mut cache);

        Self {
            params,
            kernel,
            show_values,
            cache,
            derived,
        }
    }

    pub fn params(&self) -> &HyperparameterSet {
        &self.params
    }

    pub fn kernel(&self) -> KernelPreset {
        self.kernel
    }

    pub fn show_values(&self) -> bool {
        self.show_values
    }

    /// Replaces the whole hyperparameter snapshot.
    pub fn replace(&mut self, params: HyperparameterSet) {
        info!(
            width = params.input_width,
            height = params.input_height,
            kernel = params.kernel_size,
            stride = params.stride,
            padding = params.padding,
            dilation = params.dilation;
            "hyperparameters replaced"
        );

        self.params = params;
        self.recompute();
    }

    pub fn set_kernel(&mut self, kernel: KernelPreset) {
        debug!(kernel = kernel.name(); "kernel preset changed");
        self.kernel = kernel;
        self.recompute();
    }

    pub fn set_show_values(&mut self, show_values: bool) {
        self.show_values = show_values;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.derived = derive(&self.params, self.kernel, self.show_values, &mut self.cache);
    }

    pub fn effective_kernel_size(&self) -> usize {
        self.derived.effective_kernel
    }

    pub fn output_dims(&self) -> OutputDimensions {
        self.derived.output_dims
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.derived.diagnostics
    }

    pub fn input(&self) -> &InputGrid {
        &self.derived.input
    }

    /// Returns the convolution output, `None` while values are hidden.
    pub fn output(&self) -> Option<&OutputGrid> {
        self.derived.output.as_ref()
    }

    pub fn receptive_field(&self, output_x: usize, output_y: usize) -> ReceptiveField {
        receptive_field(
            output_x,
            output_y,
            self.params.stride,
            self.derived.effective_kernel,
        )
    }

    /// Returns the positions sampled by the kernel for an output cell.
    pub fn kernel_taps(&self, output_x: usize, output_y: usize) -> Vec<Coord> {
        kernel_tap_set(
            &self.receptive_field(output_x, output_y),
            self.params.dilation,
        )
    }

    pub fn kernel_center(&self, output_x: usize, output_y: usize) -> Coord {
        kernel_center(&self.receptive_field(output_x, output_y))
    }

    /// Marks the padded input cells that can anchor a receptive field.
    pub fn anchor_mask(&self) -> Array2<bool> {
        geometry::anchor_mask(&self.params)
    }

    /// Explains a single output cell, `None` if it's outside the current output.
    pub fn trace(&self, output_x: usize, output_y: usize) -> Option<CellTrace> {
        if !self.derived.output_dims.contains(Coord::new(output_x, output_y)) {
            return None;
        }

        let weights = self.kernel.weights();
        Some(convolve_at(
            self.derived.input.view(),
            weights.view(),
            &self.params,
            output_x,
            output_y,
        ))
    }
}

impl Default for Explorer {
    fn default() -> Self {
        Self::new(HyperparameterSet::default(), KernelPreset::default(), true)
    }
}

fn derive(
    params: &HyperparameterSet,
    kernel: KernelPreset,
    show_values: bool,
    cache: &mut InputCache,
) -> Derived {
    let effective_kernel = effective_kernel_size(params.kernel_size, params.dilation);
    let output_dims = output_dimensions(params);
    let diagnostics = validate(params);
    let input = cache.get(params.input_width, params.input_height);

    if !diagnostics.is_empty() {
        debug!(count = diagnostics.len(); "hyperparameters have diagnostics");
    }

    let output = show_values.then(|| {
        let weights = kernel.weights();
        convolve(input.view(), weights.view(), params)
    });

    Derived {
        effective_kernel,
        output_dims,
        diagnostics,
        input,
        output,
    }
}
