use std::fmt;

use serde::Serialize;

use crate::{
    HyperparameterSet,
    geometry::{effective_kernel_size, output_dimensions, padded_dimensions},
};

/// Advisory findings about a set of hyperparameters. None of them block anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    KernelWiderThanInput { effective: usize, padded: usize },
    KernelTallerThanInput { effective: usize, padded: usize },
    NoOutput,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::KernelWiderThanInput { effective, padded } => write!(
                f,
                "effective kernel width {effective} is larger than padded width {padded}"
            ),
            Diagnostic::KernelTallerThanInput { effective, padded } => write!(
                f,
                "effective kernel height {effective} is larger than padded height {padded}"
            ),
            Diagnostic::NoOutput => write!(f, "parameters produce no output"),
        }
    }
}

/// Checks the hyperparameters and lists every diagnostic, in a fixed order.
///
/// # Returns
/// An empty list if the parameters produce a regular output.
pub fn validate(params: &HyperparameterSet) -> Vec<Diagnostic> {
    let effective = effective_kernel_size(params.kernel_size, params.dilation);
    let (padded_w, padded_h) = padded_dimensions(params);
    let mut diagnostics = Vec::new();

    if effective > padded_w {
        diagnostics.push(Diagnostic::KernelWiderThanInput {
            effective,
            padded: padded_w,
        });
    }

    if effective > padded_h {
        diagnostics.push(Diagnostic::KernelTallerThanInput {
            effective,
            padded: padded_h,
        });
    }

    if !output_dimensions(params).is_positive() {
        diagnostics.push(Diagnostic::NoOutput);
    }

    diagnostics
}
