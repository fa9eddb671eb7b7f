use std::{fmt, str::FromStr};

use ndarray::{Array2, arr2};
use serde::Serialize;

use crate::{ConvErr, HyperparameterSet};

/// Named 3x3 kernel weight matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelPreset {
    #[default]
    EdgeDetect,
    Blur,
    Sharpen,
    Identity,
    Emboss,
}

impl KernelPreset {
    pub const ALL: [KernelPreset; 5] = [
        KernelPreset::EdgeDetect,
        KernelPreset::Blur,
        KernelPreset::Sharpen,
        KernelPreset::Identity,
        KernelPreset::Emboss,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            KernelPreset::EdgeDetect => "edge_detect",
            KernelPreset::Blur => "blur",
            KernelPreset::Sharpen => "sharpen",
            KernelPreset::Identity => "identity",
            KernelPreset::Emboss => "emboss",
        }
    }

    /// Returns the weight matrix of this preset, indexed as `[ky, kx]`.
    pub fn weights(&self) -> Array2<f64> {
        match self {
            KernelPreset::EdgeDetect => {
                arr2(&[[-1., -1., -1.], [-1., 8., -1.], [-1., -1., -1.]])
            }
            KernelPreset::Blur => Array2::from_elem((3, 3), 1. / 9.),
            KernelPreset::Sharpen => arr2(&[[0., -1., 0.], [-1., 5., -1.], [0., -1., 0.]]),
            KernelPreset::Identity => arr2(&[[0., 0., 0.], [0., 1., 0.], [0., 0., 0.]]),
            KernelPreset::Emboss => arr2(&[[-2., -1., 0.], [-1., 1., 1.], [0., 1., 2.]]),
        }
    }
}

impl fmt::Display for KernelPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for KernelPreset {
    type Err = ConvErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        KernelPreset::ALL
            .into_iter()
            .find(|p| p.name() == key)
            .ok_or_else(|| ConvErr::UnknownKernelPreset(s.to_string()))
    }
}

/// Named kernel hyperparameter combinations, applied on top of an input size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchPreset {
    Basic,
    SamePadding,
    Strided,
    Dilated,
    LargeKernel,
}

impl ArchPreset {
    pub const ALL: [ArchPreset; 5] = [
        ArchPreset::Basic,
        ArchPreset::SamePadding,
        ArchPreset::Strided,
        ArchPreset::Dilated,
        ArchPreset::LargeKernel,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ArchPreset::Basic => "basic",
            ArchPreset::SamePadding => "same_padding",
            ArchPreset::Strided => "strided",
            ArchPreset::Dilated => "dilated",
            ArchPreset::LargeKernel => "large_kernel",
        }
    }

    /// Returns `(kernel_size, stride, padding, dilation)`.
    pub fn values(&self) -> (usize, usize, usize, usize) {
        match self {
            ArchPreset::Basic => (3, 1, 0, 1),
            ArchPreset::SamePadding => (3, 1, 1, 1),
            ArchPreset::Strided => (3, 2, 1, 1),
            ArchPreset::Dilated => (3, 1, 2, 2),
            ArchPreset::LargeKernel => (5, 1, 2, 1),
        }
    }

    /// Builds a new set with this preset's kernel hyperparameters and the input size of `base`.
    pub fn apply(&self, base: &HyperparameterSet) -> HyperparameterSet {
        let (kernel_size, stride, padding, dilation) = self.values();

        HyperparameterSet {
            kernel_size,
            stride,
            padding,
            dilation,
            ..*base
        }
    }
}

impl fmt::Display for ArchPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ArchPreset {
    type Err = ConvErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        ArchPreset::ALL
            .into_iter()
            .find(|p| p.name() == key)
            .ok_or_else(|| ConvErr::UnknownArchPreset(s.to_string()))
    }
}
