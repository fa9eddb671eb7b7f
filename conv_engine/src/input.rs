use std::{collections::HashMap, sync::Arc};

use log::debug;
use ndarray::Array2;

/// A single channel input image, `(height, width)` samples in `[0, 255]`.
pub type InputGrid = Array2<f64>;

const MAX_SAMPLE: f64 = 255.0;

/// Generates the sample input for the given size.
///
/// Each cell is bright at the grid's geometric center and fades linearly with the euclidean
/// distance to it, reaching zero at the corners.
///
/// # Arguments
/// * `width` - Amount of columns.
/// * `height` - Amount of rows.
///
/// # Returns
/// A `(height, width)` grid of integral samples, identical for identical sizes.
pub fn generate_input(width: usize, height: usize) -> InputGrid {
    let cx = (width as f64 - 1.0) / 2.0;
    let cy = (height as f64 - 1.0) / 2.0;
    let max_dist = cx.hypot(cy);

    Array2::from_shape_fn((height, width), |(y, x)| {
        if max_dist <= 0.0 {
            return MAX_SAMPLE;
        }

        let dist = (x as f64 - cx).hypot(y as f64 - cy);
        ((1.0 - dist / max_dist) * MAX_SAMPLE)
            .round()
            .clamp(0.0, MAX_SAMPLE)
    })
}

/// Memoizes generated inputs by `(width, height)`.
#[derive(Debug, Default)]
pub struct InputCache {
    grids: HashMap<(usize, usize), Arc<InputGrid>>,
}

impl InputCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the input for the given size, generating it on the first request.
    pub fn get(&mut self, width: usize, height: usize) -> Arc<InputGrid> {
        self.grids
            .entry((width, height))
            .or_insert_with(|| {
                debug!(width = width, height = height; "generating synthetic input");
                Arc::new(generate_input(width, height))
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    pub fn clear(&mut self) {
        self.grids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_is_brightest_and_corners_are_dark() {
        let grid = generate_input(5, 5);

        assert_eq!(grid.dim(), (5, 5));
        assert_eq!(grid[[2, 2]], 255.0);
        assert_eq!(grid[[0, 0]], 0.0);
        assert_eq!(grid[[4, 4]], 0.0);
        assert!(grid.iter().all(|v| (0.0..=255.0).contains(v) && v.fract() == 0.0));
    }

    #[test]
    fn values_decrease_away_from_center() {
        let grid = generate_input(7, 7);
        let row = grid.row(3);

        for x in 0..3 {
            assert!(row[x] < row[x + 1]);
        }
    }

    #[test]
    fn single_cell_is_full_intensity() {
        let grid = generate_input(1, 1);
        assert_eq!(grid[[0, 0]], 255.0);
    }

    #[test]
    fn deterministic() {
        assert_eq!(generate_input(6, 4), generate_input(6, 4));
    }

    #[test]
    fn cache_reuses_grids() {
        let mut cache = InputCache::new();

        let a = cache.get(4, 3);
        let b = cache.get(4, 3);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.dim(), (3, 4));

        cache.get(3, 4);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
