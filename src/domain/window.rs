//! Windower: overlapping fixed-length sequences paired with the next label.
//!
//! Window k covers feature rows [k, k + W) and is labelled with the label of
//! row k + W, so the label row is never inside its own window. For N rows
//! there are N - W windows (none when N <= W).
//!
//! [`Windower::iter`] yields borrowed windows on demand and can be restarted
//! any number of times; [`Dataset::from_windower`] materializes them into
//! rank-3 / rank-1 arrays.

use ndarray::{Array1, Array2, Array3, ArrayView2, s};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window<'a> {
    /// Row index of the first feature row.
    pub start: usize,
    pub features: ArrayView2<'a, f64>,
    /// `None` only when the label row itself is unlabeled.
    pub label: Option<u8>,
}

#[derive(Debug, Clone, Copy)]
pub struct Windower<'a> {
    features: ArrayView2<'a, f64>,
    labels: &'a [Option<u8>],
    window_size: usize,
}

impl<'a> Windower<'a> {
    /// `features` and `labels` must describe the same rows.
    pub fn new(
        features: ArrayView2<'a, f64>,
        labels: &'a [Option<u8>],
        window_size: usize,
    ) -> Self {
        debug_assert_eq!(features.nrows(), labels.len());
        Self {
            features,
            labels,
            window_size,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn num_features(&self) -> usize {
        self.features.ncols()
    }

    /// N - W, or 0 when N <= W.
    pub fn len(&self) -> usize {
        self.labels.len().min(self.features.nrows()).saturating_sub(self.window_size)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, k: usize) -> Option<Window<'a>> {
        if k >= self.len() {
            return None;
        }
        let end = k + self.window_size;
        Some(Window {
            start: k,
            features: self.features.slice_move(s![k..end, ..]),
            label: self.labels[end],
        })
    }

    pub fn iter(&self) -> Windows<'a> {
        Windows {
            windower: *self,
            next: 0,
        }
    }
}

impl<'a> IntoIterator for &Windower<'a> {
    type Item = Window<'a>;
    type IntoIter = Windows<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over a [`Windower`] in ascending row order.
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    windower: Windower<'a>,
    next: usize,
}

impl<'a> Iterator for Windows<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let window = self.windower.get(self.next)?;
        self.next += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.windower.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows<'_> {}

/// Materialized `(X, y)`: X is (num_windows, window_size, num_features),
/// y is (num_windows,).
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub x: Array3<f64>,
    pub y: Array1<u8>,
}

impl Dataset {
    pub fn empty(window_size: usize, num_features: usize) -> Self {
        Self {
            x: Array3::zeros((0, window_size, num_features)),
            y: Array1::zeros(0),
        }
    }

    /// Copy every labelled window into contiguous arrays. A window whose label
    /// row is unlabeled is skipped.
    pub fn from_windower(windower: &Windower<'_>) -> Self {
        if windower.is_empty() {
            return Self::empty(windower.window_size(), windower.num_features());
        }
        let labelled = windower.iter().filter(|w| w.label.is_some()).count();
        let skipped = windower.len() - labelled;
        if skipped > 0 {
            warn!(skipped, "skipped windows whose target row has no label");
        }

        let mut x = Array3::zeros((labelled, windower.window_size(), windower.num_features()));
        let mut y = Array1::zeros(labelled);

        let mut k = 0;
        for window in windower.iter() {
            let Some(label) = window.label else { continue };
            x.slice_mut(s![k, .., ..]).assign(&window.features);
            y[k] = label;
            k += 1;
        }

        Self { x, y }
    }

    /// Convenience wrapper over [`Windower`] for owned inputs.
    pub fn from_features(
        features: &Array2<f64>,
        labels: &[Option<u8>],
        window_size: usize,
    ) -> Self {
        Self::from_windower(&Windower::new(features.view(), labels, window_size))
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// (num_windows, window_size, num_features)
    pub fn shape(&self) -> (usize, usize, usize) {
        self.x.dim()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArrayView2<'_, f64>, u8)> + '_ {
        self.x.outer_iter().zip(self.y.iter().copied())
    }
}
