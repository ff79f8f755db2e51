//! Long-duration spectrogram store
//!
//! Holds one `segments × frequency bins` matrix per index name. Every matrix
//! shares the shape fixed by the first insertion, and a rejected insertion
//! leaves the store untouched.

use std::collections::BTreeMap;

use crate::error::{AnalysisError, Result};

/// Dense row-major matrix of index values, rows = segments, columns = bins.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl IndexMatrix {
    /// Zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from rows of equal length.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != cols) {
            return Err(AnalysisError::InvalidInput(format!(
                "row {i} has {} values, expected {cols}",
                row.len()
            )));
        }
        let count = rows.len();
        Ok(Self {
            rows: count,
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of segments.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of frequency bins.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row `i`.
    pub fn row(&self, i: usize) -> Option<&[f32]> {
        (i < self.rows).then(|| &self.data[i * self.cols..(i + 1) * self.cols])
    }

    /// Mutable row `i`.
    pub fn row_mut(&mut self, i: usize) -> Option<&mut [f32]> {
        (i < self.rows).then(|| &mut self.data[i * self.cols..(i + 1) * self.cols])
    }

    /// Value at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        (row < self.rows && col < self.cols).then(|| self.data[row * self.cols + col])
    }

    /// Iterate over rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact(0) panics; an empty matrix has no rows either way
        self.data.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    /// Flat row-major values.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Copy scaled to `0..=1` by `(x - min) / max(x - min)`.
    ///
    /// A constant matrix maps to zeros.
    pub fn normalized(&self) -> IndexMatrix {
        let min = self.data.iter().copied().fold(f32::INFINITY, f32::min);
        let range = self
            .data
            .iter()
            .map(|&x| x - min)
            .fold(0.0f32, f32::max);
        let data = if range > 0.0 && range.is_finite() {
            self.data.iter().map(|&x| (x - min) / range).collect()
        } else {
            vec![0.0; self.data.len()]
        };
        IndexMatrix {
            rows: self.rows,
            cols: self.cols,
            data,
        }
    }
}

/// Per-index result matrices of a recording.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrogramStore {
    sample_rate: u32,
    shape: Option<(usize, usize)>,
    indices: BTreeMap<String, IndexMatrix>,
}

impl SpectrogramStore {
    /// Empty store for a recording at `sample_rate`.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            shape: None,
            indices: BTreeMap::new(),
        }
    }

    /// Sample rate the frequency axis is derived from.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Shape shared by every index, once established.
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.shape
    }

    /// Establish `shape` if none is set, otherwise require it to match.
    pub fn ensure_shape(&mut self, shape: (usize, usize)) -> Result<()> {
        match self.shape {
            None => {
                self.shape = Some(shape);
                Ok(())
            }
            Some(expected) if expected == shape => Ok(()),
            Some(expected) => Err(AnalysisError::ShapeMismatch {
                expected,
                actual: shape,
            }),
        }
    }

    /// Insert or replace a whole index.
    pub fn add_index(&mut self, name: impl Into<String>, matrix: IndexMatrix) -> Result<()> {
        self.ensure_shape(matrix.shape())?;
        self.indices.insert(name.into(), matrix);
        Ok(())
    }

    /// Overwrite row `segment` of each named index, creating zero-filled
    /// indices as needed. All rows are validated before any is written.
    pub fn add_segment<S: AsRef<str>>(
        &mut self,
        segment: usize,
        rows: &[(S, Vec<f32>)],
    ) -> Result<()> {
        let (num_rows, num_cols) = self.shape.ok_or(AnalysisError::ShapeUnset)?;
        if segment >= num_rows {
            return Err(AnalysisError::RowOutOfRange {
                index: segment,
                rows: num_rows,
            });
        }
        if let Some((name, row)) = rows.iter().find(|(_, row)| row.len() != num_cols) {
            return Err(AnalysisError::RowWidth {
                index: name.as_ref().to_string(),
                expected: num_cols,
                actual: row.len(),
            });
        }

        for (name, row) in rows {
            let matrix = self
                .indices
                .entry(name.as_ref().to_string())
                .or_insert_with(|| IndexMatrix::zeros(num_rows, num_cols));
            if let Some(target) = matrix.row_mut(segment) {
                target.copy_from_slice(row);
            }
        }
        Ok(())
    }

    /// Stored matrix for `name`.
    pub fn result(&self, name: &str) -> Result<&IndexMatrix> {
        self.indices
            .get(name)
            .ok_or_else(|| AnalysisError::MissingIndex(name.to_string()))
    }

    /// Display copy of `name` scaled to `0..=1`.
    pub fn color_result(&self, name: &str) -> Result<IndexMatrix> {
        self.result(name).map(IndexMatrix::normalized)
    }

    /// Frequency of each column: `k · (sr / 2) / cols`.
    pub fn frequencies(&self) -> Vec<f32> {
        let cols = self.shape.map_or(0, |(_, cols)| cols);
        let nyquist = self.sample_rate as f32 / 2.0;
        (0..cols).map(|k| k as f32 * nyquist / cols as f32).collect()
    }

    /// Stored index names, sorted.
    pub fn indices(&self) -> Vec<&str> {
        self.indices.keys().map(String::as_str).collect()
    }

    /// Whether `name` is stored.
    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    /// Number of stored indices.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether no index is stored.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over `(name, matrix)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexMatrix)> {
        self.indices.iter().map(|(name, matrix)| (name.as_str(), matrix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(rows: usize, cols: usize, value: f32) -> IndexMatrix {
        IndexMatrix::from_rows(vec![vec![value; cols]; rows]).unwrap()
    }

    #[test]
    fn first_insertion_fixes_shape() {
        let mut store = SpectrogramStore::new(22050);
        assert_eq!(store.shape(), None);
        store.add_index("Ht", filled(4, 256, 1.0)).unwrap();
        assert_eq!(store.shape(), Some((4, 256)));
    }

    #[test]
    fn mismatched_shape_is_rejected_without_mutation() {
        let mut store = SpectrogramStore::new(22050);
        store.add_index("Ht", filled(4, 256, 1.0)).unwrap();
        let before = store.clone();

        let err = store.add_index("Hf", filled(3, 256, 2.0)).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::ShapeMismatch {
                expected: (4, 256),
                actual: (3, 256)
            }
        ));
        assert_eq!(store, before);
        assert_eq!(store.indices(), vec!["Ht"]);
    }

    #[test]
    fn add_segment_requires_shape_and_valid_rows() {
        let mut store = SpectrogramStore::new(22050);
        let rows = vec![("ACI", vec![1.0; 4])];
        assert!(matches!(store.add_segment(0, &rows), Err(AnalysisError::ShapeUnset)));

        store.ensure_shape((3, 4)).unwrap();
        store.add_segment(1, &rows).unwrap();
        let aci = store.result("ACI").unwrap();
        assert_eq!(aci.row(0), Some(&[0.0; 4][..]));
        assert_eq!(aci.row(1), Some(&[1.0; 4][..]));

        assert!(matches!(
            store.add_segment(3, &rows),
            Err(AnalysisError::RowOutOfRange { index: 3, rows: 3 })
        ));
    }

    #[test]
    fn bad_row_width_rejects_whole_segment() {
        let mut store = SpectrogramStore::new(22050);
        store.ensure_shape((2, 4)).unwrap();
        let rows = vec![("Ht", vec![1.0; 4]), ("Hf", vec![1.0; 3])];
        let err = store.add_segment(0, &rows).unwrap_err();
        assert!(matches!(err, AnalysisError::RowWidth { expected: 4, actual: 3, .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn missing_index_is_an_error() {
        let store = SpectrogramStore::new(22050);
        assert!(matches!(store.result("Ht"), Err(AnalysisError::MissingIndex(_))));
    }

    #[test]
    fn color_result_normalizes_copy() {
        let mut store = SpectrogramStore::new(22050);
        let matrix = IndexMatrix::from_rows(vec![vec![2.0, 4.0], vec![6.0, 10.0]]).unwrap();
        store.add_index("ACI", matrix.clone()).unwrap();

        let color = store.color_result("ACI").unwrap();
        assert_eq!(color.as_slice(), &[0.0, 0.25, 0.5, 1.0]);
        assert_eq!(store.result("ACI").unwrap(), &matrix);

        store.add_index("M", filled(2, 2, 7.0)).unwrap();
        assert_eq!(store.color_result("M").unwrap().as_slice(), &[0.0; 4]);
    }

    #[test]
    fn frequency_axis_excludes_nyquist() {
        let mut store = SpectrogramStore::new(22050);
        store.ensure_shape((1, 4)).unwrap();
        assert_eq!(store.frequencies(), vec![0.0, 2756.25, 5512.5, 8268.75]);
    }

    #[test]
    fn frequency_axis_keeps_half_hertz_nyquist_at_odd_rates() {
        let mut store = SpectrogramStore::new(11025);
        store.add_index("Ht", IndexMatrix::zeros(1, 256)).unwrap();
        let freqs = store.frequencies();
        assert_eq!(freqs.len(), 256);
        let step = 5512.5 / 256.0;
        assert!((freqs[1] - step).abs() < 1e-4);
        assert!((freqs[255] - 255.0 * step).abs() < 1e-2, "last = {}", freqs[255]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(IndexMatrix::from_rows(vec![vec![1.0, 2.0], vec![1.0]]).is_err());
    }
}
