//! CSV persistence for index results.
//!
//! The table has one row per frequency bin and a two-level column header:
//! segment start time (seconds) on the first header row, index name on the
//! second. The third row names the row axis and carries no values.
//!
//! ```text
//! ,0,0,60,60
//! ,ACI,Ht,ACI,Ht
//! frequencies,,,,
//! 0,0.12,0.98,0.15,0.97
//! 43.066406,0.11,0.98,0.14,0.97
//! ```
//!
//! In memory each index is a `segments × bins` [`IndexMatrix`], so loading and
//! saving transpose between the two layouts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{AnalysisError, Result};
use crate::store::{IndexMatrix, SpectrogramStore};

/// Label of the row axis.
pub const ROW_AXIS: &str = "frequencies";

/// Required file extension.
pub const EXTENSION: &str = "csv";

/// Contents of a parsed index table.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexTable {
    /// Segment start times in seconds, in column order
    pub timestamps: Vec<f64>,
    /// Row labels in Hz
    pub frequencies: Vec<f32>,
    /// Index name and `segments × bins` matrix, in column order
    pub indices: Vec<(String, IndexMatrix)>,
}

impl IndexTable {
    /// Build a store holding every index of the table.
    pub fn into_store(self, sample_rate: u32) -> Result<SpectrogramStore> {
        let mut store = SpectrogramStore::new(sample_rate);
        for (name, matrix) in self.indices {
            store.add_index(name, matrix)?;
        }
        Ok(store)
    }
}

fn check_extension(path: &Path) -> Result<()> {
    let ok = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(EXTENSION));
    if ok {
        Ok(())
    } else {
        Err(AnalysisError::Extension(path.to_path_buf()))
    }
}

/// Write every index of `store` to `path`.
///
/// `timestamps` gives the start time of each segment row and must match the
/// store's row count.
pub fn write_index_table(
    store: &SpectrogramStore,
    timestamps: &[f64],
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    check_extension(path)?;

    let (rows, cols) = store
        .shape()
        .filter(|_| !store.is_empty())
        .ok_or_else(|| AnalysisError::InvalidInput("no indices to save".to_string()))?;
    if timestamps.len() != rows {
        return Err(AnalysisError::InvalidInput(format!(
            "{} timestamps for {rows} segments",
            timestamps.len()
        )));
    }
    if let Some(name) = store.indices().into_iter().find(|name| name.contains([',', '\n', '\r'])) {
        return Err(AnalysisError::InvalidInput(format!(
            "index name '{name}' cannot be written to CSV"
        )));
    }

    let indices: Vec<(&str, &IndexMatrix)> = store.iter().collect();
    let mut file = BufWriter::new(File::create(path)?);

    // Header row 1: segment timestamps
    for &t in timestamps {
        for _ in &indices {
            write!(file, ",{t}")?;
        }
    }
    writeln!(file)?;

    // Header row 2: index names
    for _ in timestamps {
        for (name, _) in &indices {
            write!(file, ",{name}")?;
        }
    }
    writeln!(file)?;

    // Row axis name, no values
    write!(file, "{ROW_AXIS}")?;
    for _ in 0..rows * indices.len() {
        write!(file, ",")?;
    }
    writeln!(file)?;

    let frequencies = store.frequencies();
    for (bin, frequency) in frequencies.iter().enumerate().take(cols) {
        write!(file, "{frequency}")?;
        for segment in 0..rows {
            for (_, matrix) in &indices {
                let value = matrix.get(segment, bin).unwrap_or(0.0);
                write!(file, ",{value}")?;
            }
        }
        writeln!(file)?;
    }

    file.flush()?;
    tracing::info!(
        path = %path.display(),
        indices = indices.len(),
        segments = rows,
        "saved index table"
    );
    Ok(())
}

/// Read and validate an index table.
pub fn read_index_table(path: impl AsRef<Path>) -> Result<IndexTable> {
    let path = path.as_ref();
    check_extension(path)?;
    if !path.exists() {
        return Err(AnalysisError::NotFound(path.to_path_buf()));
    }

    let text = std::fs::read_to_string(path)?;
    let table = parse_index_table(&text).map_err(|reason| AnalysisError::format(path, reason))?;
    tracing::info!(
        path = %path.display(),
        indices = table.indices.len(),
        segments = table.timestamps.len(),
        "loaded index table"
    );
    Ok(table)
}

fn split_row(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

/// Parse table text, returning a description of the first layout problem.
fn parse_index_table(text: &str) -> std::result::Result<IndexTable, String> {
    let lines: Vec<&str> = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .collect();
    let end = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(0, |last| last + 1);
    let lines = &lines[..end];

    if lines.len() < 3 {
        return Err(format!(
            "expected two column header rows and a row axis row, found {} rows",
            lines.len()
        ));
    }

    let time_row = split_row(lines[0]);
    let name_row = split_row(lines[1]);
    let axis_row = split_row(lines[2]);
    let width = time_row.len();

    if width < 2 {
        return Err("header has no data columns".to_string());
    }
    if name_row.len() != width {
        return Err(format!(
            "column header rows differ in width ({width} and {})",
            name_row.len()
        ));
    }
    let axis_label_missing = axis_row.first().is_none_or(|label| label.is_empty());
    if axis_label_missing || axis_row[1..].iter().any(|cell| !cell.is_empty()) {
        return Err("expected one row index level and two column index levels".to_string());
    }
    if axis_row.len() != width {
        return Err(format!("row axis row has {} cells, expected {width}", axis_row.len()));
    }

    // Distinct timestamps and names in first-appearance order
    let mut times: Vec<&str> = Vec::new();
    let mut names: Vec<&str> = Vec::new();
    let mut columns = Vec::with_capacity(width - 1);
    for (&time, &name) in time_row[1..].iter().zip(&name_row[1..]) {
        if time.is_empty() || name.is_empty() {
            return Err("empty column header cell".to_string());
        }
        let t = times.iter().position(|&x| x == time).unwrap_or_else(|| {
            times.push(time);
            times.len() - 1
        });
        let n = names.iter().position(|&x| x == name).unwrap_or_else(|| {
            names.push(name);
            names.len() - 1
        });
        columns.push((t, n));
    }

    let mut seen = vec![false; times.len() * names.len()];
    for &(t, n) in &columns {
        let slot = &mut seen[t * names.len() + n];
        if *slot {
            return Err(format!("duplicate column ({}, {})", times[t], names[n]));
        }
        *slot = true;
    }
    if seen.iter().any(|present| !present) {
        return Err("index columns are not present for every timestamp".to_string());
    }

    let timestamps = times
        .iter()
        .map(|time| {
            time.parse::<f64>()
                .map_err(|_| format!("invalid timestamp '{time}'"))
        })
        .collect::<std::result::Result<Vec<f64>, String>>()?;

    let data_rows = &lines[3..];
    if data_rows.is_empty() {
        return Err("table has no frequency rows".to_string());
    }

    let mut frequencies = Vec::with_capacity(data_rows.len());
    let mut values: Vec<Vec<Vec<f32>>> =
        vec![vec![vec![0.0; data_rows.len()]; times.len()]; names.len()];
    for (bin, line) in data_rows.iter().enumerate() {
        let cells = split_row(line);
        if cells.len() != width {
            return Err(format!(
                "row {} has {} cells, expected {width}",
                bin + 4,
                cells.len()
            ));
        }
        let frequency = cells[0]
            .parse::<f32>()
            .map_err(|_| format!("invalid row label '{}' on row {}", cells[0], bin + 4))?;
        frequencies.push(frequency);

        for (&(t, n), cell) in columns.iter().zip(&cells[1..]) {
            values[n][t][bin] = cell
                .parse::<f32>()
                .map_err(|_| format!("invalid value '{cell}' on row {}", bin + 4))?;
        }
    }

    let indices = names
        .iter()
        .zip(values)
        .map(|(name, rows)| {
            IndexMatrix::from_rows(rows)
                .map(|matrix| (name.to_string(), matrix))
                .map_err(|e| e.to_string())
        })
        .collect::<std::result::Result<Vec<_>, String>>()?;

    Ok(IndexTable {
        timestamps,
        frequencies,
        indices,
    })
}
