// trafgen: Offline Analysis of Packet Generation and Monitoring Experiments
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Dense row-major matrix of samples, and loading it from the text logs of the harness.

use std::{fs, path::Path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Separator between the values of a row.
pub enum Delimiter {
    Comma,
    Whitespace,
}

#[derive(Debug, thiserror::Error)]
pub enum MatrixError {
    #[error("Row {row} has {found} columns, but {expected} were expected")]
    Ragged {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("Cannot stack a matrix with {found} columns onto one with {expected} columns")]
    ColumnMismatch { found: usize, expected: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Cannot parse {value:?} as a number on line {line}")]
    Number { line: u64, value: String },
    #[error("{0}")]
    Shape(#[from] MatrixError),
    #[error("Expected at least {expected} columns, found {found}")]
    TooFewColumns { found: usize, expected: usize },
}

/// Samples stored row by row. Each row is one sample, each column one measured value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Build a matrix from its rows. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, MatrixError> {
        let cols = rows.first().map(Vec::len).unwrap_or_default();
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(MatrixError::Ragged {
                    row: i,
                    found: row.len(),
                    expected: cols,
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            rows: rows.len(),
            cols,
        })
    }

    /// A `rows x cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.rows && col < self.cols).then(|| self.data[row * self.cols + col])
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(|r| self.row(r))
    }

    /// Copy out a single column. Returns `None` if the column does not exist.
    pub fn column(&self, col: usize) -> Option<Vec<f64>> {
        (col < self.cols).then(|| self.iter_rows().map(|row| row[col]).collect())
    }

    /// Drop the first `n` columns.
    pub fn skip_columns(&self, n: usize) -> Matrix {
        let n = n.min(self.cols);
        Matrix {
            data: self.iter_rows().flat_map(|row| row[n..].iter().copied()).collect(),
            rows: self.rows,
            cols: self.cols - n,
        }
    }

    /// Mean of every column. Empty matrices yield `NaN` for every column.
    pub fn column_means(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.cols];
        for row in self.iter_rows() {
            sums.iter_mut().zip(row).for_each(|(s, x)| *s += x);
        }
        sums.into_iter().map(|s| s / self.rows as f64).collect()
    }

    /// Sum of every column.
    pub fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.cols];
        for row in self.iter_rows() {
            sums.iter_mut().zip(row).for_each(|(s, x)| *s += x);
        }
        sums
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Append the rows of `other` below the rows of `self`.
    ///
    /// An empty matrix (no rows) takes on the shape of `other`.
    pub fn vstack(&mut self, other: Matrix) -> Result<(), MatrixError> {
        if self.rows == 0 {
            *self = other;
            return Ok(());
        }
        if other.rows == 0 {
            return Ok(());
        }
        if other.cols != self.cols {
            return Err(MatrixError::ColumnMismatch {
                found: other.cols,
                expected: self.cols,
            });
        }
        self.data.extend(other.data);
        self.rows += other.rows;
        Ok(())
    }
}

/// Load a matrix of floating point samples from a text file.
///
/// Blank lines and lines starting with `#` are ignored. All rows must have the same number of
/// values.
pub fn load_matrix(path: impl AsRef<Path>, delimiter: Delimiter) -> Result<Matrix, LoadError> {
    let path = path.as_ref();
    log::trace!("Loading {path:?} ({delimiter:?})");
    let rows = match delimiter {
        Delimiter::Comma => read_comma_separated(path)?,
        Delimiter::Whitespace => read_whitespace_separated(path)?,
    };
    Ok(Matrix::from_rows(rows)?)
}

fn parse_value(value: &str, line: u64) -> Result<f64, LoadError> {
    value.parse().map_err(|_| LoadError::Number {
        line,
        value: value.to_string(),
    })
}

fn read_comma_separated(path: &Path) -> Result<Vec<Vec<f64>>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        rows.push(
            record
                .iter()
                .map(|value| parse_value(value, line))
                .collect::<Result<_, _>>()?,
        );
    }
    Ok(rows)
}

fn read_whitespace_separated(path: &Path) -> Result<Vec<Vec<f64>>, LoadError> {
    fs::read_to_string(path)?
        .lines()
        .enumerate()
        .map(|(i, line)| (i as u64 + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(n, line)| {
            line.split_whitespace()
                .map(|value| parse_value(value, n))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test {
    use std::path::PathBuf;

    use super::*;

    /// Create an empty scratch directory for a single test.
    pub(crate) fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("trafgen-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn comma_separated() {
        let dir = scratch_dir("comma_separated");
        let path = dir.join("tx.log");
        fs::write(&path, "1,2,3\n4, 5 ,6\n\n# comment\n7,8,9\n").unwrap();

        let m = load_matrix(&path, Delimiter::Comma).unwrap();
        assert_eq!(m.shape(), (3, 3));
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m.column(2), Some(vec![3.0, 6.0, 9.0]));
        assert_eq!(m.column(3), None);
    }

    #[test]
    fn whitespace_separated() {
        let dir = scratch_dir("whitespace_separated");
        let path = dir.join("int.log");
        fs::write(&path, "0   10 20\n1\t30  40\n").unwrap();

        let m = load_matrix(&path, Delimiter::Whitespace).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.get(1, 2), Some(40.0));
        assert_eq!(m.get(2, 0), None);
    }

    #[test]
    fn malformed_content() {
        let dir = scratch_dir("malformed_content");
        let path = dir.join("bad.log");
        fs::write(&path, "1 2\n3 abc\n").unwrap();
        assert!(matches!(
            load_matrix(&path, Delimiter::Whitespace),
            Err(LoadError::Number { line: 2, .. })
        ));

        fs::write(&path, "1 2\n3\n").unwrap();
        assert!(matches!(
            load_matrix(&path, Delimiter::Whitespace),
            Err(LoadError::Shape(MatrixError::Ragged { row: 1, .. }))
        ));

        fs::write(&path, "1,2\n3\n").unwrap();
        assert!(load_matrix(&path, Delimiter::Comma).is_err());

        assert!(matches!(
            load_matrix(dir.join("missing.log"), Delimiter::Comma),
            Err(LoadError::Csv(_))
        ));
    }

    #[test]
    fn stacking() {
        let mut m = Matrix::default();
        m.vstack(Matrix::from_rows(vec![vec![1.0, 2.0]]).unwrap())
            .unwrap();
        m.vstack(Matrix::from_rows(vec![vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap())
            .unwrap();
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m.column_means(), vec![3.0, 4.0]);
        assert_eq!(m.sum(), 21.0);

        let err = m.vstack(Matrix::from_rows(vec![vec![1.0]]).unwrap());
        assert!(matches!(
            err,
            Err(MatrixError::ColumnMismatch {
                found: 1,
                expected: 2
            })
        ));
        assert_eq!(m.rows(), 3);
    }

    #[test]
    fn skip_columns() {
        let m = Matrix::from_rows(vec![vec![0.0, 1.0, 2.0], vec![1.0, 3.0, 4.0]]).unwrap();
        let rest = m.skip_columns(1);
        assert_eq!(rest.shape(), (2, 2));
        assert_eq!(rest.column_sums(), vec![4.0, 6.0]);
    }
}
