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
//! Metrics derived from the loaded samples of an experiment.

use std::fmt;

use serde::Serialize;
use statrs::statistics::Statistics;

use crate::{
    dataset::ExperimentRecord,
    experiment::{Category, ExperimentKey, Metric, Side},
    matrix::Matrix,
    schema::{Column, Layout},
};

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Experiment {key} has no {category} samples")]
    MissingCategory {
        key: ExperimentKey,
        category: Category,
    },
    #[error("Column {column} is not part of the {layout} layout")]
    MissingColumn { column: Column, layout: Layout },
    #[error("Expected at least {expected} columns, found {found}")]
    TooFewColumns { found: usize, expected: usize },
    #[error("Invalid queue index {index} in {rows} interrupt samples")]
    QueueIndex { index: f64, rows: usize },
    #[error("{rows} interrupt samples cannot be split into chunks of {queues} queues")]
    Shape { rows: usize, queues: usize },
    #[error("No samples")]
    Empty,
}

/// Packet rate column observed by the given side.
pub fn pps_column(side: Side) -> Column {
    match side {
        Side::Tx => Column::TxPps,
        Side::Rx => Column::RxPps,
    }
}

/// Drop counter column observed by the given side.
pub fn drop_column(side: Side) -> Column {
    match side {
        Side::Tx => Column::TxDrop,
        Side::Rx => Column::RxDrop,
    }
}

/// Error counter column observed by the given side.
pub fn err_column(side: Side) -> Column {
    match side {
        Side::Tx => Column::TxErr,
        Side::Rx => Column::RxErr,
    }
}

/// Mean of a traffic column, as logged by the given side.
pub fn column_mean(
    record: &ExperimentRecord,
    side: Side,
    column: Column,
) -> Result<f64, MetricsError> {
    let values = record.column(side, column)?;
    if values.is_empty() {
        return Err(MetricsError::Empty);
    }
    Ok(values.mean())
}

/// Mean rates and counters of one experiment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub tx_pps: f64,
    pub rx_pps: f64,
    pub tx_drop: f64,
    pub rx_drop: f64,
    pub tx_err: f64,
    pub rx_err: f64,
    /// Sample standard deviation of the transmit rate.
    pub tx_pps_std: f64,
    /// Sample standard deviation of the receive rate.
    pub rx_pps_std: f64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mean TX PPS: {:.2} (std {:.2})", self.tx_pps, self.tx_pps_std)?;
        writeln!(f, "Mean RX PPS: {:.2} (std {:.2})", self.rx_pps, self.rx_pps_std)?;
        writeln!(f, "Mean TX Drop: {:.2}", self.tx_drop)?;
        writeln!(f, "Mean RX Drop: {:.2}", self.rx_drop)?;
        writeln!(f, "Mean TX Error: {:.2}", self.tx_err)?;
        write!(f, "Mean RX Error: {:.2}", self.rx_err)
    }
}

/// Summarize both sides of an experiment.
pub fn summarize(record: &ExperimentRecord) -> Result<Summary, MetricsError> {
    let tx_pps = record.column(Side::Tx, Column::TxPps)?;
    let rx_pps = record.column(Side::Rx, Column::RxPps)?;
    if tx_pps.is_empty() || rx_pps.is_empty() {
        return Err(MetricsError::Empty);
    }
    Ok(Summary {
        tx_pps: tx_pps.iter().mean(),
        rx_pps: rx_pps.iter().mean(),
        tx_drop: column_mean(record, Side::Tx, Column::TxDrop)?,
        rx_drop: column_mean(record, Side::Rx, Column::RxDrop)?,
        tx_err: column_mean(record, Side::Tx, Column::TxErr)?,
        rx_err: column_mean(record, Side::Rx, Column::RxErr)?,
        tx_pps_std: tx_pps.iter().std_dev(),
        rx_pps_std: rx_pps.iter().std_dev(),
    })
}

/// Element-wise division, yielding zero wherever the denominator is zero.
pub fn safe_divide(num: &[f64], den: &[f64]) -> Vec<f64> {
    num.iter()
        .zip(den)
        .map(|(n, d)| if *d == 0.0 { 0.0 } else { n / d })
        .collect()
}

/// Dropped packets per processed packet, for every sample of one side.
pub fn drop_rate(record: &ExperimentRecord, side: Side) -> Result<Vec<f64>, MetricsError> {
    let drops = record.column(side, drop_column(side))?;
    let pps = record.column(side, pps_column(side))?;
    Ok(safe_divide(&drops, &pps))
}

/// Sum interrupt counts per (queue, core).
///
/// The first column of `matrix` is the queue index, all further columns are interrupt counts of
/// one core. Each sampling interval logs one row per queue, so rows are split into consecutive
/// chunks of `max(queue index) + 1` rows, and rows at the same position within a chunk are added
/// up. The result has one row per queue and one column per core.
pub fn aggregate_interrupts(matrix: &Matrix) -> Result<Matrix, MetricsError> {
    if matrix.is_empty() {
        return Err(MetricsError::Empty);
    }
    if matrix.cols() < 2 {
        return Err(MetricsError::TooFewColumns {
            found: matrix.cols(),
            expected: 2,
        });
    }

    // queue indices are whole numbers below the number of samples
    let rows = matrix.rows();
    let mut max_queue = 0;
    for row in matrix.iter_rows() {
        let index = row[0];
        if !(index >= 0.0 && index < rows as f64 && index.fract() == 0.0) {
            return Err(MetricsError::QueueIndex { index, rows });
        }
        max_queue = max_queue.max(index as usize);
    }
    let queues = max_queue + 1;
    if matrix.rows() % queues != 0 {
        return Err(MetricsError::Shape {
            rows: matrix.rows(),
            queues,
        });
    }

    let mut result = Matrix::zeros(queues, matrix.cols() - 1);
    for (i, row) in matrix.iter_rows().enumerate() {
        result
            .row_mut(i % queues)
            .iter_mut()
            .zip(&row[1..])
            .for_each(|(acc, x)| *acc += x);
    }
    Ok(result)
}

/// Indices of the cores (columns) that received at least one interrupt.
pub fn active_cores(aggregate: &Matrix) -> Vec<usize> {
    aggregate
        .column_sums()
        .into_iter()
        .enumerate()
        .filter(|(_, total)| *total != 0.0)
        .map(|(core, _)| core)
        .collect()
}

/// Share of each cell in the total number of interrupts, in percent.
pub fn interrupt_percentages(aggregate: &Matrix) -> Matrix {
    let total = aggregate.sum();
    let mut result = aggregate.clone();
    for row in 0..result.rows() {
        result.row_mut(row).iter_mut().for_each(|x| {
            *x = if total == 0.0 { 0.0 } else { *x * 100.0 / total }
        });
    }
    result
}

/// Mean packet rate of every transmit and receive queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueRates {
    pub tx: Vec<f64>,
    pub rx: Vec<f64>,
}

/// Split the column means of a queue matrix into `queues` transmit queues followed by `queues`
/// receive queues.
pub fn queue_rates(matrix: &Matrix, queues: usize) -> Result<QueueRates, MetricsError> {
    if matrix.is_empty() {
        return Err(MetricsError::Empty);
    }
    if matrix.cols() < 2 * queues {
        return Err(MetricsError::TooFewColumns {
            found: matrix.cols(),
            expected: 2 * queues,
        });
    }
    let means = matrix.column_means();
    Ok(QueueRates {
        tx: means[..queues].to_vec(),
        rx: means[queues..2 * queues].to_vec(),
    })
}

/// Mean utilization of every core.
pub fn core_utilization(matrix: &Matrix) -> Result<Vec<f64>, MetricsError> {
    if matrix.is_empty() {
        return Err(MetricsError::Empty);
    }
    Ok(matrix.column_means())
}

/// Aggregated interrupts of one side of an experiment.
pub fn record_interrupts(record: &ExperimentRecord, side: Side) -> Result<Matrix, MetricsError> {
    aggregate_interrupts(record.matrix(Category::new(side, Metric::Interrupts))?)
}
