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
//! Per-CPU packet processing statistics, as exposed in `/proc/net/softnet_stat`.
//!
//! Every line belongs to one CPU and holds hexadecimal counters. The number of counters depends
//! on the kernel version, see [`KernelLayout`].

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use itertools::Itertools;

/// Minimal width of every column in the verbose table.
const PADDING: usize = 5;

const V4_LABELS: [&str; 11] = [
    "sd->processed",
    "sd->dropped",
    "sd->time_squeeze",
    "0",
    "0",
    "0",
    "0",
    "0",
    "sd->cpu_collision",
    "sd->received_rps",
    "flow_limit_count",
];

const V5_LABELS: [&str; 13] = [
    "sd->processed",
    "sd->dropped",
    "sd->time_squeeze",
    "0",
    "0",
    "0",
    "0",
    "0",
    "0",
    "sd->received_rps",
    "flow_limit_count",
    "softnet_backlog_len(sd)",
    "(int)seq->index",
];

const V6_LABELS: [&str; 15] = [
    "sd->processed",
    "sd->dropped",
    "sd->time_squeeze",
    "0",
    "0",
    "0",
    "0",
    "0",
    "0",
    "sd->received_rps",
    "flow_limit_count",
    "softnet_backlog_len(sd)",
    "(int)seq->index",
    "softnet_input_pkt_queue_len(sd)",
    "softnet_process_queue_len(sd)",
];

#[derive(Debug, thiserror::Error)]
pub enum SoftnetError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid hex value {value:?} on line {line}")]
    InvalidHex { line: usize, value: String },
    #[error("Line {line} has {found} values, but previous lines have {expected}")]
    MixedLayout {
        line: usize,
        found: usize,
        expected: usize,
    },
    #[error("Cannot sort by {column}: rows only have {width} values")]
    SortColumnOutOfRange { column: SortColumn, width: usize },
}

/// Label table of a kernel version, selected by the number of values per line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
pub enum KernelLayout {
    /// Up to eleven values (kernel 4.x).
    #[default]
    V4,
    /// Twelve or thirteen values, adding the backlog length and the CPU index (kernel 5.x).
    V5,
    /// More than thirteen values, adding the queue lengths (kernel 6.x).
    V6,
}

impl KernelLayout {
    pub fn for_width(width: usize) -> Self {
        match width {
            0..=11 => Self::V4,
            12..=13 => Self::V5,
            _ => Self::V6,
        }
    }

    pub fn labels(self) -> &'static [&'static str] {
        match self {
            Self::V4 => &V4_LABELS,
            Self::V5 => &V5_LABELS,
            Self::V6 => &V6_LABELS,
        }
    }
}

/// Counters that can be used to sort the rows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum::Display, strum::EnumIter,
)]
#[value(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortColumn {
    Processed,
    Dropped,
    TimeSqueeze,
    CpuCollision,
    RxRps,
    FlowLimitCount,
}

impl SortColumn {
    /// Position of the counter within a line.
    pub const fn index(self) -> usize {
        match self {
            Self::Processed => 0,
            Self::Dropped => 1,
            Self::TimeSqueeze => 2,
            Self::CpuCollision => 8,
            Self::RxRps => 9,
            Self::FlowLimitCount => 10,
        }
    }
}

/// Decode a line of whitespace separated hexadecimal counters. `line` is only used for errors.
pub fn decode_line(text: &str, line: usize) -> Result<Vec<u64>, SoftnetError> {
    text.split_whitespace()
        .map(|token| {
            u64::from_str_radix(token, 16).map_err(|_| SoftnetError::InvalidHex {
                line,
                value: token.to_string(),
            })
        })
        .collect()
}

/// Counters of one CPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftnetRow {
    /// Position of the line in the input.
    pub cpu: usize,
    pub values: Vec<u64>,
}

/// All rows of one read, sharing the same kernel layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoftnetTable {
    pub layout: KernelLayout,
    pub rows: Vec<SoftnetRow>,
}

impl SoftnetTable {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, SoftnetError> {
        Self::parse(BufReader::new(File::open(path)?))
    }

    /// Parse all non-empty lines. All lines must hold the same number of values.
    pub fn parse(reader: impl BufRead) -> Result<Self, SoftnetError> {
        let mut rows: Vec<SoftnetRow> = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let values = decode_line(&line, i + 1)?;
            if let Some(first) = rows.first() {
                if first.values.len() != values.len() {
                    return Err(SoftnetError::MixedLayout {
                        line: i + 1,
                        found: values.len(),
                        expected: first.values.len(),
                    });
                }
            }
            rows.push(SoftnetRow {
                cpu: rows.len(),
                values,
            });
        }

        let layout = rows
            .first()
            .map(|r| KernelLayout::for_width(r.values.len()))
            .unwrap_or_default();
        log::trace!("Parsed {} CPUs with layout {layout}", rows.len());
        Ok(Self { layout, rows })
    }

    /// Number of values per row.
    pub fn width(&self) -> usize {
        self.rows.first().map(|r| r.values.len()).unwrap_or_default()
    }

    /// Stable ascending sort of the rows by one counter.
    pub fn sort_by(&mut self, column: SortColumn) -> Result<(), SoftnetError> {
        let index = column.index();
        if !self.rows.is_empty() && index >= self.width() {
            return Err(SoftnetError::SortColumnOutOfRange {
                column,
                width: self.width(),
            });
        }
        self.rows.sort_by_key(|r| r.values[index]);
        Ok(())
    }

    /// One line per CPU: the CPU index followed by all values.
    pub fn render_concise(&self) -> String {
        self.rows
            .iter()
            .map(|r| format!("{} {}", r.cpu, r.values.iter().join(" ")))
            .join("\n")
    }

    /// For every CPU, a title line, a row of labels and a row of values. Labels are zipped with
    /// the values that are present.
    pub fn render_table(&self) -> String {
        let labels = self.layout.labels();
        self.rows
            .iter()
            .map(|r| {
                let columns = labels
                    .iter()
                    .zip(&r.values)
                    .map(|(label, value)| (*label, value.to_string()))
                    .collect_vec();
                let header = columns
                    .iter()
                    .map(|(l, v)| format!("{l:<w$}", w = width(l, v)))
                    .join(" ");
                let values = columns
                    .iter()
                    .map(|(l, v)| format!("{v:<w$}", w = width(l, v)))
                    .join(" ");
                format!("CPU {}\n{}\n{}\n", r.cpu, header.trim_end(), values.trim_end())
            })
            .join("\n")
    }
}

fn width(label: &str, value: &str) -> usize {
    label.len().max(value.len()).max(PADDING)
}

#[cfg(test)]
mod test {
    use strum::IntoEnumIterator;

    use super::*;

    fn table(input: &str) -> SoftnetTable {
        SoftnetTable::parse(input.as_bytes()).unwrap()
    }

    fn line(values: &[u64]) -> String {
        values.iter().map(|v| format!("{v:08x}")).join(" ")
    }

    #[test]
    fn decode() {
        assert_eq!(decode_line("00000001 00000002 0000000a", 1).unwrap(), vec![1, 2, 10]);
        assert_eq!(decode_line("F0000769", 1).unwrap(), vec![0xf0000769]);
        assert!(matches!(
            decode_line("00000001 xyz", 4),
            Err(SoftnetError::InvalidHex { line: 4, .. })
        ));
    }

    #[test]
    fn layout_by_width() {
        assert_eq!(KernelLayout::for_width(3), KernelLayout::V4);
        assert_eq!(KernelLayout::for_width(11), KernelLayout::V4);
        assert_eq!(KernelLayout::for_width(12), KernelLayout::V5);
        assert_eq!(KernelLayout::for_width(13), KernelLayout::V5);
        assert_eq!(KernelLayout::for_width(15), KernelLayout::V6);
        assert_eq!(KernelLayout::V4.labels().len(), 11);
        assert_eq!(KernelLayout::V5.labels().len(), 13);
        assert_eq!(KernelLayout::V6.labels().len(), 15);
        for column in SortColumn::iter() {
            assert!(column.index() < KernelLayout::V4.labels().len());
        }
    }

    #[test]
    fn short_line_uses_v4() {
        let t = table("00000001 00000002 0000000a\n");
        assert_eq!(t.layout, KernelLayout::V4);
        assert_eq!(t.rows[0].values, vec![1, 2, 10]);
        assert_eq!(t.render_concise(), "0 1 2 10");

        let rendered = t.render_table();
        let lines = rendered.lines().collect_vec();
        assert_eq!(lines[0], "CPU 0");
        assert_eq!(lines[1], "sd->processed sd->dropped sd->time_squeeze");
        assert_eq!(lines[2], format!("{:<13} {:<11} 10", 1, 2));
    }

    #[test]
    fn short_labels_are_padded() {
        let t = table(&line(&[1, 2, 3, 0, 0, 0, 0, 0, 4, 5, 6]));
        assert_eq!(t.layout, KernelLayout::V4);
        let rendered = t.render_table();
        let lines = rendered.lines().collect_vec();
        assert_eq!(
            lines[1],
            "sd->processed sd->dropped sd->time_squeeze 0     0     0     0     0     \
             sd->cpu_collision sd->received_rps flow_limit_count"
        );
        assert_eq!(
            lines[2],
            format!(
                "{:<13} {:<11} {:<16} {} {:<17} {:<16} 6",
                1,
                2,
                3,
                ["0    "; 5].join(" "),
                4,
                5
            )
        );
    }

    #[test]
    fn mixed_widths_are_rejected() {
        let input = format!("{}\n{}\n", line(&[1; 11]), line(&[1; 13]));
        assert!(matches!(
            SoftnetTable::parse(input.as_bytes()),
            Err(SoftnetError::MixedLayout {
                line: 2,
                found: 13,
                expected: 11
            })
        ));
    }

    #[test]
    fn sorting_is_ascending_and_stable() {
        for width in [11, 13, 15] {
            let rows = [[5, 3], [1, 7], [9, 3], [2, 0]]
                .iter()
                .map(|[processed, dropped]| {
                    let mut values = vec![0; width];
                    values[0] = *processed;
                    values[1] = *dropped;
                    line(&values)
                })
                .join("\n");
            let mut t = table(&rows);
            t.sort_by(SortColumn::Dropped).unwrap();
            let dropped = t.rows.iter().map(|r| r.values[1]).collect_vec();
            assert!(dropped.windows(2).all(|w| w[0] <= w[1]));
            // rows with equal keys keep their order
            assert_eq!(t.rows.iter().map(|r| r.cpu).collect_vec(), vec![3, 0, 2, 1]);
        }
    }

    #[test]
    fn sort_column_out_of_range() {
        let mut t = table("00000001 00000002 0000000a\n00000003 00000001 00000000\n");
        assert!(matches!(
            t.sort_by(SortColumn::FlowLimitCount),
            Err(SoftnetError::SortColumnOutOfRange { width: 3, .. })
        ));
        t.sort_by(SortColumn::Dropped).unwrap();
        assert_eq!(t.render_concise(), "1 3 1 0\n0 1 2 10");
    }

    #[test]
    fn empty_input() {
        let mut t = table("\n\n");
        assert!(t.rows.is_empty());
        t.sort_by(SortColumn::FlowLimitCount).unwrap();
        assert_eq!(t.render_concise(), "");
    }
}
