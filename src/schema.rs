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
//! Column schema of the transmit/receive traffic matrices.
//!
//! Every traffic log holds one sample per line. The position of each value is fixed, and is
//! encoded in the discriminant of [`Column`]. Older runs wrote only the first nine columns, which
//! is captured by [`Layout::Legacy`].

use serde::Serialize;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    strum::Display,
    strum::EnumIter,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
/// Named columns of a traffic matrix, with their offset as discriminant.
pub enum Column {
    RxPps = 0,
    TxPps = 1,
    RxDrop = 2,
    TxDrop = 3,
    RxErr = 4,
    TxErr = 5,
    RxBytes = 6,
    TxBytes = 7,
    IrqRate = 8,
    #[strum(serialize = "s_irq_rate")]
    #[serde(rename = "s_irq_rate")]
    SoftIrqRate = 9,
    NetTxRate = 10,
    NetRxRate = 11,
    CpuCore = 12,
    CpuUsage = 13,
}

impl Column {
    /// Offset of the column within a sample row.
    pub const fn offset(self) -> usize {
        self as usize
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::RxPps => "Received PPS",
            Self::TxPps => "Transmitted PPS",
            Self::RxDrop => "Received Drops",
            Self::TxDrop => "Transmitted Drops",
            Self::RxErr => "Received Errors",
            Self::TxErr => "Transmitted Errors",
            Self::RxBytes => "Received Bytes",
            Self::TxBytes => "Transmitted Bytes",
            Self::IrqRate => "IRQ Rate",
            Self::SoftIrqRate => "Soft IRQ Rate",
            Self::NetTxRate => "Network Transmit Rate",
            Self::NetRxRate => "Network Receive Rate",
            Self::CpuCore => "CPU Core",
            Self::CpuUsage => "CPU Usage",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
/// Which columns a traffic matrix is expected to carry.
pub enum Layout {
    /// `tx_<rate>pps_...txt` files, holding the first nine columns.
    Legacy,
    /// All fourteen columns.
    #[default]
    Current,
}

impl Layout {
    /// Minimal number of columns of a traffic matrix in this layout.
    pub const fn width(self) -> usize {
        match self {
            Self::Legacy => Column::IrqRate.offset() + 1,
            Self::Current => Column::CpuUsage.offset() + 1,
        }
    }

    pub const fn contains(self, column: Column) -> bool {
        column.offset() < self.width()
    }

    /// Iterate over all columns available in this layout, ordered by offset.
    pub fn columns(self) -> impl Iterator<Item = Column> {
        use strum::IntoEnumIterator;
        Column::iter().filter(move |c| self.contains(*c))
    }
}
