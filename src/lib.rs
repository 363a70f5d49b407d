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
//! Library for the offline analysis of packet generation experiments: grouping the logs of a
//! metric directory by experiment, deriving rates and interrupt statistics, and charting them.

pub mod dataset;
pub mod experiment;
pub mod matrix;
pub mod metrics;
pub mod plot;
pub mod sampling;
pub mod schema;
pub mod softnet;
pub mod util;

pub mod prelude {
    pub use super::{
        dataset::{Dataset, ExperimentRecord, Filter},
        experiment::{Category, ExperimentKey, Metric, Side},
        matrix::Matrix,
        plot::{ChartKind, OutputSink},
        schema::{Column, Layout},
    };
}
