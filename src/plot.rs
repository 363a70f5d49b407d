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
//! Charts comparing the experiments of one frame size and core list.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use plotly::{
    color::NamedColor,
    common::{DashType, Line, Marker, Mode},
    layout::{Axis, AxisType, BarMode},
    Bar, Layout, Plot, Scatter,
};

use crate::{
    dataset::{Dataset, ExperimentRecord, Filter},
    experiment::{Category, ExperimentKey, Metric, Side},
    metrics::{
        self, active_cores, aggregate_interrupts, column_mean, core_utilization, drop_rate,
        interrupt_percentages, pps_column, queue_rates, MetricsError,
    },
    schema::Column,
    util::PathBufExt,
};

/// Extension of written chart files.
pub const EXTENSION: &str = if cfg!(feature = "png") { "png" } else { "html" };

#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("{0}")]
    Metrics(#[from] MetricsError),
    #[error("No experiments with frame size {size} on cores {cores:?}")]
    NoRecords { size: u32, cores: Vec<u32> },
}

/// Where a finished chart goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    File(PathBuf),
    /// Open the chart in the browser.
    Display,
}

impl OutputSink {
    pub fn emit(&self, plot: &Plot) {
        match self {
            Self::File(path) => {
                write_plot(plot, path);
                log::info!("Plot saved to {path:?}");
            }
            Self::Display => plot.show(),
        }
    }
}

#[cfg(feature = "png")]
fn write_plot(plot: &Plot, path: &Path) {
    plot.write_image(path, plotly::ImageFormat::PNG, 1200, 800, 1.0);
}

#[cfg(not(feature = "png"))]
fn write_plot(plot: &Plot, path: &Path) {
    plot.write_html(path);
}

/// All charts that can be drawn for a (frame size, core list) group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChartKind {
    /// Observed vs target transmit rate.
    TxBounded,
    /// Observed transmit and receive rate vs target rate.
    RxBounded,
    /// Drop rate vs observed rate, on both sides.
    DropBounded,
    /// Hardware and software interrupt rate per target rate.
    SwIrqBounded,
    /// Interrupts per queue on every active core.
    Interrupts { side: Side, pps: u64 },
    /// Mean rate of every transmit and receive queue.
    QueueRate { side: Side, pps: u64 },
    CpuCoreUtilization { side: Side, pps: u64 },
    /// Core utilization next to the share of interrupts each core handled.
    CpuInterrupts { side: Side, pps: u64 },
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TxBounded => write!(f, "tx_bounded"),
            Self::RxBounded => write!(f, "rx_bounded"),
            Self::DropBounded => write!(f, "drop_bounded"),
            Self::SwIrqBounded => write!(f, "sw_irq_bounded"),
            Self::Interrupts { side, pps } => write!(f, "interrupts_{side}_pps_{pps}"),
            Self::QueueRate { side, pps } => write!(f, "queue_rate_{side}_pps_{pps}"),
            Self::CpuCoreUtilization { side, pps } => {
                write!(f, "cpu_core_utilization_{side}_pps_{pps}")
            }
            Self::CpuInterrupts { side, pps } => write!(f, "cpu_interrupts_{side}_pps_{pps}"),
        }
    }
}

impl ChartKind {
    /// Charts summarizing all target rates of a group.
    pub const SUMMARIES: [Self; 4] = [
        Self::TxBounded,
        Self::RxBounded,
        Self::DropBounded,
        Self::SwIrqBounded,
    ];

    /// Summary charts followed by the per-rate charts of every target rate in the dataset.
    pub fn all(dataset: &Dataset) -> Vec<Self> {
        let per_rate = dataset.target_rates().into_iter().flat_map(|pps| {
            [Side::Tx, Side::Rx].into_iter().flat_map(move |side| {
                [
                    Self::Interrupts { side, pps },
                    Self::QueueRate { side, pps },
                    Self::CpuCoreUtilization { side, pps },
                    Self::CpuInterrupts { side, pps },
                ]
            })
        });
        Self::SUMMARIES.into_iter().chain(per_rate).collect()
    }

    pub fn target_rate(self) -> Option<u64> {
        match self {
            Self::TxBounded | Self::RxBounded | Self::DropBounded | Self::SwIrqBounded => None,
            Self::Interrupts { pps, .. }
            | Self::QueueRate { pps, .. }
            | Self::CpuCoreUtilization { pps, .. }
            | Self::CpuInterrupts { pps, .. } => Some(pps),
        }
    }

    pub fn filter(self, size: u32, cores: Vec<u32>) -> Filter {
        let filter = Filter::new(size, cores);
        match self.target_rate() {
            Some(pps) => filter.with_pps(pps),
            None => filter,
        }
    }

    /// Build the chart from all records matching `filter`.
    pub fn render(
        self,
        dataset: &Dataset,
        filter: &Filter,
        queues: usize,
    ) -> Result<Plot, PlotError> {
        match self {
            Self::TxBounded => tx_bound_chart(dataset, filter),
            Self::RxBounded => rx_bound_chart(dataset, filter),
            Self::DropBounded => drop_rate_chart(dataset, filter),
            Self::SwIrqBounded => irq_rate_chart(dataset, filter),
            Self::Interrupts { side, pps } => interrupts_chart(dataset, filter, side, pps),
            Self::QueueRate { side, pps } => queue_rate_chart(dataset, filter, side, pps, queues),
            Self::CpuCoreUtilization { side, pps } => {
                cpu_utilization_chart(dataset, filter, side, pps)
            }
            Self::CpuInterrupts { side, pps } => cpu_interrupts_chart(dataset, filter, side, pps),
        }
    }

    /// Render the chart and hand it to the sink.
    pub fn plot(
        self,
        dataset: &Dataset,
        filter: &Filter,
        sink: &OutputSink,
        queues: usize,
    ) -> Result<(), PlotError> {
        sink.emit(&self.render(dataset, filter, queues)?);
        Ok(())
    }
}

/// Path of a chart file: `{chart}_{size}_cores_{core-list}.{ext}`.
pub fn chart_path(output_dir: &Path, kind: ChartKind, size: u32, cores: &[u32]) -> PathBuf {
    output_dir.then(format!(
        "{kind}_{size}_cores_{}.{EXTENSION}",
        cores.iter().join("-")
    ))
}

/// Draw one chart kind for every (frame size, core list) group of the dataset. Charts are written
/// to `output_dir`, or displayed if it is `None`. A chart that cannot be drawn is logged and
/// skipped. Returns the number of drawn charts.
pub fn plot_stats(
    dataset: &Dataset,
    kind: ChartKind,
    output_dir: Option<&Path>,
    queues: usize,
) -> usize {
    let mut drawn = 0;
    for (size, cores) in dataset.groups() {
        let filter = kind.filter(size, cores.clone());
        if dataset.select(&filter).next().is_none() {
            continue;
        }
        let sink = match output_dir {
            Some(dir) => OutputSink::File(chart_path(dir, kind, size, &cores)),
            None => OutputSink::Display,
        };
        match kind.plot(dataset, &filter, &sink, queues) {
            Ok(()) => drawn += 1,
            Err(e) => log::error!("Cannot draw {kind} for size {size}, cores {cores:?}: {e}"),
        }
    }
    drawn
}

fn select<'a>(
    dataset: &'a Dataset,
    filter: &Filter,
) -> Result<Vec<&'a ExperimentRecord>, PlotError> {
    let records = dataset.select(filter).collect_vec();
    if records.is_empty() {
        return Err(PlotError::NoRecords {
            size: filter.size,
            cores: filter.cores.clone(),
        });
    }
    Ok(records)
}

/// Mean observed transmit rate per experiment, ordered by target rate.
pub fn tx_bound<'a>(
    dataset: &'a Dataset,
    filter: &Filter,
) -> Result<Vec<(&'a ExperimentKey, f64)>, PlotError> {
    select(dataset, filter)?
        .into_iter()
        .map(|r| Ok((&r.key, column_mean(r, Side::Tx, Column::TxPps)?)))
        .collect()
}

/// Mean observed transmit and receive rate per experiment, ordered by target rate.
pub fn rx_bound<'a>(
    dataset: &'a Dataset,
    filter: &Filter,
) -> Result<Vec<(&'a ExperimentKey, f64, f64)>, PlotError> {
    select(dataset, filter)?
        .into_iter()
        .map(|r| {
            Ok((
                &r.key,
                column_mean(r, Side::Tx, Column::TxPps)?,
                column_mean(r, Side::Rx, Column::RxPps)?,
            ))
        })
        .collect()
}

/// Mean hardware and software interrupt rate on the transmit side per experiment.
pub fn irq_rates<'a>(
    dataset: &'a Dataset,
    filter: &Filter,
) -> Result<Vec<(&'a ExperimentKey, f64, f64)>, PlotError> {
    select(dataset, filter)?
        .into_iter()
        .map(|r| {
            Ok((
                &r.key,
                column_mean(r, Side::Tx, Column::IrqRate)?,
                column_mean(r, Side::Tx, Column::SoftIrqRate)?,
            ))
        })
        .collect()
}

fn title_suffix(filter: &Filter) -> String {
    format!("Packet Size {}, Cores {:?}", filter.size, filter.cores)
}

/// Category labels of the bars. Experiments whose target rate is unique within the chart are
/// labelled by that rate, all others by their full key.
pub fn target_labels(keys: &[&ExperimentKey]) -> Vec<String> {
    let counts = keys.iter().map(|k| k.pps).counts();
    keys.iter()
        .map(|k| match counts[&k.pps] {
            1 => k.pps.to_string(),
            _ => k.to_string(),
        })
        .collect()
}

fn pps_axes(layout: Layout) -> Layout {
    layout
        .x_axis(Axis::new().title("Target PPS (Packets per Second)").type_(AxisType::Category))
        .y_axis(Axis::new().title("PPS (Packets per Second)"))
}

fn tx_bound_chart(dataset: &Dataset, filter: &Filter) -> Result<Plot, PlotError> {
    let (keys, observed): (Vec<_>, Vec<f64>) = tx_bound(dataset, filter)?.into_iter().unzip();
    let missing = keys
        .iter()
        .zip(&observed)
        .map(|(k, o)| k.pps as f64 - o)
        .collect_vec();
    let labels = target_labels(&keys);

    let mut plot = Plot::new();
    plot.add_trace(
        Bar::new(labels.clone(), observed)
            .name("Observed PPS")
            .marker(Marker::new().color(NamedColor::LightGray)),
    );
    plot.add_trace(
        Bar::new(labels, missing)
            .name("Target PPS")
            .marker(Marker::new().color(NamedColor::SkyBlue)),
    );
    plot.set_layout(pps_axes(
        Layout::new()
            .title(format!("Observed vs. Target TX PPS for {}", title_suffix(filter)))
            .bar_mode(BarMode::Stack),
    ));
    Ok(plot)
}

fn rx_bound_chart(dataset: &Dataset, filter: &Filter) -> Result<Plot, PlotError> {
    let points = rx_bound(dataset, filter)?;
    let labels = target_labels(&points.iter().map(|p| p.0).collect_vec());

    let mut plot = Plot::new();
    plot.add_trace(
        Bar::new(labels.clone(), points.iter().map(|p| p.1).collect_vec())
            .name("Observed TX PPS")
            .marker(Marker::new().color(NamedColor::LightGray)),
    );
    plot.add_trace(
        Bar::new(labels.clone(), points.iter().map(|p| p.2).collect_vec())
            .name("Observed RX PPS")
            .opacity(0.5)
            .marker(Marker::new().color(NamedColor::Green)),
    );
    plot.add_trace(
        Scatter::new(labels, points.iter().map(|p| p.0.pps as f64).collect_vec())
            .name("Target PPS")
            .mode(Mode::Markers)
            .marker(Marker::new().color(NamedColor::Orange).size(10)),
    );
    plot.set_layout(pps_axes(
        Layout::new()
            .title(format!("Observed TX vs. RX PPS for {}", title_suffix(filter)))
            .bar_mode(BarMode::Overlay),
    ));
    Ok(plot)
}

fn drop_rate_chart(dataset: &Dataset, filter: &Filter) -> Result<Plot, PlotError> {
    let mut plot = Plot::new();
    for record in select(dataset, filter)? {
        for side in [Side::Tx, Side::Rx] {
            let pps = record.column(side, pps_column(side))?;
            let rate = drop_rate(record, side)?;
            plot.add_trace(
                Scatter::new(pps, rate)
                    .name(format!(
                        "{} Drop Rate, Target PPS: {}",
                        side.to_string().to_uppercase(),
                        record.key.pps
                    ))
                    .mode(Mode::Markers),
            );
        }
    }
    plot.set_layout(
        Layout::new()
            .title(format!("Drop Rate vs PPS for {}", title_suffix(filter)))
            .x_axis(Axis::new().title("PPS (Packets per Second)"))
            .y_axis(Axis::new().title("Drop Rate")),
    );
    Ok(plot)
}

fn irq_rate_chart(dataset: &Dataset, filter: &Filter) -> Result<Plot, PlotError> {
    let points = irq_rates(dataset, filter)?;
    let labels = target_labels(&points.iter().map(|p| p.0).collect_vec());

    let mut plot = Plot::new();
    plot.add_trace(
        Bar::new(labels.clone(), points.iter().map(|p| p.1).collect_vec())
            .name(Column::IrqRate.description())
            .marker(Marker::new().color(NamedColor::SkyBlue)),
    );
    plot.add_trace(
        Bar::new(labels, points.iter().map(|p| p.2).collect_vec())
            .name(Column::SoftIrqRate.description())
            .marker(Marker::new().color(NamedColor::Orange)),
    );
    plot.set_layout(
        Layout::new()
            .title(format!("IRQ and SIRQ Rates for {}", title_suffix(filter)))
            .bar_mode(BarMode::Group)
            .x_axis(Axis::new().title("Target PPS (Packets per Second)").type_(AxisType::Category))
            .y_axis(Axis::new().title("Rates").type_(AxisType::Log)),
    );
    Ok(plot)
}

/// Prefix trace names with the experiment if more than one experiment shares a chart.
fn trace_name(label: &str, record: &ExperimentRecord, shared: bool) -> String {
    if shared {
        format!("{}: {label}", record.key)
    } else {
        label.to_string()
    }
}

fn side_title(side: Side) -> String {
    side.to_string().to_uppercase()
}

fn interrupts_chart(
    dataset: &Dataset,
    filter: &Filter,
    side: Side,
    pps: u64,
) -> Result<Plot, PlotError> {
    let records = select(dataset, filter)?;
    let shared = records.len() > 1;

    let mut plot = Plot::new();
    for record in records {
        let samples = record.matrix(Category::new(side, Metric::Interrupts))?;
        let aggregate = aggregate_interrupts(samples)?;
        let cores = active_cores(&aggregate);
        let labels = cores.iter().map(|c| c.to_string()).collect_vec();
        for queue in 0..aggregate.rows() {
            let row = aggregate.row(queue);
            plot.add_trace(
                Bar::new(labels.clone(), cores.iter().map(|c| row[*c]).collect_vec())
                    .name(trace_name(&format!("Queue {queue}"), record, shared))
                    .opacity(0.7),
            );
        }
    }
    plot.set_layout(
        Layout::new()
            .title(format!(
                "({} Side, {}) Interrupts per Queue and CPU, pps {pps}",
                side_title(side),
                side.description()
            ))
            .bar_mode(BarMode::Group)
            .x_axis(Axis::new().title("core id").type_(AxisType::Category))
            .y_axis(Axis::new().title("Number of Interrupts per queue")),
    );
    Ok(plot)
}

fn queue_rate_chart(
    dataset: &Dataset,
    filter: &Filter,
    side: Side,
    pps: u64,
    queues: usize,
) -> Result<Plot, PlotError> {
    let records = select(dataset, filter)?;
    let shared = records.len() > 1;

    let mut plot = Plot::new();
    for record in records {
        let rates = queue_rates(record.matrix(Category::new(side, Metric::Queues))?, queues)?;
        plot.add_trace(
            Bar::new((0..queues).collect_vec(), rates.tx)
                .name(trace_name("TX Queues PPS", record, shared))
                .marker(Marker::new().color(NamedColor::SkyBlue)),
        );
        plot.add_trace(
            Bar::new((queues..2 * queues).collect_vec(), rates.rx)
                .name(trace_name("RX Queues PPS", record, shared))
                .marker(Marker::new().color(NamedColor::Orange)),
        );
    }
    plot.add_trace(
        Scatter::new(vec![0, 2 * queues.max(1) - 1], vec![pps as f64; 2])
            .name(format!("Target PPS ({pps})"))
            .mode(Mode::Lines)
            .line(Line::new().color(NamedColor::Red).dash(DashType::Dash)),
    );
    plot.set_layout(
        Layout::new()
            .title(format!(
                "Mean PPS for POD-{} Queue, {}, pps {pps}",
                side_title(side),
                title_suffix(filter)
            ))
            .x_axis(Axis::new().title(format!("Queue ID {queues}-TX / {queues} RX")))
            .y_axis(Axis::new().title("Total PPS")),
    );
    Ok(plot)
}

fn cpu_utilization_chart(
    dataset: &Dataset,
    filter: &Filter,
    side: Side,
    pps: u64,
) -> Result<Plot, PlotError> {
    let records = select(dataset, filter)?;
    let shared = records.len() > 1;

    let mut plot = Plot::new();
    for record in records {
        let means = core_utilization(record.matrix(Category::new(side, Metric::Cpu))?)?;
        plot.add_trace(
            Bar::new((0..means.len()).collect_vec(), means)
                .name(trace_name("Mean CPU Utilization", record, shared)),
        );
    }
    plot.set_layout(
        Layout::new()
            .title(format!(
                "CPU Mean Core Utilization for POD-{} {}, Target PPS {pps}",
                side_title(side),
                title_suffix(filter)
            ))
            .x_axis(Axis::new().title("Core ID"))
            .y_axis(Axis::new().title("Mean Utilization (%)")),
    );
    Ok(plot)
}

fn cpu_interrupts_chart(
    dataset: &Dataset,
    filter: &Filter,
    side: Side,
    pps: u64,
) -> Result<Plot, PlotError> {
    let records = select(dataset, filter)?;
    let shared = records.len() > 1;

    let mut plot = Plot::new();
    for record in records {
        let utilization = core_utilization(record.matrix(Category::new(side, Metric::Cpu))?)?;
        let percentages = interrupt_percentages(&metrics::record_interrupts(record, side)?);
        let cores = (0..utilization.len().max(percentages.cols())).collect_vec();

        for queue in 0..percentages.rows() {
            plot.add_trace(
                Bar::new(cores.clone(), percentages.row(queue).to_vec())
                    .name(trace_name(&format!("Queue {queue} Interrupts (%)"), record, shared)),
            );
        }
        plot.add_trace(
            Scatter::new(cores[..utilization.len()].to_vec(), utilization)
                .name(trace_name("Mean CPU Utilization", record, shared))
                .mode(Mode::LinesMarkers),
        );
    }
    plot.set_layout(
        Layout::new()
            .title(format!(
                "CPU Core Utilization % vs Interrupts % for POD-{} Queues, {}, PPS {pps}",
                side_title(side),
                title_suffix(filter)
            ))
            .bar_mode(BarMode::Stack)
            .x_axis(Axis::new().title("CPU ID"))
            .y_axis(Axis::new().title("Percentage")),
    );
    Ok(plot)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{dataset::ExperimentRecord, experiment::RunKey, matrix::Matrix, schema::Layout};

    fn record(pps: u64, cores: Vec<u32>, observed: f64) -> ExperimentRecord {
        let key = RunKey {
            pps,
            pairs: 1,
            size: 64,
            cores_per_pod: 1,
        }
        .experiment_key(cores);
        let mut row = vec![0.0; 14];
        row[Column::TxPps.offset()] = observed;
        row[Column::RxPps.offset()] = observed / 2.0;
        row[Column::IrqRate.offset()] = 10.0;
        row[Column::SoftIrqRate.offset()] = 20.0;
        let mut record = ExperimentRecord::new(key, Layout::Current);
        for side in [Side::Tx, Side::Rx] {
            record
                .insert(Category::traffic(side), Matrix::from_rows(vec![row.clone()]).unwrap())
                .unwrap();
        }
        record
    }

    fn dataset() -> Dataset {
        let mut interrupts = record(1000, vec![2, 4], 900.0);
        let rows = (0..6).map(|i| vec![(i % 2) as f64, 1.0, 0.0, 2.0]).collect();
        interrupts
            .insert(
                Category::new(Side::Tx, Metric::Interrupts),
                Matrix::from_rows(rows).unwrap(),
            )
            .unwrap();
        [
            interrupts,
            record(10000, vec![2, 4], 8000.0),
            record(1000, vec![2], 1000.0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn chart_names() {
        let dir = Path::new("plots");
        assert_eq!(
            chart_path(dir, ChartKind::TxBounded, 64, &[2, 4, 6]),
            dir.join(format!("tx_bounded_64_cores_2-4-6.{EXTENSION}"))
        );
        let kind = ChartKind::Interrupts {
            side: Side::Rx,
            pps: 1000,
        };
        assert_eq!(
            chart_path(dir, kind, 128, &[2]),
            dir.join(format!("interrupts_rx_pps_1000_128_cores_2.{EXTENSION}"))
        );
        assert_eq!(kind.filter(128, vec![2]), Filter::new(128, vec![2]).with_pps(1000));
        assert_eq!(ChartKind::SwIrqBounded.filter(64, vec![2]), Filter::new(64, vec![2]));
    }

    #[test]
    fn all_kinds() {
        let kinds = ChartKind::all(&dataset());
        // 4 summaries, then 4 charts per side and target rate
        assert_eq!(kinds.len(), 4 + 2 * 2 * 4);
        assert_eq!(&kinds[..4], &ChartKind::SUMMARIES);
        assert!(kinds.contains(&ChartKind::CpuInterrupts {
            side: Side::Rx,
            pps: 10000
        }));
    }

    #[test]
    fn bound_series() {
        let data = dataset();
        let filter = Filter::new(64, vec![2, 4]);
        let tx = tx_bound(&data, &filter).unwrap();
        assert_eq!(
            tx.iter().map(|(k, v)| (k.pps, *v)).collect_vec(),
            vec![(1000, 900.0), (10000, 8000.0)]
        );
        assert_eq!(
            rx_bound(&data, &filter)
                .unwrap()
                .into_iter()
                .map(|(k, t, r)| (k.pps, t, r))
                .collect_vec(),
            vec![(1000, 900.0, 450.0), (10000, 8000.0, 4000.0)]
        );
        assert_eq!(
            irq_rates(&data, &filter)
                .unwrap()
                .into_iter()
                .map(|(k, i, s)| (k.pps, i, s))
                .collect_vec(),
            vec![(1000, 10.0, 20.0), (10000, 10.0, 20.0)]
        );
        assert!(matches!(
            tx_bound(&data, &Filter::new(128, vec![2])),
            Err(PlotError::NoRecords { size: 128, .. })
        ));
    }

    #[test]
    fn shared_target_rates_get_distinct_labels() {
        let mut data = dataset();
        let mut other = record(1000, vec![2, 4], 950.0);
        other.key.pairs = 2;
        data.insert(other);
        let filter = Filter::new(64, vec![2, 4]);
        let points = tx_bound(&data, &filter).unwrap();
        assert_eq!(points.len(), 3);
        let labels = target_labels(&points.iter().map(|p| p.0).collect_vec());
        assert_eq!(labels.iter().unique().count(), 3);
        assert!(labels.contains(&"10000".to_string()));
        assert!(labels.contains(&points[0].0.to_string()));
        assert!(!labels.contains(&"1000".to_string()));
    }

    #[test]
    fn failing_charts_are_reported() {
        let data = dataset();
        let filter = Filter::new(64, vec![2, 4]).with_pps(1000);
        let interrupts = ChartKind::Interrupts {
            side: Side::Tx,
            pps: 1000,
        };
        assert!(interrupts.render(&data, &filter, 8).is_ok());
        let queues = ChartKind::QueueRate {
            side: Side::Tx,
            pps: 1000,
        };
        assert!(matches!(
            queues.render(&data, &filter, 8),
            Err(PlotError::Metrics(MetricsError::MissingCategory { .. }))
        ));
    }

    #[cfg(not(feature = "png"))]
    #[test]
    fn charts_are_written() {
        let dir = crate::matrix::test::scratch_dir("charts_are_written");
        let data = dataset();
        assert_eq!(plot_stats(&data, ChartKind::TxBounded, Some(&dir), 8), 2);
        assert!(dir.join("tx_bounded_64_cores_2-4.html").exists());
        assert!(dir.join("tx_bounded_64_cores_2.html").exists());

        // only one group has interrupt samples
        let kind = ChartKind::Interrupts {
            side: Side::Tx,
            pps: 1000,
        };
        assert_eq!(plot_stats(&data, kind, Some(&dir), 8), 1);
        assert!(dir.join("interrupts_tx_pps_1000_64_cores_2-4.html").exists());
        assert!(!dir.join("interrupts_tx_pps_1000_64_cores_2.html").exists());
    }
}
