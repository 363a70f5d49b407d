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
//! Experiment metadata, and the file-name grammars the monitoring harness writes.
//!
//! Three families of files exist in a metric directory:
//!
//! - merged traffic logs, named `tx_pps_1000_pairs_3_size_64_cores_1_pods-cores_2_4_6.log` (or
//!   `tx_100pps_10_core_0-1_size_64.txt` for older runs),
//! - per-pod traffic logs, named `server_server0-<uuid>_pr_1000_runtime_120_cores_1_pairs_3_size_64_core_list_2_ts_<ts>.log`,
//! - worker metric logs, named `tx-pod-int_pr_1000_runtime_120_cores_1_pairs_3_size_64_<ts>.log`.

use std::{fmt, num::ParseIntError, str::FromStr};

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Serialize, Serializer};

use crate::{matrix::Delimiter, schema::Layout};

/// Number of `_`-separated segments of a legacy traffic file name.
const LEGACY_SEGMENTS: usize = 7;
/// Current traffic file names with fewer segments are ignored.
const MIN_CURRENT_SEGMENTS: usize = 11;

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
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
/// Role of a node in an experiment.
pub enum Side {
    Tx,
    Rx,
}

impl Side {
    fn from_prefix(name: &str) -> Option<Self> {
        if name.starts_with("tx_") {
            Some(Self::Tx)
        } else if name.starts_with("rx_") {
            Some(Self::Rx)
        } else {
            None
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Tx => "Transmit",
            Self::Rx => "Receive",
        }
    }
}

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
)]
#[serde(rename_all = "snake_case")]
/// Kind of samples stored in a log file.
pub enum Metric {
    /// Traffic matrix, see [`crate::schema::Column`].
    #[strum(serialize = "data")]
    Traffic,
    /// Interrupt counts: queue index followed by one column per core.
    #[strum(serialize = "pod_int")]
    Interrupts,
    /// Packet rate per queue.
    #[strum(serialize = "queues")]
    Queues,
    /// Utilization per core.
    #[strum(serialize = "cpu")]
    Cpu,
    /// Samples of the softnet statistics.
    #[strum(serialize = "softnet")]
    Softnet,
}

impl Metric {
    pub fn delimiter(self) -> Delimiter {
        match self {
            Self::Traffic => Delimiter::Comma,
            Self::Interrupts | Self::Queues | Self::Cpu | Self::Softnet => Delimiter::Whitespace,
        }
    }
}

/// A (side, metric) pair, rendered as `tx_pod_int`, `rx_queues`, `tx_data`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Category {
    pub side: Side,
    pub metric: Metric,
}

impl Category {
    pub const fn new(side: Side, metric: Metric) -> Self {
        Self { side, metric }
    }

    pub const fn traffic(side: Side) -> Self {
        Self::new(side, Metric::Traffic)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.side, self.metric)
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Identifies one experiment configuration.
///
/// Two files belong to the same experiment iff all fields are equal. The core list is compared as
/// an ordered sequence. `run_time` is only known for legacy file names and is `None` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ExperimentKey {
    /// Target rate in packets per second.
    pub pps: u64,
    /// Frame size in bytes.
    pub size: u32,
    /// Number of tx/rx pod pairs.
    pub pairs: u32,
    /// Cores the pods were pinned to.
    pub cores: Vec<u32>,
    pub cores_per_pod: u32,
    pub run_time: Option<u64>,
}

impl ExperimentKey {
    pub fn core_list(&self) -> String {
        self.cores.iter().join("-")
    }
}

impl fmt::Display for ExperimentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pps_{}_pair_{}_cores_per_pod_{}_cores_{}_size_{}",
            self.pps,
            self.pairs,
            self.cores_per_pod,
            self.core_list(),
            self.size
        )?;
        if let Some(run_time) = self.run_time {
            write!(f, "_runtime_{run_time}")?;
        }
        Ok(())
    }
}

/// Grouping key of per-pod and worker files, before the core list of the pods is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RunKey {
    pub pps: u64,
    pub pairs: u32,
    pub size: u32,
    pub cores_per_pod: u32,
}

impl RunKey {
    /// Complete the key with the cores the pods of this run were pinned to.
    pub fn experiment_key(&self, cores: Vec<u32>) -> ExperimentKey {
        ExperimentKey {
            pps: self.pps,
            size: self.size,
            pairs: self.pairs,
            cores,
            cores_per_pod: self.cores_per_pod,
            run_time: None,
        }
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pps_{}_pairs_{}_size_{}_cores_{}",
            self.pps, self.pairs, self.size, self.cores_per_pod
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Cannot parse field `{field}` of {name}: {value:?} ({source})")]
    Number {
        name: String,
        field: &'static str,
        value: String,
        source: ParseIntError,
    },
}

fn number<T>(name: &str, field: &'static str, value: &str) -> Result<T, ParseError>
where
    T: FromStr<Err = ParseIntError>,
{
    value.parse().map_err(|source| ParseError::Number {
        name: name.to_string(),
        field,
        value: value.to_string(),
        source,
    })
}

/// A merged traffic file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub side: Side,
    pub key: ExperimentKey,
    pub layout: Layout,
}

/// Parse the name of a merged traffic file, in either the current or the legacy grammar.
///
/// Returns `Ok(None)` if the name follows neither grammar, and an error if it does but one of the
/// numeric fields cannot be parsed.
pub fn parse_file_name(name: &str) -> Result<Option<ParsedName>, ParseError> {
    let Some(side) = Side::from_prefix(name) else {
        return Ok(None);
    };

    if let Some(stem) = name.strip_suffix(".log") {
        parse_current(name, side, stem)
    } else if let Some(stem) = name.strip_suffix(".txt") {
        parse_legacy(name, side, stem)
    } else {
        Ok(None)
    }
}

fn parse_current(name: &str, side: Side, stem: &str) -> Result<Option<ParsedName>, ParseError> {
    // rx_pps_400000_pairs_3_size_64_cores_1_pods-cores_2_4_6
    let parts = stem.split('_').collect_vec();
    if parts.len() < MIN_CURRENT_SEGMENTS
        || parts[1] != "pps"
        || parts[3] != "pairs"
        || parts[5] != "size"
        || parts[7] != "cores"
        || parts[9] != "pods-cores"
    {
        return Ok(None);
    }

    let key = ExperimentKey {
        pps: number(name, "pps", parts[2])?,
        pairs: number(name, "pairs", parts[4])?,
        size: number(name, "size", parts[6])?,
        cores_per_pod: number(name, "cores", parts[8])?,
        cores: parts[10..]
            .iter()
            .map(|core| number(name, "pods-cores", core))
            .collect::<Result<_, _>>()?,
        run_time: None,
    };

    Ok(Some(ParsedName {
        side,
        key,
        layout: Layout::Current,
    }))
}

fn parse_legacy(name: &str, side: Side, stem: &str) -> Result<Option<ParsedName>, ParseError> {
    // ["tx", "100pps", "10", "core", "0-1", "size", "64"]
    let parts = stem.split('_').collect_vec();
    if parts.len() != LEGACY_SEGMENTS || parts[3] != "core" || parts[5] != "size" {
        return Ok(None);
    }
    let Some(pps) = parts[1].strip_suffix("pps") else {
        return Ok(None);
    };

    let cores: Vec<u32> = parts[4]
        .split('-')
        .map(|core| number(name, "core", core))
        .collect::<Result<_, _>>()?;

    let key = ExperimentKey {
        pps: number(name, "pps", pps)?,
        size: number(name, "size", parts[6])?,
        pairs: 1,
        cores_per_pod: cores.len() as u32,
        cores,
        run_time: Some(number(name, "run_time", parts[2])?),
    };

    Ok(Some(ParsedName {
        side,
        key,
        layout: Layout::Legacy,
    }))
}

lazy_static! {
    static ref POD_FILE: Regex = Regex::new(
        r"^(?P<role>server_server|client_client)[^_]*_pr_(?P<pps>\d+)_runtime_(?P<run_time>\d+)_cores_(?P<cores>\d+)_pairs_(?P<pairs>\d+)_size_(?P<size>\d+)_core_list_(?P<core>\d+)(_.*)?\.log$"
    )
    .unwrap();
    static ref WORKER_FILE: Regex = Regex::new(
        r"^(?P<side>tx|rx)-(?P<kind>pod-int|pod-queue|pod-cpu|softnet-stat)_pr_(?P<pps>\d+)_runtime_(?P<run_time>\d+)_cores_(?P<cores>\d+)_pairs_(?P<pairs>\d+)_size_(?P<size>\d+)(_.*)?\.log$"
    )
    .unwrap();
}

fn run_key(name: &str, m: &Captures) -> Result<RunKey, ParseError> {
    Ok(RunKey {
        pps: number(name, "pr", &m["pps"])?,
        pairs: number(name, "pairs", &m["pairs"])?,
        size: number(name, "size", &m["size"])?,
        cores_per_pod: number(name, "cores", &m["cores"])?,
    })
}

/// A per-pod traffic log. Servers transmit, clients receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodFile {
    pub side: Side,
    pub run: RunKey,
    pub run_time: u64,
    /// Core the pod was pinned to.
    pub core: u32,
}

pub fn parse_pod_file_name(name: &str) -> Result<Option<PodFile>, ParseError> {
    let Some(m) = POD_FILE.captures(name) else {
        return Ok(None);
    };
    let side = if &m["role"] == "server_server" {
        Side::Tx
    } else {
        Side::Rx
    };
    Ok(Some(PodFile {
        side,
        run: run_key(name, &m)?,
        run_time: number(name, "runtime", &m["run_time"])?,
        core: number(name, "core_list", &m["core"])?,
    }))
}

/// A metric log collected on a worker node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFile {
    pub category: Category,
    pub run: RunKey,
}

pub fn parse_worker_file_name(name: &str) -> Result<Option<WorkerFile>, ParseError> {
    let Some(m) = WORKER_FILE.captures(name) else {
        return Ok(None);
    };
    let side = if &m["side"] == "tx" { Side::Tx } else { Side::Rx };
    let metric = match &m["kind"] {
        "pod-int" => Metric::Interrupts,
        "pod-queue" => Metric::Queues,
        "pod-cpu" => Metric::Cpu,
        _ => Metric::Softnet,
    };
    Ok(Some(WorkerFile {
        category: Category::new(side, metric),
        run: run_key(name, &m)?,
    }))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn current_grammar() {
        let parsed = parse_file_name("rx_pps_400000_pairs_3_size_64_cores_1_pods-cores_2_4_6.log")
            .unwrap()
            .unwrap();
        assert_eq!(parsed.side, Side::Rx);
        assert_eq!(parsed.layout, Layout::Current);
        assert_eq!(
            parsed.key,
            ExperimentKey {
                pps: 400000,
                size: 64,
                pairs: 3,
                cores: vec![2, 4, 6],
                cores_per_pod: 1,
                run_time: None,
            }
        );
        assert_eq!(
            parsed.key.to_string(),
            "pps_400000_pair_3_cores_per_pod_1_cores_2-4-6_size_64"
        );
    }

    #[test]
    fn both_sides_share_the_key() {
        let tx = parse_file_name("tx_pps_1000_pairs_1_size_128_cores_2_pods-cores_4_5.log")
            .unwrap()
            .unwrap();
        let rx = parse_file_name("rx_pps_1000_pairs_1_size_128_cores_2_pods-cores_4_5.log")
            .unwrap()
            .unwrap();
        assert_eq!(tx.side, Side::Tx);
        assert_eq!(tx.key, rx.key);

        // the core list is ordered
        let swapped = parse_file_name("rx_pps_1000_pairs_1_size_128_cores_2_pods-cores_5_4.log")
            .unwrap()
            .unwrap();
        assert_ne!(tx.key, swapped.key);
    }

    #[test]
    fn legacy_grammar() {
        let parsed = parse_file_name("tx_100pps_10_core_0-1_size_64.txt")
            .unwrap()
            .unwrap();
        assert_eq!(parsed.side, Side::Tx);
        assert_eq!(parsed.layout, Layout::Legacy);
        assert_eq!(parsed.key.pps, 100);
        assert_eq!(parsed.key.cores, vec![0, 1]);
        assert_eq!(parsed.key.cores_per_pod, 2);
        assert_eq!(parsed.key.size, 64);
        assert_eq!(parsed.key.run_time, Some(10));

        let single = parse_file_name("rx_2000pps_60_core_3_size_1500.txt")
            .unwrap()
            .unwrap();
        assert_eq!(single.key.cores, vec![3]);
    }

    #[test]
    fn foreign_names_are_skipped() {
        for name in [
            "metrics.json",
            "tx_pps_1000.log",
            "tx_pps_1000_pairs_1_size_64.log",
            "xx_pps_1000_pairs_1_size_64_cores_1_pods-cores_2.log",
            "tx_pps_1000_pairs_1_size_64_cores_1_pods-cores_2.csv",
            "tx_pps_1000_pairs_1_size_64_cores_1_pods-cores.log",
            "tx_100pps_10_cores_0_size_64.txt",
        ] {
            assert!(parse_file_name(name).unwrap().is_none(), "{name}");
        }
    }

    #[test]
    fn malformed_numbers() {
        assert!(parse_file_name("tx_pps_fast_pairs_1_size_64_cores_1_pods-cores_2.log").is_err());
        assert!(parse_file_name("tx_100pps_10_core_a-b_size_64.txt").is_err());
    }

    #[test]
    fn pod_files() {
        let server = parse_pod_file_name(
            "server_server2-ve-56377f29-e603-11ee-a122-179ee4765847_pr_200000_runtime_120_cores_1_pairs_3_size_64_core_list_6_ts_20240406063337.log",
        )
        .unwrap()
        .unwrap();
        assert_eq!(server.side, Side::Tx);
        assert_eq!(server.core, 6);
        assert_eq!(server.run_time, 120);
        assert_eq!(
            server.run,
            RunKey {
                pps: 200000,
                pairs: 3,
                size: 64,
                cores_per_pod: 1
            }
        );

        let client = parse_pod_file_name(
            "client_client0-ve-56377f29_pr_200000_runtime_120_cores_1_pairs_3_size_64_core_list_2_ts_20240406063337.log",
        )
        .unwrap()
        .unwrap();
        assert_eq!(client.side, Side::Rx);
        assert_eq!(client.run, server.run);

        assert!(parse_pod_file_name("server_server2_pr_x.log").unwrap().is_none());
    }

    #[test]
    fn worker_files() {
        let int = parse_worker_file_name(
            "tx-pod-int_pr_200000_runtime_120_cores_1_pairs_3_size_64_20240406063334.log",
        )
        .unwrap()
        .unwrap();
        assert_eq!(int.category, Category::new(Side::Tx, Metric::Interrupts));
        assert_eq!(int.category.to_string(), "tx_pod_int");

        let queue = parse_worker_file_name(
            "rx-pod-queue_pr_200000_runtime_120_cores_1_pairs_3_size_64_ts_20240406063334.log",
        )
        .unwrap()
        .unwrap();
        assert_eq!(queue.category.to_string(), "rx_queues");
        assert_eq!(queue.run, int.run);

        let softnet = parse_worker_file_name(
            "rx-softnet-stat_pr_1000_runtime_120_cores_2_pairs_1_size_64_ts_1.log",
        )
        .unwrap()
        .unwrap();
        assert_eq!(softnet.category, Category::new(Side::Rx, Metric::Softnet));
        assert_eq!(softnet.run.cores_per_pod, 2);

        assert!(parse_worker_file_name("tx-pod-mem_pr_1_runtime_1_cores_1_pairs_1_size_1.log")
            .unwrap()
            .is_none());
    }
}
