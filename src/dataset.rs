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
//! Discovering the logs of a metric directory and loading them, grouped by experiment.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use serde::Serialize;

use crate::{
    experiment::{
        parse_file_name, parse_pod_file_name, parse_worker_file_name, Category, ExperimentKey,
        Metric, RunKey, Side,
    },
    matrix::{load_matrix, LoadError, Matrix},
    metrics::MetricsError,
    schema::{Column, Layout},
    util::{self, PathBufExt},
};

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("{0:?} is not a directory")]
    NotADirectory(PathBuf),
}

/// Allows selecting the experiments that go into a single chart.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    pub size: u32,
    pub cores: Vec<u32>,
    pub pps: Option<u64>,
}

impl Filter {
    pub fn new(size: u32, cores: Vec<u32>) -> Self {
        Self {
            size,
            cores,
            pps: None,
        }
    }

    pub fn with_pps(mut self, pps: u64) -> Self {
        self.pps = Some(pps);
        self
    }

    pub fn matches(&self, key: &ExperimentKey) -> bool {
        key.size == self.size
            && key.cores == self.cores
            && self.pps.map(|pps| pps == key.pps).unwrap_or(true)
    }
}

/// All files and samples of one experiment.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentRecord {
    pub key: ExperimentKey,
    pub layout: Layout,
    pub files: BTreeMap<Category, Vec<PathBuf>>,
    #[serde(skip)]
    data: BTreeMap<Category, Matrix>,
}

impl ExperimentRecord {
    pub fn new(key: ExperimentKey, layout: Layout) -> Self {
        Self {
            key,
            layout,
            files: BTreeMap::new(),
            data: BTreeMap::new(),
        }
    }

    pub fn add_file(&mut self, category: Category, path: impl Into<PathBuf>) {
        self.files.entry(category).or_default().push(path.into());
    }

    /// Load all registered files. Files of the same category are stacked in the order they were
    /// registered. If any file of a category fails to load, the error is logged and the category
    /// is left absent.
    pub fn load(&mut self) {
        let categories = self.files.keys().copied().collect_vec();
        for category in categories {
            match self.load_category(category) {
                Ok(matrix) => {
                    log::debug!("[{}] Loaded {category}: {:?}", self.key, matrix.shape());
                    self.data.insert(category, matrix);
                }
                Err((path, e)) => {
                    log::error!("[{}] Failed to load {category} file {path:?}: {e}", self.key);
                    self.data.remove(&category);
                }
            }
        }
    }

    fn load_category(&self, category: Category) -> Result<Matrix, (PathBuf, LoadError)> {
        let mut matrix = Matrix::default();
        for path in self.files.get(&category).into_iter().flatten() {
            log::trace!("Loading {category} file: {path:?}");
            load_matrix(path, category.metric.delimiter())
                .and_then(|m| self.check_width(category, m))
                .and_then(|m| Ok(matrix.vstack(m)?))
                .map_err(|e| (path.clone(), e))?;
        }
        Ok(matrix)
    }

    fn check_width(&self, category: Category, matrix: Matrix) -> Result<Matrix, LoadError> {
        let expected = self.layout.width();
        if category.metric == Metric::Traffic && matrix.cols() < expected {
            return Err(LoadError::TooFewColumns {
                found: matrix.cols(),
                expected,
            });
        }
        Ok(matrix)
    }

    /// Add samples of a category, stacking them below already present samples.
    pub fn insert(&mut self, category: Category, matrix: Matrix) -> Result<(), LoadError> {
        let matrix = self.check_width(category, matrix)?;
        match self.data.get_mut(&category) {
            Some(existing) => existing.vstack(matrix)?,
            None => {
                self.data.insert(category, matrix);
            }
        }
        Ok(())
    }

    pub fn get(&self, category: Category) -> Option<&Matrix> {
        self.data.get(&category)
    }

    /// Samples of a category, or an error naming the missing category.
    pub fn matrix(&self, category: Category) -> Result<&Matrix, MetricsError> {
        self.get(category).ok_or_else(|| MetricsError::MissingCategory {
            key: self.key.clone(),
            category,
        })
    }

    pub fn traffic(&self, side: Side) -> Result<&Matrix, MetricsError> {
        self.matrix(Category::traffic(side))
    }

    /// All samples of a traffic column on one side.
    ///
    /// The layout only fixes the minimal width; legacy files that carry trailing columns still
    /// expose them.
    pub fn column(&self, side: Side, column: Column) -> Result<Vec<f64>, MetricsError> {
        let matrix = self.traffic(side)?;
        match matrix.column(column.offset()) {
            Some(values) => Ok(values),
            None if !self.layout.contains(column) => Err(MetricsError::MissingColumn {
                column,
                layout: self.layout,
            }),
            None => Err(MetricsError::TooFewColumns {
                found: matrix.cols(),
                expected: column.offset() + 1,
            }),
        }
    }

    /// Shapes of all loaded matrices.
    pub fn shapes(&self) -> BTreeMap<Category, (usize, usize)> {
        self.data.iter().map(|(c, m)| (*c, m.shape())).collect()
    }
}

/// All experiments found in a metric directory.
#[derive(Debug, Default)]
pub struct Dataset {
    records: BTreeMap<ExperimentKey, ExperimentRecord>,
}

impl Dataset {
    /// Index the per-pod and worker logs of `dir` and load them.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, DatasetError> {
        Ok(Self::from_runs(&index_run_files(dir)?))
    }

    /// Load the samples of every indexed run.
    pub fn from_runs(runs: &BTreeMap<RunKey, RunFiles>) -> Self {
        runs.iter().map(|(run, files)| files.load(run)).collect()
    }

    /// Load all merged `tx_*`/`rx_*` traffic logs of `dir`, in either file name grammar.
    pub fn from_merged_files(dir: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let mut records: BTreeMap<ExperimentKey, ExperimentRecord> = BTreeMap::new();

        for path in list_dir(dir.as_ref())? {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let parsed = match parse_file_name(name) {
                Ok(Some(parsed)) => parsed,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("Skipping {path:?}: {e}");
                    continue;
                }
            };
            records
                .entry(parsed.key.clone())
                .or_insert_with(|| ExperimentRecord::new(parsed.key, parsed.layout))
                .add_file(Category::traffic(parsed.side), path);
        }

        records.values_mut().for_each(ExperimentRecord::load);
        Ok(Self { records })
    }

    pub fn insert(&mut self, record: ExperimentRecord) {
        self.records.insert(record.key.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &ExperimentKey) -> Option<&ExperimentRecord> {
        self.records.get(key)
    }

    /// Iterate over all records, ordered by their key.
    pub fn iter(&self) -> impl Iterator<Item = &ExperimentRecord> {
        self.records.values()
    }

    /// Iterate over all records matching the filter, ordered by their key.
    pub fn select(&self, filter: &Filter) -> impl Iterator<Item = &ExperimentRecord> + '_ {
        let filter = filter.clone();
        self.iter().filter(move |r| filter.matches(&r.key))
    }

    /// Distinct `(size, cores)` combinations.
    pub fn groups(&self) -> BTreeSet<(u32, Vec<u32>)> {
        self.records
            .keys()
            .map(|k| (k.size, k.cores.clone()))
            .collect()
    }

    /// Distinct target rates.
    pub fn target_rates(&self) -> BTreeSet<u64> {
        self.records.keys().map(|k| k.pps).collect()
    }
}

impl FromIterator<ExperimentRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = ExperimentRecord>>(iter: I) -> Self {
        let mut dataset = Self::default();
        iter.into_iter().for_each(|r| dataset.insert(r));
        dataset
    }
}

/// Logs of one run, before they are loaded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunFiles {
    /// Cores the pods of this run were pinned to.
    pub core_list: BTreeSet<u32>,
    pub files: BTreeMap<Category, Vec<PathBuf>>,
}

impl RunFiles {
    pub fn experiment_key(&self, run: &RunKey) -> ExperimentKey {
        run.experiment_key(self.core_list.iter().copied().collect())
    }

    /// Build and load the record of this run.
    pub fn load(&self, run: &RunKey) -> ExperimentRecord {
        let mut record = ExperimentRecord::new(self.experiment_key(run), Layout::Current);
        for (category, files) in &self.files {
            files.iter().for_each(|f| record.add_file(*category, f));
        }
        record.load();
        record
    }
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    if !dir.is_dir() {
        return Err(DatasetError::NotADirectory(dir.to_path_buf()));
    }
    Ok(util::list_files(dir, "*")?)
}

/// Group all per-pod traffic logs and worker metric logs in `dir` by run.
///
/// Worker logs are attached to the run with the same rate, pair count, frame size and cores per
/// pod. Worker logs without a matching pod log are ignored. File lists are ordered naturally by
/// name.
pub fn index_run_files(dir: impl AsRef<Path>) -> Result<BTreeMap<RunKey, RunFiles>, DatasetError> {
    let mut runs: BTreeMap<RunKey, RunFiles> = BTreeMap::new();
    let mut worker_files = Vec::new();

    for path in list_dir(dir.as_ref())? {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".log") {
            continue;
        }

        match parse_pod_file_name(name) {
            Ok(Some(pod)) => {
                let run = runs.entry(pod.run).or_default();
                run.core_list.insert(pod.core);
                run.files
                    .entry(Category::traffic(pod.side))
                    .or_default()
                    .push(path);
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("Skipping {path:?}: {e}");
                continue;
            }
        }

        match parse_worker_file_name(name) {
            Ok(Some(worker)) => worker_files.push((worker, path)),
            Ok(None) => log::trace!("Ignoring {path:?}"),
            Err(e) => log::warn!("Skipping {path:?}: {e}"),
        }
    }

    for (worker, path) in worker_files {
        match runs.get_mut(&worker.run) {
            Some(run) => run.files.entry(worker.category).or_default().push(path),
            None => log::debug!("No pod logs for worker metrics {path:?}"),
        }
    }

    Ok(runs)
}

impl ExperimentKey {
    /// Name of the merged traffic log of this experiment.
    pub fn file_name(&self, side: Side) -> String {
        format!(
            "{side}_pps_{}_pairs_{}_size_{}_cores_{}_pods-cores_{}.log",
            self.pps,
            self.pairs,
            self.size,
            self.cores_per_pod,
            self.cores.iter().join("_")
        )
    }
}

/// Concatenate the per-pod traffic logs of every run into one merged log per side, written to
/// `output_dir`. Returns the paths of all written files.
pub fn merge_run_files(
    runs: &BTreeMap<RunKey, RunFiles>,
    output_dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, DatasetError> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let mut written = Vec::new();
    for (run, files) in runs {
        let key = files.experiment_key(run);
        for side in [Side::Tx, Side::Rx] {
            let Some(pod_files) = files.files.get(&Category::traffic(side)) else {
                continue;
            };
            let mut merged = String::new();
            for path in pod_files {
                let content = fs::read_to_string(path)?;
                merged.push_str(&content);
                if !content.is_empty() && !content.ends_with('\n') {
                    merged.push('\n');
                }
            }
            let path = output_dir.then(key.file_name(side));
            log::debug!("Writing {} pod logs to {path:?}", pod_files.len());
            fs::write(&path, merged)?;
            written.push(path);
        }
    }
    Ok(written)
}
