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
use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{MultiProgress, ProgressBar, ProgressIterator, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use trafgen::{
    dataset::{index_run_files, merge_run_files, Dataset},
    metrics::summarize,
    plot::{plot_stats, ChartKind},
    sampling::run_sampling,
};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Directory holding the collected logs.
    #[arg(short, long, default_value = "metrics")]
    metric_dir: PathBuf,
    /// Print the mean rates of every experiment.
    #[arg(short, long)]
    print: bool,
    /// Collect samples before processing the metrics.
    #[arg(short, long)]
    sample: bool,
    /// Target rates to collect samples for.
    #[arg(
        long,
        num_args = 1..,
        default_values_t = [1000, 10000, 20000, 50000, 100000, 200000, 500000, 1000000]
    )]
    pps_values: Vec<u64>,
    /// Core counts to collect samples for, for each target rate.
    #[arg(long, num_args = 1.., default_values_t = [1, 2, 3, 4])]
    cores: Vec<u32>,
    /// Output directory for charts.
    #[arg(short, long, default_value = "plots")]
    output_dir: PathBuf,
    /// Open the charts in the browser instead of writing them to the output directory.
    #[arg(short, long)]
    interactive: bool,
    /// Dump the file index and the first loaded experiment.
    #[arg(long)]
    debug: bool,
    /// Read merged `tx_*`/`rx_*` logs instead of the per-pod logs.
    #[arg(long)]
    merged: bool,
    /// Write one merged log per experiment and side into the metric directory.
    #[arg(long)]
    merge: bool,
    /// Script that collects the samples of a single run.
    #[arg(long, default_value = "./run_monitor_pps.sh")]
    script: PathBuf,
    /// Number of transmit (and receive) queues per interface.
    #[arg(long, default_value_t = 8)]
    queues: usize,
}

fn main() -> Result<()> {
    let logger = pretty_env_logger::formatted_builder()
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .build();
    let multi = MultiProgress::new();
    LogWrapper::new(multi.clone(), logger).try_init().unwrap();

    let args = Args::parse();

    if args.sample {
        run_sampling(&args.script, &args.pps_values, &args.cores)
            .with_context(|| format!("Cannot run {:?}", args.script))?;
    }

    let dataset = if args.merged {
        Dataset::from_merged_files(&args.metric_dir)
            .with_context(|| format!("Cannot read {:?}", args.metric_dir))?
    } else {
        let runs = index_run_files(&args.metric_dir)
            .with_context(|| format!("Cannot read {:?}", args.metric_dir))?;
        log::info!("Found {} runs in {:?}", runs.len(), args.metric_dir);

        if args.debug {
            if let Some((run, files)) = runs.iter().next() {
                println!("{run}: {}", serde_json::to_string_pretty(files)?);
            }
        }

        if args.merge {
            let written = merge_run_files(&runs, &args.metric_dir)
                .context("Cannot write the merged logs")?;
            log::info!("Merged the pod logs into {} files", written.len());
        }

        let pb = multi.add(
            ProgressBar::new(runs.len() as u64).with_style(
                ProgressStyle::with_template(
                    "[{bar:80}] loading: {pos:>4}/{len:4}, elapsed: {elapsed}",
                )
                .unwrap()
                .progress_chars("##-"),
            ),
        );
        let dataset: Dataset = runs
            .iter()
            .progress_with(pb.clone())
            .map(|(run, files)| files.load(run))
            .collect();
        pb.finish_and_clear();
        dataset
    };
    log::info!("Loaded {} experiments", dataset.len());

    if args.debug {
        if let Some(record) = dataset.iter().next() {
            for (category, shape) in record.shapes() {
                println!("Dimension of first record's {category}: {shape:?}");
            }
            println!("{}", serde_json::to_string_pretty(record)?);
        }
    }

    if args.print {
        for record in dataset.iter() {
            match summarize(record) {
                Ok(summary) => println!("Experiment: {}\n{summary}\n", record.key),
                Err(e) => log::warn!("Cannot summarize {}: {e}", record.key),
            }
        }
    }

    let output_dir = if args.interactive {
        None
    } else {
        fs::create_dir_all(&args.output_dir)
            .with_context(|| format!("Cannot create {:?}", args.output_dir))?;
        Some(args.output_dir.as_path())
    };

    let drawn: usize = ChartKind::all(&dataset)
        .into_iter()
        .map(|kind| plot_stats(&dataset, kind, output_dir, args.queues))
        .sum();
    log::info!("Drew {drawn} charts");

    Ok(())
}
