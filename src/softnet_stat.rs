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
use std::{path::PathBuf, thread, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use trafgen::{
    softnet::{SoftnetTable, SortColumn},
    util,
};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Softnet statistics to read.
    #[arg(default_value = "/proc/net/softnet_stat")]
    path: PathBuf,
    /// Sort the CPUs by this counter.
    #[arg(long, value_enum)]
    sort: Option<SortColumn>,
    /// Print one line of values per CPU.
    #[arg(long)]
    concise: bool,
    /// Keep reading the statistics until interrupted.
    #[arg(short, long)]
    continuous: bool,
    /// Seconds between two reads in continuous mode.
    #[arg(short, long, default_value_t = 1.0)]
    sample_time: f64,
}

fn report(args: &Args) -> Result<()> {
    let mut table =
        SoftnetTable::read(&args.path).with_context(|| format!("Cannot read {:?}", args.path))?;
    log::debug!("Read {} CPUs in the {} layout", table.rows.len(), table.layout);
    if let Some(column) = args.sort {
        table.sort_by(column)?;
    }
    if args.concise {
        println!("{}", table.render_concise());
    } else {
        println!("{}", table.render_table());
    }
    Ok(())
}

fn main() -> Result<()> {
    util::init_logging();
    let args = Args::parse();

    if !args.continuous {
        return report(&args);
    }

    let interval = Duration::try_from_secs_f64(args.sample_time)
        .with_context(|| format!("Invalid sample time {}", args.sample_time))?;
    loop {
        report(&args)?;
        thread::sleep(interval);
    }
}
