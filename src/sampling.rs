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
//! Invoking the external sampling script.

use std::{
    path::Path,
    process::{Command, ExitStatus},
};

/// Arguments of one sampling run.
pub fn sampling_args(pps: u64, cores: u32) -> [String; 4] {
    ["-p".to_string(), pps.to_string(), "-c".to_string(), cores.to_string()]
}

/// Run `script -p <pps> -c <cores>` for every combination of target rate and core count, one
/// after the other. A run exiting with a non-zero status is logged and the next run is started.
/// Returns the exit status of every run, in order.
pub fn run_sampling(
    script: impl AsRef<Path>,
    pps_values: &[u64],
    core_counts: &[u32],
) -> std::io::Result<Vec<ExitStatus>> {
    let script = script.as_ref();
    let mut statuses = Vec::with_capacity(pps_values.len() * core_counts.len());
    for &pps in pps_values {
        for &cores in core_counts {
            log::info!("Running sampling for {pps} pps, core count {cores} ...");
            let status = Command::new(script).args(sampling_args(pps, cores)).status()?;
            if !status.success() {
                log::warn!("Sampling for {pps} pps on {cores} cores failed: {status}");
            }
            statuses.push(status);
        }
    }
    log::info!("Sampling completed.");
    Ok(statuses)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arguments() {
        assert_eq!(sampling_args(1000, 2), ["-p", "1000", "-c", "2"]);
    }

    #[cfg(unix)]
    #[test]
    fn runs_every_combination() {
        let statuses = run_sampling("true", &[1000, 2000], &[1, 2]).unwrap();
        assert_eq!(statuses.len(), 4);
        assert!(statuses.iter().all(|s| s.success()));

        // failing runs do not stop the sweep
        let statuses = run_sampling("false", &[1000], &[1, 2, 3]).unwrap();
        assert_eq!(statuses.len(), 3);
        assert!(statuses.iter().all(|s| !s.success()));
    }

    #[test]
    fn missing_script() {
        assert!(run_sampling("/nonexistent/run_monitor_pps.sh", &[1000], &[1]).is_err());
    }
}
