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
//! Utility module collection of functions

use std::{
    cmp::Ordering,
    path::{Path, PathBuf},
};

use itertools::Itertools;

/// Initialize logging from `log4rs.yml` in the working directory, or from `RUST_LOG` if that file
/// does not exist.
pub fn init_logging() {
    if Path::new("log4rs.yml").exists() {
        if let Err(e) = log4rs::init_file("log4rs.yml", Default::default()) {
            eprintln!("Cannot initialize logging from log4rs.yml: {e}");
        }
    } else {
        let _ = pretty_env_logger::try_init();
    }
}

pub trait PathBufExt: Sized {
    fn then(self, p: impl AsRef<Path>) -> PathBuf;
}

impl PathBufExt for PathBuf {
    fn then(mut self, p: impl AsRef<Path>) -> PathBuf {
        self.push(p);
        self
    }
}

impl PathBufExt for &Path {
    fn then(self, p: impl AsRef<Path>) -> PathBuf {
        let mut path = self.to_path_buf();
        path.push(p);
        path
    }
}

/// Natural ordering of two paths by their file name, such that `pod2` comes before `pod10`.
pub fn natural_order(a: &Path, b: &Path) -> Ordering {
    let name = |p: &Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    };
    human_sort::compare(&name(a), &name(b))
}

/// All files in `dir` (not recursive) whose name matches the glob `pattern`, in natural order.
///
/// Entries that cannot be read are skipped with a warning.
pub fn list_files(
    dir: impl AsRef<Path>,
    pattern: &str,
) -> Result<Vec<PathBuf>, glob::PatternError> {
    let dir = glob::Pattern::escape(&dir.as_ref().to_string_lossy());
    let files = glob::glob(&format!("{dir}/{pattern}"))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Cannot read {:?}: {}", e.path(), e.error());
                None
            }
        })
        .filter(|path| path.is_file())
        .sorted_by(|a, b| natural_order(a, b))
        .collect_vec();
    Ok(files)
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;
    use crate::matrix::test::scratch_dir;

    #[test]
    fn natural_file_order() {
        let dir = scratch_dir("natural_file_order");
        for name in ["pod10.log", "pod2.log", "pod1.log", "other.txt"] {
            fs::write(dir.join(name), "").unwrap();
        }
        fs::create_dir(dir.join("pod3.log")).unwrap();

        let files = list_files(&dir, "pod*.log")
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect_vec();
        assert_eq!(files, vec!["pod1.log", "pod2.log", "pod10.log"]);
    }

    #[test]
    fn path_then() {
        let path = Path::new("/tmp").then("a").then("b.log");
        assert_eq!(path, PathBuf::from("/tmp/a/b.log"));
    }
}
