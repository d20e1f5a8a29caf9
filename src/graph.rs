//! Sources the pre-generated `git log --graph` HTML that posts embed. Each
//! section's graph lives at `{graph_directory}/{section}.html`.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Returns the path of the graph for `section`.
pub fn branch_graph_path(directory: &Path, section: &str) -> PathBuf {
    directory.join(format!("{}.html", section))
}

/// Reads the graph for `section` from `directory`.
pub fn read_branch_graph(directory: &Path, section: &str) -> Result<String> {
    let path = branch_graph_path(directory, section);
    fs::read_to_string(&path).map_err(|err| Error { path, err })
}

/// The result of reading a branch graph.
pub type Result<T> = std::result::Result<T, Error>;

/// Returned when a branch graph can't be read.
#[derive(Debug)]
pub struct Error {
    pub path: PathBuf,
    pub err: io::Error,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Reading branch graph '{}': {}",
            self.path.display(),
            self.err
        )
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.err)
    }
}
