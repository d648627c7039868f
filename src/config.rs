use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::source::DEFAULT_TAG;
use crate::tracker::beads::DEFAULT_PROGRAM;

pub const DEFAULT_TASKS_PATH: &str = ".tasks/tasks.json";
pub const DEFAULT_PROJECT_DIR: &str = ".";
pub const DEFAULT_MAP_FILE: &str = "./tm2bd-map.json";

/// Overrides the `bd` executable (absolute path or name on PATH).
pub const BD_BIN_ENV: &str = "TM2BD_BD_BIN";
/// `tracing` filter directives, e.g. `tm2bd=trace`.
pub const LOG_ENV: &str = "TM2BD_LOG";

/// Everything a `sync` run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub tasks: PathBuf,
    pub project: PathBuf,
    pub map_file: PathBuf,
    pub tag: String,
    pub dry_run: bool,
    pub force: bool,
    pub resume: bool,
    pub verbose: bool,
    pub bd_program: OsString,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            tasks: PathBuf::from(DEFAULT_TASKS_PATH),
            project: PathBuf::from(DEFAULT_PROJECT_DIR),
            map_file: PathBuf::from(DEFAULT_MAP_FILE),
            tag: DEFAULT_TAG.to_string(),
            dry_run: false,
            force: false,
            resume: false,
            verbose: false,
            bd_program: OsString::from(DEFAULT_PROGRAM),
        }
    }
}

impl SyncOptions {
    /// Apply environment overrides on top of the parsed flags.
    pub fn with_env(mut self) -> Self {
        if let Some(program) = std::env::var_os(BD_BIN_ENV).filter(|value| !value.is_empty()) {
            self.bd_program = program;
        }
        self
    }

    pub fn beads_dir(&self) -> PathBuf {
        self.project.join(".beads")
    }

    pub fn map_file(&self) -> &Path {
        &self.map_file
    }
}
