use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("beads is not initialized in this project (expected .beads/ directory at {})", .0.display())]
    BeadsNotInitialized(PathBuf),

    #[error("mapping file already exists at {} (use --force to overwrite or --resume to continue)", .0.display())]
    MappingExists(PathBuf),

    #[error("task-master tasks file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("invalid JSON in task-master tasks file ({}): {message}", .path.display())]
    SourceSyntax { path: PathBuf, message: String },

    #[error(
        "task-master tasks file failed schema validation ({}):\n{}",
        .path.display(),
        .issues.iter().map(|issue| format!("  - {issue}")).collect::<Vec<_>>().join("\n")
    )]
    SourceSchema { path: PathBuf, issues: Vec<String> },

    #[error("dependency cycle: task {0} is part of a dependency cycle")]
    CycleDetected(u64),

    #[error("missing task: task {task} depends on task {dependency}, which does not exist")]
    MissingDependency { task: u64, dependency: u64 },

    #[error("duplicate task id {0} in source")]
    DuplicateTask(u64),

    #[error("duplicate subtask id {subtask} in task {task}")]
    DuplicateSubtask { task: u64, subtask: u64 },

    #[error("unknown priority: {0}")]
    UnknownPriority(String),

    #[error("unknown task status: {0}")]
    UnknownStatus(String),

    #[error("no epic id mapped for task {0}")]
    EpicNotFound(u64),

    #[error("no child id mapped for subtask {subtask} of task {task}")]
    ChildNotFound { task: u64, subtask: u64 },

    #[error("parent task {0} has no epic mapping")]
    ParentNotFound(u64),

    #[error("corrupt mapping file {}: {message}", .path.display())]
    CorruptMapping { path: PathBuf, message: String },

    #[error("`{command}` failed: {message}")]
    TrackerCommand { command: String, message: String },

    #[error("`{command}` returned an unexpected response: {message}")]
    TrackerResponse { command: String, message: String },

    #[error("locked by another process: {0}")]
    Locked(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::BeadsNotInitialized(_) => "beads_not_initialized",
            Self::MappingExists(_) => "mapping_exists",
            Self::SourceNotFound(_) => "source_not_found",
            Self::SourceSyntax { .. } => "source_syntax",
            Self::SourceSchema { .. } => "source_schema",
            Self::CycleDetected(_) => "cycle_detected",
            Self::MissingDependency { .. } => "missing_dependency",
            Self::DuplicateTask(_) => "duplicate_task",
            Self::DuplicateSubtask { .. } => "duplicate_subtask",
            Self::UnknownPriority(_) => "unknown_priority",
            Self::UnknownStatus(_) => "unknown_status",
            Self::EpicNotFound(_) => "epic_not_found",
            Self::ChildNotFound { .. } => "child_not_found",
            Self::ParentNotFound(_) => "parent_not_found",
            Self::CorruptMapping { .. } => "corrupt_mapping",
            Self::TrackerCommand { .. } => "tracker_command",
            Self::TrackerResponse { .. } => "tracker_response",
            Self::Locked(_) => "locked",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
