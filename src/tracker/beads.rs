use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use crate::error::{Result, SyncError};
use crate::tracker::{CreatedIssue, IssueTrackerClient};

pub const DEFAULT_PROGRAM: &str = "bd";

/// Drives the `bd` command line inside a Beads project directory.
#[derive(Debug, Clone)]
pub struct BeadsCli {
    project: PathBuf,
    program: OsString,
}

impl BeadsCli {
    pub fn new(project: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
            program: OsString::from(DEFAULT_PROGRAM),
        }
    }

    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Command line for logs and errors. Descriptions are left out.
    fn render(&self, args: &[String]) -> String {
        let mut rendered = self.program.to_string_lossy().into_owned();
        for arg in args.iter().filter(|arg| !arg.starts_with("--description=")) {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }

    fn exec(&self, args: &[String]) -> Result<String> {
        let command = self.render(args);
        tracing::debug!(cwd = %self.project.display(), "{command}");

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.project)
            .output()
            .map_err(|err| SyncError::TrackerCommand {
                command: command.clone(),
                message: err.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            return Err(SyncError::TrackerCommand {
                command,
                message: if detail.is_empty() {
                    format!("exited with {}", output.status)
                } else {
                    format!("exited with {}: {detail}", output.status)
                },
            });
        }

        tracing::trace!(stdout = %stdout.trim_end(), "bd output");
        Ok(stdout)
    }

    fn create(&self, mut args: Vec<String>, description: &str) -> Result<CreatedIssue> {
        if !description.is_empty() {
            args.push(format!("--description={description}"));
        }
        let stdout = self.exec(&args)?;
        CreatedIssue::from_json(&self.render(&args), &stdout)
    }
}

pub(crate) fn epic_args(title: &str, priority: u8) -> Vec<String> {
    vec![
        "create".into(),
        format!("--title={title}"),
        "-t".into(),
        "epic".into(),
        "-p".into(),
        priority.to_string(),
        "--json".into(),
    ]
}

pub(crate) fn child_args(parent_id: &str, title: &str) -> Vec<String> {
    vec![
        "create".into(),
        format!("--title={title}"),
        "--parent".into(),
        parent_id.to_string(),
        "--json".into(),
    ]
}

pub(crate) fn dependency_args(blocked_id: &str, blocking_id: &str) -> Vec<String> {
    vec![
        "dep".into(),
        "add".into(),
        blocked_id.to_string(),
        blocking_id.to_string(),
    ]
}

pub(crate) fn status_args(id: &str, status: &str) -> Vec<String> {
    vec!["update".into(), id.to_string(), format!("--status={status}")]
}

pub(crate) fn close_args(id: &str) -> Vec<String> {
    vec!["close".into(), id.to_string()]
}

impl IssueTrackerClient for BeadsCli {
    fn create_epic(&mut self, title: &str, description: &str, priority: u8) -> Result<CreatedIssue> {
        self.create(epic_args(title, priority), description)
    }

    fn create_child(
        &mut self,
        parent_id: &str,
        title: &str,
        description: &str,
    ) -> Result<CreatedIssue> {
        self.create(child_args(parent_id, title), description)
    }

    fn add_dependency(&mut self, blocked_id: &str, blocking_id: &str) -> Result<()> {
        self.exec(&dependency_args(blocked_id, blocking_id))
            .map(drop)
    }

    fn update_status(&mut self, id: &str, status: &str) -> Result<()> {
        self.exec(&status_args(id, status)).map(drop)
    }

    fn close(&mut self, id: &str) -> Result<()> {
        self.exec(&close_args(id)).map(drop)
    }
}
