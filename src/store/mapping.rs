use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SyncError};

pub const MAPPING_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubtaskMapping {
    pub tm_id: u64,
    pub beads_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskMapping {
    pub tm_id: u64,
    pub beads_id: String,
    #[serde(default)]
    pub subtasks: Vec<SubtaskMapping>,
}

/// On-disk form of the bridge.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct MappingFile {
    version: String,
    generated_at: DateTime<Utc>,
    tasks: Vec<TaskMapping>,
}

/// Maps task-master task/subtask ids to the Beads ids issued for them.
///
/// Entries are only ever appended. When an id is recorded twice the first
/// mapping keeps winning lookups.
#[derive(Debug, Default, Clone)]
pub struct IdBridge {
    tasks: Vec<TaskMapping>,
    by_task: HashMap<u64, usize>,
}

impl IdBridge {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_entries(tasks: Vec<TaskMapping>) -> Self {
        let mut by_task = HashMap::with_capacity(tasks.len());
        for (position, entry) in tasks.iter().enumerate() {
            by_task.entry(entry.tm_id).or_insert(position);
        }
        Self { tasks, by_task }
    }

    pub fn add_epic(&mut self, tm_id: u64, beads_id: impl Into<String>) {
        let beads_id = beads_id.into();
        if let Some(existing) = self.epic_id(tm_id) {
            tracing::warn!(
                tm_id,
                existing,
                duplicate = %beads_id,
                "task already mapped; keeping the first mapping"
            );
        }
        self.by_task.entry(tm_id).or_insert(self.tasks.len());
        self.tasks.push(TaskMapping {
            tm_id,
            beads_id,
            subtasks: Vec::new(),
        });
    }

    pub fn add_subtask(
        &mut self,
        task_tm_id: u64,
        subtask_tm_id: u64,
        beads_id: impl Into<String>,
    ) -> Result<()> {
        let position = *self
            .by_task
            .get(&task_tm_id)
            .ok_or(SyncError::ParentNotFound(task_tm_id))?;
        self.tasks[position].subtasks.push(SubtaskMapping {
            tm_id: subtask_tm_id,
            beads_id: beads_id.into(),
        });
        Ok(())
    }

    pub fn epic_id(&self, tm_id: u64) -> Option<&str> {
        self.by_task
            .get(&tm_id)
            .map(|&position| self.tasks[position].beads_id.as_str())
    }

    pub fn subtask_id(&self, task_tm_id: u64, subtask_tm_id: u64) -> Option<&str> {
        let position = *self.by_task.get(&task_tm_id)?;
        self.tasks[position]
            .subtasks
            .iter()
            .find(|subtask| subtask.tm_id == subtask_tm_id)
            .map(|subtask| subtask.beads_id.as_str())
    }

    pub fn entries(&self) -> &[TaskMapping] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn subtask_count(&self) -> usize {
        self.tasks.iter().map(|task| task.subtasks.len()).sum()
    }

    /// Write the bridge to `path`, replacing any existing file.
    ///
    /// The payload goes to a sibling temp file first and is renamed into place,
    /// so an interrupted save never leaves a truncated mapping behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let payload = MappingFile {
            version: MAPPING_VERSION.to_string(),
            generated_at: Utc::now(),
            tasks: self.tasks.clone(),
        };
        let json = serde_json::to_string_pretty(&payload)?;

        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mapping.json".to_string());
        let staging = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

        fs::write(&staging, json)?;
        if let Err(err) = fs::rename(&staging, path) {
            let _ = fs::remove_file(&staging);
            return Err(err.into());
        }

        tracing::debug!(
            path = %path.display(),
            tasks = self.len(),
            subtasks = self.subtask_count(),
            "mapping saved"
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let corrupt = |message: String| SyncError::CorruptMapping {
            path: path.to_path_buf(),
            message,
        };

        let file: MappingFile =
            serde_json::from_str(&raw).map_err(|err| corrupt(err.to_string()))?;
        if file.version != MAPPING_VERSION {
            return Err(corrupt(format!(
                "unsupported mapping version '{}' (expected '{MAPPING_VERSION}')",
                file.version
            )));
        }

        tracing::debug!(
            path = %path.display(),
            generated_at = %file.generated_at,
            tasks = file.tasks.len(),
            "mapping loaded"
        );
        Ok(Self::from_entries(file.tasks))
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }
}
