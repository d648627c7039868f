//! Reading task-master `tasks.json` files.
//!
//! The raw JSON is checked against a JSON Schema first so that every problem
//! is reported at once with its field path, then deserialized into the model.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::error::{Result, SyncError};
use crate::model::Task;

pub const DEFAULT_TAG: &str = "master";

const STATUS_NAMES: &[&str] = &["pending", "in-progress", "done", "deferred"];
const PRIORITY_NAMES: &[&str] = &["high", "medium", "low"];

/// Produces validated task records for a sync run.
pub trait TaskSource {
    /// Human-readable origin, used in reports.
    fn describe(&self) -> String;

    fn load(&self) -> Result<Vec<Task>>;
}

/// A task-master JSON file, read from one tag (`master` by default).
#[derive(Debug, Clone)]
pub struct TaskFile {
    path: PathBuf,
    tag: String,
}

impl TaskFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tag: DEFAULT_TAG.to_string(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }
}

impl TaskSource for TaskFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Vec<Task>> {
        let raw = fs::read_to_string(&self.path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => SyncError::SourceNotFound(self.path.clone()),
            _ => SyncError::Io(err),
        })?;
        let tasks = parse_tasks(&self.path, &raw, &self.tag)?;
        tracing::debug!(
            path = %self.path.display(),
            tag = %self.tag,
            tasks = tasks.len(),
            "loaded task-master tasks"
        );
        Ok(tasks)
    }
}

#[derive(Deserialize)]
struct TaggedTasks {
    tasks: Vec<Task>,
}

/// Integer id, or a string holding one.
fn id_schema(positive: bool) -> Value {
    let (minimum, pattern) = if positive {
        (1, r"^\s*0*[1-9][0-9]*\s*$")
    } else {
        (0, r"^\s*[0-9]+\s*$")
    };
    json!({
        "anyOf": [
            { "type": "integer", "minimum": minimum },
            { "type": "string", "pattern": pattern }
        ]
    })
}

/// JSON Schema for a task-master file, with the tasks under `tag`.
pub fn tasks_schema(tag: &str) -> Value {
    let status = json!({ "enum": STATUS_NAMES });
    let subtask = json!({
        "type": "object",
        "required": ["id", "title", "description", "status"],
        "properties": {
            "id": id_schema(true),
            "title": { "type": "string" },
            "description": { "type": "string" },
            "status": status.clone(),
            "dependencies": { "type": "array", "items": id_schema(false) },
            "details": { "type": "string" },
            "testStrategy": { "type": "string" }
        }
    });
    let task = json!({
        "type": "object",
        "required": ["id", "title", "description", "status", "priority", "dependencies"],
        "properties": {
            "id": id_schema(true),
            "title": { "type": "string" },
            "description": { "type": "string" },
            "status": status,
            "priority": { "enum": PRIORITY_NAMES },
            "dependencies": { "type": "array", "items": id_schema(false) },
            "complexity": {
                "anyOf": [
                    { "type": "integer", "minimum": 1, "maximum": 10 },
                    { "type": "string", "pattern": r"^\s*0*([1-9]|10)\s*$" }
                ]
            },
            "subtasks": { "type": "array", "items": subtask },
            "details": { "type": "string" },
            "testStrategy": { "type": "string" }
        }
    });

    let mut properties = Map::new();
    properties.insert(
        tag.to_string(),
        json!({
            "type": "object",
            "required": ["tasks"],
            "properties": { "tasks": { "type": "array", "items": task } }
        }),
    );
    json!({
        "type": "object",
        "required": [tag],
        "properties": properties
    })
}

/// `/master/tasks/0/title` -> `master.tasks.0.title`, `(root)` for the root.
fn dotted_path(pointer: &str) -> String {
    if pointer.is_empty() {
        return "(root)".to_string();
    }
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}

fn schema_issues(schema: &Value, instance: &Value) -> Vec<String> {
    match jsonschema::validator_for(schema) {
        Ok(validator) => validator
            .iter_errors(instance)
            .map(|err| format!("{}: {err}", dotted_path(&err.instance_path.to_string())))
            .collect(),
        Err(err) => vec![format!("(schema): {err}")],
    }
}

/// Subtask ids only have to be unique under their own task.
fn duplicate_subtask_issues(tag: &str, tasks: &[Task]) -> Vec<String> {
    let mut issues = Vec::new();
    for (task_position, task) in tasks.iter().enumerate() {
        let mut seen = HashSet::new();
        for (position, subtask) in task.subtasks.iter().enumerate() {
            if !seen.insert(subtask.id) {
                issues.push(format!(
                    "{tag}.tasks.{task_position}.subtasks.{position}.id: duplicate subtask id {} in task {}",
                    subtask.id, task.id
                ));
            }
        }
    }
    issues
}

/// Parse and validate the contents of a tasks file.
pub fn parse_tasks(path: &Path, raw: &str, tag: &str) -> Result<Vec<Task>> {
    let mut value: Value = serde_json::from_str(raw).map_err(|err| SyncError::SourceSyntax {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let schema_error = |issues: Vec<String>| SyncError::SourceSchema {
        path: path.to_path_buf(),
        issues,
    };

    let issues = schema_issues(&tasks_schema(tag), &value);
    if !issues.is_empty() {
        return Err(schema_error(issues));
    }

    let tagged = value.get_mut(tag).map(Value::take).unwrap_or_default();
    let TaggedTasks { tasks } = serde_json::from_value(tagged)
        .map_err(|err| schema_error(vec![format!("{tag}: {err}")]))?;

    let issues = duplicate_subtask_issues(tag, &tasks);
    if !issues.is_empty() {
        return Err(schema_error(issues));
    }

    Ok(tasks
        .into_iter()
        .map(|mut task| {
            task.normalize();
            task
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, Status};
    use tempfile::tempdir;

    fn parse(raw: &str) -> Result<Vec<Task>> {
        parse_tasks(Path::new("tasks.json"), raw, DEFAULT_TAG)
    }

    fn schema_issues_of(raw: &str) -> Vec<String> {
        match parse(raw) {
            Err(SyncError::SourceSchema { issues, .. }) => issues,
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    fn has_issue(issues: &[String], path: &str) -> bool {
        issues.iter().any(|issue| issue.starts_with(&format!("{path}: ")))
    }

    #[test]
    fn parses_tasks_with_subtasks() {
        let tasks = parse(
            r#"{
              "master": {
                "tasks": [
                  {
                    "id": 1,
                    "title": "Setup",
                    "description": "Project skeleton",
                    "status": "done",
                    "priority": "high",
                    "dependencies": [],
                    "complexity": 3,
                    "details": "cargo new",
                    "testStrategy": "it builds",
                    "subtasks": [
                      {"id": 2, "title": "CI", "description": "Add CI", "status": "pending", "dependencies": [1]},
                      {"id": 1, "title": "Repo", "description": "Create repo", "status": "done"}
                    ]
                  },
                  {
                    "id": "2",
                    "title": "Parser",
                    "description": "Write parser",
                    "status": "in-progress",
                    "priority": "medium",
                    "dependencies": ["1", 1],
                    "updatedAt": "2026-01-01"
                  }
                ]
              }
            }"#,
        )
        .unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].complexity, Some(3));
        assert_eq!(tasks[0].test_strategy.as_deref(), Some("it builds"));
        assert_eq!(tasks[0].subtasks.len(), 2);
        assert_eq!(tasks[0].subtasks[0].dependencies, vec![1]);
        assert_eq!(tasks[1].id, 2);
        assert_eq!(tasks[1].status, Status::InProgress);
        assert_eq!(tasks[1].dependencies, vec![1]);
        assert!(tasks[1].subtasks.is_empty());
    }

    #[test]
    fn syntax_error_is_distinct() {
        let err = parse("{ not json").unwrap_err();
        assert!(matches!(err, SyncError::SourceSyntax { .. }));
    }

    #[test]
    fn missing_tag_is_reported_at_root() {
        let issues = schema_issues_of(r#"{"feature": {"tasks": []}}"#);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].starts_with("(root): "));
        assert!(issues[0].contains("master"));
    }

    #[test]
    fn non_object_root_is_reported() {
        let issues = schema_issues_of("[]");
        assert!(has_issue(&issues, "(root)"));
    }

    #[test]
    fn every_violation_is_listed_with_its_path() {
        let issues = schema_issues_of(
            r#"{
              "master": {
                "tasks": [
                  {"id": 1, "description": "d", "status": "blocked", "priority": "high", "dependencies": []},
                  {"id": 0, "title": "t", "description": "d", "status": "done", "priority": "urgent",
                   "dependencies": ["x"], "complexity": 11,
                   "subtasks": [{"id": 1, "title": 5, "description": "d", "status": "done"}]}
                ]
              }
            }"#,
        );

        for path in [
            "master.tasks.0",
            "master.tasks.0.status",
            "master.tasks.1.id",
            "master.tasks.1.priority",
            "master.tasks.1.dependencies.0",
            "master.tasks.1.complexity",
            "master.tasks.1.subtasks.0.title",
        ] {
            assert!(has_issue(&issues, path), "no issue for {path}: {issues:#?}");
        }
        assert!(
            issues
                .iter()
                .any(|issue| issue.starts_with("master.tasks.0: ") && issue.contains("title"))
        );
        assert_eq!(issues.len(), 7, "{issues:#?}");
    }

    #[test]
    fn duplicate_subtask_ids_are_rejected() {
        let issues = schema_issues_of(
            r#"{"master": {"tasks": [
                {"id": 1, "title": "E", "description": "d", "status": "pending", "priority": "high",
                 "dependencies": [],
                 "subtasks": [
                   {"id": 1, "title": "A", "description": "d", "status": "pending"},
                   {"id": "1", "title": "B", "description": "d", "status": "done"}
                 ]}
            ]}}"#,
        );
        assert_eq!(
            issues,
            vec!["master.tasks.0.subtasks.1.id: duplicate subtask id 1 in task 1"]
        );
    }

    #[test]
    fn same_subtask_id_under_different_tasks_is_fine() {
        let tasks = parse(
            r#"{"master": {"tasks": [
                {"id": 1, "title": "a", "description": "d", "status": "pending", "priority": "high",
                 "dependencies": [], "subtasks": [{"id": 1, "title": "s", "description": "d", "status": "pending"}]},
                {"id": 2, "title": "b", "description": "d", "status": "pending", "priority": "high",
                 "dependencies": [], "subtasks": [{"id": 1, "title": "s", "description": "d", "status": "pending"}]}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn reads_alternate_tag() {
        let raw = r#"{"feature-x": {"tasks": [
            {"id": 4, "title": "t", "description": "d", "status": "pending", "priority": "low", "dependencies": []}
        ]}}"#;
        let tasks = parse_tasks(Path::new("tasks.json"), raw, "feature-x").unwrap();
        assert_eq!(tasks[0].id, 4);
        assert_eq!(tasks[0].priority, Priority::Low);
    }

    #[test]
    fn pointer_segments_become_dotted_paths() {
        assert_eq!(dotted_path(""), "(root)");
        assert_eq!(dotted_path("/master/tasks/3/id"), "master.tasks.3.id");
        assert_eq!(dotted_path("/a~1b/c~0d"), "a/b.c~d");
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempdir().unwrap();
        let source = TaskFile::new(dir.path().join("nope.json"));
        assert!(matches!(source.load(), Err(SyncError::SourceNotFound(_))));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(
            &path,
            r#"{"master": {"tasks": [
                {"id": 1, "title": "t", "description": "d", "status": "pending", "priority": "high", "dependencies": []}
            ]}}"#,
        )
        .unwrap();

        let source = TaskFile::new(&path);
        assert_eq!(source.describe(), path.display().to_string());
        assert_eq!(source.load().unwrap().len(), 1);
    }
}
