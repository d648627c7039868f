//! Issue description text built from task-master fields.

use crate::error::Result;
use crate::model::{Priority, Subtask, Task};

fn section(title: &str, body: &str) -> String {
    format!("## {title}\n\n{body}")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}

pub fn format_epic_description(task: &Task) -> String {
    let mut parts = vec![section("Description", &task.description)];

    if let Some(details) = non_empty(task.details.as_deref()) {
        parts.push(section("Implementation Details", details));
    }
    if let Some(strategy) = non_empty(task.test_strategy.as_deref()) {
        parts.push(section("Test Strategy", strategy));
    }

    let mut metadata = vec![format!("- **Task-master ID:** {}", task.id)];
    if let Some(complexity) = task.complexity {
        metadata.push(format!("- **Complexity:** {complexity}"));
    }
    metadata.push(format!("- **Original status:** {}", task.status));
    parts.push(section("Metadata", &metadata.join("\n")));

    parts.join("\n\n")
}

pub fn format_child_description(subtask: &Subtask) -> String {
    let mut lines = vec![subtask.description.as_str()];

    if let Some(details) = subtask.details.as_deref()
        && !details.trim().is_empty()
    {
        lines.extend(["", "## Implementation Details", details]);
    }

    lines.join("\n")
}

/// Map a task-master priority name to the Beads priority number.
pub fn map_priority(raw: &str) -> Result<u8> {
    Ok(raw.parse::<Priority>()?.beads_priority())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::model::Status;

    fn task() -> Task {
        Task {
            id: 7,
            title: "Build parser".into(),
            description: "Parse the input.".into(),
            status: Status::InProgress,
            priority: Priority::High,
            dependencies: vec![],
            complexity: None,
            subtasks: vec![],
            details: None,
            test_strategy: None,
        }
    }

    fn subtask(details: Option<&str>) -> Subtask {
        Subtask {
            id: 1,
            title: "Tokenizer".into(),
            description: "Split into tokens.".into(),
            status: Status::Pending,
            dependencies: vec![],
            details: details.map(str::to_string),
            test_strategy: None,
        }
    }

    #[test]
    fn epic_description_minimal() {
        assert_eq!(
            format_epic_description(&task()),
            "## Description\n\nParse the input.\n\n\
             ## Metadata\n\n- **Task-master ID:** 7\n- **Original status:** in-progress"
        );
    }

    #[test]
    fn epic_description_includes_optional_sections_in_order() {
        let mut t = task();
        t.details = Some("Use a Pratt parser.".into());
        t.test_strategy = Some("Golden files.".into());
        t.complexity = Some(6);

        let text = format_epic_description(&t);
        assert_eq!(
            text,
            "## Description\n\nParse the input.\n\n\
             ## Implementation Details\n\nUse a Pratt parser.\n\n\
             ## Test Strategy\n\nGolden files.\n\n\
             ## Metadata\n\n- **Task-master ID:** 7\n- **Complexity:** 6\n- **Original status:** in-progress"
        );
    }

    #[test]
    fn epic_description_skips_empty_details() {
        let mut t = task();
        t.details = Some(String::new());
        t.test_strategy = Some(String::new());
        let text = format_epic_description(&t);
        assert!(!text.contains("Implementation Details"));
        assert!(!text.contains("Test Strategy"));
    }

    #[test]
    fn child_description_appends_details() {
        assert_eq!(
            format_child_description(&subtask(Some("Handle unicode."))),
            "Split into tokens.\n\n## Implementation Details\nHandle unicode."
        );
    }

    #[test]
    fn child_description_ignores_blank_details() {
        assert_eq!(
            format_child_description(&subtask(Some("   \n"))),
            "Split into tokens."
        );
        assert_eq!(format_child_description(&subtask(None)), "Split into tokens.");
    }

    #[test]
    fn priorities_map_to_beads_numbers() {
        assert_eq!(map_priority("high").unwrap(), 0);
        assert_eq!(map_priority("medium").unwrap(), 1);
        assert_eq!(map_priority("low").unwrap(), 2);
        assert!(matches!(
            map_priority("critical"),
            Err(SyncError::UnknownPriority(raw)) if raw == "critical"
        ));
    }
}
