//! Destination issue tracker seam.

pub mod beads;

use serde::Deserialize;

use crate::error::{Result, SyncError};

pub use beads::BeadsCli;

/// Issue returned by a creation call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedIssue {
    pub id: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub issue_type: Option<String>,
}

impl CreatedIssue {
    /// Parse the JSON a tracker printed for a creation call.
    pub fn from_json(command: &str, stdout: &str) -> Result<Self> {
        let invalid = |message: String| SyncError::TrackerResponse {
            command: command.to_string(),
            message,
        };

        let issue: Self = serde_json::from_str(stdout.trim())
            .map_err(|err| invalid(format!("unexpected create output: {err}")))?;
        if issue.id.trim().is_empty() {
            return Err(invalid("`id` must be a non-empty string".into()));
        }
        Ok(issue)
    }
}

/// Operations the sync pipeline needs from the destination tracker.
pub trait IssueTrackerClient {
    fn create_epic(
        &mut self,
        title: &str,
        description: &str,
        priority: u8,
    ) -> Result<CreatedIssue>;

    fn create_child(
        &mut self,
        parent_id: &str,
        title: &str,
        description: &str,
    ) -> Result<CreatedIssue>;

    /// Record that `blocked_id` cannot proceed until `blocking_id` is resolved.
    fn add_dependency(&mut self, blocked_id: &str, blocking_id: &str) -> Result<()>;

    fn update_status(&mut self, id: &str, status: &str) -> Result<()>;

    fn close(&mut self, id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_extra_fields() {
        let issue = CreatedIssue::from_json(
            "bd create",
            r#"{"id":"bd-a1b2","title":"Setup","type":"epic","priority":0,"status":"open"}"#,
        )
        .unwrap();
        assert_eq!(issue.id, "bd-a1b2");
        assert_eq!(issue.title, "Setup");
        assert_eq!(issue.issue_type.as_deref(), Some("epic"));
    }

    #[test]
    fn type_is_optional() {
        let issue = CreatedIssue::from_json("bd create", r#"{"id":"bd-1","title":"t"}"#).unwrap();
        assert_eq!(issue.issue_type, None);
    }

    #[test]
    fn rejects_bad_shapes() {
        for stdout in [
            "Created issue bd-1",
            r#"["bd-1"]"#,
            r#"{"title":"t"}"#,
            r#"{"id":"","title":"t"}"#,
            r#"{"id":7,"title":"t"}"#,
            r#"{"id":"bd-1"}"#,
            r#"{"id":"bd-1","title":"t","type":3}"#,
        ] {
            let err = CreatedIssue::from_json("bd create", stdout).unwrap_err();
            assert!(
                matches!(err, SyncError::TrackerResponse { .. }),
                "accepted {stdout}"
            );
        }
    }
}
