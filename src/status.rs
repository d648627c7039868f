use serde::Serialize;

use crate::error::Result;
use crate::model::Status;

/// What to do with a Beads issue so it reflects a task-master status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    pub close: bool,
}

impl StatusAction {
    pub const NONE: Self = Self {
        status: None,
        close: false,
    };

    pub fn for_status(status: Status) -> Self {
        match status {
            Status::Pending => Self::NONE,
            Status::InProgress => Self {
                status: Some("in_progress"),
                close: false,
            },
            Status::Done => Self {
                status: None,
                close: true,
            },
            Status::Deferred => Self {
                status: Some("deferred"),
                close: false,
            },
        }
    }
}

/// Translate a raw task-master status name.
pub fn map_status(raw: &str) -> Result<StatusAction> {
    Ok(StatusAction::for_status(raw.parse()?))
}
