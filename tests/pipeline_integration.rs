use std::collections::HashMap;
use std::path::Path;

use tm2bd::error::Result;
use tm2bd::pipeline::{self, NoProgress};
use tm2bd::sort::sort;
use tm2bd::source::parse_tasks;
use tm2bd::store::mapping::IdBridge;
use tm2bd::tracker::{CreatedIssue, IssueTrackerClient};

#[derive(Default)]
struct MemoryTracker {
    issues: Vec<(String, Option<String>)>,
    edges: Vec<(String, String)>,
    closed: Vec<String>,
    statuses: HashMap<String, String>,
}

impl MemoryTracker {
    fn create(&mut self, title: &str, parent: Option<&str>) -> CreatedIssue {
        let id = format!("mem-{}", self.issues.len() + 1);
        self.issues.push((id.clone(), parent.map(str::to_string)));
        CreatedIssue {
            id,
            title: title.to_string(),
            issue_type: None,
        }
    }

    fn created_at(&self, id: &str) -> usize {
        self.issues
            .iter()
            .position(|(issue, _)| issue == id)
            .expect("issue was created")
    }
}

impl IssueTrackerClient for MemoryTracker {
    fn create_epic(&mut self, title: &str, _: &str, _: u8) -> Result<CreatedIssue> {
        Ok(self.create(title, None))
    }

    fn create_child(&mut self, parent_id: &str, title: &str, _: &str) -> Result<CreatedIssue> {
        Ok(self.create(title, Some(parent_id)))
    }

    fn add_dependency(&mut self, blocked_id: &str, blocking_id: &str) -> Result<()> {
        self.edges.push((blocked_id.into(), blocking_id.into()));
        Ok(())
    }

    fn update_status(&mut self, id: &str, status: &str) -> Result<()> {
        self.statuses.insert(id.into(), status.into());
        Ok(())
    }

    fn close(&mut self, id: &str) -> Result<()> {
        self.closed.push(id.into());
        Ok(())
    }
}

const DIAMOND: &str = r#"{
  "feature-x": {
    "tasks": [
      { "id": 4, "title": "Ship", "description": "", "status": "pending", "priority": "high", "dependencies": [2, 3] },
      { "id": 3, "title": "Right", "description": "", "status": "deferred", "priority": "low", "dependencies": [1] },
      { "id": 2, "title": "Left", "description": "", "status": "done", "priority": "medium", "dependencies": ["1"],
        "subtasks": [
          { "id": 3, "title": "L3", "description": "", "status": "pending", "dependencies": [1, 2] },
          { "id": 1, "title": "L1", "description": "", "status": "done", "dependencies": [] },
          { "id": 2, "title": "L2", "description": "", "status": "in-progress", "dependencies": [1] }
        ] },
      { "id": 1, "title": "Root", "description": "", "status": "done", "priority": "high", "dependencies": [] }
    ]
  }
}"#;

#[test]
fn diamond_graph_syncs_in_dependency_order() {
    let tasks = parse_tasks(Path::new("tasks.json"), DIAMOND, "feature-x").unwrap();
    let sorted = sort(tasks).unwrap();
    let tiers: Vec<(u64, usize)> = sorted.iter().map(|t| (t.id, t.tier)).collect();
    assert_eq!(tiers, vec![(1, 0), (2, 1), (3, 1), (4, 2)]);

    let mut tracker = MemoryTracker::default();
    let mut bridge = IdBridge::new();
    let summary = pipeline::run(&sorted, &mut tracker, &mut bridge, &mut NoProgress).unwrap();

    assert_eq!(summary.epics_created, 4);
    assert_eq!(summary.children_created, 3);
    assert_eq!(summary.epic_dependencies, 4);
    assert_eq!(summary.subtask_dependencies, 3);

    // Every blocking issue exists before anything that depends on it.
    for (blocked, blocking) in &tracker.edges {
        assert!(tracker.created_at(blocking) < tracker.created_at(blocked));
    }

    let left = bridge.epic_id(2).unwrap();
    for subtask in 1..=3 {
        let child = bridge.subtask_id(2, subtask).unwrap();
        let (_, parent) = &tracker.issues[tracker.created_at(child)];
        assert_eq!(parent.as_deref(), Some(left));
    }
    assert_eq!(bridge.subtask_id(2, 1), Some("mem-5"));
    assert_eq!(bridge.subtask_id(2, 3), Some("mem-7"));

    let mut closed = tracker.closed.clone();
    closed.sort();
    let mut expected = vec![
        bridge.epic_id(1).unwrap().to_string(),
        left.to_string(),
        bridge.subtask_id(2, 1).unwrap().to_string(),
    ];
    expected.sort();
    assert_eq!(closed, expected);

    assert_eq!(tracker.statuses[bridge.epic_id(3).unwrap()], "deferred");
    assert_eq!(tracker.statuses[bridge.subtask_id(2, 2).unwrap()], "in_progress");
    assert!(!tracker.statuses.contains_key(bridge.epic_id(4).unwrap()));
}
