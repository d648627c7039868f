//! The four sync phases.
//!
//! Phases run strictly in order over the tier-sorted tasks: epics, children,
//! dependency edges, statuses. Each phase reads what the previous ones wrote
//! into the [`IdBridge`], and the first error stops the run. Nothing already
//! created in the tracker is rolled back.

use serde::Serialize;

use crate::describe::{format_child_description, format_epic_description};
use crate::error::{Result, SyncError};
use crate::model::TieredTask;
use crate::status::StatusAction;
use crate::store::mapping::IdBridge;
use crate::tracker::IssueTrackerClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Epics,
    Children,
    Dependencies,
    Statuses,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Epics => write!(f, "epics"),
            Self::Children => write!(f, "children"),
            Self::Dependencies => write!(f, "dependencies"),
            Self::Statuses => write!(f, "statuses"),
        }
    }
}

/// Receives progress while the pipeline runs.
///
/// `advanced` is only reported by the epic and child phases.
pub trait ProgressReporter {
    fn phase_started(&mut self, _phase: Phase) {}

    fn advanced(&mut self, _phase: Phase, _done: usize, _total: usize) {}

    fn phase_finished(&mut self, _phase: Phase) {}
}

/// Reporter that ignores everything.
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub epics_created: usize,
    pub epics_skipped: usize,
    pub children_created: usize,
    pub children_skipped: usize,
    pub epic_dependencies: usize,
    pub subtask_dependencies: usize,
    pub closed: usize,
    pub status_updates: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Created {
    pub created: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Wired {
    pub epic_edges: usize,
    pub subtask_edges: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Synced {
    pub closed: usize,
    pub updated: usize,
}

/// Run all four phases in order.
pub fn run(
    tasks: &[TieredTask],
    client: &mut dyn IssueTrackerClient,
    bridge: &mut IdBridge,
    progress: &mut dyn ProgressReporter,
) -> Result<SyncSummary> {
    progress.phase_started(Phase::Epics);
    let epics = create_epics(tasks, client, bridge, progress)?;
    progress.phase_finished(Phase::Epics);

    progress.phase_started(Phase::Children);
    let children = create_children(tasks, client, bridge, progress)?;
    progress.phase_finished(Phase::Children);

    progress.phase_started(Phase::Dependencies);
    let wired = wire_dependencies(tasks, client, bridge)?;
    progress.phase_finished(Phase::Dependencies);

    progress.phase_started(Phase::Statuses);
    let synced = sync_statuses(tasks, client, bridge)?;
    progress.phase_finished(Phase::Statuses);

    Ok(SyncSummary {
        epics_created: epics.created,
        epics_skipped: epics.skipped,
        children_created: children.created,
        children_skipped: children.skipped,
        epic_dependencies: wired.epic_edges,
        subtask_dependencies: wired.subtask_edges,
        closed: synced.closed,
        status_updates: synced.updated,
    })
}

/// Phase 1: one epic per task.
///
/// Tasks the bridge already maps (a resumed run) are skipped.
pub fn create_epics(
    tasks: &[TieredTask],
    client: &mut dyn IssueTrackerClient,
    bridge: &mut IdBridge,
    progress: &mut dyn ProgressReporter,
) -> Result<Created> {
    let total = tasks.len();
    let mut counts = Created::default();

    for (position, task) in tasks.iter().enumerate() {
        if let Some(existing) = bridge.epic_id(task.id) {
            tracing::debug!(task = task.id, epic = existing, "epic already mapped, skipping");
            counts.skipped += 1;
        } else {
            let description = format_epic_description(task);
            let priority = task.priority.beads_priority();
            let created = client.create_epic(&task.title, &description, priority)?;
            tracing::debug!(task = task.id, tier = task.tier, epic = %created.id, "epic created");
            bridge.add_epic(task.id, created.id);
            counts.created += 1;
        }
        progress.advanced(Phase::Epics, position + 1, total);
    }

    Ok(counts)
}

/// Phase 2: one child issue per subtask, under its task's epic, subtasks in
/// ascending id order.
pub fn create_children(
    tasks: &[TieredTask],
    client: &mut dyn IssueTrackerClient,
    bridge: &mut IdBridge,
    progress: &mut dyn ProgressReporter,
) -> Result<Created> {
    let total: usize = tasks.iter().map(|task| task.subtasks.len()).sum();
    let mut done = 0;
    let mut counts = Created::default();

    for task in tasks {
        let epic_id = bridge
            .epic_id(task.id)
            .ok_or(SyncError::EpicNotFound(task.id))?
            .to_string();

        for subtask in task.subtasks_by_id() {
            if bridge.subtask_id(task.id, subtask.id).is_some() {
                counts.skipped += 1;
            } else {
                let description = format_child_description(subtask);
                let created = client.create_child(&epic_id, &subtask.title, &description)?;
                tracing::debug!(
                    task = task.id,
                    subtask = subtask.id,
                    child = %created.id,
                    "child created"
                );
                bridge.add_subtask(task.id, subtask.id, created.id)?;
                counts.created += 1;
            }
            done += 1;
            progress.advanced(Phase::Children, done, total);
        }
    }

    Ok(counts)
}

/// Phase 3: blocking edges between epics, then between subtasks of the same
/// task.
pub fn wire_dependencies(
    tasks: &[TieredTask],
    client: &mut dyn IssueTrackerClient,
    bridge: &IdBridge,
) -> Result<Wired> {
    Ok(Wired {
        epic_edges: wire_epic_dependencies(tasks, client, bridge)?,
        subtask_edges: wire_subtask_dependencies(tasks, client, bridge)?,
    })
}

pub fn wire_epic_dependencies(
    tasks: &[TieredTask],
    client: &mut dyn IssueTrackerClient,
    bridge: &IdBridge,
) -> Result<usize> {
    let mut wired = 0;

    for task in tasks.iter().filter(|task| !task.dependencies.is_empty()) {
        let blocked = bridge
            .epic_id(task.id)
            .ok_or(SyncError::EpicNotFound(task.id))?;

        for &dep in &task.dependencies {
            let blocking = bridge.epic_id(dep).ok_or(SyncError::EpicNotFound(dep))?;
            client.add_dependency(blocked, blocking)?;
            wired += 1;
        }
    }

    Ok(wired)
}

pub fn wire_subtask_dependencies(
    tasks: &[TieredTask],
    client: &mut dyn IssueTrackerClient,
    bridge: &IdBridge,
) -> Result<usize> {
    let mut wired = 0;

    for task in tasks {
        for subtask in task
            .subtasks
            .iter()
            .filter(|subtask| !subtask.dependencies.is_empty())
        {
            let blocked = bridge.subtask_id(task.id, subtask.id).ok_or(
                SyncError::ChildNotFound {
                    task: task.id,
                    subtask: subtask.id,
                },
            )?;

            for &dep in &subtask.dependencies {
                let blocking =
                    bridge
                        .subtask_id(task.id, dep)
                        .ok_or(SyncError::ChildNotFound {
                            task: task.id,
                            subtask: dep,
                        })?;
                client.add_dependency(blocked, blocking)?;
                wired += 1;
            }
        }
    }

    Ok(wired)
}

fn apply_status(
    client: &mut dyn IssueTrackerClient,
    id: &str,
    action: StatusAction,
    synced: &mut Synced,
) -> Result<()> {
    if action.close {
        client.close(id)?;
        synced.closed += 1;
    } else if let Some(status) = action.status {
        client.update_status(id, status)?;
        synced.updated += 1;
    }
    Ok(())
}

/// Phase 4: close or update every epic and child to match task-master.
pub fn sync_statuses(
    tasks: &[TieredTask],
    client: &mut dyn IssueTrackerClient,
    bridge: &IdBridge,
) -> Result<Synced> {
    let mut synced = Synced::default();

    for task in tasks {
        let epic_id = bridge
            .epic_id(task.id)
            .ok_or(SyncError::EpicNotFound(task.id))?;
        apply_status(
            client,
            epic_id,
            StatusAction::for_status(task.status),
            &mut synced,
        )?;

        for subtask in &task.subtasks {
            let child_id =
                bridge
                    .subtask_id(task.id, subtask.id)
                    .ok_or(SyncError::ChildNotFound {
                        task: task.id,
                        subtask: subtask.id,
                    })?;
            apply_status(
                client,
                child_id,
                StatusAction::for_status(subtask.status),
                &mut synced,
            )?;
        }
    }

    Ok(synced)
}
