//! Dependency tiering.
//!
//! Every task gets `tier = 1 + max(tier(dep))`, or 0 without dependencies, and
//! the result is ordered by `(tier, id)`. Processing tasks in that order means
//! every prerequisite has been handled before anything that depends on it.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, SyncError};
use crate::model::{Task, TieredTask};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done(usize),
}

/// Tier the tasks and return them in `(tier, id)` order.
///
/// The depth-first walk uses an explicit stack so long dependency chains
/// cannot exhaust the call stack.
pub fn sort(tasks: Vec<Task>) -> Result<Vec<TieredTask>> {
    let mut index: HashMap<u64, usize> = HashMap::with_capacity(tasks.len());
    for (position, task) in tasks.iter().enumerate() {
        if index.insert(task.id, position).is_some() {
            return Err(SyncError::DuplicateTask(task.id));
        }
        let mut subtask_ids = HashSet::with_capacity(task.subtasks.len());
        if let Some(subtask) = task.subtasks.iter().find(|s| !subtask_ids.insert(s.id)) {
            return Err(SyncError::DuplicateSubtask {
                task: task.id,
                subtask: subtask.id,
            });
        }
    }

    let mut marks: HashMap<u64, Mark> = HashMap::with_capacity(tasks.len());

    for root in &tasks {
        if marks.contains_key(&root.id) {
            continue;
        }

        // (task position, next dependency to inspect)
        let mut stack: Vec<(usize, usize)> = vec![(index[&root.id], 0)];
        marks.insert(root.id, Mark::Visiting);

        while let Some(frame) = stack.last_mut() {
            let task = &tasks[frame.0];

            if let Some(&dep_id) = task.dependencies.get(frame.1) {
                frame.1 += 1;

                if dep_id == task.id {
                    return Err(SyncError::CycleDetected(task.id));
                }
                let Some(&dep_position) = index.get(&dep_id) else {
                    return Err(SyncError::MissingDependency {
                        task: task.id,
                        dependency: dep_id,
                    });
                };

                match marks.get(&dep_id) {
                    Some(Mark::Visiting) => return Err(SyncError::CycleDetected(dep_id)),
                    Some(Mark::Done(_)) => {}
                    None => {
                        marks.insert(dep_id, Mark::Visiting);
                        stack.push((dep_position, 0));
                    }
                }
                continue;
            }

            let tier = task
                .dependencies
                .iter()
                .filter_map(|dep| match marks.get(dep) {
                    Some(Mark::Done(tier)) => Some(tier + 1),
                    _ => None,
                })
                .max()
                .unwrap_or(0);
            marks.insert(task.id, Mark::Done(tier));
            stack.pop();
        }
    }

    let mut tiered: Vec<TieredTask> = tasks
        .into_iter()
        .map(|task| {
            let tier = match marks.get(&task.id) {
                Some(Mark::Done(tier)) => *tier,
                _ => 0,
            };
            TieredTask { tier, task }
        })
        .collect();
    tiered.sort_by_key(|tiered| (tiered.tier, tiered.task.id));
    Ok(tiered)
}

/// Number of distinct tiers in a sorted sequence.
pub fn tier_count(sorted: &[TieredTask]) -> usize {
    sorted.last().map_or(0, |last| last.tier + 1)
}
