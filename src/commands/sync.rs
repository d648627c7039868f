use colored::Colorize;
use serde::Serialize;

use crate::config::SyncOptions;
use crate::error::{Result, SyncError};
use crate::model::TieredTask;
use crate::output::{self, ConsoleProgress, Format};
use crate::pipeline::{self, ProgressReporter, SyncSummary};
use crate::sort::{sort, tier_count};
use crate::source::{TaskFile, TaskSource};
use crate::status::StatusAction;
use crate::store::lock::MappingLock;
use crate::store::mapping::IdBridge;
use crate::tracker::{BeadsCli, IssueTrackerClient};

#[derive(Debug, Serialize)]
pub struct DryRunSubtaskPreview {
    pub id: u64,
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<u64>,
    pub status: StatusAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapped: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DryRunTaskPreview {
    pub order: usize,
    pub tier: usize,
    pub id: u64,
    pub title: String,
    pub priority: u8,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<u64>,
    pub status: StatusAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapped: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<DryRunSubtaskPreview>,
}

#[derive(Debug, Serialize)]
pub struct DryRunReport {
    pub dry_run: bool,
    pub source: String,
    pub resumed: bool,
    pub task_count: usize,
    pub subtask_count: usize,
    pub tier_count: usize,
    pub tasks: Vec<DryRunTaskPreview>,
}

#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    pub source: String,
    pub map_file: String,
    pub resumed: bool,
    pub task_count: usize,
    pub tier_count: usize,
    pub summary: SyncSummary,
    pub mapped_tasks: usize,
    pub mapped_subtasks: usize,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SyncOutcome {
    DryRun(DryRunReport),
    Synced(SyncReport),
}

pub fn run(options: &SyncOptions, format: Format) -> Result<()> {
    let source = TaskFile::new(&options.tasks).with_tag(options.tag.as_str());
    let mut progress = ConsoleProgress::new(format);

    let outcome = execute(
        options,
        &source,
        || BeadsCli::new(&options.project).with_program(options.bd_program.clone()),
        &mut progress,
    )?;

    match &outcome {
        SyncOutcome::DryRun(report) => print_dry_run_report(report, format)?,
        SyncOutcome::Synced(report) => print_sync_report(report, format)?,
    }
    Ok(())
}

/// Gate, load, sort, and either preview or sync.
///
/// `connect` is only called for a real run, so a dry run never talks to the
/// tracker.
pub fn execute<C, F>(
    options: &SyncOptions,
    source: &dyn TaskSource,
    connect: F,
    progress: &mut dyn ProgressReporter,
) -> Result<SyncOutcome>
where
    C: IssueTrackerClient,
    F: FnOnce() -> C,
{
    let beads_dir = options.beads_dir();
    if !beads_dir.is_dir() {
        return Err(SyncError::BeadsNotInitialized(beads_dir));
    }

    let _lock = if options.dry_run {
        None
    } else {
        Some(MappingLock::acquire(options.map_file())?)
    };

    let map_exists = IdBridge::exists(options.map_file());
    if map_exists && !options.force && !options.resume {
        return Err(SyncError::MappingExists(options.map_file().to_path_buf()));
    }
    let resumed = options.resume && map_exists;
    let mut bridge = if resumed {
        let bridge = IdBridge::load(options.map_file())?;
        tracing::info!(
            path = %options.map_file().display(),
            tasks = bridge.len(),
            "resuming from existing mapping"
        );
        bridge
    } else {
        IdBridge::new()
    };

    let tasks = source.load()?;
    let sorted = sort(tasks)?;
    tracing::info!(
        tasks = sorted.len(),
        tiers = tier_count(&sorted),
        "tasks sorted"
    );

    if options.dry_run {
        return Ok(SyncOutcome::DryRun(build_dry_run_report(
            source, &sorted, &bridge, resumed,
        )));
    }

    let mut client = connect();
    let summary = match pipeline::run(&sorted, &mut client, &mut bridge, progress) {
        Ok(summary) => summary,
        Err(err) => {
            save_partial_mapping(options, &bridge);
            return Err(err);
        }
    };

    bridge.save(options.map_file())?;

    Ok(SyncOutcome::Synced(SyncReport {
        dry_run: false,
        source: source.describe(),
        map_file: options.map_file().display().to_string(),
        resumed,
        task_count: sorted.len(),
        tier_count: tier_count(&sorted),
        summary,
        mapped_tasks: bridge.len(),
        mapped_subtasks: bridge.subtask_count(),
    }))
}

/// Keep whatever was created before a failure so `--resume` can pick it up.
fn save_partial_mapping(options: &SyncOptions, bridge: &IdBridge) {
    if bridge.is_empty() {
        return;
    }
    match bridge.save(options.map_file()) {
        Ok(()) => tracing::warn!(
            path = %options.map_file().display(),
            tasks = bridge.len(),
            "sync failed; partial mapping saved, rerun with --resume"
        ),
        Err(err) => tracing::error!(
            path = %options.map_file().display(),
            %err,
            "sync failed and the partial mapping could not be saved"
        ),
    }
}

fn build_dry_run_report(
    source: &dyn TaskSource,
    sorted: &[TieredTask],
    bridge: &IdBridge,
    resumed: bool,
) -> DryRunReport {
    let tasks = sorted
        .iter()
        .enumerate()
        .map(|(position, task)| DryRunTaskPreview {
            order: position + 1,
            tier: task.tier,
            id: task.id,
            title: task.title.clone(),
            priority: task.priority.beads_priority(),
            depends_on: task.dependencies.clone(),
            status: StatusAction::for_status(task.status),
            mapped: bridge.epic_id(task.id).map(str::to_string),
            subtasks: task
                .subtasks_by_id()
                .into_iter()
                .map(|subtask| DryRunSubtaskPreview {
                    id: subtask.id,
                    title: subtask.title.clone(),
                    depends_on: subtask.dependencies.clone(),
                    status: StatusAction::for_status(subtask.status),
                    mapped: bridge.subtask_id(task.id, subtask.id).map(str::to_string),
                })
                .collect(),
        })
        .collect::<Vec<_>>();

    DryRunReport {
        dry_run: true,
        source: source.describe(),
        resumed,
        task_count: tasks.len(),
        subtask_count: tasks.iter().map(|task| task.subtasks.len()).sum(),
        tier_count: tier_count(sorted),
        tasks,
    }
}

fn print_dry_run_report(report: &DryRunReport, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(report)?),
        Format::Pretty => {
            println!(
                "{}",
                format!(
                    "Dry run: {} tasks, {} subtasks in {} tiers from {} (no changes made)",
                    report.task_count, report.subtask_count, report.tier_count, report.source
                )
                .yellow()
                .bold()
            );
            for task in &report.tasks {
                let epic_ref = format!("<task-{}-epic>", task.id);
                match &task.mapped {
                    Some(id) => println!(
                        "  {}",
                        format!("# task {} already mapped to {id}", task.id).dimmed()
                    ),
                    None => println!(
                        "  bd create --title={} -t epic -p {}",
                        output::shell_quote(&task.title),
                        task.priority
                    ),
                }
                for subtask in &task.subtasks {
                    match &subtask.mapped {
                        Some(id) => println!(
                            "    {}",
                            format!("# subtask {}.{} already mapped to {id}", task.id, subtask.id)
                                .dimmed()
                        ),
                        None => println!(
                            "    bd create --title={} --parent {epic_ref}",
                            output::shell_quote(&subtask.title)
                        ),
                    }
                }
                for dep in &task.depends_on {
                    println!("  bd dep add {epic_ref} <task-{dep}-epic>");
                }
                for subtask in &task.subtasks {
                    for dep in &subtask.depends_on {
                        println!(
                            "    bd dep add <task-{}.{}> <task-{}.{dep}>",
                            task.id, subtask.id, task.id
                        );
                    }
                }
                print_status_preview(&epic_ref, task.status, "  ");
                for subtask in &task.subtasks {
                    let child_ref = format!("<task-{}.{}>", task.id, subtask.id);
                    print_status_preview(&child_ref, subtask.status, "    ");
                }
            }
        }
        Format::Minimal => {
            println!(
                "dry-run tasks={} subtasks={} tiers={} {}",
                report.task_count, report.subtask_count, report.tier_count, report.source
            );
            for task in &report.tasks {
                println!(
                    "{:>3}. t{} #{:<4} {:16} p{} subtasks={}",
                    task.order,
                    task.tier,
                    task.id,
                    output::truncate_title(&task.title, 16),
                    task.priority,
                    task.subtasks.len()
                );
            }
        }
    }

    Ok(())
}

fn print_status_preview(reference: &str, action: StatusAction, indent: &str) {
    if action.close {
        println!("{indent}bd close {reference}");
    } else if let Some(status) = action.status {
        println!("{indent}bd update {reference} --status={status}");
    }
}

fn print_sync_report(report: &SyncReport, format: Format) -> Result<()> {
    let summary = &report.summary;
    match format {
        Format::Json => println!("{}", serde_json::to_string(report)?),
        Format::Pretty => {
            println!("{}", "Sync complete!".green().bold());
            println!(
                "  {} {} created, {} already mapped",
                "epics:".dimmed(),
                summary.epics_created,
                summary.epics_skipped
            );
            println!(
                "  {} {} created, {} already mapped",
                "children:".dimmed(),
                summary.children_created,
                summary.children_skipped
            );
            println!(
                "  {} {} epic, {} subtask",
                "dependencies:".dimmed(),
                summary.epic_dependencies,
                summary.subtask_dependencies
            );
            println!(
                "  {} {} closed, {} updated",
                "statuses:".dimmed(),
                summary.closed,
                summary.status_updates
            );
            println!("  {} {}", "mapping:".dimmed(), report.map_file);
        }
        Format::Minimal => {
            println!(
                "synced tasks={} epics={} children={} deps={} closed={} updated={} map={}",
                report.task_count,
                summary.epics_created,
                summary.children_created,
                summary.epic_dependencies + summary.subtask_dependencies,
                summary.closed,
                summary.status_updates,
                report.map_file
            );
        }
    }

    Ok(())
}
