use clap::ValueEnum;
use colored::Colorize;

use crate::pipeline::{Phase, ProgressReporter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

pub fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() > max_len {
        let truncated: String = title.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    } else {
        title.to_string()
    }
}

/// Quote a value for display in a previewed shell command.
pub fn shell_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Progress lines on stderr, only in pretty mode so stdout stays parseable.
pub struct ConsoleProgress {
    enabled: bool,
}

impl ConsoleProgress {
    pub fn new(format: Format) -> Self {
        Self {
            enabled: format == Format::Pretty,
        }
    }
}

fn phase_heading(phase: Phase) -> &'static str {
    match phase {
        Phase::Epics => "Creating epics...",
        Phase::Children => "Creating child issues...",
        Phase::Dependencies => "Wiring dependencies...",
        Phase::Statuses => "Syncing statuses...",
    }
}

impl ProgressReporter for ConsoleProgress {
    fn phase_started(&mut self, phase: Phase) {
        if self.enabled {
            eprintln!("{}", phase_heading(phase).blue());
        }
    }

    fn advanced(&mut self, phase: Phase, done: usize, total: usize) {
        if self.enabled {
            eprintln!("{}", format!("  {done}/{total} {phase} processed").dimmed());
        }
    }

    fn phase_finished(&mut self, phase: Phase) {
        if self.enabled {
            eprintln!("{}", format!("  {phase} done").green());
        }
    }
}
