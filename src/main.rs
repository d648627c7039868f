use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tm2bd::build_info;
use tm2bd::config::{
    DEFAULT_MAP_FILE, DEFAULT_PROJECT_DIR, DEFAULT_TASKS_PATH, LOG_ENV, SyncOptions,
};
use tm2bd::output::Format;
use tm2bd::source::DEFAULT_TAG;

#[derive(Parser)]
#[command(
    name = "tm2bd",
    version = build_info::VERSION,
    about = "Sync task-master tasks into the Beads issue tracker"
)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    format: Format,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create Beads epics and child issues for every task-master task
    Sync {
        /// Path to the task-master tasks.json
        #[arg(short, long, default_value = DEFAULT_TASKS_PATH)]
        tasks: PathBuf,
        /// Beads project directory (must contain .beads/)
        #[arg(short, long, default_value = DEFAULT_PROJECT_DIR)]
        project: PathBuf,
        /// Show what would be created without calling bd
        #[arg(short, long)]
        dry_run: bool,
        /// Start over even if a mapping file already exists
        #[arg(short, long)]
        force: bool,
        /// Continue from an existing mapping file, skipping mapped issues
        #[arg(short, long)]
        resume: bool,
        /// Where the task-master to Beads id mapping is written
        #[arg(short, long, default_value = DEFAULT_MAP_FILE)]
        map_file: PathBuf,
        /// task-master tag to read tasks from
        #[arg(long, default_value = DEFAULT_TAG)]
        tag: String,
        /// Log every bd invocation
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Json output keeps stderr for the error object alone unless logs are asked for.
fn default_log_level(verbose: bool, format: Format) -> &'static str {
    match (verbose, format) {
        (true, _) => "debug",
        (false, Format::Json) => "off",
        (false, _) => "warn",
    }
}

fn init_tracing(verbose: bool, format: Format) {
    let level = default_log_level(verbose, format);
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli, format: Format) -> tm2bd::error::Result<()> {
    match cli.command {
        Commands::Sync {
            tasks,
            project,
            dry_run,
            force,
            resume,
            map_file,
            tag,
            verbose,
        } => {
            init_tracing(verbose, format);
            let options = SyncOptions {
                tasks,
                project,
                map_file,
                tag,
                dry_run,
                force,
                resume,
                verbose,
                ..SyncOptions::default()
            }
            .with_env();
            tm2bd::commands::sync::run(&options, format)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let format = cli.format;
    if let Err(e) = run(cli, format) {
        match format {
            Format::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "error": e.code(),
                        "message": e.to_string()
                    })
                );
            }
            _ => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_output_is_quiet_unless_verbose() {
        assert_eq!(default_log_level(false, Format::Json), "off");
        assert_eq!(default_log_level(true, Format::Json), "debug");
        assert_eq!(default_log_level(false, Format::Pretty), "warn");
        assert_eq!(default_log_level(false, Format::Minimal), "warn");
    }

    #[test]
    fn sync_flags_parse() {
        let cli = Cli::try_parse_from([
            "tm2bd", "--format", "json", "sync", "-d", "-r", "-m", "out.json", "--tag", "feature",
        ])
        .unwrap();
        assert_eq!(cli.format, Format::Json);
        let Commands::Sync {
            dry_run,
            resume,
            force,
            map_file,
            tag,
            ..
        } = cli.command;
        assert!(dry_run && resume && !force);
        assert_eq!(map_file, PathBuf::from("out.json"));
        assert_eq!(tag, "feature");
    }
}
