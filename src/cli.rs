//! Command-line interface definitions.
//!
//! The site CLI takes a single positional task name. Tasks take no flags;
//! the global `--root` and `--config` options only locate the project.

use crate::utils::text::slugify;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

/// Feeling of Computing website CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, disable_help_subcommand = true)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to the root (optional file)
    #[arg(short = 'C', long, default_value = "foc.toml")]
    pub config: PathBuf,

    /// Task to run: start, build, watch, serve or help
    pub task: Option<String>,
}

/// Named tasks the CLI can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Start,
    Build,
    Watch,
    Serve,
    Help,
}

/// Task table in display order: (task, name, help line).
///
/// A trailing `\n` in the help line leaves a blank line after the entry.
pub const TASKS: &[(Task, &str, &str)] = &[
    (Task::Start, "start", "Build, watch, and serve\n"),
    (Task::Build, "build", "Compile everything"),
    (Task::Watch, "watch", "Recompile on changes"),
    (Task::Serve, "serve", "Spin up a live server\n"),
    (Task::Help, "help", "Print this help info"),
];

impl Task {
    /// Look up a task by name, ignoring case and stray punctuation.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = slugify(name);
        TASKS
            .iter()
            .find(|(_, task_name, _)| *task_name == name)
            .map(|(task, _, _)| *task)
    }
}

impl Cli {
    /// Resolve the requested task; no argument means `help`.
    ///
    /// Returns the unrecognised name as the error.
    pub fn task(&self) -> Result<Task, &str> {
        match self.task.as_deref() {
            None => Ok(Task::Help),
            Some(name) => Task::from_name(name).ok_or(name),
        }
    }
}

/// Render the help screen listing every task.
pub fn help_text() -> String {
    let longest = TASKS.iter().map(|(_, name, _)| name.len()).max().unwrap_or(0);

    let mut out = format!(
        "\n{}\n\n  Usage:\n\n",
        "  Feeling of Computing • Website CLI".green()
    );
    for (_, name, help) in TASKS {
        let usage = format!("    foc {name:<longest$}  ");
        out.push_str(&format!("{}{help}\n", usage.green()));
    }
    out
}
