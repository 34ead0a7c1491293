//! Console output and run summaries

use colored::*;
use serde::Serialize;

use crate::classifier::Change;
use crate::report::ChangeEvent;

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Quiet,   // Only errors
    Normal,  // Per-cycle summaries
    Verbose, // Every new/changed file
}

impl OutputMode {
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            OutputMode::Quiet
        } else if verbose > 0 {
            OutputMode::Verbose
        } else {
            OutputMode::Normal
        }
    }
}

/// Counters for one orchestrator cycle.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CycleStats {
    pub scanned: usize,
    pub new: usize,
    pub changed: usize,
    pub skipped: usize,
}

impl CycleStats {
    /// The cycle-level aggregate flag: did anything change anywhere.
    pub fn any_change(&self) -> bool {
        self.new > 0 || self.changed > 0
    }

    pub fn count(&mut self, change: Change) {
        self.scanned += 1;
        match change {
            Change::New => self.new += 1,
            Change::Changed => self.changed += 1,
            Change::Unchanged => {}
        }
    }
}

/// Final result of a run, for the console or `--json` output.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunSummary {
    pub cycles: u64,
    pub changed_cycles: u64,
    pub events: usize,
}

pub fn print_event(event: &ChangeEvent, change: Change, mode: OutputMode) {
    if mode != OutputMode::Verbose {
        return;
    }
    let label = match change {
        Change::New => "new".green(),
        Change::Changed => "changed".yellow(),
        Change::Unchanged => return,
    };
    println!("  {} {}", label, event.full_path);
}

pub fn print_cycle(cycle: u64, stats: &CycleStats, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }
    let skipped = if stats.skipped > 0 {
        format!(" ({} skipped)", stats.skipped)
    } else {
        String::new()
    };
    if stats.any_change() {
        println!(
            "cycle {}: {} files, {} {} new, {} changed{}",
            cycle,
            stats.scanned,
            "changes:".yellow(),
            stats.new,
            stats.changed,
            skipped
        );
    } else {
        println!("cycle {}: {} files, no changes{}", cycle, stats.scanned, skipped);
    }
}

pub fn print_summary(summary: &RunSummary, json: bool, mode: OutputMode) {
    if json {
        match serde_json::to_string_pretty(summary) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("{} Failed to render JSON summary: {}", "Error:".red(), e),
        }
        return;
    }
    if mode == OutputMode::Quiet {
        return;
    }
    println!(
        "{} {} cycle(s), {} with changes, {} event(s) reported",
        "Done:".green(),
        summary.cycles,
        summary.changed_cycles,
        summary.events
    );
}

pub fn warn(message: &str, mode: OutputMode) {
    if mode != OutputMode::Quiet {
        eprintln!("{} {}", "Warning:".yellow(), message);
    }
}
