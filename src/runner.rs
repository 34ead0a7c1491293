//! Folder-set orchestration and the run loop

use anyhow::Result;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::classifier;
use crate::config::{self, FolderEntry};
use crate::output::{self, CycleStats, OutputMode, RunSummary};
use crate::report::{ChangeEvent, ReportSink};
use crate::scanner;
use crate::store::ChangeStore;

/// Everything a run needs; owned by the caller, read-only here.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: PathBuf,
    pub db: PathBuf,
    pub table: String,
    pub report: PathBuf,
    pub watch: bool,
    pub interval: Duration,
    pub mode: OutputMode,
}

/// Execute a run: single-shot, or repeated cycles until `cancel` is set.
///
/// The store connection and the report sink are owned by this function
/// and released on every exit path. Cancellation is checked at cycle
/// boundaries only; a cycle in progress always completes.
pub fn run(opts: &RunOptions, cancel: Arc<AtomicBool>) -> Result<RunSummary> {
    let folders = config::load(&opts.config)?;
    if folders.is_empty() {
        output::warn(
            &format!(
                "no folders configured ({} missing or empty)",
                opts.config.display()
            ),
            opts.mode,
        );
    }

    // A connect fault aborts here, before any scanning.
    let store = ChangeStore::open(&opts.db)?;
    store.ensure_table(&opts.table)?;
    let mut sink = ReportSink::new(&opts.report);

    let mut summary = RunSummary::default();
    loop {
        if opts.watch && cancel.load(Ordering::SeqCst) {
            break;
        }

        let stats = run_cycle(&store, &folders, &opts.table, &mut sink, opts.mode);
        summary.cycles += 1;
        if stats.any_change() {
            summary.changed_cycles += 1;
        }
        output::print_cycle(summary.cycles, &stats, opts.mode);

        if !opts.watch {
            break;
        }
        sleep_unless_cancelled(opts.interval, &cancel);
    }
    summary.events = sink.len();

    // Cleanup happens on cancellation as well as normal termination.
    let sink_result = sink.close();
    let store_result = store.close();
    sink_result?;
    store_result?;

    Ok(summary)
}

/// One pass over every configured folder.
///
/// Every folder is processed even when an earlier one already produced
/// changes; the aggregate flag is the OR across all of them. A store
/// query fault skips the affected file and the cycle continues.
fn run_cycle(
    store: &ChangeStore,
    folders: &[FolderEntry],
    table: &str,
    sink: &mut ReportSink,
    mode: OutputMode,
) -> CycleStats {
    let mut stats = CycleStats::default();

    for folder in folders {
        for file in scanner::scan(&folder.root, &folder.excluded) {
            match classifier::classify(store, table, &file) {
                Ok(change) => {
                    stats.count(change);
                    if change.is_change() {
                        let event = ChangeEvent::now(&file);
                        output::print_event(&event, change, mode);
                        sink.record(event);
                    }
                }
                Err(e) => {
                    stats.skipped += 1;
                    output::warn(
                        &format!("skipping {}: {}", file.path.display(), e),
                        mode,
                    );
                }
            }
        }
    }

    stats
}

/// Sleep the poll interval in short slices so a cancellation request
/// does not wait out the full interval.
fn sleep_unless_cancelled(interval: Duration, cancel: &AtomicBool) {
    const SLICE: Duration = Duration::from_millis(50);
    let mut remaining = interval;
    while !remaining.is_zero() && !cancel.load(Ordering::SeqCst) {
        let step = remaining.min(SLICE);
        std::thread::sleep(step);
        remaining -= step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{normalize_path, DEFAULT_TABLE};
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        data: PathBuf,
        opts: RunOptions,
    }

    fn fixture(config_lines: &str) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let data = temp_dir.path().join("data");
        fs::create_dir_all(&data).unwrap();

        let config = temp_dir.path().join("folders.conf");
        fs::write(&config, config_lines.replace("{data}", &data.display().to_string())).unwrap();

        let opts = RunOptions {
            config,
            db: temp_dir.path().join("state.db"),
            table: DEFAULT_TABLE.to_string(),
            report: temp_dir.path().join("changes.csv"),
            watch: false,
            interval: Duration::from_millis(1),
            mode: OutputMode::Quiet,
        };
        Fixture {
            _temp_dir: temp_dir,
            data,
            opts,
        }
    }

    fn no_cancel() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn test_scenario_new_changed_unchanged() {
        let fx = fixture("{data}|.tmp\n");
        let file = fx.data.join("a.txt");
        fs::write(&file, "v1").unwrap();

        // First run: NEW
        let s1 = run(&fx.opts, no_cancel()).unwrap();
        assert_eq!(s1.cycles, 1);
        assert_eq!(s1.changed_cycles, 1);
        assert_eq!(s1.events, 1);

        // Second run, nothing touched: UNCHANGED
        let s2 = run(&fx.opts, no_cancel()).unwrap();
        assert_eq!(s2.changed_cycles, 0);
        assert_eq!(s2.events, 0);

        // Touch the file: CHANGED
        std::thread::sleep(Duration::from_millis(10));
        fs::write(&file, "v2").unwrap();
        let s3 = run(&fx.opts, no_cancel()).unwrap();
        assert_eq!(s3.changed_cycles, 1);
        assert_eq!(s3.events, 1);

        // Store holds exactly the one tracked path
        let store = ChangeStore::open(&fx.opts.db).unwrap();
        let records = store.list_records(DEFAULT_TABLE).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, normalize_path(&file));
    }

    #[test]
    fn test_excluded_extension_never_tracked_or_reported() {
        let fx = fixture("{data}|.tmp\n");
        fs::write(fx.data.join("scratch.tmp"), "x").unwrap();

        let summary = run(&fx.opts, no_cancel()).unwrap();
        assert_eq!(summary.changed_cycles, 0);
        assert_eq!(summary.events, 0);
        assert!(!fx.opts.report.exists());

        let store = ChangeStore::open(&fx.opts.db).unwrap();
        assert!(store.list_records(DEFAULT_TABLE).unwrap().is_empty());
    }

    #[test]
    fn test_aggregate_flag_is_or_across_folders() {
        let temp_dir = TempDir::new().unwrap();
        let folder_a = temp_dir.path().join("a");
        let folder_b = temp_dir.path().join("b");
        fs::create_dir_all(&folder_a).unwrap();
        fs::create_dir_all(&folder_b).unwrap();
        fs::write(folder_a.join("stable.txt"), "x").unwrap();
        fs::write(folder_b.join("moving.txt"), "v1").unwrap();

        let config = temp_dir.path().join("folders.conf");
        fs::write(
            &config,
            format!("{}\n{}\n", folder_a.display(), folder_b.display()),
        )
        .unwrap();

        let opts = RunOptions {
            config,
            db: temp_dir.path().join("state.db"),
            table: DEFAULT_TABLE.to_string(),
            report: temp_dir.path().join("changes.csv"),
            watch: false,
            interval: Duration::from_millis(1),
            mode: OutputMode::Quiet,
        };

        // Prime both folders
        run(&opts, no_cancel()).unwrap();

        // Change only the file in the later folder; folder A stays quiet
        std::thread::sleep(Duration::from_millis(10));
        fs::write(folder_b.join("moving.txt"), "v2").unwrap();
        let summary = run(&opts, no_cancel()).unwrap();
        assert_eq!(summary.changed_cycles, 1);
        assert_eq!(summary.events, 1);
    }

    #[test]
    fn test_missing_config_is_noop_success() {
        let temp_dir = TempDir::new().unwrap();
        let opts = RunOptions {
            config: temp_dir.path().join("absent.conf"),
            db: temp_dir.path().join("state.db"),
            table: DEFAULT_TABLE.to_string(),
            report: temp_dir.path().join("changes.csv"),
            watch: false,
            interval: Duration::from_millis(1),
            mode: OutputMode::Quiet,
        };

        let summary = run(&opts, no_cancel()).unwrap();
        assert_eq!(summary.cycles, 1);
        assert_eq!(summary.events, 0);
    }

    #[test]
    fn test_watch_mode_stops_on_cancel() {
        let fx = fixture("{data}\n");
        fs::write(fx.data.join("a.txt"), "x").unwrap();

        let mut opts = fx.opts.clone();
        opts.watch = true;
        opts.interval = Duration::from_millis(1);

        let cancel = Arc::new(AtomicBool::new(false));
        let trigger = cancel.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            trigger.store(true, Ordering::SeqCst);
        });

        let summary = run(&opts, cancel).unwrap();
        handle.join().unwrap();

        // At least the first cycle ran, and it saw the new file
        assert!(summary.cycles >= 1);
        assert_eq!(summary.changed_cycles, 1);

        // Store was released; reopening works
        let store = ChangeStore::open(&fx.opts.db).unwrap();
        assert_eq!(store.list_records(DEFAULT_TABLE).unwrap().len(), 1);
    }

    #[test]
    fn test_watch_mode_cancelled_before_start_runs_no_cycle() {
        let fx = fixture("{data}\n");
        let mut opts = fx.opts.clone();
        opts.watch = true;

        let summary = run(&opts, Arc::new(AtomicBool::new(true))).unwrap();
        assert_eq!(summary.cycles, 0);
        assert_eq!(summary.changed_cycles, 0);
    }

    #[test]
    fn test_report_written_with_events() {
        let fx = fixture("{data}\n");
        fs::write(fx.data.join("a.txt"), "x").unwrap();

        run(&fx.opts, no_cancel()).unwrap();
        let contents = fs::read_to_string(&fx.opts.report).unwrap();
        assert!(contents.contains("a.txt"));
    }
}
