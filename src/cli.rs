use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::output::{self, OutputMode};
use crate::runner::{self, RunOptions};
use crate::store::ChangeStore;

#[derive(Parser)]
#[command(name = "filetrack")]
#[command(version)]
#[command(about = "Detect new and changed files across configured folders")]
#[command(long_about = "Filetrack periodically scans a configured set of folders, \
    fingerprints each file on name and modification time, and records changes in a \
    SQLite state database so later runs only report what is new or modified.\n\n\
    Examples:\n  \
    filetrack run                        # Scan once and write the change report\n  \
    filetrack run --watch --interval 10  # Rescan every 10s until Ctrl+C\n  \
    filetrack records files              # Show tracked state\n  \
    filetrack reset files                # Forget all tracked state")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the configured folders and record changes
    #[command(visible_alias = "r")]
    Run {
        /// Folder list file (one `path` or `path|ext1,ext2` per line)
        #[arg(long, default_value = "folders.conf", value_name = "PATH")]
        config: PathBuf,

        /// SQLite state database file
        #[arg(long, default_value = "filetrack.db", value_name = "PATH")]
        db: PathBuf,

        /// State table to track against
        #[arg(long, default_value = "files", value_name = "NAME")]
        table: String,

        /// Change report output file (CSV)
        #[arg(long, default_value = "changes.csv", value_name = "PATH")]
        report: PathBuf,

        /// Keep rescanning until interrupted with Ctrl+C
        #[arg(short = 'w', long)]
        watch: bool,

        /// Seconds to wait between cycles in watch mode
        #[arg(long, default_value = "5", value_name = "SECS")]
        interval: u64,

        /// Output the run summary as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List state tables in the database
    Tables {
        /// SQLite state database file
        #[arg(long, default_value = "filetrack.db", value_name = "PATH")]
        db: PathBuf,
    },

    /// List tracked records in a state table
    Records {
        /// Table to read
        table: String,

        /// SQLite state database file
        #[arg(long, default_value = "filetrack.db", value_name = "PATH")]
        db: PathBuf,

        /// Output records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Drop a state table, forgetting all tracked files in it
    Reset {
        /// Table to drop
        table: String,

        /// SQLite state database file
        #[arg(long, default_value = "filetrack.db", value_name = "PATH")]
        db: PathBuf,
    },
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let mode = OutputMode::from_flags(self.quiet, self.verbose);

        match self.command {
            Commands::Run {
                config,
                db,
                table,
                report,
                watch,
                interval,
                json,
            } => {
                let cancel = Arc::new(AtomicBool::new(false));
                if watch {
                    let flag = cancel.clone();
                    ctrlc::set_handler(move || {
                        flag.store(true, Ordering::SeqCst);
                    })
                    .context("Failed to set Ctrl+C handler")?;
                }

                let opts = RunOptions {
                    config,
                    db,
                    table,
                    report,
                    watch,
                    interval: Duration::from_secs(interval),
                    mode,
                };
                let summary = runner::run(&opts, cancel)?;
                output::print_summary(&summary, json, mode);
                Ok(())
            }

            Commands::Tables { db } => {
                let store = ChangeStore::open(&db)?;
                for name in store.list_tables()? {
                    println!("{}", name);
                }
                store.close()?;
                Ok(())
            }

            Commands::Records { table, db, json } => {
                let store = ChangeStore::open(&db)?;
                let records = store.list_records(&table)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&records)?);
                } else {
                    for record in &records {
                        println!("{}  {}", record.fingerprint, record.path);
                    }
                }
                store.close()?;
                Ok(())
            }

            Commands::Reset { table, db } => {
                let store = ChangeStore::open(&db)?;
                store.delete_table(&table)?;
                store.close()?;
                if mode != OutputMode::Quiet {
                    println!("Dropped table {}", table);
                }
                Ok(())
            }
        }
    }
}
