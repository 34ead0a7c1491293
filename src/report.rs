//! Change event collection and CSV report rendering

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::scanner::ScannedFile;

/// One newly observed or modified file, destined for the report.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    pub file_name: String,
    pub full_path: String,
    pub folder: String,
    pub date: String,
    pub time: String,
}

impl ChangeEvent {
    /// Capture an event for `file` with the local wall-clock stamp.
    pub fn now(file: &ScannedFile) -> Self {
        let stamp = Local::now();
        Self {
            file_name: file.name.clone(),
            full_path: file.path.display().to_string(),
            folder: file.folder.display().to_string(),
            date: stamp.format("%Y-%m-%d").to_string(),
            time: stamp.format("%H:%M:%S").to_string(),
        }
    }
}

/// Buffers change events in classification order and renders them to a
/// CSV file on close.
pub struct ReportSink {
    out_path: PathBuf,
    events: Vec<ChangeEvent>,
    closed: bool,
}

impl ReportSink {
    pub fn new(out_path: &Path) -> Self {
        Self {
            out_path: out_path.to_path_buf(),
            events: Vec::new(),
            closed: false,
        }
    }

    /// Append an event. Events keep first-observed order.
    pub fn record(&mut self, event: ChangeEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Render the report and mark the sink closed. Idempotent; writes
    /// nothing when no events were recorded.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if self.events.is_empty() {
            return Ok(());
        }

        let mut out = String::from("file_name,full_path,folder,date,time\n");
        for event in &self.events {
            out.push_str(&format!(
                "{},{},{},{},{}\n",
                csv_field(&event.file_name),
                csv_field(&event.full_path),
                csv_field(&event.folder),
                csv_field(&event.date),
                csv_field(&event.time),
            ));
        }

        fs::write(&self.out_path, out)
            .with_context(|| format!("Failed to write report: {}", self.out_path.display()))?;
        Ok(())
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
