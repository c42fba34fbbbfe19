//! Persistence for the report history.

use crate::error::Result;
use crate::report::PerformanceReport;
use parking_lot::Mutex;
use serde::Serialize;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// File name of the history inside the storage directory.
pub const HISTORY_FILE: &str = "omahub-performance-reports.json";

/// Durable list of past reports, oldest first.
pub trait ReportStore: Send + Sync {
    /// Stored reports; a missing history is an empty one.
    fn load(&self) -> Result<Vec<PerformanceReport>>;

    /// Replaces the stored history.
    fn save(&self, reports: &[PerformanceReport]) -> Result<()>;

    fn clear(&self) -> Result<()>;

    /// Appends `report`, dropping the oldest entries beyond `limit`.
    ///
    /// Unreadable history is logged and replaced rather than failing the append.
    fn append(&self, report: PerformanceReport, limit: usize) -> Result<()> {
        let reports = self.load().unwrap_or_else(|e| {
            log::warn!("Discarding unreadable report history: {}", e);
            Vec::new()
        });
        self.save(&push_capped(reports, report, limit))
    }
}

fn push_capped(
    mut reports: Vec<PerformanceReport>,
    report: PerformanceReport,
    limit: usize,
) -> Vec<PerformanceReport> {
    reports.push(report);
    if reports.len() > limit {
        let excess = reports.len() - limit;
        reports.drain(..excess);
    }
    reports
}

/// History kept as one JSON array in `<dir>/omahub-performance-reports.json`.
///
/// Clones share one append lock, so appends through any clone are serialized.
#[derive(Clone, Debug)]
pub struct FileReportStore {
    path: PathBuf,
    append_lock: Arc<Mutex<()>>,
}

impl FileReportStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(HISTORY_FILE),
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportStore for FileReportStore {
    fn load(&self) -> Result<Vec<PerformanceReport>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save(&self, reports: &[PerformanceReport]) -> Result<()> {
        write_json_atomic(&self.path, &reports)?;
        log::debug!(
            "Saved {} report(s) to {}",
            reports.len(),
            self.path.display()
        );
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn append(&self, report: PerformanceReport, limit: usize) -> Result<()> {
        let _guard = self.append_lock.lock();
        let reports = self.load().unwrap_or_else(|e| {
            log::warn!("Discarding unreadable report history: {}", e);
            Vec::new()
        });
        self.save(&push_capped(reports, report, limit))
    }
}

/// Process-local history, used when nothing should touch the disk.
#[derive(Debug, Default)]
pub struct MemoryReportStore {
    reports: Mutex<Vec<PerformanceReport>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportStore for MemoryReportStore {
    fn load(&self) -> Result<Vec<PerformanceReport>> {
        Ok(self.reports.lock().clone())
    }

    fn save(&self, reports: &[PerformanceReport]) -> Result<()> {
        *self.reports.lock() = reports.to_vec();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.reports.lock().clear();
        Ok(())
    }

    fn append(&self, report: PerformanceReport, limit: usize) -> Result<()> {
        let mut reports = self.reports.lock();
        *reports = push_capped(std::mem::take(&mut *reports), report, limit);
        Ok(())
    }
}

/// Writes pretty JSON to a uniquely named sibling temp file, then renames it
/// over `path`.
pub(crate) fn write_json_atomic<V: Serialize + ?Sized>(path: &Path, value: &V) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
