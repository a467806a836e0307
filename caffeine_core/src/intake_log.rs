//! Append-only intake log.
//!
//! Intakes are appended to a JSONL (JSON Lines) file with file locking so
//! concurrent `caff log` invocations never interleave lines.

use crate::{Error, IntakeRecord, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Intake sink trait for persisting intakes
pub trait IntakeSink {
    fn append(&mut self, record: &IntakeRecord) -> Result<()>;
}

/// JSONL-based intake sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl IntakeSink for JsonlSink {
    fn append(&mut self, record: &IntakeRecord) -> Result<()> {
        self.ensure_parent_dir()?;

        let lock = open_lock(&self.path)?;
        lock.lock_exclusive()?;

        // Opened after the lock so a concurrent rewrite can never leave us
        // holding the replaced file.
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        lock.unlock()?;

        tracing::debug!("Appended intake {} to log", record.id);
        Ok(())
    }
}

/// Path of the lock file guarding a log
///
/// Every reader and writer locks this file rather than the log itself, since
/// `remove_intake` replaces the log's inode.
pub fn lock_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

fn open_lock(path: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(lock_path(path))?;
    Ok(file)
}

/// Read all intakes from a log file
///
/// Unparseable lines are skipped with a warning.
pub fn read_intakes(path: &Path) -> Result<Vec<IntakeRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let lock = open_lock(path)?;
    lock.lock_shared()?;
    let records = read_records(path);
    lock.unlock()?;

    let records = records?;
    tracing::debug!("Read {} intakes from log", records.len());
    Ok(records)
}

fn read_records(path: &Path) -> Result<Vec<IntakeRecord>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<IntakeRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Failed to parse intake at line {}: {}", line_num + 1, e);
            }
        }
    }

    Ok(records)
}

/// Remove one intake, rewriting the log atomically
///
/// The read, filter and rename all happen under one exclusive lock, so
/// appends made while a removal is in flight are kept. Returns the removed
/// record.
pub fn remove_intake(path: &Path, id: Uuid) -> Result<IntakeRecord> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "intake log path missing parent")
    })?;
    std::fs::create_dir_all(parent)?;

    let lock = open_lock(path)?;
    lock.lock_exclusive()?;
    let result = rewrite_without(path, parent, id);
    lock.unlock()?;

    let (removed, remaining) = result?;
    tracing::info!("Removed intake {} ({} remaining)", id, remaining);
    Ok(removed)
}

fn rewrite_without(path: &Path, parent: &Path, id: Uuid) -> Result<(IntakeRecord, usize)> {
    let records = read_records(path)?;
    let (removed, kept): (Vec<_>, Vec<_>) = records.into_iter().partition(|r| r.id == id);

    let removed = removed
        .into_iter()
        .next()
        .ok_or_else(|| Error::NotFound(format!("intake {}", id)))?;

    let temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        for record in &kept {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    Ok((removed, kept.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DrinkRef;
    use chrono::{Duration, TimeZone, Utc};

    fn create_test_record(hours_ago: i64) -> IntakeRecord {
        let base = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        IntakeRecord::new(
            95.0,
            base - Duration::hours(hours_ago),
            Some(DrinkRef {
                name: "Coffee (8 oz)".into(),
                color: None,
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_append_and_read_single_intake() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("intakes.jsonl");

        let record = create_test_record(1);
        let mut sink = JsonlSink::new(&log_path);
        sink.append(&record).unwrap();

        let records = read_intakes(&log_path).unwrap();
        assert_eq!(records, vec![record]);
    }

    #[test]
    fn test_append_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("a").join("b").join("intakes.jsonl");

        let mut sink = JsonlSink::new(&log_path);
        for hours in 0..4 {
            sink.append(&create_test_record(hours)).unwrap();
        }

        assert_eq!(read_intakes(&log_path).unwrap().len(), 4);
    }

    #[test]
    fn test_read_missing_log() {
        let temp_dir = tempfile::tempdir().unwrap();
        let records = read_intakes(&temp_dir.path().join("nonexistent.jsonl")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("intakes.jsonl");

        let mut sink = JsonlSink::new(&log_path);
        sink.append(&create_test_record(2)).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
            writeln!(file, "{{ not json").unwrap();
        }
        sink.append(&create_test_record(1)).unwrap();

        assert_eq!(read_intakes(&log_path).unwrap().len(), 2);
    }

    #[test]
    fn test_remove_intake() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("intakes.jsonl");

        let first = create_test_record(3);
        let second = create_test_record(1);
        let mut sink = JsonlSink::new(&log_path);
        sink.append(&first).unwrap();
        sink.append(&second).unwrap();

        let removed = remove_intake(&log_path, first.id).unwrap();
        assert_eq!(removed.id, first.id);
        assert_eq!(read_intakes(&log_path).unwrap(), vec![second]);

        assert!(matches!(
            remove_intake(&log_path, first.id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_lock_path_sits_next_to_log() {
        let log_path = Path::new("/data/intakes.jsonl");
        assert_eq!(lock_path(log_path), Path::new("/data/intakes.jsonl.lock"));
    }

    #[test]
    fn test_remove_keeps_concurrent_appends() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("intakes.jsonl");

        let mut sink = JsonlSink::new(&log_path);
        let old: Vec<_> = (0..20).map(|h| create_test_record(h + 10)).collect();
        for record in &old {
            sink.append(record).unwrap();
        }

        let writer_path = log_path.clone();
        let writer = std::thread::spawn(move || {
            let mut sink = JsonlSink::new(&writer_path);
            let mut ids = Vec::new();
            for _ in 0..300 {
                let record = create_test_record(0);
                sink.append(&record).unwrap();
                ids.push(record.id);
            }
            ids
        });

        for record in &old {
            remove_intake(&log_path, record.id).unwrap();
        }
        let appended = writer.join().unwrap();

        let remaining: Vec<Uuid> = read_intakes(&log_path)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(remaining, appended);
    }
}
