//! Shared output for exchange log entries
//!
//! The sink is a cloneable handle: the transport and the caller hold the same
//! writer. The lock is taken only to write one already-serialized entry, so
//! an entry is never split by a concurrent exchange.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use super::capture::LogEntry;

/// Failure to append an entry to the sink
#[derive(Error, Debug)]
pub enum SinkError {
    /// The underlying writer failed
    #[error("Failed to write exchange log: {0}")]
    Io(#[from] io::Error),

    /// The entry could not be encoded
    #[error("Failed to encode exchange log entry: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A writer panicked while holding the lock
    #[error("Exchange log lock poisoned")]
    Poisoned,
}

/// Append-only destination shared by every exchange of a transport
#[derive(Debug)]
pub struct LogSink<W> {
    writer: Arc<Mutex<W>>,
    failures: Arc<AtomicU64>,
}

impl<W> Clone for LogSink<W> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
            failures: Arc::clone(&self.failures),
        }
    }
}

impl LogSink<File> {
    /// Open `path` for logging, truncating anything already there
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be created.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write> LogSink<W> {
    /// Share `writer` as a sink
    pub fn new(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Append one entry as a single unit.
    ///
    /// The entry is encoded before the lock is taken; the lock covers the
    /// write and flush only.
    ///
    /// # Errors
    ///
    /// Returns the encoding or I/O failure. Every failure is also counted in
    /// [`write_failures`](Self::write_failures).
    pub fn write_entry(&self, entry: &LogEntry) -> Result<(), SinkError> {
        let result = self.try_write_entry(entry);
        if result.is_err() {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    fn try_write_entry(&self, entry: &LogEntry) -> Result<(), SinkError> {
        let mut buf = serde_json::to_vec_pretty(entry)?;
        buf.push(b'\n');

        let mut writer = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        writer.write_all(&buf)?;
        writer.flush()?;
        Ok(())
    }

    /// Number of entries that could not be written
    #[must_use]
    pub fn write_failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Flush the underlying writer
    ///
    /// # Errors
    ///
    /// Returns the I/O error from the writer.
    pub fn flush(&self) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        writer.flush()?;
        Ok(())
    }

    /// Run `f` with exclusive access to the writer
    ///
    /// # Errors
    ///
    /// Fails only if the lock is poisoned.
    pub fn with_writer<R>(&self, f: impl FnOnce(&mut W) -> R) -> Result<R, SinkError> {
        let mut writer = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        Ok(f(&mut writer))
    }
}

/// Split a log produced by [`LogSink`] back into entries
///
/// # Errors
///
/// Returns the decoding error for the first malformed entry.
pub fn read_entries(bytes: &[u8]) -> Result<Vec<LogEntry>, serde_json::Error> {
    serde_json::Deserializer::from_slice(bytes)
        .into_iter::<LogEntry>()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::transport::capture::{LoggedRequest, LoggedResponse};
    use reqwest::header::HeaderMap;
    use reqwest::StatusCode;

    fn entry(url: &str) -> LogEntry {
        LogEntry::begin(LoggedRequest {
            method: "GET".to_string(),
            url: url.to_string(),
            headers: Default::default(),
            parsed_body: None,
            raw_body: None,
        })
        .finish(Some(LoggedResponse::capture(
            StatusCode::OK,
            &HeaderMap::new(),
            br#"{"ok":true}"#,
        )))
    }

    /// Writer that refuses every write
    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_entries_round_trip_through_sink() {
        let sink = LogSink::new(Vec::new());
        sink.write_entry(&entry("https://example.test/a")).unwrap();
        sink.write_entry(&entry("https://example.test/b")).unwrap();

        let bytes = sink.with_writer(|buf| buf.clone()).unwrap();
        let entries = read_entries(&bytes).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].request.url, "https://example.test/a");
        assert_eq!(entries[1].request.url, "https://example.test/b");
        assert_eq!(sink.write_failures(), 0);
    }

    #[test]
    fn test_clones_share_the_writer() {
        let sink = LogSink::new(Vec::new());
        let clone = sink.clone();
        clone.write_entry(&entry("https://example.test/a")).unwrap();

        let len = sink.with_writer(|buf| buf.len()).unwrap();
        assert!(len > 0);
    }

    #[test]
    fn test_write_failures_are_counted() {
        let sink = LogSink::new(BrokenWriter);
        let err = sink.write_entry(&entry("https://example.test/a")).unwrap_err();
        assert!(matches!(err, SinkError::Io(_)));
        assert!(sink.write_entry(&entry("https://example.test/b")).is_err());
        assert_eq!(sink.write_failures(), 2);
    }

    #[test]
    fn test_create_truncates_existing_file() {
        let path = std::env::temp_dir().join(format!(
            "shopping-samples-sink-{}.json",
            uuid::Uuid::now_v7()
        ));
        std::fs::write(&path, "stale contents").unwrap();

        let sink = LogSink::create(&path).unwrap();
        sink.write_entry(&entry("https://example.test/a")).unwrap();
        drop(sink);

        let bytes = std::fs::read(&path).unwrap();
        let entries = read_entries(&bytes).unwrap();
        assert_eq!(entries.len(), 1);
        std::fs::remove_file(&path).unwrap();
    }
}
