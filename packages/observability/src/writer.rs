//! Append-only sink for the central log file.
//!
//! Each event is buffered and written with a single `write_all` on drop, so
//! lines from concurrent processes appending to the same file never interleave.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone)]
pub struct CentralLogWriter {
    file: Arc<Mutex<File>>,
}

impl CentralLogWriter {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Arc::new(Mutex::new(file)),
        })
    }
}

impl<'a> MakeWriter<'a> for CentralLogWriter {
    type Writer = LineBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        LineBuffer {
            file: Arc::clone(&self.file),
            buf: Vec::with_capacity(256),
        }
    }
}

/// Collects one event's bytes; written out on flush or drop.
pub struct LineBuffer {
    file: Arc<Mutex<File>>,
    buf: Vec<u8>,
}

impl Write for LineBuffer {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let mut file = self.file.lock();
        file.write_all(&self.buf)?;
        self.buf.clear();
        file.flush()
    }
}

impl Drop for LineBuffer {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_is_written_when_buffer_drops() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("central.jsonl");
        let sink = CentralLogWriter::new(&path).unwrap();

        let mut line = sink.make_writer();
        line.write_all(b"{\"msg\":").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

        line.write_all(b"\"hi\"}\n").unwrap();
        drop(line);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"msg\":\"hi\"}\n");
    }

    #[test]
    fn test_reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("central.jsonl");

        for text in ["one\n", "two\n"] {
            let sink = CentralLogWriter::new(&path).unwrap();
            write!(sink.make_writer(), "{}", text).unwrap();
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_clones_share_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("central.jsonl");
        let sink = CentralLogWriter::new(&path).unwrap();
        let other = sink.clone();

        let mut first = sink.make_writer();
        let mut second = other.make_writer();
        first.write_all(b"a\n").unwrap();
        second.write_all(b"b\n").unwrap();
        second.flush().unwrap();
        first.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "b\na\n");
    }
}
