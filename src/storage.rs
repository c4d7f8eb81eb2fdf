//! Persistence of chunk and metadata payloads.
//!
//! The generator hands every payload to a [`PersistenceSink`] as opaque bytes.
//! Chunk writes come from worker threads in no particular order; the metadata
//! write always comes last.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use crate::metadata::METADATA_FILE;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("sink is unavailable: {0}")]
    Unavailable(String),
}

/// Destination for generated payloads.
pub trait PersistenceSink: Sync {
    fn write_chunk(
        &self,
        row: usize,
        col: usize,
        file: &str,
        payload: &[u8],
    ) -> Result<(), SinkError>;

    fn write_metadata(&self, payload: &[u8]) -> Result<(), SinkError>;
}

/// Writes payloads as files in one directory:
/// `{dir}/g-r{row}c{col}.json.gz` and `{dir}/grid-metadata.json`.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    fn ensure_dir(&self) -> Result<(), SinkError> {
        fs::create_dir_all(&self.dir).map_err(|source| SinkError::Write {
            path: self.dir.clone(),
            source,
        })
    }

    fn write_file(&self, name: &str, payload: &[u8]) -> Result<(), SinkError> {
        self.ensure_dir()?;
        let path = self.dir.join(name);
        fs::write(&path, payload).map_err(|source| SinkError::Write { path, source })
    }

    /// List `(row, col)` of every chunk file in the directory, sorted.
    pub fn list_chunks(&self) -> Result<Vec<(usize, usize)>, SinkError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let read_err = |source| SinkError::Read {
            path: self.dir.clone(),
            source,
        };

        let mut chunks = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            if let Some(key) = entry.file_name().to_str().and_then(parse_chunk_file_name) {
                chunks.push(key);
            }
        }
        chunks.sort_unstable();
        Ok(chunks)
    }

    /// Total size of all files in the directory, in bytes.
    pub fn total_size(&self) -> Result<u64, SinkError> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let read_err = |source| SinkError::Read {
            path: self.dir.clone(),
            source,
        };

        let mut total = 0;
        for entry in fs::read_dir(&self.dir).map_err(read_err)? {
            total += entry.and_then(|e| e.metadata()).map_err(read_err)?.len();
        }
        Ok(total)
    }
}

impl PersistenceSink for DirectorySink {
    fn write_chunk(
        &self,
        _row: usize,
        _col: usize,
        file: &str,
        payload: &[u8],
    ) -> Result<(), SinkError> {
        self.write_file(file, payload)
    }

    fn write_metadata(&self, payload: &[u8]) -> Result<(), SinkError> {
        self.write_file(METADATA_FILE, payload)
    }
}

/// Parse `g-r{row}c{col}.json.gz` back into `(row, col)`.
pub fn parse_chunk_file_name(name: &str) -> Option<(usize, usize)> {
    let key = name.strip_prefix("g-r")?.strip_suffix(".json.gz")?;
    let (row, col) = key.split_once('c')?;
    Some((row.parse().ok()?, col.parse().ok()?))
}

/// Keeps payloads in memory, keyed by file name.
#[derive(Default)]
pub struct MemorySink {
    chunks: Mutex<BTreeMap<(usize, usize), (String, Vec<u8>)>>,
    metadata: Mutex<Option<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Payload of chunk `(row, col)`, if written.
    pub fn chunk(&self, row: usize, col: usize) -> Option<Vec<u8>> {
        let chunks = self.chunks.lock().ok()?;
        chunks.get(&(row, col)).map(|(_, bytes)| bytes.clone())
    }

    /// All chunk payloads as `(file, bytes)` in `(row, col)` order.
    pub fn chunks(&self) -> Vec<(String, Vec<u8>)> {
        self.chunks
            .lock()
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn metadata(&self) -> Option<Vec<u8>> {
        self.metadata.lock().ok()?.clone()
    }
}

impl PersistenceSink for MemorySink {
    fn write_chunk(
        &self,
        row: usize,
        col: usize,
        file: &str,
        payload: &[u8],
    ) -> Result<(), SinkError> {
        let mut chunks = self
            .chunks
            .lock()
            .map_err(|_| SinkError::Unavailable("chunk store poisoned".into()))?;
        chunks.insert((row, col), (file.to_string(), payload.to_vec()));
        Ok(())
    }

    fn write_metadata(&self, payload: &[u8]) -> Result<(), SinkError> {
        let mut metadata = self
            .metadata
            .lock()
            .map_err(|_| SinkError::Unavailable("metadata store poisoned".into()))?;
        *metadata = Some(payload.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_chunk_file_name() {
        assert_eq!(parse_chunk_file_name("g-r0c0.json.gz"), Some((0, 0)));
        assert_eq!(parse_chunk_file_name("g-r12c7.json.gz"), Some((12, 7)));
        assert_eq!(parse_chunk_file_name("grid-metadata.json"), None);
        assert_eq!(parse_chunk_file_name("g-rxc1.json.gz"), None);
        assert_eq!(parse_chunk_file_name("g-r1c1.json"), None);
    }

    #[test]
    fn test_directory_sink_writes_files() {
        let dir = tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("data64"));

        sink.write_chunk(1, 0, "g-r1c0.json.gz", b"{}").unwrap();
        sink.write_chunk(0, 2, "g-r0c2.json.gz", b"{}").unwrap();
        sink.write_metadata(b"{\"width\":1}").unwrap();

        assert_eq!(sink.list_chunks().unwrap(), vec![(0, 2), (1, 0)]);
        assert_eq!(fs::read(sink.metadata_path()).unwrap(), b"{\"width\":1}");
        assert_eq!(sink.total_size().unwrap(), 2 + 2 + 11);
    }

    #[test]
    fn test_directory_sink_empty() {
        let dir = tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("missing"));
        assert!(sink.list_chunks().unwrap().is_empty());
        assert_eq!(sink.total_size().unwrap(), 0);
    }

    #[test]
    fn test_directory_sink_surfaces_write_errors() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let sink = DirectorySink::new(&blocker);
        let err = sink.write_chunk(0, 0, "g-r0c0.json.gz", b"{}").unwrap_err();
        assert!(matches!(err, SinkError::Write { .. }));
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        sink.write_chunk(0, 1, "g-r0c1.json.gz", b"b").unwrap();
        sink.write_chunk(0, 0, "g-r0c0.json.gz", b"a").unwrap();
        assert_eq!(sink.chunk_count(), 2);
        assert_eq!(sink.chunk(0, 0), Some(b"a".to_vec()));
        assert_eq!(sink.chunks()[1].0, "g-r0c1.json.gz");
        assert!(sink.metadata().is_none());
        sink.write_metadata(b"m").unwrap();
        assert_eq!(sink.metadata(), Some(b"m".to_vec()));
    }
}
