//! Per-document metadata sidecar, labels, and the label-id mapping.
//!
//! `metadata.db` holds one fixed-width record per document
//! (`[u64 length][u64 unique-term-count]`, little-endian) written at
//! `doc_id * 16`, so tokenization workers can write in whatever order the
//! scheduler hands them documents. `metadata.index` is the usual offset
//! sidecar. `docs.labels` is one label per line; `labelids.mapping` maps
//! labels to compact 1-based ids assigned by first occurrence in DocId
//! order.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::index::files;
use crate::mmap::FileBytes;
use crate::{DocId, Error, Result};

const RECORD_BYTES: u64 = 16;

/// Thread-safe writer for the per-document metadata records
pub struct MetadataWriter {
    file: Mutex<File>,
    index_path: PathBuf,
    num_docs: u64,
}

impl MetadataWriter {
    pub fn new(dir: &Path, num_docs: u64) -> Result<Self> {
        let path = dir.join(files::METADATA_DB);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        file.set_len(num_docs * RECORD_BYTES)?;
        Ok(Self {
            file: Mutex::new(file),
            index_path: dir.join(files::METADATA_INDEX),
            num_docs,
        })
    }

    /// Record a document's length (sum of rounded weights) and unique-term
    /// count. Callers may write documents in any order.
    pub fn write(&self, doc_id: DocId, length: u64, unique_terms: u64) -> Result<()> {
        let mut buf = [0u8; RECORD_BYTES as usize];
        LittleEndian::write_u64(&mut buf[..8], length);
        LittleEndian::write_u64(&mut buf[8..], unique_terms);

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(doc_id * RECORD_BYTES))?;
        file.write_all(&buf)?;
        Ok(())
    }

    /// Flush and write the offset sidecar
    pub fn finish(self) -> Result<()> {
        self.file.lock().sync_data()?;
        let mut out = BufWriter::new(File::create(&self.index_path)?);
        for doc in 0..self.num_docs {
            out.write_u64::<LittleEndian>(doc * RECORD_BYTES)?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Memory-mapped view of the metadata sidecar
pub struct DocMetadata {
    db: FileBytes,
    num_docs: u64,
}

impl DocMetadata {
    pub fn open(dir: &Path) -> Result<Self> {
        let db = FileBytes::open(&dir.join(files::METADATA_DB))?;
        let index = FileBytes::open(&dir.join(files::METADATA_INDEX))?;
        if index.len() % 8 != 0 {
            return Err(Error::Corruption(
                "metadata index has irregular length".to_string(),
            ));
        }
        let num_docs = (index.len() / 8) as u64;
        if db.len() as u64 != num_docs * RECORD_BYTES {
            return Err(Error::Corruption(format!(
                "metadata db holds {} bytes, expected {}",
                db.len(),
                num_docs * RECORD_BYTES
            )));
        }
        Ok(Self {
            db,
            num_docs,
        })
    }

    pub fn num_docs(&self) -> u64 {
        self.num_docs
    }

    fn field(&self, doc_id: DocId, at: usize) -> Result<u64> {
        if doc_id >= self.num_docs {
            return Err(Error::InvalidDocId(doc_id));
        }
        let base = (doc_id * RECORD_BYTES) as usize + at;
        Ok(LittleEndian::read_u64(&self.db.as_slice()[base..base + 8]))
    }

    /// Sum of the document's rounded term weights
    pub fn length(&self, doc_id: DocId) -> Result<u64> {
        self.field(doc_id, 0)
    }

    /// Number of distinct terms in the document
    pub fn unique_terms(&self, doc_id: DocId) -> Result<u64> {
        self.field(doc_id, 8)
    }
}

/// Dense label vector filled by workers, persisted to `docs.labels`
pub struct LabelStore {
    labels: Mutex<Vec<String>>,
}

impl LabelStore {
    pub fn with_capacity(num_docs: u64) -> Self {
        Self {
            labels: Mutex::new(vec![String::new(); num_docs as usize]),
        }
    }

    pub fn set(&self, doc_id: DocId, label: &str) {
        let mut labels = self.labels.lock();
        let at = doc_id as usize;
        if at >= labels.len() {
            labels.resize(at + 1, String::new());
        }
        labels[at] = label.to_string();
    }

    /// One label per line, in DocId order
    pub fn save(&self, path: &Path) -> Result<()> {
        let labels = self.labels.lock();
        let mut out = BufWriter::new(File::create(path)?);
        for label in labels.iter() {
            out.write_all(label.as_bytes())?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn into_labels(self) -> Vec<String> {
        self.labels.into_inner()
    }

    pub fn load(path: &Path) -> Result<Vec<String>> {
        let text = fs::read_to_string(path)?;
        Ok(text.lines().map(str::to_string).collect())
    }
}

/// Label <-> compact 1-based label id, assigned by first occurrence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelIdMapping {
    labels: Vec<String>,
}

impl LabelIdMapping {
    /// Scan labels in DocId order, assigning ids by first occurrence
    pub fn from_labels(labels: &[String]) -> Self {
        let mut distinct = Vec::new();
        for label in labels {
            if !distinct.contains(label) {
                distinct.push(label.clone());
            }
        }
        Self {
            labels: distinct,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The 1-based id for a label
    pub fn id(&self, label: &str) -> Option<u64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|at| at as u64 + 1)
    }

    pub fn label(&self, id: u64) -> Option<&str> {
        if id == 0 {
            return None;
        }
        self.labels.get(id as usize - 1).map(String::as_str)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes =
            serde_json::to_vec_pretty(self).map_err(|e| Error::Corruption(e.to_string()))?;
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            Error::Corruption(format!("malformed label id mapping {}: {e}", path.display()))
        })
    }
}
