//! On-disk chunk files and their k-way merge.
//!
//! A chunk is one producer's intermediate run of packed records in ascending
//! primary-key order. The merge pops the least key across all chunks with a
//! min-heap; records sharing a key (possible when a producer spilled a
//! document across chunks) have their counts concatenated in chunk order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::{DocId, Error, Result};

use super::record::{PostingsRecord, Weight};

/// Reads one chunk file, buffering the current record.
///
/// The chunk file is deleted when the reader is dropped.
pub struct ChunkReader<W: Weight = f64> {
    file: BufReader<File>,
    path: PathBuf,
    current: Option<PostingsRecord<W>>,
    total_bytes: u64,
    bytes_read: u64,
}

impl<W: Weight> ChunkReader<W> {
    pub fn open(path: &Path) -> Result<Self> {
        let total_bytes = fs::metadata(path)?.len();
        let file = BufReader::new(File::open(path)?);
        let mut reader = Self {
            file,
            path: path.to_path_buf(),
            current: None,
            total_bytes,
            bytes_read: 0,
        };
        reader.read_next()?;
        Ok(reader)
    }

    fn read_next(&mut self) -> Result<()> {
        match PostingsRecord::read_packed(&mut self.file)? {
            Some((record, bytes)) => {
                self.bytes_read += bytes;
                self.current = Some(record);
            }
            None => self.current = None,
        }
        Ok(())
    }

    /// The buffered record, or `None` once the chunk is exhausted
    pub fn current(&self) -> Option<&PostingsRecord<W>> {
        self.current.as_ref()
    }

    /// Take the buffered record and buffer the next one
    pub fn advance(&mut self) -> Result<Option<PostingsRecord<W>>> {
        let record = self.current.take();
        if record.is_some() {
            self.read_next()?;
        }
        Ok(record)
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}

impl<W: Weight> Drop for ChunkReader<W> {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("failed to remove chunk {}: {}", self.path.display(), e);
        }
    }
}

/// Entry for the k-way merge heap, ordered as a min-heap on the buffered
/// key with chunk index as the tiebreak
struct MergeEntry {
    key: DocId,
    chunk: usize,
}

impl PartialEq for MergeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.chunk == other.chunk
    }
}

impl Eq for MergeEntry {}

impl PartialOrd for MergeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default)
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.chunk.cmp(&self.chunk))
    }
}

/// Merge chunks in ascending primary-key order, concatenating the counts of
/// same-key records, and hand each merged record to `write`.
///
/// Returns the number of unique primary keys. Callers filter out zero-byte
/// chunk files before building the heap; a zero-byte chunk has no first
/// record to compare.
pub fn multiway_merge<W, F>(mut chunks: Vec<ChunkReader<W>>, mut write: F) -> Result<u64>
where
    W: Weight,
    F: FnMut(PostingsRecord<W>) -> Result<()>,
{
    let total_bytes: u64 = chunks.iter().map(|c| c.total_bytes()).sum();

    let mut heap = BinaryHeap::with_capacity(chunks.len());
    for (idx, chunk) in chunks.iter().enumerate() {
        if let Some(record) = chunk.current() {
            heap.push(MergeEntry {
                key: record.primary_key(),
                chunk: idx,
            });
        }
    }

    let mut unique_keys = 0u64;
    let mut logged = 0u64;
    while let Some(entry) = heap.pop() {
        let mut record = pop_record(&mut chunks, &mut heap, entry.chunk)?;

        // gather every chunk buffering the same key, in chunk order
        loop {
            match heap.peek() {
                Some(next) if next.key == record.primary_key() => {}
                _ => break,
            }
            if let Some(next) = heap.pop() {
                let same = pop_record(&mut chunks, &mut heap, next.chunk)?;
                record.extend_counts(same.into_counts());
            }
        }

        write(record)?;
        unique_keys += 1;

        let read: u64 = chunks.iter().map(|c| c.bytes_read()).sum();
        if total_bytes > 0 && (read - logged) * 10 >= total_bytes {
            logged = read;
            log::debug!("merging postings: {read}/{total_bytes} bytes");
        }
    }

    Ok(unique_keys)
}

/// Take the buffered record from `chunk` and re-enter it in the heap
fn pop_record<W: Weight>(
    chunks: &mut [ChunkReader<W>],
    heap: &mut BinaryHeap<MergeEntry>,
    chunk: usize,
) -> Result<PostingsRecord<W>> {
    let record = chunks[chunk].advance()?.ok_or_else(|| {
        Error::Corruption("merge heap referenced an exhausted chunk".to_string())
    })?;
    if let Some(next) = chunks[chunk].current() {
        heap.push(MergeEntry {
            key: next.primary_key(),
            chunk,
        });
    }
    Ok(record)
}
