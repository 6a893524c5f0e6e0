//! External-memory transposer for the uninversion path.
//!
//! Consumes (term, [(doc, count)]) postings in ascending term order and
//! produces (doc, [(term, count)]) records. Partial forward records are
//! buffered in memory and spilled to sorted chunk files whenever the buffer
//! exceeds the RAM budget; a final k-way merge concatenates each document's
//! runs. Because terms are fed in ascending order and every run preserves
//! append order, the merged counts come out ascending by term id.

use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::mem::size_of;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::{DocId, Result, TermId};

use super::chunk::{multiway_merge, ChunkReader};
use super::record::PostingsRecord;

/// Memory accounted per buffered document: map entry overhead + Vec header
const DOC_OVERHEAD: usize = size_of::<DocId>() + size_of::<Vec<(TermId, u64)>>() + 8;

/// Memory accounted per buffered (term, count) pair
const PAIR_BYTES: usize = size_of::<(TermId, u64)>();

/// RAM-bounded transposer from term-major to document-major postings
pub struct PostingsInverter {
    dir: PathBuf,
    buffer: FxHashMap<DocId, Vec<(TermId, u64)>>,
    bytes_used: usize,
    ram_budget: usize,
    chunk_paths: Vec<PathBuf>,
}

impl PostingsInverter {
    pub fn new(dir: &Path, ram_budget: u64) -> Self {
        Self {
            dir: dir.to_path_buf(),
            buffer: FxHashMap::default(),
            bytes_used: 0,
            ram_budget: ram_budget as usize,
            chunk_paths: Vec::new(),
        }
    }

    /// Fold one term's posting list into the buffered forward records,
    /// spilling a chunk if the buffer has outgrown the budget.
    ///
    /// Terms must be fed in ascending term-id order.
    pub fn invert(&mut self, term: TermId, counts: &[(DocId, u64)]) -> Result<()> {
        for &(doc, count) in counts {
            match self.buffer.entry(doc) {
                Entry::Occupied(mut entry) => entry.get_mut().push((term, count)),
                Entry::Vacant(entry) => {
                    entry.insert(vec![(term, count)]);
                    self.bytes_used += DOC_OVERHEAD;
                }
            }
            self.bytes_used += PAIR_BYTES;
        }
        if self.bytes_used > self.ram_budget {
            self.flush_chunk()?;
        }
        Ok(())
    }

    fn flush_chunk(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let mut records: Vec<(DocId, Vec<(TermId, u64)>)> = self.buffer.drain().collect();
        records.sort_unstable_by_key(|&(doc, _)| doc);

        let path = self.dir.join(format!("chunk-{}", self.chunk_paths.len()));
        let mut out = BufWriter::new(File::create(&path)?);
        for (doc, counts) in records {
            PostingsRecord::with_counts(doc, counts).write_packed(&mut out)?;
        }
        out.flush()?;

        self.chunk_paths.push(path);
        self.bytes_used = 0;
        Ok(())
    }

    /// Number of chunks spilled so far
    pub fn chunks(&self) -> usize {
        self.chunk_paths.len()
    }

    /// Flush the tail, merge all chunks, and write the document-major
    /// postings stream to `out_path`. Returns the number of unique documents
    /// that carried at least one term.
    pub fn merge(mut self, out_path: &Path) -> Result<u64> {
        self.flush_chunk()?;

        let mut chunks = Vec::with_capacity(self.chunk_paths.len());
        for path in &self.chunk_paths {
            chunks.push(ChunkReader::<u64>::open(path)?);
        }

        let mut out = BufWriter::new(File::create(out_path)?);
        let unique_docs = multiway_merge(chunks, |record| {
            record.write_packed(&mut out)?;
            Ok(())
        })?;
        out.flush()?;
        Ok(unique_docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;
    use tempfile::TempDir;

    fn read_all(path: &Path) -> Vec<PostingsRecord<u64>> {
        let mut input = BufReader::new(File::open(path).unwrap());
        let mut records = Vec::new();
        while let Some((record, _)) = PostingsRecord::read_packed(&mut input).unwrap() {
            records.push(record);
        }
        records
    }

    #[test]
    fn test_transpose_in_memory() {
        let tmp = TempDir::new().unwrap();
        let mut inverter = PostingsInverter::new(tmp.path(), 1024 * 1024);

        // term 0 in docs {0, 2}, term 1 in doc 1, term 2 in docs {0, 1}
        inverter.invert(0, &[(0, 2), (2, 1)]).unwrap();
        inverter.invert(1, &[(1, 3)]).unwrap();
        inverter.invert(2, &[(0, 1), (1, 1)]).unwrap();

        let out = tmp.path().join("postings.index");
        let unique = inverter.merge(&out).unwrap();
        assert_eq!(unique, 3);

        let records = read_all(&out);
        assert_eq!(records[0].primary_key(), 0);
        assert_eq!(records[0].counts(), &[(0, 2), (2, 1)]);
        assert_eq!(records[1].counts(), &[(1, 3), (2, 1)]);
        assert_eq!(records[2].counts(), &[(0, 1)]);
    }

    #[test]
    fn test_budget_forces_spills() {
        let tmp = TempDir::new().unwrap();
        // budget so small every call spills
        let mut inverter = PostingsInverter::new(tmp.path(), 1);

        inverter.invert(0, &[(0, 1), (3, 1)]).unwrap();
        inverter.invert(1, &[(0, 2)]).unwrap();
        inverter.invert(2, &[(3, 4)]).unwrap();
        assert!(inverter.chunks() >= 2);

        let out = tmp.path().join("postings.index");
        let unique = inverter.merge(&out).unwrap();
        assert_eq!(unique, 2);

        let records = read_all(&out);
        // doc 0's runs concatenate in chunk (= term) order
        assert_eq!(records[0].primary_key(), 0);
        assert_eq!(records[0].counts(), &[(0, 1), (1, 2)]);
        assert_eq!(records[1].primary_key(), 3);
        assert_eq!(records[1].counts(), &[(0, 1), (2, 4)]);

        // chunks are removed once the merge drops its readers
        assert!(!tmp.path().join("chunk-0").exists());
    }
}
