//! Packed postings file with a per-key byte-offset sidecar.
//!
//! The data stream holds packed records for keys `0..N` contiguously; the
//! `.offsets` sidecar is a little-endian u64 array of length N mapping each
//! key to its record's byte offset, giving O(1) random access over a
//! memory-mapped file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::mmap::FileBytes;
use crate::{DocId, Error, Result, TermId};

use super::record::{PostingsRecord, Weight};
use super::read_vint;

/// Suffix of the offset sidecar next to the data file
pub const OFFSETS_SUFFIX: &str = ".offsets";

const WRITE_BUFFER_SIZE: usize = 1024 * 1024;

pub(crate) fn offsets_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(OFFSETS_SUFFIX);
    PathBuf::from(os)
}

/// Append-only writer for a packed postings file.
///
/// Records must arrive in ascending primary-key order. Keys the producer
/// skips are materialized as empty records, so every offset slot in
/// `[0, expected_keys)` is valid once `finish` runs. The offset array grows
/// with what is actually written; `expected_keys` is a reservation and the
/// trailing-pad target.
pub struct PostingsFileWriter<W: Weight = f64> {
    out: BufWriter<File>,
    offsets_path: PathBuf,
    offsets: Vec<u64>,
    byte_pos: u64,
    expected_keys: u64,
    _weight: PhantomData<W>,
}

impl<W: Weight> PostingsFileWriter<W> {
    pub fn new(path: &Path, expected_keys: u64) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            out: BufWriter::with_capacity(WRITE_BUFFER_SIZE, file),
            offsets_path: offsets_path(path),
            offsets: Vec::with_capacity(expected_keys as usize),
            byte_pos: 0,
            expected_keys,
            _weight: PhantomData,
        })
    }

    /// Write one record, materializing empty records for any skipped keys
    pub fn write(&mut self, record: &PostingsRecord<W>) -> Result<()> {
        let key = record.primary_key();
        debug_assert!(
            key >= self.offsets.len() as u64,
            "postings records must be written in ascending key order"
        );
        while (self.offsets.len() as u64) < key {
            self.write_empty()?;
        }
        self.offsets.push(self.byte_pos);
        self.byte_pos += record.write_packed(&mut self.out)?;
        Ok(())
    }

    fn write_empty(&mut self) -> Result<()> {
        let empty = PostingsRecord::<W>::new(self.offsets.len() as u64);
        self.offsets.push(self.byte_pos);
        self.byte_pos += empty.write_packed(&mut self.out)?;
        Ok(())
    }

    /// Number of keys written so far (including materialized gaps)
    pub fn keys_written(&self) -> u64 {
        self.offsets.len() as u64
    }

    /// Pad trailing keys, flush the data stream, and persist the offsets
    pub fn finish(mut self) -> Result<()> {
        while (self.offsets.len() as u64) < self.expected_keys {
            self.write_empty()?;
        }
        self.out.flush()?;

        let mut out = BufWriter::new(File::create(&self.offsets_path)?);
        for &offset in &self.offsets {
            out.write_u64::<LittleEndian>(offset)?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Random-access reader over a packed postings file and its offset sidecar
pub struct PostingsFileReader<W: Weight = f64> {
    data: FileBytes,
    offsets: FileBytes,
    num_keys: u64,
    _weight: PhantomData<W>,
}

impl<W: Weight> PostingsFileReader<W> {
    pub fn open(path: &Path) -> Result<Self> {
        let data = FileBytes::open(path)?;
        let offsets = FileBytes::open(&offsets_path(path))?;
        if offsets.len() % 8 != 0 {
            return Err(Error::Corruption(format!(
                "offset file for {} has irregular length {}",
                path.display(),
                offsets.len()
            )));
        }
        let num_keys = (offsets.len() / 8) as u64;
        Ok(Self {
            data,
            offsets,
            num_keys,
            _weight: PhantomData,
        })
    }

    /// Number of keys (documents) addressable in this file
    pub fn num_docs(&self) -> u64 {
        self.num_keys
    }

    fn offset(&self, key: DocId) -> u64 {
        let at = key as usize * 8;
        LittleEndian::read_u64(&self.offsets.as_slice()[at..at + 8])
    }

    fn record_bytes(&self, key: DocId) -> Result<&[u8]> {
        let offset = self.offset(key) as usize;
        let data = self.data.as_slice();
        if offset > data.len() {
            return Err(Error::Corruption(format!(
                "postings record {key} points past end of data"
            )));
        }
        Ok(&data[offset..])
    }

    /// Materialize the record for the given key
    pub fn find(&self, key: DocId) -> Result<PostingsRecord<W>> {
        if key >= self.num_keys {
            return Err(Error::InvalidDocId(key));
        }
        let mut slice = self.record_bytes(key)?;
        match PostingsRecord::read_packed(&mut slice)? {
            Some((record, _)) => {
                debug_assert_eq!(record.primary_key(), key);
                Ok(record)
            }
            None => Err(Error::Corruption(format!(
                "postings record {key} points past end of data"
            ))),
        }
    }

    /// Lazily decode the record's (term, weight) pairs without materializing
    /// a container. Returns `None` when the key is out of range.
    pub fn find_stream(&self, key: DocId) -> Option<PostingsStream<'_, W>> {
        if key >= self.num_keys {
            return None;
        }
        PostingsStream::decode(self.record_bytes(key).ok()?)
    }
}

/// Lazy iterator over one record's (term, weight) pairs
pub struct PostingsStream<'a, W: Weight = f64> {
    data: &'a [u8],
    remaining: u64,
    _weight: PhantomData<W>,
}

impl<'a, W: Weight> PostingsStream<'a, W> {
    fn decode(mut data: &'a [u8]) -> Option<Self> {
        read_vint(&mut data).ok()?; // primary key
        let (remaining, _) = read_vint(&mut data).ok()?;
        Some(Self {
            data,
            remaining,
            _weight: PhantomData,
        })
    }

    /// Pairs not yet yielded
    pub fn len(&self) -> u64 {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }
}

impl<'a, W: Weight> Iterator for PostingsStream<'a, W> {
    type Item = (TermId, W);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let (term, _) = read_vint(&mut self.data).ok()?;
        let (weight, _) = W::read(&mut self.data).ok()?;
        self.remaining -= 1;
        Some((term, weight))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}
