//! Sorted on-disk vocabulary map.
//!
//! `termids.mapping` holds the distinct terms in lexicographic order, each
//! framed as `[varint len][utf8 bytes]`; `termids.mapping.inverse` is a
//! little-endian u64 array of each term's byte offset. A term's position is
//! its term id, so the pair gives O(1) id -> term and binary-search
//! term -> id. The bytes are a pure function of the sorted key set, which is
//! what makes the persisted vocabulary deterministic across runs.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::mmap::FileBytes;
use crate::postings::{read_vint, write_vint};
use crate::{Error, Result, TermId};

/// Suffix of the offset sidecar next to the mapping file
pub const INVERSE_SUFFIX: &str = ".inverse";

fn inverse_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(INVERSE_SUFFIX);
    PathBuf::from(os)
}

/// Writes the sorted vocabulary; terms must arrive in lexicographic order
pub struct VocabularyWriter {
    out: BufWriter<File>,
    inverse_path: PathBuf,
    offsets: Vec<u64>,
    byte_pos: u64,
}

impl VocabularyWriter {
    pub fn new(path: &Path) -> Result<Self> {
        Ok(Self {
            out: BufWriter::new(File::create(path)?),
            inverse_path: inverse_path(path),
            offsets: Vec::new(),
            byte_pos: 0,
        })
    }

    pub fn insert(&mut self, term: &str) -> Result<()> {
        self.offsets.push(self.byte_pos);
        self.byte_pos += write_vint(&mut self.out, term.len() as u64)?;
        self.out.write_all(term.as_bytes())?;
        self.byte_pos += term.len() as u64;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.out.flush()?;
        let mut out = BufWriter::new(File::create(&self.inverse_path)?);
        for &offset in &self.offsets {
            out.write_u64::<LittleEndian>(offset)?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Memory-mapped view of the sorted vocabulary
pub struct VocabularyMap {
    data: FileBytes,
    offsets: FileBytes,
    num_terms: u64,
}

impl VocabularyMap {
    pub fn open(path: &Path) -> Result<Self> {
        let data = FileBytes::open(path)?;
        let offsets = FileBytes::open(&inverse_path(path))?;
        if offsets.len() % 8 != 0 {
            return Err(Error::Corruption(format!(
                "vocabulary offset file for {} has irregular length {}",
                path.display(),
                offsets.len()
            )));
        }
        let num_terms = (offsets.len() / 8) as u64;
        Ok(Self {
            data,
            offsets,
            num_terms,
        })
    }

    pub fn len(&self) -> u64 {
        self.num_terms
    }

    pub fn is_empty(&self) -> bool {
        self.num_terms == 0
    }

    /// The term whose lexicographic rank is `id`
    pub fn term(&self, id: TermId) -> Result<&str> {
        if id >= self.num_terms {
            return Err(Error::Corruption(format!(
                "term id {id} out of range for vocabulary of {} terms",
                self.num_terms
            )));
        }
        let at = id as usize * 8;
        let offset = LittleEndian::read_u64(&self.offsets.as_slice()[at..at + 8]) as usize;
        let mut slice = &self.data.as_slice()[offset..];
        let (len, _) = read_vint(&mut slice)?;
        std::str::from_utf8(&slice[..len as usize])
            .map_err(|e| Error::Corruption(format!("vocabulary entry {id} is not utf-8: {e}")))
    }

    /// Binary search for a term's id; the file is sorted lexicographically
    pub fn find(&self, term: &str) -> Option<TermId> {
        let mut lo = 0u64;
        let mut hi = self.num_terms;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.term(mid).ok()?.cmp(term) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => return Some(mid),
            }
        }
        None
    }
}
