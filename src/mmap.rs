//! Read-only memory-mapped file access.
//!
//! All read-side index files (postings data, offset arrays, the vocabulary
//! map, the metadata sidecar) are opened through this module. The OS manages
//! paging, so indexes larger than RAM stay cheap to open.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::Result;

/// A read-only view of a file's bytes.
///
/// Zero-length files cannot be mapped, so they are represented explicitly;
/// an index over an empty corpus produces several of them.
pub(crate) enum FileBytes {
    Mapped(Mmap),
    Empty,
}

impl FileBytes {
    pub fn open(path: &Path) -> Result<FileBytes> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(FileBytes::Empty);
        }
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(FileBytes::Mapped(mmap))
    }

    pub fn as_slice(&self) -> &[u8] {
        match self {
            FileBytes::Mapped(mmap) => mmap,
            FileBytes::Empty => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }
}
