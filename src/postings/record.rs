//! Packed postings record: one document's (term, weight) vector.
//!
//! Wire format, shared by chunk files and final postings files:
//! `[varint primary_key][varint N][N x (varint term_id, weight)]`.
//! The encoding is self-delimiting; readers report the number of bytes
//! consumed so byte-oriented merge progress can be tracked.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{read_vint, read_vint_from, write_vint};
use crate::{DocId, TermId};

/// Weight codec for packed records.
///
/// Worker chunks and final postings files carry `f64` weights; the
/// uninverter's uncompressed intermediate carries integer counts, which the
/// compression pass widens to `f64`.
pub trait Weight: Copy + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    fn write<W: Write>(self, writer: &mut W) -> io::Result<u64>;
    fn read<R: Read>(reader: &mut R) -> io::Result<(Self, u64)>;
}

impl Weight for f64 {
    fn write<W: Write>(self, writer: &mut W) -> io::Result<u64> {
        writer.write_f64::<LittleEndian>(self)?;
        Ok(8)
    }

    fn read<R: Read>(reader: &mut R) -> io::Result<(Self, u64)> {
        Ok((reader.read_f64::<LittleEndian>()?, 8))
    }
}

impl Weight for u64 {
    fn write<W: Write>(self, writer: &mut W) -> io::Result<u64> {
        write_vint(writer, self)
    }

    fn read<R: Read>(reader: &mut R) -> io::Result<(Self, u64)> {
        read_vint(reader)
    }
}

/// A document's postings: its primary key and (term, weight) counts.
///
/// Within one record the term ids are distinct. Count order is whatever the
/// producer emitted; the merge and the libsvm parser canonicalize final
/// records to ascending term-id order.
#[derive(Debug, Clone, PartialEq)]
pub struct PostingsRecord<W = f64> {
    primary_key: DocId,
    counts: Vec<(TermId, W)>,
}

impl<W: Weight> PostingsRecord<W> {
    /// An empty record (a document that produced no terms)
    pub fn new(primary_key: DocId) -> Self {
        Self {
            primary_key,
            counts: Vec::new(),
        }
    }

    pub fn with_counts(primary_key: DocId, counts: Vec<(TermId, W)>) -> Self {
        Self {
            primary_key,
            counts,
        }
    }

    pub fn primary_key(&self) -> DocId {
        self.primary_key
    }

    pub fn counts(&self) -> &[(TermId, W)] {
        &self.counts
    }

    pub fn into_counts(self) -> Vec<(TermId, W)> {
        self.counts
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn set_counts(&mut self, counts: Vec<(TermId, W)>) {
        self.counts = counts;
    }

    /// Append counts from another producer of the same primary key
    pub fn extend_counts(&mut self, counts: impl IntoIterator<Item = (TermId, W)>) {
        self.counts.extend(counts);
    }

    /// Write the packed form, returning the number of bytes written
    pub fn write_packed<Wr: Write>(&self, writer: &mut Wr) -> io::Result<u64> {
        let mut written = write_vint(writer, self.primary_key)?;
        written += write_vint(writer, self.counts.len() as u64)?;
        for &(term, weight) in &self.counts {
            written += write_vint(writer, term)?;
            written += weight.write(writer)?;
        }
        Ok(written)
    }

    /// Read one packed record.
    ///
    /// Returns `Ok(None)` at clean EOF; otherwise the record and the number
    /// of bytes consumed. EOF in the middle of a record is an error.
    pub fn read_packed<R: Read>(reader: &mut R) -> io::Result<Option<(Self, u64)>> {
        let first = match reader.read_u8() {
            Ok(byte) => byte,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        };

        let (primary_key, mut read) = read_vint_from(first, reader)?;
        let (num_counts, n) = read_vint(reader)?;
        read += n;

        let mut counts = Vec::with_capacity(num_counts as usize);
        for _ in 0..num_counts {
            let (term, n) = read_vint(reader)?;
            read += n;
            let (weight, n) = W::read(reader)?;
            read += n;
            counts.push((term, weight));
        }

        Ok(Some((
            Self {
                primary_key,
                counts,
            },
            read,
        )))
    }
}
