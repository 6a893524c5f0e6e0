//! Packed postings records, files, chunks, and the uninversion transposer.

mod chunk;
mod file;
mod inverter;
mod record;

pub use chunk::{multiway_merge, ChunkReader};
pub use file::{PostingsFileReader, PostingsFileWriter, PostingsStream};
pub use inverter::PostingsInverter;
pub use record::{PostingsRecord, Weight};

use std::io::{self, Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

/// Write a variable-length integer (1-10 bytes), returning the byte count
pub(crate) fn write_vint<W: Write>(writer: &mut W, mut value: u64) -> io::Result<u64> {
    let mut written = 1;
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            writer.write_u8(byte)?;
            return Ok(written);
        }
        writer.write_u8(byte | 0x80)?;
        written += 1;
    }
}

/// Read a variable-length integer, returning the value and the byte count
pub(crate) fn read_vint<R: Read>(reader: &mut R) -> io::Result<(u64, u64)> {
    read_vint_from(reader.read_u8()?, reader)
}

/// Continue a varint whose first byte has already been consumed.
///
/// Record decoding peeks one byte to distinguish clean EOF from a truncated
/// stream, then resumes here.
pub(crate) fn read_vint_from<R: Read>(first: u8, reader: &mut R) -> io::Result<(u64, u64)> {
    let mut result = (first & 0x7F) as u64;
    let mut read = 1u64;
    let mut byte = first;
    let mut shift = 7;

    while byte & 0x80 != 0 {
        byte = reader.read_u8()?;
        read += 1;
        if shift >= 64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "varint too long",
            ));
        }
        result |= ((byte & 0x7F) as u64) << shift;
        shift += 7;
    }

    Ok((result, read))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vint_roundtrip() {
        for value in [0u64, 1, 127, 128, 300, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
            let mut buf = Vec::new();
            let written = write_vint(&mut buf, value).unwrap();
            assert_eq!(written as usize, buf.len());

            let (read, consumed) = read_vint(&mut buf.as_slice()).unwrap();
            assert_eq!(read, value);
            assert_eq!(consumed, written);
        }
    }

    #[test]
    fn test_vint_single_byte_boundary() {
        let mut buf = Vec::new();
        write_vint(&mut buf, 127).unwrap();
        assert_eq!(buf, vec![0x7F]);

        buf.clear();
        write_vint(&mut buf, 128).unwrap();
        assert_eq!(buf, vec![0x80, 0x01]);
    }

    #[test]
    fn test_vint_truncated_stream() {
        // continuation bit set but no following byte
        let buf = vec![0x80u8];
        assert!(read_vint(&mut buf.as_slice()).is_err());
    }
}
