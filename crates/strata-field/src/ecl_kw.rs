//! Binary restart keyword files.
//!
//! A keyword is a sequence of Fortran unformatted records, all integers
//! big-endian:
//!
//! ```text
//! [16] [name: 8 bytes, space padded] [count i32] [type: 4 bytes] [16]
//! [n*w] [up to 1000 values] [n*w]
//! ...
//! ```
//!
//! Each record is framed by its byte length before and after.

use std::io::{self, Read, Write};

use strata_core::{BufferRef, Element, ElementType, TypedBuffer};
use tracing::warn;

use crate::error::FieldError;

/// Byte length of a keyword header record.
pub const HEADER_LEN: usize = 16;

/// Maximum significant characters in a keyword name.
pub const NAME_LEN: usize = 8;

/// Values per data record.
pub const BLOCK_SIZE: usize = 1000;

/// Largest record a well-formed file holds: one block of eight-byte values.
const MAX_RECORD_LEN: usize = BLOCK_SIZE * 8;

/// One keyword read from a file.
#[derive(Clone, Debug, PartialEq)]
pub struct EclKeyword {
    /// Keyword name with trailing padding removed.
    pub name: String,
    /// Values.
    pub data: TypedBuffer,
}

/// Pad or cut a keyword name to exactly [`NAME_LEN`] bytes.
fn padded_name(name: &str) -> [u8; NAME_LEN] {
    if name.len() > NAME_LEN {
        warn!(keyword = name, "keyword name longer than {NAME_LEN} characters, truncating");
    }
    let mut out = [b' '; NAME_LEN];
    for (slot, b) in out.iter_mut().zip(name.bytes()) {
        *slot = b;
    }
    out
}

// ── Writer ──────────────────────────────────────────────────────

/// Sequential keyword writer.
///
/// Generic over `W: Write` so a restart stream owned by the caller can be
/// passed as `&mut dyn Write`.
///
/// # Examples
///
/// ```
/// use strata_core::TypedBuffer;
/// use strata_field::ecl_kw::{EclKwReader, EclKwWriter};
///
/// let poro = TypedBuffer::Float(vec![0.25; 1500]);
/// let mut writer = EclKwWriter::new(Vec::new());
/// writer.write_keyword("PORO", poro.view()).unwrap();
/// let bytes = writer.into_inner();
///
/// let mut reader = EclKwReader::new(bytes.as_slice());
/// let kw = reader.find_keyword("PORO").unwrap().unwrap();
/// assert_eq!(kw.data, poro);
/// ```
pub struct EclKwWriter<W: Write> {
    inner: W,
}

impl<W: Write> EclKwWriter<W> {
    /// Wrap a byte sink.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Append one keyword.
    pub fn write_keyword(&mut self, name: &str, data: BufferRef<'_>) -> Result<(), FieldError> {
        let mut header = Vec::with_capacity(HEADER_LEN);
        header.extend_from_slice(&padded_name(name));
        header.extend_from_slice(&(data.len() as i32).to_be_bytes());
        header.extend_from_slice(data.element_type().ecl_tag().as_bytes());
        self.write_record(&header)?;
        match data {
            BufferRef::Int(v) => self.write_blocks(v),
            BufferRef::Float(v) => self.write_blocks(v),
            BufferRef::Double(v) => self.write_blocks(v),
        }
    }

    fn write_blocks<T: Element>(&mut self, values: &[T]) -> Result<(), FieldError> {
        let mut payload = Vec::with_capacity(BLOCK_SIZE * T::TYPE.size_of());
        for block in values.chunks(BLOCK_SIZE) {
            payload.clear();
            for v in block {
                v.write_be(&mut payload);
            }
            self.write_record(&payload)?;
        }
        Ok(())
    }

    fn write_record(&mut self, payload: &[u8]) -> Result<(), FieldError> {
        let marker = (payload.len() as i32).to_be_bytes();
        self.inner.write_all(&marker)?;
        self.inner.write_all(payload)?;
        self.inner.write_all(&marker)?;
        Ok(())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<(), FieldError> {
        self.inner.flush()?;
        Ok(())
    }

    /// Recover the sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

// ── Reader ──────────────────────────────────────────────────────

/// Sequential keyword reader.
pub struct EclKwReader<R: Read> {
    inner: R,
}

impl<R: Read> EclKwReader<R> {
    /// Wrap a byte source.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read the next keyword, or `None` at a clean end of file.
    pub fn read_keyword(&mut self) -> Result<Option<EclKeyword>, FieldError> {
        let Some(header) = self.read_record()? else {
            return Ok(None);
        };
        if header.len() != HEADER_LEN {
            return Err(malformed(format!(
                "header record of {} bytes, expected {HEADER_LEN}",
                header.len()
            )));
        }
        let name = String::from_utf8_lossy(&header[..NAME_LEN]).trim_end().to_string();
        let mut count = [0u8; 4];
        count.copy_from_slice(&header[8..12]);
        let count = i32::from_be_bytes(count);
        let count = usize::try_from(count).map_err(|_| malformed(format!("{name}: negative element count {count}")))?;
        let tag = String::from_utf8_lossy(&header[12..16]).to_string();
        let element_type = ElementType::from_ecl_tag(&tag)
            .ok_or_else(|| malformed(format!("{name}: unsupported element type {tag:?}")))?;
        let data = match element_type {
            ElementType::Int => TypedBuffer::Int(self.read_blocks(&name, count)?),
            ElementType::Float => TypedBuffer::Float(self.read_blocks(&name, count)?),
            ElementType::Double => TypedBuffer::Double(self.read_blocks(&name, count)?),
        };
        Ok(Some(EclKeyword { name, data }))
    }

    /// Skip forward to the first keyword called `name` and read it.
    pub fn find_keyword(&mut self, name: &str) -> Result<Option<EclKeyword>, FieldError> {
        while let Some(kw) = self.read_keyword()? {
            if kw.name == name.trim_end() {
                return Ok(Some(kw));
            }
        }
        Ok(None)
    }

    fn read_blocks<T: Element>(&mut self, name: &str, count: usize) -> Result<Vec<T>, FieldError> {
        let width = T::TYPE.size_of();
        let mut values = Vec::with_capacity(count.min(BLOCK_SIZE));
        while values.len() < count {
            let record = self
                .read_record()?
                .ok_or_else(|| malformed(format!("{name}: file ends inside keyword data")))?;
            if record.len() % width != 0 || values.len() + record.len() / width > count {
                return Err(malformed(format!("{name}: data record of {} bytes does not fit", record.len())));
            }
            values.extend(record.chunks_exact(width).map(T::read_be));
        }
        Ok(values)
    }

    fn read_record(&mut self) -> Result<Option<Vec<u8>>, FieldError> {
        let mut marker = [0u8; 4];
        if !read_exact_or_eof(&mut self.inner, &mut marker)? {
            return Ok(None);
        }
        let len = i32::from_be_bytes(marker);
        let len = usize::try_from(len).map_err(|_| malformed(format!("negative record length {len}")))?;
        if len > MAX_RECORD_LEN {
            return Err(malformed(format!("record length {len} exceeds {MAX_RECORD_LEN}")));
        }
        let mut payload = vec![0u8; len];
        self.inner.read_exact(&mut payload)?;
        let mut tail = [0u8; 4];
        self.inner.read_exact(&mut tail)?;
        if tail != marker {
            return Err(malformed("record head and tail markers differ".to_string()));
        }
        Ok(Some(payload))
    }
}

fn malformed(detail: String) -> FieldError {
    FieldError::Malformed {
        format: "restart keyword",
        detail,
    }
}

/// Fill `buf` completely, or return `false` if the source is already at
/// end of file. A partial read is an error.
fn read_exact_or_eof(r: &mut impl Read, buf: &mut [u8]) -> Result<bool, FieldError> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => return Err(FieldError::Io(io::ErrorKind::UnexpectedEof.into())),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let mut w = EclKwWriter::new(Vec::new());
        w.write_keyword("SWAT", TypedBuffer::Double(vec![0.5]).view()).unwrap();
        let bytes = w.into_inner();
        assert_eq!(&bytes[..4], &16i32.to_be_bytes());
        assert_eq!(&bytes[4..12], b"SWAT    ");
        assert_eq!(&bytes[12..16], &1i32.to_be_bytes());
        assert_eq!(&bytes[16..20], b"DOUB");
        assert_eq!(&bytes[20..24], &16i32.to_be_bytes());
        assert_eq!(&bytes[24..28], &8i32.to_be_bytes());
        assert_eq!(&bytes[28..36], &0.5f64.to_be_bytes());
    }

    #[test]
    fn data_is_split_in_blocks() {
        let mut w = EclKwWriter::new(Vec::new());
        w.write_keyword("ACTNUM", TypedBuffer::Int(vec![1; 2500]).view()).unwrap();
        let bytes = w.into_inner();
        // header + 3 data records, each framed by 8 marker bytes
        assert_eq!(bytes.len(), (16 + 8) + (2500 * 4 + 3 * 8));
    }

    #[test]
    fn find_skips_other_keywords() {
        let mut w = EclKwWriter::new(Vec::new());
        w.write_keyword("PRESSURE", TypedBuffer::Float(vec![200.0; 3]).view()).unwrap();
        w.write_keyword("SWAT", TypedBuffer::Float(vec![0.2; 3]).view()).unwrap();
        let bytes = w.into_inner();

        let mut r = EclKwReader::new(bytes.as_slice());
        let kw = r.find_keyword("SWAT").unwrap().unwrap();
        assert_eq!(kw.name, "SWAT");
        assert_eq!(kw.data, TypedBuffer::Float(vec![0.2; 3]));
        assert!(r.read_keyword().unwrap().is_none());

        let mut r = EclKwReader::new(bytes.as_slice());
        assert!(r.find_keyword("SGAS").unwrap().is_none());
    }

    #[test]
    fn long_names_are_cut() {
        assert_eq!(&padded_name("PERMEABILITY"), b"PERMEABI");
    }

    #[test]
    fn corrupt_marker_is_malformed() {
        let mut w = EclKwWriter::new(Vec::new());
        w.write_keyword("PORO", TypedBuffer::Float(vec![0.1; 2]).view()).unwrap();
        let mut bytes = w.into_inner();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let err = EclKwReader::new(bytes.as_slice()).read_keyword().unwrap_err();
        assert!(matches!(err, FieldError::Malformed { .. }));
    }

    #[test]
    fn truncated_file_is_an_error() {
        let mut w = EclKwWriter::new(Vec::new());
        w.write_keyword("PORO", TypedBuffer::Float(vec![0.1; 2]).view()).unwrap();
        let bytes = w.into_inner();
        let err = EclKwReader::new(&bytes[..bytes.len() - 6]).read_keyword().unwrap_err();
        assert!(matches!(err, FieldError::Io(_)));
    }

    #[test]
    fn oversized_record_length_is_malformed() {
        let mut bytes = i32::MAX.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; 32]);
        let err = EclKwReader::new(bytes.as_slice()).read_keyword().unwrap_err();
        assert!(matches!(err, FieldError::Malformed { .. }));
    }

    #[test]
    fn huge_element_count_on_short_data_is_an_error() {
        let mut header = Vec::new();
        header.extend_from_slice(b"PORO    ");
        header.extend_from_slice(&i32::MAX.to_be_bytes());
        header.extend_from_slice(b"DOUB");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&16i32.to_be_bytes());
        bytes.extend_from_slice(&header);
        bytes.extend_from_slice(&16i32.to_be_bytes());
        let err = EclKwReader::new(bytes.as_slice()).read_keyword().unwrap_err();
        assert!(matches!(err, FieldError::Malformed { .. }));
    }
}
