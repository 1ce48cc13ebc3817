//! Native storage record for node values.
//!
//! ```text
//! [tag i32] [raw_len u64] [compressed_len u64] [zlib(values, little-endian)]
//! ```
//!
//! All integers are little-endian. The tag is the implementation-type code
//! of the node that wrote the record ([`ImplType::Field`] for fields) and
//! is verified on read. The configuration is not stored; the reader
//! supplies the element type and, for fields, the exact size.

use std::io::{self, Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use strata_core::{BufferMut, BufferRef, ElementType, ImplType, TypedBuffer};

use crate::error::FieldError;

// ── Primitive writers ───────────────────────────────────────────

fn write_i32_le(w: &mut dyn Write, v: i32) -> Result<(), FieldError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), FieldError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

fn read_i32_le(r: &mut dyn Read) -> Result<i32, FieldError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_u64_le(r: &mut dyn Read) -> Result<u64, FieldError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_len(r: &mut dyn Read, what: &str) -> Result<usize, FieldError> {
    let len = read_u64_le(r)?;
    usize::try_from(len)
        .ok()
        .filter(|len| *len < usize::MAX)
        .ok_or_else(|| FieldError::Malformed {
            format: "native",
            detail: format!("{what} length {len} does not fit in memory"),
        })
}

// ── Records ─────────────────────────────────────────────────────

/// Write `data` as a compressed record tagged with `tag`.
pub fn write_record(w: &mut dyn Write, tag: ImplType, data: BufferRef<'_>) -> Result<(), FieldError> {
    let raw = data.to_le_bytes();
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    let compressed = encoder.finish()?;
    write_i32_le(w, tag.code())?;
    write_u64_le(w, raw.len() as u64)?;
    write_u64_le(w, compressed.len() as u64)?;
    w.write_all(&compressed)?;
    Ok(())
}

/// Read a record tagged `tag` and return its decompressed bytes.
fn read_payload(r: &mut dyn Read, tag: ImplType) -> Result<Vec<u8>, FieldError> {
    let found = read_i32_le(r)?;
    if found != tag.code() {
        return Err(FieldError::TagMismatch {
            expected: tag.code(),
            found,
        });
    }
    let raw_len = read_len(r, "raw")?;
    let compressed_len = read_len(r, "compressed")?;
    // Buffers grow with the bytes actually present, never with the header.
    let mut compressed = Vec::new();
    r.take(compressed_len as u64).read_to_end(&mut compressed)?;
    if compressed.len() != compressed_len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("record holds {} of {compressed_len} compressed bytes", compressed.len()),
        )
        .into());
    }
    let mut raw = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .take(raw_len as u64 + 1)
        .read_to_end(&mut raw)?;
    if raw.len() != raw_len {
        return Err(FieldError::Malformed {
            format: "native",
            detail: format!("decompressed {} bytes, header says {raw_len}", raw.len()),
        });
    }
    Ok(raw)
}

/// Read a record into `out`, which must match the stored size exactly.
///
/// `key` names the node in size diagnostics.
pub fn read_record_into(
    r: &mut dyn Read,
    tag: ImplType,
    key: &str,
    mut out: BufferMut<'_>,
) -> Result<(), FieldError> {
    let raw = read_payload(r, tag)?;
    let width = out.element_type().size_of();
    if raw.len() != out.len() * width {
        return Err(FieldError::SizeMismatch {
            key: key.to_string(),
            expected: out.len(),
            found: raw.len() / width,
        });
    }
    out.fill_from_le_bytes(&raw)?;
    Ok(())
}

/// Read a record of any length as `element_type` values.
pub fn read_record(
    r: &mut dyn Read,
    tag: ImplType,
    element_type: ElementType,
) -> Result<TypedBuffer, FieldError> {
    let raw = read_payload(r, tag)?;
    Ok(TypedBuffer::from_le_bytes(element_type, &raw)?)
}
