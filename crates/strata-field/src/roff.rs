//! ROFF binary tag streams.
//!
//! A file is the magic `roff-bin\0`, optional `#comment#\0` strings, then a
//! sequence of tags:
//!
//! ```text
//! tag\0 <tag name>\0
//!   <type>\0 <key name>\0 <value>
//!   array\0 <type>\0 <key name>\0 <count i32> <values>
//!   ...
//! endtag\0
//! ```
//!
//! Strings are NUL-terminated. Numbers use the byte order announced by the
//! `filedata.byteswaptest` key, which is `1` in the writer's native order;
//! this writer always emits little-endian.

use std::io::{self, Read, Write};

use strata_core::{BufferRef, Element, ElementType, TypedBuffer};
use strata_grid::Dims;

use crate::error::FieldError;

/// First bytes of every binary ROFF file.
pub const BINARY_MAGIC: &[u8] = b"roff-bin";

const END_TAG: &str = "endtag";

/// Value of a single tag key.
#[derive(Clone, Debug, PartialEq)]
pub enum RoffValue {
    /// Scalar int.
    Int(i32),
    /// Scalar float.
    Float(f32),
    /// Scalar double.
    Double(f64),
    /// Scalar string.
    Char(String),
    /// Scalar byte or bool.
    Byte(u8),
    /// Numeric array.
    Array(TypedBuffer),
    /// String array.
    CharArray(Vec<String>),
    /// Byte or bool array.
    ByteArray(Vec<u8>),
}

/// A named key inside a tag.
#[derive(Clone, Debug, PartialEq)]
pub struct RoffKey {
    /// Key name.
    pub name: String,
    /// Key value.
    pub value: RoffValue,
}

/// One `tag ... endtag` block.
#[derive(Clone, Debug, PartialEq)]
pub struct RoffTag {
    /// Tag name (`filedata`, `dimensions`, `parameter`, ...).
    pub name: String,
    /// Keys in file order.
    pub keys: Vec<RoffKey>,
}

impl RoffTag {
    /// First key called `name`.
    pub fn key(&self, name: &str) -> Option<&RoffValue> {
        self.keys.iter().find(|k| k.name == name).map(|k| &k.value)
    }
}

// ── Writer ──────────────────────────────────────────────────────

/// Sequential ROFF writer.
pub struct RoffWriter<W: Write> {
    inner: W,
}

impl<W: Write> RoffWriter<W> {
    /// Write the file header and the `filedata` and `version` tags.
    pub fn new(inner: W, filetype: &str) -> Result<Self, FieldError> {
        let mut w = Self { inner };
        w.inner.write_all(BINARY_MAGIC)?;
        w.inner.write_all(b"\0")?;
        w.string("#ROFF file#")?;
        w.string(&format!("#Creator: strata {}#", env!("CARGO_PKG_VERSION")))?;
        w.begin("filedata")?;
        w.scalar_int("byteswaptest", 1)?;
        w.scalar_char("filetype", filetype)?;
        w.end()?;
        w.begin("version")?;
        w.scalar_int("major", 2)?;
        w.scalar_int("minor", 0)?;
        w.end()?;
        Ok(w)
    }

    /// Write the `dimensions` tag.
    pub fn write_dimensions(&mut self, dims: Dims) -> Result<(), FieldError> {
        self.begin("dimensions")?;
        self.scalar_int("nX", dims.nx as i32)?;
        self.scalar_int("nY", dims.ny as i32)?;
        self.scalar_int("nZ", dims.nz as i32)?;
        self.end()
    }

    /// Write a `parameter` tag carrying `data` under `name`.
    pub fn write_parameter(&mut self, name: &str, data: BufferRef<'_>) -> Result<(), FieldError> {
        self.begin("parameter")?;
        self.scalar_char("name", name)?;
        self.string("array")?;
        self.string(data.element_type().roff_name())?;
        self.string("data")?;
        self.inner.write_all(&(data.len() as i32).to_le_bytes())?;
        self.inner.write_all(&data.to_le_bytes())?;
        self.end()
    }

    /// Write the `eof` tag and return the sink.
    pub fn finish(mut self) -> Result<W, FieldError> {
        self.begin("eof")?;
        self.end()?;
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn string(&mut self, s: &str) -> Result<(), FieldError> {
        self.inner.write_all(s.as_bytes())?;
        self.inner.write_all(b"\0")?;
        Ok(())
    }

    fn begin(&mut self, tag: &str) -> Result<(), FieldError> {
        self.string("tag")?;
        self.string(tag)
    }

    fn end(&mut self) -> Result<(), FieldError> {
        self.string(END_TAG)
    }

    fn scalar_int(&mut self, name: &str, v: i32) -> Result<(), FieldError> {
        self.string("int")?;
        self.string(name)?;
        self.inner.write_all(&v.to_le_bytes())?;
        Ok(())
    }

    fn scalar_char(&mut self, name: &str, v: &str) -> Result<(), FieldError> {
        self.string("char")?;
        self.string(name)?;
        self.string(v)
    }
}

// ── Reader ──────────────────────────────────────────────────────

struct RoffReader<'r> {
    inner: &'r mut dyn Read,
    big_endian: bool,
}

/// Read every tag of a binary ROFF stream.
pub fn read_roff(r: &mut dyn Read) -> Result<Vec<RoffTag>, FieldError> {
    let mut reader = RoffReader {
        inner: r,
        big_endian: false,
    };
    let magic = reader.string()?;
    if magic.as_bytes() != BINARY_MAGIC {
        return Err(malformed(format!("bad magic {magic:?}")));
    }
    let mut tags = Vec::new();
    loop {
        let word = reader.string()?;
        if word.starts_with('#') {
            continue;
        }
        if word != "tag" {
            return Err(malformed(format!("expected 'tag', found {word:?}")));
        }
        let tag = reader.tag()?;
        let done = tag.name == "eof";
        if tag.name == "filedata" {
            if let Some(RoffValue::Int(test)) = tag.key("byteswaptest") {
                if *test != 1 {
                    return Err(malformed(format!("byteswaptest {test} after byte order detection")));
                }
            }
        }
        tags.push(tag);
        if done {
            break;
        }
    }
    Ok(tags)
}

/// Dimensions announced by the `dimensions` tag.
pub fn dimensions(tags: &[RoffTag]) -> Option<Dims> {
    let tag = tags.iter().find(|t| t.name == "dimensions")?;
    let get = |name: &str| match tag.key(name) {
        Some(RoffValue::Int(v)) => usize::try_from(*v).ok(),
        _ => None,
    };
    Some(Dims::new(get("nX")?, get("nY")?, get("nZ")?))
}

/// The `data` array of the `parameter` tag called `name`.
pub fn parameter<'t>(tags: &'t [RoffTag], name: &str) -> Option<&'t TypedBuffer> {
    tags.iter()
        .filter(|t| t.name == "parameter")
        .find(|t| matches!(t.key("name"), Some(RoffValue::Char(n)) if n == name))
        .and_then(|t| match t.key("data") {
            Some(RoffValue::Array(data)) => Some(data),
            _ => None,
        })
}

impl RoffReader<'_> {
    fn tag(&mut self) -> Result<RoffTag, FieldError> {
        let name = self.string()?;
        let mut keys = Vec::new();
        loop {
            let kind = self.string()?;
            if kind == END_TAG {
                break;
            }
            let key = if kind == "array" {
                let elem = self.string()?;
                let key_name = self.string()?;
                let count = self.count()?;
                RoffKey {
                    name: key_name,
                    value: self.array(&elem, count)?,
                }
            } else {
                let key_name = self.string()?;
                // The first scalar of the file decides the byte order.
                if name == "filedata" && key_name == "byteswaptest" && kind == "int" {
                    let raw = self.bytes(4)?;
                    let mut b = [0u8; 4];
                    b.copy_from_slice(&raw);
                    self.big_endian = i32::from_le_bytes(b) != 1;
                    RoffKey {
                        name: key_name,
                        value: RoffValue::Int(self.decode::<i32>(&raw)),
                    }
                } else {
                    RoffKey {
                        name: key_name,
                        value: self.scalar(&kind)?,
                    }
                }
            };
            keys.push(key);
        }
        Ok(RoffTag { name, keys })
    }

    fn scalar(&mut self, kind: &str) -> Result<RoffValue, FieldError> {
        Ok(match kind {
            "int" => RoffValue::Int(self.number::<i32>()?),
            "float" => RoffValue::Float(self.number::<f32>()?),
            "double" => RoffValue::Double(self.number::<f64>()?),
            "char" => RoffValue::Char(self.string()?),
            "byte" | "bool" => RoffValue::Byte(self.bytes(1)?[0]),
            other => return Err(malformed(format!("unknown key type {other:?}"))),
        })
    }

    fn array(&mut self, elem: &str, count: usize) -> Result<RoffValue, FieldError> {
        if let Some(element_type) = ElementType::from_roff_name(elem) {
            let len = count
                .checked_mul(element_type.size_of())
                .ok_or_else(|| malformed(format!("array length {count} overflows")))?;
            let raw = self.bytes(len)?;
            return Ok(RoffValue::Array(match element_type {
                ElementType::Int => TypedBuffer::Int(self.decode_all(&raw)),
                ElementType::Float => TypedBuffer::Float(self.decode_all(&raw)),
                ElementType::Double => TypedBuffer::Double(self.decode_all(&raw)),
            }));
        }
        match elem {
            "char" => {
                let mut out = Vec::new();
                for _ in 0..count {
                    out.push(self.string()?);
                }
                Ok(RoffValue::CharArray(out))
            }
            "byte" | "bool" => Ok(RoffValue::ByteArray(self.bytes(count)?)),
            other => Err(malformed(format!("unknown array type {other:?}"))),
        }
    }

    fn count(&mut self) -> Result<usize, FieldError> {
        let n = self.number::<i32>()?;
        usize::try_from(n).map_err(|_| malformed(format!("negative array length {n}")))
    }

    fn number<T: Element>(&mut self) -> Result<T, FieldError> {
        let raw = self.bytes(T::TYPE.size_of())?;
        Ok(self.decode(&raw))
    }

    fn decode<T: Element>(&self, raw: &[u8]) -> T {
        if self.big_endian {
            T::read_be(raw)
        } else {
            T::read_le(raw)
        }
    }

    fn decode_all<T: Element>(&self, raw: &[u8]) -> Vec<T> {
        raw.chunks_exact(T::TYPE.size_of())
            .map(|c| self.decode(c))
            .collect()
    }

    /// Read exactly `n` bytes. The buffer grows with the stream, so a
    /// corrupt count on a short file fails without a large allocation.
    fn bytes(&mut self, n: usize) -> Result<Vec<u8>, FieldError> {
        let mut buf = Vec::new();
        (&mut *self.inner).take(n as u64).read_to_end(&mut buf)?;
        if buf.len() != n {
            return Err(FieldError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream ends after {} of {n} bytes", buf.len()),
            )));
        }
        Ok(buf)
    }

    fn string(&mut self) -> Result<String, FieldError> {
        let mut out = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            self.inner.read_exact(&mut byte)?;
            if byte[0] == 0 {
                break;
            }
            out.push(byte[0]);
        }
        String::from_utf8(out).map_err(|e| malformed(format!("invalid UTF-8 string: {e}")))
    }
}

fn malformed(detail: String) -> FieldError {
    FieldError::Malformed {
        format: "ROFF",
        detail,
    }
}
