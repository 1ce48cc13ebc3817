//! The closed set of element types a grid property can be stored as.
//!
//! Every numeric operation on a [`TypedBuffer`](crate::TypedBuffer) is
//! written once as a generic function over [`Element`] and dispatched on
//! [`ElementType`]. Conversions between elements always go through `f64`,
//! which makes `f32 <-> f64` lossy-accepted and int conversions truncate
//! toward zero.

use std::fmt;

use crate::buffer::{BufferMut, BufferRef, TypedBuffer};

/// Storage type of a field's values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// 32-bit signed integer (region numbers, ACTNUM-like properties).
    Int,
    /// 32-bit IEEE float.
    Float,
    /// 64-bit IEEE float.
    Double,
}

impl ElementType {
    /// Width of one element in bytes.
    pub fn size_of(self) -> usize {
        match self {
            Self::Int | Self::Float => 4,
            Self::Double => 8,
        }
    }

    /// Four-character type tag used in restart keyword headers.
    pub fn ecl_tag(self) -> &'static str {
        match self {
            Self::Int => "INTE",
            Self::Float => "REAL",
            Self::Double => "DOUB",
        }
    }

    /// Inverse of [`ecl_tag`](Self::ecl_tag).
    pub fn from_ecl_tag(tag: &str) -> Option<Self> {
        match tag {
            "INTE" => Some(Self::Int),
            "REAL" => Some(Self::Float),
            "DOUB" => Some(Self::Double),
            _ => None,
        }
    }

    /// Type name used in ROFF tag streams.
    pub fn roff_name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Inverse of [`roff_name`](Self::roff_name).
    pub fn from_roff_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            _ => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int32"),
            Self::Float => write!(f, "float32"),
            Self::Double => write!(f, "float64"),
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for i32 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// A numeric element a [`TypedBuffer`] can hold: `i32`, `f32` or `f64`.
///
/// Sealed; the set of element types is closed.
pub trait Element:
    sealed::Sealed + Copy + Default + PartialEq + PartialOrd + fmt::Debug + Send + Sync + 'static
{
    /// The runtime tag for this element.
    const TYPE: ElementType;

    /// Widen to `f64`.
    fn to_f64(self) -> f64;

    /// Narrow from `f64`. Integer targets truncate toward zero.
    fn from_f64(v: f64) -> Self;

    /// Convert to another element type via `f64`.
    fn convert<U: Element>(self) -> U {
        U::from_f64(self.to_f64())
    }

    /// Append the big-endian encoding of `self`.
    fn write_be(self, out: &mut Vec<u8>);

    /// Decode from exactly [`ElementType::size_of`] big-endian bytes.
    fn read_be(bytes: &[u8]) -> Self;

    /// Append the little-endian encoding of `self`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decode from exactly [`ElementType::size_of`] little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;

    /// Parse a value from ASCII text (GRDECL style, `D` exponents accepted).
    fn parse_text(s: &str) -> Option<Self>;

    /// The typed slice behind `buf`, if it holds this element type.
    fn from_ref(buf: BufferRef<'_>) -> Option<&[Self]>;

    /// The typed mutable slice behind `buf`, if it holds this element type.
    fn from_mut(buf: BufferMut<'_>) -> Option<&mut [Self]>;

    /// Tag a slice of values.
    fn wrap_ref(values: &[Self]) -> BufferRef<'_>;

    /// Tag a mutable slice of values.
    fn wrap_mut(values: &mut [Self]) -> BufferMut<'_>;

    /// Wrap a vector of values into a tagged buffer.
    fn into_buffer(values: Vec<Self>) -> TypedBuffer;
}

fn parse_fortran_f64(s: &str) -> Option<f64> {
    match s.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => s.replace(['D', 'd'], "E").parse::<f64>().ok(),
    }
}

impl Element for i32 {
    const TYPE: ElementType = ElementType::Int;

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(v: f64) -> Self {
        v as i32
    }

    fn write_be(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }

    fn read_be(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        i32::from_be_bytes(raw)
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        i32::from_le_bytes(raw)
    }

    fn parse_text(s: &str) -> Option<Self> {
        s.parse::<i32>()
            .ok()
            .or_else(|| parse_fortran_f64(s).map(Self::from_f64))
    }

    fn from_ref(buf: BufferRef<'_>) -> Option<&[Self]> {
        match buf {
            BufferRef::Int(v) => Some(v),
            _ => None,
        }
    }

    fn from_mut(buf: BufferMut<'_>) -> Option<&mut [Self]> {
        match buf {
            BufferMut::Int(v) => Some(v),
            _ => None,
        }
    }

    fn wrap_ref(values: &[Self]) -> BufferRef<'_> {
        BufferRef::Int(values)
    }

    fn wrap_mut(values: &mut [Self]) -> BufferMut<'_> {
        BufferMut::Int(values)
    }

    fn into_buffer(values: Vec<Self>) -> TypedBuffer {
        TypedBuffer::Int(values)
    }
}

impl Element for f32 {
    const TYPE: ElementType = ElementType::Float;

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(v: f64) -> Self {
        v as f32
    }

    fn write_be(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }

    fn read_be(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        f32::from_be_bytes(raw)
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        f32::from_le_bytes(raw)
    }

    fn parse_text(s: &str) -> Option<Self> {
        parse_fortran_f64(s).map(Self::from_f64)
    }

    fn from_ref(buf: BufferRef<'_>) -> Option<&[Self]> {
        match buf {
            BufferRef::Float(v) => Some(v),
            _ => None,
        }
    }

    fn from_mut(buf: BufferMut<'_>) -> Option<&mut [Self]> {
        match buf {
            BufferMut::Float(v) => Some(v),
            _ => None,
        }
    }

    fn wrap_ref(values: &[Self]) -> BufferRef<'_> {
        BufferRef::Float(values)
    }

    fn wrap_mut(values: &mut [Self]) -> BufferMut<'_> {
        BufferMut::Float(values)
    }

    fn into_buffer(values: Vec<Self>) -> TypedBuffer {
        TypedBuffer::Float(values)
    }
}

impl Element for f64 {
    const TYPE: ElementType = ElementType::Double;

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(v: f64) -> Self {
        v
    }

    fn write_be(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }

    fn read_be(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        f64::from_be_bytes(raw)
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        f64::from_le_bytes(raw)
    }

    fn parse_text(s: &str) -> Option<Self> {
        parse_fortran_f64(s)
    }

    fn from_ref(buf: BufferRef<'_>) -> Option<&[Self]> {
        match buf {
            BufferRef::Double(v) => Some(v),
            _ => None,
        }
    }

    fn from_mut(buf: BufferMut<'_>) -> Option<&mut [Self]> {
        match buf {
            BufferMut::Double(v) => Some(v),
            _ => None,
        }
    }

    fn wrap_ref(values: &[Self]) -> BufferRef<'_> {
        BufferRef::Double(values)
    }

    fn wrap_mut(values: &mut [Self]) -> BufferMut<'_> {
        BufferMut::Double(values)
    }

    fn into_buffer(values: Vec<Self>) -> TypedBuffer {
        TypedBuffer::Double(values)
    }
}
