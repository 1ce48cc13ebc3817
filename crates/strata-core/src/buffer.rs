//! Type-tagged value storage for one grid property.
//!
//! [`TypedBuffer`] owns the values; [`BufferRef`] and [`BufferMut`] are the
//! borrowed forms used both for owned storage and for caller-supplied
//! memory. All numeric operations live on [`BufferMut`] so they work the
//! same way regardless of who owns the bytes.

use crate::element::{Element, ElementType};
use crate::error::BufferError;

// ── Truncation ──────────────────────────────────────────────────

/// Optional min/max clamping applied at export time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Truncation {
    /// Values below this bound are raised to it.
    pub min: Option<f64>,
    /// Values above this bound are lowered to it.
    pub max: Option<f64>,
}

impl Truncation {
    /// No clamping.
    pub const NONE: Self = Self {
        min: None,
        max: None,
    };

    /// Bit encoding: `1` for MIN, `2` for MAX, `0` for none.
    pub fn mode_bits(&self) -> u32 {
        let mut bits = 0;
        if self.min.is_some() {
            bits |= 1;
        }
        if self.max.is_some() {
            bits |= 2;
        }
        bits
    }

    /// Whether any bound is set.
    pub fn is_active(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    /// Clamp a single value.
    pub fn clamp(&self, v: f64) -> f64 {
        let mut out = v;
        if let Some(min) = self.min {
            if out < min {
                out = min;
            }
        }
        if let Some(max) = self.max {
            if out > max {
                out = max;
            }
        }
        out
    }
}

// ── Owned buffer ────────────────────────────────────────────────

/// Dense array of one element type.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedBuffer {
    /// int32 values.
    Int(Vec<i32>),
    /// float32 values.
    Float(Vec<f32>),
    /// float64 values.
    Double(Vec<f64>),
}

impl TypedBuffer {
    /// A zero-filled buffer of `len` elements.
    pub fn zeroed(element_type: ElementType, len: usize) -> Self {
        match element_type {
            ElementType::Int => Self::Int(vec![0; len]),
            ElementType::Float => Self::Float(vec![0.0; len]),
            ElementType::Double => Self::Double(vec![0.0; len]),
        }
    }

    /// Wrap a vector of values.
    pub fn from_values<T: Element>(values: Vec<T>) -> Self {
        T::into_buffer(values)
    }

    /// Element type tag.
    pub fn element_type(&self) -> ElementType {
        self.view().element_type()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.view().len()
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the values in bytes.
    pub fn byte_size(&self) -> usize {
        self.len() * self.element_type().size_of()
    }

    /// Borrow the values.
    pub fn view(&self) -> BufferRef<'_> {
        match self {
            Self::Int(v) => BufferRef::Int(v),
            Self::Float(v) => BufferRef::Float(v),
            Self::Double(v) => BufferRef::Double(v),
        }
    }

    /// Mutably borrow the values.
    pub fn view_mut(&mut self) -> BufferMut<'_> {
        match self {
            Self::Int(v) => BufferMut::Int(v),
            Self::Float(v) => BufferMut::Float(v),
            Self::Double(v) => BufferMut::Double(v),
        }
    }

    /// Typed access; `None` if `T` is not the stored element type.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::from_ref(self.view())
    }

    /// Decode `bytes` (little-endian) as `element_type` values.
    pub fn from_le_bytes(element_type: ElementType, bytes: &[u8]) -> Result<Self, BufferError> {
        let width = element_type.size_of();
        if bytes.len() % width != 0 {
            return Err(BufferError::LengthMismatch {
                expected: bytes.len() / width * width,
                found: bytes.len(),
            });
        }
        Ok(match element_type {
            ElementType::Int => Self::Int(decode_le(bytes)),
            ElementType::Float => Self::Float(decode_le(bytes)),
            ElementType::Double => Self::Double(decode_le(bytes)),
        })
    }
}

fn decode_le<T: Element>(bytes: &[u8]) -> Vec<T> {
    bytes
        .chunks_exact(T::TYPE.size_of())
        .map(T::read_le)
        .collect()
}

// ── Borrowed forms ──────────────────────────────────────────────

/// Shared view of typed values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BufferRef<'a> {
    /// int32 values.
    Int(&'a [i32]),
    /// float32 values.
    Float(&'a [f32]),
    /// float64 values.
    Double(&'a [f64]),
}

impl<'a> BufferRef<'a> {
    /// Element type tag.
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Int(_) => ElementType::Int,
            Self::Float(_) => ElementType::Float,
            Self::Double(_) => ElementType::Double,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
        }
    }

    /// Whether the view holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Typed access; `None` if `T` is not the stored element type.
    pub fn as_slice<T: Element>(self) -> Option<&'a [T]> {
        T::from_ref(self)
    }

    /// Read one element widened to `f64`.
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match self {
            Self::Int(v) => v.get(index).map(|x| x.to_f64()),
            Self::Float(v) => v.get(index).map(|x| x.to_f64()),
            Self::Double(v) => v.get(index).copied(),
        }
    }

    /// Copy into an owned buffer.
    pub fn to_buffer(&self) -> TypedBuffer {
        match self {
            Self::Int(v) => TypedBuffer::Int(v.to_vec()),
            Self::Float(v) => TypedBuffer::Float(v.to_vec()),
            Self::Double(v) => TypedBuffer::Double(v.to_vec()),
        }
    }

    /// Copy into an owned buffer of another element type.
    pub fn convert(&self, target: ElementType) -> TypedBuffer {
        match target {
            ElementType::Int => TypedBuffer::Int(self.convert_to()),
            ElementType::Float => TypedBuffer::Float(self.convert_to()),
            ElementType::Double => TypedBuffer::Double(self.convert_to()),
        }
    }

    /// Convert every element to `T`.
    pub fn convert_to<T: Element>(&self) -> Vec<T> {
        match self {
            Self::Int(v) => v.iter().map(|x| x.convert()).collect(),
            Self::Float(v) => v.iter().map(|x| x.convert()).collect(),
            Self::Double(v) => v.iter().map(|x| x.convert()).collect(),
        }
    }

    /// Little-endian byte image of the values.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len() * self.element_type().size_of());
        match self {
            Self::Int(v) => v.iter().for_each(|x| x.write_le(&mut out)),
            Self::Float(v) => v.iter().for_each(|x| x.write_le(&mut out)),
            Self::Double(v) => v.iter().for_each(|x| x.write_le(&mut out)),
        }
        out
    }
}

/// Exclusive view of typed values, owned or caller-supplied.
#[derive(Debug, PartialEq)]
pub enum BufferMut<'a> {
    /// int32 values.
    Int(&'a mut [i32]),
    /// float32 values.
    Float(&'a mut [f32]),
    /// float64 values.
    Double(&'a mut [f64]),
}

impl BufferMut<'_> {
    /// Element type tag.
    pub fn element_type(&self) -> ElementType {
        self.view().element_type()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.view().len()
    }

    /// Whether the view holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shared view of the same values.
    pub fn view(&self) -> BufferRef<'_> {
        match self {
            Self::Int(v) => BufferRef::Int(v),
            Self::Float(v) => BufferRef::Float(v),
            Self::Double(v) => BufferRef::Double(v),
        }
    }

    /// Shorter-lived exclusive view of the same values.
    pub fn reborrow(&mut self) -> BufferMut<'_> {
        match self {
            Self::Int(v) => BufferMut::Int(v),
            Self::Float(v) => BufferMut::Float(v),
            Self::Double(v) => BufferMut::Double(v),
        }
    }

    /// Zero every element.
    pub fn clear(&mut self) {
        match self {
            Self::Int(v) => v.fill(0),
            Self::Float(v) => v.fill(0.0),
            Self::Double(v) => v.fill(0.0),
        }
    }

    /// Overwrite with `src`, which must have the same type and length.
    pub fn copy_from(&mut self, src: BufferRef<'_>) -> Result<(), BufferError> {
        if src.len() != self.len() {
            return Err(BufferError::LengthMismatch {
                expected: self.len(),
                found: src.len(),
            });
        }
        match (self, src) {
            (Self::Int(d), BufferRef::Int(s)) => d.copy_from_slice(s),
            (Self::Float(d), BufferRef::Float(s)) => d.copy_from_slice(s),
            (Self::Double(d), BufferRef::Double(s)) => d.copy_from_slice(s),
            (dst, src) => {
                return Err(BufferError::TypeMismatch {
                    expected: dst.element_type(),
                    found: src.element_type(),
                })
            }
        }
        Ok(())
    }

    /// Store `v` at `index`, narrowed to the element type. Returns `false`
    /// if the index is out of range.
    pub fn set_f64(&mut self, index: usize, v: f64) -> bool {
        match self {
            Self::Int(d) => set_at(d, index, v),
            Self::Float(d) => set_at(d, index, v),
            Self::Double(d) => set_at(d, index, v),
        }
    }

    /// Apply `f` element-wise. Only defined for float storage.
    pub fn apply(&mut self, f: impl Fn(f64) -> f64) -> Result<(), BufferError> {
        match self {
            Self::Float(d) => apply_in_place(d, &f),
            Self::Double(d) => apply_in_place(d, &f),
            Self::Int(_) => {
                return Err(BufferError::UnsupportedOperation {
                    op: "transform",
                    element_type: ElementType::Int,
                })
            }
        }
        Ok(())
    }

    /// Clamp every element to the truncation bounds. A no-op when no bound
    /// is set; only defined for float storage otherwise.
    pub fn truncate(&mut self, truncation: &Truncation) -> Result<(), BufferError> {
        if !truncation.is_active() {
            return Ok(());
        }
        match self {
            Self::Float(d) => apply_in_place(d, &|x: f64| truncation.clamp(x)),
            Self::Double(d) => apply_in_place(d, &|x: f64| truncation.clamp(x)),
            Self::Int(_) => {
                return Err(BufferError::UnsupportedOperation {
                    op: "truncation",
                    element_type: ElementType::Int,
                })
            }
        }
        Ok(())
    }

    /// Whether every element is finite. Only defined for float storage.
    pub fn all_finite(&self) -> Result<bool, BufferError> {
        match self.view() {
            BufferRef::Float(d) => Ok(d.iter().all(|x| x.is_finite())),
            BufferRef::Double(d) => Ok(d.iter().all(|x| x.is_finite())),
            BufferRef::Int(_) => Err(BufferError::UnsupportedOperation {
                op: "finite check",
                element_type: ElementType::Int,
            }),
        }
    }

    /// Overwrite from a little-endian byte image of exactly `len * width`
    /// bytes.
    pub fn fill_from_le_bytes(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        let expected = self.len() * self.element_type().size_of();
        if bytes.len() != expected {
            return Err(BufferError::LengthMismatch {
                expected,
                found: bytes.len(),
            });
        }
        match self {
            Self::Int(d) => fill_le(d, bytes),
            Self::Float(d) => fill_le(d, bytes),
            Self::Double(d) => fill_le(d, bytes),
        }
        Ok(())
    }
}

impl<'a> BufferMut<'a> {
    /// Narrow to the first `len` elements, or `None` if the view is shorter.
    pub fn into_prefix(self, len: usize) -> Option<BufferMut<'a>> {
        if len > self.len() {
            return None;
        }
        Some(match self {
            Self::Int(v) => BufferMut::Int(&mut v[..len]),
            Self::Float(v) => BufferMut::Float(&mut v[..len]),
            Self::Double(v) => BufferMut::Double(&mut v[..len]),
        })
    }
}

fn set_at<T: Element>(values: &mut [T], index: usize, v: f64) -> bool {
    match values.get_mut(index) {
        Some(slot) => {
            *slot = T::from_f64(v);
            true
        }
        None => false,
    }
}

fn apply_in_place<T: Element>(values: &mut [T], f: &dyn Fn(f64) -> f64) {
    for v in values.iter_mut() {
        *v = T::from_f64(f(v.to_f64()));
    }
}

fn fill_le<T: Element>(values: &mut [T], bytes: &[u8]) {
    for (slot, raw) in values
        .iter_mut()
        .zip(bytes.chunks_exact(T::TYPE.size_of()))
    {
        *slot = T::read_le(raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zeroed_has_requested_shape() {
        let b = TypedBuffer::zeroed(ElementType::Double, 12);
        assert_eq!(b.len(), 12);
        assert_eq!(b.byte_size(), 96);
        assert_eq!(b.element_type(), ElementType::Double);
        assert_eq!(b.as_slice::<f64>(), Some(&[0.0; 12][..]));
        assert!(b.as_slice::<f32>().is_none());
    }

    #[test]
    fn int_buffers_reject_numeric_ops() {
        let mut b = TypedBuffer::Int(vec![1, 2, 3]);
        let err = b.view_mut().apply(|x| x * 2.0).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(
            err,
            BufferError::UnsupportedOperation {
                op: "transform",
                ..
            }
        ));
        assert!(b.view_mut().all_finite().is_err());
        let t = Truncation {
            min: Some(0.0),
            max: None,
        };
        assert!(b.view_mut().truncate(&t).is_err());
        // Inactive truncation is not an operation at all.
        assert!(b.view_mut().truncate(&Truncation::NONE).is_ok());
    }

    #[test]
    fn copy_from_checks_type_and_len() {
        let mut a = TypedBuffer::Float(vec![0.0; 3]);
        let b = TypedBuffer::Double(vec![1.0; 3]);
        let c = TypedBuffer::Float(vec![1.0; 4]);
        assert!(matches!(
            a.view_mut().copy_from(b.view()),
            Err(BufferError::TypeMismatch { .. })
        ));
        let err = a.view_mut().copy_from(c.view()).unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn clear_zeroes_caller_memory() {
        let mut raw = vec![3.5f32; 4];
        let mut view = f32::wrap_mut(&mut raw);
        view.clear();
        assert_eq!(raw, vec![0.0; 4]);
    }

    #[test]
    fn finite_check_detects_nan() {
        let mut b = TypedBuffer::Double(vec![1.0, f64::NAN]);
        assert_eq!(b.view_mut().all_finite(), Ok(false));
        b.view_mut().set_f64(1, 2.0);
        assert_eq!(b.view_mut().all_finite(), Ok(true));
    }

    #[test]
    fn le_bytes_round_trip() {
        let b = TypedBuffer::Int(vec![-1, 0, 7]);
        let bytes = b.view().to_le_bytes();
        assert_eq!(TypedBuffer::from_le_bytes(ElementType::Int, &bytes), Ok(b));
        assert!(TypedBuffer::from_le_bytes(ElementType::Double, &bytes[..5]).is_err());
    }

    #[test]
    fn truncation_mode_bits() {
        assert_eq!(Truncation::NONE.mode_bits(), 0);
        let both = Truncation {
            min: Some(0.0),
            max: Some(1.0),
        };
        assert_eq!(both.mode_bits(), 3);
    }

    proptest! {
        #[test]
        fn truncated_values_lie_within_bounds(
            values in prop::collection::vec(-1.0e6f64..1.0e6, 0..64),
            a in -100.0f64..0.0,
            width in 0.0f64..200.0,
        ) {
            let b = a + width;
            let t = Truncation { min: Some(a), max: Some(b) };
            let mut buf = TypedBuffer::Double(values.clone());
            buf.view_mut().truncate(&t).unwrap();
            let out = buf.as_slice::<f64>().unwrap();
            for (orig, v) in values.iter().zip(out) {
                prop_assert!(*v >= a && *v <= b);
                if *orig >= a && *orig <= b {
                    prop_assert_eq!(orig, v);
                }
            }
        }

        #[test]
        fn convert_to_int_truncates(values in prop::collection::vec(-1.0e6f64..1.0e6, 0..32)) {
            let buf = TypedBuffer::Double(values.clone());
            let ints = buf.view().convert_to::<i32>();
            for (v, i) in values.iter().zip(ints) {
                prop_assert_eq!(i, v.trunc() as i32);
            }
        }
    }
}
