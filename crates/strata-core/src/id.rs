//! Variable classes, implementation-type tags and storage identifiers.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bitmask classifying what role a configured variable plays.
///
/// The numeric values are persisted alongside stored data and must not
/// change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VarClass(u32);

impl VarClass {
    /// No class bits set; matches nothing in [`intersects`](Self::intersects).
    pub const NONE: Self = Self(0);
    /// Parameters updated by the analysis step.
    pub const PARAMETER: Self = Self(1);
    /// Results produced by the forward model.
    pub const DYNAMIC_RESULT: Self = Self(4);
    /// Integer index state.
    pub const INDEX_STATE: Self = Self(16);
    /// Parameters managed by an external component.
    pub const EXT_PARAMETER: Self = Self(32);

    /// Raw bit value.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Construct from raw bits.
    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Whether any bit of `mask` is also set in `self`.
    pub fn intersects(self, mask: Self) -> bool {
        self.0 & mask.0 != 0
    }
}

impl BitOr for VarClass {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for VarClass {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for VarClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::PARAMETER, "PARAMETER"),
            (Self::DYNAMIC_RESULT, "DYNAMIC_RESULT"),
            (Self::INDEX_STATE, "INDEX_STATE"),
            (Self::EXT_PARAMETER, "EXT_PARAMETER"),
        ];
        let mut first = true;
        for (class, name) in names {
            if self.intersects(class) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        if first {
            write!(f, "NONE")?;
        }
        Ok(())
    }
}

/// Implementation type of a configuration node.
///
/// The codes are on-disk stable: the native buffer codec writes them as
/// record tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImplType {
    /// 3D grid property.
    Field,
    /// Scalar keywords substituted into templates.
    GenKw,
    /// Summary vector.
    Summary,
    /// Generic data vector (results or parameters).
    GenData,
    /// 2D surface.
    Surface,
    /// Ordered group of other nodes.
    Container,
    /// Externally managed parameter.
    ExtParam,
}

impl ImplType {
    /// Stable numeric code.
    pub fn code(self) -> i32 {
        match self {
            Self::Field => 104,
            Self::GenKw => 107,
            Self::Summary => 110,
            Self::GenData => 113,
            Self::Surface => 114,
            Self::Container => 115,
            Self::ExtParam => 116,
        }
    }

    /// Inverse of [`code`](Self::code).
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            104 => Some(Self::Field),
            107 => Some(Self::GenKw),
            110 => Some(Self::Summary),
            113 => Some(Self::GenData),
            114 => Some(Self::Surface),
            115 => Some(Self::Container),
            116 => Some(Self::ExtParam),
            _ => None,
        }
    }

    /// Upper-case name as used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            Self::Field => "FIELD",
            Self::GenKw => "GEN_KW",
            Self::Summary => "SUMMARY",
            Self::GenData => "GEN_DATA",
            Self::Surface => "SURFACE",
            Self::Container => "CONTAINER",
            Self::ExtParam => "EXT_PARAM",
        }
    }
}

impl fmt::Display for ImplType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Storage coordinates of one node value: report step and ensemble member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    /// Report step the value belongs to.
    pub report_step: usize,
    /// Ensemble member index.
    pub iens: usize,
}

impl NodeId {
    /// Shorthand constructor.
    pub fn new(report_step: usize, iens: usize) -> Self {
        Self { report_step, iens }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.report_step, self.iens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impl_codes_are_stable() {
        assert_eq!(ImplType::Field.code(), 104);
        assert_eq!(ImplType::GenKw.code(), 107);
        assert_eq!(ImplType::Summary.code(), 110);
        assert_eq!(ImplType::GenData.code(), 113);
        assert_eq!(ImplType::Surface.code(), 114);
        assert_eq!(ImplType::Container.code(), 115);
        assert_eq!(ImplType::ExtParam.code(), 116);
        for code in 100..120 {
            if let Some(t) = ImplType::from_code(code) {
                assert_eq!(t.code(), code);
            }
        }
    }

    #[test]
    fn var_class_masks() {
        let mask = VarClass::PARAMETER | VarClass::EXT_PARAMETER;
        assert_eq!(mask.bits(), 33);
        assert!(VarClass::PARAMETER.intersects(mask));
        assert!(!VarClass::DYNAMIC_RESULT.intersects(mask));
        assert!(!VarClass::NONE.intersects(mask));
        assert_eq!(mask.to_string(), "PARAMETER|EXT_PARAMETER");
        assert_eq!(VarClass::NONE.to_string(), "NONE");
    }
}
