//! Summary vector nodes.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// What to do when a summary vector is missing from simulator output.
///
/// Ordered by strictness; combining two policies keeps the stricter one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LoadFail {
    /// Ignore the missing vector.
    Silent = 0,
    /// Log a warning.
    Warn = 1,
    /// Fail the realization.
    Exit = 2,
}

impl LoadFail {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Silent,
            1 => Self::Warn,
            _ => Self::Exit,
        }
    }
}

impl fmt::Display for LoadFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Silent => "LOAD_FAIL_SILENT",
            Self::Warn => "LOAD_FAIL_WARN",
            Self::Exit => "LOAD_FAIL_EXIT",
        })
    }
}

/// Configuration of one summary vector.
#[derive(Debug)]
pub struct SummaryConfig {
    var: String,
    load_fail: AtomicU8,
}

impl SummaryConfig {
    /// Summary vector `var` with an initial load-fail policy.
    pub fn new(var: impl Into<String>, load_fail: LoadFail) -> Self {
        Self {
            var: var.into(),
            load_fail: AtomicU8::new(load_fail as u8),
        }
    }

    /// Summary key, e.g. `WOPR:OP_1`.
    pub fn var(&self) -> &str {
        &self.var
    }

    /// Current load-fail policy.
    pub fn load_fail(&self) -> LoadFail {
        LoadFail::from_u8(self.load_fail.load(Ordering::Acquire))
    }

    /// Raise the policy to `load_fail` if that is stricter.
    pub fn update_load_fail(&self, load_fail: LoadFail) {
        self.load_fail.fetch_max(load_fail as u8, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_only_gets_stricter() {
        let s = SummaryConfig::new("FOPT", LoadFail::Warn);
        s.update_load_fail(LoadFail::Silent);
        assert_eq!(s.load_fail(), LoadFail::Warn);
        s.update_load_fail(LoadFail::Exit);
        assert_eq!(s.load_fail(), LoadFail::Exit);
        assert_eq!(s.load_fail().to_string(), "LOAD_FAIL_EXIT");
    }
}
