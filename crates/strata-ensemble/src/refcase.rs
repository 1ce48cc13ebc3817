//! Reference case used to expand summary key patterns.

use crate::matcher::glob_match;

/// Summary vectors of a reference simulation.
///
/// Only consulted to expand wildcard summary keys into the concrete keys
/// the simulator is known to produce.
pub trait SummaryRefcase: Send + Sync {
    /// Every summary key in the case.
    fn keys(&self) -> Vec<String>;

    /// Keys matching the glob `pattern`, sorted.
    fn matching_keys(&self, pattern: &str) -> Vec<String> {
        let mut out: Vec<String> = self
            .keys()
            .into_iter()
            .filter(|k| glob_match(pattern, k))
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

impl SummaryRefcase for Vec<String> {
    fn keys(&self) -> Vec<String> {
        self.clone()
    }
}
