//! Summary key patterns and glob matching.

use indexmap::IndexMap;

/// Whether `key` contains a glob wildcard (`*` or `?`).
pub fn has_wildcard(key: &str) -> bool {
    key.contains(['*', '?'])
}

/// Shell-style glob match: `*` matches any run of characters, `?` exactly
/// one.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ti = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|c| *c == '*')
}

/// Summary keys the user asked for, exact or as patterns.
///
/// Exact keys are required: a missing vector is an error when results are
/// loaded. Patterns only select whatever the simulator produced.
#[derive(Clone, Debug, Default)]
pub struct SummaryKeyMatcher {
    keys: IndexMap<String, bool>,
}

impl SummaryKeyMatcher {
    /// Empty matcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key or pattern.
    pub fn add_summary_key(&mut self, key: &str) {
        self.keys.insert(key.to_string(), !has_wildcard(key));
    }

    /// Whether any registered key or pattern matches `key`.
    pub fn matches(&self, key: &str) -> bool {
        self.keys.keys().any(|pattern| glob_match(pattern, key))
    }

    /// Whether `key` was registered as an exact key.
    pub fn is_required(&self, key: &str) -> bool {
        self.keys.get(key).copied().unwrap_or(false)
    }

    /// Registered keys and patterns in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// Number of registered keys and patterns.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
