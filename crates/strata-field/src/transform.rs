//! Named unary transforms applied to field values.
//!
//! Transforms are looked up by name from configuration (`INIT_TRANSFORM:LOG`,
//! `OUTPUT_TRANSFORM:EXP`). Lookup is case-insensitive.

use std::fmt;

use indexmap::IndexMap;

/// A registered unary function `f64 -> f64`.
#[derive(Clone)]
pub struct FieldTransform {
    name: String,
    description: String,
    func: fn(f64) -> f64,
}

impl FieldTransform {
    /// Wrap a function under a name.
    pub fn new(name: impl Into<String>, description: impl Into<String>, func: fn(f64) -> f64) -> Self {
        Self {
            name: name.into().to_uppercase(),
            description: description.into(),
            func,
        }
    }

    /// Registered (upper-case) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Evaluate at `x`.
    pub fn apply(&self, x: f64) -> f64 {
        (self.func)(x)
    }
}

impl fmt::Debug for FieldTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTransform")
            .field("name", &self.name)
            .finish()
    }
}

impl PartialEq for FieldTransform {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

// ── Built-ins ───────────────────────────────────────────────────

const EPSILON: f64 = 1e-6;
const TRUNC_POW10_FLOOR: f64 = 1e-3;

fn ln(x: f64) -> f64 {
    x.ln()
}

fn ln0(x: f64) -> f64 {
    (x + EPSILON).ln()
}

fn log10(x: f64) -> f64 {
    x.log10()
}

fn exp(x: f64) -> f64 {
    x.exp()
}

fn exp0(x: f64) -> f64 {
    x.exp() - EPSILON
}

fn pow10(x: f64) -> f64 {
    10f64.powf(x)
}

fn trunc_pow10(x: f64) -> f64 {
    10f64.powf(x).max(TRUNC_POW10_FLOOR)
}

/// Name -> transform lookup, pre-populated with the built-in transforms.
#[derive(Clone, Debug)]
pub struct TransformTable {
    entries: IndexMap<String, FieldTransform>,
}

impl TransformTable {
    /// A table holding the built-in transforms.
    pub fn new() -> Self {
        let mut table = Self {
            entries: IndexMap::new(),
        };
        table.register("LN", "Natural logarithm", ln);
        table.register("LOG", "Natural logarithm", ln);
        table.register("LN0", "Natural logarithm of x + 0.000001", ln0);
        table.register("LOG10", "Base 10 logarithm", log10);
        table.register("EXP", "Exponential function", exp);
        table.register("EXP0", "Exponential function minus 0.000001", exp0);
        table.register("POW10", "Power of ten", pow10);
        table.register("TRUNC_POW10", "Power of ten, floored at 0.001", trunc_pow10);
        table
    }

    /// Add or replace a transform.
    pub fn register(&mut self, name: &str, description: &str, func: fn(f64) -> f64) {
        let t = FieldTransform::new(name, description, func);
        self.entries.insert(t.name.clone(), t);
    }

    /// Look up a transform by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&FieldTransform> {
        self.entries.get(&name.to_uppercase())
    }

    /// Whether a transform of that name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Default for TransformTable {
    fn default() -> Self {
        Self::new()
    }
}
