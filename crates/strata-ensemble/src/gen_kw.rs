//! Scalar keyword (GEN_KW) nodes: a named group of scalar parameters
//! substituted into a template file.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::EnsembleError;

/// Tag format used when none is configured.
pub const DEFAULT_TAG_FORMAT: &str = "<%s>";

/// Configuration of one GEN_KW group.
#[derive(Debug)]
pub struct GenKwConfig {
    template_file: Option<String>,
    output_file: Option<String>,
    parameters: Vec<String>,
    tag_format: RwLock<String>,
}

impl GenKwConfig {
    /// A group of `parameters` written through `template_file` to
    /// `output_file`.
    pub fn new(
        template_file: Option<String>,
        output_file: Option<String>,
        parameters: Vec<String>,
    ) -> Self {
        Self {
            template_file,
            output_file,
            parameters,
            tag_format: RwLock::new(DEFAULT_TAG_FORMAT.to_string()),
        }
    }

    /// Read parameter names from a parameter definition file: one
    /// `NAME DISTRIBUTION ARGS...` line per parameter, `--` comments.
    pub fn read_parameter_names(path: &Path) -> Result<Vec<String>, EnsembleError> {
        let text = read_text(path)?;
        Ok(text
            .lines()
            .filter_map(|line| line.split("--").next())
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect())
    }

    /// Template file.
    pub fn template_file(&self) -> Option<&str> {
        self.template_file.as_deref()
    }

    /// Rendered output file.
    pub fn output_file(&self) -> Option<&str> {
        self.output_file.as_deref()
    }

    /// Parameter names in definition order.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Current tag format; `%s` stands for the parameter name.
    pub fn tag_format(&self) -> String {
        self.tag_format.read().clone()
    }

    /// Replace the tag format.
    pub fn set_tag_format(&self, format: &str) {
        *self.tag_format.write() = format.to_string();
    }

    /// Template marker for parameter `name`, e.g. `<PERMX_MULT>`.
    pub fn tag(&self, name: &str) -> String {
        self.tag_format.read().replace("%s", name)
    }

    /// Read `NAME VALUE` lines and return the values in parameter order.
    /// Every parameter must be present; extra names are ignored.
    pub fn load_values(&self, path: &Path) -> Result<Vec<f64>, EnsembleError> {
        let text = read_text(path)?;
        let malformed = |detail: String| EnsembleError::MalformedValues {
            path: path.to_path_buf(),
            detail,
        };
        let mut values = IndexMap::new();
        for (lineno, line) in text.lines().enumerate() {
            let mut words = line.split_whitespace();
            let (Some(name), Some(raw)) = (words.next(), words.next()) else {
                if line.trim().is_empty() {
                    continue;
                }
                return Err(malformed(format!("line {}: expected NAME VALUE", lineno + 1)));
            };
            let value = raw
                .parse::<f64>()
                .map_err(|_| malformed(format!("line {}: {raw} is not a number", lineno + 1)))?;
            values.insert(name.to_string(), value);
        }
        self.parameters
            .iter()
            .map(|p| {
                values
                    .get(p)
                    .copied()
                    .ok_or_else(|| malformed(format!("no value for parameter {p}")))
            })
            .collect()
    }
}

pub(crate) fn read_text(path: &Path) -> Result<String, EnsembleError> {
    fs::read_to_string(path).map_err(|source| EnsembleError::Io {
        path: PathBuf::from(path),
        source,
    })
}
