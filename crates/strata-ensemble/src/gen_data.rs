//! General data nodes: vectors of numbers exchanged with the forward model
//! as plain files. GEN_DATA nodes are forward-model results; GEN_PARAM
//! nodes are parameters of the same shape.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::EnsembleError;
use crate::gen_kw::read_text;

/// On-disk format of general data files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GenDataFormat {
    /// Whitespace-separated ASCII numbers.
    #[default]
    Ascii,
    /// ASCII numbers rendered through a template.
    AsciiTemplate,
    /// Raw native-endian float64.
    BinaryDouble,
    /// Raw native-endian float32.
    BinaryFloat,
}

impl FromStr for GenDataFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASCII" => Ok(Self::Ascii),
            "ASCII_TEMPLATE" => Ok(Self::AsciiTemplate),
            "BINARY_DOUBLE" => Ok(Self::BinaryDouble),
            "BINARY_FLOAT" => Ok(Self::BinaryFloat),
            other => Err(format!("unknown data format {other}")),
        }
    }
}

impl fmt::Display for GenDataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ascii => "ASCII",
            Self::AsciiTemplate => "ASCII_TEMPLATE",
            Self::BinaryDouble => "BINARY_DOUBLE",
            Self::BinaryFloat => "BINARY_FLOAT",
        })
    }
}

/// Configuration shared by GEN_DATA and GEN_PARAM nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenDataConfig {
    /// File the forward model writes (`%d` is the report step).
    pub result_file: Option<String>,
    /// File a parameter is written to in the run directory.
    pub output_file: Option<String>,
    /// Format of files read back.
    pub input_format: GenDataFormat,
    /// Format of files written.
    pub output_format: GenDataFormat,
    /// Report steps with results.
    pub report_steps: Vec<usize>,
}

impl GenDataConfig {
    /// Whether results exist for `report_step`.
    pub fn has_report_step(&self, report_step: usize) -> bool {
        self.report_steps.contains(&report_step)
    }
}

/// Parse a whitespace-separated ASCII value file.
pub fn read_ascii_values(path: &Path) -> Result<Vec<f64>, EnsembleError> {
    let text = read_text(path)?;
    text.split_whitespace()
        .map(|word| {
            word.parse::<f64>()
                .map_err(|_| EnsembleError::MalformedValues {
                    path: path.to_path_buf(),
                    detail: format!("{word} is not a number"),
                })
        })
        .collect()
}

/// Parse a report step list: `10,20,30` or ranges like `10-12`.
pub fn parse_report_steps(keyword: &str, raw: &str) -> Result<Vec<usize>, EnsembleError> {
    let invalid = || EnsembleError::InvalidConfig {
        keyword: keyword.to_string(),
        detail: format!("bad report step list {raw}"),
    };
    let mut steps = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((a, b)) => {
                let a: usize = a.trim().parse().map_err(|_| invalid())?;
                let b: usize = b.trim().parse().map_err(|_| invalid())?;
                if b < a {
                    return Err(invalid());
                }
                steps.extend(a..=b);
            }
            None => steps.push(part.parse().map_err(|_| invalid())?),
        }
    }
    steps.sort_unstable();
    steps.dedup();
    Ok(steps)
}
