//! Already-parsed configuration content.
//!
//! The configuration file grammar is handled elsewhere; the registry only
//! sees keyword items with their argument lists. Trailing arguments of the
//! form `KEY:VALUE` are options.

use indexmap::IndexMap;
use tracing::warn;

use crate::error::EnsembleError;

/// One configuration line: a keyword and its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigItem {
    /// Keyword, e.g. `FIELD`.
    pub keyword: String,
    /// Arguments after the keyword.
    pub args: Vec<String>,
}

impl ConfigItem {
    /// Positional argument `index`, or an [`EnsembleError::InvalidConfig`]
    /// naming `what` if absent.
    pub fn arg(&self, index: usize, what: &str) -> Result<&str, EnsembleError> {
        self.args
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| EnsembleError::InvalidConfig {
                keyword: self.keyword.clone(),
                detail: format!("missing {what} (argument {})", index + 1),
            })
    }

    /// Options among the arguments from `start` on.
    pub fn options(&self, start: usize) -> Options {
        Options::parse(self.args.iter().skip(start).map(String::as_str))
    }
}

/// Keyword items in file order.
#[derive(Clone, Debug, Default)]
pub struct ConfigContent {
    items: Vec<ConfigItem>,
}

impl ConfigContent {
    /// Empty content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize simple line-oriented text: one item per line, whitespace
    /// separated, `--` starts a comment.
    pub fn from_lines(text: &str) -> Self {
        let mut content = Self::new();
        for line in text.lines() {
            let line = line.split("--").next().unwrap_or_default();
            let mut words = line.split_whitespace();
            if let Some(keyword) = words.next() {
                content.push(keyword, words);
            }
        }
        content
    }

    /// Append an item.
    pub fn push<I, S>(&mut self, keyword: &str, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.push(ConfigItem {
            keyword: keyword.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Items with `keyword`, in file order.
    pub fn items<'c, 'k>(
        &'c self,
        keyword: &'k str,
    ) -> impl Iterator<Item = &'c ConfigItem> + use<'c, 'k> {
        self.items.iter().filter(move |item| item.keyword == keyword)
    }

    /// Whether any item has `keyword`.
    pub fn has_item(&self, keyword: &str) -> bool {
        self.items(keyword).next().is_some()
    }

    /// First argument of the last item with `keyword`.
    pub fn last_value(&self, keyword: &str) -> Option<&str> {
        self.items(keyword)
            .last()
            .and_then(|item| item.args.first())
            .map(String::as_str)
    }
}

/// `KEY:VALUE` options of one item. Arguments without a `:` are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Options {
    values: IndexMap<String, String>,
}

impl Options {
    /// Collect options, splitting each argument on its first `:`. Later
    /// occurrences of a key win.
    pub fn parse<'a>(args: impl IntoIterator<Item = &'a str>) -> Self {
        let values = args
            .into_iter()
            .filter_map(|arg| arg.split_once(':'))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { values }
    }

    /// Raw value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Boolean value of `key`, `false` when absent.
    ///
    /// A value that is not a recognisable boolean is logged and read as
    /// `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        match self.get(key) {
            None => false,
            Some(raw) => parse_bool(raw).unwrap_or_else(|| {
                warn!(option = key, value = raw, "parsing {raw} as bool failed - using FALSE");
                false
            }),
        }
    }

    /// Numeric value of `key`; `keyword` names the item in errors.
    pub fn get_f64(&self, keyword: &str, key: &str) -> Result<Option<f64>, EnsembleError> {
        self.get(key)
            .map(|raw| {
                raw.parse::<f64>().map_err(|_| EnsembleError::InvalidConfig {
                    keyword: keyword.to_string(),
                    detail: format!("{key}:{raw} is not a number"),
                })
            })
            .transpose()
    }
}

/// Parse the boolean spellings accepted in configuration files.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_uppercase().as_str() {
        "TRUE" | "T" | "YES" | "Y" | "ON" | "1" => Some(true),
        "FALSE" | "F" | "NO" | "N" | "OFF" | "0" => Some(false),
        _ => None,
    }
}
