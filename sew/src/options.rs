//! SExtractor configuration options.
//!
//! Options are an explicit name → value mapping. Names are case-insensitive
//! and stored uppercase, which is how SExtractor spells them on the command
//! line.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::vocabulary::Vocabulary;

/// Scalar value of a configuration option.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Int(i64),
    Float(f64),
    /// Rendered as `Y` / `N`
    Bool(bool),
    Text(String),
}

impl OptionValue {
    /// Interpret a command-line literal: integer, then float, else text.
    pub fn parse(literal: &str) -> Self {
        let literal = literal.trim();
        if let Ok(v) = literal.parse::<i64>() {
            OptionValue::Int(v)
        } else if let Ok(v) = literal.parse::<f64>() {
            OptionValue::Float(v)
        } else {
            OptionValue::Text(literal.to_string())
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OptionValue::Int(v) => Some(*v as f64),
            OptionValue::Float(v) => Some(*v),
            OptionValue::Text(s) => s.parse().ok(),
            OptionValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Int(v) => write!(f, "{v}"),
            OptionValue::Float(v) => write!(f, "{v}"),
            OptionValue::Bool(true) => write!(f, "Y"),
            OptionValue::Bool(false) => write!(f, "N"),
            OptionValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(value as i64)
    }
}

impl From<usize> for OptionValue {
    fn from(value: usize) -> Self {
        OptionValue::Int(value as i64)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

impl From<&Path> for OptionValue {
    fn from(value: &Path) -> Self {
        OptionValue::Text(value.display().to_string())
    }
}

impl From<PathBuf> for OptionValue {
    fn from(value: PathBuf) -> Self {
        OptionValue::from(value.as_path())
    }
}

/// Mapping of option name to value with uppercase keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    entries: BTreeMap<String, OptionValue>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Options::set`].
    pub fn with(mut self, name: &str, value: impl Into<OptionValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set an option, replacing any earlier value for the same name.
    pub fn set(&mut self, name: &str, value: impl Into<OptionValue>) {
        self.entries.insert(name.to_uppercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries.get(&name.to_uppercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_uppercase())
    }

    pub fn remove(&mut self, name: &str) -> Option<OptionValue> {
        self.entries.remove(&name.to_uppercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<OptionValue>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Options::new();
        for (k, v) in iter {
            options.set(k.as_ref(), v);
        }
        options
    }
}

/// Overlay `user` options on `defaults`, dropping names SExtractor does not know.
///
/// Unknown names are logged as warnings and ignored; they never fail a run.
pub fn merge_options(defaults: &Options, user: &Options, vocabulary: &Vocabulary) -> Options {
    let mut merged = defaults.clone();
    for (name, value) in user.iter() {
        if !vocabulary.is_option(name) {
            log::warn!("{name} is not a valid SExtractor option -> we will ignore it!");
            continue;
        }
        log::debug!("SExtractor config update: {name} = {value}");
        merged.set(name, value.clone());
    }
    merged
}
