//! Measurement parameter lists (the catalog columns SExtractor computes).

use std::path::Path;

use crate::errors::SewError;
use crate::vocabulary::Vocabulary;

/// Extra parameters requested on top of the defaults.
///
/// Names are case-insensitive. Vector parameters keep their size suffix,
/// e.g. `FLUX_APER(3)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraParams {
    /// Comma separated names, e.g. `"FLUX_RADIUS, ELLIPTICITY"`
    Delimited(String),
    List(Vec<String>),
}

impl ExtraParams {
    /// Individual parameter names, in request order.
    ///
    /// ```
    /// use sew::params::ExtraParams;
    ///
    /// let extra = ExtraParams::from("flag_1, flag_2,flag_3");
    /// assert_eq!(extra.names(), vec!["flag_1", "flag_2", "flag_3"]);
    /// ```
    pub fn names(&self) -> Vec<String> {
        match self {
            ExtraParams::Delimited(text) => text
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
            ExtraParams::List(names) => names.clone(),
        }
    }
}

impl From<&str> for ExtraParams {
    fn from(text: &str) -> Self {
        ExtraParams::Delimited(text.to_string())
    }
}

impl From<String> for ExtraParams {
    fn from(text: String) -> Self {
        ExtraParams::Delimited(text)
    }
}

impl From<Vec<String>> for ExtraParams {
    fn from(names: Vec<String>) -> Self {
        ExtraParams::List(names)
    }
}

impl From<Vec<&str>> for ExtraParams {
    fn from(names: Vec<&str>) -> Self {
        ExtraParams::List(names.into_iter().map(str::to_string).collect())
    }
}

/// Name used for vocabulary lookups: a vector suffix such as `(3)` is dropped.
pub fn lookup_key(name: &str) -> &str {
    match name.find('(') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Default parameters followed by the valid, non-duplicate extras.
///
/// Unknown names, names already among the defaults and repeated requests are
/// dropped with a warning.
pub fn build_param_list(
    defaults: &[String],
    extra: &ExtraParams,
    vocabulary: &Vocabulary,
) -> Vec<String> {
    let mut params = defaults.to_vec();

    for requested in extra.names() {
        let name = requested.to_uppercase();
        let key = lookup_key(&name);

        if !vocabulary.is_param(key) {
            log::warn!("{name} is not a valid SExtractor param -> we will ignore it!");
        } else if defaults.iter().any(|d| lookup_key(d) == key) {
            log::warn!("{name} is a default parameter -> No need to add it!");
        } else if params[defaults.len()..]
            .iter()
            .any(|p| lookup_key(p) == key)
        {
            log::warn!("{name} was requested more than once -> keeping the first request");
        } else {
            params.push(name);
        }
    }

    params
}

/// Write one parameter name per line.
pub fn write_param_file(params: &[String], path: &Path) -> Result<(), SewError> {
    log::debug!("writing parameter file to {}", path.display());
    let mut contents = params.join("\n");
    contents.push('\n');
    std::fs::write(path, contents).map_err(|e| SewError::io(path, e))
}
