//! Option and parameter names understood by the installed SExtractor.
//!
//! The names are not hard-coded: they are read from the executable's own
//! `-dd` (dump default configuration) and `-dp` (dump parameters) output.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;

use crate::errors::SewError;

/// Environment variable naming the SExtractor executable.
pub const SE_EXECUTABLE_ENV: &str = "SE_EXECUTABLE";

/// Valid configuration keys and measurement parameters of one executable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    option_names: BTreeSet<String>,
    param_names: BTreeSet<String>,
}

impl Vocabulary {
    pub fn new<O, P>(option_names: O, param_names: P) -> Self
    where
        O: IntoIterator,
        O::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            option_names: option_names.into_iter().map(Into::into).collect(),
            param_names: param_names.into_iter().map(Into::into).collect(),
        }
    }

    /// Query `executable` with `-dd` and `-dp` and parse both dumps.
    pub fn discover(executable: &Path) -> Result<Self, SewError> {
        let config_dump = query(executable, "-dd")?;
        let param_dump = query(executable, "-dp")?;

        let vocabulary = Self {
            option_names: parse_option_dump(&config_dump),
            param_names: parse_param_dump(&param_dump),
        };
        if vocabulary.option_names.is_empty() || vocabulary.param_names.is_empty() {
            return Err(SewError::Configuration(format!(
                "{} did not report any options or parameters",
                executable.display()
            )));
        }

        log::debug!(
            "discovered {} options and {} parameters from {}",
            vocabulary.option_names.len(),
            vocabulary.param_names.len(),
            executable.display()
        );
        Ok(vocabulary)
    }

    pub fn is_option(&self, name: &str) -> bool {
        self.option_names.contains(name)
    }

    pub fn is_param(&self, name: &str) -> bool {
        self.param_names.contains(name)
    }

    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.option_names.iter().map(String::as_str)
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.param_names.iter().map(String::as_str)
    }
}

fn query(executable: &Path, flag: &str) -> Result<String, SewError> {
    let output = Command::new(executable).arg(flag).output().map_err(|e| {
        SewError::Configuration(format!(
            "cannot run {} ({e}) -> verify {SE_EXECUTABLE_ENV} runs SExtractor as expected",
            executable.display()
        ))
    })?;

    if !output.status.success() {
        return Err(SewError::Configuration(format!(
            "`{} {flag}` exited with {} -> verify {SE_EXECUTABLE_ENV} runs SExtractor as expected",
            executable.display(),
            output.status
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Option names are the first token of every non-comment line.
pub fn parse_option_dump(text: &str) -> BTreeSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Parameter lines look like `#FLUX_APER(1)   Flux vector within ...`.
pub fn parse_param_dump(text: &str) -> BTreeSet<String> {
    text.lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(|token| token.trim_start_matches('#'))
        .map(|token| token.split('(').next().unwrap_or(token))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG_DUMP: &str = "\
# Default configuration file for SExtractor 2.25.0
# EB 2024-01-01
#

#-------------------------------- Catalog ------------------------------------

CATALOG_NAME     test.cat       # name of the output catalog
CATALOG_TYPE     ASCII_HEAD     # NONE,ASCII,ASCII_HEAD, ASCII_SKYCAT,
                                # ASCII_VOTABLE, FITS_1.0 or FITS_LDAC
DETECT_THRESH    1.5            # <sigmas> or <threshold>,<ZP> in mag.arcsec-2
";

    const PARAM_DUMP: &str = "\
#NUMBER                 Running object number
#FLUX_APER(1)           Flux vector within fixed circular aperture(s)          [count]
#X_IMAGE                Object position along x                                [pixel]
#VIGNET(1,1)            Pixel data around detection                            [count]
";

    #[test]
    fn test_parse_option_dump_skips_comments() {
        let names = parse_option_dump(CONFIG_DUMP);
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["CATALOG_NAME", "CATALOG_TYPE", "DETECT_THRESH"]);
    }

    #[test]
    fn test_parse_param_dump_strips_hash_and_vector_suffix() {
        let names = parse_param_dump(PARAM_DUMP);
        assert!(names.contains("NUMBER"));
        assert!(names.contains("FLUX_APER"));
        assert!(names.contains("VIGNET"));
        assert!(names.contains("X_IMAGE"));
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_lookup() {
        let vocabulary = Vocabulary::new(["DETECT_THRESH"], ["X_IMAGE", "FLAGS"]);
        assert!(vocabulary.is_option("DETECT_THRESH"));
        assert!(!vocabulary.is_option("detect_thresh"));
        assert!(vocabulary.is_param("FLAGS"));
        assert_eq!(vocabulary.param_names().count(), 2);
    }

    #[test]
    fn test_discover_missing_executable_is_configuration_error() {
        let result = Vocabulary::discover(Path::new("/definitely/not/a/sextractor"));
        assert!(matches!(result, Err(SewError::Configuration(_))));
    }
}
