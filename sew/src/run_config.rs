//! Per-run settings for [`SourceExtractor::run`](crate::SourceExtractor::run).

use std::path::PathBuf;

use crate::fits_io::FitsHeader;
use crate::options::{OptionValue, Options};
use crate::params::ExtraParams;

/// Settings of one SExtractor run.
///
/// ```
/// use sew::RunConfig;
///
/// let config = RunConfig::default()
///     .with_run_label("ccd07")
///     .with_extra_params("FLUX_RADIUS, ELLIPTICITY")
///     .with_option("DETECT_THRESH", 10.0)
///     .with_option("filter", "N");
/// assert_eq!(config.options.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// SExtractor configuration file; the embedded default when `None`
    pub config_path: Option<PathBuf>,
    /// Where to keep the catalog; a temporary file is used (and removed) when `None`
    pub catalog_path: Option<PathBuf>,
    /// Directory for temporary files
    pub tmp_path: PathBuf,
    /// Suffix that keeps temporary file names of concurrent runs apart
    pub run_label: Option<String>,
    /// Header written with the image; forces a temporary copy of path inputs
    pub header: Option<FitsHeader>,
    pub extra_params: Option<ExtraParams>,
    /// Configuration overrides, validated against the executable's vocabulary
    pub options: Options,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            catalog_path: None,
            tmp_path: std::env::temp_dir(),
            run_label: None,
            header: None,
            extra_params: None,
            options: Options::new(),
        }
    }
}

impl RunConfig {
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    pub fn with_tmp_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tmp_path = path.into();
        self
    }

    pub fn with_run_label(mut self, label: impl Into<String>) -> Self {
        self.run_label = Some(label.into());
        self
    }

    pub fn with_header(mut self, header: FitsHeader) -> Self {
        self.header = Some(header);
        self
    }

    pub fn with_extra_params(mut self, extra: impl Into<ExtraParams>) -> Self {
        self.extra_params = Some(extra.into());
        self
    }

    pub fn with_option(mut self, name: &str, value: impl Into<OptionValue>) -> Self {
        self.options.set(name, value);
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        for (name, value) in options.iter() {
            self.options.set(name, value.clone());
        }
        self
    }

    pub fn run_label(&self) -> Option<&str> {
        self.run_label.as_deref()
    }
}
