//! Running SExtractor on an image and reading back its catalog.
//!
//! A run goes through the same steps every time:
//!
//! 1. make sure the image exists as a FITS file (writing pixels out if needed)
//! 2. overlay the caller's options on the wrapper defaults, dropping unknown names
//! 3. write a custom parameter file if extra measurement columns were requested
//! 4. invoke the executable and wait for it
//! 5. parse the catalog
//!
//! Every temporary file from steps 1-5 is owned by an [`ArtifactSet`] and is
//! removed when the run returns, whether it succeeded or not.

use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

use crate::artifacts::{Artifact, ArtifactKind, ArtifactSet};
use crate::catalog::{Catalog, CatalogFormat};
use crate::command::Invocation;
use crate::errors::SewError;
use crate::image_input::{prepare_image_file, ImageInput};
use crate::input_files::{parse_param_file, DefaultInputs};
use crate::options::{merge_options, Options};
use crate::params::{build_param_list, write_param_file};
use crate::run_config::RunConfig;
use crate::vocabulary::{Vocabulary, SE_EXECUTABLE_ENV};

static FROM_ENV: OnceCell<SourceExtractor> = OnceCell::new();

/// A SExtractor executable together with the vocabulary it reported.
#[derive(Debug, Clone)]
pub struct SourceExtractor {
    executable: PathBuf,
    vocabulary: Vocabulary,
    inputs: &'static DefaultInputs,
}

impl SourceExtractor {
    /// The executable named by `SE_EXECUTABLE`, discovered once per process.
    ///
    /// # Errors
    /// `Configuration` if the variable is unset or the executable does not
    /// answer the discovery queries. Failures are not cached, so a later call
    /// may succeed once the environment is fixed.
    pub fn from_env() -> Result<&'static SourceExtractor, SewError> {
        FROM_ENV.get_or_try_init(|| {
            let executable = std::env::var_os(SE_EXECUTABLE_ENV)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    SewError::Configuration(format!(
                        "{SE_EXECUTABLE_ENV} env variable not set -> set this env variable \
                         to your local SExtractor executable"
                    ))
                })?;
            Self::discover(executable)
        })
    }

    /// Query `executable` for its vocabulary.
    pub fn discover(executable: impl Into<PathBuf>) -> Result<Self, SewError> {
        let executable = executable.into();
        let vocabulary = Vocabulary::discover(&executable)?;
        Ok(Self {
            executable,
            vocabulary,
            inputs: DefaultInputs::get()?,
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Columns every catalog contains.
    pub fn default_params(&self) -> &[String] {
        self.inputs.params()
    }

    pub fn default_config_path(&self) -> PathBuf {
        self.inputs.config_path()
    }

    /// Options applied before the caller's own.
    pub fn default_options(&self) -> Options {
        Options::new()
            .with("VERBOSE_TYPE", "QUIET")
            .with("PARAMETERS_NAME", self.inputs.param_path())
            .with("FILTER_NAME", self.inputs.conv_path())
    }

    /// Run SExtractor on `image` and return the parsed catalog.
    ///
    /// # Errors
    /// * `InvalidInput` - the image cannot be staged as a FITS file
    /// * `UnsupportedCatalogFormat` - `CATALOG_TYPE` is not `ASCII_HEAD`
    /// * `MissingCatalog` / `CatalogParse` - the external run failed
    pub fn run(&self, image: &ImageInput, config: &RunConfig) -> Result<Catalog, SewError> {
        let mut artifacts = ArtifactSet::new();
        let label = config.run_label();

        let image_path = artifacts.track(prepare_image_file(
            image,
            config.header.as_ref(),
            &config.tmp_path,
            label,
        )?);
        log::debug!("Running SExtractor on {}", image_path.display());

        let options = merge_options(&self.default_options(), &config.options, &self.vocabulary);
        let format = CatalogFormat::from_catalog_type(options.get("CATALOG_TYPE"))?;

        let catalog_path = match &config.catalog_path {
            Some(path) => artifacts.track(Artifact::kept(path)),
            None => {
                let path = ArtifactKind::Catalog.temp_path(&config.tmp_path, label);
                // A stale catalog would hide a failed run.
                if path.exists() {
                    std::fs::remove_file(&path).map_err(|e| SewError::io(&path, e))?;
                }
                artifacts.track(Artifact::temporary(path))
            }
        };

        let mut params = match &config.extra_params {
            Some(extra) => build_param_list(self.default_params(), extra, &self.vocabulary),
            None => self.default_params().to_vec(),
        };
        let param_file = if params.len() > self.default_params().len() {
            let path = ArtifactKind::ParameterList.temp_path(&config.tmp_path, label);
            let tracked = artifacts.track(Artifact::temporary(path));
            write_param_file(&params, &tracked)?;
            Some(tracked)
        } else {
            if let Some(custom) = options.get("PARAMETERS_NAME") {
                params = read_param_list(Path::new(&custom.to_string()));
            }
            None
        };

        let config_path = config
            .config_path
            .clone()
            .unwrap_or_else(|| self.default_config_path());

        Invocation {
            executable: &self.executable,
            config_path: &config_path,
            image_path: &image_path,
            catalog_path: &catalog_path,
            options: &options,
            param_file: param_file.as_deref(),
        }
        .execute()?;

        let catalog = Catalog::read_with_params(&catalog_path, format, &params)?;
        log::debug!(
            "SExtractor found {} sources in {}",
            catalog.len(),
            image_path.display()
        );

        artifacts.cleanup();
        Ok(catalog)
    }
}

/// Parameter names listed in `path`; empty if it cannot be read, in which
/// case SExtractor itself reports the problem.
fn read_param_list(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_param_file(&text),
        Err(e) => {
            log::debug!("cannot read parameter file {}: {e}", path.display());
            Vec::new()
        }
    }
}

/// Run the `SE_EXECUTABLE` SExtractor on `image`.
///
/// Shorthand for `SourceExtractor::from_env()?.run(image, config)`.
pub fn run(image: &ImageInput, config: &RunConfig) -> Result<Catalog, SewError> {
    SourceExtractor::from_env()?.run(image, config)
}
