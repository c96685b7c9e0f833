//! Default SExtractor input files shipped with the crate.
//!
//! The configuration, parameter list and convolution kernel under `input/` are
//! embedded at compile time and written once per process to a directory under
//! the system temp dir, since SExtractor only accepts them as file paths.

use once_cell::sync::OnceCell;
use rust_embed::RustEmbed;
use std::path::{Path, PathBuf};

use crate::errors::SewError;

#[derive(RustEmbed)]
#[folder = "input/"]
struct InputAssets;

const CONFIG_FILE: &str = "default.config";
const PARAM_FILE: &str = "default.param";
const CONV_FILE: &str = "kernels/default.conv";

/// Paths of the materialized default input files.
#[derive(Debug, Clone)]
pub struct DefaultInputs {
    dir: PathBuf,
    params: Vec<String>,
}

static DEFAULT_INPUTS: OnceCell<DefaultInputs> = OnceCell::new();

impl DefaultInputs {
    /// Process-wide default inputs, written to disk on first use.
    pub fn get() -> Result<&'static DefaultInputs, SewError> {
        DEFAULT_INPUTS.get_or_try_init(|| {
            let dir =
                std::env::temp_dir().join(format!("sew-input-{}", env!("CARGO_PKG_VERSION")));
            Self::materialize(&dir)
        })
    }

    /// Write every embedded input file below `dir`.
    pub fn materialize(dir: &Path) -> Result<Self, SewError> {
        for name in InputAssets::iter() {
            let Some(asset) = InputAssets::get(&name) else {
                continue;
            };
            let target = dir.join(name.as_ref());
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| SewError::io(parent, e))?;
            }
            // Write-then-rename so a concurrent process never sees a partial file.
            let staging = dir.join(format!("{name}.{}.tmp", std::process::id()));
            std::fs::write(&staging, asset.data.as_ref())
                .map_err(|e| SewError::io(&staging, e))?;
            std::fs::rename(&staging, &target).map_err(|e| SewError::io(&target, e))?;
        }

        let param_text = InputAssets::get(PARAM_FILE)
            .map(|asset| String::from_utf8_lossy(asset.data.as_ref()).into_owned())
            .unwrap_or_default();

        log::debug!("default SExtractor inputs written to {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            params: parse_param_file(&param_text),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn param_path(&self) -> PathBuf {
        self.dir.join(PARAM_FILE)
    }

    pub fn conv_path(&self) -> PathBuf {
        self.dir.join(CONV_FILE)
    }

    /// Measurement parameters listed in the default parameter file.
    pub fn params(&self) -> &[String] {
        &self.params
    }
}

/// One parameter name per line; blank lines and `#` comments are ignored.
pub fn parse_param_file(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}
