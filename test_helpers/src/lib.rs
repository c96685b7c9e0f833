//! Shared test fixtures for the sew workspace.
//!
//! - [`MockSextractor`] installs a shell script that answers the same
//!   discovery queries as SExtractor and writes deterministic catalogs and
//!   check images, so the wrapper can be tested without the real executable.
//! - [`synthetic_star_field`] builds small reproducible star images.
//! - [`output_path`] places artifacts that are worth inspecting by hand under
//!   `<workspace>/test_output/`.

mod mock_sextractor;
mod synthetic;

pub use mock_sextractor::MockSextractor;
pub use synthetic::synthetic_star_field;

use once_cell::sync::Lazy;
use std::env;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum TestHelperError {
    #[error("Failed to find project root: {0}")]
    ProjectRootNotFound(String),
}

/// Walk up from the current directory to the Cargo.toml with a `[workspace]`
/// section.
pub fn find_project_root() -> Result<PathBuf, TestHelperError> {
    let mut current_dir = env::current_dir().map_err(|e| {
        TestHelperError::ProjectRootNotFound(format!("Failed to get current directory: {e}"))
    })?;

    loop {
        let cargo_toml = current_dir.join("Cargo.toml");
        if cargo_toml.exists() {
            let content = std::fs::read_to_string(&cargo_toml).map_err(|e| {
                TestHelperError::ProjectRootNotFound(format!("Failed to read Cargo.toml: {e}"))
            })?;

            if content.contains("[workspace]") {
                return Ok(current_dir);
            }
        }

        if !current_dir.pop() {
            break;
        }
    }

    Err(TestHelperError::ProjectRootNotFound(
        "Workspace root not found".to_string(),
    ))
}

static PROJECT_ROOT: Lazy<PathBuf> =
    Lazy::new(|| find_project_root().expect("Failed to find project root directory"));

/// `<workspace>/test_output`, created on first use.
pub fn get_output_dir() -> PathBuf {
    let output_dir = PROJECT_ROOT.join("test_output");

    if !output_dir.exists() {
        std::fs::create_dir_all(&output_dir).expect("Failed to create output directory");
    }

    output_dir
}

/// Path below the test output directory; parent directories are created.
pub fn output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = get_output_dir().join(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create output subdirectory");
    }
    path
}
