//! Temporary file bookkeeping for a single SExtractor run.
//!
//! Every file a run touches is tracked as an [`Artifact`]. Files the wrapper
//! created on its own are removed when the owning [`ArtifactSet`] is dropped,
//! so a failed run cleans up exactly like a successful one.

use std::path::{Path, PathBuf};

/// The kinds of files a run may write into the temporary directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Pixels written out for SExtractor to read
    Image,
    /// Custom measurement parameter list
    ParameterList,
    /// Output catalog
    Catalog,
    /// OBJECTS check image
    ObjectMask,
    /// BACKGROUND check image
    SkyModel,
}

impl ArtifactKind {
    fn stem_and_extension(self) -> (&'static str, &'static str) {
        match self {
            ArtifactKind::Image => ("se_temp", "fits"),
            ArtifactKind::ParameterList => ("params", "se"),
            ArtifactKind::Catalog => ("se", "cat"),
            ArtifactKind::ObjectMask => ("obj_msk", "fits"),
            ArtifactKind::SkyModel => ("skymodel", "fits"),
        }
    }

    /// File name following `{stem}[_{run_label}].{ext}`.
    pub fn file_name(self, run_label: Option<&str>) -> String {
        let (stem, ext) = self.stem_and_extension();
        match run_label {
            Some(label) => format!("{stem}_{label}.{ext}"),
            None => format!("{stem}.{ext}"),
        }
    }

    pub fn temp_path(self, tmp_dir: &Path, run_label: Option<&str>) -> PathBuf {
        tmp_dir.join(self.file_name(run_label))
    }
}

/// A file used by a run, tagged with whether the wrapper created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    path: PathBuf,
    auto_created: bool,
}

impl Artifact {
    /// A file the wrapper owns and must delete.
    pub fn temporary(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            auto_created: true,
        }
    }

    /// A file supplied or requested by the caller; never deleted.
    pub fn kept(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            auto_created: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_auto_created(&self) -> bool {
        self.auto_created
    }
}

/// Scoped owner of the artifacts of one run.
#[derive(Debug, Default)]
pub struct ArtifactSet {
    artifacts: Vec<Artifact>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking an artifact and hand back its path.
    pub fn track(&mut self, artifact: Artifact) -> PathBuf {
        let path = artifact.path.clone();
        self.artifacts.push(artifact);
        path
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn temporary_paths(&self) -> impl Iterator<Item = &Path> {
        self.artifacts
            .iter()
            .filter(|a| a.auto_created)
            .map(|a| a.path.as_path())
    }

    /// Stop tracking every artifact without deleting anything.
    pub fn release(mut self) -> Vec<Artifact> {
        std::mem::take(&mut self.artifacts)
    }

    /// Delete every auto-created artifact and stop tracking all of them.
    ///
    /// Files that were never produced are skipped. Removal failures are
    /// logged rather than returned.
    pub fn cleanup(&mut self) {
        for artifact in self.artifacts.drain(..) {
            if !artifact.auto_created {
                continue;
            }
            if !artifact.path.exists() {
                log::debug!(
                    "temporary file {} was never created",
                    artifact.path.display()
                );
                continue;
            }
            log::debug!("deleting temporary file {}", artifact.path.display());
            if let Err(e) = std::fs::remove_file(&artifact.path) {
                log::warn!(
                    "failed to delete temporary file {}: {e}",
                    artifact.path.display()
                );
            }
        }
    }
}

impl Drop for ArtifactSet {
    fn drop(&mut self) {
        self.cleanup();
    }
}
