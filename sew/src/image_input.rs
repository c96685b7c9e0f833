//! Resolution of an image argument to a FITS file SExtractor can read.

use ndarray::Array2;
use std::path::{Path, PathBuf};

use crate::artifacts::{Artifact, ArtifactKind, ArtifactSet};
use crate::errors::SewError;
use crate::fits_io::{self, FitsHeader};

/// Image handed to a run: a FITS file on disk or pixels in memory.
#[derive(Debug, Clone)]
pub enum ImageInput {
    Path(PathBuf),
    Pixels(Array2<f64>),
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        ImageInput::Path(path)
    }
}

impl From<&Path> for ImageInput {
    fn from(path: &Path) -> Self {
        ImageInput::Path(path.to_path_buf())
    }
}

impl From<&str> for ImageInput {
    fn from(path: &str) -> Self {
        ImageInput::Path(PathBuf::from(path))
    }
}

impl From<Array2<f64>> for ImageInput {
    fn from(pixels: Array2<f64>) -> Self {
        ImageInput::Pixels(pixels)
    }
}

/// Make sure the image exists as a FITS file, writing a temporary one if needed.
///
/// A path without a header override is used as is and tagged as kept. In every
/// other case the pixels (read from the path, or taken from memory) are written
/// to `{tmp_dir}/se_temp[_{run_label}].fits` together with the header override,
/// and the returned artifact is tagged as temporary.
///
/// # Errors
/// `InvalidInput` for an empty or non-existent path, or an empty pixel array.
pub fn prepare_image_file(
    input: &ImageInput,
    header: Option<&FitsHeader>,
    tmp_dir: &Path,
    run_label: Option<&str>,
) -> Result<Artifact, SewError> {
    if let ImageInput::Path(path) = input {
        if path.as_os_str().is_empty() {
            return Err(SewError::InvalidInput("empty image path".to_string()));
        }
        if !path.exists() {
            return Err(SewError::InvalidInput(format!(
                "{} does not exist",
                path.display()
            )));
        }
        if header.is_none() {
            return Ok(Artifact::kept(path));
        }
    }

    let read_pixels;
    let pixels = match input {
        ImageInput::Path(path) => {
            read_pixels = fits_io::read_image(path)?;
            &read_pixels
        }
        ImageInput::Pixels(pixels) => pixels,
    };

    let (rows, cols) = pixels.dim();
    if rows == 0 || cols == 0 {
        return Err(SewError::InvalidInput(format!(
            "pixel array has an empty axis ({rows}x{cols})"
        )));
    }

    // A write that fails part way must not leave the file behind.
    let mut staged = ArtifactSet::new();
    let fits_path = staged.track(Artifact::temporary(
        ArtifactKind::Image.temp_path(tmp_dir, run_label),
    ));
    log::debug!("Writing temporary fits file {}", fits_path.display());
    fits_io::write_image(&fits_path, pixels, header)?;
    staged.release();

    Ok(Artifact::temporary(fits_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fitsio::compat::fitsfile::FitsFile;
    use tempfile::TempDir;

    #[test]
    fn test_path_without_header_is_passed_through() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("science.fits");
        fits_io::write_image(&image, &Array2::zeros((4, 4)), None).unwrap();

        let artifact =
            prepare_image_file(&ImageInput::from(image.as_path()), None, dir.path(), None)
                .unwrap();

        assert_eq!(artifact.path(), image.as_path());
        assert!(!artifact.is_auto_created());
        assert!(!dir.path().join("se_temp.fits").exists());
    }

    #[test]
    fn test_pixels_are_written_to_labelled_temp_file() {
        let dir = TempDir::new().unwrap();
        let pixels = Array2::from_elem((6, 8), 3.0);

        let artifact =
            prepare_image_file(&pixels.into(), None, dir.path(), Some("chip2")).unwrap();

        assert_eq!(artifact.path(), dir.path().join("se_temp_chip2.fits"));
        assert!(artifact.is_auto_created());
        let read_back = fits_io::read_image(artifact.path()).unwrap();
        assert_eq!(read_back.dim(), (6, 8));
        assert_relative_eq!(read_back[[5, 7]], 3.0);
    }

    #[test]
    fn test_header_override_forces_a_copy() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("science.fits");
        fits_io::write_image(&image, &Array2::from_elem((2, 3), 7.0), None).unwrap();
        let header = FitsHeader::new().with("GAIN", 2.0).with("OBJECT", "NGC 253");

        let artifact = prepare_image_file(
            &ImageInput::from(image.as_path()),
            Some(&header),
            dir.path(),
            None,
        )
        .unwrap();

        assert!(artifact.is_auto_created());
        assert_eq!(artifact.path(), dir.path().join("se_temp.fits"));
        assert_eq!(fits_io::read_image(artifact.path()).unwrap().dim(), (2, 3));

        let fptr = FitsFile::open(artifact.path()).unwrap();
        let hdu = fptr.hdu(1).unwrap();
        assert_relative_eq!(hdu.read_key::<f64>(&fptr, "GAIN").unwrap(), 2.0);
        assert_eq!(hdu.read_key::<String>(&fptr, "OBJECT").unwrap(), "NGC 253");
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        // '.' is not a legal keyword character, so the card after it cannot be added.
        let header = FitsHeader::new().with("BAD.KEY", 1.0).with("GAIN", 2.0);

        let result = prepare_image_file(
            &Array2::from_elem((3, 3), 1.0).into(),
            Some(&header),
            dir.path(),
            Some("broken"),
        );

        assert!(matches!(result, Err(SewError::Fits(_))));
        assert!(!dir.path().join("se_temp_broken.fits").exists());
    }

    #[test]
    fn test_invalid_inputs() {
        let dir = TempDir::new().unwrap();

        let empty = prepare_image_file(&ImageInput::from(""), None, dir.path(), None);
        assert!(matches!(empty, Err(SewError::InvalidInput(_))));

        let missing = prepare_image_file(
            &ImageInput::from(dir.path().join("nope.fits")),
            None,
            dir.path(),
            None,
        );
        assert!(matches!(missing, Err(SewError::InvalidInput(_))));

        let no_pixels =
            prepare_image_file(&Array2::<f64>::zeros((0, 5)).into(), None, dir.path(), None);
        assert!(matches!(no_pixels, Err(SewError::InvalidInput(_))));
    }
}
