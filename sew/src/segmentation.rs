//! Object masks, sky models and source maps built from SExtractor products.

use ndarray::{Array2, Zip};
use std::path::Path;

use crate::artifacts::{Artifact, ArtifactKind, ArtifactSet};
use crate::catalog::Catalog;
use crate::errors::SewError;
use crate::fits_io;
use crate::image_input::ImageInput;
use crate::run_config::RunConfig;
use crate::sextractor::SourceExtractor;

/// Default dilation window for object masks, in pixels.
pub const DEFAULT_DILATE_NPIX: usize = 5;

/// Run SExtractor with a check image of `check_type` and read that image back.
///
/// The check image lands at `check_path` when given (and is kept), otherwise
/// in a temporary file of `kind` that is removed afterwards.
fn run_with_check_image(
    extractor: &SourceExtractor,
    image: &ImageInput,
    config: &RunConfig,
    check_type: &str,
    kind: ArtifactKind,
    check_path: Option<&Path>,
) -> Result<Array2<f64>, SewError> {
    let mut artifacts = ArtifactSet::new();
    let check_path = match check_path {
        Some(path) => artifacts.track(Artifact::kept(path)),
        None => artifacts.track(Artifact::temporary(
            kind.temp_path(&config.tmp_path, config.run_label()),
        )),
    };

    let config = config
        .clone()
        .with_option("CHECKIMAGE_TYPE", check_type)
        .with_option("CHECKIMAGE_NAME", check_path.as_path());
    extractor.run(image, &config)?;

    let pixels = fits_io::read_image(&check_path)?;
    artifacts.cleanup();
    Ok(pixels)
}

/// Boolean mask of the pixels SExtractor assigned to detected objects.
///
/// The `OBJECTS` check image is grown with a flat
/// `dilate_npix` × `dilate_npix` grey dilation (skipped for 0) and then
/// thresholded at zero.
pub fn create_object_mask(
    extractor: &SourceExtractor,
    image: &ImageInput,
    config: &RunConfig,
    mask_path: Option<&Path>,
    dilate_npix: usize,
) -> Result<Array2<bool>, SewError> {
    let mut objects = run_with_check_image(
        extractor,
        image,
        config,
        "OBJECTS",
        ArtifactKind::ObjectMask,
        mask_path,
    )?;

    if dilate_npix > 0 {
        log::debug!("Dilating object mask with dilate_npix = {dilate_npix}");
        objects = grey_dilation(&objects, dilate_npix);
    }

    Ok(objects.mapv(|v| v > 0.0))
}

/// Background map estimated by SExtractor.
pub fn create_sky_model(
    extractor: &SourceExtractor,
    image: &ImageInput,
    config: &RunConfig,
    sky_path: Option<&Path>,
) -> Result<Array2<f64>, SewError> {
    run_with_check_image(
        extractor,
        image,
        config,
        "BACKGROUND",
        ArtifactKind::SkyModel,
        sky_path,
    )
}

/// Flat grey-scale dilation: every pixel becomes the maximum of the
/// `size` × `size` window around it.
///
/// The window spans offsets `-(size-1)/2 ..= size/2` on each axis, so even
/// windows reach one pixel further forward than backward. It is clipped at the
/// image edges, which gives the same maxima as a mirrored border.
pub fn grey_dilation(image: &Array2<f64>, size: usize) -> Array2<f64> {
    if size <= 1 || image.is_empty() {
        return image.clone();
    }
    let before = (size - 1) / 2;
    let after = size / 2;
    let (rows, cols) = image.dim();

    // The flat window is separable: dilate along rows, then along columns.
    let mut horizontal = Array2::zeros((rows, cols));
    Zip::indexed(&mut horizontal).par_for_each(|(r, c), out| {
        let lo = c.saturating_sub(before);
        let hi = (c + after).min(cols - 1);
        *out = (lo..=hi)
            .map(|cc| image[[r, cc]])
            .fold(f64::NEG_INFINITY, f64::max);
    });

    let mut dilated = Array2::zeros((rows, cols));
    Zip::indexed(&mut dilated).par_for_each(|(r, c), out| {
        let lo = r.saturating_sub(before);
        let hi = (r + after).min(rows - 1);
        *out = (lo..=hi)
            .map(|rr| horizontal[[rr, c]])
            .fold(f64::NEG_INFINITY, f64::max);
    });

    dilated
}

/// Catalog columns holding source position and brightness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceColumns {
    pub x: String,
    pub y: String,
    pub flux: String,
}

impl Default for SourceColumns {
    fn default() -> Self {
        Self {
            x: "X_IMAGE".to_string(),
            y: "Y_IMAGE".to_string(),
            flux: "FLUX_AUTO".to_string(),
        }
    }
}

/// Image of `shape` (rows, cols) with 1 at the brightest `max_num_sources`
/// catalog positions and 0 everywhere else.
///
/// Positions use SExtractor's 1-based pixel convention and are truncated to
/// whole pixels; sources falling outside the image or without a finite
/// position are skipped.
pub fn create_source_map(
    catalog: &Catalog,
    shape: (usize, usize),
    max_num_sources: usize,
    columns: &SourceColumns,
) -> Result<Array2<u8>, SewError> {
    let column = |name: &str| {
        catalog
            .column(name)
            .ok_or_else(|| SewError::MissingColumn(name.to_string()))
    };
    let x = column(&columns.x)?;
    let y = column(&columns.y)?;
    let flux = column(&columns.flux)?;

    let mut order: Vec<usize> = (0..catalog.len()).collect();
    order.sort_by(|&a, &b| flux[b].total_cmp(&flux[a]));

    let (rows, cols) = shape;
    let mut source_map = Array2::zeros(shape);
    for idx in order.into_iter().take(max_num_sources) {
        if !x[idx].is_finite() || !y[idx].is_finite() {
            log::debug!("source at ({}, {}) has no usable position", x[idx], y[idx]);
            continue;
        }
        let col = x[idx].trunc() - 1.0;
        let row = y[idx].trunc() - 1.0;
        if row < 0.0 || col < 0.0 || row >= rows as f64 || col >= cols as f64 {
            log::debug!("source at ({}, {}) is outside the image", x[idx], y[idx]);
            continue;
        }
        source_map[[row as usize, col as usize]] = 1;
    }

    Ok(source_map)
}
