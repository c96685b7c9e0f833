//! Check-image products and canned routines against the mock SExtractor.
//!
//! The mock answers every check-image request with a copy of the input, so
//! the object mask of a zero-background star field is exactly its lit pixels.

use std::fs;
use std::path::PathBuf;

use approx::assert_relative_eq;
use ndarray::Array2;
use sew::{
    create_object_mask, create_sky_model, create_source_map, extract_bright_stars, fits_io,
    ImageInput, RunConfig, SourceColumns, SourceExtractor, StarQuery,
};
use tempfile::TempDir;
use test_helpers::{output_path, synthetic_star_field, MockSextractor};

fn setup(sources: usize) -> (TempDir, MockSextractor, SourceExtractor, RunConfig) {
    let dir = TempDir::new().unwrap();
    let mock = MockSextractor::new(dir.path().join("bin")).with_sources(sources);
    let extractor = SourceExtractor::discover(mock.install()).unwrap();
    let tmp = dir.path().join("tmp");
    fs::create_dir(&tmp).unwrap();
    let config = RunConfig::default().with_tmp_path(tmp);
    (dir, mock, extractor, config)
}

fn leftovers(config: &RunConfig) -> Vec<PathBuf> {
    fs::read_dir(&config.tmp_path)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

fn star_field() -> Array2<f64> {
    synthetic_star_field(48, 64, 6, 2024)
}

#[test]
fn test_object_mask_grows_with_dilation() {
    let (_dir, mock, extractor, config) = setup(50);
    let image = star_field();
    let lit = image.iter().filter(|&&v| v > 0.0).count();
    let input = ImageInput::from(image);

    let mut previous = 0;
    for dilate_npix in [0, 1, 3, 5, 9] {
        let mask = create_object_mask(&extractor, &input, &config, None, dilate_npix).unwrap();
        let masked = mask.iter().filter(|&&set| set).count();
        if dilate_npix <= 1 {
            assert_eq!(masked, lit);
        }
        assert!(masked >= previous, "dilate_npix {dilate_npix} shrank the mask");
        previous = masked;
    }
    assert!(previous > lit);

    let run = mock.runs().pop().unwrap();
    assert!(run.contains("-CHECKIMAGE_TYPE OBJECTS"));
    assert!(run.contains("obj_msk.fits"));
    assert!(leftovers(&config).is_empty(), "left behind: {:?}", leftovers(&config));
}

#[test]
fn test_object_mask_kept_at_requested_path() {
    let (dir, _mock, extractor, config) = setup(50);
    let image = star_field();
    let mask_path = dir.path().join("objects.fits");
    let config = config.with_run_label("keep");

    let mask = create_object_mask(
        &extractor,
        &ImageInput::from(image.clone()),
        &config,
        Some(&mask_path),
        5,
    )
    .unwrap();

    // The kept file holds the undilated check image.
    let kept = fits_io::read_image(&mask_path).unwrap();
    assert_eq!(kept, image);
    assert_eq!(mask.dim(), image.dim());
    assert!(leftovers(&config).is_empty());

    fits_io::write_mask(output_path("sew/object_mask.fits"), &mask).unwrap();
}

#[test]
fn test_sky_model_is_read_back() {
    let (_dir, mock, extractor, config) = setup(50);
    let image = star_field();
    let config = config.with_run_label("sky");

    let sky = create_sky_model(&extractor, &ImageInput::from(image.clone()), &config, None).unwrap();

    assert_eq!(sky.dim(), image.dim());
    for (a, b) in sky.iter().zip(image.iter()) {
        assert_relative_eq!(*a, *b);
    }
    let run = mock.runs().pop().unwrap();
    assert!(run.contains("-CHECKIMAGE_TYPE BACKGROUND"));
    assert!(run.contains("skymodel_sky.fits"));
    assert!(leftovers(&config).is_empty());
}

#[test]
fn test_bright_stars_use_strict_detection() {
    let (dir, mock, extractor, config) = setup(100);
    let image = dir.path().join("frame.fits");
    fits_io::write_image(&image, &star_field(), None).unwrap();

    let stars = extract_bright_stars(
        &extractor,
        &ImageInput::from(image.as_path()),
        &config,
        &StarQuery::default(),
    )
    .unwrap();

    assert_eq!(stars.len(), 10);
    for row in stars.rows() {
        assert_eq!(row.get("FLAGS"), Some(0.0));
    }
    let run = mock.runs().pop().unwrap();
    assert!(run.contains("-DETECT_MINAREA 5"));
    assert!(run.contains("-DETECT_THRESH 10"));
    assert!(run.contains("-ANALYSIS_THRESH 1.5"));
}

#[test]
fn test_bright_stars_respect_caller_threshold() {
    let (dir, mock, extractor, config) = setup(100);
    let image = dir.path().join("frame.fits");
    fits_io::write_image(&image, &star_field(), None).unwrap();
    let config = config
        .with_option("DETECT_THRESH", 3)
        .with_option("ANALYSIS_THRESH", 9.0);

    extract_bright_stars(
        &extractor,
        &ImageInput::from(image.as_path()),
        &config,
        &StarQuery::default(),
    )
    .unwrap();

    let run = mock.runs().pop().unwrap();
    assert!(run.contains("-DETECT_THRESH 3"));
    assert!(run.contains("-ANALYSIS_THRESH 1.5"));
    assert!(!run.contains("-ANALYSIS_THRESH 9"));
}

#[test]
fn test_source_map_from_catalog() {
    let (_dir, _mock, extractor, config) = setup(233);
    let image = star_field();
    let shape = image.dim();

    let catalog = extractor.run(&ImageInput::from(image), &config).unwrap();
    let map = create_source_map(&catalog, shape, 5, &SourceColumns::default()).unwrap();

    // The brightest mock source (k = 1) sits at X_IMAGE = 8, Y_IMAGE = 14.
    assert_eq!(map[[13, 7]], 1);
    assert_eq!(map.iter().filter(|&&v| v == 1).count(), 5);
}
