//! Run the Source Extractor (SExtractor) executable from Rust.
//!
//! The executable is treated as a black box: the wrapper stages the image as
//! a FITS file, assembles the command line from [`Options`], waits for the
//! process and parses the resulting `ASCII_HEAD` catalog into a [`Catalog`].
//! Option and parameter names are checked against the vocabulary the
//! executable reports about itself (`-dd` / `-dp`), so misspelled names are
//! dropped with a warning instead of aborting the run.
//!
//! # Modules
//! - [`sextractor`] - discovery and the main run loop
//! - [`segmentation`] - object masks, sky models and source maps
//! - [`routines`] - canned runs such as bright-star extraction
//! - [`catalog`] - the catalog table and its parser
//! - [`fits_io`] - reading and writing FITS images
//!
//! The executable is located through the `SE_EXECUTABLE` environment variable:
//!
//! ```no_run
//! use sew::{ImageInput, RunConfig};
//!
//! let catalog = sew::run(
//!     &ImageInput::from("frame.fits"),
//!     &RunConfig::default().with_option("DETECT_THRESH", 5.0),
//! )?;
//! println!("{} sources", catalog.len());
//! # Ok::<(), sew::SewError>(())
//! ```

pub mod artifacts;
pub mod catalog;
pub mod command;
pub mod errors;
pub mod fits_io;
pub mod image_input;
pub mod input_files;
pub mod options;
pub mod params;
pub mod routines;
pub mod run_config;
pub mod segmentation;
pub mod sextractor;
pub mod vocabulary;

pub use catalog::{Catalog, CatalogFormat, CatalogRow};
pub use errors::SewError;
pub use fits_io::{FitsError, FitsHeader, HeaderValue};
pub use image_input::ImageInput;
pub use options::{OptionValue, Options};
pub use params::ExtraParams;
pub use routines::{extract_bright_stars, StarQuery};
pub use run_config::RunConfig;
pub use segmentation::{
    create_object_mask, create_sky_model, create_source_map, SourceColumns, DEFAULT_DILATE_NPIX,
};
pub use sextractor::{run, SourceExtractor};
pub use vocabulary::{Vocabulary, SE_EXECUTABLE_ENV};
