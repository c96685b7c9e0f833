//! FITS image I/O for the files exchanged with SExtractor.
//!
//! Images are stored without any axis flip: row 0 of an array is the first
//! FITS row, which SExtractor reports as y = 1.

use fitsio::compat::fitsfile::FitsFile;
use fitsio::compat::images::{ImageDescription, ImageType, ReadImage, WriteImage};
use ndarray::Array2;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during FITS file operations
#[derive(Error, Debug)]
pub enum FitsError {
    #[error("FITS I/O error: {0}")]
    FitsIo(#[from] fitsio::compat::errors::Error),
    #[error("no 2-D image HDU found in {0}")]
    NoImage(String),
    #[error("Invalid data type in HDU: {0}")]
    InvalidDataType(String),
}

/// Scalar value of a FITS header card.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for HeaderValue {
    fn from(value: i64) -> Self {
        HeaderValue::Int(value)
    }
}

impl From<f64> for HeaderValue {
    fn from(value: f64) -> Self {
        HeaderValue::Float(value)
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Text(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Text(value)
    }
}

/// Structural keywords written by the FITS writer itself.
const RESERVED_KEYS: [&str; 6] = ["SIMPLE", "BITPIX", "NAXIS", "NAXIS1", "NAXIS2", "EXTEND"];

/// Ordered set of header cards written alongside an image.
///
/// Keys are stored uppercase; inserting an existing key replaces its value
/// in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitsHeader {
    cards: Vec<(String, HeaderValue)>,
}

impl FitsHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FitsHeader::insert`].
    pub fn with(mut self, key: &str, value: impl Into<HeaderValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<HeaderValue>) {
        let key = key.to_uppercase();
        let value = value.into();
        match self.cards.iter_mut().find(|(k, _)| *k == key) {
            Some(card) => card.1 = value,
            None => self.cards.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        let key = key.to_uppercase();
        self.cards.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.cards.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Read the first 2-D image HDU of a FITS file as `f64` pixels.
pub fn read_image<P: AsRef<Path>>(path: P) -> Result<Array2<f64>, FitsError> {
    let fptr = FitsFile::open(&path)?;

    let mut hdu_idx = 0;
    while let Ok(hdu) = fptr.hdu(hdu_idx) {
        let naxis = hdu.read_key::<i64>(&fptr, "NAXIS").unwrap_or(0);

        if naxis == 2 {
            let naxis1 = hdu.read_key::<i64>(&fptr, "NAXIS1").unwrap_or(0) as usize;
            let naxis2 = hdu.read_key::<i64>(&fptr, "NAXIS2").unwrap_or(0) as usize;
            let image_data = f64::read_image(&fptr, &hdu)?;

            return Array2::from_shape_vec((naxis2, naxis1), image_data).map_err(|_| {
                FitsError::InvalidDataType(format!(
                    "Cannot reshape image data for HDU {hdu_idx} ({naxis2}x{naxis1})"
                ))
            });
        }

        hdu_idx += 1;
    }

    Err(FitsError::NoImage(path.as_ref().display().to_string()))
}

/// Write `f64` pixels to a new FITS file, replacing any existing file.
///
/// The file holds an empty primary HDU followed by a single `IMAGE`
/// extension with the pixels. Header cards go into the extension, after its
/// structural keywords.
pub fn write_image<P: AsRef<Path>>(
    path: P,
    pixels: &Array2<f64>,
    header: Option<&FitsHeader>,
) -> Result<(), FitsError> {
    let (height, width) = pixels.dim();
    let image_description = ImageDescription {
        data_type: ImageType::Double,
        dimensions: vec![width, height],
    };

    let mut fptr = FitsFile::create(&path).overwrite().open()?;
    let hdu = fptr.create_image("IMAGE", &image_description)?;

    let flat_data: Vec<f64> = pixels.iter().copied().collect();
    f64::write_image(&mut fptr, &hdu, &flat_data)?;

    if let Some(header) = header {
        for (key, value) in header.iter() {
            if RESERVED_KEYS.contains(&key) {
                log::debug!("skipping structural header keyword {key}");
                continue;
            }
            match value {
                HeaderValue::Int(v) => hdu.write_key(&mut fptr, key, v)?,
                HeaderValue::Float(v) => hdu.write_key(&mut fptr, key, v)?,
                HeaderValue::Text(v) => hdu.write_key(&mut fptr, key, v)?,
            }
        }
    }

    Ok(())
}

/// Write a boolean mask as an 8-bit FITS image (1 = set, 0 = clear).
pub fn write_mask<P: AsRef<Path>>(path: P, mask: &Array2<bool>) -> Result<(), FitsError> {
    let (height, width) = mask.dim();
    let image_description = ImageDescription {
        data_type: ImageType::UnsignedByte,
        dimensions: vec![width, height],
    };

    let mut fptr = FitsFile::create(&path).overwrite().open()?;
    let hdu = fptr.create_image("MASK", &image_description)?;

    let flat_data: Vec<u8> = mask.iter().map(|&set| u8::from(set)).collect();
    u8::write_image(&mut fptr, &hdu, &flat_data)?;

    Ok(())
}
