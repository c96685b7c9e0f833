//! Canned SExtractor runs for common tasks.

use crate::catalog::Catalog;
use crate::errors::SewError;
use crate::image_input::ImageInput;
use crate::run_config::RunConfig;
use crate::sextractor::SourceExtractor;

/// Row selection for isolated, well-measured point sources.
///
/// Bounds on `ISOAREA_IMAGE` and `FWHM_IMAGE` are exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct StarQuery {
    /// Required `FLAGS` value; any flags are accepted when `None`
    pub flags: Option<i64>,
    pub isoarea: (f64, f64),
    pub fwhm: (f64, f64),
}

impl Default for StarQuery {
    fn default() -> Self {
        Self {
            flags: Some(0),
            isoarea: (10.0, 100.0),
            fwhm: (1.0, 5.0),
        }
    }
}

impl StarQuery {
    /// Rows of `catalog` that pass the query.
    pub fn apply(&self, catalog: &Catalog) -> Result<Catalog, SewError> {
        let mut required = vec!["ISOAREA_IMAGE", "FWHM_IMAGE"];
        if self.flags.is_some() {
            required.push("FLAGS");
        }
        if let Some(missing) = required.iter().find(|name| !catalog.has_column(name)) {
            return Err(SewError::MissingColumn(missing.to_string()));
        }

        let within = |value: Option<f64>, (lo, hi): (f64, f64)| {
            value.is_some_and(|v| v > lo && v < hi)
        };

        Ok(catalog.filter(|row| {
            let flags_ok = match self.flags {
                Some(flags) => row.get("FLAGS") == Some(flags as f64),
                None => true,
            };
            flags_ok
                && within(row.get("ISOAREA_IMAGE"), self.isoarea)
                && within(row.get("FWHM_IMAGE"), self.fwhm)
        }))
    }
}

/// Detect only bright sources and keep those matching `query`.
///
/// `DETECT_MINAREA` and `DETECT_THRESH` default to 5 and 10 unless set in
/// `config`; `ANALYSIS_THRESH` is always 1.5.
pub fn extract_bright_stars(
    extractor: &SourceExtractor,
    image: &ImageInput,
    config: &RunConfig,
    query: &StarQuery,
) -> Result<Catalog, SewError> {
    let mut config = config.clone();
    if !config.options.contains("DETECT_MINAREA") {
        config.options.set("DETECT_MINAREA", 5);
    }
    if !config.options.contains("DETECT_THRESH") {
        config.options.set("DETECT_THRESH", 10);
    }
    config.options.set("ANALYSIS_THRESH", 1.5);

    let catalog = extractor.run(image, &config)?;
    let stars = query.apply(&catalog)?;
    log::debug!("{} of {} sources pass the star query", stars.len(), catalog.len());
    Ok(stars)
}
