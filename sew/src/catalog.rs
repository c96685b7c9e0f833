//! Detection catalogs produced by SExtractor.
//!
//! Only the `ASCII_HEAD` catalog type is read: a block of `#` header lines
//! naming each column by its 1-based index, followed by whitespace separated
//! rows of numbers, one per detected source.

use ndarray::{Array2, ArrayView1, Axis};
use std::path::Path;

use crate::errors::SewError;
use crate::options::OptionValue;
use crate::params::lookup_key;

/// Catalog formats the wrapper knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogFormat {
    #[default]
    AsciiHead,
}

impl CatalogFormat {
    /// Resolve the `CATALOG_TYPE` option; absent means the default text format.
    pub fn from_catalog_type(value: Option<&OptionValue>) -> Result<Self, SewError> {
        match value {
            None => Ok(CatalogFormat::AsciiHead),
            Some(value) => {
                let name = value.to_string();
                if name.trim().eq_ignore_ascii_case("ASCII_HEAD") {
                    Ok(CatalogFormat::AsciiHead)
                } else {
                    Err(SewError::UnsupportedCatalogFormat(name))
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogFormat::AsciiHead => "ASCII_HEAD",
        }
    }
}

/// Table of detected sources: one row per source, one named column per
/// measured quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    columns: Vec<String>,
    data: Array2<f64>,
}

/// A borrowed row of a [`Catalog`].
#[derive(Debug, Clone)]
pub struct CatalogRow<'a> {
    columns: &'a [String],
    values: ArrayView1<'a, f64>,
}

impl CatalogRow<'_> {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| self.values[idx])
    }

    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }
}

impl Catalog {
    /// Build a catalog from column names and a rows × columns array.
    ///
    /// # Panics
    /// If the number of names differs from the number of array columns.
    pub fn new(columns: Vec<String>, data: Array2<f64>) -> Self {
        assert_eq!(
            columns.len(),
            data.ncols(),
            "column names must match the data width"
        );
        Self { columns, data }
    }

    /// Read a catalog file written by SExtractor.
    pub fn read(path: &Path, format: CatalogFormat) -> Result<Self, SewError> {
        Self::read_with_params(path, format, &[])
    }

    /// Read a catalog produced from the parameter list `params`.
    ///
    /// The list (as written to the parameter file, e.g. `FLUX_APER(3)`)
    /// sizes a trailing vector column when the catalog has no rows.
    pub fn read_with_params(
        path: &Path,
        format: CatalogFormat,
        params: &[String],
    ) -> Result<Self, SewError> {
        if !path.exists() {
            return Err(SewError::MissingCatalog(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|e| SewError::io(path, e))?;
        match format {
            CatalogFormat::AsciiHead => Self::parse_ascii_head(&text, path, params),
        }
    }

    /// Parse `ASCII_HEAD` text; `path` is only used in error messages.
    ///
    /// Vector parameters occupy several columns but are declared once; the
    /// extra columns are named `NAME_1`, `NAME_2`, ... The last column's
    /// width comes from the data rows, or from `params` when there are none.
    pub fn parse_ascii_head(text: &str, path: &Path, params: &[String]) -> Result<Self, SewError> {
        let parse_error = |line: usize, reason: String| SewError::CatalogParse {
            path: path.to_path_buf(),
            line,
            reason,
        };

        let mut declared: Vec<(usize, String, usize)> = Vec::new();
        let mut flat: Vec<f64> = Vec::new();
        let mut width: Option<usize> = None;
        let mut first_data_line = 0;
        let mut n_rows = 0;

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(header) = trimmed.strip_prefix('#') {
                let mut tokens = header.split_whitespace();
                let index = tokens.next().and_then(|t| t.parse::<usize>().ok());
                match (index, tokens.next()) {
                    (Some(index), Some(name)) => {
                        if let Some((last, _, _)) = declared.last() {
                            if index <= *last {
                                return Err(parse_error(
                                    line_no,
                                    format!("column index {index} is not increasing"),
                                ));
                            }
                        }
                        declared.push((index, name.to_string(), line_no));
                    }
                    _ => log::debug!("ignoring catalog comment on line {line_no}"),
                }
                continue;
            }

            let row = trimmed
                .split_whitespace()
                .map(|token| {
                    token
                        .parse::<f64>()
                        .map_err(|_| parse_error(line_no, format!("{token:?} is not a number")))
                })
                .collect::<Result<Vec<f64>, SewError>>()?;

            match width {
                None => {
                    width = Some(row.len());
                    first_data_line = line_no;
                }
                Some(w) if w != row.len() => {
                    return Err(parse_error(
                        line_no,
                        format!("expected {w} values, found {}", row.len()),
                    ));
                }
                Some(_) => {}
            }
            flat.extend(row);
            n_rows += 1;
        }

        if declared.is_empty() {
            return Err(parse_error(0, "no column header found".to_string()));
        }

        let first_index = declared[0].0;
        if first_index != 1 {
            return Err(parse_error(
                declared[0].2,
                format!("first column index is {first_index}, expected 1"),
            ));
        }

        let mut columns = Vec::new();
        for (i, (index, name, _)) in declared.iter().enumerate() {
            let span = match declared.get(i + 1) {
                Some((next, _, _)) => next - index,
                None => match width {
                    Some(w) => (w + 1).saturating_sub(*index).max(1),
                    None => declared_width(params, name).unwrap_or(1),
                },
            };
            columns.push(name.clone());
            columns.extend((1..span).map(|k| format!("{name}_{k}")));
        }

        let n_cols = columns.len();
        if let Some(w) = width {
            if w != n_cols {
                return Err(parse_error(
                    first_data_line,
                    format!("header declares {n_cols} columns but rows have {w} values"),
                ));
            }
        }

        let data = Array2::from_shape_vec((n_rows, n_cols), flat)
            .map_err(|e| parse_error(first_data_line, e.to_string()))?;

        Ok(Self { columns, data })
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name)
            .map(|idx| self.data.index_axis(Axis(1), idx))
    }

    pub fn row(&self, idx: usize) -> Option<CatalogRow<'_>> {
        (idx < self.len()).then(|| CatalogRow {
            columns: &self.columns,
            values: self.data.index_axis(Axis(0), idx),
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = CatalogRow<'_>> {
        self.data.axis_iter(Axis(0)).map(|values| CatalogRow {
            columns: &self.columns,
            values,
        })
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// New catalog with the rows for which `keep` returns true.
    pub fn filter<F>(&self, mut keep: F) -> Catalog
    where
        F: FnMut(&CatalogRow<'_>) -> bool,
    {
        let kept: Vec<usize> = self
            .rows()
            .enumerate()
            .filter(|(_, row)| keep(row))
            .map(|(idx, _)| idx)
            .collect();

        Catalog {
            columns: self.columns.clone(),
            data: self.data.select(Axis(0), &kept),
        }
    }
}

/// Element count of `name` in a parameter list, from its `(n)` suffix.
fn declared_width(params: &[String], name: &str) -> Option<usize> {
    params
        .iter()
        .find(|p| lookup_key(p) == name)
        .and_then(|p| p.split_once('('))
        .and_then(|(_, rest)| rest.strip_suffix(')'))
        .and_then(|n| n.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    const CATALOG: &str = "\
#   1 X_IMAGE                Object position along x                                    [pixel]
#   2 Y_IMAGE                Object position along y                                    [pixel]
#   3 FLUX_APER              Flux vector within fixed circular aperture(s)              [count]
#   6 FLAGS                  Extraction flags
   10.500   20.250   100.0   200.0   300.0   0
  110.000   42.000    50.0    60.0    70.0   3
";

    fn parse(text: &str) -> Result<Catalog, SewError> {
        Catalog::parse_ascii_head(text, Path::new("test.cat"), &[])
    }

    #[test]
    fn test_parse_names_vector_columns() {
        let catalog = parse(CATALOG).unwrap();
        assert_eq!(
            catalog.column_names(),
            ["X_IMAGE", "Y_IMAGE", "FLUX_APER", "FLUX_APER_1", "FLUX_APER_2", "FLAGS"]
        );
        assert_eq!(catalog.len(), 2);
        assert_relative_eq!(catalog.column("FLUX_APER_2").unwrap()[0], 300.0);
        assert_relative_eq!(catalog.row(1).unwrap().get("FLAGS").unwrap(), 3.0);
    }

    #[test]
    fn test_trailing_vector_column_uses_row_width() {
        let text = "#   1 NUMBER  Running object number\n#   2 MAG_APER  mags\n 1 20.1 20.5 21.0\n";
        let catalog = parse(text).unwrap();
        assert_eq!(catalog.column_names(), ["NUMBER", "MAG_APER", "MAG_APER_1", "MAG_APER_2"]);
    }

    #[test]
    fn test_empty_catalog_keeps_columns() {
        let text = "#   1 X_IMAGE  x\n#   2 Y_IMAGE  y\n";
        let catalog = parse(text).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.num_columns(), 2);
        assert_eq!(catalog.data().dim(), (0, 2));
    }

    #[test]
    fn test_empty_catalog_sizes_vector_column_from_params() {
        let text = "#   1 NUMBER  Running object number\n#   2 FLUX_APER  flux\n";
        let params = vec!["NUMBER".to_string(), "FLUX_APER(3)".to_string()];

        let catalog = Catalog::parse_ascii_head(text, Path::new("test.cat"), &params).unwrap();

        assert!(catalog.is_empty());
        assert_eq!(
            catalog.column_names(),
            ["NUMBER", "FLUX_APER", "FLUX_APER_1", "FLUX_APER_2"]
        );
        assert_eq!(catalog.data().dim(), (0, 4));
    }

    #[test]
    fn test_declared_width() {
        let params = vec!["X_IMAGE".to_string(), "MAG_APER(4)".to_string()];
        assert_eq!(declared_width(&params, "MAG_APER"), Some(4));
        assert_eq!(declared_width(&params, "X_IMAGE"), None);
        assert_eq!(declared_width(&params, "FLAGS"), None);
    }

    #[test]
    fn test_malformed_catalogs() {
        assert!(matches!(
            parse("#   1 X_IMAGE  x\nabc\n"),
            Err(SewError::CatalogParse { line: 2, .. })
        ));
        assert!(matches!(
            parse("#   1 X_IMAGE  x\n#   2 Y_IMAGE  y\n1 2\n3\n"),
            Err(SewError::CatalogParse { line: 4, .. })
        ));
        assert!(matches!(
            parse("1 2 3\n"),
            Err(SewError::CatalogParse { .. })
        ));
        assert!(matches!(
            parse("#   1 X_IMAGE  x\n#   2 Y_IMAGE  y\n#   3 FLAGS  f\n1 2\n"),
            Err(SewError::CatalogParse { line: 4, .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = Catalog::read(Path::new("/nonexistent/se.cat"), CatalogFormat::AsciiHead);
        assert!(matches!(result, Err(SewError::MissingCatalog(_))));
    }

    #[test]
    fn test_catalog_format_resolution() {
        assert_eq!(
            CatalogFormat::from_catalog_type(None).unwrap(),
            CatalogFormat::AsciiHead
        );
        assert_eq!(
            CatalogFormat::from_catalog_type(Some(&OptionValue::from("ascii_head"))).unwrap(),
            CatalogFormat::AsciiHead
        );
        assert!(matches!(
            CatalogFormat::from_catalog_type(Some(&OptionValue::from("FITS_LDAC"))),
            Err(SewError::UnsupportedCatalogFormat(name)) if name == "FITS_LDAC"
        ));
    }

    #[test]
    fn test_filter_rows() {
        let catalog = Catalog::new(
            vec!["FLAGS".to_string(), "FLUX_AUTO".to_string()],
            array![[0.0, 10.0], [4.0, 20.0], [0.0, 30.0]],
        );
        let clean = catalog.filter(|row| row.get("FLAGS") == Some(0.0));
        assert_eq!(clean.len(), 2);
        assert_relative_eq!(clean.column("FLUX_AUTO").unwrap()[1], 30.0);
    }
}
