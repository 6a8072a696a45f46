use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Real-valued raster sample (reflectance, radiance, temperature, index)
pub type Sample = f32;

/// 2D raster sample array (rows x cols)
pub type SampleImage = Array2<Sample>;

/// Landsat 8 bands consumed by the LST pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BandId {
    B3,  // Green
    B4,  // Red
    B5,  // Near infrared
    B6,  // Shortwave infrared 1
    B10, // Thermal infrared 1
    B11, // Thermal infrared 2
}

impl BandId {
    /// Every band a scene must provide
    pub const ALL: [BandId; 6] = [
        BandId::B3,
        BandId::B4,
        BandId::B5,
        BandId::B6,
        BandId::B10,
        BandId::B11,
    ];

    /// Band number as used in metadata field names
    pub fn number(&self) -> u8 {
        match self {
            BandId::B3 => 3,
            BandId::B4 => 4,
            BandId::B5 => 5,
            BandId::B6 => 6,
            BandId::B10 => 10,
            BandId::B11 => 11,
        }
    }

    /// Whether the band carries thermal (radiance/K1/K2) coefficients
    pub fn is_thermal(&self) -> bool {
        matches!(self, BandId::B10 | BandId::B11)
    }
}

impl std::fmt::Display for BandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "B{}", self.number())
    }
}

/// Geospatial transformation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Build from a GDAL-ordered coefficient array
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self {
            top_left_x: coeffs[0],
            pixel_width: coeffs[1],
            rotation_x: coeffs[2],
            top_left_y: coeffs[3],
            rotation_y: coeffs[4],
            pixel_height: coeffs[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        // Unit cells anchored at the origin, north-up
        Self::from_gdal([0.0, 1.0, 0.0, 0.0, 0.0, -1.0])
    }
}

/// Spatial placement shared by every grid combined in one run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GridGeometry {
    pub transform: GeoTransform,
    /// Spatial reference as WKT, when known
    pub spatial_ref: Option<String>,
}

/// A single-band raster on a fixed spatial grid
#[derive(Debug, Clone, PartialEq)]
pub struct BandGrid {
    data: SampleImage,
    geometry: GridGeometry,
}

impl BandGrid {
    pub fn new(data: SampleImage, geometry: GridGeometry) -> Self {
        Self { data, geometry }
    }

    /// Grid with default geometry, mostly useful for synthetic inputs
    pub fn from_array(data: SampleImage) -> Self {
        Self::new(data, GridGeometry::default())
    }

    /// Constant-valued grid
    pub fn filled(rows: usize, cols: usize, value: Sample, geometry: GridGeometry) -> Self {
        Self::new(Array2::from_elem((rows, cols), value), geometry)
    }

    pub fn data(&self) -> &SampleImage {
        &self.data
    }

    pub fn into_data(self) -> SampleImage {
        self.data
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Same geometry, new samples
    pub fn with_data(&self, data: SampleImage) -> Self {
        Self {
            data,
            geometry: self.geometry.clone(),
        }
    }

    /// Fail unless `other` sits on exactly the same grid
    pub fn ensure_same_grid(&self, other: &BandGrid) -> LstResult<()> {
        if self.dim() != other.dim() || self.geometry != other.geometry {
            return Err(LstError::GeometryMismatch {
                expected: self.describe_grid(),
                actual: other.describe_grid(),
            });
        }
        Ok(())
    }

    fn describe_grid(&self) -> String {
        let (rows, cols) = self.dim();
        let t = &self.geometry.transform;
        format!(
            "{}x{} cells of {}x{} at ({}, {}){}",
            rows,
            cols,
            t.pixel_width,
            t.pixel_height,
            t.top_left_x,
            t.top_left_y,
            if self.geometry.spatial_ref.is_some() { " [georeferenced]" } else { "" }
        )
    }
}

/// Opaque reference to a grid held by a raster store (a path, a key)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RasterRef(pub String);

impl RasterRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RasterRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The band references of one scene, plus its metadata file when discovered
#[derive(Debug, Clone, Default)]
pub struct BandSet {
    pub bands: HashMap<BandId, RasterRef>,
    pub metadata: Option<PathBuf>,
}

impl BandSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, band: BandId, reference: RasterRef) {
        self.bands.insert(band, reference);
    }

    /// Reference for `band`, or a configuration error naming it
    pub fn get(&self, band: BandId) -> LstResult<&RasterRef> {
        self.bands.get(&band).ok_or(LstError::MissingBand(band))
    }

    /// Fail on the first required band that is absent
    pub fn ensure_complete(&self) -> LstResult<()> {
        for band in BandId::ALL {
            self.get(band)?;
        }
        Ok(())
    }
}

/// Products the pipeline persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProductKind {
    Ndvi,
    Mndwi,
    Ndisi,
    Lst,
}

impl ProductKind {
    pub const ALL: [ProductKind; 4] = [
        ProductKind::Ndvi,
        ProductKind::Mndwi,
        ProductKind::Ndisi,
        ProductKind::Lst,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProductKind::Ndvi => "NDVI",
            ProductKind::Mndwi => "MNDWI",
            ProductKind::Ndisi => "NDISI",
            ProductKind::Lst => "LST",
        }
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for ProductKind {
    type Err = LstError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ProductKind::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LstError::InvalidFormat(format!("Unknown product: {}", s)))
    }
}

/// A computed grid together with the name and reference it was persisted under
#[derive(Debug, Clone)]
pub struct DerivedProduct {
    pub kind: ProductKind,
    pub name: String,
    pub handle: RasterRef,
    pub grid: BandGrid,
}

/// Error types for LST processing
#[derive(Debug, thiserror::Error)]
pub enum LstError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("Metadata field '{0}' not found")]
    MissingMetadataField(String),

    #[error("Band {0} missing from band set")]
    MissingBand(BandId),

    #[error("Calibration coefficient '{0}' missing")]
    MissingCoefficient(String),

    #[error("Band {band} has no {mode} coefficients")]
    UnsupportedBand { band: BandId, mode: String },

    #[error("Metadata field '{field}' is not a number: '{value}'")]
    Parse { field: String, value: String },

    #[error("Grid geometry mismatch: expected {expected}, got {actual}")]
    GeometryMismatch { expected: String, actual: String },

    #[error("Raster not found: {0}")]
    RasterNotFound(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

impl LstError {
    /// Missing bands, fields or coefficients: the run cannot start
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            LstError::MissingMetadataField(_)
                | LstError::MissingBand(_)
                | LstError::MissingCoefficient(_)
                | LstError::UnsupportedBand { .. }
        )
    }
}

/// Result type for LST operations
pub type LstResult<T> = Result<T, LstError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_display_and_numbers() {
        assert_eq!(BandId::B3.to_string(), "B3");
        assert_eq!(BandId::B11.to_string(), "B11");
        assert!(BandId::B10.is_thermal());
        assert!(!BandId::B6.is_thermal());
    }

    #[test]
    fn test_geometry_mismatch_on_shape() {
        let a = BandGrid::filled(2, 2, 1.0, GridGeometry::default());
        let b = BandGrid::filled(2, 3, 1.0, GridGeometry::default());

        let err = a.ensure_same_grid(&b).unwrap_err();
        assert!(matches!(err, LstError::GeometryMismatch { .. }));
    }

    #[test]
    fn test_geometry_mismatch_on_cell_size() {
        let a = BandGrid::filled(2, 2, 1.0, GridGeometry::default());
        let coarse = GridGeometry {
            transform: GeoTransform::from_gdal([0.0, 30.0, 0.0, 0.0, 0.0, -30.0]),
            spatial_ref: None,
        };
        let b = BandGrid::filled(2, 2, 1.0, coarse);

        assert!(a.ensure_same_grid(&b).is_err());
        assert!(a.ensure_same_grid(&a.clone()).is_ok());
    }

    #[test]
    fn test_band_set_reports_missing_band() {
        let mut bands = BandSet::new();
        for band in [BandId::B3, BandId::B4, BandId::B5, BandId::B6, BandId::B10] {
            bands.insert(band, RasterRef::new(format!("{}.TIF", band)));
        }

        let err = bands.ensure_complete().unwrap_err();
        assert!(matches!(err, LstError::MissingBand(BandId::B11)));
        assert!(err.is_configuration_error());
    }
}
