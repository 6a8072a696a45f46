use crate::io::store::RasterStore;
use crate::types::{BandGrid, GeoTransform, GridGeometry, LstError, LstResult, RasterRef};
use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};
use ndarray::Array2;
use std::path::{Path, PathBuf};

/// GeoTIFF-backed raster store.
///
/// References are file paths. Products are written as single-band `f32`
/// GeoTIFFs named `{name}.tif` inside the output directory.
pub struct GdalStore {
    output_dir: PathBuf,
}

impl GdalStore {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> LstResult<Self> {
        std::fs::create_dir_all(output_dir.as_ref())?;
        Ok(Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn product_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.tif", name))
    }
}

impl RasterStore for GdalStore {
    fn load(&self, reference: &RasterRef) -> LstResult<BandGrid> {
        let path = Path::new(reference.as_str());
        if !path.exists() {
            return Err(LstError::RasterNotFound(reference.to_string()));
        }
        log::info!("Reading raster from: {}", path.display());

        let dataset = Dataset::open(path)?;
        let geo_transform = dataset.geo_transform()?;
        let (width, height) = dataset.raster_size();
        log::debug!("Raster size: {}x{}", width, height);

        let rasterband = dataset.rasterband(1)?;
        let no_data = rasterband.no_data_value();
        let band_data = rasterband.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

        let mut data = Array2::from_shape_vec((height, width), band_data.data)
            .map_err(|e| LstError::Processing(format!("Failed to reshape raster data: {}", e)))?;

        // Nodata cells enter the pipeline as invalid samples
        if let Some(nd) = no_data {
            let nd = nd as f32;
            data.mapv_inplace(|v| if v == nd { f32::NAN } else { v });
        }

        let projection = dataset.projection();
        let geometry = GridGeometry {
            transform: GeoTransform::from_gdal(geo_transform),
            spatial_ref: if projection.is_empty() { None } else { Some(projection) },
        };

        Ok(BandGrid::new(data, geometry))
    }

    fn persist(&mut self, name: &str, grid: &BandGrid) -> LstResult<RasterRef> {
        let path = self.product_path(name);
        let (height, width) = grid.dim();
        log::info!("Writing {}x{} raster to: {}", height, width, path.display());

        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let mut dataset = driver.create_with_band_type::<f32, _>(&path, width as _, height as _, 1)?;
        dataset.set_geo_transform(&grid.geometry().transform.to_gdal())?;
        if let Some(wkt) = &grid.geometry().spatial_ref {
            dataset.set_projection(wkt)?;
        }

        let samples: Vec<f32> = grid.data().iter().copied().collect();
        let buffer = Buffer::new((width, height), samples);
        let mut band = dataset.rasterband(1)?;
        band.set_no_data_value(Some(f64::NAN))?;
        band.write((0, 0), (width, height), &buffer)?;

        Ok(RasterRef::new(path.to_string_lossy()))
    }
}
