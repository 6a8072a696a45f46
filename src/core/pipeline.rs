use crate::core::band_math;
use crate::core::calibrate::RadiometricCalibrator;
use crate::core::indices::IndexCalculator;
use crate::core::masking::{RasterClipper, RasterMasker};
use crate::core::surface::SurfaceModel;
use crate::io::metadata::{MetadataParser, SceneMetadata};
use crate::io::store::RasterStore;
use crate::types::{BandGrid, BandId, BandSet, DerivedProduct, LstResult, ProductKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Run configuration, passed explicitly to the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Average the band 10 and band 11 surface temperatures instead of
    /// reporting band 10 alone
    pub average_thermal_bands: bool,
    /// Products handed on for publishing; the rest are reported as discardable
    pub keep_products: Vec<ProductKind>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            average_thermal_bands: false,
            keep_products: vec![ProductKind::Lst],
        }
    }
}

/// The four persisted products of one run
#[derive(Debug, Clone)]
pub struct ProductSet {
    pub ndvi: DerivedProduct,
    pub mndwi: DerivedProduct,
    pub ndisi: DerivedProduct,
    pub lst: DerivedProduct,
}

impl ProductSet {
    pub fn get(&self, kind: ProductKind) -> &DerivedProduct {
        match kind {
            ProductKind::Ndvi => &self.ndvi,
            ProductKind::Mndwi => &self.mndwi,
            ProductKind::Ndisi => &self.ndisi,
            ProductKind::Lst => &self.lst,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DerivedProduct> {
        ProductKind::ALL.into_iter().map(move |kind| self.get(kind))
    }

    /// Split into (kept, discarded) by the requested product subset
    pub fn partition(&self, keep: &[ProductKind]) -> (Vec<&DerivedProduct>, Vec<&DerivedProduct>) {
        self.iter().partition(|product| keep.contains(&product.kind))
    }
}

/// LST processing pipeline
///
/// Metadata -> calibration -> indices -> surface model, for one scene at a
/// time. The pipeline keeps no state between runs.
pub struct LstPipeline {
    config: PipelineConfig,
}

impl LstPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Parse the MTL text and run the scene
    pub fn run(
        &self,
        metadata_text: &str,
        bands: &BandSet,
        store: &mut dyn RasterStore,
        region: Option<&dyn RasterClipper>,
    ) -> LstResult<ProductSet> {
        let scene = MetadataParser::parse_scene(metadata_text)?;
        self.run_scene(&scene, bands, store, region)
    }

    /// Run with already parsed metadata
    pub fn run_scene(
        &self,
        scene: &SceneMetadata,
        bands: &BandSet,
        store: &mut dyn RasterStore,
        region: Option<&dyn RasterClipper>,
    ) -> LstResult<ProductSet> {
        log::info!(
            "Starting LST run for scene {} {} GMT",
            scene.identity.date,
            scene.identity.scene_time
        );
        bands.ensure_complete()?;
        scene.constants.ensure_complete()?;
        let calibrator = RadiometricCalibrator::new(scene.constants.clone())?;

        let grids = load_aligned_grids(bands, &*store)?;
        let grids = match region {
            Some(clipper) => {
                RasterMasker::new()
                    .mask_grids(&grids, bands.metadata.clone(), clipper, store)?
                    .grids
            }
            None => grids,
        };
        let band = |id: BandId| &grids[&id];

        let calculator = IndexCalculator::new(&calibrator, &scene.identity);
        let mndwi = calculator.mndwi(band(BandId::B3), band(BandId::B5), band(BandId::B6), store)?;

        let t10 = calibrator.brightness_temperature(BandId::B10, band(BandId::B10))?;
        let ndisi = calculator.ndisi(&t10, &mndwi, store)?;
        let ndvi = calculator.ndvi(&mndwi.nir_ref, band(BandId::B4), store)?;

        let extrema = SurfaceModel::ndvi_extrema(&ndvi.grid);
        let propveg = SurfaceModel::vegetation_proportion(&ndvi.grid, extrema);
        let lse = SurfaceModel::land_surface_emissivity(&propveg);

        let lst10 = SurfaceModel::land_surface_temperature(BandId::B10, &t10, &lse)?;
        let lst_grid = if self.config.average_thermal_bands {
            log::info!("Averaging band 10 and band 11 surface temperatures");
            let t11 = calibrator.brightness_temperature(BandId::B11, band(BandId::B11))?;
            let lst11 = SurfaceModel::land_surface_temperature(BandId::B11, &t11, &lse)?;
            band_math::mean2(&lst10, &lst11)?
        } else {
            lst10
        };

        let lst_name = scene.identity.product_name(ProductKind::Lst.label());
        let lst_handle = store.persist(&lst_name, &lst_grid)?;
        log::info!("Saved LST as {}", lst_name);

        Ok(ProductSet {
            ndvi,
            mndwi: mndwi.mndwi,
            ndisi,
            lst: DerivedProduct {
                kind: ProductKind::Lst,
                name: lst_name,
                handle: lst_handle,
                grid: lst_grid,
            },
        })
    }
}

/// Load the six scene bands and check they share one grid
fn load_aligned_grids(bands: &BandSet, store: &dyn RasterStore) -> LstResult<HashMap<BandId, BandGrid>> {
    let mut grids = HashMap::with_capacity(BandId::ALL.len());
    for band in BandId::ALL {
        let grid = store.load(bands.get(band)?)?;
        log::debug!("Loaded {}: {} x {}", band, grid.dim().0, grid.dim().1);
        grids.insert(band, grid);
    }

    band_math::ensure_aligned(&grids)?;
    Ok(grids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GridGeometry, RasterRef};

    fn product(kind: ProductKind) -> DerivedProduct {
        DerivedProduct {
            kind,
            name: format!("{}_000000GMT_20200101", kind),
            handle: RasterRef::new(kind.label()),
            grid: BandGrid::filled(1, 1, 0.0, GridGeometry::default()),
        }
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert!(!config.average_thermal_bands);
        assert_eq!(config.keep_products, vec![ProductKind::Lst]);
    }

    #[test]
    fn test_partition_products() {
        let products = ProductSet {
            ndvi: product(ProductKind::Ndvi),
            mndwi: product(ProductKind::Mndwi),
            ndisi: product(ProductKind::Ndisi),
            lst: product(ProductKind::Lst),
        };

        let (kept, discarded) = products.partition(&[ProductKind::Lst, ProductKind::Ndvi]);
        let kept: Vec<ProductKind> = kept.iter().map(|p| p.kind).collect();
        let discarded: Vec<ProductKind> = discarded.iter().map(|p| p.kind).collect();

        assert_eq!(kept, vec![ProductKind::Ndvi, ProductKind::Lst]);
        assert_eq!(discarded, vec![ProductKind::Mndwi, ProductKind::Ndisi]);
    }
}
