//! Spectral indices from calibrated Landsat 8 bands
//!
//! - MNDWI = (green - swir1) / (green + swir1)
//! - NDVI  = (nir - red) / (nir + red)
//! - NDISI = (t10 - m) / (t10 + m), m = (mndwi + nir + swir1) / 3
//!
//! A zero denominator gives NaN at that pixel.

use crate::core::band_math::{self, normalized_difference};
use crate::core::calibrate::RadiometricCalibrator;
use crate::io::metadata::SceneIdentity;
use crate::io::store::RasterStore;
use crate::types::{BandGrid, BandId, DerivedProduct, LstResult, ProductKind};

/// MNDWI product plus the reflectance grids later stages reuse
#[derive(Debug, Clone)]
pub struct MndwiOutput {
    pub mndwi: DerivedProduct,
    pub swir1_ref: BandGrid,
    pub nir_ref: BandGrid,
}

/// Modified Normalized Difference Water Index
pub fn mndwi_grid(green_ref: &BandGrid, swir1_ref: &BandGrid) -> LstResult<BandGrid> {
    band_math::zip_map2(green_ref, swir1_ref, normalized_difference)
}

/// Normalized Difference Vegetation Index
pub fn ndvi_grid(nir_ref: &BandGrid, red_ref: &BandGrid) -> LstResult<BandGrid> {
    band_math::zip_map2(nir_ref, red_ref, normalized_difference)
}

/// Normalized Difference Impervious Surface Index
pub fn ndisi_grid(
    t10: &BandGrid,
    mndwi: &BandGrid,
    nir_ref: &BandGrid,
    swir1_ref: &BandGrid,
) -> LstResult<BandGrid> {
    band_math::zip_map4(t10, mndwi, nir_ref, swir1_ref, |t, w, nir, swir| {
        let m = (w + nir + swir) / 3.0;
        normalized_difference(t, m)
    })
}

/// Computes and persists the scene's spectral indices
pub struct IndexCalculator<'a> {
    calibrator: &'a RadiometricCalibrator,
    identity: &'a SceneIdentity,
}

impl<'a> IndexCalculator<'a> {
    pub fn new(calibrator: &'a RadiometricCalibrator, identity: &'a SceneIdentity) -> Self {
        Self { calibrator, identity }
    }

    /// MNDWI from raw B3/B6; B5 is calibrated here as well so NDVI and
    /// NDISI can reuse its reflectance
    pub fn mndwi(
        &self,
        b3: &BandGrid,
        b5: &BandGrid,
        b6: &BandGrid,
        store: &mut dyn RasterStore,
    ) -> LstResult<MndwiOutput> {
        let green_ref = self.calibrator.reflectance(BandId::B3, b3)?;
        let nir_ref = self.calibrator.reflectance(BandId::B5, b5)?;
        let swir1_ref = self.calibrator.reflectance(BandId::B6, b6)?;

        let grid = mndwi_grid(&green_ref, &swir1_ref)?;
        let mndwi = self.persist(ProductKind::Mndwi, grid, store)?;

        Ok(MndwiOutput {
            mndwi,
            swir1_ref,
            nir_ref,
        })
    }

    /// NDISI from B10 brightness temperature (Celsius), MNDWI and the
    /// reused NIR/SWIR1 reflectances
    pub fn ndisi(
        &self,
        t10: &BandGrid,
        mndwi: &MndwiOutput,
        store: &mut dyn RasterStore,
    ) -> LstResult<DerivedProduct> {
        let grid = ndisi_grid(t10, &mndwi.mndwi.grid, &mndwi.nir_ref, &mndwi.swir1_ref)?;
        self.persist(ProductKind::Ndisi, grid, store)
    }

    /// NDVI from the reused NIR reflectance and raw B4
    pub fn ndvi(
        &self,
        nir_ref: &BandGrid,
        b4: &BandGrid,
        store: &mut dyn RasterStore,
    ) -> LstResult<DerivedProduct> {
        let red_ref = self.calibrator.reflectance(BandId::B4, b4)?;
        let grid = ndvi_grid(nir_ref, &red_ref)?;
        self.persist(ProductKind::Ndvi, grid, store)
    }

    fn persist(
        &self,
        kind: ProductKind,
        grid: BandGrid,
        store: &mut dyn RasterStore,
    ) -> LstResult<DerivedProduct> {
        let name = self.identity.product_name(kind.label());
        let handle = store.persist(&name, &grid)?;
        log::info!("Saved {} as {}", kind, name);

        Ok(DerivedProduct {
            kind,
            name,
            handle,
            grid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calibrate::{CalibrationConstants, Coefficient};
    use crate::io::store::MemoryStore;
    use crate::types::{GridGeometry, Sample};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn grid(value: Sample) -> BandGrid {
        BandGrid::filled(2, 2, value, GridGeometry::default())
    }

    fn unit_calibrator() -> RadiometricCalibrator {
        let mut constants = CalibrationConstants::new().with(Coefficient::SunElevation, 90.0);
        for band in [BandId::B3, BandId::B4, BandId::B5, BandId::B6] {
            constants.insert(Coefficient::ReflectanceMult(band), 1.0);
            constants.insert(Coefficient::ReflectanceAdd(band), 0.0);
        }
        RadiometricCalibrator::new(constants).unwrap()
    }

    #[test]
    fn test_ndvi_and_mndwi_values() {
        let ndvi = ndvi_grid(&grid(0.4), &grid(0.15)).unwrap();
        let mndwi = mndwi_grid(&grid(0.2), &grid(0.1)).unwrap();

        for &v in ndvi.data() {
            assert_abs_diff_eq!(v, 0.25 / 0.55, epsilon = 1e-6);
        }
        for &v in mndwi.data() {
            assert_abs_diff_eq!(v, 1.0 / 3.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_indices_bounded_for_non_negative_inputs() {
        let a = BandGrid::from_array(array![[0.0, 0.9, 0.3], [1.0, 0.05, 0.6]]);
        let b = BandGrid::from_array(array![[0.7, 0.0, 0.3], [0.2, 0.8, 0.0001]]);

        for index in [ndvi_grid(&a, &b).unwrap(), mndwi_grid(&a, &b).unwrap()] {
            for &v in index.data() {
                assert!((-1.0..=1.0).contains(&v), "index {} out of bounds", v);
            }
        }
    }

    #[test]
    fn test_zero_sum_pixel_is_nan() {
        let nir = BandGrid::from_array(array![[0.0, 0.4]]);
        let red = BandGrid::from_array(array![[0.0, 0.1]]);

        let ndvi = ndvi_grid(&nir, &red).unwrap();
        assert!(ndvi.data()[[0, 0]].is_nan());
        assert_abs_diff_eq!(ndvi.data()[[0, 1]], 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_mndwi_zero_sum_pixel_is_nan() {
        let green = BandGrid::from_array(array![[0.2, 0.0, 0.3]]);
        let swir = BandGrid::from_array(array![[-0.2, 0.0, 0.1]]);

        let mndwi = mndwi_grid(&green, &swir).unwrap();
        assert!(mndwi.data()[[0, 0]].is_nan());
        assert!(mndwi.data()[[0, 1]].is_nan());
        assert_abs_diff_eq!(mndwi.data()[[0, 2]], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_ndisi_zero_sum_pixel_is_nan() {
        // m = (1 + 1 + 1) / 3 = 1, so t10 + m is exactly zero in the first cell
        let t10 = BandGrid::from_array(array![[-1.0, 2.0]]);
        let ones = BandGrid::from_array(array![[1.0, 1.0]]);

        let ndisi = ndisi_grid(&t10, &ones, &ones, &ones).unwrap();
        assert!(ndisi.data()[[0, 0]].is_nan());
        assert_abs_diff_eq!(ndisi.data()[[0, 1]], 1.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_ndisi_formula() {
        let t10 = grid(25.0);
        let mndwi = grid(0.3);
        let nir = grid(0.4);
        let swir = grid(0.2);

        let m = (0.3f32 + 0.4 + 0.2) / 3.0;
        let ndisi = ndisi_grid(&t10, &mndwi, &nir, &swir).unwrap();
        for &v in ndisi.data() {
            assert_abs_diff_eq!(v, (25.0 - m) / (25.0 + m), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_calculator_persists_named_products() {
        let calibrator = unit_calibrator();
        let identity = SceneIdentity {
            date: "20200403".to_string(),
            scene_time: "184457".to_string(),
        };
        let calculator = IndexCalculator::new(&calibrator, &identity);
        let mut store = MemoryStore::new();

        let mndwi = calculator.mndwi(&grid(0.2), &grid(0.4), &grid(0.1), &mut store).unwrap();
        let ndvi = calculator.ndvi(&mndwi.nir_ref, &grid(0.15), &mut store).unwrap();
        let ndisi = calculator.ndisi(&grid(30.0), &mndwi, &mut store).unwrap();

        assert_eq!(mndwi.mndwi.name, "MNDWI_184457GMT_20200403");
        assert_eq!(ndvi.name, "NDVI_184457GMT_20200403");
        assert_eq!(ndisi.kind, ProductKind::Ndisi);
        assert!(store.contains("NDISI_184457GMT_20200403"));
        assert_eq!(store.len(), 3);
        for &v in mndwi.nir_ref.data() {
            assert_abs_diff_eq!(v, 0.4, epsilon = 1e-6);
        }
    }
}
