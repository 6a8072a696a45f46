use crate::core::band_math;
use crate::io::store::RasterStore;
use crate::types::{BandGrid, BandId, BandSet, GridGeometry, LstError, LstResult};
use ndarray::{Array2, Zip};
use std::collections::HashMap;
use std::path::PathBuf;

/// Clips a grid to a region of interest.
///
/// Cells outside the region come back invalid (NaN); the grid geometry is
/// left unchanged so clipped bands still combine with each other.
pub trait RasterClipper {
    fn clip(&self, grid: &BandGrid) -> LstResult<BandGrid>;
}

/// Region of interest given as a cell mask on the scene grid
#[derive(Debug, Clone)]
pub struct RegionMask {
    /// true = inside the region
    inside: Array2<bool>,
    geometry: GridGeometry,
}

impl RegionMask {
    pub fn new(inside: Array2<bool>, geometry: GridGeometry) -> Self {
        Self { inside, geometry }
    }

    /// Cells where `grid` holds a finite non-zero value are inside
    pub fn from_grid(grid: &BandGrid) -> Self {
        let inside = grid.data().mapv(|v| v.is_finite() && v != 0.0);
        Self::new(inside, grid.geometry().clone())
    }

    /// Number of cells inside the region
    pub fn inside_count(&self) -> usize {
        self.inside.iter().filter(|&&inside| inside).count()
    }
}

impl RasterClipper for RegionMask {
    fn clip(&self, grid: &BandGrid) -> LstResult<BandGrid> {
        if grid.dim() != self.inside.dim() || grid.geometry() != &self.geometry {
            return Err(LstError::GeometryMismatch {
                expected: format!("{:?} cells on mask grid", self.inside.dim()),
                actual: format!("{:?} cells", grid.dim()),
            });
        }

        let data = Zip::from(grid.data())
            .and(&self.inside)
            .map_collect(|&v, &inside| if inside { v } else { f32::NAN });
        Ok(grid.with_data(data))
    }
}

/// Scene bands clipped to a region, with the references they were persisted under
#[derive(Debug, Clone)]
pub struct MaskedBands {
    pub bands: BandSet,
    pub grids: HashMap<BandId, BandGrid>,
}

/// Clips every scene band to a region and persists the results
#[derive(Debug, Default)]
pub struct RasterMasker;

impl RasterMasker {
    pub fn new() -> Self {
        Self
    }

    /// Persisted name of a masked band, e.g. `B10_Mask`
    pub fn masked_name(band: BandId) -> String {
        format!("{}_Mask", band)
    }

    /// Clip the six scene bands with `clipper`, persist each as
    /// `{band}_Mask` and return a band set pointing at the masked grids.
    /// The original grids are left untouched.
    pub fn mask_bands(
        &self,
        bands: &BandSet,
        clipper: &dyn RasterClipper,
        store: &mut dyn RasterStore,
    ) -> LstResult<BandSet> {
        bands.ensure_complete()?;
        let mut grids = HashMap::with_capacity(BandId::ALL.len());
        for band in BandId::ALL {
            grids.insert(band, store.load(bands.get(band)?)?);
        }

        let masked = self.mask_grids(&grids, bands.metadata.clone(), clipper, store)?;
        Ok(masked.bands)
    }

    /// Clip already loaded bands. Every band is clipped and checked for
    /// alignment before the first `{band}_Mask` grid is persisted.
    pub fn mask_grids(
        &self,
        grids: &HashMap<BandId, BandGrid>,
        metadata: Option<PathBuf>,
        clipper: &dyn RasterClipper,
        store: &mut dyn RasterStore,
    ) -> LstResult<MaskedBands> {
        log::info!("Masking {} bands to region of interest", BandId::ALL.len());

        let mut clipped = HashMap::with_capacity(BandId::ALL.len());
        for band in BandId::ALL {
            let grid = grids.get(&band).ok_or(LstError::MissingBand(band))?;
            clipped.insert(band, clipper.clip(grid)?);
        }
        band_math::ensure_aligned(&clipped)?;

        let mut masked = BandSet {
            bands: HashMap::with_capacity(BandId::ALL.len()),
            metadata,
        };
        for band in BandId::ALL {
            let reference = store.persist(&Self::masked_name(band), &clipped[&band])?;
            log::debug!("Masked {} -> {}", band, reference);
            masked.insert(band, reference);
        }

        Ok(MaskedBands {
            bands: masked,
            grids: clipped,
        })
    }
}
