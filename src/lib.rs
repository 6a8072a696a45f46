//! landsat-lst: Land Surface Temperature from Landsat 8 Level-1 scenes
//!
//! Converts the green, red, NIR, SWIR1 and the two thermal bands of a scene
//! into NDVI, MNDWI, NDISI and an emissivity-corrected land surface
//! temperature grid, named after the acquisition date and time.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    BandGrid, BandId, BandSet, DerivedProduct, GeoTransform, GridGeometry, LstError, LstResult,
    ProductKind, RasterRef, Sample,
};

pub use io::{discover_scene, read_scene_metadata, MemoryStore, MetadataParser, RasterStore, SceneMetadata};
#[cfg(feature = "gdal")]
pub use io::GdalStore;

pub use core::{LstPipeline, PipelineConfig, ProductSet, RasterClipper, RegionMask};

use std::path::Path;

/// Discover a scene folder, read its MTL file and run the pipeline.
///
/// Products are persisted through `store`; the returned set is what the
/// caller partitions by `config.keep_products` for publishing.
pub fn process_scene_folder<P: AsRef<Path>>(
    folder: P,
    config: PipelineConfig,
    store: &mut dyn RasterStore,
    region: Option<&dyn RasterClipper>,
) -> LstResult<ProductSet> {
    let bands = discover_scene(folder.as_ref())?;
    let metadata_path = bands.metadata.as_ref().ok_or_else(|| {
        LstError::InvalidFormat(format!(
            "No *MTL.txt metadata file in {}",
            folder.as_ref().display()
        ))
    })?;
    let scene = read_scene_metadata(metadata_path)?;

    let pipeline = LstPipeline::new(config);
    let products = pipeline.run_scene(&scene, &bands, store, region)?;

    let (kept, discarded) = products.partition(&pipeline.config().keep_products);
    log::info!(
        "Scene finished: {} product(s) kept, {} discardable",
        kept.len(),
        discarded.len()
    );
    for product in &discarded {
        log::debug!("Discardable product: {}", product.name);
    }
    Ok(products)
}
