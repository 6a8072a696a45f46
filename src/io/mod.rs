//! Scene inputs and product outputs

pub mod discovery;
pub mod metadata;
pub mod store;
#[cfg(feature = "gdal")]
pub mod gdal_store;

pub use discovery::{classify_band_file, discover_scene};
pub use metadata::{read_scene_metadata, MetadataFields, MetadataParser, SceneIdentity, SceneMetadata};
pub use store::{MemoryStore, RasterStore};
#[cfg(feature = "gdal")]
pub use gdal_store::GdalStore;
