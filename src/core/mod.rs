//! Core LST processing modules

pub mod band_math;
pub mod calibrate;
pub mod indices;
pub mod masking;
pub mod pipeline;
pub mod surface;

// Re-export main types
pub use calibrate::{CalibrationConstants, CalibrationType, Coefficient, RadiometricCalibrator};
pub use indices::{IndexCalculator, MndwiOutput};
pub use masking::{MaskedBands, RasterClipper, RasterMasker, RegionMask};
pub use pipeline::{LstPipeline, PipelineConfig, ProductSet};
pub use surface::{NdviExtrema, SurfaceModel};
