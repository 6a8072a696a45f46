use crate::core::band_math::{self, safe_div, safe_ln};
use crate::types::{BandGrid, BandId, LstError, LstResult, Sample};

/// Slope of the linear emissivity model
pub const LSE_SLOPE: Sample = 0.004;
/// Emissivity of a surface without vegetation
pub const LSE_INTERCEPT: Sample = 0.986;
/// h * c / k in micrometre-Kelvin
pub const RADIATION_CONSTANT: Sample = 14380.0;

/// Central wavelength (micrometres) of a thermal band
pub fn central_wavelength(band: BandId) -> Option<Sample> {
    match band {
        BandId::B10 => Some(10.895),
        BandId::B11 => Some(12.005),
        _ => None,
    }
}

/// Scene-wide NDVI extremes over finite samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NdviExtrema {
    pub min: Sample,
    pub max: Sample,
}

impl NdviExtrema {
    /// Both ends finite
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Flat NDVI scene: no spread to normalise against
    pub fn is_degenerate(&self) -> bool {
        self.is_valid() && self.min == self.max
    }
}

/// Vegetation proportion `((ndvi - min) / (max - min))^2`.
///
/// A flat scene (`max == min`) has no vegetation contrast; every finite
/// pixel gets proportion 0.
#[inline]
pub fn vegetation_proportion_value(ndvi: Sample, extrema: NdviExtrema) -> Sample {
    let range = extrema.max - extrema.min;
    if range == 0.0 {
        return if ndvi.is_finite() { 0.0 } else { Sample::NAN };
    }
    let scaled = safe_div(ndvi - extrema.min, range);
    scaled * scaled
}

/// Land surface emissivity `0.004 * propveg + 0.986`
#[inline]
pub fn emissivity_value(propveg: Sample) -> Sample {
    LSE_SLOPE * propveg + LSE_INTERCEPT
}

/// `T / (1 + (lambda * T / 14380) * ln(lse))`
#[inline]
pub fn surface_temperature_value(brightness_temp: Sample, wavelength: Sample, lse: Sample) -> Sample {
    let correction = (wavelength * brightness_temp / RADIATION_CONSTANT) * safe_ln(lse);
    safe_div(brightness_temp, 1.0 + correction)
}

/// Emissivity and surface temperature model
pub struct SurfaceModel;

impl SurfaceModel {
    /// Exact min/max over every finite NDVI sample of the finished grid.
    /// An all-invalid grid gives NaN extremes.
    pub fn ndvi_extrema(ndvi: &BandGrid) -> NdviExtrema {
        match band_math::finite_range(ndvi) {
            Some((min, max)) => {
                log::info!("NDVI range: {:.6} to {:.6}", min, max);
                NdviExtrema { min, max }
            }
            None => {
                log::warn!("NDVI grid has no finite samples; surface temperature will be invalid");
                NdviExtrema {
                    min: Sample::NAN,
                    max: Sample::NAN,
                }
            }
        }
    }

    pub fn vegetation_proportion(ndvi: &BandGrid, extrema: NdviExtrema) -> BandGrid {
        if extrema.is_degenerate() {
            log::warn!("Flat NDVI scene ({:.6}); vegetation proportion set to 0", extrema.min);
        }
        band_math::map(ndvi, move |v| vegetation_proportion_value(v, extrema))
    }

    pub fn land_surface_emissivity(propveg: &BandGrid) -> BandGrid {
        band_math::map(propveg, emissivity_value)
    }

    /// Emissivity-corrected surface temperature (Celsius) for a thermal band
    pub fn land_surface_temperature(
        band: BandId,
        brightness_temp: &BandGrid,
        lse: &BandGrid,
    ) -> LstResult<BandGrid> {
        let wavelength = central_wavelength(band).ok_or_else(|| LstError::UnsupportedBand {
            band,
            mode: "land surface temperature".to_string(),
        })?;
        log::debug!("Computing {} LST at {} um", band, wavelength);

        band_math::zip_map2(brightness_temp, lse, move |t, e| {
            surface_temperature_value(t, wavelength, e)
        })
    }
}
