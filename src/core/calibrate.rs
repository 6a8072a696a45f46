use crate::core::band_math;
use crate::types::{BandGrid, BandId, LstError, LstResult};
use std::collections::HashMap;

/// Offset between Kelvin and Celsius
pub const KELVIN_OFFSET: f64 = 273.15;

/// Named scene calibration coefficient from the MTL file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coefficient {
    ReflectanceMult(BandId),
    ReflectanceAdd(BandId),
    RadianceMult(BandId),
    RadianceAdd(BandId),
    K1Constant(BandId),
    K2Constant(BandId),
    SunElevation,
}

impl Coefficient {
    /// MTL field name, e.g. `REFLECTANCE_MULT_BAND_3`
    pub fn field_name(&self) -> String {
        match self {
            Coefficient::ReflectanceMult(b) => format!("REFLECTANCE_MULT_BAND_{}", b.number()),
            Coefficient::ReflectanceAdd(b) => format!("REFLECTANCE_ADD_BAND_{}", b.number()),
            Coefficient::RadianceMult(b) => format!("RADIANCE_MULT_BAND_{}", b.number()),
            Coefficient::RadianceAdd(b) => format!("RADIANCE_ADD_BAND_{}", b.number()),
            Coefficient::K1Constant(b) => format!("K1_CONSTANT_BAND_{}", b.number()),
            Coefficient::K2Constant(b) => format!("K2_CONSTANT_BAND_{}", b.number()),
            Coefficient::SunElevation => "SUN_ELEVATION".to_string(),
        }
    }

    /// The closed coefficient set a scene must provide
    pub fn recognized() -> Vec<Coefficient> {
        let mut set = vec![Coefficient::SunElevation];
        for band in BandId::ALL {
            if band.is_thermal() {
                set.extend([
                    Coefficient::RadianceMult(band),
                    Coefficient::RadianceAdd(band),
                    Coefficient::K1Constant(band),
                    Coefficient::K2Constant(band),
                ]);
            } else {
                set.extend([Coefficient::ReflectanceMult(band), Coefficient::ReflectanceAdd(band)]);
            }
        }
        set
    }
}

/// Calibration constants of one scene, immutable once parsed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationConstants {
    values: HashMap<Coefficient, f64>,
}

impl CalibrationConstants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, coefficient: Coefficient, value: f64) {
        self.values.insert(coefficient, value);
    }

    /// Builder-style insert
    pub fn with(mut self, coefficient: Coefficient, value: f64) -> Self {
        self.insert(coefficient, value);
        self
    }

    pub fn get(&self, coefficient: Coefficient) -> LstResult<f64> {
        self.values
            .get(&coefficient)
            .copied()
            .ok_or_else(|| LstError::MissingCoefficient(coefficient.field_name()))
    }

    /// Fail on the first recognized coefficient that is absent
    pub fn ensure_complete(&self) -> LstResult<()> {
        for coefficient in Coefficient::recognized() {
            self.get(coefficient)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Types of radiometric calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationType {
    Reflectance,           // TOA reflectance, sun-elevation corrected
    Radiance,              // TOA spectral radiance
    BrightnessTemperature, // At-sensor temperature in Celsius
}

impl std::fmt::Display for CalibrationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationType::Reflectance => write!(f, "reflectance"),
            CalibrationType::Radiance => write!(f, "radiance"),
            CalibrationType::BrightnessTemperature => write!(f, "brightness temperature"),
        }
    }
}

/// Radiometric calibration processor
///
/// Converts raw digital numbers to reflectance, radiance or brightness
/// temperature with the scene's per-band coefficients. The sun-elevation
/// correction `sin(radians(SUN_ELEVATION))` is computed once at construction.
#[derive(Debug, Clone)]
pub struct RadiometricCalibrator {
    constants: CalibrationConstants,
    sun_correction: f64,
}

impl RadiometricCalibrator {
    /// Create a new calibration processor
    pub fn new(constants: CalibrationConstants) -> LstResult<Self> {
        let sun_elevation = constants.get(Coefficient::SunElevation)?;
        let sun_correction = sun_elevation.to_radians().sin();
        log::debug!(
            "Sun elevation {:.6} deg, reflectance correction factor {:.6}",
            sun_elevation,
            sun_correction
        );

        Ok(Self {
            constants,
            sun_correction,
        })
    }

    pub fn constants(&self) -> &CalibrationConstants {
        &self.constants
    }

    pub fn sun_correction(&self) -> f64 {
        self.sun_correction
    }

    /// Apply radiometric calibration of the given type to a raw band
    pub fn calibrate(&self, band: BandId, raw: &BandGrid, cal_type: CalibrationType) -> LstResult<BandGrid> {
        log::info!("Applying {} calibration to {}", cal_type, band);
        log::debug!("Input dimensions: {} x {}", raw.dim().0, raw.dim().1);

        let calibrated = match cal_type {
            CalibrationType::Reflectance => self.reflectance(band, raw)?,
            CalibrationType::Radiance => self.radiance(band, raw)?,
            CalibrationType::BrightnessTemperature => self.brightness_temperature(band, raw)?,
        };

        if let Some((lo, hi)) = band_math::finite_range(&calibrated) {
            log::debug!("{} {} range: {:.4} to {:.4}", band, cal_type, lo, hi);
        }
        Ok(calibrated)
    }

    /// `(mult * dn - add) / sin(sun_elevation)`
    pub fn reflectance(&self, band: BandId, raw: &BandGrid) -> LstResult<BandGrid> {
        self.ensure_supported(band, CalibrationType::Reflectance)?;
        let mult = self.constants.get(Coefficient::ReflectanceMult(band))?;
        let add = self.constants.get(Coefficient::ReflectanceAdd(band))?;
        let sun = self.sun_correction;

        Ok(band_math::map(raw, move |dn| {
            if sun == 0.0 {
                f32::NAN
            } else {
                ((mult * dn as f64 - add) / sun) as f32
            }
        }))
    }

    /// `mult * dn + add`
    pub fn radiance(&self, band: BandId, raw: &BandGrid) -> LstResult<BandGrid> {
        self.ensure_supported(band, CalibrationType::Radiance)?;
        let mult = self.constants.get(Coefficient::RadianceMult(band))?;
        let add = self.constants.get(Coefficient::RadianceAdd(band))?;

        Ok(band_math::map(raw, move |dn| (mult * dn as f64 + add) as f32))
    }

    /// `K2 / ln(K1 / radiance + 1) - 273.15`, in Celsius
    pub fn brightness_temperature(&self, band: BandId, raw: &BandGrid) -> LstResult<BandGrid> {
        self.ensure_supported(band, CalibrationType::BrightnessTemperature)?;
        let k1 = self.constants.get(Coefficient::K1Constant(band))?;
        let k2 = self.constants.get(Coefficient::K2Constant(band))?;
        let radiance = self.radiance(band, raw)?;

        Ok(band_math::map(&radiance, move |l| {
            inverse_planck_celsius(l as f64, k1, k2) as f32
        }))
    }

    fn ensure_supported(&self, band: BandId, cal_type: CalibrationType) -> LstResult<()> {
        let thermal_mode = cal_type != CalibrationType::Reflectance;
        if band.is_thermal() != thermal_mode {
            return Err(LstError::UnsupportedBand {
                band,
                mode: cal_type.to_string(),
            });
        }
        Ok(())
    }
}

/// Brightness temperature for one radiance sample.
///
/// NaN when the radiance is not a positive finite number or the logarithm
/// argument leaves its domain.
pub fn inverse_planck_celsius(radiance: f64, k1: f64, k2: f64) -> f64 {
    if !(radiance > 0.0 && radiance.is_finite()) {
        return f64::NAN;
    }
    let log_arg = k1 / radiance + 1.0;
    if !(log_arg > 0.0) {
        return f64::NAN;
    }
    let denominator = log_arg.ln();
    if denominator == 0.0 {
        return f64::NAN;
    }
    k2 / denominator - KELVIN_OFFSET
}
