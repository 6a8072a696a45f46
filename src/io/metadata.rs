use crate::core::calibrate::{CalibrationConstants, Coefficient};
use crate::types::{LstError, LstResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const DATE_ACQUIRED: &str = "DATE_ACQUIRED";
pub const SCENE_CENTER_TIME: &str = "SCENE_CENTER_TIME";

/// Every MTL field the pipeline reads. No name is a substring of another,
/// though the parser matches whole keys anyway.
pub const RECOGNIZED_FIELDS: [&str; 19] = [
    DATE_ACQUIRED,
    SCENE_CENTER_TIME,
    "SUN_ELEVATION",
    "RADIANCE_MULT_BAND_10",
    "RADIANCE_MULT_BAND_11",
    "RADIANCE_ADD_BAND_10",
    "RADIANCE_ADD_BAND_11",
    "REFLECTANCE_MULT_BAND_3",
    "REFLECTANCE_MULT_BAND_4",
    "REFLECTANCE_MULT_BAND_5",
    "REFLECTANCE_MULT_BAND_6",
    "REFLECTANCE_ADD_BAND_3",
    "REFLECTANCE_ADD_BAND_4",
    "REFLECTANCE_ADD_BAND_5",
    "REFLECTANCE_ADD_BAND_6",
    "K1_CONSTANT_BAND_10",
    "K2_CONSTANT_BAND_10",
    "K1_CONSTANT_BAND_11",
    "K2_CONSTANT_BAND_11",
];

/// Raw field values scraped from a metadata blob, in request order
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataFields {
    entries: Vec<(String, String)>,
}

impl MetadataFields {
    /// Trimmed raw text of `field`
    pub fn get(&self, field: &str) -> LstResult<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| LstError::MissingMetadataField(field.to_string()))
    }

    /// Value of `field` as a float
    pub fn parse_f64(&self, field: &str) -> LstResult<f64> {
        let value = self.get(field)?;
        value.parse::<f64>().map_err(|_| LstError::Parse {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

/// Acquisition identity used to name derived products
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneIdentity {
    /// `YYYYMMDD`
    pub date: String,
    /// `HHMMSS` (GMT)
    pub scene_time: String,
}

impl SceneIdentity {
    /// `{PRODUCT}_{HHMMSS}GMT_{YYYYMMDD}`
    pub fn product_name(&self, product: &str) -> String {
        format!("{}_{}GMT_{}", product, self.scene_time, self.date)
    }
}

/// Everything a run needs from the MTL file
#[derive(Debug, Clone)]
pub struct SceneMetadata {
    pub identity: SceneIdentity,
    pub constants: CalibrationConstants,
}

/// Line-oriented `KEY = VALUE` metadata parser
pub struct MetadataParser;

impl MetadataParser {
    /// Scrape `fields` from `text`.
    ///
    /// Each line is split on its first `=`; the trimmed left side must equal
    /// a requested name exactly. The first matching line wins. Missing any
    /// requested field is an error naming the first one absent.
    pub fn scrape_fields(text: &str, fields: &[&str]) -> LstResult<MetadataFields> {
        let mut found: HashMap<&str, &str> = HashMap::with_capacity(fields.len());

        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if let Some(&field) = fields.iter().find(|&&f| f == key) {
                found.entry(field).or_insert_with(|| value.trim());
            }
        }

        let mut entries = Vec::with_capacity(fields.len());
        for &field in fields {
            let value = found
                .get(field)
                .ok_or_else(|| LstError::MissingMetadataField(field.to_string()))?;
            entries.push((field.to_string(), value.to_string()));
        }

        log::debug!("Scraped {} metadata fields", entries.len());
        Ok(MetadataFields { entries })
    }

    /// Parse a full MTL blob into identity tokens and calibration constants
    pub fn parse_scene(text: &str) -> LstResult<SceneMetadata> {
        let fields = Self::scrape_fields(text, &RECOGNIZED_FIELDS)?;

        let identity = SceneIdentity {
            date: normalize_date(fields.get(DATE_ACQUIRED)?),
            scene_time: normalize_scene_time(fields.get(SCENE_CENTER_TIME)?),
        };

        let mut constants = CalibrationConstants::new();
        for coefficient in Coefficient::recognized() {
            let value = fields.parse_f64(&coefficient.field_name())?;
            constants.insert(coefficient, value);
        }

        log::info!(
            "Parsed scene metadata: acquired {} at {} GMT, sun elevation {:.4} deg",
            identity.date,
            identity.scene_time,
            constants.get(Coefficient::SunElevation)?
        );

        Ok(SceneMetadata { identity, constants })
    }
}

/// `2020-04-03` -> `20200403`
pub fn normalize_date(raw: &str) -> String {
    raw.replace('-', "")
}

/// `"18:44:57.3210000Z"` -> `184457`
pub fn normalize_scene_time(raw: &str) -> String {
    let unquoted = raw.trim().trim_matches('"');
    let whole_seconds = unquoted.split('.').next().unwrap_or(unquoted);
    whole_seconds.trim_end_matches('Z').replace(':', "")
}

/// Read and parse an `*MTL.txt` file
pub fn read_scene_metadata<P: AsRef<Path>>(path: P) -> LstResult<SceneMetadata> {
    log::info!("Reading scene metadata from: {}", path.as_ref().display());
    let text = std::fs::read_to_string(path.as_ref())?;
    MetadataParser::parse_scene(&text)
}
