use crate::types::{BandId, BandSet, LstResult, RasterRef};
use std::path::Path;

const METADATA_SUFFIX: &str = "MTL.txt";

/// File-name suffix of each band, longest first so `B11.TIF` is never
/// mistaken for a shorter band suffix
const BAND_SUFFIXES: [(BandId, &str); 6] = [
    (BandId::B10, "B10.TIF"),
    (BandId::B11, "B11.TIF"),
    (BandId::B3, "B3.TIF"),
    (BandId::B4, "B4.TIF"),
    (BandId::B5, "B5.TIF"),
    (BandId::B6, "B6.TIF"),
];

/// Classify a file name as one of the scene bands
pub fn classify_band_file(file_name: &str) -> Option<BandId> {
    BAND_SUFFIXES
        .iter()
        .find(|(_, suffix)| file_name.ends_with(suffix))
        .map(|(band, _)| *band)
}

/// Scan a Level-1 product folder for the six bands and the MTL file.
///
/// Entries are visited in sorted order and the first file matching a band
/// wins. An incomplete folder is not an error here; the pipeline rejects it
/// with the missing band named.
pub fn discover_scene<P: AsRef<Path>>(folder: P) -> LstResult<BandSet> {
    let folder = folder.as_ref();
    log::info!("Scanning scene folder: {}", folder.display());

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();

    let mut band_set = BandSet::new();
    for path in paths {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if file_name.ends_with(METADATA_SUFFIX) {
            if band_set.metadata.is_some() {
                log::warn!("Ignoring extra metadata file {}", path.display());
            } else {
                band_set.metadata = Some(path.clone());
            }
            continue;
        }

        if let Some(band) = classify_band_file(file_name) {
            if band_set.bands.contains_key(&band) {
                log::warn!("Ignoring duplicate {} file {}", band, path.display());
                continue;
            }
            log::debug!("Found {}: {}", band, path.display());
            band_set.insert(band, RasterRef::new(path.to_string_lossy()));
        }
    }

    log::info!(
        "Discovered {} of {} bands (metadata {})",
        band_set.bands.len(),
        BandId::ALL.len(),
        if band_set.metadata.is_some() { "found" } else { "missing" }
    );
    Ok(band_set)
}
