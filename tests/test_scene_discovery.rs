use landsat_lst::io::discover_scene;
use landsat_lst::{process_scene_folder, BandGrid, BandId, GridGeometry, LstError, MemoryStore, PipelineConfig};
use std::fs;
use std::path::Path;

const STEM: &str = "LC08_L1TP_147047_20200403_20200410_01_T1";

const MTL: &str = "GROUP = L1_METADATA_FILE
  DATE_ACQUIRED = 2020-04-03
  SCENE_CENTER_TIME = \"05:02:09.1230000Z\"
  SUN_ELEVATION = 90.0
  RADIANCE_MULT_BAND_10 = 1.0
  RADIANCE_MULT_BAND_11 = 1.0
  RADIANCE_ADD_BAND_10 = 0.0
  RADIANCE_ADD_BAND_11 = 0.0
  REFLECTANCE_MULT_BAND_3 = 1.0
  REFLECTANCE_MULT_BAND_4 = 1.0
  REFLECTANCE_MULT_BAND_5 = 1.0
  REFLECTANCE_MULT_BAND_6 = 1.0
  REFLECTANCE_ADD_BAND_3 = 0.0
  REFLECTANCE_ADD_BAND_4 = 0.0
  REFLECTANCE_ADD_BAND_5 = 0.0
  REFLECTANCE_ADD_BAND_6 = 0.0
  K1_CONSTANT_BAND_10 = 774.8853
  K2_CONSTANT_BAND_10 = 1321.0789
  K1_CONSTANT_BAND_11 = 480.8883
  K2_CONSTANT_BAND_11 = 1201.1442
END_GROUP = L1_METADATA_FILE
";

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"").unwrap();
}

fn write_scene(dir: &Path, with_metadata: bool) {
    for band in ["B1", "B2", "B3", "B4", "B5", "B6", "B7", "B10", "B11", "BQA"] {
        touch(dir, &format!("{}_{}.TIF", STEM, band));
    }
    touch(dir, &format!("{}_ANG.txt", STEM));
    if with_metadata {
        fs::write(dir.join(format!("{}_MTL.txt", STEM)), MTL).unwrap();
    }
}

#[test]
fn test_discover_complete_scene() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    write_scene(dir.path(), true);

    let bands = discover_scene(dir.path()).unwrap();
    bands.ensure_complete().unwrap();
    assert_eq!(bands.bands.len(), 6);
    assert!(bands.get(BandId::B11).unwrap().as_str().ends_with("_B11.TIF"));
    assert!(bands.get(BandId::B10).unwrap().as_str().ends_with("_B10.TIF"));
    assert_eq!(
        bands.metadata.as_deref(),
        Some(dir.path().join(format!("{}_MTL.txt", STEM)).as_path())
    );
}

#[test]
fn test_discover_incomplete_scene() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &format!("{}_B3.TIF", STEM));
    touch(dir.path(), &format!("{}_B10.TIF", STEM));

    let bands = discover_scene(dir.path()).unwrap();
    assert_eq!(bands.bands.len(), 2);
    assert!(bands.metadata.is_none());
    assert!(matches!(bands.ensure_complete(), Err(LstError::MissingBand(BandId::B4))));
}

#[test]
fn test_process_scene_folder() {
    let dir = tempfile::tempdir().unwrap();
    write_scene(dir.path(), true);

    // Seed the store under the discovered paths so no raster driver is needed
    let mut store = MemoryStore::new();
    for (band, reference) in &discover_scene(dir.path()).unwrap().bands {
        let value = if band.is_thermal() { 10.0 } else { 0.3 };
        store.insert(reference.as_str(), BandGrid::filled(3, 3, value, GridGeometry::default()));
    }

    let products = process_scene_folder(dir.path(), PipelineConfig::default(), &mut store, None).unwrap();
    assert_eq!(products.lst.name, "LST_050209GMT_20200403");
    assert!(products.lst.grid.data().iter().all(|v| v.is_finite()));
    // Equal red and NIR reflectance
    assert!(products.ndvi.grid.data().iter().all(|&v| v == 0.0));
}

#[test]
fn test_process_scene_folder_without_metadata() {
    let dir = tempfile::tempdir().unwrap();
    write_scene(dir.path(), false);
    let mut store = MemoryStore::new();

    let err = process_scene_folder(dir.path(), PipelineConfig::default(), &mut store, None).unwrap_err();
    assert!(matches!(err, LstError::InvalidFormat(_)));
    assert!(store.is_empty());
}
