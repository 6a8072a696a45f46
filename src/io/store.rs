use crate::types::{BandGrid, LstError, LstResult, RasterRef};
use std::collections::BTreeMap;

/// Where grids come from and where products go.
///
/// The pipeline never touches files itself: it loads band grids by the
/// references a [`BandSet`](crate::types::BandSet) carries and persists
/// every derived grid under a deterministic name through this trait.
pub trait RasterStore {
    /// Load the grid behind `reference`
    fn load(&self, reference: &RasterRef) -> LstResult<BandGrid>;

    /// Persist `grid` under `name` and return a reference that loads it back.
    /// An existing grid with the same name is overwritten.
    fn persist(&mut self, name: &str, grid: &BandGrid) -> LstResult<RasterRef>;
}

/// In-memory raster store keyed by name
#[derive(Debug, Default)]
pub struct MemoryStore {
    grids: BTreeMap<String, BandGrid>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an input grid
    pub fn insert(&mut self, name: impl Into<String>, grid: BandGrid) -> RasterRef {
        let name = name.into();
        self.grids.insert(name.clone(), grid);
        RasterRef(name)
    }

    pub fn get(&self, name: &str) -> Option<&BandGrid> {
        self.grids.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.grids.contains_key(name)
    }

    /// Stored names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.grids.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

impl RasterStore for MemoryStore {
    fn load(&self, reference: &RasterRef) -> LstResult<BandGrid> {
        self.grids
            .get(reference.as_str())
            .cloned()
            .ok_or_else(|| LstError::RasterNotFound(reference.to_string()))
    }

    fn persist(&mut self, name: &str, grid: &BandGrid) -> LstResult<RasterRef> {
        log::debug!("Persisting {}x{} grid as '{}'", grid.dim().0, grid.dim().1, name);
        Ok(self.insert(name, grid.clone()))
    }
}
