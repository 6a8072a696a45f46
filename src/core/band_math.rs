//! Elementwise raster algebra.
//!
//! Undefined pixel math never aborts a grid: a zero denominator or a
//! logarithm of a non-positive value yields NaN at that pixel, and NaN
//! inputs stay NaN. Combining grids with different geometry is an error
//! raised before any arithmetic.

use crate::types::{BandGrid, BandId, LstResult, Sample};
use ndarray::Zip;
use std::collections::HashMap;

/// `numerator / denominator`, NaN when the denominator is exactly zero
#[inline]
pub fn safe_div(numerator: Sample, denominator: Sample) -> Sample {
    if denominator == 0.0 {
        Sample::NAN
    } else {
        numerator / denominator
    }
}

/// Natural logarithm, NaN for non-positive arguments
#[inline]
pub fn safe_ln(value: Sample) -> Sample {
    if value > 0.0 {
        value.ln()
    } else {
        Sample::NAN
    }
}

/// `(a - b) / (a + b)`
#[inline]
pub fn normalized_difference(a: Sample, b: Sample) -> Sample {
    safe_div(a - b, a + b)
}

/// Apply `f` to every sample
pub fn map<F>(grid: &BandGrid, f: F) -> BandGrid
where
    F: Fn(Sample) -> Sample + Sync + Send,
{
    let zip = Zip::from(grid.data());
    #[cfg(feature = "parallel")]
    let data = zip.par_map_collect(|&v| f(v));
    #[cfg(not(feature = "parallel"))]
    let data = zip.map_collect(|&v| f(v));
    grid.with_data(data)
}

/// Combine two aligned grids sample by sample
pub fn zip_map2<F>(a: &BandGrid, b: &BandGrid, f: F) -> LstResult<BandGrid>
where
    F: Fn(Sample, Sample) -> Sample + Sync + Send,
{
    a.ensure_same_grid(b)?;
    let zip = Zip::from(a.data()).and(b.data());
    #[cfg(feature = "parallel")]
    let data = zip.par_map_collect(|&x, &y| f(x, y));
    #[cfg(not(feature = "parallel"))]
    let data = zip.map_collect(|&x, &y| f(x, y));
    Ok(a.with_data(data))
}

/// Combine four aligned grids sample by sample
pub fn zip_map4<F>(
    a: &BandGrid,
    b: &BandGrid,
    c: &BandGrid,
    d: &BandGrid,
    f: F,
) -> LstResult<BandGrid>
where
    F: Fn(Sample, Sample, Sample, Sample) -> Sample + Sync + Send,
{
    a.ensure_same_grid(b)?;
    a.ensure_same_grid(c)?;
    a.ensure_same_grid(d)?;
    let zip = Zip::from(a.data()).and(b.data()).and(c.data()).and(d.data());
    #[cfg(feature = "parallel")]
    let data = zip.par_map_collect(|&w, &x, &y, &z| f(w, x, y, z));
    #[cfg(not(feature = "parallel"))]
    let data = zip.map_collect(|&w, &x, &y, &z| f(w, x, y, z));
    Ok(a.with_data(data))
}

/// Fail unless every band shares the geometry of the first band present
pub fn ensure_aligned(grids: &HashMap<BandId, BandGrid>) -> LstResult<()> {
    let mut present = BandId::ALL.iter().filter_map(|band| grids.get(band));
    if let Some(reference) = present.next() {
        for grid in present {
            reference.ensure_same_grid(grid)?;
        }
    }
    Ok(())
}

/// Pixelwise mean of two aligned grids
pub fn mean2(a: &BandGrid, b: &BandGrid) -> LstResult<BandGrid> {
    zip_map2(a, b, |x, y| (x + y) / 2.0)
}

/// Exact (min, max) over the finite samples of the whole grid, `None` when
/// no sample is finite
pub fn finite_range(grid: &BandGrid) -> Option<(Sample, Sample)> {
    let fold = |acc: Option<(Sample, Sample)>, v: Sample| -> Option<(Sample, Sample)> {
        if !v.is_finite() {
            return acc;
        }
        Some(match acc {
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
            None => (v, v),
        })
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        let merge = |a: Option<(Sample, Sample)>, b: Option<(Sample, Sample)>| match (a, b) {
            (Some((lo_a, hi_a)), Some((lo_b, hi_b))) => Some((lo_a.min(lo_b), hi_a.max(hi_b))),
            (a, None) => a,
            (None, b) => b,
        };
        if let Some(samples) = grid.data().as_slice_memory_order() {
            return samples
                .par_iter()
                .fold(|| None, |acc, &v| fold(acc, v))
                .reduce(|| None, merge);
        }
    }

    grid.data().iter().fold(None, |acc, &v| fold(acc, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GridGeometry, LstError};
    use ndarray::array;

    #[test]
    fn test_safe_div_zero_denominator() {
        assert!(safe_div(1.0, 0.0).is_nan());
        assert!(safe_div(0.0, 0.0).is_nan());
        assert!(safe_div(-1.0, -0.0).is_nan());
        assert_eq!(safe_div(1.0, 4.0), 0.25);
    }

    #[test]
    fn test_safe_ln_domain() {
        assert!(safe_ln(0.0).is_nan());
        assert!(safe_ln(-2.0).is_nan());
        assert!(safe_ln(Sample::NAN).is_nan());
        assert_eq!(safe_ln(1.0), 0.0);
    }

    #[test]
    fn test_zip_map2_keeps_nan_local() {
        let a = BandGrid::from_array(array![[0.4, 0.0], [0.3, Sample::NAN]]);
        let b = BandGrid::from_array(array![[0.1, 0.0], [0.3, 0.2]]);

        let nd = zip_map2(&a, &b, normalized_difference).unwrap();
        assert!((nd.data()[[0, 0]] - 0.6).abs() < 1e-6);
        assert!(nd.data()[[0, 1]].is_nan());
        assert_eq!(nd.data()[[1, 0]], 0.0);
        assert!(nd.data()[[1, 1]].is_nan());
    }

    #[test]
    fn test_zip_map_rejects_misaligned_grids() {
        let a = BandGrid::filled(2, 2, 1.0, GridGeometry::default());
        let b = BandGrid::filled(3, 2, 1.0, GridGeometry::default());

        assert!(matches!(mean2(&a, &b), Err(LstError::GeometryMismatch { .. })));
        assert!(matches!(
            zip_map4(&a, &a, &a, &b, |w, _, _, _| w),
            Err(LstError::GeometryMismatch { .. })
        ));
    }

    #[test]
    fn test_finite_range_skips_invalid_samples() {
        let grid = BandGrid::from_array(array![
            [0.2, Sample::NAN, -0.35],
            [Sample::INFINITY, 0.71, Sample::NEG_INFINITY]
        ]);
        assert_eq!(finite_range(&grid), Some((-0.35, 0.71)));

        let invalid = BandGrid::filled(2, 2, Sample::NAN, GridGeometry::default());
        assert_eq!(finite_range(&invalid), None);
    }

    #[test]
    fn test_map_preserves_geometry() {
        let geometry = GridGeometry {
            spatial_ref: Some("EPSG:32644".to_string()),
            ..GridGeometry::default()
        };
        let grid = BandGrid::filled(2, 3, 2.0, geometry.clone());

        let squared = map(&grid, |v| v * v);
        assert_eq!(squared.geometry(), &geometry);
        assert!(squared.data().iter().all(|&v| v == 4.0));
    }
}
