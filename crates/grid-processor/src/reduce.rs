//! Per-pixel band reduction.
//!
//! A granule carries one band per satellite overpass. Reducing it keeps, for
//! every pixel, the mean of the bands holding a valid measurement.

use aod_common::{is_nodata, Grid, Raster, Sample, Samples};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{GridProcessorError, Result};

/// Collapse a multi-band raster to one band by averaging valid samples.
///
/// Pixels where every band holds the sentinel (or NaN) come out as the
/// sentinel. The result keeps the source sample type, georeferencing and
/// nodata value; integer means are rounded to the nearest value.
pub fn reduce_bands(raster: &Raster) -> Result<Grid> {
    if raster.bands.is_empty() {
        return Err(GridProcessorError::invalid_input("raster has no bands"));
    }

    let samples = match &raster.bands[0] {
        Samples::I16(_) => {
            let bands = typed_bands(&raster.bands, |b| match b {
                Samples::I16(v) => Some(v.as_slice()),
                _ => None,
            })?;
            Samples::I16(mean_of_bands(&bands, raster.nodata))
        }
        Samples::F32(_) => {
            let bands = typed_bands(&raster.bands, |b| match b {
                Samples::F32(v) => Some(v.as_slice()),
                _ => None,
            })?;
            Samples::F32(mean_of_bands(&bands, raster.nodata))
        }
    };

    debug!(
        bands = raster.band_count(),
        width = raster.width,
        height = raster.height,
        "Reduced bands"
    );

    Ok(Grid::new(
        raster.width,
        raster.height,
        raster.transform,
        raster.crs,
        raster.nodata,
        samples,
    )?)
}

fn typed_bands<'a, T>(
    bands: &'a [Samples],
    view: impl Fn(&'a Samples) -> Option<&'a [T]>,
) -> Result<Vec<&'a [T]>> {
    let expected = bands[0].sample_type();
    bands
        .iter()
        .enumerate()
        .map(|(index, band)| {
            view(band).ok_or(GridProcessorError::FormatMismatch {
                expected,
                found: band.sample_type(),
                index,
            })
        })
        .collect()
}

fn mean_of_bands<T: Sample>(bands: &[&[T]], nodata: f64) -> Vec<T> {
    let len = bands[0].len();
    let fill = T::from_f64(nodata);

    (0..len)
        .into_par_iter()
        .map(|i| {
            let mut sum = 0.0f64;
            let mut count = 0usize;
            for band in bands {
                let v = band[i].to_f64();
                if !is_nodata(v, nodata) {
                    sum += v;
                    count += 1;
                }
            }
            if count == 0 {
                fill
            } else {
                T::from_f64(sum / count as f64)
            }
        })
        .collect()
}
