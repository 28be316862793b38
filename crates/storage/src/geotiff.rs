//! GeoTIFF reading and writing.
//!
//! Each band is one page (IFD) of the file. Georeferencing lives on the
//! first page:
//!
//! - `ModelPixelScaleTag` / `ModelTiepointTag` give a north-up affine transform
//! - `GeoKeyDirectoryTag` (+ `GeoDoubleParamsTag`) identify the CRS
//! - `GdalNodata` holds the nodata sentinel as ASCII
//!
//! Only Int16 and Float32 samples are supported.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use aod_common::crs::MODIS_SPHERE_RADIUS;
use aod_common::{CrsCode, GeoTransform, Grid, Raster, Samples};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tracing::{debug, instrument};

use crate::error::{Result, StorageError};

/// Fill value of the MCD19A2 optical depth layers, assumed when a file
/// carries no `GdalNodata` tag.
pub const DEFAULT_NODATA: f64 = -28672.0;

// GeoKey IDs
const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const GEOG_GEODETIC_DATUM: u16 = 2050;
const GEOG_ELLIPSOID: u16 = 2056;
const GEOG_SEMI_MAJOR_AXIS: u16 = 2057;
const GEOG_SEMI_MINOR_AXIS: u16 = 2058;
const PROJECTED_CS_TYPE: u16 = 3072;
const PROJECTION: u16 = 3074;
const PROJ_COORD_TRANS: u16 = 3075;
const PROJ_FALSE_EASTING: u16 = 3082;
const PROJ_FALSE_NORTHING: u16 = 3083;
const PROJ_CENTER_LONG: u16 = 3088;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const USER_DEFINED: u16 = 32767;
const CT_SINUSOIDAL: u16 = 24;
const GEO_DOUBLE_PARAMS: u16 = 34736;

/// Read every page of a GeoTIFF as the bands of one raster.
#[instrument(fields(path = %path.display()))]
pub fn read_raster(path: &Path) -> Result<Raster> {
    let file = File::open(path)?;
    let raster = read_raster_from(BufReader::new(file), &path.display().to_string())?;
    debug!(
        bands = raster.band_count(),
        width = raster.width,
        height = raster.height,
        crs = %raster.crs,
        "Read GeoTIFF"
    );
    Ok(raster)
}

/// Read a GeoTIFF from any seekable reader. `name` is used in error messages.
pub fn read_raster_from<R: Read + Seek>(reader: R, name: &str) -> Result<Raster> {
    let mut decoder = Decoder::new(reader)?;

    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);
    let transform = read_transform(&mut decoder, name)?;
    let crs = read_crs(&mut decoder, name)?;
    let nodata = read_nodata(&mut decoder)?;

    let mut bands = Vec::new();
    loop {
        let (w, h) = decoder.dimensions()?;
        if (w as usize, h as usize) != (width, height) {
            return Err(StorageError::InconsistentBands {
                path: name.to_string(),
                detail: format!(
                    "page {} is {}x{}, expected {}x{}",
                    bands.len(),
                    w,
                    h,
                    width,
                    height
                ),
            });
        }
        let samples = match decoder.read_image()? {
            DecodingResult::I16(v) => Samples::I16(v),
            DecodingResult::F32(v) => Samples::F32(v),
            _ => {
                return Err(StorageError::UnsupportedSampleType {
                    path: name.to_string(),
                    found: format!("{:?}", decoder.colortype()?),
                })
            }
        };
        bands.push(samples);

        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    Raster::new(width, height, transform, crs, nodata, bands).map_err(|e| match e {
        aod_common::GridError::MixedSampleTypes => StorageError::InconsistentBands {
            path: name.to_string(),
            detail: "pages mix sample types".to_string(),
        },
        other => StorageError::Grid(other),
    })
}

/// Write a raster as a GeoTIFF, one page per band.
#[instrument(skip(raster), fields(path = %path.display(), bands = raster.band_count()))]
pub fn write_raster(path: &Path, raster: &Raster) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_raster_to(&mut writer, raster)?;
    writer.flush()?;
    debug!("Wrote GeoTIFF");
    Ok(())
}

/// Write a raster to any seekable writer.
pub fn write_raster_to<W: Write + Seek>(writer: W, raster: &Raster) -> Result<()> {
    let mut encoder = TiffEncoder::new(writer)?;

    match raster.bands.first() {
        None => Err(StorageError::InconsistentBands {
            path: "<output>".to_string(),
            detail: "raster has no bands".to_string(),
        }),
        Some(Samples::I16(_)) => {
            let bands = raster
                .bands
                .iter()
                .map(|b| match b {
                    Samples::I16(v) => Ok(v.as_slice()),
                    _ => Err(mixed_bands()),
                })
                .collect::<Result<Vec<_>>>()?;
            write_pages::<_, colortype::GrayI16>(&mut encoder, raster, &bands)
        }
        Some(Samples::F32(_)) => {
            let bands = raster
                .bands
                .iter()
                .map(|b| match b {
                    Samples::F32(v) => Ok(v.as_slice()),
                    _ => Err(mixed_bands()),
                })
                .collect::<Result<Vec<_>>>()?;
            write_pages::<_, colortype::Gray32Float>(&mut encoder, raster, &bands)
        }
    }
}

/// Read the first page of a GeoTIFF as a single-band grid.
pub fn read_grid(path: &Path) -> Result<Grid> {
    let raster = read_raster(path)?;
    raster
        .band(0)
        .ok_or_else(|| StorageError::InconsistentBands {
            path: path.display().to_string(),
            detail: "file has no bands".to_string(),
        })
}

/// Write a single-band grid as a GeoTIFF.
pub fn write_grid(path: &Path, grid: &Grid) -> Result<()> {
    write_raster(path, &Raster::from(grid.clone()))
}

fn mixed_bands() -> StorageError {
    StorageError::InconsistentBands {
        path: "<output>".to_string(),
        detail: "bands mix sample types".to_string(),
    }
}

fn write_pages<W, C>(
    encoder: &mut TiffEncoder<W>,
    raster: &Raster,
    bands: &[&[C::Inner]],
) -> Result<()>
where
    W: Write + Seek,
    C: ColorType,
    [C::Inner]: TiffValue,
{
    let t = &raster.transform;
    let scale = [t.pixel_width.abs(), t.pixel_height.abs(), 0.0];
    let tiepoint = [0.0, 0.0, 0.0, t.origin_x, t.origin_y, 0.0];
    let (keys, doubles) = geo_keys(raster.crs);
    let nodata = format_nodata(raster.nodata);

    for band in bands {
        let mut image = encoder.new_image::<C>(raster.width as u32, raster.height as u32)?;
        let dir = image.encoder();
        dir.write_tag(Tag::ModelPixelScaleTag, &scale[..])?;
        dir.write_tag(Tag::ModelTiepointTag, &tiepoint[..])?;
        dir.write_tag(Tag::GeoKeyDirectoryTag, &keys[..])?;
        if !doubles.is_empty() {
            dir.write_tag(Tag::GeoDoubleParamsTag, &doubles[..])?;
        }
        dir.write_tag(Tag::GdalNodata, nodata.as_str())?;
        image.write_data(band)?;
    }
    Ok(())
}

/// GeoKey directory and double parameters describing `crs`.
fn geo_keys(crs: CrsCode) -> (Vec<u16>, Vec<f64>) {
    let mut entries: Vec<[u16; 4]> = Vec::new();
    let mut doubles = Vec::new();

    match crs {
        CrsCode::Epsg4326 | CrsCode::Epsg4269 => {
            let code = crs.epsg().unwrap_or(4326);
            entries.push([GT_MODEL_TYPE, 0, 1, MODEL_TYPE_GEOGRAPHIC]);
            entries.push([GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]);
            entries.push([GEOGRAPHIC_TYPE, 0, 1, code]);
        }
        CrsCode::Epsg3857 => {
            entries.push([GT_MODEL_TYPE, 0, 1, MODEL_TYPE_PROJECTED]);
            entries.push([GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]);
            entries.push([PROJECTED_CS_TYPE, 0, 1, 3857]);
        }
        CrsCode::ModisSinusoidal => {
            doubles = vec![MODIS_SPHERE_RADIUS, MODIS_SPHERE_RADIUS, 0.0, 0.0, 0.0];
            entries.push([GT_MODEL_TYPE, 0, 1, MODEL_TYPE_PROJECTED]);
            entries.push([GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]);
            entries.push([GEOGRAPHIC_TYPE, 0, 1, USER_DEFINED]);
            entries.push([GEOG_GEODETIC_DATUM, 0, 1, USER_DEFINED]);
            entries.push([GEOG_ELLIPSOID, 0, 1, USER_DEFINED]);
            entries.push([GEOG_SEMI_MAJOR_AXIS, GEO_DOUBLE_PARAMS, 1, 0]);
            entries.push([GEOG_SEMI_MINOR_AXIS, GEO_DOUBLE_PARAMS, 1, 1]);
            entries.push([PROJECTED_CS_TYPE, 0, 1, USER_DEFINED]);
            entries.push([PROJECTION, 0, 1, USER_DEFINED]);
            entries.push([PROJ_COORD_TRANS, 0, 1, CT_SINUSOIDAL]);
            entries.push([PROJ_FALSE_EASTING, GEO_DOUBLE_PARAMS, 1, 2]);
            entries.push([PROJ_FALSE_NORTHING, GEO_DOUBLE_PARAMS, 1, 3]);
            entries.push([PROJ_CENTER_LONG, GEO_DOUBLE_PARAMS, 1, 4]);
        }
    }

    let mut keys = vec![1, 1, 0, entries.len() as u16];
    keys.extend(entries.iter().flatten());
    (keys, doubles)
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>, name: &str) -> Result<GeoTransform> {
    let missing = |tag: &str| StorageError::MissingGeoreference {
        path: name.to_string(),
        detail: format!("{} not found", tag),
    };

    let scale = decoder
        .find_tag(Tag::ModelPixelScaleTag)?
        .ok_or_else(|| missing("ModelPixelScaleTag"))?
        .into_f64_vec()?;
    let tiepoint = decoder
        .find_tag(Tag::ModelTiepointTag)?
        .ok_or_else(|| missing("ModelTiepointTag"))?
        .into_f64_vec()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(StorageError::MissingGeoreference {
            path: name.to_string(),
            detail: format!(
                "short pixel scale ({}) or tiepoint ({})",
                scale.len(),
                tiepoint.len()
            ),
        });
    }

    let (sx, sy) = (scale[0], scale[1]);
    let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
    Ok(GeoTransform::new(x - i * sx, sx, y + j * sy, -sy))
}

fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>, name: &str) -> Result<CrsCode> {
    let keys = decoder
        .find_tag(Tag::GeoKeyDirectoryTag)?
        .ok_or_else(|| StorageError::MissingGeoreference {
            path: name.to_string(),
            detail: "GeoKeyDirectoryTag not found".to_string(),
        })?
        .into_u16_vec()?;
    crs_from_geo_keys(&keys).map_err(|detail| StorageError::UnsupportedCrs {
        path: name.to_string(),
        detail,
    })
}

/// Identify the CRS described by a GeoKey directory.
fn crs_from_geo_keys(keys: &[u16]) -> std::result::Result<CrsCode, String> {
    if keys.len() < 4 {
        return Err("truncated GeoKey directory".to_string());
    }
    let count = keys[3] as usize;
    let lookup = |id: u16| {
        keys[4..]
            .chunks_exact(4)
            .take(count)
            .find(|entry| entry[0] == id && entry[1] == 0)
            .map(|entry| entry[3])
    };

    if let Some(code) = lookup(PROJECTED_CS_TYPE) {
        if code == 3857 {
            return Ok(CrsCode::Epsg3857);
        }
        if lookup(PROJ_COORD_TRANS) == Some(CT_SINUSOIDAL) {
            return Ok(CrsCode::ModisSinusoidal);
        }
        return Err(format!("projected CRS code {}", code));
    }

    match (lookup(GT_MODEL_TYPE), lookup(GEOGRAPHIC_TYPE)) {
        (Some(MODEL_TYPE_GEOGRAPHIC) | None, Some(code)) => {
            CrsCode::from_epsg(code).map_err(|e| e.to_string())
        }
        (Some(MODEL_TYPE_PROJECTED), _) if lookup(PROJ_COORD_TRANS) == Some(CT_SINUSOIDAL) => {
            Ok(CrsCode::ModisSinusoidal)
        }
        (model, geographic) => Err(format!(
            "model type {:?} with geographic type {:?}",
            model, geographic
        )),
    }
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<f64> {
    let Some(value) = decoder.find_tag(Tag::GdalNodata)? else {
        return Ok(DEFAULT_NODATA);
    };
    let text = value.into_string()?;
    Ok(parse_nodata(&text).unwrap_or(DEFAULT_NODATA))
}

fn parse_nodata(text: &str) -> Option<f64> {
    let text = text.trim_matches(char::from(0)).trim();
    if text.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    text.parse().ok()
}

fn format_nodata(nodata: f64) -> String {
    if nodata.is_nan() {
        "nan".to_string()
    } else if nodata.fract() == 0.0 && nodata.abs() < 1e15 {
        format!("{}", nodata as i64)
    } else {
        format!("{}", nodata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn raster(crs: CrsCode, bands: Vec<Samples>) -> Raster {
        Raster::new(
            3,
            2,
            GeoTransform::new(-120.0, 0.25, 38.0, -0.25),
            crs,
            -28672.0,
            bands,
        )
        .unwrap()
    }

    fn roundtrip(raster: &Raster) -> Raster {
        let mut buf = Cursor::new(Vec::new());
        write_raster_to(&mut buf, raster).unwrap();
        buf.set_position(0);
        read_raster_from(buf, "memory").unwrap()
    }

    #[test]
    fn test_multiband_int16() {
        let r = raster(
            CrsCode::Epsg4326,
            vec![
                Samples::I16(vec![1, 2, 3, 4, 5, -28672]),
                Samples::I16(vec![-28672, 20, 30, 40, 50, 60]),
            ],
        );
        assert_eq!(roundtrip(&r), r);
    }

    #[test]
    fn test_float_with_nan_nodata() {
        let mut r = raster(
            CrsCode::Epsg3857,
            vec![Samples::F32(vec![0.1, 0.2, 0.3, 0.4, 0.5, f32::NAN])],
        );
        r.nodata = f64::NAN;
        let back = roundtrip(&r);
        assert!(back.nodata.is_nan());
        assert_eq!(back.crs, CrsCode::Epsg3857);
        assert_eq!(back.sample_type(), Some(aod_common::SampleType::Float32));
    }

    #[test]
    fn test_sinusoidal_keys() {
        let r = raster(CrsCode::ModisSinusoidal, vec![Samples::I16(vec![0; 6])]);
        assert_eq!(roundtrip(&r).crs, CrsCode::ModisSinusoidal);
    }

    #[test]
    fn test_geo_keys_are_sorted() {
        for crs in [CrsCode::Epsg4326, CrsCode::Epsg3857, CrsCode::ModisSinusoidal] {
            let (keys, _) = geo_keys(crs);
            let ids: Vec<u16> = keys[4..].chunks(4).map(|e| e[0]).collect();
            let mut sorted = ids.clone();
            sorted.sort_unstable();
            assert_eq!(ids, sorted);
            assert_eq!(keys[3] as usize, ids.len());
        }
    }

    #[test]
    fn test_gdal_style_sinusoidal_keys() {
        // Only the projected user-defined CS and sinusoidal transform.
        let keys = [1, 1, 0, 3, 1024, 0, 1, 1, 3072, 0, 1, 32767, 3075, 0, 1, 24];
        assert_eq!(crs_from_geo_keys(&keys), Ok(CrsCode::ModisSinusoidal));
    }

    #[test]
    fn test_unsupported_projected_code() {
        let keys = [1, 1, 0, 2, 1024, 0, 1, 1, 3072, 0, 1, 32611];
        assert!(crs_from_geo_keys(&keys).is_err());
    }

    #[test]
    fn test_nodata_text() {
        assert_eq!(parse_nodata("-28672\0"), Some(-28672.0));
        assert!(parse_nodata("nan").unwrap().is_nan());
        assert_eq!(format_nodata(-28672.0), "-28672");
        assert_eq!(format_nodata(-0.5), "-0.5");
    }
}
