//! Raster file footprints.
//!
//! Reads the georeferencing tags of a GeoTIFF, expands the pixel extent by a
//! percentage and reprojects its corners to WGS84.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use thiserror::Error;
use tiff::decoder::Decoder;
use tiff::tags::Tag;

use crate::geometry::Geometry;

/// GeoKey holding the EPSG code of a projected CRS.
const PROJECTED_CS_TYPE_GEOKEY: u16 = 3072;

/// GeoKey holding the EPSG code of a geographic CRS.
const GEOGRAPHIC_TYPE_GEOKEY: u16 = 2048;

const WGS84_EPSG: u16 = 4326;

/// Errors reading a raster footprint.
#[derive(Debug, Error)]
pub enum RasterFootprintError {
    #[error("cannot open raster: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot decode TIFF: {0}")]
    Tiff(String),

    #[error("raster is not georeferenced: missing {0}")]
    MissingTag(&'static str),

    #[error("unsupported raster CRS: {0}")]
    Projection(String),
}

/// Bounds of a raster in its own CRS.
#[derive(Debug, Clone, Copy, PartialEq)]
struct NativeBounds {
    left: f64,
    bottom: f64,
    right: f64,
    top: f64,
}

impl NativeBounds {
    /// Grow each side by `pct` percent of the extent in that dimension.
    fn expand(self, pct: f64) -> Self {
        let dx = (self.right - self.left) * pct / 100.0;
        let dy = (self.top - self.bottom) * pct / 100.0;
        Self {
            left: self.left - dx,
            bottom: self.bottom - dy,
            right: self.right + dx,
            top: self.top + dy,
        }
    }

    /// Closed ring: bottom-right, top-right, top-left, bottom-left.
    fn ring(&self) -> [(f64, f64); 5] {
        [
            (self.right, self.bottom),
            (self.right, self.top),
            (self.left, self.top),
            (self.left, self.bottom),
            (self.right, self.bottom),
        ]
    }
}

/// WGS84 footprint polygon of a GeoTIFF, expanded by `buffer_pct` percent.
pub fn raster_footprint(path: &Path, buffer_pct: f64) -> Result<Geometry, RasterFootprintError> {
    let file = File::open(path)?;
    let (bounds, epsg) = read_bounds(BufReader::new(file))?;
    let expanded = bounds.expand(buffer_pct.max(0.0));

    let ring = to_wgs84(&expanded.ring(), epsg)?;
    Ok(Geometry::Polygon {
        coordinates: vec![ring.into_iter().map(|(x, y)| vec![x, y]).collect()],
    })
}

fn read_bounds<R: Read + Seek>(reader: R) -> Result<(NativeBounds, u16), RasterFootprintError> {
    let tiff_err = |e: tiff::TiffError| RasterFootprintError::Tiff(e.to_string());

    let mut decoder = Decoder::new(reader).map_err(tiff_err)?;
    let (width, height) = decoder.dimensions().map_err(tiff_err)?;

    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| RasterFootprintError::MissingTag("ModelPixelScale"))?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| RasterFootprintError::MissingTag("ModelTiepoint"))?;
    let geokeys = decoder
        .get_tag_u16_vec(Tag::GeoKeyDirectoryTag)
        .map_err(|_| RasterFootprintError::MissingTag("GeoKeyDirectory"))?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(RasterFootprintError::MissingTag("geotransform"));
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let left = tiepoint[3] - tiepoint[0] * scale[0];
    let top = tiepoint[4] + tiepoint[1] * scale[1];
    let bounds = NativeBounds {
        left,
        top,
        right: left + f64::from(width) * scale[0],
        bottom: top - f64::from(height) * scale[1],
    };

    let epsg = epsg_from_geokeys(&geokeys).ok_or(RasterFootprintError::MissingTag("EPSG GeoKey"))?;
    Ok((bounds, epsg))
}

/// Find the CRS EPSG code in a GeoKeyDirectory, preferring projected CRSs.
fn epsg_from_geokeys(directory: &[u16]) -> Option<u16> {
    let entries = directory.get(4..)?;
    let inline_value = |wanted: u16| {
        entries
            .chunks_exact(4)
            .find(|entry| entry[0] == wanted && entry[1] == 0)
            .map(|entry| entry[3])
    };

    inline_value(PROJECTED_CS_TYPE_GEOKEY).or_else(|| inline_value(GEOGRAPHIC_TYPE_GEOKEY))
}

fn to_wgs84(points: &[(f64, f64)], epsg: u16) -> Result<Vec<(f64, f64)>, RasterFootprintError> {
    if epsg == WGS84_EPSG {
        return Ok(points.to_vec());
    }

    let proj_err =
        |e: proj4rs::errors::Error| RasterFootprintError::Projection(format!("EPSG:{}: {:?}", epsg, e));
    let source = Proj::from_epsg_code(epsg).map_err(proj_err)?;
    let target = Proj::from_epsg_code(WGS84_EPSG).map_err(proj_err)?;

    points
        .iter()
        .map(|&(x, y)| {
            let mut point = if source.is_latlong() {
                (x.to_radians(), y.to_radians(), 0.0)
            } else {
                (x, y, 0.0)
            };
            transform(&source, &target, &mut point).map_err(proj_err)?;
            Ok((point.0.to_degrees(), point.1.to_degrees()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiff::encoder::colortype::Gray8;
    use tiff::encoder::TiffEncoder;

    fn write_geotiff(path: &Path, epsg: u16, origin: (f64, f64), pixel: f64, size: u32) {
        let file = File::create(path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        let mut image = encoder.new_image::<Gray8>(size, size).unwrap();

        let scale = [pixel, pixel, 0.0];
        let tiepoint = [0.0, 0.0, 0.0, origin.0, origin.1, 0.0];
        let key = if epsg == WGS84_EPSG {
            GEOGRAPHIC_TYPE_GEOKEY
        } else {
            PROJECTED_CS_TYPE_GEOKEY
        };
        let geokeys = [1u16, 1, 0, 1, key, 0, 1, epsg];

        image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &scale[..])
            .unwrap();
        image
            .encoder()
            .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
            .unwrap();
        image
            .encoder()
            .write_tag(Tag::GeoKeyDirectoryTag, &geokeys[..])
            .unwrap();

        let data = vec![0u8; (size * size) as usize];
        image.write_data(&data).unwrap();
    }

    #[test]
    fn test_expand_bounds() {
        let bounds = NativeBounds {
            left: 0.0,
            bottom: 0.0,
            right: 100.0,
            top: 50.0,
        };
        let expanded = bounds.expand(10.0);
        assert_eq!(expanded.left, -10.0);
        assert_eq!(expanded.right, 110.0);
        assert_eq!(expanded.bottom, -5.0);
        assert_eq!(expanded.top, 55.0);
    }

    #[test]
    fn test_epsg_prefers_projected() {
        let directory = [1, 1, 0, 2, 2048, 0, 1, 4326, 3072, 0, 1, 32734];
        assert_eq!(epsg_from_geokeys(&directory), Some(32734));
        assert_eq!(epsg_from_geokeys(&[1, 1, 0]), None);
    }

    #[test]
    fn test_geographic_footprint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wgs84.tif");
        write_geotiff(&path, WGS84_EPSG, (20.0, -33.0), 0.1, 10);

        let footprint = raster_footprint(&path, 0.0).unwrap();
        let ring = footprint.exterior().unwrap();
        assert_eq!(ring.len(), 5);
        assert!((ring[0][0] - 21.0).abs() < 1e-9);
        assert!((ring[0][1] + 34.0).abs() < 1e-9);
        assert!((ring[2][0] - 20.0).abs() < 1e-9);
        assert!((ring[2][1] + 33.0).abs() < 1e-9);
    }

    #[test]
    fn test_projected_footprint_lands_near_origin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("utm.tif");
        // UTM 34S, roughly 21E 33.7S
        write_geotiff(&path, 32734, (500_000.0, 6_270_000.0), 30.0, 100);

        let footprint = raster_footprint(&path, 5.0).unwrap();
        for position in footprint.exterior().unwrap() {
            assert!(position[0] > 20.0 && position[0] < 22.0, "lon {}", position[0]);
            assert!(position[1] > -35.0 && position[1] < -33.0, "lat {}", position[1]);
        }
    }

    #[test]
    fn test_plain_tiff_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.tif");
        let file = File::create(&path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        encoder.write_image::<Gray8>(2, 2, &[0u8; 4]).unwrap();

        let err = raster_footprint(&path, 0.0).unwrap_err();
        assert!(matches!(err, RasterFootprintError::MissingTag(_)));
    }
}
