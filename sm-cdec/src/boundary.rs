//! Region boundary used to spatially filter stations.
//!
//! The boundary is read once per run from an ESRI Shapefile (`.shp`) or a
//! GeoJSON file (`.geojson` / `.json`). Every polygon in the file is merged
//! into a single multipolygon. Projected files are reprojected to WGS84
//! longitude / latitude using the CRS from the `.prj` sidecar or the GeoJSON
//! `crs` member; a file without either must already be in degrees.

use geo::{BoundingRect, Contains, Coord, Geometry, LineString, MultiPolygon, Point, Polygon, Rect};
use geojson::GeoJson;
use log::{debug, info};
use shapefile::{PolygonRing, Shape};
use std::path::Path;

use crate::crs::Crs;
use crate::error::{CdecError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    shape: MultiPolygon<f64>,
}

impl Boundary {
    pub fn new(shape: MultiPolygon<f64>) -> Self {
        Boundary { shape }
    }

    /// Load a boundary from a polygon file, choosing the reader by extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let (polygons, crs) = match extension.as_deref() {
            Some("shp") => (read_shapefile(path)?, read_prj(path)?),
            Some("geojson") | Some("json") => read_geojson(path)?,
            _ => return Err(boundary_error(path, "unsupported file extension")),
        };
        if polygons.is_empty() {
            return Err(boundary_error(path, "no polygon geometry found"));
        }
        let mut shape = MultiPolygon::new(polygons);
        if let Some(crs) = &crs {
            debug!("Boundary {} CRS: {:?}", path.display(), crs);
            shape = crs.to_wgs84(&shape).map_err(|e| boundary_error(path, e))?;
        }
        let boundary = Boundary::new(shape);
        match boundary.bounding_box() {
            Some(rect) if is_geographic(&rect) => {
                info!(
                    "Loaded boundary {} ({} polygons, lon {:.3}..{:.3}, lat {:.3}..{:.3})",
                    path.display(),
                    boundary.shape.0.len(),
                    rect.min().x,
                    rect.max().x,
                    rect.min().y,
                    rect.max().y
                );
                Ok(boundary)
            }
            _ if crs.is_none() => Err(boundary_error(
                path,
                "coordinates are not longitude/latitude degrees and no CRS was found",
            )),
            _ => Err(boundary_error(
                path,
                "coordinates are outside the longitude/latitude range",
            )),
        }
    }

    /// Smallest lon/lat rectangle enclosing the boundary.
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        self.shape.bounding_rect()
    }

    pub fn contains(&self, point: &Point<f64>) -> bool {
        self.shape.contains(point)
    }

    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }
}

fn is_geographic(rect: &Rect<f64>) -> bool {
    let (min, max) = (rect.min(), rect.max());
    (-180.0..=180.0).contains(&min.x)
        && (-180.0..=180.0).contains(&max.x)
        && (-90.0..=90.0).contains(&min.y)
        && (-90.0..=90.0).contains(&max.y)
}

fn boundary_error<R: ToString>(path: &Path, reason: R) -> CdecError {
    CdecError::Boundary {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// The `.prj` sidecar next to a shapefile, if there is one.
fn read_prj(path: &Path) -> Result<Option<Crs>> {
    let sidecar = ["prj", "PRJ"]
        .iter()
        .map(|ext| path.with_extension(ext))
        .find(|p| p.is_file());
    match sidecar {
        Some(prj) => {
            let wkt = std::fs::read_to_string(&prj)?;
            let crs = Crs::from_wkt(&wkt).map_err(|e| boundary_error(&prj, e))?;
            Ok(Some(crs))
        }
        None => Ok(None),
    }
}

/// `"crs": {"type": "name", "properties": {"name": "EPSG:26911"}}`
fn geojson_crs(foreign_members: Option<&geojson::JsonObject>) -> Option<String> {
    foreign_members?
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()
        .map(String::from)
}

fn read_geojson(path: &Path) -> Result<(Vec<Polygon<f64>>, Option<Crs>)> {
    let text = std::fs::read_to_string(path)?;
    let geojson = text
        .parse::<GeoJson>()
        .map_err(|e| boundary_error(path, e))?;
    let (geometries, crs_name): (Vec<geojson::Geometry>, Option<String>) = match geojson {
        GeoJson::FeatureCollection(collection) => (
            collection
                .features
                .into_iter()
                .filter_map(|feature| feature.geometry)
                .collect(),
            geojson_crs(collection.foreign_members.as_ref()),
        ),
        GeoJson::Feature(feature) => (
            feature.geometry.into_iter().collect(),
            geojson_crs(feature.foreign_members.as_ref()),
        ),
        GeoJson::Geometry(geometry) => {
            let crs_name = geojson_crs(geometry.foreign_members.as_ref());
            (vec![geometry], crs_name)
        }
    };
    let crs = crs_name
        .map(|name| Crs::from_name(&name))
        .transpose()
        .map_err(|e| boundary_error(path, e))?;

    let mut polygons = Vec::new();
    for geometry in geometries {
        let geometry =
            Geometry::<f64>::try_from(geometry.value).map_err(|e| boundary_error(path, e))?;
        collect_polygons(geometry, &mut polygons);
    }
    Ok((polygons, crs))
}

fn collect_polygons(geometry: Geometry<f64>, polygons: &mut Vec<Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(p) => polygons.push(p),
        Geometry::MultiPolygon(mp) => polygons.extend(mp.0),
        Geometry::GeometryCollection(gc) => {
            for g in gc.0 {
                collect_polygons(g, polygons);
            }
        }
        _ => {}
    }
}

fn read_shapefile(path: &Path) -> Result<Vec<Polygon<f64>>> {
    let shapes = shapefile::read_shapes(path).map_err(|e| boundary_error(path, e))?;
    let mut polygons = Vec::new();
    for shape in shapes {
        match shape {
            Shape::Polygon(p) => {
                polygons.extend(rings_to_polygons(p.rings(), |pt| Coord { x: pt.x, y: pt.y }))
            }
            Shape::PolygonM(p) => {
                polygons.extend(rings_to_polygons(p.rings(), |pt| Coord { x: pt.x, y: pt.y }))
            }
            Shape::PolygonZ(p) => {
                polygons.extend(rings_to_polygons(p.rings(), |pt| Coord { x: pt.x, y: pt.y }))
            }
            _ => {}
        }
    }
    Ok(polygons)
}

/// Shapefile polygons list each outer ring followed by its holes.
fn rings_to_polygons<P, F>(rings: &[PolygonRing<P>], to_coord: F) -> Vec<Polygon<f64>>
where
    F: Fn(&P) -> Coord<f64>,
{
    let mut parts: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();
    for ring in rings {
        let line: LineString<f64> = ring.points().iter().map(&to_coord).collect();
        match ring {
            PolygonRing::Outer(_) => parts.push((line, Vec::new())),
            PolygonRing::Inner(_) => {
                if let Some((_, holes)) = parts.last_mut() {
                    holes.push(line);
                }
            }
        }
    }
    parts
        .into_iter()
        .map(|(exterior, holes)| Polygon::new(exterior, holes))
        .collect()
}
