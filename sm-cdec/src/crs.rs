//! Coordinate reference systems for boundary files.
//!
//! Shapefiles carry their CRS as WKT in a `.prj` sidecar and older GeoJSON
//! files name it in a `crs` member. Projected boundaries are reprojected to
//! WGS84 longitude / latitude with `proj4rs` before stations are filtered.
//! Datum shifts between NAD83 and WGS84 are ignored.

use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::proj::Proj;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::{CdecError, Result};

const WGS84_LONGLAT: &str = "+proj=longlat +ellps=WGS84 +towgs84=0,0,0 +no_defs";

#[derive(Debug, Clone, PartialEq)]
pub enum Crs {
    /// Longitude / latitude degrees, used as-is
    Geographic,
    /// proj definition in meters, and the file's linear unit in meters
    Projected { definition: String, to_meter: f64 },
}

impl Crs {
    /// EPSG codes commonly used for California boundaries.
    pub fn from_epsg(code: u32) -> Option<Crs> {
        let definition = match code {
            4326 | 4269 | 4267 | 4979 => return Some(Crs::Geographic),
            32601..=32660 => format!(
                "+proj=utm +zone={} +ellps=WGS84 +towgs84=0,0,0",
                code - 32600
            ),
            32701..=32760 => format!(
                "+proj=utm +zone={} +south +ellps=WGS84 +towgs84=0,0,0",
                code - 32700
            ),
            26901..=26923 => format!(
                "+proj=utm +zone={} +ellps=GRS80 +towgs84=0,0,0",
                code - 26900
            ),
            // California Albers
            3310 => String::from(
                "+proj=aea +lat_1=34 +lat_2=40.5 +lat_0=0 +lon_0=-120 +x_0=0 +y_0=-4000000 +ellps=GRS80 +towgs84=0,0,0",
            ),
            _ => return None,
        };
        Some(Crs::Projected {
            definition,
            to_meter: 1.0,
        })
    }

    /// Resolve a GeoJSON `crs` name: `urn:ogc:def:crs:EPSG::26911`,
    /// `EPSG:32611` or `urn:ogc:def:crs:OGC:1.3:CRS84`.
    pub fn from_name(name: &str) -> Result<Crs> {
        let upper = name.trim().to_ascii_uppercase();
        if upper.ends_with("CRS84") {
            return Ok(Crs::Geographic);
        }
        upper
            .rsplit(':')
            .next()
            .and_then(|code| code.parse::<u32>().ok())
            .and_then(Crs::from_epsg)
            .ok_or_else(|| projection_error(format!("unsupported CRS name {}", name)))
    }

    /// Resolve an OGC / ESRI WKT1 definition as found in `.prj` files.
    pub fn from_wkt(wkt: &str) -> Result<Crs> {
        let root = WktNode::parse(wkt)?;
        match root.keyword.as_str() {
            "GEOGCS" => Ok(Crs::Geographic),
            "PROJCS" => match root.epsg_code().and_then(Crs::from_epsg) {
                Some(crs) => Ok(crs),
                None => projected_from_wkt(&root),
            },
            other => Err(projection_error(format!("unsupported WKT root {}", other))),
        }
    }

    /// Reproject a shape into WGS84 longitude / latitude degrees.
    pub fn to_wgs84(&self, shape: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        let (definition, to_meter) = match self {
            Crs::Geographic => return Ok(shape.clone()),
            Crs::Projected {
                definition,
                to_meter,
            } => (definition, *to_meter),
        };
        let source = Proj::from_proj_string(definition).map_err(projection_error)?;
        let target = Proj::from_proj_string(WGS84_LONGLAT).map_err(projection_error)?;
        shape
            .try_map_coords(
                |c: Coord<f64>| -> std::result::Result<Coord<f64>, proj4rs::errors::Error> {
                    let mut point = (c.x * to_meter, c.y * to_meter, 0.0);
                    proj4rs::transform::transform(&source, &target, &mut point)?;
                    // geographic output is in radians
                    Ok(Coord {
                        x: point.0.to_degrees(),
                        y: point.1.to_degrees(),
                    })
                },
            )
            .map_err(projection_error)
    }
}

fn projection_error<E: ToString>(e: E) -> CdecError {
    CdecError::Projection(e.to_string())
}

fn projected_from_wkt(root: &WktNode) -> Result<Crs> {
    let projection = root
        .child("PROJECTION")
        .and_then(|p| p.text(0))
        .ok_or_else(|| projection_error("PROJCS without PROJECTION"))?;
    let proj = match projection.to_ascii_lowercase().as_str() {
        "transverse_mercator" => "tmerc",
        "albers" | "albers_conic_equal_area" => "aea",
        "lambert_conformal_conic"
        | "lambert_conformal_conic_1sp"
        | "lambert_conformal_conic_2sp" => "lcc",
        "mercator" | "mercator_1sp" | "mercator_2sp" => "merc",
        other => return Err(projection_error(format!("unsupported projection {}", other))),
    };

    let spheroid = root
        .child("GEOGCS")
        .and_then(|g| g.child("DATUM"))
        .and_then(|d| d.child("SPHEROID"))
        .ok_or_else(|| projection_error("PROJCS without SPHEROID"))?;
    let (a, rf) = match (spheroid.number(1), spheroid.number(2)) {
        (Some(a), Some(rf)) => (a, rf),
        _ => return Err(projection_error("SPHEROID without axis and flattening")),
    };
    let b = if rf == 0.0 { a } else { a * (1.0 - 1.0 / rf) };
    // the PROJCS unit, not the GEOGCS angular one
    let to_meter = root.child("UNIT").and_then(|u| u.number(1)).unwrap_or(1.0);

    let mut definition = format!("+proj={} +a={} +b={}", proj, a, b);
    for parameter in root.children("PARAMETER") {
        let (Some(name), Some(value)) = (parameter.text(0), parameter.number(1)) else {
            continue;
        };
        let (key, value) = match name.to_ascii_lowercase().as_str() {
            "central_meridian" | "longitude_of_center" | "longitude_of_origin" => ("lon_0", value),
            "latitude_of_origin" | "latitude_of_center" => ("lat_0", value),
            "standard_parallel_1" => ("lat_1", value),
            "standard_parallel_2" => ("lat_2", value),
            "scale_factor" => ("k_0", value),
            "false_easting" => ("x_0", value * to_meter),
            "false_northing" => ("y_0", value * to_meter),
            _ => continue,
        };
        definition.push_str(&format!(" +{}={}", key, value));
    }
    definition.push_str(" +towgs84=0,0,0");
    Ok(Crs::Projected {
        definition,
        to_meter,
    })
}

#[derive(Debug)]
enum WktValue {
    Text(String),
    Number(f64),
    Node(WktNode),
}

/// `KEYWORD["text", 1.0, CHILD[...], BARE_WORD]`
#[derive(Debug)]
struct WktNode {
    keyword: String,
    values: Vec<WktValue>,
}

impl WktNode {
    fn parse(wkt: &str) -> Result<WktNode> {
        let mut reader = WktReader {
            chars: wkt.trim_start_matches('\u{feff}').chars().peekable(),
        };
        let keyword = reader.word();
        let node = reader.node(keyword)?;
        reader.skip_whitespace();
        match reader.chars.next() {
            None => Ok(node),
            Some(c) => Err(projection_error(format!("unexpected {:?} after WKT", c))),
        }
    }

    fn children<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a WktNode> + 'a {
        self.values.iter().filter_map(move |v| match v {
            WktValue::Node(n) if n.keyword == keyword => Some(n),
            _ => None,
        })
    }

    fn child(&self, keyword: &str) -> Option<&WktNode> {
        self.values.iter().find_map(|v| match v {
            WktValue::Node(n) if n.keyword == keyword => Some(n),
            _ => None,
        })
    }

    fn text(&self, index: usize) -> Option<&str> {
        match self.values.get(index) {
            Some(WktValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    fn number(&self, index: usize) -> Option<f64> {
        match self.values.get(index) {
            Some(WktValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// `AUTHORITY["EPSG","32611"]` directly under this node.
    fn epsg_code(&self) -> Option<u32> {
        let authority = self.child("AUTHORITY")?;
        if !authority.text(0)?.eq_ignore_ascii_case("EPSG") {
            return None;
        }
        match authority.values.get(1)? {
            WktValue::Text(code) => code.trim().parse().ok(),
            WktValue::Number(code) => Some(*code as u32),
            WktValue::Node(_) => None,
        }
    }
}

struct WktReader<'a> {
    chars: Peekable<Chars<'a>>,
}

impl WktReader<'_> {
    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.chars.next_if(|c| pred(*c)) {
            out.push(c);
        }
        out
    }

    fn word(&mut self) -> String {
        self.skip_whitespace();
        self.take_while(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    fn node(&mut self, keyword: String) -> Result<WktNode> {
        if keyword.is_empty() {
            return Err(projection_error("malformed WKT: missing keyword"));
        }
        self.skip_whitespace();
        if self.chars.next_if(|c| *c == '[' || *c == '(').is_none() {
            return Err(projection_error(format!("malformed WKT: {} has no body", keyword)));
        }

        let mut values = Vec::new();
        loop {
            self.skip_whitespace();
            let value = match self.chars.peek().copied() {
                Some('"') => WktValue::Text(self.quoted()?),
                Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                    let raw = self.take_while(|c| {
                        c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')
                    });
                    let number = raw
                        .parse::<f64>()
                        .map_err(|_| projection_error(format!("malformed WKT number {}", raw)))?;
                    WktValue::Number(number)
                }
                Some(c) if c.is_ascii_alphabetic() => {
                    let word = self.word();
                    self.skip_whitespace();
                    match self.chars.peek().copied() {
                        Some('[') | Some('(') => WktValue::Node(self.node(word)?),
                        _ => WktValue::Text(word),
                    }
                }
                _ => {
                    return Err(projection_error(format!(
                        "malformed WKT inside {}",
                        keyword
                    )))
                }
            };
            values.push(value);

            self.skip_whitespace();
            match self.chars.next() {
                Some(',') => continue,
                Some(']') | Some(')') => break,
                _ => {
                    return Err(projection_error(format!(
                        "malformed WKT: unterminated {}",
                        keyword
                    )))
                }
            }
        }
        Ok(WktNode {
            keyword: keyword.to_ascii_uppercase(),
            values,
        })
    }

    fn quoted(&mut self) -> Result<String> {
        self.chars.next();
        let mut text = String::new();
        loop {
            match self.chars.next() {
                Some('"') if self.chars.next_if_eq(&'"').is_some() => text.push('"'),
                Some('"') => return Ok(text),
                Some(c) => text.push(c),
                None => return Err(projection_error("malformed WKT: unterminated string")),
            }
        }
    }
}
