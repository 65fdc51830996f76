//! CDEC station search: query construction and result table parsing.
//!
//! The search page answers with an HTML table whose header row names the
//! columns (`ID`, `Station Name`, `River Basin`, `County`, `Longitude`,
//! `Latitude`, `Elevation Feet`, `Operator`, ...). Columns are located by
//! header text so that a reordered table still parses.

use geo::Rect;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

use crate::boundary::Boundary;
use crate::error::{CdecError, Result};
use crate::station::{parse_optional_number, Station};
use crate::variable::{SiteKind, Variable};

pub const STATION_SEARCH_URL: &str = "https://cdec.water.ca.gov/dynamicapp/staSearch";

/// Build the station search URL for one sensor within a bounding box.
/// Inactive (decommissioned) stations are not filtered out.
pub fn search_url(variable: Variable, kind: SiteKind, bbox: &Rect<f64>) -> String {
    let mut url = format!(
        "{}?sta=&sensor_chk=on&sensor={}&dur_chk=on&dur={}&active=&loc_chk=on&lon1={}&lon2={}&lat1={}&lat2={}&elev1=-5&elev2=99000&nearby=&basin=NONE&hydro=NONE&county=NONE&agency_num=160&display=sta",
        STATION_SEARCH_URL,
        variable.sensor_number(),
        kind.duration_code(),
        bbox.min().x,
        bbox.max().x,
        bbox.min().y,
        bbox.max().y,
    );
    if let Some(collect) = kind.collection_method() {
        url.push_str("&collect_chk=on&collect=");
        url.push_str(collect);
    }
    url
}

struct Columns {
    id: usize,
    name: Option<usize>,
    longitude: usize,
    latitude: usize,
    elevation: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &[String]) -> Option<Columns> {
        let find = |pred: &dyn Fn(&str) -> bool| {
            headers
                .iter()
                .position(|h| pred(h.to_lowercase().as_str()))
        };
        Some(Columns {
            id: find(&|h| h == "id")?,
            name: find(&|h| h.contains("name")),
            longitude: find(&|h| h.starts_with("lon"))?,
            latitude: find(&|h| h.starts_with("lat"))?,
            elevation: find(&|h| h.starts_with("elev")),
        })
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| CdecError::StationSearch(e.to_string()))
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Parse a station search result page into stations.
///
/// A page without any table means the search matched nothing. A table
/// without the ID / longitude / latitude columns is an error.
pub fn parse_search_results(html: &str) -> Result<Vec<Station>> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let th_sel = selector("th")?;
    let td_sel = selector("td")?;

    let mut saw_table = false;
    for table in document.select(&table_sel) {
        saw_table = true;
        let headers: Vec<String> = table.select(&th_sel).map(|th| cell_text(&th)).collect();
        let columns = match Columns::from_headers(&headers) {
            Some(c) => c,
            None => continue,
        };

        let mut stations = Vec::new();
        for row in table.select(&row_sel) {
            let cells: Vec<String> = row.select(&td_sel).map(|td| cell_text(&td)).collect();
            if cells.is_empty() {
                continue;
            }
            let station_id = match cells.get(columns.id) {
                Some(id) if !id.is_empty() => id.as_str(),
                _ => continue,
            };
            let coordinate = |idx: usize, field: &str| {
                cells
                    .get(idx)
                    .and_then(|c| parse_optional_number(c))
                    .ok_or_else(|| {
                        CdecError::StationSearch(format!(
                            "station {} has no usable {}",
                            station_id, field
                        ))
                    })
            };
            let longitude = coordinate(columns.longitude, "longitude")?;
            let latitude = coordinate(columns.latitude, "latitude")?;
            let name = columns
                .name
                .and_then(|i| cells.get(i))
                .map(String::as_str)
                .unwrap_or_default();
            let elevation = columns
                .elevation
                .and_then(|i| cells.get(i))
                .and_then(|c| parse_optional_number(c));
            stations.push(Station::new(station_id, name, longitude, latitude, elevation));
        }
        return Ok(stations);
    }

    if saw_table {
        Err(CdecError::StationSearch(String::from(
            "no table with ID, Longitude and Latitude columns",
        )))
    } else {
        Ok(Vec::new())
    }
}

/// Merge per-variable search results by station ID, keeping first-seen
/// order, and keep only the stations inside the boundary.
pub fn merge_within(results: Vec<Vec<Station>>, boundary: &Boundary) -> Vec<Station> {
    let mut seen: HashSet<String> = HashSet::new();
    results
        .into_iter()
        .flatten()
        .filter(|station| seen.insert(station.station_id.clone()))
        .filter(|station| boundary.contains(&station.location))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, polygon, MultiPolygon};

    const SEARCH_PAGE: &str = r#"<html><body>
<h2>Station Search Results</h2>
<table id="sta_table" class="data">
<thead><tr><th>ID</th><th>Station Name</th><th>River Basin</th><th>County</th><th>Longitude</th><th>Latitude</th><th>Elevation Feet</th><th>Operator</th><th>Map</th></tr></thead>
<tbody>
<tr><td><a href="/dynamicapp/staMeta?station_id=BLK">BLK</a></td><td>BLACK MOUNTAIN</td><td>FEATHER R</td><td>PLUMAS</td><td>-120.683</td><td>39.950</td><td>6,500</td><td>CA Dept of Water Resources</td><td>map</td></tr>
<tr><td><a href="/dynamicapp/staMeta?station_id=GRZ">GRZ</a></td><td>GRIZZLY RIDGE</td><td>FEATHER R</td><td>PLUMAS</td><td>-120.800</td><td>40.000</td><td></td><td>CA Dept of Water Resources</td><td>map</td></tr>
</tbody>
</table>
</body></html>"#;

    fn square() -> Boundary {
        Boundary::new(MultiPolygon::new(vec![polygon![
            (x: -121.0, y: 39.0),
            (x: -120.0, y: 39.0),
            (x: -120.0, y: 40.5),
            (x: -121.0, y: 40.5),
        ]]))
    }

    #[test]
    fn test_parse_search_results() {
        let stations = parse_search_results(SEARCH_PAGE).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].station_id, "BLK");
        assert_eq!(stations[0].name, "BLACK MOUNTAIN");
        assert_eq!(stations[0].elevation, Some(6500.0));
        assert!((stations[0].longitude() - (-120.683)).abs() < 1e-9);
        assert!((stations[0].latitude() - 39.95).abs() < 1e-9);
        assert_eq!(stations[1].station_id, "GRZ");
        assert_eq!(stations[1].elevation, None);
    }

    #[test]
    fn test_parse_no_table_is_empty() {
        let stations = parse_search_results("<html><body>No stations found</body></html>").unwrap();
        assert!(stations.is_empty());
    }

    #[test]
    fn test_parse_unexpected_table_fails() {
        let html = "<table><tr><th>Foo</th></tr><tr><td>1</td></tr></table>";
        assert!(parse_search_results(html).is_err());
    }

    #[test]
    fn test_search_url() {
        let bbox = Rect::new(coord! { x: -121.0, y: 38.0 }, coord! { x: -119.0, y: 40.0 });
        let url = search_url(Variable::Swe, SiteKind::SnowCourse, &bbox);
        assert!(url.starts_with(STATION_SEARCH_URL));
        assert!(url.contains("sensor=3"));
        assert!(url.contains("dur=M"));
        assert!(url.contains("lon1=-121&lon2=-119&lat1=38&lat2=40"));
        assert!(url.ends_with("&collect_chk=on&collect=MANUAL+ENTRY"));

        let url = search_url(Variable::Swe, SiteKind::Sensor, &bbox);
        assert!(url.contains("dur=D"));
        assert!(!url.contains("collect="));
    }

    #[test]
    fn test_search_url_includes_inactive_stations() {
        let bbox = Rect::new(coord! { x: -121.0, y: 38.0 }, coord! { x: -119.0, y: 40.0 });
        for kind in [SiteKind::SnowCourse, SiteKind::Sensor] {
            let url = search_url(Variable::Swe, kind, &bbox);
            assert!(url.contains("&active=&"));
            assert!(!url.contains("active_chk"));
            assert!(!url.contains("active=Y"));
        }
    }

    #[test]
    fn test_merge_within() {
        let swe = vec![
            Station::new("BLK", "", -120.5, 39.5, Some(6500.0)),
            Station::new("FAR", "", -118.0, 39.5, Some(7000.0)),
        ];
        let depth = vec![
            Station::new("BLK", "", -120.5, 39.5, Some(6500.0)),
            Station::new("GRZ", "", -120.8, 40.0, None),
        ];
        let merged = merge_within(vec![swe, depth], &square());
        let ids: Vec<&str> = merged.iter().map(|s| s.station_id.as_str()).collect();
        assert_eq!(ids, vec!["BLK", "GRZ"]);
    }
}
