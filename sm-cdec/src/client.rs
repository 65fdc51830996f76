//! CDEC web service client.
//!
//! Stations are found through the CDEC station search (or a local station
//! catalog CSV per site kind) and observations come from the
//! `CSVDataServlet` endpoint. Requests are sequential with no timeout,
//! retry or caching.

use chrono::NaiveDate;
use log::{debug, info};
use reqwest::Client;
use std::collections::HashMap;

use crate::boundary::Boundary;
use crate::error::{CdecError, Result};
use crate::observation::{observations_from_body, SnowObservation, YEAR_FORMAT};
use crate::search::{merge_within, parse_search_results, search_url};
use crate::source::StationSource;
use crate::station::Station;
use crate::variable::{SiteKind, Variable};

pub const CSV_DATA_URL: &str = "https://cdec.water.ca.gov/dynamicapp/req/CSVDataServlet";

pub struct CdecClient {
    client: Client,
    catalogs: HashMap<SiteKind, Vec<Station>>,
}

impl CdecClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(CdecClient {
            client,
            catalogs: HashMap::new(),
        })
    }

    /// Use a local station list for `kind` instead of the remote search.
    pub fn with_catalog(mut self, kind: SiteKind, stations: Vec<Station>) -> Self {
        self.catalogs.insert(kind, stations);
        self
    }

    /// Observation request URL for one station.
    pub fn data_url(
        station_id: &str,
        kind: SiteKind,
        start_date: &NaiveDate,
        end_date: &NaiveDate,
        variables: &[Variable],
    ) -> String {
        format!(
            "{}?Stations={}&SensorNums={}&dur_code={}&Start={}&End={}",
            CSV_DATA_URL,
            station_id,
            Variable::sensor_list(variables),
            kind.duration_code(),
            start_date.format(YEAR_FORMAT),
            end_date.format(YEAR_FORMAT)
        )
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CdecError::ResponseStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

impl StationSource for CdecClient {
    async fn locate(
        &self,
        boundary: &Boundary,
        variables: &[Variable],
        kind: SiteKind,
    ) -> Result<Vec<Station>> {
        if let Some(catalog) = self.catalogs.get(&kind) {
            let stations = merge_within(vec![catalog.clone()], boundary);
            info!(
                "Found {} of {} catalog {}s inside the boundary",
                stations.len(),
                catalog.len(),
                kind
            );
            return Ok(stations);
        }

        let bbox = boundary
            .bounding_box()
            .ok_or_else(|| CdecError::StationSearch(String::from("boundary is empty")))?;
        let mut results = Vec::with_capacity(variables.len());
        for variable in variables {
            let body = self.get_text(&search_url(*variable, kind, &bbox)).await?;
            results.push(parse_search_results(&body)?);
        }
        let searched: usize = results.iter().map(Vec::len).sum();
        let stations = merge_within(results, boundary);
        info!(
            "Station search returned {} {} entries, {} inside the boundary",
            searched,
            kind,
            stations.len()
        );
        Ok(stations)
    }

    async fn fetch(
        &self,
        station: &Station,
        kind: SiteKind,
        start_date: &NaiveDate,
        end_date: &NaiveDate,
        variables: &[Variable],
    ) -> Result<Option<Vec<SnowObservation>>> {
        let url = CdecClient::data_url(&station.station_id, kind, start_date, end_date, variables);
        let body = self.get_text(&url).await?;
        let observations = observations_from_body(&body)?;
        if observations.is_none() {
            debug!("No usable observations for {}", station.station_id);
        }
        Ok(observations)
    }
}
