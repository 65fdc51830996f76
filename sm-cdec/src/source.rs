use chrono::NaiveDate;

use crate::boundary::Boundary;
use crate::error::Result;
use crate::observation::SnowObservation;
use crate::station::Station;
use crate::variable::{SiteKind, Variable};

/// Where stations and their observations come from.
///
/// `fetch` returns `Ok(None)` when the station simply has no data for the
/// window; any `Err` is a failure of the service itself.
#[allow(async_fn_in_trait)]
pub trait StationSource {
    /// Stations of `kind` reporting any of `variables` inside `boundary`.
    async fn locate(
        &self,
        boundary: &Boundary,
        variables: &[Variable],
        kind: SiteKind,
    ) -> Result<Vec<Station>>;

    async fn fetch(
        &self,
        station: &Station,
        kind: SiteKind,
        start_date: &NaiveDate,
        end_date: &NaiveDate,
        variables: &[Variable],
    ) -> Result<Option<Vec<SnowObservation>>>;
}
