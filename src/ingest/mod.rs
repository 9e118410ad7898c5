/// Precipitation data sources.
///
/// The monitor only needs one number from the outside world: how many
/// inches fell at a point over an inclusive range of days. `WeatherSource`
/// is that seam; `open_meteo` is the production implementation.

pub mod open_meteo;

#[cfg(test)]
pub(crate) mod fixtures;

use chrono::NaiveDate;

use crate::model::WeatherError;

pub use open_meteo::OpenMeteoSource;

/// Supplies precipitation totals in inches.
pub trait WeatherSource {
    /// Total precipitation at (`latitude`, `longitude`) from `start` through
    /// `end`, both days inclusive. Fails with `DataUnavailable` when there
    /// is nothing usable to sum.
    fn fetch_total(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64, WeatherError>;
}
