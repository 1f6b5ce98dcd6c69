//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Shared data shapes for simulation datasets and chart series."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::errors::{CoreError, Result};

/// Display granularity selected by the operator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TimeScale {
    /// Hourly buckets of a single simulated day.
    #[default]
    Day,
    /// Daily buckets of a 30 day run.
    Month,
    /// Monthly buckets of a 365 day run.
    Year,
}

impl TimeScale {
    /// Number of days the generator must simulate for this scale.
    pub fn days_to_simulate(&self) -> u32 {
        match self {
            TimeScale::Day => 1,
            TimeScale::Month => 30,
            TimeScale::Year => 365,
        }
    }
}

/// Immutable input to the simulation generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub point_count: u32,
    pub arrival_multiplier: f64,
    pub charging_power_kw: f64,
    pub days_to_simulate: u32,
}

impl SimulationParameters {
    /// Reject non-positive values before they reach the generator.
    pub fn validate(&self) -> Result<()> {
        if self.point_count == 0 {
            return Err(CoreError::domain("point count must be positive"));
        }
        if !(self.arrival_multiplier.is_finite() && self.arrival_multiplier > 0.0) {
            return Err(CoreError::domain(format!(
                "arrival multiplier must be positive, got {}",
                self.arrival_multiplier
            )));
        }
        if !(self.charging_power_kw.is_finite() && self.charging_power_kw > 0.0) {
            return Err(CoreError::domain(format!(
                "charging power must be positive, got {} kW",
                self.charging_power_kw
            )));
        }
        if self.days_to_simulate == 0 {
            return Err(CoreError::domain("days to simulate must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyBucket {
    pub hour: u32,
    pub events: u64,
    pub total_power_kw: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBucket {
    pub day: u32,
    pub events: u64,
    pub total_power_kw: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub month: u32,
    pub events: u64,
    pub total_power_kw: f64,
}

/// Activity observed on a single calendar day.
///
/// Counts are signed so that inputs from external sources can be checked
/// rather than silently wrapped; the calendar rejects negative values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySample {
    pub date: NaiveDate,
    pub count: i64,
}

impl ActivitySample {
    pub fn new(date: NaiveDate, count: i64) -> Self {
        Self { date, count }
    }
}

/// Output of one generator run.
///
/// Series are optional because recorded datasets come from outside the
/// workspace and may omit them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationDataset {
    #[serde(default)]
    pub hourly: Option<Vec<HourlyBucket>>,
    #[serde(default)]
    pub daily: Option<Vec<DailyBucket>>,
    #[serde(default)]
    pub monthly: Option<Vec<MonthlyBucket>>,
    #[serde(default)]
    pub total_energy_charged: f64,
    #[serde(default)]
    pub total_events: u64,
    #[serde(default)]
    pub peak_power_load: f64,
    #[serde(default)]
    pub average_events_per_day: f64,
    #[serde(default)]
    pub heatmap: Vec<ActivitySample>,
}

/// View-ready projection of the series matching the active time scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeriesPoint {
    pub label: String,
    pub event_count: u64,
    pub energy_kwh: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SimulationParameters {
        SimulationParameters {
            point_count: 10,
            arrival_multiplier: 1.0,
            charging_power_kw: 11.0,
            days_to_simulate: 30,
        }
    }

    #[test]
    fn time_scale_maps_to_canonical_days() {
        assert_eq!(TimeScale::Day.days_to_simulate(), 1);
        assert_eq!(TimeScale::Month.days_to_simulate(), 30);
        assert_eq!(TimeScale::Year.days_to_simulate(), 365);
    }

    #[test]
    fn time_scale_parses_case_insensitively() {
        assert_eq!("YEAR".parse::<TimeScale>().unwrap(), TimeScale::Year);
        assert_eq!("month".parse::<TimeScale>().unwrap(), TimeScale::Month);
        assert!("week".parse::<TimeScale>().is_err());
        assert_eq!(TimeScale::Day.to_string(), "day");
    }

    #[test]
    fn validate_accepts_positive_parameters() {
        params().validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_points_and_bad_power() {
        let mut zero_points = params();
        zero_points.point_count = 0;
        assert!(matches!(zero_points.validate(), Err(CoreError::Domain(_))));

        let mut nan_power = params();
        nan_power.charging_power_kw = f64::NAN;
        assert!(matches!(nan_power.validate(), Err(CoreError::Domain(_))));

        let mut negative_multiplier = params();
        negative_multiplier.arrival_multiplier = -0.5;
        assert!(negative_multiplier.validate().is_err());
    }

    #[test]
    fn dataset_without_series_deserializes_as_missing() {
        let dataset: SimulationDataset =
            serde_json::from_str(r#"{"total_events": 4, "heatmap": []}"#).unwrap();
        assert!(dataset.hourly.is_none());
        assert!(dataset.monthly.is_none());
        assert_eq!(dataset.total_events, 4);
    }
}
