//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Calendar grid materialisation and activity intensity bucketing."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Dense per-day calendar over a date range with min–max normalised activity.
//!
//! Every day in the inclusive range gets exactly one [`CalendarCell`], in
//! ascending order, no matter how sparse the samples are. Days without a
//! sample, or with a zero count, land in [`IntensityBucket::NoActivity`].
//! Positive counts are rescaled against the minimum and maximum of the whole
//! sample set, including samples outside the displayed range, and floored
//! into one of eleven levels.
//!
//! When the same date appears more than once the last sample wins for the
//! cell, while every sample, shadowed or not, still feeds the scale.
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CoreError, Result};
use crate::model::ActivitySample;

/// Highest intensity level; `normalized == 1.0` maps here.
pub const MAX_LEVEL: u8 = 10;

/// Discrete intensity class of a calendar day.
///
/// Serialised as an integer in `[-1, 10]` where `-1` is the no-activity
/// sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum IntensityBucket {
    NoActivity,
    Level(u8),
}

impl IntensityBucket {
    /// `floor(normalized * 10)` clamped to `[0, 10]`.
    pub fn from_normalized(normalized: f64) -> Self {
        let scaled = (normalized.clamp(0.0, 1.0) * f64::from(MAX_LEVEL)).floor();
        // clamp above keeps `scaled` within 0..=10
        Self::Level((scaled as u8).min(MAX_LEVEL))
    }

    pub fn index(self) -> i8 {
        match self {
            IntensityBucket::NoActivity => -1,
            IntensityBucket::Level(level) => level as i8,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, IntensityBucket::Level(_))
    }
}

impl From<IntensityBucket> for i8 {
    fn from(bucket: IntensityBucket) -> Self {
        bucket.index()
    }
}

impl TryFrom<i8> for IntensityBucket {
    type Error = String;

    fn try_from(value: i8) -> std::result::Result<Self, Self::Error> {
        match value {
            -1 => Ok(IntensityBucket::NoActivity),
            0..=10 => Ok(IntensityBucket::Level(value as u8)),
            other => Err(format!("intensity bucket {other} outside [-1, 10]")),
        }
    }
}

/// Legend entries shown next to the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub label: &'static str,
    pub bucket: IntensityBucket,
}

/// No activity, moderate (normalised 0.5) and high (normalised 1.0).
pub fn intensity_legend() -> [LegendEntry; 3] {
    [
        LegendEntry {
            label: "No Activity",
            bucket: IntensityBucket::NoActivity,
        },
        LegendEntry {
            label: "Moderate",
            bucket: IntensityBucket::from_normalized(0.5),
        },
        LegendEntry {
            label: "High Activity",
            bucket: IntensityBucket::from_normalized(1.0),
        },
    ]
}

/// Global min/max of the resolved sample set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationScale {
    pub min_count: u64,
    pub max_count: u64,
}

impl NormalizationScale {
    fn from_counts(counts: impl Iterator<Item = u64>) -> Option<Self> {
        counts.fold(None, |scale, count| {
            Some(match scale {
                None => Self {
                    min_count: count,
                    max_count: count,
                },
                Some(Self {
                    min_count,
                    max_count,
                }) => Self {
                    min_count: min_count.min(count),
                    max_count: max_count.max(count),
                },
            })
        })
    }

    /// Rescale a positive count into `[0, 1]`. A flat scale yields `1.0`.
    pub fn normalize(&self, count: u64) -> f64 {
        if self.max_count == self.min_count {
            return 1.0;
        }
        let span = (self.max_count - self.min_count) as f64;
        (count.saturating_sub(self.min_count) as f64 / span).clamp(0.0, 1.0)
    }

    /// Level for a positive count, computed in integer space so that exact
    /// tenths (e.g. 5 of 10) never fall one level short.
    pub fn level(&self, count: u64) -> IntensityBucket {
        if self.max_count == self.min_count {
            return IntensityBucket::Level(MAX_LEVEL);
        }
        let offset = u128::from(count.saturating_sub(self.min_count));
        let span = u128::from(self.max_count - self.min_count);
        let level = (offset * u128::from(MAX_LEVEL) / span).min(u128::from(MAX_LEVEL));
        IntensityBucket::Level(level as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// `None` when no sample exists for the date.
    pub raw_count: Option<u64>,
    /// Only set for positive counts.
    pub normalized: Option<f64>,
    pub intensity: IntensityBucket,
}

impl fmt::Display for CalendarCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Date: {} - Total Count: {}",
            self.date.format("%Y-%m-%d"),
            self.raw_count.unwrap_or_default()
        )
    }
}

/// Inclusive day range at calendar-day granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CalendarRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(CoreError::domain(format!(
                "calendar end {end} precedes start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// January 1st through December 31st of `year`.
    pub fn calendar_year(year: i32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| CoreError::domain(format!("year {year} out of range")))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| CoreError::domain(format!("year {year} out of range")))?;
        Ok(Self { start, end })
    }

    /// Number of days covered, both ends included.
    pub fn day_count(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn build(&self, samples: &[ActivitySample]) -> Result<CalendarGrid> {
        build_grid(self.start, self.end, samples)
    }
}

impl Default for CalendarRange {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
        }
    }
}

/// Gap-free sequence of cells spanning a [`CalendarRange`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarGrid {
    pub range: CalendarRange,
    pub scale: Option<NormalizationScale>,
    pub cells: Vec<CalendarCell>,
}

impl CalendarGrid {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CalendarCell> {
        self.cells.iter()
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&CalendarCell> {
        if !self.range.contains(date) {
            return None;
        }
        self.cells
            .get((date - self.range.start).num_days() as usize)
    }

    /// Bucket indices in date order, `-1` for days without activity.
    pub fn intensities(&self) -> Vec<i8> {
        self.cells.iter().map(|cell| cell.intensity.index()).collect()
    }
}

impl<'a> IntoIterator for &'a CalendarGrid {
    type Item = &'a CalendarCell;
    type IntoIter = std::slice::Iter<'a, CalendarCell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

/// Build the calendar grid for `start..=end`.
pub fn build_grid(
    start: NaiveDate,
    end: NaiveDate,
    samples: &[ActivitySample],
) -> Result<CalendarGrid> {
    let range = CalendarRange::new(start, end)?;
    let resolved = resolve_samples(samples)?;
    let scale = NormalizationScale::from_counts(
        samples
            .iter()
            .filter_map(|sample| u64::try_from(sample.count).ok()),
    );

    let cells: Vec<CalendarCell> = range
        .start
        .iter_days()
        .take(range.day_count())
        .map(|date| match (resolved.get(&date).copied(), scale) {
            (Some(count), Some(scale)) if count > 0 => CalendarCell {
                date,
                raw_count: Some(count),
                normalized: Some(scale.normalize(count)),
                intensity: scale.level(count),
            },
            (raw_count, _) => CalendarCell {
                date,
                raw_count,
                normalized: None,
                intensity: IntensityBucket::NoActivity,
            },
        })
        .collect();

    debug!(
        start = %range.start,
        end = %range.end,
        cells = cells.len(),
        samples = resolved.len(),
        min = scale.map(|s| s.min_count),
        max = scale.map(|s| s.max_count),
        "built calendar grid"
    );
    Ok(CalendarGrid {
        range,
        scale,
        cells,
    })
}

fn resolve_samples(samples: &[ActivitySample]) -> Result<BTreeMap<NaiveDate, u64>> {
    let mut resolved = BTreeMap::new();
    for sample in samples {
        let count = u64::try_from(sample.count).map_err(|_| {
            CoreError::domain(format!(
                "negative activity count {} on {}",
                sample.count, sample.date
            ))
        })?;
        if let Some(previous) = resolved.insert(sample.date, count) {
            debug!(date = %sample.date, previous, count, "duplicate sample replaced");
        }
    }
    Ok(resolved)
}

/// Parse a calendar day from `YYYY-MM-DD` or an RFC 3339 timestamp.
///
/// Timestamps are normalised to UTC before the time of day is dropped.
pub fn parse_day(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|timestamp| timestamp.with_timezone(&Utc).date_naive())
        .map_err(|err| CoreError::domain(format!("invalid calendar date '{trimmed}': {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        parse_day(s).unwrap()
    }

    fn sample(date: &str, count: i64) -> ActivitySample {
        ActivitySample::new(day(date), count)
    }

    fn base_samples() -> Vec<ActivitySample> {
        vec![
            sample("2024-01-01", 0),
            sample("2024-01-02", 5),
            sample("2024-01-03", 10),
        ]
    }

    #[test]
    fn three_day_example_matches_expected_buckets() {
        let grid = build_grid(day("2024-01-01"), day("2024-01-03"), &base_samples()).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.intensities(), vec![-1, 5, 10]);
        assert_eq!(grid.cells[1].normalized, Some(0.5));
        assert_eq!(grid.cells[0].raw_count, Some(0));
        assert_eq!(grid.cells[0].normalized, None);
    }

    #[test]
    fn out_of_range_samples_widen_the_scale_but_not_the_grid() {
        let mut samples = base_samples();
        samples.push(sample("2024-06-01", 100));
        let grid = build_grid(day("2024-01-01"), day("2024-01-03"), &samples).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(
            grid.scale,
            Some(NormalizationScale {
                min_count: 0,
                max_count: 100
            })
        );
        assert_eq!(grid.intensities(), vec![-1, 0, 1]);
    }

    #[test]
    fn missing_dates_use_the_sentinel() {
        let samples = vec![sample("2024-03-05", 7)];
        let grid = build_grid(day("2024-03-01"), day("2024-03-10"), &samples).unwrap();
        assert_eq!(grid.len(), 10);
        for cell in &grid {
            if cell.date == day("2024-03-05") {
                assert_eq!(cell.intensity, IntensityBucket::Level(10));
            } else {
                assert_eq!(cell.intensity, IntensityBucket::NoActivity);
                assert_eq!(cell.raw_count, None);
            }
        }
    }

    #[test]
    fn equal_positive_counts_saturate() {
        let samples = vec![sample("2024-02-01", 4), sample("2024-02-02", 4)];
        let grid = build_grid(day("2024-02-01"), day("2024-02-03"), &samples).unwrap();
        assert_eq!(grid.intensities(), vec![10, 10, -1]);
        assert_eq!(grid.cells[0].normalized, Some(1.0));
    }

    #[test]
    fn empty_samples_produce_an_idle_calendar() {
        let grid = build_grid(day("2024-01-01"), day("2024-01-31"), &[]).unwrap();
        assert_eq!(grid.len(), 31);
        assert!(grid.scale.is_none());
        assert!(grid.iter().all(|cell| !cell.intensity.is_active()));
    }

    #[test]
    fn duplicate_dates_keep_the_last_sample() {
        let samples = vec![
            sample("2024-01-01", 10),
            sample("2024-01-02", 0),
            sample("2024-01-02", 10),
            sample("2024-01-03", 5),
            sample("2024-01-03", 0),
        ];
        let grid = build_grid(day("2024-01-01"), day("2024-01-03"), &samples).unwrap();
        assert_eq!(grid.cells[1].raw_count, Some(10));
        assert_eq!(grid.cells[2].raw_count, Some(0));
        assert_eq!(
            grid.scale,
            Some(NormalizationScale {
                min_count: 0,
                max_count: 10
            })
        );
        assert_eq!(grid.intensities(), vec![10, 10, -1]);
    }

    #[test]
    fn replaced_samples_still_set_the_scale() {
        let samples = vec![
            sample("2024-01-01", 2),
            sample("2024-01-01", 6),
            sample("2024-01-02", 10),
        ];
        let grid = build_grid(day("2024-01-01"), day("2024-01-02"), &samples).unwrap();
        assert_eq!(grid.cells[0].raw_count, Some(6));
        assert_eq!(
            grid.scale,
            Some(NormalizationScale {
                min_count: 2,
                max_count: 10
            })
        );
        assert_eq!(grid.intensities(), vec![5, 10]);
    }

    #[test]
    fn negative_counts_are_rejected() {
        let samples = vec![sample("2024-01-01", 3), sample("2024-01-02", -1)];
        let err = build_grid(day("2024-01-01"), day("2024-01-02"), &samples).unwrap_err();
        assert!(matches!(err, CoreError::Domain(_)));
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = build_grid(day("2024-01-02"), day("2024-01-01"), &[]).unwrap_err();
        assert!(matches!(err, CoreError::Domain(_)));
    }

    #[test]
    fn single_day_range_has_one_cell() {
        let grid = build_grid(day("2024-02-29"), day("2024-02-29"), &[]).unwrap();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.cells[0].date, day("2024-02-29"));
    }

    #[test]
    fn leap_year_calendar_has_366_days() {
        let range = CalendarRange::calendar_year(2024).unwrap();
        assert_eq!(range.day_count(), 366);
        assert_eq!(range, CalendarRange::default());
        let grid = range.build(&[]).unwrap();
        assert_eq!(grid.cells.last().unwrap().date, day("2024-12-31"));
    }

    #[test]
    fn timestamps_are_normalised_to_utc_days() {
        assert_eq!(day("2024-01-01T23:30:00-02:00"), day("2024-01-02"));
        assert_eq!(day("2024-01-01T10:00:00Z"), day("2024-01-01"));
        assert!(parse_day("01/02/2024").is_err());
    }

    #[test]
    fn cell_lookup_by_date() {
        let grid = build_grid(day("2024-01-01"), day("2024-01-03"), &base_samples()).unwrap();
        assert_eq!(grid.cell(day("2024-01-03")).unwrap().raw_count, Some(10));
        assert!(grid.cell(day("2024-01-04")).is_none());
    }

    #[test]
    fn bucket_from_normalized_clamps() {
        assert_eq!(IntensityBucket::from_normalized(0.0), IntensityBucket::Level(0));
        assert_eq!(IntensityBucket::from_normalized(0.99), IntensityBucket::Level(9));
        assert_eq!(IntensityBucket::from_normalized(1.0), IntensityBucket::Level(10));
        assert_eq!(IntensityBucket::from_normalized(1.7), IntensityBucket::Level(10));
    }

    #[test]
    fn bucket_serializes_as_integer() {
        let json = serde_json::to_string(&IntensityBucket::NoActivity).unwrap();
        assert_eq!(json, "-1");
        let level: IntensityBucket = serde_json::from_str("7").unwrap();
        assert_eq!(level, IntensityBucket::Level(7));
        assert!(serde_json::from_str::<IntensityBucket>("11").is_err());
    }

    #[test]
    fn legend_uses_moderate_and_high_levels() {
        let legend = intensity_legend();
        assert_eq!(legend[0].bucket.index(), -1);
        assert_eq!(legend[1].bucket.index(), 5);
        assert_eq!(legend[2].bucket.index(), 10);
    }

    #[test]
    fn cell_tooltip_reports_count() {
        let grid = build_grid(day("2024-01-01"), day("2024-01-02"), &base_samples()).unwrap();
        assert_eq!(grid.cells[1].to_string(), "Date: 2024-01-02 - Total Count: 5");
        let empty = build_grid(day("2024-05-01"), day("2024-05-01"), &[]).unwrap();
        assert_eq!(empty.cells[0].to_string(), "Date: 2024-05-01 - Total Count: 0");
    }
}
