//! ---
//! ems_section: "15-testing-qa-runbook"
//! ems_subsection: "integration"
//! ems_type: "source"
//! ems_scope: "test"
//! ems_description: "Property tests for calendar grid materialisation and bucketing."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use chargeview_core::{build_grid, ActivitySample, CoreError, IntensityBucket};
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
}

fn samples_strategy() -> impl Strategy<Value = Vec<(i64, i64)>> {
    // (day offset relative to range start, count); offsets reach outside the range
    prop::collection::vec((-60i64..800, 0i64..500), 0..120)
}

fn to_samples(raw: &[(i64, i64)]) -> Vec<ActivitySample> {
    raw.iter()
        .map(|(offset, count)| ActivitySample::new(epoch() + Duration::days(*offset), *count))
        .collect()
}

proptest! {
    #[test]
    fn grid_is_complete_and_ordered(len in 0i64..731, raw in samples_strategy()) {
        let start = epoch();
        let end = start + Duration::days(len);
        let grid = build_grid(start, end, &to_samples(&raw)).unwrap();

        prop_assert_eq!(grid.len() as i64, len + 1);
        for (i, cell) in grid.iter().enumerate() {
            prop_assert_eq!(cell.date, start + Duration::days(i as i64));
        }
        for pair in grid.cells.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn buckets_are_bounded_and_sentinel_is_exact(len in 0i64..400, raw in samples_strategy()) {
        let start = epoch();
        let end = start + Duration::days(len);
        let samples = to_samples(&raw);
        let grid = build_grid(start, end, &samples).unwrap();

        for cell in &grid {
            // last sample for the date wins
            let expected = samples.iter().rev().find(|s| s.date == cell.date).map(|s| s.count);
            match expected {
                Some(count) if count > 0 => {
                    let index = cell.intensity.index();
                    prop_assert!((0..=10).contains(&index));
                }
                _ => prop_assert_eq!(cell.intensity, IntensityBucket::NoActivity),
            }
        }
    }

    #[test]
    fn equal_positive_counts_hit_the_top_level(count in 1i64..1000, days in prop::collection::btree_set(0i64..90, 1..30)) {
        let samples: Vec<ActivitySample> = days
            .iter()
            .map(|offset| ActivitySample::new(epoch() + Duration::days(*offset), count))
            .collect();
        let grid = build_grid(epoch(), epoch() + Duration::days(89), &samples).unwrap();
        for cell in &grid {
            if cell.raw_count.is_some() {
                prop_assert_eq!(cell.intensity, IntensityBucket::Level(10));
            }
        }
    }

    #[test]
    fn identical_inputs_give_identical_grids(len in 0i64..200, raw in samples_strategy()) {
        let end = epoch() + Duration::days(len);
        let samples = to_samples(&raw);
        let first = build_grid(epoch(), end, &samples).unwrap();
        let second = build_grid(epoch(), end, &samples).unwrap();
        prop_assert_eq!(first, second);
    }
}

#[test]
fn wider_scale_never_raises_in_range_buckets() {
    let day = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
    let base = vec![
        ActivitySample::new(day(1), 0),
        ActivitySample::new(day(2), 5),
        ActivitySample::new(day(3), 10),
    ];
    let narrow = build_grid(day(1), day(3), &base).unwrap();

    let mut widened = base.clone();
    widened.push(ActivitySample::new(
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        100,
    ));
    let wide = build_grid(day(1), day(3), &widened).unwrap();

    assert_eq!(narrow.intensities(), vec![-1, 5, 10]);
    assert_eq!(wide.intensities(), vec![-1, 0, 1]);
    assert_eq!(wide.len(), narrow.len());
}

#[test]
fn negative_counts_outside_the_range_are_still_rejected() {
    let samples = vec![ActivitySample::new(
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        -4,
    )];
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    assert!(matches!(
        build_grid(start, start, &samples),
        Err(CoreError::Domain(_))
    ));
}
