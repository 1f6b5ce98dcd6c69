//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Seeded charging-point arrival simulator."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use anyhow::{Context, Result};
use chargeview_core::{
    ActivitySample, DailyBucket, HourlyBucket, MonthlyBucket, SimulationDataset,
    SimulationGenerator, SimulationParameters,
};
use chrono::{Datelike, Days, NaiveDate};
use rand::prelude::*;
use rand_distr::{Normal, Poisson};
use tracing::debug;

/// Per-point probability of a charging arrival in each hour of the day.
/// Morning commute and early evening peaks, quiet nights.
pub const DIURNAL_PROFILE: [f64; 24] = [
    0.010, 0.005, 0.005, 0.005, 0.010, 0.030, 0.080, 0.150, 0.200, 0.180, 0.120, 0.100, 0.110,
    0.100, 0.090, 0.100, 0.140, 0.200, 0.220, 0.180, 0.120, 0.070, 0.040, 0.020,
];

const FILL_MEAN: f64 = 0.85;
const FILL_SIGMA: f64 = 0.1;
const FILL_MIN: f64 = 0.3;

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

/// Simulates arrivals at a charging-point network hour by hour.
///
/// Arrivals in an hour follow a Poisson law with rate
/// `points * multiplier * DIURNAL_PROFILE[hour]`. Served sessions are capped
/// by the number of points and each draws at a fill factor of the rated power
/// for the whole hour. The same seed and parameters give the same dataset.
#[derive(Debug, Clone)]
pub struct ChargingSimulator {
    seed: u64,
    start_date: NaiveDate,
}

impl ChargingSimulator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start_date: default_start_date(),
        }
    }

    /// First simulated calendar day; heatmap samples start here.
    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = start_date;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }
}

impl Default for ChargingSimulator {
    fn default() -> Self {
        Self::new(0x5EED_F00D)
    }
}

impl SimulationGenerator for ChargingSimulator {
    fn generate(&self, params: &SimulationParameters) -> Result<SimulationDataset> {
        params.validate()?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let fill = Normal::new(FILL_MEAN, FILL_SIGMA).context("invalid fill factor distribution")?;
        let points = u64::from(params.point_count);
        let arrivals = DIURNAL_PROFILE
            .iter()
            .map(|share| {
                let rate = f64::from(params.point_count) * params.arrival_multiplier * share;
                Poisson::new(rate).with_context(|| format!("invalid arrival rate {rate}"))
            })
            .collect::<Result<Vec<Poisson<f64>>>>()?;

        let mut hourly = [(0u64, 0.0f64); 24];
        let mut monthly = [(0u64, 0.0f64); 12];
        let mut daily = Vec::with_capacity(params.days_to_simulate as usize);
        let mut heatmap = Vec::with_capacity(params.days_to_simulate as usize);
        let mut total_events = 0u64;
        let mut total_energy = 0.0f64;
        let mut peak_power = 0.0f64;

        for day in 1..=params.days_to_simulate {
            let date = self
                .start_date
                .checked_add_days(Days::new(u64::from(day - 1)))
                .context("simulation calendar overflows the supported date range")?;
            let mut day_events = 0u64;
            let mut day_power = 0.0f64;

            for (hour, distribution) in arrivals.iter().enumerate() {
                let served = (distribution.sample(&mut rng) as u64).min(points);
                let fill_factor = fill.sample(&mut rng).clamp(FILL_MIN, 1.0);
                let load_kw = served as f64 * params.charging_power_kw * fill_factor;

                hourly[hour].0 += served;
                hourly[hour].1 += load_kw;
                day_events += served;
                day_power += load_kw;
                peak_power = peak_power.max(load_kw);
            }

            let month = date.month0() as usize;
            monthly[month].0 += day_events;
            monthly[month].1 += day_power;
            daily.push(DailyBucket {
                day,
                events: day_events,
                total_power_kw: day_power,
            });
            heatmap.push(ActivitySample::new(
                date,
                i64::try_from(day_events).context("daily event count overflow")?,
            ));
            total_events += day_events;
            // one hour buckets: kW summed over hours is kWh
            total_energy += day_power;
        }

        debug!(
            seed = self.seed,
            days = params.days_to_simulate,
            total_events,
            peak_power,
            "simulation finished"
        );

        Ok(SimulationDataset {
            hourly: Some(
                hourly
                    .iter()
                    .enumerate()
                    .map(|(hour, (events, power))| HourlyBucket {
                        hour: hour as u32,
                        events: *events,
                        total_power_kw: *power,
                    })
                    .collect(),
            ),
            daily: Some(daily),
            monthly: Some(
                monthly
                    .iter()
                    .enumerate()
                    .map(|(month, (events, power))| MonthlyBucket {
                        month: month as u32 + 1,
                        events: *events,
                        total_power_kw: *power,
                    })
                    .collect(),
            ),
            total_energy_charged: total_energy,
            total_events,
            peak_power_load: peak_power,
            average_events_per_day: total_events as f64 / f64::from(params.days_to_simulate),
            heatmap,
        })
    }
}
