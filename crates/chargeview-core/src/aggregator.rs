//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Time-scale series selection over generated simulation datasets."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use tracing::{debug, info, warn};

use crate::errors::{CoreError, Result};
use crate::model::{ChartSeriesPoint, SimulationDataset, SimulationParameters, TimeScale};

const HOURS_PER_DAY: usize = 24;
const MONTHS_PER_YEAR: usize = 12;

/// Upstream producer of simulation datasets.
pub trait SimulationGenerator {
    fn generate(&self, params: &SimulationParameters) -> anyhow::Result<SimulationDataset>;
}

impl<G: SimulationGenerator + ?Sized> SimulationGenerator for &G {
    fn generate(&self, params: &SimulationParameters) -> anyhow::Result<SimulationDataset> {
        (**self).generate(params)
    }
}

impl<G: SimulationGenerator + ?Sized> SimulationGenerator for Box<G> {
    fn generate(&self, params: &SimulationParameters) -> anyhow::Result<SimulationDataset> {
        (**self).generate(params)
    }
}

/// Obtain a fresh dataset for `params`.
///
/// Generator failures are surfaced as [`CoreError::GeneratorFailure`].
pub fn regenerate<G>(generator: &G, params: &SimulationParameters) -> Result<SimulationDataset>
where
    G: SimulationGenerator + ?Sized,
{
    info!(
        points = params.point_count,
        multiplier = params.arrival_multiplier,
        power_kw = params.charging_power_kw,
        days = params.days_to_simulate,
        "regenerating simulation dataset"
    );
    generator.generate(params).map_err(|err| {
        warn!(error = %err, "simulation generator failed");
        CoreError::GeneratorFailure(err)
    })
}

/// Same as [`regenerate`] with parameters shaped for `scale`.
pub fn regenerate_for_scale<G>(
    generator: &G,
    params: &SimulationParameters,
    scale: TimeScale,
) -> Result<SimulationDataset>
where
    G: SimulationGenerator + ?Sized,
{
    if params.days_to_simulate != scale.days_to_simulate() {
        debug!(
            %scale,
            expected = scale.days_to_simulate(),
            actual = params.days_to_simulate,
            "days to simulate does not match the time scale"
        );
    }
    regenerate(generator, params)
}

/// Project the series matching `scale` into chart points.
///
/// Labels are the raw bucket index; formatting them is left to the caller.
pub fn select_series(dataset: &SimulationDataset, scale: TimeScale) -> Result<Vec<ChartSeriesPoint>> {
    let points: Vec<ChartSeriesPoint> = match scale {
        TimeScale::Day => {
            let hourly = dataset
                .hourly
                .as_ref()
                .ok_or_else(|| CoreError::malformed("hourly series missing"))?;
            if hourly.len() != HOURS_PER_DAY {
                return Err(CoreError::malformed(format!(
                    "hourly series has {} buckets, expected {HOURS_PER_DAY}",
                    hourly.len()
                )));
            }
            hourly
                .iter()
                .map(|bucket| point(bucket.hour, bucket.events, bucket.total_power_kw))
                .collect()
        }
        TimeScale::Month => dataset
            .daily
            .as_ref()
            .ok_or_else(|| CoreError::malformed("daily series missing"))?
            .iter()
            .map(|bucket| point(bucket.day, bucket.events, bucket.total_power_kw))
            .collect(),
        TimeScale::Year => {
            let monthly = dataset
                .monthly
                .as_ref()
                .ok_or_else(|| CoreError::malformed("monthly series missing"))?;
            if monthly.len() != MONTHS_PER_YEAR {
                return Err(CoreError::malformed(format!(
                    "monthly series has {} buckets, expected {MONTHS_PER_YEAR}",
                    monthly.len()
                )));
            }
            monthly
                .iter()
                .map(|bucket| point(bucket.month, bucket.events, bucket.total_power_kw))
                .collect()
        }
    };
    debug!(%scale, points = points.len(), "selected chart series");
    Ok(points)
}

fn point(index: u32, events: u64, power_kw: f64) -> ChartSeriesPoint {
    ChartSeriesPoint {
        label: index.to_string(),
        event_count: events,
        energy_kwh: power_kw,
    }
}
