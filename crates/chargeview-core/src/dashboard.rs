//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Composing layer owning the active dataset and time scale."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregator::{regenerate_for_scale, select_series, SimulationGenerator};
use crate::calendar::{CalendarGrid, CalendarRange};
use crate::errors::{CoreError, Result};
use crate::model::{ChartSeriesPoint, SimulationDataset, SimulationParameters, TimeScale};

/// Dataset applied by a time-scale change and the series drawn from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleSelection<'a> {
    pub dataset: &'a SimulationDataset,
    pub series: Vec<ChartSeriesPoint>,
}

/// Operator-entered values; the time scale supplies the day count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormValues {
    pub point_count: u32,
    pub arrival_multiplier: f64,
    pub charging_power_kw: f64,
}

impl FormValues {
    pub fn parameters_for(&self, scale: TimeScale) -> Result<SimulationParameters> {
        let params = SimulationParameters {
            point_count: self.point_count,
            arrival_multiplier: self.arrival_multiplier,
            charging_power_kw: self.charging_power_kw,
            days_to_simulate: scale.days_to_simulate(),
        };
        params.validate()?;
        Ok(params)
    }
}

/// Scalar figures shown in the summary cards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_energy_kwh: f64,
    pub total_events: u64,
    pub peak_power_kw: f64,
    pub average_events_per_day: f64,
}

impl From<&SimulationDataset> for DashboardSummary {
    fn from(dataset: &SimulationDataset) -> Self {
        Self {
            total_energy_kwh: dataset.total_energy_charged,
            total_events: dataset.total_events,
            peak_power_kw: dataset.peak_power_load,
            average_events_per_day: dataset.average_events_per_day,
        }
    }
}

/// Handle for an in-flight regeneration.
#[derive(Debug, Clone, PartialEq)]
pub struct RegenerationTicket {
    pub sequence: u64,
    pub scale: TimeScale,
    pub params: SimulationParameters,
}

/// Result of handing a finished regeneration back to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A newer request was issued after this one; the dataset was dropped.
    Stale,
}

/// Owns the current dataset and replaces it wholesale on every time-scale
/// change. Chart series, calendar and summary are derived on demand.
#[derive(Debug)]
pub struct Dashboard<G> {
    generator: G,
    form: FormValues,
    calendar: CalendarRange,
    scale: TimeScale,
    dataset: Option<SimulationDataset>,
    issued: u64,
}

impl<G: SimulationGenerator> Dashboard<G> {
    pub fn new(generator: G, form: FormValues, calendar: CalendarRange) -> Self {
        Self {
            generator,
            form,
            calendar,
            scale: TimeScale::default(),
            dataset: None,
            issued: 0,
        }
    }

    /// Seed the dashboard with a dataset produced elsewhere.
    pub fn with_dataset(mut self, scale: TimeScale, dataset: SimulationDataset) -> Self {
        self.scale = scale;
        self.dataset = Some(dataset);
        self
    }

    pub fn time_scale(&self) -> TimeScale {
        self.scale
    }

    pub fn form(&self) -> &FormValues {
        &self.form
    }

    pub fn calendar_range(&self) -> CalendarRange {
        self.calendar
    }

    pub fn dataset(&self) -> Option<&SimulationDataset> {
        self.dataset.as_ref()
    }

    /// Change the form values. The current dataset stays until the next
    /// regeneration.
    pub fn set_form(&mut self, form: FormValues) {
        self.form = form;
    }

    pub fn set_calendar_range(&mut self, calendar: CalendarRange) {
        self.calendar = calendar;
    }

    /// Switch to `scale`, regenerate and return the new dataset with its
    /// chart series.
    ///
    /// On failure the previous dataset and scale remain in place.
    pub fn set_time_scale(&mut self, scale: TimeScale) -> Result<ScaleSelection<'_>> {
        let ticket = self.begin_regeneration(scale)?;
        let outcome = regenerate_for_scale(&self.generator, &ticket.params, ticket.scale);
        self.complete(ticket, outcome)?;
        let series = self.chart_series()?;
        let dataset = self
            .dataset
            .as_ref()
            .ok_or_else(|| CoreError::malformed("no dataset after regeneration"))?;
        Ok(ScaleSelection { dataset, series })
    }

    /// Regenerate for the active scale.
    pub fn refresh(&mut self) -> Result<ScaleSelection<'_>> {
        self.set_time_scale(self.scale)
    }

    /// Issue a ticket for a regeneration that will run outside the dashboard.
    /// Any ticket issued earlier becomes stale.
    pub fn begin_regeneration(&mut self, scale: TimeScale) -> Result<RegenerationTicket> {
        let params = self.form.parameters_for(scale)?;
        self.issued += 1;
        Ok(RegenerationTicket {
            sequence: self.issued,
            scale,
            params,
        })
    }

    /// Run the generator for a ticket without touching dashboard state.
    pub fn generate(&self, ticket: &RegenerationTicket) -> Result<SimulationDataset> {
        regenerate_for_scale(&self.generator, &ticket.params, ticket.scale)
    }

    /// Apply a finished regeneration if it is still the newest request.
    ///
    /// Errors from the newest request, including a dataset lacking the series
    /// for its scale, are returned and leave the current dataset in place.
    /// Stale results, failed or not, are discarded.
    pub fn complete(
        &mut self,
        ticket: RegenerationTicket,
        outcome: Result<SimulationDataset>,
    ) -> Result<Completion> {
        if ticket.sequence != self.issued {
            warn!(
                sequence = ticket.sequence,
                latest = self.issued,
                scale = %ticket.scale,
                "discarding superseded regeneration"
            );
            return Ok(Completion::Stale);
        }
        let dataset = outcome?;
        // never replace a good dataset with one the chart cannot use
        select_series(&dataset, ticket.scale)?;
        info!(scale = %ticket.scale, events = dataset.total_events, "dataset replaced");
        self.scale = ticket.scale;
        self.dataset = Some(dataset);
        Ok(Completion::Applied)
    }

    /// Chart points for the active scale, empty before the first dataset.
    pub fn chart_series(&self) -> Result<Vec<ChartSeriesPoint>> {
        match &self.dataset {
            Some(dataset) => select_series(dataset, self.scale),
            None => Ok(Vec::new()),
        }
    }

    /// Calendar over the configured range using the dataset's heatmap samples.
    pub fn calendar(&self) -> Result<CalendarGrid> {
        let samples = self
            .dataset
            .as_ref()
            .map(|dataset| dataset.heatmap.as_slice())
            .unwrap_or_default();
        self.calendar.build(samples)
    }

    pub fn summary(&self) -> Option<DashboardSummary> {
        self.dataset.as_ref().map(DashboardSummary::from)
    }
}
