//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Time-scale aggregation and calendar intensity engine exports."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Aggregation and calendar heatmap engine for charging-point metrics.
//!
//! The [`aggregator`] picks the hourly, daily or monthly series of a
//! [`SimulationDataset`] for the active [`TimeScale`]; the [`calendar`]
//! module turns sparse per-day activity into a dense grid of intensity
//! buckets. Both are pure functions of their inputs. [`dashboard`] composes
//! them around a [`SimulationGenerator`].
pub mod aggregator;
pub mod calendar;
pub mod dashboard;
pub mod errors;
pub mod model;

pub use aggregator::{regenerate, regenerate_for_scale, select_series, SimulationGenerator};
pub use calendar::{
    build_grid, intensity_legend, parse_day, CalendarCell, CalendarGrid, CalendarRange,
    IntensityBucket, LegendEntry, NormalizationScale,
};
pub use dashboard::{
    Completion, Dashboard, DashboardSummary, FormValues, RegenerationTicket, ScaleSelection,
};
pub use errors::{CoreError, Result};
pub use model::{
    ActivitySample, ChartSeriesPoint, DailyBucket, HourlyBucket, MonthlyBucket,
    SimulationDataset, SimulationParameters, TimeScale,
};
