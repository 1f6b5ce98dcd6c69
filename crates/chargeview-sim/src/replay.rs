//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Replay of recorded datasets and activity samples."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chargeview_core::{
    parse_day, ActivitySample, SimulationDataset, SimulationGenerator, SimulationParameters,
};
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::{debug, warn};

/// Raw sample row; dates may be plain days or RFC 3339 timestamps.
#[derive(Debug, Deserialize)]
struct SampleRecord {
    date: String,
    count: i64,
}

impl SampleRecord {
    fn into_sample(self) -> Result<ActivitySample> {
        let date = parse_day(&self.date)?;
        Ok(ActivitySample::new(date, self.count))
    }
}

/// Serves a dataset recorded to JSON regardless of the requested parameters.
///
/// The file is read once; series it lacks stay missing so the aggregator can
/// report the dataset as malformed.
#[derive(Debug, Clone)]
pub struct RecordedDataset {
    source: PathBuf,
    dataset: SimulationDataset,
}

impl RecordedDataset {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(path),
            _ => anyhow::bail!("unsupported dataset format: {}", path.display()),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn dataset(&self) -> &SimulationDataset {
        &self.dataset
    }

    fn from_json(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read dataset file {}", path.display()))?;
        let dataset: SimulationDataset = serde_json::from_str(&contents)
            .with_context(|| format!("invalid dataset JSON {}", path.display()))?;
        debug!(path = %path.display(), samples = dataset.heatmap.len(), "loaded recorded dataset");
        Ok(Self {
            source: path.to_path_buf(),
            dataset,
        })
    }
}

impl SimulationGenerator for RecordedDataset {
    fn generate(&self, params: &SimulationParameters) -> Result<SimulationDataset> {
        if let Some(daily) = &self.dataset.daily {
            if daily.len() != params.days_to_simulate as usize {
                warn!(
                    path = %self.source.display(),
                    recorded_days = daily.len(),
                    requested_days = params.days_to_simulate,
                    "recorded dataset covers a different number of days"
                );
            }
        }
        Ok(self.dataset.clone())
    }
}

/// Load activity samples from a CSV (`date,count` header) or JSON array file.
pub fn load_samples(path: &Path) -> Result<Vec<ActivitySample>> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => load_samples_json(path),
        Some("csv") => load_samples_csv(path),
        _ => anyhow::bail!("unsupported sample format: {}", path.display()),
    }
}

fn load_samples_json(path: &Path) -> Result<Vec<ActivitySample>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("unable to read sample file {}", path.display()))?;
    let records: Vec<SampleRecord> = serde_json::from_str(&contents)
        .with_context(|| format!("invalid sample JSON {}", path.display()))?;
    records
        .into_iter()
        .map(|record| {
            record
                .into_sample()
                .with_context(|| format!("invalid sample in {}", path.display()))
        })
        .collect()
}

fn load_samples_csv(path: &Path) -> Result<Vec<ActivitySample>> {
    let file = fs::File::open(path)
        .with_context(|| format!("unable to open sample csv {}", path.display()))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);
    let mut samples = Vec::new();
    for (line, row) in reader.deserialize::<SampleRecord>().enumerate() {
        let record = row.with_context(|| format!("invalid sample row in {}", path.display()))?;
        samples.push(
            record
                .into_sample()
                .with_context(|| format!("invalid date on row {} of {}", line + 1, path.display()))?,
        );
    }
    Ok(samples)
}
