//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Error kinds raised by the aggregation and calendar engine."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The dataset handed to the aggregator lacks a series the time scale needs.
    #[error("malformed dataset: {0}")]
    MalformedDataset(String),
    /// An input violates a stated precondition.
    #[error("domain error: {0}")]
    Domain(String),
    /// Opaque failure raised by the simulation generator.
    #[error("simulation generator failed: {0:#}")]
    GeneratorFailure(#[source] anyhow::Error),
}

impl CoreError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDataset(message.into())
    }

    pub(crate) fn domain(message: impl Into<String>) -> Self {
        Self::Domain(message.into())
    }
}
