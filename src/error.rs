// error.rs
// Crate error type and Result alias

use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors raised while setting up or driving a simulation.
///
/// Only construction and the headless driver can fail. Geometric anomalies
/// during a frame are handled in place and logged instead.
#[derive(Debug, Error)]
pub enum SimError {
    /// Rejected configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The interaction worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed TOML configuration file.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The simulation thread panicked or could not be joined.
    #[error("simulation thread failed: {0}")]
    SimulationThread(String),
}

impl SimError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SimError::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_the_problem() {
        let e = SimError::config("num_species must be > 0");
        let msg = format!("{e}");
        assert!(msg.contains("invalid configuration"));
        assert!(msg.contains("num_species"));
    }
}
