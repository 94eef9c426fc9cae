use thiserror::Error;

use super::config::ConfigError;
use super::event_list::Transition;
use crate::core::models::ids::{ParticleId, SiteId};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid simulation settings: {source}")]
    Settings {
        #[from]
        source: ConfigError,
    },

    #[error(
        "Invariant violated (transition: {transition:?}, particle: {particle:?}, sites: {sites:?}): {message}"
    )]
    Invariant {
        transition: Option<Transition>,
        particle: Option<ParticleId>,
        sites: Vec<SiteId>,
        message: String,
    },

    #[error("Invalid rate {rate} for {transition:?}")]
    InvalidRate { rate: f64, transition: Transition },

    #[error("Recording output failed: {source}")]
    Output {
        #[from]
        source: std::io::Error,
    },
}

impl EngineError {
    /// Builds an [`EngineError::Invariant`] and logs it with its context.
    pub(crate) fn invariant(
        transition: Option<Transition>,
        particle: Option<ParticleId>,
        sites: Vec<SiteId>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        tracing::error!(
            ?transition,
            ?particle,
            ?sites,
            "Bookkeeping invariant violated: {}",
            message
        );
        EngineError::Invariant {
            transition,
            particle,
            sites,
            message,
        }
    }
}
