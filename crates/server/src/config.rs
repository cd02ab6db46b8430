//! Service configuration loaded from the environment.
//!
//! Every field can be set through a `SHELF_RECS_`-prefixed variable, e.g.
//! `SHELF_RECS_DATA_DIR=/srv/books`. A `.env` file in the working directory
//! is read first.

use crate::resolver::{DEFAULT_SYNTHETIC_USER_ID, ResolverSettings};
use anyhow::{Context, Result, ensure};
use data_loader::UserId;
use pipeline::{DEFAULT_MAX_RESULTS, DEFAULT_RATING_WINDOW};
use serde::Deserialize;
use std::path::PathBuf;

/// Prefix shared by all configuration variables
pub const ENV_PREFIX: &str = "SHELF_RECS_";

/// Service configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceConfig {
    /// Directory holding `books.csv` and `ratings.csv`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Precomputed predictor model (JSON)
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Maximum number of recommendations per lookup
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Half-width of the average-rating fallback window
    #[serde(default = "default_rating_window")]
    pub rating_window: f64,

    /// User id the caller's rating is recorded under
    #[serde(default = "default_synthetic_user_id")]
    pub synthetic_user_id: UserId,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_model_path() -> PathBuf {
    PathBuf::from("data/svd_model.json")
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

fn default_rating_window() -> f64 {
    DEFAULT_RATING_WINDOW
}

fn default_synthetic_user_id() -> UserId {
    DEFAULT_SYNTHETIC_USER_ID
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            model_path: default_model_path(),
            max_results: default_max_results(),
            rating_window: default_rating_window(),
            synthetic_user_id: default_synthetic_user_id(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from `.env` and the process environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config: ServiceConfig = envy::prefixed(ENV_PREFIX)
            .from_env()
            .context("Failed to load config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from explicit `(name, value)` pairs
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: ServiceConfig = envy::prefixed(ENV_PREFIX)
            .from_iter(vars)
            .context("Failed to load config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the resolver cannot work with
    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_results > 0, "max_results must be at least 1");
        ensure!(
            self.rating_window.is_finite() && self.rating_window >= 0.0,
            "rating_window must be a non-negative number, got {}",
            self.rating_window
        );
        Ok(())
    }

    /// Settings handed to the resolver
    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            max_results: self.max_results,
            rating_window: self.rating_window,
            synthetic_user_id: self.synthetic_user_id,
        }
    }
}
