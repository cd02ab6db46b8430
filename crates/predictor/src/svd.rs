//! Precomputed SVD-style matrix factorisation model.
//!
//! The estimate for a biased model is
//! `global_mean + b_u + b_i + q_i · p_u`, where each term is only present
//! when the model knows the user / item. Users the model has never seen get
//! their bias folded in from the request's ephemeral ratings:
//!
//! ```text
//! b_u = Σ (r - global_mean - b_i) / (reg_bu + n)
//! ```
//!
//! over the user's rated books that the model knows. An unbiased model can
//! only score pairs where both user and item are known; any other pair gets
//! the global mean. Estimates are clipped to `rating_scale`.

use crate::{ModelLoadError, PredictionError, RatingPredictor};
use data_loader::{BookId, EphemeralRatings, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

fn default_biased() -> bool {
    true
}

fn default_rating_scale() -> (f32, f32) {
    (0.0, 10.0)
}

fn default_reg_bu() -> f32 {
    0.02
}

/// Bias and latent factor vector of one user or item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentFactors {
    #[serde(default)]
    pub bias: f32,
    pub factors: Vec<f32>,
}

/// A trained factorisation model, read-only after load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvdModel {
    pub global_mean: f32,
    #[serde(default = "default_biased")]
    pub biased: bool,
    #[serde(default = "default_rating_scale")]
    pub rating_scale: (f32, f32),
    /// Regularisation used when folding in an unseen user's bias
    #[serde(default = "default_reg_bu")]
    pub reg_bu: f32,
    #[serde(default)]
    pub users: HashMap<UserId, LatentFactors>,
    #[serde(default)]
    pub items: HashMap<BookId, LatentFactors>,
}

impl SvdModel {
    /// Load and validate a model from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ModelLoadError> {
        info!("Loading predictor model from {:?}", path);
        let content = fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let model = Self::from_json_str(&content)?;
        info!(
            "Loaded model: {} users, {} items, {} factors",
            model.users.len(),
            model.items.len(),
            model.factor_count()
        );
        Ok(model)
    }

    /// Parse and validate a model from JSON text
    pub fn from_json_str(content: &str) -> Result<Self, ModelLoadError> {
        let model: SvdModel = serde_json::from_str(content)?;
        model.validate()?;
        Ok(model)
    }

    /// Number of latent factors, 0 for a bias-only model
    pub fn factor_count(&self) -> usize {
        self.users
            .values()
            .chain(self.items.values())
            .map(|f| f.factors.len())
            .next()
            .unwrap_or(0)
    }

    /// Check that the model is internally consistent.
    ///
    /// All factor vectors share one length, every number is finite and the
    /// rating scale is a non-empty interval.
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        let (low, high) = self.rating_scale;
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(ModelLoadError::Invalid(format!(
                "rating_scale ({}, {}) is not a valid interval",
                low, high
            )));
        }
        if !self.global_mean.is_finite() {
            return Err(ModelLoadError::Invalid("global_mean is not finite".to_string()));
        }
        if !(self.reg_bu.is_finite() && self.reg_bu >= 0.0) {
            return Err(ModelLoadError::Invalid(format!(
                "reg_bu must be a non-negative number, got {}",
                self.reg_bu
            )));
        }

        let expected = self.factor_count();
        let entries = self
            .users
            .iter()
            .map(|(id, f)| (format!("user {}", id), f))
            .chain(self.items.iter().map(|(id, f)| (format!("item {}", id), f)));
        for (label, factors) in entries {
            if factors.factors.len() != expected {
                return Err(ModelLoadError::Invalid(format!(
                    "{} has {} factors, expected {}",
                    label,
                    factors.factors.len(),
                    expected
                )));
            }
            if !factors.bias.is_finite() || factors.factors.iter().any(|v| !v.is_finite()) {
                return Err(ModelLoadError::Invalid(format!("{} has non-finite values", label)));
            }
        }
        Ok(())
    }

    /// Estimate an unseen user's bias from their rows in the request view
    fn fold_in_bias(&self, ratings: &EphemeralRatings<'_>, user_id: UserId) -> f32 {
        let (residual_sum, count) = ratings
            .ratings_by(user_id)
            .filter_map(|r| {
                self.items
                    .get(&r.book_id)
                    .map(|item| r.rating - self.global_mean - item.bias)
            })
            .fold((0.0f32, 0u32), |(sum, n), residual| (sum + residual, n + 1));

        if count == 0 {
            0.0
        } else {
            residual_sum / (self.reg_bu + count as f32)
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl RatingPredictor for SvdModel {
    fn name(&self) -> &str {
        "SvdModel"
    }

    fn predict(
        &self,
        ratings: &EphemeralRatings<'_>,
        user_id: UserId,
        book_id: &str,
    ) -> Result<f32, PredictionError> {
        let user = self.users.get(&user_id);
        let item = self.items.get(book_id);

        let estimate = if self.biased {
            let mut estimate = self.global_mean;
            estimate += match user {
                Some(u) => u.bias,
                None => self.fold_in_bias(ratings, user_id),
            };
            if let Some(i) = item {
                estimate += i.bias;
            }
            if let (Some(u), Some(i)) = (user, item) {
                estimate += dot(&u.factors, &i.factors);
            }
            estimate
        } else {
            match (user, item) {
                (Some(u), Some(i)) => dot(&u.factors, &i.factors),
                _ => {
                    debug!(user_id, book_id, "User and item are unknown, using global mean");
                    self.global_mean
                }
            }
        };

        if !estimate.is_finite() {
            return Err(PredictionError::NonFinite {
                user_id,
                book_id: book_id.to_string(),
            });
        }

        let (low, high) = self.rating_scale;
        let clipped = estimate.clamp(low, high);
        debug!(user_id, book_id, estimate, clipped, "SVD prediction");
        Ok(clipped)
    }
}
