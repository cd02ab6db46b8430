//! Collaborative-filtering predictor used by the recommendation resolver.
//!
//! This crate provides:
//! - the `RatingPredictor` trait the resolver scores candidates through
//! - `SvdModel`, a precomputed matrix-factorisation model loaded from JSON
//! - error types for per-prediction failures and model loading
//!
//! Predictions receive the request's `EphemeralRatings`, so a model can take
//! the caller's own rating into account without ever mutating shared state.

use data_loader::{EphemeralRatings, UserId};
use thiserror::Error;

pub mod svd;

pub use svd::{LatentFactors, SvdModel};

/// Errors for a single `(user, book)` prediction.
///
/// These are per-candidate failures: the resolver logs and skips the
/// candidate, it never aborts the request because of one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("Prediction impossible for user {user_id} and book {book_id}: {reason}")]
    Impossible {
        user_id: UserId,
        book_id: String,
        reason: String,
    },

    #[error("Model produced a non-finite estimate for user {user_id} and book {book_id}")]
    NonFinite { user_id: UserId, book_id: String },
}

/// Errors that can occur while loading a model file
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Failed to read model file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid model: {0}")]
    Invalid(String),
}

/// Maps `(user, book)` to an estimated rating.
///
/// `Send + Sync` so one loaded model can sit behind an `Arc` for the whole
/// process lifetime.
pub trait RatingPredictor: Send + Sync {
    /// Returns the name of this predictor (for logging/debugging)
    fn name(&self) -> &str;

    /// Estimate the rating `user_id` would give `book_id`.
    ///
    /// # Arguments
    /// * `ratings` - The request's ephemeral rating view (history + synthetic row)
    /// * `user_id` - The user to predict for, usually the synthetic user
    /// * `book_id` - The candidate book
    fn predict(
        &self,
        ratings: &EphemeralRatings<'_>,
        user_id: UserId,
        book_id: &str,
    ) -> Result<f32, PredictionError>;
}
