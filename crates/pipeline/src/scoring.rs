//! Blended scoring of candidates.
//!
//! Each candidate with a known average is scored as the mean of the
//! predictor's estimate for the synthetic user and the book's historical
//! average. A failed prediction only removes that one candidate.

use data_loader::{BookId, DataIndex};
use predictor::RatingPredictor;
use sources::{Candidate, LookupContext};
use std::sync::Arc;
use tracing::{debug, warn};

/// A candidate that received a blended score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub book_id: BookId,
    pub title: String,
    pub avg_rating: f64,
    pub predicted: f64,
    pub blended: f64,
}

/// Mean of the predicted rating and the historical average
pub fn blend(predicted: f64, avg_rating: f64) -> f64 {
    (predicted + avg_rating) / 2.0
}

/// Scores candidates through a shared predictor
#[derive(Clone)]
pub struct BlendScorer {
    data_index: Arc<DataIndex>,
    predictor: Arc<dyn RatingPredictor>,
}

impl BlendScorer {
    /// Create a new BlendScorer.
    pub fn new(data_index: Arc<DataIndex>, predictor: Arc<dyn RatingPredictor>) -> Self {
        Self {
            data_index,
            predictor,
        }
    }

    /// Score every candidate that has an average rating.
    ///
    /// The request's ephemeral rating view is built here and dropped on
    /// return. Output keeps input order; candidates whose prediction failed
    /// are missing from it.
    pub fn score(&self, candidates: &[Candidate], context: &LookupContext) -> Vec<ScoredCandidate> {
        let ratings = context.ephemeral_ratings(&self.data_index);

        let scored: Vec<ScoredCandidate> = candidates
            .iter()
            .filter_map(|candidate| {
                let avg_rating = candidate.avg_rating?;
                match self
                    .predictor
                    .predict(&ratings, context.synthetic_user_id, &candidate.book_id)
                {
                    Ok(predicted) => {
                        let predicted = f64::from(predicted);
                        Some(ScoredCandidate {
                            book_id: candidate.book_id.clone(),
                            title: candidate.title.clone(),
                            avg_rating,
                            predicted,
                            blended: blend(predicted, avg_rating),
                        })
                    }
                    Err(e) => {
                        warn!("Prediction error for {}: {}", candidate.book_id, e);
                        None
                    }
                }
            })
            .collect();

        debug!(
            "{} scored {} of {} candidates",
            self.predictor.name(),
            scored.len(),
            candidates.len()
        );
        scored
    }
}
