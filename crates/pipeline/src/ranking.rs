//! Ranking of scored candidates and the average-rating fallback.
//!
//! All sorts are stable, so equal scores keep catalog order.

use crate::filter_pipeline::FilterPipeline;
use crate::filters::RatingWindowFilter;
use crate::scoring::ScoredCandidate;
use anyhow::Result;
use data_loader::BookId;
use sources::{Candidate, LookupContext};
use tracing::debug;

/// Default number of recommendations returned
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Default half-width of the fallback rating window
pub const DEFAULT_RATING_WINDOW: f64 = 1.5;

/// Which path produced a recommendation list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingStrategy {
    /// Blended predictor + average scores
    Blended,
    /// Averages within the window around the caller's rating
    RatingWindow,
    /// All averages, used when the window held too few books
    AllByAverage,
}

/// One ranked book, ready to show
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub book_id: BookId,
    pub title: String,
    /// Blended score or average rating, rounded to 2 decimals
    pub score: f64,
    pub avg_rating: f64,
}

/// Round to 2 decimal places, halves to even.
///
/// Rounds the exact binary value: 2.675 is stored just below the tie and
/// gives 2.67, while 7.125 is an exact tie and gives 7.12.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    let floor = scaled.floor();
    if scaled - floor != 0.5 {
        return scaled.round() / 100.0;
    }

    // the product may have been rounded onto the tie; the fused residual is exact
    let residual = value.mul_add(100.0, -scaled);
    let rounded = if residual < 0.0 {
        floor
    } else if residual > 0.0 {
        floor + 1.0
    } else {
        scaled.round_ties_even()
    };
    rounded / 100.0
}

/// Sort blended candidates by score, highest first, and keep the top `limit`
pub fn rank_blended(mut scored: Vec<ScoredCandidate>, limit: usize) -> Vec<Recommendation> {
    scored.sort_by(|a, b| b.blended.total_cmp(&a.blended));
    scored.truncate(limit);

    scored
        .into_iter()
        .map(|s| Recommendation {
            book_id: s.book_id,
            title: s.title,
            score: round2(s.blended),
            avg_rating: s.avg_rating,
        })
        .collect()
}

fn rank_by_average(mut candidates: Vec<Candidate>, limit: usize) -> Vec<Recommendation> {
    candidates.retain(|c| c.avg_rating.is_some());
    candidates.sort_by(|a, b| {
        let a = a.avg_rating.unwrap_or(f64::NEG_INFINITY);
        let b = b.avg_rating.unwrap_or(f64::NEG_INFINITY);
        b.total_cmp(&a)
    });
    candidates.truncate(limit);

    candidates
        .into_iter()
        .filter_map(|c| {
            let avg_rating = c.avg_rating?;
            Some(Recommendation {
                book_id: c.book_id,
                title: c.title,
                score: round2(avg_rating),
                avg_rating,
            })
        })
        .collect()
}

/// Ranks by historical average when no blended score could be produced.
///
/// First tries the books whose average lies within the window around the
/// caller's rating. If that leaves fewer than `limit` books, the window is
/// dropped and every candidate with an average is ranked instead.
pub struct AverageFallback {
    window: FilterPipeline,
    limit: usize,
}

impl AverageFallback {
    /// Create a new AverageFallback.
    ///
    /// # Arguments
    /// * `tolerance` - Half-width of the rating window
    /// * `limit` - Maximum number of recommendations
    pub fn new(tolerance: f64, limit: usize) -> Self {
        Self {
            window: FilterPipeline::new().add_filter(RatingWindowFilter::new(tolerance)),
            limit,
        }
    }

    /// Rank `pool` by average rating.
    ///
    /// `pool` is expected to already exclude the matched book.
    pub fn rank(
        &self,
        pool: Vec<Candidate>,
        context: &LookupContext,
    ) -> Result<(Vec<Recommendation>, RankingStrategy)> {
        let in_window = self.window.apply(pool.clone(), context)?;

        if in_window.len() < self.limit {
            debug!(
                "Only {} candidates within the rating window, ranking all {}",
                in_window.len(),
                pool.len()
            );
            return Ok((rank_by_average(pool, self.limit), RankingStrategy::AllByAverage));
        }

        Ok((rank_by_average(in_window, self.limit), RankingStrategy::RatingWindow))
    }
}
