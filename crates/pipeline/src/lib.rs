//! Pipeline for filtering, scoring and ranking book candidates.
//!
//! This crate provides:
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - BlendScorer for mixing predictor estimates with historical averages
//! - Ranking of blended scores and the average-rating fallback
//!
//! ## Architecture
//! The pipeline processes candidates in stages:
//! 1. Filters drop the matched book and books nobody has rated
//! 2. BlendScorer scores the remaining pool through a `RatingPredictor`
//! 3. Scored books are ranked; if nothing could be scored, AverageFallback
//!    ranks the pool by historical average instead
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{AverageFallback, BlendScorer, FilterPipeline, rank_blended};
//! use pipeline::filters::*;
//!
//! let pipeline = FilterPipeline::new()
//!     .add_filter(ExcludeMatchedFilter)
//!     .add_filter(KnownAverageFilter);
//!
//! let pool = pipeline.apply(candidates, &context)?;
//!
//! let scorer = BlendScorer::new(index.clone(), predictor.clone());
//! let scored = scorer.score(&pool, &context);
//! let ranked = if scored.is_empty() {
//!     AverageFallback::new(1.5, 5).rank(pool, &context)?.0
//! } else {
//!     rank_blended(scored, 5)
//! };
//! ```

pub mod filter_pipeline;
pub mod filters;
pub mod ranking;
pub mod scoring;
pub mod traits;

// Re-export main types
pub use filter_pipeline::FilterPipeline;
pub use ranking::{
    AverageFallback, DEFAULT_MAX_RESULTS, DEFAULT_RATING_WINDOW, RankingStrategy, Recommendation,
    rank_blended, round2,
};
pub use scoring::{BlendScorer, ScoredCandidate, blend};
pub use traits::Filter;
