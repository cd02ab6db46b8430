//! # Recommendation Resolver
//!
//! Turns one validated lookup into a ranked recommendation list:
//! 1. Match the title fragment to the first catalog book containing it
//! 2. Generate candidates from the requested genre
//! 3. Drop the matched book and books nobody has rated
//! 4. Score the pool with the predictor, blended with historical averages
//! 5. Rank; fall back to average ratings when nothing could be scored
//!
//! The resolver holds only shared, read-only state. The caller's rating is
//! visible to the predictor through a per-request `EphemeralRatings` view
//! and never reaches the `DataIndex`.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use data_loader::{Book, DataIndex, UserId};
use pipeline::filters::{ExcludeMatchedFilter, KnownAverageFilter};
use pipeline::{
    AverageFallback, BlendScorer, DEFAULT_MAX_RESULTS, DEFAULT_RATING_WINDOW, FilterPipeline, RankingStrategy,
    Recommendation, rank_blended,
};
use predictor::RatingPredictor;
use sources::{Candidate, GenreSource, LookupContext, build_lookup_context};

use crate::request::LookupRequest;

/// User id the caller's rating is recorded under unless configured otherwise
pub const DEFAULT_SYNTHETIC_USER_ID: UserId = 99999;

/// Tunables of a resolver
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverSettings {
    pub max_results: usize,
    pub rating_window: f64,
    pub synthetic_user_id: UserId,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            rating_window: DEFAULT_RATING_WINDOW,
            synthetic_user_id: DEFAULT_SYNTHETIC_USER_ID,
        }
    }
}

/// Result of a successful lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Catalog book the title fragment matched
    pub matched: Book,
    pub input_rating: f64,
    /// At most `max_results` books, best first. May be empty.
    pub recommendations: Vec<Recommendation>,
    pub strategy: RankingStrategy,
}

/// What a lookup produced
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Recommended(Resolution),
    /// No catalog title contains the fragment
    NotFound { title: String },
}

/// Failures that are not the caller's fault
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Internal resolver error: {0}")]
    Internal(String),
}

/// Resolves lookups against a shared catalog and predictor
pub struct RecommendationResolver {
    data_index: Arc<DataIndex>,
    source: GenreSource,
    candidate_pipeline: FilterPipeline,
    scorer: BlendScorer,
    fallback: AverageFallback,
    settings: ResolverSettings,
}

impl RecommendationResolver {
    /// Create a resolver with all components initialized
    ///
    /// # Arguments
    /// * `data_index` - Shared catalog and rating history
    /// * `predictor` - Shared rating predictor
    /// * `settings` - Result limit, fallback window and synthetic user id
    pub fn new(
        data_index: Arc<DataIndex>,
        predictor: Arc<dyn RatingPredictor>,
        settings: ResolverSettings,
    ) -> Self {
        let candidate_pipeline = FilterPipeline::new()
            .add_filter(ExcludeMatchedFilter)
            .add_filter(KnownAverageFilter);
        Self::with_pipeline(data_index, predictor, settings, candidate_pipeline)
    }

    /// Create a resolver that narrows genre candidates with `candidate_pipeline`.
    ///
    /// The pipeline must at least drop the matched book and unrated books;
    /// `new` uses exactly those two filters.
    pub fn with_pipeline(
        data_index: Arc<DataIndex>,
        predictor: Arc<dyn RatingPredictor>,
        settings: ResolverSettings,
        candidate_pipeline: FilterPipeline,
    ) -> Self {
        if data_index.has_user(settings.synthetic_user_id) {
            warn!(
                "Synthetic user id {} also appears in the rating history; their ratings will be mixed with the lookup",
                settings.synthetic_user_id
            );
        }

        debug!("Candidate filters: {:?}", candidate_pipeline.filter_names());

        let source = GenreSource::new(data_index.clone());
        let scorer = BlendScorer::new(data_index.clone(), predictor);
        let fallback = AverageFallback::new(settings.rating_window, settings.max_results);

        Self {
            data_index,
            source,
            candidate_pipeline,
            scorer,
            fallback,
            settings,
        }
    }

    pub fn data_index(&self) -> &Arc<DataIndex> {
        &self.data_index
    }

    /// Main entry point: resolve one validated lookup
    #[instrument(skip(self, request), fields(title = %request.title_fragment, rating = request.rating))]
    pub fn resolve(&self, request: &LookupRequest) -> Result<LookupOutcome, ResolveError> {
        let start_time = Instant::now();

        let Some(context) = build_lookup_context(
            &self.data_index,
            &request.title_fragment,
            request.rating,
            request.genre,
            self.settings.synthetic_user_id,
        ) else {
            info!("No catalog title contains '{}'", request.title_fragment.trim());
            return Ok(LookupOutcome::NotFound {
                title: request.title_fragment.clone(),
            });
        };

        let pool = self.candidate_pool(&context)?;
        let (recommendations, strategy) = self.rank(pool, &context)?;

        info!(
            "Resolved '{}' to {} recommendations via {:?} in {:.2?}",
            context.matched.title,
            recommendations.len(),
            strategy,
            start_time.elapsed()
        );

        Ok(LookupOutcome::Recommended(Resolution {
            matched: context.matched,
            input_rating: context.input_rating,
            recommendations,
            strategy,
        }))
    }

    /// Genre candidates minus the matched book and unrated books
    fn candidate_pool(&self, context: &LookupContext) -> Result<Vec<Candidate>, ResolveError> {
        let candidates = self.source.get_candidates(context);
        self.candidate_pipeline
            .apply(candidates, context)
            .map_err(|e| internal("candidate filtering failed", e))
    }

    /// Blended ranking, or the average fallback when nothing was scored
    fn rank(
        &self,
        pool: Vec<Candidate>,
        context: &LookupContext,
    ) -> Result<(Vec<Recommendation>, RankingStrategy), ResolveError> {
        let scored = self.scorer.score(&pool, context);
        if !scored.is_empty() {
            return Ok((rank_blended(scored, self.settings.max_results), RankingStrategy::Blended));
        }

        info!("No blended scores for {} candidates, ranking by average", pool.len());
        self.fallback
            .rank(pool, context)
            .map_err(|e| internal("fallback ranking failed", e))
    }
}

fn internal(stage: &str, err: anyhow::Error) -> ResolveError {
    error!("{}: {:#}", stage, err);
    ResolveError::Internal(format!("{}: {:#}", stage, err))
}
