//! Results session and the two lookup endpoints.
//!
//! `submit_lookup` validates a form, resolves it and stores the outcome in
//! the caller's [`ResultSession`]; `view_results` renders whatever is
//! stored. Neither ever fails: every error becomes a message the caller can
//! show.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use data_loader::DataIndex;
use predictor::SvdModel;

use crate::config::ServiceConfig;
use crate::request::{LookupForm, LookupRequest};
use crate::resolver::{LookupOutcome, RecommendationResolver};

pub const BOOK_NOT_FOUND_MESSAGE: &str = "Book not found. Try another title.";
pub const INTERNAL_ERROR_MESSAGE: &str = "An error occurred. Please try again.";
pub const NO_RECOMMENDATIONS_MESSAGE: &str = "No recommendations found.";

/// What a successful lookup leaves in the session
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResults {
    /// `(title, rounded score)` pairs, best first
    pub recommendations: Vec<(String, f64)>,
    pub input_rating: f64,
}

/// Per-caller storage between submit-lookup and view-results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSession {
    results: Option<StoredResults>,
}

impl ResultSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Option<&StoredResults> {
        self.results.as_ref()
    }

    pub fn store(&mut self, results: StoredResults) {
        self.results = Some(results);
    }

    pub fn clear(&mut self) {
        self.results = None;
    }
}

/// Response to a submitted lookup
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitResponse {
    /// Results were stored; show them with `view_results`
    RedirectToResults,
    /// Show the message next to the form
    Error(String),
}

/// Renderable results page
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub recommendations: Vec<(String, f64)>,
    pub input_rating: Option<f64>,
    /// Set when there is nothing to list
    pub message: Option<String>,
}

/// Submit-lookup and view-results over a shared resolver
pub struct LookupService {
    resolver: RecommendationResolver,
}

impl LookupService {
    pub fn new(resolver: RecommendationResolver) -> Self {
        Self { resolver }
    }

    /// Load the dataset and model named by `config` and build a service
    pub fn load(config: &ServiceConfig) -> Result<Self> {
        let data_index = DataIndex::load_from_files(&config.data_dir)
            .with_context(|| format!("Failed to load dataset from {}", config.data_dir.display()))?;
        let model = SvdModel::load_from_file(&config.model_path)
            .with_context(|| format!("Failed to load model from {}", config.model_path.display()))?;

        let resolver = RecommendationResolver::new(
            Arc::new(data_index),
            Arc::new(model),
            config.resolver_settings(),
        );
        Ok(Self::new(resolver))
    }

    pub fn resolver(&self) -> &RecommendationResolver {
        &self.resolver
    }

    /// Validate, resolve and store one lookup.
    ///
    /// A validation error leaves the session as it was. Anything past
    /// validation clears it first, so a not-found lookup leaves it empty.
    pub fn submit_lookup(&self, session: &mut ResultSession, form: &LookupForm) -> SubmitResponse {
        let request = match LookupRequest::from_form(form) {
            Ok(request) => request,
            Err(e) => {
                info!("Rejected lookup: {}", e);
                return SubmitResponse::Error(e.to_string());
            }
        };

        session.clear();

        match self.resolver.resolve(&request) {
            Ok(LookupOutcome::Recommended(resolution)) => {
                session.store(StoredResults {
                    recommendations: resolution
                        .recommendations
                        .into_iter()
                        .map(|r| (r.title, r.score))
                        .collect(),
                    input_rating: resolution.input_rating,
                });
                SubmitResponse::RedirectToResults
            }
            Ok(LookupOutcome::NotFound { .. }) => SubmitResponse::Error(BOOK_NOT_FOUND_MESSAGE.to_string()),
            Err(e) => {
                error!("Lookup failed: {}", e);
                SubmitResponse::Error(INTERNAL_ERROR_MESSAGE.to_string())
            }
        }
    }

    /// Render the stored results. Reading does not change the session.
    pub fn view_results(&self, session: &ResultSession) -> ResultsView {
        let stored = session.results();
        let recommendations = stored.map(|s| s.recommendations.clone()).unwrap_or_default();
        let message = recommendations
            .is_empty()
            .then(|| NO_RECOMMENDATIONS_MESSAGE.to_string());

        ResultsView {
            recommendations,
            input_rating: stored.map(|s| s.input_rating),
            message,
        }
    }
}
