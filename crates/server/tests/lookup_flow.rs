//! End-to-end tests for the submit-lookup / view-results flow.
//!
//! These tests build a small in-memory catalog, plug in test predictors and
//! drive the service the way a front end would.

use data_loader::{Book, DataIndex, EphemeralRatings, Rating, UserId, classify_title};
use pipeline::filters::ExcludeMatchedFilter;
use pipeline::{Filter, FilterPipeline, RankingStrategy};
use predictor::{PredictionError, RatingPredictor};
use sources::{Candidate, LookupContext};
use server::*;
use sources::find_matches;
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

// ============================================================================
// Test Predictors
// ============================================================================

/// Returns fixed predictions; books not in the table fail
struct TablePredictor {
    table: HashMap<String, f32>,
}

impl TablePredictor {
    fn new(entries: &[(&str, f32)]) -> Self {
        Self {
            table: entries.iter().map(|(id, p)| (id.to_string(), *p)).collect(),
        }
    }
}

impl RatingPredictor for TablePredictor {
    fn name(&self) -> &str {
        "TablePredictor"
    }

    fn predict(&self, _: &EphemeralRatings<'_>, user_id: UserId, book_id: &str) -> Result<f32, PredictionError> {
        self.table
            .get(book_id)
            .copied()
            .ok_or_else(|| PredictionError::Impossible {
                user_id,
                book_id: book_id.to_string(),
                reason: "not in table".to_string(),
            })
    }
}

/// Fails every prediction
struct FailingPredictor;

impl RatingPredictor for FailingPredictor {
    fn name(&self) -> &str {
        "FailingPredictor"
    }

    fn predict(&self, _: &EphemeralRatings<'_>, user_id: UserId, book_id: &str) -> Result<f32, PredictionError> {
        Err(PredictionError::Impossible {
            user_id,
            book_id: book_id.to_string(),
            reason: "model unavailable".to_string(),
        })
    }
}

/// Predicts the rating the user gave in the request view
struct EchoPredictor;

impl RatingPredictor for EchoPredictor {
    fn name(&self) -> &str {
        "EchoPredictor"
    }

    fn predict(&self, ratings: &EphemeralRatings<'_>, user_id: UserId, book_id: &str) -> Result<f32, PredictionError> {
        ratings
            .ratings_by(user_id)
            .map(|r| r.rating)
            .next()
            .ok_or_else(|| PredictionError::Impossible {
                user_id,
                book_id: book_id.to_string(),
                reason: "user has no ratings".to_string(),
            })
    }
}

/// Fails on every candidate set it is handed
struct BrokenFilter;

impl Filter for BrokenFilter {
    fn name(&self) -> &str {
        "BrokenFilter"
    }

    fn apply(&self, _: Vec<Candidate>, _: &LookupContext) -> anyhow::Result<Vec<Candidate>> {
        Err(anyhow::anyhow!("candidate index corrupted"))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Catalog order matters: "Harry Potter" must be the first "harry" match.
fn build_test_data_index() -> Arc<DataIndex> {
    let books = [
        ("H", "Harry Potter: A Wizard's Tale"),
        ("F1", "Dragon Song"),
        ("F2", "Magic Kingdom for Sale"),
        ("F3", "The Wizard Hunters"),
        ("F4", "Fantasy Lover"),
        ("F5", "Dragon's Egg"),
        ("F6", "Magic Bites"),
        ("F7", "Dragonflight"),
        ("F8", "Wizard's First Rule"),
        ("T1", "Harry's Adventure in Suspense"),
        ("T2", "Mystery Manor"),
    ]
    .into_iter()
    .map(|(id, title)| Book {
        id: id.to_string(),
        title: title.to_string(),
        genre: classify_title(Some(title)),
    })
    .collect();

    let ratings = [
        (1, "H", 9.0),
        (1, "F1", 7.0),
        (2, "F1", 9.0),
        (2, "F2", 6.0),
        (3, "F3", 7.0),
        (3, "F4", 9.5),
        (4, "F5", 3.0),
        (4, "F6", 8.5),
        (5, "F8", 7.5),
        (5, "T1", 6.0),
        (6, "T2", 7.0),
    ]
    .into_iter()
    .map(|(user_id, book_id, rating)| Rating {
        user_id,
        book_id: book_id.to_string(),
        rating,
    })
    .collect();

    Arc::new(DataIndex::from_records(books, ratings).unwrap())
}

fn service(predictor: impl RatingPredictor + 'static) -> LookupService {
    let resolver = RecommendationResolver::new(
        build_test_data_index(),
        Arc::new(predictor),
        ResolverSettings::default(),
    );
    LookupService::new(resolver)
}

fn fantasy_table() -> TablePredictor {
    TablePredictor::new(&[
        ("F1", 8.0),
        ("F2", 9.0),
        ("F3", 7.0),
        ("F4", 6.0),
        ("F5", 5.0),
        ("F6", 10.0),
        ("F8", 5.0),
    ])
}

fn resolve(service: &LookupService, title: &str, rating: f64, genre: &str) -> Resolution {
    let request = LookupRequest::new(title, rating, genre).unwrap();
    match service.resolver().resolve(&request).unwrap() {
        LookupOutcome::Recommended(resolution) => resolution,
        LookupOutcome::NotFound { title } => panic!("'{}' should have matched", title),
    }
}

fn ids(resolution: &Resolution) -> Vec<&str> {
    resolution
        .recommendations
        .iter()
        .map(|r| r.book_id.as_str())
        .collect()
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_ratings_in_range_are_accepted() {
    let service = service(fantasy_table());

    for rating in ["0", "0.0", "5", "9.99", "10", "10.0"] {
        let mut session = ResultSession::new();
        let response = service.submit_lookup(&mut session, &LookupForm::new("harry", rating, "fantasy"));
        assert_eq!(response, SubmitResponse::RedirectToResults, "rating {}", rating);
    }
}

#[test]
fn test_out_of_range_rating_is_rejected_before_lookup() {
    let service = service(fantasy_table());

    for rating in ["11", "-0.5", "10.5"] {
        let mut session = ResultSession::new();
        let response = service.submit_lookup(&mut session, &LookupForm::new("harry", rating, "fantasy"));

        assert_eq!(
            response,
            SubmitResponse::Error("Rating must be between 0 and 10".to_string())
        );
        assert!(session.results().is_none());
    }
}

#[test]
fn test_validation_error_keeps_previous_results() {
    let service = service(fantasy_table());
    let mut session = ResultSession::new();

    service.submit_lookup(&mut session, &LookupForm::new("harry", "8.5", "fantasy"));
    let before = session.clone();
    assert!(before.results().is_some());

    let response = service.submit_lookup(&mut session, &LookupForm::new("harry", "11", "fantasy"));

    assert!(matches!(response, SubmitResponse::Error(_)));
    assert_eq!(session, before);
}

#[test]
fn test_non_numeric_rating_is_rejected() {
    let service = service(fantasy_table());
    let mut session = ResultSession::new();

    let response = service.submit_lookup(&mut session, &LookupForm::new("harry", "great", "fantasy"));

    match response {
        SubmitResponse::Error(message) => assert!(message.contains("great")),
        other => panic!("unexpected response {:?}", other),
    }
    assert!(session.results().is_none());
}

// ============================================================================
// Title matching
// ============================================================================

#[test]
fn test_title_matching_is_case_insensitive_substring() {
    let index = build_test_data_index();

    let matched: Vec<&str> = find_matches(&index, "harry").map(|b| b.id.as_str()).collect();
    assert_eq!(matched, vec!["H", "T1"]);

    let upper: Vec<&str> = find_matches(&index, "  HARRY ").map(|b| b.id.as_str()).collect();
    assert_eq!(upper, matched);
}

#[test]
fn test_first_match_in_catalog_order_wins() {
    let service = service(fantasy_table());

    assert_eq!(resolve(&service, "harry", 8.5, "fantasy").matched.id, "H");
    assert_eq!(resolve(&service, "harry's", 8.5, "fantasy").matched.id, "T1");
}

#[test]
fn test_unknown_title_reports_not_found_and_stores_nothing() {
    let service = service(fantasy_table());
    let mut session = ResultSession::new();

    service.submit_lookup(&mut session, &LookupForm::new("harry", "8.5", "fantasy"));
    assert!(session.results().is_some());

    let response = service.submit_lookup(&mut session, &LookupForm::new("Necronomicon", "8.5", "fantasy"));

    assert_eq!(response, SubmitResponse::Error(BOOK_NOT_FOUND_MESSAGE.to_string()));
    assert!(session.results().is_none());
}

// ============================================================================
// Blended scoring
// ============================================================================

#[test]
fn test_harry_potter_fantasy_blended_top_five() {
    let service = service(fantasy_table());

    let resolution = resolve(&service, "harry potter", 8.5, "fantasy");

    assert_eq!(resolution.strategy, RankingStrategy::Blended);
    assert_eq!(ids(&resolution), vec!["F6", "F1", "F4", "F2", "F3"]);

    let scores: Vec<f64> = resolution.recommendations.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![9.25, 8.0, 7.75, 7.5, 7.0]);
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_matched_book_is_never_recommended() {
    let service = service(TablePredictor::new(&[("H", 10.0), ("F1", 1.0)]));

    let resolution = resolve(&service, "harry potter", 8.5, "fantasy");

    assert_eq!(ids(&resolution), vec!["F1"]);
}

#[test]
fn test_partial_prediction_failures_skip_only_those_books() {
    // no prediction for F6, the best blended book
    let service = service(TablePredictor::new(&[
        ("F1", 8.0),
        ("F2", 9.0),
        ("F3", 7.0),
        ("F4", 6.0),
        ("F5", 5.0),
    ]));

    let resolution = resolve(&service, "harry potter", 8.5, "fantasy");

    assert_eq!(resolution.strategy, RankingStrategy::Blended);
    assert_eq!(ids(&resolution), vec!["F1", "F4", "F2", "F3", "F5"]);
}

#[test]
fn test_predictor_sees_the_synthetic_rating() {
    let service = service(EchoPredictor);

    let resolution = resolve(&service, "harry potter", 2.0, "fantasy");

    // (2.0 + average) / 2
    let f4 = resolution
        .recommendations
        .iter()
        .find(|r| r.book_id == "F4")
        .unwrap();
    assert_eq!(f4.score, 5.75);
}

#[test]
fn test_synthetic_rating_never_reaches_averages() {
    let service = service(EchoPredictor);
    let index = service.resolver().data_index().clone();
    let counts_before = index.counts();

    resolve(&service, "harry potter", 0.0, "fantasy");

    assert_eq!(index.counts(), counts_before);
    assert_eq!(index.get_book_stats("H").unwrap().avg_rating, 9.0);
    assert_eq!(index.get_book_stats("H").unwrap().rating_count, 1);
    assert!(!index.has_user(DEFAULT_SYNTHETIC_USER_ID));
}

// ============================================================================
// Internal errors
// ============================================================================

#[test]
fn test_failing_candidate_filter_reports_internal_error_and_clears_session() {
    let resolver = RecommendationResolver::with_pipeline(
        build_test_data_index(),
        Arc::new(fantasy_table()),
        ResolverSettings::default(),
        FilterPipeline::new()
            .add_filter(ExcludeMatchedFilter)
            .add_filter(BrokenFilter),
    );
    let service = LookupService::new(resolver);
    let mut session = ResultSession::new();
    session.store(StoredResults {
        recommendations: vec![("Dragon Song".to_string(), 8.0)],
        input_rating: 8.5,
    });

    let response = service.submit_lookup(&mut session, &LookupForm::new("harry", "8.5", "fantasy"));

    assert_eq!(response, SubmitResponse::Error(INTERNAL_ERROR_MESSAGE.to_string()));
    assert!(session.results().is_none());
    assert_eq!(
        service.view_results(&session).message.as_deref(),
        Some(NO_RECOMMENDATIONS_MESSAGE)
    );
}

#[test]
fn test_failing_candidate_filter_does_not_mask_not_found() {
    let resolver = RecommendationResolver::with_pipeline(
        build_test_data_index(),
        Arc::new(fantasy_table()),
        ResolverSettings::default(),
        FilterPipeline::new().add_filter(BrokenFilter),
    );
    let service = LookupService::new(resolver);
    let mut session = ResultSession::new();

    let response = service.submit_lookup(&mut session, &LookupForm::new("Necronomicon", "8.5", "fantasy"));

    assert_eq!(response, SubmitResponse::Error(BOOK_NOT_FOUND_MESSAGE.to_string()));
}

// ============================================================================
// Fallback
// ============================================================================

#[test]
fn test_all_predictions_failing_falls_back_to_window() {
    let service = service(FailingPredictor);

    let resolution = resolve(&service, "harry potter", 8.5, "fantasy");

    assert_eq!(resolution.strategy, RankingStrategy::RatingWindow);
    assert_eq!(ids(&resolution), vec!["F4", "F6", "F1", "F8", "F3"]);
    let scores: Vec<f64> = resolution.recommendations.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![9.5, 8.5, 8.0, 7.5, 7.0]);
}

#[test]
fn test_small_window_widens_to_all_by_average() {
    let service = service(FailingPredictor);

    // only F5 (3.0) lies within 3.0 ± 1.5
    let resolution = resolve(&service, "harry potter", 3.0, "fantasy");

    assert_eq!(resolution.strategy, RankingStrategy::AllByAverage);
    assert_eq!(ids(&resolution), vec!["F4", "F6", "F1", "F8", "F3"]);
}

#[test]
fn test_fallback_never_exceeds_five() {
    let service = service(FailingPredictor);

    for rating in [0.0, 2.5, 5.0, 7.5, 10.0] {
        let resolution = resolve(&service, "harry potter", rating, "fantasy");
        assert!(resolution.recommendations.len() <= 5);
        assert!(!ids(&resolution).contains(&"H"));
        // unrated books are never recommended
        assert!(!ids(&resolution).contains(&"F7"));
    }
}

// ============================================================================
// Results view
// ============================================================================

#[test]
fn test_view_results_after_success() {
    let service = service(fantasy_table());
    let mut session = ResultSession::new();

    let response = service.submit_lookup(&mut session, &LookupForm::new("Harry Potter", "8.5", "Fantasy"));
    assert_eq!(response, SubmitResponse::RedirectToResults);

    let view = service.view_results(&session);
    assert_eq!(view.input_rating, Some(8.5));
    assert_eq!(view.message, None);
    assert_eq!(view.recommendations.len(), 5);
    assert_eq!(view.recommendations[0], ("Magic Bites".to_string(), 9.25));

    // viewing twice shows the same page
    assert_eq!(service.view_results(&session), view);
}

#[test]
fn test_view_results_on_empty_session() {
    let service = service(fantasy_table());

    let view = service.view_results(&ResultSession::new());

    assert!(view.recommendations.is_empty());
    assert_eq!(view.input_rating, None);
    assert_eq!(view.message.as_deref(), Some(NO_RECOMMENDATIONS_MESSAGE));
}

#[test]
fn test_unknown_genre_redirects_to_empty_results() {
    let service = service(fantasy_table());
    let mut session = ResultSession::new();

    let response = service.submit_lookup(&mut session, &LookupForm::new("harry", "8.5", "romance"));
    assert_eq!(response, SubmitResponse::RedirectToResults);

    let view = service.view_results(&session);
    assert!(view.recommendations.is_empty());
    assert_eq!(view.input_rating, Some(8.5));
    assert_eq!(view.message.as_deref(), Some(NO_RECOMMENDATIONS_MESSAGE));
}

// ============================================================================
// Loading from disk
// ============================================================================

#[test]
fn test_service_loads_dataset_and_model_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("books.csv"),
        "ISBN,Book-Title,Book-Author\n\
         001,\"Magic, Mayhem and More\",A. Writer\n\
         002,The Dragon Keeper,B. Writer\n\
         003,Wizard School,C. Writer\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("ratings.csv"),
        "User-ID,ISBN,Book-Rating\n1,001,8\n1,002,6\n2,003,9\n",
    )
    .unwrap();
    let model_path = dir.path().join("svd_model.json");
    fs::write(
        &model_path,
        r#"{ "global_mean": 7.0, "items": { "001": { "bias": 0.0, "factors": [] } } }"#,
    )
    .unwrap();

    let config = ServiceConfig {
        data_dir: dir.path().to_path_buf(),
        model_path,
        ..ServiceConfig::default()
    };
    let service = LookupService::load(&config).unwrap();

    let mut session = ResultSession::new();
    let response = service.submit_lookup(&mut session, &LookupForm::new("mayhem", "9", "fantasy"));
    assert_eq!(response, SubmitResponse::RedirectToResults);

    // folded-in bias: 9 - 7 - 0 = 2 over (0.02 + 1)
    let view = service.view_results(&session);
    let titles: Vec<&str> = view.recommendations.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(titles, vec!["Wizard School", "The Dragon Keeper"]);
}

#[test]
fn test_utf8_catalog_matches_accented_titles() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("books.csv"),
        "ISBN,Book-Title\n1,Café Magic\n2,Dragon Tales\n3,Wizard Café\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("ratings.csv"),
        "User-ID,ISBN,Book-Rating\n1,2,7\n2,3,9\n",
    )
    .unwrap();
    let model_path = dir.path().join("svd_model.json");
    fs::write(&model_path, r#"{ "global_mean": 8.0 }"#).unwrap();

    let config = ServiceConfig {
        data_dir: dir.path().to_path_buf(),
        model_path,
        ..ServiceConfig::default()
    };
    let service = LookupService::load(&config).unwrap();

    let resolution = resolve(&service, "café", 8.0, "fantasy");
    assert_eq!(resolution.matched.title, "Café Magic");
    assert_eq!(resolve(&service, "CAFÉ MAGIC", 8.0, "fantasy").matched.id, "1");

    let mut session = ResultSession::new();
    let response = service.submit_lookup(&mut session, &LookupForm::new("café", "8", "fantasy"));
    assert_eq!(response, SubmitResponse::RedirectToResults);

    // bias-only model with no items: every prediction is 8.0
    let view = service.view_results(&session);
    assert_eq!(
        view.recommendations,
        vec![("Wizard Café".to_string(), 8.5), ("Dragon Tales".to_string(), 7.5)]
    );
}

#[test]
fn test_service_load_reports_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServiceConfig {
        data_dir: dir.path().to_path_buf(),
        model_path: dir.path().join("missing.json"),
        ..ServiceConfig::default()
    };

    assert!(LookupService::load(&config).is_err());
}
