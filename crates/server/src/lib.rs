//! Server crate for the ShelfRecs recommendation resolver.
//!
//! This crate contains request validation, the resolver that coordinates
//! the recommendation pipeline, the results session behind the
//! submit-lookup / view-results endpoints, and service configuration.

pub mod config;
pub mod request;
pub mod resolver;
pub mod session;

pub use config::ServiceConfig;
pub use request::{LookupForm, LookupRequest, ValidationError};
pub use resolver::{
    DEFAULT_SYNTHETIC_USER_ID, LookupOutcome, RecommendationResolver, ResolveError, Resolution, ResolverSettings,
};
pub use session::{
    BOOK_NOT_FOUND_MESSAGE, INTERNAL_ERROR_MESSAGE, LookupService, NO_RECOMMENDATIONS_MESSAGE, ResultSession,
    ResultsView, StoredResults, SubmitResponse,
};
