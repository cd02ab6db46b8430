//! Filter implementations for the candidate pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod exclude_matched;
pub mod known_average;
pub mod rating_window;

// Re-export for convenience
pub use exclude_matched::ExcludeMatchedFilter;
pub use known_average::KnownAverageFilter;
pub use rating_window::RatingWindowFilter;
