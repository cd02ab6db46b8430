//! Title matching and LookupContext construction.
//!
//! Matching is a case-insensitive substring test over the catalog in file
//! order; the first hit is the book the caller rated.

use crate::types::LookupContext;
use data_loader::{Book, DataIndex, Genre, UserId};
use tracing::debug;

/// All catalog entries whose title contains `fragment`, ignoring case.
///
/// Books without a title never match.
pub fn find_matches<'a>(data_index: &'a DataIndex, fragment: &str) -> impl Iterator<Item = &'a Book> + 'a {
    let needle = fragment.trim().to_lowercase();
    data_index
        .books()
        .iter()
        .filter(move |book| !book.title.is_empty() && book.title.to_lowercase().contains(&needle))
}

/// The first catalog entry matching `fragment`, if any
pub fn find_first_match<'a>(data_index: &'a DataIndex, fragment: &str) -> Option<&'a Book> {
    find_matches(data_index, fragment).next()
}

/// Build a LookupContext for a request.
///
/// Returns `None` when no book matches the title fragment; that is an
/// expected outcome, not an error.
pub fn build_lookup_context(
    data_index: &DataIndex,
    title_fragment: &str,
    input_rating: f64,
    genre: Option<Genre>,
    synthetic_user_id: UserId,
) -> Option<LookupContext> {
    let matched = find_first_match(data_index, title_fragment)?;
    debug!("Matched '{}' to {} ({})", title_fragment, matched.id, matched.title);

    Some(LookupContext {
        matched: matched.clone(),
        genre,
        input_rating,
        synthetic_user_id,
    })
}
