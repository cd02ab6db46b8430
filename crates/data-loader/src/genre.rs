//! Keyword-based genre classification.
//!
//! Priority lives in the order of [`GENRE_KEYWORDS`]: the first group with a
//! keyword contained in the lowercased title wins. Titles matching nothing
//! (or missing titles) are `General`.

use crate::types::Genre;

/// Ordered keyword groups, highest priority first
pub const GENRE_KEYWORDS: &[(Genre, &[&str])] = &[
    (Genre::Fantasy, &["fantasy", "magic", "wizard", "dragon"]),
    (Genre::Thriller, &["thriller", "suspense", "mystery"]),
    (Genre::Psychology, &["psychology", "mind", "behavior"]),
    (Genre::ScienceFiction, &["science fiction", "sci-fi", "space"]),
];

/// Classify a title into exactly one genre.
///
/// `None` stands for a row whose title was missing and is always `General`.
pub fn classify_title(title: Option<&str>) -> Genre {
    let Some(title) = title else {
        return Genre::General;
    };
    let lowered = title.to_lowercase();

    GENRE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(genre, _)| *genre)
        .unwrap_or(Genre::General)
}
