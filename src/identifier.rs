//! Entity reference normalization.

/// Returns the trailing path segment of an entity reference.
///
/// Wikidata returns entities as URIs such as `http://www.wikidata.org/entity/Q5582`;
/// the identifier is everything after the last `/`. Input without a `/` is returned
/// unchanged, and a reference ending in `/` yields an empty identifier.
///
/// # Example
///
/// ```
/// use artmap::extract_id;
///
/// assert_eq!(extract_id("http://www.wikidata.org/entity/Q5582"), "Q5582");
/// assert_eq!(extract_id("Q5582"), "Q5582");
/// ```
pub fn extract_id(reference: &str) -> &str {
    match reference.rfind('/') {
        Some(pos) => &reference[pos + 1..],
        None => reference,
    }
}
