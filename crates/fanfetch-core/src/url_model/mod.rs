//! Destination-name derivation.
//!
//! A target's destination name is the final segment of its URL path, taken
//! as is. Query strings and fragments never contribute to the name.

mod path;

pub use path::filename_from_url_path;

/// Whether `name` can be stored as a single file in the output directory.
pub fn is_storable_name(name: &str) -> bool {
    !(name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0'))
}

/// Derives the destination name for a locator.
///
/// Returns `None` when the locator does not parse, its path ends in `/`, or
/// the final segment cannot be a file name (`.`, `..`, separators, NUL).
///
/// - `destination_name("https://example.com/images/image1.jpg")` → `Some("image1.jpg")`
/// - `destination_name("https://example.com/gallery/")` → `None`
pub fn destination_name(locator: &str) -> Option<String> {
    filename_from_url_path(locator).filter(|name| is_storable_name(name))
}
