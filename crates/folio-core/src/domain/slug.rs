//! URL slug helpers shared by posts, categories and projects.

/// Turn free text into a URL-safe slug.
///
/// Non-ASCII-alphanumeric characters are dropped, runs of whitespace,
/// hyphens and underscores collapse into a single hyphen, and the result is
/// lowercased with no leading or trailing separators.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = true;
        }
    }

    slug
}

/// A slug is non-empty and made only of ASCII letters, digits, `-` and `_`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
