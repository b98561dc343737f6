use std::collections::HashSet;

/// Derives the url slug of a recipe name.
///
/// Lowercases, drops everything outside `[a-z0-9]`, whitespace and `-`,
/// then collapses runs of whitespace and hyphens into a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_separator = true;
        }
    }

    slug
}

/// Picks `base`, or the first free `base-N` starting at 2.
pub fn unique_slug(base: &str, taken: &HashSet<String>) -> String {
    let base = if base.is_empty() { "recipe" } else { base };
    if !taken.contains(base) {
        return base.to_string();
    }

    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}
