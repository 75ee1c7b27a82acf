/// Strips byte-order marks and zero-width characters, then collapses runs
/// of whitespace. Spreadsheet exports routinely carry both.
pub(crate) fn clean(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derives a stable identifier from a display value, keeping alphanumeric
/// runs and joining them with hyphens.
pub(crate) fn slug(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut gap = false;
    for ch in clean(value).to_lowercase().chars() {
        if ch.is_alphanumeric() {
            if gap && !slug.is_empty() {
                slug.push('-');
            }
            gap = false;
            slug.push(ch);
        } else {
            gap = true;
        }
    }
    slug
}
