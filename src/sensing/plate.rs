/// Normalizes OCR plate text for comparison: drops whitespace, hyphens and slashes.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '/')
        .collect()
}
