/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Recover the country from a per-country header such as
/// `"Gross daily revenue:Japan"`: everything after the last `:`, trimmed.
/// A header without `:` is taken whole.
pub fn extract_country_name(column: &str) -> &str {
    column.rsplit(':').next().unwrap_or(column).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_is_text_after_last_colon() {
        assert_eq!(extract_country_name("Gross daily revenue:Japan"), "Japan");
        assert_eq!(extract_country_name("Installs: by country: Korea, Republic of "), "Korea, Republic of");
        assert_eq!(extract_country_name("Brazil"), "Brazil");
    }

    #[test]
    fn clean_strips_quotes_and_space() {
        assert_eq!(clean_str("  \" 1,200 \" "), "1,200");
        assert_eq!(clean_str("\""), "\"");
        assert_eq!(clean_str(" 5 "), "5");
    }
}
