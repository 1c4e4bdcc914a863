//! Advertisement insertion
//!
//! Appends the promotional line to a finished description, formatting it with
//! the destination's own default description parser so it lands in native
//! markup.

/// Promotional line in the portable dialect.
const PROMO: &str = r#"<p>Posted using <a href="https://github.com/crosspost/crosspost">Crosspost</a></p>"#;

/// Append the formatted promotional line to `description`.
pub fn append(description: &str, format: impl Fn(&str) -> String) -> String {
    let promo = format(PROMO);
    if description.trim().is_empty() {
        promo
    } else {
        format!("{}\n\n{}", description, promo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_to_existing_description() {
        let out = append("my post", |s| s.to_string());
        assert!(out.starts_with("my post\n\n"));
        assert!(out.contains("Posted using"));
    }

    #[test]
    fn test_append_to_empty_description() {
        let out = append("   ", |s| s.to_string());
        assert!(out.starts_with("<p>Posted using"));
    }

    #[test]
    fn test_promo_is_formatted_by_destination_parser() {
        let out = append("my post", |s| s.replace("<p>", "[p]").replace("</p>", "[/p]"));
        assert!(out.contains("[p]Posted using"));
        // only the promo line goes through the formatter
        assert!(out.starts_with("my post"));
    }
}
