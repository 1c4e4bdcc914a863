//! Username-shortcut substitution
//!
//! Expands `:key<name>:` tokens into profile links before the destination's
//! main parse runs, so the link markup is still in the portable dialect when
//! that parse converts or escapes it.

use regex::Regex;
use tracing::debug;

/// Replace every `:key<name>:` occurrence with an anchor to the shortcut's
/// profile URL (`$1` in the template stands for the name).
pub fn expand(text: &str, key: &str, url_template: &str) -> String {
    let pattern = format!(r":{}([A-Za-z0-9_.\-]+):", regex::escape(key));
    let regex = match Regex::new(&pattern) {
        Ok(regex) => regex,
        Err(e) => {
            debug!("unusable shortcut key '{}': {}", key, e);
            return text.to_string();
        }
    };

    regex
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            let url = url_template.replace("$1", name);
            format!(r#"<a href="{}">{}</a>"#, url, name)
        })
        .into_owned()
}
