//! Placeholder substitution for kernel file templates.
//!
//! Placeholders are written `$name` or `${name}`, where a name starts with a
//! letter or underscore followed by letters, digits or underscores. `$$`
//! produces a literal `$`. Placeholders with no matching key, and any `$`
//! that does not start a valid placeholder, are left in the output as
//! written.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$(?:(?P<escaped>\$)|(?P<named>[_A-Za-z][_A-Za-z0-9]*)|\{(?P<braced>[_A-Za-z][_A-Za-z0-9]*)\})")
            .expect("placeholder pattern is valid")
    })
}

/// Replace placeholders found in `substitutions`, leaving unknown ones untouched.
pub fn safe_substitute<V: AsRef<str>>(template: &str, substitutions: &BTreeMap<&str, V>) -> String {
    placeholder_pattern()
        .replace_all(template, |caps: &Captures| {
            if caps.name("escaped").is_some() {
                return "$".to_string();
            }
            let name = caps
                .name("named")
                .or_else(|| caps.name("braced"))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match substitutions.get(name) {
                Some(value) => value.as_ref().to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Drop everything from the first `#` on each line.
///
/// A line whose comment is stripped also loses its line break, so the
/// remainder is joined with the following line.
pub fn strip_comments(text: &str) -> String {
    text.split_inclusive('\n')
        .map(|line| match line.split_once('#') {
            Some((kept, _)) => kept,
            None => line,
        })
        .collect()
}

/// Escape a value for use inside a JSON string literal.
///
/// Every placeholder in the bundled templates sits inside a JSON string,
/// so values are escaped before substitution.
pub fn json_string_escape(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
