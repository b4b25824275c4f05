//! Escape filters registered on every engine.
//!
//! | filter         | target                                         |
//! |----------------|------------------------------------------------|
//! | `nginx_escape` | contents of a double-quoted nginx string       |
//! | `regex_escape` | literal text inside an nginx (PCRE) regex      |
//! | `shell_quote`  | one POSIX shell word, single-quoted            |
//!
//! Values that cannot be represented safely are rejected, which fails the render.

use std::collections::HashMap;

use tera::{try_get_value, Value};

/// Escape `\` and `"` for a double-quoted nginx string.
///
/// Control characters and `$` are rejected: nginx has no escape for either
/// and `$` would be expanded as a variable by many directives.
pub fn nginx_escape(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = try_get_value!("nginx_escape", "value", String, value);
    if let Some(bad) = s.chars().find(|c| c.is_control() || *c == '$') {
        return Err(tera::Error::msg(format!(
            "value {s:?} contains {bad:?}, which cannot be written into an nginx config"
        )));
    }
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    Ok(Value::String(out))
}

/// Backslash-escape PCRE metacharacters so the value matches literally.
pub fn regex_escape(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = try_get_value!("regex_escape", "value", String, value);
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if "\\.+*?()|[]{}^$/".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    Ok(Value::String(out))
}

/// Quote as a single POSIX shell word: `it's` becomes `'it'\''s'`.
pub fn shell_quote(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = match value {
        Value::Number(n) => n.to_string(),
        _ => try_get_value!("shell_quote", "value", String, value),
    };
    if s.contains('\0') {
        return Err(tera::Error::msg("value contains a NUL byte"));
    }
    Ok(Value::String(format!("'{}'", s.replace('\'', r"'\''"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(
        filter: fn(&Value, &HashMap<String, Value>) -> tera::Result<Value>,
        input: &str,
    ) -> tera::Result<String> {
        filter(&Value::String(input.to_string()), &HashMap::new())
            .map(|v| v.as_str().unwrap_or_default().to_string())
    }

    #[test]
    fn nginx_escape_escapes_quotes_and_backslashes() {
        assert_eq!(apply(nginx_escape, "a.com").unwrap(), "a.com");
        assert_eq!(
            apply(nginx_escape, r#"a"; include /etc/passwd; #"#).unwrap(),
            r#"a\"; include /etc/passwd; #"#
        );
        assert_eq!(apply(nginx_escape, r"a\b").unwrap(), r"a\\b");
    }

    #[test]
    fn nginx_escape_rejects_newlines_and_variables() {
        assert!(apply(nginx_escape, "a.com\nlisten 81;").is_err());
        assert!(apply(nginx_escape, "$host").is_err());
    }

    #[test]
    fn regex_escape_neutralises_metacharacters() {
        assert_eq!(apply(regex_escape, "ops.team").unwrap(), r"ops\.team");
        assert_eq!(apply(regex_escape, "a|b").unwrap(), r"a\|b");
    }

    #[test]
    fn shell_quote_wraps_in_single_quotes() {
        assert_eq!(apply(shell_quote, "a.com").unwrap(), "'a.com'");
        assert_eq!(apply(shell_quote, "it's").unwrap(), r"'it'\''s'");
        assert_eq!(apply(shell_quote, "$(rm -rf /)").unwrap(), "'$(rm -rf /)'");
    }
}
