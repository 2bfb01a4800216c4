//! Repairs broker responses so a standard JSON parser can read them.
//!
//! The broker returns its payload in the top-level `data` field as a JSON
//! document re-encoded into a string:
//!
//! ```text
//! {"messages":"","data":"{\"rhlogin\":\"me@example.com\",\"uuid\":\"0c82...\"}","exit_code":0}
//! ```
//!
//! Depending on the code path the nested document is escaped once, twice, or
//! inconsistently (nested quotes inside an SSH key comment are sometimes left
//! bare). [`sanitize`] locates the `data` string, peels off escaping until the
//! nested document parses as an object or array, and splices it back in place
//! of the string. Every other byte of the response is left untouched.
//!
//! Sanitizing is best effort and never fails: input it cannot repair is
//! returned unchanged and the failure surfaces when the response is parsed.

use std::ops::Range;

use serde_json::Value;

/// Upper bound on escaping layers peeled off a nested document.
const MAX_ESCAPE_DEPTH: usize = 4;

const DATA_KEY: &str = "data";

/// Rewrites `raw` so that a string-encoded `data` object or array becomes a
/// nested JSON value.
///
/// Responses whose `data` is already structured, empty, or a plain string
/// (such as an application status text) are returned unchanged, which makes
/// the function idempotent.
pub fn sanitize(raw: &str) -> String {
    let Some(value_start) = locate_data_string(raw) else {
        return raw.to_owned();
    };
    for span in string_value_candidates(raw, value_start) {
        let Some(nested) = decode_nested(&raw[span.clone()]) else {
            continue;
        };
        let Ok(rendered) = serde_json::to_string(&nested) else {
            continue;
        };
        tracing::debug!(
            escaped_len = span.len(),
            nested_len = rendered.len(),
            "unwrapped string-encoded data field"
        );
        let mut sanitized = String::with_capacity(raw.len());
        sanitized.push_str(&raw[..span.start]);
        sanitized.push_str(&rendered);
        sanitized.push_str(&raw[span.end..]);
        return sanitized;
    }
    tracing::debug!("data field left as a string");
    raw.to_owned()
}

// ---------------------------------------------------------------------------
// Locating the data field
// ---------------------------------------------------------------------------

/// Returns the byte offset of the opening quote of the top-level `data`
/// value, or `None` if there is no such key or its value is not a string.
fn locate_data_string(raw: &str) -> Option<usize> {
    let bytes = raw.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let end = string_end(bytes, i)?;
                if depth == 1 && &raw[i + 1..end] == DATA_KEY {
                    let colon = skip_whitespace(bytes, end + 1);
                    if bytes.get(colon) == Some(&b':') {
                        let value = skip_whitespace(bytes, colon + 1);
                        return (bytes.get(value) == Some(&b'"')).then_some(value);
                    }
                }
                i = end + 1;
            }
            b'{' | b'[' => {
                depth += 1;
                i += 1;
            }
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}

/// Index of the quote closing the string literal opened at `start`,
/// honouring backslash escapes.
fn string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    i
}

/// True when the byte after a top-level value at `i` ends that value: a
/// comma introducing the next key, or the closing brace.
fn closes_top_level_value(bytes: &[u8], i: usize) -> bool {
    let next = skip_whitespace(bytes, i);
    match bytes.get(next) {
        Some(b'}') => true,
        Some(b',') => bytes.get(skip_whitespace(bytes, next + 1)) == Some(&b'"'),
        _ => false,
    }
}

/// Candidate spans (quotes included) for the `data` string opened at `start`.
///
/// The escape-aware boundary comes first. When the nested document holds
/// bare quotes that boundary is wrong, so every `}"` / `]"` that is followed
/// by the next top-level key or the closing brace is offered as well.
fn string_value_candidates(raw: &str, start: usize) -> Vec<Range<usize>> {
    let bytes = raw.as_bytes();
    let mut candidates = Vec::new();
    if let Some(end) = string_end(bytes, start) {
        if closes_top_level_value(bytes, end + 1) {
            candidates.push(start..end + 1);
        }
    }
    if matches!(bytes.get(start + 1), Some(b'{' | b'[')) {
        for k in start + 2..bytes.len() {
            if bytes[k] == b'"'
                && matches!(bytes[k - 1], b'}' | b']')
                && closes_top_level_value(bytes, k + 1)
                && !candidates.iter().any(|c: &Range<usize>| c.end == k + 1)
            {
                candidates.push(start..k + 1);
            }
        }
    }
    candidates
}

// ---------------------------------------------------------------------------
// Collapsing escapes
// ---------------------------------------------------------------------------

/// Decodes a string literal (quotes included) into the object or array it
/// encodes, peeling off as many escaping layers as needed.
fn decode_nested(literal: &str) -> Option<Value> {
    let mut text = serde_json::from_str::<String>(literal)
        .unwrap_or_else(|_| literal[1..literal.len() - 1].to_owned());
    for _ in 0..MAX_ESCAPE_DEPTH {
        let trimmed = text.trim();
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => return Some(value),
            Ok(Value::String(inner)) => text = inner,
            Ok(_) => return None,
            Err(_) if !looks_structured(trimmed) => return None,
            Err(_) if trimmed.contains("\\\"") => text = unescape_once(trimmed),
            Err(_) => {
                return match serde_json::from_str::<Value>(&escape_bare_quotes(trimmed)) {
                    Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
                    _ => None,
                };
            }
        }
    }
    None
}

fn looks_structured(text: &str) -> bool {
    text.starts_with('{') || text.starts_with('[')
}

/// Removes one layer of backslash escaping (`\\` → `\`, `\"` → `"`, `\/` →
/// `/`). Other escape sequences, including `\uXXXX`, are kept as written so
/// the JSON parser still sees them.
fn unescape_once(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(escaped @ ('\\' | '"' | '/')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Escapes quotes that appear inside string values without an escape.
///
/// Inside a string, a quote closes it only when followed by a structural
/// character (`,` `:` `}` `]`) or the end of input; any other quote is taken
/// literally.
fn escape_bare_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut in_string = false;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' if in_string => {
                out.push(c);
                if let Some((_, escaped)) = chars.next() {
                    out.push(escaped);
                }
            }
            '"' if !in_string => {
                in_string = true;
                out.push(c);
            }
            '"' => {
                let rest = text[i + 1..].trim_start();
                if rest.is_empty() || rest.starts_with([',', ':', '}', ']']) {
                    in_string = false;
                    out.push(c);
                } else {
                    out.push_str("\\\"");
                }
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const UUID: &str = "0c82860dae904a4d87f8e5d87a5af840";

    fn data_of(sanitized: &str) -> Value {
        let parsed: Value = serde_json::from_str(sanitized).expect("sanitized JSON parses");
        parsed["data"].clone()
    }

    #[test]
    fn unwraps_singly_escaped_object() {
        let raw = format!(
            r#"{{"messages":"","debug":"","data":"{{\"rhlogin\":\"toolsjboss@gmail.com\",\"uuid\":\"{UUID}\"}}","api":"1.1.1","exit_code":0}}"#
        );
        let sanitized = sanitize(&raw);
        assert_eq!(
            sanitized,
            format!(
                r#"{{"messages":"","debug":"","data":{{"rhlogin":"toolsjboss@gmail.com","uuid":"{UUID}"}},"api":"1.1.1","exit_code":0}}"#
            )
        );
    }

    #[test]
    fn unwraps_double_encoded_object() {
        let raw = r#"{"data":"\"{\\\"carts\\\":[\\\"php-5.3\\\"]}\"","exit_code":0}"#;
        assert_eq!(data_of(&sanitize(raw))["carts"][0], "php-5.3");
    }

    #[test]
    fn collapses_over_escaped_quotes() {
        let raw = r#"{"data":"{\\\"rhlogin\\\":\\\"me\\\"}","exit_code":0}"#;
        assert_eq!(data_of(&sanitize(raw))["rhlogin"], "me");
    }

    #[test]
    fn recovers_quoted_ssh_key_comment() {
        let raw = r#"{"data":"{\"ssh_key\":\"AAAAB3Nza \\\"andre@localhost\\\"\"}","exit_code":0}"#;
        assert_eq!(
            data_of(&sanitize(raw))["ssh_key"],
            "AAAAB3Nza \"andre@localhost\""
        );
    }

    #[test]
    fn repairs_bare_quotes_in_nested_values() {
        let raw = r#"{"data":"{\"ssh_key\":\"AAAA \"my key\"\",\"uuid\":\"u\"}","exit_code":0}"#;
        let data = data_of(&sanitize(raw));
        assert_eq!(data["ssh_key"], "AAAA \"my key\"");
        assert_eq!(data["uuid"], "u");
    }

    #[test]
    fn unwraps_unescaped_nested_object() {
        let raw = r#"{"messages":"","data":"{"carts":["jbossas-7.0"]}","exit_code":0}"#;
        let sanitized = sanitize(raw);
        assert_eq!(
            sanitized,
            r#"{"messages":"","data":{"carts":["jbossas-7.0"]},"exit_code":0}"#
        );
    }

    #[rstest]
    #[case::structured(r#"{"data":{"uuid":"x"},"exit_code":0}"#)]
    #[case::empty(r#"{"messages":"","data":"","exit_code":0}"#)]
    #[case::status_text(r#"{"data":"Total Accesses: 3\nUptime: 12","exit_code":0}"#)]
    #[case::null(r#"{"data":null,"exit_code":1}"#)]
    #[case::no_data(r#"{"messages":"nothing","exit_code":0}"#)]
    #[case::nested_data_key(r#"{"result":{"data":"{\"a\":1}"},"exit_code":0}"#)]
    #[case::catastrophic(r#"{"data":"{\"a\":"#)]
    fn leaves_other_responses_unchanged(#[case] raw: &str) {
        assert_eq!(sanitize(raw), raw);
    }

    #[rstest]
    #[case::escaped(r#"{"data":"{\"uuid\":\"x\"}","exit_code":0}"#)]
    #[case::double(r#"{"data":"\"[1,2]\"","exit_code":0}"#)]
    #[case::bare_quotes(r#"{"data":"{\"k\":\"a \"b\"\"}","exit_code":0}"#)]
    #[case::plain(r#"{"data":"running","exit_code":0}"#)]
    fn is_idempotent(#[case] raw: &str) {
        let once = sanitize(raw);
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn keeps_unicode_escapes_in_nested_values() {
        let raw = r#"{"data":"{\"info\":\"caf\\u00e9\"}","exit_code":0}"#;
        assert_eq!(data_of(&sanitize(raw))["info"], "café");
    }
}
