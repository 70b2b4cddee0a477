//! Payload extraction from noisy generator output
//!
//! The generator script interleaves progress logging with its JSON result on
//! stdout, so the stream cannot be parsed as a whole. This scanner walks the
//! text tracking brace depth and string state, collects every balanced
//! top-level `{...}` span, and returns the last one that parses as JSON.

use serde_json::Value;

/// Extract the final complete top-level JSON object from mixed output.
pub fn extract_json_object(output: &str) -> Option<Value> {
    let mut result = None;
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in output.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            } else if ch == '\n' && depth == 0 {
                // Outside an object the quote came from log noise; noise is
                // line-oriented, so an unpaired quote must not swallow the
                // payload on later lines
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        let candidate = &output[s..=i];
                        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                            result = Some(value);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object() {
        let value = extract_json_object(r#"{"success": true}"#).unwrap();
        assert_eq!(value["success"], true);
    }

    #[test]
    fn test_log_noise_around_payload() {
        let output = "Loading model weights...\n[gen] chapter 1 of 3\n{\"success\": true, \"id\": \"abc\"}\ndone in 42s\n";
        let value = extract_json_object(output).unwrap();
        assert_eq!(value["id"], "abc");
    }

    #[test]
    fn test_last_object_wins() {
        let output = r#"{"success": false} retrying... {"success": true, "id": "second"}"#;
        let value = extract_json_object(output).unwrap();
        assert_eq!(value["id"], "second");
    }

    #[test]
    fn test_braces_inside_strings() {
        let output = r#"progress {1/3} {"story": {"text": "a } inside \" and { too"}, "success": true}"#;
        let value = extract_json_object(output).unwrap();
        assert_eq!(value["story"]["text"], "a } inside \" and { too");
    }

    #[test]
    fn test_quoted_brace_in_log_noise() {
        let output = "log says \"{\" weird\n{\"success\": true, \"id\": \"abc\", \"story\": {}, \"quiz\": {}, \"summary\": {}}\n";
        let value = extract_json_object(output).unwrap();
        assert_eq!(value["id"], "abc");
    }

    #[test]
    fn test_unpaired_quote_in_noise_line() {
        let output = "done in 42\"s\n{\"success\": true, \"id\": \"xyz\"}\n";
        let value = extract_json_object(output).unwrap();
        assert_eq!(value["id"], "xyz");
    }

    #[test]
    fn test_unbalanced_returns_none() {
        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object(r#"{"truncated": "#).is_none());
    }
}
