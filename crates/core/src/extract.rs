//! Pull a JSON payload out of free-form model output.
//!
//! Grounded completions cannot be forced into JSON mode, so the model answers
//! with prose wrapped around the payload ("Here is the list: [...] Let me
//! know if ..."). Extraction first tries the widest span between the first
//! opening and the last closing delimiter. When that span does not parse
//! (two arrays, a stray bracket in trailing prose) it walks the text for
//! balanced top-level spans and returns the first one that deserializes.

use serde::de::DeserializeOwned;
use std::fmt;

/// Which JSON container to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    Array,
    Object,
}

impl Fragment {
    fn delimiters(self) -> (char, char) {
        match self {
            Fragment::Array => ('[', ']'),
            Fragment::Object => ('{', '}'),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// No opening/closing delimiter pair in the text.
    NotFound,
    /// A candidate span exists but does not deserialize.
    Malformed(String),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::NotFound => write!(f, "no JSON payload found in response"),
            ExtractError::Malformed(e) => write!(f, "malformed JSON payload: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extract and deserialize the first usable `fragment` in `text`.
pub fn extract_json<T: DeserializeOwned>(text: &str, fragment: Fragment) -> Result<T, ExtractError> {
    let (open, close) = fragment.delimiters();

    let start = text.find(open).ok_or(ExtractError::NotFound)?;
    let end = text.rfind(close).ok_or(ExtractError::NotFound)?;
    if end < start {
        return Err(ExtractError::NotFound);
    }

    let greedy = &text[start..=end];
    let first_error = match serde_json::from_str::<T>(greedy) {
        Ok(value) => return Ok(value),
        Err(e) => e.to_string(),
    };

    for span in balanced_spans(text, open, close) {
        if span.len() == greedy.len() {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<T>(span) {
            log::debug!("extract: greedy span rejected, used balanced span of {} bytes", span.len());
            return Ok(value);
        }
    }

    Err(ExtractError::Malformed(first_error))
}

/// Top-level spans whose delimiters balance, in order of appearance.
///
/// Brackets inside JSON strings are ignored. A span that never closes ends
/// the scan, since everything after it belongs to the truncated payload.
fn balanced_spans(text: &str, open: char, close: char) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut span_start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if depth == 0 {
            if c == open {
                depth = 1;
                span_start = i;
                in_string = false;
                escaped = false;
            }
            continue;
        }

        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    spans.push(&text[span_start..i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn array(text: &str) -> Result<Value, ExtractError> {
        extract_json::<Value>(text, Fragment::Array)
    }

    #[test]
    fn test_array_in_prose() {
        let text = "Sure! Here are the results:\n[{\"name\": \"A\"}, {\"name\": \"B\"}]\nHope this helps.";
        let v = array(text).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 2);
        assert_eq!(v[1]["name"], "B");
    }

    #[test]
    fn test_markdown_fence() {
        let text = "```json\n[{\"name\": \"Fenced\"}]\n```";
        assert_eq!(array(text).unwrap()[0]["name"], "Fenced");
    }

    #[test]
    fn test_nested_brackets() {
        let text = "Result: [{\"name\": \"A\", \"tags\": [\"x\", \"y\"]}] done";
        let v = array(text).unwrap();
        assert_eq!(v[0]["tags"][1], "y");
    }

    #[test]
    fn test_brackets_inside_strings() {
        let text = "[{\"name\": \"Cafe [closed] \\\"old\\\"\"}] and a stray ] here";
        let v = array(text).unwrap();
        assert_eq!(v[0]["name"], "Cafe [closed] \"old\"");
    }

    #[test]
    fn test_prose_bracket_before_payload() {
        let text = "Results [see below]: [{\"name\": \"A\"}]";
        let v = array(text).unwrap();
        assert_eq!(v[0]["name"], "A");
    }

    #[test]
    fn test_multiple_arrays_takes_first_valid() {
        let text = "First: [{\"name\": \"A\"}] and also [{\"name\": \"B\"}]";
        let v = array(text).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 1);
        assert_eq!(v[0]["name"], "A");
    }

    #[test]
    fn test_no_array_is_not_found() {
        assert_eq!(array("I could not find any businesses."), Err(ExtractError::NotFound));
        assert_eq!(array("only closing ] here"), Err(ExtractError::NotFound));
        assert_eq!(array("reversed ] then ["), Err(ExtractError::NotFound));
    }

    #[test]
    fn test_truncated_is_malformed() {
        let text = "[{\"name\": \"A\"}, {\"name\": \"B\", \"address\": \"12 Ma";
        // no closing bracket at all
        assert_eq!(array(text), Err(ExtractError::NotFound));

        let text = "[{\"name\": \"A\"}, {\"name\": \"B\", \"tags\": [\"x\"]";
        assert!(matches!(array(text), Err(ExtractError::Malformed(_))));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let text = "[{name: 'single quotes'}]";
        assert!(matches!(array(text), Err(ExtractError::Malformed(_))));
    }

    #[test]
    fn test_object_fragment() {
        let text = "Verdict follows {\"meetsRequirement\": true, \"justification\": \"ok {fine}\"} end";
        let v: Value = extract_json(text, Fragment::Object).unwrap();
        assert_eq!(v["meetsRequirement"], true);
        assert_eq!(v["justification"], "ok {fine}");
    }

    #[test]
    fn test_typed_mismatch_is_malformed() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Expect {
            required: u32,
        }
        let result = extract_json::<Expect>("{\"other\": 1}", Fragment::Object);
        assert!(matches!(result, Err(ExtractError::Malformed(_))));
    }

    #[test]
    fn test_balanced_spans() {
        let spans = balanced_spans("a [1] b [[2], 3] c [4", '[', ']');
        assert_eq!(spans, vec!["[1]", "[[2], 3]"]);
    }
}
