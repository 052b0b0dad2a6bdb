// Verification - per-lead check of a requirement against the business website

use serde::{Deserialize, Serialize};

use crate::lenient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub meets_requirement: bool,
    #[serde(default)]
    pub justification: String,
    /// Best-guess contact or application page.
    #[serde(default, deserialize_with = "lenient::string")]
    pub application_url: Option<String>,
}

impl VerificationResult {
    pub fn verdict(&self) -> &'static str {
        if self.meets_requirement {
            "Meets requirement"
        } else {
            "Does not meet requirement"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let json = r#"{"meetsRequirement": true, "justification": "Booking page lists online forms.", "applicationUrl": "https://example.com/book"}"#;
        let v: VerificationResult = serde_json::from_str(json).unwrap();
        assert!(v.meets_requirement);
        assert_eq!(v.application_url.as_deref(), Some("https://example.com/book"));
        assert_eq!(v.verdict(), "Meets requirement");
    }

    #[test]
    fn test_null_url_and_missing_justification() {
        let json = r#"{"meetsRequirement": false, "applicationUrl": null}"#;
        let v: VerificationResult = serde_json::from_str(json).unwrap();
        assert!(!v.meets_requirement);
        assert!(v.justification.is_empty());
        assert!(v.application_url.is_none());
    }

    #[test]
    fn test_missing_verdict_rejected() {
        assert!(serde_json::from_str::<VerificationResult>(r#"{"justification": "?"}"#).is_err());
    }
}
