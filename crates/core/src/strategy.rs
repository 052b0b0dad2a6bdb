// Strategy - AI-suggested targeting used to pre-fill the lead form

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub business_type: String,
    pub locations: Vec<String>,
    /// The model sometimes answers with a list; it is joined with ", ".
    #[serde(deserialize_with = "requirements_text")]
    pub requirements: String,
}

/// Values copied into the lead form when a strategy is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPrefill {
    pub business_type: String,
    pub location: String,
    pub requirements: String,
}

impl Strategy {
    pub fn to_prefill(&self) -> FormPrefill {
        FormPrefill {
            business_type: self.business_type.clone(),
            location: self.locations.join(", "),
            requirements: self.requirements.clone(),
        }
    }
}

fn requirements_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Array(items) => Ok(items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")),
        other => Err(serde::de::Error::custom(format!(
            "requirements must be a string, got {}",
            other
        ))),
    }
}
