// JSON export

use std::path::Path;

use leadgen_core::Lead;

use crate::csv::ExportError;

/// Pretty-printed JSON array of leads (camelCase keys, missing values omitted).
pub fn to_json(leads: &[Lead]) -> Result<String, ExportError> {
    serde_json::to_string_pretty(leads).map_err(|e| ExportError::Io(e.to_string()))
}

/// Export leads as a JSON array. Unlike CSV an empty list is written as `[]`.
pub fn export(leads: &[Lead], path: &Path) -> Result<(), ExportError> {
    let text = to_json(leads)?;
    std::fs::write(path, text).map_err(|e| ExportError::Io(format!("{}: {}", path.display(), e)))?;
    log::info!("exported {} leads to {}", leads.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadgen_core::{decorate, RawLead};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_export_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leads.json");

        let leads = decorate(vec![RawLead {
            name: "Hotel Kanra".into(),
            address: "Kyoto".into(),
            rating: Some(4.6),
            reviews_count: Some(980),
            ..Default::default()
        }]);
        export(&leads, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed[0]["id"], 0);
        assert_eq!(parsed[0]["reviewsCount"], 980);
        assert_eq!(parsed[0]["status"], "New");
        assert!(parsed[0].get("phone").is_none());
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(to_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_export_matches_to_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.json");
        export(&[], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }
}
