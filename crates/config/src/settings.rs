// Application settings
// Loaded from ~/.config/leadgen/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default Generative Language API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Overrides the config directory (used by tests and portable installs)
pub const CONFIG_DIR_ENV: &str = "LEADGEN_CONFIG_DIR";

/// AI-specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AISettings {
    /// Model identifier; empty = default
    pub model: String,

    /// API base URL; empty = default
    pub endpoint: String,

    /// HTTP timeout for one request, in seconds
    pub timeout_secs: u64,

    /// Ask the model for latitude/longitude so the globe view has data
    pub request_coordinates: bool,
}

impl Default for AISettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            endpoint: String::new(),
            timeout_secs: 60,
            request_coordinates: true,
        }
    }
}

impl AISettings {
    /// Get the effective model (user-specified or default)
    pub fn effective_model(&self) -> &str {
        let model = self.model.trim();
        if model.is_empty() {
            DEFAULT_MODEL
        } else {
            model
        }
    }

    /// Get the effective endpoint, without a trailing slash
    pub fn effective_endpoint(&self) -> &str {
        let endpoint = self.endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            DEFAULT_ENDPOINT
        } else {
            endpoint
        }
    }
}

/// Initial values of the lead form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormDefaults {
    pub business_type: String,
    pub location: String,
    pub count: u32,

    /// Position used for "use my location"; both must be set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_longitude: Option<f64>,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            business_type: "Boutique Hotels".to_string(),
            location: "Kyoto, Japan".to_string(),
            count: 10,
            home_latitude: None,
            home_longitude: None,
        }
    }
}

impl FormDefaults {
    pub fn home(&self) -> Option<(f64, f64)> {
        Some((self.home_latitude?, self.home_longitude?))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ai: AISettings,
    pub form: FormDefaults,
}

impl Settings {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return PathBuf::from(dir);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("leadgen")
    }

    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path; a missing file is created with defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            create_default_file(path);
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("error parsing {}: {}; using default settings", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON, ignoring lines that start with `//`
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    /// Save current settings to disk (comments are not preserved)
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

const DEFAULT_CONFIG: &str = r#"{
    // Gemini access
    // The API key is read from the system keychain, LEADGEN_GEMINI_KEY or API_KEY.
    // It is never stored in this file.
    "ai": {
        "model": "gemini-2.5-flash",
        "endpoint": "https://generativelanguage.googleapis.com",
        "timeout_secs": 60,
        // Ask for latitude/longitude per lead (needed by the globe view)
        "request_coordinates": true
    },

    // Lead form defaults
    // Set home_latitude/home_longitude to enable "use my location".
    "form": {
        "business_type": "Boutique Hotels",
        "location": "Kyoto, Japan",
        "count": 10
    }
}
"#;

/// Create default settings file with comments
fn create_default_file(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            log::warn!("error creating config directory: {}", e);
            return;
        }
    }

    if let Err(e) = fs::write(path, DEFAULT_CONFIG) {
        log::warn!("error writing default settings.json: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_parses_to_defaults() {
        let parsed = Settings::parse(DEFAULT_CONFIG).unwrap();
        let mut expected = Settings::default();
        expected.ai.model = DEFAULT_MODEL.to_string();
        expected.ai.endpoint = DEFAULT_ENDPOINT.to_string();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let parsed = Settings::parse(r#"{ "form": { "count": 25 } }"#).unwrap();
        assert_eq!(parsed.form.count, 25);
        assert_eq!(parsed.form.location, "Kyoto, Japan");
        assert_eq!(parsed.ai.timeout_secs, 60);
        assert!(parsed.ai.request_coordinates);
    }

    #[test]
    fn test_effective_values() {
        let mut ai = AISettings::default();
        assert_eq!(ai.effective_model(), DEFAULT_MODEL);
        assert_eq!(ai.effective_endpoint(), DEFAULT_ENDPOINT);
        ai.model = "gemini-2.5-pro".into();
        ai.endpoint = "http://127.0.0.1:9000/".into();
        assert_eq!(ai.effective_model(), "gemini-2.5-pro");
        assert_eq!(ai.effective_endpoint(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_home_requires_both() {
        let mut form = FormDefaults::default();
        assert_eq!(form.home(), None);
        form.home_latitude = Some(35.0);
        assert_eq!(form.home(), None);
        form.home_longitude = Some(135.7);
        assert_eq!(form.home(), Some((35.0, 135.7)));
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings::load_from(&path);
        assert_eq!(settings, Settings::default());
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("// Gemini access"));
    }

    #[test]
    fn test_load_invalid_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::default();
        settings.form.home_latitude = Some(51.5);
        settings.form.home_longitude = Some(-0.12);
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }
}
