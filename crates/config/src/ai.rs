// AI configuration and secrets management
//
// The Gemini API key is looked up in:
// 1. System keychain (preferred)
// 2. LEADGEN_GEMINI_KEY
// 3. API_KEY (shared with other Gemini tooling)
//
// Keys are NEVER stored in settings.json

use std::env;
use std::time::Duration;

use crate::settings::{AISettings, Settings};

/// Service name for keychain storage
const KEYCHAIN_SERVICE: &str = "leadgen";

/// Keychain account for the Gemini key
const KEYCHAIN_ACCOUNT: &str = "ai/gemini";

/// Environment variables checked after the keychain, in order
pub const KEY_ENV_VARS: [&str; 2] = ["LEADGEN_GEMINI_KEY", "API_KEY"];

/// Provider name shown in diagnostics
pub const PROVIDER: &str = "gemini";

/// Source of an API key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Key retrieved from system keychain
    Keychain,
    /// Key retrieved from the named environment variable
    Environment(&'static str),
    /// No key found
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Keychain => "keychain",
            KeySource::Environment(_) => "environment",
            KeySource::None => "none",
        }
    }

    /// "environment (API_KEY)" style label
    pub fn describe(&self) -> String {
        match self {
            KeySource::Environment(var) => format!("environment ({})", var),
            other => other.as_str().to_string(),
        }
    }
}

/// Result of key lookup
#[derive(Debug, Clone)]
pub struct KeyLookup {
    pub key: Option<String>,
    pub source: KeySource,
}

impl KeyLookup {
    fn missing() -> Self {
        KeyLookup {
            key: None,
            source: KeySource::None,
        }
    }
}

/// Get the Gemini API key
pub fn get_api_key() -> KeyLookup {
    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT) {
            if let Ok(key) = entry.get_password() {
                if !key.trim().is_empty() {
                    return KeyLookup {
                        key: Some(key.trim().to_string()),
                        source: KeySource::Keychain,
                    };
                }
            }
        }
    }

    lookup_env(&KEY_ENV_VARS)
}

/// First non-empty variable among `names`
pub fn lookup_env(names: &[&'static str]) -> KeyLookup {
    for name in names {
        if let Ok(key) = env::var(name) {
            let key = key.trim();
            if !key.is_empty() {
                return KeyLookup {
                    key: Some(key.to_string()),
                    source: KeySource::Environment(name),
                };
            }
        }
    }
    KeyLookup::missing()
}

/// Store the API key in the system keychain
#[cfg(feature = "keychain")]
pub fn set_api_key(key: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)
        .map_err(|e| format!("Failed to create keychain entry: {}", e))?;

    entry
        .set_password(key)
        .map_err(|e| format!("Failed to store key in keychain: {}", e))
}

#[cfg(not(feature = "keychain"))]
pub fn set_api_key(_key: &str) -> Result<(), String> {
    Err("Keychain support not enabled. Set LEADGEN_GEMINI_KEY environment variable instead.".to_string())
}

/// Delete the API key from the system keychain
#[cfg(feature = "keychain")]
pub fn delete_api_key() -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)
        .map_err(|e| format!("Failed to access keychain entry: {}", e))?;

    entry
        .delete_credential()
        .map_err(|e| format!("Failed to delete key from keychain: {}", e))
}

#[cfg(not(feature = "keychain"))]
pub fn delete_api_key() -> Result<(), String> {
    Err("Keychain support not enabled.".to_string())
}

/// Check if keychain support is available
pub fn keychain_available() -> bool {
    #[cfg(feature = "keychain")]
    {
        keyring::Entry::new(KEYCHAIN_SERVICE, "probe").is_ok()
    }
    #[cfg(not(feature = "keychain"))]
    {
        false
    }
}

// ============================================================================
// Resolved AI Configuration (single source of truth)
// ============================================================================

/// The effective AI configuration, fully resolved from all sources.
#[derive(Debug, Clone)]
pub struct ResolvedAIConfig {
    pub model: String,
    /// Base URL without trailing slash
    pub endpoint: String,
    pub timeout: Duration,
    /// Ask for per-lead coordinates in the lead prompt
    pub request_coordinates: bool,
    pub api_key: Option<String>,
    pub key_source: KeySource,
    pub status: AIConfigStatus,
    /// Human-readable reason if not ready
    pub blocking_reason: Option<String>,
}

/// Status of the AI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AIConfigStatus {
    Ready,
    /// No API key anywhere; every AI call is refused
    MissingKey,
}

impl AIConfigStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::MissingKey => "missing_key",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl ResolvedAIConfig {
    /// Resolve from settings, looking the key up in keychain and environment.
    pub fn from_settings(settings: &AISettings) -> Self {
        Self::with_key(settings, get_api_key())
    }

    /// Resolve from settings with an already looked-up key.
    pub fn with_key(settings: &AISettings, lookup: KeyLookup) -> Self {
        let (status, blocking_reason) = match lookup.key {
            Some(_) => (AIConfigStatus::Ready, None),
            None => (
                AIConfigStatus::MissingKey,
                Some(format!(
                    "No API key found. Store one with `leadgen ai set-key` or set {}",
                    KEY_ENV_VARS.join(" or ")
                )),
            ),
        };

        Self {
            model: settings.effective_model().to_string(),
            endpoint: settings.effective_endpoint().to_string(),
            timeout: Duration::from_secs(settings.timeout_secs.max(1)),
            request_coordinates: settings.request_coordinates,
            api_key: lookup.key,
            key_source: lookup.source,
            status,
            blocking_reason,
        }
    }

    /// Load settings and resolve in one call (convenience method)
    pub fn load() -> Self {
        let settings = Settings::load();
        Self::from_settings(&settings.ai)
    }

    /// Point at another endpoint (mock servers, proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }
}

// ============================================================================
// Diagnostics (for CLI doctor and debugging)
// ============================================================================

/// Diagnostic information about AI configuration
#[derive(Debug)]
pub struct AIDiagnostics {
    pub provider: String,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub request_coordinates: bool,
    pub status: AIConfigStatus,
    pub key_present: bool,
    pub key_source: KeySource,
    pub keychain_available: bool,
    pub config_path: String,
}

impl AIDiagnostics {
    pub fn from_resolved(config: &ResolvedAIConfig) -> Self {
        Self {
            provider: PROVIDER.to_string(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            timeout_secs: config.timeout.as_secs(),
            request_coordinates: config.request_coordinates,
            status: config.status,
            key_present: config.api_key.is_some(),
            key_source: config.key_source.clone(),
            keychain_available: keychain_available(),
            config_path: Settings::config_path_display(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "schema_version": 1,
            "status": self.status.as_str(),
            "provider": self.provider,
            "model": self.model,
            "endpoint": self.endpoint,
            "timeout_secs": self.timeout_secs,
            "request_coordinates": self.request_coordinates,
            "key": if self.key_present { "present" } else { "missing" },
            "key_source": self.key_source.describe(),
            "keychain": if self.keychain_available { "ok" } else { "unavailable" },
            "config_path": self.config_path,
        })
    }
}

impl std::fmt::Display for AIDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "AI Configuration")?;
        writeln!(f, "──────────────────────────────")?;
        writeln!(f, "Provider:          {}", self.provider)?;
        writeln!(f, "Status:            {}", self.status.as_str())?;
        writeln!(f, "Model:             {}", self.model)?;
        writeln!(f, "Endpoint:          {}", self.endpoint)?;
        writeln!(f, "Timeout:           {}s", self.timeout_secs)?;
        writeln!(f, "Coordinates:       {}", if self.request_coordinates { "requested" } else { "off" })?;
        writeln!(f, "Key present:       {}", if self.key_present { "yes" } else { "no" })?;
        writeln!(f, "Key source:        {}", self.key_source.describe())?;
        writeln!(f, "Keychain available:{}", if self.keychain_available { "yes" } else { "no" })?;
        writeln!(f, "Settings file:     {}", self.config_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_lookup_from_env() {
        env::set_var("LEADGEN_TEST_KEY_PRIMARY", "");
        env::set_var("LEADGEN_TEST_KEY_FALLBACK", "  test-key-123 ");

        let lookup = lookup_env(&["LEADGEN_TEST_KEY_PRIMARY", "LEADGEN_TEST_KEY_FALLBACK"]);
        assert_eq!(lookup.source, KeySource::Environment("LEADGEN_TEST_KEY_FALLBACK"));
        assert_eq!(lookup.key, Some("test-key-123".to_string()));

        env::remove_var("LEADGEN_TEST_KEY_PRIMARY");
        env::remove_var("LEADGEN_TEST_KEY_FALLBACK");
    }

    #[test]
    fn test_key_lookup_missing() {
        let lookup = lookup_env(&["LEADGEN_TEST_NONEXISTENT_XYZ"]);
        assert_eq!(lookup.source, KeySource::None);
        assert!(lookup.key.is_none());
    }

    #[test]
    fn test_resolve_missing_key() {
        let config = ResolvedAIConfig::with_key(&AISettings::default(), KeyLookup::missing());
        assert_eq!(config.status, AIConfigStatus::MissingKey);
        assert!(config.blocking_reason.unwrap().contains("LEADGEN_GEMINI_KEY"));
        assert_eq!(config.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_resolve_ready() {
        let mut settings = AISettings::default();
        settings.timeout_secs = 0;
        let lookup = KeyLookup {
            key: Some("k".into()),
            source: KeySource::Environment("API_KEY"),
        };
        let config = ResolvedAIConfig::with_key(&settings, lookup).with_endpoint("http://127.0.0.1:1/");
        assert!(config.status.is_ready());
        assert_eq!(config.timeout, Duration::from_secs(1));
        assert_eq!(config.endpoint, "http://127.0.0.1:1");
        assert_eq!(config.key_source.describe(), "environment (API_KEY)");
    }

    #[cfg(feature = "keychain")]
    #[test]
    fn test_linux_keychain_backend_is_persistent() {
        // The plain keyutils backend loses the key at logout
        let manifest = include_str!("../Cargo.toml");
        assert!(manifest.contains("\"linux-native-sync-persistent\""));
        assert!(!manifest.contains("\"linux-native\""));
    }

    #[test]
    fn test_diagnostics_display() {
        let config = ResolvedAIConfig::with_key(&AISettings::default(), KeyLookup::missing());
        let diag = AIDiagnostics::from_resolved(&config);
        let text = diag.to_string();
        assert!(text.contains("Status:            missing_key"));
        assert!(text.contains("Key present:       no"));
        assert_eq!(diag.to_json()["key"], "missing");
    }
}
