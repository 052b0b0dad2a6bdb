// Configuration loading

pub mod ai;
pub mod settings;

pub use ai::{AIConfigStatus, AIDiagnostics, KeyLookup, KeySource, ResolvedAIConfig};
pub use settings::{AISettings, FormDefaults, Settings};
