//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                               |
//! |---------|-----------|-------------------------------------------|
//! | 0       | Universal | Success                                   |
//! | 1       | Universal | General error (unspecified)               |
//! | 2       | Universal | CLI usage error (bad args, blank input)   |
//! | 10-19   | ai config | API key and keychain                      |
//! | 20-29   | gateway   | Gemini calls: transport, service, content |
//! | 30-39   | export    | CSV/JSON export                           |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use leadgen_gemini::{AiError, AiErrorKind};
use leadgen_io::ExportError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure (terminal setup, stdout closed).
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, blank required input.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// AI configuration (10-19)
// =============================================================================

/// No Gemini API key in keychain or environment. Fatal for every AI command.
pub const EXIT_AI_MISSING_KEY: u8 = 11;

/// Keychain error (cannot read/write credentials).
pub const EXIT_AI_KEYCHAIN_ERR: u8 = 12;

// =============================================================================
// Gateway (20-29)
// =============================================================================

/// The call itself failed: DNS, TLS, connection, timeout.
pub const EXIT_AI_NETWORK: u8 = 20;

/// The service answered with a non-2xx status (bad key, quota, model name).
pub const EXIT_AI_SERVICE: u8 = 21;

/// The call worked but the content was unusable (no JSON, wrong shape, empty).
pub const EXIT_AI_FORMAT: u8 = 22;

// =============================================================================
// Export (30-39)
// =============================================================================

/// Export requested but there are no leads.
pub const EXIT_EXPORT_EMPTY: u8 = 30;

/// Export file could not be written.
pub const EXIT_EXPORT_IO: u8 = 31;

// =============================================================================
// Mapping
// =============================================================================

pub fn ai_exit_code(err: &AiError) -> u8 {
    match err.kind {
        AiErrorKind::MissingKey => EXIT_AI_MISSING_KEY,
        AiErrorKind::Network(_) => EXIT_AI_NETWORK,
        AiErrorKind::Api { .. } => EXIT_AI_SERVICE,
        AiErrorKind::EmptyResponse | AiErrorKind::NoJson | AiErrorKind::Malformed(_) => EXIT_AI_FORMAT,
    }
}

pub fn export_exit_code(err: &ExportError) -> u8 {
    match err {
        ExportError::NothingToExport => EXIT_EXPORT_EMPTY,
        ExportError::Io(_) => EXIT_EXPORT_IO,
    }
}
