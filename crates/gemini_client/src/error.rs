// AI gateway errors
//
// "The call failed" (MissingKey, Network, Api) and "the call worked but the
// content is unusable" (EmptyResponse, NoJson, Malformed) are reported
// differently; see AiError::is_format_error.

use std::fmt;

/// Which gateway operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiOperation {
    Strategy,
    Leads,
    Verification,
}

impl AiOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiOperation::Strategy => "strategy",
            AiOperation::Leads => "leads",
            AiOperation::Verification => "verification",
        }
    }

    /// Lead-in of the user-facing message
    fn failure_prefix(&self) -> &'static str {
        match self {
            AiOperation::Strategy => "The AI failed to generate a strategy",
            AiOperation::Leads => "An error occurred while fetching leads",
            AiOperation::Verification => "The AI failed to verify the requirement",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AiErrorKind {
    /// API key not configured
    MissingKey,
    /// Transport failure (DNS, TLS, timeout, connection reset)
    Network(String),
    /// Non-2xx response from the service
    Api { status: u16, message: String },
    /// 2xx response without any candidate text
    EmptyResponse,
    /// Text without the expected JSON container
    NoJson,
    /// JSON present but not in the expected shape
    Malformed(String),
}

impl AiErrorKind {
    /// Attach the operation that produced this failure.
    pub fn during(self, operation: AiOperation) -> AiError {
        AiError { operation, kind: self }
    }
}

impl fmt::Display for AiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiErrorKind::MissingKey => write!(f, "API key not configured"),
            AiErrorKind::Network(msg) => write!(f, "Network error: {}", msg),
            AiErrorKind::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            AiErrorKind::EmptyResponse => write!(f, "The AI returned an empty response. Please try again."),
            AiErrorKind::NoJson => write!(f, "The AI did not return a JSON result. Please try again."),
            AiErrorKind::Malformed(_) => write!(
                f,
                "The AI returned a response, but it was not in the expected format. Please try again."
            ),
        }
    }
}

/// A gateway failure scoped to the operation that triggered it.
#[derive(Debug, Clone, PartialEq)]
pub struct AiError {
    pub operation: AiOperation,
    pub kind: AiErrorKind,
}

impl AiError {
    /// True when the service answered but the content was unusable.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self.kind,
            AiErrorKind::EmptyResponse | AiErrorKind::NoJson | AiErrorKind::Malformed(_)
        )
    }
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.operation.failure_prefix())?;
        match (&self.kind, self.operation) {
            (AiErrorKind::NoJson, AiOperation::Leads) => write!(
                f,
                "The AI did not return a valid list. Please try a different query."
            ),
            (kind, _) => write!(f, "{}", kind),
        }
    }
}

impl std::error::Error for AiError {}
