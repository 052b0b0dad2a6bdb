//! Gemini API client and the AI gateway.
//!
//! This crate owns the wire contract with the Generative Language API
//! (`generateContent`) and the three prompt-driven operations built on it:
//! strategy suggestion, lead generation and requirement verification.
//!
//! Blocking calls only. No retries, no batching.

mod client;
mod error;
mod gateway;
pub mod prompts;

pub use client::{GeminiClient, GenerateOutput, GenerateRequest, Tool};
pub use error::{AiError, AiErrorKind, AiOperation};
pub use gateway::{parse_leads, parse_strategy, parse_verification, GeminiGateway, LeadGateway};
