//! Text-generation collaborator: client summaries, email drafts, next-action
//! suggestions and enquiry relevance triage.
//!
//! Callers use `Assistant`, which never fails: every provider error is
//! logged and replaced by a fixed fallback value.

pub mod assistant;
pub mod gemini;
pub mod prompts;
pub mod provider;

pub use assistant::*;
pub use gemini::GeminiProvider;
pub use provider::*;
