//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for the conversation chain.
//!
//! Template loading chain:
//! 1. `{prompts.dir}/{name}.pmt` (user override, `.chatagent/prompts` by default)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{ChatContext, PromptError, PromptLoader, SummaryContext};
