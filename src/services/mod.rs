//! Business logic services
//!
//! The analysis pipeline and its collaborators. `EntryAnalyzer` drives
//! the whole sequence; the submodules each own one step.

pub mod analyzer;
pub mod context;
pub mod fallback;
pub mod generation;
pub mod interpreter;
pub mod prompt;

pub use analyzer::EntryAnalyzer;
pub use context::{recent_context, NO_HISTORY_SENTINEL};
pub use fallback::{fallback_analysis, normalize_mood};
pub use generation::{
    GeminiClient, GenerationClient, GenerationError, MockGenerationClient,
    DEFAULT_MODEL_FALLBACKS,
};
pub use interpreter::{interpret, InterpretationError};
pub use prompt::{build_analysis_prompt, DEFAULT_PERSONA};
