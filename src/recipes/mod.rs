//! Recipe generation — prompt template plus the adapter around the
//! text-generation capability.

pub mod generator;
pub mod prompt;

pub use generator::{GENERATION_FALLBACK, RecipeGenerator};
pub use prompt::build_prompt;
