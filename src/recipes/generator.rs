//! RecipeGenerator — turns a profile into recipe text.
//!
//! Failure containment for the generation capability lives here: any
//! error becomes `GENERATION_FALLBACK` and is never shown raw to the user.

use std::sync::Arc;

use crate::intake::model::SubjectProfile;
use crate::llm::TextGenerator;

use super::prompt::build_prompt;

/// User-facing text returned when generation fails.
pub const GENERATION_FALLBACK: &str =
    "❌ Erro ao gerar receitas. Tente novamente em alguns segundos.";

/// Generation Adapter over an external `TextGenerator`.
pub struct RecipeGenerator {
    llm: Arc<dyn TextGenerator>,
}

impl RecipeGenerator {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    /// Generate recipes for `profile`. Never fails; no retry.
    pub async fn generate(&self, profile: &SubjectProfile) -> String {
        let prompt = build_prompt(profile);
        match self.llm.generate(&prompt).await {
            Ok(text) => {
                tracing::info!(
                    identity = %profile.identity,
                    model = self.llm.model_name(),
                    chars = text.len(),
                    "Recipes generated"
                );
                text
            }
            Err(e) => {
                tracing::warn!(
                    identity = %profile.identity,
                    model = self.llm.model_name(),
                    "Recipe generation failed, sending fallback: {}",
                    e
                );
                GENERATION_FALLBACK.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::LlmError;

    struct RecordingLlm {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for RecordingLlm {
        fn model_name(&self) -> &str {
            "recording"
        }

        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("🍽️ *RECEITA 1: Bolinho*".to_string())
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl TextGenerator for FailingLlm {
        fn model_name(&self) -> &str {
            "failing"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::RequestFailed {
                provider: "test".into(),
                reason: "boom".into(),
            })
        }
    }

    #[tokio::test]
    async fn passes_built_prompt_and_returns_text() {
        let llm = Arc::new(RecordingLlm {
            prompts: Mutex::new(Vec::new()),
        });
        let generator = RecipeGenerator::new(llm.clone());

        let mut profile = SubjectProfile::new("1");
        profile.child_name = Some("Maria".into());

        let text = generator.generate(&profile).await;
        assert_eq!(text, "🍽️ *RECEITA 1: Bolinho*");

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0], build_prompt(&profile));
    }

    #[tokio::test]
    async fn failure_yields_fallback() {
        let generator = RecipeGenerator::new(Arc::new(FailingLlm));
        let text = generator.generate(&SubjectProfile::new("1")).await;
        assert_eq!(text, GENERATION_FALLBACK);
        assert!(!text.contains("boom"));
    }
}
