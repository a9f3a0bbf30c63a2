//! Deterministic recipe prompt built from a subject profile.

use crate::intake::model::SubjectProfile;

const DEFAULT_CHILD_NAME: &str = "Criança";
const DEFAULT_CHILD_AGE: u8 = 3;
const DEFAULT_ACCEPTED_FOODS: &str = "nugget, macarrão";
const DEFAULT_REJECTED_FOODS: &str = "vegetais verdes";

/// Fixed preamble: persona, child-safety rules, and the output template.
/// `{context}` is replaced with the child section.
const PROMPT_TEMPLATE: &str = "\
Você é NutriKids, especialista em receitas para crianças seletivas de 2 a 5 anos.

REGRAS DE SEGURANÇA (OBRIGATÓRIAS):
1. Nunca use mel para crianças com menos de 2 anos
2. Nunca use oleaginosas inteiras; apenas trituradas
3. No máximo 1 colher de sopa de açúcar por receita
4. Pouco sal
5. Sempre oriente cortar os alimentos em pedaços pequenos
6. Prefira assado ou cozido em vez de frito

CONTEXTO DA CRIANÇA:
{context}

Crie exatamente 3 receitas que a criança VAI ACEITAR, partindo do que ela JÁ COME.

FORMATO DA RESPOSTA (repita para cada uma das 3 receitas):

🍽️ *RECEITA N: [Nome divertido]*

📝 *Ingredientes:*
• [ingrediente com medida caseira, fácil de achar no mercado]

👩‍🍳 *Modo de preparo:*
1. [passo simples, com tempo]

🎨 *Dica de apresentação:*
[como servir para a criança aceitar]

⏰ *Tempo:* [no máximo 20 min]
💡 *Truque:* [como esconder nutrientes]

---

Termine com: ⚠️ Sempre supervisione crianças durante as refeições. Consulte o pediatra para restrições específicas.";

/// Render the child section, substituting defaults for unset attributes.
fn child_context(profile: &SubjectProfile) -> String {
    let name = profile.child_name.as_deref().unwrap_or(DEFAULT_CHILD_NAME);
    let age = profile.child_age.unwrap_or(DEFAULT_CHILD_AGE);
    let accepted = profile
        .accepted_foods
        .as_deref()
        .unwrap_or(DEFAULT_ACCEPTED_FOODS);
    let rejected = profile
        .rejected_foods
        .as_deref()
        .unwrap_or(DEFAULT_REJECTED_FOODS);

    format!("Criança: {name}, {age} anos\nACEITA: {accepted}\nRECUSA: {rejected}")
}

/// Build the full generation prompt for a profile.
pub fn build_prompt(profile: &SubjectProfile) -> String {
    PROMPT_TEMPLATE.replace("{context}", &child_context(profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_profile_attributes() {
        let mut profile = SubjectProfile::new("1");
        profile.child_name = Some("Maria".into());
        profile.child_age = Some(4);
        profile.accepted_foods = Some("arroz, frango".into());
        profile.rejected_foods = Some("cenoura".into());

        let prompt = build_prompt(&profile);
        assert!(prompt.contains("Criança: Maria, 4 anos"));
        assert!(prompt.contains("ACEITA: arroz, frango"));
        assert!(prompt.contains("RECUSA: cenoura"));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn prompt_uses_defaults_for_missing_fields() {
        let prompt = build_prompt(&SubjectProfile::new("1"));
        assert!(prompt.contains("Criança: Criança, 3 anos"));
        assert!(prompt.contains("ACEITA: nugget, macarrão"));
        assert!(prompt.contains("RECUSA: vegetais verdes"));
    }

    #[test]
    fn prompt_carries_safety_rules_and_format() {
        let prompt = build_prompt(&SubjectProfile::new("1"));
        assert!(prompt.contains("mel"));
        assert!(prompt.contains("oleaginosas inteiras"));
        assert!(prompt.contains("açúcar"));
        assert!(prompt.contains("pedaços pequenos"));
        assert!(prompt.contains("exatamente 3 receitas"));
        assert!(prompt.contains("*Tempo:*"));
        assert!(prompt.contains("*Truque:*"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let mut profile = SubjectProfile::new("1");
        profile.child_name = Some("Leo".into());
        assert_eq!(build_prompt(&profile), build_prompt(&profile.clone()));
    }
}
