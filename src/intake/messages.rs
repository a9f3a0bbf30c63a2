//! User-facing text for the intake conversation.
//!
//! All text is Portuguese and written for Telegram's legacy Markdown
//! (`*bold*`, `_italic_`). Replies that contain user-supplied text or
//! URLs go out as plain text so stray markup cannot break them.

use crate::channels::OutgoingResponse;
use crate::config::SubscriptionOffer;

use super::model::SubjectProfile;

pub const BUTTON_GENERATE: &str = "🍳 Gerar Receitas";
pub const BUTTON_STATUS: &str = "📊 Meu Status";
pub const BUTTON_SUBSCRIBE: &str = "⭐ Assinar PRO";
pub const BUTTON_HELP: &str = "❓ Ajuda";

/// Reply keyboard shown with the welcome message, two buttons per row.
pub fn menu_keyboard() -> Vec<Vec<String>> {
    vec![
        vec![BUTTON_GENERATE.to_string(), BUTTON_STATUS.to_string()],
        vec![BUTTON_SUBSCRIBE.to_string(), BUTTON_HELP.to_string()],
    ]
}

// ── Onboarding ──────────────────────────────────────────────────────

pub fn welcome(user_name: &str, offer: &SubscriptionOffer, trial_limit: u32) -> OutgoingResponse {
    OutgoingResponse::markdown(format!(
        "🧸 *Olá, {user_name}!*\n\n\
         Bem-vindo ao *NutriKids* - seu assistente de receitas infantis com IA!\n\n\
         *Como funciono:*\n\
         1️⃣ Você me diz o nome e idade da criança\n\
         2️⃣ Me conta o que ela come e não come\n\
         3️⃣ Eu crio receitas personalizadas que ela VAI aceitar!\n\n\
         *Planos:*\n\
         🆓 *Grátis:* {trial_limit} receitas para testar\n\
         ⭐ *PRO:* Receitas ilimitadas - {price}/mês\n\n\
         *Vamos começar?*\n\
         Me diga o nome e idade do seu pequeno(a).\n\n\
         _Exemplo: Maria, 3 anos_",
        price = offer.price_label(),
    ))
    .with_keyboard(menu_keyboard())
}

pub fn ask_identity() -> OutgoingResponse {
    OutgoingResponse::markdown(
        "*Vamos começar!*\n\n\
         Me diga o nome e idade do seu pequeno(a).\n\n\
         _Exemplo: João, 3 anos_",
    )
}

pub fn identity_format_error() -> OutgoingResponse {
    OutgoingResponse::markdown(
        "❌ Formato incorreto.\n\n*Use:* Nome, idade\n_Exemplo: Maria, 3 anos_",
    )
}

pub fn age_out_of_range() -> OutgoingResponse {
    OutgoingResponse::text(
        "⚠️ No momento, atendemos crianças de 2 a 5 anos.\n\n\
         Para outras idades, consulte um nutricionista infantil.",
    )
}

pub fn ask_accepted_foods(child_name: &str) -> OutgoingResponse {
    OutgoingResponse::markdown(format!(
        "✅ Ótimo! Vou criar receitas especiais para *{child_name}*!\n\n\
         Agora me conta:\n\
         *O que {child_name} GOSTA de comer?*\n\n\
         _Exemplo: nugget, macarrão, batata frita, pão_\n\n\
         💡 Dica: Liste tudo que ela aceita bem, mesmo que não seja \"saudável\"."
    ))
}

pub fn ask_rejected_foods(child_name: &str) -> OutgoingResponse {
    OutgoingResponse::markdown(format!(
        "Perfeito! Agora me diga:\n\n\
         *O que {child_name} NÃO come de jeito nenhum?*\n\n\
         _Exemplo: brócolis, cenoura, carne vermelha, feijão_\n\n\
         Assim posso criar receitas que funcionam de verdade! 😊"
    ))
}

/// Reminder sent when the current step got an empty line.
pub fn food_list_required(child_name: &str, accepted: bool) -> OutgoingResponse {
    if accepted {
        OutgoingResponse::markdown(format!(
            "Me conte *o que {child_name} GOSTA de comer*, separando por vírgulas."
        ))
    } else {
        OutgoingResponse::markdown(format!(
            "Me conte *o que {child_name} NÃO come*, separando por vírgulas."
        ))
    }
}

pub fn new_cycle(child_name: &str) -> OutgoingResponse {
    OutgoingResponse::markdown(format!(
        "🔄 Vamos atualizar as preferências de *{child_name}*!\n\n\
         *O que {child_name} GOSTA de comer agora?*\n\n\
         _Exemplo: nugget, macarrão, batata frita, pão_"
    ))
}

pub fn setup_first() -> OutgoingResponse {
    OutgoingResponse::text(
        "❌ Primeiro você precisa configurar as preferências!\n\nUse /start",
    )
}

// ── Generation ──────────────────────────────────────────────────────

pub fn preparing_recipes(child_name: &str) -> OutgoingResponse {
    OutgoingResponse::markdown(format!(
        "🍳 Preparando receitas especiais para *{child_name}*...\n\n\
         ⏰ Aguarde 10-15 segundos..."
    ))
}

pub fn generating_more() -> OutgoingResponse {
    OutgoingResponse::text("🍳 Gerando mais receitas...")
}

/// Wrap generated (or fallback) recipe text.
pub fn recipes(text: String) -> OutgoingResponse {
    OutgoingResponse::markdown(text)
}

pub fn trial_remaining(remaining: u32, limit: u32) -> OutgoingResponse {
    OutgoingResponse::markdown(format!(
        "💡 *Receitas gratuitas restantes:* {remaining}/{limit}\n\n\
         Digite 'mais' para gerar novas receitas!"
    ))
}

pub fn last_free_recipe() -> OutgoingResponse {
    OutgoingResponse::markdown(
        "🎁 Essa foi sua última receita gratuita!\n\n\
         Assine para continuar gerando receitas ilimitadas!\n\
         Use: /assinar",
    )
}

pub fn subscriber_more_hint() -> OutgoingResponse {
    OutgoingResponse::markdown(
        "✨ Quer mais receitas? Digite *mais*!\n📊 Ver progresso? Use /status",
    )
}

/// Limit message for the turn that completes the food lists.
pub fn quota_exhausted(offer: &SubscriptionOffer, limit: u32) -> OutgoingResponse {
    OutgoingResponse::text(format!(
        "⚠️ Você já usou suas {limit} receitas gratuitas!\n\n\
         Gostou das receitas?\n\
         Tenha acesso ILIMITADO por apenas {price}/mês!\n\n\
         ✅ Receitas novas todos os dias\n\
         ✅ Cardápio semanal personalizado\n\
         ✅ Acompanhamento da evolução alimentar\n\
         ✅ Dicas exclusivas\n\n\
         Assine agora: {url}\n\n\
         Após o pagamento, use: /ativar seuemail@gmail.com",
        price = offer.price_label(),
        url = offer.checkout_url,
    ))
}

/// Limit message for a "mais" request.
pub fn quota_exhausted_short(offer: &SubscriptionOffer) -> OutgoingResponse {
    OutgoingResponse::text(format!(
        "⚠️ Limite de receitas gratuitas atingido!\n\n\
         Assine em: {}\n\n\
         Depois use: /ativar seuemail@gmail.com",
        offer.checkout_url
    ))
}

/// Reply to the generate button once the name is known.
pub fn generate_menu(profile: &SubjectProfile) -> OutgoingResponse {
    OutgoingResponse::markdown(format!(
        "Vou gerar receitas para *{}*!\n\n\
         Digite *mais* para usar as preferências salvas ou /novas para \
         informar novos alimentos.",
        profile.child_label()
    ))
}

// ── Subscription ────────────────────────────────────────────────────

pub fn status(profile: &SubjectProfile, limit: u32) -> OutgoingResponse {
    if profile.is_subscribed() {
        OutgoingResponse::markdown(
            "⭐ *Você é PRO!* ⭐\n\n\
             ✅ Receitas ilimitadas\n\
             ✅ Suporte prioritário\n\
             ✅ Acesso vitalício enquanto assinante\n\n\
             Digite *mais* para gerar receitas! 🍳",
        )
    } else {
        OutgoingResponse::markdown(format!(
            "📊 *Seu Status*\n\n\
             🆓 Plano: GRÁTIS\n\
             📝 Receitas usadas: {used}/{limit}\n\
             🎯 Receitas restantes: {remaining}\n\n\
             💡 _Quer receitas ilimitadas?_\n\
             Use /assinar para conhecer o plano PRO!",
            used = profile.trial_usage_count,
            remaining = profile.trial_remaining(limit),
        ))
    }
}

pub fn subscribe_pitch(offer: &SubscriptionOffer) -> OutgoingResponse {
    OutgoingResponse::text(format!(
        "⭐ NUTRIKIDS PRO ⭐\n\n\
         Apenas {price}/mês\n\n\
         ✅ Receitas ilimitadas\n\
         ✅ Acesso imediato após pagamento\n\
         ✅ Sugestões exclusivas\n\
         ✅ Cancele quando quiser\n\n\
         👉 Assine agora:\n\
         {url}\n\n\
         Como ativar:\n\
         1. Clique no link acima\n\
         2. Faça o pagamento\n\
         3. Volte aqui e envie: /ativar seuemail@exemplo.com\n\
         4. Pronto! Acesso liberado! 🎉",
        price = offer.price_label(),
        url = offer.checkout_url,
    ))
}

pub fn activation_usage() -> OutgoingResponse {
    OutgoingResponse::text("❌ Use: /ativar seuemail@gmail.com")
}

/// Confirmation for `/ativar <email>`.
pub fn activated() -> OutgoingResponse {
    OutgoingResponse::markdown(
        "🎉 *CONTA ATIVADA!* 🎉\n\n\
         Você agora é *PRO*! ⭐\n\n\
         ✅ Receitas ilimitadas liberadas\n\n\
         *Digite mais e aproveite!* 🍳",
    )
}

/// Confirmation for an email sent as free text.
pub fn activated_inline(profile: &SubjectProfile) -> OutgoingResponse {
    OutgoingResponse::markdown(format!(
        "🎉 *ASSINATURA ATIVADA COM SUCESSO!*\n\n\
         Agora {} tem receitas ilimitadas!\n\n\
         Digite *mais* sempre que quiser novas receitas! 🍽️",
        profile.child_label()
    ))
}

// ── Fallbacks ───────────────────────────────────────────────────────

pub fn help(offer: &SubscriptionOffer) -> OutgoingResponse {
    OutgoingResponse::text(format!(
        "❓ AJUDA - NUTRIKIDS\n\n\
         Comandos disponíveis:\n\
         /start - Iniciar bot\n\
         /status - Ver seu plano\n\
         /assinar - Assinar PRO\n\
         /ativar seuemail@gmail.com - Ativar assinatura\n\
         /novas - Informar novos alimentos\n\n\
         Dúvidas? Entre em contato: {}",
        offer.support_email
    ))
}

pub fn unrecognized() -> OutgoingResponse {
    OutgoingResponse::markdown(
        "🤔 Não entendi seu pedido.\n\n\
         Use os botões abaixo ou digite:\n\
         • /start - Começar\n\
         • /status - Ver plano\n\
         • /assinar - Virar PRO\n\
         • *mais* - Gerar receitas",
    )
    .with_keyboard(menu_keyboard())
}

pub fn processing_error() -> OutgoingResponse {
    OutgoingResponse::text(
        "⚠️ Tive um problema ao processar sua mensagem. Tente novamente em instantes.",
    )
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::channels::MessageFormat;

    #[test]
    fn welcome_carries_menu_and_price() {
        let reply = welcome("Ana", &SubscriptionOffer::default(), 3);
        assert!(reply.content.contains("Olá, Ana"));
        assert!(reply.content.contains("R$ 29,90/mês"));
        assert!(reply.content.contains("3 receitas para testar"));
        assert_eq!(reply.format, MessageFormat::Markdown);
        assert_eq!(reply.keyboard, Some(menu_keyboard()));
    }

    #[test]
    fn menu_has_all_buttons() {
        let flat: Vec<String> = menu_keyboard().into_iter().flatten().collect();
        assert_eq!(
            flat,
            vec![BUTTON_GENERATE, BUTTON_STATUS, BUTTON_SUBSCRIBE, BUTTON_HELP]
        );
    }

    #[test]
    fn checkout_messages_are_plain_text() {
        let offer = SubscriptionOffer {
            checkout_url: "https://pay.example/a_b_c".into(),
            monthly_price: dec!(10),
            support_email: "x@y.z".into(),
        };
        for reply in [
            quota_exhausted(&offer, 3),
            quota_exhausted_short(&offer),
            subscribe_pitch(&offer),
        ] {
            assert_eq!(reply.format, MessageFormat::Plain);
            assert!(reply.content.contains("https://pay.example/a_b_c"));
        }
        assert!(subscribe_pitch(&offer).content.contains("R$ 10,00"));
        assert!(help(&offer).content.contains("x@y.z"));
    }

    #[test]
    fn status_for_trial_and_subscriber() {
        let mut profile = SubjectProfile::new("1");
        profile.trial_usage_count = 2;
        let trial = status(&profile, 3);
        assert!(trial.content.contains("Receitas usadas: 2/3"));
        assert!(trial.content.contains("Receitas restantes: 1"));

        profile.status = crate::intake::model::SubscriptionStatus::Subscribed;
        assert!(status(&profile, 3).content.contains("Você é PRO"));
    }

    #[test]
    fn inline_activation_uses_child_label() {
        let mut profile = SubjectProfile::new("1");
        assert!(activated_inline(&profile).content.contains("seu pequeno(a)"));
        profile.child_name = Some("Maria".into());
        assert!(activated_inline(&profile).content.contains("Agora Maria"));
    }
}
