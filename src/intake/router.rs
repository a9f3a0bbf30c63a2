//! Intent routing for inbound lines.
//!
//! Commands, menu buttons and generation keywords are recognized here;
//! everything else falls through as `Intent::Text` for the intake engine.

use super::messages::{BUTTON_GENERATE, BUTTON_HELP, BUTTON_STATUS, BUTTON_SUBSCRIBE};

/// Words that ask for another batch of recipes. Whole line, case-insensitive.
const GENERATION_KEYWORDS: &[&str] = &["mais", "outra", "outra receita", "gerar", "more", "another"];

/// What an inbound line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// `/start`, `/inicio`.
    Start,
    /// `/status` or the status button.
    Status,
    /// `/assinar` or the subscribe button.
    Subscribe,
    /// `/ativar [email]`. The argument is passed through unvalidated.
    Activate { email: Option<String> },
    /// `/ajuda`, `/help` or the help button.
    Help,
    /// The generate button.
    GenerateMenu,
    /// `/novas`: collect food lists again.
    NewCycle,
    /// A slash command nobody handles.
    UnknownCommand(String),
    /// Free text, forwarded to the intake engine.
    Text(String),
}

/// Parses message content into an `Intent`.
pub struct IntentParser;

impl IntentParser {
    pub fn parse(content: &str) -> Intent {
        let trimmed = content.trim();

        match trimmed {
            BUTTON_GENERATE => return Intent::GenerateMenu,
            BUTTON_STATUS => return Intent::Status,
            BUTTON_SUBSCRIBE => return Intent::Subscribe,
            BUTTON_HELP => return Intent::Help,
            _ => {}
        }

        match trimmed.strip_prefix('/') {
            Some(rest) => parse_command(rest),
            None => Intent::Text(trimmed.to_string()),
        }
    }
}

/// Parse `<command>[@bot] [args...]` (leading slash already stripped).
fn parse_command(rest: &str) -> Intent {
    let mut parts = rest.split_whitespace();
    let head = parts.next().unwrap_or_default();
    // Telegram appends "@botname" to commands in group chats.
    let command = head.split('@').next().unwrap_or_default().to_lowercase();

    match command.as_str() {
        "start" | "inicio" => Intent::Start,
        "status" => Intent::Status,
        "assinar" => Intent::Subscribe,
        "ativar" => Intent::Activate {
            email: parts.next().map(str::to_string),
        },
        "ajuda" | "help" => Intent::Help,
        "novas" => Intent::NewCycle,
        _ => Intent::UnknownCommand(command),
    }
}

/// Whether `text` is one of the "give me more recipes" keywords.
pub fn is_generation_keyword(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    GENERATION_KEYWORDS.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_aliases() {
        assert_eq!(IntentParser::parse("/start"), Intent::Start);
        assert_eq!(IntentParser::parse("/inicio"), Intent::Start);
        assert_eq!(IntentParser::parse("/START"), Intent::Start);
        assert_eq!(IntentParser::parse("  /start  "), Intent::Start);
    }

    #[test]
    fn bot_suffix_is_stripped() {
        assert_eq!(IntentParser::parse("/status@NutriKidsBot"), Intent::Status);
        assert_eq!(
            IntentParser::parse("/ativar@NutriKidsBot ana@mail.com"),
            Intent::Activate {
                email: Some("ana@mail.com".into())
            }
        );
    }

    #[test]
    fn activate_with_and_without_argument() {
        assert_eq!(
            IntentParser::parse("/ativar ana@mail.com"),
            Intent::Activate {
                email: Some("ana@mail.com".into())
            }
        );
        assert_eq!(
            IntentParser::parse("/ativar"),
            Intent::Activate { email: None }
        );
    }

    #[test]
    fn help_and_subscribe() {
        assert_eq!(IntentParser::parse("/ajuda"), Intent::Help);
        assert_eq!(IntentParser::parse("/help"), Intent::Help);
        assert_eq!(IntentParser::parse("/assinar"), Intent::Subscribe);
        assert_eq!(IntentParser::parse("/novas"), Intent::NewCycle);
    }

    #[test]
    fn menu_buttons() {
        assert_eq!(IntentParser::parse(BUTTON_GENERATE), Intent::GenerateMenu);
        assert_eq!(IntentParser::parse(BUTTON_STATUS), Intent::Status);
        assert_eq!(IntentParser::parse(BUTTON_SUBSCRIBE), Intent::Subscribe);
        assert_eq!(IntentParser::parse(BUTTON_HELP), Intent::Help);
    }

    #[test]
    fn unknown_command_is_not_text() {
        assert_eq!(
            IntentParser::parse("/foo bar"),
            Intent::UnknownCommand("foo".into())
        );
        assert_eq!(IntentParser::parse("/"), Intent::UnknownCommand(String::new()));
    }

    #[test]
    fn free_text_is_trimmed() {
        assert_eq!(
            IntentParser::parse("  Maria, 3 anos \n"),
            Intent::Text("Maria, 3 anos".into())
        );
    }

    #[test]
    fn generation_keywords() {
        for kw in ["mais", "MAIS", " Outra ", "outra receita", "gerar", "more", "Another"] {
            assert!(is_generation_keyword(kw), "{kw}");
        }
        for text in ["mais arroz", "outras", "", "nugget, mais"] {
            assert!(!is_generation_keyword(text), "{text}");
        }
    }
}
