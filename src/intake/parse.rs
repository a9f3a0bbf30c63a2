//! Free-text parsing for the identity step and email-shaped input.

use std::sync::LazyLock;

use regex::Regex;

use super::model::ChildIdentity;

/// `<name>[,] <age> ano(s)|year(s)`, case-insensitive, anchored at the start.
static IDENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(.+?),?\s*([0-9]+)\s*(?:anos?|years?)\b")
        .expect("identity pattern is valid")
});

/// Outcome of parsing an identity line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityParse {
    /// Name and a supported age.
    Parsed(ChildIdentity),
    /// Well-formed line, but the age is outside the supported range.
    AgeOutOfRange { age: u32 },
    /// The line does not match the expected shape.
    Malformed,
}

/// Parse a "Maria, 3 anos" style line.
///
/// Nothing is persisted here; callers only store `Parsed` results.
pub fn parse_identity(text: &str) -> IdentityParse {
    let Some(caps) = IDENTITY_RE.captures(text) else {
        return IdentityParse::Malformed;
    };

    let name = caps[1].trim().trim_end_matches(',').trim();
    if name.is_empty() {
        return IdentityParse::Malformed;
    }

    // Absurdly long digit runs overflow; they are out of range either way.
    let age: u32 = caps[2].parse().unwrap_or(u32::MAX);
    if !ChildIdentity::age_supported(age) {
        return IdentityParse::AgeOutOfRange { age };
    }

    IdentityParse::Parsed(ChildIdentity {
        name: name.to_string(),
        age: age as u8,
    })
}

/// The only email check performed anywhere: contains `@` and `.`.
pub fn looks_like_email(text: &str) -> bool {
    text.contains('@') && text.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(name: &str, age: u8) -> IdentityParse {
        IdentityParse::Parsed(ChildIdentity {
            name: name.to_string(),
            age,
        })
    }

    #[test]
    fn comma_is_optional() {
        assert_eq!(parse_identity("Maria, 3 anos"), parsed("Maria", 3));
        assert_eq!(parse_identity("Maria 3 anos"), parsed("Maria", 3));
    }

    #[test]
    fn case_insensitive_and_singular() {
        assert_eq!(parse_identity("João, 2 ANO"), parsed("João", 2));
        assert_eq!(parse_identity("Ana Clara, 5 Anos"), parsed("Ana Clara", 5));
        assert_eq!(parse_identity("Leo, 4 years old"), parsed("Leo", 4));
        assert_eq!(parse_identity("Leo 2 Year"), parsed("Leo", 2));
    }

    #[test]
    fn no_space_before_unit() {
        assert_eq!(parse_identity("Pedro,3anos"), parsed("Pedro", 3));
    }

    #[test]
    fn every_supported_age_parses() {
        for age in 2..=5u8 {
            assert_eq!(parse_identity(&format!("Bia, {age} anos")), parsed("Bia", age));
        }
    }

    #[test]
    fn out_of_range_is_distinct_from_malformed() {
        assert_eq!(parse_identity("Maria, 1 ano"), IdentityParse::AgeOutOfRange { age: 1 });
        assert_eq!(parse_identity("Maria, 6 anos"), IdentityParse::AgeOutOfRange { age: 6 });
        assert_eq!(parse_identity("Maria, 0 anos"), IdentityParse::AgeOutOfRange { age: 0 });
        assert_eq!(
            parse_identity("Maria, 99999999999999999999 anos"),
            IdentityParse::AgeOutOfRange { age: u32::MAX }
        );
    }

    #[test]
    fn malformed_lines() {
        assert_eq!(parse_identity("Maria"), IdentityParse::Malformed);
        assert_eq!(parse_identity("Maria tem três anos"), IdentityParse::Malformed);
        assert_eq!(parse_identity("3 anos"), IdentityParse::Malformed);
        assert_eq!(parse_identity(""), IdentityParse::Malformed);
        assert_eq!(parse_identity("Maria, 3 anosinho"), IdentityParse::Malformed);
    }

    #[test]
    fn only_ascii_digits_count_as_age() {
        assert_eq!(parse_identity("Maria, ٣ anos"), IdentityParse::Malformed);
        assert_eq!(parse_identity("Maria, ３ anos"), IdentityParse::Malformed);
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email("mae@gmail.com"));
        assert!(!looks_like_email("mae@gmail"));
        assert!(!looks_like_email("mae.gmail.com"));
        assert!(!looks_like_email(""));
    }
}
