//! CPF/CNPJ document normalization and classification.
//!
//! Documents arrive formatted (`12.345.678/0001-90`) or bare; every
//! comparison in the engine happens on the digits-only form.

/// Strip everything but ASCII digits.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Digits-only form of a document, or an upper-cased trimmed fallback when
/// the value carries no digits at all (some rosters hold foreign IDs).
pub fn clean_document(value: &str) -> String {
    let digits = digits_only(value);
    if digits.is_empty() {
        value.trim().to_uppercase()
    } else {
        digits
    }
}

/// Document classification by digit length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// 14 digits: CNPJ, a legal entity.
    LegalEntity,
    /// 11 digits: CPF, an individual.
    Person,
    /// Anything else, including empty.
    Other,
}

impl DocumentKind {
    pub fn classify(value: &str) -> Self {
        match digits_only(value).len() {
            14 => Self::LegalEntity,
            11 => Self::Person,
            _ => Self::Other,
        }
    }

    /// Ranking used by the duplicate-priority rule: lower is better.
    pub fn priority(self) -> u8 {
        match self {
            Self::LegalEntity => 0,
            Self::Person => 1,
            Self::Other => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_digit_length() {
        assert_eq!(
            DocumentKind::classify("12.345.678/0001-90"),
            DocumentKind::LegalEntity
        );
        assert_eq!(DocumentKind::classify("123.456.789-09"), DocumentKind::Person);
        assert_eq!(DocumentKind::classify("12345"), DocumentKind::Other);
        assert_eq!(DocumentKind::classify(""), DocumentKind::Other);
    }

    #[test]
    fn legal_entity_outranks_person_outranks_other() {
        assert!(DocumentKind::LegalEntity.priority() < DocumentKind::Person.priority());
        assert!(DocumentKind::Person.priority() < DocumentKind::Other.priority());
    }

    #[test]
    fn clean_document_keeps_digits() {
        assert_eq!(clean_document(" 123.456.789-09 "), "12345678909");
        assert_eq!(clean_document("abc"), "ABC");
    }
}
