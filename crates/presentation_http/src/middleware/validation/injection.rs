//! Signature detectors for SQL and script injection.
//!
//! Hits are logged only. Queries are parameterised and the client encodes
//! output, so these never reject a request.

use std::sync::LazyLock;

use regex::Regex;

const SQL_SIGNATURES: &[&str] = &[
    r"(?i)\bunion\s+(all\s+)?select\b",
    r"(?i)\b(drop|truncate|alter)\s+table\b",
    r"(?i)\b(insert\s+into|delete\s+from)\b",
    r"(?i)'\s*(or|and)\s+'?\w+'?\s*=\s*'?\w+",
    r";\s*--",
    r"(?i)\bexec(ute)?\s+(xp|sp)_\w+",
    r"(?i)\bsleep\s*\(\s*\d+\s*\)",
];

const SCRIPT_SIGNATURES: &[&str] = &[
    r"(?i)<\s*script\b",
    r"(?i)javascript\s*:",
    r"(?i)\bon(error|load|click|mouseover|focus)\s*=",
    r"(?i)<\s*(iframe|object|embed)\b",
    r"(?i)document\s*\.\s*(cookie|location)",
];

fn compile(signatures: &[&str]) -> Vec<Regex> {
    signatures.iter().filter_map(|s| Regex::new(s).ok()).collect()
}

static SQL: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(SQL_SIGNATURES));
static SCRIPT: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(SCRIPT_SIGNATURES));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionKind {
    Sql,
    Script,
}

impl std::fmt::Display for InjectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sql => write!(f, "sql"),
            Self::Script => write!(f, "script"),
        }
    }
}

pub fn looks_like_sql_injection(input: &str) -> bool {
    SQL.iter().any(|r| r.is_match(input))
}

pub fn looks_like_script_injection(input: &str) -> bool {
    SCRIPT.iter().any(|r| r.is_match(input))
}

pub fn scan(input: &str) -> Option<InjectionKind> {
    if looks_like_sql_injection(input) {
        Some(InjectionKind::Sql)
    } else if looks_like_script_injection(input) {
        Some(InjectionKind::Script)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures_all_compile() {
        assert_eq!(SQL.len(), SQL_SIGNATURES.len());
        assert_eq!(SCRIPT.len(), SCRIPT_SIGNATURES.len());
    }

    #[test]
    fn flags_sql_payloads() {
        assert!(looks_like_sql_injection("' OR '1'='1"));
        assert!(looks_like_sql_injection("x'; DROP TABLE users; --"));
        assert!(looks_like_sql_injection("1 UNION ALL SELECT password FROM users"));
    }

    #[test]
    fn flags_script_payloads() {
        assert!(looks_like_script_injection("<script>alert(1)</script>"));
        assert!(looks_like_script_injection("<img src=x onerror=alert(1)>"));
        assert!(looks_like_script_injection("javascript:void(0)"));
    }

    #[test]
    fn ordinary_business_text_is_clean() {
        let text = "Selezionare le fatture dalla tabella clienti e inviare il report ogni lunedì";
        assert_eq!(scan(text), None);
        assert_eq!(scan("Aggiornare l'ordine o la bolla"), None);
    }

    #[test]
    fn scan_reports_kind() {
        assert_eq!(scan("1; DELETE FROM workflows"), Some(InjectionKind::Sql));
        assert_eq!(scan("<iframe src=//x>"), Some(InjectionKind::Script));
    }
}
