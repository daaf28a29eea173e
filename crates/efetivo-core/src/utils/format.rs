use std::cmp::Ordering;

use chrono::{DateTime, Utc};

/// Compare two strings case-insensitively without allocating.
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Check whether `haystack` contains `needle`, ignoring case.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Fold a column header or sheet name into a comparable key:
/// lowercase, accents stripped, only ASCII letters and digits kept.
pub fn normalize_key(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Date stamp used in export file names (YYYY-MM-DD).
pub fn file_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Human readable age of a timestamp ("just now", "5m ago", "2h ago", "3d ago").
pub fn age_display(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - at).num_minutes();
    if minutes < 1 {
        // Also covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_cmp_ignore_case() {
        assert_eq!(cmp_ignore_case("abc", "ABC"), Ordering::Equal);
        assert_eq!(cmp_ignore_case("Cap", "maj"), Ordering::Less);
        assert_eq!(cmp_ignore_case("Sd", "cb"), Ordering::Greater);
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("NTS TELECOM", "telecom"));
        assert!(contains_ignore_case("anything", ""));
        assert!(!contains_ignore_case("SDTS", "nts1"));
        assert!(contains_ignore_case("nts telecom", "TELE"));
        assert!(contains_ignore_case("Função", "FUNÇÃO"));
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Quantidade"), "quantidade");
        assert_eq!(normalize_key(" Informações "), "informacoes");
        assert_eq!(normalize_key("Última Atualização"), "ultimaatualizacao");
        assert_eq!(normalize_key("QTD."), "qtd");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("FUNÇÃO", 6), "FUNÇÃO");
    }

    #[test]
    fn test_file_date() {
        let at = Utc.with_ymd_and_hms(2026, 3, 9, 14, 30, 0).unwrap();
        assert_eq!(file_date(at), "2026-03-09");
    }

    #[test]
    fn test_age_display() {
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 14, 30, 0).unwrap();
        assert_eq!(age_display(now, now), "just now");
        assert_eq!(age_display(now + Duration::minutes(5), now), "just now");
        assert_eq!(age_display(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(age_display(now - Duration::minutes(95), now), "2h ago");
        assert_eq!(age_display(now - Duration::hours(30), now), "1d ago");
        assert_eq!(age_display(now - Duration::hours(40), now), "2d ago");
    }
}
