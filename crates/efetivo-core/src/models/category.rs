//! Staffing categories used by the DDQOD reconciliation.
//!
//! Rank labels are collapsed into a small set of categories so that the
//! predicted establishment can be written per category rather than per grade.

use std::fmt;

/// Rank class of civilian specialists counted as officers.
pub const OFFICER_EQUIVALENT_CLASS: &str = "QOE";

/// Rank class of civilian specialists counted as enlisted.
pub const ENLISTED_EQUIVALENT_CLASS: &str = "QPE";

/// Rank class of officers.
pub const OFFICER_CLASS: &str = "OF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StaffingCategory {
    /// Senior officers (Maj and above)
    Maj = 0,
    /// Mid officers
    Cap = 1,
    /// Junior officers, lieutenants combined
    Ten = 2,
    /// Senior enlisted
    Sgt = 3,
    /// Junior enlisted
    CbSd = 4,
    /// Civilian specialist, officer-equivalent
    Qoe = 5,
    /// Civilian specialist, enlisted-equivalent
    Qpe = 6,
}

impl StaffingCategory {
    /// All known categories in display order.
    pub const ALL: [StaffingCategory; 7] = [
        StaffingCategory::Maj,
        StaffingCategory::Cap,
        StaffingCategory::Ten,
        StaffingCategory::Sgt,
        StaffingCategory::CbSd,
        StaffingCategory::Qoe,
        StaffingCategory::Qpe,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StaffingCategory::Maj => "MAJ",
            StaffingCategory::Cap => "CAP",
            StaffingCategory::Ten => "TEN",
            StaffingCategory::Sgt => "SGT",
            StaffingCategory::CbSd => "CB/SD",
            StaffingCategory::Qoe => "QOE",
            StaffingCategory::Qpe => "QPE",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
    }

    /// Map a rank/grade label to its category using the fixed label table.
    /// Handles ordinal variants like "1º Ten", "1° Ten" and "1 Ten".
    pub fn from_rank(rank: &str) -> Option<Self> {
        let key: String = rank
            .chars()
            .flat_map(char::to_lowercase)
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match key.as_str() {
            "cel" | "tencel" | "tc" | "maj" => Some(StaffingCategory::Maj),
            "cap" => Some(StaffingCategory::Cap),
            "1ten" | "2ten" | "ten" | "asp" | "aspof" => Some(StaffingCategory::Ten),
            "st" | "subten" | "1sgt" | "2sgt" | "3sgt" | "sgt" => Some(StaffingCategory::Sgt),
            "cb" | "sd" | "cbsd" => Some(StaffingCategory::CbSd),
            _ => None,
        }
    }

    /// Position in display order.
    pub fn order(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for StaffingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalized staffing category for a person.
///
/// The rank class wins for civilian specialists; otherwise the rank label is
/// looked up in the fixed table, and unknown labels pass through unchanged.
pub fn category_of(rank: &str, class: &str) -> String {
    let class = class.trim();
    if class.eq_ignore_ascii_case(ENLISTED_EQUIVALENT_CLASS) {
        return StaffingCategory::Qpe.label().to_string();
    }
    if class.eq_ignore_ascii_case(OFFICER_EQUIVALENT_CLASS) {
        return StaffingCategory::Qoe.label().to_string();
    }
    match StaffingCategory::from_rank(rank) {
        Some(category) => category.label().to_string(),
        None => rank.trim().to_string(),
    }
}

/// Sort key placing known categories first (in display order) and
/// pass-through categories after them, alphabetically.
pub fn category_sort_key(category: &str) -> (usize, String) {
    match StaffingCategory::from_label(category) {
        Some(known) => (known.order(), String::new()),
        None => (StaffingCategory::ALL.len(), category.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_officer_grades_collapse() {
        assert_eq!(category_of("Maj", "OF"), "MAJ");
        assert_eq!(category_of("Ten Cel", "OF"), "MAJ");
        assert_eq!(category_of("Cap", "OF"), "CAP");
        assert_eq!(category_of("1º Ten", "OF"), "TEN");
        assert_eq!(category_of("2° Ten", "OF"), "TEN");
        assert_eq!(category_of("Asp", "OF"), "TEN");
    }

    #[test]
    fn test_enlisted_grades_collapse() {
        assert_eq!(category_of("1º Sgt", "SGT"), "SGT");
        assert_eq!(category_of("3º Sgt", "SGT"), "SGT");
        assert_eq!(category_of("ST", "SGT"), "SGT");
        assert_eq!(category_of("Cb", "CB/SD"), "CB/SD");
        assert_eq!(category_of("Sd", "CB/SD"), "CB/SD");
    }

    #[test]
    fn test_class_takes_priority_over_rank() {
        assert_eq!(category_of("Cap", "QOE"), "QOE");
        assert_eq!(category_of("3º Sgt", "QPE"), "QPE");
        assert_eq!(category_of("Anything", "qpe"), "QPE");
    }

    #[test]
    fn test_unknown_rank_passes_through() {
        assert_eq!(category_of("Civil", "CIV"), "Civil");
        assert_eq!(category_of(" Estagiário ", "CIV"), "Estagiário");
    }

    #[test]
    fn test_category_sort_key() {
        let mut cats = vec!["Civil", "QPE", "MAJ", "Alfa", "CB/SD"];
        cats.sort_by_key(|c| category_sort_key(c));
        assert_eq!(cats, vec!["MAJ", "CB/SD", "QPE", "Alfa", "Civil"]);
    }
}
