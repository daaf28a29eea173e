use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::contains_ignore_case;

/// Reserved id for slots with no assigned member.
/// Every occurrence counts as a distinct person.
pub const SENTINEL_ID: &str = "xxx.xxx-x";

/// A roster entry. Field names on the wire follow the roster spreadsheet columns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Person {
    #[serde(rename = "NUMERO", default)]
    pub id: String,
    #[serde(rename = "POST/GRAD", default)]
    pub rank: String,
    #[serde(rename = "NOME", default)]
    pub name: String,
    #[serde(rename = "LOCAL", default)]
    pub unit: String,
    #[serde(rename = "FUNÇÃO", default)]
    pub role: String,
    #[serde(rename = "CLASSE", default)]
    pub class: String,
}

impl Person {
    pub fn new(
        id: impl Into<String>,
        rank: impl Into<String>,
        name: impl Into<String>,
        unit: impl Into<String>,
        role: impl Into<String>,
        class: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            rank: rank.into(),
            name: name.into(),
            unit: unit.into(),
            role: role.into(),
            class: class.into(),
        }
    }

    /// True when this entry is an unassigned slot.
    pub fn is_unassigned(&self) -> bool {
        self.id == SENTINEL_ID
    }

    /// Key used for deduplication; `None` for the sentinel, which is never merged.
    pub fn dedup_key(&self) -> Option<&str> {
        if self.is_unassigned() {
            None
        } else {
            Some(self.id.as_str())
        }
    }

    /// Trimmed copy with an empty id replaced by the sentinel.
    pub fn normalized(&self) -> Person {
        let id = self.id.trim();
        Person {
            id: if id.is_empty() {
                SENTINEL_ID.to_string()
            } else {
                id.to_string()
            },
            rank: self.rank.trim().to_string(),
            name: self.name.trim().to_string(),
            unit: self.unit.trim().to_string(),
            role: self.role.trim().to_string(),
            class: self.class.trim().to_string(),
        }
    }

    /// Check if this person matches a free-text search.
    /// Searches name, id and rank, ignoring case. An empty query matches.
    pub fn matches_search(&self, query: &str) -> bool {
        contains_ignore_case(&self.name, query)
            || contains_ignore_case(&self.id, query)
            || contains_ignore_case(&self.rank, query)
    }

    pub fn display_name(&self) -> String {
        if self.rank.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.rank, self.name)
        }
    }

    pub fn field(&self, column: SortColumn) -> &str {
        match column {
            SortColumn::Id => &self.id,
            SortColumn::Rank => &self.rank,
            SortColumn::Name => &self.name,
            SortColumn::Unit => &self.unit,
            SortColumn::Role => &self.role,
            SortColumn::Class => &self.class,
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.display_name(), self.id, self.unit)
    }
}

/// Roster table columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortColumn {
    Id,
    Rank,
    Name,
    Unit,
    Role,
    Class,
}

impl SortColumn {
    pub const ALL: [SortColumn; 6] = [
        SortColumn::Id,
        SortColumn::Rank,
        SortColumn::Name,
        SortColumn::Unit,
        SortColumn::Role,
        SortColumn::Class,
    ];

    /// Column header as used in the roster spreadsheet and CSV export.
    pub fn header(&self) -> &'static str {
        match self {
            SortColumn::Id => "NUMERO",
            SortColumn::Rank => "POST/GRAD",
            SortColumn::Name => "NOME",
            SortColumn::Unit => "LOCAL",
            SortColumn::Role => "FUNÇÃO",
            SortColumn::Class => "CLASSE",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            SortColumn::Id => SortColumn::Rank,
            SortColumn::Rank => SortColumn::Name,
            SortColumn::Name => SortColumn::Unit,
            SortColumn::Unit => SortColumn::Role,
            SortColumn::Role => SortColumn::Class,
            SortColumn::Class => SortColumn::Id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_wire_names() {
        let json = r#"{"NUMERO":"123.456-7","POST/GRAD":"Cap","NOME":"ANA LIMA","LOCAL":"SDTS","FUNÇÃO":"CHEFE","CLASSE":"OF"}"#;
        let person: Person = serde_json::from_str(json).unwrap();
        assert_eq!(person.id, "123.456-7");
        assert_eq!(person.rank, "Cap");
        assert_eq!(person.role, "CHEFE");
        assert_eq!(serde_json::to_string(&person).unwrap(), json);
    }

    #[test]
    fn test_sentinel_has_no_dedup_key() {
        let slot = Person::new(SENTINEL_ID, "Sd", "VAGO", "NTS", "AUX", "CB/SD");
        assert!(slot.is_unassigned());
        assert_eq!(slot.dedup_key(), None);

        let person = Person::new("1", "Cap", "ANA", "SDTS", "CHEFE", "OF");
        assert_eq!(person.dedup_key(), Some("1"));
    }

    #[test]
    fn test_normalized_fills_sentinel_and_trims() {
        let person = Person::new("  ", " Sd ", " JOAO ", "NTS ", "AUX", " CB/SD").normalized();
        assert_eq!(person.id, SENTINEL_ID);
        assert_eq!(person.rank, "Sd");
        assert_eq!(person.name, "JOAO");
        assert_eq!(person.unit, "NTS");
        assert_eq!(person.class, "CB/SD");
    }

    #[test]
    fn test_matches_search() {
        let person = Person::new("123.456-7", "1º Sgt", "Carlos Souza", "NTS", "ADJ", "SGT");
        assert!(person.matches_search("souza"));
        assert!(person.matches_search("456"));
        assert!(person.matches_search("sgt"));
        assert!(!person.matches_search("nts"));
        assert!(person.matches_search("SOUZA"));
        assert!(person.matches_search("Carlos S"));
        assert!(person.matches_search(""));
    }

    #[test]
    fn test_sort_column_cycle() {
        let mut col = SortColumn::Id;
        for _ in 0..SortColumn::ALL.len() {
            col = col.next();
        }
        assert_eq!(col, SortColumn::Id);
        assert_eq!(SortColumn::Role.header(), "FUNÇÃO");
    }
}
