//! DDQOD data: reconciliation groups, the predicted establishment and its metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named collection of units used for reconciliation rollups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Group {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "locais", default)]
    pub units: Vec<String>,
}

impl Group {
    /// Create a group with a fresh random id.
    pub fn new(name: impl Into<String>, units: Vec<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            units,
        }
    }

    pub fn contains(&self, unit: &str) -> bool {
        self.units.iter().any(|u| u == unit)
    }
}

/// Target staffing per unit per category.
///
/// A zero count is never stored; setting zero removes the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictedEstablishment(BTreeMap<String, BTreeMap<String, u32>>);

impl PredictedEstablishment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, unit: &str, category: &str) -> u32 {
        self.0
            .get(unit)
            .and_then(|cats| cats.get(category))
            .copied()
            .unwrap_or(0)
    }

    pub fn set(&mut self, unit: &str, category: &str, count: u32) {
        if count == 0 {
            if let Some(cats) = self.0.get_mut(unit) {
                cats.remove(category);
                if cats.is_empty() {
                    self.0.remove(unit);
                }
            }
        } else {
            self.0
                .entry(unit.to_string())
                .or_default()
                .insert(category.to_string(), count);
        }
    }

    /// Add to an existing entry.
    pub fn add(&mut self, unit: &str, category: &str, count: u32) {
        let current = self.get(unit, category);
        self.set(unit, category, current.saturating_add(count));
    }

    /// Categories and counts for one unit.
    pub fn for_unit(&self, unit: &str) -> Option<&BTreeMap<String, u32>> {
        self.0.get(unit)
    }

    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn total_for(&self, unit: &str) -> u32 {
        self.0
            .get(unit)
            .map(|cats| cats.values().sum())
            .unwrap_or(0)
    }

    /// Move all entries from `old` to `new`, merging with any existing entries.
    pub fn rename_unit(&mut self, old: &str, new: &str) {
        if old == new {
            return;
        }
        if let Some(cats) = self.0.remove(old) {
            for (category, count) in cats {
                self.add(new, &category, count);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Free-text metadata describing the predicted establishment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DdqodInfo {
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(rename = "ultimaAtualizacao", default)]
    pub last_updated: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_zero_removes_entry() {
        let mut predicted = PredictedEstablishment::new();
        predicted.set("SDTS", "MAJ", 3);
        assert_eq!(predicted.get("SDTS", "MAJ"), 3);
        predicted.set("SDTS", "MAJ", 0);
        assert_eq!(predicted.get("SDTS", "MAJ"), 0);
        assert!(predicted.is_empty());
    }

    #[test]
    fn test_rename_unit_merges() {
        let mut predicted = PredictedEstablishment::new();
        predicted.set("NTS", "SGT", 2);
        predicted.set("NTS-NOVO", "SGT", 1);
        predicted.set("NTS", "CAP", 1);
        predicted.rename_unit("NTS", "NTS-NOVO");
        assert_eq!(predicted.get("NTS-NOVO", "SGT"), 3);
        assert_eq!(predicted.get("NTS-NOVO", "CAP"), 1);
        assert!(predicted.for_unit("NTS").is_none());
        assert_eq!(predicted.total_for("NTS-NOVO"), 4);
    }

    #[test]
    fn test_predicted_wire_format() {
        let json = r#"{"SDTS":{"CAP":1,"MAJ":3}}"#;
        let predicted: PredictedEstablishment = serde_json::from_str(json).unwrap();
        assert_eq!(predicted.get("SDTS", "MAJ"), 3);
        assert_eq!(serde_json::to_string(&predicted).unwrap(), json);
    }

    #[test]
    fn test_group_wire_format() {
        let json = r#"{"id":"g1","nome":"SDTS","locais":["SDTS","SDTS1"]}"#;
        let group: Group = serde_json::from_str(json).unwrap();
        assert!(group.contains("SDTS1"));
        assert_eq!(serde_json::to_string(&group).unwrap(), json);
    }

    #[test]
    fn test_info_defaults() {
        let info: DdqodInfo = serde_json::from_str("{}").unwrap();
        assert_eq!(info, DdqodInfo::default());
    }
}
