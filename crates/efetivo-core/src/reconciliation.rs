//! DDQOD reconciliation: actual staffing against the predicted establishment,
//! rolled up per group and in total.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::models::{category_of, category_sort_key, Group, Person, PredictedEstablishment, StaffingCategory};
use crate::roster::deduplicate;
use crate::taxonomy::Taxonomy;

/// Display cap for over-staffed categories.
pub const PERCENTAGE_CAP: u32 = 150;

/// Category → count for one group.
pub type CategoryCounts = BTreeMap<String, u32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StaffingStatus {
    Ok,
    Deficit,
    Surplus,
}

impl StaffingStatus {
    pub fn from_diff(diff: i64) -> Self {
        match diff {
            d if d < 0 => StaffingStatus::Deficit,
            d if d > 0 => StaffingStatus::Surplus,
            _ => StaffingStatus::Ok,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StaffingStatus::Ok => "OK",
            StaffingStatus::Deficit => "Déficit",
            StaffingStatus::Surplus => "Excedente",
        }
    }
}

/// Percentage of the predicted count that is filled, for display.
pub fn display_percentage(actual: u32, predicted: u32) -> u32 {
    if predicted > 0 {
        let pct = (actual as f64 * 100.0 / predicted as f64).round() as u32;
        pct.min(PERCENTAGE_CAP)
    } else if actual > 0 {
        PERCENTAGE_CAP
    } else {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryLine {
    pub category: String,
    pub actual: u32,
    pub predicted: u32,
    /// `actual - predicted`
    pub diff: i64,
    pub status: StaffingStatus,
    pub percentage: u32,
}

impl CategoryLine {
    fn new(category: String, actual: u32, predicted: u32) -> Self {
        let diff = actual as i64 - predicted as i64;
        Self {
            category,
            actual,
            predicted,
            diff,
            status: StaffingStatus::from_diff(diff),
            percentage: display_percentage(actual, predicted),
        }
    }
}

/// Rollup of actual, predicted, deficit and surplus counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StaffingTotals {
    pub actual: u32,
    pub predicted: u32,
    pub deficit: u32,
    pub surplus: u32,
}

impl StaffingTotals {
    // Counts saturate at u32::MAX.
    fn add_line(&mut self, line: &CategoryLine) {
        self.actual = self.actual.saturating_add(line.actual);
        self.predicted = self.predicted.saturating_add(line.predicted);
        let gap = u32::try_from(line.diff.unsigned_abs()).unwrap_or(u32::MAX);
        match line.status {
            StaffingStatus::Deficit => self.deficit = self.deficit.saturating_add(gap),
            StaffingStatus::Surplus => self.surplus = self.surplus.saturating_add(gap),
            StaffingStatus::Ok => {}
        }
    }

    fn merge(&mut self, other: &StaffingTotals) {
        self.actual = self.actual.saturating_add(other.actual);
        self.predicted = self.predicted.saturating_add(other.predicted);
        self.deficit = self.deficit.saturating_add(other.deficit);
        self.surplus = self.surplus.saturating_add(other.surplus);
    }

    pub fn percentage(&self) -> u32 {
        display_percentage(self.actual, self.predicted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReconciliation {
    pub group_id: String,
    pub name: String,
    pub units: Vec<String>,
    /// Known categories first in display order, pass-through categories after.
    pub lines: Vec<CategoryLine>,
    pub totals: StaffingTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    pub groups: Vec<GroupReconciliation>,
    pub totals: StaffingTotals,
    pub generated_at: DateTime<Utc>,
}

impl ReconciliationReport {
    pub fn group(&self, name: &str) -> Option<&GroupReconciliation> {
        self.groups.iter().find(|g| g.name == name)
    }
}

/// Computes the reconciliation over borrowed roster and predicted data.
pub struct ReconciliationEngine<'a> {
    persons: &'a [Person],
    predicted: &'a PredictedEstablishment,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(persons: &'a [Person], predicted: &'a PredictedEstablishment) -> Self {
        Self { persons, predicted }
    }

    /// Head count per category for each group, taken from the roster after
    /// deduplication so a person listed in two groups counts only where the
    /// first record puts them. Every known category is present, defaulting
    /// to zero.
    pub fn compute_actual(&self, groups: &[Group]) -> Vec<CategoryCounts> {
        let unique = deduplicate(self.persons);
        groups
            .iter()
            .map(|group| {
                let members: HashSet<&str> = group.units.iter().map(String::as_str).collect();
                let mut counts = empty_counts();
                for person in unique.iter().filter(|p| members.contains(p.unit.as_str())) {
                    let count = counts.entry(category_of(&person.rank, &person.class)).or_default();
                    *count = count.saturating_add(1);
                }
                counts
            })
            .collect()
    }

    /// Sum of the member units' predicted entries per category for each group.
    pub fn compute_predicted(&self, groups: &[Group]) -> Vec<CategoryCounts> {
        groups
            .iter()
            .map(|group| {
                let mut counts = CategoryCounts::new();
                for unit in &group.units {
                    if let Some(entries) = self.predicted.for_unit(unit) {
                        for (category, count) in entries {
                            let total = counts.entry(category.clone()).or_default();
                            *total = total.saturating_add(*count);
                        }
                    }
                }
                counts
            })
            .collect()
    }

    pub fn reconcile(&self, groups: &[Group]) -> ReconciliationReport {
        let actual = self.compute_actual(groups);
        let predicted = self.compute_predicted(groups);

        let mut totals = StaffingTotals::default();
        let groups: Vec<GroupReconciliation> = groups
            .iter()
            .zip(actual)
            .zip(predicted)
            .map(|((group, actual), predicted)| {
                let mut categories: Vec<String> = actual
                    .keys()
                    .chain(predicted.keys())
                    .cloned()
                    .collect::<std::collections::BTreeSet<_>>()
                    .into_iter()
                    .collect();
                categories.sort_by_key(|c| category_sort_key(c));

                let mut group_totals = StaffingTotals::default();
                let lines = categories
                    .into_iter()
                    .map(|category| {
                        let a = actual.get(&category).copied().unwrap_or(0);
                        let p = predicted.get(&category).copied().unwrap_or(0);
                        let line = CategoryLine::new(category, a, p);
                        group_totals.add_line(&line);
                        line
                    })
                    .collect();

                totals.merge(&group_totals);
                GroupReconciliation {
                    group_id: group.id.clone(),
                    name: group.name.clone(),
                    units: group.units.clone(),
                    lines,
                    totals: group_totals,
                }
            })
            .collect();

        debug!(
            groups = groups.len(),
            actual = totals.actual,
            predicted = totals.predicted,
            deficit = totals.deficit,
            surplus = totals.surplus,
            "Reconciliation computed"
        );

        ReconciliationReport {
            groups,
            totals,
            generated_at: Utc::now(),
        }
    }
}

fn empty_counts() -> CategoryCounts {
    StaffingCategory::ALL
        .iter()
        .map(|c| (c.label().to_string(), 0))
        .collect()
}

/// One group per root unit, containing the root and all its descendants.
/// Ids are derived from the root name so repeated calls agree.
pub fn default_groups(taxonomy: &Taxonomy) -> Vec<Group> {
    taxonomy
        .units()
        .iter()
        .filter(|u| u.is_root())
        .map(|root| {
            let mut units = vec![root.name.clone()];
            units.extend(taxonomy.descendants_of(&root.name).into_iter().map(str::to_string));
            Group {
                id: format!("auto-{}", root.name),
                name: root.name.clone(),
                units,
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str, units: &[&str]) -> Group {
        Group {
            id: format!("g-{name}"),
            name: name.to_string(),
            units: units.iter().map(|u| u.to_string()).collect(),
        }
    }

    fn line<'r>(report: &'r ReconciliationReport, group: &str, category: &str) -> &'r CategoryLine {
        report
            .group(group)
            .unwrap()
            .lines
            .iter()
            .find(|l| l.category == category)
            .unwrap()
    }

    // -------------------------------------------------------------------------
    // Percentages and status
    // -------------------------------------------------------------------------

    #[test]
    fn test_display_percentage() {
        assert_eq!(display_percentage(2, 3), 67);
        assert_eq!(display_percentage(3, 3), 100);
        assert_eq!(display_percentage(10, 2), 150);
        assert_eq!(display_percentage(1, 0), 150);
        assert_eq!(display_percentage(0, 0), 0);
        assert_eq!(display_percentage(0, 4), 0);
    }

    #[test]
    fn test_status_from_diff() {
        assert_eq!(StaffingStatus::from_diff(-2), StaffingStatus::Deficit);
        assert_eq!(StaffingStatus::from_diff(0), StaffingStatus::Ok);
        assert_eq!(StaffingStatus::from_diff(1), StaffingStatus::Surplus);
    }

    // -------------------------------------------------------------------------
    // Reconciliation
    // -------------------------------------------------------------------------

    #[test]
    fn test_single_group_deficit() {
        let persons = vec![
            Person::new("1", "Maj", "A", "SDTS", "CHEFE", "OF"),
            Person::new("2", "Maj", "B", "SDTS", "ADJ", "OF"),
        ];
        let mut predicted = PredictedEstablishment::new();
        predicted.set("SDTS", "MAJ", 3);

        let engine = ReconciliationEngine::new(&persons, &predicted);
        let report = engine.reconcile(&[group("SDTS", &["SDTS"])]);

        let maj = line(&report, "SDTS", "MAJ");
        assert_eq!(maj.actual, 2);
        assert_eq!(maj.predicted, 3);
        assert_eq!(maj.diff, -1);
        assert_eq!(maj.status, StaffingStatus::Deficit);
        assert_eq!(report.group("SDTS").unwrap().totals.deficit, 1);
        assert_eq!(report.totals.deficit, 1);
        assert_eq!(report.totals.surplus, 0);
    }

    #[test]
    fn test_all_known_categories_present() {
        let persons: Vec<Person> = Vec::new();
        let predicted = PredictedEstablishment::new();
        let engine = ReconciliationEngine::new(&persons, &predicted);
        let actual = engine.compute_actual(&[group("G", &["X"])]);
        assert_eq!(actual[0].len(), StaffingCategory::ALL.len());
        assert!(actual[0].values().all(|&c| c == 0));

        let report = engine.reconcile(&[group("G", &["X"])]);
        let categories: Vec<&str> = report.groups[0].lines.iter().map(|l| l.category.as_str()).collect();
        assert_eq!(categories, vec!["MAJ", "CAP", "TEN", "SGT", "CB/SD", "QOE", "QPE"]);
        assert!(report.groups[0].lines.iter().all(|l| l.status == StaffingStatus::Ok));
    }

    #[test]
    fn test_actual_deduplicates_within_group() {
        let persons = vec![
            Person::new("1", "Cap", "A", "SDTS", "CHEFE", "OF"),
            Person::new("1", "Cap", "A", "SDTS1", "CHEFE", "OF"),
            Person::new("xxx.xxx-x", "Sd", "VAGO", "SDTS1", "AUX", "CB/SD"),
            Person::new("xxx.xxx-x", "Sd", "VAGO", "SDTS1", "AUX", "CB/SD"),
        ];
        let predicted = PredictedEstablishment::new();
        let engine = ReconciliationEngine::new(&persons, &predicted);
        let actual = engine.compute_actual(&[group("SDTS", &["SDTS", "SDTS1"])]);
        assert_eq!(actual[0]["CAP"], 1);
        assert_eq!(actual[0]["CB/SD"], 2);
    }

    #[test]
    fn test_actual_deduplicates_across_groups() {
        let persons = vec![
            Person::new("1", "Cap", "A", "U1", "CHEFE", "OF"),
            Person::new("1", "Cap", "A", "U2", "CHEFE", "OF"),
        ];
        let predicted = PredictedEstablishment::new();
        let engine = ReconciliationEngine::new(&persons, &predicted);
        let report = engine.reconcile(&[group("G1", &["U1"]), group("G2", &["U2"])]);

        assert_eq!(line(&report, "G1", "CAP").actual, 1);
        assert_eq!(line(&report, "G2", "CAP").actual, 0);
        assert_eq!(report.totals.actual, 1);
    }

    #[test]
    fn test_pass_through_categories_sort_last() {
        let persons = vec![
            Person::new("1", "Civil", "A", "U", "AUX", "CIV"),
            Person::new("2", "Cap", "B", "U", "AUX", "QOE"),
        ];
        let predicted = PredictedEstablishment::new();
        let engine = ReconciliationEngine::new(&persons, &predicted);
        let report = engine.reconcile(&[group("G", &["U"])]);
        let last = report.groups[0].lines.last().unwrap();
        assert_eq!(last.category, "Civil");
        assert_eq!(last.status, StaffingStatus::Surplus);
        assert_eq!(line(&report, "G", "QOE").actual, 1);
        assert_eq!(line(&report, "G", "CAP").actual, 0);
    }

    #[test]
    fn test_predicted_sums_member_units() {
        let persons: Vec<Person> = Vec::new();
        let mut predicted = PredictedEstablishment::new();
        predicted.set("SDTS", "SGT", 2);
        predicted.set("SDTS1", "SGT", 3);
        predicted.set("OUTRA", "SGT", 7);
        let engine = ReconciliationEngine::new(&persons, &predicted);
        let counts = engine.compute_predicted(&[group("SDTS", &["SDTS", "SDTS1"])]);
        assert_eq!(counts[0]["SGT"], 5);
    }

    #[test]
    fn test_totals_match_line_diffs() {
        let persons = vec![
            Person::new("1", "Maj", "A", "A", "X", "OF"),
            Person::new("2", "Cap", "B", "A", "X", "OF"),
            Person::new("3", "Cap", "C", "A", "X", "OF"),
            Person::new("4", "3º Sgt", "D", "B", "X", "SGT"),
        ];
        let mut predicted = PredictedEstablishment::new();
        predicted.set("A", "MAJ", 2);
        predicted.set("A", "CAP", 1);
        predicted.set("B", "SGT", 4);
        predicted.set("B", "CB/SD", 1);

        let engine = ReconciliationEngine::new(&persons, &predicted);
        let report = engine.reconcile(&[group("A", &["A"]), group("B", &["B"])]);

        for g in &report.groups {
            let deficit: i64 = g.lines.iter().filter(|l| l.diff < 0).map(|l| -l.diff).sum();
            let surplus: i64 = g.lines.iter().filter(|l| l.diff > 0).map(|l| l.diff).sum();
            assert_eq!(g.totals.deficit as i64, deficit);
            assert_eq!(g.totals.surplus as i64, surplus);
            for l in &g.lines {
                assert_eq!(l.actual as i64 - l.predicted as i64, l.diff);
            }
        }
        assert_eq!(report.totals.actual, 4);
        assert_eq!(report.totals.predicted, 8);
        assert_eq!(report.totals.deficit, 1 + 3 + 1);
        assert_eq!(report.totals.surplus, 1);
    }

    #[test]
    fn test_huge_predicted_counts_saturate() {
        let persons = vec![Person::new("1", "Maj", "A", "A", "CHEFE", "OF")];
        let mut predicted = PredictedEstablishment::new();
        predicted.set("A", "MAJ", u32::MAX);
        predicted.set("B", "MAJ", 1);
        let engine = ReconciliationEngine::new(&persons, &predicted);

        let report = engine.reconcile(&[group("AB", &["A", "B"]), group("B", &["B"])]);
        let maj = line(&report, "AB", "MAJ");
        assert_eq!(maj.predicted, u32::MAX);
        assert_eq!(maj.status, StaffingStatus::Deficit);
        assert_eq!(report.totals.predicted, u32::MAX);
        assert_eq!(report.totals.deficit, u32::MAX);
        assert_eq!(report.totals.percentage(), 0);
    }

    // -------------------------------------------------------------------------
    // Default groups
    // -------------------------------------------------------------------------

    #[test]
    fn test_default_groups_follow_roots() {
        let mut taxonomy = Taxonomy::default();
        taxonomy.add_unit("SDTS", None).unwrap();
        taxonomy.add_unit("SDTS1", Some("SDTS")).unwrap();
        taxonomy.add_unit("NTS", Some("SDTS")).unwrap();
        taxonomy.add_unit("NTS TELECOM", Some("NTS")).unwrap();
        taxonomy.add_unit("OUTRA", None).unwrap();

        let groups = default_groups(&taxonomy);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "SDTS");
        assert_eq!(groups[0].units, vec!["SDTS", "SDTS1", "NTS", "NTS TELECOM"]);
        assert_eq!(groups[1].units, vec!["OUTRA"]);
        assert_eq!(default_groups(&taxonomy), groups);
    }
}
