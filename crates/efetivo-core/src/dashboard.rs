//! Dashboard statistics and filter option sets.
//!
//! All counts are taken over the deduplicated roster.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Person, OFFICER_CLASS};
use crate::roster::deduplicate;
use crate::taxonomy::Taxonomy;
use crate::utils::cmp_ignore_case;

/// Bucket for persons whose unit is not configured.
pub const UNASSIGNED_UNIT: &str = "SEM LOCAL";

/// Ranks in hierarchical order for the rank breakdown.
pub const RANK_ORDER: [&str; 9] = [
    "Maj", "Cap", "1º Ten", "2º Ten", "1º Sgt", "2º Sgt", "3º Sgt", "Cb", "Sd",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub total: usize,
    pub officers: usize,
    pub others: usize,
    pub units: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatEntry {
    pub label: String,
    pub count: usize,
    /// Share of the total, 0.0 to 100.0.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitCard {
    pub unit: String,
    pub total: usize,
    /// Rank class → count.
    pub classes: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub kpis: Kpis,
    pub by_class: Vec<StatEntry>,
    /// Descending by count.
    pub by_unit: Vec<StatEntry>,
    /// Descending by count.
    pub by_role: Vec<StatEntry>,
    /// Hierarchical rank order, then the remaining labels alphabetically.
    pub by_rank: Vec<StatEntry>,
    pub unit_cards: Vec<UnitCard>,
}

/// Value lists for the roster table filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub units: Vec<String>,
    pub classes: Vec<String>,
    pub roles: Vec<String>,
}

impl FilterOptions {
    /// Units and classes sorted alphabetically, roles in display order.
    pub fn from_taxonomy(taxonomy: &Taxonomy) -> Self {
        let mut units: Vec<String> = taxonomy.units().iter().map(|u| u.name.clone()).collect();
        units.sort_by(|a, b| cmp_ignore_case(a, b));
        Self {
            units,
            classes: taxonomy.classes().to_vec(),
            roles: taxonomy
                .roles_in_order()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

fn tally<'a>(persons: &[&'a Person], field: impl Fn(&'a Person) -> &'a str) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for &person in persons {
        *counts.entry(field(person)).or_default() += 1;
    }
    counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn to_entries(counts: Vec<(String, usize)>, total: usize) -> Vec<StatEntry> {
    counts
        .into_iter()
        .map(|(label, count)| StatEntry {
            percentage: if total == 0 {
                0.0
            } else {
                count as f64 * 100.0 / total as f64
            },
            label,
            count,
        })
        .collect()
}

fn descending(mut counts: Vec<(String, usize)>) -> Vec<(String, usize)> {
    // Stable: ties keep alphabetical order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn rank_position(rank: &str) -> usize {
    RANK_ORDER
        .iter()
        .position(|r| *r == rank)
        .unwrap_or(RANK_ORDER.len())
}

pub fn summarize(persons: &[Person], taxonomy: &Taxonomy) -> DashboardSummary {
    let unique = deduplicate(persons);
    let total = unique.len();
    let officers = unique.iter().filter(|p| p.class == OFFICER_CLASS).count();

    let kpis = Kpis {
        total,
        officers,
        others: total - officers,
        units: taxonomy.units().len(),
    };

    let mut by_rank = tally(&unique, |p| p.rank.as_str());
    by_rank.sort_by(|a, b| {
        rank_position(&a.0)
            .cmp(&rank_position(&b.0))
            .then_with(|| cmp_ignore_case(&a.0, &b.0))
    });

    DashboardSummary {
        kpis,
        by_class: to_entries(tally(&unique, |p| p.class.as_str()), total),
        by_unit: to_entries(descending(tally(&unique, |p| p.unit.as_str())), total),
        by_role: to_entries(descending(tally(&unique, |p| p.role.as_str())), total),
        by_rank: to_entries(by_rank, total),
        unit_cards: unit_cards(&unique, taxonomy),
    }
}

/// One card per configured unit in taxonomy order, plus the unassigned
/// bucket when some person's unit is unknown.
fn unit_cards(persons: &[&Person], taxonomy: &Taxonomy) -> Vec<UnitCard> {
    let mut cards: Vec<UnitCard> = taxonomy
        .units()
        .iter()
        .map(|u| UnitCard {
            unit: u.name.clone(),
            total: 0,
            classes: BTreeMap::new(),
        })
        .collect();
    let mut orphans = UnitCard {
        unit: UNASSIGNED_UNIT.to_string(),
        total: 0,
        classes: BTreeMap::new(),
    };

    for person in persons {
        let card = match cards.iter_mut().find(|c| c.unit == person.unit) {
            Some(card) => card,
            None => &mut orphans,
        };
        card.total += 1;
        *card.classes.entry(person.class.clone()).or_default() += 1;
    }

    if orphans.total > 0 {
        cards.push(orphans);
    }
    cards
}

// ============================================================================
// Tests
// ============================================================================
