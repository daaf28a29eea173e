//! Org-chart: the unit forest with per-unit head counts.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::warn;

use crate::models::{Person, Role, Unit};
use crate::utils::cmp_ignore_case;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct OrgNode {
    pub name: String,
    /// Persons assigned directly to this unit. Children are not included.
    pub count: usize,
    pub children: Vec<OrgNode>,
}

impl OrgNode {
    /// Depth-first search for a unit in this subtree.
    pub fn find(&self, name: &str) -> Option<&OrgNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrgChart {
    pub roots: Vec<OrgNode>,
    /// Units left out of the tree because their parent chain loops.
    pub cycle_members: Vec<String>,
    /// Persons whose unit is not a configured unit.
    pub unassigned: usize,
}

/// A flattened tree row for list rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgRow<'a> {
    pub depth: usize,
    pub node: &'a OrgNode,
}

impl OrgChart {
    pub fn find(&self, name: &str) -> Option<&OrgNode> {
        self.roots.iter().find_map(|r| r.find(name))
    }

    /// Pre-order listing of every node with its depth.
    pub fn flatten(&self) -> Vec<OrgRow<'_>> {
        fn walk<'a>(node: &'a OrgNode, depth: usize, out: &mut Vec<OrgRow<'a>>) {
            out.push(OrgRow { depth, node });
            for child in &node.children {
                walk(child, depth + 1, out);
            }
        }

        let mut out = Vec::new();
        for root in &self.roots {
            walk(root, 0, &mut out);
        }
        out
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycle_members.is_empty()
    }
}

/// Build the forest from the unit list.
///
/// Roots are units without a parent or whose parent does not exist. Units
/// that cannot be reached from any root are reported as cycle members.
pub fn build_org_chart(units: &[Unit], persons: &[Person]) -> OrgChart {
    let known: HashSet<&str> = units.iter().map(|u| u.name.as_str()).collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut unassigned = 0;
    for person in persons {
        if known.contains(person.unit.as_str()) {
            *counts.entry(person.unit.as_str()).or_default() += 1;
        } else {
            unassigned += 1;
        }
    }

    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut roots = Vec::new();
    for unit in units {
        match unit.parent.as_deref() {
            Some(parent) if known.contains(parent) => {
                children.entry(parent).or_default().push(unit.name.as_str())
            }
            _ => roots.push(unit.name.as_str()),
        }
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let roots: Vec<OrgNode> = roots
        .into_iter()
        .filter_map(|root| build_node(root, &children, &counts, &mut visited))
        .collect();

    let cycle_members: Vec<String> = units
        .iter()
        .map(|u| u.name.as_str())
        .filter(|name| !visited.contains(name))
        .map(str::to_string)
        .collect();
    if !cycle_members.is_empty() {
        warn!(units = ?cycle_members, "Unit hierarchy contains a cycle; units omitted from org chart");
    }

    OrgChart {
        roots,
        cycle_members,
        unassigned,
    }
}

fn build_node<'a>(
    name: &'a str,
    children: &HashMap<&'a str, Vec<&'a str>>,
    counts: &HashMap<&str, usize>,
    visited: &mut HashSet<&'a str>,
) -> Option<OrgNode> {
    if !visited.insert(name) {
        return None;
    }
    let kids = children
        .get(name)
        .map(|names| {
            names
                .iter()
                .copied()
                .filter_map(|child| build_node(child, children, counts, visited))
                .collect()
        })
        .unwrap_or_default();
    Some(OrgNode {
        name: name.to_string(),
        count: counts.get(name).copied().unwrap_or(0),
        children: kids,
    })
}

/// Persons of one role within a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSection<'a> {
    pub role: String,
    pub color: Option<String>,
    pub persons: Vec<&'a Person>,
}

/// The persons of `unit`, grouped by role in display order.
/// Roles missing from the taxonomy come last, alphabetically.
pub fn unit_details<'a>(unit: &str, persons: &'a [Person], roles: &[Role]) -> Vec<RoleSection<'a>> {
    let mut sections: Vec<RoleSection<'a>> = Vec::new();
    for person in persons.iter().filter(|p| p.unit == unit) {
        match sections.iter_mut().find(|s| s.role == person.role) {
            Some(section) => section.persons.push(person),
            None => sections.push(RoleSection {
                role: person.role.clone(),
                color: roles.iter().find(|r| r.name == person.role).map(|r| r.color.clone()),
                persons: vec![person],
            }),
        }
    }

    let order = |role: &str| roles.iter().find(|r| r.name == role).map(|r| r.order);
    sections.sort_by(|a, b| match (order(&a.role), order(&b.role)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => cmp_ignore_case(&a.role, &b.role),
    });
    sections
}

// ============================================================================
// Tests
// ============================================================================
