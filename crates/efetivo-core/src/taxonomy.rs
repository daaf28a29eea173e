//! Configuration store: units, roles, rank classes and rank labels.
//!
//! The taxonomy is the source of truth for every dropdown, filter and for the
//! unit hierarchy. Every operation validates fully before touching state, so
//! a failed call leaves the taxonomy unchanged.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EfetivoError, EntityKind, Result};
use crate::models::{palette_color, Person, Role, RoleDirection, Unit};
use crate::roster::References;

/// Rule placing a seeded unit under a canonical parent based on its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRule {
    /// `name` goes under `parent`.
    Exact { name: String, parent: String },
    /// Names starting with `prefix` go under `parent`.
    StartsWith { prefix: String, parent: String },
    /// `base` followed only by digits goes under `base` (e.g. SDTS1 → SDTS).
    Numbered { base: String },
}

impl ParentRule {
    fn parent_for(&self, unit: &str) -> Option<&str> {
        match self {
            ParentRule::Exact { name, parent } => (unit == name).then_some(parent.as_str()),
            ParentRule::StartsWith { prefix, parent } => {
                (unit.starts_with(prefix.as_str()) && unit != parent).then_some(parent.as_str())
            }
            ParentRule::Numbered { base } => {
                let rest = unit.strip_prefix(base.as_str())?;
                (!rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
                    .then_some(base.as_str())
            }
        }
    }
}

/// Naming conventions of the reference organization.
pub fn default_parent_rules() -> Vec<ParentRule> {
    vec![
        ParentRule::Numbered {
            base: "SDTS".to_string(),
        },
        ParentRule::Exact {
            name: "NTS".to_string(),
            parent: "SDTS".to_string(),
        },
        ParentRule::StartsWith {
            prefix: "NTS ".to_string(),
            parent: "NTS".to_string(),
        },
        ParentRule::StartsWith {
            prefix: "NST ".to_string(),
            parent: "NTS".to_string(),
        },
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "crate::storage::migrate::StoredTaxonomy")]
pub struct Taxonomy {
    #[serde(rename = "locais")]
    units: Vec<Unit>,
    /// Kept sorted by `order`, which is always 1..=N.
    #[serde(rename = "funcoes")]
    roles: Vec<Role>,
    classes: Vec<String>,
    #[serde(rename = "postos")]
    ranks: Vec<String>,
}

fn required(value: &str, field: &'static str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        Err(EfetivoError::MissingField { field })
    } else {
        Ok(value.to_string())
    }
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Taxonomy {
    /// Build a taxonomy from already-normalized parts. Role orders are re-densified.
    pub fn from_parts(units: Vec<Unit>, roles: Vec<Role>, classes: Vec<String>, ranks: Vec<String>) -> Self {
        let mut taxonomy = Self {
            units,
            roles,
            classes,
            ranks,
        };
        taxonomy.compact_role_order();
        taxonomy
    }

    /// Derive a taxonomy from the values found in a roster.
    /// Everything is sorted alphabetically; units are flat unless a parent rule applies.
    pub fn seed_from(persons: &[Person], rules: &[ParentRule]) -> Self {
        let distinct = |field: fn(&Person) -> &str| -> Vec<String> {
            persons
                .iter()
                .map(field)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(str::to_string)
                .collect()
        };

        let unit_names = distinct(|p| p.unit.as_str());
        let known: HashSet<&str> = unit_names.iter().map(String::as_str).collect();
        let units = unit_names
            .iter()
            .map(|name| {
                let parent = rules
                    .iter()
                    .filter_map(|rule| rule.parent_for(name))
                    .find(|parent| *parent != name.as_str() && known.contains(parent));
                Unit::new(name.clone(), parent)
            })
            .collect::<Vec<_>>();

        let roles = distinct(|p| p.role.as_str())
            .into_iter()
            .enumerate()
            .map(|(i, name)| Role::new(name, i as u32 + 1, palette_color(i)))
            .collect::<Vec<_>>();

        let classes = distinct(|p| p.class.as_str());
        let ranks = distinct(|p| p.rank.as_str());
        let taxonomy = Self::from_parts(units, roles, classes, ranks);
        info!(
            units = taxonomy.units.len(),
            roles = taxonomy.roles.len(),
            classes = taxonomy.classes.len(),
            ranks = taxonomy.ranks.len(),
            "Seeded configuration from roster"
        );
        taxonomy
    }

    /// Add any value used by `persons` that the taxonomy does not know yet.
    /// New units are added without a parent. Returns how many entries were added.
    pub fn absorb(&mut self, persons: &[Person]) -> usize {
        let mut added = 0;
        for person in persons {
            if !person.unit.is_empty() && !self.has_unit(&person.unit) {
                self.units.push(Unit::new(person.unit.clone(), None));
                added += 1;
            }
            if !person.role.is_empty() && self.role(&person.role).is_none() {
                let order = self.roles.len() as u32 + 1;
                self.roles
                    .push(Role::new(person.role.clone(), order, palette_color(self.roles.len())));
                added += 1;
            }
            if !person.class.is_empty() && !self.classes.contains(&person.class) {
                self.classes.push(person.class.clone());
                self.classes.sort();
                added += 1;
            }
            if !person.rank.is_empty() && !self.ranks.contains(&person.rank) {
                self.ranks.push(person.rank.clone());
                self.ranks.sort();
                added += 1;
            }
        }
        if added > 0 {
            debug!(added, "Absorbed new taxonomy values from roster");
        }
        added
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Roles in display order.
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Role names in display order.
    pub fn roles_in_order(&self) -> Vec<&str> {
        self.roles.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn ranks(&self) -> &[String] {
        &self.ranks
    }

    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.name == name)
    }

    pub fn has_unit(&self, name: &str) -> bool {
        self.unit(name).is_some()
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.iter().any(|c| c == name)
    }

    pub fn has_rank(&self, name: &str) -> bool {
        self.ranks.iter().any(|r| r == name)
    }

    /// Direct children of a unit, in list order.
    pub fn children_of(&self, name: &str) -> Vec<&str> {
        self.units
            .iter()
            .filter(|u| u.parent.as_deref() == Some(name))
            .map(|u| u.name.as_str())
            .collect()
    }

    /// Parent chain of a unit, nearest first. Stops at a missing parent or on a loop.
    pub fn ancestors_of(&self, name: &str) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = self.unit(name).and_then(|u| u.parent.as_deref());
        while let Some(parent) = current {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = self.unit(parent).and_then(|u| u.parent.as_deref());
        }
        chain
    }

    /// All units below `name`, depth first.
    pub fn descendants_of(&self, name: &str) -> Vec<&str> {
        let mut out = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(name);
        let mut stack: Vec<&str> = self.children_of(name).into_iter().rev().collect();
        while let Some(unit) = stack.pop() {
            if !seen.insert(unit) {
                continue;
            }
            out.push(unit);
            stack.extend(self.children_of(unit).into_iter().rev());
        }
        out
    }

    // =========================================================================
    // Units
    // =========================================================================

    pub fn add_unit(&mut self, name: &str, parent: Option<&str>) -> Result<()> {
        let name = required(name, "nome")?;
        let parent = optional(parent);

        if self.has_unit(&name) {
            return Err(EfetivoError::DuplicateName {
                kind: EntityKind::Unit,
                name,
            });
        }
        if let Some(ref p) = parent {
            if *p == name {
                return Err(EfetivoError::SelfParent(name));
            }
            if !self.has_unit(p) {
                return Err(EfetivoError::InvalidParent {
                    unit: name,
                    parent: p.clone(),
                });
            }
        }

        debug!(unit = %name, parent = ?parent, "Adding unit");
        self.units.push(Unit { name, parent });
        Ok(())
    }

    /// Rename and/or re-parent a unit. Child units follow the rename;
    /// person records are renamed by the caller.
    pub fn edit_unit(&mut self, old: &str, new: &str, new_parent: Option<&str>) -> Result<()> {
        let new = required(new, "nome")?;
        let new_parent = optional(new_parent);

        let index = self
            .units
            .iter()
            .position(|u| u.name == old)
            .ok_or_else(|| EfetivoError::NotFound {
                kind: EntityKind::Unit,
                name: old.to_string(),
            })?;

        if new != old && self.has_unit(&new) {
            return Err(EfetivoError::DuplicateName {
                kind: EntityKind::Unit,
                name: new,
            });
        }

        if let Some(ref parent) = new_parent {
            if parent == old || *parent == new {
                return Err(EfetivoError::SelfParent(new));
            }
            if !self.has_unit(parent) {
                return Err(EfetivoError::InvalidParent {
                    unit: new,
                    parent: parent.clone(),
                });
            }
            // Walking up from the new parent must never reach the unit itself
            let mut seen: HashSet<&str> = HashSet::new();
            let mut current = Some(parent.as_str());
            while let Some(ancestor) = current {
                if ancestor == old {
                    return Err(EfetivoError::Cycle {
                        unit: new,
                        parent: parent.clone(),
                    });
                }
                if !seen.insert(ancestor) {
                    break;
                }
                current = self.unit(ancestor).and_then(|u| u.parent.as_deref());
            }
        }

        debug!(old, new = %new, parent = ?new_parent, "Editing unit");
        if new != old {
            for unit in &mut self.units {
                if unit.parent.as_deref() == Some(old) {
                    unit.parent = Some(new.clone());
                }
            }
        }
        let unit = &mut self.units[index];
        unit.name = new;
        unit.parent = new_parent;
        Ok(())
    }

    pub fn delete_unit(&mut self, name: &str, refs: &(impl References + ?Sized)) -> Result<()> {
        let index = self
            .units
            .iter()
            .position(|u| u.name == name)
            .ok_or_else(|| EfetivoError::NotFound {
                kind: EntityKind::Unit,
                name: name.to_string(),
            })?;

        let children: Vec<String> = self.children_of(name).into_iter().map(str::to_string).collect();
        if !children.is_empty() {
            return Err(EfetivoError::HasChildren {
                unit: name.to_string(),
                children,
            });
        }
        let count = refs.unit_usage(name);
        if count > 0 {
            return Err(EfetivoError::InUse {
                kind: EntityKind::Unit,
                name: name.to_string(),
                count,
            });
        }

        debug!(unit = name, "Deleting unit");
        self.units.remove(index);
        Ok(())
    }

    // =========================================================================
    // Roles
    // =========================================================================

    pub fn add_role(&mut self, name: &str, color: &str) -> Result<()> {
        let name = required(name, "nome")?;
        if self.role(&name).is_some() {
            return Err(EfetivoError::DuplicateName {
                kind: EntityKind::Role,
                name,
            });
        }
        let order = self.roles.iter().map(|r| r.order).max().unwrap_or(0) + 1;
        let color = optional(Some(color)).unwrap_or_else(|| palette_color(self.roles.len()).to_string());
        debug!(role = %name, order, "Adding role");
        self.roles.push(Role::new(name, order, color));
        Ok(())
    }

    pub fn edit_role(&mut self, old: &str, new: &str, color: &str) -> Result<()> {
        let new = required(new, "nome")?;
        let index = self.role_index(old)?;
        if new != old && self.role(&new).is_some() {
            return Err(EfetivoError::DuplicateName {
                kind: EntityKind::Role,
                name: new,
            });
        }
        let role = &mut self.roles[index];
        role.name = new;
        if let Some(color) = optional(Some(color)) {
            role.color = color;
        }
        Ok(())
    }

    pub fn delete_role(&mut self, name: &str, refs: &(impl References + ?Sized)) -> Result<()> {
        let index = self.role_index(name)?;
        let count = refs.role_usage(name);
        if count > 0 {
            return Err(EfetivoError::InUse {
                kind: EntityKind::Role,
                name: name.to_string(),
                count,
            });
        }
        self.roles.remove(index);
        self.compact_role_order();
        Ok(())
    }

    /// Swap a role with its neighbour. Returns false at the boundaries.
    pub fn move_role(&mut self, name: &str, direction: RoleDirection) -> Result<bool> {
        let index = self.role_index(name)?;
        let neighbour = match direction {
            RoleDirection::Up if index > 0 => index - 1,
            RoleDirection::Down if index + 1 < self.roles.len() => index + 1,
            _ => return Ok(false),
        };
        let (a, b) = (self.roles[index].order, self.roles[neighbour].order);
        self.roles[index].order = b;
        self.roles[neighbour].order = a;
        self.compact_role_order();
        Ok(true)
    }

    fn role_index(&self, name: &str) -> Result<usize> {
        self.roles
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| EfetivoError::NotFound {
                kind: EntityKind::Role,
                name: name.to_string(),
            })
    }

    /// Sort by order (stable) and renumber 1..=N.
    fn compact_role_order(&mut self) {
        self.roles.sort_by_key(|r| r.order);
        for (i, role) in self.roles.iter_mut().enumerate() {
            role.order = i as u32 + 1;
        }
    }

    // =========================================================================
    // Rank classes and rank labels
    // =========================================================================

    pub fn add_class(&mut self, name: &str) -> Result<()> {
        add_label(&mut self.classes, EntityKind::RankClass, name)
    }

    pub fn edit_class(&mut self, old: &str, new: &str) -> Result<()> {
        rename_label(&mut self.classes, EntityKind::RankClass, old, new)
    }

    pub fn delete_class(&mut self, name: &str, refs: &(impl References + ?Sized)) -> Result<()> {
        let count = refs.class_usage(name);
        delete_label(&mut self.classes, EntityKind::RankClass, name, count)
    }

    pub fn add_rank(&mut self, name: &str) -> Result<()> {
        add_label(&mut self.ranks, EntityKind::Rank, name)
    }

    pub fn edit_rank(&mut self, old: &str, new: &str) -> Result<()> {
        rename_label(&mut self.ranks, EntityKind::Rank, old, new)
    }

    pub fn delete_rank(&mut self, name: &str, refs: &(impl References + ?Sized)) -> Result<()> {
        let count = refs.rank_usage(name);
        delete_label(&mut self.ranks, EntityKind::Rank, name, count)
    }
}

fn add_label(set: &mut Vec<String>, kind: EntityKind, name: &str) -> Result<()> {
    let name = required(name, "nome")?;
    if set.contains(&name) {
        return Err(EfetivoError::DuplicateName { kind, name });
    }
    set.push(name);
    set.sort();
    Ok(())
}

fn rename_label(set: &mut Vec<String>, kind: EntityKind, old: &str, new: &str) -> Result<()> {
    let new = required(new, "nome")?;
    let index = set.iter().position(|v| v == old).ok_or_else(|| EfetivoError::NotFound {
        kind,
        name: old.to_string(),
    })?;
    if new != old && set.contains(&new) {
        return Err(EfetivoError::DuplicateName { kind, name: new });
    }
    set[index] = new;
    set.sort();
    Ok(())
}

fn delete_label(set: &mut Vec<String>, kind: EntityKind, name: &str, usage: usize) -> Result<()> {
    let index = set.iter().position(|v| v == name).ok_or_else(|| EfetivoError::NotFound {
        kind,
        name: name.to_string(),
    })?;
    if usage > 0 {
        return Err(EfetivoError::InUse {
            kind,
            name: name.to_string(),
            count: usage,
        });
    }
    set.remove(index);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
