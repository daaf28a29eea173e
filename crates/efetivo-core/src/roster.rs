//! Roster store: the flat person list and its unit → class grouping.
//!
//! The flat list is the only state. The grouping is a projection rebuilt
//! after every mutation, never edited directly. Units and classes keep their
//! first-seen order and the flat list follows the grouping, so flattening a
//! stored grouping gives back the same list.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{EfetivoError, Result};
use crate::models::Person;

/// Persisted roster layout: unit → rank class → persons, in first-seen order.
pub type GroupedRoster = IndexMap<String, IndexMap<String, Vec<Person>>>;

/// Usage counts of taxonomy values across the roster.
/// Deletions in the taxonomy are blocked while a value is in use.
pub trait References {
    fn unit_usage(&self, unit: &str) -> usize;
    fn role_usage(&self, role: &str) -> usize;
    fn class_usage(&self, class: &str) -> usize;
    fn rank_usage(&self, rank: &str) -> usize;
}

impl References for [Person] {
    fn unit_usage(&self, unit: &str) -> usize {
        self.iter().filter(|p| p.unit == unit).count()
    }

    fn role_usage(&self, role: &str) -> usize {
        self.iter().filter(|p| p.role == role).count()
    }

    fn class_usage(&self, class: &str) -> usize {
        self.iter().filter(|p| p.class == class).count()
    }

    fn rank_usage(&self, rank: &str) -> usize {
        self.iter().filter(|p| p.rank == rank).count()
    }
}

/// Keep the first occurrence of every id. The sentinel id is never merged,
/// so each unassigned slot survives.
pub fn deduplicate<'a, I>(list: I) -> Vec<&'a Person>
where
    I: IntoIterator<Item = &'a Person>,
{
    let mut seen: HashSet<&'a str> = HashSet::new();
    list.into_iter()
        .filter(|p| match p.dedup_key() {
            Some(key) => seen.insert(key),
            None => true,
        })
        .collect()
}

/// Number of distinct persons in `list`, counting every sentinel entry.
pub fn count_unique<'a, I>(list: I) -> usize
where
    I: IntoIterator<Item = &'a Person>,
{
    deduplicate(list).len()
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    persons: Vec<Person>,
    grouped: GroupedRoster,
}

impl Roster {
    pub fn new(persons: Vec<Person>) -> Self {
        let mut roster = Self {
            persons,
            grouped: GroupedRoster::new(),
        };
        roster.rebuild();
        roster
    }

    /// Flatten the persisted grouped layout.
    pub fn from_grouped(grouped: GroupedRoster) -> Self {
        let persons = grouped
            .into_values()
            .flat_map(|classes| classes.into_values())
            .flatten()
            .collect();
        Self::new(persons)
    }

    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    pub fn grouped(&self) -> &GroupedRoster {
        &self.grouped
    }

    pub fn get(&self, index: usize) -> Option<&Person> {
        self.persons.get(index)
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    pub fn persons_in_unit<'a>(&'a self, unit: &'a str) -> impl Iterator<Item = &'a Person> + 'a {
        self.persons.iter().filter(move |p| p.unit == unit)
    }

    pub fn count_unique(&self) -> usize {
        count_unique(&self.persons)
    }

    /// Fail with `MissingField` when a required field is blank.
    pub fn check_required(person: &Person) -> Result<()> {
        let required = [
            ("NOME", &person.name),
            ("LOCAL", &person.unit),
            ("CLASSE", &person.class),
            ("POST/GRAD", &person.rank),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(EfetivoError::MissingField { field });
            }
        }
        Ok(())
    }

    /// Insert or replace a person. With `existing_index` the entry at that
    /// position is replaced; otherwise the person is added after the others
    /// of its unit and class. Returns the position of the stored entry.
    pub fn upsert_person(&mut self, person: Person, existing_index: Option<usize>) -> Result<usize> {
        let person = person.normalized();
        Self::check_required(&person)?;

        let stored = match existing_index {
            Some(index) => {
                let len = self.persons.len();
                let slot = self
                    .persons
                    .get_mut(index)
                    .ok_or(EfetivoError::IndexOutOfRange { index, len })?;
                debug!(index, old = %slot, new = %person, "Replacing person");
                *slot = person;
                index
            }
            None => {
                debug!(new = %person, "Appending person");
                self.persons.push(person);
                self.persons.len() - 1
            }
        };

        Ok(self.rebuild()[stored])
    }

    /// Remove the person at `index`.
    pub fn delete_person(&mut self, index: usize) -> Result<Person> {
        if index >= self.persons.len() {
            return Err(EfetivoError::IndexOutOfRange {
                index,
                len: self.persons.len(),
            });
        }
        let removed = self.persons.remove(index);
        debug!(index, removed = %removed, "Deleted person");
        self.rebuild();
        Ok(removed)
    }

    /// Replace the whole roster.
    pub fn replace_all(&mut self, persons: Vec<Person>) {
        self.persons = persons;
        self.rebuild();
    }

    pub fn rename_unit(&mut self, old: &str, new: &str) -> usize {
        self.rename_with(old, new, |p| &mut p.unit)
    }

    pub fn rename_role(&mut self, old: &str, new: &str) -> usize {
        self.rename_with(old, new, |p| &mut p.role)
    }

    pub fn rename_class(&mut self, old: &str, new: &str) -> usize {
        self.rename_with(old, new, |p| &mut p.class)
    }

    pub fn rename_rank(&mut self, old: &str, new: &str) -> usize {
        self.rename_with(old, new, |p| &mut p.rank)
    }

    fn rename_with(&mut self, old: &str, new: &str, field: impl Fn(&mut Person) -> &mut String) -> usize {
        if old == new {
            return 0;
        }
        let mut changed = 0;
        for person in &mut self.persons {
            let value = field(person);
            if value == old {
                *value = new.to_string();
                changed += 1;
            }
        }
        if changed > 0 {
            self.rebuild();
        }
        changed
    }

    /// Re-derive the unit → class grouping and put the flat list in
    /// grouping order. Returns the new position of every old index.
    fn rebuild(&mut self) -> Vec<usize> {
        let mut slots: IndexMap<&str, IndexMap<&str, Vec<usize>>> = IndexMap::new();
        for (i, person) in self.persons.iter().enumerate() {
            slots
                .entry(person.unit.as_str())
                .or_default()
                .entry(person.class.as_str())
                .or_default()
                .push(i);
        }
        let order: Vec<usize> = slots
            .into_values()
            .flat_map(|classes| classes.into_values())
            .flatten()
            .collect();

        let mut moved_to = vec![0; order.len()];
        for (new, &old) in order.iter().enumerate() {
            moved_to[old] = new;
        }

        let mut taken: Vec<Option<Person>> = std::mem::take(&mut self.persons).into_iter().map(Some).collect();
        self.persons = order.iter().filter_map(|&old| taken[old].take()).collect();

        let mut grouped = GroupedRoster::new();
        for person in &self.persons {
            grouped
                .entry(person.unit.clone())
                .or_default()
                .entry(person.class.clone())
                .or_default()
                .push(person.clone());
        }
        self.grouped = grouped;
        moved_to
    }
}

impl References for Roster {
    fn unit_usage(&self, unit: &str) -> usize {
        self.persons.as_slice().unit_usage(unit)
    }

    fn role_usage(&self, role: &str) -> usize {
        self.persons.as_slice().role_usage(role)
    }

    fn class_usage(&self, class: &str) -> usize {
        self.persons.as_slice().class_usage(class)
    }

    fn rank_usage(&self, rank: &str) -> usize {
        self.persons.as_slice().rank_usage(rank)
    }
}

// ============================================================================
// Tests
// ============================================================================
