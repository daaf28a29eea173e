//! Application state: taxonomy, roster and DDQOD data behind one owner.
//!
//! Every mutation validates first and only then changes anything. After a
//! change the derived views are recomputed and the touched sections are
//! written to the store. A failed write keeps the in-memory change and is
//! reported as [`Persisted::Volatile`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dashboard::{summarize, DashboardSummary, FilterOptions};
use crate::error::{EfetivoError, EntityKind, Result};
use crate::hierarchy::{build_org_chart, unit_details, OrgChart, RoleSection};
use crate::models::{DdqodInfo, Group, Person, PredictedEstablishment, RoleDirection};
use crate::query::{RosterFilter, RosterQuery, SortState};
use crate::reconciliation::{default_groups, ReconciliationEngine, ReconciliationReport};
use crate::roster::{GroupedRoster, Roster};
use crate::storage::{load_json, save_json, BlobStore, Section};
use crate::taxonomy::{default_parent_rules, Taxonomy};
use crate::transfer::{self, RosterImport, Workbook};

/// Top-level views of the application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    #[default]
    Dashboard,
    Roster,
    OrgChart,
    Ddqod,
}

impl View {
    pub const ALL: [View; 4] = [View::Dashboard, View::Roster, View::OrgChart, View::Ddqod];

    pub fn title(&self) -> &'static str {
        match self {
            View::Dashboard => "Painel",
            View::Roster => "Efetivo",
            View::OrgChart => "Organograma",
            View::Ddqod => "DDQOD",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            View::Dashboard => 0,
            View::Roster => 1,
            View::OrgChart => 2,
            View::Ddqod => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<View> {
        Self::ALL.get(index).copied()
    }
}

/// Whether a change reached the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persisted {
    Durable,
    /// Applied in memory only.
    Volatile { reason: String },
}

impl Persisted {
    pub fn is_durable(&self) -> bool {
        matches!(self, Persisted::Durable)
    }
}

/// Predicted establishment, reconciliation groups and their metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DdqodData {
    pub predicted: PredictedEstablishment,
    /// User groups; empty means one default group per root unit.
    pub groups: Vec<Group>,
    pub info: DdqodInfo,
}

/// Views recomputed after every change.
#[derive(Debug, Clone, Default)]
pub struct Derived {
    pub summary: DashboardSummary,
    pub filters: FilterOptions,
    pub org_chart: OrgChart,
    /// Only present while the DDQOD view is active.
    pub reconciliation: Option<ReconciliationReport>,
}

pub struct AppState {
    store: Box<dyn BlobStore>,
    taxonomy: Taxonomy,
    roster: Roster,
    ddqod: DdqodData,
    active_view: View,
    derived: Derived,
}

fn require(value: &str, field: &'static str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        Err(EfetivoError::MissingField { field })
    } else {
        Ok(value.to_string())
    }
}

impl AppState {
    /// Load every section from the store. Without a stored configuration the
    /// taxonomy is seeded from the roster and saved.
    pub fn load(store: Box<dyn BlobStore>) -> Result<Self> {
        let grouped: GroupedRoster = load_json(&*store, Section::Roster.key())?.unwrap_or_default();
        let roster = Roster::from_grouped(grouped);

        let stored_config: Option<Taxonomy> = load_json(&*store, Section::Config.key())?;
        let seeded = stored_config.is_none() && !roster.is_empty();
        let taxonomy = match stored_config {
            Some(taxonomy) => taxonomy,
            None if seeded => Taxonomy::seed_from(roster.persons(), &default_parent_rules()),
            None => Taxonomy::default(),
        };

        let ddqod = DdqodData {
            predicted: load_json(&*store, Section::Predicted.key())?.unwrap_or_default(),
            groups: load_json(&*store, Section::Groups.key())?.unwrap_or_default(),
            info: load_json(&*store, Section::Info.key())?.unwrap_or_default(),
        };

        info!(
            persons = roster.len(),
            units = taxonomy.units().len(),
            groups = ddqod.groups.len(),
            "Loaded application state"
        );

        let mut state = Self {
            store,
            taxonomy,
            roster,
            ddqod,
            active_view: View::default(),
            derived: Derived::default(),
        };
        if seeded {
            state.commit(&[Section::Config]);
        } else {
            state.recompute();
        }
        Ok(state)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn persons(&self) -> &[Person] {
        self.roster.persons()
    }

    pub fn ddqod(&self) -> &DdqodData {
        &self.ddqod
    }

    pub fn derived(&self) -> &Derived {
        &self.derived
    }

    pub fn active_view(&self) -> View {
        self.active_view
    }

    /// Groups used for reconciliation: the user's, or the defaults.
    pub fn effective_groups(&self) -> Vec<Group> {
        if self.ddqod.groups.is_empty() {
            default_groups(&self.taxonomy)
        } else {
            self.ddqod.groups.clone()
        }
    }

    /// Most recent write to any section.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        Section::ALL
            .iter()
            .filter_map(|s| self.store.last_saved(s.key()))
            .max()
    }

    pub fn query(&self, filter: &RosterFilter, sort: SortState) -> RosterQuery<'_> {
        RosterQuery::apply(self.roster.persons(), filter, sort)
    }

    /// Persons of one unit grouped by role.
    pub fn unit_details(&self, unit: &str) -> Vec<RoleSection<'_>> {
        unit_details(unit, self.roster.persons(), self.taxonomy.roles())
    }

    // =========================================================================
    // Derived views and persistence
    // =========================================================================

    /// Switch views. Entering the DDQOD view computes the reconciliation.
    pub fn set_active_view(&mut self, view: View) {
        self.active_view = view;
        self.refresh_reconciliation();
    }

    fn refresh_reconciliation(&mut self) {
        self.derived.reconciliation = (self.active_view == View::Ddqod).then(|| {
            ReconciliationEngine::new(self.roster.persons(), &self.ddqod.predicted)
                .reconcile(&self.effective_groups())
        });
    }

    fn recompute(&mut self) {
        let persons = self.roster.persons();
        self.derived.summary = summarize(persons, &self.taxonomy);
        self.derived.filters = FilterOptions::from_taxonomy(&self.taxonomy);
        self.derived.org_chart = build_org_chart(self.taxonomy.units(), persons);
        debug!(
            persons = persons.len(),
            unique = self.derived.summary.kpis.total,
            "Recomputed derived views"
        );
        self.refresh_reconciliation();
    }

    fn save_section(&mut self, section: Section) -> Result<()> {
        let key = section.key();
        let store = self.store.as_mut();
        match section {
            Section::Roster => save_json(store, key, self.roster.grouped()),
            Section::Config => save_json(store, key, &self.taxonomy),
            Section::Predicted => save_json(store, key, &self.ddqod.predicted),
            Section::Groups => save_json(store, key, &self.ddqod.groups),
            Section::Info => save_json(store, key, &self.ddqod.info),
        }
    }

    /// Recompute derived views, then write `sections`.
    fn commit(&mut self, sections: &[Section]) -> Persisted {
        self.recompute();
        let mut failures = Vec::new();
        for &section in sections {
            if let Err(e) = self.save_section(section) {
                warn!(key = section.key(), error = %e, "Failed to persist change");
                failures.push(format!("{}: {}", section.key(), e));
            }
        }
        if failures.is_empty() {
            Persisted::Durable
        } else {
            Persisted::Volatile {
                reason: failures.join("; "),
            }
        }
    }

    // =========================================================================
    // Persons
    // =========================================================================

    fn check_references(&self, person: &Person) -> Result<()> {
        let unknown = |kind, name: &str| EfetivoError::UnknownReference {
            kind,
            name: name.to_string(),
        };
        if !self.taxonomy.has_unit(&person.unit) {
            return Err(unknown(EntityKind::Unit, &person.unit));
        }
        if !person.role.is_empty() && self.taxonomy.role(&person.role).is_none() {
            return Err(unknown(EntityKind::Role, &person.role));
        }
        if !self.taxonomy.has_class(&person.class) {
            return Err(unknown(EntityKind::RankClass, &person.class));
        }
        if !self.taxonomy.has_rank(&person.rank) {
            return Err(unknown(EntityKind::Rank, &person.rank));
        }
        Ok(())
    }

    /// Add a person, or replace the one at `existing_index`.
    pub fn upsert_person(&mut self, person: Person, existing_index: Option<usize>) -> Result<Persisted> {
        let person = person.normalized();
        Roster::check_required(&person)?;
        self.check_references(&person)?;
        self.roster.upsert_person(person, existing_index)?;
        Ok(self.commit(&[Section::Roster]))
    }

    pub fn delete_person(&mut self, index: usize) -> Result<Persisted> {
        let removed = self.roster.delete_person(index)?;
        info!(person = %removed, "Removed person");
        Ok(self.commit(&[Section::Roster]))
    }

    // =========================================================================
    // Units
    // =========================================================================

    pub fn add_unit(&mut self, name: &str, parent: Option<&str>) -> Result<Persisted> {
        self.taxonomy.add_unit(name, parent)?;
        Ok(self.commit(&[Section::Config]))
    }

    /// Rename and/or re-parent a unit. The new name reaches persons, child
    /// units, group memberships and the predicted establishment.
    pub fn edit_unit(&mut self, old: &str, new: &str, new_parent: Option<&str>) -> Result<Persisted> {
        self.taxonomy.edit_unit(old, new, new_parent)?;
        let new = new.trim();
        if old != new {
            let persons = self.roster.rename_unit(old, new);
            for group in &mut self.ddqod.groups {
                for unit in group.units.iter_mut().filter(|u| *u == old) {
                    *unit = new.to_string();
                }
                let mut seen = HashSet::new();
                group.units.retain(|u| seen.insert(u.clone()));
            }
            self.ddqod.predicted.rename_unit(old, new);
            info!(old, new, persons, "Renamed unit");
        }
        Ok(self.commit(&[Section::Config, Section::Roster, Section::Groups, Section::Predicted]))
    }

    /// Delete an unused leaf unit. It leaves every group; predicted entries stay.
    pub fn delete_unit(&mut self, name: &str) -> Result<Persisted> {
        self.taxonomy.delete_unit(name, &self.roster)?;
        for group in &mut self.ddqod.groups {
            group.units.retain(|u| u != name);
        }
        Ok(self.commit(&[Section::Config, Section::Groups]))
    }

    // =========================================================================
    // Roles, classes and ranks
    // =========================================================================

    pub fn add_role(&mut self, name: &str, color: &str) -> Result<Persisted> {
        self.taxonomy.add_role(name, color)?;
        Ok(self.commit(&[Section::Config]))
    }

    pub fn edit_role(&mut self, old: &str, new: &str, color: &str) -> Result<Persisted> {
        self.taxonomy.edit_role(old, new, color)?;
        self.roster.rename_role(old, new.trim());
        Ok(self.commit(&[Section::Config, Section::Roster]))
    }

    pub fn delete_role(&mut self, name: &str) -> Result<Persisted> {
        self.taxonomy.delete_role(name, &self.roster)?;
        Ok(self.commit(&[Section::Config]))
    }

    /// Returns `None` when the role is already at the boundary.
    pub fn move_role(&mut self, name: &str, direction: RoleDirection) -> Result<Option<Persisted>> {
        if !self.taxonomy.move_role(name, direction)? {
            return Ok(None);
        }
        Ok(Some(self.commit(&[Section::Config])))
    }

    pub fn add_class(&mut self, name: &str) -> Result<Persisted> {
        self.taxonomy.add_class(name)?;
        Ok(self.commit(&[Section::Config]))
    }

    pub fn edit_class(&mut self, old: &str, new: &str) -> Result<Persisted> {
        self.taxonomy.edit_class(old, new)?;
        self.roster.rename_class(old, new.trim());
        Ok(self.commit(&[Section::Config, Section::Roster]))
    }

    pub fn delete_class(&mut self, name: &str) -> Result<Persisted> {
        self.taxonomy.delete_class(name, &self.roster)?;
        Ok(self.commit(&[Section::Config]))
    }

    pub fn add_rank(&mut self, name: &str) -> Result<Persisted> {
        self.taxonomy.add_rank(name)?;
        Ok(self.commit(&[Section::Config]))
    }

    pub fn edit_rank(&mut self, old: &str, new: &str) -> Result<Persisted> {
        self.taxonomy.edit_rank(old, new)?;
        self.roster.rename_rank(old, new.trim());
        Ok(self.commit(&[Section::Config, Section::Roster]))
    }

    pub fn delete_rank(&mut self, name: &str) -> Result<Persisted> {
        self.taxonomy.delete_rank(name, &self.roster)?;
        Ok(self.commit(&[Section::Config]))
    }

    // =========================================================================
    // DDQOD
    // =========================================================================

    /// Set one predicted count; zero removes the entry.
    pub fn set_predicted(&mut self, unit: &str, category: &str, count: u32) -> Result<Persisted> {
        if !self.taxonomy.has_unit(unit) {
            return Err(EfetivoError::UnknownReference {
                kind: EntityKind::Unit,
                name: unit.to_string(),
            });
        }
        let category = require(category, "categoria")?;
        self.ddqod.predicted.set(unit, &category, count);
        Ok(self.commit(&[Section::Predicted]))
    }

    fn validate_group(&self, name: &str, units: &[String], skip_id: Option<&str>) -> Result<(String, Vec<String>)> {
        let name = require(name, "nome")?;
        if self
            .ddqod
            .groups
            .iter()
            .any(|g| g.name == name && Some(g.id.as_str()) != skip_id)
        {
            return Err(EfetivoError::DuplicateName {
                kind: EntityKind::Group,
                name,
            });
        }
        let mut members: Vec<String> = Vec::with_capacity(units.len());
        for unit in units.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
            if !self.taxonomy.has_unit(unit) {
                return Err(EfetivoError::UnknownReference {
                    kind: EntityKind::Unit,
                    name: unit.to_string(),
                });
            }
            if !members.iter().any(|m| m == unit) {
                members.push(unit.to_string());
            }
        }
        Ok((name, members))
    }

    /// Create a group. Returns its id.
    pub fn add_group(&mut self, name: &str, units: &[String]) -> Result<(String, Persisted)> {
        let (name, members) = self.validate_group(name, units, None)?;
        let group = Group::new(name, members);
        let id = group.id.clone();
        self.ddqod.groups.push(group);
        Ok((id, self.commit(&[Section::Groups])))
    }

    pub fn edit_group(&mut self, id: &str, name: &str, units: &[String]) -> Result<Persisted> {
        let position = self.group_position(id)?;
        let (name, members) = self.validate_group(name, units, Some(id))?;
        let group = &mut self.ddqod.groups[position];
        group.name = name;
        group.units = members;
        Ok(self.commit(&[Section::Groups]))
    }

    pub fn delete_group(&mut self, id: &str) -> Result<Persisted> {
        let position = self.group_position(id)?;
        self.ddqod.groups.remove(position);
        Ok(self.commit(&[Section::Groups]))
    }

    fn group_position(&self, id: &str) -> Result<usize> {
        self.ddqod
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| EfetivoError::NotFound {
                kind: EntityKind::Group,
                name: id.to_string(),
            })
    }

    pub fn set_info(&mut self, info: DdqodInfo) -> Persisted {
        self.ddqod.info = info;
        self.commit(&[Section::Info])
    }

    // =========================================================================
    // Import
    // =========================================================================

    /// Replace the roster from a roster or backup JSON file. Values the
    /// taxonomy does not know yet are added to it.
    pub fn import_roster_json(&mut self, text: &str) -> Result<Persisted> {
        let import = transfer::parse_roster(text)?;
        let persons: Vec<Person> = import
            .grouped()
            .values()
            .flat_map(|classes| classes.values())
            .flatten()
            .map(Person::normalized)
            .collect();

        let mut sections = vec![Section::Roster, Section::Config];
        let mut taxonomy = match &import {
            RosterImport::Backup(backup) => backup.config.clone(),
            RosterImport::Grouped(_) => None,
        }
        .unwrap_or_else(|| self.taxonomy.clone());
        if taxonomy.units().is_empty() && taxonomy.roles().is_empty() {
            taxonomy = Taxonomy::seed_from(&persons, &default_parent_rules());
        } else {
            taxonomy.absorb(&persons);
        }

        if let RosterImport::Backup(backup) = import {
            let backup = *backup;
            if let Some(predicted) = backup.previsto {
                self.ddqod.predicted = predicted;
                sections.push(Section::Predicted);
            }
            if let Some(groups) = backup.grupos {
                self.ddqod.groups = groups;
                sections.push(Section::Groups);
            }
            if let Some(info) = backup.info {
                self.ddqod.info = info;
                sections.push(Section::Info);
            }
        }

        info!(persons = persons.len(), "Imported roster");
        self.taxonomy = taxonomy;
        self.roster.replace_all(persons);
        Ok(self.commit(&sections))
    }

    /// Replace the DDQOD inputs from a bundle file.
    pub fn import_ddqod_json(&mut self, text: &str) -> Result<Persisted> {
        let bundle = transfer::parse_ddqod(text)?;
        info!(
            units = bundle.previsto.len(),
            groups = bundle.grupos.len(),
            "Imported DDQOD bundle"
        );
        self.ddqod = DdqodData {
            predicted: bundle.previsto,
            groups: bundle.grupos,
            info: bundle.info,
        };
        Ok(self.commit(&[Section::Predicted, Section::Groups, Section::Info]))
    }

    /// Replace the predicted establishment from a workbook. Groups and info
    /// are replaced only when the workbook carries those sheets.
    pub fn import_workbook(&mut self, workbook: &Workbook) -> Result<Persisted> {
        let import = transfer::import_workbook(workbook)?;
        let mut sections = vec![Section::Predicted];
        self.ddqod.predicted = import.predicted;
        if let Some(groups) = import.groups {
            self.ddqod.groups = groups;
            sections.push(Section::Groups);
        }
        if let Some(info) = import.info {
            self.ddqod.info = info;
            sections.push(Section::Info);
        }
        Ok(self.commit(&sections))
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Filtered and sorted roster rows as CSV.
    pub fn export_csv(&self, filter: &RosterFilter, sort: SortState) -> Result<String> {
        let query = self.query(filter, sort);
        let csv = transfer::write_csv(query.persons())?;
        info!(rows = query.len(), "Exported roster CSV");
        Ok(csv)
    }

    pub fn export_roster_json(&self) -> Result<String> {
        transfer::roster_json(self.roster.grouped())
    }

    pub fn export_backup(&self, at: DateTime<Utc>) -> Result<String> {
        let text = transfer::backup_json(
            self.roster.grouped(),
            &self.taxonomy,
            &self.ddqod.predicted,
            &self.ddqod.groups,
            &self.ddqod.info,
            at,
        )?;
        info!(persons = self.roster.len(), "Exported backup");
        Ok(text)
    }

    pub fn export_ddqod(&self, at: DateTime<Utc>) -> Result<String> {
        transfer::ddqod_json(&self.ddqod.info, &self.ddqod.groups, &self.ddqod.predicted, at)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::reconciliation::StaffingStatus;
    use crate::storage::{MemoryStore, CONFIG_KEY, ROSTER_KEY};

    fn seed_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        let roster = Roster::new(vec![
            Person::new("1", "Maj", "ANA", "SDTS", "CHEFE", "OF"),
            Person::new("2", "Maj", "BIA", "SDTS", "ADJ", "OF"),
            Person::new("3", "Cap", "CAIO", "SDTS1", "CHEFE", "OF"),
            Person::new("4", "1º Sgt", "DANI", "NTS", "CHEFE", "SGT"),
            Person::new("5", "Sd", "EDU", "NTS TELECOM", "AUX", "CB/SD"),
            Person::new("xxx.xxx-x", "Sd", "VAGO", "NTS TELECOM", "AUX", "CB/SD"),
        ]);
        save_json(&mut store, ROSTER_KEY, roster.grouped()).unwrap();
        store
    }

    fn state() -> AppState {
        AppState::load(Box::new(seed_store())).unwrap()
    }

    struct Snapshot {
        taxonomy: Taxonomy,
        persons: Vec<Person>,
        ddqod: DdqodData,
    }

    fn snapshot(state: &AppState) -> Snapshot {
        Snapshot {
            taxonomy: state.taxonomy().clone(),
            persons: state.persons().to_vec(),
            ddqod: state.ddqod().clone(),
        }
    }

    fn assert_unchanged(state: &AppState, before: &Snapshot) {
        assert_eq!(state.taxonomy(), &before.taxonomy);
        assert_eq!(state.persons(), before.persons.as_slice());
        assert_eq!(state.ddqod(), &before.ddqod);
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    #[test]
    fn test_load_empty_store() {
        let state = AppState::load(Box::new(MemoryStore::new())).unwrap();
        assert!(state.persons().is_empty());
        assert!(state.taxonomy().units().is_empty());
        assert_eq!(state.derived().summary.kpis.total, 0);
        assert!(state.last_saved().is_none());
    }

    #[test]
    fn test_load_seeds_and_saves_configuration() {
        let state = state();
        let taxonomy = state.taxonomy();
        assert_eq!(taxonomy.unit("SDTS1").unwrap().parent.as_deref(), Some("SDTS"));
        assert_eq!(taxonomy.unit("NTS TELECOM").unwrap().parent.as_deref(), Some("NTS"));
        assert!(state.store.get(CONFIG_KEY).unwrap().is_some());
        assert_eq!(state.derived().summary.kpis.total, 6);
        assert_eq!(state.derived().org_chart.roots.len(), 1);
    }

    #[test]
    fn test_corrupt_store_fails_to_load() {
        let mut store = MemoryStore::new();
        store.put(ROSTER_KEY, "[").unwrap();
        let err = AppState::load(Box::new(store)).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Persistence);
    }

    // -------------------------------------------------------------------------
    // Persons
    // -------------------------------------------------------------------------

    #[test]
    fn test_upsert_checks_taxonomy() {
        let mut state = state();
        let before = snapshot(&state);
        let err = state
            .upsert_person(Person::new("9", "Maj", "NOVO", "NOWHERE", "AUX", "OF"), None)
            .unwrap_err();
        assert!(matches!(err, EfetivoError::UnknownReference { kind: EntityKind::Unit, .. }));
        assert_unchanged(&state, &before);

        let persisted = state
            .upsert_person(Person::new("", "Sd", "NOVO", "NTS", "AUX", "CB/SD"), None)
            .unwrap();
        assert!(persisted.is_durable());
        assert_eq!(state.persons().last().unwrap().id, "xxx.xxx-x");
        assert_eq!(state.derived().summary.kpis.total, 7);
    }

    #[test]
    fn test_edit_and_delete_person() {
        let mut state = state();
        state
            .upsert_person(Person::new("1", "Maj", "ANA MARIA", "SDTS", "CHEFE", "OF"), Some(0))
            .unwrap();
        assert_eq!(state.persons()[0].name, "ANA MARIA");

        state.delete_person(0).unwrap();
        assert_eq!(state.persons().len(), 5);
        assert!(matches!(state.delete_person(99), Err(EfetivoError::IndexOutOfRange { .. })));
    }

    // -------------------------------------------------------------------------
    // Units
    // -------------------------------------------------------------------------

    #[test]
    fn test_delete_parent_unit_blocked() {
        let mut state = state();
        let before = snapshot(&state);
        let err = state.delete_unit("SDTS").unwrap_err();
        assert!(matches!(err, EfetivoError::HasChildren { .. }));
        assert_eq!(err.kind(), ErrorKind::Blocked);
        assert_unchanged(&state, &before);
    }

    #[test]
    fn test_rename_unit_propagates_everywhere() {
        let mut state = state();
        let (id, _) = state
            .add_group("Telemática", &["NTS".to_string(), "NTS TELECOM".to_string()])
            .unwrap();
        state.set_predicted("NTS", "SGT", 2).unwrap();

        state.edit_unit("NTS", "NTS-NOVO", Some("SDTS")).unwrap();

        assert!(state.persons().iter().all(|p| p.unit != "NTS"));
        assert_eq!(state.roster().persons_in_unit("NTS-NOVO").count(), 1);
        assert_eq!(
            state.taxonomy().unit("NTS TELECOM").unwrap().parent.as_deref(),
            Some("NTS-NOVO")
        );
        let group = state.ddqod().groups.iter().find(|g| g.id == id).unwrap();
        assert_eq!(group.units, vec!["NTS-NOVO", "NTS TELECOM"]);
        assert_eq!(state.ddqod().predicted.get("NTS-NOVO", "SGT"), 2);
        assert_eq!(state.ddqod().predicted.get("NTS", "SGT"), 0);
        assert!(state.derived().org_chart.find("NTS-NOVO").is_some());
    }

    #[test]
    fn test_cycle_rejected_through_state() {
        let mut state = state();
        let before = snapshot(&state);
        let err = state.edit_unit("SDTS", "SDTS", Some("NTS TELECOM")).unwrap_err();
        assert!(matches!(err, EfetivoError::Cycle { .. }));
        assert_unchanged(&state, &before);
    }

    #[test]
    fn test_delete_unit_leaves_groups_keeps_predicted() {
        let mut state = state();
        state.add_unit("RESERVA", Some("SDTS")).unwrap();
        state.set_predicted("RESERVA", "CAP", 1).unwrap();
        state
            .add_group("G", &["SDTS".to_string(), "RESERVA".to_string()])
            .unwrap();

        state.delete_unit("RESERVA").unwrap();
        assert_eq!(state.ddqod().groups[0].units, vec!["SDTS"]);
        assert_eq!(state.ddqod().predicted.get("RESERVA", "CAP"), 1);
    }

    // -------------------------------------------------------------------------
    // Roles, classes, ranks
    // -------------------------------------------------------------------------

    #[test]
    fn test_rename_role_class_rank_propagate() {
        let mut state = state();
        state.edit_role("AUX", "AUXILIAR", "").unwrap();
        state.edit_class("CB/SD", "PRAÇA").unwrap();
        state.edit_rank("Sd", "Soldado").unwrap();
        let edu = state.persons().iter().find(|p| p.name == "EDU").unwrap();
        assert_eq!(edu.role, "AUXILIAR");
        assert_eq!(edu.class, "PRAÇA");
        assert_eq!(edu.rank, "Soldado");
        assert!(state.derived().filters.classes.contains(&"PRAÇA".to_string()));
    }

    #[test]
    fn test_delete_in_use_role_blocked() {
        let mut state = state();
        let err = state.delete_role("CHEFE").unwrap_err();
        assert!(matches!(err, EfetivoError::InUse { count: 3, .. }));
        state.add_role("ESP", "").unwrap();
        state.delete_role("ESP").unwrap();
        // Seeded roles are alphabetical, so CHEFE is last
        assert!(state.move_role("CHEFE", RoleDirection::Down).unwrap().is_none());
        assert!(state.move_role("CHEFE", RoleDirection::Up).unwrap().is_some());
    }

    // -------------------------------------------------------------------------
    // DDQOD
    // -------------------------------------------------------------------------

    #[test]
    fn test_reconciliation_only_in_ddqod_view() {
        let mut state = state();
        state.set_predicted("SDTS", "MAJ", 3).unwrap();
        assert!(state.derived().reconciliation.is_none());

        state.set_active_view(View::Ddqod);
        let report = state.derived().reconciliation.as_ref().unwrap();
        // Default group: the SDTS subtree
        let group = report.group("SDTS").unwrap();
        let maj = group.lines.iter().find(|l| l.category == "MAJ").unwrap();
        assert_eq!((maj.actual, maj.predicted, maj.diff), (2, 3, -1));
        assert_eq!(maj.status, StaffingStatus::Deficit);

        // Mutations refresh the open report
        state
            .upsert_person(Person::new("7", "Maj", "NOVO", "SDTS", "CHEFE", "OF"), None)
            .unwrap();
        let report = state.derived().reconciliation.as_ref().unwrap();
        let maj = report.groups[0].lines.iter().find(|l| l.category == "MAJ").unwrap();
        assert_eq!(maj.status, StaffingStatus::Ok);

        state.set_active_view(View::Roster);
        assert!(state.derived().reconciliation.is_none());
    }

    #[test]
    fn test_group_validation() {
        let mut state = state();
        let (id, _) = state.add_group("A", &["SDTS".to_string()]).unwrap();
        assert!(matches!(
            state.add_group("A", &[]),
            Err(EfetivoError::DuplicateName { kind: EntityKind::Group, .. })
        ));
        assert!(matches!(
            state.add_group("B", &["NOWHERE".to_string()]),
            Err(EfetivoError::UnknownReference { .. })
        ));
        state.edit_group(&id, "A", &["NTS".to_string()]).unwrap();
        assert_eq!(state.ddqod().groups[0].units, vec!["NTS"]);
        state.delete_group(&id).unwrap();
        assert!(matches!(state.delete_group(&id), Err(EfetivoError::NotFound { .. })));
        assert!(matches!(
            state.set_predicted("NOWHERE", "MAJ", 1),
            Err(EfetivoError::UnknownReference { .. })
        ));
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    #[test]
    fn test_volatile_when_store_rejects_writes() {
        let mut store = seed_store();
        store.set_read_only(true);
        let mut state = AppState::load(Box::new(store)).unwrap();

        let persisted = state.add_unit("NOVA", None).unwrap();
        assert!(matches!(persisted, Persisted::Volatile { .. }));
        assert!(state.taxonomy().has_unit("NOVA"));
        assert!(state.derived().filters.units.contains(&"NOVA".to_string()));
    }

    #[test]
    fn test_changes_survive_reload() {
        let mut state = state();
        state.add_unit("NOVA", Some("SDTS")).unwrap();
        state.set_predicted("NOVA", "TEN", 2).unwrap();
        state.set_info(DdqodInfo {
            description: "QO".to_string(),
            last_updated: "2025-01-01".to_string(),
        });
        let AppState { store, .. } = state;

        let reloaded = AppState::load(store).unwrap();
        assert_eq!(reloaded.taxonomy().unit("NOVA").unwrap().parent.as_deref(), Some("SDTS"));
        assert_eq!(reloaded.ddqod().predicted.get("NOVA", "TEN"), 2);
        assert_eq!(reloaded.ddqod().info.description, "QO");
        assert!(reloaded.last_saved().is_some());
    }

    #[test]
    fn test_reload_keeps_first_duplicate() {
        let mut state = state();
        state.add_unit("Z", None).unwrap();
        state.add_unit("A", None).unwrap();
        state
            .upsert_person(Person::new("9", "Maj", "NOVO", "Z", "CHEFE", "OF"), None)
            .unwrap();
        state
            .upsert_person(Person::new("9", "Maj", "NOVO", "A", "CHEFE", "OF"), None)
            .unwrap();
        let before = state.derived().summary.by_unit.clone();
        let persons = state.persons().to_vec();
        let AppState { store, .. } = state;

        let reloaded = AppState::load(store).unwrap();
        assert_eq!(reloaded.persons(), persons.as_slice());
        assert_eq!(reloaded.derived().summary.by_unit, before);
        assert!(reloaded.derived().summary.by_unit.iter().any(|e| e.label == "Z"));
        assert!(!reloaded.derived().summary.by_unit.iter().any(|e| e.label == "A"));
    }

    // -------------------------------------------------------------------------
    // Import / export
    // -------------------------------------------------------------------------

    #[test]
    fn test_backup_round_trip() {
        let mut state = state();
        state.set_predicted("SDTS", "MAJ", 3).unwrap();
        state.add_group("Sede", &["SDTS".to_string()]).unwrap();
        let text = state.export_backup(Utc::now()).unwrap();

        let mut other = AppState::load(Box::new(MemoryStore::new())).unwrap();
        other.import_roster_json(&text).unwrap();
        assert_eq!(other.taxonomy(), state.taxonomy());
        assert_eq!(other.roster().grouped(), state.roster().grouped());
        assert_eq!(other.ddqod(), state.ddqod());
    }

    #[test]
    fn test_ddqod_bundle_round_trip() {
        let mut source = state();
        source.set_predicted("NTS", "SGT", 4).unwrap();
        source.add_group("Telemática", &["NTS".to_string()]).unwrap();
        let text = source.export_ddqod(Utc::now()).unwrap();

        let mut other = state();
        other.import_ddqod_json(&text).unwrap();
        assert_eq!(other.ddqod(), source.ddqod());
    }

    #[test]
    fn test_failed_import_keeps_state() {
        let mut state = state();
        let before = snapshot(&state);
        let err = state.import_ddqod_json(r#"{"previsto": "x"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImportFormat);
        assert!(state.import_roster_json("not json").is_err());
        assert_unchanged(&state, &before);
    }

    #[test]
    fn test_grouped_import_absorbs_new_values() {
        let mut state = state();
        let text = r#"{"NOVA":{"OF":[{"NUMERO":"10","POST/GRAD":"Cel","NOME":"ZE","LOCAL":"NOVA","FUNÇÃO":"CMTE","CLASSE":"OF"}]}}"#;
        state.import_roster_json(text).unwrap();
        assert_eq!(state.persons().len(), 1);
        assert!(state.taxonomy().has_unit("NOVA"));
        assert!(state.taxonomy().role("CMTE").is_some());
        // Existing configuration is kept
        assert!(state.taxonomy().has_unit("SDTS"));
    }

    #[test]
    fn test_workbook_import() {
        let mut state = state();
        let sheet = crate::transfer::Sheet::new(
            "previsto",
            vec!["local".to_string(), "categoria".to_string(), "qtd".to_string()],
            vec![vec!["SDTS".to_string(), "MAJ".to_string(), "4".to_string()]],
        );
        state.import_workbook(&Workbook::new(vec![sheet])).unwrap();
        assert_eq!(state.ddqod().predicted.get("SDTS", "MAJ"), 4);
    }

    #[test]
    fn test_export_csv_uses_filter() {
        let state = state();
        let filter = RosterFilter {
            unit: "SDTS".to_string(),
            ..Default::default()
        };
        let csv = state.export_csv(&filter, SortState::default()).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.starts_with("NUMERO,POST/GRAD,NOME,LOCAL,FUNÇÃO,CLASSE\n\"1\""));
    }
}
