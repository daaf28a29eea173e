//! Application state management for the efetivo terminal UI.
//!
//! `App` owns the core [`AppState`] plus everything that only matters to the
//! terminal: current mode, roster filters, sort, page and selections, and the
//! status line.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use efetivo_core::{
    AppState, Config, ExportKind, OrgRow, Person, Persisted, RosterFilter, RosterQuery,
    SortColumn, SortState, View,
};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for the search query.
const MAX_SEARCH_LENGTH: usize = 64;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall UI mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Searching,
    ShowingHelp,
    ConfirmingDelete,
    ConfirmingQuit,
    Quitting,
}

/// Roster filters that `u`/`c`/`f` cycle through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Unit,
    Class,
    Role,
}

pub fn next_view(view: View) -> View {
    View::from_index((view.index() + 1) % View::ALL.len()).unwrap_or_default()
}

pub fn prev_view(view: View) -> View {
    let len = View::ALL.len();
    View::from_index((view.index() + len - 1) % len).unwrap_or_default()
}

/// Step through `options` with an empty string meaning "all":
/// "" → first → … → last → "".
fn cycle_option(current: &str, options: &[String]) -> String {
    match options.iter().position(|o| o == current) {
        None if current.is_empty() => options.first().cloned().unwrap_or_default(),
        None => String::new(),
        Some(i) => options.get(i + 1).cloned().unwrap_or_default(),
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    pub data: AppState,
    /// Where exported files are written.
    pub export_dir: PathBuf,

    pub mode: Mode,
    pub filter: RosterFilter,
    pub sort: SortState,
    /// 1-based roster page.
    pub page: usize,
    /// Row within the current roster page.
    pub roster_selection: usize,
    pub org_selection: usize,
    pub ddqod_selection: usize,

    pub status_message: Option<String>,
    /// Whether the last change reached the store.
    pub durable: bool,
}

impl App {
    pub fn new(config: Config, mut data: AppState, export_dir: PathBuf) -> Self {
        data.set_active_view(config.last_view);
        Self {
            config,
            data,
            export_dir,
            mode: Mode::Normal,
            filter: RosterFilter::default(),
            sort: SortState::default(),
            page: 1,
            roster_selection: 0,
            org_selection: 0,
            ddqod_selection: 0,
            status_message: None,
            durable: true,
        }
    }

    pub fn current_view(&self) -> View {
        self.data.active_view()
    }

    pub fn set_view(&mut self, view: View) {
        self.data.set_active_view(view);
        self.config.last_view = view;
    }

    pub fn page_size(&self) -> usize {
        self.config.page_size.max(1)
    }

    // =========================================================================
    // Roster table
    // =========================================================================

    pub fn query(&self) -> RosterQuery<'_> {
        self.data.query(&self.filter, self.sort)
    }

    /// Roster index and person under the cursor.
    pub fn selected_person(&self) -> Option<(usize, &Person)> {
        let query = self.query();
        let page = query.page(self.page, self.page_size());
        page.rows.get(self.roster_selection).copied()
    }

    fn rows_on_page(&self) -> usize {
        self.query().page(self.page, self.page_size()).rows.len()
    }

    /// Keep page and selection inside the current result set.
    pub fn clamp_roster(&mut self) {
        let total_pages = self.query().total_pages(self.page_size());
        self.page = self.page.clamp(1, total_pages);
        let rows = self.rows_on_page();
        self.roster_selection = self.roster_selection.min(rows.saturating_sub(1));
    }

    fn reset_roster_position(&mut self) {
        self.page = 1;
        self.roster_selection = 0;
    }

    pub fn select_next_row(&mut self) {
        let rows = self.rows_on_page();
        if self.roster_selection + 1 < rows {
            self.roster_selection += 1;
        } else if self.page < self.query().total_pages(self.page_size()) {
            self.page += 1;
            self.roster_selection = 0;
        }
    }

    pub fn select_prev_row(&mut self) {
        if self.roster_selection > 0 {
            self.roster_selection -= 1;
        } else if self.page > 1 {
            self.page -= 1;
            self.roster_selection = self.rows_on_page().saturating_sub(1);
        }
    }

    pub fn next_page(&mut self) {
        if self.page < self.query().total_pages(self.page_size()) {
            self.page += 1;
            self.roster_selection = 0;
        }
    }

    pub fn prev_page(&mut self) {
        if self.page > 1 {
            self.page -= 1;
            self.roster_selection = 0;
        }
    }

    /// Move the sort to the next column; the first press sorts by id.
    pub fn cycle_sort_column(&mut self) {
        let column = self.sort.column.map_or(SortColumn::Id, |c| c.next());
        self.sort.column = Some(column);
        self.sort.ascending = true;
        self.reset_roster_position();
    }

    pub fn reverse_sort(&mut self) {
        if let Some(column) = self.sort.column {
            self.sort.toggle(column);
            self.reset_roster_position();
        }
    }

    pub fn cycle_filter(&mut self, field: FilterField) {
        let options = &self.data.derived().filters;
        let next = match field {
            FilterField::Unit => cycle_option(&self.filter.unit, &options.units),
            FilterField::Class => cycle_option(&self.filter.class, &options.classes),
            FilterField::Role => cycle_option(&self.filter.role, &options.roles),
        };
        match field {
            FilterField::Unit => self.filter.unit = next,
            FilterField::Class => self.filter.class = next,
            FilterField::Role => self.filter.role = next,
        }
        self.reset_roster_position();
    }

    pub fn clear_filters(&mut self) {
        self.filter.clear();
        self.reset_roster_position();
    }

    pub fn push_search_char(&mut self, c: char) {
        if self.filter.search.chars().count() < MAX_SEARCH_LENGTH && !c.is_control() {
            self.filter.search.push(c);
            self.reset_roster_position();
        }
    }

    pub fn pop_search_char(&mut self) {
        self.filter.search.pop();
        self.reset_roster_position();
    }

    pub fn request_delete(&mut self) {
        if self.selected_person().is_some() {
            self.mode = Mode::ConfirmingDelete;
        }
    }

    pub fn confirm_delete(&mut self) {
        self.mode = Mode::Normal;
        let Some((index, person)) = self.selected_person() else {
            return;
        };
        let label = person.display_name();
        let result = self.data.delete_person(index);
        self.record(result, format!("Removido: {label}"));
        self.clamp_roster();
    }

    // =========================================================================
    // Org-chart and DDQOD
    // =========================================================================

    pub fn org_rows(&self) -> Vec<OrgRow<'_>> {
        self.data.derived().org_chart.flatten()
    }

    pub fn selected_unit(&self) -> Option<String> {
        self.org_rows().get(self.org_selection).map(|row| row.node.name.clone())
    }

    fn selection_len(&self) -> usize {
        match self.current_view() {
            View::Roster => self.rows_on_page(),
            View::OrgChart => self.org_rows().len(),
            View::Ddqod => self
                .data
                .derived()
                .reconciliation
                .as_ref()
                .map_or(0, |r| r.groups.len()),
            View::Dashboard => 0,
        }
    }

    pub fn select_next(&mut self) {
        let len = self.selection_len();
        match self.current_view() {
            View::Roster => self.select_next_row(),
            View::OrgChart if self.org_selection + 1 < len => self.org_selection += 1,
            View::Ddqod if self.ddqod_selection + 1 < len => self.ddqod_selection += 1,
            _ => {}
        }
    }

    pub fn select_prev(&mut self) {
        match self.current_view() {
            View::Roster => self.select_prev_row(),
            View::OrgChart => self.org_selection = self.org_selection.saturating_sub(1),
            View::Ddqod => self.ddqod_selection = self.ddqod_selection.saturating_sub(1),
            View::Dashboard => {}
        }
    }

    // =========================================================================
    // Exports
    // =========================================================================

    fn write_export(&self, kind: ExportKind, contents: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.export_dir).with_context(|| {
            format!("Failed to create export directory: {}", self.export_dir.display())
        })?;
        let path = self.export_dir.join(kind.file_name(Utc::now()));
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Exported file");
        Ok(path)
    }

    fn export(&mut self, kind: ExportKind) {
        let contents = match kind {
            ExportKind::RosterCsv => self.data.export_csv(&self.filter, self.sort),
            ExportKind::RosterJson => self.data.export_backup(Utc::now()),
            ExportKind::Ddqod => self.data.export_ddqod(Utc::now()),
        };
        let result = contents
            .map_err(anyhow::Error::from)
            .and_then(|text| self.write_export(kind, &text));
        self.status_message = Some(match result {
            Ok(path) => format!("Exportado: {}", display_path(&path)),
            Err(e) => {
                warn!(error = %e, "Export failed");
                format!("Falha na exportação: {e:#}")
            }
        });
    }

    pub fn export_csv(&mut self) {
        self.export(ExportKind::RosterCsv);
    }

    pub fn export_backup(&mut self) {
        self.export(ExportKind::RosterJson);
    }

    pub fn export_ddqod(&mut self) {
        self.export(ExportKind::Ddqod);
    }

    // =========================================================================
    // Imports
    // =========================================================================

    /// Import a roster or backup file when the store holds no roster.
    pub fn import_seed(&mut self, path: &Path) -> Result<()> {
        if !self.data.roster().is_empty() {
            return Ok(());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
        let result = self.data.import_roster_json(&text);
        self.record(result, format!("Importado: {}", display_path(path)));
        Ok(())
    }

    /// Status line update for a mutation result.
    pub fn record(&mut self, result: efetivo_core::Result<Persisted>, success: String) {
        match result {
            Ok(Persisted::Durable) => {
                self.durable = true;
                self.status_message = Some(success);
            }
            Ok(Persisted::Volatile { reason }) => {
                self.durable = false;
                self.status_message = Some(format!("{success} (não salvo: {reason})"));
            }
            Err(e) => {
                self.status_message = Some(e.to_string());
            }
        }
    }
}

fn display_path(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use efetivo_core::{BlobStore, MemoryStore};

    fn person(id: &str, name: &str, unit: &str, class: &str) -> Person {
        Person::new(id, "Sd", name, unit, "AUX", class)
    }

    fn app_with(persons: Vec<Person>, page_size: usize) -> App {
        let mut data = AppState::load(Box::new(MemoryStore::new())).unwrap();
        for p in persons {
            data.upsert_person(p, None).ok();
        }
        let config = Config {
            page_size,
            ..Config::default()
        };
        App::new(config, data, std::env::temp_dir())
    }

    fn seeded_app(count: usize, page_size: usize) -> App {
        let mut store = MemoryStore::new();
        let grouped = serde_json::json!({
            "SDTS": {
                "SD": (0..count)
                    .map(|i| serde_json::json!({
                        "NUMERO": format!("{i}"),
                        "POST/GRAD": "Sd",
                        "NOME": format!("Pessoa {i:02}"),
                        "LOCAL": "SDTS",
                        "FUNÇÃO": "AUX",
                        "CLASSE": "SD",
                    }))
                    .collect::<Vec<_>>()
            }
        });
        store.put("efetivo_dados", &grouped.to_string()).unwrap();
        let data = AppState::load(Box::new(store)).unwrap();
        let config = Config {
            page_size,
            ..Config::default()
        };
        App::new(config, data, std::env::temp_dir())
    }

    // -------------------------------------------------------------------------
    // View Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_next_view_wraps() {
        assert_eq!(next_view(View::Dashboard), View::Roster);
        assert_eq!(next_view(View::OrgChart), View::Ddqod);
        assert_eq!(next_view(View::Ddqod), View::Dashboard);
    }

    #[test]
    fn test_prev_view_wraps() {
        assert_eq!(prev_view(View::Dashboard), View::Ddqod);
        assert_eq!(prev_view(View::Roster), View::Dashboard);
    }

    #[test]
    fn test_set_view_tracks_config() {
        let mut app = seeded_app(1, 20);
        app.set_view(View::Ddqod);
        assert_eq!(app.config.last_view, View::Ddqod);
        assert!(app.data.derived().reconciliation.is_some());
    }

    // -------------------------------------------------------------------------
    // Filter Cycling Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_cycle_option() {
        let options = vec!["A".to_string(), "B".to_string()];
        assert_eq!(cycle_option("", &options), "A");
        assert_eq!(cycle_option("A", &options), "B");
        assert_eq!(cycle_option("B", &options), "");
        assert_eq!(cycle_option("gone", &options), "");
        assert_eq!(cycle_option("", &[]), "");
    }

    #[test]
    fn test_cycle_filter_resets_position() {
        let mut app = seeded_app(30, 10);
        app.next_page();
        app.roster_selection = 3;
        app.cycle_filter(FilterField::Unit);
        assert_eq!(app.filter.unit, "SDTS");
        assert_eq!(app.page, 1);
        assert_eq!(app.roster_selection, 0);
    }

    // -------------------------------------------------------------------------
    // Pagination Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_paging_bounds() {
        let mut app = seeded_app(25, 10);
        app.prev_page();
        assert_eq!(app.page, 1);
        app.next_page();
        app.next_page();
        app.next_page();
        assert_eq!(app.page, 3);
        assert_eq!(app.rows_on_page(), 5);
    }

    #[test]
    fn test_selection_crosses_pages() {
        let mut app = seeded_app(12, 10);
        for _ in 0..10 {
            app.select_next_row();
        }
        assert_eq!(app.page, 2);
        assert_eq!(app.roster_selection, 0);
        app.select_prev_row();
        assert_eq!(app.page, 1);
        assert_eq!(app.roster_selection, 9);
    }

    #[test]
    fn test_search_filters_rows() {
        let mut app = seeded_app(12, 10);
        for c in "pessoa 07".chars() {
            app.push_search_char(c);
        }
        assert_eq!(app.query().len(), 1);
        assert_eq!(app.selected_person().map(|(_, p)| p.id.as_str()), Some("7"));
        app.clear_filters();
        assert_eq!(app.query().len(), 12);
    }

    // -------------------------------------------------------------------------
    // Sort Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_cycle_sort_and_reverse() {
        let mut app = seeded_app(3, 10);
        app.reverse_sort();
        assert_eq!(app.sort.column, None);
        app.cycle_sort_column();
        assert_eq!(app.sort.column, Some(SortColumn::Id));
        app.cycle_sort_column();
        assert_eq!(app.sort.column, Some(SortColumn::Rank));
        app.reverse_sort();
        assert!(!app.sort.ascending);
    }

    // -------------------------------------------------------------------------
    // Delete Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_delete_requires_confirmation() {
        let mut app = seeded_app(2, 10);
        app.request_delete();
        assert_eq!(app.mode, Mode::ConfirmingDelete);
        assert_eq!(app.data.roster().len(), 2);
        app.confirm_delete();
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.data.roster().len(), 1);
        assert!(app.durable);
    }

    #[test]
    fn test_delete_last_row_clamps_selection() {
        let mut app = seeded_app(3, 10);
        app.roster_selection = 2;
        app.request_delete();
        app.confirm_delete();
        assert_eq!(app.roster_selection, 1);
    }

    #[test]
    fn test_request_delete_without_rows() {
        let mut app = app_with(Vec::new(), 10);
        app.request_delete();
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_rejected_upsert_leaves_roster_empty() {
        let app = app_with(vec![person("1", "A", "NOWHERE", "SD")], 10);
        assert!(app.data.roster().is_empty());
    }

    // -------------------------------------------------------------------------
    // Export Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_export_csv_writes_file() {
        let dir = std::env::temp_dir().join(format!("efetivo-export-{}", unique_suffix()));
        let mut app = seeded_app(2, 10);
        app.export_dir = dir.clone();
        app.export_csv();
        let name = ExportKind::RosterCsv.file_name(Utc::now());
        let text = std::fs::read_to_string(dir.join(&name)).unwrap();
        assert!(text.starts_with("NUMERO,POST/GRAD,NOME,LOCAL,FUNÇÃO,CLASSE\n"));
        assert!(app.status_message.unwrap().contains(&name));
        let _ = std::fs::remove_dir_all(&dir);
    }

    fn unique_suffix() -> String {
        format!("{}-{}", std::process::id(), Utc::now().timestamp_nanos_opt().unwrap_or_default())
    }

    // -------------------------------------------------------------------------
    // Durability Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_record_volatile_marks_not_durable() {
        let mut app = seeded_app(1, 10);
        app.record(
            Ok(Persisted::Volatile { reason: "disk full".into() }),
            "Salvo".to_string(),
        );
        assert!(!app.durable);
        assert!(app.status_message.unwrap().contains("disk full"));
    }
}
