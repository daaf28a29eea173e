//! Core library for efetivo.
//!
//! Personnel roster management with a user-editable unit taxonomy, staffing
//! reconciliation against a predicted establishment (DDQOD) and an org-chart
//! built from the unit hierarchy. Presentation layers drive everything through
//! [`AppState`].

pub mod config;
pub mod dashboard;
pub mod error;
pub mod hierarchy;
pub mod models;
pub mod query;
pub mod reconciliation;
pub mod roster;
pub mod state;
pub mod storage;
pub mod taxonomy;
pub mod transfer;
pub mod utils;

pub use config::Config;
pub use dashboard::{summarize, DashboardSummary, FilterOptions, Kpis, StatEntry, UnitCard, UNASSIGNED_UNIT};
pub use error::{EfetivoError, EntityKind, ErrorKind, Result};
pub use hierarchy::{build_org_chart, unit_details, OrgChart, OrgNode, OrgRow, RoleSection};
pub use models::*;
pub use query::{page_window, results_label, Page, PageButton, RosterFilter, RosterQuery, SortState, DEFAULT_PAGE_SIZE};
pub use reconciliation::{
    default_groups, display_percentage, CategoryLine, GroupReconciliation, ReconciliationEngine,
    ReconciliationReport, StaffingStatus, StaffingTotals,
};
pub use roster::{count_unique, deduplicate, GroupedRoster, References, Roster};
pub use state::{AppState, DdqodData, Derived, Persisted, View};
pub use storage::{BlobStore, FileStore, MemoryStore};
pub use taxonomy::{default_parent_rules, ParentRule, Taxonomy};
pub use transfer::{ExportKind, Sheet, Workbook};
