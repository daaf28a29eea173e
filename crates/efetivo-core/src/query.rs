//! Roster table query: filters, sort and pagination.

use serde::{Deserialize, Serialize};

use crate::models::{Person, SortColumn};
use crate::utils::cmp_ignore_case;

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Maximum number of numbered page buttons shown at once.
pub const MAX_PAGE_BUTTONS: usize = 5;

/// Table filters. Empty fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterFilter {
    pub search: String,
    pub unit: String,
    pub class: String,
    pub role: String,
}

impl RosterFilter {
    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.unit.is_empty() && self.class.is_empty() && self.role.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn matches(&self, person: &Person) -> bool {
        person.matches_search(&self.search)
            && (self.unit.is_empty() || person.unit == self.unit)
            && (self.class.is_empty() || person.class == self.class)
            && (self.role.is_empty() || person.role == self.role)
    }
}

/// Current sort. No column means roster order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<SortColumn>,
    pub ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: None,
            ascending: true,
        }
    }
}

impl SortState {
    /// Same column flips direction; a new column starts ascending.
    pub fn toggle(&mut self, column: SortColumn) {
        if self.column == Some(column) {
            self.ascending = !self.ascending;
        } else {
            self.column = Some(column);
            self.ascending = true;
        }
    }

    /// Sort indicator for a column header.
    pub fn indicator(&self, column: SortColumn) -> &'static str {
        match (self.column == Some(column), self.ascending) {
            (false, _) => "",
            (true, true) => " ▲",
            (true, false) => " ▼",
        }
    }
}

/// Filtered and sorted view of the roster. Holds positions into the
/// roster list so rows can be edited or deleted by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterQuery<'a> {
    rows: Vec<(usize, &'a Person)>,
}

impl<'a> RosterQuery<'a> {
    pub fn apply(persons: &'a [Person], filter: &RosterFilter, sort: SortState) -> Self {
        let mut rows: Vec<(usize, &'a Person)> = persons
            .iter()
            .enumerate()
            .filter(|(_, p)| filter.matches(p))
            .collect();

        if let Some(column) = sort.column {
            rows.sort_by(|(_, a), (_, b)| {
                let cmp = cmp_ignore_case(a.field(column), b.field(column));
                if sort.ascending {
                    cmp
                } else {
                    cmp.reverse()
                }
            });
        }
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Roster positions and persons, in display order.
    pub fn rows(&self) -> &[(usize, &'a Person)] {
        &self.rows
    }

    pub fn persons(&self) -> impl Iterator<Item = &'a Person> + '_ {
        self.rows.iter().map(|(_, p)| *p)
    }

    pub fn total_pages(&self, page_size: usize) -> usize {
        let page_size = page_size.max(1);
        self.rows.len().div_ceil(page_size).max(1)
    }

    /// One page of rows. `page` is 1-based and clamped to the valid range.
    pub fn page(&self, page: usize, page_size: usize) -> Page<'_, 'a> {
        let page_size = page_size.max(1);
        let total_pages = self.total_pages(page_size);
        let number = page.clamp(1, total_pages);
        let start = ((number - 1) * page_size).min(self.rows.len());
        let end = (start + page_size).min(self.rows.len());
        Page {
            number,
            total_pages,
            rows: &self.rows[start..end],
        }
    }

    pub fn results_label(&self) -> String {
        results_label(self.rows.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'q, 'a> {
    pub number: usize,
    pub total_pages: usize,
    pub rows: &'q [(usize, &'a Person)],
}

impl Page<'_, '_> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn buttons(&self) -> Vec<PageButton> {
        page_window(self.number, self.total_pages)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageButton {
    Page { number: usize, current: bool },
    Ellipsis,
}

/// Pagination controls: up to five numbered pages around `current`, with the
/// first and last page and ellipses for gaps. Empty when there is one page.
pub fn page_window(current: usize, total_pages: usize) -> Vec<PageButton> {
    if total_pages <= 1 {
        return Vec::new();
    }
    let current = current.clamp(1, total_pages);
    let mut start = current.saturating_sub(MAX_PAGE_BUTTONS / 2).max(1);
    let end = (start + MAX_PAGE_BUTTONS - 1).min(total_pages);
    if end - start < MAX_PAGE_BUTTONS - 1 {
        start = end.saturating_sub(MAX_PAGE_BUTTONS - 1).max(1);
    }

    let page = |number: usize| PageButton::Page {
        number,
        current: number == current,
    };

    let mut buttons = Vec::new();
    if start > 1 {
        buttons.push(page(1));
        if start > 2 {
            buttons.push(PageButton::Ellipsis);
        }
    }
    buttons.extend((start..=end).map(page));
    if end < total_pages {
        if end < total_pages - 1 {
            buttons.push(PageButton::Ellipsis);
        }
        buttons.push(page(total_pages));
    }
    buttons
}

/// "1 registro encontrado" / "N registros encontrados".
pub fn results_label(count: usize) -> String {
    if count == 1 {
        "1 registro encontrado".to_string()
    } else {
        format!("{count} registros encontrados")
    }
}

// ============================================================================
// Tests
// ============================================================================
