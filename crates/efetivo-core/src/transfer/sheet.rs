//! Spreadsheet import of the predicted establishment, groups and info.
//!
//! The binary workbook reader lives outside this crate; callers hand over
//! sheets as rows of cell text. A CSV file can be read as a single sheet.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::error::{EfetivoError, Result};
use crate::models::{DdqodInfo, Group, PredictedEstablishment, StaffingCategory};
use crate::utils::normalize_key;

const PREDICTED_SHEETS: &[&str] = &["previsto", "predicted", "ddqod"];
const GROUP_SHEETS: &[&str] = &["grupos", "groups"];
const INFO_SHEETS: &[&str] = &["info", "informacoes"];

const UNIT_COLUMNS: &[&str] = &["local", "unidade", "unit", "om"];
const CATEGORY_COLUMNS: &[&str] = &["categoria", "category", "cat", "posto"];
const QUANTITY_COLUMNS: &[&str] = &["quantidade", "qtd", "qtde", "quantity", "previsto"];
const GROUP_NAME_COLUMNS: &[&str] = &["grupo", "group", "nome"];
const GROUP_UNIT_COLUMNS: &[&str] = &["local", "locais", "unidade", "unit"];
const DESCRIPTION_COLUMNS: &[&str] = &["descricao", "description"];
const UPDATED_COLUMNS: &[&str] = &["ultimaatualizacao", "atualizacao", "lastupdated", "data"];

/// A named table of cell text. The first row holds the headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Read comma separated text. Ragged rows are accepted.
    pub fn from_csv(name: impl Into<String>, text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| EfetivoError::import(format!("unreadable header row: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();
        let rows = reader
            .records()
            .map(|record| {
                record
                    .map(|r| r.iter().map(str::to_string).collect())
                    .map_err(|e| EfetivoError::import(format!("unreadable row: {e}")))
            })
            .collect::<Result<Vec<Vec<String>>>>()?;

        Ok(Self::new(name, headers, rows))
    }

    /// Index of the first column whose header matches one of `aliases`,
    /// ignoring case and accents.
    pub fn column(&self, aliases: &[&str]) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| aliases.contains(&normalize_key(h).as_str()))
    }

    fn cell<'s>(row: &'s [String], column: usize) -> &'s str {
        row.get(column).map(|c| c.trim()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// First sheet whose name matches one of `aliases`.
    pub fn sheet(&self, aliases: &[&str]) -> Option<&Sheet> {
        self.sheets
            .iter()
            .find(|s| aliases.contains(&normalize_key(&s.name).as_str()))
    }

    /// The predicted sheet by name, or else the first sheet that carries
    /// unit, category and quantity columns.
    fn predicted_sheet(&self) -> Option<&Sheet> {
        self.sheet(PREDICTED_SHEETS).or_else(|| {
            self.sheets.iter().find(|s| {
                s.column(UNIT_COLUMNS).is_some()
                    && s.column(CATEGORY_COLUMNS).is_some()
                    && s.column(QUANTITY_COLUMNS).is_some()
            })
        })
    }
}

/// What a workbook contributed. Absent sheets leave the current data alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetImport {
    pub predicted: PredictedEstablishment,
    pub groups: Option<Vec<Group>>,
    pub info: Option<DdqodInfo>,
    /// Rows dropped for missing unit, category or quantity.
    pub skipped_rows: usize,
}

/// Canonical category label for a cell: known labels and rank labels map to
/// their category, anything else is kept as written.
fn category_label(cell: &str) -> String {
    StaffingCategory::from_label(cell)
        .or_else(|| StaffingCategory::from_rank(cell))
        .map(|c| c.label().to_string())
        .unwrap_or_else(|| cell.to_string())
}

/// Positive whole quantity. Decimal cells such as "3.0" are accepted.
fn quantity(cell: &str) -> Option<u32> {
    let value: f64 = cell.replace(',', ".").parse().ok()?;
    if value.is_finite() && value >= 1.0 {
        Some(value.round() as u32)
    } else {
        None
    }
}

pub fn import_workbook(workbook: &Workbook) -> Result<SheetImport> {
    let sheet = workbook
        .predicted_sheet()
        .ok_or_else(|| EfetivoError::import("no predicted establishment sheet found"))?;
    let (predicted, skipped_rows) = read_predicted(sheet)?;

    let groups = workbook.sheet(GROUP_SHEETS).and_then(read_groups);
    let info = workbook.sheet(INFO_SHEETS).and_then(read_info);

    info!(
        units = predicted.len(),
        skipped_rows,
        groups = groups.as_ref().map_or(0, Vec::len),
        has_info = info.is_some(),
        "Imported spreadsheet"
    );
    Ok(SheetImport {
        predicted,
        groups,
        info,
        skipped_rows,
    })
}

fn read_predicted(sheet: &Sheet) -> Result<(PredictedEstablishment, usize)> {
    let missing = |what: &str| EfetivoError::import(format!("sheet '{}' has no {what} column", sheet.name));
    let unit_col = sheet.column(UNIT_COLUMNS).ok_or_else(|| missing("unit"))?;
    let category_col = sheet.column(CATEGORY_COLUMNS).ok_or_else(|| missing("category"))?;
    let quantity_col = sheet.column(QUANTITY_COLUMNS).ok_or_else(|| missing("quantity"))?;

    let mut predicted = PredictedEstablishment::new();
    let mut skipped = 0;
    for row in &sheet.rows {
        let unit = Sheet::cell(row, unit_col);
        let category = Sheet::cell(row, category_col);
        match quantity(Sheet::cell(row, quantity_col)) {
            Some(count) if !unit.is_empty() && !category.is_empty() => {
                // Repeated unit/category rows add up
                predicted.add(unit, &category_label(category), count);
            }
            _ => skipped += 1,
        }
    }

    if predicted.is_empty() {
        return Err(EfetivoError::import(format!(
            "sheet '{}' has no valid predicted rows",
            sheet.name
        )));
    }
    Ok((predicted, skipped))
}

fn read_groups(sheet: &Sheet) -> Option<Vec<Group>> {
    let (Some(name_col), Some(unit_col)) = (sheet.column(GROUP_NAME_COLUMNS), sheet.column(GROUP_UNIT_COLUMNS)) else {
        warn!(sheet = %sheet.name, "Groups sheet lacks group or unit column; ignored");
        return None;
    };

    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for row in &sheet.rows {
        let name = Sheet::cell(row, name_col);
        if name.is_empty() {
            continue;
        }
        let position = *index.entry(name.to_string()).or_insert_with(|| {
            groups.push(Group::new(name, Vec::new()));
            groups.len() - 1
        });
        let group = &mut groups[position];
        for unit in Sheet::cell(row, unit_col)
            .split([',', ';'])
            .map(str::trim)
            .filter(|u| !u.is_empty())
        {
            if !group.contains(unit) {
                group.units.push(unit.to_string());
            }
        }
    }

    if groups.is_empty() {
        warn!(sheet = %sheet.name, "Groups sheet has no rows; ignored");
        return None;
    }
    Some(groups)
}

fn read_info(sheet: &Sheet) -> Option<DdqodInfo> {
    let row = sheet.rows.first()?;
    let description = sheet
        .column(DESCRIPTION_COLUMNS)
        .map(|c| Sheet::cell(row, c).to_string())
        .unwrap_or_default();
    let last_updated = sheet
        .column(UPDATED_COLUMNS)
        .map(|c| Sheet::cell(row, c).to_string())
        .unwrap_or_default();
    if description.is_empty() && last_updated.is_empty() {
        return None;
    }
    Some(DdqodInfo {
        description,
        last_updated,
    })
}
