//! Import and export formats.
//!
//! - `json`: roster layout, full backup and DDQOD bundle
//! - `delimited`: CSV export of roster rows
//! - `sheet`: spreadsheet import of the DDQOD inputs

pub mod delimited;
pub mod json;
pub mod sheet;

pub use delimited::{csv_header, write_csv};
pub use json::{
    backup_json, ddqod_json, parse_ddqod, parse_roster, roster_json, Backup, DdqodBundle, RosterImport,
    EXPORT_VERSION,
};
pub use sheet::{import_workbook, Sheet, SheetImport, Workbook};

use chrono::{DateTime, Utc};

use crate::utils::file_date;

/// Kinds of exported files, for suggested file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    RosterCsv,
    RosterJson,
    Ddqod,
}

impl ExportKind {
    pub fn file_name(&self, at: DateTime<Utc>) -> String {
        let date = file_date(at);
        match self {
            ExportKind::RosterCsv => format!("efetivo_{date}.csv"),
            ExportKind::RosterJson => format!("efetivo_{date}.json"),
            ExportKind::Ddqod => format!("ddqod_{date}.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_export_file_names() {
        let at = Utc.with_ymd_and_hms(2025, 7, 4, 23, 59, 0).unwrap();
        assert_eq!(ExportKind::RosterCsv.file_name(at), "efetivo_2025-07-04.csv");
        assert_eq!(ExportKind::RosterJson.file_name(at), "efetivo_2025-07-04.json");
        assert_eq!(ExportKind::Ddqod.file_name(at), "ddqod_2025-07-04.json");
    }
}
