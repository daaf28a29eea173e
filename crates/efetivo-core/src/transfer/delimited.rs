//! Delimited text export of roster rows.

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::{EfetivoError, Result};
use crate::models::{Person, SortColumn};

/// Header line of the roster export. Written unquoted.
pub fn csv_header() -> String {
    SortColumn::ALL
        .iter()
        .map(|c| c.header())
        .collect::<Vec<_>>()
        .join(",")
}

/// Serialize persons as CSV: the header, then one line per person with
/// every field quoted. Lines are separated by `\n` with no trailing newline.
pub fn write_csv<'a>(persons: impl IntoIterator<Item = &'a Person>) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for person in persons {
        let record = SortColumn::ALL.map(|column| person.field(column));
        writer
            .write_record(record)
            .map_err(|e| EfetivoError::Export(e.to_string()))?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| EfetivoError::Export(e.to_string()))?;
    let body = String::from_utf8(body).map_err(|e| EfetivoError::Export(e.to_string()))?;

    let mut out = csv_header();
    if !body.is_empty() {
        out.push('\n');
        out.push_str(body.trim_end_matches('\n'));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_unquoted() {
        assert_eq!(csv_header(), "NUMERO,POST/GRAD,NOME,LOCAL,FUNÇÃO,CLASSE");
        assert_eq!(write_csv(&[]).unwrap(), csv_header());
    }

    #[test]
    fn test_rows_fully_quoted() {
        let persons = vec![
            Person::new("1", "Cap", "ANA SILVA", "SDTS", "CHEFE", "OF"),
            Person::new("2", "Sd", "JOÃO \"JB\"", "NTS", "AUX", "CB/SD"),
        ];
        let csv = write_csv(&persons).unwrap();
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], r#""1","Cap","ANA SILVA","SDTS","CHEFE","OF""#);
        assert_eq!(lines[2], r#""2","Sd","JOÃO ""JB""","NTS","AUX","CB/SD""#);
    }
}
