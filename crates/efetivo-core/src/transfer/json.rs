//! JSON documents: the roster layout, the full backup and the DDQOD bundle.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EfetivoError, Result};
use crate::models::{DdqodInfo, Group, PredictedEstablishment};
use crate::roster::GroupedRoster;
use crate::taxonomy::Taxonomy;

/// Format version written into exported bundles.
pub const EXPORT_VERSION: &str = "1.0";

pub fn export_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Everything the application stores, in one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub dados: GroupedRoster,
    #[serde(default)]
    pub config: Option<Taxonomy>,
    #[serde(default)]
    pub previsto: Option<PredictedEstablishment>,
    #[serde(default)]
    pub grupos: Option<Vec<Group>>,
    #[serde(default)]
    pub info: Option<DdqodInfo>,
    #[serde(rename = "exportDate", default)]
    pub export_date: String,
    #[serde(default)]
    pub version: String,
}

/// The DDQOD inputs without the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdqodBundle {
    #[serde(default)]
    pub info: DdqodInfo,
    #[serde(default)]
    pub grupos: Vec<Group>,
    pub previsto: PredictedEstablishment,
    #[serde(rename = "exportDate", default)]
    pub export_date: String,
    #[serde(default)]
    pub version: String,
}

/// A parsed roster import file.
#[derive(Debug, Clone, PartialEq)]
pub enum RosterImport {
    /// Bare `{unit: {class: [person]}}` layout.
    Grouped(GroupedRoster),
    Backup(Box<Backup>),
}

impl RosterImport {
    pub fn grouped(&self) -> &GroupedRoster {
        match self {
            RosterImport::Grouped(grouped) => grouped,
            RosterImport::Backup(backup) => &backup.dados,
        }
    }
}

fn parse_value(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| EfetivoError::import(format!("not valid JSON: {e}")))
}

/// Parse a roster file: either the grouped layout or a full backup.
pub fn parse_roster(text: &str) -> Result<RosterImport> {
    let value = parse_value(text)?;
    let Value::Object(map) = &value else {
        return Err(EfetivoError::import("roster file must be a JSON object"));
    };

    if map.contains_key("dados") {
        let backup: Backup = serde_json::from_value(value)
            .map_err(|e| EfetivoError::import(format!("malformed backup: {e}")))?;
        Ok(RosterImport::Backup(Box::new(backup)))
    } else {
        let grouped: GroupedRoster = serde_json::from_value(value)
            .map_err(|e| EfetivoError::import(format!("malformed roster: {e}")))?;
        Ok(RosterImport::Grouped(grouped))
    }
}

/// Parse a DDQOD bundle. `previsto` must be an object.
pub fn parse_ddqod(text: &str) -> Result<DdqodBundle> {
    let value = parse_value(text)?;
    match value.get("previsto") {
        Some(Value::Object(_)) => {}
        Some(_) => return Err(EfetivoError::import("'previsto' must be an object")),
        None => return Err(EfetivoError::import("missing 'previsto'")),
    }
    serde_json::from_value(value).map_err(|e| EfetivoError::import(format!("malformed DDQOD file: {e}")))
}

pub fn roster_json(grouped: &GroupedRoster) -> Result<String> {
    to_pretty(grouped)
}

pub fn backup_json(
    grouped: &GroupedRoster,
    taxonomy: &Taxonomy,
    predicted: &PredictedEstablishment,
    groups: &[Group],
    info: &DdqodInfo,
    at: DateTime<Utc>,
) -> Result<String> {
    to_pretty(&Backup {
        dados: grouped.clone(),
        config: Some(taxonomy.clone()),
        previsto: Some(predicted.clone()),
        grupos: Some(groups.to_vec()),
        info: Some(info.clone()),
        export_date: export_timestamp(at),
        version: EXPORT_VERSION.to_string(),
    })
}

pub fn ddqod_json(
    info: &DdqodInfo,
    groups: &[Group],
    predicted: &PredictedEstablishment,
    at: DateTime<Utc>,
) -> Result<String> {
    to_pretty(&DdqodBundle {
        info: info.clone(),
        grupos: groups.to_vec(),
        previsto: predicted.clone(),
        export_date: export_timestamp(at),
        version: EXPORT_VERSION.to_string(),
    })
}

fn to_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| EfetivoError::Export(e.to_string()))
}
