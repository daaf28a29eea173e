//! Taxonomy entries: organizational units and roles.

use serde::{Deserialize, Serialize};

/// Colors handed out to roles that do not specify one.
pub const ROLE_PALETTE: [&str; 8] = [
    "#1a365d", "#ed8936", "#38a169", "#805ad5", "#d53f8c", "#3182ce", "#dd6b20", "#718096",
];

/// An organizational unit. Units form a forest through `parent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Unit {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "pai")]
    pub parent: Option<String>,
}

impl Unit {
    pub fn new(name: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(str::to_string),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// A function a person holds within a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Role {
    #[serde(rename = "nome")]
    pub name: String,
    /// 1-based display order; dense across all roles.
    #[serde(rename = "ordem")]
    pub order: u32,
    #[serde(rename = "cor")]
    pub color: String,
}

impl Role {
    pub fn new(name: impl Into<String>, order: u32, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order,
            color: color.into(),
        }
    }
}

/// Palette color for the role at a zero-based position.
pub fn palette_color(position: usize) -> &'static str {
    ROLE_PALETTE[position % ROLE_PALETTE.len()]
}

/// Direction for moving a role in the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleDirection {
    Up,
    Down,
}
