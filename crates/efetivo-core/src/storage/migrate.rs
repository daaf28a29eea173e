//! Load-time normalization of stored configuration.
//!
//! Older configurations stored units and roles as bare strings. Both shapes
//! are accepted and converted once into the structured form.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::{palette_color, Role, Unit};
use crate::taxonomy::Taxonomy;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredUnit {
    Name(String),
    Full {
        nome: String,
        #[serde(default)]
        pai: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredRole {
    Name(String),
    Full {
        nome: String,
        #[serde(default)]
        ordem: Option<u32>,
        #[serde(default)]
        cor: Option<String>,
    },
}

/// Configuration document as found in storage, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoredTaxonomy {
    #[serde(default)]
    pub locais: Vec<StoredUnit>,
    #[serde(default)]
    pub funcoes: Vec<StoredRole>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub postos: Vec<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn unique_names(values: Vec<String>, what: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| {
            if v.is_empty() || !seen.insert(v.clone()) {
                warn!(entry = %v, kind = what, "Skipping blank or duplicate stored entry");
                false
            } else {
                true
            }
        })
        .collect()
}

impl From<StoredTaxonomy> for Taxonomy {
    fn from(stored: StoredTaxonomy) -> Self {
        let mut migrated = 0usize;

        let mut seen = HashSet::new();
        let mut units = Vec::with_capacity(stored.locais.len());
        for entry in stored.locais {
            let (name, parent) = match entry {
                StoredUnit::Name(name) => {
                    migrated += 1;
                    (name, None)
                }
                StoredUnit::Full { nome, pai } => (nome, non_blank(pai)),
            };
            let name = name.trim().to_string();
            if name.is_empty() || !seen.insert(name.clone()) {
                warn!(unit = %name, "Skipping blank or duplicate stored unit");
                continue;
            }
            units.push(Unit { name, parent });
        }

        let mut seen = HashSet::new();
        let mut roles = Vec::with_capacity(stored.funcoes.len());
        for (position, entry) in stored.funcoes.into_iter().enumerate() {
            let fallback_order = position as u32 + 1;
            let (name, order, color) = match entry {
                StoredRole::Name(name) => {
                    migrated += 1;
                    (name, fallback_order, None)
                }
                StoredRole::Full { nome, ordem, cor } => (nome, ordem.unwrap_or(fallback_order), non_blank(cor)),
            };
            let name = name.trim().to_string();
            if name.is_empty() || !seen.insert(name.clone()) {
                warn!(role = %name, "Skipping blank or duplicate stored role");
                continue;
            }
            let color = color.unwrap_or_else(|| palette_color(position).to_string());
            roles.push(Role { name, order, color });
        }

        if migrated > 0 {
            debug!(migrated, "Migrated legacy configuration entries");
        }

        Taxonomy::from_parts(
            units,
            roles,
            unique_names(stored.classes, "class"),
            unique_names(stored.postos, "rank"),
        )
    }
}
