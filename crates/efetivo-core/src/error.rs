use std::fmt;

use thiserror::Error;

/// Kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Unit,
    Role,
    RankClass,
    Rank,
    Group,
    Person,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Unit => write!(f, "unit"),
            EntityKind::Role => write!(f, "role"),
            EntityKind::RankClass => write!(f, "rank class"),
            EntityKind::Rank => write!(f, "rank"),
            EntityKind::Group => write!(f, "group"),
            EntityKind::Person => write!(f, "person"),
        }
    }
}

/// Broad category of an error, for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; the operation was aborted and nothing changed.
    Validation,
    /// A deletion blocked by existing references.
    Blocked,
    /// A malformed import file; prior state retained.
    ImportFormat,
    /// Storage failure.
    Persistence,
}

#[derive(Error, Debug)]
pub enum EfetivoError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{kind} '{name}' already exists")]
    DuplicateName { kind: EntityKind, name: String },

    #[error("parent unit '{parent}' of '{unit}' does not exist")]
    InvalidParent { unit: String, parent: String },

    #[error("unit '{0}' cannot be its own parent")]
    SelfParent(String),

    #[error("placing '{unit}' under '{parent}' would create a cycle")]
    Cycle { unit: String, parent: String },

    #[error("{kind} '{name}' not found")]
    NotFound { kind: EntityKind, name: String },

    #[error("unknown {kind} '{name}'")]
    UnknownReference { kind: EntityKind, name: String },

    #[error("no person at position {index} (roster has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{kind} '{name}' is used by {count} person(s)")]
    InUse {
        kind: EntityKind,
        name: String,
        count: usize,
    },

    #[error("unit '{unit}' has child units: {}", .children.join(", "))]
    HasChildren { unit: String, children: Vec<String> },

    #[error("invalid import file: {0}")]
    ImportFormat(String),

    #[error("stored data under '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export failed: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, EfetivoError>;

impl EfetivoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EfetivoError::MissingField { .. }
            | EfetivoError::DuplicateName { .. }
            | EfetivoError::InvalidParent { .. }
            | EfetivoError::SelfParent(_)
            | EfetivoError::Cycle { .. }
            | EfetivoError::NotFound { .. }
            | EfetivoError::UnknownReference { .. }
            | EfetivoError::IndexOutOfRange { .. } => ErrorKind::Validation,
            EfetivoError::InUse { .. } | EfetivoError::HasChildren { .. } => ErrorKind::Blocked,
            EfetivoError::ImportFormat(_) => ErrorKind::ImportFormat,
            EfetivoError::Corrupt { .. } | EfetivoError::Io(_) | EfetivoError::Export(_) => {
                ErrorKind::Persistence
            }
        }
    }

    pub(crate) fn import(message: impl Into<String>) -> Self {
        EfetivoError::ImportFormat(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            EfetivoError::SelfParent("SDTS".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EfetivoError::HasChildren {
                unit: "SDTS".into(),
                children: vec!["SDTS1".into()],
            }
            .kind(),
            ErrorKind::Blocked
        );
        assert_eq!(EfetivoError::import("empty").kind(), ErrorKind::ImportFormat);
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        assert_eq!(EfetivoError::from(io).kind(), ErrorKind::Persistence);
    }

    #[test]
    fn test_has_children_message_lists_children() {
        let err = EfetivoError::HasChildren {
            unit: "NTS".into(),
            children: vec!["NTS TELECOM".into(), "NTS CONTRATOS".into()],
        };
        assert_eq!(
            err.to_string(),
            "unit 'NTS' has child units: NTS TELECOM, NTS CONTRATOS"
        );
    }
}
