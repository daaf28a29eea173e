//! Data models for the roster and its configuration.
//!
//! - `Person`: a roster entry, plus the `SortColumn` table columns
//! - `Unit`, `Role`: taxonomy entries
//! - `StaffingCategory`: normalized categories for the DDQOD reconciliation
//! - `Group`, `PredictedEstablishment`, `DdqodInfo`: DDQOD inputs

pub mod category;
pub mod ddqod;
pub mod person;
pub mod unit;

pub use category::{
    category_of, category_sort_key, StaffingCategory, ENLISTED_EQUIVALENT_CLASS,
    OFFICER_CLASS, OFFICER_EQUIVALENT_CLASS,
};
pub use ddqod::{DdqodInfo, Group, PredictedEstablishment};
pub use person::{Person, SortColumn, SENTINEL_ID};
pub use unit::{palette_color, Role, RoleDirection, Unit, ROLE_PALETTE};
