pub mod dashboard;
pub mod ddqod;
pub mod orgchart;
pub mod roster;
