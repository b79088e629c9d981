//! sea-orm models for the HR store plus the closed set of table identifiers
//! that SQL text is allowed to interpolate.

pub mod department;
pub mod dependent;
pub mod employee;
pub mod project;
pub mod project_resource;
pub mod role;
pub mod salary_history;
mod table;

pub use table::{HrTable, UnknownTable};
