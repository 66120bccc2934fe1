pub mod catalog;
pub mod categories;
