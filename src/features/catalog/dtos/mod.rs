mod catalog_dto;

pub use catalog_dto::*;
