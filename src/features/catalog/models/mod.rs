mod catalog_item;
mod filter_spec;

pub use catalog_item::*;
pub use filter_spec::*;
