pub mod constants;
pub mod reconciliation;
pub mod types;
pub mod validation;

#[cfg(test)]
pub mod test_helpers;
