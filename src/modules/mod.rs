//! Modules layer - Infrastructure components shared by features
//!
//! Contains the query cache used to serve repeated reads.

pub mod cache;
