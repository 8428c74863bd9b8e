// src/process/mod.rs

//! Cell-level and table-level transforms shared by both pipelines.

pub mod aggregate;
pub mod convert;
pub mod date_parser;
pub mod melt;
pub mod utils;
