//! Monthly traffic metric derivation and analysis.
//!
//! This module groups raw counts into a monthly table, windows change and
//! rolling metrics over each regional series, labels rows with categorical
//! tags, and summarizes the result per region and around the 2020 pandemic.

pub mod aggregate;
pub mod analyzer;
pub mod classify;
pub mod covid;
pub mod regional;
pub mod types;
pub mod utility;
