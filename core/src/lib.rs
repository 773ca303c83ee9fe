//! Revenue and enrollment reporting over a teachers source and a
//! students source.
//!
//! Leaf-first: `pricing` + `overrides` resolve unit prices,
//! `enrollment_index` groups records, `aggregation` turns both into a
//! `RevenueReport`. `store` and `loader` are the I/O around them.

pub mod aggregation;
pub mod config;
pub mod enrollment_index;
pub mod error;
pub mod loader;
pub mod model;
pub mod overrides;
pub mod pricing;
pub mod report;
pub mod store;
pub mod types;
