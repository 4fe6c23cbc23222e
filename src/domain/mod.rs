//! Core domain types and pipeline stages.

pub mod config_validation;
pub mod error;
pub mod features;
pub mod indicator;
pub mod indicator_stage;
pub mod label;
pub mod ohlcv;
pub mod pipeline;
pub mod returns;
pub mod row_filter;
pub mod series;
pub mod window;
