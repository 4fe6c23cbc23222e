//! seqprep: turns intraday OHLCV bars into windowed, labelled training data.
//!
//! Hexagonal architecture: pipeline logic in [`domain`], port traits in
//! [`ports`], concrete implementations in [`adapters`]. The binary in
//! `main.rs` is the only place that touches the process environment.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
