//! Port traits: the boundary between pipeline logic and I/O.

pub mod config_port;
pub mod data_port;
pub mod table_port;
