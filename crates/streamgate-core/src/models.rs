//! Domain models for STREAMGATE.
//!
//! These are the core types shared across all crates.

pub mod application;
pub mod audit;
pub mod reference;
pub mod request;
pub mod service_account;
pub mod topic;
pub mod virtual_cluster;
pub mod workspace;
