//! STREAMGATE Core — domain models, error taxonomy, and the trait
//! seams shared across the control plane.
//!
//! This crate defines:
//! - Domain models ([`models`])
//! - The error taxonomy ([`error`])
//! - Repository traits ([`repository`])
//! - Principals and workspace roles ([`actor`])
//! - External collaborator contracts: workflow engine ([`workflow`]),
//!   admin gateway ([`gateway`]), notification sink ([`notify`])

pub mod actor;
pub mod error;
pub mod gateway;
pub mod models;
pub mod notify;
pub mod repository;
pub mod workflow;
