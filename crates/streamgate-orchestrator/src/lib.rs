//! STREAMGATE Orchestrator — provisioning and credential lifecycle
//! services.
//!
//! This crate provides:
//! - Quota evaluation ([`quota::QuotaEvaluator`])
//! - Application lifecycle ([`application::ApplicationService`])
//! - Credential lifecycle ([`credential::CredentialService`])
//! - Dual-tier approvals ([`approval::ApprovalService`])
//! - Topic sharing and catalog ([`sharing::SharingService`])
//! - Gateway resync for admin operations
//!   ([`gateway_sync::GatewaySyncService`])
//!
//! Services are generic over the `streamgate-core` repository and
//! collaborator traits, so they carry no dependency on the database
//! crate.

pub mod application;
pub mod approval;
pub mod authz;
pub mod config;
pub mod credential;
pub mod gateway_sync;
pub mod password;
pub mod quota;
pub mod sharing;
mod trigger;

pub use config::OrchestratorConfig;
