//! crmsync-ines library interface
//!
//! Pushes local contacts and companies to an Ines CRM account.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod integration;
pub mod mapper;
pub mod models;
pub mod sync;
pub mod templates;

pub use crate::error::{IntegrationError, IntegrationResult};
pub use crate::sync::{BatchDriver, PushOutcome, PushParams, PushSummary, Reconciler, SyncBranch};
