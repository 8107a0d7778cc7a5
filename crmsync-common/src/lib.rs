//! # CRM Sync Common Library
//!
//! Shared code for the CRM connectors:
//! - Local store (contacts, companies, declared custom fields)
//! - Dynamic field access and value coercion
//! - Field mapping configuration
//! - Configuration loading
//! - Sync window arithmetic

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod fields;
pub mod mapping;
pub mod time;

pub use error::{Error, Result};
pub use fields::{FieldAccess, FieldValue};
pub use mapping::{Concept, FieldMappingConfig, SyncObject};
