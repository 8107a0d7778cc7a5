//! Database test utilities
//!
//! Provides a temporary local store seeded with the custom fields the
//! reconciliation tests map.

use chrono::{DateTime, Utc};
use crmsync_common::db::{FieldDefinition, LocalCompany, LocalContact, LocalStore, SqliteStore};
use crmsync_common::fields::FieldValue;
use crmsync_common::mapping::{Concept, FieldMappingConfig, SyncObject};
use std::sync::Arc;
use tempfile::TempDir;

/// Local field holding remote references on both contacts and companies
pub const REF_FIELD: &str = "inesRef";

/// Create a temporary database with the reference field declared
///
/// Returns (TempDir, store). The TempDir must be kept alive for the
/// duration of the test; dropping it deletes the database.
pub async fn create_test_store() -> (TempDir, Arc<SqliteStore>) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("crmsync_test.db");

    let store = SqliteStore::open(&db_path)
        .await
        .expect("Failed to open test store");

    for object in [Concept::Contact, Concept::Company] {
        declare(&store, object, REF_FIELD, "number").await;
    }

    (temp_dir, Arc::new(store))
}

/// Declare an additional custom local field
pub async fn declare(store: &SqliteStore, object: Concept, alias: &str, field_type: &str) {
    store
        .declare_field(&FieldDefinition {
            object,
            alias: alias.to_string(),
            label: alias.to_string(),
            field_type: field_type.to_string(),
        })
        .await
        .expect("Failed to declare field");
}

/// Insert a contact linked to a new primary company
pub async fn seed_lead(
    store: &SqliteStore,
    email: &str,
    company_name: &str,
) -> (LocalContact, LocalCompany) {
    seed_lead_at(store, email, company_name, Utc::now()).await
}

/// Insert a contact and its primary company, both created at `at`
pub async fn seed_lead_at(
    store: &SqliteStore,
    email: &str,
    company_name: &str,
    at: DateTime<Utc>,
) -> (LocalContact, LocalCompany) {
    let mut contact = LocalContact::new(email).with_extra(REF_FIELD, FieldValue::Null);
    contact.date_added = at;
    store
        .insert_contact(&mut contact)
        .await
        .expect("Failed to insert contact");

    let mut company = LocalCompany::new(company_name).with_extra(REF_FIELD, FieldValue::Null);
    company.date_added = at;
    store
        .insert_company(&mut company)
        .await
        .expect("Failed to insert company");

    store
        .link_company(contact.id, company.id, true)
        .await
        .expect("Failed to link company");

    (contact, company)
}

/// Reload a contact's and its company's stored state
pub async fn reload(
    store: &SqliteStore,
    contact: &LocalContact,
    company: &LocalCompany,
) -> (LocalContact, LocalCompany) {
    (
        store.load_contact(contact.id).await.expect("Contact missing"),
        store.load_company(company.id).await.expect("Company missing"),
    )
}

/// Minimal lead mapping: references plus email and company name
pub fn lead_mapping() -> FieldMappingConfig {
    let mut config = FieldMappingConfig::default();
    config
        .lead_fields
        .insert("InternalRef".to_string(), REF_FIELD.to_string());
    config
        .lead_fields
        .insert("PrimaryMailAddress".to_string(), "email".to_string());
    config
        .company_fields
        .insert("InternalRef".to_string(), REF_FIELD.to_string());
    config
        .company_fields
        .insert("CompanyName".to_string(), "name".to_string());
    config.objects.insert(SyncObject::Lead);
    config
}
