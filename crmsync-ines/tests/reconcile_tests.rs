//! Reconciliation engine tests
//!
//! Each test drives the [`Reconciler`] against a temporary local store and
//! the in-memory remote, then checks both the remote calls issued and the
//! cross-references persisted locally.

mod helpers;

use crmsync_common::db::LocalStore;
use crmsync_common::fields::FieldValue;
use crmsync_ines::models::{RemoteClient, RemoteContact};
use crmsync_ines::{Reconciler, SyncBranch};
use helpers::db_utils::{create_test_store, lead_mapping, reload, seed_lead, REF_FIELD};
use helpers::mock_api::{Call, MockInesApi};
use std::sync::Arc;

fn reconciler(api: &Arc<MockInesApi>, store: Arc<dyn LocalStore>) -> Reconciler {
    Reconciler::new(api.clone(), store, lead_mapping())
}

fn remote_client(client_ref: i64, name: &str) -> RemoteClient {
    RemoteClient {
        internal_ref: client_ref,
        company_name: name.to_string(),
        ..RemoteClient::default()
    }
}

fn remote_contact(contact_ref: i64, client_ref: i64, email: &str) -> RemoteContact {
    RemoteContact {
        internal_ref: contact_ref,
        company_ref: client_ref,
        primary_mail_address: email.to_string(),
        ..RemoteContact::default()
    }
}

// ============================================================================
// Branch 1: neither side linked
// ============================================================================

#[tokio::test]
async fn test_unlinked_lead_creates_client_with_contact() {
    let (_temp, store) = create_test_store().await;
    let api = Arc::new(MockInesApi::new());
    let (mut contact, mut company) = seed_lead(&store, "a@x.io", "Acme").await;

    let outcome = reconciler(&api, store.clone())
        .reconcile(&mut contact, &mut company)
        .await
        .unwrap();

    assert_eq!(outcome.branch, Some(SyncBranch::CreateBoth));
    assert_eq!(outcome.client_ref, Some(10));
    assert_eq!(outcome.contact_ref, Some(20));
    assert_eq!(api.call_names(), vec!["CreateClientWithContacts"]);

    let calls = api.calls();
    let Call::CreateClientWithContacts(payload) = &calls[0] else {
        panic!("expected a combined create");
    };
    assert_eq!(payload.client.company_name, "Acme");
    assert_eq!(payload.client.internal_ref, 0);
    assert_eq!(payload.client.automation_ref, company.id);
    assert_eq!(payload.client.contacts.items.len(), 1);
    let embedded = &payload.client.contacts.items[0];
    assert_eq!(embedded.primary_mail_address, "a@x.io");
    assert_eq!(embedded.internal_ref, 0);
    assert_eq!(embedded.automation_ref, contact.id);

    // References persisted on both local records
    let (contact, company) = reload(&store, &contact, &company).await;
    assert_eq!(contact.extra[REF_FIELD], FieldValue::Integer(20));
    assert_eq!(company.extra[REF_FIELD], FieldValue::Integer(10));
}

#[tokio::test]
async fn test_rerun_does_not_create_twice() {
    let (_temp, store) = create_test_store().await;
    let api = Arc::new(MockInesApi::new());
    let (contact, company) = seed_lead(&store, "a@x.io", "Acme").await;
    let reconciler = reconciler(&api, store.clone());

    for _ in 0..2 {
        let mut contact = store.load_contact(contact.id).await.unwrap();
        reconciler.push_lead(&mut contact).await.unwrap();
    }

    assert_eq!(api.count("CreateClientWithContacts"), 1);
    assert_eq!(api.creates(), 1);
    assert_eq!(api.updates(), 0);

    // Second pass took the update path against the created records
    api.clear_calls();
    let mut contact = store.load_contact(contact.id).await.unwrap();
    let outcome = reconciler.push_lead(&mut contact).await.unwrap();
    assert_eq!(outcome.branch, Some(SyncBranch::UpdateBoth));
    assert_eq!(api.call_names(), vec!["GetClient", "GetContact"]);

    let company = store.load_company(company.id).await.unwrap();
    assert_eq!(company.extra[REF_FIELD], FieldValue::Integer(10));
}

#[tokio::test]
async fn test_combined_create_failure_leaves_records_unlinked() {
    let (_temp, store) = create_test_store().await;
    let api = Arc::new(MockInesApi::new());
    api.fail_on("CreateClientWithContacts");
    let (mut contact, mut company) = seed_lead(&store, "a@x.io", "Acme").await;

    let err = reconciler(&api, store.clone())
        .reconcile(&mut contact, &mut company)
        .await
        .unwrap_err();

    assert!(err.is_remote());
    let (contact, company) = reload(&store, &contact, &company).await;
    assert_eq!(contact.extra[REF_FIELD], FieldValue::Null);
    assert_eq!(company.extra[REF_FIELD], FieldValue::Null);
}

// ============================================================================
// Branch 2: contact linked, client not
// ============================================================================

#[tokio::test]
async fn test_linked_contact_gets_new_client_and_update() {
    let (_temp, store) = create_test_store().await;
    let api = Arc::new(MockInesApi::new());
    api.seed_contact(remote_contact(55, 0, "old@x.io"));

    let (mut contact, mut company) = seed_lead(&store, "new@x.io", "Acme").await;
    contact.extra.insert(REF_FIELD.to_string(), FieldValue::Integer(55));
    store.save_contact(&contact).await.unwrap();

    let outcome = reconciler(&api, store.clone())
        .reconcile(&mut contact, &mut company)
        .await
        .unwrap();

    assert_eq!(outcome.branch, Some(SyncBranch::CreateClientUpdateContact));
    assert_eq!(outcome.client_ref, Some(10));
    assert_eq!(outcome.contact_ref, Some(55));
    assert!(outcome.contact_updated);
    assert!(!outcome.transfer_pending);
    assert_eq!(
        api.call_names(),
        vec!["CreateClient", "GetContact", "UpdateContact"]
    );
    assert_eq!(api.contact(55).unwrap().primary_mail_address, "new@x.io");

    let (_, company) = reload(&store, &contact, &company).await;
    assert_eq!(company.extra[REF_FIELD], FieldValue::Integer(10));
}

#[tokio::test]
async fn test_contact_owned_by_other_client_is_flagged_not_moved() {
    let (_temp, store) = create_test_store().await;
    let api = Arc::new(MockInesApi::new());
    api.seed_contact(remote_contact(55, 99, "a@x.io"));

    let (mut contact, mut company) = seed_lead(&store, "a@x.io", "Acme").await;
    contact.extra.insert(REF_FIELD.to_string(), FieldValue::Integer(55));

    let outcome = reconciler(&api, store.clone())
        .reconcile(&mut contact, &mut company)
        .await
        .unwrap();

    assert!(outcome.transfer_pending);
    assert!(!outcome.contact_updated);
    assert_eq!(api.contact(55).unwrap().company_ref, 99);
}

// ============================================================================
// Branch 3: client linked, contact not
// ============================================================================

#[tokio::test]
async fn test_linked_company_gets_new_contact() {
    let (_temp, store) = create_test_store().await;
    let api = Arc::new(MockInesApi::new());
    api.seed_client(remote_client(77, "Acme Old"));

    let (mut contact, mut company) = seed_lead(&store, "a@x.io", "Acme").await;
    contact.points = 42;
    company.extra.insert(REF_FIELD.to_string(), FieldValue::Integer(77));

    let outcome = reconciler(&api, store.clone())
        .reconcile(&mut contact, &mut company)
        .await
        .unwrap();

    assert_eq!(outcome.branch, Some(SyncBranch::UpdateClientCreateContact));
    assert_eq!(outcome.client_ref, Some(77));
    assert_eq!(outcome.contact_ref, Some(20));
    assert!(outcome.client_updated);
    assert_eq!(
        api.call_names(),
        vec!["GetClient", "CreateContact", "UpdateClient"]
    );

    let calls = api.calls();
    let Call::CreateContact(payload) = &calls[1] else {
        panic!("expected a contact create");
    };
    assert_eq!(payload.client_ref, 77);
    assert_eq!(payload.automation_ref, contact.id);
    assert_eq!(payload.scoring, 42);
    assert_eq!(payload.contact.primary_mail_address, "a@x.io");
    assert_eq!(payload.contact.internal_ref, 0);

    assert_eq!(api.client(77).unwrap().company_name, "Acme");
    let stored = store.load_contact(contact.id).await.unwrap();
    assert_eq!(stored.extra[REF_FIELD], FieldValue::Integer(20));
}

// ============================================================================
// Branch 4: both linked
// ============================================================================

#[tokio::test]
async fn test_unchanged_records_issue_no_updates() {
    let (_temp, store) = create_test_store().await;
    let api = Arc::new(MockInesApi::new());
    api.seed_client(remote_client(10, "Acme"));
    api.seed_contact(remote_contact(20, 10, "a@x.io"));

    let (mut contact, mut company) = seed_lead(&store, "a@x.io", "Acme").await;
    contact.extra.insert(REF_FIELD.to_string(), FieldValue::Integer(20));
    company.extra.insert(REF_FIELD.to_string(), FieldValue::Integer(10));

    let outcome = reconciler(&api, store.clone())
        .reconcile(&mut contact, &mut company)
        .await
        .unwrap();

    assert_eq!(outcome.branch, Some(SyncBranch::UpdateBoth));
    assert!(!outcome.client_updated);
    assert!(!outcome.contact_updated);
    assert!(!outcome.transfer_pending);
    assert_eq!(api.creates(), 0);
    assert_eq!(api.updates(), 0);
}

#[tokio::test]
async fn test_single_changed_field_issues_one_update() {
    let (_temp, store) = create_test_store().await;
    let api = Arc::new(MockInesApi::new());
    let mut seeded = remote_client(10, "Acme");
    seeded.city = "Lyon".to_string();
    api.seed_client(seeded);
    api.seed_contact(remote_contact(20, 10, "a@x.io"));

    let (mut contact, mut company) = seed_lead(&store, "a@x.io", "Acme Corp").await;
    contact.extra.insert(REF_FIELD.to_string(), FieldValue::Integer(20));
    company.extra.insert(REF_FIELD.to_string(), FieldValue::Integer(10));

    let outcome = reconciler(&api, store.clone())
        .reconcile(&mut contact, &mut company)
        .await
        .unwrap();

    assert!(outcome.client_updated);
    assert!(!outcome.contact_updated);
    assert_eq!(api.count("UpdateClient"), 1);
    assert_eq!(api.count("UpdateContact"), 0);

    // The update carries the fetched record with only the mapped change applied
    let updated = api.client(10).unwrap();
    assert_eq!(updated.company_name, "Acme Corp");
    assert_eq!(updated.city, "Lyon");
    assert_eq!(updated.internal_ref, 10);
}

// ============================================================================
// Skips and configuration errors
// ============================================================================

#[tokio::test]
async fn test_contact_without_primary_company_is_skipped() {
    let (_temp, store) = create_test_store().await;
    let api = Arc::new(MockInesApi::new());
    let (contact, company) = seed_lead(&store, "a@x.io", "Acme").await;
    store.link_company(contact.id, company.id, false).await.unwrap();

    let mut contact = store.load_contact(contact.id).await.unwrap();
    let outcome = reconciler(&api, store.clone())
        .push_lead(&mut contact)
        .await
        .unwrap();

    assert!(outcome.is_skipped());
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_unmapped_cross_reference_is_configuration_error() {
    let (_temp, store) = create_test_store().await;
    let api = Arc::new(MockInesApi::new());
    let (mut contact, mut company) = seed_lead(&store, "a@x.io", "Acme").await;

    let mut config = lead_mapping();
    config.company_fields.remove("InternalRef");

    let err = Reconciler::new(api.clone(), store.clone(), config)
        .reconcile(&mut contact, &mut company)
        .await
        .unwrap_err();

    assert!(err.is_configuration());
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_undeclared_local_field_is_configuration_error() {
    let (_temp, store) = create_test_store().await;
    let api = Arc::new(MockInesApi::new());
    let (mut contact, mut company) = seed_lead(&store, "a@x.io", "Acme").await;

    let mut config = lead_mapping();
    config
        .lead_fields
        .insert("City".to_string(), "favourite_city".to_string());

    let err = Reconciler::new(api.clone(), store.clone(), config)
        .reconcile(&mut contact, &mut company)
        .await
        .unwrap_err();

    assert!(err.is_configuration());
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_non_numeric_reference_is_rejected() {
    let (_temp, store) = create_test_store().await;
    let api = Arc::new(MockInesApi::new());
    let (mut contact, mut company) = seed_lead(&store, "a@x.io", "Acme").await;
    contact
        .extra
        .insert(REF_FIELD.to_string(), FieldValue::from("not-a-ref"));

    let err = reconciler(&api, store.clone())
        .reconcile(&mut contact, &mut company)
        .await
        .unwrap_err();

    assert!(err.is_configuration());
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_remote_update_failure_propagates() {
    let (_temp, store) = create_test_store().await;
    let api = Arc::new(MockInesApi::new());
    api.seed_client(remote_client(10, "Acme"));
    api.seed_contact(remote_contact(20, 10, "old@x.io"));
    api.fail_on("UpdateContact");

    let (mut contact, mut company) = seed_lead(&store, "a@x.io", "Acme").await;
    contact.extra.insert(REF_FIELD.to_string(), FieldValue::Integer(20));
    company.extra.insert(REF_FIELD.to_string(), FieldValue::Integer(10));

    let err = reconciler(&api, store.clone())
        .reconcile(&mut contact, &mut company)
        .await
        .unwrap_err();

    assert!(err.is_remote());
    assert_eq!(api.contact(20).unwrap().primary_mail_address, "old@x.io");
}
