//! Remote Ines CRM transport
//!
//! [`InesApi`] is the seam between the sync engine and the web service.
//! [`http::HttpInesApi`] talks to the real service; tests substitute a
//! recording mock.

pub mod http;

pub use http::HttpInesApi;

use crate::error::IntegrationResult;
use crate::models::{
    ClientPayload, ClientWithContactsPayload, ContactPayload, CreatedClientWithContacts,
    CustomFieldCreate, CustomFieldUpdate, CustomFieldValue, RemoteClient, RemoteContact, SyncInfo,
};
use async_trait::async_trait;

/// Remote operations consumed by the connector
#[async_trait]
pub trait InesApi: Send + Sync {
    /// Create a client together with its embedded contacts
    async fn create_client_with_contacts(
        &self,
        payload: &ClientWithContactsPayload,
    ) -> IntegrationResult<CreatedClientWithContacts>;

    /// Create a client; returns its reference
    async fn create_client(&self, payload: &ClientPayload) -> IntegrationResult<i64>;

    /// Create a contact under an existing client; returns its reference
    async fn create_contact(&self, payload: &ContactPayload) -> IntegrationResult<i64>;

    async fn get_client(&self, client_ref: i64) -> IntegrationResult<RemoteClient>;

    async fn get_contact(&self, contact_ref: i64) -> IntegrationResult<RemoteContact>;

    async fn update_client(&self, client: &RemoteClient) -> IntegrationResult<()>;

    async fn update_contact(&self, contact: &RemoteContact) -> IntegrationResult<()>;

    async fn get_client_custom_fields(&self, client_ref: i64)
        -> IntegrationResult<Vec<CustomFieldValue>>;

    async fn get_contact_custom_fields(
        &self,
        contact_ref: i64,
    ) -> IntegrationResult<Vec<CustomFieldValue>>;

    async fn create_client_custom_field(&self, payload: &CustomFieldCreate) -> IntegrationResult<()>;

    async fn update_client_custom_field(&self, payload: &CustomFieldUpdate) -> IntegrationResult<()>;

    async fn create_contact_custom_field(&self, payload: &CustomFieldCreate)
        -> IntegrationResult<()>;

    async fn update_contact_custom_field(&self, payload: &CustomFieldUpdate)
        -> IntegrationResult<()>;

    /// One-way company push; returns the remote id
    async fn create_company(&self, payload: &ClientPayload) -> IntegrationResult<i64>;

    /// Custom field definitions per concept
    async fn get_sync_info(&self) -> IntegrationResult<SyncInfo>;
}
