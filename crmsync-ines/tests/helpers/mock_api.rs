//! In-memory Ines CRM double
//!
//! Records every call and keeps created records so follow-up fetches see
//! them, the way the real service would.

use async_trait::async_trait;
use crmsync_ines::api::InesApi;
use crmsync_ines::models::{
    ClientPayload, ClientWithContactsPayload, ContactList, ContactPayload,
    CreatedClientWithContacts, CustomFieldCreate, CustomFieldOwner, CustomFieldUpdate,
    CustomFieldValue, RemoteClient, RemoteContact, SyncInfo,
};
use crmsync_ines::{IntegrationError, IntegrationResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// One recorded remote call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateClientWithContacts(ClientWithContactsPayload),
    CreateClient(ClientPayload),
    CreateContact(ContactPayload),
    GetClient(i64),
    GetContact(i64),
    UpdateClient(RemoteClient),
    UpdateContact(RemoteContact),
    GetClientCustomFields(i64),
    GetContactCustomFields(i64),
    CreateClientCustomField(CustomFieldCreate),
    UpdateClientCustomField(CustomFieldUpdate),
    CreateContactCustomField(CustomFieldCreate),
    UpdateContactCustomField(CustomFieldUpdate),
    CreateCompany(ClientPayload),
    GetSyncInfo,
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::CreateClientWithContacts(_) => "CreateClientWithContacts",
            Call::CreateClient(_) => "CreateClient",
            Call::CreateContact(_) => "CreateContact",
            Call::GetClient(_) => "GetClient",
            Call::GetContact(_) => "GetContact",
            Call::UpdateClient(_) => "UpdateClient",
            Call::UpdateContact(_) => "UpdateContact",
            Call::GetClientCustomFields(_) => "GetClientCustomFields",
            Call::GetContactCustomFields(_) => "GetContactCustomFields",
            Call::CreateClientCustomField(_) => "CreateClientCustomField",
            Call::UpdateClientCustomField(_) => "UpdateClientCustomField",
            Call::CreateContactCustomField(_) => "CreateContactCustomField",
            Call::UpdateContactCustomField(_) => "UpdateContactCustomField",
            Call::CreateCompany(_) => "CreateCompany",
            Call::GetSyncInfo => "GetSyncInfo",
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(
            self,
            Call::CreateClientWithContacts(_)
                | Call::CreateClient(_)
                | Call::CreateContact(_)
                | Call::CreateCompany(_)
        )
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Call::UpdateClient(_) | Call::UpdateContact(_))
    }
}

struct MockState {
    calls: Vec<Call>,
    next_client_ref: i64,
    next_contact_ref: i64,
    next_value_ref: i64,
    clients: HashMap<i64, RemoteClient>,
    contacts: HashMap<i64, RemoteContact>,
    custom_values: HashMap<CustomFieldOwner, Vec<CustomFieldValue>>,
    sync_info: SyncInfo,
    failing: Vec<&'static str>,
}

/// Recording in-memory remote
pub struct MockInesApi {
    state: Mutex<MockState>,
}

impl Default for MockInesApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInesApi {
    /// New clients get refs from 10, contacts from 20
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                calls: Vec::new(),
                next_client_ref: 10,
                next_contact_ref: 20,
                next_value_ref: 100,
                clients: HashMap::new(),
                contacts: HashMap::new(),
                custom_values: HashMap::new(),
                sync_info: SyncInfo::default(),
                failing: Vec::new(),
            }),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls().iter().map(Call::name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| c.name() == name).count()
    }

    pub fn creates(&self) -> usize {
        self.calls().iter().filter(|c| c.is_create()).count()
    }

    pub fn updates(&self) -> usize {
        self.calls().iter().filter(|c| c.is_update()).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn client(&self, client_ref: i64) -> Option<RemoteClient> {
        self.state.lock().unwrap().clients.get(&client_ref).cloned()
    }

    pub fn contact(&self, contact_ref: i64) -> Option<RemoteContact> {
        self.state.lock().unwrap().contacts.get(&contact_ref).cloned()
    }

    pub fn seed_client(&self, client: RemoteClient) {
        self.state
            .lock()
            .unwrap()
            .clients
            .insert(client.internal_ref, client);
    }

    pub fn seed_contact(&self, contact: RemoteContact) {
        self.state
            .lock()
            .unwrap()
            .contacts
            .insert(contact.internal_ref, contact);
    }

    pub fn seed_custom_value(&self, owner: CustomFieldOwner, value: CustomFieldValue) {
        self.state
            .lock()
            .unwrap()
            .custom_values
            .entry(owner)
            .or_default()
            .push(value);
    }

    pub fn set_sync_info(&self, info: SyncInfo) {
        self.state.lock().unwrap().sync_info = info;
    }

    /// Make an operation (by [`Call::name`]) fail with a 500
    pub fn fail_on(&self, name: &'static str) {
        self.state.lock().unwrap().failing.push(name);
    }

    pub fn recover(&self, name: &str) {
        self.state.lock().unwrap().failing.retain(|n| *n != name);
    }

    fn record(&self, call: Call) -> IntegrationResult<std::sync::MutexGuard<'_, MockState>> {
        let mut state = self.state.lock().unwrap();
        let name = call.name();
        state.calls.push(call);
        if state.failing.contains(&name) {
            return Err(IntegrationError::Api(500, format!("{} failed", name)));
        }
        Ok(state)
    }
}

fn stored_contact(mut contact: RemoteContact, contact_ref: i64, client_ref: i64) -> RemoteContact {
    contact.internal_ref = contact_ref;
    contact.company_ref = client_ref;
    contact.is_new = false;
    contact
}

#[async_trait]
impl InesApi for MockInesApi {
    async fn create_client_with_contacts(
        &self,
        payload: &ClientWithContactsPayload,
    ) -> IntegrationResult<CreatedClientWithContacts> {
        let mut state = self.record(Call::CreateClientWithContacts(payload.clone()))?;

        let client_ref = state.next_client_ref;
        state.next_client_ref += 1;

        let mut contact_refs = Vec::new();
        for contact in &payload.client.contacts.items {
            let contact_ref = state.next_contact_ref;
            state.next_contact_ref += 1;
            state
                .contacts
                .insert(contact_ref, stored_contact(contact.clone(), contact_ref, client_ref));
            contact_refs.push(contact_ref);
        }

        let mut client = payload.client.clone();
        client.internal_ref = client_ref;
        client.is_new = false;
        client.contacts = ContactList::default();
        state.clients.insert(client_ref, client);

        Ok(CreatedClientWithContacts {
            client_ref,
            contact_refs,
        })
    }

    async fn create_client(&self, payload: &ClientPayload) -> IntegrationResult<i64> {
        let mut state = self.record(Call::CreateClient(payload.clone()))?;
        let client_ref = state.next_client_ref;
        state.next_client_ref += 1;

        let mut client = payload.client.clone();
        client.internal_ref = client_ref;
        client.is_new = false;
        state.clients.insert(client_ref, client);
        Ok(client_ref)
    }

    async fn create_contact(&self, payload: &ContactPayload) -> IntegrationResult<i64> {
        let mut state = self.record(Call::CreateContact(payload.clone()))?;
        let contact_ref = state.next_contact_ref;
        state.next_contact_ref += 1;

        let contact = stored_contact(payload.contact.clone(), contact_ref, payload.client_ref);
        state.contacts.insert(contact_ref, contact);
        Ok(contact_ref)
    }

    async fn get_client(&self, client_ref: i64) -> IntegrationResult<RemoteClient> {
        let state = self.record(Call::GetClient(client_ref))?;
        state
            .clients
            .get(&client_ref)
            .cloned()
            .ok_or_else(|| IntegrationError::Api(404, format!("client {}", client_ref)))
    }

    async fn get_contact(&self, contact_ref: i64) -> IntegrationResult<RemoteContact> {
        let state = self.record(Call::GetContact(contact_ref))?;
        state
            .contacts
            .get(&contact_ref)
            .cloned()
            .ok_or_else(|| IntegrationError::Api(404, format!("contact {}", contact_ref)))
    }

    async fn update_client(&self, client: &RemoteClient) -> IntegrationResult<()> {
        let mut state = self.record(Call::UpdateClient(client.clone()))?;
        state.clients.insert(client.internal_ref, client.clone());
        Ok(())
    }

    async fn update_contact(&self, contact: &RemoteContact) -> IntegrationResult<()> {
        let mut state = self.record(Call::UpdateContact(contact.clone()))?;
        state.contacts.insert(contact.internal_ref, contact.clone());
        Ok(())
    }

    async fn get_client_custom_fields(
        &self,
        client_ref: i64,
    ) -> IntegrationResult<Vec<CustomFieldValue>> {
        let state = self.record(Call::GetClientCustomFields(client_ref))?;
        Ok(state
            .custom_values
            .get(&CustomFieldOwner::Client(client_ref))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_contact_custom_fields(
        &self,
        contact_ref: i64,
    ) -> IntegrationResult<Vec<CustomFieldValue>> {
        let state = self.record(Call::GetContactCustomFields(contact_ref))?;
        Ok(state
            .custom_values
            .get(&CustomFieldOwner::Contact(contact_ref))
            .cloned()
            .unwrap_or_default())
    }

    async fn create_client_custom_field(&self, payload: &CustomFieldCreate) -> IntegrationResult<()> {
        let state = self.record(Call::CreateClientCustomField(payload.clone()))?;
        store_created_value(state, payload);
        Ok(())
    }

    async fn update_client_custom_field(&self, payload: &CustomFieldUpdate) -> IntegrationResult<()> {
        let state = self.record(Call::UpdateClientCustomField(payload.clone()))?;
        store_updated_value(state, payload);
        Ok(())
    }

    async fn create_contact_custom_field(
        &self,
        payload: &CustomFieldCreate,
    ) -> IntegrationResult<()> {
        let state = self.record(Call::CreateContactCustomField(payload.clone()))?;
        store_created_value(state, payload);
        Ok(())
    }

    async fn update_contact_custom_field(
        &self,
        payload: &CustomFieldUpdate,
    ) -> IntegrationResult<()> {
        let state = self.record(Call::UpdateContactCustomField(payload.clone()))?;
        store_updated_value(state, payload);
        Ok(())
    }

    async fn create_company(&self, payload: &ClientPayload) -> IntegrationResult<i64> {
        let mut state = self.record(Call::CreateCompany(payload.clone()))?;
        let client_ref = state.next_client_ref;
        state.next_client_ref += 1;
        Ok(client_ref)
    }

    async fn get_sync_info(&self) -> IntegrationResult<SyncInfo> {
        let state = self.record(Call::GetSyncInfo)?;
        Ok(state.sync_info.clone())
    }
}

fn store_created_value(mut state: std::sync::MutexGuard<'_, MockState>, payload: &CustomFieldCreate) {
    let value_ref = state.next_value_ref;
    state.next_value_ref += 1;
    state
        .custom_values
        .entry(payload.owner)
        .or_default()
        .push(CustomFieldValue {
            value_ref,
            definition_ref: payload.definition_ref,
            value: payload.value.clone(),
        });
}

fn store_updated_value(mut state: std::sync::MutexGuard<'_, MockState>, payload: &CustomFieldUpdate) {
    if let Some(values) = state.custom_values.get_mut(&payload.owner) {
        for value in values.iter_mut().filter(|v| v.value_ref == payload.value_ref) {
            value.value = payload.value.clone();
        }
    }
}
