//! HTTP/JSON client for the Ines CRM web service
//!
//! Each operation is a JSON POST to `{base_url}/{Operation}`. Responses wrap
//! their payload in an `{Operation}Result` member. A session is opened
//! lazily with the account credentials and reused until the service
//! rejects it.

use super::InesApi;
use crate::config::InesSettings;
use crate::error::{IntegrationError, IntegrationResult};
use crate::models::{
    ClientPayload, ClientWithContactsPayload, ContactPayload, CreatedClientWithContacts,
    CustomFieldCreate, CustomFieldUpdate, CustomFieldValue, RemoteClient, RemoteContact, SyncInfo,
};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// User-Agent sent with every request
const USER_AGENT: &str = concat!("crmsync-ines/", env!("CARGO_PKG_VERSION"));

/// Header carrying the session token
const SESSION_HEADER: &str = "X-Ines-Session";

/// Ines CRM web-service client
pub struct HttpInesApi {
    http_client: Client,
    base_url: String,
    account: String,
    username: String,
    password: String,
    /// Session token, opened on first use
    session: Mutex<Option<String>>,
}

impl HttpInesApi {
    pub fn new(settings: &InesSettings) -> IntegrationResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );

        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| IntegrationError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            account: settings.account.clone(),
            username: settings.username.clone(),
            password: settings.password.clone(),
            session: Mutex::new(None),
        })
    }

    fn operation_url(&self, operation: &str) -> String {
        format!("{}/{}", self.base_url, operation)
    }

    async fn session_token(&self) -> IntegrationResult<String> {
        let mut session = self.session.lock().await;
        if let Some(token) = session.as_ref() {
            return Ok(token.clone());
        }

        let token = self.login().await?;
        *session = Some(token.clone());
        Ok(token)
    }

    async fn login(&self) -> IntegrationResult<String> {
        debug!(account = %self.account, user = %self.username, "Opening Ines session");

        let body = wire::LoginRequest {
            account: &self.account,
            user_name: &self.username,
            password: &self.password,
        };

        let response = self
            .http_client
            .post(self.operation_url("Login"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(IntegrationError::Auth(format!("{}: {}", status, detail)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| IntegrationError::Parse(format!("Login response: {}", e)))?;
        let token: String = wire::take_result("Login", body)?;

        if token.trim().is_empty() {
            return Err(IntegrationError::Auth("Empty session token".to_string()));
        }

        info!(account = %self.account, "Ines session opened");
        Ok(token)
    }

    /// POST one operation and return its `{Operation}Result` member
    async fn call<B, T>(&self, operation: &'static str, body: &B) -> IntegrationResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let body = self.post(operation, body).await?;
        wire::take_result(operation, body)
    }

    /// Call an operation whose response carries no data
    async fn call_unit<B>(&self, operation: &'static str, body: &B) -> IntegrationResult<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.post(operation, body).await?;
        Ok(())
    }

    async fn post<B>(&self, operation: &'static str, body: &B) -> IntegrationResult<Value>
    where
        B: Serialize + ?Sized + Sync,
    {
        let token = self.session_token().await?;
        debug!(operation, "Ines request");

        let response = self
            .http_client
            .post(self.operation_url(operation))
            .header(SESSION_HEADER, token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // Next call logs in again
            *self.session.lock().await = None;
            let detail = response.text().await.unwrap_or_default();
            return Err(IntegrationError::Auth(format!("{} rejected session: {}", operation, detail)));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(IntegrationError::Api(status.as_u16(), detail));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text)
            .map_err(|e| IntegrationError::Parse(format!("{} response: {}", operation, e)))
    }
}

#[async_trait]
impl InesApi for HttpInesApi {
    async fn create_client_with_contacts(
        &self,
        payload: &ClientWithContactsPayload,
    ) -> IntegrationResult<CreatedClientWithContacts> {
        let created: wire::CreatedClient = self.call("AddClientWithContacts", payload).await?;
        Ok(created.into())
    }

    async fn create_client(&self, payload: &ClientPayload) -> IntegrationResult<i64> {
        let created: wire::Created = self.call("AddClient", payload).await?;
        Ok(created.internal_ref)
    }

    async fn create_contact(&self, payload: &ContactPayload) -> IntegrationResult<i64> {
        let created: wire::Created = self.call("AddContact", payload).await?;
        Ok(created.internal_ref)
    }

    async fn get_client(&self, client_ref: i64) -> IntegrationResult<RemoteClient> {
        self.call("GetClient", &wire::Reference::new(client_ref)).await
    }

    async fn get_contact(&self, contact_ref: i64) -> IntegrationResult<RemoteContact> {
        self.call("GetContact", &wire::Reference::new(contact_ref)).await
    }

    async fn update_client(&self, client: &RemoteClient) -> IntegrationResult<()> {
        self.call_unit("UpdateClient", &wire::UpdateClient { client }).await
    }

    async fn update_contact(&self, contact: &RemoteContact) -> IntegrationResult<()> {
        self.call_unit("UpdateContact", &wire::UpdateContact { contact })
            .await
    }

    async fn get_client_custom_fields(
        &self,
        client_ref: i64,
    ) -> IntegrationResult<Vec<CustomFieldValue>> {
        let values: wire::CustomFieldValues = self
            .call("GetCompanyCF", &wire::Reference::new(client_ref))
            .await?;
        Ok(values.into_vec())
    }

    async fn get_contact_custom_fields(
        &self,
        contact_ref: i64,
    ) -> IntegrationResult<Vec<CustomFieldValue>> {
        let values: wire::CustomFieldValues = self
            .call("GetContactCF", &wire::Reference::new(contact_ref))
            .await?;
        Ok(values.into_vec())
    }

    async fn create_client_custom_field(&self, payload: &CustomFieldCreate) -> IntegrationResult<()> {
        self.call_unit("InsertCompanyCF", &wire::create_custom_field(payload))
            .await
    }

    async fn update_client_custom_field(&self, payload: &CustomFieldUpdate) -> IntegrationResult<()> {
        self.call_unit("UpdateCompanyCF", &wire::update_custom_field(payload))
            .await
    }

    async fn create_contact_custom_field(
        &self,
        payload: &CustomFieldCreate,
    ) -> IntegrationResult<()> {
        self.call_unit("InsertContactCF", &wire::create_custom_field(payload))
            .await
    }

    async fn update_contact_custom_field(
        &self,
        payload: &CustomFieldUpdate,
    ) -> IntegrationResult<()> {
        self.call_unit("UpdateContactCF", &wire::update_custom_field(payload))
            .await
    }

    async fn create_company(&self, payload: &ClientPayload) -> IntegrationResult<i64> {
        let created: wire::Created = self.call("CreateCompany", payload).await?;
        Ok(created.internal_ref)
    }

    async fn get_sync_info(&self) -> IntegrationResult<SyncInfo> {
        let info: wire::SyncInfo = self.call("GetSyncInfo", &serde_json::json!({})).await?;
        Ok(info.into())
    }
}

/// Wire shapes of the web service
mod wire {
    use crate::error::{IntegrationError, IntegrationResult};
    use crate::models::{
        CreatedClientWithContacts, CustomFieldCreate, CustomFieldDefinition, CustomFieldOwner,
        CustomFieldUpdate, CustomFieldValue, RemoteClient, RemoteContact,
    };
    use crmsync_common::fields::FieldValue;
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Serialize};
    use serde_json::{Map, Value};

    /// Extract and decode the `{operation}Result` member
    pub fn take_result<T: DeserializeOwned>(operation: &'static str, body: Value) -> IntegrationResult<T> {
        let key = format!("{}Result", operation);
        let result = match body {
            Value::Object(mut members) => members.remove(&key),
            _ => None,
        }
        .ok_or_else(|| IntegrationError::MissingResult {
            operation,
            detail: format!("no {} member", key),
        })?;

        serde_json::from_value(result)
            .map_err(|e| IntegrationError::Parse(format!("{}: {}", key, e)))
    }

    /// Collections holding a single element arrive unwrapped
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    impl<T> OneOrMany<T> {
        pub fn into_vec(self) -> Vec<T> {
            match self {
                OneOrMany::Many(items) => items,
                OneOrMany::One(item) => vec![item],
            }
        }
    }

    fn flatten<T>(items: Option<OneOrMany<T>>) -> Vec<T> {
        items.map(OneOrMany::into_vec).unwrap_or_default()
    }

    #[derive(Serialize)]
    pub struct LoginRequest<'a> {
        #[serde(rename = "compte")]
        pub account: &'a str,
        #[serde(rename = "userName")]
        pub user_name: &'a str,
        pub password: &'a str,
    }

    #[derive(Serialize)]
    pub struct Reference {
        pub reference: i64,
    }

    impl Reference {
        pub fn new(reference: i64) -> Self {
            Self { reference }
        }
    }

    #[derive(Serialize)]
    pub struct UpdateClient<'a> {
        pub client: &'a RemoteClient,
    }

    #[derive(Serialize)]
    pub struct UpdateContact<'a> {
        pub contact: &'a RemoteContact,
    }

    #[derive(Debug, Deserialize)]
    pub struct Created {
        #[serde(rename = "InternalRef")]
        pub internal_ref: i64,
    }

    #[derive(Debug, Deserialize)]
    pub struct CreatedContacts {
        #[serde(rename = "ContactInfoAuto")]
        pub items: Option<OneOrMany<Created>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CreatedClient {
        #[serde(rename = "InternalRef")]
        pub internal_ref: i64,
        #[serde(rename = "Contacts")]
        pub contacts: Option<CreatedContacts>,
    }

    impl From<CreatedClient> for CreatedClientWithContacts {
        fn from(created: CreatedClient) -> Self {
            let contact_refs = flatten(created.contacts.and_then(|c| c.items))
                .into_iter()
                .map(|c| c.internal_ref)
                .collect();

            CreatedClientWithContacts {
                client_ref: created.internal_ref,
                contact_refs,
            }
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct CustomFieldList {
        #[serde(rename = "CustomField")]
        pub items: Option<OneOrMany<CustomFieldValue>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CustomFieldValues {
        #[serde(rename = "Values")]
        pub values: Option<CustomFieldList>,
    }

    impl CustomFieldValues {
        pub fn into_vec(self) -> Vec<CustomFieldValue> {
            flatten(self.values.and_then(|v| v.items))
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct DefinitionList {
        #[serde(rename = "CustomFieldToAuto")]
        pub items: Option<OneOrMany<CustomFieldDefinition>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct SyncInfo {
        #[serde(rename = "ContactCustomFields")]
        pub contact: Option<DefinitionList>,
        #[serde(rename = "CompanyCustomFields")]
        pub company: Option<DefinitionList>,
    }

    impl From<SyncInfo> for crate::models::SyncInfo {
        fn from(info: SyncInfo) -> Self {
            crate::models::SyncInfo {
                contact_custom_fields: flatten(info.contact.and_then(|l| l.items)),
                company_custom_fields: flatten(info.company.and_then(|l| l.items)),
            }
        }
    }

    fn owner_member(owner: CustomFieldOwner) -> (&'static str, Value) {
        match owner {
            CustomFieldOwner::Client(r) => ("clRef", Value::from(r)),
            CustomFieldOwner::Contact(r) => ("ctRef", Value::from(r)),
        }
    }

    fn value_member(value: &FieldValue) -> Value {
        serde_json::to_value(value).unwrap_or(Value::Null)
    }

    pub fn create_custom_field(payload: &CustomFieldCreate) -> Value {
        let (owner_key, owner_ref) = owner_member(payload.owner);
        let mut members = Map::new();
        members.insert(owner_key.to_string(), owner_ref);
        members.insert("chdefRef".to_string(), Value::from(payload.definition_ref));
        members.insert("chpValue".to_string(), value_member(&payload.value));
        members.insert("chvLies".to_string(), Value::from(payload.linked));
        members.insert("chvGroupeAssoc".to_string(), Value::from(payload.group_assoc));
        Value::Object(members)
    }

    pub fn update_custom_field(payload: &CustomFieldUpdate) -> Value {
        let (owner_key, owner_ref) = owner_member(payload.owner);
        let mut members = Map::new();
        members.insert(owner_key.to_string(), owner_ref);
        members.insert("chdefRef".to_string(), Value::from(payload.definition_ref));
        members.insert("chpRef".to_string(), Value::from(payload.value_ref));
        members.insert("chpValue".to_string(), value_member(&payload.value));
        Value::Object(members)
    }
}
