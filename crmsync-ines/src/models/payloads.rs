//! Request and response records for each remote operation

use super::remote::{RemoteClient, RemoteContact};
use crmsync_common::fields::FieldValue;
use serde::{Deserialize, Serialize};

/// Combined create: one client with its embedded contacts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientWithContactsPayload {
    pub client: RemoteClient,
}

/// References assigned by a combined create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedClientWithContacts {
    pub client_ref: i64,
    /// In the order the contacts were embedded
    pub contact_refs: Vec<i64>,
}

/// Client-only create
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientPayload {
    pub client: RemoteClient,
}

/// Contact create under an existing client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactPayload {
    pub contact: RemoteContact,
    /// Local contact id
    #[serde(rename = "AutomationRef")]
    pub automation_ref: i64,
    #[serde(rename = "clientRef")]
    pub client_ref: i64,
    /// Local engagement score
    pub scoring: i64,
}

/// Which remote entity a custom field value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomFieldOwner {
    Client(i64),
    Contact(i64),
}

impl CustomFieldOwner {
    pub fn entity_ref(&self) -> i64 {
        match self {
            CustomFieldOwner::Client(r) | CustomFieldOwner::Contact(r) => *r,
        }
    }
}

/// Existing custom field value on a remote entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomFieldValue {
    /// The value record's own reference
    #[serde(rename = "Ref")]
    pub value_ref: i64,
    pub definition_ref: i64,
    #[serde(default)]
    pub value: FieldValue,
}

/// Create a custom field value
#[derive(Debug, Clone, PartialEq)]
pub struct CustomFieldCreate {
    pub owner: CustomFieldOwner,
    pub definition_ref: i64,
    pub value: FieldValue,
    /// Always 0
    pub linked: i64,
    /// Always 0
    pub group_assoc: i64,
}

impl CustomFieldCreate {
    pub fn new(owner: CustomFieldOwner, definition_ref: i64, value: FieldValue) -> Self {
        Self {
            owner,
            definition_ref,
            value,
            linked: 0,
            group_assoc: 0,
        }
    }
}

/// Overwrite an existing custom field value
#[derive(Debug, Clone, PartialEq)]
pub struct CustomFieldUpdate {
    pub owner: CustomFieldOwner,
    pub definition_ref: i64,
    pub value_ref: i64,
    pub value: FieldValue,
}

/// Custom field definition advertised by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldDefinition {
    #[serde(rename = "InesID")]
    pub ines_id: i64,
    #[serde(rename = "InesName")]
    pub ines_name: String,
}

/// Sync metadata: custom field definitions per concept
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncInfo {
    pub contact_custom_fields: Vec<CustomFieldDefinition>,
    pub company_custom_fields: Vec<CustomFieldDefinition>,
}
