//! Remote records and per-operation payloads

pub mod payloads;
pub mod remote;

pub use payloads::{
    ClientPayload, ClientWithContactsPayload, ContactPayload, CreatedClientWithContacts,
    CustomFieldCreate, CustomFieldDefinition, CustomFieldOwner, CustomFieldUpdate,
    CustomFieldValue, SyncInfo,
};
pub use remote::{ContactList, RemoteClient, RemoteContact};
