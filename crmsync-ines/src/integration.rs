//! Integration descriptor
//!
//! Static facts the host configuration layer needs to present and gate
//! the connector.

use crmsync_common::mapping::SyncObject;

/// Internal integration name
pub const NAME: &str = "InesCRM";

/// Human-readable name
pub const DISPLAY_NAME: &str = "Ines CRM";

/// Credential key with its form label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyField {
    pub key: &'static str,
    pub label: &'static str,
}

/// Capability advertised to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Push a single contact
    PushLead,
    /// Batch push
    PushLeads,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::PushLead => "push_lead",
            Feature::PushLeads => "push_leads",
        }
    }
}

/// Credentials required to open a session
pub const REQUIRED_KEY_FIELDS: &[KeyField] = &[
    KeyField {
        key: "compte",
        label: "Account",
    },
    KeyField {
        key: "userName",
        label: "User name",
    },
    KeyField {
        key: "password",
        label: "Password",
    },
];

/// Keys whose values must never be displayed or logged
pub const SECRET_KEYS: &[&str] = &["password"];

pub const SUPPORTED_FEATURES: &[Feature] = &[Feature::PushLead, Feature::PushLeads];

/// Object types a batch push can be configured to handle
pub const SYNC_OBJECTS: &[SyncObject] = &[SyncObject::Lead, SyncObject::Company];

/// Local data takes priority over remote data
pub const fn data_priority() -> bool {
    true
}

pub fn supports(feature: Feature) -> bool {
    SUPPORTED_FEATURES.contains(&feature)
}

pub fn is_secret(key: &str) -> bool {
    SECRET_KEYS.contains(&key)
}
