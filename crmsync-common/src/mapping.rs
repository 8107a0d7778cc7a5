//! Field mapping configuration
//!
//! Maps remote CRM field names to local field names, one map per concept,
//! plus the set of object types a batch push should handle. Remote names
//! starting with [`CUSTOM_FIELD_PREFIX`] address remote custom fields by
//! their numeric definition reference.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Prefix marking a remote custom field; the suffix is its definition reference
pub const CUSTOM_FIELD_PREFIX: &str = "ines_custom_";

/// Remote field holding a record's own reference
pub const CROSS_REFERENCE_FIELD: &str = "InternalRef";

/// Object types a batch push can handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncObject {
    Lead,
    Company,
}

impl SyncObject {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncObject::Lead => "lead",
            SyncObject::Company => "company",
        }
    }
}

impl fmt::Display for SyncObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which half of the mapping a field belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Concept {
    /// Local contact ↔ remote contact
    Contact,
    /// Local company ↔ remote client
    Company,
}

impl Concept {
    pub fn as_str(&self) -> &'static str {
        match self {
            Concept::Contact => "contact",
            Concept::Company => "company",
        }
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mapped remote custom field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFieldMapping {
    /// Remote custom field definition reference
    pub definition_ref: i64,
    /// Local field supplying the value
    pub local_field: String,
}

/// True if the remote field name addresses a custom field
pub fn is_custom_field(remote_field: &str) -> bool {
    remote_field.starts_with(CUSTOM_FIELD_PREFIX)
}

/// Synthetic remote field name for a custom field definition
pub fn custom_field_key(definition_ref: impl fmt::Display) -> String {
    format!("{}{}", CUSTOM_FIELD_PREFIX, definition_ref)
}

/// Definition reference embedded in a custom field name
pub fn custom_definition_ref(remote_field: &str) -> Result<i64> {
    let suffix = remote_field
        .strip_prefix(CUSTOM_FIELD_PREFIX)
        .ok_or_else(|| Error::Config(format!("'{}' is not a custom field", remote_field)))?;

    suffix.parse::<i64>().map_err(|_| {
        Error::Config(format!(
            "Custom field '{}' has no numeric definition reference",
            remote_field
        ))
    })
}

/// Remote → local field mapping plus enabled sync objects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMappingConfig {
    /// Object types pushed by a batch run
    #[serde(default)]
    pub objects: BTreeSet<SyncObject>,

    /// Remote contact field → local contact field
    #[serde(default)]
    pub lead_fields: BTreeMap<String, String>,

    /// Remote client field → local company field
    #[serde(default)]
    pub company_fields: BTreeMap<String, String>,
}

impl FieldMappingConfig {
    /// Mapping half for a concept
    pub fn fields(&self, concept: Concept) -> &BTreeMap<String, String> {
        match concept {
            Concept::Contact => &self.lead_fields,
            Concept::Company => &self.company_fields,
        }
    }

    pub fn is_enabled(&self, object: SyncObject) -> bool {
        self.objects.contains(&object)
    }

    /// Local field holding the remote cross-reference for a concept
    pub fn cross_reference_field(&self, concept: Concept) -> Result<&str> {
        self.fields(concept)
            .get(CROSS_REFERENCE_FIELD)
            .map(String::as_str)
            .ok_or_else(|| {
                Error::Config(format!(
                    "No local field mapped to {} for {} fields",
                    CROSS_REFERENCE_FIELD, concept
                ))
            })
    }

    /// Non-custom (remote, local) pairs for a concept
    pub fn standard_fields(&self, concept: Concept) -> impl Iterator<Item = (&str, &str)> {
        standard_fields(self.fields(concept))
    }

    /// Custom field entries for a concept, in remote-name order
    pub fn custom_fields(&self, concept: Concept) -> Result<Vec<CustomFieldMapping>> {
        self.fields(concept)
            .iter()
            .filter(|(remote, _)| is_custom_field(remote))
            .map(|(remote, local)| {
                Ok(CustomFieldMapping {
                    definition_ref: custom_definition_ref(remote)?,
                    local_field: local.clone(),
                })
            })
            .collect()
    }

    /// Check that both concepts map a cross-reference field
    pub fn validate(&self) -> Result<()> {
        if self.is_enabled(SyncObject::Lead) {
            self.cross_reference_field(Concept::Contact)?;
            self.cross_reference_field(Concept::Company)?;
        }
        for concept in [Concept::Contact, Concept::Company] {
            self.custom_fields(concept)?;
        }
        Ok(())
    }
}

/// Non-custom (remote, local) pairs of a mapping half
pub fn standard_fields(fields: &BTreeMap<String, String>) -> impl Iterator<Item = (&str, &str)> {
    fields
        .iter()
        .filter(|(remote, _)| !is_custom_field(remote))
        .map(|(remote, local)| (remote.as_str(), local.as_str()))
}
