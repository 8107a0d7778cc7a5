//! Local marketing entities
//!
//! Contacts and companies carry a fixed set of core columns plus declared
//! custom fields (`extra`). Remote cross-references are ordinary custom
//! fields, addressed through the field mapping like any other.

use crate::fields::{FieldAccess, FieldTable, FieldValue};
use crate::mapping::Concept;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Local contact (marketing lead)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalContact {
    pub id: i64,
    pub title: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub position: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub country: Option<String>,
    /// Engagement score
    pub points: i64,
    pub date_added: DateTime<Utc>,
    /// Declared custom field values, keyed by alias
    pub extra: BTreeMap<String, FieldValue>,
}

impl LocalContact {
    /// New unsaved contact (id 0) created now
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: None,
            firstname: None,
            lastname: None,
            email: Some(email.into()),
            phone: None,
            mobile: None,
            position: None,
            address1: None,
            address2: None,
            city: None,
            state: None,
            zipcode: None,
            country: None,
            points: 0,
            date_added: Utc::now(),
            extra: BTreeMap::new(),
        }
    }

    /// Declare a custom field with an initial value (builder style)
    pub fn with_extra(mut self, alias: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.extra.insert(alias.into(), value.into());
        self
    }
}

/// Local company (organization)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalCompany {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub date_added: DateTime<Utc>,
    pub extra: BTreeMap<String, FieldValue>,
}

impl LocalCompany {
    /// New unsaved company (id 0) created now
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            email: None,
            phone: None,
            fax: None,
            address1: None,
            address2: None,
            city: None,
            state: None,
            zipcode: None,
            country: None,
            website: None,
            description: None,
            date_added: Utc::now(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_extra(mut self, alias: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.extra.insert(alias.into(), value.into());
        self
    }
}

/// Association between a contact and one of its companies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompanyLink {
    pub company_id: i64,
    pub is_primary: bool,
}

/// Declared custom local field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub object: Concept,
    pub alias: String,
    pub label: String,
    pub field_type: String,
}

static CONTACT_FIELDS: Lazy<FieldTable<LocalContact>> = Lazy::new(|| {
    crate::field_table!(LocalContact, "contact", {
        "id" => id: ro_int,
        "title" => title: opt_text,
        "firstname" => firstname: opt_text,
        "lastname" => lastname: opt_text,
        "email" => email: opt_text,
        "phone" => phone: opt_text,
        "mobile" => mobile: opt_text,
        "position" => position: opt_text,
        "address1" => address1: opt_text,
        "address2" => address2: opt_text,
        "city" => city: opt_text,
        "state" => state: opt_text,
        "zipcode" => zipcode: opt_text,
        "country" => country: opt_text,
        "points" => points: int,
        "date_added" => date_added: ro_timestamp,
    })
});

static COMPANY_FIELDS: Lazy<FieldTable<LocalCompany>> = Lazy::new(|| {
    crate::field_table!(LocalCompany, "company", {
        "id" => id: ro_int,
        "name" => name: text,
        "email" => email: opt_text,
        "phone" => phone: opt_text,
        "fax" => fax: opt_text,
        "address1" => address1: opt_text,
        "address2" => address2: opt_text,
        "city" => city: opt_text,
        "state" => state: opt_text,
        "zipcode" => zipcode: opt_text,
        "country" => country: opt_text,
        "website" => website: opt_text,
        "description" => description: opt_text,
        "date_added" => date_added: ro_timestamp,
    })
});

/// Core contact column names
pub fn contact_core_fields() -> Vec<&'static str> {
    CONTACT_FIELDS.names()
}

/// Core company column names
pub fn company_core_fields() -> Vec<&'static str> {
    COMPANY_FIELDS.names()
}

fn read_extra(
    extra: &BTreeMap<String, FieldValue>,
    entity: &'static str,
    name: &str,
) -> Result<FieldValue> {
    extra.get(name).cloned().ok_or_else(|| Error::UnknownField {
        entity,
        field: name.to_string(),
    })
}

fn write_extra(
    extra: &mut BTreeMap<String, FieldValue>,
    entity: &'static str,
    name: &str,
    value: FieldValue,
) -> Result<()> {
    match extra.get_mut(name) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(Error::UnknownField {
            entity,
            field: name.to_string(),
        }),
    }
}

impl FieldAccess for LocalContact {
    fn get_field(&self, name: &str) -> Result<FieldValue> {
        if CONTACT_FIELDS.contains(name) {
            return CONTACT_FIELDS.read(self, name);
        }
        read_extra(&self.extra, CONTACT_FIELDS.entity(), name)
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<()> {
        if CONTACT_FIELDS.contains(name) {
            return CONTACT_FIELDS.write(self, name, value);
        }
        write_extra(&mut self.extra, CONTACT_FIELDS.entity(), name, value)
    }
}

impl FieldAccess for LocalCompany {
    fn get_field(&self, name: &str) -> Result<FieldValue> {
        if COMPANY_FIELDS.contains(name) {
            return COMPANY_FIELDS.read(self, name);
        }
        read_extra(&self.extra, COMPANY_FIELDS.entity(), name)
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<()> {
        if COMPANY_FIELDS.contains(name) {
            return COMPANY_FIELDS.write(self, name, value);
        }
        write_extra(&mut self.extra, COMPANY_FIELDS.entity(), name, value)
    }
}
