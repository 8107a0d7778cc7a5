//! Field mapping table
//!
//! The static catalog lists the remote fields the connector knows about,
//! per concept. The live form-field list extends it with custom fields
//! advertised by the remote sync metadata, cached after the first
//! successful fetch.

use crate::api::InesApi;
use crate::error::IntegrationResult;
use crate::models::{CustomFieldDefinition, SyncInfo};
use crmsync_common::db::FieldDefinition;
use crmsync_common::mapping::{custom_field_key, Concept, FieldMappingConfig, SyncObject};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Local custom field created to receive a remote value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalFieldSpec {
    pub alias: &'static str,
    pub field_type: &'static str,
}

/// One known remote field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub concept: Concept,
    pub remote_key: &'static str,
    pub label: &'static str,
    /// Must be mapped for the connector to work
    pub required: bool,
    /// Local field suggested for an initial mapping
    pub auto_mapping: Option<&'static str>,
    /// Excluded from the user-overwritable configuration
    pub locked: bool,
    pub local_field: Option<LocalFieldSpec>,
}

const fn optional(
    concept: Concept,
    remote_key: &'static str,
    label: &'static str,
    alias: &'static str,
    field_type: &'static str,
) -> FieldDescriptor {
    FieldDescriptor {
        concept,
        remote_key,
        label,
        required: false,
        auto_mapping: None,
        locked: false,
        local_field: Some(LocalFieldSpec { alias, field_type }),
    }
}

const fn auto(
    concept: Concept,
    remote_key: &'static str,
    label: &'static str,
    local: &'static str,
) -> FieldDescriptor {
    FieldDescriptor {
        concept,
        remote_key,
        label,
        required: false,
        auto_mapping: Some(local),
        locked: false,
        local_field: None,
    }
}

const CONTACT: Concept = Concept::Contact;
const CLIENT: Concept = Concept::Company;

/// Static remote field catalog
pub static DEFAULT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        concept: CONTACT,
        remote_key: "InternalRef",
        label: "INES reference (contact)",
        required: true,
        auto_mapping: Some("ines_contact_ref"),
        locked: true,
        local_field: Some(LocalFieldSpec {
            alias: "ines_contact_ref",
            field_type: "number",
        }),
    },
    FieldDescriptor {
        concept: CLIENT,
        remote_key: "InternalRef",
        label: "INES reference (société)",
        required: true,
        auto_mapping: Some("ines_client_ref"),
        locked: true,
        local_field: Some(LocalFieldSpec {
            alias: "ines_client_ref",
            field_type: "number",
        }),
    },
    FieldDescriptor {
        concept: CONTACT,
        remote_key: "PrimaryMailAddress",
        label: "Primary Email Address",
        required: true,
        auto_mapping: Some("email"),
        locked: true,
        local_field: None,
    },
    optional(CONTACT, "Genre", "Genre (contact)", "ines_contact_civilite", "text"),
    auto(CONTACT, "LastName", "Last name (contact)", "lastname"),
    auto(CONTACT, "FirstName", "First name (contact)", "firstname"),
    optional(CONTACT, "Function", "Function (contact)", "ines_contact_fonction", "text"),
    optional(CONTACT, "Type", "Type (contact)", "ines_contact_type", "select"),
    optional(CONTACT, "Service", "Service (contact)", "ines_contact_service", "text"),
    optional(CONTACT, "BussinesTelephone", "Business phone (contact)", "ines_contact_tel_bureau", "tel"),
    optional(CONTACT, "HomeTelephone", "Home phone (contact)", "ines_contact_tel_domicile", "tel"),
    optional(CONTACT, "MobilePhone", "Mobile mobile (contact)", "ines_contact_tel_mobile", "tel"),
    optional(CONTACT, "Fax", "Fax (contact)", "ines_contact_fax", "tel"),
    optional(CONTACT, "HomeAddress", "Address 1 (contact)", "ines_contact_adr1", "text"),
    optional(CONTACT, "BusinessAddress", "Address 2 (contact)", "ines_contact_adr2", "text"),
    optional(CONTACT, "ZipCode", "Zip code (contact)", "ines_contact_cp", "text"),
    optional(CONTACT, "City", "City (contact)", "ines_contact_ville", "text"),
    optional(CONTACT, "State", "State (contact)", "ines_contact_region", "text"),
    optional(CONTACT, "Country", "Country (contact)", "ines_contact_pays", "text"),
    optional(CONTACT, "Language", "Language (contact)", "ines_contact_lang", "text"),
    optional(CONTACT, "Author", "Author (contact)", "ines_contact_resp", "select"),
    optional(CONTACT, "Comment", "Comment (contact)", "ines_contact_remarque", "text"),
    optional(CONTACT, "Confidentiality", "Confidentiality (contact)", "ines_contact_diffusion", "select"),
    optional(CONTACT, "DateOfBirth", "Date of birth (contact)", "ines_contact_birthday", "date"),
    optional(CONTACT, "Rang", "Rang (contact)", "ines_contact_etat", "select"),
    optional(CONTACT, "SecondaryMailAddress", "Secondary email (contact)", "ines_contact_email2", "text"),
    FieldDescriptor {
        concept: CONTACT,
        remote_key: "NPai",
        label: "NPAI (contact)",
        required: false,
        auto_mapping: Some("ines_contact_npai"),
        locked: true,
        local_field: Some(LocalFieldSpec {
            alias: "ines_contact_npai",
            field_type: "boolean",
        }),
    },
    FieldDescriptor {
        concept: CLIENT,
        remote_key: "CompanyName",
        label: "Company name",
        required: true,
        auto_mapping: Some("name"),
        locked: true,
        local_field: None,
    },
    optional(CLIENT, "Type", "Type (company)", "ines_client_type", "select"),
    optional(CLIENT, "Manager", "Manager (company)", "ines_client_resp_dossier", "select"),
    optional(CLIENT, "SalesResponsable", "Sales responsable (company)", "ines_client_commercial", "select"),
    optional(CLIENT, "TechnicalResponsable", "Technical responsable (company)", "ines_client_resp_tech", "select"),
    optional(CLIENT, "Phone", "Phone (company)", "ines_client_tel", "tel"),
    optional(CLIENT, "Fax", "Fax (company)", "ines_client_fax", "tel"),
    optional(CLIENT, "Address1", "Address 1 (company)", "ines_client_adr1", "text"),
    optional(CLIENT, "Address2", "Address 2 (company)", "ines_client_adr2", "text"),
    optional(CLIENT, "ZipCode", "Zip code (company)", "ines_client_cp", "text"),
    optional(CLIENT, "City", "City (company)", "ines_client_ville", "text"),
    optional(CLIENT, "State", "State (company)", "ines_client_region", "text"),
    optional(CLIENT, "Country", "Country (company)", "ines_client_pays", "text"),
    optional(CLIENT, "Origin", "Origin (company)", "ines_client_origine", "select"),
    optional(CLIENT, "Website", "Website (company)", "ines_client_site_web", "url"),
    optional(CLIENT, "Confidentiality", "Confidentiality (company)", "ines_client_diffusion", "select"),
    optional(CLIENT, "Comments", "Comments (company)", "ines_client_remarque", "text"),
    optional(CLIENT, "CustomerNumber", "Customer number (company)", "ines_client_num_client", "number"),
    optional(CLIENT, "Language", "Language (company)", "ines_client_lang", "text"),
    optional(CLIENT, "Activity", "Activity (company)", "ines_client_activite", "text"),
    optional(CLIENT, "Scoring", "Scoring (company)", "ines_client_score", "text"),
];

/// One entry of the mappable field list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub key: String,
    pub label: String,
    pub required: bool,
}

impl From<&FieldDescriptor> for FormField {
    fn from(descriptor: &FieldDescriptor) -> Self {
        Self {
            key: descriptor.remote_key.to_string(),
            label: descriptor.label.to_string(),
            required: descriptor.required,
        }
    }
}

impl From<&CustomFieldDefinition> for FormField {
    fn from(definition: &CustomFieldDefinition) -> Self {
        Self {
            key: custom_field_key(definition.ines_id),
            label: definition.ines_name.clone(),
            required: false,
        }
    }
}

/// Catalog descriptors of one concept, in catalog order
pub fn descriptors(concept: Concept) -> impl Iterator<Item = &'static FieldDescriptor> {
    DEFAULT_FIELDS.iter().filter(move |d| d.concept == concept)
}

/// Static (default) form fields of one concept
pub fn default_fields(concept: Concept) -> Vec<FormField> {
    descriptors(concept).map(FormField::from).collect()
}

/// Initial mapping built from the catalog's auto-mapping hints
///
/// Enables lead pushes only; company pushes are append-only and opt-in.
pub fn suggested_mapping() -> FieldMappingConfig {
    let mut config = FieldMappingConfig::default();

    for descriptor in DEFAULT_FIELDS {
        if let Some(local) = descriptor.auto_mapping {
            let fields = match descriptor.concept {
                Concept::Contact => &mut config.lead_fields,
                Concept::Company => &mut config.company_fields,
            };
            fields.insert(descriptor.remote_key.to_string(), local.to_string());
        }
    }

    config.objects.insert(SyncObject::Lead);
    config
}

/// Local custom fields the catalog expects to exist
pub fn local_field_definitions() -> Vec<FieldDefinition> {
    DEFAULT_FIELDS
        .iter()
        .filter_map(|descriptor| {
            descriptor.local_field.map(|spec| FieldDefinition {
                object: descriptor.concept,
                alias: spec.alias.to_string(),
                label: descriptor.label.to_string(),
                field_type: spec.field_type.to_string(),
            })
        })
        .collect()
}

/// Live field list: static catalog plus remote custom fields
pub struct FieldCatalog {
    api: Arc<dyn InesApi>,
    /// Remote sync metadata, populated on first successful fetch
    sync_info: RwLock<Option<SyncInfo>>,
}

impl FieldCatalog {
    pub fn new(api: Arc<dyn InesApi>) -> Self {
        Self {
            api,
            sync_info: RwLock::new(None),
        }
    }

    /// Mappable fields for contacts
    pub async fn lead_fields(&self) -> Vec<FormField> {
        self.form_fields(Concept::Contact).await
    }

    /// Mappable fields for companies
    pub async fn company_fields(&self) -> Vec<FormField> {
        self.form_fields(Concept::Company).await
    }

    /// Mappable fields for a concept
    ///
    /// When the sync metadata cannot be fetched the static fields are
    /// returned alone; the next call tries again.
    pub async fn form_fields(&self, concept: Concept) -> Vec<FormField> {
        let mut fields = default_fields(concept);

        match self.sync_info().await {
            Ok(info) => {
                let custom = match concept {
                    Concept::Contact => &info.contact_custom_fields,
                    Concept::Company => &info.company_custom_fields,
                };
                fields.extend(custom.iter().map(FormField::from));
            }
            Err(e) => {
                warn!(%concept, error = %e, "Remote sync metadata unavailable, listing default fields only");
            }
        }

        fields
    }

    /// Cached sync metadata, fetching it on first use
    pub async fn sync_info(&self) -> IntegrationResult<SyncInfo> {
        if let Some(info) = self.sync_info.read().await.as_ref() {
            return Ok(info.clone());
        }
        self.refresh().await
    }

    /// Fetch the sync metadata again, replacing the cache
    pub async fn refresh(&self) -> IntegrationResult<SyncInfo> {
        let info = self.api.get_sync_info().await?;
        debug!(
            contact_custom_fields = info.contact_custom_fields.len(),
            company_custom_fields = info.company_custom_fields.len(),
            "Fetched remote sync metadata"
        );

        *self.sync_info.write().await = Some(info.clone());
        Ok(info)
    }
}
