//! Custom field synchronization
//!
//! Every mapped custom field is written on every pass: created when the
//! remote entity has no value for its definition, updated otherwise. There
//! is no change detection here, unlike standard fields.

use crate::api::InesApi;
use crate::error::IntegrationResult;
use crate::models::{CustomFieldCreate, CustomFieldOwner, CustomFieldUpdate};
use crmsync_common::fields::{FieldAccess, FieldValue};
use crmsync_common::mapping::{Concept, FieldMappingConfig};
use tracing::debug;

/// Remote writes issued by one synchronization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustomFieldReport {
    pub created: usize,
    pub updated: usize,
}

impl CustomFieldReport {
    pub fn total(&self) -> usize {
        self.created + self.updated
    }
}

/// Push mapped custom fields of a local company onto a remote client
pub async fn push_client_custom_fields<L>(
    api: &dyn InesApi,
    config: &FieldMappingConfig,
    client_ref: i64,
    company: &L,
) -> IntegrationResult<CustomFieldReport>
where
    L: FieldAccess + Sync + ?Sized,
{
    sync_custom_fields(api, config, CustomFieldOwner::Client(client_ref), company).await
}

/// Push mapped custom fields of a local contact onto a remote contact
pub async fn push_contact_custom_fields<L>(
    api: &dyn InesApi,
    config: &FieldMappingConfig,
    contact_ref: i64,
    contact: &L,
) -> IntegrationResult<CustomFieldReport>
where
    L: FieldAccess + Sync + ?Sized,
{
    sync_custom_fields(api, config, CustomFieldOwner::Contact(contact_ref), contact).await
}

async fn sync_custom_fields<L>(
    api: &dyn InesApi,
    config: &FieldMappingConfig,
    owner: CustomFieldOwner,
    local: &L,
) -> IntegrationResult<CustomFieldReport>
where
    L: FieldAccess + Sync + ?Sized,
{
    let concept = match owner {
        CustomFieldOwner::Client(_) => Concept::Company,
        CustomFieldOwner::Contact(_) => Concept::Contact,
    };

    // Resolve every local value before touching the remote side
    let values: Vec<(i64, FieldValue)> = config
        .custom_fields(concept)?
        .into_iter()
        .map(|mapping| {
            let value = local.get_field(&mapping.local_field)?;
            Ok((mapping.definition_ref, value))
        })
        .collect::<crmsync_common::Result<_>>()?;

    let mut report = CustomFieldReport::default();
    if values.is_empty() {
        return Ok(report);
    }

    let existing = match owner {
        CustomFieldOwner::Client(r) => api.get_client_custom_fields(r).await?,
        CustomFieldOwner::Contact(r) => api.get_contact_custom_fields(r).await?,
    };

    for (definition_ref, value) in values {
        match existing.iter().find(|f| f.definition_ref == definition_ref) {
            None => {
                debug!(?owner, definition_ref, "Creating custom field value");
                let payload = CustomFieldCreate::new(owner, definition_ref, value);
                match owner {
                    CustomFieldOwner::Client(_) => api.create_client_custom_field(&payload).await?,
                    CustomFieldOwner::Contact(_) => api.create_contact_custom_field(&payload).await?,
                }
                report.created += 1;
            }
            Some(current) => {
                debug!(?owner, definition_ref, value_ref = current.value_ref, "Updating custom field value");
                let payload = CustomFieldUpdate {
                    owner,
                    definition_ref,
                    value_ref: current.value_ref,
                    value,
                };
                match owner {
                    CustomFieldOwner::Client(_) => api.update_client_custom_field(&payload).await?,
                    CustomFieldOwner::Contact(_) => api.update_contact_custom_field(&payload).await?,
                }
                report.updated += 1;
            }
        }
    }

    Ok(report)
}
