//! Local → remote field mapping
//!
//! Both primitives walk a (remote field → local field) map and skip remote
//! names carrying the custom-field prefix; custom fields go through
//! [`crate::sync::custom_fields`].

use crmsync_common::fields::FieldAccess;
use crmsync_common::mapping::{standard_fields, Concept, FieldMappingConfig};
use crmsync_common::Result;
use std::collections::BTreeMap;
use tracing::trace;

/// Copy every mapped local value onto the remote record
pub fn fill<L, R>(fields: &BTreeMap<String, String>, local: &L, remote: &mut R) -> Result<()>
where
    L: FieldAccess + ?Sized,
    R: FieldAccess + ?Sized,
{
    for (remote_field, local_field) in standard_fields(fields) {
        let value = local.get_field(local_field)?;
        remote.set_field(remote_field, value)?;
    }
    Ok(())
}

/// Overwrite remote fields whose string form differs from the local value
///
/// Returns true when at least one field changed.
pub fn diff_and_update<L, R>(
    fields: &BTreeMap<String, String>,
    local: &L,
    remote: &mut R,
) -> Result<bool>
where
    L: FieldAccess + ?Sized,
    R: FieldAccess + ?Sized,
{
    let mut changed = false;

    for (remote_field, local_field) in standard_fields(fields) {
        let local_value = local.get_field(local_field)?;
        let remote_value = remote.get_field(remote_field)?;

        if remote_value.as_sync_string() != local_value.as_sync_string() {
            trace!(
                field = remote_field,
                remote = %remote_value,
                local = %local_value,
                "Remote field differs"
            );
            remote.set_field(remote_field, local_value)?;
            changed = true;
        }
    }

    Ok(changed)
}

/// Fill a remote client from a local company
pub fn fill_client<L, R>(config: &FieldMappingConfig, company: &L, client: &mut R) -> Result<()>
where
    L: FieldAccess + ?Sized,
    R: FieldAccess + ?Sized,
{
    fill(config.fields(Concept::Company), company, client)
}

/// Fill a remote contact from a local contact
pub fn fill_contact<L, R>(config: &FieldMappingConfig, contact: &L, remote: &mut R) -> Result<()>
where
    L: FieldAccess + ?Sized,
    R: FieldAccess + ?Sized,
{
    fill(config.fields(Concept::Contact), contact, remote)
}

pub fn update_client<L, R>(config: &FieldMappingConfig, company: &L, client: &mut R) -> Result<bool>
where
    L: FieldAccess + ?Sized,
    R: FieldAccess + ?Sized,
{
    diff_and_update(config.fields(Concept::Company), company, client)
}

pub fn update_contact<L, R>(config: &FieldMappingConfig, contact: &L, remote: &mut R) -> Result<bool>
where
    L: FieldAccess + ?Sized,
    R: FieldAccess + ?Sized,
{
    diff_and_update(config.fields(Concept::Contact), contact, remote)
}
