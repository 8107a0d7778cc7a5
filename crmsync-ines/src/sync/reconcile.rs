//! Reconciliation engine
//!
//! Decides, for one local contact and its primary company, which remote
//! records must be created and which updated. The decision rests solely on
//! the two stored cross-references:
//!
//! | client ref | contact ref | branch                         |
//! |------------|-------------|--------------------------------|
//! | -          | -           | combined create                |
//! | -          | set         | create client, update contact  |
//! | set        | -           | update client, create contact  |
//! | set        | set         | update both, sync custom fields|
//!
//! Creation paths are the only writers of cross-references, so re-running
//! the same input never creates a record twice.

use crate::api::InesApi;
use crate::error::{IntegrationError, IntegrationResult};
use crate::mapper;
use crate::models::{ClientPayload, RemoteContact};
use crate::sync::custom_fields::{self, CustomFieldReport};
use crate::templates;
use crmsync_common::db::{LocalCompany, LocalContact, LocalStore};
use crmsync_common::fields::{FieldAccess, FieldValue};
use crmsync_common::mapping::{Concept, FieldMappingConfig};
use crmsync_common::time;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Create/update path chosen for a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SyncBranch {
    /// Neither side linked: combined client + contact create
    CreateBoth,
    /// Contact linked, client not
    CreateClientUpdateContact,
    /// Client linked, contact not
    UpdateClientCreateContact,
    /// Both linked
    UpdateBoth,
}

impl SyncBranch {
    pub fn select(client_ref: Option<i64>, contact_ref: Option<i64>) -> Self {
        match (client_ref, contact_ref) {
            (None, None) => SyncBranch::CreateBoth,
            (None, Some(_)) => SyncBranch::CreateClientUpdateContact,
            (Some(_), None) => SyncBranch::UpdateClientCreateContact,
            (Some(_), Some(_)) => SyncBranch::UpdateBoth,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncBranch::CreateBoth => "create client and contact",
            SyncBranch::CreateClientUpdateContact => "create client, update contact",
            SyncBranch::UpdateClientCreateContact => "update client, create contact",
            SyncBranch::UpdateBoth => "update client and contact",
        }
    }
}

impl fmt::Display for SyncBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of pushing one contact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushOutcome {
    /// Branch taken; `None` when the contact was skipped
    pub branch: Option<SyncBranch>,
    pub client_ref: Option<i64>,
    pub contact_ref: Option<i64>,
    pub client_updated: bool,
    pub contact_updated: bool,
    pub custom_fields: CustomFieldReport,
    /// The linked remote contact belongs to another client and was not moved
    pub transfer_pending: bool,
}

impl PushOutcome {
    /// Contact without a primary company
    pub fn skipped() -> Self {
        Self::default()
    }

    pub fn is_skipped(&self) -> bool {
        self.branch.is_none()
    }

    fn taking(branch: SyncBranch) -> Self {
        Self {
            branch: Some(branch),
            ..Self::default()
        }
    }
}

/// Drives the remote calls for one contact at a time
pub struct Reconciler {
    api: Arc<dyn InesApi>,
    store: Arc<dyn LocalStore>,
    config: FieldMappingConfig,
}

impl Reconciler {
    pub fn new(api: Arc<dyn InesApi>, store: Arc<dyn LocalStore>, config: FieldMappingConfig) -> Self {
        Self { api, store, config }
    }

    pub fn config(&self) -> &FieldMappingConfig {
        &self.config
    }

    /// Push one contact, resolving its primary company from the store
    pub async fn push_lead(&self, contact: &mut LocalContact) -> IntegrationResult<PushOutcome> {
        let Some(mut company) = self.store.primary_company_for_contact(contact.id).await? else {
            debug!(contact_id = contact.id, "Will not push contact without primary company");
            return Ok(PushOutcome::skipped());
        };

        self.reconcile(contact, &mut company).await
    }

    /// Push one contact together with its company
    pub async fn reconcile(
        &self,
        contact: &mut LocalContact,
        company: &mut LocalCompany,
    ) -> IntegrationResult<PushOutcome> {
        let client_ref = self.read_reference(&*company, Concept::Company)?;
        let contact_ref = self.read_reference(&*contact, Concept::Contact)?;
        let branch = SyncBranch::select(client_ref, contact_ref);

        debug!(
            contact_id = contact.id,
            company_id = company.id,
            ?client_ref,
            ?contact_ref,
            %branch,
            "Reconciling contact"
        );

        match (client_ref, contact_ref) {
            (None, None) => self.create_both(contact, company).await,
            (None, Some(contact_ref)) => {
                self.create_client_update_contact(contact, company, contact_ref)
                    .await
            }
            (Some(client_ref), None) => {
                self.update_client_create_contact(contact, company, client_ref)
                    .await
            }
            (Some(client_ref), Some(contact_ref)) => {
                self.update_both(contact, company, client_ref, contact_ref)
                    .await
            }
        }
    }

    async fn create_both(
        &self,
        contact: &mut LocalContact,
        company: &mut LocalCompany,
    ) -> IntegrationResult<PushOutcome> {
        let mut payload = templates::client_with_contacts_template(1, time::now());

        payload.client.automation_ref = company.id;
        mapper::fill_client(&self.config, &*company, &mut payload.client)?;
        payload.client.internal_ref = 0;

        for remote_contact in payload.client.contacts.items.iter_mut() {
            remote_contact.automation_ref = contact.id;
            mapper::fill_contact(&self.config, &*contact, remote_contact)?;
            remote_contact.internal_ref = 0;
        }

        let created = self.api.create_client_with_contacts(&payload).await?;
        let contact_ref = created.contact_refs.first().copied().ok_or_else(|| {
            IntegrationError::MissingResult {
                operation: "AddClientWithContacts",
                detail: format!("no contact reference for client {}", created.client_ref),
            }
        })?;

        self.link_company(company, created.client_ref).await?;
        self.link_contact(contact, contact_ref).await?;

        Ok(PushOutcome {
            client_ref: Some(created.client_ref),
            contact_ref: Some(contact_ref),
            ..PushOutcome::taking(SyncBranch::CreateBoth)
        })
    }

    async fn create_client_update_contact(
        &self,
        contact: &mut LocalContact,
        company: &mut LocalCompany,
        contact_ref: i64,
    ) -> IntegrationResult<PushOutcome> {
        let mut payload = ClientPayload {
            client: templates::client_template(time::now()),
        };
        mapper::fill_client(&self.config, &*company, &mut payload.client)?;
        payload.client.internal_ref = 0;

        let client_ref = self.api.create_client(&payload).await?;
        self.link_company(company, client_ref).await?;

        let mut remote_contact = self.api.get_contact(contact_ref).await?;
        let transfer_pending = check_transfer(&remote_contact, client_ref, contact.id);

        let contact_updated = mapper::update_contact(&self.config, &*contact, &mut remote_contact)?;
        if contact_updated {
            self.api.update_contact(&remote_contact).await?;
        }

        Ok(PushOutcome {
            client_ref: Some(client_ref),
            contact_ref: Some(contact_ref),
            contact_updated,
            transfer_pending,
            ..PushOutcome::taking(SyncBranch::CreateClientUpdateContact)
        })
    }

    async fn update_client_create_contact(
        &self,
        contact: &mut LocalContact,
        company: &mut LocalCompany,
        client_ref: i64,
    ) -> IntegrationResult<PushOutcome> {
        let mut client = self.api.get_client(client_ref).await?;

        let mut payload =
            templates::contact_payload_template(time::now(), client_ref, contact.id, contact.points);
        mapper::fill_contact(&self.config, &*contact, &mut payload.contact)?;
        payload.contact.internal_ref = 0;

        let contact_ref = self.api.create_contact(&payload).await?;
        self.link_contact(contact, contact_ref).await?;

        let client_updated = mapper::update_client(&self.config, &*company, &mut client)?;
        if client_updated {
            self.api.update_client(&client).await?;
        }

        Ok(PushOutcome {
            client_ref: Some(client_ref),
            contact_ref: Some(contact_ref),
            client_updated,
            ..PushOutcome::taking(SyncBranch::UpdateClientCreateContact)
        })
    }

    async fn update_both(
        &self,
        contact: &mut LocalContact,
        company: &mut LocalCompany,
        client_ref: i64,
        contact_ref: i64,
    ) -> IntegrationResult<PushOutcome> {
        let mut client = self.api.get_client(client_ref).await?;
        let mut remote_contact = self.api.get_contact(contact_ref).await?;
        let transfer_pending = check_transfer(&remote_contact, client_ref, contact.id);

        let client_updated = mapper::update_client(&self.config, &*company, &mut client)?;
        let contact_updated = mapper::update_contact(&self.config, &*contact, &mut remote_contact)?;

        if client_updated {
            self.api.update_client(&client).await?;
        }
        if contact_updated {
            self.api.update_contact(&remote_contact).await?;
        }

        let mut custom = custom_fields::push_client_custom_fields(
            self.api.as_ref(),
            &self.config,
            client_ref,
            &*company,
        )
        .await?;
        let contact_custom = custom_fields::push_contact_custom_fields(
            self.api.as_ref(),
            &self.config,
            contact_ref,
            &*contact,
        )
        .await?;
        custom.created += contact_custom.created;
        custom.updated += contact_custom.updated;

        Ok(PushOutcome {
            client_ref: Some(client_ref),
            contact_ref: Some(contact_ref),
            client_updated,
            contact_updated,
            custom_fields: custom,
            transfer_pending,
            ..PushOutcome::taking(SyncBranch::UpdateBoth)
        })
    }

    fn read_reference<E>(&self, entity: &E, concept: Concept) -> IntegrationResult<Option<i64>>
    where
        E: FieldAccess + ?Sized,
    {
        let field = self.config.cross_reference_field(concept)?;
        Ok(entity.get_field(field)?.as_reference(field)?)
    }

    async fn link_company(&self, company: &mut LocalCompany, client_ref: i64) -> IntegrationResult<()> {
        let field = self.config.cross_reference_field(Concept::Company)?;
        company.set_field(field, FieldValue::Integer(client_ref))?;
        self.store.save_company(company).await?;
        debug!(company_id = company.id, client_ref, "Linked company to remote client");
        Ok(())
    }

    async fn link_contact(&self, contact: &mut LocalContact, contact_ref: i64) -> IntegrationResult<()> {
        let field = self.config.cross_reference_field(Concept::Contact)?;
        contact.set_field(field, FieldValue::Integer(contact_ref))?;
        self.store.save_contact(contact).await?;
        debug!(contact_id = contact.id, contact_ref, "Linked contact to remote contact");
        Ok(())
    }
}

/// Report a linked contact owned by another client
///
/// Moving a remote contact between clients is not supported.
fn check_transfer(remote_contact: &RemoteContact, client_ref: i64, contact_id: i64) -> bool {
    let owner = remote_contact.company_ref;
    if owner != 0 && owner != client_ref {
        warn!(
            contact_id,
            contact_ref = remote_contact.internal_ref,
            remote_client = owner,
            local_client = client_ref,
            "Remote contact belongs to another client; transfer not supported"
        );
        return true;
    }
    false
}
