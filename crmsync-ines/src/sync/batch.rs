//! Batch driver
//!
//! Streams eligible local records and pushes them one at a time. Remote
//! failures are not caught: the first one aborts the batch and is returned
//! to the caller.

use crate::api::InesApi;
use crate::error::IntegrationResult;
use crate::mapper;
use crate::models::ClientPayload;
use crate::sync::reconcile::{PushOutcome, Reconciler, SyncBranch};
use crate::templates;
use chrono::{DateTime, Duration, Utc};
use crmsync_common::db::{LocalCompany, LocalStore};
use crmsync_common::mapping::{FieldMappingConfig, SyncObject};
use crmsync_common::time::{self, SyncSelection, SyncWindow};
use futures::TryStreamExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Parameters of one batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushParams {
    /// Window start; defaults to now minus the configured lookback
    pub from: Option<DateTime<Utc>>,
    /// Window end; defaults to now
    pub to: Option<DateTime<Utc>>,
    /// Ignore the window and push every record
    pub full_sync: bool,
    /// Cap on records per object type; zero means no cap
    pub limit: Option<u32>,
}

/// Counters for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushSummary {
    /// Contacts reconciled (skips excluded)
    pub contacts_processed: usize,
    /// Contacts without a primary company
    pub contacts_skipped: usize,
    pub branches: BTreeMap<SyncBranch, usize>,
    pub transfers_pending: usize,
    pub companies_pushed: usize,
}

impl PushSummary {
    pub fn branch_count(&self, branch: SyncBranch) -> usize {
        self.branches.get(&branch).copied().unwrap_or(0)
    }

    fn record(&mut self, outcome: &PushOutcome) {
        match outcome.branch {
            None => self.contacts_skipped += 1,
            Some(branch) => {
                self.contacts_processed += 1;
                *self.branches.entry(branch).or_insert(0) += 1;
                if outcome.transfer_pending {
                    self.transfers_pending += 1;
                }
            }
        }
    }
}

/// Runs batch pushes against one remote account
pub struct BatchDriver {
    api: Arc<dyn InesApi>,
    store: Arc<dyn LocalStore>,
    reconciler: Reconciler,
    default_lookback: Duration,
}

impl BatchDriver {
    pub fn new(
        api: Arc<dyn InesApi>,
        store: Arc<dyn LocalStore>,
        config: FieldMappingConfig,
        default_lookback: Duration,
    ) -> Self {
        let reconciler = Reconciler::new(Arc::clone(&api), Arc::clone(&store), config);
        Self {
            api,
            store,
            reconciler,
            default_lookback,
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    fn config(&self) -> &FieldMappingConfig {
        self.reconciler.config()
    }

    /// Record selection for a run starting at `now`
    pub fn selection(&self, params: &PushParams, now: DateTime<Utc>) -> SyncSelection {
        let window = SyncWindow::resolve(
            params.from,
            params.to,
            params.full_sync,
            now,
            self.default_lookback,
        );
        SyncSelection::new(window, params.limit)
    }

    /// Push enabled object types: contacts first, then companies
    pub async fn push_leads(&self, params: &PushParams) -> IntegrationResult<PushSummary> {
        self.config().validate()?;

        let selection = self.selection(params, time::now());
        let mut summary = PushSummary::default();

        info!(?selection, objects = ?self.config().objects, "Starting batch push");

        if self.config().is_enabled(SyncObject::Lead) {
            let mut contacts = self.store.contacts_for_sync(&selection).await?;
            while let Some(mut contact) = contacts.try_next().await? {
                let outcome = self.reconciler.push_lead(&mut contact).await?;
                summary.record(&outcome);
            }
        } else {
            debug!("Lead push disabled");
        }

        if self.config().is_enabled(SyncObject::Company) {
            let mut companies = self.store.companies_for_sync(&selection).await?;
            while let Some(company) = companies.try_next().await? {
                self.push_company(&company).await?;
                summary.companies_pushed += 1;
            }
        } else {
            debug!("Company push disabled");
        }

        info!(
            contacts_processed = summary.contacts_processed,
            contacts_skipped = summary.contacts_skipped,
            transfers_pending = summary.transfers_pending,
            companies_pushed = summary.companies_pushed,
            "Batch push complete"
        );

        Ok(summary)
    }

    /// One-way company create; never checks for an existing remote record
    pub async fn push_company(&self, company: &LocalCompany) -> IntegrationResult<i64> {
        let mut payload = ClientPayload {
            client: templates::client_template(time::now()),
        };
        mapper::fill_client(self.config(), company, &mut payload.client)?;

        let remote_id = self.api.create_company(&payload).await?;
        debug!(company_id = company.id, remote_id, "Pushed company");
        Ok(remote_id)
    }
}
