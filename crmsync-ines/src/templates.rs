//! Default-valued skeletons for remote create operations
//!
//! Every field starts neutral (empty text, zero) except `IsNew`, the
//! mandatory `PaymentMethodRef` and the creation/modification stamps.

use crate::models::{
    ClientPayload, ClientWithContactsPayload, ContactList, ContactPayload, RemoteClient,
    RemoteContact,
};
use chrono::{DateTime, Utc};
use crmsync_common::time::remote_timestamp;

/// Client skeleton stamped at `now`
pub fn client_template(now: DateTime<Utc>) -> RemoteClient {
    let stamp = remote_timestamp(now);

    RemoteClient {
        confidentiality: "Undefined".to_string(),
        creation_date: stamp.clone(),
        modified_date: stamp,
        // Remote rejects a client without a payment method reference
        payment_method_ref: 1,
        is_new: true,
        internal_ref: 0,
        ..Default::default()
    }
}

/// Contact skeleton stamped at `now`
pub fn contact_template(now: DateTime<Utc>) -> RemoteContact {
    let stamp = remote_timestamp(now);

    RemoteContact {
        confidentiality: "Undefined".to_string(),
        creation_date: stamp.clone(),
        date_of_birth: stamp.clone(),
        modification_date: stamp,
        rang: "Principal".to_string(),
        is_new: true,
        internal_ref: 0,
        ..Default::default()
    }
}

/// Client skeleton embedding `contacts` contact skeletons
pub fn client_with_contacts_template(contacts: usize, now: DateTime<Utc>) -> ClientWithContactsPayload {
    let mut client = client_template(now);
    client.contacts = ContactList {
        items: (0..contacts).map(|_| contact_template(now)).collect(),
    };

    ClientWithContactsPayload { client }
}

/// Client-only create skeleton
pub fn client_payload_template(now: DateTime<Utc>) -> ClientPayload {
    ClientPayload {
        client: client_template(now),
    }
}

/// Contact create skeleton under `client_ref`
pub fn contact_payload_template(
    now: DateTime<Utc>,
    client_ref: i64,
    automation_ref: i64,
    scoring: i64,
) -> ContactPayload {
    ContactPayload {
        contact: contact_template(now),
        automation_ref,
        client_ref,
        scoring,
    }
}
